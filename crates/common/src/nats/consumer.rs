use anyhow::{Context, Result};
use async_nats::jetstream::{self, consumer::PullConsumer, Message};
use futures::{future::BoxFuture, StreamExt};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Outcome of processing one batch of deliveries.
///
/// `ack` indices are acknowledged and permanently consumed; `nak` indices
/// are rejected back to the stream for redelivery. A processor that drops
/// failed messages (the telemetry pipeline does) simply acks everything.
#[derive(Debug)]
pub struct ProcessingResult {
    pub ack: Vec<usize>,
    pub nak: Vec<(usize, Option<String>)>,
}

impl ProcessingResult {
    pub fn ack_all(count: usize) -> Self {
        Self {
            ack: (0..count).collect(),
            nak: Vec::new(),
        }
    }

    pub fn nak_all(count: usize, error: Option<String>) -> Self {
        Self {
            ack: Vec::new(),
            nak: (0..count).map(|i| (i, error.clone())).collect(),
        }
    }
}

/// Batch processor callback. Deserialization and business logic live in the
/// processor; the consumer only moves messages and acknowledgments.
pub type BatchProcessor =
    Box<dyn Fn(&[Message]) -> BoxFuture<'static, Result<ProcessingResult>> + Send + Sync>;

/// Durable JetStream pull consumer driving a [`BatchProcessor`].
///
/// Deliveries within a batch may be processed concurrently by the
/// processor; the consumer itself imposes no ordering beyond what the
/// stream provides.
pub struct NatsConsumer {
    consumer: PullConsumer,
    batch_size: usize,
    max_wait: Duration,
    processor: BatchProcessor,
}

impl NatsConsumer {
    pub async fn new(
        jetstream: &jetstream::Context,
        stream_name: &str,
        consumer_name: &str,
        subject_filter: &str,
        batch_size: usize,
        max_wait_secs: u64,
        processor: BatchProcessor,
    ) -> Result<Self> {
        debug!(
            stream = stream_name,
            consumer = consumer_name,
            subject = subject_filter,
            "Creating JetStream consumer"
        );

        let consumer = jetstream
            .create_consumer_on_stream(
                jetstream::consumer::pull::Config {
                    name: Some(consumer_name.to_string()),
                    durable_name: Some(consumer_name.to_string()),
                    filter_subject: subject_filter.to_string(),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    ..Default::default()
                },
                stream_name,
            )
            .await
            .context("Failed to create consumer")?;

        info!(
            stream = stream_name,
            consumer = consumer_name,
            "Consumer created successfully"
        );

        Ok(Self {
            consumer,
            batch_size,
            max_wait: Duration::from_secs(max_wait_secs),
            processor,
        })
    }

    pub async fn run(&self, ctx: CancellationToken) -> Result<()> {
        info!("Starting consumer loop");

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!("Received shutdown signal, stopping consumer");
                    break;
                }
                result = self.fetch_and_process_batch() => {
                    if let Err(e) = result {
                        error!(error = %e, "Error processing batch");
                        // Back off briefly and keep consuming
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }

        info!("Consumer stopped gracefully");
        Ok(())
    }

    async fn fetch_and_process_batch(&self) -> Result<()> {
        let mut messages = self
            .consumer
            .fetch()
            .max_messages(self.batch_size)
            .expires(self.max_wait)
            .messages()
            .await
            .context("Failed to fetch messages")?;

        let mut raw_messages = Vec::new();
        while let Some(result) = messages.next().await {
            match result {
                Ok(msg) => raw_messages.push(msg),
                Err(e) => {
                    warn!(error = %e, "Error receiving message from batch");
                }
            }
        }

        if raw_messages.is_empty() {
            return Ok(());
        }

        debug!(message_count = raw_messages.len(), "Received message batch");

        let processing_result = match (self.processor)(&raw_messages).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Processor returned error, rejecting all messages");
                ProcessingResult::nak_all(raw_messages.len(), Some(e.to_string()))
            }
        };

        for idx in processing_result.ack {
            let Some(msg) = raw_messages.get(idx) else {
                warn!(message_index = idx, "Invalid ack index in ProcessingResult");
                continue;
            };
            if let Err(e) = msg.ack().await {
                error!(error = %e, message_index = idx, "Failed to acknowledge message");
            }
        }

        for (idx, error_msg) in processing_result.nak {
            let Some(msg) = raw_messages.get(idx) else {
                warn!(message_index = idx, "Invalid nak index in ProcessingResult");
                continue;
            };
            warn!(
                message_index = idx,
                subject = %msg.subject,
                error = error_msg.as_deref().unwrap_or("unspecified"),
                "Rejecting message"
            );
            if let Err(e) = msg.ack_with(jetstream::AckKind::Nak(None)).await {
                error!(error = %e, message_index = idx, "Failed to reject message");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_all_covers_every_index() {
        let result = ProcessingResult::ack_all(3);
        assert_eq!(result.ack, vec![0, 1, 2]);
        assert!(result.nak.is_empty());
    }

    #[test]
    fn nak_all_carries_the_error() {
        let result = ProcessingResult::nak_all(2, Some("boom".to_string()));
        assert!(result.ack.is_empty());
        assert_eq!(result.nak.len(), 2);
        assert_eq!(result.nak[0], (0, Some("boom".to_string())));
    }
}
