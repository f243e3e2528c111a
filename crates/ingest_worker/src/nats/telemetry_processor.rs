use crate::domain::TelemetryIngestService;
use async_nats::jetstream::Message;
use common::nats::{BatchProcessor, ProcessingResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// Create a BatchProcessor that runs telemetry messages through the domain
/// service.
///
/// Delivery is at-least-once but failed messages are dropped, never
/// redelivered: a message that fails authentication, anchoring, or
/// persistence would fail identically on retry, so every message is
/// acknowledged regardless of outcome.
pub fn create_telemetry_processor(service: Arc<TelemetryIngestService>) -> BatchProcessor {
    Box::new(move |messages: &[Message]| {
        let service = Arc::clone(&service);

        // Message borrows from the slice, so copy payloads out before
        // moving into the async block.
        let message_data: Vec<(usize, Vec<u8>, String)> = messages
            .iter()
            .enumerate()
            .map(|(idx, msg)| (idx, msg.payload.to_vec(), msg.subject.to_string()))
            .collect();

        Box::pin(async move {
            let count = message_data.len();

            for (idx, payload, subject) in message_data {
                match service.process_message(&payload).await {
                    Ok(()) => {
                        debug!(index = idx, subject = %subject, "telemetry message processed");
                    }
                    Err(e) => {
                        warn!(
                            error = %e,
                            index = idx,
                            subject = %subject,
                            "dropping telemetry message after pipeline failure"
                        );
                    }
                }
            }

            Ok(ProcessingResult::ack_all(count))
        })
    })
}

// Unit tests would need real NATS Message objects, which cannot be built
// without a live connection. The drop-on-failure contract is covered by
// the TelemetryIngestService tests instead.
