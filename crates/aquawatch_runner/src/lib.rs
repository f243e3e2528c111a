//! Supervisor for the pipeline's long-running processes.
//!
//! Processes run concurrently until one fails or a shutdown signal
//! arrives; closers then run concurrently under a single timeout, whatever
//! the outcome. The returned exit code lets `main` decide how to exit.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

type ProcessFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

struct NamedProcess {
    name: &'static str,
    start: Box<dyn FnOnce(CancellationToken) -> ProcessFuture + Send>,
}

struct NamedCloser {
    name: &'static str,
    close: Box<dyn FnOnce() -> ProcessFuture + Send>,
}

pub struct Runner {
    processes: Vec<NamedProcess>,
    closers: Vec<NamedCloser>,
    closer_timeout: Duration,
    shutdown: CancellationToken,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            shutdown: CancellationToken::new(),
        }
    }

    /// Register a long-running process. The process must watch the token
    /// it receives and return once it is cancelled.
    pub fn with_process<F, Fut>(mut self, name: &'static str, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.processes.push(NamedProcess {
            name,
            start: Box::new(move |token| Box::pin(process(token))),
        });
        self
    }

    /// Register a cleanup step run after all processes have stopped.
    /// Closers run even when a process failed.
    pub fn with_closer<F, Fut>(mut self, name: &'static str, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.closers.push(NamedCloser {
            name,
            close: Box::new(move || Box::pin(closer())),
        });
        self
    }

    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// External handle for triggering shutdown, mostly useful in tests.
    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Run every process until completion, failure, or a shutdown signal,
    /// then run closers. Returns the process exit code.
    pub async fn run(self) -> i32 {
        let token = self.shutdown;
        let mut join_set = JoinSet::new();

        for process in self.processes {
            let process_token = token.clone();
            let name = process.name;
            join_set.spawn(async move {
                tracing::info!(process = name, "Starting process");
                let result = (process.start)(process_token).await;
                (name, result)
            });
        }

        spawn_signal_watchers(token.clone());

        let mut failed = false;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(()))) => {
                    tracing::info!(process = name, "Process finished");
                }
                Ok((name, Err(e))) => {
                    tracing::error!(process = name, error = format!("{e:#}"), "Process failed");
                    failed = true;
                    token.cancel();
                }
                Err(e) => {
                    tracing::error!(error = %e, "Process panicked");
                    failed = true;
                    token.cancel();
                }
            }
        }

        if !self.closers.is_empty() {
            tracing::info!(timeout = ?self.closer_timeout, "Running closers");
            if tokio::time::timeout(self.closer_timeout, run_closers(self.closers))
                .await
                .is_err()
            {
                tracing::error!("Closers did not finish within the timeout");
                failed = true;
            }
        }

        if failed {
            1
        } else {
            0
        }
    }
}

async fn run_closers(closers: Vec<NamedCloser>) {
    let mut closer_set = JoinSet::new();

    for closer in closers {
        let name = closer.name;
        closer_set.spawn(async move { (name, (closer.close)().await) });
    }

    while let Some(joined) = closer_set.join_next().await {
        match joined {
            Ok((name, Ok(()))) => {
                tracing::debug!(closer = name, "Closer finished");
            }
            Ok((name, Err(e))) => {
                tracing::error!(closer = name, error = format!("{e:#}"), "Closer failed");
            }
            Err(e) => {
                tracing::error!(error = %e, "Closer panicked");
            }
        }
    }
}

fn spawn_signal_watchers(token: CancellationToken) {
    tokio::spawn({
        let token = token.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install SIGINT handler");
                return;
            }
            tracing::info!("Received interrupt, shutting down");
            token.cancel();
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM, shutting down");
                token.cancel();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
            }
        }
    });
}
