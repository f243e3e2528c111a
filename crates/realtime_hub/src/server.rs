use crate::hub::SensorHub;
use crate::ws::ws_handler;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// HTTP server exposing the `/ws` upgrade endpoint.
pub struct RealtimeServer {
    host: String,
    port: u16,
    hub: Arc<SensorHub>,
}

impl RealtimeServer {
    pub fn new(host: String, port: u16, hub: Arc<SensorHub>) -> Self {
        Self { host, port, hub }
    }

    pub async fn run(self, ctx: CancellationToken) -> anyhow::Result<()> {
        let router = Router::new()
            .route("/ws", get(ws_handler))
            .with_state(self.hub);

        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!(addr = %addr, "Realtime hub listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(async move { ctx.cancelled().await })
            .await?;

        info!("Realtime hub stopped");
        Ok(())
    }
}
