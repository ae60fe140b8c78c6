// ============================================================
// Layer 2 — ServeUseCase
// ============================================================
// Loads the best checkpoint once, then serves it over HTTP
// until Ctrl-C:
//
//   Step 1: Rebuild the model from the checkpoint dir  (Layer 5)
//   Step 2: Start a tokio runtime and bind the socket
//   Step 3: Serve the router with graceful shutdown    (Layer 1)

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::api::{router::create_router, AppState};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::inferencer::Inferencer;

pub struct ServeUseCase {
    checkpoint_dir: String,
    addr:           String,
}

impl ServeUseCase {
    pub fn new(checkpoint_dir: impl Into<String>, host: &str, port: u16) -> Self {
        Self {
            checkpoint_dir: checkpoint_dir.into(),
            addr:           format!("{host}:{port}"),
        }
    }

    pub fn execute(&self) -> Result<()> {
        // ── Step 1: Model ─────────────────────────────────────────────────────
        let ckpt       = CheckpointManager::new(&self.checkpoint_dir);
        let inferencer = Inferencer::from_checkpoint(&ckpt)?;
        let state      = AppState::new(Arc::new(inferencer));

        // ── Step 2 + 3: Runtime and server ────────────────────────────────────
        let runtime = tokio::runtime::Runtime::new().context("Cannot start tokio runtime")?;
        runtime.block_on(async {
            let listener = tokio::net::TcpListener::bind(&self.addr)
                .await
                .with_context(|| format!("Cannot bind {}", self.addr))?;
            tracing::info!("Server listening on {}", self.addr);

            axum::serve(listener, create_router(state))
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("Server error")
        })?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
