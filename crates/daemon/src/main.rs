// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Binary entry point for the orchestrator daemon: acquires the
//! single-instance lock, brings up structured logging, constructs the
//! orchestrator service, and serves the Bridge HTTP API until signaled to
//! stop (spec §4.4, §5).

use std::sync::Arc;

use orch_daemon::{bridge, env, logging, DaemonLock, OrchestratorService};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _log_guard = logging::init()?;

    let _lock = match DaemonLock::acquire(env::lock_path()) {
        Ok(lock) => lock,
        Err(e) => {
            error!(error = %e, "failed to acquire daemon lock");
            return Err(Box::new(e));
        }
    };

    let service = Arc::new(OrchestratorService::new(env::project_dir())?);
    info!(
        instance_id = %service.orchestrator_instance_id(),
        "orchestrator daemon starting"
    );

    let port = env::bridge_port();
    let addr = format!("127.0.0.1:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "bridge listening");

    let app = bridge::router(service);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("orchestrator daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
