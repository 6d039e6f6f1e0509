//! Plain-HTTP liveness probe for the hosting platform.
//!
//! Served from its own OS thread and runtime so it keeps answering while the
//! session runtime is busy with a slow backend call.

use std::net::{SocketAddr, TcpListener};
use std::thread;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use tracing::{error, info};

use tutor_config::LivenessConfig;

pub const LIVENESS_BODY: &str = "Bot is running!";

#[derive(Debug)]
pub struct LivenessServer {
    local_addr: SocketAddr,
    _thread: thread::JoinHandle<()>,
}

impl LivenessServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

fn router() -> Router {
    Router::new().route("/", get(|| async { LIVENESS_BODY }))
}

/// Bind synchronously so a taken port fails startup, then serve in the
/// background for the life of the process.
pub fn spawn_liveness(config: &LivenessConfig) -> Result<LivenessServer> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener =
        TcpListener::bind(&addr).with_context(|| format!("failed to bind liveness listener on {addr}"))?;
    listener.set_nonblocking(true)?;
    let local_addr = listener.local_addr()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build liveness runtime")?;

    let thread = thread::Builder::new()
        .name("liveness".into())
        .spawn(move || {
            runtime.block_on(async move {
                let listener = match tokio::net::TcpListener::from_std(listener) {
                    Ok(listener) => listener,
                    Err(err) => {
                        error!(?err, "liveness listener could not be registered");
                        return;
                    }
                };
                if let Err(err) = axum::serve(listener, router()).await {
                    error!(?err, "liveness server exited");
                }
            });
        })
        .context("failed to spawn liveness thread")?;

    info!("liveness probe listening on http://{local_addr}");
    Ok(LivenessServer {
        local_addr,
        _thread: thread,
    })
}
