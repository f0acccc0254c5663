//! portero: a login echo HTTP service
//!
//! Listens on a configured port, exposes `POST /login`, and echoes the
//! decoded credential record back as JSON. Runs until externally
//! terminated.

use portero_core::{handlers, Server, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = ServerConfig::default();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()?;

    runtime.block_on(run(config))
}

async fn run(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let port = config.port;

    let mut server = Server::new(config);
    server.post("/login", handlers::login)?;

    // A bind failure is fatal: propagate it before announcing anything
    let bound = server.bind()?;

    info!(port, "login route registered, listener bound");
    println!("Servidor escuchando en el puerto {}...", port);

    bound.serve().await?;
    Ok(())
}
