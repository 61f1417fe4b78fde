use std::sync::Arc;
use tokio::sync::RwLock;

use boardhost::api::ApiServer;
use boardhost::backend::local::LocalBackend;
use boardhost::config::GlobalConfig;
use boardhost::registry::InstanceRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("Boardhost daemon starting");

    let cfg = GlobalConfig::load()?;
    if let Some(base) = &cfg.base_dir {
        tracing::info!("Relative logdirs resolve against '{}'", base.display());
    }

    let backend = Arc::new(LocalBackend::detect(cfg.integration_mode));
    let registry = Arc::new(RwLock::new(InstanceRegistry::new(&cfg, backend)));

    // Graceful shutdown: signal every ingester, then exit
    let registry_shutdown = registry.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received, cleaning up...");

        let mut reg = registry_shutdown.write().await;
        let count = reg.len();
        reg.terminate_all();
        tracing::info!("Terminated {} board instances, exiting", count);
        std::process::exit(0);
    });

    let api_server = ApiServer::new(registry, &cfg.listen_addr);
    if let Err(e) = api_server.start().await {
        tracing::error!("API server error: {}", e);
    }

    tracing::info!("Boardhost daemon shutting down");
    Ok(())
}
