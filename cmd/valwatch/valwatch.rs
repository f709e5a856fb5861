use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use valwatch::{
    cli::CLI,
    initializers::{init_http_client, init_notifier, init_registry, init_tracing},
};
use valwatch_monitor::{Monitor, SnapshotCache, status_server};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let CLI { opts } = CLI::parse();

    init_tracing(&opts)?;

    let config = opts.monitor_config()?;
    let client = init_http_client(&config)?;
    let registry = init_registry(&opts)?;
    let notifier = init_notifier(&opts);

    let cancel_token = CancellationToken::new();
    let cache = SnapshotCache::new();

    let status_server = match opts.status_addr {
        Some(addr) => {
            let listener = TcpListener::bind(addr).await?;
            Some(tokio::spawn(status_server::serve(
                listener,
                cache.clone(),
                cancel_token.clone(),
            )))
        }
        None => None,
    };

    let monitor = Monitor::new(config, client, cache, notifier, registry);
    let monitor_task = tokio::spawn(monitor.run(cancel_token.clone()));

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal, stopping");
    cancel_token.cancel();

    monitor_task.await?;
    if let Some(server) = status_server {
        if let Err(error) = server.await? {
            error!(error = %error, "status server failed");
        }
    }

    Ok(())
}
