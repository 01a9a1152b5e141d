// bases/download_server/src/main.rs
use clap::Parser;
use color_eyre::Result;
use media_downloader::MediaDownloader;
use tokio_util::sync::CancellationToken;

mod config;
mod error;
mod server;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "download_server=info,media_downloader=info,tower_http=info".into()
            }),
        )
        .init();

    let args = config::CliArgs::parse();
    let config = config::Config::from_args(args);

    tracing::info!(
        "Using fetcher '{}' and transcoder '{}'",
        config.downloader.fetcher,
        config.downloader.transcoder
    );
    let downloader = MediaDownloader::new(config.downloader.clone()).await?;

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            wait_for_signal().await;
            tracing::info!("Shutting down, cancelling in-flight downloads");
            shutdown.cancel();
        }
    });

    server::run(config, downloader, shutdown).await?;

    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            tracing::warn!("Could not register SIGTERM handler: {}", e);
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
            }
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
        _ = tokio::signal::ctrl_c() => tracing::info!("Received Ctrl+C"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
    }
}
