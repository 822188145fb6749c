use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use futures::StreamExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use vk_video_bot::channels::{Channel, VkChannel};
use vk_video_bot::config::BotConfig;
use vk_video_bot::conversation::Dispatcher;
use vk_video_bot::status::{StatusState, status_routes};
use vk_video_bot::store::{BackupManager, Database, LibSqlBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BotConfig::from_env().unwrap_or_else(|e| {
        eprintln!("❌ Error: {e}");
        eprintln!("  export VK_TOKEN=... VK_GROUP_ID=...");
        std::process::exit(1);
    });

    // Keep the guard alive so buffered log lines are flushed on exit.
    let _log_guard = init_tracing(&config.log_file);

    eprintln!("🤖 VK Video Bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Group: {}", config.vk_group_id);
    eprintln!("   Status: http://0.0.0.0:{}/", config.port);

    // ── Database ─────────────────────────────────────────────────────────
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&config.db_path, config.storage_timeout)
            .await
            .with_context(|| format!("opening database at {}", config.db_path.display()))?,
    );
    eprintln!("   Database: {}", config.db_path.display());

    // ── Status server ────────────────────────────────────────────────────
    let backups = Arc::new(BackupManager::new(Arc::clone(&db), &config.backup_dir));
    eprintln!("   Backups: {}", backups.dir().display());
    let app = status_routes(StatusState {
        db: Arc::clone(&db),
        backups,
    });
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("binding status server port {}", config.port))?;
    let port = config.port;
    tokio::spawn(async move {
        tracing::info!(port, "Status server started");
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Status server stopped: {e}");
        }
    });

    // ── Channel + dispatcher ─────────────────────────────────────────────
    let channel = Arc::new(VkChannel::new(config.vk_token.clone(), config.vk_group_id.clone()));
    channel
        .health_check()
        .await
        .context("checking VK community credentials")?;
    let mut events = channel.start().await.context("starting VK long poll")?;
    let dispatcher = Dispatcher::new(db, channel, config.dispatch.clone());

    tracing::info!("Bot started, waiting for messages");

    // Events are handled one at a time, in arrival order.
    while let Some(event) = events.next().await {
        dispatcher.handle(&event).await;
    }

    tracing::warn!("Inbound stream ended, shutting down");
    Ok(())
}

/// Log to stderr and to `log_file`, filtered by `RUST_LOG` (default `info`).
fn init_tracing(log_file: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = log_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "bot.log".into());

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    guard
}
