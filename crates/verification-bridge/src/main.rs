//! Verification Bridge - Entry point.

use anyhow::Context;
use code_ledger::VerificationLedger;
use std::net::SocketAddr;
use std::sync::Arc;
use telegram_client::TelegramClient;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use verification_bridge::{
    api::{create_router_with_rate_limit, AppState, RateLimitState},
    bot::Bot,
    commands::{CommandHandler, HelpHandler, StartHandler},
    Config, HandleDirectory, LocalRegistrationBackend, Store, VerificationService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.log.level);

    info!("Starting Verification Bridge");

    let telegram = TelegramClient::new(
        &config.telegram.api_url,
        &config.telegram.bot_token,
        config.telegram.request_timeout,
    )
    .context("Failed to create Telegram client")?;

    match telegram.get_me().await {
        Ok(me) => info!(
            "Telegram bot ready: @{}",
            me.username.as_deref().unwrap_or("unknown")
        ),
        Err(e) => warn!("Telegram health check failed - will retry on polling: {}", e),
    }

    // Load handle directory
    let store = if config.directory.persist {
        Store::file(config.directory.path.clone())
    } else {
        info!("Persistence disabled, using in-memory directory");
        Store::memory()
    };
    let directory = Arc::new(HandleDirectory::load_all(store).await);

    let ledger = VerificationLedger::new(config.ledger.code_ttl);
    let sweeper = ledger.spawn_sweeper(config.ledger.sweep_interval);

    let service = Arc::new(VerificationService::new(
        directory.clone(),
        ledger,
        Arc::new(telegram.clone()),
        Arc::new(LocalRegistrationBackend),
    ));

    let handlers: Vec<Box<dyn CommandHandler>> = vec![
        Box::new(StartHandler::new(directory)),
        Box::new(HelpHandler::new()),
    ];
    let bot = Bot::new(telegram, handlers);

    let limits = RateLimitState::new(
        config.rate_limit.send_per_minute,
        config.rate_limit.verify_per_minute,
    );
    let pruner = {
        let limits = limits.clone();
        let interval = config.ledger.sweep_interval;
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                limits.prune();
            }
        })
    };
    let app = create_router_with_rate_limit(AppState::new(service), limits);

    let addr = SocketAddr::new(
        config
            .server
            .listen_addr
            .parse()
            .with_context(|| format!("Invalid listen address {}", config.server.listen_addr))?,
        config.server.port,
    );
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on {}", addr);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let server = {
        let mut rx = shutdown_rx.clone();
        axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = rx.changed().await;
        })
    };

    let bot_task = {
        let mut rx = shutdown_rx;
        tokio::spawn(bot.run(config.telegram.poll_timeout, async move {
            let _ = rx.changed().await;
        }))
    };

    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    if let Err(e) = server.await {
        error!("Server error: {}", e);
    }

    if let Err(e) = bot_task.await {
        error!("Bot task failed: {}", e);
    }
    sweeper.abort();
    pruner.abort();

    info!("Shutting down...");
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
