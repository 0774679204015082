//! fx-gateway: Messenger exchange rate bot
//!
//! Usage:
//!   fx-gateway                  - Serve the Messenger webhook
//!   fx-gateway --setup-profile  - Register greeting and menu, then exit
//!   fx-gateway --help           - Show help

use fx_core::Config;
use fx_messenger::{
    InMemorySessionStore, MessageHandler, MessengerApi, PageProfile, WebhookState,
    start_webhook_server,
};
use fx_rates::RateClient;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Run mode
#[derive(Debug, PartialEq, Eq)]
enum RunMode {
    /// Serve the webhook
    Server,
    /// Register the Messenger profile and exit
    SetupProfile,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mode = parse_args(std::env::args().skip(1));

    match mode {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("fx-gateway {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        _ => {}
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    dotenvy::dotenv().ok();

    let config = Config::load().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    let messenger = MessengerApi::from_config(&config.messenger, &config.http)
        .map_err(|e| anyhow::anyhow!("Failed to create Messenger client: {}", e))?;

    match mode {
        RunMode::SetupProfile => {
            messenger
                .set_messenger_profile(&PageProfile::default_profile())
                .await
                .map_err(|e| anyhow::anyhow!("Failed to register profile: {}", e))?;
            Ok(())
        }
        RunMode::Server => run_server(config, messenger).await,
        _ => Ok(()),
    }
}

/// Parse command line arguments
fn parse_args(args: impl Iterator<Item = String>) -> RunMode {
    for arg in args {
        match arg.as_str() {
            "--setup-profile" => return RunMode::SetupProfile,
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Server
}

/// Print help message
fn print_help() {
    println!("fx-gateway - Messenger exchange rate bot");
    println!();
    println!("Usage:");
    println!("  fx-gateway                  Serve the Messenger webhook");
    println!("  fx-gateway --setup-profile  Register greeting, Get Started and menu, then exit");
    println!("  fx-gateway --help           Show this help message");
    println!("  fx-gateway --version        Show version");
    println!();
    println!("Configuration is read from ./fx-gateway.toml when present.");
    println!();
    println!("Environment Variables:");
    println!("  MESSENGER_PAGE_TOKEN        Page access token (required)");
    println!("  MESSENGER_VERIFY_TOKEN      Webhook verify token (default: GoBot)");
    println!("  MESSENGER_API_URL           Graph API base URL (default: https://graph.facebook.com/v3.1)");
    println!("  MESSENGER_REGISTER_PROFILE  Register the profile on startup (default: false)");
    println!("  RATES_URL                   Bank XML rate feed");
    println!("  SERVER_PORT                 Webhook port (default: 8080)");
    println!("  HTTP_TIMEOUT_SECS           Outbound request timeout (default: 30)");
}

/// Serve the webhook until Ctrl+C
async fn run_server(config: Config, messenger: MessengerApi) -> anyhow::Result<()> {
    tracing::info!("Starting fx-gateway...");
    tracing::info!("Rate feed: {}", config.rates.url);

    if config.messenger.register_profile {
        if let Err(e) = messenger
            .set_messenger_profile(&PageProfile::default_profile())
            .await
        {
            tracing::warn!("Messenger profile registration failed: {}", e);
        }
    }

    let rates = RateClient::new(config.rates.url.clone(), config.http.timeout())
        .map_err(|e| anyhow::anyhow!("Failed to create rate client: {}", e))?;

    let handler = Arc::new(MessageHandler::new(
        Arc::new(messenger),
        Arc::new(rates),
        InMemorySessionStore::new(),
    ));

    let state = WebhookState {
        verify_token: config.messenger.verify_token.clone(),
        handler,
    };

    tracing::info!("Press Ctrl+C to exit");

    start_webhook_server(state, config.server.port, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
        tracing::info!("Shutting down...");
    })
    .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
