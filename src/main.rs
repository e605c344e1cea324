//! CLI entry point for the what3words order sync service.
//!
//! Provides subcommands for provisioning the encryption key, managing the
//! per-shop what3words API key, and replaying `orders/create` webhook bodies
//! against the Shopify Admin API.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use w3w_order_sync::{
    config::AppConfig,
    crypto::{EncryptionKey, EnvelopeCodec},
    fetch::{BasicClient, auth::AccessToken},
    infra::shopify::ShopifyAdminClient,
    reconcile::Reconciler,
    settings::{FileSettingsStore, SettingsError, SettingsService},
    webhook::{WebhookContext, handle_orders_create},
};

#[derive(Parser)]
#[command(name = "w3w_order_sync")]
#[command(about = "Stores what3words API keys and syncs w3w addresses onto Shopify orders", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a fresh base64 key for APP_ENCRYPTION_KEY
    GenerateKey,
    #[command(flatten)]
    Configured(ConfiguredCommand),
}

/// Commands that load `AppConfig` before running.
#[derive(Subcommand)]
enum ConfiguredCommand {
    /// Validate configuration and print a summary
    CheckConfig,
    /// Encrypt and store the what3words API key for a shop
    SaveSettings {
        /// Shop domain, e.g. store-name.myshopify.com
        #[arg(long)]
        shop: String,

        /// what3words API key
        #[arg(long, env = "W3W_API_KEY", hide_env_values = true)]
        api_key: String,
    },
    /// Show whether a shop has an API key configured
    SettingsStatus {
        #[arg(long)]
        shop: String,
    },
    /// Run orders/create webhook handling for a JSON payload file
    ProcessOrder {
        #[arg(long)]
        shop: String,

        /// Path to the webhook body
        #[arg(long, value_name = "FILE")]
        payload: String,

        #[arg(long, default_value = "orders/create")]
        topic: String,

        #[arg(long, default_value = "manual")]
        webhook_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/w3w_order_sync.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("w3w_order_sync.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::GenerateKey => println!("{}", EncryptionKey::generate().to_base64()),
        Commands::Configured(command) => run(command).await?,
    }

    Ok(())
}

/// Runs a command that needs configuration. Loading fails fast on an
/// unusable encryption key.
async fn run(command: ConfiguredCommand) -> Result<()> {
    let config = AppConfig::from_env()?;
    let codec = EnvelopeCodec::new(&config.encryption_key);
    let settings = SettingsService::new(FileSettingsStore::new(&config.settings_path), codec);

    match command {
        ConfiguredCommand::CheckConfig => {
            info!(
                app_url = %config.shopify.app_url,
                scopes = ?config.shopify.scopes,
                api_version = %config.api_version,
                settings_path = %config.settings_path.display(),
                "Configuration OK"
            );
        }
        ConfiguredCommand::SaveSettings { shop, api_key } => {
            match settings.save(&shop, &api_key).await {
                Ok(saved) => {
                    info!(shop = %saved.shop, updated_at = %saved.updated_at, "Settings saved");
                }
                Err(SettingsError::Invalid(errors)) => {
                    for message in [errors.shop, errors.api_key].into_iter().flatten() {
                        warn!("{message}");
                    }
                    anyhow::bail!("settings were not saved");
                }
                Err(e) => return Err(e.into()),
            }
        }
        ConfiguredCommand::SettingsStatus { shop } => {
            let status = settings.status(&shop).await?;
            if status.shop.is_empty() {
                warn!("Provide a shop domain like store-name.myshopify.com");
            }
            info!(
                shop = %status.shop,
                api_key_configured = status.has_api_key,
                updated_at = ?status.updated_at,
                "Settings status"
            );
        }
        ConfiguredCommand::ProcessOrder {
            shop,
            payload,
            topic,
            webhook_id,
        } => {
            process_order(&config, shop, &payload, topic, webhook_id).await?;
        }
    }

    Ok(())
}

/// Replays one webhook body. Without `SHOPIFY_ACCESS_TOKEN` the delivery is
/// treated like one for a shop with no active session.
#[tracing::instrument(skip(config))]
async fn process_order(
    config: &AppConfig,
    shop: String,
    payload_path: &str,
    topic: String,
    webhook_id: String,
) -> Result<()> {
    let body = std::fs::read(payload_path)
        .with_context(|| format!("failed to read payload '{payload_path}'"))?;

    let reconciler = match std::env::var("SHOPIFY_ACCESS_TOKEN") {
        Ok(token) if !token.trim().is_empty() => {
            let http = AccessToken::shopify(BasicClient::new()?, token.trim())?;
            Some(Reconciler::new(ShopifyAdminClient::new(
                http,
                &shop,
                &config.api_version,
            )))
        }
        _ => None,
    };

    let ctx = WebhookContext {
        topic,
        shop,
        webhook_id,
    };
    let response = handle_orders_create(&ctx, &body, reconciler.as_ref()).await;
    info!(status = response.status, outcome = ?response.outcome, "Webhook handled");

    if !response.is_success() {
        anyhow::bail!("webhook handling answered {}", response.status);
    }
    Ok(())
}
