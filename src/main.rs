use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

mod domain;
mod application;
mod infrastructure;

use application::errors::ConfigError;
use application::messaging::MessageDispatcher;
use application::services::{CommandService, ReferralService};
use domain::entities::User;
use domain::traits::{Bot, Store};
use infrastructure::adapters::console::ConsoleAdapter;
use infrastructure::adapters::slack::{SlackAdapter, SocketModeClient};
use infrastructure::config::Config;
use infrastructure::storage::{AirtableStore, MemoryStore};

#[derive(Parser)]
#[command(name = "referral-bot")]
#[command(about = "Slack bot that hands out and tracks club referral codes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Slack over Socket Mode and serve commands
    Run,
    /// Type slash commands locally instead of using Slack
    Console {
        /// User id the commands run as
        #[arg(long, default_value = "U0CONSOLE")]
        user_id: String,

        /// Display name used for new codes
        #[arg(long, default_value = "console")]
        name: String,

        /// Email stored with new codes
        #[arg(long)]
        email: Option<String>,
    },
    /// Show version
    Version,
    /// Generate default config
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    if dotenv::dotenv().is_ok() {
        tracing::debug!("Loaded .env");
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => with_runtime(run_slack(load_config(&cli.config))),
        Commands::Console { user_id, name, email } => {
            let user = User::new(user_id).with_username(name);
            with_runtime(run_console(load_config(&cli.config), user, email))
        }
        Commands::Version => {
            println!("referral-bot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig { force } => init_config(&cli.config, force),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

type AppResult = Result<(), Box<dyn std::error::Error>>;

fn with_runtime(fut: impl std::future::Future<Output = AppResult>) -> AppResult {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(fut)
}

/// Config file if present, then environment variables on top
fn load_config(path: &str) -> Config {
    let config = if std::path::Path::new(path).exists() {
        Config::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::default()
        })
    } else {
        Config::default()
    };
    config.with_env()
}

async fn run_slack(config: Config) -> AppResult {
    config.validate()?;
    let slack_credentials = config.slack_credentials()?;
    let airtable = config
        .airtable_credentials()?
        .ok_or_else(|| ConfigError::MissingField("airtable.base-id (AIRTABLE_BASE_ID)".to_string()))?;

    if config.slack.signing_secret.is_none() {
        tracing::debug!("No signing secret configured; Socket Mode authenticates with the app token");
    }

    tracing::info!("Starting {} against table {}", config.bot.name, airtable.table_name);
    let store = Arc::new(AirtableStore::new(airtable.api_key, airtable.base_id, airtable.table_name));

    let slack = Arc::new(SlackAdapter::new(slack_credentials.bot_token, slack_credentials.app_token));
    let info = slack.start().await?;
    tracing::info!(
        "Connected as {} ({}) in {}",
        info.name,
        info.id,
        info.team.as_deref().unwrap_or("unknown team")
    );

    let commands = Arc::new(CommandService::new(
        ReferralService::new(store),
        slack.clone(),
        &config.referral.apply_url,
    ));
    let client = SocketModeClient::new(slack, MessageDispatcher::new(commands))
        .with_reconnect_delay(Duration::from_secs(config.bot.reconnect_delay_secs));

    tracing::info!("Referral bot is running!");
    tokio::select! {
        result = client.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }

    Ok(())
}

async fn run_console(config: Config, user: User, email: Option<String>) -> AppResult {
    let store: Arc<dyn Store> = match config.airtable_credentials()? {
        Some(airtable) => {
            tracing::info!("Using Airtable table {}", airtable.table_name);
            Arc::new(AirtableStore::new(airtable.api_key, airtable.base_id, airtable.table_name))
        }
        None => {
            tracing::info!("Airtable not configured, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let mut console = ConsoleAdapter::new();
    if let Some(email) = email {
        console = console.with_email(email);
    }
    let info = console.start().await?;
    tracing::debug!("Console bot {} ({})", info.name, info.id);
    let console = Arc::new(console);

    let commands = Arc::new(CommandService::new(
        ReferralService::new(store),
        console.clone(),
        &config.referral.apply_url,
    ));

    console.run(commands, user).await?;
    Ok(())
}

fn init_config(path: &str, force: bool) -> AppResult {
    if std::path::Path::new(path).exists() && !force {
        return Err(format!("{} already exists (use --force to overwrite)", path).into());
    }

    std::fs::write(path, Config::default().to_yaml()?)?;
    println!("Wrote default config to {}", path);
    println!("Secrets can also come from SLACK_BOT_TOKEN, SLACK_APP_TOKEN, SLACK_SIGNING_SECRET, AIRTABLE_BASE_ID and AIRTABLE_API_KEY");
    Ok(())
}
