use anyhow::{bail, Context as _};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use talentdeck::config::{AppConfig, LogFormat, CONFIG_ENV_VAR};
use talentdeck::domain::{InviteStatus, Role};
use talentdeck::services::{auth, invites, CreateInviteInput};
use talentdeck::storage::{
    BackendType, InviteFilter, MarketplaceStorage, Page, StorageFactory,
};
use talentdeck::validation::Validate;
use talentdeck::web::{self, AppState};
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::EnvFilter;

/// Invite-only talent marketplace
#[derive(Parser)]
#[command(name = "talentdeck", version)]
#[command(about = "Invite-only talent marketplace server", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve pages and the procedure API
    Serve {
        /// Create this administrator at startup if no account has the email
        #[arg(long, env = "TALENTDECK_ADMIN_EMAIL", requires = "admin_password")]
        admin_email: Option<String>,

        #[arg(long, env = "TALENTDECK_ADMIN_PASSWORD", hide_env_values = true)]
        admin_password: Option<String>,
    },
    /// Manage administrator accounts
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
    /// Issue and inspect invites
    Invite {
        #[command(subcommand)]
        command: InviteCommands,
    },
    /// Database schema management
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Create an administrator account
    Create {
        #[arg(long)]
        email: String,

        #[arg(long, env = "TALENTDECK_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long, default_value = "Administrator")]
        display_name: String,
    },
    /// List accounts, newest first
    List {
        /// admin, founder or talent
        #[arg(long)]
        role: Option<Role>,
    },
}

#[derive(Subcommand)]
enum InviteCommands {
    /// Issue an invite and print its accept link
    Create {
        #[arg(long)]
        email: String,

        /// admin, founder or talent
        #[arg(long)]
        role: Role,

        #[arg(long)]
        note: Option<String>,
    },
    /// List invites
    List {
        /// pending, accepted, expired or revoked
        #[arg(long)]
        status: Option<InviteStatus>,
    },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Create the PostgreSQL tables and indexes if missing
    Init,
}

fn init_tracing(verbose: u8, config: &AppConfig) {
    let level = match verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        2 => "trace",
        _ => "trace,hyper=debug,tower=debug,sqlx=debug", // -vvv keeps dependency noise at debug
    };
    let filter = if verbose == 0 {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose >= 2)
        .with_thread_ids(verbose >= 3)
        .with_line_number(verbose >= 3);

    match config.logging.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(cli.verbose, &config);

    debug!("talentdeck started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    let result = match cli.command {
        Commands::Serve {
            admin_email,
            admin_password,
        } => run_serve(config, admin_email, admin_password).await,
        Commands::Admin { command } => run_admin_command(config, command).await,
        Commands::Invite { command } => run_invite_command(config, command).await,
        Commands::Schema { command } => run_schema_command(config, command).await,
    };

    if let Err(e) = result {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn open_storage(config: &AppConfig) -> anyhow::Result<Arc<dyn MarketplaceStorage>> {
    StorageFactory::from_config(&config.storage)
        .await
        .context("failed to open storage")
}

/// One-shot commands against the memory backend would lose their writes
fn warn_if_ephemeral(config: &AppConfig) {
    if config.storage.backend == BackendType::Memory {
        warn!("storage.backend is memory; changes made by this command are discarded on exit");
    }
}

async fn run_serve(
    config: AppConfig,
    admin_email: Option<String>,
    admin_password: Option<String>,
) -> anyhow::Result<()> {
    let storage = open_storage(&config).await?;

    if let (Some(email), Some(password)) = (admin_email, admin_password) {
        let existing = storage
            .accounts()
            .find_by_email(&talentdeck::validation::normalize_email(&email))
            .await?;
        if existing.is_none() {
            let account =
                auth::create_admin(storage.as_ref(), &email, &password, "Administrator", Utc::now())
                    .await?;
            info!(account_id = %account.id, "Bootstrapped administrator");
        }
    }

    let purged = storage.sessions().purge_expired(Utc::now()).await?;
    if purged > 0 {
        info!(purged, "Removed expired sessions");
    }

    let state = AppState::new(storage, config)?;
    web::serve(state).await?;
    Ok(())
}

async fn run_admin_command(config: AppConfig, command: AdminCommands) -> anyhow::Result<()> {
    warn_if_ephemeral(&config);
    let storage = open_storage(&config).await?;

    match command {
        AdminCommands::Create {
            email,
            password,
            display_name,
        } => {
            let account =
                auth::create_admin(storage.as_ref(), &email, &password, &display_name, Utc::now())
                    .await?;
            println!("Created administrator {} ({})", account.email, account.id);
        }
        AdminCommands::List { role } => {
            let page = Page::new(talentdeck::storage::types::MAX_PAGE_SIZE, 0);
            let accounts = storage.accounts().list(role, page).await?;
            if accounts.is_empty() {
                println!("No accounts found.");
            }
            for account in accounts {
                println!(
                    "{}  {:<7} {}  {}",
                    account.id,
                    account.role,
                    account.created_at.format("%Y-%m-%d"),
                    account.email
                );
            }
        }
    }
    Ok(())
}

async fn run_invite_command(config: AppConfig, command: InviteCommands) -> anyhow::Result<()> {
    warn_if_ephemeral(&config);
    let storage = open_storage(&config).await?;

    match command {
        InviteCommands::Create { email, role, note } => {
            let input = CreateInviteInput { email, role, note };
            input.validate()?;
            let issued =
                invites::create_invite(storage.as_ref(), &config, None, &input, Utc::now()).await?;
            println!(
                "Invite for {} as {} expires {}",
                issued.invite.email,
                issued.invite.role,
                issued.invite.expires_at.format("%Y-%m-%d %H:%M UTC")
            );
            println!("{}", issued.accept_url);
        }
        InviteCommands::List { status } => {
            let filter = InviteFilter {
                status,
                email: None,
                page: Page::new(talentdeck::storage::types::MAX_PAGE_SIZE, 0),
            };
            let list = invites::list_invites(storage.as_ref(), &filter, Utc::now()).await?;
            if list.is_empty() {
                println!("No invites found.");
            }
            for invite in list {
                println!(
                    "{}  {:<8} {:<9} {}  {}",
                    invite.id,
                    invite.role,
                    invite.status,
                    invite.expires_at.format("%Y-%m-%d"),
                    invite.email
                );
            }
        }
    }
    Ok(())
}

async fn run_schema_command(config: AppConfig, command: SchemaCommands) -> anyhow::Result<()> {
    match command {
        SchemaCommands::Init => {
            if config.storage.backend != BackendType::Postgres {
                bail!("schema init needs storage.backend = \"postgres\"");
            }
            // Opening the PostgreSQL backend creates any missing tables
            let storage = open_storage(&config).await?;
            let health = storage.health_check().await?;
            if !health.healthy {
                bail!("database unhealthy: {}", health.errors.join("; "));
            }
            println!("Schema ready ({} ms)", health.latency_ms);
        }
    }
    Ok(())
}
