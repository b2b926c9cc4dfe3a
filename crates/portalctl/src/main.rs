//! Alumni Portal command line client.

mod commands;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alumni_portal_client::{ClientConfig, Portal, PortalError};

#[derive(Parser)]
#[command(name = "portalctl")]
#[command(version, about = "Alumni Portal command line client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Backend URL (overrides PORTAL_BACKEND_URL)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Session file (overrides PORTAL_SESSION_FILE)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        #[arg(short, long)]
        email: String,

        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,

        /// Use the admin login endpoint
        #[arg(long)]
        admin: bool,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami {
        /// Ask the backend instead of reading the cached user
        #[arg(long)]
        refresh: bool,
    },

    /// Browse the alumni directory
    Alumni(DirectoryArgs),

    /// Browse the faculty directory
    Faculty(DirectoryArgs),

    /// List alumni departments
    Departments,

    /// Notification commands
    Notifications {
        #[command(subcommand)]
        command: NotificationCommand,
    },

    /// Job postings
    Jobs {
        #[command(subcommand)]
        command: JobCommand,
    },

    /// Events
    Events {
        #[command(subcommand)]
        command: EventCommand,
    },

    /// Admin site content
    Content {
        #[command(subcommand)]
        command: ContentCommand,
    },
}

#[derive(clap::Args)]
pub struct DirectoryArgs {
    /// Free-text search
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Department filter
    #[arg(short, long, default_value = "")]
    pub department: String,

    /// Passout year filter
    #[arg(short, long, default_value = "")]
    pub year: String,

    /// Reveal this many extra pages after the first
    #[arg(long, default_value_t = 0)]
    pub more: usize,

    /// Print every match, ignoring paging
    #[arg(long)]
    pub all: bool,

    /// Emit JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum NotificationCommand {
    /// List notifications
    List {
        /// Only unread
        #[arg(long)]
        unread: bool,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        limit: Option<u32>,
    },
    /// Mark one notification read
    Read { id: String },
    /// Mark every notification read
    ReadAll,
    /// Delete a notification
    Delete { id: String },
    /// Poll and print the unread count until interrupted
    Watch,
}

#[derive(Subcommand)]
pub enum JobCommand {
    List {
        #[arg(long)]
        json: bool,
    },
    Show { id: String },
}

#[derive(Subcommand)]
pub enum EventCommand {
    List {
        #[arg(long)]
        json: bool,
    },
    Show { id: String },
    /// Register for an event
    Register { id: String },
}

#[derive(Subcommand)]
pub enum ContentCommand {
    /// Print one section, or every section
    Get { section: Option<String> },
    /// Replace a section with the JSON in a file
    Set {
        section: String,
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Upload an image for a section
    Upload {
        section: String,
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,portalctl=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<PortalError>() {
                Some(PortalError::Unauthorized) => {
                    eprintln!("Session expired. Run `portalctl login` to sign in again.");
                }
                Some(portal_error) => eprintln!("Error: {}", portal_error.detail()),
                None => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.backend_url {
        config.base_url = alumni_portal_client::config::resolve_base_url(Some(&url), "")?;
    }
    if let Some(path) = cli.session_file {
        config.session_file = path;
    }

    tracing::debug!(base_url = %config.base_url, session_file = %config.session_file.display(), "Configuration loaded");

    let portal = Portal::from_config(config);

    match cli.command {
        Commands::Login {
            email,
            password,
            admin,
        } => commands::login(&portal, &email, password, admin).await,
        Commands::Logout => {
            commands::logout(&portal);
            Ok(())
        }
        Commands::Whoami { refresh } => commands::whoami(&portal, refresh).await,
        Commands::Alumni(args) => {
            commands::browse(portal.alumni_browser(), &args).await
        }
        Commands::Faculty(args) => {
            commands::browse(portal.faculty_browser(), &args).await
        }
        Commands::Departments => commands::departments(&portal).await,
        Commands::Notifications { command } => commands::notifications(&portal, command).await,
        Commands::Jobs { command } => commands::jobs(&portal, command).await,
        Commands::Events { command } => commands::events(&portal, command).await,
        Commands::Content { command } => commands::content(&portal, command).await,
    }
}
