//! orgmirror CLI - command-line driver for the GitHub organization mirror.

mod commands;
mod config;
mod progress;
mod shutdown;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orgmirror")]
#[command(version)]
#[command(about = "Mirror GitHub organizations into a local database")]
#[command(
    long_about = "orgmirror copies organizations, repositories, issues, pull requests, \
comments, reviews, labels, members, maintainers, events and ZenHub pipelines into a \
relational database. Issue, issue comment and review comment passes are incremental: \
each run only fetches what changed since the previous run started."
)]
#[command(after_long_help = r#"EXAMPLES
    Mirror everything for the configured organizations:
        $ orgmirror sync

    Only issues and pull requests:
        $ orgmirror sync --filter issues,prs

    Create or upgrade the database schema:
        $ orgmirror migrate up

    Generate shell completions:
        $ orgmirror completions bash > ~/.local/share/bash-completion/completions/orgmirror

CONFIGURATION
    orgmirror reads configuration from:
      1. ~/.config/orgmirror/config.toml (or $XDG_CONFIG_HOME/orgmirror/config.toml)
      2. ./orgmirror.toml
      3. Environment variables (ORGMIRROR_* prefix, e.g., ORGMIRROR_GITHUB_TOKEN)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    ORGMIRROR_DATABASE_URL    Database connection string (default: ~/.local/state/orgmirror/orgmirror.db)
    ORGMIRROR_GITHUB_TOKEN    GitHub personal access token
    ORGMIRROR_ZENHUB_TOKEN    ZenHub API token (pipelines are skipped without one)
    RUST_LOG                  Log filter (default: orgmirror=info,orgmirror_cli=info)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mirror the configured organizations
    Sync {
        /// Entity kinds to sync, comma separated
        /// (issues, prs, maintainers, members, labels, zenhub, repocomments, events).
        /// Empty means everything.
        #[arg(short, long, default_value = "")]
        filter: String,
    },
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("orgmirror=info,orgmirror_cli=info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(Term::stderr().is_term())
        .with_target(false)
        .init();

    // Load configuration (config file -> env vars -> defaults)
    let config = config::Config::load()?;

    let cli = Cli::parse();

    // Handle commands that don't require database access first
    match &cli.command {
        Commands::Completions { shell } => {
            commands::meta::handle_completions(*shell)?;
            return Ok(());
        }
        Commands::Man { output } => {
            commands::meta::handle_man(output.clone())?;
            return Ok(());
        }
        _ => {}
    }

    let database_url = config
        .database_url()
        .ok_or("unable to determine a database URL; set ORGMIRROR_DATABASE_URL")?;

    if let Some(path) = sqlite_path(&database_url) {
        prepare_sqlite_dir(path)?;
    }

    match cli.command {
        Commands::Sync { filter } => {
            let cancel = shutdown::shutdown_token();
            commands::sync::handle_sync(&filter, &config, &database_url, cancel).await?;
        }
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Completions { .. } | Commands::Man { .. } => {}
    }

    Ok(())
}

/// File path of a `sqlite://` URL, without query parameters.
fn sqlite_path(database_url: &str) -> Option<&Path> {
    let rest = database_url.strip_prefix("sqlite://")?;
    let path = rest.split_once('?').map_or(rest, |(path, _)| path);
    (!path.is_empty()).then(|| Path::new(path))
}

fn prepare_sqlite_dir(path: &Path) -> std::io::Result<()> {
    if path.is_relative() {
        tracing::warn!(path = %path.display(), "SQLite path is relative to the working directory");
    }
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir),
        _ => Ok(()),
    }
}
