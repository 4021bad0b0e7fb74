use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use app_launcher::config::ServeOverrides;
use app_launcher::logging::{self, Verbosity};

mod cmd;

pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

#[derive(Parser)]
#[command(name = "app-launcher")]
#[command(version, about = "Personal app launcher: a grid of shortcuts behind a small HTTP API")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Launcher server to talk to
    #[arg(long, global = true, env = "LAUNCHER_SERVER", default_value = DEFAULT_SERVER)]
    pub server: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the launcher HTTP server
    Serve {
        /// Interface to bind (defaults to launcher.toml, then 127.0.0.1)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (defaults to launcher.toml, then 5000)
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite database file
        #[arg(long)]
        db_path: Option<PathBuf>,

        /// Postgres or SQLite connection URL
        #[arg(long)]
        database_url: Option<String>,

        /// Keep everything in memory; nothing survives a restart
        #[arg(long)]
        in_memory: bool,

        /// Let any client create apps without an access code
        #[arg(long)]
        open_creates: bool,

        /// Enable permissive CORS for a separately served front end
        #[arg(long)]
        dev: bool,

        /// Path to launcher.toml
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show the launcher grid
    List {
        /// Case-insensitive match on name or URL
        #[arg(short, long)]
        search: Option<String>,

        /// "all", "uncategorized", or an exact category name
        #[arg(short, long, default_value = "all")]
        category: String,
    },
    /// Add an app
    Add {
        name: String,
        url: String,

        #[arg(short, long)]
        category: Option<String>,

        #[arg(long, env = "ACCESS_CODE", hide_env_values = true)]
        access_code: Option<String>,
    },
    /// Remove an app by id
    Remove { id: String },
    /// Move an app to the position of another, as a drag-and-drop would
    Move {
        id: String,

        /// Id of the app it is dropped onto
        #[arg(long)]
        onto: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    logging::init_subscriber(Verbosity::from_flags(cli.verbose, cli.quiet), cli.log_json)?;
    if let Err(e) = dotenv
        && !e.not_found()
    {
        tracing::warn!(error = %e, "Ignoring unreadable .env file");
    }

    match &cli.command {
        Commands::Serve {
            host,
            port,
            db_path,
            database_url,
            in_memory,
            open_creates,
            dev,
            config,
        } => {
            let overrides = ServeOverrides {
                host: host.clone(),
                port: *port,
                dev: *dev,
                in_memory: *in_memory,
                database_url: database_url.clone(),
                db_path: db_path.clone(),
                open_creates: *open_creates,
            };
            cmd::cmd_serve(config.as_deref(), overrides).await?;
        }
        Commands::List { search, category } => {
            cmd::cmd_list(&cli.server, search.as_deref(), category).await?;
        }
        Commands::Add {
            name,
            url,
            category,
            access_code,
        } => {
            cmd::cmd_add(
                &cli.server,
                name,
                url,
                category.as_deref(),
                access_code.as_deref(),
            )
            .await?;
        }
        Commands::Remove { id } => {
            cmd::cmd_remove(&cli.server, id).await?;
        }
        Commands::Move { id, onto } => {
            cmd::cmd_move(&cli.server, id, onto).await?;
        }
    }

    Ok(())
}
