//! playerctl CLI - TiDB players table walkthrough
//!
//! Entry point for the `playerctl` command-line tool, which provides:
//! - The full create/read/update/delete demo (`run`, the default)
//! - A connectivity check (`ping`)
//! - Filtered reads of the players table (`query`)
//!
//! Connection parameters come from `TIDB_*` environment variables (and
//! `.env` files); the flags below override them.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use playerctl_db::{define_players, load_dotenv, ConnectionConfig, Filter, Predicate, Session};
use tracing::{error, info};

mod closing;
mod demo;
mod tracing_setup;

use closing::close_after;
use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "playerctl",
    author,
    version,
    about = "Create, read, update and delete players on TiDB",
    long_about = "Connects to a MySQL-compatible TiDB endpoint, recreates the players table \
                  and walks through one create/read/update/delete cycle."
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Overrides for the TIDB_* environment variables
#[derive(Args, Debug, Default)]
struct ConnectionArgs {
    /// Database host (overrides TIDB_HOST)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Database port (overrides TIDB_PORT)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// User name (overrides TIDB_USER)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Database name (overrides TIDB_DB_NAME)
    #[arg(long, global = true)]
    database: Option<String>,
}

impl ConnectionArgs {
    fn apply(self, mut config: ConnectionConfig) -> ConnectionConfig {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(user) = self.user {
            config.user = user;
        }
        if let Some(database) = self.database {
            config.database = database;
        }
        config
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recreate the players table and run the full CRUD walkthrough (default)
    Run,
    /// Connect, verify the connection and print its server-side id
    Ping,
    /// List players matching every --where predicate, one JSON object per line
    Query(QueryArgs),
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Predicate such as "coins > 300" or "goods le 200" (repeatable, ANDed)
    #[arg(long = "where", value_name = "PREDICATE")]
    predicates: Vec<Predicate>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = tracing_setup::init(&TracingConfig { debug: cli.debug }) {
        eprintln!("playerctl: logging disabled: {:#}", err);
    }
    load_dotenv();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ConnectionConfig::from_env().context("Invalid TIDB_* configuration")?;
    let config = cli.connection.apply(config);
    let mut session = Session::new(config);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => demo::run(&mut session).await,
        Commands::Ping => run_ping(&mut session).await,
        Commands::Query(args) => run_query(&mut session, args).await,
    }
}

async fn run_ping(session: &mut Session) -> Result<()> {
    let outcome = session.connection_id().await.context("Ping failed");
    let id = close_after(session, outcome, "Failed to close connection").await?;

    println!(
        "connected to {} (connection id {})",
        session.config().display_target(),
        id
    );
    Ok(())
}

async fn run_query(session: &mut Session, args: QueryArgs) -> Result<()> {
    let filter: Filter = args.predicates.into_iter().collect();
    info!(filter = %filter, "Reading players...");

    let outcome = async {
        let conn = session.connection().await?;
        define_players(conn).find_where(&filter).await
    }
    .await
    .context("Query failed");
    let players = close_after(session, outcome, "Failed to close connection").await?;

    for player in &players {
        println!("{}", serde_json::to_string(player)?);
    }
    info!(count = players.len(), "Read players.");
    Ok(())
}
