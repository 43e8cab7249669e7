use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use configuration::{BootstrapSettings, Config, SeedErrorPolicy};
use database::{bootstrap, connect, DbRepository};
use std::net::SocketAddr;
use std::path::PathBuf;
use web_server::{run_server, shutdown_signal, AppState};

mod telemetry;

/// The main entry point for the sales tracking application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = configuration::load_config(cli.config.as_deref())?;
    let _log_guard = telemetry::init(&config.logging)?;

    match cli.command {
        Commands::Serve(args) => {
            args.apply(&mut config.bootstrap);
            serve(config).await
        }
        Commands::Bootstrap(args) => {
            args.apply(&mut config.bootstrap);
            bootstrap_only(config).await
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Records customers, products and sales, and reports monthly revenue.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to an optional `salesapp.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepare the database, then serve the web application.
    Serve(BootstrapArgs),
    /// Prepare the database and exit.
    Bootstrap(BootstrapArgs),
}

#[derive(Args)]
struct BootstrapArgs {
    /// Drop and recreate all tables. Existing data is lost.
    #[arg(long)]
    reset: bool,

    /// Directory with customers.csv, products.csv and sales.csv, loaded on reset.
    #[arg(long)]
    seed_dir: Option<PathBuf>,

    /// What to do with a seed row that cannot be inserted.
    #[arg(long, value_enum)]
    on_seed_error: Option<SeedErrorPolicy>,
}

impl BootstrapArgs {
    /// Flags override the configuration file; absent flags leave it alone.
    fn apply(self, settings: &mut BootstrapSettings) {
        settings.reset |= self.reset;
        if let Some(dir) = self.seed_dir {
            settings.seed_dir = Some(dir);
        }
        if let Some(policy) = self.on_seed_error {
            settings.on_seed_error = policy;
        }
    }
}

// ==============================================================================
// Commands
// ==============================================================================

/// Runs the bootstrapper, then serves until a shutdown signal arrives.
///
/// A failed bootstrap is logged and the server starts anyway; requests then
/// fail with 500 until the database is usable.
async fn serve(config: Config) -> anyhow::Result<()> {
    let pool = connect(&config.database);

    match bootstrap::run(&config.database, &config.bootstrap, &pool).await {
        Ok(report) => tracing::info!(?report, "Bootstrap complete."),
        Err(e) => tracing::error!(error = %e, "Bootstrap did not complete; some routes may fail until the database is ready."),
    }

    let state = AppState::new(DbRepository::new(pool.clone()), config.report.year);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let served = run_server(addr, state, &config.server.public_dir, shutdown_signal()).await;

    pool.close().await;
    served
}

/// Runs only the bootstrapper; a failure is the process exit status.
async fn bootstrap_only(config: Config) -> anyhow::Result<()> {
    let pool = connect(&config.database);
    let result = bootstrap::run(&config.database, &config.bootstrap, &pool).await;
    pool.close().await;

    let report = result.context("Bootstrap failed")?;
    tracing::info!(?report, "Bootstrap complete.");
    Ok(())
}
