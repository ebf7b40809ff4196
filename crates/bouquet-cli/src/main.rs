mod config;
mod serve_cmd;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use bouquet_core::llm::GroqClient;
use bouquet_core::plan::PlanGenerator;
use bouquet_db::pool;
use bouquet_db::store::PgPlanStore;

use config::{BouquetConfig, CliOverrides};

#[derive(Parser)]
#[command(name = "bouquet", about = "Wedding plan service backed by PostgreSQL and an LLM")]
struct Cli {
    /// Database URL (overrides BOUQUET_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a bouquet config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/bouquet")]
        db_url: String,
        /// Browser origin allowed by CORS
        #[arg(long)]
        frontend_url: Option<String>,
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the bouquet database (requires config file or env vars)
    DbInit,
    /// Start the HTTP API server
    Serve {
        /// Address to bind to
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides PORT env var)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Execute the `bouquet init` command: write config file.
fn cmd_init(
    db_url: &str,
    frontend_url: Option<String>,
    port: Option<u16>,
    force: bool,
) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let mut cfg = config::ConfigFile::default();
    cfg.database.url = Some(db_url.to_string());
    cfg.server.frontend_url = frontend_url;
    cfg.server.port = port;

    config::save_config_to(&path, &cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    if let Some(url) = &cfg.server.frontend_url {
        println!("  server.frontend_url = {url}");
    }
    if let Some(port) = cfg.server.port {
        println!("  server.port = {port}");
    }
    println!();
    println!("Set GROQ_API_KEY (or llm.api_key in the config file) before serving.");
    println!("Next: run `bouquet db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `bouquet db-init` command: create database and run migrations.
async fn cmd_db_init(cli: &CliOverrides) -> anyhow::Result<()> {
    let resolved = BouquetConfig::resolve(cli)?;

    println!("Initializing bouquet database...");

    pool::ensure_database_exists(&resolved.db_config).await?;

    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let plans = pool::plan_count(&db_pool).await?;
    println!("Database ready. plans: {plans} rows");

    db_pool.close().await;

    println!("bouquet db-init complete.");
    Ok(())
}

/// Execute the `bouquet serve` command.
async fn cmd_serve(cli: &CliOverrides) -> anyhow::Result<()> {
    let resolved = BouquetConfig::resolve(cli)?;
    resolved.log_summary();

    let llm_config = resolved.llm.into_config()?;
    let client = GroqClient::new(&llm_config)?;
    let generator = PlanGenerator::from_config(Arc::new(client), &llm_config);
    tracing::info!(model = generator.model(), "plan generator ready");

    let db_pool = match pool::create_pool(&resolved.db_config).await {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "database connection failed");
            std::process::exit(1);
        }
    };
    tracing::info!("database connected");
    pool::run_migrations(&db_pool).await?;

    let state = serve_cmd::AppState::new(Arc::new(PgPlanStore::new(db_pool.clone())), generator);
    let result = serve_cmd::run_serve(state, &resolved.server).await;
    db_pool.close().await;
    result
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            frontend_url,
            port,
            force,
        } => {
            cmd_init(&db_url, frontend_url, port, force)?;
        }
        Commands::DbInit => {
            let overrides = CliOverrides {
                database_url: cli.database_url,
                ..CliOverrides::default()
            };
            cmd_db_init(&overrides).await?;
        }
        Commands::Serve { bind, port } => {
            let overrides = CliOverrides {
                database_url: cli.database_url,
                bind,
                port,
            };
            cmd_serve(&overrides).await?;
        }
    }

    Ok(())
}
