//! `storefront` entry point.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use storefront_core::ProductId;
use storefront_desktop::session::AutoConfirm;
use storefront_desktop::terminal::{self, TerminalPrompt};
use storefront_desktop::{CatalogService, PurchaseOutcome, Storefront};
use storefront_infra::config::DEFAULT_CONFIG_PATH;
use storefront_infra::{AppConfig, DatabaseConfig, SqlCatalogStore, StoreError};

#[derive(Debug, Parser)]
#[command(name = "storefront", version, about = "Browse the product catalog and buy items")]
struct Cli {
    /// Properties file with DB_URL, DB_USER and DB_PASSWORD.
    #[arg(long, short, env = "STOREFRONT_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the catalog and exit.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Buy one unit of a product.
    Buy {
        id: ProductId,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
    /// Interactive shell (default).
    Shell,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading database credentials: {err}");
            return ExitCode::FAILURE;
        }
    };

    storefront_observability::init(config.log_format);

    let store = match open_store(&config.database) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("Invalid database configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    let service = CatalogService::new(store);
    match service.check_connection().await {
        Ok(()) => tracing::info!("database connection successful"),
        Err(err) => tracing::error!(error = %err, "database connection failed"),
    }

    let mut storefront = Storefront::new(service);
    match run(cli.command.unwrap_or(Command::Shell), &mut storefront).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = ?err, "storefront failed");
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// A missing driver is logged and tolerated; every later call reports it.
fn open_store(config: &DatabaseConfig) -> Result<SqlCatalogStore, StoreError> {
    match SqlCatalogStore::connect_lazy(config) {
        Err(StoreError::DriverUnavailable(scheme)) => {
            tracing::error!(%scheme, "no database driver for configured URL");
            Ok(SqlCatalogStore::unavailable(scheme, config.query_timeout))
        }
        other => other,
    }
}

async fn run(command: Command, storefront: &mut Storefront<SqlCatalogStore>) -> anyhow::Result<ExitCode> {
    let stdout = std::io::stdout();

    match command {
        Command::List { json } => {
            if let Err(err) = storefront.refresh().await {
                eprintln!("[{}] Error retrieving products: {err}", err.title());
                return Ok(ExitCode::FAILURE);
            }
            let mut out = stdout.lock();
            if json {
                serde_json::to_writer_pretty(&mut out, storefront.snapshot())
                    .context("failed to serialize catalog")?;
                writeln!(out)?;
            } else {
                write!(out, "{}", terminal::render_catalog(storefront.snapshot(), None))?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Buy { id, yes } => {
            if let Err(err) = storefront.refresh().await {
                eprintln!("[{}] Error retrieving products: {err}", err.title());
                return Ok(ExitCode::FAILURE);
            }

            let result = if yes {
                storefront.buy(id, &mut AutoConfirm).await
            } else {
                let mut prompt = TerminalPrompt::new(std::io::stdin().lock(), stdout.lock());
                storefront.buy(id, &mut prompt).await
            };

            let mut out = stdout.lock();
            terminal::report_purchase(&mut out, &result)?;
            Ok(match result {
                Ok(PurchaseOutcome::Purchased { .. } | PurchaseOutcome::Cancelled) => ExitCode::SUCCESS,
                Err(_) => ExitCode::FAILURE,
            })
        }
        Command::Shell => {
            let mut prompt = TerminalPrompt::new(std::io::stdin().lock(), stdout.lock());
            terminal::run_shell(storefront, &mut prompt)
                .await
                .context("terminal I/O failed")?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
