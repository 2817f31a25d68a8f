use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::io;
use tracing::{error, info};

use stock_intraday::api::AlphaVantageClient;
use stock_intraday::chart;
use stock_intraday::data_collector::{DataCollector, PipelineReport};
use stock_intraday::database_sqlx::DatabaseManagerSqlx;
use stock_intraday::models::{ArtifactPaths, Config, TIME_SERIES_KEY};
use stock_intraday::utils::init_logging;
use stock_intraday::EtlError;

#[derive(Parser)]
#[command(
    name = "stock-intraday",
    version,
    about = "Fetch, cache and store TSLA 30-minute intraday bars"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Refresh the JSON cache if it is not from today, then write CSV and MySQL (default)
    Run,
    /// Chart one trading day from the CSV artifact
    Plot {
        /// Date to chart (YYYY-MM-DD); prompts on stdin when omitted
        #[arg(long)]
        date: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let workdir = std::env::current_dir().context("cannot determine working directory")?;
    let paths = ArtifactPaths::in_dir(&workdir);
    let logging = init_logging(&paths.log_file).context("failed to set up logging")?;
    info!("📝 Appending log to {}", logging.log_path().display());

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            // Nothing touches the network or the database before this succeeds
            let config = match Config::from_env() {
                Ok(config) => config,
                Err(e) => {
                    error!("{}", e);
                    std::process::exit(1);
                }
            };
            info!("📋 Configuration loaded: {:?}", config);

            match run_pipeline(&config, paths).await {
                Ok(report) => info!(
                    "✅ {} rows written to CSV, {} rows written to MySQL",
                    report.csv_rows, report.db_rows
                ),
                Err(e) if e.is_fatal_schema() => {
                    error!("{} key not detected or malformed: {}. Exiting program...", TIME_SERIES_KEY, e);
                    std::process::exit(1);
                }
                Err(e) => {
                    error!("❌ Pipeline failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Plot { date } => {
            if let Err(e) = run_plot(&paths, date.as_deref()) {
                error!("❌ Plotting failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn run_pipeline(config: &Config, paths: ArtifactPaths) -> Result<PipelineReport, EtlError> {
    let client = AlphaVantageClient::new(config)?;
    let database = DatabaseManagerSqlx::new(config);
    let collector = DataCollector::new(client, database, paths);

    let today = Local::now().date_naive();
    collector.run(today).await
}

fn run_plot(paths: &ArtifactPaths, date: Option<&str>) -> Result<(), EtlError> {
    let date = match date {
        Some(raw) => chart::parse_date(raw)?,
        None => chart::prompt_for_date(&mut io::stdin().lock(), &mut io::stdout())?,
    };

    chart::plot_day(&paths.csv, date, &paths.plot_dir)?;
    Ok(())
}
