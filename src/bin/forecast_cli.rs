//! Forecast CLI - headless client for the forecasting API
//!
//! Scripted counterpart of the dashboard: health and metadata checks, and a
//! one-shot prediction from any of the three history sources.
//!
//! # Usage
//! ```sh
//! cargo run --bin forecast-cli -- health
//! cargo run --bin forecast-cli -- predict --mode local --ticker MSFT --window 90 --horizon 1
//! cargo run --bin forecast-cli -- predict --mode upload --csv prices.csv
//! ```
//!
//! Environment variables are the same as for the dashboard (`API_BASE_URL`,
//! `MARKET_DATA_PROVIDER`, `DEFAULT_TICKER`, ...); flags override them.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use forecast_dashboard::application::session::PredictionView;
use forecast_dashboard::application::worker::SessionWorker;
use forecast_dashboard::config::Config;
use forecast_dashboard::domain::forecast::{Horizon, Window};
use forecast_dashboard::domain::input_mode::InputMode;
use forecast_dashboard::infrastructure::csv_import;
use forecast_dashboard::interfaces::report;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Forecasting API client", long_about = None)]
struct Cli {
    /// Forecasting API base URL (overrides API_BASE_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET /health
    Health,
    /// GET /metadata
    Metadata,
    /// Prepare a payload and POST /predict
    Predict {
        /// History source: remote, local or upload
        #[arg(short, long, default_value = "remote")]
        mode: InputMode,

        #[arg(short, long)]
        ticker: Option<String>,

        /// Number of most recent rows sent (30-180)
        #[arg(short, long)]
        window: Option<u32>,

        /// Forecast steps (1 or 5)
        #[arg(long)]
        horizon: Option<Horizon>,

        /// CSV file for upload mode
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Print the prepared payload before sending it
        #[arg(long)]
        show_payload: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with(stdout_layer)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(url) = cli.api_url {
        config = config.with_api_url(url);
    }
    info!("Forecast CLI {} -> {}", env!("CARGO_PKG_VERSION"), config.api.base_url);

    let mut worker = SessionWorker::from_config(&config);

    match cli.command {
        Commands::Health => {
            let call = worker.session().check_health().await;
            print!("{}", report::render_call("Health", &call));
            if call.outcome.is_err() {
                bail!("health check failed");
            }
        }
        Commands::Metadata => {
            let call = worker.session().fetch_metadata().await;
            print!("{}", report::render_call("Metadata", &call));
            if call.outcome.is_err() {
                bail!("metadata request failed");
            }
        }
        Commands::Predict {
            mode,
            ticker,
            window,
            horizon,
            csv,
            show_payload,
        } => {
            let session = worker.session_mut();
            session.set_mode(mode);
            if let Some(ticker) = ticker {
                session.set_ticker(&ticker);
            }
            if let Some(window) = window {
                session.set_window(Window::new(window)?);
            }
            if let Some(horizon) = horizon {
                session.set_horizon(horizon);
            }

            let prepared = match mode {
                InputMode::RemoteFetch => session.prepare_remote(),
                InputMode::LocalFetch => session.prepare_local().await,
                InputMode::Upload => {
                    let Some(path) = csv else {
                        bail!("--csv is required in upload mode");
                    };
                    session.prepare_upload(csv_import::import_file(&path))
                }
            };
            let payload = match prepared {
                Ok(payload) => payload,
                Err(e) if e.is_informational() => {
                    println!("{}", e);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            if let Some(loaded) = report::history_loaded(payload) {
                println!("{}", loaded);
            }
            println!("{}", report::payload_summary(payload));
            if show_payload {
                println!("{}", payload.request.preview(report::PAYLOAD_PREVIEW_CHARS));
            }

            let view = session.predict().await;
            print!("{}", report::render_prediction(&view));
            if matches!(view, PredictionView::Failed { .. }) {
                bail!("prediction request failed");
            }
        }
    }

    Ok(())
}
