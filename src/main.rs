use forecast_dashboard::application::client::DashboardClient;
use forecast_dashboard::application::worker::SessionWorker;
use forecast_dashboard::config::Config;
use forecast_dashboard::interfaces::dashboard::DashboardApp;

use anyhow::Context;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

// A writer that sends logs to the UI via a crossbeam channel
struct ChannelWriter {
    sender: crossbeam_channel::Sender<String>,
}

impl std::io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let msg = String::from_utf8_lossy(buf).to_string();
        let _ = self.sender.try_send(msg);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// Cloneable wrapper for MakeWriter
#[derive(Clone)]
struct ChannelWriterFactory {
    sender: crossbeam_channel::Sender<String>,
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for ChannelWriterFactory {
    type Writer = ChannelWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ChannelWriter {
            sender: self.sender.clone(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    // 0. Load Env (before starting anything)
    dotenvy::dotenv().ok();

    // 1. Create Log Channel
    let (log_tx, log_rx) = crossbeam_channel::bounded(1024);

    // 2. Setup Logging (Stdout + UI)
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .pretty();

    let ui_layer = tracing_subscriber::fmt::layer()
        .with_writer(ChannelWriterFactory { sender: log_tx })
        .with_ansi(false) // No color codes for UI text
        .with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .with(ui_layer)
        .init();

    info!("Forecast Dashboard {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Configuration loaded: API={}, provider={:?}, ticker={}",
        config.api.base_url, config.market_data.provider, config.dashboard.ticker
    );

    // 3. Session worker on a background Tokio runtime thread
    let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
    let (event_tx, event_rx) = crossbeam_channel::unbounded();
    let _worker = SessionWorker::from_config(&config).spawn(cmd_rx, event_tx);

    let client = DashboardClient::new(cmd_tx, event_rx, log_rx);
    let app = DashboardApp::new(client, &config);

    // 4. Run UI (Blocks Main Thread)
    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Forecast Dashboard")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Forecast Dashboard",
        native_options,
        Box::new(|_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow::anyhow!("Eframe error: {}", e))?;

    Ok(())
}
