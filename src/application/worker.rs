//! Background worker owning the [`DashboardSession`].
//!
//! The UI thread never awaits: it sends [`DashboardCommand`]s over a channel
//! and the worker, running on its own tokio runtime thread, answers with
//! [`DashboardEvent`]s. Commands are handled one at a time, so at most one
//! request is in flight.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use tracing::{error, info};

use crate::application::client::{DashboardCommand, DashboardEvent, UploadSource};
use crate::application::session::{DashboardSession, PrepareError, PreparedPayload};
use crate::config::Config;
use crate::domain::errors::UploadError;
use crate::domain::ohlcv::History;
use crate::infrastructure::csv_import;
use crate::infrastructure::forecast_api::ForecastApiClient;
use crate::infrastructure::market_data::create_provider;

pub struct SessionWorker {
    session: DashboardSession,
    api_timeout: Duration,
}

impl SessionWorker {
    pub fn new(session: DashboardSession, api_timeout: Duration) -> Self {
        Self {
            session,
            api_timeout,
        }
    }

    /// Wires the real API client and the configured market-data provider.
    pub fn from_config(config: &Config) -> Self {
        let api = Arc::new(ForecastApiClient::new(
            config.api.base_url.clone(),
            config.api.timeout(),
        ));
        let provider = create_provider(&config.market_data);
        info!(
            "SessionWorker: API {} | market data via {}",
            config.api.base_url,
            provider.name()
        );
        Self::new(
            DashboardSession::from_config(config, api, provider),
            config.api.timeout(),
        )
    }

    pub fn session(&self) -> &DashboardSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut DashboardSession {
        &mut self.session
    }

    /// Applies one command and returns the events it produced.
    pub async fn handle(&mut self, cmd: DashboardCommand) -> Vec<DashboardEvent> {
        let had_payload = self.session.payload().is_some();

        let event = match cmd {
            DashboardCommand::SetMode(mode) => {
                self.session.set_mode(mode);
                None
            }
            DashboardCommand::SetTicker(ticker) => {
                self.session.set_ticker(&ticker);
                None
            }
            DashboardCommand::SetWindow(window) => {
                self.session.set_window(window);
                None
            }
            DashboardCommand::SetHorizon(horizon) => {
                self.session.set_horizon(horizon);
                None
            }
            DashboardCommand::SetApiUrl(url) => {
                let url = url.trim().to_string();
                if url != self.session.api_base_url() {
                    info!("SessionWorker: API base URL set to {}", url);
                    self.session
                        .set_api(Arc::new(ForecastApiClient::new(url, self.api_timeout)));
                }
                None
            }
            DashboardCommand::PrepareRemote => {
                Some(prepared(self.session.prepare_remote().cloned()))
            }
            DashboardCommand::PrepareLocal => {
                Some(prepared(self.session.prepare_local().await.cloned()))
            }
            DashboardCommand::PrepareUpload(source) => {
                let name = source.name();
                info!("SessionWorker: Loading CSV {}", name);
                let upload = import(&source);
                let event = prepared(self.session.prepare_upload(upload).cloned());
                Some(match event {
                    DashboardEvent::PrepareFailed { message, informational } => {
                        DashboardEvent::PrepareFailed {
                            message: format!("{}: {}", name, message),
                            informational,
                        }
                    }
                    other => other,
                })
            }
            DashboardCommand::CheckHealth => {
                Some(DashboardEvent::Health(self.session.check_health().await))
            }
            DashboardCommand::FetchMetadata => {
                Some(DashboardEvent::Metadata(self.session.fetch_metadata().await))
            }
            DashboardCommand::Predict => {
                Some(DashboardEvent::Prediction(self.session.predict().await))
            }
        };

        let mut events = Vec::with_capacity(2);
        if had_payload && self.session.payload().is_none() {
            events.push(DashboardEvent::PayloadCleared);
        }
        events.extend(event);
        events
    }

    /// Runs the worker on a dedicated thread with its own tokio runtime until
    /// the command channel closes.
    pub fn spawn(
        mut self,
        cmd_rx: Receiver<DashboardCommand>,
        event_tx: Sender<DashboardEvent>,
    ) -> JoinHandle<()> {
        std::thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    error!("SessionWorker: Failed to build Tokio runtime: {}", e);
                    return;
                }
            };
            info!("SessionWorker: Background runtime started");

            while let Ok(cmd) = cmd_rx.recv() {
                for event in rt.block_on(self.handle(cmd)) {
                    if event_tx.send(event).is_err() {
                        info!("SessionWorker: UI disconnected, stopping");
                        return;
                    }
                }
            }
            info!("SessionWorker: Command channel closed, stopping");
        })
    }
}

fn prepared(result: Result<PreparedPayload, PrepareError>) -> DashboardEvent {
    match result {
        Ok(payload) => DashboardEvent::PayloadPrepared(payload),
        Err(e) => DashboardEvent::PrepareFailed {
            informational: e.is_informational(),
            message: e.to_string(),
        },
    }
}

fn import(source: &UploadSource) -> Result<History, UploadError> {
    match source {
        UploadSource::Path(path) => csv_import::import_file(path),
        UploadSource::Bytes { bytes, .. } => csv_import::import_bytes(bytes),
    }
}
