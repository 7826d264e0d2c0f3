use std::path::PathBuf;

use crossbeam_channel::{Receiver, Sender};

use crate::application::session::{PreparedPayload, PredictionView};
use crate::domain::forecast::{Horizon, Window};
use crate::domain::input_mode::InputMode;
use crate::domain::ports::ApiCall;

/// Where an uploaded CSV comes from.
#[derive(Debug, Clone)]
pub enum UploadSource {
    Path(PathBuf),
    /// In-memory contents, e.g. a file dropped onto the window.
    Bytes { name: String, bytes: Vec<u8> },
}

impl UploadSource {
    pub fn name(&self) -> String {
        match self {
            UploadSource::Path(path) => path.display().to_string(),
            UploadSource::Bytes { name, .. } => name.clone(),
        }
    }
}

/// Requests sent from the UI to the background session worker.
#[derive(Debug, Clone)]
pub enum DashboardCommand {
    SetMode(InputMode),
    SetTicker(String),
    SetWindow(Window),
    SetHorizon(Horizon),
    SetApiUrl(String),
    PrepareRemote,
    PrepareLocal,
    PrepareUpload(UploadSource),
    CheckHealth,
    FetchMetadata,
    Predict,
}

impl DashboardCommand {
    /// Whether the worker answers this command with exactly one terminal event.
    pub fn is_request(&self) -> bool {
        !matches!(
            self,
            DashboardCommand::SetMode(_)
                | DashboardCommand::SetTicker(_)
                | DashboardCommand::SetWindow(_)
                | DashboardCommand::SetHorizon(_)
                | DashboardCommand::SetApiUrl(_)
        )
    }
}

/// Results sent back from the worker to the UI.
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    Health(ApiCall),
    Metadata(ApiCall),
    PayloadPrepared(PreparedPayload),
    /// An input change invalidated the prepared payload.
    PayloadCleared,
    PrepareFailed { message: String, informational: bool },
    Prediction(PredictionView),
    Log(String),
}

impl DashboardEvent {
    /// Marks the end of an in-flight request.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DashboardEvent::PayloadCleared | DashboardEvent::Log(_))
    }
}

/// UI-side handle on the background worker.
/// Abstracts away the channels so the UI only sends commands and polls events.
pub struct DashboardClient {
    cmd_tx: Sender<DashboardCommand>,
    event_rx: Receiver<DashboardEvent>,
    log_rx: Receiver<String>,
}

impl DashboardClient {
    pub fn new(
        cmd_tx: Sender<DashboardCommand>,
        event_rx: Receiver<DashboardEvent>,
        log_rx: Receiver<String>,
    ) -> Self {
        Self {
            cmd_tx,
            event_rx,
            log_rx,
        }
    }

    pub fn send(&self, cmd: DashboardCommand) -> anyhow::Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|e| anyhow::anyhow!("Failed to send dashboard command: {}", e))
    }

    /// Non-blocking: worker results first, then log lines.
    pub fn poll_next(&self) -> Option<DashboardEvent> {
        if let Ok(event) = self.event_rx.try_recv() {
            return Some(event);
        }
        self.log_rx.try_recv().ok().map(DashboardEvent::Log)
    }
}
