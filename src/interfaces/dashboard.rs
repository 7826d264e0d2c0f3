//! Single-window egui dashboard.
//!
//! Sidebar: API URL, health/metadata checks, input mode and its inputs.
//! Central panel: loaded history preview, prepared payload, predict button,
//! forecast table and chart.
//! All network work happens on the background worker; this side only sends
//! commands and applies the events coming back.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;

use eframe::egui;

use crate::application::client::{DashboardClient, DashboardCommand, DashboardEvent, UploadSource};
use crate::application::payload_builder::DATE_FORMAT;
use crate::application::session::{PredictionReport, PredictionView, PreparedPayload};
use crate::config::Config;
use crate::domain::forecast::{Horizon, Window};
use crate::domain::input_mode::InputMode;
use crate::domain::ports::ApiCall;
use crate::interfaces::design_system::DesignSystem;
use crate::interfaces::forecast_chart::{render_forecast_chart, render_history_chart};
use crate::interfaces::report::{self, PAYLOAD_PREVIEW_CHARS};

const MAX_LOG_LINES: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone)]
struct Notice {
    text: String,
    severity: Severity,
}

pub struct DashboardApp {
    client: DashboardClient,

    // Inputs, mirrored to the worker on change
    api_url: String,
    mode: InputMode,
    ticker: String,
    window: u32,
    horizon: Horizon,
    csv_path: String,

    /// Label of the request currently in flight.
    in_flight: Option<&'static str>,

    payload: Option<PreparedPayload>,
    notice: Option<Notice>,
    health: Option<ApiCall>,
    metadata: Option<ApiCall>,
    prediction: Option<PredictionView>,
    logs: VecDeque<String>,
}

impl DashboardApp {
    pub fn new(client: DashboardClient, config: &Config) -> Self {
        Self {
            client,
            api_url: config.api.base_url.clone(),
            mode: InputMode::default(),
            ticker: config.dashboard.ticker.clone(),
            window: config.dashboard.window.get(),
            horizon: config.dashboard.horizon,
            csv_path: String::new(),
            in_flight: None,
            payload: None,
            notice: None,
            health: None,
            metadata: None,
            prediction: None,
            logs: VecDeque::with_capacity(MAX_LOG_LINES),
        }
    }

    fn send(&mut self, cmd: DashboardCommand, label: &'static str) {
        if cmd.is_request() {
            if self.in_flight.is_some() {
                return;
            }
            self.in_flight = Some(label);
        }
        if let Err(e) = self.client.send(cmd) {
            tracing::error!("Dashboard: {}", e);
            self.in_flight = None;
            self.notice = Some(Notice {
                text: format!("Background worker unavailable: {}", e),
                severity: Severity::Error,
            });
        }
    }

    /// Local state reset for an input change; the worker does the same.
    fn inputs_changed(&mut self) {
        self.payload = None;
        self.prediction = None;
        self.notice = None;
    }

    fn apply(&mut self, event: DashboardEvent) {
        if event.is_terminal() {
            self.in_flight = None;
        }

        match event {
            DashboardEvent::Health(call) => self.health = Some(call),
            DashboardEvent::Metadata(call) => self.metadata = Some(call),
            DashboardEvent::PayloadPrepared(payload) => {
                self.notice = Some(Notice {
                    text: report::payload_summary(&payload),
                    severity: Severity::Info,
                });
                self.payload = Some(payload);
                self.prediction = None;
            }
            DashboardEvent::PayloadCleared => self.payload = None,
            DashboardEvent::PrepareFailed {
                message,
                informational,
            } => {
                self.payload = None;
                self.notice = Some(Notice {
                    text: message,
                    severity: if informational {
                        Severity::Info
                    } else {
                        Severity::Error
                    },
                });
            }
            DashboardEvent::Prediction(view) => self.prediction = Some(view),
            DashboardEvent::Log(line) => {
                if self.logs.len() == MAX_LOG_LINES {
                    self.logs.pop_front();
                }
                self.logs.push_back(line.trim_end().to_string());
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().next() else {
            return;
        };
        if self.mode != InputMode::Upload {
            self.mode = InputMode::Upload;
            self.inputs_changed();
            self.send(DashboardCommand::SetMode(InputMode::Upload), "mode");
        }

        let source = match (file.path, file.bytes) {
            (Some(path), _) => {
                self.csv_path = path.display().to_string();
                UploadSource::Path(path)
            }
            (None, Some(bytes)) => UploadSource::Bytes {
                name: file.name,
                bytes: bytes.to_vec(),
            },
            (None, None) => return,
        };
        self.send(DashboardCommand::PrepareUpload(source), "Loading CSV");
    }

    // --- Sidebar ---

    fn render_sidebar(&mut self, ui: &mut egui::Ui) {
        let busy = self.in_flight.is_some();

        ui.heading("Forecast Dashboard");
        ui.separator();

        ui.label(egui::RichText::new("API").strong());
        let url_edit = ui.add(
            egui::TextEdit::singleline(&mut self.api_url).desired_width(f32::INFINITY),
        );
        if url_edit.lost_focus() {
            let url = self.api_url.clone();
            self.send(DashboardCommand::SetApiUrl(url), "url");
        }
        ui.horizontal(|ui| {
            if ui.add_enabled(!busy, egui::Button::new("Check health")).clicked() {
                self.send(DashboardCommand::CheckHealth, "Checking health");
            }
            if ui.add_enabled(!busy, egui::Button::new("Metadata")).clicked() {
                self.send(DashboardCommand::FetchMetadata, "Fetching metadata");
            }
        });

        ui.add_space(DesignSystem::SPACING_MEDIUM);
        ui.label(egui::RichText::new("History source").strong());
        let previous_mode = self.mode;
        for mode in InputMode::ALL {
            ui.radio_value(&mut self.mode, mode, mode.label());
        }
        if self.mode != previous_mode {
            self.inputs_changed();
            self.send(DashboardCommand::SetMode(self.mode), "mode");
        }
        ui.label(
            egui::RichText::new(self.mode.description())
                .small()
                .color(DesignSystem::TEXT_SECONDARY),
        );

        ui.add_space(DesignSystem::SPACING_SMALL);
        if self.mode.needs_ticker() {
            ui.horizontal(|ui| {
                ui.label("Ticker");
                if ui.text_edit_singleline(&mut self.ticker).changed() {
                    self.inputs_changed();
                    let ticker = self.ticker.clone();
                    self.send(DashboardCommand::SetTicker(ticker), "ticker");
                }
            });
        }

        let slider = ui.add(
            egui::Slider::new(&mut self.window, Window::MIN..=Window::MAX)
                .step_by(f64::from(Window::STEP))
                .text("Window"),
        );
        if slider.changed()
            && let Ok(window) = Window::new(self.window)
        {
            self.inputs_changed();
            self.send(DashboardCommand::SetWindow(window), "window");
        }

        let previous_horizon = self.horizon;
        egui::ComboBox::from_label("Horizon")
            .selected_text(self.horizon.to_string())
            .show_ui(ui, |ui| {
                for horizon in Horizon::ALL {
                    ui.selectable_value(&mut self.horizon, horizon, horizon.to_string());
                }
            });
        if self.horizon != previous_horizon {
            self.inputs_changed();
            self.send(DashboardCommand::SetHorizon(self.horizon), "horizon");
        }

        ui.add_space(DesignSystem::SPACING_SMALL);
        match self.mode {
            InputMode::RemoteFetch => {
                if ui.add_enabled(!busy, egui::Button::new("Build payload")).clicked() {
                    self.send(DashboardCommand::PrepareRemote, "Building payload");
                }
            }
            InputMode::LocalFetch => {
                if ui.add_enabled(!busy, egui::Button::new("Fetch history")).clicked() {
                    self.send(DashboardCommand::PrepareLocal, "Fetching history");
                }
            }
            InputMode::Upload => {
                ui.horizontal(|ui| {
                    ui.label("CSV");
                    ui.text_edit_singleline(&mut self.csv_path);
                });
                let can_load = !busy && !self.csv_path.trim().is_empty();
                if ui.add_enabled(can_load, egui::Button::new("Load CSV")).clicked() {
                    let path = PathBuf::from(self.csv_path.trim());
                    self.send(
                        DashboardCommand::PrepareUpload(UploadSource::Path(path)),
                        "Loading CSV",
                    );
                }
                ui.label(
                    egui::RichText::new("or drop a CSV file onto the window")
                        .small()
                        .color(DesignSystem::TEXT_SECONDARY),
                );
            }
        }

        ui.add_space(DesignSystem::SPACING_MEDIUM);
        ui.separator();
        ui.label(egui::RichText::new("Logs").strong());
        egui::ScrollArea::vertical()
            .auto_shrink([false, true])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for line in &self.logs {
                    let color = if line.contains("ERROR") {
                        DesignSystem::DANGER
                    } else if line.contains("WARN") {
                        DesignSystem::WARNING
                    } else {
                        DesignSystem::TEXT_SECONDARY
                    };
                    ui.label(egui::RichText::new(line).small().color(color));
                }
            });
    }

    // --- Central panel ---

    fn render_central(&mut self, ui: &mut egui::Ui) {
        if let Some(label) = self.in_flight {
            ui.horizontal(|ui| {
                ui.add(egui::Spinner::new());
                ui.label(label);
            });
        }

        if let Some(notice) = &self.notice {
            let color = match notice.severity {
                Severity::Info => DesignSystem::INFO,
                Severity::Error => DesignSystem::DANGER,
            };
            ui.colored_label(color, &notice.text);
            ui.add_space(DesignSystem::SPACING_SMALL);
        }

        if self.health.is_some() || self.metadata.is_some() {
            DesignSystem::section(ui, "API STATUS", |ui| {
                if let Some(call) = &self.health {
                    render_call(ui, "Health", call);
                }
                if let Some(call) = &self.metadata {
                    render_call(ui, "Metadata", call);
                }
            });
        }

        let mut predict_clicked = false;
        DesignSystem::section(ui, "PAYLOAD", |ui| match &self.payload {
            Some(payload) => {
                if let (Some(loaded), Some(history)) =
                    (report::history_loaded(payload), &payload.history)
                {
                    ui.colored_label(DesignSystem::SUCCESS, loaded);
                    render_history_chart(ui, "history_preview", history, history.len());
                    ui.add_space(DesignSystem::SPACING_SMALL);
                }
                ui.label(report::payload_summary(payload));
                egui::CollapsingHeader::new("Preview")
                    .default_open(false)
                    .show(ui, |ui| {
                        let preview = payload.request.preview(PAYLOAD_PREVIEW_CHARS);
                        ui.add(
                            egui::TextEdit::multiline(&mut preview.as_str())
                                .code_editor()
                                .desired_width(f32::INFINITY),
                        );
                    });
                ui.add_space(DesignSystem::SPACING_SMALL);
                predict_clicked = ui
                    .add_enabled(self.in_flight.is_none(), egui::Button::new("Predict"))
                    .clicked();
            }
            None => {
                ui.label(
                    egui::RichText::new("No payload prepared for the current inputs.")
                        .color(DesignSystem::TEXT_SECONDARY),
                );
            }
        });
        if predict_clicked {
            self.send(DashboardCommand::Predict, "Predicting");
        }

        if let Some(view) = &self.prediction {
            DesignSystem::section(ui, "FORECAST", |ui| render_prediction(ui, view));
        }
    }
}

fn render_call(ui: &mut egui::Ui, title: &str, call: &ApiCall) {
    let color = if call.outcome.is_ok() {
        DesignSystem::SUCCESS
    } else {
        DesignSystem::DANGER
    };
    ui.colored_label(color, format!("{}: {}", title, report::status_line(call)));
    if let Some(body) = report::body_json(call) {
        egui::CollapsingHeader::new(format!("{} response", title))
            .default_open(false)
            .show(ui, |ui| {
                ui.add(
                    egui::TextEdit::multiline(&mut body.as_str())
                        .code_editor()
                        .desired_width(f32::INFINITY),
                );
            });
    }
}

fn render_prediction(ui: &mut egui::Ui, view: &PredictionView) {
    match view {
        PredictionView::PayloadRequired => {
            ui.colored_label(DesignSystem::WARNING, "Prepare a payload first.");
        }
        PredictionView::Failed { message, elapsed } => {
            ui.colored_label(
                DesignSystem::DANGER,
                format!("FAILED ({:.3}s): {}", elapsed.as_secs_f64(), message),
            );
        }
        PredictionView::Completed(report) => render_report(ui, report),
    }
}

fn render_report(ui: &mut egui::Ui, report: &PredictionReport) {
    ui.colored_label(
        DesignSystem::SUCCESS,
        format!("OK ({:.3}s)", report.elapsed.as_secs_f64()),
    );

    if let Some(notice) = report.notice() {
        ui.colored_label(DesignSystem::INFO, notice);
    } else {
        egui::Grid::new("forecast_table")
            .striped(true)
            .num_columns(2)
            .show(ui, |ui| {
                ui.label(egui::RichText::new("Date").strong());
                ui.label(egui::RichText::new("Predicted close").strong());
                ui.end_row();
                for point in &report.points {
                    ui.label(point.date.format(DATE_FORMAT).to_string());
                    ui.label(format!("{:.4}", point.predicted_close));
                    ui.end_row();
                }
            });

        ui.add_space(DesignSystem::SPACING_SMALL);
        render_forecast_chart(ui, "forecast_chart", &report.series, report.points.len());
    }

    let raw = serde_json::to_string_pretty(&report.raw).unwrap_or_default();
    egui::CollapsingHeader::new("Raw response")
        .default_open(false)
        .show(ui, |ui| {
            ui.add(
                egui::TextEdit::multiline(&mut raw.as_str())
                    .code_editor()
                    .desired_width(f32::INFINITY),
            );
        });
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(DesignSystem::theme());

        // --- 1. Apply worker events and logs ---
        while let Some(event) = self.client.poll_next() {
            self.apply(event);
        }
        self.handle_dropped_files(ctx);

        // --- 2. Sidebar ---
        egui::SidePanel::left("inputs_panel")
            .default_width(320.0)
            .min_width(260.0)
            .resizable(true)
            .show(ctx, |ui| self.render_sidebar(ui));

        // --- 3. Results ---
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| self.render_central(ui));
        });

        // Keep polling while a request runs and for incoming logs
        let delay = if self.in_flight.is_some() { 50 } else { 250 };
        ctx.request_repaint_after(Duration::from_millis(delay));
    }
}
