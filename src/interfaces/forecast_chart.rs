use chrono::{Datelike, NaiveDate};
use eframe::egui;
use egui_plot::{Legend, Line, Plot};

use crate::domain::ohlcv::History;
use crate::interfaces::design_system::DesignSystem;

/// Plot x coordinate of a calendar date.
pub fn day_number(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

pub fn day_label(value: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(value.round() as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Splits the combined close series into the historical part and the
/// forecast (its last `forecast_len` points). The forecast line starts at the
/// last historical point so the two lines join.
pub fn split_series(
    series: &[(NaiveDate, f64)],
    forecast_len: usize,
) -> (Vec<[f64; 2]>, Vec<[f64; 2]>) {
    let split = series.len().saturating_sub(forecast_len);
    let to_point = |&(d, v): &(NaiveDate, f64)| [day_number(d), v];

    let history: Vec<[f64; 2]> = series[..split].iter().map(to_point).collect();
    let mut forecast: Vec<[f64; 2]> = Vec::with_capacity(forecast_len + 1);
    if let Some(last) = history.last() {
        forecast.push(*last);
    }
    forecast.extend(series[split..].iter().map(to_point));
    (history, forecast)
}

/// Close prices of the last `tail` records as plot points.
pub fn history_points(history: &History, tail: usize) -> Vec<[f64; 2]> {
    history
        .closes(tail)
        .iter()
        .map(|&(d, close)| [day_number(d), close])
        .collect()
}

/// Close-price preview of a loaded history, shown before any prediction.
pub fn render_history_chart(ui: &mut egui::Ui, id: &str, history: &History, tail: usize) {
    let points = history_points(history, tail);

    Plot::new(id)
        .height(220.0)
        .show_grid([true, true])
        .x_axis_formatter(|mark, _range| day_label(mark.value))
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new("Close", points).color(DesignSystem::HISTORY_LINE));
        });
}

pub fn render_forecast_chart(
    ui: &mut egui::Ui,
    id: &str,
    series: &[(NaiveDate, f64)],
    forecast_len: usize,
) {
    let (history, forecast) = split_series(series, forecast_len);

    Plot::new(id)
        .height(320.0)
        .show_grid([true, true])
        .legend(Legend::default())
        .x_axis_formatter(|mark, _range| day_label(mark.value))
        .show(ui, |plot_ui| {
            if !history.is_empty() {
                plot_ui.line(
                    Line::new("Close", history).color(DesignSystem::HISTORY_LINE),
                );
            }
            plot_ui.line(Line::new("Forecast", forecast).color(DesignSystem::FORECAST_LINE));
        });
}
