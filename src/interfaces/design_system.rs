use eframe::egui;

/// Dark theme shared by the dashboard panels
pub struct DesignSystem;

impl DesignSystem {
    // --- Colors ---

    pub const BG_WINDOW: egui::Color32 = egui::Color32::from_rgb(10, 12, 16); // #0A0C10
    pub const BG_CARD: egui::Color32 = egui::Color32::from_rgb(22, 27, 34); // #161B22
    pub const BG_INPUT: egui::Color32 = egui::Color32::from_rgb(15, 18, 24);

    pub const ACCENT_PRIMARY: egui::Color32 = egui::Color32::from_rgb(41, 121, 255); // #2979FF

    // Chart series
    pub const HISTORY_LINE: egui::Color32 = egui::Color32::from_rgb(100, 200, 255);
    pub const FORECAST_LINE: egui::Color32 = egui::Color32::from_rgb(255, 165, 0);

    // Status
    pub const SUCCESS: egui::Color32 = egui::Color32::from_rgb(0, 230, 118); // #00E676
    pub const DANGER: egui::Color32 = egui::Color32::from_rgb(255, 23, 68); // #FF1744
    pub const WARNING: egui::Color32 = egui::Color32::from_rgb(255, 145, 0); // #FF9100
    pub const INFO: egui::Color32 = egui::Color32::from_rgb(66, 165, 245);

    pub const TEXT_PRIMARY: egui::Color32 = egui::Color32::from_rgb(240, 246, 252);
    pub const TEXT_SECONDARY: egui::Color32 = egui::Color32::from_gray(160);

    pub const BORDER_SUBTLE: egui::Color32 = egui::Color32::from_rgb(48, 54, 61);

    pub const ROUNDING_MEDIUM: f32 = 8.0;
    pub const SPACING_SMALL: f32 = 8.0;
    pub const SPACING_MEDIUM: f32 = 16.0;

    // --- Styles ---

    pub fn theme() -> egui::Visuals {
        let mut visuals = egui::Visuals::dark();

        visuals.window_fill = Self::BG_WINDOW;
        visuals.panel_fill = Self::BG_WINDOW;
        visuals.extreme_bg_color = Self::BG_INPUT;

        visuals.widgets.noninteractive.bg_stroke = egui::Stroke::new(1.0, Self::BORDER_SUBTLE);
        visuals.widgets.noninteractive.fg_stroke = egui::Stroke::new(1.0, Self::TEXT_PRIMARY);
        visuals.widgets.inactive.weak_bg_fill = Self::BG_CARD;
        visuals.widgets.inactive.bg_fill = Self::BG_CARD;

        visuals.selection.bg_fill = Self::ACCENT_PRIMARY.linear_multiply(0.3);
        visuals.selection.stroke = egui::Stroke::new(1.0, Self::ACCENT_PRIMARY);

        visuals
    }

    pub fn card_frame() -> egui::Frame {
        egui::Frame::NONE
            .fill(Self::BG_CARD)
            .corner_radius(Self::ROUNDING_MEDIUM)
            .stroke(egui::Stroke::new(1.0, Self::BORDER_SUBTLE))
            .inner_margin(Self::SPACING_MEDIUM as i8)
    }

    /// Titled card used for each section of the central panel.
    pub fn section<R>(
        ui: &mut egui::Ui,
        title: &str,
        add_contents: impl FnOnce(&mut egui::Ui) -> R,
    ) -> egui::InnerResponse<R> {
        let response = Self::card_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(
                egui::RichText::new(title)
                    .size(12.0)
                    .color(Self::TEXT_SECONDARY)
                    .strong(),
            );
            ui.add_space(Self::SPACING_SMALL);
            add_contents(ui)
        });
        ui.add_space(Self::SPACING_SMALL);
        response
    }
}
