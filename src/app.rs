use eframe::egui;
use freqview::config::Settings;

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct FreqViewApp {
    pub state: AppState,
}

impl FreqViewApp {
    /// Build the statistics snapshot for the configured raw data directory.
    pub fn new(settings: Settings) -> Self {
        Self {
            state: AppState::new(settings),
        }
    }
}

impl eframe::App for FreqViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar and tabs ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: tab controls, plot, table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            panels::tab_controls(ui, &mut self.state);
            ui.separator();
            plot::sweep_plot(ui, &self.state);
        });
    }
}
