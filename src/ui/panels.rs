use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use freqview::data::filter::format_amplitude;
use freqview::data::model::Field;

use crate::state::{AppState, Tab};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.label(RichText::new(state.raw_data_dir.display().to_string()).weak());
    ui.separator();

    if state.files.is_empty() {
        ui.label("No measurement files found.");
        return;
    }

    // Clone what we need so we can mutate state inside the loops.
    let offsets = state.offsets.clone();
    let configurations = state.configurations.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Select Voltage Offset:");
            for offset in &offsets {
                let checked = state.selected_offset.as_ref() == Some(offset);
                if ui.radio(checked, offset.as_str()).clicked() && !checked {
                    state.set_offset(offset.clone());
                }
            }
            ui.separator();

            ui.strong("Select Device Configuration:");
            for config in &configurations {
                let checked = state.selected_configuration.as_ref() == Some(config);
                if ui.radio(checked, config.as_str()).clicked() && !checked {
                    state.set_configuration(config.clone());
                }
            }
            ui.separator();

            ui.strong("Select a Device Configuration");
            let group_label = |i: usize| -> String {
                let Some((key, _)) = state.build.groups.get(i) else {
                    return String::new();
                };
                [Field::FrequencyRange, Field::DatapointCapture]
                    .iter()
                    .filter_map(|f| key.get(*f))
                    .collect::<Vec<_>>()
                    .join("  ")
            };
            let current = state.selected_group.map(group_label).unwrap_or_default();
            let options: Vec<(usize, String)> = state
                .visible_groups
                .iter()
                .map(|&i| (i, group_label(i)))
                .collect();
            egui::ComboBox::from_id_salt("group_select")
                .selected_text(current)
                .show_ui(ui, |ui: &mut Ui| {
                    for (i, label) in &options {
                        let selected = state.selected_group == Some(*i);
                        if ui.selectable_label(selected, label.as_str()).clicked() && !selected {
                            state.select_group(Some(*i));
                        }
                    }
                });
            if let Some(key) = state.current_key() {
                ui.label(RichText::new(key.to_string()).small().weak());
            }
            ui.separator();

            ui.checkbox(&mut state.show_error_bars, "Show Error Bars");
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open folder…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        ui.selectable_value(&mut state.tab, Tab::Chemistry, "Tab Chemistry");
        ui.selectable_value(&mut state.tab, Tab::Voltage, "Tab Voltage");

        ui.separator();

        ui.label(format!(
            "{} files, {} groups",
            state.files.len(),
            state.build.groups.len()
        ));

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Per-tab controls
// ---------------------------------------------------------------------------

/// Render the selection widgets of the active tab above the plot.
pub fn tab_controls(ui: &mut Ui, state: &mut AppState) {
    let Some(stats) = state.current_stats() else {
        return;
    };
    let chemistries: Vec<String> = stats.chemistries().iter().map(|c| c.to_string()).collect();
    let amplitudes = stats.amplitudes();
    let y_columns = state.y_columns();

    match state.tab {
        Tab::Chemistry => {
            ui.horizontal_wrapped(|ui: &mut Ui| {
                ui.strong("Choose Device Chemistry:");
                for chem in &chemistries {
                    let mut checked = state.chemistry_tab.chemistries.contains(chem);
                    if ui.checkbox(&mut checked, chem.as_str()).changed() {
                        state.toggle_chemistry(chem);
                    }
                }
            });
            ui.horizontal_wrapped(|ui: &mut Ui| {
                ui.strong("Choose Voltage Amplitude:");
                for &amp in &amplitudes {
                    let text = format_amplitude(amp);
                    ui.radio_value(&mut state.chemistry_tab.amplitude, Some(amp), text);
                }
            });
            ui.horizontal(|ui: &mut Ui| {
                y_column_combo(
                    ui,
                    "chemistry_y_column",
                    &mut state.chemistry_tab.y_column,
                    &y_columns,
                );
                ui.checkbox(&mut state.chemistry_tab.log_x, "Use Logarithmic X-axis");
            });
        }
        Tab::Voltage => {
            ui.horizontal_wrapped(|ui: &mut Ui| {
                ui.strong("Choose Device Chemistry:");
                for chem in &chemistries {
                    let value = Some(chem.clone());
                    ui.radio_value(&mut state.voltage_tab.chemistry, value, chem.as_str());
                }
            });
            ui.horizontal_wrapped(|ui: &mut Ui| {
                ui.strong("Choose Voltage Amplitude:");
                for &amp in &amplitudes {
                    let mut checked = state.voltage_tab.amplitudes.contains(&amp);
                    if ui.checkbox(&mut checked, format_amplitude(amp)).changed() {
                        state.toggle_amplitude(amp);
                    }
                }
            });
            ui.horizontal(|ui: &mut Ui| {
                y_column_combo(
                    ui,
                    "voltage_y_column",
                    &mut state.voltage_tab.y_column,
                    &y_columns,
                );
                ui.checkbox(&mut state.voltage_tab.log_x, "Use Logarithmic X-axis");
            });
        }
    }
}

fn y_column_combo(ui: &mut Ui, id: &str, selected: &mut Option<String>, columns: &[String]) {
    ui.label("Select Y-axis Variable");
    egui::ComboBox::from_id_salt(id)
        .selected_text(selected.clone().unwrap_or_default())
        .show_ui(ui, |ui: &mut Ui| {
            for col in columns {
                ui.selectable_value(selected, Some(col.clone()), col.as_str());
            }
        });
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

pub fn open_folder_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open raw data folder")
        .set_directory(&state.raw_data_dir)
        .pick_folder();

    if let Some(dir) = folder {
        state.load_directory(&dir);
    }
}
