use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use freqview::config::Settings;
use freqview::data::filter::{
    available_values, build_traces, default_y_column, filtered_groups, format_amplitude,
    plot_columns, Trace,
};
use freqview::data::loader::scan_directory;
use freqview::data::model::{Field, GroupKey, ParsedFile};
use freqview::data::stats::{build_grouped_stats, GroupStats, StatsBuild};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

/// Which dimension the plot overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    /// Several chemistries at one amplitude.
    Chemistry,
    /// One chemistry at several amplitudes.
    Voltage,
}

/// Selections of the chemistry tab.
#[derive(Debug, Clone, Default)]
pub struct ChemistryTab {
    pub chemistries: BTreeSet<String>,
    pub amplitude: Option<f64>,
    pub y_column: Option<String>,
    pub log_x: bool,
}

/// Selections of the voltage tab.
#[derive(Debug, Clone, Default)]
pub struct VoltageTab {
    pub chemistry: Option<String>,
    /// Kept sorted ascending.
    pub amplitudes: Vec<f64>,
    pub y_column: Option<String>,
    pub log_x: bool,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub settings: Settings,

    /// Directory the current snapshot was built from.
    pub raw_data_dir: PathBuf,

    /// Files whose names matched the grammar.
    pub files: Vec<ParsedFile>,

    /// Statistics snapshot; selections never touch the disk.
    pub build: StatsBuild,

    pub offsets: Vec<String>,
    pub configurations: Vec<String>,
    pub selected_offset: Option<String>,
    pub selected_configuration: Option<String>,

    /// Indices into `build.groups` matching offset and configuration (cached).
    pub visible_groups: Vec<usize>,
    pub selected_group: Option<usize>,

    pub show_error_bars: bool,
    pub tab: Tab,
    pub chemistry_tab: ChemistryTab,
    pub voltage_tab: VoltageTab,

    /// Colours per trace label of the selected group.
    pub color_map: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let raw_data_dir = settings.raw_data_dir.clone();
        let mut state = Self {
            settings,
            raw_data_dir: raw_data_dir.clone(),
            files: Vec::new(),
            build: StatsBuild::default(),
            offsets: Vec::new(),
            configurations: Vec::new(),
            selected_offset: None,
            selected_configuration: None,
            visible_groups: Vec::new(),
            selected_group: None,
            show_error_bars: true,
            tab: Tab::Chemistry,
            chemistry_tab: ChemistryTab::default(),
            voltage_tab: VoltageTab::default(),
            color_map: None,
            status_message: None,
        };
        state.load_directory(&raw_data_dir);
        state
    }

    /// Scan `dir` and rebuild the statistics snapshot.
    pub fn load_directory(&mut self, dir: &Path) {
        self.raw_data_dir = dir.to_path_buf();
        let mut status = None;
        self.files = match scan_directory(dir) {
            Ok(files) => files,
            Err(e) => {
                log::error!("Failed to scan {}: {e:#}", dir.display());
                status = Some(format!("Error: {e:#}"));
                Vec::new()
            }
        };
        self.build = build_grouped_stats(&self.files, dir, &self.settings);
        log::info!(
            "Loaded {} measurement files into {} groups from {}",
            self.files.len(),
            self.build.groups.len(),
            dir.display()
        );

        if status.is_none() && !self.build.failures.is_empty() {
            let names: Vec<&str> = self.build.failures.iter().map(|f| f.file.as_str()).collect();
            status = Some(format!(
                "{} file(s) could not be loaded: {}",
                names.len(),
                names.join(", ")
            ));
        }
        self.status_message = status;

        self.offsets = available_values(&self.files, Field::VoltageOffset);
        self.configurations = available_values(&self.files, Field::DeviceConfiguration);
        self.selected_offset = self.offsets.first().cloned();
        self.selected_configuration = self.configurations.first().cloned();
        self.selected_group = None;
        self.refilter();
    }

    /// Re-read the current directory.
    pub fn reload(&mut self) {
        let dir = self.raw_data_dir.clone();
        self.load_directory(&dir);
    }

    /// Recompute `visible_groups` after an offset or configuration change.
    pub fn refilter(&mut self) {
        let keys: Vec<&GroupKey> = self.build.groups.iter().map(|(k, _)| k).collect();
        self.visible_groups = match (&self.selected_offset, &self.selected_configuration) {
            (Some(offset), Some(config)) => filtered_groups(&keys, offset, config),
            _ => Vec::new(),
        };
        let still_visible = self
            .selected_group
            .is_some_and(|g| self.visible_groups.contains(&g));
        if !still_visible {
            let first = self.visible_groups.first().copied();
            self.select_group(first);
        }
    }

    pub fn set_offset(&mut self, offset: String) {
        self.selected_offset = Some(offset);
        self.refilter();
    }

    pub fn set_configuration(&mut self, configuration: String) {
        self.selected_configuration = Some(configuration);
        self.refilter();
    }

    /// Select a group and reset both tabs to their defaults for it.
    pub fn select_group(&mut self, group: Option<usize>) {
        self.selected_group = group;
        self.chemistry_tab = ChemistryTab {
            log_x: self.chemistry_tab.log_x,
            ..Default::default()
        };
        self.voltage_tab = VoltageTab {
            log_x: self.voltage_tab.log_x,
            ..Default::default()
        };
        self.color_map = None;

        let Some(stats) = self.current_stats() else {
            return;
        };
        let chemistries: Vec<String> = stats.chemistries().iter().map(|c| c.to_string()).collect();
        let amplitudes = stats.amplitudes();
        let y_column = default_y_column(&self.y_columns(), &self.settings.primary_channel);

        let labels: Vec<String> = chemistries
            .iter()
            .flat_map(|c| {
                amplitudes
                    .iter()
                    .map(move |a| format!("{c} ({} Vpk)", format_amplitude(*a)))
            })
            .collect();
        self.color_map = Some(ColorMap::new(&labels));

        self.chemistry_tab.chemistries = chemistries.first().cloned().into_iter().collect();
        self.chemistry_tab.amplitude = amplitudes.first().copied();
        self.chemistry_tab.y_column = y_column.clone();
        self.voltage_tab.chemistry = chemistries.first().cloned();
        self.voltage_tab.amplitudes = amplitudes.first().copied().into_iter().collect();
        self.voltage_tab.y_column = y_column;
    }

    pub fn current_stats(&self) -> Option<&GroupStats> {
        self.selected_group
            .and_then(|g| self.build.groups.get(g))
            .map(|(_, stats)| stats)
    }

    pub fn current_key(&self) -> Option<&GroupKey> {
        self.selected_group
            .and_then(|g| self.build.groups.get(g))
            .map(|(key, _)| key)
    }

    /// Columns offered for the Y axis of the selected group.
    pub fn y_columns(&self) -> Vec<String> {
        self.current_stats()
            .map(|s| plot_columns(&s.columns, &self.settings.reserved_prefixes))
            .unwrap_or_default()
    }

    /// Toggle a chemistry in the chemistry tab.
    pub fn toggle_chemistry(&mut self, chemistry: &str) {
        let selected = &mut self.chemistry_tab.chemistries;
        if !selected.remove(chemistry) {
            selected.insert(chemistry.to_string());
        }
    }

    /// Toggle an amplitude in the voltage tab.
    pub fn toggle_amplitude(&mut self, amplitude: f64) {
        let selected = &mut self.voltage_tab.amplitudes;
        match selected.iter().position(|a| *a == amplitude) {
            Some(i) => {
                selected.remove(i);
            }
            None => {
                selected.push(amplitude);
                selected.sort_by(f64::total_cmp);
            }
        }
    }

    /// Y column of the active tab.
    pub fn y_column(&self) -> Option<&str> {
        match self.tab {
            Tab::Chemistry => self.chemistry_tab.y_column.as_deref(),
            Tab::Voltage => self.voltage_tab.y_column.as_deref(),
        }
    }

    pub fn log_x(&self) -> bool {
        match self.tab {
            Tab::Chemistry => self.chemistry_tab.log_x,
            Tab::Voltage => self.voltage_tab.log_x,
        }
    }

    /// Traces of the active tab.
    pub fn traces(&self) -> Vec<Trace> {
        let (Some(stats), Some(column)) = (self.current_stats(), self.y_column()) else {
            return Vec::new();
        };
        match self.tab {
            Tab::Chemistry => {
                let chemistries: Vec<String> =
                    self.chemistry_tab.chemistries.iter().cloned().collect();
                let amplitudes: Vec<f64> = self.chemistry_tab.amplitude.into_iter().collect();
                build_traces(stats, &chemistries, &amplitudes, column)
            }
            Tab::Voltage => {
                let chemistries: Vec<String> =
                    self.voltage_tab.chemistry.iter().cloned().collect();
                build_traces(stats, &chemistries, &self.voltage_tab.amplitudes, column)
            }
        }
    }

    /// Plot title of the active tab.
    pub fn title(&self) -> String {
        let y = self.y_column().unwrap_or_default();
        let x = &self.settings.frequency_column;
        match self.tab {
            Tab::Chemistry => match self.chemistry_tab.amplitude {
                Some(a) => format!("{y} vs {x} (Voltage Amplitude: {} Vpk)", format_amplitude(a)),
                None => format!("{y} vs {x}"),
            },
            Tab::Voltage => match &self.voltage_tab.chemistry {
                Some(c) => format!("{y} vs {x} (Device Chemistry: {c})"),
                None => format!("{y} vs {x}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HEADER: &str = "# Oscilator_frequency (Hz)\tDemod_4_X_A (V)\tDemod_1_R (V)\n";

    fn state_with(files: &[(&str, &str)]) -> (TempDir, AppState) {
        let dir = TempDir::new().unwrap();
        for (name, rows) in files {
            std::fs::write(dir.path().join(name), format!("{HEADER}{rows}")).unwrap();
        }
        let settings = Settings {
            raw_data_dir: dir.path().to_path_buf(),
            ..Settings::default()
        };
        let state = AppState::new(settings);
        (dir, state)
    }

    #[test]
    fn first_group_and_defaults_are_selected() {
        let (_dir, state) = state_with(&[
            ("2023-01-05_PSS-P1_two-config_1d_200-1Hz_1p_0V_1Vpk.txt", "10.0 0.5 0.0\n"),
            ("2023-01-05_PEDOT-P1_two-config_1d_200-1Hz_1p_0V_0.5Vpk.txt", "10.0 0.5 0.0\n"),
        ]);
        assert_eq!(state.selected_offset.as_deref(), Some("0V"));
        assert_eq!(state.selected_configuration.as_deref(), Some("two"));
        assert_eq!(state.visible_groups, vec![0]);
        assert_eq!(state.selected_group, Some(0));

        let expected: BTreeSet<String> = ["PEDOT".to_string()].into();
        assert_eq!(state.chemistry_tab.chemistries, expected);
        assert_eq!(state.chemistry_tab.amplitude, Some(0.5));
        assert_eq!(state.chemistry_tab.y_column.as_deref(), Some("Demod_4_X_A (V)"));
        assert!(!state.y_columns().iter().any(|c| c.starts_with("Demod_1")));
        assert!(state.status_message.is_none());
    }

    #[test]
    fn tabs_overlay_different_dimensions() {
        let (_dir, mut state) = state_with(&[
            ("2023-01-05_A-P1_c-config_1d_200-1Hz_1p_0V_1Vpk.txt", "10.0 0.5 0.0\n"),
            ("2023-01-05_A-P1_c-config_1d_200-1Hz_1p_0V_2Vpk.txt", "10.0 0.5 0.0\n"),
            ("2023-01-05_B-P1_c-config_1d_200-1Hz_1p_0V_1Vpk.txt", "10.0 0.5 0.0\n"),
        ]);
        state.toggle_chemistry("B");
        let labels: Vec<String> = state.traces().into_iter().map(|t| t.label).collect();
        assert_eq!(labels, vec!["A (1.0 Vpk)", "B (1.0 Vpk)"]);
        assert_eq!(
            state.title(),
            "Demod_4_X_A (V) vs Oscilator_frequency (Hz) (Voltage Amplitude: 1.0 Vpk)"
        );

        state.tab = Tab::Voltage;
        state.toggle_amplitude(2.0);
        let labels: Vec<String> = state.traces().into_iter().map(|t| t.label).collect();
        assert_eq!(labels, vec!["A (1.0 Vpk)", "A (2.0 Vpk)"]);

        state.toggle_amplitude(1.0);
        assert_eq!(state.voltage_tab.amplitudes, vec![2.0]);
    }

    #[test]
    fn changing_offset_rescopes_groups() {
        let (_dir, mut state) = state_with(&[
            ("2023-01-05_A-P1_c-config_1d_200-1Hz_1p_0V_1Vpk.txt", "10.0 0.5 0.0\n"),
            ("2023-01-05_A-P1_c-config_1d_200-1Hz_1p_0.5V_1Vpk.txt", "10.0 0.5 0.0\n"),
        ]);
        assert_eq!(state.offsets, vec!["0.5V", "0V"]);
        let first = state.selected_group;

        state.set_offset("0V".to_string());
        assert_eq!(state.visible_groups.len(), 1);
        assert_ne!(state.selected_group, first);

        state.set_offset("1V".to_string());
        assert!(state.visible_groups.is_empty());
        assert_eq!(state.selected_group, None);
        assert!(state.traces().is_empty());
    }

    #[test]
    fn unreadable_files_are_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("2023-01-05_A-P1_c-config_1d_200-1Hz_1p_0V_1Vpk.txt"),
            "10.0 0.5\n",
        )
        .unwrap();
        let settings = Settings {
            raw_data_dir: dir.path().to_path_buf(),
            ..Settings::default()
        };
        let state = AppState::new(settings);
        assert!(state.build.groups.is_empty());
        assert!(state
            .status_message
            .as_deref()
            .is_some_and(|m| m.contains("could not be loaded")));
    }

    #[test]
    fn missing_directory_shows_an_error() {
        let dir = TempDir::new().unwrap();
        let settings = Settings {
            raw_data_dir: dir.path().join("raw_data"),
            ..Settings::default()
        };
        let state = AppState::new(settings);
        assert!(state.files.is_empty());
        assert!(state
            .status_message
            .as_deref()
            .is_some_and(|m| m.starts_with("Error")));
    }
}
