use std::collections::BTreeSet;

use super::model::{Field, GroupKey, ParsedFile};
use super::stats::{GroupStats, SeriesPoint};

// ---------------------------------------------------------------------------
// Sidebar choices
// ---------------------------------------------------------------------------

/// Sorted unique values of `field` across all parsed files.
pub fn available_values(files: &[ParsedFile], field: Field) -> Vec<String> {
    files
        .iter()
        .map(|f| f.id.value(field).into_owned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Indices of the groups measured at `offset` with `configuration`.
pub fn filtered_groups(keys: &[&GroupKey], offset: &str, configuration: &str) -> Vec<usize> {
    keys.iter()
        .enumerate()
        .filter(|(_, key)| {
            key.get(Field::VoltageOffset) == Some(offset)
                && key.get(Field::DeviceConfiguration) == Some(configuration)
        })
        .map(|(i, _)| i)
        .collect()
}

/// Columns offered for the Y axis: everything not starting with a reserved
/// prefix.
pub fn plot_columns(columns: &[String], reserved_prefixes: &[String]) -> Vec<String> {
    columns
        .iter()
        .filter(|c| !reserved_prefixes.iter().any(|p| c.starts_with(p.as_str())))
        .cloned()
        .collect()
}

/// `preferred` when it is offered, otherwise the first candidate.
pub fn default_y_column(candidates: &[String], preferred: &str) -> Option<String> {
    candidates
        .iter()
        .find(|c| *c == preferred)
        .or_else(|| candidates.first())
        .cloned()
}

// ---------------------------------------------------------------------------
// Traces
// ---------------------------------------------------------------------------

/// One plotted line.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub label: String,
    pub chemistry: String,
    pub amplitude: f64,
    pub points: Vec<SeriesPoint>,
}

/// Amplitudes are shown the way they are typed in filenames (`1.0`, `0.5`).
pub fn format_amplitude(amplitude: f64) -> String {
    format!("{amplitude:?}")
}

/// One trace per (chemistry, amplitude) pair, in selection order. Pairs with
/// no data are left out.
pub fn build_traces(
    stats: &GroupStats,
    chemistries: &[String],
    amplitudes: &[f64],
    column: &str,
) -> Vec<Trace> {
    let mut traces = Vec::new();
    for chemistry in chemistries {
        for &amplitude in amplitudes {
            let points = stats.series(chemistry, amplitude, column);
            if points.is_empty() {
                continue;
            }
            traces.push(Trace {
                label: format!("{chemistry} ({} Vpk)", format_amplitude(amplitude)),
                chemistry: chemistry.clone(),
                amplitude,
                points,
            });
        }
    }
    traces
}

/// Map frequencies to log10 for a logarithmic X axis. Non-positive
/// frequencies have no place on that axis and are dropped.
pub fn to_log_x(points: &[SeriesPoint]) -> Vec<SeriesPoint> {
    points
        .iter()
        .filter(|p| p.x > 0.0)
        .map(|p| SeriesPoint {
            x: p.x.log10(),
            ..*p
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::data::filename::parse_filename;
    use crate::data::grouping::{group_files, VIEWER_EXCLUDED};
    use crate::data::model::Table;
    use crate::data::stats::LabelledTable;

    const FREQ: &str = "Oscilator_frequency (Hz)";

    fn parsed(names: &[&str]) -> Vec<ParsedFile> {
        names
            .iter()
            .map(|n| ParsedFile {
                name: n.to_string(),
                id: parse_filename(n).unwrap(),
            })
            .collect()
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sidebar_values_are_sorted_and_unique() {
        let files = parsed(&[
            "2023-01-05_A-P1_two-config_1d_200-1Hz_1p_0.2V_1Vpk.txt",
            "2023-01-05_B-P1_one-config_1d_200-1Hz_1p_0V_1Vpk.txt",
            "2023-01-05_C-P1_two-config_1d_200-1Hz_1p_0V_1Vpk.txt",
        ]);
        assert_eq!(available_values(&files, Field::VoltageOffset), vec!["0.2V", "0V"]);
        assert_eq!(
            available_values(&files, Field::DeviceConfiguration),
            vec!["one", "two"]
        );
    }

    #[test]
    fn groups_are_scoped_by_offset_and_configuration() {
        let files = parsed(&[
            "2023-01-05_A-P1_two-config_1d_200-1Hz_1p_0V_1Vpk.txt",
            "2023-01-05_A-P1_two-config_1d_5k-200Hz_1p_0V_1Vpk.txt",
            "2023-01-05_A-P1_one-config_1d_200-1Hz_1p_0V_1Vpk.txt",
            "2023-01-05_A-P1_two-config_1d_200-1Hz_1p_0.2V_1Vpk.txt",
        ]);
        let groups = group_files(&files, &VIEWER_EXCLUDED);
        let keys: Vec<&GroupKey> = groups.iter().map(|g| &g.key).collect();
        assert_eq!(filtered_groups(&keys, "0V", "two"), vec![0, 1]);
        assert_eq!(filtered_groups(&keys, "0.2V", "two"), vec![3]);
        assert!(filtered_groups(&keys, "0.2V", "one").is_empty());
    }

    #[test]
    fn reserved_prefixes_are_not_plottable() {
        let settings = Settings::default();
        let columns = strings(&[FREQ, "Demod_1_R (V)", "DemodAll_phase", "Demod_4_X_A (V)"]);
        let offered = plot_columns(&columns, &settings.reserved_prefixes);
        assert_eq!(offered, strings(&[FREQ, "Demod_4_X_A (V)"]));

        assert_eq!(
            default_y_column(&offered, "Demod_4_X_A (V)").as_deref(),
            Some("Demod_4_X_A (V)")
        );
        assert_eq!(default_y_column(&offered, "missing").as_deref(), Some(FREQ));
        assert_eq!(default_y_column(&[], "missing"), None);
    }

    #[test]
    fn traces_follow_selection_and_skip_empty_pairs() {
        let settings = Settings::default();
        let t = |chem: &str, amp: f64| {
            let table = Table {
                columns: strings(&[FREQ, "Demod_4_X_A (V)"]),
                rows: vec![vec![10.0, 0.5], vec![100.0, 0.25]],
            };
            LabelledTable::new(table, chem, amp, &settings)
        };
        let stats =
            GroupStats::from_tables(&[t("A", 1.0), t("B", 1.0), t("A", 0.5)], FREQ).unwrap();

        let traces = build_traces(&stats, &strings(&["B", "A"]), &[1.0], "Demod_4_X_A (V)");
        let labels: Vec<&str> = traces.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["B (1.0 Vpk)", "A (1.0 Vpk)"]);
        assert_eq!(traces[0].points.len(), 2);

        let traces = build_traces(&stats, &strings(&["B"]), &[0.5, 1.0], "Demod_4_X_A (V)");
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].amplitude, 1.0);
    }

    #[test]
    fn log_axis_drops_non_positive_frequencies() {
        let points = [
            SeriesPoint {
                x: 0.0,
                y: 1.0,
                err: None,
            },
            SeriesPoint {
                x: 1000.0,
                y: 2.0,
                err: Some(0.1),
            },
        ];
        let log = to_log_x(&points);
        assert_eq!(log.len(), 1);
        assert!((log[0].x - 3.0).abs() < 1e-12);
        assert_eq!(log[0].err, Some(0.1));
    }
}
