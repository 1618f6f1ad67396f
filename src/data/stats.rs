use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::f64::consts::SQRT_2;
use std::path::Path;

use super::error::TableError;
use super::grouping::{group_files, VIEWER_EXCLUDED};
use super::loader::read_table;
use super::model::{GroupKey, ParsedFile, Table};
use crate::config::Settings;

/// Column added to every loaded table with the drive amplitude in volts.
pub const AMPLITUDE_COLUMN: &str = "voltage_amplitude";

/// Output as a percentage of the RMS drive voltage.
pub fn normalized_output_percent(primary: f64, amplitude: f64) -> f64 {
    (primary / (amplitude / SQRT_2)) * 100.0
}

// ---------------------------------------------------------------------------
// CellKey – (chemistry, amplitude, frequency) index
// ---------------------------------------------------------------------------

/// Index of one row of the mean and std tables.
#[derive(Debug, Clone, PartialEq)]
pub struct CellKey {
    pub chemistry: String,
    pub amplitude: f64,
    pub frequency: f64,
}

// Floats are ordered with `total_cmp` so keys can live in a BTreeMap.

impl Eq for CellKey {}

impl PartialOrd for CellKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.chemistry
            .cmp(&other.chemistry)
            .then_with(|| self.amplitude.total_cmp(&other.amplitude))
            .then_with(|| self.frequency.total_cmp(&other.frequency))
    }
}

/// One plotted point: mean value at a frequency, with its standard deviation
/// when at least two samples contributed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub x: f64,
    pub y: f64,
    pub err: Option<f64>,
}

// ---------------------------------------------------------------------------
// LabelledTable – a loaded file tagged with its plot dimensions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LabelledTable {
    pub chemistry: String,
    pub amplitude: f64,
    /// Source columns plus the amplitude and normalized output columns.
    pub table: Table,
}

impl LabelledTable {
    /// Tag `table` with its chemistry and amplitude and derive the normalized
    /// output column from the primary channel (NaN when the channel is absent).
    pub fn new(mut table: Table, chemistry: &str, amplitude: f64, settings: &Settings) -> Self {
        let n = table.len();
        table.push_column(AMPLITUDE_COLUMN, std::iter::repeat(amplitude).take(n));

        let normalized: Vec<f64> = match table.column_index(&settings.primary_channel) {
            Some(idx) => table
                .rows
                .iter()
                .map(|r| normalized_output_percent(r[idx], amplitude))
                .collect(),
            None => {
                log::warn!(
                    "'{}' missing, {} left empty",
                    settings.primary_channel,
                    settings.normalized_column
                );
                vec![f64::NAN; n]
            }
        };
        table.push_column(&settings.normalized_column, normalized);

        Self {
            chemistry: chemistry.to_string(),
            amplitude,
            table,
        }
    }
}

// ---------------------------------------------------------------------------
// GroupStats – mean and std per (chemistry, amplitude, frequency)
// ---------------------------------------------------------------------------

/// Mean and sample standard deviation of every column, per
/// (chemistry, amplitude, frequency).
#[derive(Debug, Clone, Default)]
pub struct GroupStats {
    pub columns: Vec<String>,
    mean: BTreeMap<CellKey, Vec<f64>>,
    std: BTreeMap<CellKey, Vec<Option<f64>>>,
}

impl GroupStats {
    /// Pool `tables` and reduce every (chemistry, amplitude, frequency) cell.
    pub fn from_tables(
        tables: &[LabelledTable],
        frequency_column: &str,
    ) -> Result<Self, TableError> {
        let mut columns: Vec<String> = Vec::new();
        for t in tables {
            for col in &t.table.columns {
                if !columns.contains(col) {
                    columns.push(col.clone());
                }
            }
        }

        // Collect the samples of every cell, column-aligned with `columns`.
        let mut cells: BTreeMap<CellKey, Vec<Vec<f64>>> = BTreeMap::new();
        for t in tables {
            let freq_idx = t
                .table
                .column_index(frequency_column)
                .ok_or_else(|| TableError::MissingColumn(frequency_column.to_string()))?;
            let mapping: Vec<usize> = t
                .table
                .columns
                .iter()
                .filter_map(|c| columns.iter().position(|x| x == c))
                .collect();

            for row in &t.table.rows {
                let frequency = row[freq_idx];
                if frequency.is_nan() {
                    continue;
                }
                let mut aligned = vec![f64::NAN; columns.len()];
                for (&dst, &v) in mapping.iter().zip(row) {
                    aligned[dst] = v;
                }
                let key = CellKey {
                    chemistry: t.chemistry.clone(),
                    amplitude: t.amplitude,
                    frequency,
                };
                cells.entry(key).or_default().push(aligned);
            }
        }

        let mut stats = GroupStats {
            columns,
            ..Default::default()
        };
        for (key, samples) in cells {
            let width = stats.columns.len();
            let mut means = Vec::with_capacity(width);
            let mut stds = Vec::with_capacity(width);
            for c in 0..width {
                let values: Vec<f64> = samples
                    .iter()
                    .map(|s| s[c])
                    .filter(|v| !v.is_nan())
                    .collect();
                means.push(mean(&values).unwrap_or(f64::NAN));
                stds.push(sample_std(&values));
            }
            stats.mean.insert(key.clone(), means);
            stats.std.insert(key, stds);
        }
        Ok(stats)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn mean(&self, key: &CellKey) -> Option<&[f64]> {
        self.mean.get(key).map(Vec::as_slice)
    }

    /// `None` entries mark columns with fewer than two samples in the cell.
    pub fn std(&self, key: &CellKey) -> Option<&[Option<f64>]> {
        self.std.get(key).map(Vec::as_slice)
    }

    /// Index of the mean and std tables, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &CellKey> {
        self.mean.keys()
    }

    /// Chemistries present, sorted.
    pub fn chemistries(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for key in self.mean.keys() {
            if out.last() != Some(&key.chemistry.as_str()) {
                out.push(&key.chemistry);
            }
        }
        out
    }

    /// Amplitudes present across all chemistries, ascending.
    pub fn amplitudes(&self) -> Vec<f64> {
        let mut out: Vec<f64> = self.mean.keys().map(|k| k.amplitude).collect();
        out.sort_by(f64::total_cmp);
        out.dedup();
        out
    }

    /// Mean (and std as error) of `column` against frequency for one
    /// chemistry and amplitude, by ascending frequency.
    pub fn series(&self, chemistry: &str, amplitude: f64, column: &str) -> Vec<SeriesPoint> {
        let Some(c) = self.column_index(column) else {
            return Vec::new();
        };
        self.mean
            .iter()
            .filter(|(k, _)| k.chemistry == chemistry && k.amplitude == amplitude)
            .map(|(k, means)| SeriesPoint {
                x: k.frequency,
                y: means[c],
                err: self.std.get(k).and_then(|s| s[c]),
            })
            .collect()
    }

    /// Number of (chemistry, amplitude, frequency) cells.
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1); undefined below two samples.
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

// ---------------------------------------------------------------------------
// Session snapshot
// ---------------------------------------------------------------------------

/// A file the viewer could not use.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFailure {
    pub file: String,
    pub reason: String,
}

/// Statistics for every viewer group, built once per session.
#[derive(Debug, Default)]
pub struct StatsBuild {
    pub groups: Vec<(GroupKey, GroupStats)>,
    pub failures: Vec<LoadFailure>,
}

/// Load every file in `files` from `raw_dir`, pool them by configuration,
/// offset, range and capture, and reduce each pool to [`GroupStats`].
///
/// Files that cannot be loaded are recorded in [`StatsBuild::failures`] and
/// left out; they never abort the build.
pub fn build_grouped_stats(
    files: &[ParsedFile],
    raw_dir: &Path,
    settings: &Settings,
) -> StatsBuild {
    let mut build = StatsBuild::default();

    for group in group_files(files, &VIEWER_EXCLUDED) {
        let mut tables = Vec::with_capacity(group.files.len());
        for name in &group.files {
            let Some(file) = files.iter().find(|f| &f.name == name) else {
                continue;
            };
            let Some(amplitude) = file.id.amplitude_volts() else {
                build.failures.push(LoadFailure {
                    file: name.clone(),
                    reason: format!("amplitude '{}' is not a number", file.id.voltage_amplitude),
                });
                continue;
            };
            match read_table(&raw_dir.join(name)) {
                Ok(table) if table.column_index(&settings.frequency_column).is_none() => {
                    build.failures.push(LoadFailure {
                        file: name.clone(),
                        reason: TableError::MissingColumn(settings.frequency_column.clone())
                            .to_string(),
                    });
                }
                Ok(table) => tables.push(LabelledTable::new(
                    table,
                    &file.id.device_chemistry,
                    amplitude,
                    settings,
                )),
                Err(e) => {
                    log::error!("Failed to load {name}: {e}");
                    build.failures.push(LoadFailure {
                        file: name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        if tables.is_empty() {
            continue;
        }

        match GroupStats::from_tables(&tables, &settings.frequency_column) {
            Ok(stats) => {
                log::debug!("Group {} has {} cells", group.key, stats.len());
                build.groups.push((group.key, stats));
            }
            Err(e) => log::error!("Failed to build statistics for {}: {e}", group.key),
        }
    }

    log::info!(
        "Built statistics for {} groups ({} files skipped)",
        build.groups.len(),
        build.failures.len()
    );
    build
}
