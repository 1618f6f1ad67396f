use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use super::error::{ProvenanceError, TableError};
use super::filename::combined_filename;
use super::grouping::{group_files, FileGroup, COMBINE_EXCLUDED};
use super::loader::{read_table, save_table, scan_directory};
use super::model::{GroupKey, MeasurementId, ParsedFile, Table, DATE_FORMAT};
use crate::config::Settings;

/// Sub-ranges that together tile a full sweep.
pub const REQUIRED_RANGES: [&str; 3] = ["500k-5kHz", "5k-200Hz", "200-1Hz"];

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A full sweep assembled from the sub-range files of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedMeasurement {
    /// Name of the file the sweep is written to.
    pub filename: String,
    pub table: Table,
    pub newest_date: NaiveDate,
    pub total_capture: u64,
    pub peak_degradation: u64,
}

/// What happened to one group.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupOutcome {
    Combined(CombinedMeasurement),
    /// The group's ranges are not exactly [`REQUIRED_RANGES`].
    Skipped { ranges: Vec<String> },
}

/// Summary of a batch run.
#[derive(Debug, Default)]
pub struct CombineReport {
    /// Files that matched the filename grammar.
    pub parsed: usize,
    pub created: Vec<PathBuf>,
    pub skipped: Vec<GroupKey>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Scan `settings.raw_data_dir`, group its measurement files, and write one
/// combined file into `settings.output_dir` for every complete group.
///
/// Progress is printed to `out`. A malformed table aborts the run.
pub fn run<W: Write>(settings: &Settings, out: &mut W) -> Result<CombineReport> {
    let files = scan_directory(&settings.raw_data_dir)?;

    writeln!(out, "Parsed files:")?;
    for f in &files {
        writeln!(
            out,
            "File: {}, Date: {}, Frequency Range: {}, Datapoint Capture: {}, Device Degradation: {}",
            f.name,
            f.id.date.format(DATE_FORMAT),
            f.id.frequency_range,
            f.id.datapoint_capture,
            f.id.device_degradation
        )?;
    }

    let groups = group_files(&files, &COMBINE_EXCLUDED);
    writeln!(out, "\nGrouped files:")?;
    for g in &groups {
        writeln!(out, "Group Key: {}, Files: {:?}", g.key, g.files)?;
    }

    let by_name: HashMap<&str, &ParsedFile> =
        files.iter().map(|f| (f.name.as_str(), f)).collect();
    let mut report = CombineReport {
        parsed: files.len(),
        ..Default::default()
    };

    for group in &groups {
        let members = resolve_members(group, &by_name);
        let ranges: Vec<&str> = members
            .iter()
            .map(|f| f.id.frequency_range.as_str())
            .collect();
        writeln!(out, "\nGroup Key: {}", group.key)?;
        writeln!(out, "Frequency Ranges: {ranges:?}")?;

        match combine_group(&members, &settings.raw_data_dir, &settings.frequency_column)? {
            GroupOutcome::Combined(combined) => {
                writeln!(out, "Found required frequency ranges: {REQUIRED_RANGES:?}")?;
                let path = settings.output_dir.join(&combined.filename);
                save_table(&path, &combined.table)
                    .with_context(|| format!("writing {}", path.display()))?;
                log::info!(
                    "Combined {} files into {} ({} rows)",
                    members.len(),
                    path.display(),
                    combined.table.len()
                );
                writeln!(out, "Created new file: {}", combined.filename)?;
                report.created.push(path);
            }
            GroupOutcome::Skipped { .. } => {
                writeln!(out, "Skipping group: Required frequency ranges not found.")?;
                report.skipped.push(group.key.clone());
            }
        }
    }

    writeln!(out, "\nProcessing complete.")?;
    Ok(report)
}

fn resolve_members<'a>(
    group: &FileGroup,
    by_name: &HashMap<&str, &'a ParsedFile>,
) -> Vec<&'a ParsedFile> {
    group
        .files
        .iter()
        .filter_map(|name| by_name.get(name.as_str()).copied())
        .collect()
}

/// Combine the members of one group, loading their tables from `raw_dir`.
///
/// Groups whose ranges are not exactly [`REQUIRED_RANGES`] are skipped before
/// anything is read.
pub fn combine_group(
    members: &[&ParsedFile],
    raw_dir: &Path,
    frequency_column: &str,
) -> Result<GroupOutcome> {
    let ranges: Vec<String> = members
        .iter()
        .map(|f| f.id.frequency_range.clone())
        .collect();
    if !required_ranges_present(ranges.iter().map(String::as_str)) {
        return Ok(GroupOutcome::Skipped { ranges });
    }

    let mut tables = Vec::with_capacity(members.len());
    for f in members {
        let path = raw_dir.join(&f.name);
        let table = read_table(&path).with_context(|| format!("loading {}", path.display()))?;
        tables.push(table);
    }
    let table = merge_tables(&tables, frequency_column)
        .with_context(|| format!("merging {} tables", tables.len()))?;

    let ids: Vec<&MeasurementId> = members.iter().map(|f| &f.id).collect();
    let newest = newest_date(ids.iter().copied()).context("group has no members")?;
    let total_capture = sum_datapoint_capture(ids.iter().map(|id| id.datapoint_capture.as_str()))?;
    let peak_degradation =
        highest_degradation(ids.iter().map(|id| id.device_degradation.as_str()))?;

    Ok(GroupOutcome::Combined(CombinedMeasurement {
        filename: combined_filename(ids[0], newest, peak_degradation, total_capture),
        table,
        newest_date: newest,
        total_capture,
        peak_degradation,
    }))
}

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

/// Whether the set of `ranges` is exactly [`REQUIRED_RANGES`]. Repeats of a
/// required range are allowed; missing or extra ranges are not.
pub fn required_ranges_present<'a>(ranges: impl IntoIterator<Item = &'a str>) -> bool {
    let found: BTreeSet<&str> = ranges.into_iter().collect();
    let required: BTreeSet<&str> = REQUIRED_RANGES.into_iter().collect();
    found == required
}

/// Concatenate `tables` and collapse rows with the same frequency into their
/// mean, sorted by ascending frequency.
///
/// The frequency column comes first, followed by the union of all other input
/// columns in first-seen order; cells a table does not have are missing and
/// ignored by the mean. Rows without a frequency are dropped.
pub fn merge_tables(tables: &[Table], frequency_column: &str) -> Result<Table, TableError> {
    let mut merged = Table::new(Vec::new());
    for t in tables {
        for col in &t.columns {
            if merged.column_index(col).is_none() {
                merged.columns.push(col.clone());
            }
        }
    }
    let pos = merged
        .column_index(frequency_column)
        .ok_or_else(|| TableError::MissingColumn(frequency_column.to_string()))?;
    let freq = merged.columns.remove(pos);
    merged.columns.insert(0, freq);
    let freq_idx = 0;

    let width = merged.columns.len();
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for t in tables {
        let mapping: Vec<usize> = t
            .columns
            .iter()
            .filter_map(|c| merged.column_index(c))
            .collect();
        for row in &t.rows {
            let mut out = vec![f64::NAN; width];
            for (&dst, &v) in mapping.iter().zip(row) {
                out[dst] = v;
            }
            if !out[freq_idx].is_nan() {
                rows.push(out);
            }
        }
    }
    rows.sort_by(|a, b| a[freq_idx].total_cmp(&b[freq_idx]));

    let mut start = 0;
    while start < rows.len() {
        let freq = rows[start][freq_idx];
        let end = start + rows[start..].iter().take_while(|r| r[freq_idx] == freq).count();
        let cluster = &rows[start..end];
        let averaged = (0..width)
            .map(|c| nan_mean(cluster.iter().map(|r| r[c])))
            .collect();
        merged.rows.push(averaged);
        start = end;
    }
    Ok(merged)
}

/// Mean of the non-NaN values, NaN if there are none.
fn nan_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// Every run of ASCII digits in `token`, as integers. A run that does not fit
/// in a `u64` is an error.
fn digit_runs(token: &str) -> impl Iterator<Item = Result<u64, ProvenanceError>> + '_ {
    token
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .map(move |run| {
            run.parse::<u64>()
                .map_err(|_| ProvenanceError::NumberTooLarge(token.to_string()))
        })
}

/// Sum of every integer embedded in every capture token; `10p5s` counts 15.
pub fn sum_datapoint_capture<'a>(
    tokens: impl IntoIterator<Item = &'a str>,
) -> Result<u64, ProvenanceError> {
    tokens
        .into_iter()
        .flat_map(digit_runs)
        .try_fold(0u64, |total, n| {
            total
                .checked_add(n?)
                .ok_or(ProvenanceError::CaptureOverflow)
        })
}

/// Largest integer embedded in any degradation token, 0 if there is none.
pub fn highest_degradation<'a>(
    tokens: impl IntoIterator<Item = &'a str>,
) -> Result<u64, ProvenanceError> {
    tokens
        .into_iter()
        .flat_map(digit_runs)
        .try_fold(0u64, |peak, n| Ok(peak.max(n?)))
}

/// Latest date among `ids`.
pub fn newest_date<'a>(ids: impl IntoIterator<Item = &'a MeasurementId>) -> Option<NaiveDate> {
    ids.into_iter().map(|id| id.date).max()
}
