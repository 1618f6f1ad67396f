use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use super::error::TableError;
use super::filename::parse_filename;
use super::model::{ParsedFile, Table};

// ---------------------------------------------------------------------------
// Directory scan
// ---------------------------------------------------------------------------

/// List the `*.txt` files in `dir` whose names match the measurement grammar.
///
/// Other files are skipped silently. The result is sorted by filename so runs
/// are reproducible regardless of directory order.
pub fn scan_directory(dir: &Path) -> Result<Vec<ParsedFile>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("reading directory {}", dir.display()))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !name.ends_with(".txt") {
            continue;
        }
        match parse_filename(&name) {
            Some(id) => files.push(ParsedFile { name, id }),
            None => log::debug!("Ignoring {name}: not a measurement filename"),
        }
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

// ---------------------------------------------------------------------------
// Table reader
// ---------------------------------------------------------------------------

/// Read a measurement table from disk. See [`parse_table`] for the layout.
pub fn read_table(path: &Path) -> Result<Table, TableError> {
    let text = std::fs::read_to_string(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_table(&text)
}

/// Parse a measurement table.
///
/// Layout:
/// ```text
/// # Oscilator_frequency (Hz)<TAB>Demod_4_X_A (V)<TAB>...
/// 1000.0   0.12   ...
/// ```
/// The first line starting with `#` declares the tab-separated column names.
/// Everything after a `#` is a comment; blank lines are skipped. Data rows are
/// whitespace separated and must have one value per column.
pub fn parse_table(text: &str) -> Result<Table, TableError> {
    let header = text
        .lines()
        .find(|line| line.starts_with('#'))
        .ok_or(TableError::MissingHeader)?;
    let columns: Vec<String> = header
        .trim_start_matches(['#', ' '])
        .trim()
        .split('\t')
        .map(|c| c.to_string())
        .collect();

    let mut table = Table::new(columns);
    let expected = table.columns.len();

    for (i, line) in text.lines().enumerate() {
        let data = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        };
        let tokens: Vec<&str> = data.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        if tokens.len() != expected {
            return Err(TableError::ColumnCountMismatch {
                line: i + 1,
                expected,
                found: tokens.len(),
            });
        }
        let row = tokens
            .iter()
            .map(|tok| {
                tok.parse::<f64>().map_err(|_| TableError::InvalidNumber {
                    line: i + 1,
                    token: tok.to_string(),
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        table.rows.push(row);
    }

    Ok(table)
}

// ---------------------------------------------------------------------------
// Table writer
// ---------------------------------------------------------------------------

/// Write `table` in the same layout [`parse_table`] reads: a `# ` header line
/// with tab-joined column names, then tab-separated rows. Missing cells are
/// written as `NaN`.
pub fn write_table<W: Write>(out: W, table: &Table) -> Result<(), TableError> {
    let mut out = BufWriter::new(out);
    writeln!(out, "# {}", table.columns.join("\t")).map_err(csv::Error::from)?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(out);
    for row in &table.rows {
        writer.write_record(row.iter().map(|v| format_cell(*v)))?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Create `path` and write `table` into it.
pub fn save_table(path: &Path, table: &Table) -> Result<(), TableError> {
    let file = File::create(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_table(file, table)
}

/// Floats keep a decimal point (`1000.0`); missing cells are written as `NaN`
/// so every row keeps one token per column.
fn format_cell(v: f64) -> String {
    format!("{v:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const BODY: &str = "# Oscilator_frequency (Hz)\tDemod_4_X_A (V)\n\
                        1000.0 0.5\n\
                        \n\
                        2000.0\t0.25   # trailing comment\n";

    #[test]
    fn parses_header_and_rows() {
        let table = parse_table(BODY).unwrap();
        assert_eq!(table.columns, vec!["Oscilator_frequency (Hz)", "Demod_4_X_A (V)"]);
        assert_eq!(table.rows, vec![vec![1000.0, 0.5], vec![2000.0, 0.25]]);
    }

    #[test]
    fn header_need_not_be_first_line() {
        let table = parse_table("1.0 2.0\n#a\tb\n3.0 4.0\n").unwrap();
        assert_eq!(table.columns, vec!["a", "b"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn missing_header_is_an_error() {
        assert!(matches!(
            parse_table("1.0 2.0\n"),
            Err(TableError::MissingHeader)
        ));
    }

    #[test]
    fn column_count_mismatch_is_an_error() {
        let err = parse_table("# a\tb\n1.0 2.0\n3.0\n").unwrap_err();
        assert!(matches!(
            err,
            TableError::ColumnCountMismatch {
                line: 3,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn non_numeric_cell_is_an_error() {
        let err = parse_table("# a\tb\n1.0 foo\n").unwrap_err();
        assert!(matches!(err, TableError::InvalidNumber { line: 2, .. }));
    }

    #[test]
    fn writes_header_and_tab_separated_rows() {
        let mut table = Table::new(vec!["f (Hz)".into(), "v".into()]);
        table.rows = vec![vec![1000.0, 3.0], vec![2000.0, f64::NAN]];

        let mut buf = Vec::new();
        write_table(&mut buf, &table).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "# f (Hz)\tv\n1000.0\t3.0\n2000.0\tNaN\n");
    }

    #[test]
    fn written_table_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        let table = parse_table(BODY).unwrap();
        save_table(&path, &table).unwrap();
        assert_eq!(read_table(&path).unwrap(), table);
    }

    #[test]
    fn missing_cells_read_back_as_nan() {
        let mut table = Table::new(vec!["f".into(), "v".into(), "w".into()]);
        table.rows = vec![vec![1.0, 2.0, f64::NAN], vec![2.0, f64::NAN, 8.0]];

        let mut buf = Vec::new();
        write_table(&mut buf, &table).unwrap();
        let back = parse_table(&String::from_utf8(buf).unwrap()).unwrap();
        assert_eq!(back.columns, table.columns);
        assert_eq!(back.rows[0][..2], [1.0, 2.0]);
        assert!(back.rows[0][2].is_nan());
        assert!(back.rows[1][1].is_nan());
        assert_eq!(back.rows[1][2], 8.0);
    }

    #[test]
    fn scan_keeps_only_matching_txt_files() {
        let dir = TempDir::new().unwrap();
        let good = "2023-01-05_A-P1_c-config_1daydeg_200-1Hz_10p_0V_1Vpk.txt";
        let csv = "2023-01-05_A-P1_c-config_1daydeg_200-1Hz_10p_0V_1Vpk.csv";
        for name in [good, "notes.txt", csv] {
            std::fs::write(dir.path().join(name), "# a\n").unwrap();
        }

        let files = scan_directory(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, good);
        assert_eq!(files[0].id.frequency_range, "200-1Hz");
    }

    #[test]
    fn scan_of_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        assert!(scan_directory(&dir.path().join("raw_data")).is_err());
    }
}
