use std::borrow::Cow;
use std::fmt;

use chrono::NaiveDate;

/// Date layout used in measurement filenames.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Field – one named slot of the filename grammar
// ---------------------------------------------------------------------------

/// The nine filename fields, in the order they appear in a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Date,
    DeviceChemistry,
    DevicePixel,
    DeviceConfiguration,
    DeviceDegradation,
    FrequencyRange,
    DatapointCapture,
    VoltageOffset,
    VoltageAmplitude,
}

impl Field {
    /// All fields in grammar order.
    pub const ALL: [Field; 9] = [
        Field::Date,
        Field::DeviceChemistry,
        Field::DevicePixel,
        Field::DeviceConfiguration,
        Field::DeviceDegradation,
        Field::FrequencyRange,
        Field::DatapointCapture,
        Field::VoltageOffset,
        Field::VoltageAmplitude,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::DeviceChemistry => "device_chemistry",
            Field::DevicePixel => "device_pixel",
            Field::DeviceConfiguration => "device_configuration",
            Field::DeviceDegradation => "device_degradation",
            Field::FrequencyRange => "frequency_range",
            Field::DatapointCapture => "datapoint_capture",
            Field::VoltageOffset => "voltage_offset",
            Field::VoltageAmplitude => "voltage_amplitude",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// MeasurementId – metadata carried by a filename
// ---------------------------------------------------------------------------

/// Identity of one measurement file, derived from its name.
///
/// All fields except `date` are the raw tokens from the filename; grouping
/// compares them as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MeasurementId {
    pub date: NaiveDate,
    pub device_chemistry: String,
    pub device_pixel: String,
    /// May contain `_` and `-`.
    pub device_configuration: String,
    /// e.g. `7daydeg`
    pub device_degradation: String,
    /// e.g. `500k-5kHz`
    pub frequency_range: String,
    /// e.g. `100p-1s`
    pub datapoint_capture: String,
    pub voltage_offset: String,
    /// Peak amplitude in volts, as written in the filename.
    pub voltage_amplitude: String,
}

impl MeasurementId {
    /// Raw string value of a field. The date is rendered back as `YYYY-MM-DD`.
    pub fn value(&self, field: Field) -> Cow<'_, str> {
        match field {
            Field::Date => Cow::Owned(self.date.format(DATE_FORMAT).to_string()),
            Field::DeviceChemistry => Cow::Borrowed(&self.device_chemistry),
            Field::DevicePixel => Cow::Borrowed(&self.device_pixel),
            Field::DeviceConfiguration => Cow::Borrowed(&self.device_configuration),
            Field::DeviceDegradation => Cow::Borrowed(&self.device_degradation),
            Field::FrequencyRange => Cow::Borrowed(&self.frequency_range),
            Field::DatapointCapture => Cow::Borrowed(&self.datapoint_capture),
            Field::VoltageOffset => Cow::Borrowed(&self.voltage_offset),
            Field::VoltageAmplitude => Cow::Borrowed(&self.voltage_amplitude),
        }
    }

    /// The amplitude token parsed as volts, if it is a number.
    pub fn amplitude_volts(&self) -> Option<f64> {
        self.voltage_amplitude.trim().parse::<f64>().ok()
    }
}

/// A filename that matched the grammar, together with its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFile {
    pub name: String,
    pub id: MeasurementId,
}

// ---------------------------------------------------------------------------
// GroupKey – retained (field, value) pairs of an equivalence group
// ---------------------------------------------------------------------------

/// Ordered tuple of the fields that were *not* excluded when grouping.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey(pub Vec<(Field, String)>);

impl GroupKey {
    /// Build the key of `id`, keeping every field not listed in `excluded`.
    pub fn of(id: &MeasurementId, excluded: &[Field]) -> Self {
        GroupKey(
            Field::ALL
                .into_iter()
                .filter(|f| !excluded.contains(f))
                .map(|f| (f, id.value(f).into_owned()))
                .collect(),
        )
    }

    /// Value of a retained field.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "({})", parts.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Table – numeric body of a measurement file
// ---------------------------------------------------------------------------

/// A purely numeric table. Missing cells are `NaN`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    /// Row-major; every row has `columns.len()` cells.
    pub rows: Vec<Vec<f64>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a column, one value per existing row.
    pub fn push_column(&mut self, name: &str, values: impl IntoIterator<Item = f64>) {
        self.columns.push(name.to_string());
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.push(values.next().unwrap_or(f64::NAN));
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
