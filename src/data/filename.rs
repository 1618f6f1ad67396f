use chrono::NaiveDate;

use super::model::{MeasurementId, DATE_FORMAT};

/// Literal closing the device configuration field.
const CONFIG_ANCHOR: &str = "-config_";

/// Literal closing the amplitude field.
const AMPLITUDE_SUFFIX: &str = "Vpk";

/// Frequency range label written into combined filenames.
pub const COMBINED_RANGE: &str = "500k-1Hz";

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a measurement filename.
///
/// Grammar, anchored at the start of `name` (anything after `Vpk` is ignored):
///
/// ```text
/// {date}_{chemistry}-{pixel}_{configuration}-config_{degradation}_{range}_{capture}_{offset}_{amplitude}Vpk...
/// ```
///
/// Returns `None` unless all nine fields are present and non-empty.
pub fn parse_filename(name: &str) -> Option<MeasurementId> {
    let (date, rest) = take_date(name)?;
    let (device_chemistry, rest) = take_until(rest, '-')?;
    let (device_pixel, rest) = take_until(rest, '_')?;

    // The configuration may itself contain "-config_", so every anchor is a
    // candidate end; the first one that lets the tail parse wins.
    for (end, _) in rest.match_indices(CONFIG_ANCHOR) {
        if end == 0 {
            continue;
        }
        let tail = &rest[end + CONFIG_ANCHOR.len()..];
        if let Some(tail) = parse_tail(tail) {
            return Some(MeasurementId {
                date,
                device_chemistry: device_chemistry.to_string(),
                device_pixel: device_pixel.to_string(),
                device_configuration: rest[..end].to_string(),
                device_degradation: tail.degradation.to_string(),
                frequency_range: tail.frequency_range.to_string(),
                datapoint_capture: tail.datapoint_capture.to_string(),
                voltage_offset: tail.voltage_offset.to_string(),
                voltage_amplitude: tail.voltage_amplitude.to_string(),
            });
        }
    }
    None
}

struct Tail<'a> {
    degradation: &'a str,
    frequency_range: &'a str,
    datapoint_capture: &'a str,
    voltage_offset: &'a str,
    voltage_amplitude: &'a str,
}

fn parse_tail(s: &str) -> Option<Tail<'_>> {
    let (degradation, s) = take_until(s, '_')?;
    let (frequency_range, s) = take_until(s, '_')?;
    let (datapoint_capture, s) = take_until(s, '_')?;
    let (voltage_offset, s) = take_until(s, '_')?;

    // Amplitude runs up to the first `V`, which has to open `Vpk`.
    let v = s.find('V')?;
    if v == 0 || !s[v..].starts_with(AMPLITUDE_SUFFIX) {
        return None;
    }
    Some(Tail {
        degradation,
        frequency_range,
        datapoint_capture,
        voltage_offset,
        voltage_amplitude: &s[..v],
    })
}

/// `YYYY-MM-DD_` with a valid calendar date.
fn take_date(s: &str) -> Option<(NaiveDate, &str)> {
    let bytes = s.as_bytes();
    if bytes.len() < 11 || bytes[10] != b'_' {
        return None;
    }
    let shape_ok = bytes[..10].iter().enumerate().all(|(i, b)| match i {
        4 | 7 => *b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shape_ok {
        return None;
    }
    let date = NaiveDate::parse_from_str(&s[..10], DATE_FORMAT).ok()?;
    Some((date, &s[11..]))
}

/// Split off a non-empty token ending at the first `delim`, dropping the
/// delimiter.
fn take_until(s: &str, delim: char) -> Option<(&str, &str)> {
    let idx = s.find(delim)?;
    if idx == 0 {
        return None;
    }
    Some((&s[..idx], &s[idx + delim.len_utf8()..]))
}

// ---------------------------------------------------------------------------
// Synthesis
// ---------------------------------------------------------------------------

/// Name of the file holding a combined sweep.
///
/// Chemistry, pixel, configuration, offset and amplitude come from `template`;
/// date, degradation and capture carry the merged provenance.
pub fn combined_filename(
    template: &MeasurementId,
    newest_date: NaiveDate,
    peak_degradation: u64,
    total_capture: u64,
) -> String {
    format!(
        "{date}_{chem}-{pixel}_{config}-config_{peak_degradation}daydeg_{COMBINED_RANGE}_{total_capture}p-1s_{offset}_{amp}Vpk.txt",
        date = newest_date.format(DATE_FORMAT),
        chem = template.device_chemistry,
        pixel = template.device_pixel,
        config = template.device_configuration,
        offset = template.voltage_offset,
        amp = template.voltage_amplitude,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: &str = "2023-01-05_PEDOT-P1_2e_ref-config_3daydeg_500k-5kHz_100p-1s_0V_0.5Vpk.txt";

    #[test]
    fn parses_all_nine_fields() {
        let id = parse_filename(NAME).unwrap();
        assert_eq!(id.date, NaiveDate::from_ymd_opt(2023, 1, 5).unwrap());
        assert_eq!(id.device_chemistry, "PEDOT");
        assert_eq!(id.device_pixel, "P1");
        assert_eq!(id.device_configuration, "2e_ref");
        assert_eq!(id.device_degradation, "3daydeg");
        assert_eq!(id.frequency_range, "500k-5kHz");
        assert_eq!(id.datapoint_capture, "100p-1s");
        assert_eq!(id.voltage_offset, "0V");
        assert_eq!(id.voltage_amplitude, "0.5");
    }

    #[test]
    fn configuration_keeps_internal_delimiters() {
        let id = parse_filename(
            "2023-01-05_PEDOT-P1_a-b_c-d-config_3daydeg_5k-200Hz_100p_0V_1Vpk.txt",
        )
        .unwrap();
        assert_eq!(id.device_configuration, "a-b_c-d");
        assert_eq!(id.frequency_range, "5k-200Hz");
    }

    #[test]
    fn configuration_extends_past_anchor_when_tail_fails() {
        // Closing at the first anchor would leave `0` as amplitude followed by
        // `V_`, so the second anchor has to close the configuration.
        let id = parse_filename(
            "2023-01-05_A-B_x-config_y-config_1daydeg_200-1Hz_10p_0V_2Vpk",
        )
        .unwrap();
        assert_eq!(id.device_configuration, "x-config_y");
        assert_eq!(id.device_degradation, "1daydeg");
    }

    #[test]
    fn pixel_may_contain_hyphen() {
        let id = parse_filename("2023-01-05_A-B-2_c-config_1d_200-1Hz_10p_0V_2Vpk").unwrap();
        assert_eq!(id.device_chemistry, "A");
        assert_eq!(id.device_pixel, "B-2");
    }

    #[test]
    fn amplitude_stops_before_vpk() {
        let id = parse_filename("2023-01-05_A-B_c-config_1d_200-1Hz_10p_0.1V_0.25Vpk_rep2.txt")
            .unwrap();
        assert_eq!(id.voltage_offset, "0.1V");
        assert_eq!(id.voltage_amplitude, "0.25");
    }

    #[test]
    fn rejects_partial_matches() {
        let bad = [
            "",
            "notes.txt",
            "2023-01-05_PEDOT-P1_2e_ref_3daydeg_500k-5kHz_100p_0V_0.5Vpk.txt",
            "2023-01-05_PEDOT-P1_2e_ref-config_3daydeg_500k-5kHz_100p_0V_0.5V.txt",
            "2023-01-05_PEDOT-P1_2e_ref-config_3daydeg_500k-5kHz_100p_0V_Vpk.txt",
            "2023-01-05_PEDOT-P1_2e_ref-config_3daydeg_500k-5kHz_100p_0.5Vpk.txt",
            "2023-1-05_PEDOT-P1_2e_ref-config_3daydeg_500k-5kHz_100p_0V_0.5Vpk.txt",
            "2023-02-30_PEDOT-P1_2e_ref-config_3daydeg_500k-5kHz_100p_0V_0.5Vpk.txt",
            "x2023-01-05_PEDOT-P1_2e_ref-config_3daydeg_500k-5kHz_100p_0V_0.5Vpk.txt",
            "2023-01-05_PEDOT-P1_-config_3daydeg_500k-5kHz_100p_0V_0.5Vpk.txt",
            "2023-01-05_-P1_c-config_3daydeg_500k-5kHz_100p_0V_0.5Vpk.txt",
        ];
        for name in bad {
            assert!(parse_filename(name).is_none(), "{name} should not parse");
        }
    }

    #[test]
    fn amplitude_must_be_followed_by_pk() {
        // First `V` closes the amplitude; "V2Vpk" does not qualify.
        assert!(parse_filename("2023-01-05_A-B_c-config_1d_200-1Hz_10p_0_1V2Vpk").is_none());
    }

    #[test]
    fn combined_name_round_trips() {
        let id = parse_filename(NAME).unwrap();
        let newest = NaiveDate::from_ymd_opt(2023, 2, 1).unwrap();
        let name = combined_filename(&id, newest, 7, 150);
        assert_eq!(
            name,
            "2023-02-01_PEDOT-P1_2e_ref-config_7daydeg_500k-1Hz_150p-1s_0V_0.5Vpk.txt"
        );

        let reparsed = parse_filename(&name).unwrap();
        assert_eq!(reparsed.date, newest);
        assert_eq!(reparsed.device_degradation, "7daydeg");
        assert_eq!(reparsed.frequency_range, COMBINED_RANGE);
        assert_eq!(reparsed.datapoint_capture, "150p-1s");
        assert_eq!(reparsed.device_configuration, id.device_configuration);
        assert_eq!(reparsed.voltage_amplitude, id.voltage_amplitude);
    }
}
