//! Output serialization for collected records.
//!
//! Writes the whole batch to a single file: a JSON array (no
//! pretty-printing) or CSV with a header row taken from the record's
//! declared column order.

use crate::error::GeocodeError;
use crate::types::{GeocodeRecord, OutputFormat};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Default output filename for a format.
pub fn default_output_path(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Json => "results.json",
        OutputFormat::Csv => "results.csv",
    }
}

/// Serialize `records` to `path` in the requested format.
pub fn save_records(
    records: &[GeocodeRecord],
    format: OutputFormat,
    path: &Path,
) -> Result<(), GeocodeError> {
    let file = File::create(path).map_err(|e| {
        GeocodeError::file_error(path.to_string_lossy(), format!("failed to create file: {}", e))
    })?;
    let mut writer = BufWriter::new(file);

    match format {
        OutputFormat::Json => {
            serde_json::to_writer(&mut writer, records)?;
        }
        OutputFormat::Csv => {
            writer.write_all(to_csv_string(records).as_bytes()).map_err(|e| {
                GeocodeError::file_error(path.to_string_lossy(), format!("failed to write: {}", e))
            })?;
        }
    }

    writer.flush().map_err(|e| {
        GeocodeError::file_error(path.to_string_lossy(), format!("failed to flush: {}", e))
    })?;

    info!("saved {} records to {}", records.len(), path.display());
    Ok(())
}

/// Render records as CSV: header row plus one row per record.
pub fn to_csv_string(records: &[GeocodeRecord]) -> String {
    let mut out = String::new();
    out.push_str(&GeocodeRecord::CSV_COLUMNS.join(","));
    out.push('\n');

    for record in records {
        let row = record
            .csv_row()
            .iter()
            .map(|cell| csv_escape(cell))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&row);
        out.push('\n');
    }

    out
}

/// Quote a CSV field when it contains a delimiter, quote, or line break.
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_records() -> Vec<GeocodeRecord> {
        vec![
            GeocodeRecord {
                place_id: Some("abc123".to_string()),
                formatted_address: Some("Pariser Platz, 10117 Berlin, Germany".to_string()),
                latitude: Some(52.5162746),
                longitude: Some(13.3777041),
                input_string: "brandenburg gate".to_string(),
                number_of_results: 1,
                status: Some("OK".to_string()),
                ..GeocodeRecord::default()
            },
            GeocodeRecord {
                input_string: "atlantis".to_string(),
                number_of_results: 0,
                status: Some("ZERO_RESULTS".to_string()),
                ..GeocodeRecord::default()
            },
        ]
    }

    #[test]
    fn test_csv_has_header_plus_one_row_per_record() {
        let records = sample_records();
        let csv = to_csv_string(&records);
        let rows: Vec<&str> = csv.lines().collect();

        assert_eq!(rows.len(), records.len() + 1);
        assert_eq!(
            rows[0].split(',').count(),
            GeocodeRecord::CSV_COLUMNS.len()
        );
        assert_eq!(rows[0], GeocodeRecord::CSV_COLUMNS.join(","));
    }

    #[test]
    fn test_csv_quotes_fields_containing_commas() {
        let records = sample_records();
        let csv = to_csv_string(&records);

        assert!(csv.contains("\"Pariser Platz, 10117 Berlin, Germany\""));
    }

    #[test]
    fn test_csv_escapes_embedded_quotes() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let records = sample_records();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");

        save_records(&records, OutputFormat::Json, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let reloaded: Vec<GeocodeRecord> = serde_json::from_str(&contents).unwrap();
        assert_eq!(reloaded, records);
    }

    #[test]
    fn test_save_csv_writes_file() {
        let records = sample_records();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.csv");

        save_records(&records, OutputFormat::Csv, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), records.len() + 1);
        assert!(contents.starts_with("place_id,formatted_address,type"));
    }

    #[test]
    fn test_save_to_unwritable_path_is_file_error() {
        let records = sample_records();
        let err = save_records(
            &records,
            OutputFormat::Json,
            Path::new("/nonexistent-dir/results.json"),
        )
        .unwrap_err();
        assert!(matches!(err, GeocodeError::File { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_default_output_paths() {
        assert_eq!(default_output_path(OutputFormat::Json), "results.json");
        assert_eq!(default_output_path(OutputFormat::Csv), "results.csv");
    }
}
