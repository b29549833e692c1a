//! Output of linked close approaches as CSV or JSON.
//!
//! Every row pairs a close approach with its NEO. CSV rows are flat with a
//! fixed column order; JSON entries nest the NEO under a `neo` key.

use anyhow::{Context, Result, bail};
use csv::WriterBuilder;
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::models::LinkedApproach;

/// Column order of the CSV output.
pub const CSV_HEADER: [&str; 7] = [
    "datetime_utc",
    "distance_au",
    "velocity_km_s",
    "designation",
    "name",
    "diameter_km",
    "potentially_hazardous",
];

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    datetime_utc: String,
    distance_au: f64,
    velocity_km_s: f64,
    designation: &'a str,
    name: &'a str,
    diameter_km: Option<f64>,
    potentially_hazardous: &'static str,
}

impl<'a> From<LinkedApproach<'a>> for CsvRow<'a> {
    fn from(linked: LinkedApproach<'a>) -> Self {
        let LinkedApproach { approach, neo } = linked;
        CsvRow {
            datetime_utc: approach.time_str(),
            distance_au: approach.distance,
            velocity_km_s: approach.velocity,
            designation: &neo.designation,
            name: neo.name.as_deref().unwrap_or(""),
            diameter_km: neo.diameter,
            potentially_hazardous: if neo.hazardous { "True" } else { "False" },
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonNeo<'a> {
    designation: &'a str,
    name: &'a str,
    diameter_km: f64,
    potentially_hazardous: bool,
}

#[derive(Debug, Serialize)]
struct JsonApproach<'a> {
    datetime_utc: String,
    distance_au: f64,
    velocity_km_s: f64,
    neo: JsonNeo<'a>,
}

impl<'a> From<LinkedApproach<'a>> for JsonApproach<'a> {
    fn from(linked: LinkedApproach<'a>) -> Self {
        let LinkedApproach { approach, neo } = linked;
        JsonApproach {
            datetime_utc: approach.time_str(),
            distance_au: approach.distance,
            velocity_km_s: approach.velocity,
            neo: JsonNeo {
                designation: &neo.designation,
                name: neo.name.as_deref().unwrap_or(""),
                diameter_km: neo.diameter.unwrap_or(f64::NAN),
                potentially_hazardous: neo.hazardous,
            },
        }
    }
}

/// Pretty-printer that emits the bare `NaN` token for the missing-diameter sentinel.
///
/// serde_json routes non-finite floats through `write_null`. None of the output
/// fields are nullable and the loader rejects non-finite values, so the only
/// null reaching this formatter is the NaN diameter.
#[derive(Default)]
struct NanFormatter {
    inner: PrettyFormatter<'static>,
}

impl Formatter for NanFormatter {
    fn write_null<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b"NaN")
    }

    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }
}

/// Writes linked approaches as CSV to any writer. Returns the number of data rows.
///
/// The header is always written, even for an empty stream.
pub fn write_csv<'a, W: Write>(
    results: impl IntoIterator<Item = LinkedApproach<'a>>,
    writer: W,
) -> Result<usize> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(CSV_HEADER)?;

    let mut count = 0;
    for linked in results {
        wtr.serialize(CsvRow::from(linked))?;
        count += 1;
    }

    wtr.flush()?;
    Ok(count)
}

/// Writes linked approaches as an indented JSON array to any writer.
pub fn write_json<'a, W: Write>(
    results: impl IntoIterator<Item = LinkedApproach<'a>>,
    writer: W,
) -> Result<usize> {
    let entries: Vec<JsonApproach<'a>> = results.into_iter().map(JsonApproach::from).collect();

    let mut ser = serde_json::Serializer::with_formatter(writer, NanFormatter::default());
    entries.serialize(&mut ser)?;
    ser.into_inner().flush()?;

    Ok(entries.len())
}

/// Writes the results to a CSV file at `path`, replacing any existing file.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn write_to_csv<'a>(
    results: impl IntoIterator<Item = LinkedApproach<'a>>,
    path: &Path,
) -> Result<usize> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let rows = write_csv(results, file)?;
    info!(rows, "CSV results written");
    Ok(rows)
}

/// Writes the results to a JSON file at `path`, replacing any existing file.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn write_to_json<'a>(
    results: impl IntoIterator<Item = LinkedApproach<'a>>,
    path: &Path,
) -> Result<usize> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let rows = write_json(results, BufWriter::new(file))?;
    info!(rows, "JSON results written");
    Ok(rows)
}

/// Writes the results in the format named by the file extension (`.csv` or `.json`).
pub fn write_results<'a>(
    results: impl IntoIterator<Item = LinkedApproach<'a>>,
    path: &Path,
) -> Result<usize> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    debug!(path = %path.display(), ext = %ext, "Selecting output format");

    match ext.as_str() {
        "csv" => write_to_csv(results, path),
        "json" => write_to_json(results, path),
        other => bail!("Unsupported output extension: .{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::cd_to_datetime;
    use crate::models::{CloseApproach, NearEarthObject};

    fn approach(des: &str) -> CloseApproach {
        CloseApproach {
            designation: des.to_string(),
            time: cd_to_datetime("1900-Dec-27 01:30").unwrap(),
            distance: 0.3149,
            velocity: 5.5758,
        }
    }

    fn eros() -> NearEarthObject {
        NearEarthObject::new("433", Some("Eros".into()), Some(16.84), false)
    }

    fn unnamed() -> NearEarthObject {
        NearEarthObject::new("2020 AB", None, None, true)
    }

    #[test]
    fn test_csv_header_and_rows() {
        let (ca1, neo1) = (approach("433"), eros());
        let (ca2, neo2) = (approach("2020 AB"), unnamed());
        let results = vec![
            LinkedApproach { approach: &ca1, neo: &neo1 },
            LinkedApproach { approach: &ca2, neo: &neo2 },
        ];

        let mut buf = Vec::new();
        let count = write_csv(results, &mut buf).unwrap();
        assert_eq!(count, 2);

        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                "datetime_utc,distance_au,velocity_km_s,designation,name,diameter_km,potentially_hazardous",
                "1900-12-27 01:30,0.3149,5.5758,433,Eros,16.84,False",
                "1900-12-27 01:30,0.3149,5.5758,2020 AB,,,True",
            ]
        );
    }

    #[test]
    fn test_csv_empty_stream_writes_header() {
        let mut buf = Vec::new();
        let count = write_csv(Vec::<LinkedApproach>::new(), &mut buf).unwrap();
        assert_eq!(count, 0);
        assert_eq!(String::from_utf8(buf).unwrap().trim_end(), CSV_HEADER.join(","));
    }

    #[test]
    fn test_json_nests_neo() {
        let (ca, neo) = (approach("433"), eros());
        let mut buf = Vec::new();
        write_json(vec![LinkedApproach { approach: &ca, neo: &neo }], &mut buf).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        let entry = &value[0];
        assert_eq!(entry["datetime_utc"], "1900-12-27 01:30");
        assert_eq!(entry["distance_au"], 0.3149);
        assert_eq!(entry["velocity_km_s"], 5.5758);
        assert_eq!(entry["neo"]["designation"], "433");
        assert_eq!(entry["neo"]["name"], "Eros");
        assert_eq!(entry["neo"]["diameter_km"], 16.84);
        assert_eq!(entry["neo"]["potentially_hazardous"], false);
    }

    #[test]
    fn test_json_missing_values_use_sentinels() {
        let (ca, neo) = (approach("2020 AB"), unnamed());
        let mut buf = Vec::new();
        write_json(vec![LinkedApproach { approach: &ca, neo: &neo }], &mut buf).unwrap();

        let output = String::from_utf8(buf).unwrap();
        assert!(output.contains(r#""name": """#));
        assert!(output.contains(r#""diameter_km": NaN"#));
        assert!(output.contains(r#""potentially_hazardous": true"#));
        assert!(!output.contains("null"));
    }

    #[test]
    fn test_json_is_indented() {
        let mut buf = Vec::new();
        write_json(Vec::<LinkedApproach>::new(), &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "[]");

        let (ca, neo) = (approach("433"), eros());
        let mut buf = Vec::new();
        write_json(vec![LinkedApproach { approach: &ca, neo: &neo }], &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert!(output.starts_with("[\n  {\n    \"datetime_utc\""));
        assert!(output.contains("\n    \"neo\": {\n      \"designation\": \"433\""));
    }

    #[test]
    fn test_write_results_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_results(Vec::<LinkedApproach>::new(), &dir.path().join("out.txt")).unwrap_err();
        assert!(err.to_string().contains(".txt"));
    }

    #[test]
    fn test_write_results_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("out.CSV");
        let json_path = dir.path().join("out.json");

        write_results(Vec::<LinkedApproach>::new(), &csv_path).unwrap();
        write_results(Vec::<LinkedApproach>::new(), &json_path).unwrap();

        assert!(std::fs::read_to_string(csv_path).unwrap().starts_with("datetime_utc,"));
        assert_eq!(std::fs::read_to_string(json_path).unwrap(), "[]");
    }
}
