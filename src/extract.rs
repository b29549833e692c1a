//! Extraction of NEO records from CSV and close approaches from JSON.
//!
//! The `read_*` functions work over any reader and report the first failure
//! alongside whatever records were parsed before it. The `load_*` functions
//! open a file, log any failure and hand back the records.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;
use tracing::{error, info};

use crate::error::ExtractError;
use crate::helpers::cd_to_datetime;
use crate::models::{CloseApproach, NearEarthObject};

// Fixed column positions in the NEO catalog CSV.
const COL_DESIGNATION: usize = 3;
const COL_NAME: usize = 4;
const COL_HAZARDOUS: usize = 7;
const COL_DIAMETER: usize = 15;
const MIN_NEO_COLUMNS: usize = COL_DIAMETER + 1;

// Close-approach fields required in the JSON `fields` header.
const FIELD_DESIGNATION: &str = "des";
const FIELD_DATE: &str = "cd";
const FIELD_DISTANCE: &str = "dist";
const FIELD_VELOCITY: &str = "v_rel";

/// Records extracted from one source, plus the error that stopped extraction early.
#[derive(Debug)]
pub struct Loaded<T> {
    pub records: Vec<T>,
    pub error: Option<ExtractError>,
}

impl<T> Loaded<T> {
    fn complete(records: Vec<T>) -> Self {
        Self {
            records,
            error: None,
        }
    }

    fn partial(records: Vec<T>, error: ExtractError) -> Self {
        Self {
            records,
            error: Some(error),
        }
    }

    /// `true` when the whole source was consumed without error.
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Converts into a `Result`, discarding partial records on failure.
    pub fn into_result(self) -> Result<Vec<T>, ExtractError> {
        match self.error {
            None => Ok(self.records),
            Some(e) => Err(e),
        }
    }
}

/// Reads NEO records from CSV data whose first row is a header.
pub fn read_neos<R: Read>(reader: R) -> Loaded<NearEarthObject> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut neos = Vec::new();

    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(source) => {
                let row = source.position().map(|p| p.line()).unwrap_or(0);
                return Loaded::partial(neos, ExtractError::Csv { row, source });
            }
        };

        match neo_from_record(&record) {
            Ok(neo) => neos.push(neo),
            Err(e) => return Loaded::partial(neos, e),
        }
    }

    Loaded::complete(neos)
}

fn neo_from_record(record: &csv::StringRecord) -> Result<NearEarthObject, ExtractError> {
    let row = record.position().map(|p| p.line()).unwrap_or(0);

    if record.len() < MIN_NEO_COLUMNS {
        return Err(ExtractError::ShortRow {
            row,
            found: record.len(),
            expected: MIN_NEO_COLUMNS,
        });
    }

    let designation = &record[COL_DESIGNATION];
    let name = &record[COL_NAME];
    let hazardous = record[COL_HAZARDOUS].eq_ignore_ascii_case("y");

    let raw_diameter = record[COL_DIAMETER].trim();
    let diameter = if raw_diameter.is_empty() {
        None
    } else {
        let d = raw_diameter
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite())
            .ok_or_else(|| ExtractError::InvalidNumber {
                row,
                field: "diameter",
                value: raw_diameter.to_string(),
            })?;
        Some(d)
    };

    Ok(NearEarthObject::new(
        designation,
        Some(name.to_string()),
        diameter,
        hazardous,
    ))
}

/// Raw close-approach document: a header of column names and positional rows.
#[derive(Debug, Deserialize)]
struct CadDocument {
    fields: Vec<String>,
    data: Vec<Vec<Value>>,
}

/// Column positions of the close-approach fields this crate consumes.
struct FieldIndices {
    designation: usize,
    date: usize,
    distance: usize,
    velocity: usize,
}

impl FieldIndices {
    fn resolve(fields: &[String]) -> Result<Self, ExtractError> {
        let positions: HashMap<&str, usize> = fields
            .iter()
            .enumerate()
            .rev()
            .map(|(i, f)| (f.as_str(), i))
            .collect();

        let find = |name: &'static str| {
            positions
                .get(name)
                .copied()
                .ok_or(ExtractError::MissingField(name))
        };

        Ok(Self {
            designation: find(FIELD_DESIGNATION)?,
            date: find(FIELD_DATE)?,
            distance: find(FIELD_DISTANCE)?,
            velocity: find(FIELD_VELOCITY)?,
        })
    }
}

/// Reads close approaches from a `{"fields": [...], "data": [[...], ...]}` document.
pub fn read_approaches<R: Read>(reader: R) -> Loaded<CloseApproach> {
    let doc: CadDocument = match serde_json::from_reader(reader) {
        Ok(doc) => doc,
        Err(e) => return Loaded::partial(Vec::new(), e.into()),
    };

    let indices = match FieldIndices::resolve(&doc.fields) {
        Ok(indices) => indices,
        Err(e) => return Loaded::partial(Vec::new(), e),
    };

    let mut approaches = Vec::with_capacity(doc.data.len());

    for (i, row) in doc.data.iter().enumerate() {
        match approach_from_row(row, &indices, i as u64) {
            Ok(ca) => approaches.push(ca),
            Err(e) => return Loaded::partial(approaches, e),
        }
    }

    Loaded::complete(approaches)
}

fn approach_from_row(
    row: &[Value],
    indices: &FieldIndices,
    row_no: u64,
) -> Result<CloseApproach, ExtractError> {
    let cell = |idx: usize, field: &str| {
        row.get(idx).ok_or_else(|| ExtractError::MalformedRow {
            row: row_no,
            reason: format!("missing '{field}' at column {idx} (row has {})", row.len()),
        })
    };

    let designation = match cell(indices.designation, FIELD_DESIGNATION)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(ExtractError::MalformedRow {
                row: row_no,
                reason: format!("designation is not text: {other}"),
            });
        }
    };

    let cd = cell(indices.date, FIELD_DATE)?;
    let time = cd
        .as_str()
        .and_then(|s| cd_to_datetime(s).ok())
        .ok_or_else(|| ExtractError::InvalidDate {
            row: row_no,
            value: cd.to_string(),
        })?;

    let distance = number_cell(cell(indices.distance, FIELD_DISTANCE)?, "distance", row_no)?;
    let velocity = number_cell(cell(indices.velocity, FIELD_VELOCITY)?, "velocity", row_no)?;

    Ok(CloseApproach {
        designation,
        time,
        distance,
        velocity,
    })
}

/// Accepts either a JSON number or a string holding a finite one.
fn number_cell(value: &Value, field: &'static str, row: u64) -> Result<f64, ExtractError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite());

    parsed.ok_or_else(|| ExtractError::InvalidNumber {
        row,
        field,
        value: value.to_string(),
    })
}

fn open(path: &Path) -> Result<BufReader<File>, ExtractError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn log_failure(kind: &str, err: &ExtractError, kept: usize) {
    match err {
        ExtractError::Io { path, source } if source.kind() == ErrorKind::NotFound => {
            error!(path = %path.display(), "{kind} file not found");
        }
        _ => {
            error!(error = %err, kept, "Invalid {kind} format or missing data");
        }
    }
}

/// Loads NEOs from a CSV file, returning whatever was read before any failure.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_neos(path: &Path) -> Vec<NearEarthObject> {
    let loaded = match open(path) {
        Ok(reader) => read_neos(reader),
        Err(e) => Loaded::partial(Vec::new(), e),
    };

    if let Some(err) = &loaded.error {
        log_failure("CSV", err, loaded.records.len());
    } else {
        info!(count = loaded.records.len(), "Loaded near-Earth objects");
    }

    loaded.records
}

/// Loads close approaches from a JSON file, returning whatever was read before any failure.
#[tracing::instrument(skip_all, fields(path = %path.display()))]
pub fn load_approaches(path: &Path) -> Vec<CloseApproach> {
    let loaded = match open(path) {
        Ok(reader) => read_approaches(reader),
        Err(e) => Loaded::partial(Vec::new(), e),
    };

    if let Some(err) = &loaded.error {
        log_failure("JSON", err, loaded.records.len());
    } else {
        info!(count = loaded.records.len(), "Loaded close approaches");
    }

    loaded.records
}
