use crate::error::{PipelineError, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Columns that must appear in the header row (exact, case-sensitive)
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "order_id",
    "order_date",
    "order_time",
    "pizza_id",
    "pizza_name",
    "pizza_category",
    "pizza_size",
    "quantity",
    "unit_price",
];

/// One pizza line item exactly as it appears in the source table.
/// Every field is text so a malformed value never aborts the whole load.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub order_id: String,
    pub order_date: String,
    pub order_time: String,
    pub pizza_id: String,
    pub pizza_name: String,
    pub pizza_category: String,
    pub pizza_size: String,
    pub quantity: String,
    pub unit_price: String,

    /// Optional column, recomputed depending on `PricingMode`
    #[serde(default)]
    pub total_price: Option<String>,
}

/// Validated line item: date, time and prices are typed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub order_id: String,
    pub order_date: NaiveDate,
    pub order_time: NaiveTime,
    pub pizza_id: String,
    pub pizza_name: String,
    pub pizza_category: String,
    pub pizza_size: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total_price: f64,
}

/// Normalized line item enriched with temporal features.
/// Flat on purpose: the CSV writer cannot serialize nested structs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedRecord {
    pub order_id: String,
    pub order_date: NaiveDate,
    pub order_time: NaiveTime,
    pub pizza_id: String,
    pub pizza_name: String,
    pub pizza_category: String,
    pub pizza_size: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total_price: f64,

    // Derived
    pub order_hour: u32,
    pub day_of_week: String,
    pub month_name: String,
    pub week_number: u32,
}

/// Rows decoded from a CSV source, plus the rows the CSV layer could not decode
#[derive(Debug, Clone, Default)]
pub struct LoadedRows {
    pub rows: Vec<RawRecord>,
    pub unreadable_rows: usize,
}

impl LoadedRows {
    pub fn total_rows(&self) -> usize {
        self.rows.len() + self.unreadable_rows
    }
}

pub fn load_csv(csv_path: &Path) -> Result<LoadedRows> {
    let file = File::open(csv_path).map_err(|e| PipelineError::io(csv_path, e))?;
    let loaded = read_csv(file)?;

    tracing::info!(
        path = %csv_path.display(),
        rows = loaded.rows.len(),
        unreadable = loaded.unreadable_rows,
        "loaded raw rows"
    );

    Ok(loaded)
}

/// Read raw rows from any CSV source with a header row
pub fn read_csv<R: Read>(reader: R) -> Result<LoadedRows> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(PipelineError::MissingColumn(column.to_string()));
        }
    }

    let mut loaded = LoadedRows::default();

    for (index, result) in rdr.deserialize::<RawRecord>().enumerate() {
        match result {
            Ok(row) => loaded.rows.push(row),
            Err(e) => {
                // Line 1 is the header
                tracing::debug!(line = index + 2, error = %e, "skipping undecodable row");
                loaded.unreadable_rows += 1;
            }
        }
    }

    Ok(loaded)
}

/// Re-export the enriched record set for external BI tooling
pub fn write_csv(csv_path: &Path, records: &[DerivedRecord]) -> Result<usize> {
    if let Some(parent) = csv_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
        }
    }

    let mut wtr = csv::Writer::from_path(csv_path)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush().map_err(|e| PipelineError::io(csv_path, e))?;

    tracing::info!(path = %csv_path.display(), rows = records.len(), "exported enriched records");

    Ok(records.len())
}
