// 🧹 Record Normalizer
// Raw text rows → typed records. Rows that fail to parse are dropped, never defaulted.

use crate::config::PricingMode;
use crate::records::{NormalizedRecord, RawRecord};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::collections::BTreeMap;

/// Date layouts accepted, tried in order
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// Field that caused a row to be dropped (first failure wins)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    OrderDate,
    OrderTime,
    Quantity,
    UnitPrice,
    TotalPrice,
}

impl DropReason {
    pub fn field(&self) -> &'static str {
        match self {
            DropReason::OrderDate => "order_date",
            DropReason::OrderTime => "order_time",
            DropReason::Quantity => "quantity",
            DropReason::UnitPrice => "unit_price",
            DropReason::TotalPrice => "total_price",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NormalizationReport {
    pub records: Vec<NormalizedRecord>,
    pub total_rows: usize,
    pub dropped_rows: usize,
    pub drop_reasons: BTreeMap<DropReason, usize>,
}

impl NormalizationReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} rows: {} kept, {} dropped",
            self.total_rows,
            self.records.len(),
            self.dropped_rows
        )
    }
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
}

/// Numeric coercion; NaN and infinities count as unparseable
pub fn parse_amount(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
}

/// Positive whole count; integral decimals such as `"2.0"` are accepted
fn parse_quantity(value: &str) -> Option<u32> {
    let value = value.trim();
    let quantity = match value.parse::<u32>() {
        Ok(quantity) => quantity,
        Err(_) => {
            let amount = parse_amount(value)?;
            if amount.fract() != 0.0 || amount < 0.0 || amount > f64::from(u32::MAX) {
                return None;
            }
            amount as u32
        }
    };
    Some(quantity).filter(|q| *q > 0)
}

/// Normalize a single row, reporting the first field that failed
pub fn normalize_row(
    raw: &RawRecord,
    mode: PricingMode,
) -> Result<NormalizedRecord, DropReason> {
    let order_date = parse_date(&raw.order_date).ok_or(DropReason::OrderDate)?;
    let order_time = parse_time(&raw.order_time).ok_or(DropReason::OrderTime)?;
    let quantity = parse_quantity(&raw.quantity).ok_or(DropReason::Quantity)?;
    let unit_price = parse_amount(&raw.unit_price)
        .filter(|price| *price >= 0.0)
        .ok_or(DropReason::UnitPrice)?;

    let parsed_total = raw.total_price.as_deref().and_then(parse_amount);
    let total_price = match mode {
        PricingMode::TrustInputTotal => parsed_total.ok_or(DropReason::TotalPrice)?,
        PricingMode::RecomputeFromUnitPrice => {
            let recomputed = Some(unit_price * f64::from(quantity))
                .filter(|total| total.is_finite())
                .ok_or(DropReason::TotalPrice)?;
            parsed_total.unwrap_or(recomputed)
        }
    };

    Ok(NormalizedRecord {
        order_id: raw.order_id.trim().to_string(),
        order_date,
        order_time,
        pizza_id: raw.pizza_id.trim().to_string(),
        pizza_name: raw.pizza_name.trim().to_string(),
        pizza_category: raw.pizza_category.trim().to_string(),
        pizza_size: raw.pizza_size.trim().to_string(),
        quantity,
        unit_price,
        total_price,
    })
}

pub fn normalize(rows: &[RawRecord], mode: PricingMode) -> NormalizationReport {
    let mut records = Vec::with_capacity(rows.len());
    let mut drop_reasons: BTreeMap<DropReason, usize> = BTreeMap::new();

    for (index, raw) in rows.iter().enumerate() {
        match normalize_row(raw, mode) {
            Ok(record) => records.push(record),
            Err(reason) => {
                tracing::debug!(
                    row = index,
                    order_id = %raw.order_id,
                    field = reason.field(),
                    "dropping unparseable row"
                );
                *drop_reasons.entry(reason).or_insert(0) += 1;
            }
        }
    }

    let dropped_rows = rows.len() - records.len();
    let report = NormalizationReport {
        records,
        total_rows: rows.len(),
        dropped_rows,
        drop_reasons,
    };

    if report.is_empty() {
        tracing::warn!(rows = report.total_rows, "no rows survived normalization");
    } else if report.dropped_rows * 10 > report.total_rows {
        tracing::warn!(summary = %report.summary(), "more than 10% of rows dropped");
    } else {
        tracing::info!(summary = %report.summary(), mode = mode.label(), "normalized rows");
    }

    report
}
