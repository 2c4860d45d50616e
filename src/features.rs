// ⏰ Feature Deriver
// Adds hour / weekday / month / ISO week to each normalized record.
// Names come from fixed English tables so output never depends on the host locale.

use crate::config::PricingMode;
use crate::records::{DerivedRecord, NormalizedRecord};
use chrono::{Datelike, NaiveDate, Timelike, Weekday};

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn weekday_name(weekday: Weekday) -> &'static str {
    WEEKDAY_NAMES[weekday.num_days_from_monday() as usize]
}

pub fn month_name(date: NaiveDate) -> &'static str {
    MONTH_NAMES[date.month0() as usize]
}

pub fn derive_record(record: NormalizedRecord, mode: PricingMode) -> DerivedRecord {
    let total_price = match mode {
        PricingMode::TrustInputTotal => record.total_price,
        PricingMode::RecomputeFromUnitPrice => record.unit_price * f64::from(record.quantity),
    };

    DerivedRecord {
        order_hour: record.order_time.hour(),
        day_of_week: weekday_name(record.order_date.weekday()).to_string(),
        month_name: month_name(record.order_date).to_string(),
        week_number: record.order_date.iso_week().week(),
        order_id: record.order_id,
        order_date: record.order_date,
        order_time: record.order_time,
        pizza_id: record.pizza_id,
        pizza_name: record.pizza_name,
        pizza_category: record.pizza_category,
        pizza_size: record.pizza_size,
        quantity: record.quantity,
        unit_price: record.unit_price,
        total_price,
    }
}

/// One-to-one, order-preserving
pub fn derive(records: Vec<NormalizedRecord>, mode: PricingMode) -> Vec<DerivedRecord> {
    records
        .into_iter()
        .map(|record| derive_record(record, mode))
        .collect()
}
