// 🔎 Filter Engine
// Conjunction of set-membership predicates over the derived dimensions.
//
// Per dimension:  None          → allow every observed value
//                 Some(empty)   → allow nothing
//                 Some(values)  → allow exactly these values

use crate::features::{MONTH_NAMES, WEEKDAY_NAMES};
use crate::records::DerivedRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    MonthName,
    DayOfWeek,
    OrderHour,
    PizzaCategory,
    PizzaSize,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::MonthName,
        Dimension::DayOfWeek,
        Dimension::OrderHour,
        Dimension::PizzaCategory,
        Dimension::PizzaSize,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Dimension::MonthName => "month_name",
            Dimension::DayOfWeek => "day_of_week",
            Dimension::OrderHour => "order_hour",
            Dimension::PizzaCategory => "pizza_category",
            Dimension::PizzaSize => "pizza_size",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default)]
    pub months: Option<BTreeSet<String>>,
    #[serde(default)]
    pub days: Option<BTreeSet<String>>,
    #[serde(default)]
    pub hours: Option<BTreeSet<u32>>,
    #[serde(default)]
    pub categories: Option<BTreeSet<String>>,
    #[serde(default)]
    pub sizes: Option<BTreeSet<String>>,
}

fn to_set<I, S>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(Into::into).collect()
}

fn allows<T: Ord + ?Sized, U: Ord + std::borrow::Borrow<T>>(
    allowed: &Option<BTreeSet<U>>,
    value: &T,
) -> bool {
    allowed.as_ref().map_or(true, |set| set.contains(value))
}

impl FilterSelection {
    /// Selection that lets every record through
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_months<I, S>(mut self, months: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.months = Some(to_set(months));
        self
    }

    pub fn with_days<I, S>(mut self, days: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.days = Some(to_set(days));
        self
    }

    pub fn with_hours<I: IntoIterator<Item = u32>>(mut self, hours: I) -> Self {
        self.hours = Some(hours.into_iter().collect());
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(to_set(categories));
        self
    }

    pub fn with_sizes<I, S>(mut self, sizes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sizes = Some(to_set(sizes));
        self
    }

    /// True when no dimension is restricted
    pub fn is_unrestricted(&self) -> bool {
        self.months.is_none()
            && self.days.is_none()
            && self.hours.is_none()
            && self.categories.is_none()
            && self.sizes.is_none()
    }

    pub fn matches(&self, record: &DerivedRecord) -> bool {
        allows(&self.months, record.month_name.as_str())
            && allows(&self.days, record.day_of_week.as_str())
            && allows(&self.hours, &record.order_hour)
            && allows(&self.categories, record.pizza_category.as_str())
            && allows(&self.sizes, record.pizza_size.as_str())
    }

    /// Short human-readable description, e.g. for status bars
    pub fn describe(&self) -> String {
        fn part<T: ToString>(name: &str, set: &Option<BTreeSet<T>>) -> Option<String> {
            set.as_ref().map(|values| {
                let values: Vec<String> = values.iter().map(ToString::to_string).collect();
                format!("{}={}", name, values.join("|"))
            })
        }

        let parts: Vec<String> = [
            part("month", &self.months),
            part("day", &self.days),
            part("hour", &self.hours),
            part("category", &self.categories),
            part("size", &self.sizes),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            "all".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Records that passed a selection, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView<'a> {
    records: Vec<&'a DerivedRecord>,
}

impl<'a> FilteredView<'a> {
    /// View over the whole record set
    pub fn full(records: &'a [DerivedRecord]) -> Self {
        FilteredView {
            records: records.iter().collect(),
        }
    }

    pub fn records(&self) -> &[&'a DerivedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a DerivedRecord> + '_ {
        self.records.iter().copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome<'a> {
    Matched(FilteredView<'a>),
    /// Valid terminal result: the selection excludes every record
    NoMatches,
}

impl<'a> FilterOutcome<'a> {
    pub fn view(&self) -> Option<&FilteredView<'a>> {
        match self {
            FilterOutcome::Matched(view) => Some(view),
            FilterOutcome::NoMatches => None,
        }
    }

    pub fn len(&self) -> usize {
        self.view().map_or(0, FilteredView::len)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FilterOutcome::NoMatches)
    }
}

pub fn apply<'a>(records: &'a [DerivedRecord], selection: &FilterSelection) -> FilterOutcome<'a> {
    let matched: Vec<&DerivedRecord> = records.iter().filter(|r| selection.matches(r)).collect();

    tracing::debug!(
        selection = %selection.describe(),
        matched = matched.len(),
        total = records.len(),
        "applied filter"
    );

    if matched.is_empty() {
        FilterOutcome::NoMatches
    } else {
        FilterOutcome::Matched(FilteredView { records: matched })
    }
}

// ============================================================================
// OBSERVED VALUES
// ============================================================================

/// Distinct values present in a record set, per dimension, in display order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObservedValues {
    pub months: Vec<String>,
    pub days: Vec<String>,
    pub hours: Vec<u32>,
    pub categories: Vec<String>,
    pub sizes: Vec<String>,
}

fn in_canonical_order(seen: &BTreeSet<&str>, canonical: &[&str]) -> Vec<String> {
    let mut ordered: Vec<String> = canonical
        .iter()
        .filter(|name| seen.contains(*name))
        .map(|name| name.to_string())
        .collect();
    // Values outside the canonical list go last, lexicographically
    ordered.extend(
        seen.iter()
            .filter(|value| !canonical.contains(*value))
            .map(|value| value.to_string()),
    );
    ordered
}

impl ObservedValues {
    pub fn from_records(records: &[DerivedRecord]) -> Self {
        let months: BTreeSet<&str> = records.iter().map(|r| r.month_name.as_str()).collect();
        let days: BTreeSet<&str> = records.iter().map(|r| r.day_of_week.as_str()).collect();
        let hours: BTreeSet<u32> = records.iter().map(|r| r.order_hour).collect();
        let categories: BTreeSet<&str> =
            records.iter().map(|r| r.pizza_category.as_str()).collect();
        let sizes: BTreeSet<&str> = records.iter().map(|r| r.pizza_size.as_str()).collect();

        ObservedValues {
            months: in_canonical_order(&months, &MONTH_NAMES),
            days: in_canonical_order(&days, &WEEKDAY_NAMES),
            hours: hours.into_iter().collect(),
            categories: categories.into_iter().map(str::to_string).collect(),
            sizes: in_canonical_order(&sizes, &crate::aggregate::SIZE_ORDER),
        }
    }

    pub fn values(&self, dimension: Dimension) -> Vec<String> {
        match dimension {
            Dimension::MonthName => self.months.clone(),
            Dimension::DayOfWeek => self.days.clone(),
            Dimension::OrderHour => self.hours.iter().map(ToString::to_string).collect(),
            Dimension::PizzaCategory => self.categories.clone(),
            Dimension::PizzaSize => self.sizes.clone(),
        }
    }
}

// ============================================================================
// QUERY FORM
// ============================================================================

/// Text form of a selection used at the HTTP / CLI boundary.
/// Comma separated values; `Some("")` is the empty set, `None` means allow all.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct FilterQuery {
    pub months: Option<String>,
    pub days: Option<String>,
    pub hours: Option<String>,
    pub categories: Option<String>,
    pub sizes: Option<String>,
}

fn split_list(list: &str) -> BTreeSet<String> {
    list.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

impl FilterQuery {
    pub fn to_selection(&self) -> FilterSelection {
        FilterSelection {
            months: self.months.as_deref().map(split_list),
            days: self.days.as_deref().map(split_list),
            // Non-numeric hours can never match a record, so they are dropped
            hours: self.hours.as_deref().map(|list| {
                split_list(list)
                    .iter()
                    .filter_map(|hour| hour.parse::<u32>().ok())
                    .collect()
            }),
            categories: self.categories.as_deref().map(split_list),
            sizes: self.sizes.as_deref().map(split_list),
        }
    }
}

impl From<&FilterQuery> for FilterSelection {
    fn from(query: &FilterQuery) -> Self {
        query.to_selection()
    }
}
