// 📊 Aggregator - KPIs and grouped dashboard views
//
// Every view is computed from the same FilteredView snapshot and owned by the
// Dashboard that holds it. Nothing is cached between calls.

use crate::features::MONTH_NAMES;
use crate::filter::{FilterOutcome, FilteredView};
use crate::records::DerivedRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Canonical size order; sizes outside this list are left out of the size table
pub const SIZE_ORDER: [&str; 5] = ["S", "M", "L", "XL", "XXL"];

pub const DEFAULT_RANK_LIMIT: usize = 5;

pub fn month_rank(month: &str) -> Option<usize> {
    MONTH_NAMES.iter().position(|m| *m == month)
}

pub fn size_rank(size: &str) -> Option<usize> {
    SIZE_ORDER.iter().position(|s| *s == size)
}

/// Percentage of `total` rounded to 2 decimals; 0 when `total` is 0 or the ratio is not finite
pub fn percentage(part: f64, total: f64) -> f64 {
    if total == 0.0 || !total.is_finite() {
        return 0.0;
    }
    let pct = part / total * 100.0;
    if pct.is_finite() {
        round2(pct)
    } else {
        0.0
    }
}

/// Sums of finite amounts can still overflow; saturate instead of emitting inf
fn saturate(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(f64::MIN, f64::MAX)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// OUTPUT TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Kpis {
    pub total_revenue: f64,
    pub total_orders: usize,
    pub average_order_value: f64,
    pub total_pizzas_sold: u64,
}

/// A table, or the explicit absence of data
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "rows", rename_all = "snake_case")]
pub enum View<T> {
    NoData,
    Rows(Vec<T>),
}

impl<T> View<T> {
    pub fn rows(&self) -> &[T] {
        match self {
            View::NoData => &[],
            View::Rows(rows) => rows,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, View::NoData)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyOrders {
    pub month_name: String,
    pub total_orders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyOrders {
    pub order_date: NaiveDate,
    pub total_orders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyOrders {
    pub order_hour: u32,
    pub total_orders: usize,
}

/// Revenue share of one category or size
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesShare {
    pub group: String,
    pub total_revenue: f64,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SellerRow {
    pub pizza_name: String,
    pub total_revenue: f64,
    pub quantity: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMetric {
    Revenue,
    Quantity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankDirection {
    Top,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub kpis: Kpis,
    pub monthly_orders: View<MonthlyOrders>,
    pub daily_orders: View<DailyOrders>,
    pub hourly_orders: View<HourlyOrders>,
    pub sales_by_category: View<SalesShare>,
    pub sales_by_size: View<SalesShare>,
    pub top_by_revenue: View<SellerRow>,
    pub bottom_by_revenue: View<SellerRow>,
    pub top_by_quantity: View<SellerRow>,
    pub bottom_by_quantity: View<SellerRow>,
}

impl Dashboard {
    /// Every view `NoData`, every KPI zero
    pub fn no_data() -> Self {
        Dashboard {
            kpis: Kpis::default(),
            monthly_orders: View::NoData,
            daily_orders: View::NoData,
            hourly_orders: View::NoData,
            sales_by_category: View::NoData,
            sales_by_size: View::NoData,
            top_by_revenue: View::NoData,
            bottom_by_revenue: View::NoData,
            top_by_quantity: View::NoData,
            bottom_by_quantity: View::NoData,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.monthly_orders.is_no_data()
    }
}

// ============================================================================
// COMPUTATION
// ============================================================================

pub fn kpis(records: &[&DerivedRecord]) -> Kpis {
    let total_revenue = saturate(records.iter().map(|r| r.total_price).sum());
    let total_orders = records
        .iter()
        .map(|r| r.order_id.as_str())
        .collect::<HashSet<_>>()
        .len();
    let total_pizzas_sold: u64 = records.iter().map(|r| u64::from(r.quantity)).sum();

    let average_order_value = match total_revenue / total_orders as f64 {
        aov if total_orders > 0 && aov.is_finite() => aov,
        _ => 0.0,
    };

    Kpis {
        total_revenue,
        total_orders,
        average_order_value,
        total_pizzas_sold,
    }
}

/// Distinct order ids per bucket, buckets in key order
fn distinct_orders_by<'a, K, F>(records: &[&'a DerivedRecord], key: F) -> BTreeMap<K, usize>
where
    K: Ord,
    F: Fn(&'a DerivedRecord) -> K,
{
    let mut buckets: BTreeMap<K, HashSet<&'a str>> = BTreeMap::new();
    for &record in records {
        buckets
            .entry(key(record))
            .or_default()
            .insert(record.order_id.as_str());
    }
    buckets
        .into_iter()
        .map(|(bucket, orders)| (bucket, orders.len()))
        .collect()
}

pub fn monthly_orders(records: &[&DerivedRecord]) -> Vec<MonthlyOrders> {
    let mut rows: Vec<MonthlyOrders> = distinct_orders_by(records, |r| r.month_name.as_str())
        .into_iter()
        .map(|(month, total_orders)| MonthlyOrders {
            month_name: month.to_string(),
            total_orders,
        })
        .collect();

    // Final sort step, decoupled from grouping
    rows.sort_by_key(|row| month_rank(&row.month_name).unwrap_or(usize::MAX));
    rows
}

pub fn daily_orders(records: &[&DerivedRecord]) -> Vec<DailyOrders> {
    distinct_orders_by(records, |r| r.order_date)
        .into_iter()
        .map(|(order_date, total_orders)| DailyOrders {
            order_date,
            total_orders,
        })
        .collect()
}

pub fn hourly_orders(records: &[&DerivedRecord]) -> Vec<HourlyOrders> {
    distinct_orders_by(records, |r| r.order_hour)
        .into_iter()
        .map(|(order_hour, total_orders)| HourlyOrders {
            order_hour,
            total_orders,
        })
        .collect()
}

fn revenue_by<'a, F>(records: &[&'a DerivedRecord], key: F) -> BTreeMap<&'a str, f64>
where
    F: Fn(&'a DerivedRecord) -> &'a str,
{
    let mut groups: BTreeMap<&str, f64> = BTreeMap::new();
    for &record in records {
        *groups.entry(key(record)).or_insert(0.0) += record.total_price;
    }
    for revenue in groups.values_mut() {
        *revenue = saturate(*revenue);
    }
    groups
}

fn shares(groups: BTreeMap<&str, f64>, total_revenue: f64) -> Vec<SalesShare> {
    groups
        .into_iter()
        .map(|(group, revenue)| SalesShare {
            group: group.to_string(),
            total_revenue: revenue,
            pct: percentage(revenue, total_revenue),
        })
        .collect()
}

/// Categories in lexicographic order
pub fn sales_by_category(records: &[&DerivedRecord], total_revenue: f64) -> Vec<SalesShare> {
    shares(revenue_by(records, |r| r.pizza_category.as_str()), total_revenue)
}

/// Sizes in canonical order; unknown sizes are omitted
pub fn sales_by_size(records: &[&DerivedRecord], total_revenue: f64) -> Vec<SalesShare> {
    let mut rows: Vec<SalesShare> =
        shares(revenue_by(records, |r| r.pizza_size.as_str()), total_revenue)
            .into_iter()
            .filter(|row| size_rank(&row.group).is_some())
            .collect();

    rows.sort_by_key(|row| size_rank(&row.group));
    rows
}

/// Per-pizza totals in first-seen order
fn seller_totals(records: &[&DerivedRecord]) -> Vec<SellerRow> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut rows: Vec<SellerRow> = Vec::new();

    for record in records {
        let slot = *index.entry(record.pizza_name.as_str()).or_insert_with(|| {
            rows.push(SellerRow {
                pizza_name: record.pizza_name.clone(),
                total_revenue: 0.0,
                quantity: 0,
            });
            rows.len() - 1
        });
        rows[slot].total_revenue += record.total_price;
        rows[slot].quantity += u64::from(record.quantity);
    }
    for row in &mut rows {
        row.total_revenue = saturate(row.total_revenue);
    }

    rows
}

fn compare(a: &SellerRow, b: &SellerRow, metric: RankMetric) -> Ordering {
    match metric {
        RankMetric::Revenue => a.total_revenue.total_cmp(&b.total_revenue),
        RankMetric::Quantity => a.quantity.cmp(&b.quantity),
    }
}

/// Stable sort, so ties keep first-seen order. Never pads.
fn rank(
    mut rows: Vec<SellerRow>,
    metric: RankMetric,
    direction: RankDirection,
    limit: usize,
) -> Vec<SellerRow> {
    match direction {
        RankDirection::Top => rows.sort_by(|a, b| compare(b, a, metric)),
        RankDirection::Bottom => rows.sort_by(|a, b| compare(a, b, metric)),
    }
    rows.truncate(limit);
    rows
}

pub fn ranked_sellers(
    records: &[&DerivedRecord],
    metric: RankMetric,
    direction: RankDirection,
    limit: usize,
) -> Vec<SellerRow> {
    rank(seller_totals(records), metric, direction, limit)
}

/// Build every view from one filtered snapshot
pub fn aggregate_view(view: &FilteredView<'_>, rank_limit: usize) -> Dashboard {
    let records = view.records();
    if records.is_empty() {
        return Dashboard::no_data();
    }

    let totals = kpis(records);
    let sellers = seller_totals(records);
    let ranked = |metric, direction| {
        View::Rows(rank(sellers.clone(), metric, direction, rank_limit))
    };

    Dashboard {
        kpis: totals,
        monthly_orders: View::Rows(monthly_orders(records)),
        daily_orders: View::Rows(daily_orders(records)),
        hourly_orders: View::Rows(hourly_orders(records)),
        sales_by_category: View::Rows(sales_by_category(records, totals.total_revenue)),
        sales_by_size: View::Rows(sales_by_size(records, totals.total_revenue)),
        top_by_revenue: ranked(RankMetric::Revenue, RankDirection::Top),
        bottom_by_revenue: ranked(RankMetric::Revenue, RankDirection::Bottom),
        top_by_quantity: ranked(RankMetric::Quantity, RankDirection::Top),
        bottom_by_quantity: ranked(RankMetric::Quantity, RankDirection::Bottom),
    }
}

pub fn aggregate_outcome(outcome: &FilterOutcome<'_>, rank_limit: usize) -> Dashboard {
    match outcome {
        FilterOutcome::Matched(view) => aggregate_view(view, rank_limit),
        FilterOutcome::NoMatches => Dashboard::no_data(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveTime};

    struct Line<'a> {
        order_id: &'a str,
        date: (i32, u32, u32),
        hour: u32,
        name: &'a str,
        category: &'a str,
        size: &'a str,
        quantity: u32,
        total: f64,
    }

    fn derived(line: Line) -> DerivedRecord {
        let order_date = NaiveDate::from_ymd_opt(line.date.0, line.date.1, line.date.2).unwrap();
        DerivedRecord {
            order_id: line.order_id.to_string(),
            order_date,
            order_time: NaiveTime::from_hms_opt(line.hour, 0, 0).unwrap(),
            pizza_id: line.name.to_lowercase(),
            pizza_name: line.name.to_string(),
            pizza_category: line.category.to_string(),
            pizza_size: line.size.to_string(),
            quantity: line.quantity,
            unit_price: line.total / f64::from(line.quantity),
            total_price: line.total,
            order_hour: line.hour,
            day_of_week: crate::features::weekday_name(order_date.weekday()).to_string(),
            month_name: crate::features::month_name(order_date).to_string(),
            week_number: order_date.iso_week().week(),
        }
    }

    fn simple(order_id: &str, name: &str, category: &str, total: f64) -> DerivedRecord {
        derived(Line {
            order_id,
            date: (2015, 1, 1),
            hour: 12,
            name,
            category,
            size: "M",
            quantity: 1,
            total,
        })
    }

    fn dashboard(records: &[DerivedRecord]) -> Dashboard {
        aggregate_view(&FilteredView::full(records), DEFAULT_RANK_LIMIT)
    }

    #[test]
    fn test_margherita_funghi_scenario() {
        let records = vec![
            simple("1", "Margherita", "Classic", 10.0),
            simple("2", "Margherita", "Classic", 10.0),
            simple("2", "Margherita", "Classic", 10.0),
            simple("3", "Funghi", "Veggie", 5.0),
        ];

        let dash = dashboard(&records);

        assert_eq!(dash.kpis.total_revenue, 35.0);
        assert_eq!(dash.kpis.total_orders, 3);
        assert!((dash.kpis.average_order_value - 35.0 / 3.0).abs() < 1e-9);
        assert_eq!(dash.kpis.total_pizzas_sold, 4);

        let categories = dash.sales_by_category.rows();
        assert_eq!(categories[0].group, "Classic");
        assert_eq!(categories[0].total_revenue, 30.0);
        assert_eq!(categories[0].pct, 85.71);
        assert_eq!(categories[1].pct, 14.29);
    }

    #[test]
    fn test_category_revenue_sums_to_total() {
        let records = vec![
            simple("1", "A", "Classic", 12.35),
            simple("2", "B", "Veggie", 7.10),
            simple("3", "C", "Supreme", 19.99),
            simple("4", "D", "Chicken", 0.01),
        ];

        let dash = dashboard(&records);

        let sum: f64 = dash
            .sales_by_category
            .rows()
            .iter()
            .map(|r| r.total_revenue)
            .sum();
        assert!((sum - dash.kpis.total_revenue).abs() < 1e-9);
    }

    #[test]
    fn test_zero_revenue_gives_zero_percentages() {
        let records = vec![simple("1", "Free", "Classic", 0.0)];

        let dash = dashboard(&records);

        assert_eq!(dash.sales_by_category.rows()[0].pct, 0.0);
        assert_eq!(dash.sales_by_size.rows()[0].pct, 0.0);
        assert_eq!(percentage(5.0, 0.0), 0.0);
    }

    #[test]
    fn test_overflowing_revenue_stays_finite() {
        let records = vec![
            simple("1", "Huge", "Classic", 1e308),
            simple("2", "Huge", "Classic", 1e308),
        ];

        let dash = dashboard(&records);

        assert_eq!(dash.kpis.total_revenue, f64::MAX);
        assert!(dash.kpis.average_order_value.is_finite());
        assert_eq!(dash.sales_by_category.rows()[0].total_revenue, f64::MAX);
        assert_eq!(dash.sales_by_category.rows()[0].pct, 100.0);
        assert_eq!(dash.top_by_revenue.rows()[0].total_revenue, f64::MAX);
        assert_eq!(percentage(1.0, f64::INFINITY), 0.0);
        assert_eq!(percentage(f64::MAX, 1e-300), 0.0);

        let json = serde_json::to_string(&dash).unwrap();
        assert!(!json.contains("null"));
    }

    #[test]
    fn test_empty_view_yields_no_data_everywhere() {
        let outcome = FilterOutcome::NoMatches;

        let dash = aggregate_outcome(&outcome, DEFAULT_RANK_LIMIT);

        assert!(dash.is_empty());
        assert_eq!(dash, Dashboard::no_data());
        assert_eq!(dash.kpis.total_orders, 0);
        assert_eq!(dash.kpis.average_order_value, 0.0);
        assert!(dash.top_by_quantity.is_no_data());
        assert!(dash.sales_by_size.is_no_data());
    }

    #[test]
    fn test_kpis_without_orders() {
        let kpis = kpis(&[]);

        assert_eq!(kpis.total_orders, 0);
        assert_eq!(kpis.average_order_value, 0.0);
        assert!(kpis.average_order_value.is_finite());
    }

    #[test]
    fn test_top_five_never_pads() {
        let records = vec![
            simple("1", "Small", "Classic", 20.0),
            simple("2", "Big", "Classic", 100.0),
            simple("3", "Mid", "Classic", 50.0),
        ];

        let dash = dashboard(&records);

        let names: Vec<&str> = dash
            .top_by_revenue
            .rows()
            .iter()
            .map(|r| r.pizza_name.as_str())
            .collect();
        assert_eq!(names, vec!["Big", "Mid", "Small"]);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let records = vec![
            simple("1", "Zucchini", "Veggie", 10.0),
            simple("2", "Anchovy", "Classic", 10.0),
            simple("3", "Mushroom", "Veggie", 10.0),
        ];

        let top = ranked_sellers(
            &FilteredView::full(&records).records().to_vec(),
            RankMetric::Revenue,
            RankDirection::Top,
            2,
        );
        let bottom = ranked_sellers(
            &FilteredView::full(&records).records().to_vec(),
            RankMetric::Revenue,
            RankDirection::Bottom,
            2,
        );

        assert_eq!(top[0].pizza_name, "Zucchini");
        assert_eq!(top[1].pizza_name, "Anchovy");
        assert_eq!(bottom[0].pizza_name, "Zucchini");
        assert_eq!(bottom[1].pizza_name, "Anchovy");
    }

    #[test]
    fn test_top_and_bottom_disjoint_with_ten_names() {
        let records: Vec<DerivedRecord> = (0..12)
            .map(|i| {
                let name = format!("Pizza {}", i);
                simple(&i.to_string(), &name, "Classic", 10.0 + i as f64)
            })
            .collect();

        let dash = dashboard(&records);

        let names = |view: &View<SellerRow>| -> HashSet<String> {
            view.rows().iter().map(|r| r.pizza_name.clone()).collect()
        };
        let top = names(&dash.top_by_revenue);
        let bottom = names(&dash.bottom_by_revenue);
        assert_eq!(top.len(), 5);
        assert_eq!(bottom.len(), 5);
        assert!(top.is_disjoint(&bottom));
        assert!(top.union(&bottom).count() <= 10);
        assert!(top.contains("Pizza 11"));
        assert!(bottom.contains("Pizza 0"));
    }

    #[test]
    fn test_quantity_ranking() {
        let mut records = vec![simple("1", "Pepperoni", "Classic", 10.0)];
        records.push(derived(Line {
            order_id: "2",
            date: (2015, 1, 2),
            hour: 13,
            name: "Hawaiian",
            category: "Classic",
            size: "L",
            quantity: 4,
            total: 8.0,
        }));

        let dash = dashboard(&records);

        assert_eq!(dash.top_by_quantity.rows()[0].pizza_name, "Hawaiian");
        assert_eq!(dash.top_by_quantity.rows()[0].quantity, 4);
        assert_eq!(dash.top_by_revenue.rows()[0].pizza_name, "Pepperoni");
        assert_eq!(dash.bottom_by_quantity.rows()[0].pizza_name, "Pepperoni");
    }

    #[test]
    fn test_monthly_trend_is_calendar_ordered() {
        let dates = [(2015, 12, 3), (2015, 2, 1), (2015, 7, 4), (2015, 2, 9), (2015, 1, 5)];
        let records: Vec<DerivedRecord> = dates
            .iter()
            .enumerate()
            .map(|(i, date)| {
                derived(Line {
                    order_id: &format!("{}", i),
                    date: *date,
                    hour: 12,
                    name: "Margherita",
                    category: "Classic",
                    size: "M",
                    quantity: 1,
                    total: 10.0,
                })
            })
            .collect();

        let dash = dashboard(&records);

        let months: Vec<(&str, usize)> = dash
            .monthly_orders
            .rows()
            .iter()
            .map(|r| (r.month_name.as_str(), r.total_orders))
            .collect();
        assert_eq!(
            months,
            vec![("January", 1), ("February", 2), ("July", 1), ("December", 1)]
        );
    }

    #[test]
    fn test_daily_and_hourly_count_distinct_orders() {
        let line = |order_id, date, hour| Line {
            order_id,
            date,
            hour,
            name: "Margherita",
            category: "Classic",
            size: "M",
            quantity: 1,
            total: 10.0,
        };
        let records = vec![
            derived(line("1", (2015, 1, 2), 18)),
            derived(line("1", (2015, 1, 2), 18)),
            derived(line("2", (2015, 1, 1), 12)),
            derived(line("3", (2015, 1, 2), 12)),
        ];

        let dash = dashboard(&records);

        let daily = dash.daily_orders.rows();
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].order_date, NaiveDate::from_ymd_opt(2015, 1, 1).unwrap());
        assert_eq!(daily[1].total_orders, 2);

        let hourly: Vec<(u32, usize)> = dash
            .hourly_orders
            .rows()
            .iter()
            .map(|r| (r.order_hour, r.total_orders))
            .collect();
        assert_eq!(hourly, vec![(12, 2), (18, 1)]);
    }

    #[test]
    fn test_sizes_in_canonical_order_without_zero_rows() {
        let sized = |order_id, size, total| {
            derived(Line {
                order_id,
                date: (2015, 1, 1),
                hour: 12,
                name: "Margherita",
                category: "Classic",
                size,
                quantity: 1,
                total,
            })
        };
        let records = vec![
            sized("1", "XL", 25.0),
            sized("2", "S", 10.0),
            sized("3", "L", 15.0),
            sized("4", "Family", 50.0),
        ];

        let dash = dashboard(&records);

        let sizes: Vec<&str> = dash
            .sales_by_size
            .rows()
            .iter()
            .map(|r| r.group.as_str())
            .collect();
        assert_eq!(sizes, vec!["S", "L", "XL"]);
        // Percentages still relate to the full filtered revenue
        assert_eq!(dash.sales_by_size.rows()[0].pct, 10.0);
    }

    #[test]
    fn test_view_serialization_shape() {
        let empty: View<HourlyOrders> = View::NoData;
        let full = View::Rows(vec![HourlyOrders {
            order_hour: 9,
            total_orders: 3,
        }]);

        assert_eq!(serde_json::to_string(&empty).unwrap(), r#"{"status":"no_data"}"#);
        assert_eq!(
            serde_json::to_string(&full).unwrap(),
            r#"{"status":"rows","rows":[{"order_hour":9,"total_orders":3}]}"#
        );
    }
}
