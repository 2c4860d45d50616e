// End-to-end: CSV text → Dataset → Dashboard

use pizza_insights::{
    read_csv, Dashboard, Dataset, DropReason, FilterQuery, FilterSelection, PipelineConfig,
    PipelineError, PricingMode,
};
use std::io::Cursor;

const HEADER: &str = "order_details_id,order_id,pizza_id,quantity,order_date,order_time,unit_price,total_price,pizza_size,pizza_category,pizza_name";

fn csv_text(lines: &[&str]) -> String {
    let mut text = String::from(HEADER);
    for line in lines {
        text.push('\n');
        text.push_str(line);
    }
    text.push('\n');
    text
}

fn dataset(lines: &[&str], config: &PipelineConfig) -> Result<Dataset, PipelineError> {
    let loaded = read_csv(Cursor::new(csv_text(lines)))?;
    Dataset::from_loaded(loaded, config)
}

fn sample() -> Vec<&'static str> {
    vec![
        "1,1,margherita_m,1,2023-07-04,14:30:00,10,10,M,Classic,The Margherita Pizza",
        "2,2,margherita_m,1,2023-07-04,18:05:00,10,10,M,Classic,The Margherita Pizza",
        "3,3,margherita_m,1,2023-08-01,18:40:00,10,10,M,Classic,The Margherita Pizza",
        "4,3,funghi_s,1,2023-08-01,18:40:00,5,5,S,Veggie,The Funghi Pizza",
    ]
}

#[test]
fn test_revenue_and_category_share() {
    let dataset = dataset(&sample(), &PipelineConfig::default()).unwrap();

    let dashboard = dataset.dashboard(&FilterSelection::all());

    assert_eq!(dashboard.kpis.total_revenue, 35.0);
    assert_eq!(dashboard.kpis.total_orders, 3);
    assert_eq!(dashboard.kpis.total_pizzas_sold, 4);

    let categories = dashboard.sales_by_category.rows();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].group, "Classic");
    assert_eq!(categories[0].pct, 85.71);
    assert_eq!(categories[1].group, "Veggie");
    assert_eq!(categories[1].pct, 14.29);
}

#[test]
fn test_selection_excluding_every_month() {
    let dataset = dataset(&sample(), &PipelineConfig::default()).unwrap();
    let query = FilterQuery {
        months: Some(String::new()),
        ..FilterQuery::default()
    };

    let dashboard = dataset.dashboard(&query.to_selection());

    assert!(dashboard.is_empty());
    assert_eq!(dashboard, Dashboard::no_data());
    assert_eq!(dashboard.kpis.total_revenue, 0.0);
    assert_eq!(dashboard.kpis.total_orders, 0);
    assert!(dashboard.top_by_revenue.is_no_data());
}

#[test]
fn test_derived_features_from_csv() {
    let dataset = dataset(&sample(), &PipelineConfig::default()).unwrap();

    let first = &dataset.records()[0];
    assert_eq!(first.order_hour, 14);
    assert_eq!(first.day_of_week, "Tuesday");
    assert_eq!(first.month_name, "July");
    assert_eq!(first.week_number, 27);
}

#[test]
fn test_top_sellers_are_not_padded() {
    let lines = [
        "1,1,a,1,2023-07-04,12:00:00,100,100,M,Classic,Alpha",
        "2,2,b,1,2023-07-04,12:00:00,50,50,M,Classic,Beta",
        "3,3,c,1,2023-07-04,12:00:00,20,20,M,Classic,Gamma",
    ];
    let dataset = dataset(&lines, &PipelineConfig::default()).unwrap();

    let dashboard = dataset.dashboard(&FilterSelection::all());

    let names: Vec<&str> = dashboard
        .top_by_revenue
        .rows()
        .iter()
        .map(|r| r.pizza_name.as_str())
        .collect();
    assert_eq!(names, vec!["Alpha", "Beta", "Gamma"]);

    let bottom: Vec<&str> = dashboard
        .bottom_by_revenue
        .rows()
        .iter()
        .map(|r| r.pizza_name.as_str())
        .collect();
    assert_eq!(bottom, vec!["Gamma", "Beta", "Alpha"]);
}

#[test]
fn test_trends_follow_canonical_order() {
    let dataset = dataset(&sample(), &PipelineConfig::default()).unwrap();

    let dashboard = dataset.dashboard(&FilterSelection::all());

    let months: Vec<(&str, usize)> = dashboard
        .monthly_orders
        .rows()
        .iter()
        .map(|r| (r.month_name.as_str(), r.total_orders))
        .collect();
    assert_eq!(months, vec![("July", 2), ("August", 1)]);

    let hours: Vec<(u32, usize)> = dashboard
        .hourly_orders
        .rows()
        .iter()
        .map(|r| (r.order_hour, r.total_orders))
        .collect();
    assert_eq!(hours, vec![(14, 1), (18, 2)]);

    let sizes: Vec<&str> = dashboard
        .sales_by_size
        .rows()
        .iter()
        .map(|r| r.group.as_str())
        .collect();
    assert_eq!(sizes, vec!["S", "M"]);
}

#[test]
fn test_malformed_rows_are_dropped_and_counted() {
    let mut lines = sample();
    lines.push("5,4,margherita_m,1,yesterday,12:00:00,10,10,M,Classic,The Margherita Pizza");
    lines.push("6,5,margherita_m,1,2023-07-05,noon,10,10,M,Classic,The Margherita Pizza");

    let dataset = dataset(&lines, &PipelineConfig::default()).unwrap();

    let summary = dataset.summary();
    assert_eq!(summary.total_rows, 6);
    assert_eq!(summary.kept_rows, 4);
    assert_eq!(summary.dropped_rows, 2);
    assert_eq!(summary.drop_reasons[&DropReason::OrderDate], 1);
    assert_eq!(summary.drop_reasons[&DropReason::OrderTime], 1);
}

#[test]
fn test_all_rows_invalid_is_no_data_error() {
    let lines = ["1,1,a,1,someday,12:00:00,10,10,M,Classic,Alpha"];

    let err = dataset(&lines, &PipelineConfig::default()).unwrap_err();

    assert!(err.is_no_data());
}

#[test]
fn test_missing_required_column() {
    let text = "order_id,order_date\n1,2023-07-04\n";

    let err = read_csv(Cursor::new(text)).unwrap_err();

    assert!(matches!(err, PipelineError::MissingColumn(ref c) if c == "order_time"));
}

#[test]
fn test_pricing_modes_disagree_on_inconsistent_totals() {
    // total_price disagrees with unit_price × quantity
    let lines = ["1,1,a,2,2023-07-04,12:00:00,10,15,M,Classic,Alpha"];

    let trusted = dataset(&lines, &PipelineConfig::default()).unwrap();
    let recomputed = dataset(
        &lines,
        &PipelineConfig {
            pricing: PricingMode::RecomputeFromUnitPrice,
            ..PipelineConfig::default()
        },
    )
    .unwrap();

    let all = FilterSelection::all();
    assert_eq!(trusted.dashboard(&all).kpis.total_revenue, 15.0);
    assert_eq!(recomputed.dashboard(&all).kpis.total_revenue, 20.0);
    assert_eq!(recomputed.pricing(), PricingMode::RecomputeFromUnitPrice);
}

#[test]
fn test_rank_limit_from_config() {
    let lines = [
        "1,1,a,1,2023-07-04,12:00:00,100,100,M,Classic,Alpha",
        "2,2,b,1,2023-07-04,12:00:00,50,50,M,Classic,Beta",
        "3,3,c,1,2023-07-04,12:00:00,20,20,M,Classic,Gamma",
    ];
    let config = PipelineConfig {
        rank_limit: 2,
        ..PipelineConfig::default()
    };
    let dataset = dataset(&lines, &config).unwrap();

    let dashboard = dataset.dashboard(&FilterSelection::all());

    assert_eq!(dashboard.top_by_quantity.rows().len(), 2);
    assert_eq!(dashboard.bottom_by_revenue.rows()[0].pizza_name, "Gamma");
}

#[test]
fn test_export_writes_enriched_columns() {
    let dataset = dataset(&sample(), &PipelineConfig::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("enriched.csv");

    let written = dataset.export_csv(&out).unwrap();

    assert_eq!(written, 4);
    let mut rdr = csv::Reader::from_path(&out).unwrap();
    let headers = rdr.headers().unwrap().clone();
    for column in ["order_hour", "day_of_week", "month_name", "week_number"] {
        assert!(headers.iter().any(|h| h == column), "missing {}", column);
    }
    let first = rdr.records().next().unwrap().unwrap();
    let month_index = headers.iter().position(|h| h == "month_name").unwrap();
    assert_eq!(&first[month_index], "July");
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pizza_sales.csv");
    std::fs::write(&path, csv_text(&sample())).unwrap();

    let dataset = Dataset::load(&path, &PipelineConfig::default()).unwrap();

    assert_eq!(dataset.len(), 4);
    let observed = dataset.observed_values();
    assert_eq!(observed.months, vec!["July", "August"]);
    assert_eq!(observed.categories, vec!["Classic", "Veggie"]);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = Dataset::load(
        std::path::Path::new("does/not/exist.csv"),
        &PipelineConfig::default(),
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::Io { .. }));
}

#[test]
fn test_overflowing_totals_serialize_as_numbers() {
    let lines = [
        "1,1,a,1,2023-07-04,12:00:00,1e308,1e308,M,Classic,Alpha",
        "2,2,a,1,2023-07-04,13:00:00,1e308,1e308,M,Classic,Alpha",
    ];
    let dataset = dataset(&lines, &PipelineConfig::default()).unwrap();

    let dashboard = dataset.dashboard(&FilterSelection::all());

    assert!(dashboard.kpis.total_revenue.is_finite());
    assert!(dashboard.kpis.average_order_value.is_finite());
    assert_eq!(dashboard.sales_by_category.rows()[0].pct, 100.0);
    let json = serde_json::to_string(&dashboard).unwrap();
    assert!(!json.contains("null"), "{}", json);
}
