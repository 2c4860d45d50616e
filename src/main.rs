// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

// Use library instead of local modules
use pizza_insights::{
    load_config, logging, Config, Dashboard, Dataset, FilterSelection, PricingMode, SalesShare,
    SellerRow, View,
};

/// Pizza Insights - sales KPIs and dashboard tables from a pizza order export
#[derive(Parser)]
#[command(name = "pizza-insights")]
#[command(version)]
#[command(about = "Sales KPIs, breakdowns and trends from pizza order line items", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file (defaults to ./config.toml, then built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override how total_price is obtained
    #[arg(long, global = true, value_enum)]
    pricing: Option<PricingArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PricingArg {
    /// Keep the total_price column as-is
    Trust,
    /// total_price = unit_price × quantity
    Recompute,
}

impl From<PricingArg> for PricingMode {
    fn from(arg: PricingArg) -> Self {
        match arg {
            PricingArg::Trust => PricingMode::TrustInputTotal,
            PricingArg::Recompute => PricingMode::RecomputeFromUnitPrice,
        }
    }
}

#[derive(clap::Args, Default)]
struct FilterArgs {
    /// Allowed month names (repeatable)
    #[arg(long = "month")]
    months: Vec<String>,
    /// Allowed weekday names (repeatable)
    #[arg(long = "day")]
    days: Vec<String>,
    /// Allowed order hours 0-23 (repeatable)
    #[arg(long = "hour")]
    hours: Vec<u32>,
    /// Allowed pizza categories (repeatable)
    #[arg(long = "category")]
    categories: Vec<String>,
    /// Allowed pizza sizes (repeatable)
    #[arg(long = "size")]
    sizes: Vec<String>,
}

impl FilterArgs {
    /// A dimension that is not given on the command line allows everything
    fn to_selection(&self) -> FilterSelection {
        let mut selection = FilterSelection::all();
        if !self.months.is_empty() {
            selection = selection.with_months(self.months.iter().cloned());
        }
        if !self.days.is_empty() {
            selection = selection.with_days(self.days.iter().cloned());
        }
        if !self.hours.is_empty() {
            selection = selection.with_hours(self.hours.iter().copied());
        }
        if !self.categories.is_empty() {
            selection = selection.with_categories(self.categories.iter().cloned());
        }
        if !self.sizes.is_empty() {
            selection = selection.with_sizes(self.sizes.iter().cloned());
        }
        selection
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print KPIs and every dashboard table
    Report {
        /// Input CSV (defaults to [input].path)
        csv: Option<PathBuf>,
        /// Print the dashboard as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Write the cleaned, enriched record set as CSV
    Export {
        /// Input CSV (defaults to [input].path)
        csv: Option<PathBuf>,
        /// Output CSV (defaults to [export].path)
        out: Option<PathBuf>,
    },

    /// List the filter values present in the data
    Filters {
        /// Input CSV (defaults to [input].path)
        csv: Option<PathBuf>,
    },

    /// Interactive terminal dashboard
    Tui {
        /// Input CSV (defaults to [input].path)
        csv: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(pricing) = cli.pricing {
        config.pipeline.pricing = pricing.into();
    }

    logging::init(&config.logging).context("Failed to initialize logging")?;

    match &cli.command {
        Commands::Report { csv, json, filters } => run_report(&config, csv, *json, filters),
        Commands::Export { csv, out } => run_export(&config, csv, out),
        Commands::Filters { csv } => run_filters(&config, csv),
        Commands::Tui { csv } => run_ui_mode(&config, csv),
    }
}

fn load_dataset(config: &Config, csv: &Option<PathBuf>) -> Result<Dataset> {
    let path = csv.clone().unwrap_or_else(|| config.input.path.clone());
    Dataset::load(&path, &config.pipeline)
        .with_context(|| format!("Failed to build dataset from {}", path.display()))
}

fn run_report(config: &Config, csv: &Option<PathBuf>, json: bool, filters: &FilterArgs) -> Result<()> {
    let dataset = load_dataset(config, csv)?;
    let selection = filters.to_selection();
    let dashboard = dataset.dashboard(&selection);

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    let summary = dataset.summary();
    println!("🍕 Pizza Sales Report");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "Rows: {} read, {} kept, {} dropped, {} unreadable | pricing: {}",
        summary.total_rows,
        summary.kept_rows,
        summary.dropped_rows,
        summary.unreadable_rows,
        dataset.pricing().label()
    );
    println!("Filters: {}", selection.describe());

    if dashboard.is_empty() {
        println!("\n⚠️  No data matches the selected filters");
        return Ok(());
    }

    print_dashboard(&dashboard);
    Ok(())
}

fn print_dashboard(dashboard: &Dashboard) {
    let kpis = &dashboard.kpis;
    println!("\n📊 Key Performance Indicators");
    println!("  Total Revenue:       ${:.2}", kpis.total_revenue);
    println!("  Total Orders:        {}", kpis.total_orders);
    println!("  Avg. Order Value:    ${:.2}", kpis.average_order_value);
    println!("  Total Pizzas Sold:   {}", kpis.total_pizzas_sold);

    println!("\n📅 Monthly Trend (orders)");
    for row in dashboard.monthly_orders.rows() {
        println!("  {:<12} {:>8}", row.month_name, row.total_orders);
    }

    println!("\n🗓️  Daily Trend (orders)");
    for row in dashboard.daily_orders.rows() {
        println!("  {:<12} {:>8}", row.order_date.to_string(), row.total_orders);
    }

    println!("\n🕐 Hourly Trend (orders)");
    for row in dashboard.hourly_orders.rows() {
        println!("  {:02}:00        {:>8}", row.order_hour, row.total_orders);
    }

    print_shares("🥧 % of Sales by Category", &dashboard.sales_by_category);
    print_shares("📏 % of Sales by Size", &dashboard.sales_by_size);

    print_sellers("🏆 Top Sellers by Revenue", &dashboard.top_by_revenue);
    print_sellers("🔻 Bottom Sellers by Revenue", &dashboard.bottom_by_revenue);
    print_sellers("🏆 Top Sellers by Quantity", &dashboard.top_by_quantity);
    print_sellers("🔻 Bottom Sellers by Quantity", &dashboard.bottom_by_quantity);
}

fn print_shares(title: &str, view: &View<SalesShare>) {
    println!("\n{}", title);
    for row in view.rows() {
        println!(
            "  {:<12} {:>12.2} {:>7.2}%",
            row.group, row.total_revenue, row.pct
        );
    }
}

fn print_sellers(title: &str, view: &View<SellerRow>) {
    println!("\n{}", title);
    for (i, row) in view.rows().iter().enumerate() {
        println!(
            "  {}. {:<42} {:>10.2} {:>6}",
            i + 1,
            row.pizza_name,
            row.total_revenue,
            row.quantity
        );
    }
}

fn run_export(config: &Config, csv: &Option<PathBuf>, out: &Option<PathBuf>) -> Result<()> {
    let dataset = load_dataset(config, csv)?;
    let out = out.clone().unwrap_or_else(|| config.export.path.clone());

    let written = dataset
        .export_csv(&out)
        .with_context(|| format!("Failed to export to {}", out.display()))?;

    println!("✓ Exported {} enriched rows to {}", written, out.display());
    Ok(())
}

fn run_filters(config: &Config, csv: &Option<PathBuf>) -> Result<()> {
    let dataset = load_dataset(config, csv)?;
    let observed = dataset.observed_values();

    let hours: Vec<String> = observed.hours.iter().map(|h| h.to_string()).collect();
    println!("Months:     {}", observed.months.join(", "));
    println!("Days:       {}", observed.days.join(", "));
    println!("Hours:      {}", hours.join(", "));
    println!("Categories: {}", observed.categories.join(", "));
    println!("Sizes:      {}", observed.sizes.join(", "));
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config, csv: &Option<PathBuf>) -> Result<()> {
    let dataset = load_dataset(config, csv)?;

    let mut app = ui::App::new(std::sync::Arc::new(dataset));
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config, _csv: &Option<PathBuf>) -> Result<()> {
    anyhow::bail!("TUI mode not available; rebuild with `--features tui`")
}
