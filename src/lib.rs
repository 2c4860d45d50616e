// Pizza Insights - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod aggregate;  // Aggregator - KPIs + grouped views
pub mod config;
pub mod error;
pub mod features;   // Feature Deriver - hour / weekday / month / ISO week
pub mod filter;     // Filter Engine
pub mod logging;
pub mod normalizer; // Record Normalizer
pub mod pipeline;
pub mod records;

// Re-export commonly used types
pub use aggregate::{
    Dashboard, Kpis, View,
    MonthlyOrders, DailyOrders, HourlyOrders, SalesShare, SellerRow,
    RankMetric, RankDirection,
    SIZE_ORDER, DEFAULT_RANK_LIMIT,
};
pub use config::{
    Config, PipelineConfig, PricingMode, LoggingConfig, load_config,
};
pub use error::PipelineError;
pub use features::{MONTH_NAMES, WEEKDAY_NAMES};
pub use filter::{
    FilterSelection, FilterQuery, FilterOutcome, FilteredView, ObservedValues, Dimension,
};
pub use normalizer::{NormalizationReport, DropReason};
pub use pipeline::{Dataset, LoadSummary};
pub use records::{
    RawRecord, NormalizedRecord, DerivedRecord, LoadedRows,
    load_csv, read_csv, write_csv,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
