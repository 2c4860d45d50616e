use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How `total_price` is obtained for each line item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    /// Keep the parsed `total_price` column as-is (dashboard filtering)
    #[default]
    TrustInputTotal,
    /// Override with `unit_price × quantity` (raw ingestion / feature pipeline)
    RecomputeFromUnitPrice,
}

impl PricingMode {
    pub fn label(&self) -> &'static str {
        match self {
            PricingMode::TrustInputTotal => "trust input total",
            PricingMode::RecomputeFromUnitPrice => "recompute from unit price",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PipelineConfig {
    #[serde(default)]
    pub pricing: PricingMode,
    /// N for the top/bottom seller tables
    #[serde(default = "default_rank_limit")]
    pub rank_limit: usize,
}

fn default_rank_limit() -> usize {
    5
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            pricing: PricingMode::default(),
            rank_limit: default_rank_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct InputConfig {
    pub path: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            path: PathBuf::from("data/pizza_sales.csv"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ExportConfig {
    pub path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            path: PathBuf::from("target/export/pizza_sales_enriched.csv"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` wins when set
    pub filter: String,
    /// Optional log file (appended, no ANSI colors)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "info".to_string(),
            file: None,
        }
    }
}

/// Default configuration embedded in the binary
pub const DEFAULT_CONFIG: &str = r#"
[pipeline]
pricing = "trust_input_total"
rank_limit = 5

[input]
path = "data/pizza_sales.csv"

[export]
path = "target/export/pizza_sales_enriched.csv"

[server]
listen_addr = "0.0.0.0:3000"

[logging]
filter = "info"
"#;

impl Config {
    pub fn from_toml(contents: &str) -> Result<Config> {
        Ok(toml::from_str(contents)?)
    }
}

/// Load configuration
///
/// Search order:
/// 1. Explicit path (fails if it cannot be read)
/// 2. `config.toml` in the working directory
/// 3. Falls back to embedded default config
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        let contents =
            std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
        return Config::from_toml(&contents);
    }

    let local = Path::new("config.toml");
    if local.exists() {
        let contents =
            std::fs::read_to_string(local).map_err(|e| PipelineError::io(local, e))?;
        return Config::from_toml(&contents);
    }

    Config::from_toml(DEFAULT_CONFIG)
}
