// 🍕 Pipeline - raw rows → Normalizer → Deriver → Filter Engine → Aggregator
//
// The Dataset is an immutable value. It is built once and shared (Arc) by every
// dashboard invocation; each invocation produces an independent Dashboard.

use crate::aggregate::{self, Dashboard};
use crate::config::{PipelineConfig, PricingMode};
use crate::error::{PipelineError, Result};
use crate::features;
use crate::filter::{self, FilterSelection, ObservedValues};
use crate::normalizer::{self, DropReason};
use crate::records::{self, DerivedRecord, LoadedRows, RawRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Diagnostics about how the dataset was built
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadSummary {
    /// Data rows in the source, decodable or not
    pub total_rows: usize,
    /// Rows the CSV layer could not decode
    pub unreadable_rows: usize,
    /// Rows dropped by the normalizer
    pub dropped_rows: usize,
    pub drop_reasons: BTreeMap<DropReason, usize>,
    pub kept_rows: usize,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    records: Arc<[DerivedRecord]>,
    summary: LoadSummary,
    pricing: PricingMode,
    rank_limit: usize,
}

impl Dataset {
    pub fn load(csv_path: &Path, config: &PipelineConfig) -> Result<Self> {
        let loaded = records::load_csv(csv_path)?;
        Self::from_loaded(loaded, config)
    }

    pub fn from_raw(rows: Vec<RawRecord>, config: &PipelineConfig) -> Result<Self> {
        Self::from_loaded(
            LoadedRows {
                rows,
                unreadable_rows: 0,
            },
            config,
        )
    }

    pub fn from_loaded(loaded: LoadedRows, config: &PipelineConfig) -> Result<Self> {
        let total_rows = loaded.total_rows();
        let report = normalizer::normalize(&loaded.rows, config.pricing);

        if report.is_empty() {
            return Err(PipelineError::EmptyDataset {
                total_rows,
                dropped_rows: report.dropped_rows + loaded.unreadable_rows,
            });
        }

        let summary = LoadSummary {
            total_rows,
            unreadable_rows: loaded.unreadable_rows,
            dropped_rows: report.dropped_rows,
            drop_reasons: report.drop_reasons,
            kept_rows: report.records.len(),
        };
        let derived = features::derive(report.records, config.pricing);

        tracing::info!(
            kept = summary.kept_rows,
            dropped = summary.dropped_rows,
            unreadable = summary.unreadable_rows,
            "dataset ready"
        );

        Ok(Dataset {
            records: derived.into(),
            summary,
            pricing: config.pricing,
            rank_limit: config.rank_limit,
        })
    }

    pub fn records(&self) -> &[DerivedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> &LoadSummary {
        &self.summary
    }

    pub fn pricing(&self) -> PricingMode {
        self.pricing
    }

    pub fn rank_limit(&self) -> usize {
        self.rank_limit
    }

    pub fn observed_values(&self) -> ObservedValues {
        ObservedValues::from_records(&self.records)
    }

    /// Fresh dashboard for one selection; nothing is reused between calls
    pub fn dashboard(&self, selection: &FilterSelection) -> Dashboard {
        aggregate(&self.records, selection, self.rank_limit)
    }

    pub fn export_csv(&self, csv_path: &Path) -> Result<usize> {
        records::write_csv(csv_path, &self.records)
    }
}

/// aggregate(records, selection) → views, as a pure function
pub fn aggregate(
    records: &[DerivedRecord],
    selection: &FilterSelection,
    rank_limit: usize,
) -> Dashboard {
    let outcome = filter::apply(records, selection);
    if outcome.is_empty() {
        tracing::info!(selection = %selection.describe(), "no data matches filters");
    }
    aggregate::aggregate_outcome(&outcome, rank_limit)
}
