//! Sequencing of one batch run: transform, then load.
//!
//! ```text
//! Extracted -> Normalized -> DimensionsResolved -> DimensionsLoaded -> FactsLoaded
//! ```
//!
//! Any step may fail; the error records the last stage that completed.

use crate::dataset::{build_dataset, TransformStats};
use crate::dimensions::DimensionSets;
use crate::error::{LoadError, TransformError};
use crate::loader::{LoadReport, Loader};
use crate::normalize::Normalizer;
use crate::store::Store;
use crate::types::{NormalizeConfig, RawRecord};
use std::fmt;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Extracted,
    Normalized,
    DimensionsResolved,
    DimensionsLoaded,
    FactsLoaded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Extracted => "extracted",
            Stage::Normalized => "normalized",
            Stage::DimensionsResolved => "dimensions resolved",
            Stage::DimensionsLoaded => "dimensions loaded",
            Stage::FactsLoaded => "facts loaded",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("transform failed after stage '{reached}': {source}")]
    Transform {
        reached: Stage,
        #[source]
        source: TransformError,
    },

    #[error("load failed after stage '{reached}': {source}")]
    Load {
        reached: Stage,
        #[source]
        source: LoadError,
    },
}

impl PipelineError {
    /// Last stage that completed before the failure
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Transform { reached, .. } | PipelineError::Load { reached, .. } => {
                *reached
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub transform: TransformStats,
    pub load: LoadReport,
}

/// Run transform and load over one batch of raw records
pub async fn run<S: Store + ?Sized>(
    store: &S,
    raw: Vec<RawRecord>,
    config: &NormalizeConfig,
) -> Result<PipelineReport, PipelineError> {
    let mut reached = Stage::Extracted;
    info!(stage = %reached, records = raw.len(), "pipeline started");

    let normalizer = Normalizer::new(config.clone());
    let dataset = build_dataset(raw, &normalizer)
        .map_err(|source| PipelineError::Transform { reached, source })?;
    reached = Stage::Normalized;
    info!(stage = %reached, kept = dataset.len(), "records normalized");

    let sets = DimensionSets::resolve(&dataset.records);
    reached = Stage::DimensionsResolved;
    info!(
        stage = %reached,
        countries = sets.countries.len(),
        cities = sets.cities.len(),
        coordinates = sets.coordinates.len(),
        "dimensions resolved"
    );

    let loader = Loader::new(store);
    let report = loader
        .write_dimensions(&sets)
        .await
        .map_err(|source| PipelineError::Load { reached, source })?;
    reached = Stage::DimensionsLoaded;

    let report = loader
        .load_facts(&dataset.records, report)
        .await
        .map_err(|source| PipelineError::Load { reached, source })?;
    reached = Stage::FactsLoaded;
    info!(stage = %reached, "pipeline finished");

    Ok(PipelineReport {
        transform: dataset.stats,
        load: report,
    })
}
