use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::batch::{BatchReport, PoiOutcome};
use crate::crs::ensure_same;
use crate::error::ErrorKind;
use crate::store::{Field, GeometryStore};
use crate::types::PoiId;

/// What happened to one POI, serialised with an `outcome` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Computed { weighted_statistic: f64, coverage: f64 },
    NoOverlap,
    GeometryError { message: String },
    CrsMismatch { message: String },
    Failed { message: String },
}

impl From<&PoiOutcome> for Outcome {
    fn from(outcome: &PoiOutcome) -> Self {
        match &outcome.result {
            Ok(mean) => Outcome::Computed { weighted_statistic: mean.value, coverage: mean.coverage() },
            Err(err) => match err.kind() {
                ErrorKind::NoOverlap => Outcome::NoOverlap,
                ErrorKind::Geometry => Outcome::GeometryError { message: err.to_string() },
                ErrorKind::CrsMismatch => Outcome::CrsMismatch { message: err.to_string() },
                ErrorKind::Other => Outcome::Failed { message: err.to_string() },
            },
        }
    }
}

/// One output row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiRecord {
    pub poi_id: PoiId,
    pub category: Arc<str>,
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Value of the region containing the POI, for comparison.
    pub baseline_statistic: Option<f64>,
}

/// Turn batch outcomes into output records, attaching the containing-region
/// baseline where the POI lies inside a region.
pub fn records(report: &BatchReport, store: &GeometryStore, field: &Field) -> Vec<PoiRecord> {
    report.outcomes.iter()
        .map(|outcome| {
            let poi = &outcome.poi;
            let baseline_statistic = ensure_same(store.crs(), poi.crs).ok()
                .and_then(|_| store.region_containing(&poi.point))
                .and_then(|region| region.value(field).ok());
            PoiRecord {
                poi_id: poi.id,
                category: poi.category.clone(),
                outcome: Outcome::from(outcome),
                baseline_statistic,
            }
        })
        .collect()
}

/// Outcome counts over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub computed: usize,
    pub no_overlap: usize,
    pub geometry_error: usize,
    pub crs_mismatch: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Mean weighted statistic over computed POIs only.
    pub mean_of_computed: Option<f64>,
}

impl Summary {
    pub fn new(records: &[PoiRecord], cancelled: usize) -> Self {
        let mut summary = Self { cancelled, ..Self::default() };
        let mut total = 0.0;
        for record in records {
            match record.outcome {
                Outcome::Computed { weighted_statistic, .. } => {
                    summary.computed += 1;
                    total += weighted_statistic;
                }
                Outcome::NoOverlap => summary.no_overlap += 1,
                Outcome::GeometryError { .. } => summary.geometry_error += 1,
                Outcome::CrsMismatch { .. } => summary.crs_mismatch += 1,
                Outcome::Failed { .. } => summary.failed += 1,
            }
        }
        if summary.computed > 0 {
            summary.mean_of_computed = Some(total / summary.computed as f64);
        }
        summary
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.computed + self.no_overlap + self.geometry_error + self.crs_mismatch + self.failed + self.cancelled
    }
}
