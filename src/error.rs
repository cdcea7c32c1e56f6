use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crs::Epsg;
use crate::types::{PoiId, RegionId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("coordinate system mismatch: expected {expected}, found {found}")]
    CrsMismatch { expected: Epsg, found: Epsg },
    #[error("{0} is a geographic (lon/lat) system; areas require a projected system")]
    GeographicCrs(Epsg),
    #[error("invalid geometry for {subject}: {reason}")]
    Geometry { subject: String, reason: String },
    #[error("catchment does not overlap any region with positive area")]
    NoOverlap,
    #[error("region id {0} appears more than once")]
    DuplicateRegion(RegionId),
    #[error("region {region} has no attribute '{attribute}'")]
    MissingAttribute { region: RegionId, attribute: String },
    #[error("generators {0} and {1} share the same location")]
    DuplicateGenerator(PoiId, PoiId),
    #[error("generator {0} lies outside the boundary polygon")]
    GeneratorOutsideBoundary(PoiId),
    #[error("no {0} given")]
    EmptyInput(&'static str),
    #[error("{0}")]
    InvalidParameter(String),
    #[error("failed to start worker pool: {0}")]
    WorkerPool(String),
}

/// Coarse outcome bucket, used when reporting batch results.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CrsMismatch,
    Geometry,
    NoOverlap,
    Other,
}

impl Error {
    pub(crate) fn geometry(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Geometry { subject: subject.into(), reason: reason.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::CrsMismatch { .. } | Error::GeographicCrs(_) => ErrorKind::CrsMismatch,
            Error::Geometry { .. } => ErrorKind::Geometry,
            Error::NoOverlap => ErrorKind::NoOverlap,
            _ => ErrorKind::Other,
        }
    }
}
