#![doc = "Area-weighted aggregation of regional statistics over catchment polygons"]
mod aggregate;
mod batch;
mod catchment;
mod config;
mod crs;
mod error;
mod geom;
mod linkage;
mod report;
mod store;
mod types;

#[doc(inline)]
pub use aggregate::{weighted_mean, RegionWeight, WeightedMean};

#[doc(inline)]
pub use batch::{run_batch, BatchJob, BatchReport, BatchRunner, CancelFlag, PoiOutcome};

#[doc(inline)]
pub use catchment::{buffer_circle, voronoi_catchments};

#[doc(inline)]
pub use config::OverlayConfig;

#[doc(inline)]
pub use crs::Epsg;

#[doc(inline)]
pub use error::{Error, ErrorKind, Result};

#[doc(inline)]
pub use geom::{intersect, Intersection, Shape};

#[doc(inline)]
pub use linkage::{link_by_containment, link_by_id, link_regions, Linkage, Poi};

#[doc(inline)]
pub use report::{records, Outcome, PoiRecord, Summary};

#[doc(inline)]
pub use store::{ExcludedRegion, Field, GeometryStore, Region};

#[doc(inline)]
pub use types::{PoiId, RegionId};
