mod ids;

pub use ids::{PoiId, RegionId};
