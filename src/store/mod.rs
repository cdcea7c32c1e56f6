mod region;
mod store;

pub use region::{Field, Region};
pub use store::{ExcludedRegion, GeometryStore};
