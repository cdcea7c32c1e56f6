//! Catchment suppliers: approximate catchment polygons for points of interest
//! that have no authoritative catchment of their own.

mod buffer;
mod voronoi;

pub use buffer::buffer_circle;
pub use voronoi::voronoi_catchments;
