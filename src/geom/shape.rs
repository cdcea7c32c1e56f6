use geo::{Area, BoundingRect, MultiPolygon, Rect};

use crate::crs::Epsg;

/// A polygonal geometry together with the coordinate system it is expressed in.
///
/// Catchments, Voronoi cells and intersection results are all `Shape`s, so the
/// CRS identity travels with the coordinates and is checked wherever two
/// shapes meet.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    polygons: MultiPolygon<f64>,
    crs: Option<Epsg>,
}

impl Shape {
    pub fn new(polygons: impl Into<MultiPolygon<f64>>, crs: Option<Epsg>) -> Self {
        Self { polygons: polygons.into(), crs }
    }

    /// Get a reference to the underlying MultiPolygon.
    #[inline] pub fn polygons(&self) -> &MultiPolygon<f64> { &self.polygons }

    /// Get the declared coordinate system, if any.
    #[inline] pub fn crs(&self) -> Option<Epsg> { self.crs }

    /// Number of disjoint polygon parts.
    #[inline] pub fn parts(&self) -> usize { self.polygons.0.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.polygons.0.is_empty() }

    /// Planar area in squared native units of the coordinate system.
    #[inline] pub fn area(&self) -> f64 { self.polygons.unsigned_area() }

    #[inline] pub fn bounding_rect(&self) -> Option<Rect<f64>> { self.polygons.bounding_rect() }

    pub fn into_polygons(self) -> MultiPolygon<f64> { self.polygons }
}
