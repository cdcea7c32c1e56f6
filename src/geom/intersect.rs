use geo::{Area, BooleanOps, MultiPolygon, Relate};

use crate::crs::{ensure_same, Epsg};
use crate::error::{Error, Result};

use super::{validated, Shape};

/// The overlap between two polygonal operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    pub polygons: MultiPolygon<f64>,
    pub area: f64,
    pub crs: Option<Epsg>,
}

impl Intersection {
    /// True if the operands share no area (disjoint or touching only).
    #[inline] pub fn is_empty(&self) -> bool { self.area <= 0.0 }

    /// Number of disconnected overlap pieces.
    #[inline] pub fn parts(&self) -> usize { self.polygons.0.len() }

    pub fn into_shape(self) -> Shape { Shape::new(self.polygons, self.crs) }
}

/// Intersect two shapes.
///
/// Both operands must declare the same coordinate system (or leave it
/// undeclared). Invalid operands are repaired before overlaying; disjoint and
/// touching-only inputs give an empty result rather than an error.
pub fn intersect(a: &Shape, b: &Shape) -> Result<Intersection> {
    let crs = ensure_same(a.crs(), b.crs())?;
    if let Some(epsg) = crs { epsg.ensure_projected()?; }

    let lhs = validated(a.polygons(), "left operand", true)?;
    let rhs = validated(b.polygons(), "right operand", true)?;
    let (polygons, area) = overlay(&lhs, &rhs)?;

    Ok(Intersection { polygons, area, crs })
}

/// Overlay two already-validated multipolygons, returning the overlap and its area.
///
/// A single DE-9IM `relate` decides the cheap cases: disjoint or touching
/// operands have no overlap, and when one operand lies within the other the
/// inner one is returned unchanged so its area stays exact.
pub(crate) fn overlay(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> Result<(MultiPolygon<f64>, f64)> {
    let im = a.relate(b);

    if !im.is_intersects() || im.is_touches() {
        return Ok((MultiPolygon::new(Vec::new()), 0.0));
    }
    if im.is_within() {
        return Ok((a.clone(), a.unsigned_area()));
    }
    if im.is_contains() {
        return Ok((b.clone(), b.unsigned_area()));
    }

    let overlap = a.intersection(b);
    let area = overlap.unsigned_area();
    if !area.is_finite() {
        return Err(Error::geometry("intersection", format!("overlap area is {area}")));
    }
    Ok((overlap, area))
}
