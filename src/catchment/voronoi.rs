use geo::{BoundingRect, Contains, Coord, LineString, MultiPolygon, Point, Polygon};
use spade::{DelaunayTriangulation, Point2, Triangulation};

use crate::error::{Error, Result};
use crate::geom::{overlay, validated, Shape};
use crate::types::PoiId;

/// Partition `boundary` into one Voronoi cell per generator.
///
/// Cells are returned in generator order. They tile the boundary without
/// overlaps and each cell's interior holds its own generator and no other.
/// Every generator must lie strictly inside the boundary, and no two may share
/// a location.
///
/// Cells are the duals of a Delaunay triangulation. Four far-away sentinel
/// sites close off every real cell; they sit far enough out that their
/// bisectors never cross the boundary's bounding box.
pub fn voronoi_catchments(generators: &[(PoiId, Point<f64>)], boundary: &Shape) -> Result<Vec<(PoiId, Shape)>> {
    if generators.is_empty() { return Err(Error::EmptyInput("generators")) }
    if let Some(epsg) = boundary.crs() { epsg.ensure_projected()?; }

    let area = validated(boundary.polygons(), "boundary", true)?;
    let Some(rect) = area.bounding_rect() else { return Err(Error::EmptyInput("boundary")) };

    for &(id, point) in generators {
        if !point.x().is_finite() || !point.y().is_finite() {
            return Err(Error::geometry(id.to_string(), "non-finite generator location"));
        }
        if !area.contains(&point) {
            return Err(Error::GeneratorOutsideBoundary(id));
        }
    }
    ensure_distinct(generators)?;

    let mut triangulation = DelaunayTriangulation::<Point2<f64>>::new();
    let center = rect.center();
    let reach = 4.0 * rect.width().hypot(rect.height());
    for (dx, dy) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
        triangulation.insert(Point2::new(center.x + dx * reach, center.y + dy * reach))
            .map_err(|e| Error::geometry("boundary", format!("cannot triangulate: {e:?}")))?;
    }
    let handles = generators.iter()
        .map(|&(id, point)| triangulation.insert(Point2::new(point.x(), point.y()))
            .map_err(|e| Error::geometry(id.to_string(), format!("cannot triangulate: {e:?}"))))
        .collect::<Result<Vec<_>>>()?;

    let mut cells = Vec::with_capacity(generators.len());
    for (&(id, _), handle) in generators.iter().zip(handles) {
        let mut ring = Vec::<Coord<f64>>::new();
        for edge in triangulation.vertex(handle).out_edges() {
            let Some(face) = edge.face().as_inner() else {
                return Err(Error::geometry(id.to_string(), "unbounded Voronoi cell"));
            };
            let corner = face.circumcenter();
            let corner = Coord { x: corner.x, y: corner.y };
            if ring.last() != Some(&corner) { ring.push(corner) }
        }
        if ring.len() > 1 && ring.first() == ring.last() { ring.pop(); }
        if ring.len() < 3 {
            return Err(Error::geometry(id.to_string(), "Voronoi cell collapsed"));
        }

        let cell = MultiPolygon::new(vec![Polygon::new(LineString::from(ring), vec![])]);
        let (clipped, _) = overlay(&cell, &area)?;
        cells.push((id, Shape::new(clipped, boundary.crs())));
    }

    Ok(cells)
}

/// Reject generators sharing a location, naming the first offending pair.
fn ensure_distinct(generators: &[(PoiId, Point<f64>)]) -> Result<()> {
    let mut order = (0..generators.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| {
        let (pa, pb) = (generators[a].1, generators[b].1);
        pa.x().total_cmp(&pb.x()).then(pa.y().total_cmp(&pb.y()))
    });
    for pair in order.windows(2) {
        let (a, b) = (&generators[pair[0]], &generators[pair[1]]);
        if a.1 == b.1 { return Err(Error::DuplicateGenerator(a.0, b.0)) }
    }
    Ok(())
}
