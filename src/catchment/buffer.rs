use std::f64::consts::TAU;

use geo::{Coord, LineString, Point, Polygon};

use crate::crs::Epsg;
use crate::error::{Error, Result};
use crate::geom::Shape;

/// A regular `segments`-gon inscribed in the circle of `radius` around `center`.
pub fn buffer_circle(center: Point<f64>, radius: f64, segments: usize, crs: Option<Epsg>) -> Result<Shape> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(Error::InvalidParameter(format!("buffer radius must be positive (got {radius})")));
    }
    if segments < 3 {
        return Err(Error::InvalidParameter(format!("buffer needs at least 3 segments (got {segments})")));
    }
    if let Some(epsg) = crs { epsg.ensure_projected()?; }

    let ring = (0..segments)
        .map(|k| {
            let theta = TAU * k as f64 / segments as f64;
            Coord { x: center.x() + radius * theta.cos(), y: center.y() + radius * theta.sin() }
        })
        .collect::<Vec<_>>();

    Ok(Shape::new(Polygon::new(LineString::from(ring), vec![]), crs))
}
