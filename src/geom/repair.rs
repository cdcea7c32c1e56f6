use std::borrow::Cow;
use std::fmt::Display;

use geo::{Area, BooleanOps, CoordsIter, MultiPolygon, Validation};

use crate::error::{Error, Result};

/// Check `polygons` for validity, repairing it if allowed.
///
/// Repair is a boolean self-union of every part followed by a union of the
/// parts. It splits self-intersecting rings into simple parts, drops
/// zero-width spikes and merges parts that overlap each other. Non-finite coordinates cannot be
/// repaired, and neither can geometry that collapses to nothing.
pub(crate) fn validated<'a>(
    polygons: &'a MultiPolygon<f64>,
    subject: impl Display,
    repair: bool,
) -> Result<Cow<'a, MultiPolygon<f64>>> {
    if polygons.0.is_empty() {
        return Err(Error::geometry(subject.to_string(), "geometry is empty"));
    }
    if polygons.coords_iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(Error::geometry(subject.to_string(), "non-finite coordinate"));
    }

    let Err(problem) = polygons.check_validation() else {
        return Ok(Cow::Borrowed(polygons));
    };
    let problem = problem.to_string();
    if !repair {
        return Err(Error::geometry(subject.to_string(), problem));
    }

    // Each part is cleaned on its own, then the parts are merged, so areas
    // covered by two parts count once instead of cancelling out.
    let repaired = polygons.0.iter()
        .map(|part| MultiPolygon::new(vec![part.clone()]).union(&MultiPolygon::new(Vec::new())))
        .reduce(|merged, part| merged.union(&part))
        .unwrap_or_else(|| MultiPolygon::new(Vec::new()));
    if repaired.0.is_empty() || repaired.unsigned_area() <= 0.0 {
        return Err(Error::geometry(
            subject.to_string(),
            format!("{problem}; collapses to nothing after repair"),
        ));
    }
    if let Err(remaining) = repaired.check_validation() {
        return Err(Error::geometry(
            subject.to_string(),
            format!("{problem}; still invalid after repair: {remaining}"),
        ));
    }

    log::debug!("repaired {subject}: {problem}");
    Ok(Cow::Owned(repaired))
}
