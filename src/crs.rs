use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An EPSG code identifying the coordinate reference system of a geometry.
///
/// Every polygon in this crate carries an `Option<Epsg>`. `None` means the
/// source did not declare a system; it is compatible with anything, so the
/// caller is responsible for making sure it really is planar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epsg(pub u32);

/// Well-known geographic (lon/lat) systems. Areas computed in these are in
/// squared degrees, which is never what a weighted overlay wants.
const GEOGRAPHIC: [u32; 7] = [
    4326, // WGS 84
    4269, // NAD83
    4258, // ETRS89
    4283, // GDA94
    4167, // NZGD2000
    4617, // NAD83(CSRS)
    4674, // SIRGAS 2000
];

impl Epsg {
    /// ETRS89 / UTM zone 32N, the usual equal-area-friendly projection for Danish data.
    pub const ETRS89_UTM32N: Self = Self(25832);

    /// Returns true if this code names a known geographic (unprojected) system.
    #[inline]
    pub fn is_geographic(self) -> bool { GEOGRAPHIC.contains(&self.0) }

    /// Fail with `GeographicCrs` if this code cannot be used for planar areas.
    pub fn ensure_projected(self) -> Result<Self> {
        if self.is_geographic() { return Err(Error::GeographicCrs(self)) }
        Ok(self)
    }
}

impl fmt::Display for Epsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

/// Check that two declared coordinate systems agree.
///
/// Undeclared systems are accepted; the result is whichever side was declared.
pub fn ensure_same(expected: Option<Epsg>, found: Option<Epsg>) -> Result<Option<Epsg>> {
    match (expected, found) {
        (Some(a), Some(b)) if a != b => Err(Error::CrsMismatch { expected: a, found: b }),
        (Some(a), _) => Ok(Some(a)),
        (None, b) => Ok(b),
    }
}
