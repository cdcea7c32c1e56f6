use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a single statistical region (parish, tract, school district...)
/// within a `GeometryStore`.
///
/// Ids come from the source data and must be unique within one store. They
/// also define the iteration order of overlap queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u64);

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RegionId({})", self.0)
    }
}

/// Identifies a point of interest (a school, clinic, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoiId(pub u64);

impl fmt::Display for PoiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoiId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_region() {
        assert_eq!(RegionId(42).to_string(), "RegionId(42)");
    }

    #[test]
    fn display_poi() {
        assert_eq!(PoiId(7).to_string(), "PoiId(7)");
    }

    #[test]
    fn ordering() {
        assert!(RegionId(0) < RegionId(1));
        assert!(PoiId(3) > PoiId(2));
    }

    #[test]
    fn serializes_as_bare_integer() {
        assert_eq!(serde_json::to_string(&RegionId(12)).unwrap(), "12");
        assert_eq!(serde_json::from_str::<PoiId>("5").unwrap(), PoiId(5));
    }
}
