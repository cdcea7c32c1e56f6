use std::sync::Arc;

use ahash::AHashMap;
use geo::{Area, MultiPolygon};

use crate::error::{Error, Result};
use crate::types::RegionId;

/// Which numeric value of a region an aggregation averages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Field {
    /// The region's primary statistic.
    #[default]
    Statistic,
    /// A named secondary attribute.
    Attribute(Arc<str>),
}

impl Field {
    pub fn attribute(name: &str) -> Self { Field::Attribute(Arc::from(name)) }
}

/// A statistical region: a fixed polygon carrying measured attributes.
#[derive(Debug, Clone)]
pub struct Region {
    id: RegionId,
    geometry: MultiPolygon<f64>,
    area: f64, // Cached planar area of `geometry`
    statistic: f64,
    attributes: AHashMap<Arc<str>, f64>,
}

impl Region {
    pub fn new(id: RegionId, geometry: impl Into<MultiPolygon<f64>>, statistic: f64) -> Self {
        let geometry = geometry.into();
        Self {
            id,
            area: geometry.unsigned_area(),
            geometry,
            statistic,
            attributes: AHashMap::new(),
        }
    }

    /// Attach a named secondary attribute.
    pub fn with_attribute(mut self, name: &str, value: f64) -> Self {
        self.attributes.insert(Arc::from(name), value);
        self
    }

    #[inline] pub fn id(&self) -> RegionId { self.id }

    #[inline] pub fn geometry(&self) -> &MultiPolygon<f64> { &self.geometry }

    /// Planar area of the region in squared native units.
    #[inline] pub fn area(&self) -> f64 { self.area }

    #[inline] pub fn statistic(&self) -> f64 { self.statistic }

    /// Look up a named attribute.
    #[inline]
    pub fn attribute(&self, name: &str) -> Option<f64> { self.attributes.get(name).copied() }

    /// Resolve the value selected by `field`.
    pub fn value(&self, field: &Field) -> Result<f64> {
        let value = match field {
            Field::Statistic => self.statistic,
            Field::Attribute(name) => self.attribute(name)
                .ok_or_else(|| Error::MissingAttribute { region: self.id, attribute: name.to_string() })?,
        };
        if !value.is_finite() {
            return Err(Error::InvalidParameter(format!("{} has non-finite value {value} for {field:?}", self.id)));
        }
        Ok(value)
    }

    /// Swap in a repaired geometry, keeping the cached area in sync.
    pub(super) fn set_geometry(&mut self, geometry: MultiPolygon<f64>) {
        self.area = geometry.unsigned_area();
        self.geometry = geometry;
    }
}
