use std::borrow::Cow;

use ahash::AHashMap;
use geo::{BoundingRect, Contains, Coord, Intersects, MultiPolygon, Point, Rect};
use rstar::RTree;

use crate::config::OverlayConfig;
use crate::crs::{ensure_same, Epsg};
use crate::error::{Error, Result};
use crate::geom::{point_envelope, rect_envelope, validated, Shape, SlotEnvelope};
use crate::types::RegionId;

use super::Region;

/// A region dropped from a computation, with the reason it was dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedRegion {
    pub id: RegionId,
    pub reason: String,
}

/// An immutable collection of statistical regions sharing one coordinate
/// system, indexed by an R-tree over their bounding boxes.
///
/// Regions are kept sorted by id, so every query returns them in a stable order.
#[derive(Debug)]
pub struct GeometryStore {
    regions: Vec<Region>,
    index: AHashMap<RegionId, usize>, // Map from region ids to slots in `regions`
    rtree: RTree<SlotEnvelope>,
    crs: Option<Epsg>,
    excluded: Vec<ExcludedRegion>,
}

impl GeometryStore {
    /// Load regions into a store.
    ///
    /// Fails on a geographic CRS or duplicate ids. Regions whose geometry is
    /// invalid and cannot be repaired, or whose statistic is not finite, are
    /// excluded with a warning instead of failing the load.
    pub fn new(regions: impl IntoIterator<Item = Region>, crs: Option<Epsg>, config: &OverlayConfig) -> Result<Self> {
        if let Some(epsg) = crs { epsg.ensure_projected()?; }

        let mut regions = regions.into_iter().collect::<Vec<_>>();
        regions.sort_by_key(Region::id);
        if let Some(pair) = regions.windows(2).find(|pair| pair[0].id() == pair[1].id()) {
            return Err(Error::DuplicateRegion(pair[0].id()));
        }

        let mut excluded = Vec::new();
        let mut kept = Vec::with_capacity(regions.len());
        for mut region in regions {
            if !region.statistic().is_finite() {
                log::warn!("excluding {}: statistic is {}", region.id(), region.statistic());
                excluded.push(ExcludedRegion { id: region.id(), reason: format!("statistic is {}", region.statistic()) });
                continue;
            }
            let checked = validated(region.geometry(), region.id(), config.repair_invalid)
                .map(|geometry| match geometry {
                    Cow::Borrowed(_) => None,
                    Cow::Owned(repaired) => Some(repaired),
                });
            match checked {
                Ok(None) => kept.push(region),
                Ok(Some(repaired)) => {
                    region.set_geometry(repaired);
                    kept.push(region);
                }
                Err(err) => {
                    log::warn!("excluding {}: {err}", region.id());
                    excluded.push(ExcludedRegion { id: region.id(), reason: err.to_string() });
                }
            }
        }

        let rtree = RTree::bulk_load(kept.iter().enumerate()
            .filter_map(|(slot, region)| region.geometry().bounding_rect()
                .map(|rect| SlotEnvelope::new(slot, rect)))
            .collect());
        let index = kept.iter().enumerate()
            .map(|(slot, region)| (region.id(), slot))
            .collect();

        log::info!("loaded {} regions ({} excluded)", kept.len(), excluded.len());

        Ok(Self { regions: kept, index, rtree, crs, excluded })
    }

    /// Get the number of regions available for aggregation.
    #[inline] pub fn len(&self) -> usize { self.regions.len() }

    /// Check if the store holds no usable regions.
    #[inline] pub fn is_empty(&self) -> bool { self.regions.is_empty() }

    /// Get the declared coordinate system, if any.
    #[inline] pub fn crs(&self) -> Option<Epsg> { self.crs }

    /// Regions that were dropped at load time.
    #[inline] pub fn excluded(&self) -> &[ExcludedRegion] { &self.excluded }

    /// Iterate over regions in ascending id order.
    #[inline] pub fn iter(&self) -> impl Iterator<Item = &Region> { self.regions.iter() }

    /// Look up a region by id.
    #[inline]
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.index.get(&id).map(|&slot| &self.regions[slot])
    }

    /// Compute the bounding rectangle of all regions.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.regions.iter()
            .filter_map(|region| region.geometry().bounding_rect())
            .reduce(|a, b| Rect::new(
                Coord { x: a.min().x.min(b.min().x), y: a.min().y.min(b.min().y) },
                Coord { x: a.max().x.max(b.max().x), y: a.max().y.max(b.max().y) },
            ))
    }

    /// Every region whose geometry intersects `query` (boundary contact
    /// included), ordered by ascending id.
    pub fn regions_overlapping(&self, query: &Shape) -> Result<Vec<&Region>> {
        if let Some(epsg) = ensure_same(self.crs, query.crs())? { epsg.ensure_projected()?; }
        Ok(self.overlapping(query.polygons()))
    }

    /// R-tree narrowing followed by an exact intersects test.
    pub(crate) fn overlapping(&self, polygons: &MultiPolygon<f64>) -> Vec<&Region> {
        let Some(rect) = polygons.bounding_rect() else { return Vec::new() };

        let mut slots = self.rtree
            .locate_in_envelope_intersecting(&rect_envelope(&rect))
            .map(SlotEnvelope::slot)
            .filter(|&slot| self.regions[slot].geometry().intersects(polygons))
            .collect::<Vec<_>>();
        slots.sort_unstable();

        slots.into_iter().map(|slot| &self.regions[slot]).collect()
    }

    /// The region whose interior contains `point`.
    ///
    /// If sliver overlaps put the point in several regions, the lowest id wins.
    pub fn region_containing(&self, point: &Point<f64>) -> Option<&Region> {
        self.rtree
            .locate_in_envelope_intersecting(&point_envelope(point))
            .map(SlotEnvelope::slot)
            .filter(|&slot| self.regions[slot].geometry().contains(point))
            .min()
            .map(|slot| &self.regions[slot])
    }
}
