use std::sync::Arc;

use ahash::AHashMap;
use geo::{Contains, Point};
use rstar::RTree;
use smallvec::SmallVec;

use crate::batch::BatchJob;
use crate::crs::{ensure_same, Epsg};
use crate::error::Error;
use crate::geom::{point_envelope, Shape, SlotEnvelope};
use crate::store::GeometryStore;
use crate::types::{PoiId, RegionId};

/// A point of interest: a facility whose catchment is being characterised.
#[derive(Debug, Clone, PartialEq)]
pub struct Poi {
    pub id: PoiId,
    pub category: Arc<str>, // e.g. ownership class
    pub point: Point<f64>,
    pub crs: Option<Epsg>,
}

impl Poi {
    pub fn new(id: PoiId, category: &str, point: Point<f64>, crs: Option<Epsg>) -> Self {
        Self { id, category: Arc::from(category), point, crs }
    }
}

/// The result of associating POIs with something.
///
/// Every input POI lands in exactly one of the three lists.
#[derive(Debug)]
pub struct Linkage<T> {
    pub linked: Vec<(PoiId, T)>,
    /// POIs with nothing to link to.
    pub unmatched: Vec<PoiId>,
    /// POIs whose inputs could not be compared (e.g. mismatched CRS).
    pub rejected: Vec<(PoiId, Error)>,
}

impl<T> Default for Linkage<T> {
    fn default() -> Self {
        Self { linked: Vec::new(), unmatched: Vec::new(), rejected: Vec::new() }
    }
}

impl<T> Linkage<T> {
    #[inline] pub fn len(&self) -> usize { self.linked.len() + self.unmatched.len() + self.rejected.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Pair each POI with its authoritative catchment by id lookup.
pub fn link_by_id(pois: &[Poi], catchments: &AHashMap<PoiId, Shape>) -> Linkage<BatchJob> {
    let mut linkage = Linkage::default();
    for poi in pois {
        let Some(catchment) = catchments.get(&poi.id) else {
            linkage.unmatched.push(poi.id);
            continue;
        };
        match ensure_same(catchment.crs(), poi.crs) {
            Ok(_) => linkage.linked.push((poi.id, BatchJob::new(poi.clone(), catchment.clone()))),
            Err(err) => linkage.rejected.push((poi.id, err)),
        }
    }
    linkage
}

/// Associate each POI with every catchment polygon containing its location.
///
/// A POI may fall in several catchments (overlapping school districts, say);
/// matches are listed in input order of `catchments`.
pub fn link_by_containment<K: Clone>(pois: &[Poi], catchments: &[(K, Shape)]) -> Linkage<SmallVec<[K; 2]>> {
    let rtree = RTree::bulk_load(catchments.iter().enumerate()
        .filter_map(|(slot, (_, shape))| shape.bounding_rect().map(|rect| SlotEnvelope::new(slot, rect)))
        .collect());

    let mut linkage = Linkage::default();
    'pois: for poi in pois {
        let mut slots = rtree
            .locate_in_envelope_intersecting(&point_envelope(&poi.point))
            .map(SlotEnvelope::slot)
            .collect::<SmallVec<[usize; 4]>>();
        slots.sort_unstable();

        let mut keys = SmallVec::new();
        for slot in slots {
            let (key, shape) = &catchments[slot];
            if let Err(err) = ensure_same(shape.crs(), poi.crs) {
                linkage.rejected.push((poi.id, err));
                continue 'pois;
            }
            if shape.polygons().contains(&poi.point) { keys.push(key.clone()) }
        }

        if keys.is_empty() {
            linkage.unmatched.push(poi.id);
        } else {
            linkage.linked.push((poi.id, keys));
        }
    }
    linkage
}

/// Associate each POI with the single region containing its location.
///
/// This is the naive, unweighted baseline the area-weighted mean is compared against.
pub fn link_regions(pois: &[Poi], store: &GeometryStore) -> Linkage<RegionId> {
    let mut linkage = Linkage::default();
    for poi in pois {
        if let Err(err) = ensure_same(store.crs(), poi.crs) {
            linkage.rejected.push((poi.id, err));
            continue;
        }
        match store.region_containing(&poi.point) {
            Some(region) => linkage.linked.push((poi.id, region.id())),
            None => linkage.unmatched.push(poi.id),
        }
    }
    linkage
}
