use geo::Area;

use crate::config::OverlayConfig;
use crate::crs::ensure_same;
use crate::error::{Error, Result};
use crate::geom::{overlay, validated, Shape};
use crate::store::{ExcludedRegion, Field, GeometryStore};
use crate::types::RegionId;

/// One region's share of a weighted mean.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionWeight {
    pub region: RegionId,
    /// Area of the region lying inside the catchment.
    pub overlap_area: f64,
    /// Disconnected overlap pieces contributing to `overlap_area`.
    pub parts: usize,
    /// The averaged value of this region.
    pub value: f64,
    /// `overlap_area` divided by the total covered area.
    pub weight: f64,
}

/// An area-weighted mean over a catchment, with the weights that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedMean {
    pub value: f64,
    /// Retained regions in ascending id order.
    pub weights: Vec<RegionWeight>,
    /// Sum of retained overlap areas; the normalising denominator.
    pub covered_area: f64,
    pub catchment_area: f64,
    /// Regions whose overlap could not be computed.
    pub skipped: Vec<ExcludedRegion>,
}

impl WeightedMean {
    /// Compute the area-weighted mean of `field` over `catchment`.
    ///
    /// Overlaps no larger than `config.sliver_epsilon` times the catchment
    /// area are dropped. Regions lacking a usable value for `field` are
    /// skipped; if no region is left, the first such error is returned. Weights are normalised over the covered part of the
    /// catchment only, so area outside every region does not count as zero.
    pub fn compute(catchment: &Shape, store: &GeometryStore, config: &OverlayConfig, field: &Field) -> Result<Self> {
        let crs = ensure_same(store.crs(), catchment.crs())?;
        if let Some(epsg) = crs { epsg.ensure_projected()?; }

        let polygons = validated(catchment.polygons(), "catchment", config.repair_invalid)?;
        let catchment_area = polygons.unsigned_area();
        let threshold = config.sliver_epsilon * catchment_area;

        let mut weights = Vec::new();
        let mut skipped = Vec::new();
        let mut unvalued = None;
        for region in store.overlapping(&polygons) {
            let (overlap, area) = match overlay(region.geometry(), &polygons) {
                Ok(result) => result,
                Err(err) => {
                    log::warn!("skipping {}: {err}", region.id());
                    skipped.push(ExcludedRegion { id: region.id(), reason: err.to_string() });
                    continue;
                }
            };
            if area <= threshold { continue }

            let value = match region.value(field) {
                Ok(value) => value,
                Err(err) => {
                    log::warn!("skipping {}: {err}", region.id());
                    skipped.push(ExcludedRegion { id: region.id(), reason: err.to_string() });
                    if unvalued.is_none() { unvalued = Some(err) }
                    continue;
                }
            };
            weights.push(RegionWeight {
                region: region.id(),
                overlap_area: area,
                parts: overlap.0.len(),
                value,
                weight: 0.0,
            });
        }

        if weights.is_empty() { return Err(unvalued.unwrap_or(Error::NoOverlap)) }

        let covered_area = weights.iter().map(|w| w.overlap_area).sum::<f64>();
        for w in &mut weights {
            w.weight = w.overlap_area / covered_area;
        }
        let value = weights.iter().map(|w| w.value * w.weight).sum();

        Ok(Self { value, weights, covered_area, catchment_area, skipped })
    }

    /// Fraction of the catchment covered by regions, in `[0, 1]`.
    #[inline]
    pub fn coverage(&self) -> f64 {
        (self.covered_area / self.catchment_area).min(1.0)
    }

    /// Sum of weights; 1 up to floating-point rounding.
    #[inline]
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().map(|w| w.weight).sum()
    }
}

/// Area-weighted mean of the regions' primary statistic over `catchment`,
/// using the default configuration.
///
/// Fails with `NoOverlap` when the catchment shares no positive area with any
/// region.
pub fn weighted_mean(catchment: &Shape, store: &GeometryStore) -> Result<f64> {
    WeightedMean::compute(catchment, store, &OverlayConfig::default(), &Field::Statistic)
        .map(|mean| mean.value)
}
