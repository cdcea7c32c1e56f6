use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::aggregate::WeightedMean;
use crate::config::OverlayConfig;
use crate::crs::ensure_same;
use crate::error::{Error, Result};
use crate::geom::Shape;
use crate::linkage::Poi;
use crate::store::{Field, GeometryStore};
use crate::types::PoiId;

/// One unit of batch work: a POI and the catchment to aggregate over.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub poi: Poi,
    pub catchment: Shape,
}

impl BatchJob {
    pub fn new(poi: Poi, catchment: Shape) -> Self { Self { poi, catchment } }
}

/// Cooperative cancellation shared between a running batch and its owner.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self { Self::default() }

    /// Ask the batch to stop before its next POI.
    #[inline] pub fn cancel(&self) { self.0.store(true, Ordering::Relaxed) }

    #[inline] pub fn is_cancelled(&self) -> bool { self.0.load(Ordering::Relaxed) }
}

/// The aggregation outcome for one POI.
#[derive(Debug, Clone)]
pub struct PoiOutcome {
    pub poi: Poi,
    pub result: Result<WeightedMean>,
}

/// Outcomes of a batch, in job order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<PoiOutcome>,
    /// POIs skipped because the batch was cancelled before reaching them.
    pub cancelled: Vec<PoiId>,
}

/// Runs weighted-mean aggregation for many POIs against one store.
///
/// Each POI is independent: its errors stay with its outcome and never abort
/// the rest of the batch.
pub struct BatchRunner<'a> {
    store: &'a GeometryStore,
    config: OverlayConfig,
    field: Field,
    cancel: CancelFlag,
    progress: Option<Box<dyn Fn(&PoiOutcome) + Sync + 'a>>,
}

impl<'a> BatchRunner<'a> {
    pub fn new(store: &'a GeometryStore) -> Self {
        Self {
            store,
            config: OverlayConfig::default(),
            field: Field::Statistic,
            cancel: CancelFlag::new(),
            progress: None,
        }
    }

    pub fn with_config(mut self, config: OverlayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.field = field;
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Call `progress` with every outcome as soon as it is computed.
    ///
    /// With more than one worker, calls arrive from pool threads in completion order.
    pub fn with_progress(mut self, progress: impl Fn(&PoiOutcome) + Sync + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// A handle that cancels this runner.
    #[inline] pub fn cancel_flag(&self) -> CancelFlag { self.cancel.clone() }

    #[inline] pub fn field(&self) -> &Field { &self.field }

    /// Aggregate every job.
    ///
    /// Fails only on an invalid config or if the worker pool cannot be started.
    pub fn run(&self, jobs: &[BatchJob]) -> Result<BatchReport> {
        self.config.validate().map_err(|e| Error::InvalidParameter(e.to_string()))?;
        log::info!(
            "aggregating {} catchments over {} regions ({} workers)",
            jobs.len(), self.store.len(), self.config.workers,
        );

        let slots = match self.config.workers {
            1 => jobs.iter().map(|job| self.run_one(job)).collect::<Vec<_>>(),
            workers => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .build()
                    .map_err(|e| Error::WorkerPool(e.to_string()))?;
                pool.install(|| jobs.par_iter().map(|job| self.run_one(job)).collect::<Vec<_>>())
            }
        };

        let mut report = BatchReport::default();
        for (job, slot) in jobs.iter().zip(slots) {
            match slot {
                Some(outcome) => report.outcomes.push(outcome),
                None => report.cancelled.push(job.poi.id),
            }
        }

        if !report.cancelled.is_empty() {
            log::warn!("batch cancelled: {} of {} POIs not processed", report.cancelled.len(), jobs.len());
        }
        let failed = report.outcomes.iter().filter(|o| o.result.is_err()).count();
        log::info!("batch finished: {} computed, {failed} failed", report.outcomes.len() - failed);

        Ok(report)
    }

    fn run_one(&self, job: &BatchJob) -> Option<PoiOutcome> {
        if self.cancel.is_cancelled() { return None }

        let result = ensure_same(job.catchment.crs(), job.poi.crs)
            .and_then(|_| ensure_same(self.store.crs(), job.poi.crs))
            .and_then(|_| WeightedMean::compute(&job.catchment, self.store, &self.config, &self.field));
        if let Err(err) = &result {
            log::debug!("{} ({}): {err}", job.poi.id, job.poi.category);
        }

        let outcome = PoiOutcome { poi: job.poi.clone(), result };
        if let Some(progress) = &self.progress { progress(&outcome) }
        Some(outcome)
    }
}

/// Aggregate the statistic of `store` over every job's catchment.
pub fn run_batch(store: &GeometryStore, jobs: &[BatchJob], config: &OverlayConfig, cancel: &CancelFlag) -> Result<BatchReport> {
    BatchRunner::new(store)
        .with_config(config.clone())
        .with_cancel_flag(cancel.clone())
        .run(jobs)
}

#[cfg(test)]
mod tests {
    use geo::{polygon, Point, Polygon};

    use crate::crs::Epsg;
    use crate::store::Region;
    use crate::types::RegionId;

    use super::*;

    const UTM: Option<Epsg> = Some(Epsg(25832));

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
    }

    fn store() -> GeometryStore {
        GeometryStore::new(
            vec![
                Region::new(RegionId(1), rect(0.0, 0.0, 10.0, 10.0), 10.0),
                Region::new(RegionId(2), rect(10.0, 0.0, 20.0, 10.0), 30.0),
            ],
            UTM,
            &OverlayConfig::default(),
        ).unwrap()
    }

    fn job(id: u64, catchment: Shape) -> BatchJob {
        BatchJob::new(Poi::new(PoiId(id), "public", Point::new(0.0, 0.0), UTM), catchment)
    }

    fn jobs() -> Vec<BatchJob> {
        vec![
            job(1, Shape::new(rect(1.0, 1.0, 2.0, 2.0), UTM)),
            job(2, Shape::new(rect(50.0, 50.0, 60.0, 60.0), UTM)),
            job(3, Shape::new(rect(0.0, 0.0, 20.0, 10.0), Some(Epsg(3035)))),
            job(4, Shape::new(rect(0.0, 0.0, 20.0, 10.0), UTM)),
        ]
    }

    #[test]
    fn failures_stay_with_their_poi() {
        let store = store();
        for workers in [1, 2] {
            let runner = BatchRunner::new(&store)
                .with_config(OverlayConfig { workers, ..OverlayConfig::default() });
            let report = runner.run(&jobs()).unwrap();

            let ids = report.outcomes.iter().map(|o| o.poi.id).collect::<Vec<_>>();
            assert_eq!(ids, vec![PoiId(1), PoiId(2), PoiId(3), PoiId(4)]);
            assert_eq!(report.outcomes[0].result.as_ref().unwrap().value, 10.0);
            assert!(matches!(report.outcomes[1].result, Err(Error::NoOverlap)));
            assert!(matches!(report.outcomes[2].result, Err(Error::CrsMismatch { .. })));
            assert!((report.outcomes[3].result.as_ref().unwrap().value - 20.0).abs() < 1e-9);
            assert!(report.cancelled.is_empty());
        }
    }

    #[test]
    fn poi_in_another_crs_is_a_mismatch() {
        let store = store();
        let foreign = BatchJob::new(
            Poi::new(PoiId(5), "public", Point::new(1.5, 1.5), Some(Epsg(3035))),
            Shape::new(rect(1.0, 1.0, 2.0, 2.0), UTM),
        );
        let report = BatchRunner::new(&store).run(&[foreign]).unwrap();
        assert_eq!(
            report.outcomes[0].result,
            Err(Error::CrsMismatch { expected: Epsg(25832), found: Epsg(3035) }),
        );
    }

    #[test]
    fn cancelling_midway_keeps_finished_outcomes() {
        let store = store();
        let cancel = CancelFlag::new();
        let trigger = cancel.clone();
        let runner = BatchRunner::new(&store)
            .with_config(OverlayConfig { workers: 1, ..OverlayConfig::default() })
            .with_cancel_flag(cancel)
            .with_progress(move |_| trigger.cancel());

        let report = runner.run(&jobs()).unwrap();
        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(report.outcomes[0].poi.id, PoiId(1));
        assert_eq!(report.outcomes[0].result.as_ref().unwrap().value, 10.0);
        assert_eq!(report.cancelled, vec![PoiId(2), PoiId(3), PoiId(4)]);
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let store = store();
        let runner = BatchRunner::new(&store)
            .with_config(OverlayConfig { sliver_epsilon: -1.0, ..OverlayConfig::default() });
        assert!(matches!(runner.run(&jobs()), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn cancelled_batch_skips_everything_left() {
        let store = store();
        let runner = BatchRunner::new(&store)
            .with_config(OverlayConfig { workers: 1, ..OverlayConfig::default() });
        runner.cancel_flag().cancel();

        let report = runner.run(&jobs()).unwrap();
        assert!(report.outcomes.is_empty());
        assert_eq!(report.cancelled, vec![PoiId(1), PoiId(2), PoiId(3), PoiId(4)]);
    }
}
