// Integration tests for the end-to-end pipeline:
//   linkage, batch aggregation with per-POI error scoping, cancellation,
//   and report records.

use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::AHashMap;
use areaweight::{
    link_by_id, link_regions, records, run_batch, BatchJob, BatchRunner, CancelFlag, Epsg, Field, GeometryStore, Outcome,
    OverlayConfig, Poi, PoiId, Region, RegionId, Shape, Summary,
};
use geo::{polygon, Point, Polygon};

const UTM: Option<Epsg> = Some(Epsg::ETRS89_UTM32N);

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
    polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
}

/// A 4 x 4 grid of 10 x 10 parishes whose statistic is their id.
fn grid() -> GeometryStore {
    let regions = (0..16u64).map(|id| {
        let (x, y) = ((id % 4) as f64 * 10.0, (id / 4) as f64 * 10.0);
        Region::new(RegionId(id), rect(x, y, x + 10.0, y + 10.0), id as f64)
    });
    GeometryStore::new(regions, UTM, &OverlayConfig::default()).unwrap()
}

fn schools() -> Vec<Poi> {
    (0..12u64)
        .map(|id| Poi::new(PoiId(id), if id % 3 == 0 { "private" } else { "public" }, Point::new(id as f64 * 3.0 + 1.5, 5.0), UTM))
        .collect()
}

fn jobs() -> Vec<BatchJob> {
    let mut catchments = AHashMap::new();
    for poi in schools() {
        let x = poi.point.x();
        catchments.insert(poi.id, Shape::new(rect(x - 1.0, 1.0, x + 1.0, 9.0), UTM));
    }
    // One school's catchment comes from a different projection.
    catchments.insert(PoiId(4), Shape::new(rect(0.0, 0.0, 5.0, 5.0), Some(Epsg(3035))));

    let linkage = link_by_id(&schools(), &catchments);
    assert_eq!(linkage.rejected.len(), 1);
    assert_eq!(linkage.rejected[0].0, PoiId(4));
    linkage.linked.into_iter().map(|(_, job)| job).collect()
}

#[test]
fn results_are_identical_across_worker_counts() {
    let store = grid();
    let jobs = jobs();

    let sequential = run_batch(&store, &jobs, &OverlayConfig { workers: 1, ..OverlayConfig::default() }, &CancelFlag::new()).unwrap();
    for workers in [0, 2, 4] {
        let parallel = run_batch(&store, &jobs, &OverlayConfig { workers, ..OverlayConfig::default() }, &CancelFlag::new()).unwrap();
        assert_eq!(parallel.outcomes.len(), sequential.outcomes.len());
        for (a, b) in parallel.outcomes.iter().zip(&sequential.outcomes) {
            assert_eq!(a.poi.id, b.poi.id);
            assert_eq!(a.result, b.result);
        }
    }
}

#[test]
fn catchments_straddling_parishes_are_blended() {
    let store = grid();
    let report = run_batch(&store, &jobs(), &OverlayConfig::default(), &CancelFlag::new()).unwrap();

    // School 3 sits at x = 10.5: its catchment spans x 9.5..11.5, a quarter in
    // parish 0 and three quarters in parish 1.
    let school = report.outcomes.iter().find(|o| o.poi.id == PoiId(3)).unwrap();
    let mean = school.result.as_ref().unwrap();
    assert_eq!(mean.weights.len(), 2);
    assert!((mean.value - 0.75).abs() < 1e-6);
}

#[test]
fn crs_mismatch_does_not_abort_the_batch() {
    let store = grid();
    let mut jobs = jobs();
    jobs.insert(2, BatchJob::new(
        Poi::new(PoiId(99), "public", Point::new(5.0, 5.0), Some(Epsg(3035))),
        Shape::new(rect(0.0, 0.0, 5.0, 5.0), Some(Epsg(3035))),
    ));

    let report = run_batch(&store, &jobs, &OverlayConfig::default(), &CancelFlag::new()).unwrap();
    assert_eq!(report.outcomes.len(), jobs.len());
    let records = records(&report, &store, &Field::Statistic);
    assert!(matches!(records[2].outcome, Outcome::CrsMismatch { .. }));

    let summary = Summary::new(&records, report.cancelled.len());
    assert_eq!(summary.crs_mismatch, 1);
    assert_eq!(summary.computed, jobs.len() - 1);
}

#[test]
fn cancelled_batch_lists_skipped_pois() {
    let store = grid();
    let jobs = jobs();
    let cancel = CancelFlag::new();
    cancel.cancel();

    let report = run_batch(&store, &jobs, &OverlayConfig::default(), &cancel).unwrap();
    assert!(report.outcomes.is_empty());
    assert_eq!(report.cancelled, jobs.iter().map(|job| job.poi.id).collect::<Vec<_>>());
    assert_eq!(Summary::new(&[], report.cancelled.len()).total(), jobs.len());
}

#[test]
fn cancelling_midway_keeps_finished_outcomes() {
    let store = grid();
    let jobs = jobs();
    let cancel = CancelFlag::new();
    let trigger = cancel.clone();
    let done = AtomicUsize::new(0);

    let report = BatchRunner::new(&store)
        .with_config(OverlayConfig { workers: 1, ..OverlayConfig::default() })
        .with_cancel_flag(cancel)
        .with_progress(|_| {
            if done.fetch_add(1, Ordering::Relaxed) + 1 == 3 { trigger.cancel() }
        })
        .run(&jobs)
        .unwrap();

    let finished = report.outcomes.iter().map(|o| o.poi.id).collect::<Vec<_>>();
    assert_eq!(finished, vec![PoiId(0), PoiId(1), PoiId(2)]);
    assert_eq!(report.outcomes[0].result.as_ref().unwrap().value, 0.0);
    assert_eq!(report.cancelled, jobs[3..].iter().map(|job| job.poi.id).collect::<Vec<_>>());
    assert_eq!(report.outcomes.len() + report.cancelled.len(), jobs.len());
}

#[test]
fn poi_crs_is_checked_against_its_catchment() {
    let store = grid();
    let job = BatchJob::new(
        Poi::new(PoiId(50), "public", Point::new(5.0, 5.0), Some(Epsg(3035))),
        Shape::new(rect(2.0, 2.0, 8.0, 8.0), UTM),
    );
    let report = run_batch(&store, &[job], &OverlayConfig::default(), &CancelFlag::new()).unwrap();
    let records = records(&report, &store, &Field::Statistic);
    assert!(matches!(records[0].outcome, Outcome::CrsMismatch { .. }));
}

#[test]
fn baseline_uses_the_containing_parish() {
    let store = grid();
    let linkage = link_regions(&schools(), &store);
    assert!(linkage.unmatched.is_empty());
    assert_eq!(linkage.linked[0], (PoiId(0), RegionId(0)));
    assert_eq!(linkage.linked[4], (PoiId(4), RegionId(1)));

    let report = run_batch(&store, &jobs(), &OverlayConfig::default(), &CancelFlag::new()).unwrap();
    let records = records(&report, &store, &Field::Statistic);
    assert!(records.iter().all(|r| r.baseline_statistic.is_some()));
}
