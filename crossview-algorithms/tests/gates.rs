use approx::assert_relative_eq;
use crossview_algorithms::{FitCache, MatchingConfig, MatchingStatistics, TrackMatcher};
use crossview_core::{
    ClusterId, Event, Point3, Position, SlidingLinearFit, SlidingLinearFitter, StereoGeometry,
    TrajectoryFit, View, WireGeometry,
};

fn diagonal(t: f64) -> Point3 {
    Point3::new(t, 5.0 + 0.3 * t, 10.0 + 0.4 * t)
}

/// U and V clusters over `0..=15`, W cluster over `0..=w_last`.
fn triple(w_last: u32) -> (Event, [ClusterId; 3]) {
    let geometry = WireGeometry::default();
    let mut event = Event::new();
    let ids = View::ALL.map(|view| {
        let last = if view == View::W { w_last } else { 15 };
        let hits: Vec<_> = (0..=last)
            .map(|t| event.add_hit(view, geometry.project(view, diagonal(f64::from(t)))).unwrap())
            .collect();
        event.create_cluster(hits).unwrap()
    });
    (event, ids)
}

fn fits(event: &Event, ids: &[ClusterId]) -> FitCache<SlidingLinearFit> {
    let mut cache = FitCache::new();
    cache
        .add_clusters(event, ids, &SlidingLinearFitter::default(), 15)
        .unwrap();
    cache
}

fn run_pass(
    config: &MatchingConfig,
    geometry: &dyn StereoGeometry,
    event: &Event,
    ids: [ClusterId; 3],
) -> MatchingStatistics {
    let cache = fits(event, &ids);
    TrackMatcher::new(config, geometry)
        .select_matched_tracks(event, &cache, &[ids[0]], &[ids[1]], &[ids[2]])
        .unwrap()
        .statistics
}

#[test]
fn test_fits_project_onto_third_view() {
    let (event, ids) = triple(15);
    let cache = fits(&event, &ids);
    let geometry = WireGeometry::default();

    for x in [0.3, 7.0, 14.6] {
        let u = cache.get(ids[0]).unwrap().position_at_x(x).unwrap();
        let v = cache.get(ids[1]).unwrap().position_at_x(x).unwrap();
        let merged = geometry.merge_two_positions(View::U, View::V, u, v).unwrap();
        let w: Position = geometry.project(View::W, merged.point);

        assert_relative_eq!(merged.chi2, 0.0);
        assert_relative_eq!(w.x, x, epsilon = 1e-9);
        assert_relative_eq!(w.z, diagonal(x).z, epsilon = 1e-9);
    }
}

#[test]
fn test_accepted_with_defaults() {
    let (event, ids) = triple(15);
    let stats = run_pass(
        &MatchingConfig::default(),
        &WireGeometry::default(),
        &event,
        ids,
    );
    assert_eq!(stats.pairs_considered, 1);
    assert_eq!(stats.matches, 1);
    assert_eq!(stats.recorded_hits, 16);
}

#[test]
fn test_hit_count_gate() {
    let (event, ids) = triple(15);
    let config = MatchingConfig::default().with_min_matched_hits(17);
    let stats = run_pass(&config, &WireGeometry::default(), &event, ids);
    assert_eq!(stats.rejected_hit_count, 1);
    assert_eq!(stats.matches, 0);
}

#[test]
fn test_isolated_hits_are_not_counted() {
    let (event, ids) = triple(15);
    // Neighbouring W hits are about 1.08 apart.
    let config = MatchingConfig::default().with_max_hit_displacement(1.0);
    let stats = run_pass(&config, &WireGeometry::default(), &event, ids);
    assert_eq!(stats.rejected_hit_count, 1);
}

#[test]
fn test_coverage_gate() {
    // W covers x in [0, 10] of a [0, 15] pair: about 76% of the samples.
    let (event, ids) = triple(10);
    let stats = run_pass(
        &MatchingConfig::default(),
        &WireGeometry::default(),
        &event,
        ids,
    );
    assert_eq!(stats.rejected_coverage, 1);

    let relaxed = MatchingConfig::default().with_min_matched_point_fraction(0.7);
    let stats = run_pass(&relaxed, &WireGeometry::default(), &event, ids);
    assert_eq!(stats.matches, 1);
}

#[test]
fn test_parallel_wires_give_no_projection() {
    let (event, ids) = triple(15);
    let geometry = WireGeometry::new(0.0, 0.0);
    let stats = run_pass(&MatchingConfig::default(), &geometry, &event, ids);
    assert_eq!(stats.rejected_no_projection, 1);
}

#[test]
fn test_overlap_gate() {
    let (event, ids) = triple(15);
    let config = MatchingConfig::default().with_min_x_overlap(20.0);
    let stats = run_pass(&config, &WireGeometry::default(), &event, ids);
    assert_eq!(stats.rejected_overlap, 1);
}
