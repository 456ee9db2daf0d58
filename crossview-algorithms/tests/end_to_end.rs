#![allow(clippy::cast_precision_loss, clippy::uninlined_format_args)]
use crossview_algorithms::{
    CrossViewMatching, InputListNames, MatchId, MatchingConfig, ProcessingReport,
};
use crossview_core::{
    ClusterId, Event, HitId, Point3, StereoGeometry, View, WireGeometry,
};
use std::collections::{BTreeMap, BTreeSet};

const LISTS: [&str; 3] = ["ClustersU", "ClustersV", "ClustersW"];

fn list_names() -> InputListNames {
    InputListNames::new(LISTS[0], LISTS[1], LISTS[2])
}

fn pipeline() -> CrossViewMatching {
    CrossViewMatching::with_defaults(MatchingConfig::default(), list_names()).unwrap()
}

/// Hits of a 3D line projected into one view, one per parameter value.
fn project_line<L>(event: &mut Event, view: View, ts: &[f64], line: L) -> Vec<HitId>
where
    L: Fn(f64) -> Point3,
{
    let geometry = WireGeometry::default();
    ts.iter()
        .map(|&t| event.add_hit(view, geometry.project(view, line(t))).unwrap())
        .collect()
}

fn steps(from: f64, count: usize) -> Vec<f64> {
    (0..count).map(|i| from + i as f64).collect()
}

fn set_lists(event: &mut Event, lists: [Vec<ClusterId>; 3]) {
    for (name, ids) in LISTS.iter().zip(lists) {
        event.replace_cluster_list(name, ids).unwrap();
    }
}

fn hit_sets(event: &Event, view: View) -> BTreeSet<BTreeSet<HitId>> {
    event
        .clusters_in_list(LISTS[view.index()])
        .unwrap()
        .into_iter()
        .map(|(_, cluster)| cluster.hits().clone())
        .collect()
}

fn diagonal(t: f64) -> Point3 {
    Point3::new(t, 5.0 + 0.3 * t, 10.0 + 0.4 * t)
}

/// One straight track seen as one cluster in every view.
fn perfect_triple() -> (Event, [ClusterId; 3]) {
    let mut event = Event::new();
    let ts = steps(0.0, 16);
    let ids = View::ALL.map(|view| {
        let hits = project_line(&mut event, view, &ts, diagonal);
        event.create_cluster(hits).unwrap()
    });
    set_lists(&mut event, ids.map(|id| vec![id]));
    (event, ids)
}

#[test]
fn test_perfect_triple_is_unchanged() {
    let (mut event, ids) = perfect_triple();
    let before: Vec<_> = View::ALL.iter().map(|&v| hit_sets(&event, v)).collect();

    let report = pipeline().run(&mut event).unwrap();

    assert_eq!(report.fits, 3);
    for (view, id) in View::ALL.into_iter().zip(ids) {
        let view_report = report.view(view);
        assert!(!view_report.skipped);
        assert_eq!(view_report.matching.pairs_considered, 1);
        assert_eq!(view_report.matching.matches, 1, "view {}", view);

        let associations = report.associations(view);
        assert_eq!(associations.match_map().len(), 1);
        let claimed = associations.hits_for_match(MatchId(1)).unwrap();
        assert_eq!(claimed, event.cluster(id).unwrap().hits());

        assert!(view_report.rewrite.is_unchanged());
        assert_eq!(view_report.rewrite.clusters_retained, 1);
        assert_eq!(event.cluster_list(LISTS[view.index()]).unwrap(), &[id]);
    }
    let after: Vec<_> = View::ALL.iter().map(|&v| hit_sets(&event, v)).collect();
    assert_eq!(before, after);
    event.check_consistency().unwrap();
}

#[test]
fn test_wide_third_view_cluster_is_rejected() {
    let mut event = Event::new();
    let short = steps(0.0, 16);
    let wide = steps(-7.5, 31);
    let u = project_line(&mut event, View::U, &short, diagonal);
    let v = project_line(&mut event, View::V, &short, diagonal);
    let w = project_line(&mut event, View::W, &wide, diagonal);
    let ids = [u, v, w].map(|hits| event.create_cluster(hits).unwrap());
    set_lists(&mut event, ids.map(|id| vec![id]));

    let report = pipeline().run(&mut event).unwrap();

    let w_report = report.view(View::W);
    assert_eq!(w_report.matching.rejected_cluster_shape, 1);
    assert!(w_report.associations.is_empty());

    // Overlap fraction 15 / 30 against the wide cluster.
    assert_eq!(report.view(View::U).matching.rejected_overlap, 1);
    assert_eq!(report.view(View::V).matching.rejected_overlap, 1);

    for view in View::ALL {
        assert!(report.view(view).rewrite.is_unchanged());
    }
}

#[test]
fn test_shared_third_view_hit_is_ambiguous() {
    let mut event = Event::new();
    let ts = steps(0.0, 16);
    let first = |t: f64| Point3::new(t, 0.0, 20.0 + 0.2 * t);
    let second = |t: f64| Point3::new(t, 20.0, 22.0 + 0.2 * t);

    let mut lists: [Vec<ClusterId>; 3] = Default::default();
    for view in View::ALL {
        let a = project_line(&mut event, view, &ts, first);
        let b = project_line(&mut event, view, &ts, second);
        lists[view.index()].push(event.create_cluster(a).unwrap());
        lists[view.index()].push(event.create_cluster(b).unwrap());
    }
    // Halfway between the two tracks in W.
    let between = event
        .add_hit(View::W, crossview_core::Position::new(7.5, 22.5))
        .unwrap();
    let lone = event.create_cluster([between]).unwrap();
    lists[View::W.index()].push(lone);
    set_lists(&mut event, lists);

    let report = pipeline().run(&mut event).unwrap();

    let w_report = report.view(View::W);
    assert_eq!(w_report.matching.pairs_considered, 4);
    assert_eq!(w_report.matching.matches, 2);
    let claims: BTreeSet<MatchId> = w_report
        .associations
        .matches_for_hit(between)
        .unwrap()
        .clone();
    assert_eq!(claims, BTreeSet::from([MatchId(1), MatchId(4)]));

    assert_eq!(w_report.rewrite.ambiguous_hits, 1);
    assert_eq!(w_report.rewrite.clusters_retained, 2);
    assert!(w_report.rewrite.is_unchanged());
    assert_eq!(event.hit(between).unwrap().owner(), Some(lone));
    assert_eq!(event.cluster(lone).unwrap().len(), 1);
    event.check_consistency().unwrap();
}

#[test]
fn test_fragments_are_merged() {
    let mut event = Event::new();
    let ts = steps(0.0, 16);
    let u = project_line(&mut event, View::U, &ts, diagonal);
    let v = project_line(&mut event, View::V, &ts, diagonal);
    let w = project_line(&mut event, View::W, &ts, diagonal);
    let u_id = event.create_cluster(u).unwrap();
    let v_id = event.create_cluster(v).unwrap();
    let head = event.create_cluster(w[..8].to_vec()).unwrap();
    let tail = event.create_cluster(w[8..].to_vec()).unwrap();
    set_lists(&mut event, [vec![u_id], vec![v_id], vec![head, tail]]);

    let report = pipeline().run(&mut event).unwrap();

    let w_report = report.view(View::W);
    assert_eq!(w_report.clean_clusters, 0);
    assert_eq!(w_report.matching.matches, 1);
    assert_eq!(w_report.rewrite.clusters_deleted, 2);
    assert_eq!(w_report.rewrite.clusters_created, 1);
    assert_eq!(w_report.rewrite.hits_migrated, 16);

    assert!(event.cluster(head).is_err());
    assert!(event.cluster(tail).is_err());
    let merged: BTreeSet<HitId> = w.iter().copied().collect();
    assert_eq!(hit_sets(&event, View::W), BTreeSet::from([merged]));

    assert_eq!(event.cluster_list(LISTS[0]).unwrap(), &[u_id]);
    assert_eq!(event.cluster_list(LISTS[1]).unwrap(), &[v_id]);
    event.check_consistency().unwrap();
}

#[test]
fn test_fragments_merge_past_deleted_cluster() {
    let mut event = Event::new();
    let ts = steps(0.0, 16);
    let u = project_line(&mut event, View::U, &ts, diagonal);
    let v = project_line(&mut event, View::V, &ts, diagonal);
    let w = project_line(&mut event, View::W, &ts, diagonal);
    let far = project_line(&mut event, View::W, &steps(40.0, 4), diagonal);
    let u_id = event.create_cluster(u).unwrap();
    let v_id = event.create_cluster(v).unwrap();
    let head = event.create_cluster(w[..8].to_vec()).unwrap();
    let tail = event.create_cluster(w[8..].to_vec()).unwrap();
    let gone = event.create_cluster(far).unwrap();
    set_lists(&mut event, [vec![u_id], vec![v_id], vec![head, tail, gone]]);
    event.delete_cluster(gone).unwrap();

    let report = pipeline().run(&mut event).unwrap();

    let w_report = report.view(View::W);
    assert_eq!(w_report.rewrite.clusters_deleted, 2);
    assert_eq!(w_report.rewrite.clusters_created, 1);

    let w_list = event.cluster_list(LISTS[2]).unwrap();
    assert_eq!(w_list.len(), 1);
    assert!(![head, tail, gone].contains(&w_list[0]));
    let merged: BTreeSet<HitId> = w.iter().copied().collect();
    assert_eq!(hit_sets(&event, View::W), BTreeSet::from([merged]));
    event.check_consistency().unwrap();
}

#[test]
fn test_unbounded_fit_window() {
    let (mut event, ids) = perfect_triple();
    let before: Vec<_> = View::ALL.iter().map(|&v| hit_sets(&event, v)).collect();
    let config = MatchingConfig::default().with_sliding_fit_half_window(usize::MAX);
    let pipeline = CrossViewMatching::with_defaults(config, list_names()).unwrap();

    let report = pipeline.run(&mut event).unwrap();

    for (view, id) in View::ALL.into_iter().zip(ids) {
        assert_eq!(report.view(view).matching.matches, 1, "view {}", view);
        assert_eq!(event.cluster_list(LISTS[view.index()]).unwrap(), &[id]);
    }
    let after: Vec<_> = View::ALL.iter().map(|&v| hit_sets(&event, v)).collect();
    assert_eq!(before, after);
}

#[test]
fn test_stray_hits_are_split_off() {
    let mut event = Event::new();
    let ts = steps(0.0, 16);
    let u = project_line(&mut event, View::U, &ts, diagonal);
    let v = project_line(&mut event, View::V, &ts, diagonal);
    let track = project_line(&mut event, View::W, &ts, diagonal);
    let strays: Vec<HitId> = (3..8)
        .map(|x| {
            event
                .add_hit(View::W, crossview_core::Position::new(f64::from(x), 80.0))
                .unwrap()
        })
        .collect();
    let u_id = event.create_cluster(u).unwrap();
    let v_id = event.create_cluster(v).unwrap();
    let mixed = event
        .create_cluster(track.iter().chain(&strays).copied())
        .unwrap();
    set_lists(&mut event, [vec![u_id], vec![v_id], vec![mixed]]);

    let report = pipeline().run(&mut event).unwrap();

    let w_report = report.view(View::W);
    assert_eq!(w_report.rewrite.clusters_trimmed, 1);
    assert_eq!(w_report.rewrite.clusters_created, 1);
    assert_eq!(w_report.rewrite.hits_migrated, 16);

    let remaining: BTreeSet<HitId> = strays.iter().copied().collect();
    assert_eq!(event.cluster(mixed).unwrap().hits(), &remaining);

    let expected = BTreeSet::from([remaining, track.iter().copied().collect()]);
    assert_eq!(hit_sets(&event, View::W), expected);
    let w_list = event.cluster_list(LISTS[2]).unwrap();
    assert_eq!(w_list.len(), 2);
    assert_eq!(w_list[0], mixed);
    event.check_consistency().unwrap();
}

#[test]
fn test_empty_view_is_skipped() {
    let (mut event, ids) = perfect_triple();
    event.replace_cluster_list(LISTS[2], Vec::new()).unwrap();

    let report = pipeline().run(&mut event).unwrap();

    assert!(report.view(View::W).skipped);
    for view in View::ALL {
        assert!(report.associations(view).is_empty());
    }
    assert_eq!(event.cluster_list(LISTS[0]).unwrap(), &[ids[0]]);
    assert_eq!(event.cluster_list(LISTS[1]).unwrap(), &[ids[1]]);
}

#[test]
fn test_missing_list_is_error() {
    let (mut event, _) = perfect_triple();
    let names = InputListNames::new(LISTS[0], LISTS[1], "Elsewhere");
    let pipeline = CrossViewMatching::with_defaults(MatchingConfig::default(), names).unwrap();
    assert!(pipeline.run(&mut event).is_err());
}

#[test]
fn test_runs_are_deterministic() {
    let (event, _) = perfect_triple();
    let mut first = event.clone();
    let mut second = event;

    let pipeline = pipeline();
    let report_a: ProcessingReport = pipeline.run(&mut first).unwrap();
    let report_b: ProcessingReport = pipeline.run(&mut second).unwrap();
    assert_eq!(report_a, report_b);

    let lists = |event: &Event| -> BTreeMap<String, Vec<ClusterId>> {
        LISTS
            .iter()
            .map(|name| (name.to_string(), event.cluster_list(name).unwrap().to_vec()))
            .collect()
    };
    assert_eq!(lists(&first), lists(&second));
    for view in View::ALL {
        assert_eq!(hit_sets(&first, view), hit_sets(&second, view));
    }
}

#[test]
fn test_second_run_is_stable() {
    let mut event = Event::new();
    let ts = steps(0.0, 16);
    let u = project_line(&mut event, View::U, &ts, diagonal);
    let v = project_line(&mut event, View::V, &ts, diagonal);
    let w = project_line(&mut event, View::W, &ts, diagonal);
    let u_id = event.create_cluster(u).unwrap();
    let v_id = event.create_cluster(v).unwrap();
    let head = event.create_cluster(w[..8].to_vec()).unwrap();
    let tail = event.create_cluster(w[8..].to_vec()).unwrap();
    set_lists(&mut event, [vec![u_id], vec![v_id], vec![head, tail]]);

    let pipeline = pipeline();
    pipeline.run(&mut event).unwrap();
    let after_first: Vec<_> = View::ALL.iter().map(|&v| hit_sets(&event, v)).collect();

    let report = pipeline.run(&mut event).unwrap();
    for view in View::ALL {
        assert!(report.view(view).rewrite.is_unchanged(), "view {}", view);
    }
    let after_second: Vec<_> = View::ALL.iter().map(|&v| hit_sets(&event, v)).collect();
    assert_eq!(after_first, after_second);
}
