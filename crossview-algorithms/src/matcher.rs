//! Pairwise track matching across views.
//!
//! For every pair of clean clusters from two views the shared drift range
//! is sampled, both trajectory fits are merged into 3D at each sample and
//! the result is projected into the third view. Third-view hits close to
//! the projection corroborate the pair; a series of gates decides whether
//! the corroboration is convincing enough to record.
#![allow(
    clippy::cast_precision_loss,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]

use crate::association::{MatchIdSequence, ViewAssociations};
use crate::fit_cache::FitCache;
use crossview_core::{
    ClusterId, Error, Event, HitId, MatchingConfig, MatchingError, Position, StereoGeometry,
    TrajectoryFit, View,
};
use log::{debug, info};
use std::collections::BTreeMap;

/// Counters for one matching pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MatchingStatistics {
    /// Cluster pairs with fits on both sides.
    pub pairs_considered: usize,
    /// Pairs failing the drift-overlap gate.
    pub rejected_overlap: usize,
    /// Pairs without any projected sample point.
    pub rejected_no_projection: usize,
    /// Pairs corroborated by a third-view cluster longer than the pair.
    pub rejected_cluster_shape: usize,
    /// Pairs with too few matched hits.
    pub rejected_hit_count: usize,
    /// Pairs explaining too few sample points.
    pub rejected_coverage: usize,
    /// Accepted pairs.
    pub matches: usize,
    /// Recorded `(hit, match)` pairings.
    pub recorded_hits: usize,
}

impl MatchingStatistics {
    fn reject(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::Overlap => self.rejected_overlap += 1,
            Rejection::NoProjection => self.rejected_no_projection += 1,
            Rejection::ClusterShape => self.rejected_cluster_shape += 1,
            Rejection::HitCount => self.rejected_hit_count += 1,
            Rejection::Coverage => self.rejected_coverage += 1,
        }
    }
}

/// Why a cluster pair was not matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Too little drift overlap between the two clusters.
    Overlap,
    /// No sample could be fitted and merged.
    NoProjection,
    /// A corroborating cluster spans more than the pair.
    ClusterShape,
    /// Fewer matched hits than required.
    HitCount,
    /// Too small a fraction of sample points explained.
    Coverage,
}

/// Associations and counters produced by one matching pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchOutcome {
    /// View whose hits were harvested, if the pass ran.
    pub target_view: Option<View>,
    /// Hit/match associations for the harvested view.
    pub associations: ViewAssociations,
    /// Gate counters.
    pub statistics: MatchingStatistics,
}

/// Drift overlap and combined span of two `(min, max)` ranges.
#[must_use]
pub fn x_overlap(span1: (f64, f64), span2: (f64, f64)) -> (f64, f64) {
    let overlap = span1.1.min(span2.1) - span1.0.max(span2.0);
    let span = span1.1.max(span2.1) - span1.0.min(span2.0);
    (overlap, span)
}

/// Overlap gate: a pair is rejected when its overlap or its overlap fraction
/// falls below the threshold.
///
/// Two clusters at a single drift position have no defined fraction, so only
/// the absolute overlap is checked for them.
#[must_use]
pub fn passes_overlap(span1: (f64, f64), span2: (f64, f64), config: &MatchingConfig) -> bool {
    let (overlap, span) = x_overlap(span1, span2);
    !(overlap < config.min_x_overlap || overlap / span < config.min_x_overlap_fraction)
}

/// Coverage gate on the number of corroborated sample points.
#[must_use]
pub fn passes_coverage(matched_points: usize, total_points: usize, config: &MatchingConfig) -> bool {
    total_points > 0
        && matched_points as f64 / total_points as f64 >= config.min_matched_point_fraction
}

/// Third-view cluster prepared for proximity searches.
struct Candidate {
    span_x: f64,
    hits: Vec<(HitId, Position)>,
}

/// One side of a tested pair.
struct PairSide<'f, F> {
    view: View,
    fit: &'f F,
    span: (f64, f64),
}

/// Matches clusters of two views against a third.
pub struct TrackMatcher<'a> {
    config: &'a MatchingConfig,
    geometry: &'a dyn StereoGeometry,
}

impl<'a> TrackMatcher<'a> {
    /// Creates a matcher.
    pub fn new(config: &'a MatchingConfig, geometry: &'a dyn StereoGeometry) -> Self {
        Self { config, geometry }
    }

    /// Tests every pair from `clusters1` x `clusters2` against `clusters3`.
    ///
    /// Pairs without a cached fit on both sides are skipped and get no
    /// identifier. Does nothing if any input is empty or the inputs do not
    /// come from three distinct views.
    pub fn select_matched_tracks<F: TrajectoryFit>(
        &self,
        event: &Event,
        fits: &FitCache<F>,
        clusters1: &[ClusterId],
        clusters2: &[ClusterId],
        clusters3: &[ClusterId],
    ) -> Result<MatchOutcome, MatchingError> {
        let mut outcome = MatchOutcome::default();

        let (Some(&first1), Some(&first2), Some(&first3)) =
            (clusters1.first(), clusters2.first(), clusters3.first())
        else {
            return Ok(outcome);
        };

        let view1 = event.cluster(first1)?.view();
        let view2 = event.cluster(first2)?.view();
        let view3 = event.cluster(first3)?.view();
        if view1 == view2 || view2 == view3 || view3 == view1 {
            return Ok(outcome);
        }
        outcome.target_view = Some(view3);

        let candidates = clusters3
            .iter()
            .map(|&id| {
                Ok(Candidate {
                    span_x: event.cluster_extent(id)?.span_x(),
                    hits: event.cluster_positions(id)?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        let sides1 = Self::sides(event, fits, clusters1, view1)?;
        let sides2 = Self::sides(event, fits, clusters2, view2)?;

        let mut ids = MatchIdSequence::new();
        for side1 in &sides1 {
            for side2 in &sides2 {
                let match_id = ids.next_id();
                outcome.statistics.pairs_considered += 1;

                match self.match_pair(side1, side2, view3, &candidates) {
                    Ok(hits) => {
                        debug!(
                            "{match_id}: clusters {} ({}) and {} ({}) matched {} hits in view {view3}",
                            side1.fit.cluster_id(),
                            side1.view,
                            side2.fit.cluster_id(),
                            side2.view,
                            hits.len()
                        );
                        outcome.statistics.matches += 1;
                        outcome.statistics.recorded_hits += hits.len();
                        for hit in hits.into_keys() {
                            outcome.associations.record(match_id, hit);
                        }
                    }
                    Err(rejection) => {
                        debug!(
                            "{match_id}: clusters {} and {} rejected ({rejection:?})",
                            side1.fit.cluster_id(),
                            side2.fit.cluster_id()
                        );
                        outcome.statistics.reject(rejection);
                    }
                }
            }
        }

        info!(
            "views ({view1}, {view2}) -> {view3}: {} pairs, {} matches, {} hit associations",
            outcome.statistics.pairs_considered,
            outcome.statistics.matches,
            outcome.statistics.recorded_hits
        );
        Ok(outcome)
    }

    fn sides<'f, F: TrajectoryFit>(
        event: &Event,
        fits: &'f FitCache<F>,
        clusters: &[ClusterId],
        view: View,
    ) -> Result<Vec<PairSide<'f, F>>, MatchingError> {
        let mut sides = Vec::with_capacity(clusters.len());
        for &id in clusters {
            let Some(fit) = fits.get(id) else { continue };
            sides.push(PairSide {
                view,
                fit,
                span: event.cluster_span_x(id)?,
            });
        }
        Ok(sides)
    }

    /// Runs all gates for one pair and returns the matched third-view hits.
    fn match_pair<F: TrajectoryFit>(
        &self,
        side1: &PairSide<'_, F>,
        side2: &PairSide<'_, F>,
        view3: View,
        candidates: &[Candidate],
    ) -> Result<BTreeMap<HitId, Position>, Rejection> {
        let config = self.config;
        let (min1, max1) = side1.span;
        let (min2, max2) = side2.span;

        if !passes_overlap(side1.span, side2.span, config) {
            return Err(Rejection::Overlap);
        }

        let projected = self.project_samples(side1, side2, view3, min1.max(min2), max1.min(max2));
        if projected.is_empty() {
            return Err(Rejection::NoProjection);
        }

        let max_point_sq = config.max_point_displacement * config.max_point_displacement;
        let near_projection =
            |position: &Position| projected.iter().any(|p| position.distance_squared(p) < max_point_sq);

        let mut associated_hits = BTreeMap::new();
        let mut longest_associated = f64::NEG_INFINITY;
        for candidate in candidates {
            let mut is_associated = false;
            for &(hit, position) in &candidate.hits {
                if near_projection(&position) {
                    associated_hits.insert(hit, position);
                    is_associated = true;
                }
            }
            if is_associated {
                longest_associated = longest_associated.max(candidate.span_x);
            }
        }

        if longest_associated > (max1 - min1).min(max2 - min2) {
            return Err(Rejection::ClusterShape);
        }

        let max_hit_sq = config.max_hit_displacement * config.max_hit_displacement;
        let matched_hits: BTreeMap<HitId, Position> = associated_hits
            .iter()
            .filter(|&(hit, position)| {
                associated_hits
                    .iter()
                    .any(|(other, p)| other != hit && position.distance_squared(p) < max_hit_sq)
            })
            .map(|(&hit, &position)| (hit, position))
            .collect();

        if matched_hits.len() < config.min_matched_hits {
            return Err(Rejection::HitCount);
        }

        let matched_points = projected
            .iter()
            .filter(|p| {
                matched_hits
                    .values()
                    .any(|position| position.distance_squared(p) < max_point_sq)
            })
            .count();

        if !passes_coverage(matched_points, projected.len(), config) {
            return Err(Rejection::Coverage);
        }

        Ok(matched_hits)
    }

    /// Samples `[x_min, x_max]` at sub-interval midpoints and projects the
    /// merged 3D positions into `view3`. Samples either fit does not cover,
    /// or the geometry cannot merge, are dropped.
    fn project_samples<F: TrajectoryFit>(
        &self,
        side1: &PairSide<'_, F>,
        side2: &PairSide<'_, F>,
        view3: View,
        x_min: f64,
        x_max: f64,
    ) -> Vec<Position> {
        let n = self.config.n_sampling_points;
        (0..n)
            .filter_map(|i| {
                let alpha = (i as f64 + 0.5) / n as f64;
                let x = x_min + alpha * (x_max - x_min);
                let position1 = side1.fit.position_at_x(x)?;
                let position2 = side2.fit.position_at_x(x)?;
                let merged = self
                    .geometry
                    .merge_two_positions(side1.view, side2.view, position1, position2)
                    .ok()?;
                Some(self.geometry.project(view3, merged.point))
            })
            .collect()
    }
}
