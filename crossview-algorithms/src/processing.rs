//! Full three-view matching pipeline.

use crate::association::ViewAssociations;
use crate::fit_cache::FitCache;
use crate::matcher::{MatchingStatistics, TrackMatcher};
use crate::rewriter::{modify_clusters, RewriteSummary};
use crate::selector::{select_available_clusters, select_clean_clusters};
use crossview_core::{
    ClusterId, Event, InputListNames, MatchingConfig, MatchingError, Result, SlidingLinearFitter,
    StereoGeometry, TrajectoryFitter, View, WireGeometry,
};
use log::{info, warn};
use rayon::prelude::*;
use std::fmt;

/// Matching passes as `(view1, view2) -> view3`.
pub const VIEW_PASSES: [(View, View, View); 3] = [
    (View::U, View::V, View::W),
    (View::V, View::W, View::U),
    (View::W, View::U, View::V),
];

/// Per-view results of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ViewReport {
    /// The view had no available clusters and took no part in matching.
    pub skipped: bool,
    /// Number of available clusters.
    pub available_clusters: usize,
    /// Number of clean clusters.
    pub clean_clusters: usize,
    /// Counters of the pass harvesting this view.
    pub matching: MatchingStatistics,
    /// Associations harvested for this view.
    pub associations: ViewAssociations,
    /// Changes applied to the view's list.
    pub rewrite: RewriteSummary,
}

/// Results of one pipeline run, indexed by [`View::index`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProcessingReport {
    /// Reports for U, V and W.
    pub views: [ViewReport; 3],
    /// Number of trajectory fits built.
    pub fits: usize,
}

impl ProcessingReport {
    /// Report of one view.
    #[must_use]
    pub fn view(&self, view: View) -> &ViewReport {
        &self.views[view.index()]
    }

    /// Associations harvested for one view.
    #[must_use]
    pub fn associations(&self, view: View) -> &ViewAssociations {
        &self.views[view.index()].associations
    }
}

impl fmt::Display for ProcessingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trajectory fits: {}", self.fits)?;
        for view in View::ALL {
            let report = self.view(view);
            if report.skipped {
                writeln!(f, "View {view}: skipped (no available clusters)")?;
                continue;
            }
            writeln!(
                f,
                "View {view}: {} available, {} clean, {} pairs, {} matches, {} hits migrated, \
                 {} deleted, {} trimmed, {} created, {} ambiguous",
                report.available_clusters,
                report.clean_clusters,
                report.matching.pairs_considered,
                report.matching.matches,
                report.rewrite.hits_migrated,
                report.rewrite.clusters_deleted,
                report.rewrite.clusters_trimmed,
                report.rewrite.clusters_created,
                report.rewrite.ambiguous_hits
            )?;
        }
        Ok(())
    }
}

/// Cross-view track matching and cluster repair.
#[derive(Debug, Clone)]
pub struct CrossViewMatching<G = WireGeometry, T = SlidingLinearFitter> {
    config: MatchingConfig,
    list_names: InputListNames,
    geometry: G,
    fitter: T,
}

impl CrossViewMatching {
    /// Pipeline with wire geometry and a sliding linear fitter using the
    /// configured layer pitch.
    pub fn with_defaults(config: MatchingConfig, list_names: InputListNames) -> Result<Self> {
        let fitter = SlidingLinearFitter::new(config.sliding_fit_layer_pitch);
        Self::new(config, list_names, WireGeometry::default(), fitter)
    }
}

impl<G: StereoGeometry, T: TrajectoryFitter> CrossViewMatching<G, T> {
    /// Creates a pipeline after validating the configuration.
    pub fn new(
        config: MatchingConfig,
        list_names: InputListNames,
        geometry: G,
        fitter: T,
    ) -> Result<Self> {
        config.validate()?;
        list_names.validate()?;
        Ok(Self {
            config,
            list_names,
            geometry,
            fitter,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Input list names in use.
    pub fn list_names(&self) -> &InputListNames {
        &self.list_names
    }

    /// Runs selection, fitting, matching and rewriting for all views.
    pub fn run(&self, event: &mut Event) -> std::result::Result<ProcessingReport, MatchingError> {
        let mut report = self.match_views(event)?;
        self.rewrite_views(event, &mut report)?;
        Ok(report)
    }

    /// Runs selection, fitting and the three matching passes without
    /// modifying the event.
    pub fn match_views(&self, event: &Event) -> std::result::Result<ProcessingReport, MatchingError> {
        let mut report = ProcessingReport::default();
        let mut available: [Vec<ClusterId>; 3] = Default::default();
        let mut clean: [Vec<ClusterId>; 3] = Default::default();

        for view in View::ALL {
            let list_name = self.list_names.get(view);
            let view_report = &mut report.views[view.index()];
            match select_available_clusters(event, list_name) {
                Ok(ids) => available[view.index()] = ids,
                Err(MatchingError::NoAvailableClusters(name)) => {
                    warn!("view {view}: no available clusters in '{name}', skipping");
                    view_report.skipped = true;
                    continue;
                }
                Err(err) => return Err(err),
            }
            clean[view.index()] = select_clean_clusters(
                event,
                &available[view.index()],
                self.config.cluster_min_length,
            )?;
            view_report.available_clusters = available[view.index()].len();
            view_report.clean_clusters = clean[view.index()].len();
        }

        let mut fits = FitCache::new();
        for ids in &clean {
            report.fits += fits.add_clusters(
                event,
                ids,
                &self.fitter,
                self.config.sliding_fit_half_window,
            )?;
        }

        let matcher = TrackMatcher::new(&self.config, &self.geometry);
        let outcomes = VIEW_PASSES
            .par_iter()
            .map(|&(view1, view2, view3)| {
                matcher
                    .select_matched_tracks(
                        event,
                        &fits,
                        &clean[view1.index()],
                        &clean[view2.index()],
                        &available[view3.index()],
                    )
                    .map(|outcome| (view3, outcome))
            })
            .collect::<std::result::Result<Vec<_>, MatchingError>>()?;

        for (view, outcome) in outcomes {
            let view_report = &mut report.views[view.index()];
            view_report.matching = outcome.statistics;
            view_report.associations = outcome.associations;
        }
        Ok(report)
    }

    /// Applies each view's associations to its cluster list, U then V then W.
    pub fn rewrite_views(
        &self,
        event: &mut Event,
        report: &mut ProcessingReport,
    ) -> std::result::Result<(), MatchingError> {
        for view in View::ALL {
            let view_report = &mut report.views[view.index()];
            if view_report.skipped {
                continue;
            }
            view_report.rewrite = modify_clusters(
                event,
                self.list_names.get(view),
                &view_report.associations,
            )?;
        }
        info!(
            "rewrite complete: {} clusters in event",
            event.cluster_count()
        );
        Ok(())
    }
}
