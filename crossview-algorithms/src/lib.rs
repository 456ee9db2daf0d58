//! crossview-algorithms: Three-view track matching and cluster repair.
//!
//! This crate provides the stages of the matching pipeline:
//! - **Selection** - available and clean clusters per view
//! - **Fit cache** - one trajectory fit per clean cluster, built in parallel
//! - **Matcher** - pairwise matching with projection into the third view
//! - **Rewriter** - rebuilds a view's clusters from match claims
//!
#![warn(missing_docs)]

mod association;
mod fit_cache;
mod matcher;
mod processing;
mod rewriter;
mod selector;

pub use association::{MatchId, MatchIdSequence, ViewAssociations};
pub use fit_cache::FitCache;
pub use matcher::{
    passes_coverage, passes_overlap, x_overlap, MatchOutcome, MatchingStatistics, Rejection,
    TrackMatcher,
};
pub use processing::{CrossViewMatching, ProcessingReport, ViewReport, VIEW_PASSES};
pub use rewriter::{modify_clusters, RewriteSummary};
pub use selector::{select_available_clusters, select_clean_clusters};

// Re-export core matching types
pub use crossview_core::{InputListNames, MatchingConfig, MatchingError};
