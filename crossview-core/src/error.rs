//! Error types for crossview-core.

use crate::clustering::ClusterId;
use crate::geometry::View;
use crate::hit::HitId;
use thiserror::Error;

/// Result type alias for crossview event-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for event-store and configuration operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Unknown hit handle.
    #[error("hit {0} not found")]
    HitNotFound(HitId),

    /// Unknown or deleted cluster handle.
    #[error("cluster {0} not found")]
    ClusterNotFound(ClusterId),

    /// Unknown cluster list name.
    #[error("cluster list '{0}' not found")]
    ListNotFound(String),

    /// Hit is already owned by another cluster.
    #[error("hit {hit} already belongs to cluster {owner}")]
    HitAlreadyClustered { hit: HitId, owner: ClusterId },

    /// Attempt to build a cluster from no hits.
    #[error("cannot create a cluster without hits")]
    EmptyCluster,

    /// Hits from different views mixed in one cluster.
    #[error("hit {hit} is in view {found}, expected view {expected}")]
    ViewMismatch {
        hit: HitId,
        expected: View,
        found: View,
    },

    /// Hit is not a member of the cluster it is being removed from.
    #[error("hit {hit} is not a member of cluster {cluster}")]
    HitNotInCluster { hit: HitId, cluster: ClusterId },

    /// Removing the hit would leave an empty cluster; delete the cluster instead.
    #[error("removing hit {hit} would empty cluster {cluster}")]
    WouldEmptyCluster { hit: HitId, cluster: ClusterId },

    /// Every handle of the given kind is already in use.
    #[error("event store is full: no {0} handles left")]
    CapacityExceeded(&'static str),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

/// Failure to merge two view positions into a 3D point.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    /// Both positions come from the same view.
    #[error("cannot merge two positions from the same view {0}")]
    SameView(View),

    /// The two wire planes are parallel, so the merge is ill-conditioned.
    #[error("wire planes of views {0} and {1} are parallel")]
    ParallelWires(View, View),
}

/// Failure to build a trajectory fit for a cluster.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum FitError {
    /// The cluster has no hits.
    #[error("cannot fit cluster {0}: no hits")]
    EmptyCluster(ClusterId),

    /// The requested window is unusable.
    #[error("invalid sliding fit window: half window {half_window}, pitch {pitch}")]
    InvalidWindow { half_window: usize, pitch: f64 },
}

/// Errors raised by the matching and rewriting passes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchingError {
    /// A view yielded no available clusters. Recoverable per view.
    #[error("no available clusters in list '{0}'")]
    NoAvailableClusters(String),

    /// A fit was inserted twice for the same cluster.
    #[error("trajectory fit for cluster {0} already cached")]
    DuplicateFit(ClusterId),

    /// A claimed hit belongs to no cluster in the rewrite snapshot.
    #[error("claimed hit {0} belongs to no available cluster")]
    UnownedHit(HitId),

    /// A claimed hit belongs to more than one cluster in the rewrite snapshot.
    #[error("claimed hit {hit} belongs to {owners} clusters")]
    SharedHit { hit: HitId, owners: usize },

    /// A new cluster would be created without hits.
    #[error("match {0} has no hits to form a new cluster")]
    EmptyDestination(u32),

    /// Event-store failure, propagated verbatim.
    #[error("event error: {0}")]
    Event(#[from] Error),
}

impl MatchingError {
    /// Returns true for invariant violations that must abort processing.
    ///
    /// `NoAvailableClusters` only disables one view for the current event.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::NoAvailableClusters(_))
    }
}
