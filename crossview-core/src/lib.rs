//! crossview-core: Core types for three-view cluster matching.
//!
//! This crate provides the event store (hits, clusters and named cluster
//! lists), the view geometry, trajectory fits and configuration shared by
//! the matching algorithms.
//!

pub mod clustering;
pub mod config;
pub mod error;
pub mod event;
pub mod fit;
pub mod geometry;
pub mod hit;

pub use clustering::{Cluster, ClusterId, ClusterStatus, Extent};
pub use config::{InputListNames, MatchingConfig};
pub use error::{Error, FitError, GeometryError, MatchingError, Result};
pub use event::Event;
pub use fit::{
    LayerFitPoint, SlidingLinearFit, SlidingLinearFitter, TrajectoryFit, TrajectoryFitter,
};
pub use geometry::{MergedPosition, Point3, Position, StereoGeometry, View, WireGeometry};
pub use hit::{Hit, HitId};
