//! Cluster handles, cluster data and cluster extents.

use crate::geometry::{Position, View};
use crate::hit::HitId;
use std::collections::BTreeSet;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable handle of a cluster within one [`Event`](crate::Event).
///
/// Handles of deleted clusters are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterId(pub u32);

impl ClusterId {
    /// Arena slot of the cluster.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Whether a cluster may still be used by this stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ClusterStatus {
    /// Free for matching and rewriting.
    #[default]
    Available,
    /// Already taken by downstream processing.
    Consumed,
}

/// A group of hits from one view believed to come from one trajectory segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    view: View,
    hits: BTreeSet<HitId>,
    status: ClusterStatus,
}

impl Cluster {
    pub(crate) fn new(view: View, hits: BTreeSet<HitId>) -> Self {
        Self {
            view,
            hits,
            status: ClusterStatus::Available,
        }
    }

    /// View of the cluster's hits.
    #[inline]
    #[must_use]
    pub fn view(&self) -> View {
        self.view
    }

    /// Member hits in handle order.
    #[inline]
    #[must_use]
    pub fn hits(&self) -> &BTreeSet<HitId> {
        &self.hits
    }

    /// Returns the number of hits in the cluster.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Returns true if the cluster has no hits.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Returns true if the hit is a member.
    #[inline]
    #[must_use]
    pub fn contains(&self, hit: HitId) -> bool {
        self.hits.contains(&hit)
    }

    /// Current status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> ClusterStatus {
        self.status
    }

    /// True if downstream processing has not consumed the cluster.
    #[inline]
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == ClusterStatus::Available
    }

    pub(crate) fn set_status(&mut self, status: ClusterStatus) {
        self.status = status;
    }

    pub(crate) fn remove(&mut self, hit: HitId) -> bool {
        self.hits.remove(&hit)
    }
}

/// Axis-aligned bounding box of a set of view positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    /// Smallest drift coordinate.
    pub min_x: f64,
    /// Largest drift coordinate.
    pub max_x: f64,
    /// Smallest wire coordinate.
    pub min_z: f64,
    /// Largest wire coordinate.
    pub max_z: f64,
}

impl Extent {
    /// Bounding box of the positions, or `None` if there are none.
    pub fn from_positions<I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = Position>,
    {
        let mut iter = positions.into_iter();
        let first = iter.next()?;
        let init = Self {
            min_x: first.x,
            max_x: first.x,
            min_z: first.z,
            max_z: first.z,
        };
        Some(iter.fold(init, |acc, p| Self {
            min_x: acc.min_x.min(p.x),
            max_x: acc.max_x.max(p.x),
            min_z: acc.min_z.min(p.z),
            max_z: acc.max_z.max(p.z),
        }))
    }

    /// Width along the drift coordinate.
    #[inline]
    #[must_use]
    pub fn span_x(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Squared length of the bounding-box diagonal.
    #[inline]
    #[must_use]
    pub fn length_squared(&self) -> f64 {
        let dx = self.max_x - self.min_x;
        let dz = self.max_z - self.min_z;
        dx * dx + dz * dz
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cluster_operations() {
        let hits: BTreeSet<HitId> = [HitId(0), HitId(1), HitId(2)].into_iter().collect();
        let mut cluster = Cluster::new(View::W, hits);

        assert_eq!(cluster.len(), 3);
        assert!(cluster.contains(HitId(1)));
        assert!(cluster.is_available());

        assert!(cluster.remove(HitId(1)));
        assert!(!cluster.remove(HitId(1)));
        assert_eq!(cluster.len(), 2);

        cluster.set_status(ClusterStatus::Consumed);
        assert!(!cluster.is_available());
    }

    #[test]
    fn test_extent() {
        let extent = Extent::from_positions([
            Position::new(1.0, 2.0),
            Position::new(4.0, -2.0),
            Position::new(2.0, 0.0),
        ])
        .unwrap();

        assert_relative_eq!(extent.span_x(), 3.0);
        assert_relative_eq!(extent.length_squared(), 25.0);
        assert!(Extent::from_positions(std::iter::empty()).is_none());
    }
}
