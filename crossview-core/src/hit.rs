//! Hit handles and hit data.

use crate::clustering::ClusterId;
use crate::geometry::{Position, View};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable handle of a hit within one [`Event`](crate::Event).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HitId(pub u32);

impl HitId {
    /// Arena index of the hit.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for HitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

/// A single wire-plane measurement.
///
/// The position never changes. Ownership is managed by the event store:
/// a hit is available until a cluster takes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    view: View,
    position: Position,
    owner: Option<ClusterId>,
}

impl Hit {
    pub(crate) fn new(view: View, position: Position) -> Self {
        Self {
            view,
            position,
            owner: None,
        }
    }

    /// View this hit was recorded in.
    #[inline]
    #[must_use]
    pub fn view(&self) -> View {
        self.view
    }

    /// Position in the view's coordinate system.
    #[inline]
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Cluster currently holding the hit.
    #[inline]
    #[must_use]
    pub fn owner(&self) -> Option<ClusterId> {
        self.owner
    }

    /// True when no cluster holds the hit.
    #[inline]
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.owner.is_none()
    }

    pub(crate) fn set_owner(&mut self, owner: Option<ClusterId>) {
        self.owner = owner;
    }
}
