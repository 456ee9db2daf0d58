//! Views, coordinates and the stereo geometry that links them.
//!
//! Every view measures the shared drift coordinate `x` plus one wire
//! coordinate. The wire coordinate of view `v` is
//! `z * cos(theta_v) + y * sin(theta_v)`, so any two distinct views fix a
//! 3D point and therefore its projection into the remaining view.
#![allow(clippy::must_use_candidate)]

use crate::error::GeometryError;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the three wire-plane views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum View {
    /// First induction plane.
    U,
    /// Second induction plane.
    V,
    /// Collection plane.
    W,
}

impl View {
    /// All views in canonical order.
    pub const ALL: [View; 3] = [View::U, View::V, View::W];

    /// Returns the view that is neither `a` nor `b`, if they differ.
    pub fn third(a: View, b: View) -> Option<View> {
        if a == b {
            return None;
        }
        View::ALL.into_iter().find(|&v| v != a && v != b)
    }

    /// Position in [`View::ALL`].
    #[inline]
    pub fn index(self) -> usize {
        match self {
            View::U => 0,
            View::V => 1,
            View::W => 2,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            View::U => "U",
            View::V => "V",
            View::W => "W",
        };
        f.write_str(name)
    }
}

/// 2D position in a view: drift coordinate `x` and wire coordinate `z`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    /// Drift coordinate, shared by all views.
    pub x: f64,
    /// Wire coordinate of the view.
    pub z: f64,
}

impl Position {
    /// Creates a new position.
    #[inline]
    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    /// Squared Euclidean distance to another position.
    #[inline]
    pub fn distance_squared(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx * dx + dz * dz
    }
}

/// 3D detector point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Point3 {
    /// Drift coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
    /// Beam coordinate.
    pub z: f64,
}

impl Point3 {
    /// Creates a new 3D point.
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Result of merging two view positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergedPosition {
    /// Reconstructed 3D point.
    pub point: Point3,
    /// Consistency of the two inputs; zero for identical drift coordinates.
    pub chi2: f64,
}

/// Two-view stereo merge and projection back into a view.
pub trait StereoGeometry: Send + Sync {
    /// Merges positions seen in two different views into one 3D point.
    fn merge_two_positions(
        &self,
        view1: View,
        view2: View,
        position1: Position,
        position2: Position,
    ) -> Result<MergedPosition, GeometryError>;

    /// Projects a 3D point into the given view.
    fn project(&self, view: View, point: Point3) -> Position;
}

/// Wire-plane geometry with configurable induction-plane angles.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WireGeometry {
    /// Angle of the U wires from vertical (radians).
    pub theta_u: f64,
    /// Angle of the V wires from vertical (radians).
    pub theta_v: f64,
    /// Single-hit resolution used to scale the merge chi-squared.
    pub hit_resolution: f64,
}

impl Default for WireGeometry {
    fn default() -> Self {
        Self {
            theta_u: std::f64::consts::FRAC_PI_3,
            theta_v: std::f64::consts::FRAC_PI_3,
            hit_resolution: 0.5,
        }
    }
}

impl WireGeometry {
    /// Creates a geometry with the given wire angles (radians).
    pub fn new(theta_u: f64, theta_v: f64) -> Self {
        Self {
            theta_u,
            theta_v,
            ..Self::default()
        }
    }

    /// Sets the hit resolution.
    #[must_use]
    pub fn with_hit_resolution(mut self, resolution: f64) -> Self {
        self.hit_resolution = resolution;
        self
    }

    /// Signed wire angle of a view.
    #[inline]
    fn angle(&self, view: View) -> f64 {
        match view {
            View::U => -self.theta_u,
            View::V => self.theta_v,
            View::W => 0.0,
        }
    }

    /// Wire coordinate of `(y, z)` in the given view.
    #[inline]
    pub fn wire_coordinate(&self, view: View, y: f64, z: f64) -> f64 {
        let theta = self.angle(view);
        z * theta.cos() + y * theta.sin()
    }
}

impl StereoGeometry for WireGeometry {
    fn merge_two_positions(
        &self,
        view1: View,
        view2: View,
        position1: Position,
        position2: Position,
    ) -> Result<MergedPosition, GeometryError> {
        if view1 == view2 {
            return Err(GeometryError::SameView(view1));
        }

        let (s1, c1) = self.angle(view1).sin_cos();
        let (s2, c2) = self.angle(view2).sin_cos();

        // [c1 s1; c2 s2] * [z; y] = [w1; w2]
        let det = c1 * s2 - s1 * c2;
        if det.abs() < 1e-9 {
            return Err(GeometryError::ParallelWires(view1, view2));
        }

        let z = (position1.z * s2 - position2.z * s1) / det;
        let y = (c1 * position2.z - c2 * position1.z) / det;
        let x = 0.5 * (position1.x + position2.x);

        let dx = position1.x - position2.x;
        let chi2 = dx * dx / (self.hit_resolution * self.hit_resolution);

        Ok(MergedPosition {
            point: Point3::new(x, y, z),
            chi2,
        })
    }

    fn project(&self, view: View, point: Point3) -> Position {
        Position::new(point.x, self.wire_coordinate(view, point.y, point.z))
    }
}
