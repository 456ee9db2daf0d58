//! Matching configuration.

use crate::error::{Error, Result};
use crate::geometry::View;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Thresholds for cluster selection, pairwise matching and fitting.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MatchingConfig {
    /// Minimum cluster length for a cluster to be "clean".
    pub cluster_min_length: f64,
    /// Half window (in layers) of the sliding trajectory fit.
    pub sliding_fit_half_window: usize,
    /// Layer pitch of the sliding trajectory fit.
    pub sliding_fit_layer_pitch: f64,
    /// Minimum drift-coordinate overlap between two matched clusters.
    pub min_x_overlap: f64,
    /// Minimum ratio of overlap to combined span.
    pub min_x_overlap_fraction: f64,
    /// Number of projected sample points per cluster pair.
    pub n_sampling_points: usize,
    /// Maximum distance between a hit and a projected point.
    pub max_point_displacement: f64,
    /// Maximum distance between two corroborating hits.
    pub max_hit_displacement: f64,
    /// Minimum fraction of sample points that must be corroborated.
    pub min_matched_point_fraction: f64,
    /// Minimum number of matched hits for a pair to be accepted.
    pub min_matched_hits: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            cluster_min_length: 10.0,
            sliding_fit_half_window: 15,
            sliding_fit_layer_pitch: 0.5,
            min_x_overlap: 3.0,
            min_x_overlap_fraction: 0.8,
            n_sampling_points: 100,
            max_point_displacement: 1.5,
            max_hit_displacement: 5.0,
            min_matched_point_fraction: 0.8,
            min_matched_hits: 10,
        }
    }
}

impl MatchingConfig {
    /// Creates a configuration with default thresholds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the clean-cluster minimum length.
    #[must_use]
    pub fn with_cluster_min_length(mut self, length: f64) -> Self {
        self.cluster_min_length = length;
        self
    }

    /// Sets the sliding fit half window.
    #[must_use]
    pub fn with_sliding_fit_half_window(mut self, half_window: usize) -> Self {
        self.sliding_fit_half_window = half_window;
        self
    }

    /// Sets the minimum absolute drift overlap.
    #[must_use]
    pub fn with_min_x_overlap(mut self, overlap: f64) -> Self {
        self.min_x_overlap = overlap;
        self
    }

    /// Sets the minimum overlap fraction.
    #[must_use]
    pub fn with_min_x_overlap_fraction(mut self, fraction: f64) -> Self {
        self.min_x_overlap_fraction = fraction;
        self
    }

    /// Sets the number of sample points.
    #[must_use]
    pub fn with_n_sampling_points(mut self, n: usize) -> Self {
        self.n_sampling_points = n;
        self
    }

    /// Sets the point displacement threshold.
    #[must_use]
    pub fn with_max_point_displacement(mut self, displacement: f64) -> Self {
        self.max_point_displacement = displacement;
        self
    }

    /// Sets the hit displacement threshold.
    #[must_use]
    pub fn with_max_hit_displacement(mut self, displacement: f64) -> Self {
        self.max_hit_displacement = displacement;
        self
    }

    /// Sets the minimum matched point fraction.
    #[must_use]
    pub fn with_min_matched_point_fraction(mut self, fraction: f64) -> Self {
        self.min_matched_point_fraction = fraction;
        self
    }

    /// Sets the minimum matched hit count.
    #[must_use]
    pub fn with_min_matched_hits(mut self, hits: usize) -> Self {
        self.min_matched_hits = hits;
        self
    }

    /// Checks that every threshold is usable.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("cluster_min_length", self.cluster_min_length),
            ("sliding_fit_layer_pitch", self.sliding_fit_layer_pitch),
            ("max_point_displacement", self.max_point_displacement),
            ("max_hit_displacement", self.max_hit_displacement),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::ConfigError(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        if !(self.min_x_overlap.is_finite() && self.min_x_overlap >= 0.0) {
            return Err(Error::ConfigError(format!(
                "min_x_overlap must be non-negative, got {}",
                self.min_x_overlap
            )));
        }

        let fractions = [
            ("min_x_overlap_fraction", self.min_x_overlap_fraction),
            ("min_matched_point_fraction", self.min_matched_point_fraction),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::ConfigError(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }

        if self.n_sampling_points == 0 {
            return Err(Error::ConfigError(
                "n_sampling_points must be at least 1".into(),
            ));
        }
        if self.sliding_fit_half_window == 0 {
            return Err(Error::ConfigError(
                "sliding_fit_half_window must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Names of the input cluster list of each view.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InputListNames {
    /// List holding the U-view clusters.
    pub u: String,
    /// List holding the V-view clusters.
    pub v: String,
    /// List holding the W-view clusters.
    pub w: String,
}

impl InputListNames {
    /// Creates the list names.
    pub fn new(u: impl Into<String>, v: impl Into<String>, w: impl Into<String>) -> Self {
        Self {
            u: u.into(),
            v: v.into(),
            w: w.into(),
        }
    }

    /// List name of a view.
    #[must_use]
    pub fn get(&self, view: View) -> &str {
        match view {
            View::U => &self.u,
            View::V => &self.v,
            View::W => &self.w,
        }
    }

    /// Rejects empty or repeated names.
    pub fn validate(&self) -> Result<()> {
        for view in View::ALL {
            if self.get(view).is_empty() {
                return Err(Error::ConfigError(format!(
                    "input cluster list name for view {view} is empty"
                )));
            }
        }
        if self.u == self.v || self.v == self.w || self.w == self.u {
            return Err(Error::ConfigError(
                "input cluster list names must be distinct".into(),
            ));
        }
        Ok(())
    }
}
