//! Sliding-window linear trajectory fits.
//!
//! A cluster is described in its own principal-axis frame: `l` runs along
//! the axis and `t` across it. Hits are binned into layers of fixed pitch
//! along `l` and each occupied layer gets a straight-line fit of `t(l)`
//! using every hit within `half_window` layers of it. Positions along the
//! drift coordinate are read off the chain of layer fit positions.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_possible_wrap,
    clippy::must_use_candidate
)]

use crate::clustering::ClusterId;
use crate::error::FitError;
use crate::geometry::Position;
use std::collections::BTreeMap;

const EPSILON: f64 = 1e-9;

/// Smooth local description of one cluster.
pub trait TrajectoryFit: Send + Sync {
    /// Cluster the fit was built from.
    fn cluster_id(&self) -> ClusterId;

    /// Fitted position at drift coordinate `x`, if the fit covers it.
    fn position_at_x(&self, x: f64) -> Option<Position>;
}

/// Builds trajectory fits from cluster hit positions.
pub trait TrajectoryFitter: Send + Sync {
    /// Fit type produced.
    type Fit: TrajectoryFit;

    /// Fits the hits of one cluster.
    fn fit(
        &self,
        cluster_id: ClusterId,
        positions: &[Position],
        half_window: usize,
    ) -> Result<Self::Fit, FitError>;
}

/// Fitter producing [`SlidingLinearFit`]s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlidingLinearFitter {
    /// Layer pitch along the cluster axis.
    pub layer_pitch: f64,
}

impl Default for SlidingLinearFitter {
    fn default() -> Self {
        Self { layer_pitch: 0.5 }
    }
}

impl SlidingLinearFitter {
    /// Creates a fitter with the given layer pitch.
    pub fn new(layer_pitch: f64) -> Self {
        Self { layer_pitch }
    }
}

impl TrajectoryFitter for SlidingLinearFitter {
    type Fit = SlidingLinearFit;

    fn fit(
        &self,
        cluster_id: ClusterId,
        positions: &[Position],
        half_window: usize,
    ) -> Result<SlidingLinearFit, FitError> {
        SlidingLinearFit::new(cluster_id, positions, half_window, self.layer_pitch)
    }
}

/// Fit result for one occupied layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerFitPoint {
    /// Layer index along the axis.
    pub layer: i64,
    /// Longitudinal coordinate of the layer centre.
    pub l: f64,
    /// Fitted transverse coordinate at the layer centre.
    pub t: f64,
    /// Local slope `dt/dl`.
    pub gradient: f64,
    /// Fitted position in view coordinates.
    pub position: Position,
}

#[derive(Debug, Clone, Copy, Default)]
struct LayerSums {
    n: f64,
    sum_l: f64,
    sum_t: f64,
    sum_ll: f64,
    sum_lt: f64,
}

impl LayerSums {
    fn add(&mut self, l: f64, t: f64) {
        self.n += 1.0;
        self.sum_l += l;
        self.sum_t += t;
        self.sum_ll += l * l;
        self.sum_lt += l * t;
    }

    fn merge(&mut self, other: &Self) {
        self.n += other.n;
        self.sum_l += other.sum_l;
        self.sum_t += other.sum_t;
        self.sum_ll += other.sum_ll;
        self.sum_lt += other.sum_lt;
    }

    /// Least-squares `(intercept, gradient)` of `t = a + b * l`.
    fn line(&self) -> (f64, f64) {
        let denom = self.n * self.sum_ll - self.sum_l * self.sum_l;
        if denom.abs() <= EPSILON * (self.n * self.sum_ll).max(1.0) {
            return (self.sum_t / self.n, 0.0);
        }
        let gradient = (self.n * self.sum_lt - self.sum_l * self.sum_t) / denom;
        let intercept = (self.sum_t - gradient * self.sum_l) / self.n;
        (intercept, gradient)
    }
}

/// Sliding linear fit of one cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidingLinearFit {
    cluster_id: ClusterId,
    origin: Position,
    axis: (f64, f64),
    layer_pitch: f64,
    half_window: usize,
    min_x: f64,
    max_x: f64,
    points: Vec<LayerFitPoint>,
}

impl SlidingLinearFit {
    /// Fits the given hit positions.
    pub fn new(
        cluster_id: ClusterId,
        positions: &[Position],
        half_window: usize,
        layer_pitch: f64,
    ) -> Result<Self, FitError> {
        if positions.is_empty() {
            return Err(FitError::EmptyCluster(cluster_id));
        }
        if half_window == 0 || !(layer_pitch.is_finite() && layer_pitch > 0.0) {
            return Err(FitError::InvalidWindow {
                half_window,
                pitch: layer_pitch,
            });
        }

        let n = positions.len() as f64;
        let mean_x = positions.iter().map(|p| p.x).sum::<f64>() / n;
        let mean_z = positions.iter().map(|p| p.z).sum::<f64>() / n;
        let origin = Position::new(mean_x, mean_z);

        let (mut sxx, mut sxz, mut szz) = (0.0, 0.0, 0.0);
        for p in positions {
            let dx = p.x - mean_x;
            let dz = p.z - mean_z;
            sxx += dx * dx;
            sxz += dx * dz;
            szz += dz * dz;
        }

        // Major axis; the half-angle keeps cos >= 0 so `l` grows with x.
        let angle = 0.5 * (2.0 * sxz).atan2(sxx - szz);
        let axis = (angle.cos(), angle.sin());

        let mut layers: BTreeMap<i64, LayerSums> = BTreeMap::new();
        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        for p in positions {
            let dx = p.x - mean_x;
            let dz = p.z - mean_z;
            let l = dx * axis.0 + dz * axis.1;
            let t = -dx * axis.1 + dz * axis.0;
            let layer = (l / layer_pitch).floor() as i64;
            layers.entry(layer).or_default().add(l, t);
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
        }

        let reach = i64::try_from(half_window).unwrap_or(i64::MAX);
        let points = layers
            .keys()
            .map(|&layer| {
                let mut window = LayerSums::default();
                let range = layer.saturating_sub(reach)..=layer.saturating_add(reach);
                for (_, sums) in layers.range(range) {
                    window.merge(sums);
                }
                let (intercept, gradient) = window.line();
                let l = (layer as f64 + 0.5) * layer_pitch;
                let t = intercept + gradient * l;
                LayerFitPoint {
                    layer,
                    l,
                    t,
                    gradient,
                    position: Self::to_global(origin, axis, l, t),
                }
            })
            .collect();

        Ok(Self {
            cluster_id,
            origin,
            axis,
            layer_pitch,
            half_window,
            min_x,
            max_x,
            points,
        })
    }

    fn to_global(origin: Position, axis: (f64, f64), l: f64, t: f64) -> Position {
        Position::new(
            origin.x + l * axis.0 - t * axis.1,
            origin.z + l * axis.1 + t * axis.0,
        )
    }

    /// Layer fit points in increasing layer order.
    pub fn fit_points(&self) -> &[LayerFitPoint] {
        &self.points
    }

    /// Unit vector of the principal axis in view coordinates.
    pub fn axis(&self) -> (f64, f64) {
        self.axis
    }

    /// Half window the fit was built with.
    pub fn half_window(&self) -> usize {
        self.half_window
    }

    /// Layer pitch the fit was built with.
    pub fn layer_pitch(&self) -> f64 {
        self.layer_pitch
    }

    /// Drift-coordinate range of the fitted hits.
    pub fn x_range(&self) -> (f64, f64) {
        (self.min_x, self.max_x)
    }

    fn extrapolate(&self, point: &LayerFitPoint, x: f64) -> Option<Position> {
        let (ax, az) = self.axis;
        let dir_x = ax - point.gradient * az;
        let dir_z = az + point.gradient * ax;
        if dir_x.abs() < EPSILON {
            return None;
        }
        let s = (x - point.position.x) / dir_x;
        Some(Position::new(x, point.position.z + s * dir_z))
    }
}

impl TrajectoryFit for SlidingLinearFit {
    fn cluster_id(&self) -> ClusterId {
        self.cluster_id
    }

    fn position_at_x(&self, x: f64) -> Option<Position> {
        if !(x >= self.min_x && x <= self.max_x) {
            return None;
        }

        for pair in self.points.windows(2) {
            let (p0, p1) = (pair[0].position, pair[1].position);
            let (lo, hi) = if p0.x <= p1.x { (p0.x, p1.x) } else { (p1.x, p0.x) };
            if x < lo || x > hi || hi - lo < EPSILON {
                continue;
            }
            let f = (x - p0.x) / (p1.x - p0.x);
            return Some(Position::new(x, p0.z + f * (p1.z - p0.z)));
        }

        // Beyond the outermost layer centres: continue from the nearer end.
        let first = self.points.first()?;
        let last = self.points.last()?;
        let end = if (x - first.position.x).abs() <= (x - last.position.x).abs() {
            first
        } else {
            last
        };
        self.extrapolate(end, x)
    }
}
