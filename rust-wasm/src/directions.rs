//! Projection directions swept by the directional resolution analysis
//!
//! A direction is an Euler (rot, tilt) pair in degrees. Because the cone
//! filter is symmetric under `u -> -u`, only one hemisphere of the projection
//! sphere needs sampling.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Sampling direction given by its rotation and tilt angles (degrees)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Direction {
    pub rot: f64,
    pub tilt: f64,
}

impl Direction {
    pub fn new(rot: f64, tilt: f64) -> Self {
        Self { rot, tilt }
    }

    /// Unit vector `(sin t cos r, sin t sin r, cos t)`
    pub fn unit_vector(&self) -> [f64; 3] {
        let rot = self.rot * PI / 180.0;
        let tilt = self.tilt * PI / 180.0;
        [tilt.sin() * rot.cos(), tilt.sin() * rot.sin(), tilt.cos()]
    }
}

/// Evenly spread directions over the upper hemisphere
///
/// Tilt rings are spaced by `step` degrees from the pole to the equator; each
/// ring carries a number of rot samples proportional to its circumference.
/// On the equator rot only spans `[0, 180)` since `(r, 90)` and `(r + 180, 90)`
/// are antipodal.
pub fn hemisphere_directions(step: f64) -> Vec<Direction> {
    let step = if step > 0.0 { step.min(90.0) } else { 90.0 };
    let n_rings = (90.0 / step).round().max(1.0) as usize;
    let ring_step = 90.0 / n_rings as f64;

    let mut directions = vec![Direction::new(0.0, 0.0)];
    for ring in 1..=n_rings {
        let tilt = ring as f64 * ring_step;
        let span = if ring == n_rings { 180.0 } else { 360.0 };
        let circumference = span * (tilt * PI / 180.0).sin();
        let n_rot = (circumference / ring_step).round().max(1.0) as usize;
        for r in 0..n_rot {
            directions.push(Direction::new(r as f64 * span / n_rot as f64, tilt));
        }
    }
    directions
}

/// Fold an externally generated (rot, tilt) list onto the analysed hemisphere
///
/// Pairs with a negative angle are dropped and tilts beyond 90 degrees are
/// mapped to `tilt - 180`, which describes the same cone axis.
pub fn fold_projection_angles(angles: &[(f64, f64)]) -> Vec<Direction> {
    angles.iter()
        .filter(|(rot, tilt)| *rot >= 0.0 && *tilt >= 0.0)
        .map(|&(rot, tilt)| {
            let tilt = if tilt > 90.0 { tilt - 180.0 } else { tilt };
            Direction::new(rot, tilt)
        })
        .collect()
}
