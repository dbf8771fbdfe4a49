//! Accumulation of directional results across directions
//!
//! Every accumulator only touches voxels inside the static mask and supports
//! `merge`, so partial results built over disjoint direction subsets combine
//! into the same totals as a sequential pass.

use serde::{Deserialize, Serialize};

use super::mask::{Mask, VoxelState};
use super::sweep::Termination;
use crate::directions::Direction;

/// Starting value of the maximum-resolution map inside the mask (Å)
pub const MAX_RESOLUTION_FLOOR: f64 = 1.0;

/// Per-voxel extrema and moments of the directional resolutions
#[derive(Clone, Debug, PartialEq)]
pub struct ResolutionAccumulator {
    pub max: Vec<f64>,
    pub min: Vec<f64>,
    pub sum: Vec<f64>,
    pub sum_sq: Vec<f64>,
}

impl ResolutionAccumulator {
    /// Empty accumulator; inside the mask `min` starts at `max_res` and `max`
    /// at [`MAX_RESOLUTION_FLOOR`]
    pub fn new(static_mask: &Mask, max_res: f64) -> Self {
        let n_total = static_mask.len();
        let seed = |value: f64| -> Vec<f64> {
            static_mask.states.iter()
                .map(|&s| if s == VoxelState::Inside { value } else { 0.0 })
                .collect()
        };
        Self {
            max: seed(MAX_RESOLUTION_FLOOR),
            min: seed(max_res),
            sum: vec![0.0; n_total],
            sum_sq: vec![0.0; n_total],
        }
    }

    pub fn add(&mut self, resolution: &[f64], static_mask: &Mask) {
        for (n, &r) in resolution.iter().enumerate() {
            if !static_mask.is_inside(n) {
                continue;
            }
            self.sum[n] += r;
            self.sum_sq[n] += r * r;
            if r < self.min[n] {
                self.min[n] = r;
            }
            if r > self.max[n] {
                self.max[n] = r;
            }
        }
    }

    pub fn merge(&mut self, other: &Self) {
        for n in 0..self.sum.len() {
            self.sum[n] += other.sum[n];
            self.sum_sq[n] += other.sum_sq[n];
            self.min[n] = self.min[n].min(other.min[n]);
            self.max[n] = self.max[n].max(other.max[n]);
        }
    }
}

/// Per-voxel inertia tensor `Σ r (I - d dᵀ)` and weight `Σ r`
#[derive(Clone, Debug, PartialEq)]
pub struct InertiaAccumulator {
    pub xx: Vec<f64>,
    pub xy: Vec<f64>,
    pub xz: Vec<f64>,
    pub yy: Vec<f64>,
    pub yz: Vec<f64>,
    pub zz: Vec<f64>,
    pub weight: Vec<f64>,
}

impl InertiaAccumulator {
    pub fn new(n_total: usize) -> Self {
        Self {
            xx: vec![0.0; n_total],
            xy: vec![0.0; n_total],
            xz: vec![0.0; n_total],
            yy: vec![0.0; n_total],
            yz: vec![0.0; n_total],
            zz: vec![0.0; n_total],
            weight: vec![0.0; n_total],
        }
    }

    pub fn add(&mut self, resolution: &[f64], direction: Direction, static_mask: &Mask) {
        let [dx, dy, dz] = direction.unit_vector();
        for (n, &r) in resolution.iter().enumerate() {
            if !static_mask.is_inside(n) {
                continue;
            }
            self.xx[n] += r * (1.0 - dx * dx);
            self.xy[n] -= r * dx * dy;
            self.xz[n] -= r * dx * dz;
            self.yy[n] += r * (1.0 - dy * dy);
            self.yz[n] -= r * dy * dz;
            self.zz[n] += r * (1.0 - dz * dz);
            self.weight[n] += r;
        }
    }

    pub fn merge(&mut self, other: &Self) {
        let pairs = [
            (&mut self.xx, &other.xx),
            (&mut self.xy, &other.xy),
            (&mut self.xz, &other.xz),
            (&mut self.yy, &other.yy),
            (&mut self.yz, &other.yz),
            (&mut self.zz, &other.zz),
            (&mut self.weight, &other.weight),
        ];
        for (dst, src) in pairs {
            for (d, s) in dst.iter_mut().zip(src.iter()) {
                *d += s;
            }
        }
    }

    /// Tensor at voxel `n` normalized by its weight, `[xx, xy, xz, yy, yz, zz]`
    ///
    /// `None` when no resolution was accumulated there.
    pub fn tensor_at(&self, n: usize) -> Option<[f64; 6]> {
        let w = self.weight[n];
        if w <= 0.0 || !w.is_finite() {
            return None;
        }
        let inv = 1.0 / w;
        Some([
            self.xx[n] * inv,
            self.xy[n] * inv,
            self.xz[n] * inv,
            self.yy[n] * inv,
            self.yz[n] * inv,
            self.zz[n] * inv,
        ])
    }
}

/// Union of the per-direction refined masks
#[derive(Clone, Debug, PartialEq)]
pub struct MaskUnion {
    pub hits: Vec<bool>,
}

impl MaskUnion {
    pub fn new(n_total: usize) -> Self {
        Self { hits: vec![false; n_total] }
    }

    pub fn add(&mut self, mask: &Mask, static_mask: &Mask) {
        for (n, h) in self.hits.iter_mut().enumerate() {
            if static_mask.is_inside(n) && mask.is_inside(n) {
                *h = true;
            }
        }
    }

    pub fn merge(&mut self, other: &Self) {
        for (h, &o) in self.hits.iter_mut().zip(other.hits.iter()) {
            *h |= o;
        }
    }

    /// Labels: 1 kept, 0 dropped, -1 excluded in the static mask
    pub fn to_labels(&self, static_mask: &Mask) -> Vec<i32> {
        self.hits.iter()
            .zip(static_mask.states.iter())
            .map(|(&h, &s)| match s {
                VoxelState::Excluded => -1,
                _ if h => 1,
                _ => 0,
            })
            .collect()
    }
}

/// One row of the per-direction result table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectionSummary {
    pub index: usize,
    pub rot: f64,
    pub tilt: f64,
    /// Mean of the positive resolutions (Å)
    pub mean_resolution: f64,
    /// Standard deviation of the positive resolutions (Å)
    pub std_resolution: f64,
    pub iterations: usize,
    pub termination: Termination,
}

impl DirectionSummary {
    pub fn new(
        index: usize,
        direction: Direction,
        resolution: &[f64],
        iterations: usize,
        termination: Termination,
    ) -> Self {
        let (count, sum, sum_sq) = resolution.iter()
            .filter(|&&r| r > 0.0)
            .fold((0usize, 0.0, 0.0), |(c, s, s2), &r| (c + 1, s + r, s2 + r * r));

        let (mean_resolution, std_resolution) = if count > 0 {
            let mean = sum / count as f64;
            let var = (sum_sq / count as f64 - mean * mean).max(0.0);
            (mean, var.sqrt())
        } else {
            (0.0, 0.0)
        };

        Self {
            index,
            rot: direction.rot,
            tilt: direction.tilt,
            mean_resolution,
            std_resolution,
            iterations,
            termination,
        }
    }
}

/// Everything accumulated over the directions of a run
#[derive(Clone, Debug)]
pub struct Aggregator {
    pub resolution: ResolutionAccumulator,
    pub inertia: InertiaAccumulator,
    pub refined: MaskUnion,
    pub summaries: Vec<DirectionSummary>,
}

impl Aggregator {
    pub fn new(static_mask: &Mask, max_res: f64) -> Self {
        let n_total = static_mask.len();
        Self {
            resolution: ResolutionAccumulator::new(static_mask, max_res),
            inertia: InertiaAccumulator::new(n_total),
            refined: MaskUnion::new(n_total),
            summaries: Vec::new(),
        }
    }

    /// Fold one post-processed direction into the totals
    pub fn add(
        &mut self,
        direction: Direction,
        resolution: &[f64],
        mask: &Mask,
        static_mask: &Mask,
        summary: DirectionSummary,
    ) {
        self.resolution.add(resolution, static_mask);
        self.inertia.add(resolution, direction, static_mask);
        self.refined.add(mask, static_mask);
        self.summaries.push(summary);
    }

    pub fn merge(mut self, other: Self) -> Self {
        self.resolution.merge(&other.resolution);
        self.inertia.merge(&other.inertia);
        self.refined.merge(&other.refined);
        self.summaries.extend(other.summaries);
        self.summaries.sort_by_key(|s| s.index);
        self
    }
}
