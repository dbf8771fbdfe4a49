//! Anisotropy maps from the accumulated directional results
//!
//! Both extraction functions are pure over the accumulators, so calling them
//! twice gives identical maps.

use std::f64::consts::PI;

use super::aggregate::{InertiaAccumulator, ResolutionAccumulator};
use super::mask::Mask;

/// Exponent of Thomsen's ellipsoid surface approximation
const THOMSEN_P: f64 = 1.6075;

/// Relative size of `p = b² - 3c` under which the three roots coincide
const TRIPLE_ROOT_TOL: f64 = 1e-12;

/// Eigenvalues of the symmetric matrix `[xx, xy, xz, yy, yz, zz]`
///
/// Closed-form trigonometric solution of the characteristic cubic
/// `λ³ - bλ² + cλ - det = 0`. Returned as the roots for `k = 0, 1, -1` of
/// `(b + 2√p cos((Δ + 2πk)/3)) / 3`, unsorted.
pub fn symmetric_eigenvalues(t: [f64; 6]) -> [f64; 3] {
    let [xx, xy, xz, yy, yz, zz] = t;

    let b = xx + yy + zz;
    let c = xx * yy + xx * zz + yy * zz - xy * xy - xz * xz - yz * yz;
    let det = xx * yy * zz + 2.0 * xy * xz * yz - xx * yz * yz - yy * xz * xz - zz * xy * xy;

    let p = b * b - 3.0 * c;
    if p <= TRIPLE_ROOT_TOL * b * b || p <= 0.0 {
        let l = b / 3.0;
        return [l, l, l];
    }
    let q = 2.0 * b * b * b - 9.0 * b * c + 27.0 * det;

    let arg = (q / (2.0 * p * p.sqrt())).clamp(-1.0, 1.0);
    let delta = arg.acos();
    let sp = 2.0 * p.sqrt();

    [
        (b + sp * (delta / 3.0).cos()) / 3.0,
        (b + sp * ((delta + 2.0 * PI) / 3.0).cos()) / 3.0,
        (b + sp * ((delta - 2.0 * PI) / 3.0).cos()) / 3.0,
    ]
}

/// Sphericity of the ellipsoid with semi-axes `l`
///
/// `π^{1/3} (6V)^{2/3} / A`, 1 for a sphere. Negative axes are clamped to 0
/// and a degenerate ellipsoid has sphericity 0.
pub fn sphericity(l: [f64; 3]) -> f64 {
    let [a, b, c] = l.map(|v| v.max(0.0));
    let aux = (a * b).powf(THOMSEN_P) + (a * c).powf(THOMSEN_P) + (b * c).powf(THOMSEN_P);
    let area = 4.0 * PI * (aux / 3.0).powf(1.0 / THOMSEN_P);
    if !(area > 0.0) {
        return 0.0;
    }
    let volume = 4.0 / 3.0 * PI * a * b * c;
    PI.cbrt() * (6.0 * volume).powf(2.0 / 3.0) / area
}

/// Eigenvalue and sphericity maps
#[derive(Clone, Debug, PartialEq)]
pub struct AnisotropyMaps {
    pub lambda1: Vec<f64>,
    pub lambda2: Vec<f64>,
    pub lambda3: Vec<f64>,
    pub sphericity: Vec<f64>,
}

/// Diagonalize the normalized inertia tensor of every voxel inside the mask
pub fn extract_anisotropy(inertia: &InertiaAccumulator, static_mask: &Mask) -> AnisotropyMaps {
    let n_total = static_mask.len();
    let mut maps = AnisotropyMaps {
        lambda1: vec![0.0; n_total],
        lambda2: vec![0.0; n_total],
        lambda3: vec![0.0; n_total],
        sphericity: vec![0.0; n_total],
    };

    for n in 0..n_total {
        if !static_mask.is_inside(n) {
            continue;
        }
        let Some(tensor) = inertia.tensor_at(n) else { continue };
        let l = symmetric_eigenvalues(tensor);
        maps.lambda1[n] = l[0];
        maps.lambda2[n] = l[1];
        maps.lambda3[n] = l[2];
        maps.sphericity[n] = sphericity(l);
    }
    maps
}

/// Directional resolution statistics per voxel
#[derive(Clone, Debug, PartialEq)]
pub struct ResolutionMaps {
    pub mean: Vec<f64>,
    pub variance: Vec<f64>,
    pub max: Vec<f64>,
    pub min: Vec<f64>,
    /// Degree of anisotropy `(max - min) / (max + min)`
    pub doa: Vec<f64>,
}

/// Mean, variance and degree of anisotropy over `n_directions`
pub fn finalize_resolution(acc: &ResolutionAccumulator, static_mask: &Mask, n_directions: usize) -> ResolutionMaps {
    let n_total = static_mask.len();
    let nd = n_directions.max(1) as f64;
    let mut maps = ResolutionMaps {
        mean: vec![0.0; n_total],
        variance: vec![0.0; n_total],
        max: vec![0.0; n_total],
        min: vec![0.0; n_total],
        doa: vec![0.0; n_total],
    };

    for n in 0..n_total {
        if !static_mask.is_inside(n) {
            continue;
        }
        let mean = acc.sum[n] / nd;
        maps.mean[n] = mean;
        maps.variance[n] = (acc.sum_sq[n] / nd - mean * mean).max(0.0);
        maps.max[n] = acc.max[n];
        maps.min[n] = acc.min[n];
        let denom = acc.max[n] + acc.min[n];
        maps.doa[n] = if denom != 0.0 { (acc.max[n] - acc.min[n]) / denom } else { 0.0 };
    }
    maps
}
