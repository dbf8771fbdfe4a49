//! Frequency field of a 3D Fourier volume
//!
//! Built once per run and shared read-only by every directional sweep.

use crate::fft::{digital_frequencies, idx3d};

/// Value stored at the DC voxel in place of `1/0`
pub const DC_SENTINEL: f64 = 1e38;

/// Replacement for zero frequency components when deriving orientations
pub const ZERO_COMPONENT_EPS: f64 = 1e-38;

/// Per-voxel digital frequencies of a full complex spectrum
pub struct FrequencyField {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    /// Digital frequency of each x bin
    pub ux: Vec<f64>,
    /// Digital frequency of each y bin
    pub uy: Vec<f64>,
    /// Digital frequency of each z bin
    pub uz: Vec<f64>,
    /// `1/|u|` per voxel, [`DC_SENTINEL`] at the origin
    pub inv_magnitude: Vec<f64>,
    /// Unit orientation of each frequency vector, `[x, y, z]` per voxel
    pub orientation: Vec<[f64; 3]>,
}

impl FrequencyField {
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        let ux = digital_frequencies(nx);
        let uy = digital_frequencies(ny);
        let uz = digital_frequencies(nz);

        let inv_magnitude = inverse_frequency_field(nx, ny, nz);

        let n_total = nx * ny * nz;
        let mut orientation = vec![[0.0; 3]; n_total];
        for k in 0..nz {
            let z = non_zero(uz[k]);
            for j in 0..ny {
                let y = non_zero(uy[j]);
                for i in 0..nx {
                    let x = non_zero(ux[i]);
                    let norm = (x * x + y * y + z * z).sqrt();
                    orientation[idx3d(i, j, k, nx, ny)] = [x / norm, y / norm, z / norm];
                }
            }
        }

        Self { nx, ny, nz, ux, uy, uz, inv_magnitude, orientation }
    }

    pub fn len(&self) -> usize {
        self.inv_magnitude.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inv_magnitude.is_empty()
    }

    /// Frequency magnitude `|u|` of voxel `n`
    #[inline]
    pub fn magnitude(&self, n: usize) -> f64 {
        1.0 / self.inv_magnitude[n]
    }
}

#[inline]
fn non_zero(u: f64) -> f64 {
    if u == 0.0 { ZERO_COMPONENT_EPS } else { u }
}

/// Reciprocal digital-frequency magnitude of every voxel of an `nx*ny*nz` spectrum
///
/// `1 / sqrt(ux² + uy² + uz²)`, with [`DC_SENTINEL`] at the zero frequency so
/// later divisions never see an infinity.
pub fn inverse_frequency_field(nx: usize, ny: usize, nz: usize) -> Vec<f64> {
    let ux = digital_frequencies(nx);
    let uy = digital_frequencies(ny);
    let uz = digital_frequencies(nz);

    let mut iu = vec![0.0; nx * ny * nz];
    for k in 0..nz {
        let uz2 = uz[k] * uz[k];
        for j in 0..ny {
            let uz2y2 = uz2 + uy[j] * uy[j];
            for i in 0..nx {
                let u2 = uz2y2 + ux[i] * ux[i];
                iu[idx3d(i, j, k, nx, ny)] = if i == 0 && j == 0 && k == 0 {
                    DC_SENTINEL
                } else {
                    1.0 / u2.sqrt()
                };
            }
        }
    }
    iu
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dc_sentinel() {
        let iu = inverse_frequency_field(4, 4, 4);
        assert_eq!(iu[0], DC_SENTINEL);
        assert!(iu.iter().skip(1).all(|v| v.is_finite() && *v > 0.0));
    }

    #[test]
    fn test_axis_voxels() {
        let (nx, ny, nz) = (8, 8, 8);
        let iu = inverse_frequency_field(nx, ny, nz);
        // (1,0,0) -> |u| = 1/8
        assert!((iu[idx3d(1, 0, 0, nx, ny)] - 8.0).abs() < 1e-12);
        // (0,0,4) -> Nyquist, |u| = 0.5
        assert!((iu[idx3d(0, 0, 4, nx, ny)] - 2.0).abs() < 1e-12);
        // (7,7,0) -> (-1/8, -1/8, 0)
        let expected = 1.0 / (2.0f64 / 64.0).sqrt();
        assert!((iu[idx3d(7, 7, 0, nx, ny)] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_orientation_is_unit_and_signed() {
        let field = FrequencyField::new(6, 5, 4);
        for o in &field.orientation {
            let norm = (o[0] * o[0] + o[1] * o[1] + o[2] * o[2]).sqrt();
            assert!((norm - 1.0).abs() < 1e-12);
        }
        // pure -x frequency
        let o = field.orientation[idx3d(5, 0, 0, 6, 5)];
        assert!((o[0] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_magnitude_matches_components() {
        let field = FrequencyField::new(5, 6, 7);
        let n = idx3d(2, 4, 5, 5, 6);
        let expected = (field.ux[2].powi(2) + field.uy[4].powi(2) + field.uz[5].powi(2)).sqrt();
        assert!((field.magnitude(n) - expected).abs() < 1e-12);
    }
}
