//! Directional monogenic amplitude
//!
//! The spectrum is restricted to a double cone around the sampling direction
//! and to a soft high-pass band starting at `w1l`. The amplitude combines the
//! band-passed map with its three Riesz components:
//!
//!   A = sqrt(f² + R_x² + R_y² + R_z²),   R_c = IFFT(-i u_c/|u| · H · F)
//!
//! and is finally smoothed with a raised-cosine low-pass at `w1`.

use num_complex::Complex64;
use std::f64::consts::PI;

use super::cone::Cone;
use super::frequency::FrequencyField;
use crate::fft::{idx3d, Fft3dWorkspace};

/// Transition width of the amplitude low-pass filter (digital frequency)
pub const LOWPASS_TRANSITION: f64 = 0.01;

/// Frequency band of one sweep step
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Band {
    /// High cutoff, the frequency being tested
    pub w1: f64,
    /// Lower edge of the raised-cosine transition
    pub w1l: f64,
}

impl Band {
    /// Spectral weight at frequency magnitude `u`
    ///
    /// Zero below `w1l`, raised cosine up to `w1`, one above. A band with
    /// `w1 <= w1l` has no transition and becomes a hard edge at `w1`.
    #[inline]
    pub fn weight(&self, u: f64) -> f64 {
        if u > self.w1 {
            1.0
        } else if self.w1 > self.w1l && u >= self.w1l {
            0.5 * (1.0 + ((u - self.w1) * PI / (self.w1 - self.w1l)).cos())
        } else if u == self.w1 {
            1.0
        } else {
            0.0
        }
    }
}

/// Raised-cosine low-pass response at frequency magnitude `u`
#[inline]
pub fn raised_cosine_lowpass(u: f64, cutoff: f64, transition: f64) -> f64 {
    if u <= cutoff {
        1.0
    } else if u < cutoff + transition {
        0.5 * (1.0 + (PI * (u - cutoff) / transition).cos())
    } else {
        0.0
    }
}

/// Reusable buffers and FFT plans for amplitude computations on one grid
pub struct MonogenicFilter<'a> {
    field: &'a FrequencyField,
    workspace: Fft3dWorkspace,
    windowed: Vec<Complex64>,
    scratch: Vec<Complex64>,
    component: Vec<f64>,
}

impl<'a> MonogenicFilter<'a> {
    pub fn new(field: &'a FrequencyField) -> Self {
        let n_total = field.len();
        Self {
            field,
            workspace: Fft3dWorkspace::new(field.nx, field.ny, field.nz),
            windowed: vec![Complex64::new(0.0, 0.0); n_total],
            scratch: vec![Complex64::new(0.0, 0.0); n_total],
            component: vec![0.0; n_total],
        }
    }

    pub fn field(&self) -> &FrequencyField {
        self.field
    }

    /// Forward transform of a real map on this filter's grid
    pub fn spectrum_of(&mut self, data: &[f64]) -> Vec<Complex64> {
        self.workspace.forward_real(data)
    }

    /// Directional monogenic amplitude of `spectrum` for `band` inside `cone`
    ///
    /// `amplitude` must have one entry per voxel and is overwritten.
    pub fn amplitude(&mut self, spectrum: &[Complex64], band: Band, cone: &Cone, amplitude: &mut [f64]) {
        let field = self.field;
        let (nx, ny, nz) = (field.nx, field.ny, field.nz);

        // Cone + band window
        for (n, (w, &s)) in self.windowed.iter_mut().zip(spectrum.iter()).enumerate() {
            *w = if cone.contains(&field.orientation[n]) {
                s * band.weight(field.magnitude(n))
            } else {
                Complex64::new(0.0, 0.0)
            };
        }

        // Band-passed map
        self.scratch.copy_from_slice(&self.windowed);
        self.workspace.inverse_real_into(&mut self.scratch, amplitude);
        for a in amplitude.iter_mut() {
            *a *= *a;
        }

        // Riesz components
        let minus_i = Complex64::new(0.0, -1.0);
        for axis in 0..3 {
            for k in 0..nz {
                for j in 0..ny {
                    for i in 0..nx {
                        let n = idx3d(i, j, k, nx, ny);
                        let u = match axis {
                            0 => field.ux[i],
                            1 => field.uy[j],
                            _ => field.uz[k],
                        };
                        self.scratch[n] = minus_i * (u * field.inv_magnitude[n]) * self.windowed[n];
                    }
                }
            }
            self.workspace.inverse_real_into(&mut self.scratch, &mut self.component);
            for (a, &c) in amplitude.iter_mut().zip(self.component.iter()) {
                *a += c * c;
            }
        }

        for a in amplitude.iter_mut() {
            *a = a.sqrt();
        }

        self.lowpass(amplitude, band.w1);
    }

    /// Raised-cosine low-pass of a real volume, in place
    pub fn lowpass(&mut self, volume: &mut [f64], cutoff: f64) {
        for (s, &v) in self.scratch.iter_mut().zip(volume.iter()) {
            *s = Complex64::new(v, 0.0);
        }
        self.workspace.fft3d(&mut self.scratch);
        for (n, s) in self.scratch.iter_mut().enumerate() {
            *s *= raised_cosine_lowpass(self.field.magnitude(n), cutoff, LOWPASS_TRANSITION);
        }
        self.workspace.inverse_real_into(&mut self.scratch, volume);
    }
}
