//! 3D FFT workspace and digital-frequency helpers built on rustfft
//!
//! Volumes are stored in Fortran (column-major) order, `index = x + y*nx + z*nx*ny`,
//! and transformed with full complex storage (no half-spectrum).
//!
//! Bin/frequency conversions follow the electron-microscopy convention where the
//! bin `n/2` of an even axis maps to `+0.5` rather than numpy's `-0.5`.

use num_complex::Complex64;
use rustfft::{Fft, FftDirection, FftPlanner};
use std::sync::Arc;

/// FFT workspace that caches plans and scratch buffers for reuse
///
/// The directional sweep runs several inverse transforms per frequency step,
/// so plans are built once per workspace and shared by every call.
pub struct Fft3dWorkspace {
    nx: usize,
    ny: usize,
    nz: usize,
    n_total: usize,
    fft_x: Arc<dyn Fft<f64>>,
    fft_y: Arc<dyn Fft<f64>>,
    fft_z: Arc<dyn Fft<f64>>,
    ifft_x: Arc<dyn Fft<f64>>,
    ifft_y: Arc<dyn Fft<f64>>,
    ifft_z: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
    buffer_y: Vec<Complex64>,
    buffer_z: Vec<Complex64>,
}

impl Fft3dWorkspace {
    /// Create a new FFT workspace for the given dimensions
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        let mut planner = FftPlanner::new();

        let fft_x = planner.plan_fft(nx, FftDirection::Forward);
        let fft_y = planner.plan_fft(ny, FftDirection::Forward);
        let fft_z = planner.plan_fft(nz, FftDirection::Forward);

        let ifft_x = planner.plan_fft(nx, FftDirection::Inverse);
        let ifft_y = planner.plan_fft(ny, FftDirection::Inverse);
        let ifft_z = planner.plan_fft(nz, FftDirection::Inverse);

        let scratch_len = [&fft_x, &fft_y, &fft_z, &ifft_x, &ifft_y, &ifft_z]
            .iter()
            .map(|p| p.get_inplace_scratch_len())
            .max()
            .unwrap_or(0);

        Self {
            nx, ny, nz,
            n_total: nx * ny * nz,
            fft_x, fft_y, fft_z,
            ifft_x, ifft_y, ifft_z,
            scratch: vec![Complex64::new(0.0, 0.0); scratch_len],
            buffer_y: vec![Complex64::new(0.0, 0.0); ny],
            buffer_z: vec![Complex64::new(0.0, 0.0); nz],
        }
    }

    /// Dimensions handled by this workspace
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    /// In-place forward 3D FFT
    pub fn fft3d(&mut self, data: &mut [Complex64]) {
        let (fx, fy, fz) = (self.fft_x.clone(), self.fft_y.clone(), self.fft_z.clone());
        self.transform(data, &*fx, &*fy, &*fz);
    }

    /// In-place inverse 3D FFT (with 1/N normalization)
    pub fn ifft3d(&mut self, data: &mut [Complex64]) {
        let (fx, fy, fz) = (self.ifft_x.clone(), self.ifft_y.clone(), self.ifft_z.clone());
        self.transform(data, &*fx, &*fy, &*fz);

        let n_total = self.n_total as f64;
        for val in data.iter_mut() {
            *val /= n_total;
        }
    }

    fn transform(
        &mut self,
        data: &mut [Complex64],
        plan_x: &dyn Fft<f64>,
        plan_y: &dyn Fft<f64>,
        plan_z: &dyn Fft<f64>,
    ) {
        let (nx, ny, nz) = (self.nx, self.ny, self.nz);

        // x rows are contiguous
        for k in 0..nz {
            for j in 0..ny {
                let start = idx3d(0, j, k, nx, ny);
                plan_x.process_with_scratch(&mut data[start..start + nx], &mut self.scratch);
            }
        }

        for k in 0..nz {
            for i in 0..nx {
                for j in 0..ny {
                    self.buffer_y[j] = data[idx3d(i, j, k, nx, ny)];
                }
                plan_y.process_with_scratch(&mut self.buffer_y, &mut self.scratch);
                for j in 0..ny {
                    data[idx3d(i, j, k, nx, ny)] = self.buffer_y[j];
                }
            }
        }

        for j in 0..ny {
            for i in 0..nx {
                for k in 0..nz {
                    self.buffer_z[k] = data[idx3d(i, j, k, nx, ny)];
                }
                plan_z.process_with_scratch(&mut self.buffer_z, &mut self.scratch);
                for k in 0..nz {
                    data[idx3d(i, j, k, nx, ny)] = self.buffer_z[k];
                }
            }
        }
    }

    /// Forward transform of a real volume into a freshly allocated spectrum
    pub fn forward_real(&mut self, data: &[f64]) -> Vec<Complex64> {
        let mut spectrum: Vec<Complex64> = data.iter()
            .map(|&x| Complex64::new(x, 0.0))
            .collect();
        self.fft3d(&mut spectrum);
        spectrum
    }

    /// Inverse transform `spectrum` in place and hand back its real part
    ///
    /// The spectrum buffer is consumed as scratch; its content is undefined
    /// afterwards.
    pub fn inverse_real_into(&mut self, spectrum: &mut [Complex64], out: &mut [f64]) {
        self.ifft3d(spectrum);
        for (o, c) in out.iter_mut().zip(spectrum.iter()) {
            *o = c.re;
        }
    }
}

/// Index into a 3D array stored in Fortran order (column-major)
/// index = x + y*nx + z*nx*ny
#[inline(always)]
pub fn idx3d(i: usize, j: usize, k: usize, nx: usize, ny: usize) -> usize {
    i + j * nx + k * nx * ny
}

/// Digital frequency of FFT bin `idx` on an axis of `n` samples
///
/// Bins `0..=n/2` are positive (`idx/n`), the remaining ones wrap to
/// `(idx - n)/n`. A single-sample axis has only the zero frequency.
#[inline]
pub fn idx_to_digfreq(idx: usize, n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    if idx <= n / 2 {
        idx as f64 / n as f64
    } else {
        (idx as f64 - n as f64) / n as f64
    }
}

/// FFT bin closest to digital frequency `freq` on an axis of `n` samples
#[inline]
pub fn digfreq_to_idx(freq: f64, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let idx = (n as f64 * freq).round() as i64;
    idx.rem_euclid(n as i64) as usize
}

/// Digital frequencies of every bin along one axis
pub fn digital_frequencies(n: usize) -> Vec<f64> {
    (0..n).map(|i| idx_to_digfreq(i, n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fft_ifft_roundtrip() {
        let (nx, ny, nz) = (4, 6, 5);
        let original: Vec<f64> = (0..nx * ny * nz).map(|i| (i as f64 * 0.37).sin()).collect();

        let mut ws = Fft3dWorkspace::new(nx, ny, nz);
        let mut spectrum = ws.forward_real(&original);
        let mut back = vec![0.0; original.len()];
        ws.inverse_real_into(&mut spectrum, &mut back);

        for (i, (&orig, &result)) in original.iter().zip(back.iter()).enumerate() {
            assert!(
                (result - orig).abs() < 1e-10,
                "Mismatch at index {}: expected {}, got {}",
                i, orig, result
            );
        }
    }

    #[test]
    fn test_dc_bin_holds_sum() {
        let data = vec![2.0; 3 * 3 * 3];
        let mut ws = Fft3dWorkspace::new(3, 3, 3);
        let spectrum = ws.forward_real(&data);
        assert!((spectrum[0].re - 54.0).abs() < 1e-10);
        assert!(spectrum[1].norm() < 1e-10);
    }

    #[test]
    fn test_idx_to_digfreq_even() {
        let freq = digital_frequencies(4);
        assert!((freq[0] - 0.0).abs() < 1e-12);
        assert!((freq[1] - 0.25).abs() < 1e-12);
        // Nyquist bin stays positive
        assert!((freq[2] - 0.5).abs() < 1e-12);
        assert!((freq[3] + 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_idx_to_digfreq_odd() {
        let freq = digital_frequencies(5);
        assert!((freq[2] - 0.4).abs() < 1e-12);
        assert!((freq[3] + 0.4).abs() < 1e-12);
        assert!((freq[4] + 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_digfreq_to_idx() {
        assert_eq!(digfreq_to_idx(0.05, 32), 2);
        assert_eq!(digfreq_to_idx(0.5, 32), 16);
        assert_eq!(digfreq_to_idx(-0.25, 8), 6);
        assert_eq!(digfreq_to_idx(0.3, 1), 0);
    }
}
