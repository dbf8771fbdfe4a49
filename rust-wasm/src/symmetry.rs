//! Point-group symmetrization of resolution volumes
//!
//! Only the cyclic (`cN`) and dihedral (`dN`) groups are handled, with the
//! symmetry axis along z and the dihedral 2-fold along x.

use std::f64::consts::PI;
use std::fmt;

use crate::error::{ResDirError, ResDirResult};
use crate::fft::idx3d;

type Rotation = [[f64; 3]; 3];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymmetryGroup {
    Cyclic(u32),
    Dihedral(u32),
}

impl SymmetryGroup {
    /// Parse `c1`, `cN` or `dN` (case-insensitive)
    pub fn parse(name: &str) -> ResDirResult<Self> {
        let trimmed = name.trim();
        let unsupported = || ResDirError::UnsupportedSymmetry(name.to_string());

        let mut chars = trimmed.chars();
        let kind = chars.next().ok_or_else(unsupported)?.to_ascii_lowercase();
        let order: u32 = chars.as_str().parse().map_err(|_| unsupported())?;
        if order == 0 {
            return Err(unsupported());
        }

        match kind {
            'c' => Ok(SymmetryGroup::Cyclic(order)),
            'd' => Ok(SymmetryGroup::Dihedral(order)),
            _ => Err(unsupported()),
        }
    }

    /// Whether the group only holds the identity
    pub fn is_trivial(&self) -> bool {
        matches!(self, SymmetryGroup::Cyclic(1))
    }

    pub fn order(&self) -> usize {
        match *self {
            SymmetryGroup::Cyclic(n) => n as usize,
            SymmetryGroup::Dihedral(n) => 2 * n as usize,
        }
    }

    /// Every rotation of the group, identity first
    pub fn rotations(&self) -> Vec<Rotation> {
        let n = match *self {
            SymmetryGroup::Cyclic(n) | SymmetryGroup::Dihedral(n) => n,
        };
        let mut rots: Vec<Rotation> = (0..n)
            .map(|k| {
                let a = 2.0 * PI * k as f64 / n as f64;
                let (s, c) = a.sin_cos();
                [[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]]
            })
            .collect();

        if let SymmetryGroup::Dihedral(_) = self {
            // 2-fold about x: (x, y, z) -> (x, -y, -z)
            let flipped: Vec<Rotation> = rots.iter()
                .map(|r| [
                    [r[0][0], -r[0][1], -r[0][2]],
                    [r[1][0], -r[1][1], -r[1][2]],
                    [r[2][0], -r[2][1], -r[2][2]],
                ])
                .collect();
            rots.extend(flipped);
        }
        rots
    }
}

impl fmt::Display for SymmetryGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymmetryGroup::Cyclic(n) => write!(f, "c{}", n),
            SymmetryGroup::Dihedral(n) => write!(f, "d{}", n),
        }
    }
}

/// Trilinear sample at a fractional voxel position; neighbours outside the
/// box read as 0
fn sample_trilinear(data: &[f64], nx: usize, ny: usize, nz: usize, x: f64, y: f64, z: f64) -> f64 {
    let (x0, y0, z0) = (x.floor(), y.floor(), z.floor());
    let (fx, fy, fz) = (x - x0, y - y0, z - z0);
    let (x0, y0, z0) = (x0 as i64, y0 as i64, z0 as i64);

    let at = |i: i64, j: i64, k: i64| -> f64 {
        if i < 0 || j < 0 || k < 0 || i >= nx as i64 || j >= ny as i64 || k >= nz as i64 {
            0.0
        } else {
            data[idx3d(i as usize, j as usize, k as usize, nx, ny)]
        }
    };

    let c00 = at(x0, y0, z0) * (1.0 - fx) + at(x0 + 1, y0, z0) * fx;
    let c10 = at(x0, y0 + 1, z0) * (1.0 - fx) + at(x0 + 1, y0 + 1, z0) * fx;
    let c01 = at(x0, y0, z0 + 1) * (1.0 - fx) + at(x0 + 1, y0, z0 + 1) * fx;
    let c11 = at(x0, y0 + 1, z0 + 1) * (1.0 - fx) + at(x0 + 1, y0 + 1, z0 + 1) * fx;

    let c0 = c00 * (1.0 - fy) + c10 * fy;
    let c1 = c01 * (1.0 - fy) + c11 * fy;
    c0 * (1.0 - fz) + c1 * fz
}

/// Average `data` over every rotation of `group` about the volume center
pub fn symmetrize(data: &[f64], nx: usize, ny: usize, nz: usize, group: SymmetryGroup) -> Vec<f64> {
    if group.is_trivial() {
        return data.to_vec();
    }

    let rotations = group.rotations();
    let inv_order = 1.0 / rotations.len() as f64;
    let (cx, cy, cz) = ((nx / 2) as f64, (ny / 2) as f64, (nz / 2) as f64);

    let mut out = vec![0.0; data.len()];
    for k in 0..nz {
        let z = k as f64 - cz;
        for j in 0..ny {
            let y = j as f64 - cy;
            for i in 0..nx {
                let x = i as f64 - cx;
                let mut acc = 0.0;
                for r in &rotations {
                    let rx = r[0][0] * x + r[0][1] * y + r[0][2] * z + cx;
                    let ry = r[1][0] * x + r[1][1] * y + r[1][2] * z + cy;
                    let rz = r[2][0] * x + r[2][1] * y + r[2][2] * z + cz;
                    acc += sample_trilinear(data, nx, ny, nz, rx, ry, rz);
                }
                out[idx3d(i, j, k, nx, ny)] = acc * inv_order;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(SymmetryGroup::parse("c1").unwrap(), SymmetryGroup::Cyclic(1));
        assert_eq!(SymmetryGroup::parse("C4").unwrap(), SymmetryGroup::Cyclic(4));
        assert_eq!(SymmetryGroup::parse("d7").unwrap(), SymmetryGroup::Dihedral(7));
        assert!(SymmetryGroup::parse("i1").is_err());
        assert!(SymmetryGroup::parse("c0").is_err());
        assert!(SymmetryGroup::parse("").is_err());
        assert!(SymmetryGroup::parse("t").is_err());
    }

    #[test]
    fn test_rotation_count() {
        assert_eq!(SymmetryGroup::Cyclic(5).rotations().len(), 5);
        assert_eq!(SymmetryGroup::Dihedral(3).rotations().len(), 6);
        assert_eq!(SymmetryGroup::Dihedral(3).order(), 6);
    }

    #[test]
    fn test_c1_is_identity() {
        let data: Vec<f64> = (0..27).map(|v| v as f64).collect();
        assert_eq!(symmetrize(&data, 3, 3, 3, SymmetryGroup::Cyclic(1)), data);
    }

    #[test]
    fn test_c2_spreads_point() {
        let (nx, ny, nz) = (8, 8, 8);
        let mut data = vec![0.0; nx * ny * nz];
        data[idx3d(6, 4, 4, nx, ny)] = 1.0;
        let sym = symmetrize(&data, nx, ny, nz, SymmetryGroup::Cyclic(2));
        assert!((sym[idx3d(6, 4, 4, nx, ny)] - 0.5).abs() < 1e-9);
        assert!((sym[idx3d(2, 4, 4, nx, ny)] - 0.5).abs() < 1e-9);
        let total: f64 = sym.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric_volume_is_invariant() {
        let (nx, ny, nz) = (9, 9, 5);
        let mut data = vec![0.0; nx * ny * nz];
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let (x, y) = (i as f64 - 4.0, j as f64 - 4.0);
                    data[idx3d(i, j, k, nx, ny)] = x.abs().max(y.abs()) + k as f64;
                }
            }
        }
        let sym = symmetrize(&data, nx, ny, nz, SymmetryGroup::Cyclic(4));
        for (a, b) in data.iter().zip(sym.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
