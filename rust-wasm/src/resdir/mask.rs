//! Per-voxel mask state
//!
//! Integer labels are only used at the boundaries (input masks, exported
//! maps); the sweep works on [`VoxelState`].

use crate::fft::idx3d;

/// Number of consecutive failed tests after which a voxel is excluded
pub const PENDING_LIMIT: u8 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoxelState {
    /// Background, used as noise reference when no half maps are given
    Outside,
    /// Still passing the resolution test
    Inside,
    /// Failed the last `n` tests in a row
    Pending(u8),
    /// Frozen, no longer tested
    Excluded,
}

impl VoxelState {
    /// `<0` excluded, `0` outside, `1` inside, `1+k` pending for `k` steps
    pub fn from_label(label: i32) -> Self {
        match label {
            l if l < 0 => VoxelState::Excluded,
            0 => VoxelState::Outside,
            1 => VoxelState::Inside,
            l => VoxelState::Pending((l - 1).min(u8::MAX as i32) as u8),
        }
    }

    pub fn label(self) -> i32 {
        match self {
            VoxelState::Excluded => -1,
            VoxelState::Outside => 0,
            VoxelState::Inside => 1,
            VoxelState::Pending(k) => 1 + k as i32,
        }
    }

    /// Voxel still taking part in the signal statistics
    #[inline]
    pub fn is_candidate(self) -> bool {
        matches!(self, VoxelState::Inside | VoxelState::Pending(_))
    }

    /// State after a failed threshold test
    pub fn fail(self) -> Self {
        match self {
            VoxelState::Inside => VoxelState::Pending(1),
            VoxelState::Pending(k) if k + 1 < PENDING_LIMIT => VoxelState::Pending(k + 1),
            VoxelState::Pending(_) => VoxelState::Excluded,
            other => other,
        }
    }
}

/// Voxel states of a volume
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub states: Vec<VoxelState>,
}

impl Mask {
    pub fn from_labels(labels: &[i32], nx: usize, ny: usize, nz: usize) -> Self {
        Self {
            nx, ny, nz,
            states: labels.iter().map(|&l| VoxelState::from_label(l)).collect(),
        }
    }

    pub fn to_labels(&self) -> Vec<i32> {
        self.states.iter().map(|s| s.label()).collect()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of voxels in state `state`
    pub fn count(&self, state: VoxelState) -> usize {
        self.states.iter().filter(|&&s| s == state).count()
    }

    pub fn is_inside(&self, n: usize) -> bool {
        self.states[n] == VoxelState::Inside
    }
}

/// Build the static mask from integer labels
///
/// Returns the mask and the number of voxels labelled 1 in the input, counted
/// before voxels farther than `radius` from the volume center are excluded.
pub fn prepare_mask(labels: &[i32], nx: usize, ny: usize, nz: usize, radius: f64) -> (Mask, usize) {
    let original_count = labels.iter().filter(|&&l| l == 1).count();
    let mut mask = Mask::from_labels(labels, nx, ny, nz);

    let r2 = radius * radius;
    let (cx, cy, cz) = ((nx / 2) as f64, (ny / 2) as f64, (nz / 2) as f64);
    for k in 0..nz {
        let z = k as f64 - cz;
        for j in 0..ny {
            let y = j as f64 - cy;
            for i in 0..nx {
                let x = i as f64 - cx;
                if x * x + y * y + z * z > r2 {
                    mask.states[idx3d(i, j, k, nx, ny)] = VoxelState::Excluded;
                }
            }
        }
    }

    (mask, original_count)
}
