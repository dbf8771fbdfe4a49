//! Outlier trimming of a directional resolution volume

use super::mask::{Mask, VoxelState};
use super::sweep::MASK_CUTOFF;

/// Tolerance when comparing against the finest visited resolution (Å)
const LAST_RES_TOLERANCE: f64 = 0.001;

/// Reference values used by [`trim_outliers`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrimSummary {
    /// Finest resolution tested in the sweep
    pub last_resolution: f64,
    pub median: f64,
    /// Upper `1 - MASK_CUTOFF` quantile
    pub trim_value: f64,
}

/// Clip resolutions finer than the sweep reached and coarse outliers
///
/// Values below the finest visited resolution are replaced by the median
/// (candidate voxels) or zeroed and dropped from the mask (other voxels).
/// Values above the upper quantile are replaced by the median and dropped
/// from the mask. Returns `None` and leaves the inputs untouched when there
/// is nothing to trim.
pub fn trim_outliers(resolution: &mut [f64], mask: &mut Mask, visited: &[f64]) -> Option<TrimSummary> {
    let last_resolution = *visited.last()?;

    let mut values: Vec<f64> = resolution.iter()
        .copied()
        .filter(|&r| r > last_resolution - LAST_RES_TOLERANCE)
        .collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len();
    let median = values[n / 2];
    let trim_idx = (((1.0 - MASK_CUTOFF) * n as f64) as usize).min(n - 1);
    let trim_value = values[trim_idx];

    for (r, state) in resolution.iter_mut().zip(mask.states.iter_mut()) {
        if *r < last_resolution {
            if state.is_candidate() {
                *r = median;
            } else {
                *r = 0.0;
                *state = VoxelState::Outside;
            }
        }
        if *r > trim_value {
            *r = median;
            *state = VoxelState::Outside;
        }
    }

    Some(TrimSummary { last_resolution, median, trim_value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_visited_is_noop() {
        let mut res = vec![3.0, 4.0];
        let mut mask = Mask::from_labels(&[1, 1], 2, 1, 1);
        assert!(trim_outliers(&mut res, &mut mask, &[]).is_none());
        assert_eq!(res, vec![3.0, 4.0]);
    }

    #[test]
    fn test_coarse_outlier_is_replaced_by_median() {
        let mut res: Vec<f64> = (0..200).map(|i| 4.0 + (i % 4) as f64).collect();
        res[7] = 100.0;
        let mut mask = Mask::from_labels(&vec![1; 200], 200, 1, 1);

        let summary = trim_outliers(&mut res, &mut mask, &[10.0, 6.0, 4.0]).unwrap();
        assert_eq!(summary.median, 6.0);
        assert_eq!(summary.trim_value, 7.0);
        assert_eq!(res[7], summary.median);
        assert_eq!(mask.states[7], VoxelState::Outside);
        assert!(res.iter().all(|&r| r <= summary.trim_value));
    }

    #[test]
    fn test_fine_values_follow_mask_state() {
        let mut res = vec![2.0, 2.0, 5.0, 5.0, 6.0];
        let mut mask = Mask::from_labels(&[1, 0, 1, 1, 1], 5, 1, 1);

        let summary = trim_outliers(&mut res, &mut mask, &[8.0, 5.0]).unwrap();
        assert_eq!(summary.median, 5.0);
        // candidate voxel gets the median, background voxel is cleared
        assert_eq!(res[0], 5.0);
        assert_eq!(res[1], 0.0);
        assert_eq!(mask.states[1], VoxelState::Outside);
        assert_eq!(mask.states[0], VoxelState::Inside);
    }
}
