//! Directional resolution driver
//!
//! Validates the inputs, prepares the static mask and the spectra once, then
//! runs the sweep for every direction and folds the post-processed results
//! into the aggregators. With the `parallel` feature the direction loop is a
//! rayon fold/reduce; each task owns its FFT workspace.

use num_complex::Complex64;
use tracing::{debug, info, warn};

use super::aggregate::{Aggregator, DirectionSummary};
use super::anisotropy::{extract_anisotropy, finalize_resolution, AnisotropyMaps, ResolutionMaps};
use super::cone::Cone;
use super::frequency::FrequencyField;
use super::mask::{prepare_mask, Mask};
use super::monogenic::MonogenicFilter;
use super::params::ResDirParams;
use super::postprocess::trim_outliers;
use super::sweep::{sweep_direction, SweepConfig, Termination};
use crate::directions::Direction;
use crate::error::{ResDirError, ResDirResult};
use crate::symmetry::{symmetrize, SymmetryGroup};

/// Output of a directional resolution run
#[derive(Clone, Debug)]
pub struct DirectionalResolution {
    pub resolution: ResolutionMaps,
    pub anisotropy: AnisotropyMaps,
    /// One row per analysed direction, in input order
    pub directions: Vec<DirectionSummary>,
    /// 1 where some direction kept the voxel, 0 otherwise, -1 beyond the radius
    pub refined_mask: Vec<i32>,
}

/// Validated inputs shared by every direction
struct PreparedRun {
    nx: usize,
    ny: usize,
    nz: usize,
    signal_map: Vec<f64>,
    noise_map: Option<Vec<f64>>,
    mask: Mask,
    original_count: usize,
    group: SymmetryGroup,
    config: SweepConfig,
    cone_angle: f64,
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> ResDirResult<()> {
    if expected != actual {
        return Err(ResDirError::SizeMismatch { what, expected, actual });
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn prepare(
    map: &[f64],
    second_half: Option<&[f64]>,
    mask_labels: &[i32],
    nx: usize, ny: usize, nz: usize,
    directions: &[Direction],
    params: &ResDirParams,
) -> ResDirResult<PreparedRun> {
    params.validate()?;

    if nx == 0 || ny == 0 || nz == 0 {
        return Err(ResDirError::EmptyVolume { nx, ny, nz });
    }
    let n_total = nx * ny * nz;
    check_len("map", n_total, map.len())?;
    if mask_labels.is_empty() {
        return Err(ResDirError::MissingMask);
    }
    check_len("mask", n_total, mask_labels.len())?;
    if let Some(half) = second_half {
        check_len("second half map", n_total, half.len())?;
    }
    if directions.is_empty() {
        return Err(ResDirError::NoDirections);
    }

    let (mask, original_count) = prepare_mask(mask_labels, nx, ny, nz, params.volume_radius);
    if original_count == 0 {
        return Err(ResDirError::EmptyMask);
    }

    let (signal_map, noise_map) = match second_half {
        Some(half) => {
            let signal = map.iter().zip(half.iter()).map(|(a, b)| 0.5 * (a + b)).collect();
            let noise = map.iter().zip(half.iter()).map(|(a, b)| 0.5 * (a - b)).collect();
            (signal, Some(noise))
        }
        None => (map.to_vec(), None),
    };

    Ok(PreparedRun {
        nx, ny, nz,
        signal_map,
        noise_map,
        mask,
        original_count,
        group: params.symmetry_group()?,
        config: params.sweep_config()?,
        cone_angle: params.cone_angle(),
    })
}

/// Sweep, symmetrize and trim one direction, then fold it into `agg`
fn process_direction(
    run: &PreparedRun,
    filter: &mut MonogenicFilter,
    signal: &[Complex64],
    noise: Option<&[Complex64]>,
    index: usize,
    direction: Direction,
    agg: &mut Aggregator,
) {
    info!(index, rot = direction.rot, tilt = direction.tilt, "analysing direction");

    let cone = Cone::new(direction, run.cone_angle);
    let mut sweep = sweep_direction(
        filter, signal, noise, &run.mask, run.original_count, &cone, &run.config,
    );

    if !run.group.is_trivial() {
        sweep.resolution = symmetrize(&sweep.resolution, run.nx, run.ny, run.nz, run.group);
    }

    match trim_outliers(&mut sweep.resolution, &mut sweep.mask, &sweep.visited) {
        Some(trim) => debug!(
            index,
            median = trim.median,
            trim_value = trim.trim_value,
            "trimmed outliers"
        ),
        None => warn!(index, "no resolution values to post-process"),
    }

    let summary = DirectionSummary::new(
        index, direction, &sweep.resolution, sweep.iterations(), sweep.termination,
    );
    if matches!(sweep.termination, Termination::NoSignalVoxels | Termination::NoNoiseVoxels) {
        warn!(index, termination = %sweep.termination, "direction ended early");
    }
    info!(
        index,
        mean = summary.mean_resolution,
        iterations = summary.iterations,
        termination = %summary.termination,
        "direction finished"
    );

    agg.add(direction, &sweep.resolution, &sweep.mask, &run.mask, summary);
}

fn finish(run: &PreparedRun, agg: Aggregator, n_directions: usize) -> DirectionalResolution {
    DirectionalResolution {
        resolution: finalize_resolution(&agg.resolution, &run.mask, n_directions),
        anisotropy: extract_anisotropy(&agg.inertia, &run.mask),
        refined_mask: agg.refined.to_labels(&run.mask),
        directions: agg.summaries,
    }
}

fn spectra(
    filter: &mut MonogenicFilter,
    run: &PreparedRun,
) -> (Vec<Complex64>, Option<Vec<Complex64>>) {
    let signal = filter.spectrum_of(&run.signal_map);
    let noise = run.noise_map.as_ref().map(|n| filter.spectrum_of(n));
    (signal, noise)
}

/// Directional local resolution and anisotropy of a map
///
/// `second_half`, when given, is the second independent half map: the
/// analysed map becomes the half-map average and noise is measured on their
/// difference. `mask_labels` uses 1 for the macromolecule and 0 for the
/// background.
#[allow(clippy::too_many_arguments)]
pub fn directional_resolution(
    map: &[f64],
    second_half: Option<&[f64]>,
    mask_labels: &[i32],
    nx: usize, ny: usize, nz: usize,
    directions: &[Direction],
    params: &ResDirParams,
) -> ResDirResult<DirectionalResolution> {
    #[cfg(feature = "parallel")]
    let result = directional_resolution_parallel(
        map, second_half, mask_labels, nx, ny, nz, directions, params,
    );
    #[cfg(not(feature = "parallel"))]
    let result = directional_resolution_with_progress(
        map, second_half, mask_labels, nx, ny, nz, directions, params, |_, _| {},
    );
    result
}

/// Sequential run reporting `(done, total)` after every direction
#[allow(clippy::too_many_arguments)]
pub fn directional_resolution_with_progress<F>(
    map: &[f64],
    second_half: Option<&[f64]>,
    mask_labels: &[i32],
    nx: usize, ny: usize, nz: usize,
    directions: &[Direction],
    params: &ResDirParams,
    progress_callback: F,
) -> ResDirResult<DirectionalResolution>
where
    F: Fn(usize, usize),
{
    let run = prepare(map, second_half, mask_labels, nx, ny, nz, directions, params)?;
    info!(
        nx, ny, nz,
        directions = directions.len(),
        mask_voxels = run.original_count,
        "starting directional resolution"
    );

    let field = FrequencyField::new(nx, ny, nz);
    let mut filter = MonogenicFilter::new(&field);
    let (signal, noise) = spectra(&mut filter, &run);

    let mut agg = Aggregator::new(&run.mask, run.config.max_res);
    let total = directions.len();
    progress_callback(0, total);
    for (index, &direction) in directions.iter().enumerate() {
        process_direction(&run, &mut filter, &signal, noise.as_deref(), index, direction, &mut agg);
        progress_callback(index + 1, total);
    }

    Ok(finish(&run, agg, total))
}

/// Rayon map-reduce over the directions
#[cfg(feature = "parallel")]
#[allow(clippy::too_many_arguments)]
pub fn directional_resolution_parallel(
    map: &[f64],
    second_half: Option<&[f64]>,
    mask_labels: &[i32],
    nx: usize, ny: usize, nz: usize,
    directions: &[Direction],
    params: &ResDirParams,
) -> ResDirResult<DirectionalResolution> {
    use rayon::prelude::*;

    let run = prepare(map, second_half, mask_labels, nx, ny, nz, directions, params)?;
    info!(nx, ny, nz, directions = directions.len(), "starting parallel directional resolution");

    let field = FrequencyField::new(nx, ny, nz);
    let (signal, noise) = spectra(&mut MonogenicFilter::new(&field), &run);
    let max_res = run.config.max_res;

    let agg = directions
        .par_iter()
        .enumerate()
        .fold(
            || (MonogenicFilter::new(&field), Aggregator::new(&run.mask, max_res)),
            |(mut filter, mut agg), (index, &direction)| {
                process_direction(&run, &mut filter, &signal, noise.as_deref(), index, direction, &mut agg);
                (filter, agg)
            },
        )
        .map(|(_, agg)| agg)
        .reduce(|| Aggregator::new(&run.mask, max_res), Aggregator::merge);

    Ok(finish(&run, agg, directions.len()))
}
