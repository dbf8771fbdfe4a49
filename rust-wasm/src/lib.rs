//! ResDir-WASM: directional local resolution of cryo-EM maps in WebAssembly
//!
//! This crate estimates, for every voxel of a 3D density map, the local
//! resolution along a set of projection directions and derives anisotropy
//! maps from them. It runs natively or in the browser.
//!
//! # Modules
//! - `fft`: 3D FFT operations using rustfft
//! - `resdir`: frequency field, monogenic amplitude, per-direction sweep,
//!   aggregation and anisotropy extraction
//! - `directions`: hemisphere sampling of projection directions
//! - `symmetry`: cN / dN point-group symmetrization
//! - `nifti_io`: NIfTI load/save on byte buffers

// Core modules
pub mod error;
pub mod fft;

// Algorithm modules
pub mod directions;
pub mod resdir;
pub mod symmetry;

// I/O modules
pub mod nifti_io;

pub use error::{ResDirError, ResDirResult};

use wasm_bindgen::prelude::*;

use crate::directions::{fold_projection_angles, hemisphere_directions, Direction};
use crate::resdir::{DirectionalResolution, ResDirParams};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

#[allow(unused_macros)]
macro_rules! console_log {
    ($($t:tt)*) => (log(&format_args!($($t)*).to_string()))
}

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn js_error(e: ResDirError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Parse a JSON parameter string; an empty string gives the defaults
fn parse_params(params_json: &str) -> Result<ResDirParams, JsValue> {
    if params_json.trim().is_empty() {
        return Ok(ResDirParams::default());
    }
    ResDirParams::from_json(params_json).map_err(js_error)
}

/// Flattened `[rot0, tilt0, rot1, tilt1, ...]` angles, or the hemisphere
/// sampling of `params` when empty
fn resolve_directions(angles: &[f64], params: &ResDirParams) -> Result<Vec<Direction>, JsValue> {
    if angles.is_empty() {
        return Ok(hemisphere_directions(params.angular_sampling));
    }
    if angles.len() % 2 != 0 {
        return Err(JsValue::from_str("Direction angles must come in (rot, tilt) pairs"));
    }
    let pairs: Vec<(f64, f64)> = angles.chunks_exact(2).map(|c| (c[0], c[1])).collect();
    Ok(fold_projection_angles(&pairs))
}

fn set(obj: &js_sys::Object, key: &str, value: &JsValue) -> Result<(), JsValue> {
    js_sys::Reflect::set(obj, &key.into(), value).map(|_| ())
}

/// Pack a run's maps into a JS object of typed arrays
fn result_to_js(out: &DirectionalResolution) -> Result<js_sys::Object, JsValue> {
    let result = js_sys::Object::new();

    let maps: [(&str, &[f64]); 9] = [
        ("meanResolution", out.resolution.mean.as_slice()),
        ("varianceResolution", out.resolution.variance.as_slice()),
        ("maxResolution", out.resolution.max.as_slice()),
        ("minResolution", out.resolution.min.as_slice()),
        ("degreeOfAnisotropy", out.resolution.doa.as_slice()),
        ("lambda1", out.anisotropy.lambda1.as_slice()),
        ("lambda2", out.anisotropy.lambda2.as_slice()),
        ("lambda3", out.anisotropy.lambda3.as_slice()),
        ("sphericity", out.anisotropy.sphericity.as_slice()),
    ];
    for (key, data) in maps {
        set(&result, key, &js_sys::Float64Array::from(data))?;
    }

    set(&result, "refinedMask", &js_sys::Int32Array::from(out.refined_mask.as_slice()))?;

    let table = serde_json::to_string(&out.directions)
        .map_err(|e| js_error(ResDirError::from(e)))?;
    set(&result, "directions", &JsValue::from_str(&table))?;

    Ok(result)
}

// ============================================================================
// WASM Exports: Directional Resolution
// ============================================================================

/// Directional local resolution
///
/// # Arguments
/// * `map` - Density map (nx * ny * nz), or first half map
/// * `second_half` - Second half map (nx * ny * nz), empty when not available
/// * `mask` - Labels (nx * ny * nz): 1 = macromolecule, 0 = background
/// * `nx`, `ny`, `nz` - Array dimensions
/// * `angles` - Flattened (rot, tilt) pairs in degrees; empty = hemisphere sampling
/// * `params_json` - `ResDirParams` as JSON; missing fields take defaults
///
/// # Returns
/// JS object with Float64Array maps (meanResolution, varianceResolution,
/// maxResolution, minResolution, degreeOfAnisotropy, lambda1-3, sphericity),
/// refinedMask (Int32Array) and directions (JSON table)
#[wasm_bindgen]
pub fn directional_resolution_wasm(
    map: &[f64],
    second_half: &[f64],
    mask: &[i32],
    nx: usize, ny: usize, nz: usize,
    angles: &[f64],
    params_json: &str,
) -> Result<js_sys::Object, JsValue> {
    let params = parse_params(params_json)?;
    let directions = resolve_directions(angles, &params)?;
    let half = if second_half.is_empty() { None } else { Some(second_half) };

    console_log!("WASM directional_resolution: {}x{}x{}, {} directions, half maps: {}",
                 nx, ny, nz, directions.len(), half.is_some());

    let out = resdir::directional_resolution(map, half, mask, nx, ny, nz, &directions, &params)
        .map_err(js_error)?;

    console_log!("WASM directional_resolution complete");
    result_to_js(&out)
}

/// Directional local resolution with progress callback
///
/// `progress_callback(done, total)` is called after every direction.
#[wasm_bindgen]
pub fn directional_resolution_wasm_with_progress(
    map: &[f64],
    second_half: &[f64],
    mask: &[i32],
    nx: usize, ny: usize, nz: usize,
    angles: &[f64],
    params_json: &str,
    progress_callback: &js_sys::Function,
) -> Result<js_sys::Object, JsValue> {
    let params = parse_params(params_json)?;
    let directions = resolve_directions(angles, &params)?;
    let half = if second_half.is_empty() { None } else { Some(second_half) };

    console_log!("WASM directional_resolution with progress: {}x{}x{}, {} directions",
                 nx, ny, nz, directions.len());

    let callback = progress_callback.clone();
    let out = resdir::directional_resolution_with_progress(
        map, half, mask, nx, ny, nz, &directions, &params,
        |current, total| {
            let this = JsValue::null();
            let _ = callback.call2(&this,
                &JsValue::from(current as u32),
                &JsValue::from(total as u32));
        }
    ).map_err(js_error)?;

    console_log!("WASM directional_resolution complete");
    result_to_js(&out)
}

/// Hemisphere sampling directions as flattened (rot, tilt) pairs in degrees
#[wasm_bindgen]
pub fn hemisphere_directions_wasm(angular_step: f64) -> Vec<f64> {
    hemisphere_directions(angular_step)
        .iter()
        .flat_map(|d| [d.rot, d.tilt])
        .collect()
}

/// Default parameters as JSON
#[wasm_bindgen]
pub fn default_params_json() -> Result<String, JsValue> {
    ResDirParams::default().to_json().map_err(js_error)
}

// ============================================================================
// WASM Exports: Utilities
// ============================================================================

/// Check if WASM module is loaded and working
#[wasm_bindgen]
pub fn wasm_health_check() -> bool {
    console_log!("ResDir-WASM module loaded successfully!");
    true
}

/// Get version string
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// ============================================================================
// WASM Exports: NIfTI I/O
// ============================================================================

/// Load a 3D NIfTI map from bytes
///
/// Returns a JS object with: data (Float64Array), dims (array), voxelSize (array), affine (array)
#[wasm_bindgen]
pub fn load_nifti_wasm(bytes: &[u8]) -> Result<js_sys::Object, JsValue> {
    let volume = nifti_io::load_map(bytes).map_err(js_error)?;

    let result = js_sys::Object::new();
    set(&result, "data", &js_sys::Float64Array::from(volume.data.as_slice()))?;

    let dims = js_sys::Array::new();
    dims.push(&JsValue::from(volume.dims.0 as u32));
    dims.push(&JsValue::from(volume.dims.1 as u32));
    dims.push(&JsValue::from(volume.dims.2 as u32));
    set(&result, "dims", &dims)?;

    let voxel_size = js_sys::Array::new();
    voxel_size.push(&JsValue::from(volume.voxel_size.0));
    voxel_size.push(&JsValue::from(volume.voxel_size.1));
    voxel_size.push(&JsValue::from(volume.voxel_size.2));
    set(&result, "voxelSize", &voxel_size)?;

    set(&result, "affine", &js_sys::Float64Array::from(volume.affine.as_slice()))?;

    console_log!("WASM load_nifti: {}x{}x{}, voxel=({:.3},{:.3},{:.3})",
                 volume.dims.0, volume.dims.1, volume.dims.2,
                 volume.voxel_size.0, volume.voxel_size.1, volume.voxel_size.2);

    Ok(result)
}

/// Load a NIfTI mask from bytes as integer labels
#[wasm_bindgen]
pub fn load_mask_wasm(bytes: &[u8]) -> Result<Vec<i32>, JsValue> {
    let (labels, dims) = nifti_io::load_mask_labels(bytes).map_err(js_error)?;
    console_log!("WASM load_mask: {}x{}x{}", dims.0, dims.1, dims.2);
    Ok(labels)
}

fn affine_array(affine: &[f64]) -> Result<[f64; 16], JsValue> {
    <[f64; 16]>::try_from(affine)
        .map_err(|_| JsValue::from_str("Affine matrix must have 16 elements"))
}

/// Save a map as NIfTI bytes
///
/// # Arguments
/// * `data` - Volume data (nx * ny * nz)
/// * `nx`, `ny`, `nz` - Dimensions
/// * `vsx`, `vsy`, `vsz` - Voxel sizes
/// * `affine` - 4x4 affine matrix (16 elements, row-major)
#[wasm_bindgen]
pub fn save_nifti_wasm(
    data: &[f64],
    nx: usize, ny: usize, nz: usize,
    vsx: f64, vsy: f64, vsz: f64,
    affine: &[f64],
) -> Result<Vec<u8>, JsValue> {
    let affine = affine_array(affine)?;
    let bytes = nifti_io::save_map(data, (nx, ny, nz), (vsx, vsy, vsz), &affine)
        .map_err(js_error)?;

    console_log!("WASM save_nifti: {}x{}x{}, {} bytes", nx, ny, nz, bytes.len());
    Ok(bytes)
}

/// Save a map as gzipped NIfTI bytes (.nii.gz)
#[wasm_bindgen]
pub fn save_nifti_gz_wasm(
    data: &[f64],
    nx: usize, ny: usize, nz: usize,
    vsx: f64, vsy: f64, vsz: f64,
    affine: &[f64],
) -> Result<Vec<u8>, JsValue> {
    let affine = affine_array(affine)?;
    let bytes = nifti_io::save_map_gz(data, (nx, ny, nz), (vsx, vsy, vsz), &affine)
        .map_err(js_error)?;

    console_log!("WASM save_nifti_gz: {}x{}x{}, {} bytes (compressed)", nx, ny, nz, bytes.len());
    Ok(bytes)
}
