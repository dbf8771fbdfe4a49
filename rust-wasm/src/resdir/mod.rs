//! Directional local resolution and anisotropy analysis
//!
//! For each sampled direction, a cone-restricted monogenic amplitude is
//! tested against noise at decreasing resolutions. The per-voxel resolutions
//! of all directions are combined into mean, variance, extrema, degree of
//! anisotropy and inertia-tensor eigenvalue maps.

pub mod aggregate;
pub mod anisotropy;
pub mod cone;
pub mod engine;
pub mod frequency;
pub mod mask;
pub mod monogenic;
pub mod params;
pub mod postprocess;
pub mod sweep;

pub use aggregate::DirectionSummary;
pub use anisotropy::{AnisotropyMaps, ResolutionMaps};
pub use engine::{directional_resolution, directional_resolution_with_progress, DirectionalResolution};
#[cfg(feature = "parallel")]
pub use engine::directional_resolution_parallel;
pub use frequency::FrequencyField;
pub use mask::{Mask, VoxelState};
pub use params::ResDirParams;
pub use sweep::Termination;
