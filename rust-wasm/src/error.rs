//! Error types for the directional resolution engine

use thiserror::Error;

/// Result type for resolution-engine operations
pub type ResDirResult<T> = Result<T, ResDirError>;

/// Errors that abort a run before any direction is analysed
///
/// Numerical dead-ends inside a single direction are not errors; they end
/// that direction's sweep with a [`crate::resdir::Termination`] state.
#[derive(Error, Debug)]
pub enum ResDirError {
    /// No mask was supplied
    #[error("a mask defining the macromolecule must be provided")]
    MissingMask,

    /// The mask has no voxel labelled as inside
    #[error("the mask does not contain any voxel inside the region of interest")]
    EmptyMask,

    /// A zero-sized volume was supplied
    #[error("volume dimensions must be non-zero, got {nx}x{ny}x{nz}")]
    EmptyVolume { nx: usize, ny: usize, nz: usize },

    /// Buffer length does not match the declared dimensions
    #[error("{what} has {actual} voxels, expected {expected}")]
    SizeMismatch { what: &'static str, expected: usize, actual: usize },

    /// A parameter is out of its valid range
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Symmetry group not handled by the symmetrizer
    #[error("unsupported symmetry group '{0}' (expected c1, cN or dN)")]
    UnsupportedSymmetry(String),

    /// The direction list is empty
    #[error("no sampling directions to analyse")]
    NoDirections,

    /// NIfTI decoding or encoding failed
    #[error("NIfTI error: {0}")]
    Nifti(String),

    /// Parameters or summaries could not be (de)serialized
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
