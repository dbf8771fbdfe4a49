//! NIfTI volume I/O on byte buffers
//!
//! Maps, half maps and masks are exchanged as `.nii` / `.nii.gz` bytes so the
//! WASM layer never touches a filesystem. Volumes are returned in Fortran
//! order, `index = x + y*nx + z*nx*ny`.

use std::io::{Cursor, Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::Array;
use nifti::volume::ndarray::IntoNdArray;
use nifti::{InMemNiftiObject, NiftiHeader, NiftiObject};

use crate::error::{ResDirError, ResDirResult};

const HEADER_SIZE: usize = 348;
const VOX_OFFSET: usize = HEADER_SIZE + 4;

/// Volume decoded from a NIfTI buffer
#[derive(Clone, Debug)]
pub struct MapVolume {
    pub data: Vec<f64>,
    pub dims: (usize, usize, usize),
    /// Voxel size along x, y, z (Å for cryo-EM maps)
    pub voxel_size: (f64, f64, f64),
    /// 4x4 row-major affine
    pub affine: [f64; 16],
}

impl MapVolume {
    /// Isotropic pixel size, taken from the x axis
    pub fn sampling(&self) -> f64 {
        self.voxel_size.0
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Integer labels, rounding the stored values
    pub fn to_labels(&self) -> Vec<i32> {
        self.data.iter().map(|v| v.round() as i32).collect()
    }
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}

/// Short description of a raw header for error messages
fn describe_header(bytes: &[u8]) -> String {
    if bytes.len() < HEADER_SIZE {
        return format!("{} bytes, shorter than a NIfTI-1 header", bytes.len());
    }
    let sizeof_hdr = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let datatype = i16::from_le_bytes([bytes[70], bytes[71]]);
    let magic = String::from_utf8_lossy(&bytes[344..348]).to_string();
    format!("sizeof_hdr={}, datatype={}, magic='{}'", sizeof_hdr, datatype, magic)
}

fn read_object(bytes: &[u8]) -> ResDirResult<InMemNiftiObject> {
    if is_gzip(bytes) {
        InMemNiftiObject::from_reader(GzDecoder::new(Cursor::new(bytes))).map_err(|e| {
            let mut raw = Vec::new();
            let info = match GzDecoder::new(Cursor::new(bytes)).read_to_end(&mut raw) {
                Ok(_) => describe_header(&raw),
                Err(_) => "not a valid gzip stream".to_string(),
            };
            ResDirError::Nifti(format!("cannot read gzipped volume: {} ({})", e, info))
        })
    } else {
        InMemNiftiObject::from_reader(Cursor::new(bytes)).map_err(|e| {
            ResDirError::Nifti(format!("cannot read volume: {} ({})", e, describe_header(bytes)))
        })
    }
}

fn affine_from_header(header: &NiftiHeader) -> [f64; 16] {
    if header.sform_code > 0 {
        let (x, y, z) = (&header.srow_x, &header.srow_y, &header.srow_z);
        [
            x[0] as f64, x[1] as f64, x[2] as f64, x[3] as f64,
            y[0] as f64, y[1] as f64, y[2] as f64, y[3] as f64,
            z[0] as f64, z[1] as f64, z[2] as f64, z[3] as f64,
            0.0, 0.0, 0.0, 1.0,
        ]
    } else {
        let p = &header.pixdim;
        [
            p[1] as f64, 0.0, 0.0, 0.0,
            0.0, p[2] as f64, 0.0, 0.0,
            0.0, 0.0, p[3] as f64, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]
    }
}

/// Decode a 3D map from `.nii` or `.nii.gz` bytes
///
/// A 4D file contributes its first volume.
pub fn load_map(bytes: &[u8]) -> ResDirResult<MapVolume> {
    let obj = read_object(bytes)?;
    let header = obj.header();

    if header.dim[0] < 3 {
        return Err(ResDirError::Nifti(format!(
            "expected a 3D volume, got {} dimensions",
            header.dim[0]
        )));
    }
    let voxel_size = (
        header.pixdim[1] as f64,
        header.pixdim[2] as f64,
        header.pixdim[3] as f64,
    );
    let affine = affine_from_header(header);

    let array: Array<f64, _> = obj.into_volume()
        .into_ndarray()
        .map_err(|e| ResDirError::Nifti(format!("cannot convert volume: {}", e)))?;

    let shape = array.shape().to_vec();
    if shape.len() < 3 {
        return Err(ResDirError::Nifti(format!("expected a 3D array, got {}D", shape.len())));
    }
    let (nx, ny, nz) = (shape[0], shape[1], shape[2]);

    let mut data = Vec::with_capacity(nx * ny * nz);
    for k in 0..nz {
        for j in 0..ny {
            for i in 0..nx {
                let v = if shape.len() == 3 { array[[i, j, k]] } else { array[[i, j, k, 0]] };
                data.push(v);
            }
        }
    }

    Ok(MapVolume { data, dims: (nx, ny, nz), voxel_size, affine })
}

/// Decode an integer label mask
pub fn load_mask_labels(bytes: &[u8]) -> ResDirResult<(Vec<i32>, (usize, usize, usize))> {
    let volume = load_map(bytes)?;
    Ok((volume.to_labels(), volume.dims))
}

/// Encode a map as an uncompressed float32 `.nii` buffer
pub fn save_map(
    data: &[f64],
    dims: (usize, usize, usize),
    voxel_size: (f64, f64, f64),
    affine: &[f64; 16],
) -> ResDirResult<Vec<u8>> {
    let (nx, ny, nz) = dims;
    if nx * ny * nz != data.len() {
        return Err(ResDirError::SizeMismatch { what: "output map", expected: nx * ny * nz, actual: data.len() });
    }
    let too_large = |n: usize| ResDirError::Nifti(format!("dimension {} does not fit a NIfTI-1 header", n));
    let dim_i16 = |n: usize| i16::try_from(n).map_err(|_| too_large(n));

    let mut header = [0u8; HEADER_SIZE];
    header[0..4].copy_from_slice(&(HEADER_SIZE as i32).to_le_bytes());

    let dim: [i16; 8] = [3, dim_i16(nx)?, dim_i16(ny)?, dim_i16(nz)?, 1, 1, 1, 1];
    for (i, d) in dim.iter().enumerate() {
        header[40 + 2 * i..42 + 2 * i].copy_from_slice(&d.to_le_bytes());
    }

    // float32
    header[70..72].copy_from_slice(&16i16.to_le_bytes());
    header[72..74].copy_from_slice(&32i16.to_le_bytes());

    let (vx, vy, vz) = voxel_size;
    let pixdim: [f32; 8] = [1.0, vx as f32, vy as f32, vz as f32, 1.0, 1.0, 1.0, 1.0];
    for (i, p) in pixdim.iter().enumerate() {
        header[76 + 4 * i..80 + 4 * i].copy_from_slice(&p.to_le_bytes());
    }

    header[108..112].copy_from_slice(&(VOX_OFFSET as f32).to_le_bytes());
    header[112..116].copy_from_slice(&1.0f32.to_le_bytes());
    header[116..120].copy_from_slice(&0.0f32.to_le_bytes());

    // sform_code = 1
    header[254..256].copy_from_slice(&1i16.to_le_bytes());
    for (row, offset) in [280usize, 296, 312].iter().enumerate() {
        for c in 0..4 {
            let o = offset + 4 * c;
            header[o..o + 4].copy_from_slice(&(affine[4 * row + c] as f32).to_le_bytes());
        }
    }

    header[344..348].copy_from_slice(b"n+1\0");

    let mut buffer = Vec::with_capacity(VOX_OFFSET + 4 * data.len());
    buffer.extend_from_slice(&header);
    buffer.extend_from_slice(&[0u8; 4]);
    for &v in data {
        buffer.extend_from_slice(&(v as f32).to_le_bytes());
    }
    Ok(buffer)
}

/// Encode a map as a gzipped `.nii.gz` buffer
pub fn save_map_gz(
    data: &[f64],
    dims: (usize, usize, usize),
    voxel_size: (f64, f64, f64),
    affine: &[f64; 16],
) -> ResDirResult<Vec<u8>> {
    let raw = save_map(data, dims, voxel_size, affine)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw)
        .map_err(|e| ResDirError::Nifti(format!("gzip compression failed: {}", e)))?;
    encoder.finish()
        .map_err(|e| ResDirError::Nifti(format!("gzip compression failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY: [f64; 16] = [
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ];

    #[test]
    fn test_affine_without_sform() {
        let mut header = NiftiHeader::default();
        header.pixdim[1] = 1.2;
        header.pixdim[2] = 1.2;
        header.pixdim[3] = 2.0;
        header.sform_code = 0;

        let affine = affine_from_header(&header);
        assert!((affine[0] - 1.2).abs() < 1e-6);
        assert!((affine[10] - 2.0).abs() < 1e-6);
        assert_eq!(affine[15], 1.0);
    }

    #[test]
    fn test_gzip_detection() {
        assert!(is_gzip(&[0x1f, 0x8b, 0x08]));
        assert!(!is_gzip(&[0x1f]));
    }

    #[test]
    fn test_saved_header_layout() {
        let bytes = save_map(&[0.0; 24], (2, 3, 4), (1.5, 1.5, 1.5), &IDENTITY).unwrap();
        assert_eq!(bytes.len(), VOX_OFFSET + 24 * 4);
        assert_eq!(&bytes[344..348], b"n+1\0");
        assert_eq!(i16::from_le_bytes([bytes[42], bytes[43]]), 2);
        assert_eq!(i16::from_le_bytes([bytes[46], bytes[47]]), 4);
    }

    #[test]
    fn test_size_mismatch_rejected() {
        assert!(matches!(
            save_map(&[0.0; 5], (2, 2, 2), (1.0, 1.0, 1.0), &IDENTITY),
            Err(ResDirError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_gzipped_map_reads_back() {
        let data: Vec<f64> = (0..24).map(|v| v as f64 * 0.5).collect();
        let bytes = save_map_gz(&data, (2, 3, 4), (1.5, 1.5, 1.5), &IDENTITY).unwrap();
        let volume = load_map(&bytes).unwrap();
        assert_eq!(volume.dims, (2, 3, 4));
        assert!((volume.sampling() - 1.5).abs() < 1e-6);
        assert_eq!(volume.data, data);
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(matches!(load_map(&[1, 2, 3]), Err(ResDirError::Nifti(_))));
    }
}
