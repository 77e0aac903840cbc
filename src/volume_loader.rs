use crate::volume::Volume;

use log::{debug, warn};
use ndarray::{Array3, ArrayD, Axis, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolumeLoadError {
    #[error("failed to read NIfTI file {path}: {source}")]
    Nifti {
        path: String,
        #[source]
        source: nifti::NiftiError,
    },

    #[error("{path} holds a {dims}-dimensional image, expected a volume")]
    NotVolumetric { path: String, dims: usize },
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load a NIfTI volume and reorient it to canonical axis order
    /// (sagittal, coronal, axial).
    ///
    /// Scanner scaling (`scl_slope`/`scl_inter`) is applied by the codec.
    /// Images with more than three dimensions are reduced to their
    /// leading 3D sub-volume.
    pub fn load(path: impl AsRef<Path>) -> Result<Volume, VolumeLoadError> {
        let path = path.as_ref();
        let object = ReaderOptions::new()
            .read_file(path)
            .map_err(|source| VolumeLoadError::Nifti {
                path: path.display().to_string(),
                source,
            })?;

        let header = object.header().clone();
        let data = object
            .into_volume()
            .into_ndarray::<f32>()
            .map_err(|source| VolumeLoadError::Nifti {
                path: path.display().to_string(),
                source,
            })?;

        let data = Self::reduce_to_3d(data, path)?;
        debug!("decoded volume {:?} from {}", data.dim(), path.display());

        Ok(Volume::new(Self::canonicalize(data, &header)))
    }

    fn reduce_to_3d(mut data: ArrayD<f32>, path: &Path) -> Result<Array3<f32>, VolumeLoadError> {
        let dims = data.ndim();
        if dims < 3 {
            return Err(VolumeLoadError::NotVolumetric {
                path: path.display().to_string(),
                dims,
            });
        }
        if dims > 3 {
            warn!(
                "{} has {dims} dimensions, keeping the leading 3D sub-volume",
                path.display()
            );
        }
        while data.ndim() > 3 {
            let last_axis = data.ndim() - 1;
            data = data.index_axis_move(Axis(last_axis), 0);
        }

        data.into_dimensionality::<Ix3>()
            .map_err(|_| VolumeLoadError::NotVolumetric {
                path: path.display().to_string(),
                dims,
            })
    }

    /// Permute and flip the voxel axes so axis 0 advances left-to-right,
    /// axis 1 back-to-front and axis 2 bottom-to-top.
    ///
    /// Each column of the sform rotation tells how one voxel axis moves
    /// through world space; the dominant row decides which anatomical
    /// axis it becomes, the sign whether it must be reversed. Files
    /// without an sform, or with a degenerate one, are used as stored.
    fn canonicalize(data: Array3<f32>, header: &NiftiHeader) -> Array3<f32> {
        if header.sform_code <= 0 {
            debug!("no sform, keeping stored orientation");
            return data;
        }

        let rows = [header.srow_x, header.srow_y, header.srow_z];
        let mut world_axis = [0usize; 3];
        let mut flip = [false; 3];
        for voxel_axis in 0..3 {
            let mut dominant = 0;
            for row in 1..3 {
                if rows[row][voxel_axis].abs() > rows[dominant][voxel_axis].abs() {
                    dominant = row;
                }
            }
            world_axis[voxel_axis] = dominant;
            flip[voxel_axis] = rows[dominant][voxel_axis] < 0.0;
        }

        // A usable sform maps each voxel axis to a distinct world axis.
        let mut permutation = [usize::MAX; 3];
        for (voxel_axis, &world) in world_axis.iter().enumerate() {
            permutation[world] = voxel_axis;
        }
        if permutation.contains(&usize::MAX) {
            warn!("degenerate sform, keeping stored orientation");
            return data;
        }

        debug!("canonical reorientation: permutation {permutation:?}, flips {flip:?}");
        let mut canonical = data.permuted_axes(permutation);
        for world in 0..3 {
            if flip[permutation[world]] {
                canonical.invert_axis(Axis(world));
            }
        }
        canonical
    }
}
