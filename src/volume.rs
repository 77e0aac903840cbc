use crate::enums::Plane;

use ndarray::{Array2, Array3, ArrayView2, Axis, s};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SliceError {
    #[error("slice index {index} out of range for the {plane} plane ({count} slices)")]
    IndexOutOfRange {
        plane: Plane,
        index: usize,
        count: usize,
    },
}

/// A decoded volume in canonical axis order.
///
/// Axis 0 is sagittal, axis 1 coronal, axis 2 axial. The loader
/// establishes this ordering before a `Volume` is constructed.
pub struct Volume {
    data: Array3<f32>,
}

impl Volume {
    pub fn new(data: Array3<f32>) -> Self {
        Self { data }
    }

    /// Get the dimensions of the volume (sagittal, coronal, axial)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }
}

/// Number of cross-sections the volume holds along the given plane.
pub fn slice_count(dim: (usize, usize, usize), plane: Plane) -> usize {
    match plane {
        Plane::Sagittal => dim.0,
        Plane::Coronal => dim.1,
        Plane::Axial => dim.2,
    }
}

/// Extract the cross-section at `index` along `plane`, corrected to
/// display orientation.
///
/// The raw section comes out of the array with its rows and columns in
/// storage order; a quarter-turn counter-clockwise rotation brings every
/// plane to the conventional anatomical display orientation.
pub fn extract_section<T: Copy>(
    volume: &Array3<T>,
    plane: Plane,
    index: usize,
) -> Result<Array2<T>, SliceError> {
    let count = slice_count(volume.dim(), plane);
    if index >= count {
        return Err(SliceError::IndexOutOfRange {
            plane,
            index,
            count,
        });
    }

    let section = match plane {
        Plane::Sagittal => volume.slice(s![index, .., ..]),
        Plane::Coronal => volume.slice(s![.., index, ..]),
        Plane::Axial => volume.slice(s![.., .., index]),
    };

    Ok(rotate_quarter_turn(section))
}

/// Rotate 90 degrees counter-clockwise: transpose, then reverse the row
/// axis. `rotated[i, j] == section[j, cols - 1 - i]`.
fn rotate_quarter_turn<T: Copy>(section: ArrayView2<'_, T>) -> Array2<T> {
    let mut rotated = section.reversed_axes();
    rotated.invert_axis(Axis(0));
    rotated.to_owned()
}
