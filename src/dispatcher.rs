use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

use crate::enums::{BitDepth, Plane, ToneMap};
use crate::extractor::{self, ExtractError, FrameSink};
use crate::series_loader::{SeriesLoadError, SeriesLoader};
use crate::volume_loader::{VolumeLoadError, VolumeLoader};

/// Options for one extraction run. Fixed for the whole run; every frame
/// is produced under the same plane, depth and tone-map settings.
#[derive(Clone, Copy, Debug)]
pub struct SliceOptions {
    /// Iteration axis. Only meaningful for volume inputs; a series is a
    /// flat enumeration without volumetric structure.
    pub plane: Plane,
    pub bit_depth: BitDepth,
    pub tone_map: ToneMap,
    pub clamp_percentile: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct RunSummary {
    pub frames: usize,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(
        "unsupported input {}: expected a .nii/.nii.gz file or a directory of .dcm files",
        .0.display()
    )]
    UnsupportedInput(PathBuf),

    #[error(transparent)]
    VolumeLoad(#[from] VolumeLoadError),

    #[error(transparent)]
    SeriesLoad(#[from] SeriesLoadError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Route an input to the matching extraction path and drive it to
/// completion.
///
/// A directory is treated as a DICOM series, a `.nii`/`.nii.gz` file as
/// a volume. Anything else is rejected without retry.
pub fn run(
    input: &Path,
    options: &SliceOptions,
    sink: &mut dyn FrameSink,
) -> Result<RunSummary, DispatchError> {
    if input.is_dir() {
        info!("slicing DICOM series {}", input.display());
        let slices = SeriesLoader::load_from_directory(input)?;
        let frames = extractor::extract_series(
            slices,
            options.bit_depth,
            options.tone_map,
            options.clamp_percentile,
            sink,
        )?;
        Ok(RunSummary { frames })
    } else if is_nifti_file(input) {
        info!("slicing volume {} along the {} plane", input.display(), options.plane);
        let volume = VolumeLoader::load(input)?;
        let frames = extractor::extract_volume(
            volume,
            options.plane,
            options.bit_depth,
            options.tone_map,
            options.clamp_percentile,
            sink,
        )?;
        Ok(RunSummary { frames })
    } else {
        Err(DispatchError::UnsupportedInput(input.to_path_buf()))
    }
}

fn is_nifti_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    let name = name.to_ascii_lowercase();
    name.ends_with(".nii") || name.ends_with(".nii.gz")
}
