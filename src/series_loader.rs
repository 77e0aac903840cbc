use crate::extractor::SeriesSlice;

use dicom::{
    object::open_file,
    pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption},
};
use log::debug;
use ndarray::{Array2, s};
use std::{fs, path::Path, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeriesLoadError {
    #[error("no DICOM slices found in {}", .0.display())]
    NoValidImages(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: Box<dicom::object::ReadError>,
    },

    #[error("failed to decode pixel data from {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: Box<dicom::pixeldata::Error>,
    },
}

pub struct SeriesLoader;

impl SeriesLoader {
    /// Decode every `.dcm` file in a directory, in file-name order.
    ///
    /// Each file is decoded on its own; no volume is assembled. The
    /// returned order is the enumeration order downstream file names are
    /// derived from, so it is pinned by sorting rather than left to the
    /// platform's directory listing. A file that fails to decode fails
    /// the whole load.
    pub fn load_from_directory(path: impl AsRef<Path>) -> Result<Vec<SeriesSlice>, SeriesLoadError> {
        let path = path.as_ref();
        let mut paths: Vec<_> = fs::read_dir(path)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
            })
            .collect();

        if paths.is_empty() {
            return Err(SeriesLoadError::NoValidImages(path.to_path_buf()));
        }
        paths.sort();

        paths
            .iter()
            .map(|path| {
                let data = Self::decode_slice(path)?;
                debug!("decoded {} ({:?})", path.display(), data.dim());
                Ok(SeriesSlice {
                    name: Self::slice_name(path),
                    data,
                })
            })
            .collect()
    }

    /// Decode one DICOM file to a 2D intensity array. Multiframe files
    /// contribute their first frame; only the first sample plane is kept.
    fn decode_slice(path: &Path) -> Result<Array2<f32>, SeriesLoadError> {
        let object = open_file(path).map_err(|source| SeriesLoadError::Read {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;

        let pixel_data = object
            .decode_pixel_data()
            .map_err(|source| SeriesLoadError::Decode {
                path: path.to_path_buf(),
                source: Box::new(source),
            })?;

        let options = ConvertOptions::new().with_voi_lut(VoiLutOption::First);
        pixel_data
            .to_ndarray_with_options::<f32>(&options)
            .map(|array| array.slice_move(s![0, .., .., 0]))
            .map_err(|source| SeriesLoadError::Decode {
                path: path.to_path_buf(),
                source: Box::new(source),
            })
    }

    fn slice_name(path: &Path) -> String {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    }
}
