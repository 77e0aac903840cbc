//! # volume-slicer library
//!
//! This crate turns 3D medical imaging volumes into sequences of
//! normalized 2D grayscale images.

//!
//! Two input forms are supported. A NIfTI file (".nii" or ".nii.gz") is
//! decoded into a single volume, reoriented to canonical axis order and
//! sliced along one of the three medical axes:
//!  - Sagittal
//!  - Coronal
//!  - Axial
//!
//!  A directory of ".dcm" files is treated as a flat series instead:
//!  each file is decoded independently and emitted as one frame, in
//!  file-name order. Intensities are tone-mapped into an 8- or 16-bit
//!  pixel range, either by a direct cast or by percentile clamping, and
//!  every produced frame is handed to a [`FrameSink`]. Volume runs
//!  tone-map the whole volume at once so all slices share one dynamic
//!  range; series runs tone-map each file on its own.
//!
//! # Examples
//!
//! ## Slicing a volume into PNG files
//!
//! To cut every axial cross-section of a scan into `out/` with the
//! intensity range clamped at the 99th percentile:
//!
//! ```no_run
//! # use volume_slicer::{BitDepth, Plane, PngSink, SliceOptions, ToneMap, run};
//! # use std::path::{Path, PathBuf};
//! let options = SliceOptions {
//!     plane: Plane::Axial,
//!     bit_depth: BitDepth::Eight,
//!     tone_map: ToneMap::PercentileClamp,
//!     clamp_percentile: 99.0,
//! };
//! let mut sink = PngSink::new(PathBuf::from("out"), options.plane);
//! let summary = run(Path::new("scan.nii.gz"), &options, &mut sink)
//!     .expect("should have sliced the volume");
//! println!("{} frames", summary.frames);
//! ```

pub mod dispatcher;
pub mod enums;
pub mod extractor;
pub mod png_sink;
pub mod series_loader;
pub mod tone_map;
pub mod volume;
pub mod volume_loader;

pub use dispatcher::{DispatchError, RunSummary, SliceOptions, run};
pub use enums::{BitDepth, Plane, ToneMap};
pub use extractor::{Frame, FrameId, FrameSink};
pub use png_sink::PngSink;
pub use volume::Volume;
