use std::fmt;
use std::path::PathBuf;

use image::{DynamicImage, ImageBuffer, Luma};
use log::{debug, info};
use ndarray::{Array2, Array3};
use thiserror::Error;

use crate::enums::{BitDepth, Plane, ToneMap};
use crate::tone_map::{GrayDepth, ToneMapError, tone_map};
use crate::volume::{SliceError, Volume, extract_section, slice_count};

/// Identifier of a produced frame: the cross-section index on the volume
/// path, the source file stem on the series path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameId {
    Index(usize),
    Name(String),
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameId::Index(index) => write!(f, "{index}"),
            FrameId::Name(name) => write!(f, "{name}"),
        }
    }
}

/// One finished raster frame, ready for encoding.
pub struct Frame {
    pub id: FrameId,
    pub image: DynamicImage,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Receives frames in emission order. Delivery order is part of the
/// contract: ascending index for volumes, enumeration order for series.
pub trait FrameSink {
    fn deliver(&mut self, frame: Frame) -> Result<(), SinkError>;
}

/// An independently decoded series member, paired with its identifier.
#[derive(Debug)]
pub struct SeriesSlice {
    pub name: String,
    pub data: Array2<f32>,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    ToneMap(#[from] ToneMapError),

    #[error("tone mapping failed for series slice {name:?}: {source}")]
    SeriesToneMap {
        name: String,
        #[source]
        source: ToneMapError,
    },

    #[error(transparent)]
    Slice(#[from] SliceError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Emit every cross-section of `volume` along `plane` as a frame.
///
/// The whole volume is tone-mapped up front so that percentile
/// statistics cover the full intensity distribution and all slices share
/// one dynamic range; sections are then cut from the already mapped
/// integer volume. Returns the number of frames delivered.
pub fn extract_volume(
    volume: Volume,
    plane: Plane,
    bit_depth: BitDepth,
    policy: ToneMap,
    clamp_percentile: f32,
    sink: &mut dyn FrameSink,
) -> Result<usize, ExtractError> {
    match bit_depth {
        BitDepth::Eight => volume_frames::<u8>(volume, plane, policy, clamp_percentile, sink),
        BitDepth::Sixteen => volume_frames::<u16>(volume, plane, policy, clamp_percentile, sink),
    }
}

fn volume_frames<P: GrayDepth>(
    volume: Volume,
    plane: Plane,
    policy: ToneMap,
    clamp_percentile: f32,
    sink: &mut dyn FrameSink,
) -> Result<usize, ExtractError> {
    let toned: Array3<P> = tone_map(volume.data().view(), policy, clamp_percentile)?;
    let count = slice_count(toned.dim(), plane);
    info!("extracting {count} {plane} sections from volume {:?}", toned.dim());

    for index in 0..count {
        let section = extract_section(&toned, plane, index)?;
        sink.deliver(Frame {
            id: FrameId::Index(index),
            image: section_image(&section),
        })?;
        debug!("delivered {plane} section {index}");
    }

    Ok(count)
}

/// Emit one frame per series member, in the order the members were
/// enumerated.
///
/// Each slice is tone-mapped on its own: no whole-series array exists,
/// so percentile statistics are per-file. The first failure aborts the
/// run, naming the offending slice.
pub fn extract_series(
    slices: Vec<SeriesSlice>,
    bit_depth: BitDepth,
    policy: ToneMap,
    clamp_percentile: f32,
    sink: &mut dyn FrameSink,
) -> Result<usize, ExtractError> {
    match bit_depth {
        BitDepth::Eight => series_frames::<u8>(slices, policy, clamp_percentile, sink),
        BitDepth::Sixteen => series_frames::<u16>(slices, policy, clamp_percentile, sink),
    }
}

fn series_frames<P: GrayDepth>(
    slices: Vec<SeriesSlice>,
    policy: ToneMap,
    clamp_percentile: f32,
    sink: &mut dyn FrameSink,
) -> Result<usize, ExtractError> {
    let count = slices.len();
    info!("extracting {count} series slices");

    for slice in slices {
        let toned: Array2<P> =
            tone_map(slice.data.view(), policy, clamp_percentile).map_err(|source| {
                ExtractError::SeriesToneMap {
                    name: slice.name.clone(),
                    source,
                }
            })?;
        debug!("delivering series slice {}", slice.name);
        sink.deliver(Frame {
            id: FrameId::Name(slice.name),
            image: section_image(&toned),
        })?;
    }

    Ok(count)
}

fn section_image<P: GrayDepth>(section: &Array2<P>) -> DynamicImage {
    let (height, width) = section.dim();
    let image = ImageBuffer::from_fn(width as u32, height as u32, |x, y| {
        Luma([section[[y as usize, x as usize]]])
    });
    P::wrap(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;
    use ndarray::{Array3, arr2};

    #[derive(Default)]
    struct CollectingSink {
        frames: Vec<Frame>,
    }

    impl FrameSink for CollectingSink {
        fn deliver(&mut self, frame: Frame) -> Result<(), SinkError> {
            self.frames.push(frame);
            Ok(())
        }
    }

    /// Fails every delivery after the first.
    #[derive(Default)]
    struct FlakySink {
        delivered: usize,
    }

    impl FrameSink for FlakySink {
        fn deliver(&mut self, _frame: Frame) -> Result<(), SinkError> {
            if self.delivered > 0 {
                return Err(SinkError::Encode {
                    path: PathBuf::from("frame.png"),
                    source: image::ImageError::IoError(std::io::Error::other("disk full")),
                });
            }
            self.delivered += 1;
            Ok(())
        }
    }

    fn sequential_volume() -> Volume {
        let data = Array3::from_shape_vec((4, 4, 4), (0..64).map(|v| v as f32).collect()).unwrap();
        Volume::new(data)
    }

    #[test]
    fn axial_volume_run_produces_one_frame_per_section() {
        let mut sink = CollectingSink::default();
        let count = extract_volume(
            sequential_volume(),
            Plane::Axial,
            BitDepth::Eight,
            ToneMap::Disabled,
            99.0,
            &mut sink,
        )
        .expect("extraction should succeed");

        assert_eq!(count, 4);
        assert_eq!(sink.frames.len(), 4);
        for frame in &sink.frames {
            assert_eq!(frame.image.dimensions(), (4, 4));
        }

        // volume[x, y, z] = 16x + 4y + z; frame 0 fixes z = 0 and rotates.
        let first = sink.frames[0].image.as_luma8().expect("8-bit frames");
        assert_eq!(first.get_pixel(0, 0)[0], 12, "top-left is section[0, 3]");
        assert_eq!(first.get_pixel(0, 3)[0], 0, "volume[0, 0, 0] rotates to bottom-left");
    }

    #[test]
    fn volume_frames_arrive_in_ascending_index_order() {
        let mut sink = CollectingSink::default();
        extract_volume(
            sequential_volume(),
            Plane::Coronal,
            BitDepth::Eight,
            ToneMap::Disabled,
            99.0,
            &mut sink,
        )
        .expect("extraction should succeed");

        let ids: Vec<_> = sink.frames.iter().map(|f| f.id.clone()).collect();
        assert_eq!(
            ids,
            (0..4).map(FrameId::Index).collect::<Vec<_>>(),
            "volume frames must be emitted in ascending section order"
        );
    }

    #[test]
    fn sixteen_bit_volume_run_emits_wide_frames() {
        let mut sink = CollectingSink::default();
        extract_volume(
            sequential_volume(),
            Plane::Axial,
            BitDepth::Sixteen,
            ToneMap::PercentileClamp,
            100.0,
            &mut sink,
        )
        .expect("extraction should succeed");

        let last = sink.frames[3].image.as_luma16().expect("16-bit frames");
        // volume[3, 3, 3] = 63 is the global maximum and maps to 65535.
        assert_eq!(last.get_pixel(3, 0)[0], 65535);
    }

    #[test]
    fn series_frames_keep_enumeration_order_and_normalize_independently() {
        let slices = vec![
            SeriesSlice {
                name: "slice2".into(),
                data: arr2(&[[0.0, 5.0], [10.0, 10.0]]),
            },
            SeriesSlice {
                name: "slice0".into(),
                data: arr2(&[[0.0, 50.0], [100.0, 100.0]]),
            },
            SeriesSlice {
                name: "slice1".into(),
                data: arr2(&[[0.0, 0.5], [1.0, 1.0]]),
            },
        ];

        let mut sink = CollectingSink::default();
        let count = extract_series(
            slices,
            BitDepth::Eight,
            ToneMap::PercentileClamp,
            100.0,
            &mut sink,
        )
        .expect("extraction should succeed");

        assert_eq!(count, 3);
        let names: Vec<_> = sink.frames.iter().map(|f| f.id.to_string()).collect();
        assert_eq!(
            names,
            ["slice2", "slice0", "slice1"],
            "series frames must keep the supplied enumeration order"
        );

        // Each slice was scaled against its own maximum.
        for frame in &sink.frames {
            let image = frame.image.as_luma8().expect("8-bit frames");
            assert_eq!(image.get_pixel(0, 1)[0], 255, "every per-slice maximum maps to 255");
            assert_eq!(image.get_pixel(1, 0)[0], 127);
        }
    }

    #[test]
    fn series_failure_names_the_offending_slice() {
        let slices = vec![
            SeriesSlice {
                name: "good".into(),
                data: arr2(&[[1.0, 2.0], [3.0, 4.0]]),
            },
            SeriesSlice {
                name: "flat".into(),
                data: arr2(&[[0.0, 0.0], [0.0, 0.0]]),
            },
        ];

        let mut sink = CollectingSink::default();
        let error = extract_series(
            slices,
            BitDepth::Eight,
            ToneMap::PercentileClamp,
            100.0,
            &mut sink,
        )
        .unwrap_err();

        match error {
            ExtractError::SeriesToneMap { name, .. } => assert_eq!(name, "flat"),
            other => panic!("expected a series tone-map error, got {other}"),
        }
        assert_eq!(sink.frames.len(), 1, "frames before the failure were delivered");
    }

    #[test]
    fn sink_failure_aborts_the_volume_run() {
        let mut sink = FlakySink::default();
        let error = extract_volume(
            sequential_volume(),
            Plane::Axial,
            BitDepth::Eight,
            ToneMap::Disabled,
            99.0,
            &mut sink,
        )
        .unwrap_err();

        assert!(matches!(error, ExtractError::Sink(_)));
    }
}
