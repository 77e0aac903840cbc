use crate::enums::Plane;
use crate::extractor::{Frame, FrameId, FrameSink, SinkError};

use log::debug;
use std::path::PathBuf;

/// Writes frames as PNG files into one output directory.
///
/// Volume frames are named `slice_{plane}_{index:03}.png`; series frames
/// reuse the stem of the file they were decoded from. The directory is
/// expected to exist.
pub struct PngSink {
    output_dir: PathBuf,
    plane: Plane,
}

impl PngSink {
    pub fn new(output_dir: PathBuf, plane: Plane) -> Self {
        Self { output_dir, plane }
    }

    fn frame_path(&self, id: &FrameId) -> PathBuf {
        let stem = match id {
            FrameId::Index(index) => format!("slice_{}_{index:03}", self.plane),
            FrameId::Name(name) => name.clone(),
        };
        self.output_dir.join(format!("{stem}.png"))
    }
}

impl FrameSink for PngSink {
    fn deliver(&mut self, frame: Frame) -> Result<(), SinkError> {
        let path = self.frame_path(&frame.id);
        frame
            .image
            .save(&path)
            .map_err(|source| SinkError::Encode {
                path: path.clone(),
                source,
            })?;
        debug!("wrote {}", path.display());
        Ok(())
    }
}
