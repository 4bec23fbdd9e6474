// SPDX-License-Identifier: MIT OR Apache-2.0
//! PNG image-sequence frame sink

use cutline_render::{ExportFrame, FrameSink, SinkError};
use std::path::{Path, PathBuf};

/// Writes each frame to `<dir>/<prefix>_<index>.png`
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    prefix: String,
    written: u64,
}

impl PngSequenceSink {
    /// Create the sink, creating `dir` if needed
    pub fn create(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self, SinkError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            prefix: prefix.into(),
            written: 0,
        })
    }

    /// Output directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Frames written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Path of frame `index`
    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("{}_{index:05}.png", self.prefix))
    }
}

impl FrameSink for PngSequenceSink {
    fn consume(&mut self, frame: ExportFrame) -> Result<(), SinkError> {
        let path = self.frame_path(frame.index);
        frame
            .surface
            .as_image()
            .save_with_format(&path, image::ImageFormat::Png)?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        tracing::info!(frames = self.written, dir = %self.dir.display(), "Wrote image sequence");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutline_render::Surface;
    use cutline_timeline::Color;

    #[test]
    fn test_writes_numbered_pngs() {
        let dir = std::env::temp_dir().join(format!("cutline_sink_{}", std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        let mut sink = PngSequenceSink::create(dir.join("out"), "frame").unwrap();
        for index in 0..3 {
            sink.consume(ExportFrame {
                index,
                time: index as f64 / 30.0,
                surface: Surface::new(4, 3, Color::rgb(10, 20, 30)),
            })
            .unwrap();
        }
        sink.finish().unwrap();

        assert_eq!(sink.written(), 3);
        let path = sink.frame_path(2);
        assert!(path.ends_with("out/frame_00002.png"));
        let image = image::open(&path).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (4, 3));
        assert_eq!(image.get_pixel(1, 1).0, [10, 20, 30, 255]);
        std::fs::remove_dir_all(&dir).ok();
    }
}
