// SPDX-License-Identifier: MIT OR Apache-2.0
//! Asset records and loading.
//!
//! A project file lists its media as [`AssetRecord`]s. Images are decoded
//! with the `image` crate; a video is a directory of numbered frame images
//! played at the record's frame rate.

use cutline_render::{Asset, AssetKind, FrameSequence, MemoryAssetStore};
use cutline_timeline::AssetId;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Frame rate used for frame directories that do not declare one
pub const DEFAULT_VIDEO_FPS: f64 = 30.0;

/// Extensions accepted as video frames
const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tga", "gif"];

/// One media entry of a project file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Id clips refer to
    pub id: AssetId,
    /// Media kind
    pub kind: AssetKind,
    /// File (image) or directory (video), relative to the project file
    pub path: PathBuf,
    /// Frame rate of a video
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
}

impl AssetRecord {
    /// Record for a still image
    pub fn image(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: AssetId::new(id),
            kind: AssetKind::Image,
            path: path.into(),
            fps: None,
        }
    }

    /// Record for a frame directory
    pub fn video(id: impl Into<String>, path: impl Into<PathBuf>, fps: f64) -> Self {
        Self {
            id: AssetId::new(id),
            kind: AssetKind::Video,
            path: path.into(),
            fps: Some(fps),
        }
    }
}

/// Errors loading a single asset
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// IO error
    #[error("IO error for {path}: {source}")]
    Io {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// Decode error
    #[error("Failed to decode {path}: {source}")]
    Decode {
        /// Offending path
        path: PathBuf,
        /// Underlying error
        source: image::ImageError,
    },
    /// A frame directory with no frames
    #[error("No frames found in {0}")]
    NoFrames(PathBuf),
    /// Unusable frame rate
    #[error("Invalid frame rate {0}")]
    InvalidFps(f64),
}

/// Loads asset records relative to a base directory
#[derive(Debug, Clone)]
pub struct AssetLoader {
    base_dir: PathBuf,
}

impl AssetLoader {
    /// Create a loader resolving relative paths against `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Absolute path of a record
    pub fn resolve_path(&self, record: &AssetRecord) -> PathBuf {
        if record.path.is_absolute() {
            record.path.clone()
        } else {
            self.base_dir.join(&record.path)
        }
    }

    /// Load every record into a store.
    ///
    /// Assets that fail to load are left out; clips referring to them are
    /// skipped at render time.
    pub fn load_all(&self, records: &[AssetRecord]) -> MemoryAssetStore {
        let mut store = MemoryAssetStore::new();
        for record in records {
            match self.load(record) {
                Ok(asset) => {
                    tracing::debug!(asset = %record.id, kind = ?record.kind, "Loaded asset");
                    store.insert(record.id.clone(), asset);
                }
                Err(e) => tracing::warn!(asset = %record.id, error = %e, "Failed to load asset"),
            }
        }
        tracing::info!(loaded = store.len(), total = records.len(), "Assets loaded");
        store
    }

    /// Load one record
    pub fn load(&self, record: &AssetRecord) -> Result<Asset, AssetError> {
        let path = self.resolve_path(record);
        match record.kind {
            AssetKind::Image => Ok(Asset::image(open_rgba(&path)?)),
            AssetKind::Video => {
                let fps = record.fps.unwrap_or(DEFAULT_VIDEO_FPS);
                if !fps.is_finite() || fps <= 0.0 {
                    return Err(AssetError::InvalidFps(fps));
                }
                let frames = frame_files(&path)?
                    .iter()
                    .map(|file| open_rgba(file))
                    .collect::<Result<Vec<_>, _>>()?;
                if frames.is_empty() {
                    return Err(AssetError::NoFrames(path));
                }
                Ok(Asset::video(FrameSequence::new(frames, fps)))
            }
        }
    }
}

fn open_rgba(path: &Path) -> Result<RgbaImage, AssetError> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| AssetError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

/// Frame image files in a directory, in file name order
fn frame_files(dir: &Path) -> Result<Vec<PathBuf>, AssetError> {
    let io_err = |source| AssetError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_frame = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
        if path.is_file() && is_frame {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutline_render::AssetResolver;
    use image::Rgba;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cutline_assets_{name}_{}", std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_image_and_frames() {
        let dir = temp_dir("load");
        RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]))
            .save(dir.join("still.png"))
            .unwrap();
        let frames = dir.join("clip");
        std::fs::create_dir_all(&frames).unwrap();
        for i in 0..4u8 {
            RgbaImage::from_pixel(2, 2, Rgba([i * 50, 0, 0, 255]))
                .save(frames.join(format!("{i:04}.png")))
                .unwrap();
        }
        std::fs::write(frames.join("notes.txt"), "ignored").unwrap();

        let records = vec![
            AssetRecord::image("still", "still.png"),
            AssetRecord::video("clip", "clip", 2.0),
            AssetRecord::image("gone", "missing.png"),
        ];
        let store = AssetLoader::new(&dir).load_all(&records);
        assert_eq!(store.len(), 2);

        let still = store.resolve(&AssetId::new("still")).unwrap();
        assert_eq!(still.source.sample(0.0).unwrap().dimensions(), (3, 2));

        let clip = store.resolve(&AssetId::new("clip")).unwrap();
        assert_eq!(clip.kind, AssetKind::Video);
        assert_eq!(clip.duration(), Some(2.0));
        assert_eq!(clip.source.sample(1.5).unwrap().get_pixel(0, 0).0[0], 150);
        assert!(store.resolve(&AssetId::new("gone")).is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_empty_frame_dir_fails() {
        let dir = temp_dir("empty");
        let err = AssetLoader::new(&dir)
            .load(&AssetRecord::video("v", ".", 24.0))
            .unwrap_err();
        assert!(matches!(err, AssetError::NoFrames(_)));

        let err = AssetLoader::new(&dir)
            .load(&AssetRecord::video("v", ".", 0.0))
            .unwrap_err();
        assert!(matches!(err, AssetError::InvalidFps(_)));
        std::fs::remove_dir_all(&dir).ok();
    }
}
