// SPDX-License-Identifier: MIT OR Apache-2.0
//! Asset resolution and pixel sources.
//!
//! The compositor never decodes media itself. It asks an [`AssetResolver`]
//! for an [`Asset`] and samples the asset's [`PixelSource`], which may be
//! backed by a decoder that needs time to seek.

use cutline_timeline::AssetId;
use image::RgbaImage;
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Media kind of a resolved asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Time-varying frames
    Video,
    /// A single still frame
    Image,
}

/// Decoded pixel content of an asset
pub trait PixelSource: Send + Sync {
    /// Length of the source in seconds; `None` for stills
    fn native_duration(&self) -> Option<f64>;

    /// Source time currently buffered by the decoder
    fn buffered_time(&self) -> Option<f64>;

    /// Ask the decoder to reposition at `time`
    fn request_seek(&self, time: f64);

    /// Whether a frame for `time` can be sampled right now
    fn is_ready(&self, time: f64) -> bool;

    /// Frame at `time`, or `None` if nothing is available
    fn sample(&self, time: f64) -> Option<Arc<RgbaImage>>;
}

/// A resolved asset
#[derive(Clone)]
pub struct Asset {
    /// Media kind
    pub kind: AssetKind,
    /// Duration advertised by the store, if known
    pub duration_hint: Option<f64>,
    /// Pixel content
    pub source: Arc<dyn PixelSource>,
}

impl Asset {
    /// Wrap a still image
    pub fn image(image: RgbaImage) -> Self {
        Self {
            kind: AssetKind::Image,
            duration_hint: None,
            source: Arc::new(StillImage::new(image)),
        }
    }

    /// Wrap a frame sequence
    pub fn video(frames: FrameSequence) -> Self {
        Self {
            kind: AssetKind::Video,
            duration_hint: Some(frames.duration()),
            source: Arc::new(frames),
        }
    }

    /// Duration to use when sizing clips: the hint, else the source's own
    pub fn duration(&self) -> Option<f64> {
        self.duration_hint.or_else(|| self.source.native_duration())
    }
}

impl std::fmt::Debug for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Asset")
            .field("kind", &self.kind)
            .field("duration_hint", &self.duration_hint)
            .finish_non_exhaustive()
    }
}

/// Looks up assets by id
pub trait AssetResolver {
    /// Resolve an asset; `None` if it is unknown or unavailable
    fn resolve(&self, id: &AssetId) -> Option<Asset>;
}

impl<F> AssetResolver for F
where
    F: Fn(&AssetId) -> Option<Asset>,
{
    fn resolve(&self, id: &AssetId) -> Option<Asset> {
        self(id)
    }
}

/// Resolver with no assets
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssets;

impl AssetResolver for NoAssets {
    fn resolve(&self, _id: &AssetId) -> Option<Asset> {
        None
    }
}

/// In-memory asset table
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetStore {
    assets: IndexMap<AssetId, Asset>,
}

impl MemoryAssetStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an asset
    pub fn insert(&mut self, id: AssetId, asset: Asset) -> Option<Asset> {
        self.assets.insert(id, asset)
    }

    /// Remove an asset
    pub fn remove(&mut self, id: &AssetId) -> Option<Asset> {
        self.assets.shift_remove(id)
    }

    /// Number of assets
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetResolver for MemoryAssetStore {
    fn resolve(&self, id: &AssetId) -> Option<Asset> {
        self.assets.get(id).cloned()
    }
}

/// A still image; always ready
#[derive(Debug, Clone)]
pub struct StillImage {
    image: Arc<RgbaImage>,
}

impl StillImage {
    /// Create from decoded pixels
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }
}

impl PixelSource for StillImage {
    fn native_duration(&self) -> Option<f64> {
        None
    }

    fn buffered_time(&self) -> Option<f64> {
        None
    }

    fn request_seek(&self, _time: f64) {}

    fn is_ready(&self, _time: f64) -> bool {
        true
    }

    fn sample(&self, _time: f64) -> Option<Arc<RgbaImage>> {
        Some(self.image.clone())
    }
}

/// How a [`FrameSequence`] completes seeks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeekMode {
    /// Seeks land immediately
    #[default]
    Immediate,
    /// Seeks stay pending until [`FrameSequence::complete_seek`]
    Deferred,
}

#[derive(Debug, Default)]
struct DecodeCursor {
    position: f64,
    pending: Option<f64>,
    seeks: usize,
}

/// Decoded frames played back at a fixed rate.
///
/// Tracks a decode cursor the way a streaming decoder would: sampling
/// advances the cursor, and a seek in [`SeekMode::Deferred`] leaves the
/// source not ready until it completes.
#[derive(Debug)]
pub struct FrameSequence {
    frames: Vec<Arc<RgbaImage>>,
    fps: f64,
    mode: SeekMode,
    cursor: Mutex<DecodeCursor>,
}

impl FrameSequence {
    /// Create from frames at `fps`
    pub fn new(frames: Vec<RgbaImage>, fps: f64) -> Self {
        Self {
            frames: frames.into_iter().map(Arc::new).collect(),
            fps,
            mode: SeekMode::Immediate,
            cursor: Mutex::new(DecodeCursor::default()),
        }
    }

    /// Set the seek mode
    pub fn with_seek_mode(mut self, mode: SeekMode) -> Self {
        self.mode = mode;
        self
    }

    /// Number of frames
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        if self.fps > 0.0 {
            self.frames.len() as f64 / self.fps
        } else {
            0.0
        }
    }

    /// Number of seeks requested so far
    pub fn seek_count(&self) -> usize {
        self.cursor.lock().seeks
    }

    /// Finish a deferred seek
    pub fn complete_seek(&self) {
        let mut cursor = self.cursor.lock();
        if let Some(target) = cursor.pending.take() {
            cursor.position = target;
        }
    }

    fn frame_index(&self, time: f64) -> Option<usize> {
        if time.is_nan() || time < 0.0 || self.fps <= 0.0 {
            return None;
        }
        let index = (time * self.fps + 1e-9).floor() as usize;
        (index < self.frames.len()).then_some(index)
    }
}

impl PixelSource for FrameSequence {
    fn native_duration(&self) -> Option<f64> {
        Some(self.duration())
    }

    fn buffered_time(&self) -> Option<f64> {
        Some(self.cursor.lock().position)
    }

    fn request_seek(&self, time: f64) {
        let mut cursor = self.cursor.lock();
        cursor.seeks += 1;
        match self.mode {
            SeekMode::Immediate => cursor.position = time,
            SeekMode::Deferred => cursor.pending = Some(time),
        }
    }

    fn is_ready(&self, time: f64) -> bool {
        self.cursor.lock().pending.is_none() && self.frame_index(time).is_some()
    }

    fn sample(&self, time: f64) -> Option<Arc<RgbaImage>> {
        let index = self.frame_index(time)?;
        self.cursor.lock().position = time;
        self.frames.get(index).cloned()
    }
}
