// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cutline application layer.
//!
//! Ties the timeline model and the compositor to the filesystem:
//! - RON/JSON project documents with an asset table
//! - image and frame-directory asset loading
//! - PNG sequence export
//! - an [`EditorSession`] that serializes edits against a running export
//! - the `cutline` command line

pub mod assets;
pub mod cli;
pub mod config;
pub mod project_file;
pub mod session;
pub mod sink;

pub use assets::{AssetError, AssetLoader, AssetRecord};
pub use config::{AppConfig, ConfigError, ExportSettings};
pub use project_file::{FileFormat, ProjectDocument, ProjectFileError, PROJECT_FORMAT_VERSION};
pub use session::{EditorSession, SessionError};
pub use sink::PngSequenceSink;
