// SPDX-License-Identifier: MIT OR Apache-2.0
//! Project files.
//!
//! A [`ProjectDocument`] bundles the timeline with its asset records. The
//! file extension picks the encoding: `.ron` or `.json`.

use crate::assets::AssetRecord;
use cutline_timeline::{Project, TimelineError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current project file format version
pub const PROJECT_FORMAT_VERSION: u32 = 1;

/// Errors reading or writing project files
#[derive(Debug, thiserror::Error)]
pub enum ProjectFileError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed RON
    #[error("Failed to parse RON: {0}")]
    RonParse(#[from] ron::error::SpannedError),
    /// RON serialization failure
    #[error("Failed to write RON: {0}")]
    RonWrite(#[from] ron::Error),
    /// JSON failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Unknown file extension
    #[error("Unsupported project file extension: {0}")]
    UnsupportedFormat(String),
    /// File written by a newer Cutline
    #[error("Project version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },
    /// The decoded timeline breaks an invariant
    #[error("Invalid project: {0}")]
    Invalid(#[from] TimelineError),
}

/// On-disk encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Rusty Object Notation
    Ron,
    /// JSON
    Json,
}

impl FileFormat {
    /// Pick the format from a path's extension
    pub fn from_path(path: &Path) -> Result<Self, ProjectFileError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "ron" => Ok(Self::Ron),
            "json" => Ok(Self::Json),
            _ => Err(ProjectFileError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// A saved project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    /// File format version
    pub format_version: u32,
    /// The timeline
    pub project: Project,
    /// Media used by the timeline
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
}

impl ProjectDocument {
    /// Wrap a project at the current format version
    pub fn new(project: Project) -> Self {
        Self {
            format_version: PROJECT_FORMAT_VERSION,
            project,
            assets: Vec::new(),
        }
    }

    /// Attach asset records
    pub fn with_assets(mut self, assets: Vec<AssetRecord>) -> Self {
        self.assets = assets;
        self
    }

    /// Decode, version-check and validate a document
    pub fn from_str(text: &str, format: FileFormat) -> Result<Self, ProjectFileError> {
        let mut document: Self = match format {
            FileFormat::Ron => ron::from_str(text)?,
            FileFormat::Json => serde_json::from_str(text)?,
        };
        if document.format_version > PROJECT_FORMAT_VERSION {
            return Err(ProjectFileError::UnsupportedVersion {
                found: document.format_version,
                supported: PROJECT_FORMAT_VERSION,
            });
        }
        document.project.normalize();
        document.project.validate()?;
        Ok(document)
    }

    /// Encode a document.
    ///
    /// Refuses a timeline that [`ProjectDocument::from_str`] would reject,
    /// e.g. one left with overlapping clips by a raw move.
    pub fn to_string(&self, format: FileFormat) -> Result<String, ProjectFileError> {
        self.project.validate()?;
        Ok(match format {
            FileFormat::Ron => {
                let pretty = ron::ser::PrettyConfig::default()
                    .struct_names(true)
                    .enumerate_arrays(false);
                ron::ser::to_string_pretty(self, pretty)?
            }
            FileFormat::Json => serde_json::to_string_pretty(self)?,
        })
    }

    /// Load a project file
    pub fn load(path: &Path) -> Result<Self, ProjectFileError> {
        let format = FileFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        let document = Self::from_str(&content, format)?;
        tracing::info!(
            path = %path.display(),
            tracks = document.project.track_count(),
            assets = document.assets.len(),
            "Loaded project"
        );
        Ok(document)
    }

    /// Save a project file
    pub fn save(&self, path: &Path) -> Result<(), ProjectFileError> {
        let format = FileFormat::from_path(path)?;
        std::fs::write(path, self.to_string(format)?)?;
        tracing::info!(path = %path.display(), "Saved project");
        Ok(())
    }
}
