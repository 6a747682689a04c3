//! Types for the download module.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Video container recognized from the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    /// ISO base media (`ftyp` box): MP4 and QuickTime.
    Mp4,
    /// EBML: WebM and Matroska.
    WebM,
    /// RIFF AVI.
    Avi,
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mp4 => "mp4",
            Self::WebM => "webm",
            Self::Avi => "avi",
        };
        f.write_str(name)
    }
}

/// A verified video saved to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadedArtifact {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub container: ContainerKind,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}
