//! Types for the session module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Output quality requested from the generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Better,
    #[default]
    Faster,
}

/// Frame rate of the generated video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Framerate {
    #[default]
    Fps60,
    Fps30,
}

impl Framerate {
    pub fn as_u32(self) -> u32 {
        match self {
            Self::Fps60 => 60,
            Self::Fps30 => 30,
        }
    }
}

impl TryFrom<u32> for Framerate {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            60 => Ok(Self::Fps60),
            30 => Ok(Self::Fps30),
            other => Err(format!("unsupported framerate {}, expected 60 or 30", other)),
        }
    }
}

impl From<Framerate> for u32 {
    fn from(value: Framerate) -> Self {
        value.as_u32()
    }
}

/// Resolution of the generated video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    #[default]
    #[serde(rename = "4k")]
    Uhd4k,
    #[serde(rename = "1080p")]
    Fhd1080p,
}

/// Generation options passed through to the remote application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(default)]
    pub quality: Quality,
    #[serde(default)]
    pub framerate: Framerate,
    #[serde(default)]
    pub resolution: Resolution,
}

/// Everything the session needs to start one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRequest {
    pub asset_path: PathBuf,
    pub prompt: String,
    pub options: GenerationOptions,
}

/// Opaque reference to a remotely produced video, usually its URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactLocator(String);

impl ArtifactLocator {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ArtifactLocator {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ArtifactLocator {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// What the remote application currently shows for the submitted item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationStatus {
    /// No generation indicator is visible.
    Awaiting,
    /// The "generating" indicator is visible.
    InProgress,
    /// A finished video is available.
    Succeeded { locator: ArtifactLocator },
    /// The application reported that generation failed.
    Failed { reason: String },
}

impl GenerationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = GenerationOptions::default();
        assert_eq!(options.quality, Quality::Faster);
        assert_eq!(options.framerate, Framerate::Fps60);
        assert_eq!(options.resolution, Resolution::Uhd4k);
    }

    #[test]
    fn test_options_wire_format() {
        let options = GenerationOptions {
            quality: Quality::Better,
            framerate: Framerate::Fps30,
            resolution: Resolution::Fhd1080p,
        };
        let json = serde_json::to_value(options).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"quality": "better", "framerate": 30, "resolution": "1080p"})
        );
    }

    #[test]
    fn test_options_from_toml() {
        let options: GenerationOptions =
            toml::from_str("quality = \"better\"\nframerate = 30").unwrap();
        assert_eq!(options.quality, Quality::Better);
        assert_eq!(options.framerate, Framerate::Fps30);
        assert_eq!(options.resolution, Resolution::Uhd4k);
    }

    #[test]
    fn test_invalid_framerate_rejected() {
        let result: Result<GenerationOptions, _> = toml::from_str("framerate = 24");
        assert!(result.is_err());
    }

    #[test]
    fn test_terminal_status() {
        assert!(!GenerationStatus::Awaiting.is_terminal());
        assert!(!GenerationStatus::InProgress.is_terminal());
        assert!(GenerationStatus::Succeeded {
            locator: "https://cdn/x.mp4".into()
        }
        .is_terminal());
        assert!(GenerationStatus::Failed {
            reason: "blocked".into()
        }
        .is_terminal());
    }
}
