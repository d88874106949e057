//! Output option enums shared by the config layer and the render core.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Returned by the `FromStr` impls below when a value is not one of the
/// recognized variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: '{value}' (expected one of: {expected})")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Artifact format produced by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Svg,
    Png,
    Pdf,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Svg, OutputFormat::Png, OutputFormat::Pdf];

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
            OutputFormat::Pdf => "pdf",
        }
    }

    /// File extension written by the renderer (without the dot).
    pub fn extension(self) -> &'static str {
        self.as_str()
    }

    /// Raster formats honour scale and width; SVG ignores them.
    pub fn is_raster(self) -> bool {
        !matches!(self, OutputFormat::Svg)
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Svg => "image/svg+xml",
            OutputFormat::Png => "image/png",
            OutputFormat::Pdf => "application/pdf",
        }
    }

    /// Look up a format by file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(OutputFormat::Svg),
            "png" => Ok(OutputFormat::Png),
            "pdf" => Ok(OutputFormat::Pdf),
            _ => Err(UnknownVariant {
                kind: "output_format",
                value: s.to_string(),
                expected: "svg, png, pdf",
            }),
        }
    }
}

/// Mermaid theme passed to the renderer with `-t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Dark,
    Forest,
    Neutral,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Default => "default",
            Theme::Dark => "dark",
            Theme::Forest => "forest",
            Theme::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Theme::Default),
            "dark" => Ok(Theme::Dark),
            "forest" => Ok(Theme::Forest),
            "neutral" => Ok(Theme::Neutral),
            _ => Err(UnknownVariant {
                kind: "theme",
                value: s.to_string(),
                expected: "default, dark, forest, neutral",
            }),
        }
    }
}

/// Background passed to the renderer with `-b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    #[default]
    White,
    Transparent,
}

impl Background {
    pub fn as_str(self) -> &'static str {
        match self {
            Background::White => "white",
            Background::Transparent => "transparent",
        }
    }
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Background {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" => Ok(Background::White),
            "transparent" => Ok(Background::Transparent),
            _ => Err(UnknownVariant {
                kind: "background",
                value: s.to_string(),
                expected: "white, transparent",
            }),
        }
    }
}
