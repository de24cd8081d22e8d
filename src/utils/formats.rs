use serde::{Deserialize, Serialize};
use std::fmt;

/// Output formats the converter can encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
#[allow(clippy::upper_case_acronyms)]
pub enum ImageFormat {
    #[value(name = "jpeg", alias = "jpg")]
    #[serde(alias = "jpg")]
    JPEG,
    #[value(name = "png")]
    PNG,
    #[value(name = "webp")]
    WebP,
}

impl ImageFormat {
    /// Name used in option files, on the command line and in output filenames
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JPEG => "jpeg",
            Self::PNG => "png",
            Self::WebP => "webp",
        }
    }

    /// Quality multiplier applied on every compression trial
    pub fn quality_step(&self) -> f32 {
        match self {
            Self::PNG => 0.85,
            _ => 0.95,
        }
    }

    /// Maps a sniffed container format onto an encodable one
    pub fn from_detected(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(Self::JPEG),
            image::ImageFormat::Png => Some(Self::PNG),
            image::ImageFormat::WebP => Some(Self::WebP),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
