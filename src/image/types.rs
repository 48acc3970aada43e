//! Input image payloads.

use crate::error::{FlowVizError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image formats accepted as the first frame of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format (first frame is used by the service).
    Gif,
}

impl ImageFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Image bytes plus MIME type, fixed for the life of a job.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    data: Vec<u8>,
    mime_type: String,
}

impl ImagePayload {
    /// Wraps raw bytes with an explicit MIME type.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Result<Self> {
        if data.is_empty() {
            return Err(FlowVizError::Input("image data is empty".into()));
        }
        let mime_type = mime_type.into();
        if mime_type.trim().is_empty() {
            return Err(FlowVizError::Input("image MIME type is empty".into()));
        }
        Ok(Self { data, mime_type })
    }

    /// Wraps raw bytes, detecting the MIME type from their magic bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let format = ImageFormat::from_magic_bytes(&data).ok_or_else(|| {
            FlowVizError::Input(
                "unrecognized image format (expected PNG, JPEG, WebP or GIF)".into(),
            )
        })?;
        Self::new(data, format.mime_type())
    }

    /// Reads an image file. The type comes from the content, or from the
    /// extension when the content is not recognized.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| FlowVizError::Input(format!("cannot read {}: {}", path.display(), e)))?;

        let format = ImageFormat::from_magic_bytes(&data).or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(ImageFormat::from_extension)
        });
        match format {
            Some(format) => Self::new(data, format.mime_type()),
            None => Err(FlowVizError::Input(format!(
                "{} is not a PNG, JPEG, WebP or GIF image",
                path.display()
            ))),
        }
    }

    /// Parses a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| FlowVizError::Input("not a data URL".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| FlowVizError::Input("data URL has no payload".into()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| FlowVizError::Input("data URL is not base64 encoded".into()))?;
        let data = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| FlowVizError::Input(format!("invalid base64 in data URL: {}", e)))?;
        Self::new(data, mime_type)
    }

    /// Raw image bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// MIME type sent alongside the bytes.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size of the image in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Standard base64 encoding of the image, as the service expects it.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePayload")
            .field("mime_type", &self.mime_type)
            .field("size", &self.data.len())
            .finish()
    }
}
