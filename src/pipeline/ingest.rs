//! Image ingestion: uploaded bytes → base64 data URI with a media type.
//!
//! VLM APIs accept images as base64 data URIs embedded in the JSON request
//! body. The uploaded photo is already encoded by the camera, so unlike a
//! renderer we never touch pixels: the bytes pass through base64 untouched
//! and the only judgement call is the media type. A declared type from the
//! upload always wins; otherwise the format is sniffed from the magic bytes,
//! and `image/jpeg` is the final fallback since phone cameras overwhelmingly
//! produce JPEG.

use crate::error::Diary2MdError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// Media type assumed when nothing is declared and sniffing fails.
pub const DEFAULT_MEDIA_TYPE: &str = "image/jpeg";

/// An uploaded image encoded for embedding in a request payload.
///
/// Immutable once created; derived exactly once per upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Media type, e.g. "image/jpeg".
    pub media_type: String,
    /// Base64 (standard alphabet) of the raw upload bytes.
    pub data: String,
}

impl EncodedImage {
    /// Render as an RFC 2397 data URI: `data:<media-type>;base64,<payload>`.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// Encode uploaded image bytes for transmission to the vision service.
///
/// Fails with the input error when `bytes` is empty (no file supplied).
/// Pure and deterministic: the payload base64-decodes back to `bytes`
/// exactly.
pub fn encode_image(
    bytes: &[u8],
    declared_media_type: Option<&str>,
) -> Result<EncodedImage, Diary2MdError> {
    if bytes.is_empty() {
        return Err(Diary2MdError::NoImage);
    }

    let media_type = match declared_media_type.map(str::trim).filter(|s| !s.is_empty()) {
        Some(declared) => declared.to_string(),
        None => sniff_media_type(bytes),
    };

    let data = STANDARD.encode(bytes);
    debug!(
        "Encoded image: {} bytes raw, {} bytes base64, media type {}",
        bytes.len(),
        data.len(),
        media_type
    );

    Ok(EncodedImage { media_type, data })
}

/// Guess the media type from the image magic bytes.
fn sniff_media_type(bytes: &[u8]) -> String {
    image::guess_format(bytes)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| DEFAULT_MEDIA_TYPE.to_string())
}
