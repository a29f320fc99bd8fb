//! Image attachments for product documents.
//!
//! Images are stored inline in the product document, so anything handed to
//! the store has to be small already. Only a downscaler can produce a
//! [`DownscaledImage`].

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::error::{AppError, AppResult};

/// Shown for products created without an image.
pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/400x400?text=No+Image";

/// Largest encoded image that still leaves room in a single document.
pub const MAX_INLINE_IMAGE_BYTES: usize = 900 * 1024;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownscaleOptions {
    pub max_width: u32,
    /// Lossy quality factor in `0.0..=1.0`.
    pub quality: f32,
    pub output_mime: &'static str,
}

impl Default for DownscaleOptions {
    fn default() -> Self {
        Self {
            max_width: 800,
            quality: 0.7,
            output_mime: "image/jpeg",
        }
    }
}

/// Image payload ready to be written into a document, as a URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownscaledImage(String);

impl DownscaledImage {
    /// Constructor for [`ImageDownscaler`] implementations, including ones
    /// outside this crate. The URI is stored as given: calling this asserts
    /// that the payload is already within [`MAX_INLINE_IMAGE_BYTES`].
    pub fn from_uri(uri: String) -> Self {
        Self(uri)
    }

    pub fn as_uri(&self) -> &str {
        &self.0
    }

    pub fn into_uri(self) -> String {
        self.0
    }
}

pub trait ImageDownscaler: Send + Sync {
    fn downscale(
        &self,
        raw: &[u8],
        mime: &str,
        options: &DownscaleOptions,
    ) -> AppResult<DownscaledImage>;
}

/// Encodes already-small images as `data:` URIs. It does no pixel work:
/// callers are expected to upload images that were resized on the client,
/// and anything over the size ceiling is rejected. `DownscaleOptions` is
/// not consulted; the upload keeps its own width, quality and MIME type.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineImageEncoder;

impl ImageDownscaler for InlineImageEncoder {
    fn downscale(
        &self,
        raw: &[u8],
        mime: &str,
        _options: &DownscaleOptions,
    ) -> AppResult<DownscaledImage> {
        if !mime.starts_with("image/") {
            return Err(AppError::Validation(format!("{mime} is not an image type")));
        }
        if raw.is_empty() {
            return Err(AppError::Validation("image is empty".into()));
        }

        let encoded = STANDARD.encode(raw);
        if encoded.len() > MAX_INLINE_IMAGE_BYTES {
            return Err(AppError::Validation(format!(
                "image is too large ({} KiB encoded, limit {} KiB)",
                encoded.len() / 1024,
                MAX_INLINE_IMAGE_BYTES / 1024
            )));
        }

        Ok(DownscaledImage(format!("data:{mime};base64,{encoded}")))
    }
}

/// Decodes an upload given either as a `data:` URI or as bare base64.
pub fn decode_upload(payload: &str, mime: Option<&str>) -> AppResult<(Vec<u8>, String)> {
    let (mime, body) = match payload.strip_prefix("data:") {
        Some(rest) => {
            let (header, body) = rest
                .split_once(',')
                .ok_or_else(|| AppError::Validation("malformed data URI".into()))?;
            let mime = header.trim_end_matches(";base64").to_string();
            (mime, body)
        }
        None => (mime.unwrap_or("image/jpeg").to_string(), payload),
    };

    let raw = STANDARD
        .decode(body.trim())
        .map_err(|e| AppError::Validation(format!("image is not valid base64: {e}")))?;
    Ok((raw, mime))
}
