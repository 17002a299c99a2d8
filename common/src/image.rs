use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::sync::Arc;

/// Decoded image returned by the image generator.
///
/// The bytes are shared, so cloning a deck that carries images stays cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn from_base64(mime_type: &str, data: &str) -> Result<Self, base64::DecodeError> {
        let bytes = STANDARD.decode(data.trim())?;
        Ok(Self::new(mime_type, bytes))
    }

    /// File extension for the payload, used when embedding it as a media part.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpeg",
            "image/gif" => "gif",
            "image/webp" => "webp",
            _ => "png",
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_follows_mime_type() {
        assert_eq!(ImagePayload::new("image/jpeg", vec![1]).extension(), "jpeg");
        assert_eq!(ImagePayload::new("image/png", vec![1]).extension(), "png");
        assert_eq!(ImagePayload::new("application/octet-stream", vec![1]).extension(), "png");
    }
}
