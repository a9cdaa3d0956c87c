use base64::{
    alphabet,
    engine::{
        general_purpose::{GeneralPurpose, GeneralPurposeConfig},
        DecodePaddingMode,
    },
    Engine as _,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Standard alphabet that accepts payloads with or without trailing `=` padding.
const IMAGE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    pub steps: u32,
}

/// Base64 image exactly as the image service returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload(String);

impl ImagePayload {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Decodes with the standard alphabet. The bytes are not checked for a PNG signature.
    pub fn decode(&self) -> Result<Vec<u8>> {
        Ok(IMAGE_ENGINE.decode(self.0.trim())?)
    }
}

#[derive(Serialize, Deserialize)]
pub struct WorkersAiImageResult {
    pub image: String,
}

#[derive(Serialize, Deserialize)]
pub struct StabilityArtifact {
    pub base64: String,
    #[serde(rename = "finishReason", default)]
    pub finish_reason: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct StabilityImageResponse {
    pub artifacts: Vec<StabilityArtifact>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_is_deterministic() {
        let payload = ImagePayload::new("iVBORw0KGgo=");
        let first = payload.decode().unwrap();
        let second = payload.decode().unwrap();
        assert_eq!(first, second);
        assert_eq!(first, vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn decode_accepts_missing_padding() {
        let padded = ImagePayload::new("iVBORw0KGgo=").decode().unwrap();
        let unpadded = ImagePayload::new("iVBORw0KGgo").decode().unwrap();
        assert_eq!(padded, unpadded);
    }

    #[test]
    fn decode_rejects_non_base64() {
        assert!(ImagePayload::new("not*base64").decode().is_err());
    }

    #[test]
    fn decode_passes_through_arbitrary_bytes() {
        let payload = ImagePayload::new("AAEC/w==");
        assert_eq!(payload.decode().unwrap(), vec![0x00, 0x01, 0x02, 0xFF]);
    }
}
