use crate::{
    error::{RelayError, Result},
    logger,
    models::{ImagePayload, ImageRequest, StabilityImageResponse},
    services::ImageService,
};
use async_trait::async_trait;
use aws_sdk_bedrockruntime::Client;
use serde_json::{json, Value};

use super::invoke_json;

#[derive(Clone)]
pub struct ImageClient {
    client: Client,
    model: String,
}

impl ImageClient {
    pub fn new(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn build_payload(request: &ImageRequest) -> Value {
        json!({
            "text_prompts": [{ "text": request.prompt }],
            "steps": request.steps
        })
    }

    pub fn parse_reply(body: &str) -> Result<ImagePayload> {
        let reply: StabilityImageResponse =
            serde_json::from_str(body).map_err(|e| RelayError::ResponseError(e.to_string()))?;

        reply
            .artifacts
            .into_iter()
            .next()
            .map(|artifact| ImagePayload::new(artifact.base64))
            .filter(|payload| !payload.is_empty())
            .ok_or_else(|| RelayError::ResponseError("No images generated".into()))
    }
}

#[async_trait]
impl ImageService for ImageClient {
    async fn synthesize(&self, request: ImageRequest) -> Result<ImagePayload> {
        let payload = Self::build_payload(&request);

        log::info!("Generating image with model: {}", self.model);

        let _timer = logger::timer(&format!("image {}", self.model));
        let body = invoke_json(&self.client, &self.model, &payload).await?;
        Self::parse_reply(&body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_stability_shape() {
        let request = ImageRequest {
            prompt: "A sleepy cat on a windowsill.".into(),
            steps: 6,
        };
        assert_eq!(
            ImageClient::build_payload(&request),
            json!({"text_prompts": [{"text": "A sleepy cat on a windowsill."}], "steps": 6})
        );
    }

    #[test]
    fn takes_first_artifact() {
        let body = r#"{"result":"success","artifacts":[{"base64":"AAEC","finishReason":"SUCCESS"}]}"#;
        assert_eq!(ImageClient::parse_reply(body).unwrap().as_str(), "AAEC");
        assert!(ImageClient::parse_reply(r#"{"artifacts":[]}"#).is_err());
        assert!(ImageClient::parse_reply(r#"{"artifacts":[{"base64":""}]}"#).is_err());
    }
}
