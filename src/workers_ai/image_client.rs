use crate::{
    error::{RelayError, Result},
    logger,
    models::{ImagePayload, ImageRequest, WorkersAiImageResult},
    services::ImageService,
};
use async_trait::async_trait;
use serde_json::{json, Value};

use super::RunEndpoint;

#[derive(Clone)]
pub struct ImageClient {
    endpoint: RunEndpoint,
    model: String,
}

impl ImageClient {
    pub fn new(endpoint: RunEndpoint, model: impl Into<String>) -> Self {
        Self {
            endpoint,
            model: model.into(),
        }
    }

    pub fn build_payload(request: &ImageRequest) -> Value {
        json!({
            "prompt": request.prompt,
            "steps": request.steps
        })
    }

    pub fn into_payload(result: WorkersAiImageResult) -> Result<ImagePayload> {
        let payload = ImagePayload::new(result.image);
        if payload.is_empty() {
            return Err(RelayError::ResponseError("No image generated".into()));
        }
        Ok(payload)
    }
}

#[async_trait]
impl ImageService for ImageClient {
    async fn synthesize(&self, request: ImageRequest) -> Result<ImagePayload> {
        let payload = Self::build_payload(&request);

        log::info!(
            "Generating image with model: {} ({} steps)",
            self.model,
            request.steps
        );

        let _timer = logger::timer(&format!("image {}", self.model));
        let result: WorkersAiImageResult = self.endpoint.run(&self.model, &payload).await?;
        Self::into_payload(result)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_prompt_and_steps() {
        let request = ImageRequest {
            prompt: "A joyful rabbit in a meadow.".into(),
            steps: 6,
        };
        assert_eq!(
            ImageClient::build_payload(&request),
            json!({"prompt": "A joyful rabbit in a meadow.", "steps": 6})
        );
    }

    #[test]
    fn blank_image_is_a_response_error() {
        let err = ImageClient::into_payload(WorkersAiImageResult { image: " \n".into() })
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "Response error: No image generated");
    }

    #[test]
    fn image_is_kept_as_returned() {
        let payload = ImageClient::into_payload(WorkersAiImageResult {
            image: "iVBORw0KGgo=".into(),
        })
        .unwrap();
        assert_eq!(payload.as_str(), "iVBORw0KGgo=");
    }
}
