use crate::{
    error::{RelayError, Result},
    logger,
    models::{ChatRequest, WorkersAiTextResult},
    services::ChatService,
};
use async_trait::async_trait;
use serde_json::{json, Value};

use super::RunEndpoint;

#[derive(Clone)]
pub struct TextClient {
    endpoint: RunEndpoint,
    model: String,
}

impl TextClient {
    pub fn new(endpoint: RunEndpoint, model: impl Into<String>) -> Self {
        Self {
            endpoint,
            model: model.into(),
        }
    }

    pub fn build_payload(request: &ChatRequest) -> Value {
        json!({
            "messages": request.messages,
            "max_tokens": request.max_tokens
        })
    }
}

#[async_trait]
impl ChatService for TextClient {
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        let payload = Self::build_payload(&request);

        log::info!("Invoking chat model: {}", self.model);
        log::debug!("Chat request payload: {}", payload);

        let _timer = logger::timer(&format!("chat {}", self.model));
        let result: WorkersAiTextResult = self.endpoint.run(&self.model, &payload).await?;

        result
            .response
            .ok_or_else(|| RelayError::ResponseError("chat reply carried no response text".into()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
