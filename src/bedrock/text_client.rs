use crate::{
    error::{RelayError, Result},
    logger,
    models::{AnthropicMessageResponse, ChatRequest, ChatRole},
    services::ChatService,
};
use async_trait::async_trait;
use aws_sdk_bedrockruntime::Client;
use serde_json::{json, Value};

use super::invoke_json;

#[derive(Clone)]
pub struct TextClient {
    client: Client,
    model: String,
}

impl TextClient {
    pub fn new(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Anthropic messages body. System messages move to the top-level `system` field.
    pub fn build_payload(request: &ChatRequest) -> Value {
        let system = request
            .messages
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let messages: Vec<Value> = request
            .messages
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();

        let mut payload = json!({
            "anthropic_version": "bedrock-2023-05-31",
            "max_tokens": request.max_tokens,
            "messages": messages
        });
        if !system.is_empty() {
            payload["system"] = Value::String(system);
        }
        payload
    }

    pub fn parse_reply(body: &str) -> Result<String> {
        let reply: AnthropicMessageResponse =
            serde_json::from_str(body).map_err(|e| RelayError::ResponseError(e.to_string()))?;

        let text: String = reply
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();

        if reply.content.is_empty() {
            return Err(RelayError::ResponseError("chat reply carried no content".into()));
        }
        Ok(text)
    }
}

#[async_trait]
impl ChatService for TextClient {
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        let payload = Self::build_payload(&request);

        log::info!("Invoking model: {}", self.model);
        log::debug!("Text generation request payload: {}", payload);

        let _timer = logger::timer(&format!("chat {}", self.model));
        let body = invoke_json(&self.client, &self.model, &payload).await?;
        Self::parse_reply(&body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
