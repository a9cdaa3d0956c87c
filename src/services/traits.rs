use crate::{
    error::Result,
    models::{ChatRequest, ImagePayload, ImageRequest},
};
use async_trait::async_trait;

/// Hosted chat-completion endpoint: role-tagged messages in, free text out.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<String>;

    fn model(&self) -> &str;
}

/// Hosted text-to-image endpoint: prompt and step count in, base64 image out.
#[async_trait]
pub trait ImageService: Send + Sync {
    async fn synthesize(&self, request: ImageRequest) -> Result<ImagePayload>;

    fn model(&self) -> &str;
}
