pub mod traits;

use crate::{
    bedrock::BedrockClient,
    config::{Backend, Config},
    error::{RelayError, Result},
    workers_ai::WorkersAiClient,
};
use std::sync::Arc;

pub use traits::{ChatService, ImageService};

/// The pair of upstream services the orchestrator talks to.
#[derive(Clone)]
pub struct InferenceClient {
    chat: Arc<dyn ChatService>,
    image: Arc<dyn ImageService>,
}

impl InferenceClient {
    pub fn new(chat: Arc<dyn ChatService>, image: Arc<dyn ImageService>) -> Self {
        Self { chat, image }
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        match config.backend {
            Backend::WorkersAi => {
                let workers_config = config.workers_ai.clone().ok_or_else(|| {
                    RelayError::ConfigError("Workers AI config required".into())
                })?;
                let client = WorkersAiClient::new(workers_config)?;
                Ok(Self::new(
                    Arc::new(client.text().clone()),
                    Arc::new(client.image().clone()),
                ))
            }
            Backend::Bedrock => {
                let bedrock_config = config.bedrock.clone().ok_or_else(|| {
                    RelayError::ConfigError("Bedrock config required".into())
                })?;
                let client = BedrockClient::new(bedrock_config).await?;
                Ok(Self::new(
                    Arc::new(client.text().clone()),
                    Arc::new(client.image().clone()),
                ))
            }
        }
    }

    pub fn chat(&self) -> &Arc<dyn ChatService> {
        &self.chat
    }

    pub fn image(&self) -> &Arc<dyn ImageService> {
        &self.image
    }
}
