pub mod bedrock;
pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
#[cfg(feature = "server")]
pub mod server;
pub mod services;
pub mod workers_ai;

pub use bedrock::BedrockClient;
pub use config::{Backend, BedrockConfig, Config, OrchestratorConfig, WorkersAiConfig};
pub use error::{RelayError, Result};
pub use models::{ChatMessage, ChatRequest, ChatRole, ElementMap, ImagePayload, ImageRequest, PromptRequest};
pub use orchestrator::{Analysis, EnrichInput, PromptOrchestrator};
pub use services::{ChatService, ImageService, InferenceClient};
pub use workers_ai::WorkersAiClient;
