use std::env;
use std::str::FromStr;

use crate::error::RelayError;

pub const DEFAULT_IMAGE_STEPS: u32 = 6;
pub const DEFAULT_ANALYZE_MAX_TOKENS: u32 = 512;
pub const DEFAULT_ENRICH_MAX_TOKENS: u32 = 256;

pub const WORKERS_AI_BASE_URL: &str = "https://api.cloudflare.com/client/v4";
pub const WORKERS_AI_CHAT_MODEL: &str = "@cf/meta/llama-3.1-8b-instruct";
pub const WORKERS_AI_IMAGE_MODEL: &str = "@cf/black-forest-labs/flux-1-schnell";

pub const BEDROCK_CHAT_MODEL: &str = "anthropic.claude-3-haiku-20240307-v1:0";
pub const BEDROCK_IMAGE_MODEL: &str = "stability.stable-diffusion-xl-v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    WorkersAi,
    Bedrock,
}

impl FromStr for Backend {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "workers-ai" | "workers_ai" | "cloudflare" => Ok(Backend::WorkersAi),
            "bedrock" | "aws" => Ok(Backend::Bedrock),
            other => Err(RelayError::ConfigError(format!(
                "unknown inference backend: {}",
                other
            ))),
        }
    }
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::WorkersAi => "workers-ai",
            Backend::Bedrock => "bedrock",
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkersAiConfig {
    pub account_id: Option<String>,
    pub api_token: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub image_model: String,
}

impl Default for WorkersAiConfig {
    fn default() -> Self {
        WorkersAiConfig {
            account_id: None,
            api_token: None,
            base_url: WORKERS_AI_BASE_URL.to_string(),
            chat_model: WORKERS_AI_CHAT_MODEL.to_string(),
            image_model: WORKERS_AI_IMAGE_MODEL.to_string(),
        }
    }
}

impl WorkersAiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        WorkersAiConfig {
            account_id: env::var("CF_ACCOUNT_ID").ok(),
            api_token: env::var("CF_API_TOKEN").ok(),
            base_url: env::var("CF_API_BASE_URL").unwrap_or(defaults.base_url),
            chat_model: env::var("CF_CHAT_MODEL").unwrap_or(defaults.chat_model),
            image_model: env::var("CF_IMAGE_MODEL").unwrap_or(defaults.image_model),
        }
    }

    pub fn with_credentials(
        mut self,
        account_id: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        self.account_id = Some(account_id.into());
        self.api_token = Some(api_token.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_models(mut self, chat: impl Into<String>, image: impl Into<String>) -> Self {
        self.chat_model = chat.into();
        self.image_model = image.into();
        self
    }
}

#[derive(Debug, Clone)]
pub struct BedrockConfig {
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub chat_model: String,
    pub image_model: String,
}

impl Default for BedrockConfig {
    fn default() -> Self {
        BedrockConfig {
            region: None,
            access_key: None,
            secret_key: None,
            chat_model: BEDROCK_CHAT_MODEL.to_string(),
            image_model: BEDROCK_IMAGE_MODEL.to_string(),
        }
    }
}

impl BedrockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        BedrockConfig {
            region: env::var("AWS_REGION")
                .or_else(|_| env::var("AWS_DEFAULT_REGION"))
                .ok(),
            access_key: env::var("AWS_ACCESS_KEY_ID").ok(),
            secret_key: env::var("AWS_SECRET_ACCESS_KEY").ok(),
            chat_model: env::var("BEDROCK_CHAT_MODEL").unwrap_or(defaults.chat_model),
            image_model: env::var("BEDROCK_IMAGE_MODEL").unwrap_or(defaults.image_model),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn with_models(mut self, chat: impl Into<String>, image: impl Into<String>) -> Self {
        self.chat_model = chat.into();
        self.image_model = image.into();
        self
    }
}

/// Per-call bounds handed to the upstream services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub analyze_max_tokens: u32,
    pub enrich_max_tokens: u32,
    pub default_steps: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            analyze_max_tokens: DEFAULT_ANALYZE_MAX_TOKENS,
            enrich_max_tokens: DEFAULT_ENRICH_MAX_TOKENS,
            default_steps: DEFAULT_IMAGE_STEPS,
        }
    }
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        OrchestratorConfig {
            analyze_max_tokens: parse_env("ANALYZE_MAX_TOKENS", defaults.analyze_max_tokens),
            enrich_max_tokens: parse_env("ENRICH_MAX_TOKENS", defaults.enrich_max_tokens),
            default_steps: parse_env("IMAGE_STEPS", defaults.default_steps).max(1),
        }
    }

    pub fn with_max_tokens(mut self, analyze: u32, enrich: u32) -> Self {
        self.analyze_max_tokens = analyze;
        self.enrich_max_tokens = enrich;
        self
    }

    pub fn with_default_steps(mut self, steps: u32) -> Self {
        self.default_steps = steps.max(1);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub backend: Backend,
    pub workers_ai: Option<WorkersAiConfig>,
    pub bedrock: Option<BedrockConfig>,
    pub orchestrator: OrchestratorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: None,
            port: None,
            backend: Backend::WorkersAi,
            workers_ai: None,
            bedrock: None,
            orchestrator: OrchestratorConfig::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> crate::error::Result<Self> {
        let host = env::var("HOST").ok();
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());
        let backend = match env::var("INFERENCE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => Backend::WorkersAi,
        };

        let (workers_ai, bedrock) = match backend {
            Backend::WorkersAi => (Some(WorkersAiConfig::from_env()), None),
            Backend::Bedrock => (None, Some(BedrockConfig::from_env())),
        };

        Ok(Config {
            host,
            port,
            backend,
            workers_ai,
            bedrock,
            orchestrator: OrchestratorConfig::from_env(),
        })
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_workers_ai(mut self, config: WorkersAiConfig) -> Self {
        self.workers_ai = Some(config);
        self.backend = Backend::WorkersAi;
        self
    }

    pub fn with_bedrock(mut self, config: BedrockConfig) -> Self {
        self.bedrock = Some(config);
        self.backend = Backend::Bedrock;
        self
    }

    pub fn with_orchestrator(mut self, config: OrchestratorConfig) -> Self {
        self.orchestrator = config;
        self
    }

    pub fn bind_address(&self) -> (String, u16) {
        (
            self.host.clone().unwrap_or_else(|| "127.0.0.1".to_string()),
            self.port.unwrap_or(8080),
        )
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
