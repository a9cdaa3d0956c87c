pub mod image_client;
pub mod text_client;

use crate::{
    config::WorkersAiConfig,
    error::{RelayError, Result},
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

pub use image_client::ImageClient;
pub use text_client::TextClient;

#[derive(Debug, Deserialize)]
pub struct WorkersAiMessage {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
}

/// Response wrapper shared by every `ai/run` call.
#[derive(Debug, Deserialize)]
pub struct WorkersAiEnvelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub errors: Vec<WorkersAiMessage>,
    pub result: Option<T>,
}

/// Authenticated handle on `{base}/accounts/{account}/ai/run`.
#[derive(Clone)]
pub struct RunEndpoint {
    http: reqwest::Client,
    run_url: String,
    api_token: String,
}

impl RunEndpoint {
    pub fn new(config: &WorkersAiConfig) -> Result<Self> {
        let account_id = config
            .account_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RelayError::ConfigError("CF_ACCOUNT_ID is not set".into()))?;
        let api_token = config
            .api_token
            .clone()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RelayError::ConfigError("CF_API_TOKEN is not set".into()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            run_url: format!(
                "{}/accounts/{}/ai/run",
                config.base_url.trim_end_matches('/'),
                account_id
            ),
            api_token,
        })
    }

    pub fn model_url(&self, model: &str) -> String {
        format!("{}/{}", self.run_url, model.trim_start_matches('/'))
    }

    pub async fn run<T: DeserializeOwned>(&self, model: &str, payload: &Value) -> Result<T> {
        let response = self
            .http
            .post(self.model_url(model))
            .bearer_auth(&self.api_token)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            log::error!("Workers AI returned {} for model {}", status, model);
            return Err(status_error(status, &body));
        }

        parse_envelope(&body)
    }
}

pub fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T> {
    let envelope: WorkersAiEnvelope<T> =
        serde_json::from_str(body).map_err(|e| RelayError::ResponseError(e.to_string()))?;

    if envelope.success == Some(false) || !envelope.errors.is_empty() {
        return Err(RelayError::ServiceError(join_messages(&envelope.errors)));
    }

    envelope
        .result
        .ok_or_else(|| RelayError::ResponseError("Workers AI response carried no result".into()))
}

fn status_error(status: reqwest::StatusCode, body: &str) -> RelayError {
    RelayError::ServiceError(format!("{} - {}", status, error_detail(body)))
}

fn error_detail(body: &str) -> String {
    match serde_json::from_str::<WorkersAiEnvelope<Value>>(body) {
        Ok(envelope) if !envelope.errors.is_empty() => join_messages(&envelope.errors),
        _ => body.trim().to_string(),
    }
}

fn join_messages(messages: &[WorkersAiMessage]) -> String {
    if messages.is_empty() {
        return "request was not successful".to_string();
    }
    messages
        .iter()
        .map(|m| match m.code {
            Some(code) => format!("{} ({})", m.message, code),
            None => m.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Chat and image clients sharing one HTTP connection pool.
#[derive(Clone)]
pub struct WorkersAiClient {
    text_client: TextClient,
    image_client: ImageClient,
}

impl WorkersAiClient {
    pub fn new(config: WorkersAiConfig) -> Result<Self> {
        let endpoint = RunEndpoint::new(&config)?;

        Ok(Self {
            text_client: TextClient::new(endpoint.clone(), config.chat_model.clone()),
            image_client: ImageClient::new(endpoint, config.image_model.clone()),
        })
    }

    pub fn text(&self) -> &TextClient {
        &self.text_client
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkersAiTextResult;

    fn config() -> WorkersAiConfig {
        WorkersAiConfig::new()
            .with_credentials("acct-123", "secret")
            .with_base_url("https://example.test/client/v4/")
    }

    #[test]
    fn builds_model_urls() {
        let endpoint = RunEndpoint::new(&config()).unwrap();
        assert_eq!(
            endpoint.model_url("@cf/black-forest-labs/flux-1-schnell"),
            "https://example.test/client/v4/accounts/acct-123/ai/run/@cf/black-forest-labs/flux-1-schnell"
        );
    }

    #[test]
    fn missing_credentials_is_a_config_error() {
        let err = RunEndpoint::new(&WorkersAiConfig::new()).err().unwrap();
        assert!(matches!(err, RelayError::ConfigError(_)));
    }

    #[test]
    fn unwraps_successful_envelope() {
        let body = r#"{"result":{"response":"A calm fox."},"success":true,"errors":[],"messages":[]}"#;
        let result: WorkersAiTextResult = parse_envelope(body).unwrap();
        assert_eq!(result.response.as_deref(), Some("A calm fox."));
    }

    #[test]
    fn surfaces_envelope_errors() {
        let body = r#"{"result":null,"success":false,"errors":[{"code":5006,"message":"Invalid input"}]}"#;
        let err = parse_envelope::<WorkersAiTextResult>(body).err().unwrap();
        assert_eq!(err.to_string(), "Upstream service error: Invalid input (5006)");
    }

    #[test]
    fn failed_status_reports_code_and_envelope_errors() {
        let body = r#"{"result":null,"success":false,"errors":[{"code":10000,"message":"Authentication error"}]}"#;
        let err = status_error(reqwest::StatusCode::UNAUTHORIZED, body);
        assert_eq!(
            err.to_string(),
            "Upstream service error: 401 Unauthorized - Authentication error (10000)"
        );
    }

    #[test]
    fn failed_status_with_plain_body() {
        let err = status_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "rate limited\n");
        assert_eq!(
            err.to_string(),
            "Upstream service error: 429 Too Many Requests - rate limited"
        );
    }

    #[test]
    fn error_detail_falls_back_to_raw_body() {
        assert_eq!(error_detail("  upstream exploded \n"), "upstream exploded");
    }
}
