use serde::{Deserialize, Serialize};

use super::elements::ElementMap;
use crate::error::{RelayError, Result};

/// Body accepted by every POST route. Each route reads the fields it needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(rename = "systemPrompt", default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<ElementMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
}

impl PromptRequest {
    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Default::default()
        }
    }

    pub fn require_prompt(&self) -> Result<&str> {
        match self.prompt.as_deref() {
            Some(prompt) if !prompt.trim().is_empty() => Ok(prompt),
            _ => Err(RelayError::RequestError("prompt must be a non-empty string".into())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub analysis: ElementMap,
    #[serde(rename = "parseError", default, skip_serializing_if = "std::ops::Not::not")]
    pub parse_error: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichResponse {
    pub enriched: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_camel_case_system_prompt() {
        let request: PromptRequest = serde_json::from_value(json!({
            "prompt": "un chat",
            "systemPrompt": "Translate only."
        }))
        .unwrap();
        assert_eq!(request.system_prompt.as_deref(), Some("Translate only."));
        assert!(request.structure.is_none());
        assert!(request.steps.is_none());
    }

    #[test]
    fn blank_prompt_is_rejected() {
        assert!(PromptRequest::with_prompt("   ").require_prompt().is_err());
        assert!(PromptRequest::default().require_prompt().is_err());
        assert_eq!(
            PromptRequest::with_prompt("a fox").require_prompt().unwrap(),
            "a fox"
        );
    }

    #[test]
    fn parse_error_flag_only_when_set() {
        let ok = AnalyzeResponse {
            analysis: ElementMap::new(vec!["rabbit".into()]),
            parse_error: false,
        };
        assert!(serde_json::to_value(&ok).unwrap().get("parseError").is_none());

        let failed = AnalyzeResponse {
            analysis: ElementMap::fallback("???"),
            parse_error: true,
        };
        assert_eq!(serde_json::to_value(&failed).unwrap()["parseError"], json!(true));
    }
}
