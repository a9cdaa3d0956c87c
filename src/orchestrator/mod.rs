//! Prompt refinement pipeline: analyze a prompt into scene elements, enrich it
//! into one descriptive sentence, generate an image from that sentence.
//!
//! Every operation makes exactly one upstream call and never retries. The only
//! local recovery is the `subjects` fallback of [`PromptOrchestrator::analyze`].

pub mod extract;
pub mod templates;

use crate::{
    config::OrchestratorConfig,
    error::{RelayError, Result},
    models::{ChatRequest, ElementMap, ImageRequest, PromptRequest},
    services::InferenceClient,
};

use templates::{
    forbidden_descriptors_in, synthesize_user_message, ANALYZE_SYSTEM_PROMPT,
    DEFAULT_ENRICH_SYSTEM_PROMPT, SYNTHESIZE_SYSTEM_PROMPT,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub elements: ElementMap,
    /// Set when the reply could not be parsed and `subjects` holds the raw prompt.
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnrichInput {
    /// Two-pass mode: synthesize a sentence from a previous analysis.
    Structure(ElementMap),
    /// Single-pass mode: elaborate the raw prompt, optionally with caller instructions.
    Prompt {
        prompt: String,
        system_prompt: Option<String>,
    },
}

impl EnrichInput {
    /// `structure` wins over `prompt` when a request carries both.
    pub fn from_request(request: PromptRequest) -> Result<Self> {
        if let Some(structure) = request.structure {
            return Ok(EnrichInput::Structure(structure));
        }
        let prompt = request.require_prompt()?.to_string();
        Ok(EnrichInput::Prompt {
            prompt,
            system_prompt: request.system_prompt,
        })
    }
}

#[derive(Clone)]
pub struct PromptOrchestrator {
    services: InferenceClient,
    config: OrchestratorConfig,
}

impl PromptOrchestrator {
    pub fn new(services: InferenceClient, config: OrchestratorConfig) -> Self {
        Self { services, config }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub async fn analyze(&self, prompt: &str) -> Result<Analysis> {
        ensure_prompt(prompt)?;

        log::info!("Analyzing prompt with {}", self.services.chat().model());
        let request = ChatRequest::new(ANALYZE_SYSTEM_PROMPT, prompt, self.config.analyze_max_tokens);
        let reply = self.services.chat().complete(request).await?;
        log::debug!("Analysis reply: {}", reply);

        let (elements, fallback) = extract::elements_from_reply(&reply, prompt);
        if fallback {
            log::warn!("Analysis reply had no usable subjects, falling back to the raw prompt");
        }

        Ok(Analysis { elements, fallback })
    }

    pub async fn enrich(&self, input: EnrichInput) -> Result<String> {
        let enriched = match input {
            EnrichInput::Structure(elements) => {
                if elements.subjects.iter().all(|s| s.trim().is_empty()) {
                    return Err(RelayError::RequestError(
                        "structure.subjects must contain at least one subject".into(),
                    ));
                }
                let user = synthesize_user_message(&elements.to_compact_json()?);
                let request =
                    ChatRequest::new(SYNTHESIZE_SYSTEM_PROMPT, user, self.config.enrich_max_tokens);
                self.services.chat().complete(request).await?.trim().to_string()
            }
            EnrichInput::Prompt {
                prompt,
                system_prompt,
            } => {
                ensure_prompt(&prompt)?;
                let system = system_prompt
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_ENRICH_SYSTEM_PROMPT.to_string());
                let request = ChatRequest::new(system, prompt, self.config.enrich_max_tokens);
                self.services.chat().complete(request).await?
            }
        };

        let forbidden = forbidden_descriptors_in(&enriched);
        if !forbidden.is_empty() {
            log::warn!("Enriched prompt uses banned descriptors: {}", forbidden.join(", "));
        }

        Ok(enriched)
    }

    /// Returns the decoded image bytes; `steps` of `None` or `0` uses the configured default.
    pub async fn generate(&self, prompt: &str, steps: Option<u32>) -> Result<Vec<u8>> {
        ensure_prompt(prompt)?;

        let steps = steps
            .filter(|s| *s > 0)
            .unwrap_or(self.config.default_steps);
        log::info!(
            "Generating image for prompt: {} ({} via {})",
            prompt,
            steps,
            self.services.image().model()
        );

        let payload = self
            .services
            .image()
            .synthesize(ImageRequest {
                prompt: prompt.to_string(),
                steps,
            })
            .await?;

        payload.decode()
    }
}

fn ensure_prompt(prompt: &str) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(RelayError::RequestError("prompt must be a non-empty string".into()));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::testing::{client, ScriptedChat, ScriptedImage};
    use super::*;
    use crate::models::ChatRole;
    use serde_json::json;

    const PNG_SIGNATURE_B64: &str = "iVBORw0KGgo=";

    fn orchestrator(chat: &std::sync::Arc<ScriptedChat>, image: &std::sync::Arc<ScriptedImage>) -> PromptOrchestrator {
        PromptOrchestrator::new(client(chat, image), OrchestratorConfig::default())
    }

    #[tokio::test]
    async fn analyze_parses_documented_rabbit_example() {
        let chat = ScriptedChat::replying(
            r#"{"subjects":["rabbit"],"setting":null,"activity":null,"clothing":null,"objects":null,"decor":null}"#,
        );
        let image = ScriptedImage::returning(PNG_SIGNATURE_B64);

        let analysis = orchestrator(&chat, &image).analyze("un lapin").await.unwrap();

        assert!(!analysis.fallback);
        assert_eq!(
            serde_json::to_value(&analysis.elements).unwrap(),
            json!({"subjects":["rabbit"],"setting":null,"activity":null,"clothing":null,"objects":null,"decor":null})
        );

        let sent = chat.last_request();
        assert_eq!(sent.system_prompt(), Some(ANALYZE_SYSTEM_PROMPT));
        assert_eq!(sent.user_prompt(), Some("un lapin"));
        assert_eq!(sent.max_tokens, 512);
        assert_eq!(image.calls(), 0);
    }

    #[tokio::test]
    async fn analyze_falls_back_on_unparseable_reply() {
        for reply in ["Sorry, I can't do that.", "{broken json", r#"{"subjects": []}"#] {
            let chat = ScriptedChat::replying(reply);
            let image = ScriptedImage::returning(PNG_SIGNATURE_B64);

            let analysis = orchestrator(&chat, &image).analyze("un lapin").await.unwrap();

            assert!(analysis.fallback, "{}", reply);
            assert_eq!(analysis.elements.subjects, vec!["un lapin".to_string()]);
        }
    }

    #[tokio::test]
    async fn analyze_propagates_transport_failures() {
        let chat = ScriptedChat::failing("503 Service Unavailable");
        let image = ScriptedImage::returning(PNG_SIGNATURE_B64);

        let err = orchestrator(&chat, &image).analyze("un lapin").await.unwrap_err();

        assert_eq!(err.to_string(), "Upstream service error: 503 Service Unavailable");
        assert_eq!(chat.calls(), 1);
    }

    #[tokio::test]
    async fn analyze_rejects_blank_prompt_without_calling_upstream() {
        let chat = ScriptedChat::replying("{}");
        let image = ScriptedImage::returning(PNG_SIGNATURE_B64);

        let err = orchestrator(&chat, &image).analyze("  ").await.unwrap_err();

        assert!(matches!(err, RelayError::RequestError(_)));
        assert_eq!(chat.calls(), 0);
    }

    #[tokio::test]
    async fn single_pass_enrich_sends_default_template_verbatim() {
        let chat = ScriptedChat::replying("A playful cat naps on a windowsill.\n");
        let image = ScriptedImage::returning(PNG_SIGNATURE_B64);

        let enriched = orchestrator(&chat, &image)
            .enrich(EnrichInput::Prompt {
                prompt: "un chat".into(),
                system_prompt: None,
            })
            .await
            .unwrap();

        assert_eq!(enriched, "A playful cat naps on a windowsill.\n");
        let sent = chat.last_request();
        assert_eq!(sent.messages.len(), 2);
        assert_eq!(sent.messages[0].role, ChatRole::System);
        assert_eq!(sent.messages[0].content, DEFAULT_ENRICH_SYSTEM_PROMPT);
        assert_eq!(sent.messages[1].role, ChatRole::User);
        assert_eq!(sent.messages[1].content, "un chat");
        assert_eq!(sent.max_tokens, 256);
    }

    #[tokio::test]
    async fn single_pass_enrich_honours_override() {
        let chat = ScriptedChat::replying("A cat.");
        let image = ScriptedImage::returning(PNG_SIGNATURE_B64);
        let orchestrator = orchestrator(&chat, &image);

        orchestrator
            .enrich(EnrichInput::Prompt {
                prompt: "un chat".into(),
                system_prompt: Some("Translate to English only.".into()),
            })
            .await
            .unwrap();
        assert_eq!(chat.last_request().system_prompt(), Some("Translate to English only."));

        orchestrator
            .enrich(EnrichInput::Prompt {
                prompt: "un chat".into(),
                system_prompt: Some("   ".into()),
            })
            .await
            .unwrap();
        assert_eq!(chat.last_request().system_prompt(), Some(DEFAULT_ENRICH_SYSTEM_PROMPT));
    }

    #[tokio::test]
    async fn two_pass_enrich_sends_compact_elements_and_trims() {
        let chat = ScriptedChat::replying("  A curious rabbit sits quietly.  \n");
        let image = ScriptedImage::returning(PNG_SIGNATURE_B64);
        let elements = ElementMap::new(vec!["rabbit".into()]);
        let compact = elements.to_compact_json().unwrap();

        let enriched = orchestrator(&chat, &image)
            .enrich(EnrichInput::Structure(elements))
            .await
            .unwrap();

        assert_eq!(enriched, "A curious rabbit sits quietly.");
        assert!(templates::forbidden_descriptors_in(&enriched).is_empty());
        let sent = chat.last_request();
        assert_eq!(sent.system_prompt(), Some(SYNTHESIZE_SYSTEM_PROMPT));
        assert_eq!(sent.user_prompt(), Some(format!("Elements: {}", compact).as_str()));
        assert!(!compact.contains('\n'));
    }

    #[tokio::test]
    async fn two_pass_enrich_rejects_empty_subjects() {
        let chat = ScriptedChat::replying("anything");
        let image = ScriptedImage::returning(PNG_SIGNATURE_B64);

        let err = orchestrator(&chat, &image)
            .enrich(EnrichInput::Structure(ElementMap::new(Vec::new())))
            .await
            .unwrap_err();

        assert!(matches!(err, RelayError::RequestError(_)));
        assert_eq!(chat.calls(), 0);
    }

    #[test]
    fn structure_takes_precedence_over_prompt() {
        let request = PromptRequest {
            prompt: Some("un chat".into()),
            structure: Some(ElementMap::new(vec!["cat".into()])),
            ..Default::default()
        };
        assert!(matches!(
            EnrichInput::from_request(request).unwrap(),
            EnrichInput::Structure(_)
        ));
        assert!(EnrichInput::from_request(PromptRequest::default()).is_err());
    }

    #[tokio::test]
    async fn generate_defaults_to_six_steps_and_decodes() {
        let chat = ScriptedChat::replying("unused");
        let image = ScriptedImage::returning(PNG_SIGNATURE_B64);
        let orchestrator = orchestrator(&chat, &image);

        let bytes = orchestrator.generate("A joyful rabbit.", None).await.unwrap();
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
        assert_eq!(image.last_request().steps, 6);
        assert_eq!(image.last_request().prompt, "A joyful rabbit.");

        orchestrator.generate("A joyful rabbit.", Some(0)).await.unwrap();
        assert_eq!(image.last_request().steps, 6);

        let again = orchestrator.generate("A joyful rabbit.", Some(4)).await.unwrap();
        assert_eq!(image.last_request().steps, 4);
        assert_eq!(bytes, again);
        assert_eq!(chat.calls(), 0);
    }

    #[tokio::test]
    async fn generate_surfaces_decode_and_service_errors() {
        let chat = ScriptedChat::replying("unused");

        let bad_payload = ScriptedImage::returning("%%%");
        let err = orchestrator(&chat, &bad_payload)
            .generate("a fox", None)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::DecodeError(_)));

        let down = ScriptedImage::failing("500 Internal Server Error");
        let err = orchestrator(&chat, &down).generate("a fox", None).await.unwrap_err();
        assert!(matches!(err, RelayError::ServiceError(_)));
        assert_eq!(down.calls(), 1);
    }
}
