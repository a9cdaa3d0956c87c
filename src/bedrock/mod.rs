pub mod image_client;
pub mod text_client;

use crate::{
    config::BedrockConfig,
    error::{RelayError, Result},
};
use aws_config::BehaviorVersion;
use aws_sdk_bedrockruntime::{error::ProvideErrorMetadata, primitives::Blob, Client};
use serde_json::Value;

pub use image_client::ImageClient;
pub use text_client::TextClient;

#[derive(Clone)]
pub struct BedrockClient {
    text_client: TextClient,
    image_client: ImageClient,
}

impl BedrockClient {
    pub async fn new(bedrock_config: BedrockConfig) -> Result<Self> {
        let region = bedrock_config
            .region
            .clone()
            .unwrap_or_else(|| "us-east-1".to_string());

        let aws_config = if let (Some(access_key), Some(secret_key)) =
            (&bedrock_config.access_key, &bedrock_config.secret_key)
        {
            aws_config::defaults(BehaviorVersion::latest())
                .credentials_provider(aws_sdk_bedrockruntime::config::Credentials::new(
                    access_key,
                    secret_key,
                    None,
                    None,
                    "dreamrelay",
                ))
                .region(aws_sdk_bedrockruntime::config::Region::new(region))
                .load()
                .await
        } else {
            aws_config::defaults(BehaviorVersion::latest())
                .region(aws_sdk_bedrockruntime::config::Region::new(region))
                .load()
                .await
        };

        let client = Client::new(&aws_config);

        Ok(Self {
            text_client: TextClient::new(client.clone(), bedrock_config.chat_model),
            image_client: ImageClient::new(client, bedrock_config.image_model),
        })
    }

    pub fn text(&self) -> &TextClient {
        &self.text_client
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }
}

/// Sends one JSON body to `invoke_model` and returns the raw JSON reply.
pub(crate) async fn invoke_json(client: &Client, model_id: &str, payload: &Value) -> Result<String> {
    let request_json = serde_json::to_string(payload)
        .map_err(|e| RelayError::SerializationError(e.to_string()))?;

    let response = client
        .invoke_model()
        .model_id(model_id)
        .content_type("application/json")
        .accept("application/json")
        .body(Blob::new(request_json.into_bytes()))
        .send()
        .await
        .map_err(|e| {
            log::error!("Bedrock invoke_model failed for {}: {:?}", model_id, e);

            if let Some(service_error) = e.as_service_error() {
                RelayError::AwsServiceError(format!(
                    "{} - {}",
                    service_error.code().unwrap_or("unknown"),
                    service_error.message().unwrap_or("no message")
                ))
            } else {
                RelayError::AwsError(e.to_string())
            }
        })?;

    String::from_utf8(response.body.into_inner())
        .map_err(|e| RelayError::ResponseError(e.to_string()))
}
