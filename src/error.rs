use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Transport error: {0}")]
    TransportError(String),
    #[error("Upstream service error: {0}")]
    ServiceError(String),
    #[error("Response error: {0}")]
    ResponseError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Decode error: {0}")]
    DecodeError(String),
    #[error("AWS error: {0}")]
    AwsError(String),
    #[error("AWS service error: {0}")]
    AwsServiceError(String),
    #[error("Server error: {0}")]
    ServerError(String),
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        RelayError::TransportError(e.to_string())
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(e: serde_json::Error) -> Self {
        RelayError::SerializationError(e.to_string())
    }
}

impl From<base64::DecodeError> for RelayError {
    fn from(e: base64::DecodeError) -> Self {
        RelayError::DecodeError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_keeps_upstream_message() {
        let err = RelayError::ServiceError("429 Too Many Requests - rate limited".into());
        assert_eq!(
            err.to_string(),
            "Upstream service error: 429 Too Many Requests - rate limited"
        );
    }

    #[test]
    fn json_errors_become_serialization_errors() {
        let err: RelayError = serde_json::from_str::<serde_json::Value>("{nope")
            .unwrap_err()
            .into();
        assert!(matches!(err, RelayError::SerializationError(_)));
    }
}
