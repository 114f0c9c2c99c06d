use serde_json::{json, Value};
use thiserror::Error;

/// Failure talking to the language-model service.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("OPENROUTER_API_KEY environment variable is not set")]
    MissingApiKey,

    #[error("no completion provider registered as '{0}'")]
    UnknownProvider(String),

    #[error("{provider} rejected the credentials: {detail}")]
    Unauthorized { provider: String, detail: String },

    #[error("{provider} request failed ({status}): {body}")]
    Http {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} transport failed: {source}")]
    Transport {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned an unusable response: {detail}")]
    InvalidResponse { provider: String, detail: String },
}

/// Caller-visible outcome of a failed request, each with its own status.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("message is required")]
    InvalidRequest,

    #[error("API configuration error: {0}")]
    Configuration(String),

    #[error("Invalid API key. Please check your OpenRouter API key.")]
    Unauthorized,

    #[error("Server error: {0}")]
    Upstream(String),
}

impl ChatError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest => 400,
            Self::Unauthorized => 401,
            Self::Configuration(_) | Self::Upstream(_) => 500,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

impl From<ProviderError> for ChatError {
    fn from(err: ProviderError) -> Self {
        let text = err.to_string();
        match err {
            ProviderError::MissingApiKey | ProviderError::UnknownProvider(_) => {
                Self::Configuration(text)
            }
            ProviderError::Unauthorized { .. } => Self::Unauthorized,
            ProviderError::Http { status: 401, .. } => Self::Unauthorized,
            _ if text.contains("User not found") => Self::Unauthorized,
            _ => Self::Upstream(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ChatError, ProviderError};

    #[test]
    fn missing_key_is_a_configuration_error() {
        let err = ChatError::from(ProviderError::MissingApiKey);
        assert_eq!(err.status_code(), 500);
        assert_eq!(
            err.to_json(),
            json!({"error": "API configuration error: OPENROUTER_API_KEY environment variable is not set"})
        );
    }

    #[test]
    fn auth_signatures_map_to_unauthorized() {
        let by_status = ChatError::from(ProviderError::Http {
            provider: "OpenRouter".to_string(),
            status: 401,
            body: "{}".to_string(),
        });
        assert_eq!(by_status.status_code(), 401);

        let by_body = ChatError::from(ProviderError::InvalidResponse {
            provider: "OpenRouter".to_string(),
            detail: "User not found.".to_string(),
        });
        assert!(matches!(by_body, ChatError::Unauthorized));
        assert_eq!(
            by_body.to_string(),
            "Invalid API key. Please check your OpenRouter API key."
        );
    }

    #[test]
    fn other_failures_are_generic_server_errors() {
        let err = ChatError::from(ProviderError::Http {
            provider: "OpenRouter".to_string(),
            status: 503,
            body: "overloaded".to_string(),
        });
        assert_eq!(err.status_code(), 500);
        assert_eq!(
            err.to_string(),
            "Server error: OpenRouter request failed (503): overloaded"
        );
        assert_eq!(ChatError::InvalidRequest.status_code(), 400);
    }
}
