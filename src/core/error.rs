use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdPromptError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Malformed response: {message}")]
    MalformedResponse {
        message: String,
        /// Raw provider output, kept for inspection
        raw: String,
    },

    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AdPromptError {
    pub fn missing_api_key() -> Self {
        AdPromptError::Auth(
            "API key not configured. Set OPENAI_API_KEY, pass --api-key, or run: adprompt config set api.key <your-key>"
                .to_string(),
        )
    }

    pub fn malformed(message: impl Into<String>, raw: impl Into<String>) -> Self {
        AdPromptError::MalformedResponse {
            message: message.into(),
            raw: raw.into(),
        }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AdPromptError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Short machine-readable category used in JSON output
    pub fn category(&self) -> &'static str {
        match self {
            AdPromptError::Auth(_) => "auth",
            AdPromptError::Connection { .. } => "connection",
            AdPromptError::MalformedResponse { .. } => "malformed_response",
            AdPromptError::Validation { .. } => "validation",
            AdPromptError::IoError(_) => "io",
        }
    }

    /// Raw provider text, if this error carries one
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            AdPromptError::MalformedResponse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AdPromptError {
    fn from(err: reqwest::Error) -> Self {
        AdPromptError::Connection {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_are_stable() {
        assert_eq!(AdPromptError::missing_api_key().category(), "auth");
        assert_eq!(AdPromptError::malformed("bad", "{").category(), "malformed_response");
        assert_eq!(
            AdPromptError::validation("product_name", "must not be empty").category(),
            "validation"
        );
    }

    #[test]
    fn malformed_keeps_raw_text() {
        let err = AdPromptError::malformed("not JSON", "hello there");
        assert_eq!(err.raw_output(), Some("hello there"));
        assert!(AdPromptError::validation("prompt", "empty").raw_output().is_none());
    }

    #[test]
    fn validation_message_names_the_field() {
        let err = AdPromptError::validation("product_name", "must not be empty");
        assert_eq!(err.to_string(), "Invalid product_name: must not be empty");
    }
}
