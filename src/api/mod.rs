mod types;

use async_trait::async_trait;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use tokio::fs;

pub use types::*;

use crate::config::Config;
use crate::core::AdPromptError;
use crate::http_client::HTTP_CLIENT;

/// Chat completion service returning the model's JSON text
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<String, AdPromptError>;
}

/// Image generation service returning a retrievable URL
#[async_trait]
pub trait ImageBackend: Send + Sync {
    async fn generate_image(&self, request: &ImageGenerationRequest)
        -> Result<String, AdPromptError>;
}

/// OpenAI-compatible API client
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    /// Create a new client from config. A missing key fails before any request is made.
    pub fn from_config(config: &Config) -> Result<Self, AdPromptError> {
        let api_key = config
            .api_key()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(AdPromptError::missing_api_key)?
            .to_string();

        Ok(Self {
            api_key,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_json<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<String, AdPromptError> {
        let url = format!("{}/{}", self.base_url, path);

        let response = HTTP_CLIENT
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!("Response status: {}", status);
        tracing::debug!("Response body: {}", body);

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        Ok(body)
    }
}

#[async_trait]
impl ChatBackend for OpenAiClient {
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<String, AdPromptError> {
        tracing::debug!(
            "Sending chat request: model={}, messages={}, image_attached={}",
            request.model,
            request.messages.len(),
            request.has_image_attachment()
        );

        let body = self.post_json("chat/completions", request).await?;
        chat_content(&body)
    }
}

#[async_trait]
impl ImageBackend for OpenAiClient {
    async fn generate_image(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<String, AdPromptError> {
        tracing::debug!(
            "Sending image request: model={}, size={}, prompt={}",
            request.model,
            request.size.as_str(),
            request.prompt
        );

        let body = self.post_json("images/generations", request).await?;
        image_url(&body)
    }
}

/// Extract `choices[0].message.content` from a chat completion body
fn chat_content(body: &str) -> Result<String, AdPromptError> {
    let response: ChatCompletionResponse = serde_json::from_str(body).map_err(|e| {
        AdPromptError::malformed(format!("Failed to parse chat completion: {}", e), body)
    })?;

    if let Some(usage) = &response.usage {
        tracing::debug!(
            "Token usage: prompt={:?}, completion={:?}, total={:?}",
            usage.prompt_tokens,
            usage.completion_tokens,
            usage.total_tokens
        );
    }

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AdPromptError::malformed("Chat completion had no choices", body))?;

    if let Some(refusal) = choice.message.refusal {
        return Err(AdPromptError::malformed(
            format!("Model refused the request: {}", refusal),
            body,
        ));
    }

    choice.message.content.ok_or_else(|| {
        AdPromptError::malformed(
            format!(
                "Chat completion had no content (finish_reason: {})",
                choice.finish_reason.as_deref().unwrap_or("unknown")
            ),
            body,
        )
    })
}

/// Extract `data[0].url` from an image generation body
fn image_url(body: &str) -> Result<String, AdPromptError> {
    let response: ImageGenerationResponse = serde_json::from_str(body).map_err(|e| {
        AdPromptError::malformed(format!("Failed to parse image response: {}", e), body)
    })?;

    let image = response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| AdPromptError::malformed("No images in response", body))?;

    if let Some(revised) = &image.revised_prompt {
        tracing::debug!("Revised prompt: {}", revised);
    }

    image
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AdPromptError::malformed("Image response had no URL", body))
}

/// Map a non-success HTTP status to an error category
fn status_error(status: StatusCode, body: &str) -> AdPromptError {
    let message = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("{}: {}", status, body));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AdPromptError::Auth(message),
        _ => AdPromptError::Connection {
            message,
            source: None,
        },
    }
}

/// Download a generated image into `output_dir` as `<name>.png`
pub async fn download_image(
    url: &str,
    output_dir: &Path,
    name: &str,
) -> Result<PathBuf, AdPromptError> {
    fs::create_dir_all(output_dir).await?;

    let response = HTTP_CLIENT.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AdPromptError::Connection {
            message: format!("Image download failed with status {}", status),
            source: None,
        });
    }
    let bytes = response.bytes().await?;

    let path = output_dir.join(format!("{}.png", name));
    fs::write(&path, &bytes).await?;

    tracing::info!("Saved image to: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_auth_error() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error", "code": "invalid_api_key"}}"#;
        let err = status_error(StatusCode::UNAUTHORIZED, body);
        assert!(matches!(err, AdPromptError::Auth(ref m) if m == "Incorrect API key provided"));
    }

    #[test]
    fn server_errors_map_to_connection_error() {
        let err = status_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.category(), "connection");
        assert!(err.to_string().contains("upstream down"));
    }

    #[test]
    fn client_requires_api_key() {
        let mut config = Config::default();
        config.api.key = Some("  ".to_string());
        let err = OpenAiClient::from_config(&config).err().unwrap();
        assert_eq!(err.category(), "auth");

        config.api.key = Some("sk-test".to_string());
        assert!(OpenAiClient::from_config(&config).is_ok());
    }

    #[test]
    fn image_request_serializes_size_preset() {
        let request = ImageGenerationRequest {
            model: "dall-e-3".to_string(),
            prompt: "a pudding".to_string(),
            size: ImageSize::Wide,
            quality: "standard".to_string(),
            n: 1,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["size"], "1792x1024");
        assert_eq!(json["n"], 1);
    }

    #[test]
    fn chat_content_reads_first_choice() {
        let body = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "{\"prompt\": \"A pudding\"}"}, "finish_reason": "stop"},
                {"message": {"role": "assistant", "content": "second"}, "finish_reason": "stop"}
            ],
            "usage": {"prompt_tokens": 120, "completion_tokens": 80, "total_tokens": 200}
        }"#;
        assert_eq!(chat_content(body).unwrap(), r#"{"prompt": "A pudding"}"#);
    }

    #[test]
    fn chat_refusal_is_malformed() {
        let body = r#"{"choices": [{"message": {"content": null, "refusal": "I can't help with that."}, "finish_reason": "stop"}]}"#;
        let err = chat_content(body).unwrap_err();
        assert_eq!(err.category(), "malformed_response");
        assert!(err.to_string().contains("I can't help with that."));
        assert_eq!(err.raw_output(), Some(body));
    }

    #[test]
    fn chat_without_choices_is_malformed() {
        let err = chat_content(r#"{"choices": []}"#).unwrap_err();
        assert!(err.to_string().contains("no choices"));
        let err = chat_content(r#"{}"#).unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }

    #[test]
    fn chat_null_content_reports_finish_reason() {
        let body = r#"{"choices": [{"message": {"content": null}, "finish_reason": "length"}]}"#;
        let err = chat_content(body).unwrap_err();
        assert_eq!(err.category(), "malformed_response");
        assert!(err.to_string().contains("finish_reason: length"));
    }

    #[test]
    fn chat_body_that_is_not_json_is_malformed() {
        let err = chat_content("<html>502</html>").unwrap_err();
        assert_eq!(err.raw_output(), Some("<html>502</html>"));
    }

    #[test]
    fn image_url_reads_first_entry() {
        let body = r#"{"created": 1, "data": [{"url": "https://img.example.com/a.png", "revised_prompt": "A glossy pudding"}]}"#;
        assert_eq!(image_url(body).unwrap(), "https://img.example.com/a.png");
    }

    #[test]
    fn image_url_missing_or_empty_is_malformed() {
        for body in [
            r#"{"data": []}"#,
            r#"{"data": [{"b64_json": "aGVsbG8="}]}"#,
            r#"{"data": [{"url": ""}]}"#,
            r#"{"data": [{"url": null}]}"#,
            "not json",
        ] {
            let err = image_url(body).unwrap_err();
            assert_eq!(err.category(), "malformed_response", "body: {}", body);
            assert_eq!(err.raw_output(), Some(body));
        }
    }

    #[test]
    fn text_only_message_has_no_parts() {
        let message = ChatMessage::user(MessageContent::Text("hello".to_string()));
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["content"], "hello");
    }
}
