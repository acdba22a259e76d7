pub mod prompt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{Map, Value};

use crate::api::{
    ChatBackend, ChatCompletionRequest, ChatMessage, ContentPart, ImageBackend,
    ImageGenerationRequest, ImageSize, ImageUrl, MessageContent, ResponseFormat,
};
use crate::config::Config;
use crate::core::{
    AdPromptError, CreativeRequest, CreativeResponse, ImagePrompt, Orientation, Stage, Submission,
};

use prompt::PROMPT_KEY;

/// Quality tier for generated images
pub const IMAGE_QUALITY: &str = "standard";

/// Top-level keys that describe the creative, not the image prompt
const SUMMARY_KEYS: [&str; 3] = ["product_name", "target_audience", "concept_rationale"];

/// Model choices for both stages
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub chat_model: String,
    pub image_model: String,
    pub temperature: f32,
}

impl ModelSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            chat_model: config.api.chat_model.clone(),
            image_model: config.api.image_model.clone(),
            temperature: config.api.temperature,
        }
    }
}

/// Drives one submission: chat request, then optionally an image request
pub struct Orchestrator<C, I> {
    chat: C,
    images: I,
    settings: ModelSettings,
}

impl<C, I> Orchestrator<C, I> {
    pub fn new(chat: C, images: I, settings: ModelSettings) -> Self {
        Self {
            chat,
            images,
            settings,
        }
    }

    /// Build the chat request. The reference image, if any, goes inline as a data URL.
    pub fn build_chat_request(&self, req: &CreativeRequest) -> ChatCompletionRequest {
        let text = prompt::user_message(req);

        let content = match &req.reference_image {
            Some(image) => MessageContent::Parts(vec![
                ContentPart::Text {
                    text: format!("{}{}", text, prompt::VISUAL_REFERENCE_NOTE),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!(
                            "data:{};base64,{}",
                            image.mime_type,
                            BASE64.encode(&image.bytes)
                        ),
                    },
                },
            ]),
            None => MessageContent::Text(text),
        };

        ChatCompletionRequest {
            model: self.settings.chat_model.clone(),
            messages: vec![
                ChatMessage::system(prompt::SYSTEM_INSTRUCTION),
                ChatMessage::user(content),
            ],
            response_format: ResponseFormat::json_object(),
            temperature: self.settings.temperature,
        }
    }

    /// Build the image request for an already-validated prompt
    pub fn build_image_request(
        &self,
        prompt_text: &str,
        orientation: Option<Orientation>,
    ) -> Result<ImageGenerationRequest, AdPromptError> {
        if prompt_text.trim().is_empty() {
            return Err(AdPromptError::validation(
                "prompt_text",
                "image prompt must not be empty",
            ));
        }

        let size = match orientation {
            Some(Orientation::Landscape) => ImageSize::Wide,
            Some(Orientation::Portrait) => ImageSize::Tall,
            None => ImageSize::Square,
        };

        Ok(ImageGenerationRequest {
            model: self.settings.image_model.clone(),
            prompt: prompt_text.to_string(),
            size,
            quality: IMAGE_QUALITY.to_string(),
            n: 1,
        })
    }
}

impl<C: ChatBackend, I: ImageBackend> Orchestrator<C, I> {
    /// Run the whole chain, recording progress and partial output on `submission`
    pub async fn submit(
        &self,
        request: CreativeRequest,
        render_image: bool,
        submission: &mut Submission,
    ) -> Result<CreativeResponse, AdPromptError> {
        let result = self.run_stages(request, render_image, submission).await;

        match &result {
            Ok(response) => submission.set_completed(response.clone()),
            Err(e) => submission.set_failed(e),
        }

        result
    }

    async fn run_stages(
        &self,
        request: CreativeRequest,
        render_image: bool,
        submission: &mut Submission,
    ) -> Result<CreativeResponse, AdPromptError> {
        request.validate()?;

        submission.set_running(Stage::Chat);
        let raw = {
            let chat_request = self.build_chat_request(&request);
            self.chat.complete(&chat_request).await?
        };

        let CreativeRequest {
            product_name,
            orientation,
            reference_image,
            ..
        } = request;
        // Only needed for the chat request
        drop(reference_image);

        submission.record_raw_chat(raw.as_str());

        let mut response = parse_chat_response(&raw)?;
        response.image_prompt.aspect_ratio = orientation.aspect_ratio().to_string();
        if response.product_name.trim().is_empty() {
            response.product_name = product_name;
        }

        if !render_image {
            return Ok(assemble_result(response, None));
        }

        submission.record_partial(response.clone());
        submission.set_running(Stage::Image);

        let image_request =
            self.build_image_request(&response.image_prompt.prompt, Some(orientation))?;
        let url = self.images.generate_image(&image_request).await?;

        Ok(assemble_result(response, Some(url)))
    }
}

/// Parse the model's JSON text into a response.
///
/// Accepts the prompt object either nested under `nano_banana_pro_prompt`
/// or flattened into the top level.
pub fn parse_chat_response(raw: &str) -> Result<CreativeResponse, AdPromptError> {
    let value: Value = serde_json::from_str(raw.trim()).map_err(|e| {
        AdPromptError::malformed(format!("response is not valid JSON: {}", e), raw)
    })?;

    let Value::Object(mut root) = value else {
        return Err(AdPromptError::malformed("response is not a JSON object", raw));
    };

    let mut prompt_object = match root.remove(PROMPT_KEY) {
        Some(Value::Object(nested)) => nested,
        Some(_) => {
            return Err(AdPromptError::malformed(
                format!("`{}` is not an object", PROMPT_KEY),
                raw,
            ))
        }
        None => {
            let mut flattened = root.clone();
            for key in SUMMARY_KEYS {
                flattened.remove(key);
            }
            flattened
        }
    };

    match prompt_object.get("prompt") {
        None | Some(Value::Null) => {
            return Err(AdPromptError::malformed(
                "missing required field `prompt`",
                raw,
            ))
        }
        Some(Value::String(text)) if text.trim().is_empty() => {
            return Err(AdPromptError::validation("prompt", "image prompt is empty"))
        }
        Some(Value::String(_)) => {}
        Some(_) => {
            return Err(AdPromptError::malformed("field `prompt` must be a string", raw))
        }
    }

    // Derived from the orientation later, whatever the model put here
    prompt_object.remove("aspect_ratio");

    let image_prompt: ImagePrompt = serde_json::from_value(Value::Object(prompt_object))
        .map_err(|e| AdPromptError::malformed(format!("invalid `{}`: {}", PROMPT_KEY, e), raw))?;

    Ok(CreativeResponse {
        product_name: text_field(&root, "product_name", raw)?,
        target_audience: text_field(&root, "target_audience", raw)?,
        concept_rationale: text_field(&root, "concept_rationale", raw)?,
        image_prompt,
        generated_image_url: None,
    })
}

fn text_field(root: &Map<String, Value>, key: &str, raw: &str) -> Result<String, AdPromptError> {
    match root.get(key) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(AdPromptError::malformed(
            format!("field `{}` must be a string", key),
            raw,
        )),
    }
}

/// Attach the image URL to the chat-derived response
pub fn assemble_result(chat: CreativeResponse, image_url: Option<String>) -> CreativeResponse {
    CreativeResponse {
        generated_image_url: image_url,
        ..chat
    }
}
