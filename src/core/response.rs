use serde::{Deserialize, Deserializer, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

/// Image-generation brief produced by the chat model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePrompt {
    pub prompt: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub negative_prompt: String,

    /// Overwritten from the request orientation after parsing
    #[serde(default, deserialize_with = "null_as_default")]
    pub aspect_ratio: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub layout_template: String,

    /// Hex colors, most important first
    #[serde(default, deserialize_with = "null_as_default")]
    pub color_palette: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub mood: String,

    /// Keys the model added beyond the schema, kept for the exported file
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Models sometimes send `null` for fields they have nothing to say about
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ImagePrompt {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: String::new(),
            aspect_ratio: String::new(),
            layout_template: String::new(),
            color_palette: Vec::new(),
            mood: String::new(),
            extra: Map::new(),
        }
    }

    /// Serialize with 4-space indentation, the format of the exported prompt file
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        // serde_json only ever writes valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Result of one submission, ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativeResponse {
    pub product_name: String,

    /// Summary of the audience analysis
    pub target_audience: String,

    pub concept_rationale: String,

    pub image_prompt: ImagePrompt,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_prompt() -> ImagePrompt {
        ImagePrompt {
            prompt: "Golden pudding cup under warm rim light".to_string(),
            negative_prompt: "blurry, watermark".to_string(),
            aspect_ratio: "16:9".to_string(),
            layout_template: "Full Image".to_string(),
            color_palette: vec!["#F5C542".to_string(), "#3B2414".to_string()],
            mood: "Luxury".to_string(),
            extra: Map::new(),
        }
    }

    #[test]
    fn pretty_json_uses_four_space_indent() {
        let json = sample_prompt().to_pretty_json().unwrap();
        assert!(json.starts_with("{\n    \"prompt\": "));
        assert!(json.contains("\n        \"#F5C542\""));
    }

    #[test]
    fn exported_prompt_parses_back_to_the_same_value() {
        let mut prompt = sample_prompt();
        prompt
            .extra
            .insert("lighting".to_string(), Value::String("rim light".to_string()));

        let json = prompt.to_pretty_json().unwrap();
        let parsed: ImagePrompt = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, prompt);
    }

    #[test]
    fn null_optional_fields_default_to_empty() {
        let parsed: ImagePrompt = serde_json::from_str(
            r#"{"prompt": "a cup", "negative_prompt": null, "color_palette": null, "mood": null}"#,
        )
        .unwrap();
        assert_eq!(parsed.negative_prompt, "");
        assert!(parsed.color_palette.is_empty());
        assert_eq!(parsed.mood, "");
        assert!(parsed.extra.is_empty());
    }

    #[test]
    fn missing_optional_fields_default_to_empty() {
        let parsed: ImagePrompt = serde_json::from_str(r#"{"prompt": "a cup"}"#).unwrap();
        assert_eq!(parsed.prompt, "a cup");
        assert!(parsed.color_palette.is_empty());
        assert!(parsed.extra.is_empty());
    }
}
