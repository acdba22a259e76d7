use serde_json::json;

use crate::core::CreativeRequest;

/// Key of the nested image-prompt object in the model output
pub const PROMPT_KEY: &str = "nano_banana_pro_prompt";

pub const SYSTEM_INSTRUCTION: &str = r#"You are an Ace Creative Director at the WPP Group, specializing in Digital Out-of-Home (DOOH) advertising for convenience stores.

Your Mission:
Create a highly effective image generation prompt (JSON format) for a product to be displayed on a convenience store digital signage.

Key Considerations:
1. **Context**: Convenience store customers decide in < 1 second. High visibility and appetizing/appealing visuals are crucial.
2. **Targeting**: Analyze the Age, Gender, Income, and Repeat Rate to determine the optimal color psychology, lighting, and composition.
3. **Output**: You must output ONLY valid JSON matching the provided schema. The 'prompt' field should be in English, highly descriptive, focusing on lighting, textures, and composition tailored for AI image generators (like Midjourney or Stable Diffusion)."#;

pub const VISUAL_REFERENCE_NOTE: &str = "\n[Visual Reference]\nRefer to the attached product image for color accuracy and packaging details.";

/// JSON shape the model is asked to fill in
pub fn response_schema(req: &CreativeRequest) -> serde_json::Value {
    json!({
        "product_name": req.product_name,
        "target_audience": format!("{} years old, {}", req.target_age, req.target_gender.label()),
        "concept_rationale": "Reasoning for the design choice (WPP Ace perspective)",
        PROMPT_KEY: {
            "prompt": "Highly detailed English prompt for image generation...",
            "negative_prompt": "Low quality, blurry, text, watermark...",
            "aspect_ratio": req.orientation.aspect_ratio(),
            "layout_template": req.layout.label(),
            "color_palette": ["#Hex1", "#Hex2", "#Hex3"],
            "mood": "Energetic / Calm / Luxury etc."
        }
    })
}

/// Text of the user message; every form field ends up in here
pub fn user_message(req: &CreativeRequest) -> String {
    let schema = serde_json::to_string_pretty(&response_schema(req)).unwrap_or_default();

    format!(
        r#"Please generate a JSON prompt based on the following inputs:

[Product Info]
- Name: {name}
- Features: {features}

[Target Audience]
- Age: {age}
- Gender: {gender}
- Income: {income}
- Type: {customer}

[Design Specs]
- Orientation: {orientation} (Set aspect_ratio to {aspect_ratio})
- Layout: {layout}

[Output Schema]
{schema}
"#,
        name = req.product_name,
        features = req.product_features,
        age = req.target_age,
        gender = req.target_gender.label(),
        income = req.target_income.label(),
        customer = req.customer_type.label(),
        orientation = req.orientation.label(),
        aspect_ratio = req.orientation.aspect_ratio(),
        layout = req.layout.label(),
        schema = schema,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CustomerType, Gender, IncomeLevel, Layout, Orientation};

    #[test]
    fn user_message_mentions_every_field() {
        let req = CreativeRequest::new("Premium Pudding")
            .with_features("Hokkaido cream, golden package")
            .with_age(45)
            .with_gender(Gender::Female)
            .with_income(IncomeLevel::High)
            .with_customer_type(CustomerType::Repeater)
            .with_orientation(Orientation::Portrait)
            .with_layout(Layout::SizzleFocus);

        let text = user_message(&req);
        for expected in [
            "- Name: Premium Pudding",
            "- Features: Hokkaido cream, golden package",
            "- Age: 45",
            "- Gender: Female",
            "- Income: High",
            "- Type: Repeat customer (Recall focus)",
            "- Orientation: Portrait 9:16 (Set aspect_ratio to 9:16)",
            "- Layout: Sizzle Focus",
        ] {
            assert!(text.contains(expected), "missing {:?} in:\n{}", expected, text);
        }
    }

    #[test]
    fn schema_carries_derived_aspect_ratio() {
        let req = CreativeRequest::new("Pudding").with_orientation(Orientation::Landscape);
        let schema = response_schema(&req);
        assert_eq!(schema[PROMPT_KEY]["aspect_ratio"], "16:9");
        assert_eq!(schema[PROMPT_KEY]["layout_template"], "Full Image");
    }
}
