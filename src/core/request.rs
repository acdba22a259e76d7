use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use super::error::AdPromptError;

pub const MIN_AGE: u8 = 10;
pub const MAX_AGE: u8 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IncomeLevel {
    High,
    #[default]
    Medium,
    Low,
}

impl IncomeLevel {
    pub fn label(&self) -> &'static str {
        match self {
            IncomeLevel::High => "High",
            IncomeLevel::Medium => "Medium",
            IncomeLevel::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CustomerType {
    /// First-time buyers, the creative has to win attention
    #[default]
    New,
    /// Returning buyers, the creative has to trigger recall
    Repeater,
}

impl CustomerType {
    pub fn label(&self) -> &'static str {
        match self {
            CustomerType::New => "New customer (Attention focus)",
            CustomerType::Repeater => "Repeat customer (Recall focus)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
}

impl Orientation {
    /// Aspect ratio sent to the image model. Never taken from the chat output.
    pub fn aspect_ratio(&self) -> &'static str {
        match self {
            Orientation::Landscape => "16:9",
            Orientation::Portrait => "9:16",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Orientation::Landscape => "Landscape 16:9",
            Orientation::Portrait => "Portrait 9:16",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    #[default]
    FullImage,
    TextHeavy,
    FourGrid,
    Split,
    SizzleFocus,
}

impl Layout {
    pub fn label(&self) -> &'static str {
        match self {
            Layout::FullImage => "Full Image",
            Layout::TextHeavy => "Text Heavy",
            Layout::FourGrid => "4-Grid",
            Layout::Split => "Split",
            Layout::SizzleFocus => "Sizzle Focus",
        }
    }
}

/// Product photo attached to the chat request for visual fidelity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ReferenceImage {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Read a reference image from disk, guessing the mime type from the extension
    pub async fn load(path: &Path) -> Result<Self, AdPromptError> {
        let bytes = fs::read(path).await?;
        Ok(Self::new(bytes, mime_type_for(path)))
    }
}

fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

/// Everything the user filled in for one submission
#[derive(Debug, Clone)]
pub struct CreativeRequest {
    pub product_name: String,
    pub product_features: String,
    pub target_age: u8,
    pub target_gender: Gender,
    pub target_income: IncomeLevel,
    pub customer_type: CustomerType,
    pub orientation: Orientation,
    pub layout: Layout,
    pub reference_image: Option<ReferenceImage>,
}

impl Default for CreativeRequest {
    fn default() -> Self {
        Self {
            product_name: String::new(),
            product_features: String::new(),
            target_age: 30,
            target_gender: Gender::default(),
            target_income: IncomeLevel::default(),
            customer_type: CustomerType::default(),
            orientation: Orientation::default(),
            layout: Layout::default(),
            reference_image: None,
        }
    }
}

impl CreativeRequest {
    pub fn new(product_name: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            ..Default::default()
        }
    }

    pub fn with_features(mut self, features: impl Into<String>) -> Self {
        self.product_features = features.into();
        self
    }

    pub fn with_age(mut self, age: u8) -> Self {
        self.target_age = age;
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.target_gender = gender;
        self
    }

    pub fn with_income(mut self, income: IncomeLevel) -> Self {
        self.target_income = income;
        self
    }

    pub fn with_customer_type(mut self, customer_type: CustomerType) -> Self {
        self.customer_type = customer_type;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_reference_image(mut self, image: ReferenceImage) -> Self {
        self.reference_image = Some(image);
        self
    }

    pub fn has_reference_image(&self) -> bool {
        self.reference_image.is_some()
    }

    /// Check the user input before anything goes over the network
    pub fn validate(&self) -> Result<(), AdPromptError> {
        if self.product_name.trim().is_empty() {
            return Err(AdPromptError::validation(
                "product_name",
                "product name must not be empty",
            ));
        }
        if !(MIN_AGE..=MAX_AGE).contains(&self.target_age) {
            return Err(AdPromptError::validation(
                "target_age",
                format!("age must be between {} and {}", MIN_AGE, MAX_AGE),
            ));
        }
        Ok(())
    }
}
