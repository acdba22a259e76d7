use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AdPromptError;
use super::response::CreativeResponse;

/// Stage the orchestrator is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Chat,
    Image,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Chat => write!(f, "chat"),
            Stage::Image => write!(f, "image"),
        }
    }
}

/// Status of a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum SubmissionStatus {
    Pending,
    Running {
        stage: Stage,
    },
    Completed,
    Failed {
        /// Error category (auth, connection, malformed_response, validation, io)
        category: String,
        error: String,
    },
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionStatus::Pending => write!(f, "pending"),
            SubmissionStatus::Running { stage } => write!(f, "running ({})", stage),
            SubmissionStatus::Completed => write!(f, "completed"),
            SubmissionStatus::Failed { category, error } => {
                write!(f, "failed [{}]: {}", category, error)
            }
        }
    }
}

impl SubmissionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStatus::Completed | SubmissionStatus::Failed { .. })
    }
}

/// One run of the form, from submit to result or error.
///
/// Lives only for the duration of the run. On failure it still holds
/// whatever was produced so far, for debugging display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Unique ID (e.g., "ap_abc12345")
    pub id: String,

    pub status: SubmissionStatus,

    /// Text returned by the chat model, before parsing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_chat_response: Option<String>,

    /// Parsed result, possibly without an image URL if a later stage failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<CreativeResponse>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Default for Submission {
    fn default() -> Self {
        Self::new()
    }
}

impl Submission {
    pub fn new() -> Self {
        let uuid = Uuid::new_v4();
        let id = format!("ap_{}", &uuid.to_string()[..8]);
        let now = Utc::now();

        Self {
            id,
            status: SubmissionStatus::Pending,
            raw_chat_response: None,
            response: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_running(&mut self, stage: Stage) {
        self.status = SubmissionStatus::Running { stage };
        self.updated_at = Utc::now();
    }

    pub fn set_completed(&mut self, response: CreativeResponse) {
        self.response = Some(response);
        self.status = SubmissionStatus::Completed;
        self.updated_at = Utc::now();
    }

    pub fn set_failed(&mut self, error: &AdPromptError) {
        // Keep malformed provider output around even when it never parsed
        if self.raw_chat_response.is_none() {
            self.raw_chat_response = error.raw_output().map(str::to_string);
        }
        self.status = SubmissionStatus::Failed {
            category: error.category().to_string(),
            error: error.to_string(),
        };
        self.updated_at = Utc::now();
    }

    pub fn record_raw_chat(&mut self, raw: impl Into<String>) {
        self.raw_chat_response = Some(raw.into());
        self.updated_at = Utc::now();
    }

    pub fn record_partial(&mut self, response: CreativeResponse) {
        self.response = Some(response);
        self.updated_at = Utc::now();
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, SubmissionStatus::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_prefixed_and_short() {
        let submission = Submission::new();
        assert!(submission.id.starts_with("ap_"));
        assert_eq!(submission.id.len(), 11);
        assert_eq!(submission.status, SubmissionStatus::Pending);
    }

    #[test]
    fn failure_records_category_and_raw_output() {
        let mut submission = Submission::new();
        submission.set_running(Stage::Chat);
        submission.set_failed(&AdPromptError::malformed("expected JSON", "Sure! Here it is"));

        assert!(submission.status.is_terminal());
        assert!(!submission.is_success());
        assert_eq!(submission.raw_chat_response.as_deref(), Some("Sure! Here it is"));
        match &submission.status {
            SubmissionStatus::Failed { category, .. } => assert_eq!(category, "malformed_response"),
            other => panic!("unexpected status: {}", other),
        }
    }

    #[test]
    fn status_serializes_with_tag() {
        let status = SubmissionStatus::Running { stage: Stage::Image };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "Running");
        assert_eq!(json["stage"], "image");
        assert_eq!(status.to_string(), "running (image)");
    }
}
