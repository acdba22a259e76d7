pub mod error;
pub mod request;
pub mod response;
pub mod submission;

pub use error::AdPromptError;
pub use request::{
    CreativeRequest, CustomerType, Gender, IncomeLevel, Layout, Orientation, ReferenceImage,
};
pub use response::{CreativeResponse, ImagePrompt};
pub use submission::{Stage, Submission, SubmissionStatus};
