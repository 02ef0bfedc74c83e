use thiserror::Error;

use shared_models::error::AppError;

/// Hint supplied alongside an uploaded document describing whose service
/// affiliation the record carries. Anything unrecognized means "let the
/// model decide from the document itself".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    Military,
    Dependent,
}

impl DocumentType {
    pub fn from_param(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "military" => Some(DocumentType::Military),
            "dependent" => Some(DocumentType::Dependent),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Document extraction is not configured")]
    NotConfigured,

    #[error("No file uploaded.")]
    MissingFile,

    #[error("Uploaded file is not a PDF document")]
    InvalidDocument,

    #[error("AI provider rate limit reached")]
    RateLimited,

    #[error("AI provider request failed: {0}")]
    Provider(String),

    #[error("No JSON object found in the model output")]
    NoJsonFound,

    #[error("Extracted JSON could not be parsed: {0}")]
    InvalidJson(String),
}

impl From<reqwest::Error> for ExtractionError {
    fn from(err: reqwest::Error) -> Self {
        ExtractionError::Provider(err.to_string())
    }
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::MissingFile | ExtractionError::InvalidDocument => {
                AppError::BadRequest(err.to_string())
            }
            ExtractionError::RateLimited => AppError::RateLimited,
            ExtractionError::NotConfigured | ExtractionError::Provider(_) => {
                AppError::AiService(err.to_string())
            }
            ExtractionError::NoJsonFound | ExtractionError::InvalidJson(_) => {
                AppError::Extraction(err.to_string())
            }
        }
    }
}
