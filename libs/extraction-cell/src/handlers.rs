use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use serde_json::Value;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_models::{auth::User, error::AppError};

use crate::models::{DocumentType, ExtractionError};
use crate::services::ExtractionService;

/// Accept a multipart upload (`file`, optional `documentType`) and return
/// the extracted draft record for review.
#[axum::debug_handler]
pub async fn upload_document(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    debug!("User {} uploaded a document for extraction", user.id);

    let mut file_bytes: Option<Vec<u8>> = None;
    let mut document_type: Option<DocumentType> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("Invalid multipart payload: {}", err)))?
    {
        let name = field.name().map(|n| n.to_string());

        match name.as_deref() {
            Some("file") => {
                let data = field.bytes().await.map_err(|err| {
                    AppError::BadRequest(format!("Could not read uploaded file: {}", err))
                })?;
                file_bytes = Some(data.to_vec());
            }
            Some("documentType") => {
                let raw = field.text().await.map_err(|err| {
                    AppError::BadRequest(format!("Invalid multipart payload: {}", err))
                })?;
                document_type = DocumentType::from_param(&raw);
            }
            _ => {}
        }
    }

    let file_bytes = file_bytes.ok_or(ExtractionError::MissingFile)?;

    let service = ExtractionService::new(&config)?;
    let draft = service.extract_from_pdf(&file_bytes, document_type).await?;

    info!("Extracted a draft patient record from an uploaded document");
    Ok(Json(draft))
}
