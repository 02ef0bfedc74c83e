use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    BulkDeleteRequest, CreatePatientRequest, PatientListQuery, PatientListResponse, PatientRecord,
    PatientStats, UpdatePatientRequest,
};
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn list_patients(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<PatientListQuery>,
) -> Result<Json<PatientListResponse>, AppError> {
    debug!("User {} listing patient records", user.id);
    let service = PatientService::new(&config);

    let response = service.find_all(query).await?;
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<PatientRecord>, AppError> {
    debug!("User {} fetching patient record {}", user.id, patient_id);
    let service = PatientService::new(&config);

    let record = service.find_one(patient_id).await?;
    Ok(Json(record))
}

#[axum::debug_handler]
pub async fn create_patient(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreatePatientRequest>,
) -> Result<(StatusCode, Json<PatientRecord>), AppError> {
    debug!("User {} creating patient record", user.id);
    let service = PatientService::new(&config);

    let record = service.create(request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[axum::debug_handler]
pub async fn update_patient(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<Uuid>,
    Json(request): Json<UpdatePatientRequest>,
) -> Result<Json<PatientRecord>, AppError> {
    debug!("User {} updating patient record {}", user.id, patient_id);
    let service = PatientService::new(&config);

    let record = service.update(patient_id, request).await?;
    Ok(Json(record))
}

#[axum::debug_handler]
pub async fn delete_patient(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(patient_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    debug!("User {} deleting patient record {}", user.id, patient_id);
    let service = PatientService::new(&config);

    service.remove(patient_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn bulk_delete_patients(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<BulkDeleteRequest>,
) -> Result<StatusCode, AppError> {
    debug!(
        "User {} bulk deleting {} patient records",
        user.id,
        request.ids.len()
    );
    let service = PatientService::new(&config);

    service.remove_many(request.ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn patient_stats(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<PatientStats>, AppError> {
    debug!("User {} requesting patient statistics", user.id);
    let service = PatientService::new(&config);

    let stats = service.stats().await?;
    Ok(Json(stats))
}
