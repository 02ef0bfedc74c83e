use std::sync::Arc;

use axum::{extract::State, Json};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::{auth::TokenResponse, error::AppError};
use shared_utils::{sign_token, validate_token};

use crate::models::{LoginRequest, LoginResponse, UserAccount, ValidateRequest};
use crate::services::AccountService;

const TOKEN_VALID_HOURS: i64 = 24;

/// Exchange email and password for a signed access token.
#[axum::debug_handler]
pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let service = AccountService::new(&config);

    let account = service
        .find_by_email(request.email.trim())
        .await
        .map_err(|err| AppError::Database(err.to_string()))?
        .ok_or_else(|| AppError::Auth("Invalid credentials".to_string()))?;

    let valid = service
        .verify_password(&request.pass, &account.password_hash)
        .map_err(|err| AppError::Internal(err.to_string()))?;

    if !valid {
        return Err(AppError::Auth("Invalid credentials".to_string()));
    }

    let access_token = sign_token(
        &account.id.to_string(),
        &account.email,
        "staff",
        &config.jwt_secret,
        TOKEN_VALID_HOURS,
    )
    .map_err(AppError::Internal)?;

    debug!("Issued access token for {}", account.email);
    Ok(Json(LoginResponse { access_token }))
}

/// Check a token without touching storage and echo back its claims.
#[axum::debug_handler]
pub async fn validate(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = validate_token(&request.token, &config.jwt_secret).map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
        role: user.role,
    }))
}

/// Return the account behind the bearer token.
#[axum::debug_handler]
pub async fn profile(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(authorization): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<UserAccount>, AppError> {
    let user = validate_token(authorization.token(), &config.jwt_secret).map_err(AppError::Auth)?;

    let service = AccountService::new(&config);
    let account = service
        .find_by_id(&user.id)
        .await
        .map_err(|err| AppError::Database(err.to_string()))?
        .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;

    Ok(Json(account))
}
