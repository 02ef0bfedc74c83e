use std::sync::Arc;

use axum::{extract::State, Json};
use axum_extra::TypedHeader;
use headers::Authorization;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::handlers::{login, profile, validate};
use auth_cell::models::{LoginRequest, ValidateRequest};
use auth_cell::services::AccountService;
use shared_models::error::AppError;
use shared_utils::test_utils::{JwtTestUtils, MockStorageResponses, TestConfig, TestUser};
use shared_utils::validate_token;

fn login_request(email: &str, pass: &str) -> Json<LoginRequest> {
    Json(LoginRequest {
        email: email.to_string(),
        pass: pass.to_string(),
    })
}

#[tokio::test]
async fn login_returns_token_for_valid_credentials() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri()).to_arc();

    let user_id = Uuid::new_v4().to_string();
    let hash = AccountService::new(&config)
        .hash_password("password")
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.test@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStorageResponses::user_row(&user_id, "test@example.com", &hash)
        ])))
        .mount(&mock_server)
        .await;

    let result = login(State(config.clone()), login_request("test@example.com", "password")).await;

    let response = result.unwrap().0;
    let claims_user = validate_token(&response.access_token, &config.jwt_secret).unwrap();
    assert_eq!(claims_user.id, user_id);
    assert_eq!(claims_user.email, "test@example.com");
    assert_eq!(claims_user.role, "staff");
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri()).to_arc();

    let hash = AccountService::new(&config)
        .hash_password("password")
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStorageResponses::user_row(&Uuid::new_v4().to_string(), "test@example.com", &hash)
        ])))
        .mount(&mock_server)
        .await;

    let result = login(State(config), login_request("test@example.com", "not-the-password")).await;

    match result.unwrap_err() {
        AppError::Auth(msg) => assert_eq!(msg, "Invalid credentials"),
        other => panic!("Expected Auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn login_rejects_unknown_email() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri()).to_arc();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = login(State(config), login_request("nobody@example.com", "password")).await;

    match result.unwrap_err() {
        AppError::Auth(msg) => assert_eq!(msg, "Invalid credentials"),
        other => panic!("Expected Auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn login_storage_error_maps_to_database() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri()).to_arc();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
        .mount(&mock_server)
        .await;

    let result = login(State(config), login_request("test@example.com", "password")).await;

    match result.unwrap_err() {
        AppError::Database(_) => {}
        other => panic!("Expected Database error, got {:?}", other),
    }
}

#[tokio::test]
async fn validate_accepts_fresh_token() {
    let config = TestConfig::default().to_arc();
    let user = TestUser::default();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));

    let result = validate(State(config), Json(ValidateRequest { token })).await;

    let response = result.unwrap().0;
    assert!(response.valid);
    assert_eq!(response.user_id, user.id);
    assert_eq!(response.email, user.email);
    assert_eq!(response.role, user.role);
}

#[tokio::test]
async fn validate_rejects_expired_token() {
    let config = TestConfig::default().to_arc();
    let user = TestUser::default();
    let token = JwtTestUtils::create_expired_token(&user, &config.jwt_secret);

    let result = validate(State(config), Json(ValidateRequest { token })).await;

    match result.unwrap_err() {
        AppError::Auth(msg) => assert_eq!(msg, "Token expired"),
        other => panic!("Expected Auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn validate_rejects_tampered_token() {
    let config = TestConfig::default().to_arc();
    let user = TestUser::default();
    let token = JwtTestUtils::create_invalid_signature_token(&user);

    let result = validate(State(config), Json(ValidateRequest { token })).await;

    assert!(matches!(result.unwrap_err(), AppError::Auth(_)));
}

#[tokio::test]
async fn profile_returns_account_without_hash() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri()).to_arc();
    let user = TestUser::staff("staff@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStorageResponses::user_row(&user.id, &user.email, "stored-hash")
        ])))
        .mount(&mock_server)
        .await;

    let auth_header = TypedHeader(Authorization::bearer(&token).unwrap());
    let result = profile(State(config), auth_header).await;

    let account = result.unwrap().0;
    assert_eq!(account.email, user.email);

    let serialized = serde_json::to_value(&account).unwrap();
    assert!(serialized.get("password_hash").is_none());
}

#[tokio::test]
async fn profile_rejects_expired_token() {
    let config = TestConfig::default().to_arc();
    let user = TestUser::default();
    let token = JwtTestUtils::create_expired_token(&user, &config.jwt_secret);

    let auth_header = TypedHeader(Authorization::bearer(&token).unwrap());
    let result = profile(State(config), auth_header).await;

    assert!(matches!(result.unwrap_err(), AppError::Auth(_)));
}

#[tokio::test]
async fn profile_missing_account_is_not_found() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri()).to_arc();
    let user = TestUser::default();
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(24));

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let auth_header = TypedHeader(Authorization::bearer(&token).unwrap());
    let result = profile(State(config), auth_header).await;

    assert!(matches!(result.unwrap_err(), AppError::NotFound(_)));
}
