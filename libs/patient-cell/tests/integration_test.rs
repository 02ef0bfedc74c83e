use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use patient_cell::create_patient_router;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn requests_without_a_token_are_unauthorized() {
    let config = TestConfig::default().to_arc();
    let app = create_patient_router(config);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["statusCode"], 401);
    assert_eq!(body["message"], "Missing authorization header");
}

#[tokio::test]
async fn expired_tokens_are_unauthorized() {
    let config = TestConfig::default().to_arc();
    let token = JwtTestUtils::create_expired_token(&TestUser::default(), &config.jwt_secret);
    let app = create_patient_router(config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["message"], "Token expired");
}

#[tokio::test]
async fn authorized_list_reaches_storage() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_database_url(&mock_server.uri()).to_arc();
    let token = JwtTestUtils::create_test_token(&TestUser::default(), &config.jwt_secret, None);

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Range", "*/0")
                .set_body_json(json!([])),
        )
        .mount(&mock_server)
        .await;

    let app = create_patient_router(config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn malformed_patient_id_is_bad_request() {
    let config = TestConfig::default().to_arc();
    let token = JwtTestUtils::create_test_token(&TestUser::default(), &config.jwt_secret, None);
    let app = create_patient_router(config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/definitely-not-a-uuid")
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bulk_delete_with_no_ids_is_a_no_op() {
    let config = TestConfig::default().to_arc();
    let token = JwtTestUtils::create_test_token(&TestUser::default(), &config.jwt_secret, None);
    let app = create_patient_router(config);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/bulk-delete")
                .header("Authorization", format!("Bearer {}", token))
                .header("content-type", "application/json")
                .body(Body::from(json!({"ids": []}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
