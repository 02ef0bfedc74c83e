use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

use crate::jwt::sign_token;

pub struct TestConfig {
    pub jwt_secret: String,
    pub database_url: String,
    pub database_api_key: String,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            database_url: "http://localhost:54321".to_string(),
            database_api_key: "test-api-key".to_string(),
            gemini_api_key: "test-gemini-key".to_string(),
            gemini_base_url: "http://localhost:54322".to_string(),
        }
    }
}

impl TestConfig {
    /// Points storage calls at a mock server.
    pub fn with_database_url(url: &str) -> Self {
        Self {
            database_url: url.to_string(),
            ..Self::default()
        }
    }

    /// Points AI-provider calls at a mock server.
    pub fn with_gemini_url(url: &str) -> Self {
        Self {
            gemini_base_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            database_url: self.database_url.clone(),
            database_api_key: self.database_api_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            gemini_api_key: self.gemini_api_key.clone(),
            gemini_base_url: self.gemini_base_url.clone(),
            gemini_model: "gemini-2.0-flash".to_string(),
            port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "staff".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn staff(email: &str) -> Self {
        Self::new(email, "staff")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        sign_token(&user.id, &user.email, &user.role, secret, exp_hours.unwrap_or(24))
            .expect("test token signing should not fail")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned storage rows for wiremock-backed tests.
pub struct MockStorageResponses;

impl MockStorageResponses {
    pub fn patient_row(
        id: &str,
        first_name: &str,
        last_name: &str,
        date_of_birth: Option<&str>,
    ) -> Value {
        json!({
            "id": id,
            "name": format!("{} {}", first_name, last_name),
            "patient_info": {
                "patient_record_number": "CP-0001",
                "full_name": {
                    "first_name": first_name,
                    "middle_initial": null,
                    "last_name": last_name
                },
                "date_of_birth": date_of_birth,
                "sex": "M",
                "address": {
                    "house_no_street": "123 Mabini St",
                    "barangay": "San Roque",
                    "city_municipality": "Quezon City",
                    "province": "Metro Manila",
                    "zip_code": "1100"
                },
                "category": "ACTIVE MILITARY",
                "rank": "SGT",
                "afpsn": "123456",
                "branch_of_service": "Philippine Army",
                "unit_assignment": "1st Infantry Division"
            },
            "sponsor_info": null,
            "medical_encounters": {
                "consultations": [],
                "lab_results": [],
                "radiology_reports": []
            },
            "summary": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "deleted_at": null
        })
    }

    pub fn user_row(id: &str, email: &str, password_hash: &str) -> Value {
        json!({
            "id": id,
            "email": email,
            "name": "Test User",
            "password_hash": password_hash,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }
}
