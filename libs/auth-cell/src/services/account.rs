use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::json;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::PostgrestClient;

use crate::models::UserAccount;

const DEFAULT_USER_EMAIL: &str = "test@example.com";

pub struct AccountService {
    store: PostgrestClient,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: PostgrestClient::new(config),
        }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>> {
        let path = format!(
            "/rest/v1/users?email=eq.{}&select=*",
            urlencoding::encode(email)
        );

        let rows: Vec<UserAccount> = self.store.request(reqwest::Method::GET, &path, None).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<UserAccount>> {
        let path = format!("/rest/v1/users?id=eq.{}&select=*", urlencoding::encode(id));

        let rows: Vec<UserAccount> = self.store.request(reqwest::Method::GET, &path, None).await?;
        Ok(rows.into_iter().next())
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| anyhow!("Failed to hash password: {}", err))?;

        Ok(hash.to_string())
    }

    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|err| anyhow!("Stored password hash is invalid: {}", err))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(anyhow!("Password verification failed: {}", err)),
        }
    }

    /// Ensure the default staff account exists. Failures are logged rather
    /// than propagated so a cold storage backend does not block startup.
    pub async fn seed_default_user(&self) {
        match self.find_by_email(DEFAULT_USER_EMAIL).await {
            Ok(Some(_)) => debug!("Default user already present"),
            Ok(None) => self.create_default_user().await,
            Err(err) => warn!("Could not check for the default user: {}", err),
        }
    }

    async fn create_default_user(&self) {
        let password_hash = match self.hash_password("password") {
            Ok(hash) => hash,
            Err(err) => {
                warn!("Could not hash the default user password: {}", err);
                return;
            }
        };

        let body = json!({
            "email": DEFAULT_USER_EMAIL,
            "name": "Test User",
            "password_hash": password_hash,
            "created_at": Utc::now()
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let result: Result<Vec<UserAccount>> = self
            .store
            .request_with_headers(reqwest::Method::POST, "/rest/v1/users", Some(body), Some(headers))
            .await;

        match result {
            Ok(_) => info!("Default user created"),
            Err(err) => warn!("Could not seed the default user: {}", err),
        }
    }
}
