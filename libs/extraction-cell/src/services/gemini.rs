use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{header, Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use shared_config::AppConfig;

use crate::models::ExtractionError;

/// Gemini generateContent client. The document travels inline with the
/// prompt as a base64 part, so there is no separate file-upload step.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Result<Self, ExtractionError> {
        if !config.is_extraction_configured() {
            return Err(ExtractionError::NotConfigured);
        }

        Ok(Self {
            client: Client::new(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.clone(),
        })
    }

    /// Send the prompt plus PDF bytes and return the model's text output.
    pub async fn generate(&self, prompt: &str, pdf_bytes: &[u8]) -> Result<String, ExtractionError> {
        // The key rides in the query string, so the URL itself stays out of
        // the logs.
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request_body = json!({
            "contents": [{
                "parts": [
                    { "text": prompt },
                    {
                        "inline_data": {
                            "mime_type": "application/pdf",
                            "data": STANDARD.encode(pdf_bytes)
                        }
                    }
                ]
            }]
        });

        debug!("Requesting generateContent from model {}", self.model);

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("AI provider rate limit reached");
            return Err(ExtractionError::RateLimited);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("AI provider error ({}): {}", status, error_text);
            return Err(ExtractionError::Provider(format!("HTTP {}", status)));
        }

        let body: Value = response.json().await?;
        let text = body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                error!("Unexpected response shape from the AI provider: {}", body);
                ExtractionError::Provider("Unexpected response shape".to_string())
            })?;

        Ok(text.to_string())
    }
}
