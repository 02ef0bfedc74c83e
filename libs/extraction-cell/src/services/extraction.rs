use serde_json::Value;
use tracing::error;

use shared_config::AppConfig;
use shared_utils::normalize::{normalize_date_string, normalize_sex, title_case_words};

use crate::models::{DocumentType, ExtractionError};
use crate::services::gemini::GeminiClient;
use crate::services::prompt::build_extraction_prompt;

/// Keys whose string values get the same title-casing treatment the
/// mutation path applies on create and update.
const NAME_KEYS: [&str; 11] = [
    "first_name",
    "middle_initial",
    "last_name",
    "house_no_street",
    "barangay",
    "city_municipality",
    "province",
    "attending_physician",
    "medical_technologist",
    "pathologist",
    "radiologist",
];

pub struct ExtractionService {
    gemini: GeminiClient,
}

impl ExtractionService {
    pub fn new(config: &AppConfig) -> Result<Self, ExtractionError> {
        Ok(Self {
            gemini: GeminiClient::new(config)?,
        })
    }

    /// Full pipeline: PDF bytes in, cleaned draft record out. The draft is
    /// returned for operator review and never persisted here.
    pub async fn extract_from_pdf(
        &self,
        file_bytes: &[u8],
        document_type: Option<DocumentType>,
    ) -> Result<Value, ExtractionError> {
        if !file_bytes.starts_with(b"%PDF") {
            return Err(ExtractionError::InvalidDocument);
        }

        let prompt = build_extraction_prompt(document_type);
        let response_text = self.gemini.generate(&prompt, file_bytes).await?;

        parse_extracted_record(&response_text)
    }
}

/// Turn free-form model output into a cleaned draft record.
pub fn parse_extracted_record(response_text: &str) -> Result<Value, ExtractionError> {
    let span = extract_first_json_object(response_text).ok_or_else(|| {
        error!("No JSON object found in model output: {}", response_text);
        ExtractionError::NoJsonFound
    })?;

    let sanitized = sanitize_json_text(span);

    let mut draft: Value = serde_json::from_str(&sanitized).map_err(|err| {
        error!("Failed to parse extracted JSON: {}", err);
        ExtractionError::InvalidJson(err.to_string())
    })?;

    clean_extracted_value(&mut draft);
    Ok(draft)
}

/// Find the first balanced `{...}` span, ignoring braces inside string
/// literals. Anything after the span, including sibling objects, is dropped.
pub fn extract_first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in text.as_bytes()[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Escape bare newlines, returns and tabs inside string literals and drop
/// every other control character so the span parses as strict JSON.
pub fn sanitize_json_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in raw.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(ch);
            } else if ch == '\\' {
                escaped = true;
                out.push(ch);
            } else if ch == '"' {
                in_string = false;
                out.push(ch);
            } else if ch == '\n' {
                out.push_str("\\n");
            } else if ch == '\r' {
                out.push_str("\\r");
            } else if ch == '\t' {
                out.push_str("\\t");
            } else if !ch.is_control() {
                out.push(ch);
            }
        } else if ch == '"' {
            in_string = true;
            out.push(ch);
        } else if !ch.is_control() {
            out.push(ch);
        }
    }

    out
}

/// Recursive cleanup over the parsed draft. Date-bearing keys are rewritten
/// to ISO or nulled, name-like keys are title-cased, sex collapses to M/F,
/// and every other string is trimmed.
pub fn clean_extracted_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                clean_field(key, child);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                clean_extracted_value(item);
            }
        }
        Value::String(text) => {
            *text = text.trim().to_string();
        }
        _ => {}
    }
}

fn clean_field(key: &str, value: &mut Value) {
    if key.to_lowercase().contains("date") {
        *value = match value.as_str().and_then(normalize_date_string) {
            Some(iso) => Value::String(iso),
            None => Value::Null,
        };
        return;
    }

    if key.eq_ignore_ascii_case("sex") {
        *value = match value.as_str().and_then(normalize_sex) {
            Some(code) => Value::String(code.to_string()),
            None => Value::Null,
        };
        return;
    }

    if NAME_KEYS.contains(&key) {
        if let Value::String(text) = value {
            *value = Value::String(title_case_words(text));
        }
        return;
    }

    clean_extracted_value(value);
}
