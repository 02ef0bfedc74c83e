use std::collections::HashMap;

use chrono::{Duration, Utc};
use futures::future::join_all;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::postgrest::PostgrestClient;
use shared_utils::normalize::age_on;

use crate::models::{
    CreatePatientRequest, DiagnosisCount, FullName, PatientError, PatientListQuery,
    PatientListResponse, PatientRecord, PatientStats, SortField, StatsRow, UpdatePatientRequest,
};

const DEFAULT_PAGE_SIZE: i64 = 10;

pub struct PatientService {
    store: PostgrestClient,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: PostgrestClient::new(config),
        }
    }

    fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    /// Filtered, sorted, paginated list of non-deleted records plus the
    /// total match count irrespective of the page.
    pub async fn find_all(&self, query: PatientListQuery) -> Result<PatientListResponse, PatientError> {
        debug!("Listing patient records: {:?}", query);

        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let offset = (page - 1) * limit;

        let mut query_parts = vec!["deleted_at=is.null".to_string()];

        if let Some(search) = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
        {
            query_parts.push(format!("name=ilike.*{}*", urlencoding::encode(search)));
        }
        if let Some(category) = query
            .category
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            query_parts.push(format!(
                "patient_info->>category=eq.{}",
                urlencoding::encode(category)
            ));
        }

        let sort_field = SortField::from_param(query.sort_by.as_deref());
        let direction = match query.sort_order.as_deref() {
            Some(order) if order.eq_ignore_ascii_case("desc") => "desc",
            _ => "asc",
        };
        query_parts.push(format!("order={}.{}", sort_field.order_expression(), direction));
        query_parts.push(format!("limit={}", limit));
        query_parts.push(format!("offset={}", offset));

        let path = format!("/rest/v1/patients?{}", query_parts.join("&"));
        let (rows, total): (Vec<Value>, Option<i64>) =
            self.store.request_with_count(Method::GET, &path, None).await?;

        let mut records = rows
            .into_iter()
            .map(serde_json::from_value::<PatientRecord>)
            .collect::<Result<Vec<_>, _>>()?;
        for record in &mut records {
            record.attach_derived();
        }

        let total = total.unwrap_or(records.len() as i64);
        Ok(PatientListResponse { data: records, total })
    }

    pub async fn find_one(&self, id: Uuid) -> Result<PatientRecord, PatientError> {
        debug!("Fetching patient record: {}", id);

        let path = format!("/rest/v1/patients?id=eq.{}&deleted_at=is.null", id);
        let result: Vec<Value> = self.store.request(Method::GET, &path, None).await?;

        let Some(row) = result.into_iter().next() else {
            return Err(PatientError::NotFound(id));
        };

        let mut record: PatientRecord = serde_json::from_value(row)?;
        record.attach_derived();
        Ok(record)
    }

    /// A record cannot exist without a resolvable display name, so first
    /// and last name are required; everything else may be filled in later.
    pub async fn create(&self, request: CreatePatientRequest) -> Result<PatientRecord, PatientError> {
        let CreatePatientRequest {
            patient_info,
            sponsor_info,
            medical_encounters,
            summary,
        } = request;

        let mut patient_info = patient_info.unwrap_or_default();

        let first_name = patient_info
            .full_name
            .as_ref()
            .and_then(|name| name.first_name.as_deref())
            .map(str::trim)
            .unwrap_or_default();
        let last_name = patient_info
            .full_name
            .as_ref()
            .and_then(|name| name.last_name.as_deref())
            .map(str::trim)
            .unwrap_or_default();

        let mut problems = Vec::new();
        if first_name.is_empty() {
            problems.push("patient_info.full_name.first_name should not be empty".to_string());
        }
        if last_name.is_empty() {
            problems.push("patient_info.full_name.last_name should not be empty".to_string());
        }
        if !problems.is_empty() {
            return Err(PatientError::Validation(problems));
        }

        patient_info.normalize();

        let mut sponsor_info = sponsor_info;
        if let Some(sponsor) = &mut sponsor_info {
            sponsor.normalize();
        }

        let mut encounters = medical_encounters.unwrap_or_default();
        encounters.normalize();
        encounters.clear_derived();

        let mut summary = summary;
        if let Some(summary) = &mut summary {
            summary.normalize();
        }

        let display_name = patient_info
            .full_name
            .as_ref()
            .map(FullName::display)
            .unwrap_or_default();
        debug!("Creating patient record for: {}", display_name);

        let now = Utc::now().to_rfc3339();
        let record_data = json!({
            "name": display_name,
            "patient_info": patient_info,
            "sponsor_info": sponsor_info,
            "medical_encounters": encounters,
            "summary": summary,
            "created_at": now,
            "updated_at": now,
            "deleted_at": null
        });

        let result: Vec<Value> = self
            .store
            .request_with_headers(
                Method::POST,
                "/rest/v1/patients",
                Some(record_data),
                Some(Self::representation_headers()),
            )
            .await?;

        let Some(row) = result.into_iter().next() else {
            return Err(PatientError::Database("Create returned no rows".to_string()));
        };

        let mut record: PatientRecord = serde_json::from_value(row)?;
        record.attach_derived();
        debug!("Patient record created with ID: {}", record.id);
        Ok(record)
    }

    /// Shallow merge per top-level column: a supplied column fully replaces
    /// the stored value. The display name is recomputed only when the input
    /// carries name fields.
    pub async fn update(
        &self,
        id: Uuid,
        mut request: UpdatePatientRequest,
    ) -> Result<PatientRecord, PatientError> {
        debug!("Updating patient record: {}", id);

        self.find_one(id).await?;

        request.normalize();

        let mut update_data = serde_json::Map::new();

        if let Some(patient_info) = request.patient_info {
            if let Some(full_name) = &patient_info.full_name {
                update_data.insert("name".to_string(), json!(full_name.display()));
            }
            update_data.insert("patient_info".to_string(), json!(patient_info));
        }
        if let Some(sponsor_info) = request.sponsor_info {
            update_data.insert("sponsor_info".to_string(), json!(sponsor_info));
        }
        if let Some(mut encounters) = request.medical_encounters {
            encounters.clear_derived();
            update_data.insert("medical_encounters".to_string(), json!(encounters));
        }
        if let Some(summary) = request.summary {
            update_data.insert("summary".to_string(), json!(summary));
        }
        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/patients?id=eq.{}&deleted_at=is.null", id);
        let result: Vec<Value> = self
            .store
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(Value::Object(update_data)),
                Some(Self::representation_headers()),
            )
            .await?;

        let Some(row) = result.into_iter().next() else {
            return Err(PatientError::NotFound(id));
        };

        let mut record: PatientRecord = serde_json::from_value(row)?;
        record.attach_derived();
        Ok(record)
    }

    /// Soft delete. The row stays in storage with `deleted_at` set and
    /// drops out of every list, lookup and statistic.
    pub async fn remove(&self, id: Uuid) -> Result<(), PatientError> {
        debug!("Soft deleting patient record: {}", id);

        let now = Utc::now().to_rfc3339();
        let path = format!("/rest/v1/patients?id=eq.{}&deleted_at=is.null", id);
        let body = json!({
            "deleted_at": now,
            "updated_at": now
        });

        let result: Vec<Value> = self
            .store
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(body),
                Some(Self::representation_headers()),
            )
            .await?;

        if result.is_empty() {
            return Err(PatientError::NotFound(id));
        }
        Ok(())
    }

    /// Issues the deletes concurrently and waits for all of them. Partial
    /// failure surfaces as one generic error; already-deleted rows stay
    /// deleted.
    pub async fn remove_many(&self, ids: Vec<Uuid>) -> Result<(), PatientError> {
        debug!("Bulk deleting {} patient records", ids.len());

        let results = join_all(ids.iter().map(|id| self.remove(*id))).await;

        if results.iter().any(|outcome| outcome.is_err()) {
            return Err(PatientError::BulkDelete);
        }
        Ok(())
    }

    pub async fn stats(&self) -> Result<PatientStats, PatientError> {
        debug!("Computing patient statistics");

        let path = "/rest/v1/patients?deleted_at=is.null&select=patient_info,summary,updated_at";
        let (rows, total): (Vec<StatsRow>, Option<i64>) =
            self.store.request_with_count(Method::GET, path, None).await?;

        let now = Utc::now();
        let today = now.date_naive();
        let cutoff = now - Duration::hours(24);

        let mut updated_last_24h = 0i64;
        let mut category_distribution = std::collections::BTreeMap::new();
        let mut diagnosis_counts: HashMap<String, i64> = HashMap::new();
        let mut age_sum = 0i64;
        let mut age_count = 0i64;

        for row in &rows {
            if row.updated_at >= cutoff {
                updated_last_24h += 1;
            }

            if let Some(category) = row
                .patient_info
                .category
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
            {
                *category_distribution.entry(category.to_string()).or_insert(0i64) += 1;
            }

            if let Some(summary) = &row.summary {
                for diagnosis in &summary.final_diagnosis {
                    let diagnosis = diagnosis.trim();
                    if diagnosis.is_empty() {
                        continue;
                    }
                    *diagnosis_counts.entry(diagnosis.to_string()).or_insert(0) += 1;
                }
            }

            if let Some(age) = row
                .patient_info
                .date_of_birth
                .and_then(|dob| age_on(dob, today))
            {
                age_sum += i64::from(age);
                age_count += 1;
            }
        }

        let mut top_diagnoses: Vec<DiagnosisCount> = diagnosis_counts
            .into_iter()
            .map(|(diagnosis, count)| DiagnosisCount { diagnosis, count })
            .collect();
        top_diagnoses.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.diagnosis.cmp(&b.diagnosis))
        });
        top_diagnoses.truncate(5);

        let average_age = if age_count > 0 {
            Some((age_sum as f64 / age_count as f64 * 10.0).round() / 10.0)
        } else {
            None
        };

        Ok(PatientStats {
            total_patients: total.unwrap_or(rows.len() as i64),
            updated_last_24h,
            category_distribution,
            top_diagnoses,
            average_age,
        })
    }
}
