use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use shared_models::error::AppError;
use shared_utils::normalize::{age_on, title_case_words};

/// A stored patient record. `age` and each consultation's `age_at_visit`
/// are computed on load via `attach_derived`, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub patient_info: PatientInfo,
    #[serde(default)]
    pub sponsor_info: Option<SponsorInfo>,
    #[serde(default)]
    pub medical_encounters: Option<MedicalEncounters>,
    #[serde(default)]
    pub summary: Option<PatientSummary>,
    #[serde(default)]
    pub age: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl PatientRecord {
    /// Recomputes the derived age fields against today. Runs on every read
    /// so they never go stale; does not touch stored state.
    pub fn attach_derived(&mut self) {
        let today = Utc::now().date_naive();
        self.age = self
            .patient_info
            .date_of_birth
            .and_then(|dob| age_on(dob, today));

        if let Some(encounters) = &mut self.medical_encounters {
            encounters.attach_age_at_visit(self.patient_info.date_of_birth);
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientInfo {
    #[serde(default)]
    pub patient_record_number: Option<String>,
    #[serde(default)]
    pub full_name: Option<FullName>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub address: Option<PatientAddress>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub afpsn: Option<String>,
    #[serde(default)]
    pub branch_of_service: Option<String>,
    #[serde(default)]
    pub unit_assignment: Option<String>,
}

impl PatientInfo {
    pub fn normalize(&mut self) {
        if let Some(full_name) = &mut self.full_name {
            full_name.normalize();
        }
        if let Some(address) = &mut self.address {
            address.normalize();
        }
        trim_opt(&mut self.patient_record_number);
        trim_opt(&mut self.sex);
        trim_opt(&mut self.category);
        trim_opt(&mut self.rank);
        trim_opt(&mut self.afpsn);
        trim_opt(&mut self.branch_of_service);
        trim_opt(&mut self.unit_assignment);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FullName {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_initial: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl FullName {
    /// Display string shown in lists: first and last name joined by a
    /// space, skipping whichever is blank.
    pub fn display(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn normalize(&mut self) {
        title_opt(&mut self.first_name);
        title_opt(&mut self.middle_initial);
        title_opt(&mut self.last_name);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientAddress {
    #[serde(default)]
    pub house_no_street: Option<String>,
    #[serde(default)]
    pub barangay: Option<String>,
    #[serde(default)]
    pub city_municipality: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
}

impl PatientAddress {
    pub fn normalize(&mut self) {
        title_opt(&mut self.house_no_street);
        title_opt(&mut self.barangay);
        title_opt(&mut self.city_municipality);
        title_opt(&mut self.province);
        trim_opt(&mut self.zip_code);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SponsorInfo {
    #[serde(default)]
    pub sponsor_name: Option<SponsorName>,
    #[serde(default)]
    pub afpsn: Option<String>,
    #[serde(default)]
    pub branch_of_service: Option<String>,
    #[serde(default)]
    pub unit_assignment: Option<String>,
}

impl SponsorInfo {
    pub fn normalize(&mut self) {
        if let Some(sponsor_name) = &mut self.sponsor_name {
            sponsor_name.normalize();
        }
        trim_opt(&mut self.afpsn);
        trim_opt(&mut self.branch_of_service);
        trim_opt(&mut self.unit_assignment);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SponsorName {
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl SponsorName {
    pub fn normalize(&mut self) {
        trim_opt(&mut self.rank);
        title_opt(&mut self.first_name);
        title_opt(&mut self.last_name);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicalEncounters {
    #[serde(default)]
    pub consultations: Vec<Consultation>,
    #[serde(default)]
    pub lab_results: Vec<LabPanel>,
    #[serde(default)]
    pub radiology_reports: Vec<RadiologyReport>,
}

impl MedicalEncounters {
    pub fn normalize(&mut self) {
        for consultation in &mut self.consultations {
            consultation.normalize();
        }
        for panel in &mut self.lab_results {
            panel.normalize();
        }
        for report in &mut self.radiology_reports {
            report.normalize();
        }
    }

    /// Strips computed values so they never reach storage.
    pub fn clear_derived(&mut self) {
        for consultation in &mut self.consultations {
            consultation.age_at_visit = None;
        }
    }

    pub fn attach_age_at_visit(&mut self, date_of_birth: Option<NaiveDate>) {
        for consultation in &mut self.consultations {
            consultation.age_at_visit = match (date_of_birth, consultation.consultation_date) {
                (Some(dob), Some(visit)) => age_on(dob, visit),
                _ => None,
            };
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Consultation {
    #[serde(default)]
    pub consultation_date: Option<NaiveDate>,
    #[serde(default)]
    pub vitals: Option<ConsultationVitals>,
    #[serde(default)]
    pub chief_complaint: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub treatment_plan: Option<String>,
    #[serde(default)]
    pub attending_physician: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_at_visit: Option<i32>,
}

impl Consultation {
    pub fn normalize(&mut self) {
        trim_opt(&mut self.chief_complaint);
        trim_opt(&mut self.diagnosis);
        trim_opt(&mut self.notes);
        trim_opt(&mut self.treatment_plan);
        title_opt(&mut self.attending_physician);
    }
}

// Vitals come from scanned charts; values may arrive as numbers or as raw
// strings like "36.8 C", so they stay untyped JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsultationVitals {
    #[serde(default)]
    pub weight_kg: Option<Value>,
    #[serde(default)]
    pub temperature_c: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabPanel {
    #[serde(default)]
    pub test_type: Option<String>,
    #[serde(default)]
    pub date_performed: Option<NaiveDate>,
    #[serde(default)]
    pub results: Vec<LabResultEntry>,
    #[serde(default)]
    pub medical_technologist: Option<String>,
    #[serde(default)]
    pub pathologist: Option<String>,
}

impl LabPanel {
    pub fn normalize(&mut self) {
        trim_opt(&mut self.test_type);
        for entry in &mut self.results {
            entry.normalize();
        }
        title_opt(&mut self.medical_technologist);
        title_opt(&mut self.pathologist);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabResultEntry {
    #[serde(default)]
    pub test_name: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub reference_range: Option<String>,
}

impl LabResultEntry {
    pub fn normalize(&mut self) {
        trim_opt(&mut self.test_name);
        trim_opt(&mut self.unit);
        trim_opt(&mut self.reference_range);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RadiologyReport {
    #[serde(default)]
    pub examination: Option<String>,
    #[serde(default)]
    pub date_performed: Option<NaiveDate>,
    #[serde(default)]
    pub findings: Option<String>,
    #[serde(default)]
    pub impression: Option<String>,
    #[serde(default)]
    pub radiologist: Option<String>,
}

impl RadiologyReport {
    pub fn normalize(&mut self) {
        trim_opt(&mut self.examination);
        trim_opt(&mut self.findings);
        trim_opt(&mut self.impression);
        title_opt(&mut self.radiologist);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientSummary {
    #[serde(default)]
    pub final_diagnosis: Vec<String>,
    #[serde(default)]
    pub primary_complaint: Option<String>,
    #[serde(default)]
    pub key_findings: Option<String>,
    #[serde(default)]
    pub medications_taken: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
}

impl PatientSummary {
    pub fn normalize(&mut self) {
        trim_vec(&mut self.final_diagnosis);
        trim_opt(&mut self.primary_complaint);
        trim_opt(&mut self.key_findings);
        trim_vec(&mut self.medications_taken);
        trim_vec(&mut self.allergies);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePatientRequest {
    #[serde(default)]
    pub patient_info: Option<PatientInfo>,
    #[serde(default)]
    pub sponsor_info: Option<SponsorInfo>,
    #[serde(default)]
    pub medical_encounters: Option<MedicalEncounters>,
    #[serde(default)]
    pub summary: Option<PatientSummary>,
}

/// Partial update. Absent columns stay untouched; a supplied column fully
/// replaces the stored value, arrays wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePatientRequest {
    #[serde(default)]
    pub patient_info: Option<PatientInfo>,
    #[serde(default)]
    pub sponsor_info: Option<SponsorInfo>,
    #[serde(default)]
    pub medical_encounters: Option<MedicalEncounters>,
    #[serde(default)]
    pub summary: Option<PatientSummary>,
}

impl UpdatePatientRequest {
    pub fn normalize(&mut self) {
        if let Some(patient_info) = &mut self.patient_info {
            patient_info.normalize();
        }
        if let Some(sponsor_info) = &mut self.sponsor_info {
            sponsor_info.normalize();
        }
        if let Some(encounters) = &mut self.medical_encounters {
            encounters.normalize();
        }
        if let Some(summary) = &mut self.summary {
            summary.normalize();
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatientListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PatientListResponse {
    pub data: Vec<PatientRecord>,
    pub total: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct PatientStats {
    pub total_patients: i64,
    pub updated_last_24h: i64,
    pub category_distribution: BTreeMap<String, i64>,
    pub top_diagnoses: Vec<DiagnosisCount>,
    pub average_age: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DiagnosisCount {
    pub diagnosis: String,
    pub count: i64,
}

/// Row shape for the statistics read, which selects only the columns the
/// aggregation needs.
#[derive(Debug, Deserialize)]
pub struct StatsRow {
    #[serde(default)]
    pub patient_info: PatientInfo,
    #[serde(default)]
    pub summary: Option<PatientSummary>,
    pub updated_at: DateTime<Utc>,
}

/// Columns the list endpoint may sort by. Anything not on the list falls
/// back to the name column without erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    RecordNumber,
    DateOfBirth,
    Category,
    FinalDiagnosis,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("patient_record_number") | Some("recordNumber") => Self::RecordNumber,
            Some("date_of_birth") | Some("dateOfBirth") => Self::DateOfBirth,
            Some("category") => Self::Category,
            Some("final_diagnosis") | Some("finalDiagnosis") => Self::FinalDiagnosis,
            Some("created_at") | Some("createdAt") => Self::CreatedAt,
            Some("updated_at") | Some("updatedAt") => Self::UpdatedAt,
            _ => Self::Name,
        }
    }

    pub fn order_expression(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::RecordNumber => "patient_info->>patient_record_number",
            Self::DateOfBirth => "patient_info->>date_of_birth",
            Self::Category => "patient_info->>category",
            Self::FinalDiagnosis => "summary->>final_diagnosis",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("Patient with ID {0} not found")]
    NotFound(Uuid),

    #[error("Validation error: {0:?}")]
    Validation(Vec<String>),

    #[error("One or more records could not be deleted")]
    BulkDelete,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for PatientError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for PatientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Database(format!("Malformed patient row: {}", err))
    }
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::NotFound(id) => {
                AppError::NotFound(format!("Patient with ID {} not found", id))
            }
            PatientError::Validation(messages) => AppError::Validation(messages),
            PatientError::BulkDelete => {
                AppError::Internal("One or more records could not be deleted".to_string())
            }
            PatientError::Database(detail) => AppError::Database(detail),
        }
    }
}

fn trim_opt(field: &mut Option<String>) {
    if let Some(value) = field {
        *value = value.trim().to_string();
    }
}

fn title_opt(field: &mut Option<String>) {
    if let Some(value) = field {
        *value = title_case_words(value);
    }
}

fn trim_vec(entries: &mut Vec<String>) {
    for entry in entries {
        *entry = entry.trim().to_string();
    }
}
