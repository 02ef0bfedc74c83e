use serde_json::json;

use crate::models::DocumentType;

/// Classification vocabulary the model is allowed to use for
/// `patient_info.category`.
pub const CATEGORY_OPTIONS: [&str; 5] = [
    "ACTIVE MILITARY",
    "DEPENDENT",
    "RETIREE",
    "CIVILIAN EMPLOYEE",
    "OTHERS",
];

/// Diagnosis vocabulary the model is allowed to use for
/// `summary.final_diagnosis`.
pub const DIAGNOSIS_OPTIONS: [&str; 10] = [
    "Acute Bronchitis",
    "Allergic Rhinitis",
    "Community-Acquired Pneumonia",
    "Dengue Fever",
    "Gastroenteritis",
    "Hypertension",
    "Migraine",
    "Type 2 Diabetes",
    "Upper Respiratory Tract Infection",
    "Urinary Tract Infection",
];

/// Build the instruction prompt sent alongside the PDF. The schema embedded
/// here is the persisted record shape minus the derived age fields, which
/// are computed on read rather than extracted.
pub fn build_extraction_prompt(document_type: Option<DocumentType>) -> String {
    let schema = json!({
        "patient_info": {
            "patient_record_number": null,
            "full_name": { "first_name": null, "middle_initial": null, "last_name": null },
            "date_of_birth": null,
            "sex": null,
            "address": {
                "house_no_street": null,
                "barangay": null,
                "city_municipality": null,
                "province": null,
                "zip_code": null
            },
            "category": null,
            "rank": null,
            "afpsn": null,
            "branch_of_service": null,
            "unit_assignment": null
        },
        "sponsor_info": {
            "sponsor_name": { "rank": null, "first_name": null, "last_name": null },
            "afpsn": null,
            "branch_of_service": null,
            "unit_assignment": null
        },
        "medical_encounters": {
            "consultations": [{
                "consultation_date": null,
                "vitals": { "weight_kg": null, "temperature_c": null },
                "chief_complaint": null,
                "diagnosis": null,
                "notes": null,
                "treatment_plan": null,
                "attending_physician": null
            }],
            "lab_results": [{
                "test_type": null,
                "date_performed": null,
                "results": [{
                    "test_name": null,
                    "value": null,
                    "reference_range": null,
                    "unit": null
                }],
                "medical_technologist": null,
                "pathologist": null
            }],
            "radiology_reports": [{
                "examination": null,
                "date_performed": null,
                "findings": null,
                "impression": null,
                "radiologist": null
            }]
        },
        "summary": {
            "final_diagnosis": [],
            "primary_complaint": null,
            "key_findings": null,
            "medications_taken": [],
            "allergies": []
        }
    });

    let affiliation_rule = match document_type {
        Some(DocumentType::Military) => {
            "The patient is the service member. Put 'rank', 'afpsn', 'branch_of_service' and \
             'unit_assignment' inside patient_info and set sponsor_info to null."
        }
        Some(DocumentType::Dependent) => {
            "The patient is a dependent. Put 'rank', 'afpsn', 'branch_of_service' and \
             'unit_assignment' inside sponsor_info for the sponsoring service member and leave \
             them null inside patient_info."
        }
        None => {
            "Decide from the document whether the patient is the service member or a dependent. \
             Put 'rank', 'afpsn', 'branch_of_service' and 'unit_assignment' inside patient_info \
             for a service member or inside sponsor_info for a dependent, never both."
        }
    };

    format!(
        "You are an expert AI medical data processor. Your task is to analyze the attached \
medical document and convert it into a single, comprehensive JSON object.

**CRITICAL INSTRUCTIONS:**
1. **Adhere to the Schema**: The output MUST strictly follow the JSON schema provided below. \
If a field is not present in the document, its value MUST be null.
2. **Date Formatting**: All dates in the final JSON MUST be in \"YYYY-MM-DD\" format.
3. **Synthesize Information**: The document may contain multiple pages. Combine all \
information for the one patient into a single JSON object.
4. **Handle Nested Arrays**: For array properties such as consultations, lab_results, and \
radiology_reports, create a new object in the array for each distinct record found in the \
document.
5. **No Extra Text**: Your final output must only be the raw JSON object. Do not include \
markdown, explanations, or any other text.

**JSON SCHEMA TO FOLLOW:**
{schema:#}

**DETAILED EXTRACTION GUIDE:**
- **patient_info**: Find the main patient demographics (name, date of birth, sex, address). \
The record number is often labeled 'CP#' or 'Patient No'.
- **Service affiliation**: {affiliation_rule}
- **category**: Classify the patient using exactly one of: {categories}.
- **consultations**: Each distinct doctor's visit, identified by a unique date (e.g. \
\"DATE: 02 MAY 2022\") and often under a \"Physicians Section\" header, is a new object in \
the 'consultations' array. Consultations are often handwritten, so pay close attention and \
analyze the text. For each consultation, extract the surrounding text to find the \
'chief_complaint', 'diagnosis' (sometimes labeled 'Assessment'), 'vitals' (Wt, Temp), \
'notes' (often labeled 'HPI' or 'S'), 'treatment_plan' (often labeled 'Plan'), and the \
'attending_physician'.
- **lab_results**: Each laboratory report (e.g. 'URINALYSIS', 'HEMATOLOGY') is a new object. \
Inside that object, you MUST populate the 'results' array. Create a new object for EACH row \
in that report's table, extracting 'test_name', 'value', 'reference_range', and 'unit'.
- **radiology_reports**: Each 'ULTRASOUND REPORT' or 'X-RAY REPORT' is a new object. Extract \
'examination', 'findings', and 'impression'.
- **summary.final_diagnosis**: List every confirmed diagnosis, using only values from: \
{diagnoses}.",
        schema = schema,
        affiliation_rule = affiliation_rule,
        categories = CATEGORY_OPTIONS.join(", "),
        diagnoses = DIAGNOSIS_OPTIONS.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_schema_and_vocabularies() {
        let prompt = build_extraction_prompt(None);
        assert!(prompt.contains("\"patient_record_number\""));
        assert!(prompt.contains("\"radiology_reports\""));
        assert!(prompt.contains("ACTIVE MILITARY, DEPENDENT, RETIREE, CIVILIAN EMPLOYEE, OTHERS"));
        assert!(prompt.contains("Urinary Tract Infection"));
    }

    #[test]
    fn military_documents_put_service_fields_on_the_patient() {
        let prompt = build_extraction_prompt(Some(DocumentType::Military));
        assert!(prompt.contains("set sponsor_info to null"));
    }

    #[test]
    fn dependent_documents_put_service_fields_on_the_sponsor() {
        let prompt = build_extraction_prompt(Some(DocumentType::Dependent));
        assert!(prompt.contains("inside sponsor_info for the sponsoring service member"));
    }

    #[test]
    fn unspecified_documents_let_the_model_decide() {
        let prompt = build_extraction_prompt(None);
        assert!(prompt.contains("Decide from the document"));
    }
}
