use chrono::{Months, NaiveDate, Utc};
use serde_json::Value;
use uuid::Uuid;

use patient_cell::models::{
    Consultation, FullName, MedicalEncounters, PatientAddress, PatientInfo, PatientRecord,
    SortField,
};
use shared_utils::test_utils::MockStorageResponses;

fn record_with_info(patient_info: PatientInfo) -> PatientRecord {
    PatientRecord {
        id: Uuid::new_v4(),
        name: "Juan Dela Cruz".to_string(),
        patient_info,
        sponsor_info: None,
        medical_encounters: None,
        summary: None,
        age: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        deleted_at: None,
    }
}

#[test]
fn derived_age_tracks_date_of_birth() {
    let today = Utc::now().date_naive();
    let dob = today.checked_sub_months(Months::new(360)).unwrap();

    let mut record = record_with_info(PatientInfo {
        date_of_birth: Some(dob),
        ..Default::default()
    });
    record.attach_derived();

    assert_eq!(record.age, Some(30));
}

#[test]
fn derived_age_serializes_as_null_without_date_of_birth() {
    let mut record = record_with_info(PatientInfo::default());
    record.attach_derived();

    assert_eq!(record.age, None);
    let serialized = serde_json::to_value(&record).unwrap();
    assert_eq!(serialized["age"], Value::Null);
}

#[test]
fn age_at_visit_steps_up_on_the_birthday() {
    let dob = NaiveDate::from_ymd_opt(1990, 6, 15).unwrap();

    let mut encounters = MedicalEncounters::default();
    encounters.consultations.push(Consultation {
        consultation_date: NaiveDate::from_ymd_opt(2024, 6, 14),
        ..Default::default()
    });
    encounters.consultations.push(Consultation {
        consultation_date: NaiveDate::from_ymd_opt(2024, 6, 15),
        ..Default::default()
    });

    encounters.attach_age_at_visit(Some(dob));

    assert_eq!(encounters.consultations[0].age_at_visit, Some(33));
    assert_eq!(encounters.consultations[1].age_at_visit, Some(34));
}

#[test]
fn age_at_visit_needs_both_dates() {
    let mut encounters = MedicalEncounters::default();
    encounters.consultations.push(Consultation {
        consultation_date: NaiveDate::from_ymd_opt(2024, 6, 14),
        ..Default::default()
    });

    encounters.attach_age_at_visit(None);
    assert_eq!(encounters.consultations[0].age_at_visit, None);

    encounters.consultations[0].consultation_date = None;
    encounters.attach_age_at_visit(NaiveDate::from_ymd_opt(1990, 6, 15));
    assert_eq!(encounters.consultations[0].age_at_visit, None);
}

#[test]
fn age_at_visit_stays_off_the_wire_when_absent() {
    let consultation = Consultation::default();
    let serialized = serde_json::to_value(&consultation).unwrap();
    assert!(serialized.get("age_at_visit").is_none());

    let consultation = Consultation {
        age_at_visit: Some(30),
        ..Default::default()
    };
    let serialized = serde_json::to_value(&consultation).unwrap();
    assert_eq!(serialized["age_at_visit"], 30);
}

#[test]
fn clear_derived_strips_computed_ages() {
    let mut encounters = MedicalEncounters::default();
    encounters.consultations.push(Consultation {
        age_at_visit: Some(33),
        ..Default::default()
    });

    encounters.clear_derived();
    assert_eq!(encounters.consultations[0].age_at_visit, None);
}

#[test]
fn display_name_joins_present_parts() {
    let full = FullName {
        first_name: Some("Jane".to_string()),
        middle_initial: Some("Q".to_string()),
        last_name: Some("Doe".to_string()),
    };
    assert_eq!(full.display(), "Jane Doe");

    let first_only = FullName {
        first_name: Some("  Jane  ".to_string()),
        middle_initial: None,
        last_name: None,
    };
    assert_eq!(first_only.display(), "Jane");

    assert_eq!(FullName::default().display(), "");
}

#[test]
fn normalize_title_cases_names_and_address() {
    let mut info = PatientInfo {
        full_name: Some(FullName {
            first_name: Some("  juan  ".to_string()),
            middle_initial: Some("q".to_string()),
            last_name: Some("DELA CRUZ".to_string()),
        }),
        address: Some(PatientAddress {
            city_municipality: Some("quezon city".to_string()),
            zip_code: Some(" 1100 ".to_string()),
            ..Default::default()
        }),
        rank: Some("  SGT ".to_string()),
        ..Default::default()
    };

    info.normalize();

    let full_name = info.full_name.unwrap();
    assert_eq!(full_name.first_name.as_deref(), Some("Juan"));
    assert_eq!(full_name.middle_initial.as_deref(), Some("Q"));
    assert_eq!(full_name.last_name.as_deref(), Some("Dela Cruz"));

    let address = info.address.unwrap();
    assert_eq!(address.city_municipality.as_deref(), Some("Quezon City"));
    assert_eq!(address.zip_code.as_deref(), Some("1100"));

    assert_eq!(info.rank.as_deref(), Some("SGT"));
}

#[test]
fn unknown_sort_param_falls_back_to_name() {
    assert_eq!(
        SortField::from_param(Some("not_a_real_field")),
        SortField::Name
    );
    assert_eq!(SortField::from_param(None), SortField::Name);
}

#[test]
fn sort_params_accept_both_spellings() {
    assert_eq!(
        SortField::from_param(Some("dateOfBirth")),
        SortField::DateOfBirth
    );
    assert_eq!(
        SortField::from_param(Some("date_of_birth")),
        SortField::DateOfBirth
    );
    assert_eq!(
        SortField::from_param(Some("finalDiagnosis")),
        SortField::FinalDiagnosis
    );
}

#[test]
fn sort_fields_map_to_json_extraction_expressions() {
    assert_eq!(SortField::Name.order_expression(), "name");
    assert_eq!(
        SortField::DateOfBirth.order_expression(),
        "patient_info->>date_of_birth"
    );
    assert_eq!(
        SortField::FinalDiagnosis.order_expression(),
        "summary->>final_diagnosis"
    );
    assert_eq!(
        SortField::RecordNumber.order_expression(),
        "patient_info->>patient_record_number"
    );
}

#[test]
fn record_round_trips_from_a_storage_row() {
    let id = Uuid::new_v4();
    let row = MockStorageResponses::patient_row(&id.to_string(), "Juan", "Dela Cruz", Some("1990-06-15"));

    let record: PatientRecord = serde_json::from_value(row).unwrap();

    assert_eq!(record.id, id);
    assert_eq!(record.name, "Juan Dela Cruz");
    assert_eq!(
        record.patient_info.patient_record_number.as_deref(),
        Some("CP-0001")
    );
    assert_eq!(
        record.patient_info.date_of_birth,
        NaiveDate::from_ymd_opt(1990, 6, 15)
    );
    assert!(record.deleted_at.is_none());
}
