//! Intake-form validation. Failures are collected into a list so the caller
//! sees every problem at once rather than fixing them one at a time.

/// Age bounds accepted at registration.
const MIN_AGE: i32 = 1;
const MAX_AGE: i32 = 120;

pub fn validate_patient_fields(name: &str, age: &str, contact: &str) -> Vec<String> {
    let mut errors = Vec::new();

    let name_parts: Vec<&str> = name.split_whitespace().collect();
    let capitalized = name_parts
        .iter()
        .all(|part| part.chars().next().is_some_and(|c| c.is_uppercase()));
    if name_parts.len() < 2 || !capitalized {
        errors.push("Name must have at least 2 words, each starting with a capital letter".to_string());
    }

    match parse_age(age) {
        Some(age) if (MIN_AGE..=MAX_AGE).contains(&age) => {}
        Some(_) => errors.push(format!("Age must be between {} and {}", MIN_AGE, MAX_AGE)),
        None => errors.push("Invalid age value".to_string()),
    }

    if contact.len() != 10 || !contact.chars().all(|c| c.is_ascii_digit()) {
        errors.push("Contact number must be exactly 10 digits".to_string());
    }

    errors
}

pub fn parse_age(age: &str) -> Option<i32> {
    age.trim().parse().ok()
}
