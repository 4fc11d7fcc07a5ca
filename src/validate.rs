//! Field checks applied at the mutation boundary.
//!
//! The rules mirror what the employee form enforces inline, so a message
//! returned here can be painted next to the same input.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::error::{Field, FieldError, ValidationErrors};
use crate::model::{parse_date, EmployeeDraft, Status};

pub const NAME_MESSAGE: &str = "Name should only contain letters and spaces (2-50 characters)";
pub const EMAIL_MESSAGE: &str = "Please enter a valid email address";
pub const PHONE_MESSAGE: &str = "Please enter a valid 10-digit phone number";
pub const SALARY_NEGATIVE_MESSAGE: &str = "Salary cannot be negative";
pub const SALARY_FORMAT_MESSAGE: &str = "Please enter a valid salary";
pub const REQUIRED_MESSAGE: &str = "This field is required";
pub const START_DATE_MESSAGE: &str = "Please select a start date";
pub const START_DATE_FORMAT_MESSAGE: &str = "Please enter a valid start date";
pub const STATUS_MESSAGE: &str = "Status must be Active or Inactive";

/// Draft fields that passed every check, normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidFields {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub department: String,
    pub start_date: NaiveDate,
    pub salary: f64,
    pub status: Status,
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z\s]{2,50}$").expect("valid name pattern"))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"))
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{10}$").expect("valid phone pattern"))
}

pub fn is_valid_name(name: &str) -> bool {
    name_pattern().is_match(name.trim())
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email.trim())
}

/// Phone is optional; blank input passes.
pub fn is_valid_phone(phone: &str) -> bool {
    let trimmed = phone.trim();
    trimmed.is_empty() || phone_pattern().is_match(trimmed)
}

pub fn parse_salary(text: &str) -> Result<f64, FieldError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(FieldError::missing(Field::Salary, REQUIRED_MESSAGE));
    }
    let salary = trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| FieldError::invalid(Field::Salary, SALARY_FORMAT_MESSAGE))?;
    if salary < 0.0 {
        return Err(FieldError::invalid(Field::Salary, SALARY_NEGATIVE_MESSAGE));
    }
    Ok(salary)
}

fn required(field: Field, value: &str, errors: &mut ValidationErrors) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(FieldError::missing(field, REQUIRED_MESSAGE));
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Checks every field and reports all failures at once. A blank status is
/// read as `Active`, which is what the add form submits.
pub fn validate_draft(draft: &EmployeeDraft) -> Result<ValidFields, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = required(Field::Name, &draft.name, &mut errors);
    let name = name.filter(|name| {
        let ok = is_valid_name(name);
        if !ok {
            errors.push(FieldError::invalid(Field::Name, NAME_MESSAGE));
        }
        ok
    });

    let email = required(Field::Email, &draft.email, &mut errors);
    let email = email.filter(|email| {
        let ok = is_valid_email(email);
        if !ok {
            errors.push(FieldError::invalid(Field::Email, EMAIL_MESSAGE));
        }
        ok
    });

    let phone = draft.phone.trim();
    if !is_valid_phone(phone) {
        errors.push(FieldError::invalid(Field::Phone, PHONE_MESSAGE));
    }

    let role = required(Field::Role, &draft.role, &mut errors);
    let department = required(Field::Department, &draft.department, &mut errors);

    let start_date = if draft.start_date.trim().is_empty() {
        errors.push(FieldError::missing(Field::StartDate, START_DATE_MESSAGE));
        None
    } else {
        let parsed = parse_date(&draft.start_date);
        if parsed.is_none() {
            errors.push(FieldError::invalid(Field::StartDate, START_DATE_FORMAT_MESSAGE));
        }
        parsed
    };

    let salary = match parse_salary(&draft.salary) {
        Ok(salary) => Some(salary),
        Err(error) => {
            errors.push(error);
            None
        }
    };

    let status = if draft.status.trim().is_empty() {
        Some(Status::Active)
    } else {
        let parsed = Status::parse(&draft.status);
        if parsed.is_none() {
            errors.push(FieldError::invalid(Field::Status, STATUS_MESSAGE));
        }
        parsed
    };

    match (name, email, role, department, start_date, salary, status) {
        (
            Some(name),
            Some(email),
            Some(role),
            Some(department),
            Some(start_date),
            Some(salary),
            Some(status),
        ) if errors.is_empty() => Ok(ValidFields {
            name,
            email,
            phone: (!phone.is_empty()).then(|| phone.to_string()),
            role,
            department,
            start_date,
            salary,
            status,
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn draft() -> EmployeeDraft {
        EmployeeDraft {
            name: "Priya Nair".to_string(),
            email: "priya@example.com".to_string(),
            phone: "9876543210".to_string(),
            role: "Developer".to_string(),
            department: "Engineering".to_string(),
            start_date: "2025-02-18".to_string(),
            salary: "65000".to_string(),
            status: String::new(),
        }
    }

    #[test]
    fn accepts_a_complete_draft() {
        let fields = validate_draft(&draft()).unwrap();
        assert_eq!(fields.name, "Priya Nair");
        assert_eq!(fields.phone.as_deref(), Some("9876543210"));
        assert_eq!(fields.salary, 65000.0);
        assert_eq!(fields.status, Status::Active);
    }

    #[test]
    fn negative_salary_is_a_format_error() {
        let mut input = draft();
        input.salary = "-5".to_string();
        let errors = validate_draft(&input).unwrap_err();
        assert_eq!(errors.len(), 1);
        let error = errors.get(Field::Salary).unwrap();
        assert_eq!(error.kind, ErrorKind::InvalidFormat);
        assert_eq!(error.message, SALARY_NEGATIVE_MESSAGE);
    }

    #[test]
    fn reports_every_failing_field() {
        let input = EmployeeDraft {
            name: "R2D2".to_string(),
            email: "not-an-email".to_string(),
            phone: "12345".to_string(),
            ..Default::default()
        };
        let errors = validate_draft(&input).unwrap_err();
        assert!(errors.has(Field::Name, ErrorKind::InvalidFormat));
        assert!(errors.has(Field::Email, ErrorKind::InvalidFormat));
        assert!(errors.has(Field::Phone, ErrorKind::InvalidFormat));
        assert!(errors.has(Field::Role, ErrorKind::MissingField));
        assert!(errors.has(Field::Department, ErrorKind::MissingField));
        assert!(errors.has(Field::StartDate, ErrorKind::MissingField));
        assert!(errors.has(Field::Salary, ErrorKind::MissingField));
    }

    #[test]
    fn blank_phone_is_allowed() {
        let mut input = draft();
        input.phone = "  ".to_string();
        assert_eq!(validate_draft(&input).unwrap().phone, None);
    }

    #[test]
    fn name_rules() {
        assert!(is_valid_name("Al"));
        assert!(!is_valid_name("A"));
        assert!(!is_valid_name(&"a".repeat(51)));
        assert!(!is_valid_name("O'Brien"));
    }

    #[test]
    fn salary_text_must_be_numeric() {
        assert_eq!(parse_salary("0"), Ok(0.0));
        assert_eq!(
            parse_salary("abc").unwrap_err().message,
            SALARY_FORMAT_MESSAGE
        );
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut input = draft();
        input.status = "On Leave".to_string();
        let errors = validate_draft(&input).unwrap_err();
        assert!(errors.has(Field::Status, ErrorKind::InvalidFormat));
    }
}
