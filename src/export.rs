//! CSV text for the list and report downloads.
//!
//! Fields are joined with bare commas. Nothing is quoted, so a comma inside
//! a value shifts the columns of that row; downstream sheets expect this
//! exact shape.

use std::path::PathBuf;

use crate::error::Result;
use crate::model::Employee;
use crate::store::write_text_file;

pub const EMPLOYEES_CSV_HEADER: &str = "ID,Name,Email,Role";
pub const REPORT_CSV_HEADER: &str = "Name,Department,Role,Status,Hire Date";
pub const EMPLOYEES_CSV_FILENAME: &str = "employees.csv";
pub const REPORT_CSV_FILENAME: &str = "employee_report.csv";

/// Header plus one newline-terminated row per employee.
pub fn employees_csv<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a Employee>,
{
    let mut csv = format!("{EMPLOYEES_CSV_HEADER}\n");
    for employee in records {
        csv.push_str(&format!(
            "{},{},{},{}\n",
            employee.id, employee.name, employee.email, employee.role
        ));
    }
    csv
}

/// Header and rows joined by newlines, no trailing newline.
pub fn report_csv<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a Employee>,
{
    let mut lines = vec![REPORT_CSV_HEADER.to_string()];
    for employee in records {
        let hired = employee
            .start_date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        lines.push(
            [
                employee.name.as_str(),
                employee.department.as_str(),
                employee.role.as_str(),
                employee.status.as_str(),
                hired.as_str(),
            ]
            .join(","),
        );
    }
    lines.join("\n")
}

fn sanitize_filename(value: &str, fallback: &str) -> String {
    let mut out = String::new();
    for ch in value.trim().chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.' {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches(|ch| ch == '_' || ch == '.');
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Safe download name that always ends in `.csv`.
pub fn export_filename(value: &str, fallback: &str) -> String {
    let safe = sanitize_filename(value, fallback);
    if safe.to_lowercase().ends_with(".csv") {
        safe
    } else {
        format!("{safe}.csv")
    }
}

pub fn write_csv(path: PathBuf, content: &str) -> Result<()> {
    write_text_file(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EmployeeId, Status};
    use chrono::NaiveDate;

    fn employee(id: EmployeeId, name: &str) -> Employee {
        Employee {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            role: "Analyst".to_string(),
            department: "Finance".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 11, 22),
            salary: None,
            status: Status::Inactive,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn list_export_shape() {
        let rows = vec![
            employee(EmployeeId::Code("EMP0001".to_string()), "Charlie"),
            employee(EmployeeId::Number(17), "Dana"),
        ];
        assert_eq!(
            employees_csv(&rows),
            "ID,Name,Email,Role\nEMP0001,Charlie,charlie@example.com,Analyst\n17,Dana,dana@example.com,Analyst\n"
        );
        assert_eq!(employees_csv(&[]), "ID,Name,Email,Role\n");
    }

    #[test]
    fn report_export_shape() {
        let mut undated = employee(EmployeeId::Number(2), "Eva");
        undated.start_date = None;
        let rows = vec![employee(EmployeeId::Number(1), "Charlie"), undated];
        assert_eq!(
            report_csv(&rows),
            "Name,Department,Role,Status,Hire Date\nCharlie,Finance,Analyst,Inactive,2024-11-22\nEva,Finance,Analyst,Inactive,"
        );
    }

    #[test]
    fn embedded_commas_are_not_escaped() {
        let mut odd = employee(EmployeeId::Number(1), "Charlie");
        odd.role = "Analyst, Senior".to_string();
        assert!(employees_csv([&odd]).ends_with("Analyst, Senior\n"));
    }

    #[test]
    fn download_names() {
        assert_eq!(export_filename("team list", EMPLOYEES_CSV_FILENAME), "team_list.csv");
        assert_eq!(export_filename("report.CSV", REPORT_CSV_FILENAME), "report.CSV");
        assert_eq!(export_filename("../", EMPLOYEES_CSV_FILENAME), "employees.csv");
    }

    #[test]
    fn writes_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join(EMPLOYEES_CSV_FILENAME);
        write_csv(path.clone(), "ID,Name,Email,Role\n").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "ID,Name,Email,Role\n");
    }
}
