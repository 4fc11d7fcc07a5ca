use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::validate::ValidFields;

/// Record identifier. Either a padded code such as `EMP0007` or the
/// millisecond timestamp used by the quick-add entry point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmployeeId {
    Number(i64),
    Code(String),
}

impl EmployeeId {
    /// Reads an id as typed into a URL or data attribute. All-digit input
    /// becomes a number, anything else a code.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.chars().all(|ch| ch.is_ascii_digit()) {
            if let Ok(number) = trimmed.parse::<i64>() {
                return Some(EmployeeId::Number(number));
            }
        }
        Some(EmployeeId::Code(trimmed.to_string()))
    }

    /// Loose comparison against raw text, so `"7"` finds numeric id 7.
    pub fn matches_text(&self, text: &str) -> bool {
        match self {
            EmployeeId::Number(number) => text.trim().parse::<i64>().ok() == Some(*number),
            EmployeeId::Code(code) => code == text.trim(),
        }
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmployeeId::Number(number) => write!(f, "{number}"),
            EmployeeId::Code(code) => f.write_str(code),
        }
    }
}

impl From<i64> for EmployeeId {
    fn from(value: i64) -> Self {
        EmployeeId::Number(value)
    }
}

impl From<&str> for EmployeeId {
    fn from(value: &str) -> Self {
        EmployeeId::Code(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

impl Status {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Status::Active),
            "inactive" => Some(Status::Inactive),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Active => "Active",
            Status::Inactive => "Inactive",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One employee as held in the `employees` collection.
///
/// Stored blobs written by older pages carry loosely typed values (numbers
/// as strings, empty dates), so the optional fields deserialize leniently
/// and fall back to `None` instead of rejecting the record. A status in any
/// case reads; a missing or unknown one reads as `Active`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub email: String,
    #[serde(
        default,
        deserialize_with = "lenient_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub role: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub department: String,
    #[serde(
        default,
        alias = "hireDate",
        deserialize_with = "lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "lenient_salary",
        skip_serializing_if = "Option::is_none"
    )]
    pub salary: Option<f64>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Status,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Employee {
    pub(crate) fn from_fields(id: EmployeeId, fields: ValidFields, now: DateTime<Utc>) -> Self {
        let mut employee = Self {
            id,
            name: String::new(),
            email: String::new(),
            phone: None,
            role: String::new(),
            department: String::new(),
            start_date: None,
            salary: None,
            status: Status::Active,
            created_at: Some(now),
            updated_at: Some(now),
        };
        employee.assign(fields);
        employee
    }

    /// Overwrites the editable fields. Identity and timestamps are left alone.
    pub(crate) fn assign(&mut self, fields: ValidFields) {
        self.name = fields.name;
        self.email = fields.email;
        self.phone = fields.phone;
        self.role = fields.role;
        self.department = fields.department;
        self.start_date = Some(fields.start_date);
        self.salary = Some(fields.salary);
        self.status = fields.status;
    }

    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }
}

/// Raw form input. Every field arrives as text; validation turns it into
/// [`ValidFields`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeeDraft {
    #[serde(deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(deserialize_with = "lenient_text")]
    pub email: String,
    #[serde(deserialize_with = "lenient_text")]
    pub phone: String,
    #[serde(deserialize_with = "lenient_text")]
    pub role: String,
    #[serde(deserialize_with = "lenient_text")]
    pub department: String,
    #[serde(deserialize_with = "lenient_text")]
    pub start_date: String,
    #[serde(deserialize_with = "lenient_text")]
    pub salary: String,
    #[serde(deserialize_with = "lenient_text")]
    pub status: String,
}

impl From<&Employee> for EmployeeDraft {
    fn from(employee: &Employee) -> Self {
        Self {
            name: employee.name.clone(),
            email: employee.email.clone(),
            phone: employee.phone.clone().unwrap_or_default(),
            role: employee.role.clone(),
            department: employee.department.clone(),
            start_date: employee
                .start_date
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            salary: employee.salary.map(|s| s.to_string()).unwrap_or_default(),
            status: employee.status.as_str().to_string(),
        }
    }
}

/// Partial edit. Absent fields keep the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmployeePatch {
    #[serde(deserialize_with = "lenient_patch_text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient_patch_text")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient_patch_text")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient_patch_text")]
    pub role: Option<String>,
    #[serde(deserialize_with = "lenient_patch_text")]
    pub department: Option<String>,
    #[serde(deserialize_with = "lenient_patch_text")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "lenient_patch_text")]
    pub salary: Option<String>,
    #[serde(deserialize_with = "lenient_patch_text")]
    pub status: Option<String>,
}

impl EmployeePatch {
    pub fn apply_to(&self, draft: &mut EmployeeDraft) {
        let merge = |slot: &mut String, value: &Option<String>| {
            if let Some(value) = value {
                *slot = value.clone();
            }
        };
        merge(&mut draft.name, &self.name);
        merge(&mut draft.email, &self.email);
        merge(&mut draft.phone, &self.phone);
        merge(&mut draft.role, &self.role);
        merge(&mut draft.department, &self.department);
        merge(&mut draft.start_date, &self.start_date);
        merge(&mut draft.salary, &self.salary);
        merge(&mut draft.status, &self.status);
    }
}

impl From<EmployeeDraft> for EmployeePatch {
    fn from(draft: EmployeeDraft) -> Self {
        Self {
            name: Some(draft.name),
            email: Some(draft.email),
            phone: Some(draft.phone),
            role: Some(draft.role),
            department: Some(draft.department),
            start_date: Some(draft.start_date),
            salary: Some(draft.salary),
            status: Some(draft.status),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKind {
    #[serde(rename = "add")]
    Add,
    #[serde(rename = "edit")]
    Edit,
    #[serde(rename = "delete")]
    Delete,
    #[serde(rename = "role")]
    RoleChange,
}

impl ActivityKind {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "add" => Some(ActivityKind::Add),
            "edit" => Some(ActivityKind::Edit),
            "delete" => Some(ActivityKind::Delete),
            "role" | "role-change" => Some(ActivityKind::RoleChange),
            _ => None,
        }
    }
}

/// Snapshot of the employee an activity refers to, taken at event time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySubject {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub role: String,
}

impl From<&Employee> for ActivitySubject {
    fn from(employee: &Employee) -> Self {
        Self {
            name: employee.name.clone(),
            role: employee.role.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub data: ActivitySubject,
    pub timestamp: DateTime<Utc>,
}

fn value_text(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Number(number) => Some(number.to_string()),
        serde_json::Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value_text(value.as_ref()).unwrap_or_default())
}

fn lenient_patch_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value_text(value.as_ref()))
}

fn lenient_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value_text(value.as_ref())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty()))
}

pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|stamp| stamp.with_timezone(&Utc).date_naive())
        })
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(parse_date))
}

fn lenient_salary<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let parsed = match value {
        Some(serde_json::Value::Number(number)) => number.as_f64(),
        Some(serde_json::Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|salary| salary.is_finite()))
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Status, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value_text(value.as_ref())
        .and_then(|text| Status::parse(&text))
        .unwrap_or_default())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) => DateTime::parse_from_rfc3339(text.trim())
            .ok()
            .map(|stamp| stamp.with_timezone(&Utc)),
        Some(serde_json::Value::Number(number)) => number
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_loosely_typed_records() {
        let employee: Employee = serde_json::from_value(json!({
            "id": "EMP0001",
            "name": "Asha Rao",
            "email": "asha@example.com",
            "phone": "",
            "role": "Designer",
            "department": "Design",
            "startDate": "",
            "salary": "52000",
            "status": "Inactive",
            "createdAt": "2025-01-12T10:00:00.000Z",
            "updatedAt": null,
            "legacyField": true
        }))
        .unwrap();

        assert_eq!(employee.id, EmployeeId::Code("EMP0001".to_string()));
        assert_eq!(employee.phone, None);
        assert_eq!(employee.start_date, None);
        assert_eq!(employee.salary, Some(52000.0));
        assert_eq!(employee.status, Status::Inactive);
        assert!(employee.created_at.is_some());
        assert!(employee.updated_at.is_none());
    }

    #[test]
    fn status_reads_in_any_case() {
        let status = |value: serde_json::Value| {
            serde_json::from_value::<Employee>(json!({ "id": 1, "status": value }))
                .unwrap()
                .status
        };
        assert_eq!(status(json!("inactive")), Status::Inactive);
        assert_eq!(status(json!("ACTIVE")), Status::Active);
        assert_eq!(status(json!(null)), Status::Active);
        assert_eq!(status(json!("")), Status::Active);
        assert_eq!(status(json!("on leave")), Status::Active);
        assert_eq!(status(json!(3)), Status::Active);
    }

    #[test]
    fn timestamp_ids_stay_numeric() {
        let employee: Employee = serde_json::from_value(json!({
            "id": 1736676000000_i64,
            "name": "Ravi",
            "hireDate": "2024-11-22"
        }))
        .unwrap();
        assert_eq!(employee.id, EmployeeId::Number(1736676000000));
        assert_eq!(
            employee.start_date,
            NaiveDate::from_ymd_opt(2024, 11, 22)
        );
        assert_eq!(employee.status, Status::Active);

        let written = serde_json::to_value(&employee).unwrap();
        assert_eq!(written["id"], json!(1736676000000_i64));
        assert_eq!(written["startDate"], json!("2024-11-22"));
    }

    #[test]
    fn id_parsing_and_loose_matching() {
        assert_eq!(EmployeeId::parse("42"), Some(EmployeeId::Number(42)));
        assert_eq!(
            EmployeeId::parse(" EMP0042 "),
            Some(EmployeeId::Code("EMP0042".to_string()))
        );
        assert_eq!(EmployeeId::parse("  "), None);
        assert!(EmployeeId::Number(7).matches_text("7"));
        assert!(!EmployeeId::Number(7).matches_text("EMP7"));
        assert!(EmployeeId::Code("EMP0007".to_string()).matches_text("EMP0007"));
        assert!(EmployeeId::Number(9) < EmployeeId::Code("A".to_string()));
    }

    #[test]
    fn patch_overrides_only_supplied_fields() {
        let mut draft = EmployeeDraft {
            name: "Meera".to_string(),
            role: "HR".to_string(),
            salary: "40000".to_string(),
            ..Default::default()
        };
        let patch: EmployeePatch = serde_json::from_value(json!({ "role": "Manager", "salary": 45000 })).unwrap();
        patch.apply_to(&mut draft);
        assert_eq!(draft.name, "Meera");
        assert_eq!(draft.role, "Manager");
        assert_eq!(draft.salary, "45000");
    }

    #[test]
    fn activity_kind_uses_feed_names() {
        let entry: ActivityEntry = serde_json::from_value(json!({
            "id": 1,
            "type": "role",
            "data": { "name": "Kiran", "role": "Team Lead" },
            "timestamp": "2025-03-05T09:30:00.000Z"
        }))
        .unwrap();
        assert_eq!(entry.kind, ActivityKind::RoleChange);
        assert_eq!(ActivityKind::parse("delete"), Some(ActivityKind::Delete));
        assert_eq!(ActivityKind::parse("all"), None);
    }
}
