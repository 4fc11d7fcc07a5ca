//! Role and department lists, preference toggles and the profile form.

use serde::{Deserialize, Serialize};

use crate::error::{Field, FieldError, Result, ValidationErrors};
use crate::report::ReportFilter;
use crate::store::{
    KeyValueStore, RecordStore, DARK_MODE_KEY, DEPARTMENTS_KEY, EMAIL_NOTIF_KEY, PROFILE_EMAIL_KEY,
    PROFILE_NAME_KEY, REPORT_FILTERS_KEY, ROLES_KEY, SMS_NOTIF_KEY,
};
use crate::validate::REQUIRED_MESSAGE;

pub const DEFAULT_ROLES: [&str; 10] = [
    "Manager",
    "Developer",
    "Designer",
    "HR",
    "Analyst",
    "Team Lead",
    "QA Engineer",
    "Product Manager",
    "Sales Executive",
    "Marketing Specialist",
];

pub const DEFAULT_DEPARTMENTS: [&str; 9] = [
    "Engineering",
    "Design",
    "Human Resources",
    "Sales",
    "Marketing",
    "Product",
    "Operations",
    "Finance",
    "Legal",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Catalog {
    Roles,
    Departments,
}

impl Catalog {
    pub fn key(self) -> &'static str {
        match self {
            Catalog::Roles => ROLES_KEY,
            Catalog::Departments => DEPARTMENTS_KEY,
        }
    }

    pub fn defaults(self) -> Vec<String> {
        let seed: &[&str] = match self {
            Catalog::Roles => &DEFAULT_ROLES,
            Catalog::Departments => &DEFAULT_DEPARTMENTS,
        };
        seed.iter().map(|entry| entry.to_string()).collect()
    }
}

/// Stored list, or the seed list when nothing usable is stored.
pub fn list<S: KeyValueStore>(store: &RecordStore<S>, catalog: Catalog) -> Result<Vec<String>> {
    Ok(store
        .string_list(catalog.key())?
        .unwrap_or_else(|| catalog.defaults()))
}

/// Appends `name` unless it is blank or already present.
pub fn add<S: KeyValueStore>(store: &RecordStore<S>, catalog: Catalog, name: &str) -> Result<bool> {
    let name = name.trim();
    let mut entries = list(store, catalog)?;
    if name.is_empty() || entries.iter().any(|entry| entry == name) {
        return Ok(false);
    }
    entries.push(name.to_string());
    store.write_json(catalog.key(), &entries)?;
    Ok(true)
}

/// Removes `name` from the list. Employees holding it keep the string.
pub fn remove<S: KeyValueStore>(
    store: &RecordStore<S>,
    catalog: Catalog,
    name: &str,
) -> Result<bool> {
    let mut entries = list(store, catalog)?;
    let before = entries.len();
    entries.retain(|entry| entry != name.trim());
    if entries.len() == before {
        return Ok(false);
    }
    store.write_json(catalog.key(), &entries)?;
    Ok(true)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub dark_mode: bool,
    pub email_notifications: bool,
    pub sms_notifications: bool,
}

/// Preference and profile values are bare strings, not JSON. Values left
/// quoted by older builds still read.
fn read_text<S: KeyValueStore>(store: &RecordStore<S>, key: &str) -> Result<Option<String>> {
    Ok(store.kv().get_item(key)?.map(|raw| {
        let trimmed = raw.trim();
        serde_json::from_str::<String>(trimmed).unwrap_or_else(|_| trimmed.to_string())
    }))
}

fn read_flag<S: KeyValueStore>(store: &RecordStore<S>, key: &str, on: &str) -> Result<bool> {
    Ok(read_text(store, key)?.is_some_and(|value| value.trim() == on))
}

pub fn load_preferences<S: KeyValueStore>(store: &RecordStore<S>) -> Result<Preferences> {
    Ok(Preferences {
        dark_mode: read_flag(store, DARK_MODE_KEY, "enabled")?,
        email_notifications: read_flag(store, EMAIL_NOTIF_KEY, "on")?,
        sms_notifications: read_flag(store, SMS_NOTIF_KEY, "on")?,
    })
}

pub fn save_preferences<S: KeyValueStore>(
    store: &RecordStore<S>,
    preferences: &Preferences,
) -> Result<()> {
    let dark = if preferences.dark_mode { "enabled" } else { "disabled" };
    let email = if preferences.email_notifications { "on" } else { "off" };
    let sms = if preferences.sms_notifications { "on" } else { "off" };
    store.kv().set_item(DARK_MODE_KEY, dark)?;
    store.kv().set_item(EMAIL_NOTIF_KEY, email)?;
    store.kv().set_item(SMS_NOTIF_KEY, sms)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub email: String,
}

pub fn load_profile<S: KeyValueStore>(store: &RecordStore<S>) -> Result<Profile> {
    Ok(Profile {
        name: read_text(store, PROFILE_NAME_KEY)?.unwrap_or_default(),
        email: read_text(store, PROFILE_EMAIL_KEY)?.unwrap_or_default(),
    })
}

/// Both fields are required; nothing is written when either is blank.
pub fn save_profile<S: KeyValueStore>(store: &RecordStore<S>, profile: &Profile) -> Result<()> {
    let mut errors = ValidationErrors::new();
    if profile.name.trim().is_empty() {
        errors.push(FieldError::missing(Field::Name, REQUIRED_MESSAGE));
    }
    if profile.email.trim().is_empty() {
        errors.push(FieldError::missing(Field::Email, REQUIRED_MESSAGE));
    }
    if !errors.is_empty() {
        return Err(errors.into());
    }
    store.kv().set_item(PROFILE_NAME_KEY, profile.name.trim())?;
    store.kv().set_item(PROFILE_EMAIL_KEY, profile.email.trim())
}

pub fn load_report_filter<S: KeyValueStore>(store: &RecordStore<S>) -> Result<ReportFilter> {
    Ok(store
        .read_json::<ReportFilter>(REPORT_FILTERS_KEY)?
        .unwrap_or_default())
}

pub fn save_report_filter<S: KeyValueStore>(
    store: &RecordStore<S>,
    filter: &ReportFilter,
) -> Result<()> {
    store.write_json(REPORT_FILTERS_KEY, filter)
}
