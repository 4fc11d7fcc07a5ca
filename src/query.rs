//! `?id=` handling for the edit page.

use url::form_urlencoded;

use crate::model::{Employee, EmployeeDraft};

pub const ID_PARAM: &str = "id";

/// First non-blank `id` value in a query string, with or without the
/// leading `?`.
pub fn query_id(query: &str) -> Option<String> {
    let query = query.trim().trim_start_matches('?');
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == ID_PARAM)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Record the edit page should load. `None` means an empty form.
pub fn edit_target<'a>(query: &str, records: &'a [Employee]) -> Option<&'a Employee> {
    let id = query_id(query)?;
    records.iter().find(|employee| employee.id.matches_text(&id))
}

/// Form contents for the edit page.
pub fn edit_form(query: &str, records: &[Employee]) -> EmployeeDraft {
    edit_target(query, records)
        .map(EmployeeDraft::from)
        .unwrap_or_default()
}
