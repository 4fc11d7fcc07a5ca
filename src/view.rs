//! Filter, sort and paginate the employee list.
//!
//! Everything here is a pure function of the records and the controls; the
//! table widget state lives in [`crate::live`].

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::Employee;

pub const ALL_ROLES: &str = "all";
pub const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortColumn {
    Id,
    Name,
    Email,
    Phone,
    Role,
    Department,
    StartDate,
    Salary,
    Status,
    CreatedAt,
}

impl SortColumn {
    /// Reads a table header's `data-column` value.
    pub fn parse(column: &str) -> Option<Self> {
        match column.trim() {
            "id" => Some(SortColumn::Id),
            "name" => Some(SortColumn::Name),
            "email" => Some(SortColumn::Email),
            "phone" => Some(SortColumn::Phone),
            "role" => Some(SortColumn::Role),
            "department" => Some(SortColumn::Department),
            "startDate" | "hireDate" => Some(SortColumn::StartDate),
            "salary" => Some(SortColumn::Salary),
            "status" => Some(SortColumn::Status),
            "createdAt" => Some(SortColumn::CreatedAt),
            _ => None,
        }
    }

    /// Ascending order for this column. Missing values sort first.
    pub fn compare(self, a: &Employee, b: &Employee) -> Ordering {
        match self {
            SortColumn::Id => a.id.cmp(&b.id),
            SortColumn::Name => a.name.cmp(&b.name),
            SortColumn::Email => a.email.cmp(&b.email),
            SortColumn::Phone => a.phone.cmp(&b.phone),
            SortColumn::Role => a.role.cmp(&b.role),
            SortColumn::Department => a.department.cmp(&b.department),
            SortColumn::StartDate => a.start_date.cmp(&b.start_date),
            SortColumn::Salary => match (a.salary, b.salary) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortColumn::Status => a.status.cmp(&b.status),
            SortColumn::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SortState {
    pub column: Option<SortColumn>,
    pub ascending: bool,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: None,
            ascending: true,
        }
    }
}

impl SortState {
    pub fn by(column: SortColumn, ascending: bool) -> Self {
        Self {
            column: Some(column),
            ascending,
        }
    }

    /// Header click: the same column flips direction, a new column starts
    /// ascending.
    pub fn toggle(&mut self, column: SortColumn) {
        if self.column == Some(column) {
            self.ascending = !self.ascending;
        } else {
            self.column = Some(column);
            self.ascending = true;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewControls {
    pub search: String,
    pub role: String,
    pub sort: SortState,
    /// 1-based; clamped when the view is computed.
    pub page: usize,
}

impl Default for ViewControls {
    fn default() -> Self {
        Self {
            search: String::new(),
            role: ALL_ROLES.to_string(),
            sort: SortState::default(),
            page: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageButton {
    pub number: usize,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewPage {
    pub rows: Vec<Employee>,
    pub total_filtered: usize,
    pub total_pages: usize,
    pub page: usize,
    pub pages: Vec<PageButton>,
}

/// Case-insensitive substring over name, email and role. `needle` must
/// already be lowercase.
pub fn matches_search(employee: &Employee, needle: &str) -> bool {
    needle.is_empty()
        || employee.name.to_lowercase().contains(needle)
        || employee.email.to_lowercase().contains(needle)
        || employee.role.to_lowercase().contains(needle)
}

pub fn matches_role(employee: &Employee, role: &str) -> bool {
    role == ALL_ROLES || role.is_empty() || employee.role == role
}

pub fn filter_records<'a>(records: &'a [Employee], search: &str, role: &str) -> Vec<&'a Employee> {
    let needle = search.to_lowercase();
    records
        .iter()
        .filter(|employee| matches_search(employee, needle.as_str()))
        .filter(|employee| matches_role(employee, role))
        .collect()
}

/// Stable in both directions: equal keys keep their input order.
pub fn sort_records(rows: &mut [&Employee], sort: SortState) {
    let Some(column) = sort.column else {
        return;
    };
    if sort.ascending {
        rows.sort_by(|a, b| column.compare(a, b));
    } else {
        rows.sort_by(|a, b| column.compare(b, a));
    }
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1))
}

/// Filtered and sorted rows across every page.
pub fn visible_records<'a>(records: &'a [Employee], controls: &ViewControls) -> Vec<&'a Employee> {
    let mut rows = filter_records(records, &controls.search, &controls.role);
    sort_records(&mut rows, controls.sort);
    rows
}

pub fn compute_view(records: &[Employee], controls: &ViewControls, page_size: usize) -> ViewPage {
    let page_size = page_size.max(1);
    let rows = visible_records(records, controls);
    let total_filtered = rows.len();
    let total_pages = total_pages(total_filtered, page_size);
    let page = controls.page.clamp(1, total_pages.max(1));

    let start = (page - 1) * page_size;
    let page_rows: Vec<Employee> = rows
        .into_iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();
    let pages = (1..=total_pages)
        .map(|number| PageButton {
            number,
            active: number == page,
        })
        .collect();

    debug!(
        total = records.len(),
        filtered = total_filtered,
        page,
        total_pages,
        "computed employee view"
    );

    ViewPage {
        rows: page_rows,
        total_filtered,
        total_pages,
        page,
        pages,
    }
}
