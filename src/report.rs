//! Dashboard and report figures derived from the employee list.
//!
//! All of it is recomputed on demand from a snapshot; nothing is cached.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::format::month_label;
use crate::model::{Employee, Status};
use crate::view::{matches_role, matches_search, ALL_ROLES};

/// Longest trailing window `hires_by_month` will build.
pub const MAX_HIRES_WINDOW_MONTHS: u32 = 120;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    pub departments: usize,
    pub active: usize,
    pub inactive: usize,
}

pub fn summarize<'a, I>(records: I) -> Summary
where
    I: IntoIterator<Item = &'a Employee>,
{
    let mut summary = Summary::default();
    let mut departments = HashSet::new();
    for employee in records {
        summary.total += 1;
        departments.insert(employee.department.as_str());
        match employee.status {
            Status::Active => summary.active += 1,
            Status::Inactive => summary.inactive += 1,
        }
    }
    summary.departments = departments.len();
    summary
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleCount {
    pub role: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleMembers {
    pub role: String,
    pub members: Vec<String>,
}

/// Members per role, roles in first-seen order.
pub fn role_members<'a, I>(records: I) -> Vec<RoleMembers>
where
    I: IntoIterator<Item = &'a Employee>,
{
    let mut out: Vec<RoleMembers> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for employee in records {
        let slot = *index.entry(employee.role.as_str()).or_insert_with(|| {
            out.push(RoleMembers {
                role: employee.role.clone(),
                members: Vec::new(),
            });
            out.len() - 1
        });
        out[slot].members.push(employee.name.clone());
    }
    out
}

pub fn role_counts<'a, I>(records: I) -> Vec<RoleCount>
where
    I: IntoIterator<Item = &'a Employee>,
{
    role_members(records)
        .into_iter()
        .map(|group| RoleCount {
            count: group.members.len(),
            role: group.role,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub label: String,
    pub year: i32,
    pub month: u32,
    pub count: usize,
}

fn months_back(year: i32, month: u32, back: u32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Hires in each of the `months` calendar months ending with the one
/// containing `today`, oldest first, empty months included.
pub fn hires_by_month<'a, I>(records: I, today: NaiveDate, months: u32) -> Vec<MonthCount>
where
    I: IntoIterator<Item = &'a Employee>,
{
    let months = months.clamp(1, MAX_HIRES_WINDOW_MONTHS);
    let mut buckets: Vec<MonthCount> = (0..months)
        .rev()
        .map(|back| {
            let (year, month) = months_back(today.year(), today.month(), back);
            MonthCount {
                label: month_label(year, month),
                year,
                month,
                count: 0,
            }
        })
        .collect();
    for date in records.into_iter().filter_map(|employee| employee.start_date) {
        if let Some(bucket) = buckets
            .iter_mut()
            .find(|bucket| bucket.year == date.year() && bucket.month == date.month())
        {
            bucket.count += 1;
        }
    }
    buckets
}

/// Dashboard "new hires": start date in the same month and year as `today`.
pub fn hires_in_month<'a, I>(records: I, today: NaiveDate) -> usize
where
    I: IntoIterator<Item = &'a Employee>,
{
    records
        .into_iter()
        .filter_map(|employee| employee.start_date)
        .filter(|date| date.year() == today.year() && date.month() == today.month())
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SalaryStats {
    pub count: usize,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
}

/// Records without a salary are left out rather than counted as zero.
pub fn salary_stats<'a, I>(records: I) -> Option<SalaryStats>
where
    I: IntoIterator<Item = &'a Employee>,
{
    let salaries: Vec<f64> = records
        .into_iter()
        .filter_map(|employee| employee.salary)
        .collect();
    if salaries.is_empty() {
        return None;
    }
    let sum: f64 = salaries.iter().sum();
    Some(SalaryStats {
        count: salaries.len(),
        mean: sum / salaries.len() as f64,
        max: salaries.iter().copied().fold(f64::MIN, f64::max),
        min: salaries.iter().copied().fold(f64::MAX, f64::min),
    })
}

/// Latest `n` by start date. Undated records come last, ties keep input
/// order.
pub fn recent_hires<'a, I>(records: I, n: usize) -> Vec<Employee>
where
    I: IntoIterator<Item = &'a Employee>,
{
    let mut rows: Vec<&Employee> = records.into_iter().collect();
    rows.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    rows.into_iter().take(n).cloned().collect()
}

/// Report page filters, stored under `reportFilters`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportFilter {
    pub search: String,
    pub role: Option<String>,
    pub department: Option<String>,
    pub year: Option<i32>,
    pub hired_within_days: Option<i64>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
}

fn selected(choice: &Option<String>) -> Option<&str> {
    choice
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty() && *value != ALL_ROLES)
}

impl ReportFilter {
    pub fn matches(&self, employee: &Employee, today: NaiveDate) -> bool {
        let needle = self.search.to_lowercase();
        if !matches_search(employee, needle.as_str()) {
            return false;
        }
        if let Some(role) = selected(&self.role) {
            if !matches_role(employee, role) {
                return false;
            }
        }
        if let Some(department) = selected(&self.department) {
            if employee.department != department {
                return false;
            }
        }
        if let Some(year) = self.year {
            if employee.start_date.map(|date| date.year()) != Some(year) {
                return false;
            }
        }
        if let Some(days) = self.hired_within_days {
            // A window reaching past the calendar has no lower bound.
            let earliest = u64::try_from(days.max(0))
                .ok()
                .and_then(|days| today.checked_sub_days(Days::new(days)));
            match employee.start_date {
                Some(date) if earliest.map_or(true, |earliest| date >= earliest) && date <= today => {}
                _ => return false,
            }
        }
        if self.salary_min.is_some() || self.salary_max.is_some() {
            let Some(salary) = employee.salary else {
                return false;
            };
            if self.salary_min.is_some_and(|min| salary < min)
                || self.salary_max.is_some_and(|max| salary > max)
            {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, records: &'a [Employee], today: NaiveDate) -> Vec<&'a Employee> {
        records
            .iter()
            .filter(|employee| self.matches(employee, today))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub summary: Summary,
    pub role_counts: Vec<RoleCount>,
    pub role_members: Vec<RoleMembers>,
    pub hires_by_month: Vec<MonthCount>,
    pub salary: Option<SalaryStats>,
    pub recent_hires: Vec<Employee>,
}

impl Report {
    pub fn build(
        records: &[Employee],
        filter: &ReportFilter,
        today: NaiveDate,
        months: u32,
        recent: usize,
    ) -> Self {
        let rows = filter.apply(records, today);
        let rows = || rows.iter().copied();
        Self {
            summary: summarize(rows()),
            role_counts: role_counts(rows()),
            role_members: role_members(rows()),
            hires_by_month: hires_by_month(rows(), today, months),
            salary: salary_stats(rows()),
            recent_hires: recent_hires(rows(), recent),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_employees: usize,
    pub departments: usize,
    pub new_hires: usize,
}

impl DashboardStats {
    pub fn compute(records: &[Employee], today: NaiveDate) -> Self {
        let summary = summarize(records);
        Self {
            total_employees: summary.total,
            departments: summary.departments,
            new_hires: hires_in_month(records, today),
        }
    }
}

/// Dashboard search box: name, role or department, case-insensitive.
pub fn quick_search<'a>(records: &'a [Employee], query: &str) -> Vec<&'a Employee> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    records
        .iter()
        .filter(|employee| {
            employee.name.to_lowercase().contains(&needle)
                || employee.role.to_lowercase().contains(&needle)
                || employee.department.to_lowercase().contains(&needle)
        })
        .collect()
}
