//! Page controllers that keep a snapshot of the store and re-read it after
//! a change notification.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use crate::activity;
use crate::broadcast::{ChangeBus, Subscription};
use crate::error::Result;
use crate::export::employees_csv;
use crate::format::time_ago;
use crate::model::{ActivityEntry, ActivityKind, Employee, EmployeeId};
use crate::report::{quick_search, DashboardStats};
use crate::service::EmployeeService;
use crate::store::{KeyValueStore, RecordStore};
use crate::view::{compute_view, visible_records, SortColumn, ViewControls, ViewPage, DEFAULT_PAGE_SIZE};

fn stale_on_change(bus: &Arc<ChangeBus>, stale: &Arc<AtomicBool>) -> Subscription {
    let flag = Arc::clone(stale);
    Subscription::new(bus, move |_| flag.store(true, Ordering::SeqCst))
}

/// The employee list page: search, role filter, sort, pages and a row
/// selection for bulk delete.
#[derive(Debug)]
pub struct EmployeeTable {
    records: Vec<Employee>,
    controls: ViewControls,
    selected: BTreeSet<EmployeeId>,
    page_size: usize,
    stale: Arc<AtomicBool>,
}

impl Default for EmployeeTable {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl EmployeeTable {
    pub fn new(page_size: usize) -> Self {
        Self {
            records: Vec::new(),
            controls: ViewControls::default(),
            selected: BTreeSet::new(),
            page_size: page_size.max(1),
            stale: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Replaces the snapshot. Selected ids that no longer exist are dropped.
    pub fn load<S: KeyValueStore>(&mut self, store: &RecordStore<S>) -> Result<()> {
        self.records = store.employees()?;
        let records = &self.records;
        self.selected
            .retain(|id| records.iter().any(|employee| &employee.id == id));
        self.stale.store(false, Ordering::SeqCst);
        debug!(count = self.records.len(), "employee table loaded");
        Ok(())
    }

    pub fn watch(&self, bus: &Arc<ChangeBus>) -> Subscription {
        stale_on_change(bus, &self.stale)
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    /// Reloads if a change arrived since the last load. Returns whether it did.
    pub fn ensure_fresh<S: KeyValueStore>(&mut self, store: &RecordStore<S>) -> Result<bool> {
        if !self.is_stale() {
            return Ok(false);
        }
        self.load(store)?;
        Ok(true)
    }

    pub fn records(&self) -> &[Employee] {
        &self.records
    }

    pub fn controls(&self) -> &ViewControls {
        &self.controls
    }

    pub fn set_search(&mut self, search: &str) {
        self.controls.search = search.to_string();
        self.controls.page = 1;
    }

    pub fn set_role_filter(&mut self, role: &str) {
        self.controls.role = role.to_string();
        self.controls.page = 1;
    }

    /// Header click: same column flips direction, a new column starts ascending.
    pub fn sort_by(&mut self, column: SortColumn) {
        self.controls.sort.toggle(column);
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.controls.page = page.max(1);
    }

    pub fn view(&self) -> ViewPage {
        compute_view(&self.records, &self.controls, self.page_size)
    }

    pub fn selected(&self) -> &BTreeSet<EmployeeId> {
        &self.selected
    }

    /// Flips one row's checkbox and returns its new state.
    pub fn toggle_select(&mut self, id: &EmployeeId) -> bool {
        if self.selected.remove(id) {
            false
        } else {
            self.selected.insert(id.clone());
            true
        }
    }

    /// Header checkbox: checks or clears every row on the current page.
    pub fn select_all_visible(&mut self, checked: bool) {
        for employee in self.view().rows {
            if checked {
                self.selected.insert(employee.id);
            } else {
                self.selected.remove(&employee.id);
            }
        }
    }

    /// Deletes the selected rows through `service` and reloads.
    pub fn delete_selected<S: KeyValueStore>(
        &mut self,
        service: &EmployeeService<S>,
    ) -> Result<usize> {
        if self.selected.is_empty() {
            return Ok(0);
        }
        let ids: Vec<EmployeeId> = self.selected.iter().cloned().collect();
        let removed = service.bulk_delete(&ids)?;
        self.selected.clear();
        self.load(service.store())?;
        Ok(removed)
    }

    /// List export of every filtered row in view order, not just this page.
    pub fn export_csv(&self) -> String {
        employees_csv(visible_records(&self.records, &self.controls))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: i64,
    pub icon: &'static str,
    pub message: String,
    pub time_ago: String,
}

/// The dashboard: headline numbers, activity feed and quick search.
#[derive(Debug)]
pub struct Dashboard {
    employees: Vec<Employee>,
    activities: Vec<ActivityEntry>,
    activity_filter: Option<ActivityKind>,
    stale: Arc<AtomicBool>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            employees: Vec::new(),
            activities: Vec::new(),
            activity_filter: None,
            stale: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn load<S: KeyValueStore>(&mut self, store: &RecordStore<S>) -> Result<()> {
        self.employees = store.employees()?;
        self.activities = store.activities()?;
        self.stale.store(false, Ordering::SeqCst);
        Ok(())
    }

    pub fn watch(&self, bus: &Arc<ChangeBus>) -> Subscription {
        stale_on_change(bus, &self.stale)
    }

    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    pub fn ensure_fresh<S: KeyValueStore>(&mut self, store: &RecordStore<S>) -> Result<bool> {
        if !self.is_stale() {
            return Ok(false);
        }
        self.load(store)?;
        Ok(true)
    }

    pub fn stats(&self, today: NaiveDate) -> DashboardStats {
        DashboardStats::compute(&self.employees, today)
    }

    /// `None` shows every kind.
    pub fn set_activity_filter(&mut self, kind: Option<ActivityKind>) {
        self.activity_filter = kind;
    }

    pub fn feed(&self, now: DateTime<Utc>) -> Vec<FeedItem> {
        activity::filter(&self.activities, self.activity_filter)
            .into_iter()
            .map(|entry| FeedItem {
                id: entry.id,
                icon: entry.icon(),
                message: entry.message(),
                time_ago: time_ago(entry.timestamp, now),
            })
            .collect()
    }

    pub fn search(&self, query: &str) -> Vec<&Employee> {
        quick_search(&self.employees, query)
    }
}
