//! Create, update and delete employees.
//!
//! Every mutation is a read-modify-persist of the whole `employees`
//! collection followed by an activity write and a `DataChanged` publish.
//! Nothing here is atomic across processes; the last writer wins.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::activity;
use crate::broadcast::{ChangeBus, ChangeEvent};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::{Error, Field, FieldError, Result, ValidationErrors};
use crate::ids::{IdGenerator, IdScheme};
use crate::model::{ActivityKind, ActivitySubject, Employee, EmployeeDraft, EmployeeId, EmployeePatch};
use crate::store::{KeyValueStore, RecordStore};
use crate::validate::{validate_draft, REQUIRED_MESSAGE};

pub struct EmployeeService<S> {
    store: RecordStore<S>,
    bus: Arc<ChangeBus>,
    ids: Box<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    activity_limit: usize,
}

impl<S: KeyValueStore> EmployeeService<S> {
    pub fn new(store: RecordStore<S>, bus: Arc<ChangeBus>) -> Self {
        Self::with_config(store, bus, &Config::default())
    }

    pub fn with_config(store: RecordStore<S>, bus: Arc<ChangeBus>, config: &Config) -> Self {
        Self {
            store,
            bus,
            ids: config.id_scheme.generator(),
            clock: Arc::new(SystemClock),
            activity_limit: config.activity_limit.max(1),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_id_scheme(self, scheme: &IdScheme) -> Self {
        self.with_id_generator(scheme.generator())
    }

    pub fn store(&self) -> &RecordStore<S> {
        &self.store
    }

    pub fn bus(&self) -> &Arc<ChangeBus> {
        &self.bus
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn employees(&self) -> Result<Vec<Employee>> {
        self.store.employees()
    }

    pub fn find(&self, id: &EmployeeId) -> Result<Option<Employee>> {
        Ok(self
            .store
            .employees()?
            .into_iter()
            .find(|employee| &employee.id == id))
    }

    pub fn create_employee(&self, draft: &EmployeeDraft) -> Result<Employee> {
        let fields = validate_draft(draft)?;
        let mut employees = self.store.employee_collection()?;
        let now = self.clock.now();
        let id = self.ids.next_id(&employees.items, now);
        let employee = Employee::from_fields(id, fields, now);

        employees.items.push(employee.clone());
        self.store.save_employees(&employees)?;
        self.log([(ActivityKind::Add, ActivitySubject::from(&employee))])?;
        info!(id = %employee.id, role = %employee.role, "employee created");
        self.publish();
        Ok(employee)
    }

    /// Merges `patch` over the stored record and re-validates the result.
    pub fn update_employee(&self, id: &EmployeeId, patch: &EmployeePatch) -> Result<Employee> {
        let mut employees = self.store.employee_collection()?;
        let Some(index) = employees.items.iter().position(|employee| &employee.id == id) else {
            return Err(Error::NotFound { id: id.clone() });
        };

        let mut draft = EmployeeDraft::from(&employees.items[index]);
        patch.apply_to(&mut draft);
        let fields = validate_draft(&draft)?;

        let employee = &mut employees.items[index];
        employee.assign(fields);
        employee.updated_at = Some(self.clock.now());
        let updated = employee.clone();

        self.store.save_employees(&employees)?;
        self.log([(ActivityKind::Edit, ActivitySubject::from(&updated))])?;
        info!(id = %updated.id, "employee updated");
        self.publish();
        Ok(updated)
    }

    /// The form page's submit: edits when `edit_id` names a stored record,
    /// creates otherwise.
    pub fn save_employee(
        &self,
        edit_id: Option<&EmployeeId>,
        draft: &EmployeeDraft,
    ) -> Result<Employee> {
        match edit_id {
            Some(id) if self.find(id)?.is_some() => {
                self.update_employee(id, &EmployeePatch::from(draft.clone()))
            }
            _ => self.create_employee(draft),
        }
    }

    pub fn change_role(&self, id: &EmployeeId, role: &str) -> Result<Employee> {
        let role = role.trim();
        if role.is_empty() {
            return Err(ValidationErrors::from(FieldError::missing(Field::Role, REQUIRED_MESSAGE)).into());
        }
        let mut employees = self.store.employee_collection()?;
        let Some(employee) = employees.items.iter_mut().find(|employee| &employee.id == id) else {
            return Err(Error::NotFound { id: id.clone() });
        };
        employee.role = role.to_string();
        employee.updated_at = Some(self.clock.now());
        let updated = employee.clone();

        self.store.save_employees(&employees)?;
        self.log([(ActivityKind::RoleChange, ActivitySubject::from(&updated))])?;
        info!(id = %updated.id, role, "employee role changed");
        self.publish();
        Ok(updated)
    }

    /// Removes the record and returns it. An unknown id still rewrites the
    /// collection but logs nothing and returns `None`.
    pub fn delete_employee(&self, id: &EmployeeId) -> Result<Option<Employee>> {
        let mut employees = self.store.employee_collection()?;
        let removed = employees
            .items
            .iter()
            .position(|employee| &employee.id == id)
            .map(|index| employees.items.remove(index));

        self.store.save_employees(&employees)?;
        match &removed {
            Some(employee) => {
                self.log([(ActivityKind::Delete, ActivitySubject::from(employee))])?;
                info!(id = %employee.id, "employee deleted");
            }
            None => debug!(%id, "delete of unknown employee"),
        }
        self.publish();
        Ok(removed)
    }

    /// Removes every listed record with one persist and one publish.
    pub fn bulk_delete(&self, ids: &[EmployeeId]) -> Result<usize> {
        let wanted: HashSet<&EmployeeId> = ids.iter().collect();
        let mut employees = self.store.employee_collection()?;
        let (removed, kept): (Vec<Employee>, Vec<Employee>) = std::mem::take(&mut employees.items)
            .into_iter()
            .partition(|employee| wanted.contains(&employee.id));
        employees.items = kept;

        self.store.save_employees(&employees)?;
        if !removed.is_empty() {
            self.log(
                removed
                    .iter()
                    .map(|employee| (ActivityKind::Delete, ActivitySubject::from(employee))),
            )?;
        }
        info!(count = removed.len(), "employees bulk deleted");
        self.publish();
        Ok(removed.len())
    }

    fn log<I>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (ActivityKind, ActivitySubject)>,
    {
        let mut log = self.store.activity_collection()?;
        let now = self.clock.now();
        for (kind, subject) in entries {
            activity::record(&mut log.items, kind, subject, now, self.activity_limit);
        }
        log.truncate(self.activity_limit.max(1));
        self.store.save_activities(&log)
    }

    fn publish(&self) {
        let notified = self.bus.publish(&ChangeEvent::DataChanged);
        debug!(notified, "published data change");
    }
}
