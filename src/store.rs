//! Keyed text storage and the typed accessor over it.
//!
//! A [`KeyValueStore`] only moves strings. [`RecordStore`] knows which keys
//! hold which collections and how to decode them. Every write replaces the
//! whole collection.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::{Error, Result};
use crate::model::{ActivityEntry, Employee};

pub const EMPLOYEES_KEY: &str = "employees";
pub const ACTIVITIES_KEY: &str = "employeeActivities";
pub const ROLES_KEY: &str = "employeeRoles";
pub const DEPARTMENTS_KEY: &str = "employeeDepartments";
pub const DARK_MODE_KEY: &str = "darkMode";
pub const EMAIL_NOTIF_KEY: &str = "emailNotif";
pub const SMS_NOTIF_KEY: &str = "smsNotif";
pub const PROFILE_NAME_KEY: &str = "profileName";
pub const PROFILE_EMAIL_KEY: &str = "profileEmail";
pub const REPORT_FILTERS_KEY: &str = "reportFilters";

/// Keys whose writes other views care about.
pub const WATCHED_KEYS: [&str; 4] = [EMPLOYEES_KEY, ACTIVITIES_KEY, ROLES_KEY, DEPARTMENTS_KEY];

pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under `root`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.as_path())?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let name = sanitize_key(key)?;
        Ok(self.root.join(format!("{name}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        write_text_file(self.path_for(key)?, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Keys become file names, so they must be a single plain path component.
fn sanitize_key(key: &str) -> Result<String> {
    let mut components = Path::new(key).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) => {
            let name = part.to_string_lossy().to_string();
            if name
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
            {
                Ok(name)
            } else {
                Err(Error::InvalidKey(key.to_string()))
            }
        }
        _ => Err(Error::InvalidKey(key.to_string())),
    }
}

pub(crate) fn write_text_file(path: PathBuf, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

/// A stored array split into the entries that decoded and the ones that
/// did not.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    pub items: Vec<T>,
    unreadable: Vec<serde_json::Value>,
}

impl<T> Collection<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            unreadable: Vec::new(),
        }
    }

    pub fn unreadable(&self) -> &[serde_json::Value] {
        &self.unreadable
    }

    pub fn len(&self) -> usize {
        self.items.len() + self.unreadable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keeps at most `len` entries. Unreadable entries are written last, so
    /// they go first.
    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
        self.unreadable.truncate(len - self.items.len());
    }
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Typed view of the keyed store.
///
/// Reads never fail on content: an absent key or an unparsable blob reads
/// as empty. Only the underlying store's own I/O errors propagate.
#[derive(Debug, Clone)]
pub struct RecordStore<S> {
    kv: S,
}

impl<S: KeyValueStore> RecordStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    /// Decodes the value under `key`; `None` when absent or unparsable.
    pub fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(text) = self.kv.get_item(key)? else {
            return Ok(None);
        };
        match serde_json::from_str::<T>(text.as_str()) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(key, error = %err, "discarding unparsable stored value");
                Ok(None)
            }
        }
    }

    pub fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.kv.set_item(key, text.as_str())
    }

    /// Reads an array element by element. Elements that fail to decode are
    /// kept raw in the returned [`Collection`] so a later write puts them
    /// back untouched.
    pub fn read_collection<T: DeserializeOwned>(&self, key: &str) -> Result<Collection<T>> {
        let Some(values) = self.read_json::<Vec<serde_json::Value>>(key)? else {
            return Ok(Collection::default());
        };
        let mut collection = Collection::default();
        for value in values {
            match serde_json::from_value::<T>(value.clone()) {
                Ok(item) => collection.items.push(item),
                Err(err) => {
                    warn!(key, error = %err, "keeping unreadable stored entry as is");
                    collection.unreadable.push(value);
                }
            }
        }
        Ok(collection)
    }

    /// Writes the decoded items followed by the unreadable entries.
    pub fn write_collection<T: Serialize>(&self, key: &str, collection: &Collection<T>) -> Result<()> {
        let mut values = Vec::with_capacity(collection.items.len() + collection.unreadable.len());
        for item in &collection.items {
            values.push(serde_json::to_value(item)?);
        }
        values.extend(collection.unreadable.iter().cloned());
        self.write_json(key, &values)
    }

    pub fn employees(&self) -> Result<Vec<Employee>> {
        Ok(self.employee_collection()?.items)
    }

    pub fn employee_collection(&self) -> Result<Collection<Employee>> {
        self.read_collection(EMPLOYEES_KEY)
    }

    pub fn save_employees(&self, employees: &Collection<Employee>) -> Result<()> {
        self.write_collection(EMPLOYEES_KEY, employees)
    }

    pub fn activities(&self) -> Result<Vec<ActivityEntry>> {
        Ok(self.activity_collection()?.items)
    }

    pub fn activity_collection(&self) -> Result<Collection<ActivityEntry>> {
        self.read_collection(ACTIVITIES_KEY)
    }

    pub fn save_activities(&self, activities: &Collection<ActivityEntry>) -> Result<()> {
        self.write_collection(ACTIVITIES_KEY, activities)
    }

    pub fn string_list(&self, key: &str) -> Result<Option<Vec<String>>> {
        self.read_json::<Vec<String>>(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_garbage_read_as_empty() {
        let kv = MemoryStore::new();
        kv.set_item(ACTIVITIES_KEY, "{not json").unwrap();
        let store = RecordStore::new(kv);
        assert!(store.employees().unwrap().is_empty());
        assert!(store.activities().unwrap().is_empty());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let kv = MemoryStore::new();
        kv.set_item(
            EMPLOYEES_KEY,
            r#"[{"id":"EMP0001","name":"Asha"},{"name":"no id"},{"id":2,"name":"Ravi"}]"#,
        )
        .unwrap();
        let store = RecordStore::new(kv);
        let employees = store.employees().unwrap();
        assert_eq!(employees.len(), 2);
        assert_eq!(employees[1].name, "Ravi");
    }

    #[test]
    fn unreadable_entries_survive_a_rewrite() {
        let kv = MemoryStore::new();
        kv.set_item(
            EMPLOYEES_KEY,
            r#"[{"id":"EMP0001","name":"Asha"},{"name":"no id"},{"id":2,"name":"Ravi"}]"#,
        )
        .unwrap();
        let store = RecordStore::new(kv);

        let mut employees = store.employee_collection().unwrap();
        assert_eq!(employees.unreadable().len(), 1);
        employees.items.retain(|employee| employee.name != "Asha");
        store.save_employees(&employees).unwrap();

        let stored: Vec<serde_json::Value> =
            serde_json::from_str(&store.kv().get_item(EMPLOYEES_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0]["name"], "Ravi");
        assert_eq!(stored[1], serde_json::json!({"name": "no id"}));
    }

    #[test]
    fn keys_cannot_escape_the_root() {
        assert!(sanitize_key("employees").is_ok());
        assert!(sanitize_key("../employees").is_err());
        assert!(sanitize_key("a/b").is_err());
        assert!(sanitize_key("").is_err());
        assert!(sanitize_key("emp.json").is_err());
    }

    #[test]
    fn file_store_round_trips_text() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileStore::open(dir.path().join("data")).unwrap();
        assert_eq!(kv.get_item(EMPLOYEES_KEY).unwrap(), None);
        kv.set_item(EMPLOYEES_KEY, "[]").unwrap();
        assert_eq!(kv.get_item(EMPLOYEES_KEY).unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("data").join("employees.json").is_file());
        kv.remove_item(EMPLOYEES_KEY).unwrap();
        assert_eq!(kv.get_item(EMPLOYEES_KEY).unwrap(), None);
        assert!(matches!(
            kv.get_item("../x"),
            Err(Error::InvalidKey(_))
        ));
    }
}
