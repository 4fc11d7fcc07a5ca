//! Detects writes made by another window or process.
//!
//! Each watched key's stored text is reduced to a SHA-256 digest; a poll
//! compares fresh digests against the last ones seen and reports the keys
//! that moved.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::broadcast::{ChangeBus, ChangeEvent};
use crate::error::Result;
use crate::store::KeyValueStore;

pub struct StorageWatcher<S> {
    kv: S,
    keys: Vec<String>,
    digests: HashMap<String, Option<Vec<u8>>>,
}

impl<S: KeyValueStore> StorageWatcher<S> {
    /// Starts watching `keys`; the current contents count as already seen.
    pub fn new<I, K>(kv: S, keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut watcher = Self {
            kv,
            keys: keys.into_iter().map(Into::into).collect(),
            digests: HashMap::new(),
        };
        watcher.prime()?;
        Ok(watcher)
    }

    /// Records the current contents without reporting anything, used after
    /// this process wrote the store itself.
    pub fn prime(&mut self) -> Result<()> {
        for key in &self.keys {
            let digest = digest_of(self.kv.get_item(key)?);
            self.digests.insert(key.clone(), digest);
        }
        Ok(())
    }

    /// Keys whose content differs from the previous poll.
    pub fn poll(&mut self) -> Result<Vec<String>> {
        let mut changed = Vec::new();
        for key in &self.keys {
            let digest = digest_of(self.kv.get_item(key)?);
            let previous = self.digests.insert(key.clone(), digest.clone());
            if previous.as_ref() != Some(&digest) {
                changed.push(key.clone());
            }
        }
        Ok(changed)
    }

    /// Polls and publishes one `StorageChanged` per changed key.
    pub fn poll_and_publish(&mut self, bus: &ChangeBus) -> Result<usize> {
        let changed = self.poll()?;
        for key in &changed {
            bus.publish(&ChangeEvent::StorageChanged { key: key.clone() });
        }
        Ok(changed.len())
    }
}

fn digest_of(text: Option<String>) -> Option<Vec<u8>> {
    text.map(|text| Sha256::digest(text.as_bytes()).to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FileStore, MemoryStore, EMPLOYEES_KEY, WATCHED_KEYS};
    use std::sync::{Arc, Mutex};

    #[test]
    fn reports_only_keys_that_changed() {
        let kv = Arc::new(MemoryStore::new());
        kv.set_item(EMPLOYEES_KEY, "[]").unwrap();
        let mut watcher = StorageWatcher::new(Arc::clone(&kv), WATCHED_KEYS).unwrap();
        assert!(watcher.poll().unwrap().is_empty());

        kv.set_item(EMPLOYEES_KEY, r#"[{"id":1}]"#).unwrap();
        assert_eq!(watcher.poll().unwrap(), vec![EMPLOYEES_KEY.to_string()]);
        assert!(watcher.poll().unwrap().is_empty());

        kv.remove_item(EMPLOYEES_KEY).unwrap();
        assert_eq!(watcher.poll().unwrap(), vec![EMPLOYEES_KEY.to_string()]);
    }

    #[test]
    fn prime_swallows_own_writes() {
        let kv = Arc::new(MemoryStore::new());
        let mut watcher = StorageWatcher::new(Arc::clone(&kv), [EMPLOYEES_KEY]).unwrap();
        kv.set_item(EMPLOYEES_KEY, "[]").unwrap();
        watcher.prime().unwrap();
        assert!(watcher.poll().unwrap().is_empty());
    }

    #[test]
    fn sees_writes_from_a_second_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let ours = FileStore::open(dir.path()).unwrap();
        let theirs = FileStore::open(dir.path()).unwrap();
        let mut watcher = StorageWatcher::new(ours, WATCHED_KEYS).unwrap();

        let bus = ChangeBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

        theirs.set_item(EMPLOYEES_KEY, "[]").unwrap();
        assert_eq!(watcher.poll_and_publish(&bus).unwrap(), 1);
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[ChangeEvent::StorageChanged {
                key: EMPLOYEES_KEY.to_string()
            }]
        );
    }
}
