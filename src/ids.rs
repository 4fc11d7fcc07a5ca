//! Identifier assignment for new records.
//!
//! The add form hands out padded sequential codes (`EMP0001`), the quick-add
//! path hands out millisecond timestamps. Both are kept; configuration picks
//! which one a service uses.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Employee, EmployeeId};

pub const DEFAULT_ID_PREFIX: &str = "EMP";
pub const DEFAULT_ID_WIDTH: usize = 4;

pub trait IdGenerator: Send + Sync {
    /// Returns an id not used by any of `existing`.
    fn next_id(&self, existing: &[Employee], now: DateTime<Utc>) -> EmployeeId;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdScheme {
    Sequential { prefix: String, width: usize },
    Timestamp,
}

impl Default for IdScheme {
    fn default() -> Self {
        IdScheme::Sequential {
            prefix: DEFAULT_ID_PREFIX.to_string(),
            width: DEFAULT_ID_WIDTH,
        }
    }
}

impl IdScheme {
    pub fn generator(&self) -> Box<dyn IdGenerator> {
        match self {
            IdScheme::Sequential { prefix, width } => Box::new(SequentialIds::new(prefix, *width)),
            IdScheme::Timestamp => Box::new(TimestampIds),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    width: usize,
}

impl SequentialIds {
    pub fn new(prefix: &str, width: usize) -> Self {
        Self {
            prefix: prefix.to_string(),
            width: width.max(1),
        }
    }

    fn sequence_of(&self, id: &EmployeeId) -> Option<u64> {
        match id {
            EmployeeId::Code(code) => {
                let digits = code.strip_prefix(self.prefix.as_str())?;
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                digits.parse::<u64>().ok()
            }
            EmployeeId::Number(_) => None,
        }
    }
}

impl IdGenerator for SequentialIds {
    /// One past the highest code seen, so deleting the last record never
    /// hands its code to someone else while gaps stay unused. Once the
    /// sequence is exhausted new records get timestamp ids.
    fn next_id(&self, existing: &[Employee], now: DateTime<Utc>) -> EmployeeId {
        let last = existing
            .iter()
            .filter_map(|employee| self.sequence_of(&employee.id))
            .max()
            .unwrap_or(0);
        let Some(next) = last.checked_add(1) else {
            return TimestampIds.next_id(existing, now);
        };
        let width = self.width;
        EmployeeId::Code(format!("{}{:0width$}", self.prefix, next))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampIds;

impl IdGenerator for TimestampIds {
    fn next_id(&self, existing: &[Employee], now: DateTime<Utc>) -> EmployeeId {
        let taken: HashSet<i64> = existing
            .iter()
            .filter_map(|employee| match employee.id {
                EmployeeId::Number(number) => Some(number),
                EmployeeId::Code(_) => None,
            })
            .collect();
        let mut candidate = now.timestamp_millis();
        while taken.contains(&candidate) {
            candidate += 1;
        }
        EmployeeId::Number(candidate)
    }
}
