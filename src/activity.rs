//! Append-only activity feed, newest first and capped.

use chrono::{DateTime, Utc};

use crate::model::{ActivityEntry, ActivityKind, ActivitySubject};

pub const ACTIVITY_LIMIT: usize = 100;

/// Id for a new head entry: the current millisecond, pushed past the head
/// so ids stay strictly increasing even within one millisecond.
pub fn next_activity_id(log: &[ActivityEntry], now: DateTime<Utc>) -> i64 {
    let millis = now.timestamp_millis();
    match log.first() {
        Some(head) if head.id >= millis => head.id.saturating_add(1),
        _ => millis,
    }
}

/// Puts a new entry at the head and drops whatever falls past `limit`.
pub fn record(
    log: &mut Vec<ActivityEntry>,
    kind: ActivityKind,
    subject: ActivitySubject,
    now: DateTime<Utc>,
    limit: usize,
) {
    let entry = ActivityEntry {
        id: next_activity_id(log, now),
        kind,
        data: subject,
        timestamp: now,
    };
    log.insert(0, entry);
    log.truncate(limit.max(1));
}

pub fn filter(log: &[ActivityEntry], kind: Option<ActivityKind>) -> Vec<&ActivityEntry> {
    log.iter()
        .filter(|entry| kind.map_or(true, |kind| entry.kind == kind))
        .collect()
}

impl ActivityEntry {
    /// Feed line for this entry.
    pub fn message(&self) -> String {
        let ActivitySubject { name, role } = &self.data;
        match self.kind {
            ActivityKind::Add => format!("{name} was added as {role}"),
            ActivityKind::Edit => format!("{name}'s information was updated"),
            ActivityKind::Delete => format!("Employee {name} was removed"),
            ActivityKind::RoleChange => format!("{name}'s role changed to {role}"),
        }
    }

    pub fn icon(&self) -> &'static str {
        match self.kind {
            ActivityKind::Add => "➕",
            ActivityKind::Edit => "✏️",
            ActivityKind::Delete => "🗑️",
            ActivityKind::RoleChange => "👥",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn subject(name: &str) -> ActivitySubject {
        ActivitySubject {
            name: name.to_string(),
            role: "Analyst".to_string(),
        }
    }

    #[test]
    fn newest_first_and_capped() {
        let start = Utc::now();
        let mut log = Vec::new();
        for i in 0..150 {
            record(
                &mut log,
                ActivityKind::Add,
                subject(&format!("E{i}")),
                start + Duration::seconds(i),
                ACTIVITY_LIMIT,
            );
            assert!(log.len() <= ACTIVITY_LIMIT);
            assert_eq!(log[0].data.name, format!("E{i}"));
        }
        assert_eq!(log.len(), ACTIVITY_LIMIT);
        assert_eq!(log.last().unwrap().data.name, "E50");
    }

    #[test]
    fn ids_increase_within_one_millisecond() {
        let now = Utc::now();
        let mut log = Vec::new();
        record(&mut log, ActivityKind::Add, subject("A"), now, ACTIVITY_LIMIT);
        record(&mut log, ActivityKind::Delete, subject("B"), now, ACTIVITY_LIMIT);
        assert!(log[0].id > log[1].id);
    }

    #[test]
    fn messages_and_filtering() {
        let now = Utc::now();
        let mut log = Vec::new();
        record(&mut log, ActivityKind::Add, subject("Asha"), now, ACTIVITY_LIMIT);
        record(&mut log, ActivityKind::RoleChange, subject("Asha"), now, ACTIVITY_LIMIT);
        record(&mut log, ActivityKind::Delete, subject("Ravi"), now, ACTIVITY_LIMIT);

        assert_eq!(log[0].message(), "Employee Ravi was removed");
        assert_eq!(log[1].message(), "Asha's role changed to Analyst");
        assert_eq!(log[2].message(), "Asha was added as Analyst");

        assert_eq!(filter(&log, None).len(), 3);
        let deletes = filter(&log, Some(ActivityKind::Delete));
        assert_eq!(deletes.len(), 1);
        assert_eq!(deletes[0].data.name, "Ravi");
    }
}
