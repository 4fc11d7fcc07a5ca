//! Employee records, the activity feed and the views built on top of them.
//!
//! Everything lives in a string key-value store ([`store`]). Mutations go
//! through [`service::EmployeeService`], which validates, persists, logs an
//! activity entry and publishes on a [`broadcast::ChangeBus`] so open views
//! can refresh.

pub mod activity;
pub mod broadcast;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod format;
pub mod ids;
pub mod live;
pub mod model;
pub mod notice;
pub mod query;
pub mod report;
pub mod service;
pub mod settings;
pub mod store;
pub mod validate;
pub mod view;
pub mod watch;

pub use broadcast::{ChangeBus, ChangeEvent, Subscription};
pub use config::Config;
pub use error::{Error, Result};
pub use model::{ActivityEntry, ActivityKind, Employee, EmployeeDraft, EmployeeId, EmployeePatch, Status};
pub use service::EmployeeService;
pub use store::{FileStore, KeyValueStore, MemoryStore, RecordStore};
pub use view::{compute_view, SortColumn, SortState, ViewControls, ViewPage};
