//! # freebusy-engine
//!
//! Reconciles two independently sourced views of a person's calendar: the
//! aggregate free/busy timeline and the list of individual appointments. The
//! result is one busy-time timeline per user, where every busy block carries
//! the appointments responsible for it.
//!
//! ## Modules
//!
//! - [`range`] — `TimeRange`, the unbounded sentinel, timezone-aware parsing
//! - [`model`] — appointments, free/busy lists, blocks, timelines, users
//! - [`interval`] — augmented interval tree for overlap queries
//! - [`merge`] — per-user free/busy + appointment reconciliation
//! - [`registry`] — users keyed by lower-cased email
//! - [`source`] — traits for the remote free/busy, appointment, and directory services
//! - [`lookup`] — concurrent per-user appointment retrieval
//! - [`service`] — batch orchestration (`CalendarBridge`)
//! - [`config`] — tunables
//! - [`error`] — error types

pub mod config;
pub mod error;
pub mod interval;
pub mod lookup;
pub mod merge;
pub mod model;
pub mod range;
pub mod registry;
pub mod service;
pub mod source;

pub use config::BridgeConfig;
pub use error::{BridgeError, FetchError};
pub use interval::IntervalTree;
pub use merge::merge_free_busy_with_appointments;
pub use model::{
    AccessLevel, Appointment, BusyStatus, BusyTimeBlock, ClassifiedFreeBusy, MeetingStatus,
    ResponseStatus, Timeline, User,
};
pub use range::TimeRange;
pub use registry::{Admission, UserRegistry};
pub use service::CalendarBridge;
pub use source::{AppointmentSource, Directory, FreeBusySource};
