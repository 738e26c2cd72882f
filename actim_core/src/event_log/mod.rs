//! Bounded, persisted log of usage events and the report derived from it.

mod record;
mod stats;

pub use record::{AnalyticsEvent, AnalyticsLog, EventKind, EventList, MAX_EVENTS};
pub use stats::UsageReport;
