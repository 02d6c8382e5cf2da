//! The records that flow between backends and the merge engine.
//!
//! Files are numbered in dependency order: identifiers first, then the notification record,
//! then the change events that describe mutations to it.

#[path = "1-ids.rs"]
mod ids;
pub use ids::*;

#[path = "2-notification.rs"]
mod notification;
pub use notification::*;

#[path = "3-change.rs"]
mod change;
pub use change::*;
