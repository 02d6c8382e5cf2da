//! This is a library for keeping a client-side notification list in sync with a real-time backend.
//! It was created for the Orbit club app, so it doesn't include much that was not needed there.
//!
//! Syncing strategy:
//! 1. Each session opens two live channels: one for notifications addressed to the viewer, one for
//!    broadcast notifications. Each channel reports inserts, updates and deletes independently,
//!    in no particular order relative to the other.
//! 2. Every change is folded into a [`merge::MergeEngine`] keyed by notification id. Folding is
//!    idempotent and order-independent per id, so duplicated or reordered events converge.
//! 3. Local actions (mark read, delete) are applied optimistically and then sent through a
//!    [`store::NotificationBackend`]. The round trip comes back as a change event that confirms
//!    or corrects the optimism.
//! 4. Consumers only ever see immutable [`merge::Snapshot`]s.
//!
//! Backends: `supabase` (Postgres + realtime) and `firestore` (document store) behind cargo
//! features, and an always-available in-memory one.

#[cfg(feature = "supabase")]
pub mod supabase;

#[cfg(feature = "firestore")]
pub mod firestore;

pub mod adapter;
pub mod data_model;
pub mod error;
pub mod memory;
pub mod merge;
pub mod session;
pub mod store;
pub mod viewer;

#[cfg(all(test, any(feature = "supabase", feature = "firestore")))]
mod testing;

pub use adapter::{Delivery, StreamAdapter, Subscription, Transport};
pub use error::{ChannelError, Error, TransportError};
pub use merge::{MergeEngine, Snapshot};
pub use session::{Session, SessionConfig};
pub use store::{NotificationBackend, NotificationStore};
pub use viewer::{AdminGrant, AdminRole, SEND_NOTIFICATIONS, Viewer};
