//! # MergeEngine
//! Owns the authoritative notification list for one session.
//!
//! Every write goes through [`MergeEngine::apply`], the two optimistic methods, or
//! [`MergeEngine::reconcile`]. Every read goes through [`MergeEngine::snapshot`], which hands out an
//! immutable copy. `apply` never suspends and never fails: events for the same id fold
//! idempotently regardless of arrival order, and events for different ids touch disjoint keys.
//!
//! Merge rules:
//! - `insert` of a known id folds like an update, except that it cannot un-read a record
//!   (inserts describe creation-time state, e.g. a resend after reconnect).
//! - `update` of an unknown id is an insert.
//! - `update` overwrites everything but `id` and `created_at`. Server state wins over optimism.
//! - `delete` of an unknown id does nothing.
//! - Records tombstoned by an optimistic delete are suppressed until the delete is confirmed or
//!   the tombstone expires.
//!
//! A fetch is not a point-in-time view of the list once it lands: events keep arriving while it
//! is in flight. [`MergeEngine::begin_fetch`] hands out a [`FetchTicket`], and
//! [`MergeEngine::reconcile_fetch`] leaves alone every id an event has touched since then.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use slotmap::SlotMap;

use crate::data_model::{ChangeEvent, DeletedRecord, Notification, NotificationId, Origin, UserId};

pub const DEFAULT_TOMBSTONE_TTL: Duration = Duration::from_secs(30);

slotmap::new_key_type! {
    pub struct ListenerKey;
}

/// One record of the authoritative list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    notification: Notification,
    /// Set by an optimistic mark-read until the server confirms or contradicts it.
    pending_read: bool,
}

impl Entry {
    pub fn notification(&self) -> &Notification {
        &self.notification
    }

    pub fn is_pending(&self) -> bool {
        self.pending_read
    }
}

impl std::ops::Deref for Entry {
    type Target = Notification;

    fn deref(&self) -> &Notification {
        &self.notification
    }
}

/// An immutable view of the authoritative list, sorted by `created_at` descending then `id`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: im::Vector<Entry>,
    unread_count: usize,
    degraded: bool,
}

impl Snapshot {
    pub fn entries(&self) -> &im::Vector<Entry> {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &NotificationId) -> Option<&Entry> {
        self.entries.iter().find(|entry| &entry.notification.id == id)
    }

    /// Unread records across the whole list, not just whatever page is rendered.
    pub fn unread_count(&self) -> usize {
        self.unread_count
    }

    pub fn unread_ids(&self) -> Vec<NotificationId> {
        self.entries
            .iter()
            .filter(|entry| !entry.notification.read)
            .map(|entry| entry.notification.id.clone())
            .collect()
    }

    /// True while at least one channel has failed. The list may be out of date.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

type SortKey = (Reverse<DateTime<Utc>>, NotificationId);

fn sort_key(notification: &Notification) -> SortKey {
    (Reverse(notification.created_at), notification.id.clone())
}

/// Marks when a fetch was issued. See [`MergeEngine::reconcile_fetch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

#[derive(Clone, Copy)]
enum Fold {
    Insert,
    Update,
}

pub struct MergeEngine {
    viewer: UserId,
    entries: HashMap<NotificationId, Entry>,
    order: BTreeSet<SortKey>,
    /// id -> when the tombstone lapses
    tombstones: HashMap<NotificationId, DateTime<Utc>>,
    tombstone_ttl: Duration,
    degraded: BTreeSet<Origin>,
    torn_down: bool,
    /// Bumped by every applied event.
    generation: u64,
    /// id -> generation of the last event about it
    touched: HashMap<NotificationId, u64>,
    /// Fetches issued before this generation are stale.
    reconciled_at: u64,
    current: Snapshot,
    listeners: SlotMap<ListenerKey, Box<dyn FnMut(&Snapshot)>>,
}

impl MergeEngine {
    pub fn new(viewer: UserId) -> Self {
        Self::with_tombstone_ttl(viewer, DEFAULT_TOMBSTONE_TTL)
    }

    pub fn with_tombstone_ttl(viewer: UserId, tombstone_ttl: Duration) -> Self {
        Self {
            viewer,
            entries: HashMap::new(),
            order: BTreeSet::new(),
            tombstones: HashMap::new(),
            tombstone_ttl,
            degraded: BTreeSet::new(),
            torn_down: false,
            generation: 0,
            touched: HashMap::new(),
            reconciled_at: 0,
            current: Snapshot::default(),
            listeners: SlotMap::with_key(),
        }
    }

    pub fn viewer(&self) -> &UserId {
        &self.viewer
    }

    /// Fold one change event into the list. Returns whether the list changed.
    pub fn apply(&mut self, event: ChangeEvent) -> bool {
        if self.torn_down {
            log::debug!(
                "Ignoring {} of {} received after teardown",
                event.op(),
                event.id()
            );
            return false;
        }
        self.expire_tombstones(Utc::now());
        self.generation += 1;
        self.touched.insert(event.id().clone(), self.generation);

        let changed = match event {
            ChangeEvent::Insert(record) => self.fold(record, Fold::Insert),
            ChangeEvent::Update(record) => self.fold(record, Fold::Update),
            ChangeEvent::Delete(DeletedRecord { id }) => {
                if self.tombstones.remove(&id).is_some() {
                    log::debug!("Delete of {id} confirmed");
                }
                self.remove(&id)
            }
        };

        if changed {
            self.publish();
        }
        changed
    }

    /// Decode a `{"op": ..., "record": ...}` value and apply it. Anything else is logged and
    /// ignored.
    pub fn apply_json(&mut self, value: &serde_json::Value) -> bool {
        use serde::Deserialize;

        match ChangeEvent::deserialize(value) {
            Ok(event) => self.apply(event),
            Err(e) => {
                log::warn!("Ignoring malformed change event: {e} in `{value}`");
                false
            }
        }
    }

    fn fold(&mut self, incoming: Notification, fold: Fold) -> bool {
        if incoming.id.as_str().is_empty() {
            log::warn!("Ignoring notification without an id: {incoming:?}");
            return false;
        }
        if !incoming.is_visible_to(&self.viewer) {
            log::warn!(
                "Ignoring notification {} addressed to another user",
                incoming.id
            );
            return false;
        }
        if self.tombstones.contains_key(&incoming.id) {
            log::debug!(
                "Suppressing notification {} while its delete is pending",
                incoming.id
            );
            return false;
        }

        let Some(entry) = self.entries.get_mut(&incoming.id) else {
            self.order.insert(sort_key(&incoming));
            self.entries.insert(
                incoming.id.clone(),
                Entry {
                    notification: incoming,
                    pending_read: false,
                },
            );
            return true;
        };

        // created_at is the sort key and never changes after creation
        let created_at = entry.notification.created_at;
        let merged = match fold {
            Fold::Update => Entry {
                notification: Notification {
                    created_at,
                    ..incoming
                },
                pending_read: false,
            },
            Fold::Insert => {
                let read = entry.notification.read || incoming.read;
                Entry {
                    pending_read: entry.pending_read && !incoming.read,
                    notification: Notification {
                        created_at,
                        read,
                        ..incoming
                    },
                }
            }
        };

        if *entry == merged {
            return false;
        }
        if entry.pending_read && !merged.pending_read {
            if merged.notification.read {
                log::debug!("Mark-read of {} confirmed", merged.notification.id);
            } else {
                log::info!(
                    "Server state for {} overrides an optimistic mark-read",
                    merged.notification.id
                );
            }
        }
        *entry = merged;
        true
    }

    fn remove(&mut self, id: &NotificationId) -> bool {
        match self.entries.remove(id) {
            Some(entry) => {
                self.order.remove(&sort_key(&entry.notification));
                true
            }
            None => false,
        }
    }

    /// Show `id` as read right away. The record stays pending until an update event arrives.
    pub fn optimistic_mark_read(&mut self, id: &NotificationId) -> bool {
        if self.torn_down {
            return false;
        }
        let Some(entry) = self.entries.get_mut(id) else {
            log::debug!("Cannot mark unknown notification {id} as read");
            return false;
        };
        if entry.notification.read {
            return false;
        }
        entry.notification.read = true;
        entry.pending_read = true;
        self.publish();
        true
    }

    /// Hide `id` right away and suppress re-inserts until the delete is confirmed or the
    /// tombstone lapses. Returns whether a visible record was removed.
    pub fn optimistic_delete(&mut self, id: &NotificationId) -> bool {
        if self.torn_down {
            return false;
        }
        let now = Utc::now();
        let lapses_at = chrono::Duration::from_std(self.tombstone_ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.tombstones.insert(id.clone(), lapses_at);

        let removed = self.remove(id);
        if removed {
            self.publish();
        }
        removed
    }

    /// Replace the list with a full server fetch taken just now. Local optimism is discarded;
    /// tombstones stay.
    pub fn reconcile(&mut self, records: Vec<Notification>) {
        let ticket = self.begin_fetch();
        self.reconcile_fetch(ticket, records);
    }

    /// Call right before issuing a fetch whose result goes to [`MergeEngine::reconcile_fetch`].
    pub fn begin_fetch(&self) -> FetchTicket {
        FetchTicket(self.generation)
    }

    /// Make a fetch issued at `ticket` authoritative, except for ids that events have touched
    /// since: those keep their live state, including deletes. A fetch older than one already
    /// reconciled is discarded. Returns whether the fetch was used.
    pub fn reconcile_fetch(&mut self, ticket: FetchTicket, records: Vec<Notification>) -> bool {
        if self.torn_down {
            return false;
        }
        let FetchTicket(issued_at) = ticket;
        if issued_at < self.reconciled_at {
            log::debug!("Discarding a fetch that was overtaken by a newer one");
            return false;
        }
        self.reconciled_at = issued_at;
        self.expire_tombstones(Utc::now());

        let live: HashSet<NotificationId> = self
            .touched
            .iter()
            .filter(|(_, touched_at)| **touched_at > issued_at)
            .map(|(id, _)| id.clone())
            .collect();

        let mut entries: HashMap<NotificationId, Entry> = self
            .entries
            .drain()
            .filter(|(id, _)| live.contains(id))
            .collect();
        for record in records {
            if !record.is_visible_to(&self.viewer) {
                log::warn!("Fetched notification {} is addressed to another user", record.id);
                continue;
            }
            if self.tombstones.contains_key(&record.id) {
                continue;
            }
            if live.contains(&record.id) {
                log::debug!("Keeping live state of {} over the fetched row", record.id);
                continue;
            }
            entries.insert(
                record.id.clone(),
                Entry {
                    notification: record,
                    pending_read: false,
                },
            );
        }

        self.order = entries
            .values()
            .map(|entry| sort_key(&entry.notification))
            .collect();
        self.entries = entries;
        self.touched.retain(|_, touched_at| *touched_at > issued_at);
        self.publish();
        true
    }

    pub fn snapshot(&self) -> Snapshot {
        self.current.clone()
    }

    /// Drop tombstones whose deadline has passed. Returns how many were dropped.
    pub fn expire_tombstones(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.tombstones.len();
        self.tombstones.retain(|id, lapses_at| {
            let keep = *lapses_at > now;
            if !keep {
                log::debug!("Tombstone for {id} lapsed without a confirming delete");
            }
            keep
        });
        before - self.tombstones.len()
    }

    pub fn tombstone_count(&self) -> usize {
        self.tombstones.len()
    }

    pub fn is_tombstoned(&self, id: &NotificationId) -> bool {
        self.tombstones.contains_key(id)
    }

    pub fn mark_degraded(&mut self, origin: Origin) {
        if self.torn_down || !self.degraded.insert(origin) {
            return;
        }
        log::warn!("Notifications from the {origin} channel may be out of date");
        self.publish();
    }

    /// Session boundary: forget everything, keep listeners.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.tombstones.clear();
        self.degraded.clear();
        self.touched.clear();
        // fetches issued before the reset belong to the old session
        self.generation += 1;
        self.reconciled_at = self.generation;
        self.publish();
    }

    /// Drop all state. Events that arrive afterwards are ignored.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.entries.clear();
        self.order.clear();
        self.tombstones.clear();
        self.degraded.clear();
        self.touched.clear();
        self.listeners.clear();
        self.current = Snapshot::default();
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// `listener` runs after every change, while the engine is borrowed. It must not call back
    /// into the engine.
    pub fn subscribe(&mut self, listener: impl FnMut(&Snapshot) + 'static) -> ListenerKey {
        self.listeners.insert(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, key: ListenerKey) {
        self.listeners.remove(key);
    }

    fn publish(&mut self) {
        let snapshot = Snapshot {
            entries: self
                .order
                .iter()
                .filter_map(|(_, id)| self.entries.get(id).cloned())
                .collect(),
            unread_count: self
                .entries
                .values()
                .filter(|entry| !entry.notification.read)
                .count(),
            degraded: !self.degraded.is_empty(),
        };
        if snapshot == self.current {
            return;
        }
        self.current = snapshot;
        for listener in self.listeners.values_mut() {
            listener(&self.current);
        }
    }
}
