//! An in-process backend, for local development and tests.
//!
//! Implements both halves of the backend boundary: it persists rows for [`NotificationBackend`]
//! calls and pushes the resulting change events to every open channel whose filter matches,
//! the same way a real-time database would. Events are delivered synchronously, after the
//! backend's own state has been released.

use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use chrono::Utc;
use slotmap::SlotMap;

use crate::Error;
use crate::adapter::{ChannelGate, Delivery, DeliveryHandler, StreamAdapter, Subscription};
use crate::data_model::{
    ChangeEvent, Notification, NotificationDraft, NotificationId, Origin, RecipientFilter, UserId,
};
use crate::error::ChannelError;
use crate::store::NotificationBackend;

slotmap::new_key_type! {
    struct ChannelKey;
}

struct Channel {
    filter: RecipientFilter,
    deliver: Rc<RefCell<DeliveryHandler>>,
}

#[derive(Default)]
struct Inner {
    rows: BTreeMap<NotificationId, Notification>,
    channels: SlotMap<ChannelKey, Channel>,
    failing_round_trips: usize,
    refuse_channels: bool,
    muted: bool,
}

#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Rc<RefCell<Inner>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a row that existed before anyone subscribed. No event is emitted.
    pub fn seed(&self, notification: Notification) {
        self.inner
            .borrow_mut()
            .rows
            .insert(notification.id.clone(), notification);
    }

    /// A row inserted by some other actor.
    pub fn server_insert(&self, notification: Notification) {
        self.seed(notification.clone());
        let recipient = notification.recipient_id.clone();
        self.emit(ChangeEvent::Insert(notification), recipient.as_ref());
    }

    /// A row changed by some other actor.
    pub fn server_update(&self, notification: Notification) {
        self.seed(notification.clone());
        let recipient = notification.recipient_id.clone();
        self.emit(ChangeEvent::Update(notification), recipient.as_ref());
    }

    pub fn server_delete(&self, id: &NotificationId) {
        let removed = self.inner.borrow_mut().rows.remove(id);
        if let Some(removed) = removed {
            self.emit(
                ChangeEvent::delete(removed.id.clone()),
                removed.recipient_id.as_ref(),
            );
        }
    }

    pub fn get(&self, id: &NotificationId) -> Option<Notification> {
        self.inner.borrow().rows.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn open_channels(&self) -> usize {
        self.inner.borrow().channels.len()
    }

    /// The next `count` round trips fail with a transport error.
    pub fn fail_next_round_trips(&self, count: usize) {
        self.inner.borrow_mut().failing_round_trips = count;
    }

    /// Channels opened from now on are refused.
    pub fn refuse_channels(&self, refuse: bool) {
        self.inner.borrow_mut().refuse_channels = refuse;
    }

    /// While muted, mutations are persisted but no events reach the channels, like a dropped
    /// connection.
    pub fn mute(&self, muted: bool) {
        self.inner.borrow_mut().muted = muted;
    }

    /// Report a terminal failure on every open channel of `origin`.
    pub fn fail_channels(&self, origin: Origin, reason: &str) {
        let targets = self.targets(|filter| filter.origin() == origin);
        for deliver in targets {
            (deliver.borrow_mut().as_mut())(Delivery::Failed(ChannelError {
                origin,
                reason: reason.to_string(),
            }));
        }
    }

    /// Unmute and resend every row to every channel it matches, as inserts.
    pub fn simulate_reconnect(&self) {
        self.mute(false);
        let rows: Vec<Notification> = self.inner.borrow().rows.values().cloned().collect();
        for row in rows {
            let recipient = row.recipient_id.clone();
            self.emit(ChangeEvent::Insert(row), recipient.as_ref());
        }
    }

    fn targets(
        &self,
        mut predicate: impl FnMut(&RecipientFilter) -> bool,
    ) -> Vec<Rc<RefCell<DeliveryHandler>>> {
        self.inner
            .borrow()
            .channels
            .values()
            .filter(|channel| predicate(&channel.filter))
            .map(|channel| channel.deliver.clone())
            .collect()
    }

    fn emit(&self, change: ChangeEvent, recipient: Option<&UserId>) {
        if self.inner.borrow().muted {
            log::debug!("Muted, dropping {} of {}", change.op(), change.id());
            return;
        }
        for deliver in self.targets(|filter| filter.matches(recipient)) {
            (deliver.borrow_mut().as_mut())(Delivery::Change(change.clone()));
        }
    }

    fn round_trip(&self, what: &str) -> Result<(), Error> {
        let mut inner = self.inner.borrow_mut();
        if inner.failing_round_trips > 0 {
            inner.failing_round_trips -= 1;
            return Err(Error::Transport(format!("{what}: injected failure")));
        }
        Ok(())
    }
}

impl StreamAdapter for MemoryBackend {
    fn open(
        &self,
        filter: RecipientFilter,
        handler: DeliveryHandler,
    ) -> Result<Subscription, ChannelError> {
        let origin = filter.origin();
        if self.inner.borrow().refuse_channels {
            return Err(ChannelError {
                origin,
                reason: "channel refused".to_string(),
            });
        }

        let gate = ChannelGate::new(origin);
        let deliver = Rc::new(RefCell::new(gate.wrap(handler)));
        let key = self
            .inner
            .borrow_mut()
            .channels
            .insert(Channel { filter, deliver });

        let inner = Rc::downgrade(&self.inner);
        Ok(gate.into_subscription(Box::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.borrow_mut().channels.remove(key);
            }
        })))
    }
}

impl NotificationBackend for MemoryBackend {
    async fn fetch(&self, viewer: &UserId) -> Result<Vec<Notification>, Error> {
        self.round_trip("fetch")?;
        let mut rows: Vec<Notification> = self
            .inner
            .borrow()
            .rows
            .values()
            .filter(|row| row.is_visible_to(viewer))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn create(
        &self,
        draft: &NotificationDraft,
        sender: &UserId,
    ) -> Result<Notification, Error> {
        self.round_trip("create")?;
        let created = draft.clone().into_notification(
            NotificationId::generate(),
            Some(sender.clone()),
            Utc::now(),
        );
        self.server_insert(created.clone());
        Ok(created)
    }

    async fn set_read(&self, id: &NotificationId) -> Result<(), Error> {
        self.round_trip("set_read")?;
        let updated = {
            let mut inner = self.inner.borrow_mut();
            let row = inner
                .rows
                .get_mut(id)
                .ok_or_else(|| Error::NotFound(id.clone()))?;
            row.read = true;
            row.clone()
        };
        let recipient = updated.recipient_id.clone();
        self.emit(ChangeEvent::Update(updated), recipient.as_ref());
        Ok(())
    }

    async fn delete(&self, id: &NotificationId) -> Result<(), Error> {
        self.round_trip("delete")?;
        if self.get(id).is_none() {
            return Err(Error::NotFound(id.clone()));
        }
        self.server_delete(id);
        Ok(())
    }
}
