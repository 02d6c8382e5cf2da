//! The notification store facade: the only place that performs mutating round trips.
//!
//! Mark-read and delete are applied optimistically first, then sent. A failed round trip is
//! reported to the caller but does not roll the optimism back; the next update event or
//! `fetch_once` corrects it.
//!
//! We never hold a borrow of the engine across an `.await`.

use std::{cell::RefCell, rc::Rc};

use crate::Error;
use crate::data_model::{ChangeEvent, Notification, NotificationDraft, NotificationId, UserId};
use crate::merge::{MergeEngine, Snapshot};
use crate::viewer::{SEND_NOTIFICATIONS, Viewer};

/// Request/response access to wherever notifications are persisted.
#[allow(async_fn_in_trait)]
pub trait NotificationBackend {
    /// Everything visible to `viewer`: addressed to them, or broadcast.
    async fn fetch(&self, viewer: &UserId) -> Result<Vec<Notification>, Error>;

    /// Persist `draft`, assigning `id` and `created_at` on the backend.
    async fn create(
        &self,
        draft: &NotificationDraft,
        sender: &UserId,
    ) -> Result<Notification, Error>;

    /// Fails with [`Error::NotFound`] if there is no such record.
    async fn set_read(&self, id: &NotificationId) -> Result<(), Error>;

    /// Fails with [`Error::NotFound`] if there is no such record.
    async fn delete(&self, id: &NotificationId) -> Result<(), Error>;
}

impl<B: NotificationBackend> NotificationBackend for Rc<B> {
    async fn fetch(&self, viewer: &UserId) -> Result<Vec<Notification>, Error> {
        (**self).fetch(viewer).await
    }

    async fn create(
        &self,
        draft: &NotificationDraft,
        sender: &UserId,
    ) -> Result<Notification, Error> {
        (**self).create(draft, sender).await
    }

    async fn set_read(&self, id: &NotificationId) -> Result<(), Error> {
        (**self).set_read(id).await
    }

    async fn delete(&self, id: &NotificationId) -> Result<(), Error> {
        (**self).delete(id).await
    }
}

pub struct NotificationStore<B> {
    engine: Rc<RefCell<MergeEngine>>,
    backend: B,
    viewer: Viewer,
}

impl<B: NotificationBackend> NotificationStore<B> {
    pub fn new(engine: Rc<RefCell<MergeEngine>>, backend: B, viewer: Viewer) -> Self {
        Self {
            engine,
            backend,
            viewer,
        }
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn snapshot(&self) -> Snapshot {
        self.engine.borrow().snapshot()
    }

    /// Fetch the full list once and make it authoritative. Events that arrive while the fetch is
    /// in flight win over the fetched rows.
    pub async fn fetch_once(&self) -> Result<Snapshot, Error> {
        let ticket = self.engine.borrow().begin_fetch();
        let records = self
            .backend
            .fetch(&self.viewer.user_id)
            .await
            .inspect_err(|e| log::error!("Failed to fetch notifications: {e}"))?;

        let mut engine = self.engine.borrow_mut();
        engine.reconcile_fetch(ticket, records);
        Ok(engine.snapshot())
    }

    pub async fn mark_read(&self, id: &NotificationId) -> Result<(), Error> {
        self.engine.borrow_mut().optimistic_mark_read(id);

        self.backend
            .set_read(id)
            .await
            .inspect_err(|e| log::error!("Failed to mark notification {id} as read: {e}"))
    }

    /// Marks exactly the records that are unread right now. Anything arriving while the round
    /// trips are in flight stays unread. Every id is attempted; the first failure is returned.
    pub async fn mark_all_read(&self) -> Result<usize, Error> {
        let unread = self.engine.borrow().snapshot().unread_ids();

        let mut first_error = None;
        let mut marked = 0;
        for id in &unread {
            match self.mark_read(id).await {
                Ok(()) => marked += 1,
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        log::info!("Marked {marked} of {} notifications as read", unread.len());
        match first_error {
            Some(e) => Err(e),
            None => Ok(marked),
        }
    }

    /// Deleting something that is already gone fails with [`Error::NotFound`]; callers treat
    /// that as success. The local tombstone is cleared in that case since no confirming event
    /// will ever arrive.
    pub async fn delete(&self, id: &NotificationId) -> Result<(), Error> {
        self.engine.borrow_mut().optimistic_delete(id);

        match self.backend.delete(id).await {
            Ok(()) => Ok(()),
            Err(Error::NotFound(id)) => {
                log::debug!("Notification {id} was already deleted");
                self.engine
                    .borrow_mut()
                    .apply(ChangeEvent::delete(id.clone()));
                Err(Error::NotFound(id))
            }
            Err(e) => {
                log::error!("Failed to delete notification {id}: {e}");
                Err(e)
            }
        }
    }

    pub async fn create(&self, draft: NotificationDraft) -> Result<Notification, Error> {
        draft.validate()?;
        if !self.viewer.can(SEND_NOTIFICATIONS) {
            return Err(Error::Permission(format!(
                "`{SEND_NOTIFICATIONS}` is required to send notifications"
            )));
        }

        let created = self
            .backend
            .create(&draft, &self.viewer.user_id)
            .await
            .inspect_err(|e| log::error!("Failed to create notification: {e}"))?;
        log::info!(
            "Created {} notification {}",
            if created.is_broadcast() {
                "broadcast"
            } else {
                "addressed"
            },
            created.id
        );
        Ok(created)
    }
}
