//! A session-scoped handle tying one viewer's merge engine to its channels and backend.
//!
//! Created at login, closed at logout. Closing cancels every channel before the engine state is
//! discarded, so nothing is folded in after the session ends.

use std::{cell::RefCell, rc::Rc, time::Duration};

use crate::adapter::{Delivery, DeliveryHandler, StreamAdapter, Subscription};
use crate::data_model::{Origin, RecipientFilter};
use crate::merge::{DEFAULT_TOMBSTONE_TTL, ListenerKey, MergeEngine, Snapshot};
use crate::store::{NotificationBackend, NotificationStore};
use crate::viewer::Viewer;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long an optimistic delete suppresses re-inserts without a confirming delete.
    pub tombstone_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tombstone_ttl: DEFAULT_TOMBSTONE_TTL,
        }
    }
}

pub struct Session<B> {
    engine: Rc<RefCell<MergeEngine>>,
    store: NotificationStore<B>,
    subscriptions: Vec<Subscription>,
    closed: bool,
}

impl<B: NotificationBackend> Session<B> {
    /// Open the addressed and broadcast channels. A channel that fails to open leaves the session
    /// running in degraded mode rather than failing the whole session.
    pub fn start<A: StreamAdapter + ?Sized>(
        viewer: Viewer,
        adapter: &A,
        backend: B,
        config: SessionConfig,
    ) -> Self {
        let engine = Rc::new(RefCell::new(MergeEngine::with_tombstone_ttl(
            viewer.user_id.clone(),
            config.tombstone_ttl,
        )));

        let mut subscriptions = Vec::with_capacity(Origin::BOTH.len());
        for origin in Origin::BOTH {
            let filter = RecipientFilter::for_origin(origin, &viewer.user_id);
            let sink = Rc::downgrade(&engine);
            let handler: DeliveryHandler = Box::new(move |delivery: Delivery| {
                let Some(engine) = sink.upgrade() else {
                    return;
                };
                let mut engine = engine.borrow_mut();
                match delivery {
                    Delivery::Change(change) => {
                        engine.apply(change);
                    }
                    Delivery::Failed(e) => {
                        log::error!("{e}");
                        engine.mark_degraded(e.origin);
                    }
                }
            });

            match adapter.open(filter, handler) {
                Ok(subscription) => subscriptions.push(subscription),
                Err(e) => {
                    log::error!("Could not open channel: {e}");
                    engine.borrow_mut().mark_degraded(origin);
                }
            }
        }

        log::info!(
            "Notification session started for {} with {} open channel(s)",
            viewer.user_id,
            subscriptions.len()
        );

        Self {
            store: NotificationStore::new(engine.clone(), backend, viewer),
            engine,
            subscriptions,
            closed: false,
        }
    }

    pub fn store(&self) -> &NotificationStore<B> {
        &self.store
    }

    pub fn snapshot(&self) -> Snapshot {
        self.engine.borrow().snapshot()
    }

    pub fn is_degraded(&self) -> bool {
        self.engine.borrow().snapshot().is_degraded()
    }

    /// `listener` must not call back into the session.
    pub fn subscribe(&self, listener: impl FnMut(&Snapshot) + 'static) -> ListenerKey {
        self.engine.borrow_mut().subscribe(listener)
    }

    pub fn unsubscribe(&self, key: ListenerKey) {
        self.engine.borrow_mut().unsubscribe(key)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<B> Session<B> {
    /// Cancel every channel, then discard the engine's state. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for subscription in &mut self.subscriptions {
            subscription.cancel();
        }
        self.subscriptions.clear();
        self.engine.borrow_mut().teardown();
        log::info!("Notification session closed");
    }
}

impl<B> Drop for Session<B> {
    fn drop(&mut self) {
        self.close();
    }
}
