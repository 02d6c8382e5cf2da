//! The stream adapter contract.
//!
//! A [`StreamAdapter`] opens one live channel per [`RecipientFilter`] and hands every change it
//! observes to a caller-supplied handler as a uniform [`ChangeEvent`]. Channels are independent:
//! nothing is assumed about ordering between the addressed and broadcast streams.
//!
//! Wire-level adapters (Supabase, Firestore) sit on top of a [`Transport`], which owns the actual
//! socket and its reconnect policy. After a reconnect the backend resends every matching record as
//! an insert; the merge engine folds those idempotently.

use std::{cell::Cell, rc::Rc};

use crate::data_model::{ChangeEvent, Origin, RecipientFilter};
use crate::error::{ChannelError, TransportError};

#[derive(Clone, Debug, PartialEq)]
pub enum Delivery {
    Change(ChangeEvent),
    /// Terminal. Delivered at most once per channel; nothing follows it.
    Failed(ChannelError),
}

pub type DeliveryHandler = Box<dyn FnMut(Delivery)>;

pub trait StreamAdapter {
    /// Open one live channel. A synchronous error means the channel never opened;
    /// the adapter does not retry.
    fn open(
        &self,
        filter: RecipientFilter,
        handler: DeliveryHandler,
    ) -> Result<Subscription, ChannelError>;
}

impl<A: StreamAdapter + ?Sized> StreamAdapter for Rc<A> {
    fn open(
        &self,
        filter: RecipientFilter,
        handler: DeliveryHandler,
    ) -> Result<Subscription, ChannelError> {
        (**self).open(filter, handler)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChannelState {
    Open,
    Failed,
    Cancelled,
}

/// Shared between a channel's delivery closure and its [`Subscription`].
pub struct ChannelGate {
    origin: Origin,
    state: Rc<Cell<ChannelState>>,
}

impl ChannelGate {
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            state: Rc::new(Cell::new(ChannelState::Open)),
        }
    }

    /// Wrap `handler` so that it sees nothing after cancellation, and at most one failure.
    pub fn wrap(&self, mut handler: DeliveryHandler) -> DeliveryHandler {
        let state = self.state.clone();
        let origin = self.origin;
        Box::new(move |delivery: Delivery| match state.get() {
            ChannelState::Cancelled => {
                log::debug!("Dropping {origin} delivery received after cancellation");
            }
            ChannelState::Failed => {
                log::debug!("Dropping {origin} delivery received after channel failure");
            }
            ChannelState::Open => {
                if matches!(delivery, Delivery::Failed(_)) {
                    state.set(ChannelState::Failed);
                }
                handler(delivery)
            }
        })
    }

    pub fn into_subscription(self, detach: Detach) -> Subscription {
        Subscription {
            origin: self.origin,
            state: self.state,
            detach: Some(detach),
        }
    }
}

/// Cancellation handle for one channel. Cancelling is single-fire; dropping cancels.
pub struct Subscription {
    origin: Origin,
    state: Rc<Cell<ChannelState>>,
    detach: Option<Detach>,
}

impl Subscription {
    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn cancel(&mut self) {
        let Some(detach) = self.detach.take() else {
            return;
        };
        // flip the gate first so anything the transport still has in flight is dropped
        self.state.set(ChannelState::Cancelled);
        detach();
        log::debug!("Cancelled {} notification channel", self.origin);
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.get() == ChannelState::Cancelled
    }

    pub fn has_failed(&self) -> bool {
        self.state.get() == ChannelState::Failed
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("origin", &self.origin)
            .field("state", &self.state.get())
            .finish()
    }
}

/// What a wire adapter asks its transport to join.
#[derive(Clone, Debug, PartialEq)]
pub struct ListenRequest {
    pub topic: String,
    pub payload: serde_json::Value,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TransportMessage {
    Frame(serde_json::Value),
    /// The connection dropped and came back. A full resend follows.
    Reconnected,
    /// The transport gave up on this listen request.
    Failed(String),
}

pub type FrameHandler = Box<dyn FnMut(TransportMessage)>;
pub type Detach = Box<dyn FnOnce()>;

/// The socket underneath a wire adapter. In the browser this is bridged to the backend's JS
/// client; natively it can be any websocket or long-poll implementation.
pub trait Transport {
    fn listen(
        &self,
        request: ListenRequest,
        on_message: FrameHandler,
    ) -> Result<Detach, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Rc<T> {
    fn listen(
        &self,
        request: ListenRequest,
        on_message: FrameHandler,
    ) -> Result<Detach, TransportError> {
        (**self).listen(request, on_message)
    }
}

#[cfg(any(feature = "supabase", feature = "firestore"))]
pub(crate) use wire::*;

#[cfg(any(feature = "supabase", feature = "firestore"))]
mod wire {
    use super::*;

    pub(crate) enum Decoded {
        Changes(Vec<ChangeEvent>),
        Failed(String),
        Ignored,
    }

    /// Translates one backend's raw frames into uniform change events.
    pub(crate) trait FrameDecoder: 'static {
        fn decode(&mut self, frame: serde_json::Value) -> Decoded;

        fn reconnected(&mut self) {}
    }

    pub(crate) fn listen_with<T: Transport + ?Sized, D: FrameDecoder>(
        transport: &T,
        origin: Origin,
        request: ListenRequest,
        mut decoder: D,
        handler: DeliveryHandler,
    ) -> Result<Subscription, ChannelError> {
        let gate = ChannelGate::new(origin);
        let mut deliver = gate.wrap(handler);
        let topic = request.topic.clone();

        let on_message: FrameHandler = Box::new(move |message: TransportMessage| match message {
            TransportMessage::Frame(frame) => match decoder.decode(frame) {
                Decoded::Changes(changes) => {
                    for change in changes {
                        deliver(Delivery::Change(change));
                    }
                }
                Decoded::Failed(reason) => {
                    log::error!("Channel {topic} was rejected: {reason}");
                    deliver(Delivery::Failed(ChannelError { origin, reason }));
                }
                Decoded::Ignored => {}
            },
            TransportMessage::Reconnected => {
                log::info!("Channel {topic} reconnected, expecting a resend");
                decoder.reconnected();
            }
            TransportMessage::Failed(reason) => {
                log::error!("Channel {topic} failed: {reason}");
                deliver(Delivery::Failed(ChannelError { origin, reason }));
            }
        });

        let detach = transport
            .listen(request, on_message)
            .map_err(|TransportError(reason)| ChannelError { origin, reason })?;

        Ok(gate.into_subscription(detach))
    }
}
