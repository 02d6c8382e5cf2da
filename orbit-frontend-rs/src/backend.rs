//! Backend selection. Chosen once from [`AppConfig`]; nothing downstream branches on it.

use beacon::adapter::{DeliveryHandler, StreamAdapter, Subscription, Transport};
use beacon::data_model::{Notification, NotificationDraft, NotificationId, RecipientFilter, UserId};
use beacon::firestore::{FirestoreBackend, FirestoreListener};
use beacon::memory::MemoryBackend;
use beacon::supabase::{SupabaseBackend, SupabaseRealtime};
use beacon::{ChannelError, Error, NotificationBackend};

use crate::config::{AppConfig, BackendConfig};

pub enum Backend {
    Supabase(SupabaseBackend),
    Firestore(FirestoreBackend),
    Memory(MemoryBackend),
}

impl NotificationBackend for Backend {
    async fn fetch(&self, viewer: &UserId) -> Result<Vec<Notification>, Error> {
        match self {
            Backend::Supabase(backend) => backend.fetch(viewer).await,
            Backend::Firestore(backend) => backend.fetch(viewer).await,
            Backend::Memory(backend) => backend.fetch(viewer).await,
        }
    }

    async fn create(
        &self,
        draft: &NotificationDraft,
        sender: &UserId,
    ) -> Result<Notification, Error> {
        match self {
            Backend::Supabase(backend) => backend.create(draft, sender).await,
            Backend::Firestore(backend) => backend.create(draft, sender).await,
            Backend::Memory(backend) => backend.create(draft, sender).await,
        }
    }

    async fn set_read(&self, id: &NotificationId) -> Result<(), Error> {
        match self {
            Backend::Supabase(backend) => backend.set_read(id).await,
            Backend::Firestore(backend) => backend.set_read(id).await,
            Backend::Memory(backend) => backend.set_read(id).await,
        }
    }

    async fn delete(&self, id: &NotificationId) -> Result<(), Error> {
        match self {
            Backend::Supabase(backend) => backend.delete(id).await,
            Backend::Firestore(backend) => backend.delete(id).await,
            Backend::Memory(backend) => backend.delete(id).await,
        }
    }
}

pub enum Realtime<T> {
    Supabase(SupabaseRealtime<T>),
    Firestore(FirestoreListener<T>),
    Memory(MemoryBackend),
}

impl<T: Transport> StreamAdapter for Realtime<T> {
    fn open(
        &self,
        filter: RecipientFilter,
        handler: DeliveryHandler,
    ) -> Result<Subscription, ChannelError> {
        match self {
            Realtime::Supabase(adapter) => adapter.open(filter, handler),
            Realtime::Firestore(adapter) => adapter.open(filter, handler),
            Realtime::Memory(adapter) => adapter.open(filter, handler),
        }
    }
}

/// Build both halves of the configured backend. `access_token` is the signed-in user's JWT
/// (Supabase) or ID token (Firestore); the memory backend ignores it and `transport`.
pub fn connect<T: Transport>(
    config: &AppConfig,
    access_token: &str,
    transport: T,
) -> (Realtime<T>, Backend) {
    log::info!("Using the {:?} notification backend", config.backend.kind());
    match &config.backend {
        BackendConfig::Supabase(supabase) => (
            Realtime::Supabase(SupabaseRealtime::new(transport)),
            Backend::Supabase(SupabaseBackend::new(supabase, access_token)),
        ),
        BackendConfig::Firestore(firestore) => (
            Realtime::Firestore(FirestoreListener::new(transport, firestore.clone())),
            Backend::Firestore(FirestoreBackend::new(firestore.clone(), access_token)),
        ),
        BackendConfig::Memory => {
            let memory = MemoryBackend::new();
            (Realtime::Memory(memory.clone()), Backend::Memory(memory))
        }
    }
}
