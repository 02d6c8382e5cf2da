use beacon::data_model::{Notification, NotificationDraft, NotificationKind, UserId};
use beacon::{Error, NotificationBackend, NotificationStore};

/// One broadcast record, visible to every member including ones who join later.
pub async fn send_to_all<B: NotificationBackend>(
    store: &NotificationStore<B>,
    title: &str,
    message: &str,
    kind: NotificationKind,
) -> Result<Notification, Error> {
    let draft = NotificationDraft::broadcast(title, message).with_kind(kind);
    store
        .create(draft)
        .await
        .inspect(|created| log::info!("Sent \"{}\" to all members", created.title))
        .inspect_err(|e| log::error!("Failed to send notification to all members: {e}"))
}

pub async fn send_to_user<B: NotificationBackend>(
    store: &NotificationStore<B>,
    recipient: &UserId,
    title: &str,
    message: &str,
    kind: NotificationKind,
) -> Result<Notification, Error> {
    let draft = NotificationDraft::addressed(recipient.clone(), title, message).with_kind(kind);
    store
        .create(draft)
        .await
        .inspect(|created| log::info!("Sent \"{}\" to {recipient}", created.title))
        .inspect_err(|e| log::error!("Failed to send notification to {recipient}: {e}"))
}
