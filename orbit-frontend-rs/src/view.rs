//! What the notification center renders, projected from a [`Snapshot`].

use beacon::Snapshot;
use beacon::data_model::{NotificationId, NotificationKind};
use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct NotificationItem {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub read: bool,
    /// Read locally, not yet confirmed by the server.
    pub pending: bool,
    pub broadcast: bool,
    pub time_ago: String,
    /// Display-only. Expired records are still listed.
    pub expired: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct NotificationList {
    pub items: Vec<NotificationItem>,
    pub unread_count: usize,
    pub badge: Option<String>,
    /// A live channel failed; the list may be stale.
    pub degraded: bool,
}

impl NotificationList {
    pub fn project(snapshot: &Snapshot, now: DateTime<Utc>) -> Self {
        let items = snapshot
            .iter()
            .map(|entry| NotificationItem {
                id: entry.id.clone(),
                title: entry.title.clone(),
                message: entry.message.clone(),
                kind: entry.kind,
                read: entry.read,
                pending: entry.is_pending(),
                broadcast: entry.is_broadcast(),
                time_ago: time_ago(entry.created_at, now),
                expired: entry.is_expired(now),
            })
            .collect();

        Self {
            items,
            unread_count: snapshot.unread_count(),
            badge: badge_label(snapshot.unread_count()),
            degraded: snapshot.is_degraded(),
        }
    }
}

pub fn time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - created_at).num_seconds();
    // clock skew puts some records slightly in the future
    if seconds < 60 {
        "Just now".to_string()
    } else if seconds < 3600 {
        format!("{}m ago", seconds / 60)
    } else if seconds < 86400 {
        format!("{}h ago", seconds / 3600)
    } else {
        format!("{}d ago", seconds / 86400)
    }
}

pub fn badge_label(unread: usize) -> Option<String> {
    match unread {
        0 => None,
        1..=99 => Some(unread.to_string()),
        _ => Some("99+".to_string()),
    }
}

/// Border accent for each kind, as a tailwind class.
pub fn accent(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Success => "border-l-green-500",
        NotificationKind::Warning => "border-l-yellow-500",
        NotificationKind::Error => "border-l-red-500",
        NotificationKind::Event => "border-l-blue-500",
        NotificationKind::System => "border-l-purple-500",
        NotificationKind::Info => "border-l-gray-500",
    }
}
