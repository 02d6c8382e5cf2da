use chrono::{DateTime, Utc};

use crate::data_model::{NotificationId, UserId};

/// Presentation category. Has no effect on how records are merged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
    Event,
    System,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 6] = [
        NotificationKind::Info,
        NotificationKind::Success,
        NotificationKind::Warning,
        NotificationKind::Error,
        NotificationKind::Event,
        NotificationKind::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Info => "info",
            NotificationKind::Success => "success",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
            NotificationKind::Event => "event",
            NotificationKind::System => "system",
        }
    }
}

impl From<String> for NotificationKind {
    fn from(kind: String) -> Self {
        NotificationKind::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == kind)
            .unwrap_or_else(|| {
                log::debug!("Unknown notification type `{kind}`, displaying as info");
                NotificationKind::Info
            })
    }
}

impl From<NotificationKind> for &'static str {
    fn from(kind: NotificationKind) -> Self {
        kind.as_str()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    /// `None` means broadcast: visible to every user.
    #[serde(default)]
    pub recipient_id: Option<UserId>,
    #[serde(default)]
    pub sender_id: Option<UserId>,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
    /// Advisory only. Nothing sweeps expired records.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn is_broadcast(&self) -> bool {
        self.recipient_id.is_none()
    }

    /// Whether this record belongs in `viewer`'s authoritative list.
    pub fn is_visible_to(&self, viewer: &UserId) -> bool {
        match &self.recipient_id {
            None => true,
            Some(recipient) => recipient == viewer,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// A notification that has not been persisted yet. The backend assigns `id` and `created_at`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub recipient_id: Option<UserId>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl NotificationDraft {
    pub fn broadcast(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind: NotificationKind::Info,
            recipient_id: None,
            expires_at: None,
        }
    }

    pub fn addressed(
        recipient: UserId,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient_id: Some(recipient),
            ..Self::broadcast(title, message)
        }
    }

    pub fn with_kind(mut self, kind: NotificationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), crate::Error> {
        if self.title.trim().is_empty() {
            return Err(crate::Error::Validation("title is required".to_string()));
        }
        if self.message.trim().is_empty() {
            return Err(crate::Error::Validation("message is required".to_string()));
        }
        Ok(())
    }

    /// Builds the record a backend persists, once it has chosen an id and a timestamp.
    pub fn into_notification(
        self,
        id: NotificationId,
        sender_id: Option<UserId>,
        created_at: DateTime<Utc>,
    ) -> Notification {
        Notification {
            id,
            title: self.title,
            message: self.message,
            kind: self.kind,
            recipient_id: self.recipient_id,
            sender_id,
            read: false,
            created_at,
            expires_at: self.expires_at,
        }
    }
}

/// The two logically distinct streams a session listens to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Origin {
    /// Records whose `recipient_id` is the viewer.
    Addressed,
    /// Records with no recipient.
    Broadcast,
}

impl Origin {
    pub const BOTH: [Origin; 2] = [Origin::Addressed, Origin::Broadcast];

    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Addressed => "addressed",
            Origin::Broadcast => "broadcast",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The row filter a channel is opened with.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecipientFilter {
    Addressed(UserId),
    Broadcast,
}

impl RecipientFilter {
    pub fn for_origin(origin: Origin, viewer: &UserId) -> Self {
        match origin {
            Origin::Addressed => RecipientFilter::Addressed(viewer.clone()),
            Origin::Broadcast => RecipientFilter::Broadcast,
        }
    }

    pub fn origin(&self) -> Origin {
        match self {
            RecipientFilter::Addressed(_) => Origin::Addressed,
            RecipientFilter::Broadcast => Origin::Broadcast,
        }
    }

    pub fn matches(&self, recipient_id: Option<&UserId>) -> bool {
        match (self, recipient_id) {
            (RecipientFilter::Addressed(user), Some(recipient)) => user == recipient,
            (RecipientFilter::Broadcast, None) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_decodes_database_row() {
        let row = serde_json::json!({
            "id": "n1",
            "title": "Court booked",
            "message": "Court 3 is ours on Saturday",
            "type": "party",
            "recipient_id": null,
            "sender_id": null,
            "read": false,
            "created_at": "2024-03-01T12:00:00+00:00",
        });
        let notification: Notification = serde_json::from_value(row).unwrap();

        assert_eq!(notification.kind, NotificationKind::Info);
        assert!(notification.is_broadcast());
        assert!(notification.is_visible_to(&UserId::new("anyone")));
        assert_eq!(notification.expires_at, None);
        assert_eq!(
            serde_json::to_value(NotificationKind::Warning).unwrap(),
            "warning"
        );
    }

    #[test]
    fn test_visibility_and_expiry() {
        let created_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let notification = NotificationDraft::addressed(UserId::new("u1"), "Hi", "there")
            .expiring_at(created_at + chrono::Duration::hours(1))
            .into_notification(NotificationId::new("n1"), None, created_at);

        assert!(notification.is_visible_to(&UserId::new("u1")));
        assert!(!notification.is_visible_to(&UserId::new("u2")));
        assert!(!notification.is_expired(created_at));
        assert!(notification.is_expired(created_at + chrono::Duration::hours(1)));
        assert!(RecipientFilter::Addressed(UserId::new("u1")).matches(Some(&UserId::new("u1"))));
        assert!(!RecipientFilter::Broadcast.matches(Some(&UserId::new("u1"))));
    }

    #[test]
    fn test_validate_draft() {
        assert!(NotificationDraft::broadcast("Hi", "there").validate().is_ok());
        assert_eq!(
            NotificationDraft::broadcast(" ", "there").validate(),
            Err(crate::Error::Validation("title is required".to_string()))
        );
        assert_eq!(
            NotificationDraft::broadcast("Hi", "\n").validate(),
            Err(crate::Error::Validation("message is required".to_string()))
        );
    }
}
