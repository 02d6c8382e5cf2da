use crate::data_model::{Notification, NotificationId};

/// A backend-agnostic description of one row/document mutation.
///
/// Serialized as `{"op": "insert" | "update" | "delete", "record": {...}}`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", content = "record", rename_all = "lowercase")]
pub enum ChangeEvent {
    Insert(Notification),
    Update(Notification),
    Delete(DeletedRecord),
}

/// Deletes may only carry the primary key (e.g. a Postgres `old_record` without replica identity).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeletedRecord {
    pub id: NotificationId,
}

impl ChangeEvent {
    pub fn delete(id: NotificationId) -> Self {
        ChangeEvent::Delete(DeletedRecord { id })
    }

    pub fn id(&self) -> &NotificationId {
        match self {
            ChangeEvent::Insert(record) | ChangeEvent::Update(record) => &record.id,
            ChangeEvent::Delete(deleted) => &deleted.id,
        }
    }

    pub fn op(&self) -> &'static str {
        match self {
            ChangeEvent::Insert(_) => "insert",
            ChangeEvent::Update(_) => "update",
            ChangeEvent::Delete(_) => "delete",
        }
    }
}
