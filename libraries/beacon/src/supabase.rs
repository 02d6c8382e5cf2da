//! Supabase backend: Postgres realtime for the live channels, PostgREST for round trips.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::Error;
use crate::adapter::{
    Decoded, DeliveryHandler, FrameDecoder, ListenRequest, StreamAdapter, Subscription, Transport,
    listen_with,
};
use crate::data_model::{
    ChangeEvent, DeletedRecord, Notification, NotificationDraft, NotificationId, RecipientFilter,
    UserId,
};
use crate::error::ChannelError;
use crate::store::NotificationBackend;

pub const NOTIFICATIONS_TABLE: &str = "notifications";

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SupabaseConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

/// Listens to `postgres_changes` on the notifications table through a Phoenix channel.
pub struct SupabaseRealtime<T> {
    transport: T,
    table: String,
}

impl<T: Transport> SupabaseRealtime<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            table: NOTIFICATIONS_TABLE.to_string(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    fn join_request(&self, filter: &RecipientFilter) -> ListenRequest {
        let mut changes = json!({
            "event": "*",
            "schema": "public",
            "table": self.table,
        });
        // realtime filters have no IS NULL, so the broadcast channel sees every row
        if let RecipientFilter::Addressed(user) = filter {
            changes["filter"] = json!(format!("recipient_id=eq.{user}"));
        }

        ListenRequest {
            topic: format!("realtime:{}:{}", self.table, filter.origin()),
            payload: json!({
                "config": {
                    "broadcast": { "self": false },
                    "presence": { "key": "" },
                    "postgres_changes": [changes],
                }
            }),
        }
    }
}

impl<T: Transport> StreamAdapter for SupabaseRealtime<T> {
    fn open(
        &self,
        filter: RecipientFilter,
        handler: DeliveryHandler,
    ) -> Result<Subscription, ChannelError> {
        let request = self.join_request(&filter);
        log::debug!("Joining {}", request.topic);
        listen_with(
            &self.transport,
            filter.origin(),
            request,
            PostgresChanges { filter },
            handler,
        )
    }
}

struct PostgresChanges {
    filter: RecipientFilter,
}

#[derive(Deserialize)]
struct PostgresChange {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    record: Option<Value>,
    #[serde(default)]
    old_record: Option<Value>,
}

impl PostgresChanges {
    fn decode_change(&self, data: &Value) -> Result<Option<ChangeEvent>, String> {
        let change = PostgresChange::deserialize(data).map_err(|e| e.to_string())?;
        let record = |value: Option<Value>| -> Result<Notification, String> {
            serde_json::from_value(value.unwrap_or_default()).map_err(|e| e.to_string())
        };

        let event = match change.kind.as_str() {
            "INSERT" => ChangeEvent::Insert(record(change.record)?),
            "UPDATE" => ChangeEvent::Update(record(change.record)?),
            "DELETE" => {
                let deleted: DeletedRecord =
                    serde_json::from_value(change.old_record.unwrap_or_default())
                        .map_err(|e| e.to_string())?;
                ChangeEvent::Delete(deleted)
            }
            other => return Err(format!("unknown change type `{other}`")),
        };

        let outside_filter = match &event {
            ChangeEvent::Insert(record) | ChangeEvent::Update(record) => {
                !self.filter.matches(record.recipient_id.as_ref())
            }
            ChangeEvent::Delete(_) => false,
        };
        Ok((!outside_filter).then_some(event))
    }
}

impl FrameDecoder for PostgresChanges {
    fn decode(&mut self, frame: Value) -> Decoded {
        let event = frame["event"].as_str().unwrap_or_default();
        match event {
            "postgres_changes" => match self.decode_change(&frame["payload"]["data"]) {
                Ok(Some(change)) => Decoded::Changes(vec![change]),
                Ok(None) => Decoded::Ignored,
                Err(e) => {
                    log::warn!("Skipping malformed postgres change: {e}");
                    Decoded::Ignored
                }
            },
            "phx_reply" | "system" if frame["payload"]["status"] == "error" => {
                let payload = &frame["payload"];
                let reason = payload["response"]["reason"]
                    .as_str()
                    .or(payload["message"].as_str())
                    .unwrap_or("subscription rejected");
                Decoded::Failed(reason.to_string())
            }
            "phx_error" => {
                log::warn!("Realtime channel error, waiting for the transport to rejoin");
                Decoded::Ignored
            }
            _ => Decoded::Ignored,
        }
    }
}

/// Round trips through PostgREST, authenticated as the signed-in user.
pub struct SupabaseBackend {
    client: postgrest::Postgrest,
    access_token: String,
    table: String,
}

impl SupabaseBackend {
    pub fn new(config: &SupabaseConfig, access_token: impl Into<String>) -> Self {
        let client = postgrest::Postgrest::new(format!("{}/rest/v1", config.supabase_url))
            .insert_header("apikey", config.supabase_anon_key.clone());
        Self {
            client,
            access_token: access_token.into(),
            table: NOTIFICATIONS_TABLE.to_string(),
        }
    }

    fn from_table(&self) -> postgrest::Builder {
        self.client.from(&self.table).auth(&self.access_token)
    }
}

async fn rows(request: postgrest::Builder, context: &str) -> Result<Vec<Notification>, Error> {
    let response = request
        .execute()
        .await
        .map_err(|e| Error::transport(&format!("Failed to {context}"), e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::transport(&format!("Failed to read {context} response"), e))?;

    if !status.is_success() {
        return Err(Error::Transport(format!(
            "Failed to {context}: {status} {body}"
        )));
    }

    serde_json::from_str(&body).map_err(|e| {
        Error::Transport(format!(
            "Failed to parse {context} response: {e}\nResponse body: {body}"
        ))
    })
}

impl NotificationBackend for SupabaseBackend {
    async fn fetch(&self, viewer: &UserId) -> Result<Vec<Notification>, Error> {
        let request = self
            .from_table()
            .select("*")
            .or(format!("recipient_id.eq.{viewer},recipient_id.is.null"))
            .order("created_at.desc");
        rows(request, "fetch notifications").await
    }

    async fn create(
        &self,
        draft: &NotificationDraft,
        sender: &UserId,
    ) -> Result<Notification, Error> {
        let body = json!({
            "title": draft.title,
            "message": draft.message,
            "type": draft.kind,
            "recipient_id": draft.recipient_id,
            "sender_id": sender,
            "read": false,
            "expires_at": draft.expires_at,
        });
        let request = self.from_table().insert(body.to_string());
        rows(request, "create notification")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Transport("create notification returned no rows".to_string()))
    }

    async fn set_read(&self, id: &NotificationId) -> Result<(), Error> {
        let request = self
            .from_table()
            .eq("id", id.as_str())
            .update(json!({ "read": true }).to_string());
        let updated = rows(request, "mark notification as read").await?;
        if updated.is_empty() {
            return Err(Error::NotFound(id.clone()));
        }
        Ok(())
    }

    async fn delete(&self, id: &NotificationId) -> Result<(), Error> {
        let request = self.from_table().eq("id", id.as_str()).delete();
        let deleted = rows(request, "delete notification").await?;
        if deleted.is_empty() {
            return Err(Error::NotFound(id.clone()));
        }
        Ok(())
    }
}
