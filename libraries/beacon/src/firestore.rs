//! Firestore backend: the `Listen` stream for live channels, the REST API for round trips.
//!
//! Firestore reports "this document is now in your query result" without saying whether it is
//! new, so the listener remembers which ids it has already reported on its channel. The first
//! sighting is an insert and later ones are updates. After a reconnect (or a target reset) that
//! memory is cleared, so the resend arrives as inserts like every other backend.

use std::collections::HashSet;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};

use crate::Error;
use crate::adapter::{
    Decoded, DeliveryHandler, FrameDecoder, ListenRequest, StreamAdapter, Subscription, Transport,
    listen_with,
};
use crate::data_model::{
    ChangeEvent, Notification, NotificationDraft, NotificationId, Origin, RecipientFilter, UserId,
};
use crate::error::ChannelError;
use crate::store::NotificationBackend;

pub const NOTIFICATIONS_COLLECTION: &str = "notifications";
pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_key: api_key.into(),
            base_url: default_base_url(),
        }
    }

    fn database(&self) -> String {
        format!("projects/{}/databases/(default)", self.project_id)
    }

    fn documents(&self) -> String {
        format!("{}/documents", self.database())
    }
}

fn structured_query(collection: &str, filter: &RecipientFilter) -> Value {
    let condition = match filter {
        RecipientFilter::Addressed(user) => json!({
            "fieldFilter": {
                "field": { "fieldPath": "recipient_id" },
                "op": "EQUAL",
                "value": { "stringValue": user },
            }
        }),
        RecipientFilter::Broadcast => json!({
            "unaryFilter": {
                "field": { "fieldPath": "recipient_id" },
                "op": "IS_NULL",
            }
        }),
    };
    json!({
        "from": [{ "collectionId": collection }],
        "where": condition,
    })
}

fn target_id(origin: Origin) -> i64 {
    match origin {
        Origin::Addressed => 1,
        Origin::Broadcast => 2,
    }
}

/// The last path segment of a document name.
fn document_id(name: &str) -> NotificationId {
    NotificationId::new(name.rsplit('/').next().unwrap_or(name))
}

/// Firestore wraps every value in a single-key object naming its type.
fn plain_value(typed: &Value) -> Result<Value, String> {
    let Some((kind, value)) = typed.as_object().and_then(|object| object.iter().next()) else {
        return Err(format!("expected a typed value, got {typed}"));
    };
    Ok(match kind.as_str() {
        "nullValue" => Value::Null,
        "stringValue" | "timestampValue" | "referenceValue" | "booleanValue" | "doubleValue" => {
            value.clone()
        }
        // 64-bit integers travel as strings
        "integerValue" => value
            .as_str()
            .and_then(|digits| digits.parse::<i64>().ok())
            .map(Value::from)
            .ok_or_else(|| format!("bad integerValue {value}"))?,
        "mapValue" => Value::Object(plain_fields(&value["fields"])?),
        "arrayValue" => Value::Array(
            value["values"]
                .as_array()
                .map(Vec::as_slice)
                .unwrap_or_default()
                .iter()
                .map(plain_value)
                .collect::<Result<_, _>>()?,
        ),
        other => return Err(format!("unsupported value type `{other}`")),
    })
}

fn plain_fields(fields: &Value) -> Result<Map<String, Value>, String> {
    let Some(fields) = fields.as_object() else {
        return Ok(Map::new());
    };
    fields
        .iter()
        .map(|(key, typed)| -> Result<(String, Value), String> {
            Ok((key.clone(), plain_value(typed)?))
        })
        .collect()
}

fn decode_document(document: &Value) -> Result<Notification, String> {
    let name = document["name"]
        .as_str()
        .ok_or_else(|| "document has no name".to_string())?;
    let mut fields = plain_fields(&document["fields"])?;
    fields.insert("id".to_string(), json!(document_id(name)));
    serde_json::from_value(Value::Object(fields)).map_err(|e| format!("{name}: {e}"))
}

fn string_or_null(value: Option<&str>) -> Value {
    match value {
        Some(value) => json!({ "stringValue": value }),
        None => json!({ "nullValue": null }),
    }
}

fn typed_fields(draft: &NotificationDraft, sender: &UserId) -> Value {
    let expires_at = match draft.expires_at {
        Some(expires_at) => {
            json!({ "timestampValue": expires_at.to_rfc3339_opts(SecondsFormat::Micros, true) })
        }
        None => json!({ "nullValue": null }),
    };
    json!({
        "title": { "stringValue": draft.title },
        "message": { "stringValue": draft.message },
        "type": { "stringValue": draft.kind.as_str() },
        "recipient_id": string_or_null(draft.recipient_id.as_ref().map(UserId::as_str)),
        "sender_id": { "stringValue": sender },
        "read": { "booleanValue": false },
        "expires_at": expires_at,
    })
}

/// Opens one `Listen` target per channel.
pub struct FirestoreListener<T> {
    transport: T,
    config: FirestoreConfig,
    collection: String,
}

impl<T: Transport> FirestoreListener<T> {
    pub fn new(transport: T, config: FirestoreConfig) -> Self {
        Self {
            transport,
            config,
            collection: NOTIFICATIONS_COLLECTION.to_string(),
        }
    }

    fn listen_request(&self, filter: &RecipientFilter) -> ListenRequest {
        ListenRequest {
            topic: format!("firestore:{}:{}", self.collection, filter.origin()),
            payload: json!({
                "database": self.config.database(),
                "addTarget": {
                    "query": {
                        "parent": self.config.documents(),
                        "structuredQuery": structured_query(&self.collection, filter),
                    },
                    "targetId": target_id(filter.origin()),
                },
            }),
        }
    }
}

impl<T: Transport> StreamAdapter for FirestoreListener<T> {
    fn open(
        &self,
        filter: RecipientFilter,
        handler: DeliveryHandler,
    ) -> Result<Subscription, ChannelError> {
        let request = self.listen_request(&filter);
        let decoder = ListenDecoder {
            target_id: target_id(filter.origin()),
            filter,
            seen: HashSet::new(),
        };
        listen_with(
            &self.transport,
            decoder.filter.origin(),
            request,
            decoder,
            handler,
        )
    }
}

struct ListenDecoder {
    filter: RecipientFilter,
    target_id: i64,
    seen: HashSet<NotificationId>,
}

impl ListenDecoder {
    fn targets(&self, change: &Value, key: &str) -> bool {
        change[key]
            .as_array()
            .is_some_and(|ids| ids.iter().any(|id| id.as_i64() == Some(self.target_id)))
    }

    fn target_change(&mut self, change: &Value) -> Decoded {
        if let Some(cause) = change.get("cause") {
            let reason = cause["message"].as_str().unwrap_or("listen target removed");
            return Decoded::Failed(reason.to_string());
        }
        if change["targetChangeType"] == "RESET" {
            log::debug!("Listen target reset, expecting a resend");
            self.seen.clear();
        }
        Decoded::Ignored
    }

    fn document_change(&mut self, change: &Value) -> Decoded {
        let document = &change["document"];
        if !self.targets(change, "targetIds") {
            return match (
                self.targets(change, "removedTargetIds"),
                document["name"].as_str(),
            ) {
                (true, Some(name)) => self.gone(document_id(name)),
                _ => Decoded::Ignored,
            };
        }

        let record = match decode_document(document) {
            Ok(record) => record,
            Err(e) => {
                log::warn!("Skipping malformed document: {e}");
                return Decoded::Ignored;
            }
        };
        if !self.filter.matches(record.recipient_id.as_ref()) {
            return self.gone(record.id);
        }

        let change = if self.seen.insert(record.id.clone()) {
            ChangeEvent::Insert(record)
        } else {
            ChangeEvent::Update(record)
        };
        Decoded::Changes(vec![change])
    }

    fn gone(&mut self, id: NotificationId) -> Decoded {
        if self.seen.remove(&id) {
            Decoded::Changes(vec![ChangeEvent::delete(id)])
        } else {
            Decoded::Ignored
        }
    }
}

impl FrameDecoder for ListenDecoder {
    fn decode(&mut self, frame: Value) -> Decoded {
        if let Some(change) = frame.get("targetChange") {
            return self.target_change(change);
        }
        if let Some(change) = frame.get("documentChange") {
            return self.document_change(change);
        }
        // an explicit delete always goes through, even for ids this channel never reported
        for key in ["documentDelete", "documentRemove"] {
            if let Some(name) = frame[key]["document"].as_str() {
                let id = document_id(name);
                self.seen.remove(&id);
                return Decoded::Changes(vec![ChangeEvent::delete(id)]);
            }
        }
        Decoded::Ignored
    }

    fn reconnected(&mut self) {
        self.seen.clear();
    }
}

/// Round trips through the Firestore REST API, authenticated with the user's ID token.
pub struct FirestoreBackend {
    client: reqwest::Client,
    config: FirestoreConfig,
    id_token: String,
    collection: String,
}

impl FirestoreBackend {
    pub fn new(config: FirestoreConfig, id_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            id_token: id_token.into(),
            collection: NOTIFICATIONS_COLLECTION.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}{path}",
            self.config.base_url.trim_end_matches('/'),
            self.config.documents()
        )
    }

    fn document_url(&self, id: &NotificationId) -> String {
        self.url(&format!("/{}/{id}", self.collection))
    }

    /// A 404 becomes [`Error::NotFound`] when `id` is given.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
        id: Option<&NotificationId>,
    ) -> Result<Value, Error> {
        let response = request
            .query(&[("key", &self.config.api_key)])
            .bearer_auth(&self.id_token)
            .send()
            .await
            .map_err(|e| Error::transport(&format!("Failed to {context}"), e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(&format!("Failed to read {context} response"), e))?;

        if let (reqwest::StatusCode::NOT_FOUND, Some(id)) = (status, id) {
            return Err(Error::NotFound(id.clone()));
        }
        if !status.is_success() {
            return Err(Error::Transport(format!(
                "Failed to {context}: {status} {body}"
            )));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| {
            Error::Transport(format!(
                "Failed to parse {context} response: {e}\nResponse body: {body}"
            ))
        })
    }

    async fn run_query(&self, filter: RecipientFilter) -> Result<Vec<Notification>, Error> {
        let request = self
            .client
            .post(self.url(":runQuery"))
            .json(&json!({ "structuredQuery": structured_query(&self.collection, &filter) }));
        let results = self
            .send(request, &format!("query {} notifications", filter.origin()), None)
            .await?;

        Ok(results
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .filter(|result| result.get("document").is_some())
            .filter_map(|result| {
                decode_document(&result["document"])
                    .inspect_err(|e| log::warn!("Skipping malformed document: {e}"))
                    .ok()
            })
            .collect())
    }
}

impl NotificationBackend for FirestoreBackend {
    async fn fetch(&self, viewer: &UserId) -> Result<Vec<Notification>, Error> {
        let (addressed, broadcast) = futures::try_join!(
            self.run_query(RecipientFilter::Addressed(viewer.clone())),
            self.run_query(RecipientFilter::Broadcast),
        )?;

        let mut notifications: Vec<Notification> = addressed.into_iter().chain(broadcast).collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    async fn create(
        &self,
        draft: &NotificationDraft,
        sender: &UserId,
    ) -> Result<Notification, Error> {
        let id = NotificationId::generate();
        let name = format!("{}/{}/{id}", self.config.documents(), self.collection);
        let request = self.client.post(self.url(":commit")).json(&json!({
            "writes": [{
                "update": { "name": name, "fields": typed_fields(draft, sender) },
                "updateTransforms": [
                    { "fieldPath": "created_at", "setToServerValue": "REQUEST_TIME" }
                ],
                "currentDocument": { "exists": false },
            }]
        }));
        let committed = self.send(request, "create notification", None).await?;

        let created_at = committed["writeResults"][0]["transformResults"][0]["timestampValue"]
            .as_str()
            .or(committed["commitTime"].as_str())
            .and_then(|timestamp| timestamp.parse::<DateTime<Utc>>().ok())
            .ok_or_else(|| {
                Error::Transport(format!("commit response has no timestamp: {committed}"))
            })?;

        Ok(draft
            .clone()
            .into_notification(id, Some(sender.clone()), created_at))
    }

    async fn set_read(&self, id: &NotificationId) -> Result<(), Error> {
        let request = self
            .client
            .patch(self.document_url(id))
            .query(&[
                ("updateMask.fieldPaths", "read"),
                ("currentDocument.exists", "true"),
            ])
            .json(&json!({ "fields": { "read": { "booleanValue": true } } }));
        self.send(request, "mark notification as read", Some(id))
            .await
            .map(drop)
    }

    async fn delete(&self, id: &NotificationId) -> Result<(), Error> {
        let request = self
            .client
            .delete(self.document_url(id))
            .query(&[("currentDocument.exists", "true")]);
        self.send(request, "delete notification", Some(id))
            .await
            .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{Delivery, TransportMessage};
    use crate::testing::MockTransport;
    use mockito::Matcher;
    use std::{cell::RefCell, rc::Rc};

    const DOCUMENTS: &str = "projects/orbit/databases/(default)/documents";

    fn config(base_url: String) -> FirestoreConfig {
        FirestoreConfig {
            base_url,
            ..FirestoreConfig::new("orbit", "api-key")
        }
    }

    fn recording_handler() -> (Rc<RefCell<Vec<Delivery>>>, DeliveryHandler) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        (seen, Box::new(move |delivery| sink.borrow_mut().push(delivery)))
    }

    fn document(id: &str, recipient: Option<&str>, read: bool) -> Value {
        json!({
            "name": format!("{DOCUMENTS}/notifications/{id}"),
            "fields": {
                "title": { "stringValue": "Dues reminder" },
                "message": { "stringValue": "Spring dues are due Friday" },
                "type": { "stringValue": "warning" },
                "recipient_id": string_or_null(recipient),
                "sender_id": { "stringValue": "treasurer" },
                "read": { "booleanValue": read },
                "created_at": { "timestampValue": "2024-03-01T12:00:00.123456Z" },
                "expires_at": { "nullValue": null },
            },
            "createTime": "2024-03-01T12:00:00.123456Z",
            "updateTime": "2024-03-01T12:00:00.123456Z",
        })
    }

    fn document_change(id: &str, recipient: Option<&str>, read: bool, target: i64) -> Value {
        json!({
            "documentChange": {
                "document": document(id, recipient, read),
                "targetIds": [target],
            }
        })
    }

    fn ops(seen: &[Delivery]) -> Vec<(String, &'static str)> {
        seen.iter()
            .filter_map(|delivery| match delivery {
                Delivery::Change(change) => Some((change.id().to_string(), change.op())),
                Delivery::Failed(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_decodes_typed_values() {
        let record = decode_document(&document("n1", Some("u1"), true)).unwrap();
        assert_eq!(record.id.as_str(), "n1");
        assert_eq!(record.recipient_id, Some(UserId::new("u1")));
        assert!(record.read);
        assert_eq!(record.expires_at, None);

        let nested = plain_value(&json!({
            "mapValue": { "fields": {
                "count": { "integerValue": "42" },
                "tags": { "arrayValue": { "values": [{ "stringValue": "a" }] } },
            }}
        }))
        .unwrap();
        assert_eq!(nested, json!({ "count": 42, "tags": ["a"] }));
        assert!(plain_value(&json!({ "geoPointValue": {} })).is_err());
    }

    #[test]
    fn test_listen_request() {
        let listener = FirestoreListener::new(
            MockTransport::default(),
            FirestoreConfig::new("orbit", "k"),
        );
        let request = listener.listen_request(&RecipientFilter::Broadcast);
        assert_eq!(request.topic, "firestore:notifications:broadcast");
        assert_eq!(request.payload["addTarget"]["targetId"], 2);
        assert_eq!(
            request.payload["addTarget"]["query"]["structuredQuery"]["where"]["unaryFilter"]["op"],
            "IS_NULL"
        );
        assert_eq!(request.payload["addTarget"]["query"]["parent"], DOCUMENTS);
    }

    #[test]
    fn test_first_sighting_is_an_insert() {
        let listener = FirestoreListener::new(
            MockTransport::default(),
            FirestoreConfig::new("orbit", "k"),
        );
        let (seen, handler) = recording_handler();
        let _subscription = listener
            .open(RecipientFilter::Addressed(UserId::new("u1")), handler)
            .unwrap();

        let transport = &listener.transport;
        transport.frame(0, json!({ "targetChange": { "targetChangeType": "ADD", "targetIds": [1] } }));
        transport.frame(0, document_change("n1", Some("u1"), false, 1));
        transport.frame(0, document_change("n1", Some("u1"), true, 1));
        transport.frame(
            0,
            json!({ "documentDelete": { "document": format!("{DOCUMENTS}/notifications/n1"), "removedTargetIds": [1] } }),
        );
        transport.frame(0, document_change("n1", Some("u1"), true, 1));

        assert_eq!(
            ops(&seen.borrow()),
            vec![
                ("n1".to_string(), "insert"),
                ("n1".to_string(), "update"),
                ("n1".to_string(), "delete"),
                ("n1".to_string(), "insert"),
            ]
        );
    }

    #[test]
    fn test_document_leaving_the_query_is_a_delete() {
        let listener = FirestoreListener::new(
            MockTransport::default(),
            FirestoreConfig::new("orbit", "k"),
        );
        let (seen, handler) = recording_handler();
        let _subscription = listener.open(RecipientFilter::Broadcast, handler).unwrap();

        let transport = &listener.transport;
        transport.frame(0, document_change("b1", None, false, 2));
        transport.frame(
            0,
            json!({ "documentChange": { "document": document("b1", Some("u9"), false), "targetIds": [], "removedTargetIds": [2] } }),
        );
        transport.frame(
            0,
            json!({ "documentRemove": { "document": format!("{DOCUMENTS}/notifications/b2"), "removedTargetIds": [2] } }),
        );

        assert_eq!(
            ops(&seen.borrow()),
            vec![
                ("b1".to_string(), "insert"),
                ("b1".to_string(), "delete"),
                ("b2".to_string(), "delete"),
            ]
        );
    }

    #[test]
    fn test_reconnect_resends_as_inserts() {
        let listener = FirestoreListener::new(
            MockTransport::default(),
            FirestoreConfig::new("orbit", "k"),
        );
        let (seen, handler) = recording_handler();
        let _subscription = listener.open(RecipientFilter::Broadcast, handler).unwrap();

        let transport = &listener.transport;
        transport.frame(0, document_change("b1", None, false, 2));
        transport.push(0, TransportMessage::Reconnected);
        transport.frame(0, document_change("b1", None, false, 2));

        assert_eq!(
            ops(&seen.borrow()),
            vec![("b1".to_string(), "insert"), ("b1".to_string(), "insert")]
        );
    }

    #[test]
    fn test_target_change_with_cause_fails_the_channel() {
        let listener = FirestoreListener::new(
            MockTransport::default(),
            FirestoreConfig::new("orbit", "k"),
        );
        let (seen, handler) = recording_handler();
        let subscription = listener
            .open(RecipientFilter::Addressed(UserId::new("u1")), handler)
            .unwrap();

        listener.transport.frame(
            0,
            json!({ "targetChange": {
                "targetChangeType": "REMOVE",
                "targetIds": [1],
                "cause": { "code": 7, "message": "Missing or insufficient permissions." },
            }}),
        );

        assert_eq!(
            *seen.borrow(),
            vec![Delivery::Failed(ChannelError {
                origin: Origin::Addressed,
                reason: "Missing or insufficient permissions.".to_string(),
            })]
        );
        assert!(subscription.has_failed());
    }

    #[tokio::test]
    async fn test_fetch_merges_both_queries() {
        let mut server = mockito::Server::new_async().await;
        let path = format!("/{DOCUMENTS}:runQuery");
        let addressed = server
            .mock("POST", path.as_str())
            .match_query(Matcher::UrlEncoded("key".into(), "api-key".into()))
            .match_header("authorization", "Bearer id-token")
            .match_body(Matcher::PartialJson(json!({
                "structuredQuery": { "where": { "fieldFilter": { "op": "EQUAL" } } }
            })))
            .with_status(200)
            .with_body(
                json!([
                    { "document": document("mine", Some("u1"), false), "readTime": "2024-03-02T00:00:00Z" }
                ])
                .to_string(),
            )
            .create_async()
            .await;
        let broadcast = server
            .mock("POST", path.as_str())
            .match_body(Matcher::PartialJson(json!({
                "structuredQuery": { "where": { "unaryFilter": { "op": "IS_NULL" } } }
            })))
            .with_status(200)
            .with_body(
                json!([
                    { "document": document("all", None, false), "readTime": "2024-03-02T00:00:00Z" },
                    { "readTime": "2024-03-02T00:00:00Z" }
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let backend = FirestoreBackend::new(config(server.url()), "id-token");
        let fetched = backend.fetch(&UserId::new("u1")).await.unwrap();

        addressed.assert_async().await;
        broadcast.assert_async().await;
        let mut ids: Vec<&str> = fetched.iter().map(|n| n.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["all", "mine"]);
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _patch = server
            .mock("PATCH", format!("/{DOCUMENTS}/notifications/gone").as_str())
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("updateMask.fieldPaths".into(), "read".into()),
                Matcher::UrlEncoded("currentDocument.exists".into(), "true".into()),
            ]))
            .with_status(404)
            .with_body(r#"{"error":{"code":404,"status":"NOT_FOUND"}}"#)
            .create_async()
            .await;
        let _delete = server
            .mock("DELETE", format!("/{DOCUMENTS}/notifications/gone").as_str())
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let backend = FirestoreBackend::new(config(server.url()), "id-token");
        let gone = NotificationId::new("gone");
        assert_eq!(backend.set_read(&gone).await, Err(Error::NotFound(gone.clone())));
        assert_eq!(backend.delete(&gone).await, Err(Error::NotFound(gone)));
    }

    #[tokio::test]
    async fn test_create_uses_server_timestamp() {
        let mut server = mockito::Server::new_async().await;
        let _commit = server
            .mock("POST", format!("/{DOCUMENTS}:commit").as_str())
            .match_query(Matcher::Any)
            .match_body(Matcher::Regex("REQUEST_TIME".to_string()))
            .with_status(200)
            .with_body(
                json!({
                    "writeResults": [{
                        "updateTime": "2024-03-03T09:30:00.5Z",
                        "transformResults": [{ "timestampValue": "2024-03-03T09:30:00.5Z" }],
                    }],
                    "commitTime": "2024-03-03T09:30:00.5Z",
                })
                .to_string(),
            )
            .create_async()
            .await;

        let backend = FirestoreBackend::new(config(server.url()), "id-token");
        let draft = NotificationDraft::addressed(UserId::new("u1"), "Hi", "Welcome aboard");
        let created = backend.create(&draft, &UserId::new("admin")).await.unwrap();

        assert_eq!(created.recipient_id, Some(UserId::new("u1")));
        assert_eq!(created.sender_id, Some(UserId::new("admin")));
        assert_eq!(
            created.created_at,
            "2024-03-03T09:30:00.5Z".parse::<DateTime<Utc>>().unwrap()
        );
        assert!(!created.read);
    }
}
