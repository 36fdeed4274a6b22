//! The change-feed reconciler.
//!
//! Consumes the at-least-once, unordered stream of remote change events
//! and merges each into the replica store with replace semantics: a feed
//! payload always carries the full authoritative record. Key-equal
//! upserts overwrite in place, which is what resolves the race between
//! the gateway's optimistic insert and the feed's insert for the same
//! write. Malformed events are logged and dropped; one bad event never
//! stalls the stream.

use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::DecodeError;
use crate::models::{Collection, PersonKey};
use crate::store::{Record, RecordKey, SharedStore};
use crate::wire::{WireEnrollment, WireOffering, WirePerson};

/// One change notification pushed by the remote store.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeEvent {
    pub collection: String,
    #[serde(rename = "event")]
    pub kind: EventKind,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Insert,
    Update,
    Delete,
}

/// Merges remote change events into the replica store.
#[derive(Debug, Clone)]
pub struct Reconciler {
    store: SharedStore,
}

impl Reconciler {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Drains the feed channel until it closes, applying each event in
    /// arrival order.
    pub async fn run(self, mut events: mpsc::Receiver<ChangeEvent>) {
        while let Some(event) = events.recv().await {
            self.apply(event);
        }
        tracing::debug!("change feed closed, reconciler stopping");
    }

    /// Applies a single event. Never fails: events that cannot be
    /// applied are logged and dropped.
    pub fn apply(&self, event: ChangeEvent) {
        let collection = match event.collection.parse::<Collection>() {
            Ok(c) => c,
            Err(_) => {
                tracing::warn!(collection = %event.collection, "dropping event for unknown collection");
                return;
            }
        };

        match event.kind {
            // Insert and update both resolve to a replace-upsert; an
            // update arriving before its insert still lands the record.
            EventKind::Insert | EventKind::Update => self.merge(collection, event.payload),
            EventKind::Delete => self.delete(collection, &event.payload),
        }
    }

    fn merge(&self, collection: Collection, payload: Value) {
        match decode_record(collection, payload) {
            Ok(record) => {
                self.store.write(|s| s.upsert(record));
            }
            Err(e) => {
                tracing::warn!(collection = %collection, error = %e, "dropping undecodable event payload");
            }
        }
    }

    fn delete(&self, collection: Collection, payload: &Value) {
        match extract_key(collection, payload) {
            Some(key) => {
                self.store.write(|s| s.remove(&key));
            }
            None => {
                tracing::warn!(collection = %collection, "dropping delete event without a usable key");
            }
        }
    }
}

fn decode_record(collection: Collection, payload: Value) -> Result<Record, DecodeError> {
    match collection {
        Collection::People => serde_json::from_value::<WirePerson>(payload)
            .map_err(|e| DecodeError::Invalid(e.to_string()))
            .and_then(WirePerson::into_local)
            .map(Record::Person),
        Collection::Offerings => serde_json::from_value::<WireOffering>(payload)
            .map_err(|e| DecodeError::Invalid(e.to_string()))
            .and_then(WireOffering::into_local)
            .map(Record::Offering),
        Collection::Enrollments => serde_json::from_value::<WireEnrollment>(payload)
            .map_err(|e| DecodeError::Invalid(e.to_string()))
            .and_then(WireEnrollment::into_local)
            .map(Record::Enrollment),
    }
}

/// Pulls the record key out of a delete payload. The feed may send the
/// full old record or just the key, either as an object or a bare
/// string.
fn extract_key(collection: Collection, payload: &Value) -> Option<RecordKey> {
    let raw = match payload {
        Value::String(s) => s.as_str(),
        Value::Object(_) => payload.get(collection.key_field())?.as_str()?,
        _ => return None,
    };

    match collection {
        Collection::People => {
            let key = PersonKey::new(raw);
            (!key.is_empty()).then(|| RecordKey::Person(key))
        }
        Collection::Offerings => Some(RecordKey::Offering(raw.to_string())),
        Collection::Enrollments => Uuid::parse_str(raw.trim()).ok().map(RecordKey::Enrollment),
    }
}
