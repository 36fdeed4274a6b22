//! The request/response boundary to the remote store.
//!
//! [`RemoteStore`] is the seam the gateway and reload coordinator write
//! through; [`HttpRemote`] is the production implementation against the
//! records service REST API. Tests substitute an in-memory fake.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::SyncError;
use crate::models::{
    Enrollment, EnrollmentUpdate, Offering, OfferingUpdate, Person, PersonKey, PersonUpdate,
};
use crate::store::Snapshot;
use crate::wire::{WireEnrollment, WireOffering, WirePerson};

/// One write operation against the remote store.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteWrite {
    InsertPerson(Person),
    UpdatePerson(PersonKey, PersonUpdate),
    DeletePerson(PersonKey),
    InsertOffering(Offering),
    UpdateOffering(String, OfferingUpdate),
    DeleteOffering(String),
    InsertEnrollment(Enrollment),
    UpdateEnrollment(Uuid, EnrollmentUpdate),
    DeleteEnrollment(Uuid),
}

/// Request/response access to the remote store.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Applies one write. The caller has already echoed the change
    /// locally; failure is surfaced, not rolled back.
    async fn apply(&self, write: RemoteWrite) -> Result<(), SyncError>;

    /// Fetches the full, authoritative contents of all three
    /// collections.
    async fn fetch_snapshot(&self) -> Result<Snapshot, SyncError>;
}

/// REST client for the records service.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(server_url: &str, api_key: &str) -> Self {
        Self {
            base_url: normalize_http_url(server_url),
            api_key: api_key.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn collection_path(collection: &str) -> String {
        format!("/api/{}", collection)
    }

    fn record_path(collection: &str, key: &str) -> String {
        format!("/api/{}/{}", collection, urlencoding::encode(key))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, SyncError> {
        let response = request
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| SyncError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SyncError::Http(response.status().to_string()));
        }
        Ok(response)
    }

    async fn post(&self, path: String, body: &impl Serialize) -> Result<(), SyncError> {
        self.send(self.client.post(self.endpoint(&path)).json(body))
            .await?;
        Ok(())
    }

    async fn patch(&self, path: String, body: &impl Serialize) -> Result<(), SyncError> {
        self.send(self.client.patch(self.endpoint(&path)).json(body))
            .await?;
        Ok(())
    }

    async fn delete(&self, path: String) -> Result<(), SyncError> {
        self.send(self.client.delete(self.endpoint(&path))).await?;
        Ok(())
    }

    /// Fetches one collection as raw JSON rows.
    async fn fetch_rows(&self, collection: &str) -> Result<Vec<Value>, SyncError> {
        let response = self
            .send(self.client.get(self.endpoint(&Self::collection_path(collection))))
            .await?;
        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| SyncError::Protocol(e.to_string()))
    }
}

impl RemoteStore for HttpRemote {
    async fn apply(&self, write: RemoteWrite) -> Result<(), SyncError> {
        match write {
            RemoteWrite::InsertPerson(person) => {
                self.post(
                    Self::collection_path("people"),
                    &WirePerson::from_local(&person),
                )
                .await
            }
            RemoteWrite::UpdatePerson(key, update) => {
                self.patch(Self::record_path("people", key.as_str()), &update)
                    .await
            }
            RemoteWrite::DeletePerson(key) => {
                self.delete(Self::record_path("people", key.as_str())).await
            }
            RemoteWrite::InsertOffering(offering) => {
                self.post(
                    Self::collection_path("offerings"),
                    &WireOffering::from_local(&offering),
                )
                .await
            }
            RemoteWrite::UpdateOffering(id, update) => {
                self.patch(Self::record_path("offerings", &id), &update)
                    .await
            }
            RemoteWrite::DeleteOffering(id) => {
                self.delete(Self::record_path("offerings", &id)).await
            }
            RemoteWrite::InsertEnrollment(enrollment) => {
                self.post(
                    Self::collection_path("enrollments"),
                    &WireEnrollment::from_local(&enrollment),
                )
                .await
            }
            RemoteWrite::UpdateEnrollment(id, update) => {
                self.patch(Self::record_path("enrollments", &id.to_string()), &update)
                    .await
            }
            RemoteWrite::DeleteEnrollment(id) => {
                self.delete(Self::record_path("enrollments", &id.to_string()))
                    .await
            }
        }
    }

    async fn fetch_snapshot(&self) -> Result<Snapshot, SyncError> {
        let people = self.fetch_rows("people").await?;
        let offerings = self.fetch_rows("offerings").await?;
        let enrollments = self.fetch_rows("enrollments").await?;

        Ok(Snapshot {
            people: decode_rows::<WirePerson, _>(people, "people", WirePerson::into_local),
            offerings: decode_rows::<WireOffering, _>(
                offerings,
                "offerings",
                WireOffering::into_local,
            ),
            enrollments: decode_rows::<WireEnrollment, _>(
                enrollments,
                "enrollments",
                WireEnrollment::into_local,
            ),
        })
    }
}

/// Decodes fetched rows, dropping the ones that fail with a warning.
/// One malformed remote record must not poison the whole collection.
fn decode_rows<W, T>(
    rows: Vec<Value>,
    collection: &str,
    into_local: impl Fn(W) -> Result<T, crate::error::DecodeError>,
) -> Vec<T>
where
    W: serde::de::DeserializeOwned,
{
    rows.into_iter()
        .filter_map(|row| {
            serde_json::from_value::<W>(row)
                .map_err(|e| crate::error::DecodeError::Invalid(e.to_string()))
                .and_then(&into_local)
                .map_err(|e| {
                    tracing::warn!(collection, error = %e, "dropping undecodable record");
                })
                .ok()
        })
        .collect()
}

/// Normalizes a configured server URL to an http(s) base without a
/// trailing slash.
pub(crate) fn normalize_http_url(server_url: &str) -> String {
    let base = if server_url.starts_with("ws://") {
        server_url.replacen("ws://", "http://", 1)
    } else if server_url.starts_with("wss://") {
        server_url.replacen("wss://", "https://", 1)
    } else if !server_url.starts_with("http://") && !server_url.starts_with("https://") {
        format!("http://{}", server_url)
    } else {
        server_url.to_string()
    };
    base.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_http_url() {
        assert_eq!(normalize_http_url("localhost:8080"), "http://localhost:8080");
        assert_eq!(
            normalize_http_url("http://localhost:8080/"),
            "http://localhost:8080"
        );
        assert_eq!(
            normalize_http_url("wss://records.example.edu"),
            "https://records.example.edu"
        );
        assert_eq!(
            normalize_http_url("ws://localhost:8080"),
            "http://localhost:8080"
        );
    }

    #[test]
    fn test_record_path_encodes_key() {
        assert_eq!(
            HttpRemote::record_path("offerings", "MAT101 2026/1"),
            "/api/offerings/MAT101%202026%2F1"
        );
    }

    #[test]
    fn test_decode_rows_drops_bad_records() {
        let rows = vec![
            json!({"rut": "1-9", "first_name": "Ana"}),
            json!({"first_name": "no key"}),
            json!({"rut": "2-7"}),
        ];
        let people = decode_rows::<WirePerson, _>(rows, "people", WirePerson::into_local);
        assert_eq!(people.len(), 2);
        assert_eq!(people[0].rut.as_str(), "19");
        assert_eq!(people[1].rut.as_str(), "27");
    }
}
