//! Error types for the replica cache.
//!
//! Three families, with distinct propagation rules:
//! - [`ValidationError`]: synchronous, blocks a mutation before any store
//!   or network effect.
//! - [`SyncError`]: a remote call failed; the optimistic local state is
//!   kept, the caller decides what to tell the user.
//! - [`DecodeError`]: a malformed wire payload; swallowed (logged and
//!   dropped) at the mapper and reconciler boundaries.

use thiserror::Error;
use uuid::Uuid;

use crate::models::PersonKey;

/// A local invariant would be violated; the mutation was rejected before
/// touching the store or the network.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("a person with identity number '{0}' already exists")]
    DuplicatePerson(PersonKey),

    #[error("an offering with id '{0}' already exists")]
    DuplicateOffering(String),

    #[error("'{person}' is already enrolled in '{offering}'")]
    DuplicateEnrollment { person: PersonKey, offering: String },

    #[error("no person with identity number '{0}'")]
    UnknownPerson(PersonKey),

    #[error("no offering with id '{0}'")]
    UnknownOffering(String),

    #[error("no enrollment with id '{0}'")]
    UnknownEnrollment(Uuid),
}

/// A remote write or fetch failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("server returned {0}")]
    Http(String),

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

/// A wire payload could not be mapped to a local record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("missing key field '{0}'")]
    MissingKey(&'static str),

    #[error("invalid payload: {0}")]
    Invalid(String),
}

/// Caller-facing error for gateway mutations.
///
/// `Sync` means the local change was already applied and kept; only the
/// remote confirmation failed.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("remote write failed, local change kept: {0}")]
    Sync(#[from] SyncError),
}
