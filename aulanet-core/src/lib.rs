//! Aulanet Core Library
//!
//! The local replica cache for the academic records service: an
//! in-memory mirror of the people, offerings and enrollments
//! collections, kept consistent under optimistic local mutations and
//! the remote store's change feed.

pub mod error;
pub mod feed;
pub mod gateway;
pub mod models;
pub mod reconciler;
pub mod reload;
pub mod remote;
pub mod store;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{DecodeError, GatewayError, SyncError, ValidationError};
pub use gateway::{BatchOutcome, Gateway};
pub use models::{
    AccessLevel, Collection, Enrollment, EnrollmentStatus, EnrollmentUpdate, Offering,
    OfferingCategory, OfferingUpdate, Person, PersonKey, PersonUpdate,
};
pub use reconciler::{ChangeEvent, EventKind, Reconciler};
pub use reload::ReloadCoordinator;
pub use remote::{HttpRemote, RemoteStore, RemoteWrite};
pub use store::{Record, RecordKey, ReplicaStore, SharedStore, Snapshot};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
