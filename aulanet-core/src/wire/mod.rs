//! Wire representations of the three record types and the mappers
//! between wire and local form.
//!
//! Mappers are total: every field absent on the wire maps to an explicit
//! default. The only way a record fails to map is a missing or blank key.
//! No I/O, no side effects.

mod enrollment;
mod offering;
mod person;

pub use enrollment::WireEnrollment;
pub use offering::WireOffering;
pub use person::WirePerson;
