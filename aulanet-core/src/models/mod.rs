mod collection;
mod enrollment;
mod offering;
mod person;

pub use collection::Collection;
pub use enrollment::{Enrollment, EnrollmentStatus, EnrollmentUpdate};
pub use offering::{Offering, OfferingCategory, OfferingUpdate};
pub use person::{AccessLevel, Person, PersonKey, PersonUpdate};
