use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::models::{AccessLevel, Person, PersonKey};

/// A person record as the remote store delivers it. Every field is
/// optional; the mapper supplies defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WirePerson {
    pub rut: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub faculty: Option<String>,
    pub department: Option<String>,
    pub career: Option<String>,
    pub contract_type: Option<String>,
    pub access_level: Option<String>,
    pub password_hash: Option<String>,
}

impl WirePerson {
    /// Maps the wire record into its local form.
    ///
    /// Fails only when the key field is missing or blank. An unknown
    /// access level falls back to the default rather than rejecting the
    /// whole record.
    pub fn into_local(self) -> Result<Person, DecodeError> {
        let rut = PersonKey::new(self.rut.as_deref().unwrap_or(""));
        if rut.is_empty() {
            return Err(DecodeError::MissingKey("rut"));
        }

        let access_level = self
            .access_level
            .as_deref()
            .and_then(|s| s.parse::<AccessLevel>().ok())
            .unwrap_or_default();

        Ok(Person {
            rut,
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
            faculty: self.faculty.unwrap_or_default(),
            department: self.department.unwrap_or_default(),
            career: self.career.unwrap_or_default(),
            contract_type: self.contract_type.unwrap_or_default(),
            access_level,
            password_hash: self.password_hash,
        })
    }

    /// Builds the wire form of a local person.
    pub fn from_local(person: &Person) -> Self {
        Self {
            rut: Some(person.rut.as_str().to_string()),
            first_name: Some(person.first_name.clone()),
            last_name: Some(person.last_name.clone()),
            email: Some(person.email.clone()),
            phone: Some(person.phone.clone()),
            faculty: Some(person.faculty.clone()),
            department: Some(person.department.clone()),
            career: Some(person.career.clone()),
            contract_type: Some(person.contract_type.clone()),
            access_level: Some(person.access_level.to_string()),
            password_hash: person.password_hash.clone(),
        }
    }
}
