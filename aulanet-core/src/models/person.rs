use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A person's national identity number in canonical form.
///
/// The same identity number arrives in many textual shapes
/// ("12.345.678-9", "12345678-9", with or without padding zeros).
/// The canonical form strips every non-alphanumeric character, drops
/// leading zeros and lowercases the check digit, so that any variant
/// of the same identity resolves to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonKey(String);

impl PersonKey {
    /// Normalizes a raw identity number into its canonical form.
    ///
    /// Total: any input produces a key, possibly the empty one.
    /// Callers that require a usable key check `is_empty`.
    pub fn new(raw: &str) -> Self {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        let trimmed = cleaned.trim_start_matches('0');
        let canonical = if trimmed.is_empty() && !cleaned.is_empty() {
            // An all-zero number still normalizes to something stable.
            "0".to_string()
        } else {
            trimmed.to_string()
        };

        Self(canonical)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PersonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Access level granted to a person within the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Admin,
    Coordinator,
    Instructor,
    Student,
}

impl Default for AccessLevel {
    fn default() -> Self {
        AccessLevel::Student
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::Admin => write!(f, "admin"),
            AccessLevel::Coordinator => write!(f, "coordinator"),
            AccessLevel::Instructor => write!(f, "instructor"),
            AccessLevel::Student => write!(f, "student"),
        }
    }
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(AccessLevel::Admin),
            "coordinator" => Ok(AccessLevel::Coordinator),
            "instructor" => Ok(AccessLevel::Instructor),
            "student" => Ok(AccessLevel::Student),
            _ => Err(format!(
                "Invalid access level '{}'. Valid options: admin, coordinator, instructor, student",
                s
            )),
        }
    }
}

/// A person known to the academic records service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Person {
    pub rut: PersonKey,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub faculty: String,
    pub department: String,
    pub career: String,
    pub contract_type: String,
    pub access_level: AccessLevel,
    /// Set by the authentication service; the cache never reads or writes it.
    pub password_hash: Option<String>,
}

impl Person {
    pub fn new(rut: &str, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            rut: PersonKey::new(rut),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: String::new(),
            phone: String::new(),
            faculty: String::new(),
            department: String::new(),
            career: String::new(),
            contract_type: String::new(),
            access_level: AccessLevel::default(),
            password_hash: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn with_faculty(mut self, faculty: impl Into<String>) -> Self {
        self.faculty = faculty.into();
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    pub fn with_career(mut self, career: impl Into<String>) -> Self {
        self.career = career.into();
        self
    }

    pub fn with_contract_type(mut self, contract_type: impl Into<String>) -> Self {
        self.contract_type = contract_type.into();
        self
    }

    pub fn with_access_level(mut self, access_level: AccessLevel) -> Self {
        self.access_level = access_level;
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.full_name(), self.rut)?;
        if !self.email.is_empty() {
            write!(f, " <{}>", self.email)?;
        }
        write!(f, " [{}]", self.access_level)
    }
}

/// Partial update for a person. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersonUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faculty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub career: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_level: Option<AccessLevel>,
}

impl PersonUpdate {
    /// Applies the update to a person, returning whether anything changed.
    pub fn apply(&self, person: &mut Person) -> bool {
        let mut changed = false;
        apply_field(&mut person.first_name, &self.first_name, &mut changed);
        apply_field(&mut person.last_name, &self.last_name, &mut changed);
        apply_field(&mut person.email, &self.email, &mut changed);
        apply_field(&mut person.phone, &self.phone, &mut changed);
        apply_field(&mut person.faculty, &self.faculty, &mut changed);
        apply_field(&mut person.department, &self.department, &mut changed);
        apply_field(&mut person.career, &self.career, &mut changed);
        apply_field(&mut person.contract_type, &self.contract_type, &mut changed);
        if let Some(level) = self.access_level {
            if person.access_level != level {
                person.access_level = level;
                changed = true;
            }
        }
        changed
    }
}

pub(crate) fn apply_field<T: PartialEq + Clone>(
    target: &mut T,
    source: &Option<T>,
    changed: &mut bool,
) {
    if let Some(value) = source {
        if target != value {
            *target = value.clone();
            *changed = true;
        }
    }
}
