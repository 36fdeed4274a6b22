use std::fmt;
use std::str::FromStr;

/// The three record collections held by the replica store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    People,
    Offerings,
    Enrollments,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::People,
        Collection::Offerings,
        Collection::Enrollments,
    ];

    /// Collection name as it appears on the wire and in URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::People => "people",
            Collection::Offerings => "offerings",
            Collection::Enrollments => "enrollments",
        }
    }

    /// Name of the key field in wire payloads for this collection.
    pub fn key_field(&self) -> &'static str {
        match self {
            Collection::People => "rut",
            Collection::Offerings => "id",
            Collection::Enrollments => "id",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "people" => Ok(Collection::People),
            "offerings" => Ok(Collection::Offerings),
            "enrollments" => Ok(Collection::Enrollments),
            _ => Err(format!("Unknown collection '{}'", s)),
        }
    }
}
