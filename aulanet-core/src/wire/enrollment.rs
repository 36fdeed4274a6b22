use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::DecodeError;
use crate::models::{Enrollment, EnrollmentStatus, PersonKey};

/// An enrollment record as the remote store delivers it.
///
/// The `grades` field is the one field that needs defensive decoding:
/// the underlying array encoding legally delivers it either as a native
/// list of numbers or as a delimited string.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WireEnrollment {
    pub id: Option<String>,
    pub rut: Option<String>,
    pub offering_id: Option<String>,
    pub status: Option<String>,
    pub grades: Option<Value>,
    pub final_grade: Option<f64>,
    pub attendance: Option<f64>,
    pub notes: Option<String>,
}

impl WireEnrollment {
    /// Maps the wire record into its local form.
    ///
    /// Fails only when the id is missing or not a UUID. Unparseable
    /// grade entries are dropped, never fatal.
    pub fn into_local(self) -> Result<Enrollment, DecodeError> {
        let id = self
            .id
            .as_deref()
            .ok_or(DecodeError::MissingKey("id"))
            .and_then(|raw| {
                Uuid::parse_str(raw.trim())
                    .map_err(|e| DecodeError::Invalid(format!("enrollment id '{}': {}", raw, e)))
            })?;

        let status = self
            .status
            .as_deref()
            .and_then(|s| s.parse::<EnrollmentStatus>().ok())
            .unwrap_or_default();

        Ok(Enrollment {
            id,
            person: PersonKey::new(self.rut.as_deref().unwrap_or("")),
            offering: self.offering_id.unwrap_or_default(),
            status,
            scores: self.grades.as_ref().map(decode_scores).unwrap_or_default(),
            final_score: self.final_grade,
            attendance: self.attendance,
            notes: self.notes,
        })
    }

    /// Builds the wire form of a local enrollment.
    pub fn from_local(enrollment: &Enrollment) -> Self {
        Self {
            id: Some(enrollment.id.to_string()),
            rut: Some(enrollment.person.as_str().to_string()),
            offering_id: Some(enrollment.offering.clone()),
            status: Some(enrollment.status.to_string()),
            grades: Some(Value::Array(
                enrollment
                    .scores
                    .iter()
                    .filter_map(|s| serde_json::Number::from_f64(*s).map(Value::Number))
                    .collect(),
            )),
            final_grade: enrollment.final_score,
            attendance: enrollment.attendance,
            notes: enrollment.notes.clone(),
        }
    }
}

/// Decodes the score list from whichever shape the wire delivered.
///
/// Accepts a native number list, a delimited string, a lone number, or a
/// heterogeneous list; entries that do not parse as numbers are dropped.
fn decode_scores(value: &Value) -> Vec<f64> {
    match value {
        Value::Array(items) => items.iter().filter_map(score_entry).collect(),
        Value::String(text) => text
            .split([',', ';'])
            .filter_map(|piece| piece.trim().parse::<f64>().ok())
            .collect(),
        Value::Number(n) => n.as_f64().into_iter().collect(),
        _ => Vec::new(),
    }
}

fn score_entry(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
