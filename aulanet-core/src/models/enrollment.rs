use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::person::PersonKey;

/// Status of an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnrollmentStatus {
    Registered,
    Approved,
    Failed,
    NotTaken,
    Pending,
}

impl Default for EnrollmentStatus {
    fn default() -> Self {
        EnrollmentStatus::Registered
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrollmentStatus::Registered => write!(f, "registered"),
            EnrollmentStatus::Approved => write!(f, "approved"),
            EnrollmentStatus::Failed => write!(f, "failed"),
            EnrollmentStatus::NotTaken => write!(f, "not-taken"),
            EnrollmentStatus::Pending => write!(f, "pending"),
        }
    }
}

impl FromStr for EnrollmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "registered" => Ok(EnrollmentStatus::Registered),
            "approved" => Ok(EnrollmentStatus::Approved),
            "failed" => Ok(EnrollmentStatus::Failed),
            "not-taken" | "not_taken" => Ok(EnrollmentStatus::NotTaken),
            "pending" => Ok(EnrollmentStatus::Pending),
            _ => Err(format!(
                "Invalid status '{}'. Valid options: registered, approved, failed, not-taken, pending",
                s
            )),
        }
    }
}

/// One person's enrollment in one offering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Enrollment {
    pub id: Uuid,
    pub person: PersonKey,
    pub offering: String,
    pub status: EnrollmentStatus,
    pub scores: Vec<f64>,
    pub final_score: Option<f64>,
    pub attendance: Option<f64>,
    pub notes: Option<String>,
}

impl Enrollment {
    pub fn new(person: PersonKey, offering: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            person,
            offering: offering.into(),
            status: EnrollmentStatus::default(),
            scores: Vec::new(),
            final_score: None,
            attendance: None,
            notes: None,
        }
    }

    pub fn with_status(mut self, status: EnrollmentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_scores(mut self, scores: Vec<f64>) -> Self {
        self.scores = scores;
        self
    }

    pub fn with_attendance(mut self, attendance: f64) -> Self {
        self.attendance = Some(attendance);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Average of the recorded scores, if any.
    pub fn score_average(&self) -> Option<f64> {
        if self.scores.is_empty() {
            return None;
        }
        Some(self.scores.iter().sum::<f64>() / self.scores.len() as f64)
    }
}

impl fmt::Display for Enrollment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {} [{}]", self.person, self.offering, self.status)?;
        if let Some(avg) = self.score_average() {
            write!(f, " avg {:.1}", avg)?;
        }
        if let Some(attendance) = self.attendance {
            write!(f, " attendance {:.0}%", attendance)?;
        }
        Ok(())
    }
}

/// Partial update for an enrollment. `None` fields are left untouched;
/// a present score list replaces the whole list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrollmentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EnrollmentStatus>,
    #[serde(rename = "grades", skip_serializing_if = "Option::is_none")]
    pub scores: Option<Vec<f64>>,
    #[serde(rename = "final_grade", skip_serializing_if = "Option::is_none")]
    pub final_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl EnrollmentUpdate {
    pub fn apply(&self, enrollment: &mut Enrollment) -> bool {
        let mut changed = false;
        if let Some(status) = self.status {
            if enrollment.status != status {
                enrollment.status = status;
                changed = true;
            }
        }
        if let Some(scores) = &self.scores {
            if &enrollment.scores != scores {
                enrollment.scores = scores.clone();
                changed = true;
            }
        }
        if let Some(final_score) = self.final_score {
            if enrollment.final_score != Some(final_score) {
                enrollment.final_score = Some(final_score);
                changed = true;
            }
        }
        if let Some(attendance) = self.attendance {
            if enrollment.attendance != Some(attendance) {
                enrollment.attendance = Some(attendance);
                changed = true;
            }
        }
        if let Some(notes) = &self.notes {
            if enrollment.notes.as_deref() != Some(notes) {
                enrollment.notes = Some(notes.clone());
                changed = true;
            }
        }
        changed
    }
}
