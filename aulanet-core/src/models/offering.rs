use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::person::apply_field;

/// Category of an academic offering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferingCategory {
    Course,
    Workshop,
    Seminar,
    Diploma,
}

impl Default for OfferingCategory {
    fn default() -> Self {
        OfferingCategory::Course
    }
}

impl fmt::Display for OfferingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfferingCategory::Course => write!(f, "course"),
            OfferingCategory::Workshop => write!(f, "workshop"),
            OfferingCategory::Seminar => write!(f, "seminar"),
            OfferingCategory::Diploma => write!(f, "diploma"),
        }
    }
}

impl FromStr for OfferingCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "course" => Ok(OfferingCategory::Course),
            "workshop" => Ok(OfferingCategory::Workshop),
            "seminar" => Ok(OfferingCategory::Seminar),
            "diploma" => Ok(OfferingCategory::Diploma),
            _ => Err(format!(
                "Invalid category '{}'. Valid options: course, workshop, seminar, diploma",
                s
            )),
        }
    }
}

/// An academic offering (a course instance, workshop, etc).
///
/// The id is assigned upstream as a composite of code, year, period and
/// version; the cache treats it as an opaque string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Offering {
    pub id: String,
    pub name: String,
    pub category: OfferingCategory,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub capacity: Option<u32>,
    pub location: String,
}

impl Offering {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: OfferingCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            starts_on: None,
            ends_on: None,
            capacity: None,
            location: String::new(),
        }
    }

    pub fn with_dates(mut self, starts_on: NaiveDate, ends_on: NaiveDate) -> Self {
        self.starts_on = Some(starts_on);
        self.ends_on = Some(ends_on);
        self
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }
}

impl fmt::Display for Offering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} ({})", self.id, self.name, self.category)?;
        if let (Some(from), Some(to)) = (self.starts_on, self.ends_on) {
            write!(f, " {} to {}", from, to)?;
        }
        Ok(())
    }
}

/// Partial update for an offering. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OfferingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<OfferingCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl OfferingUpdate {
    pub fn apply(&self, offering: &mut Offering) -> bool {
        let mut changed = false;
        apply_field(&mut offering.name, &self.name, &mut changed);
        apply_field(&mut offering.location, &self.location, &mut changed);
        if let Some(category) = self.category {
            if offering.category != category {
                offering.category = category;
                changed = true;
            }
        }
        if let Some(date) = self.starts_on {
            if offering.starts_on != Some(date) {
                offering.starts_on = Some(date);
                changed = true;
            }
        }
        if let Some(date) = self.ends_on {
            if offering.ends_on != Some(date) {
                offering.ends_on = Some(date);
                changed = true;
            }
        }
        if let Some(capacity) = self.capacity {
            if offering.capacity != Some(capacity) {
                offering.capacity = Some(capacity);
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_str() {
        assert_eq!(
            OfferingCategory::from_str("workshop").unwrap(),
            OfferingCategory::Workshop
        );
        assert_eq!(
            OfferingCategory::from_str("DIPLOMA").unwrap(),
            OfferingCategory::Diploma
        );
        assert!(OfferingCategory::from_str("bootcamp").is_err());
    }

    #[test]
    fn test_offering_new() {
        let offering = Offering::new("MAT101-2026-1-v1", "Calculus I", OfferingCategory::Course);
        assert_eq!(offering.id, "MAT101-2026-1-v1");
        assert!(offering.starts_on.is_none());
        assert!(offering.capacity.is_none());
    }

    #[test]
    fn test_offering_builder() {
        let offering = Offering::new("TAL-01", "Welding", OfferingCategory::Workshop)
            .with_dates(
                NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
            )
            .with_capacity(25)
            .with_location("Lab B");
        assert_eq!(offering.capacity, Some(25));
        assert_eq!(offering.location, "Lab B");
        assert!(offering.starts_on < offering.ends_on);
    }

    #[test]
    fn test_offering_update_apply() {
        let mut offering = Offering::new("TAL-01", "Welding", OfferingCategory::Workshop);
        let update = OfferingUpdate {
            capacity: Some(30),
            ..Default::default()
        };
        assert!(update.apply(&mut offering));
        assert_eq!(offering.capacity, Some(30));
        assert_eq!(offering.name, "Welding");
        assert!(!update.apply(&mut offering));
    }
}
