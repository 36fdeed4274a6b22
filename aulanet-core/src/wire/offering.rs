use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::models::{Offering, OfferingCategory};

/// An offering record as the remote store delivers it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WireOffering {
    pub id: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub starts_on: Option<String>,
    pub ends_on: Option<String>,
    pub capacity: Option<u32>,
    pub location: Option<String>,
}

impl WireOffering {
    /// Maps the wire record into its local form.
    ///
    /// Fails only when the id is missing or blank. Unparseable dates and
    /// unknown categories degrade to defaults instead of rejecting the
    /// record.
    pub fn into_local(self) -> Result<Offering, DecodeError> {
        let id = self.id.unwrap_or_default();
        if id.trim().is_empty() {
            return Err(DecodeError::MissingKey("id"));
        }

        let category = self
            .category
            .as_deref()
            .and_then(|s| s.parse::<OfferingCategory>().ok())
            .unwrap_or_default();

        Ok(Offering {
            id,
            name: self.name.unwrap_or_default(),
            category,
            starts_on: self.starts_on.as_deref().and_then(parse_date),
            ends_on: self.ends_on.as_deref().and_then(parse_date),
            capacity: self.capacity,
            location: self.location.unwrap_or_default(),
        })
    }

    /// Builds the wire form of a local offering.
    pub fn from_local(offering: &Offering) -> Self {
        Self {
            id: Some(offering.id.clone()),
            name: Some(offering.name.clone()),
            category: Some(offering.category.to_string()),
            starts_on: offering.starts_on.map(|d| d.to_string()),
            ends_on: offering.ends_on.map(|d| d.to_string()),
            capacity: offering.capacity,
            location: Some(offering.location.clone()),
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}
