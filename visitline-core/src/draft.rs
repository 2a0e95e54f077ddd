use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::prisoner::{PrisonerProfile, RestrictionFlag, VisitorRecord};
use crate::visit::{
    AdditionalSupport, ClosedVisitReason, MainContact, RequestMethod, VisitRestriction, VisitSlot,
    VisitStatus,
};

/// Booking a new visit or editing an existing one. A draft remembers the
/// mode it was started in; it may only be continued in that mode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Book,
    Update,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PrisonerIdentity {
    pub number: String,
    pub name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub location: String,
    #[serde(default)]
    pub restrictions: Vec<RestrictionFlag>,
}

impl PrisonerIdentity {
    pub fn has_closed_restriction(&self) -> bool {
        self.restrictions.iter().any(RestrictionFlag::is_closed)
    }
}

impl From<&PrisonerProfile> for PrisonerIdentity {
    fn from(profile: &PrisonerProfile) -> Self {
        Self {
            number: profile.prisoner_number.clone(),
            name: profile.display_name(),
            date_of_birth: profile.date_of_birth,
            location: profile.location.clone().unwrap_or_default(),
            restrictions: profile.restrictions.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelectedVisitor {
    pub person_id: i64,
    pub name: String,
    pub relationship: String,
    pub adult: bool,
    #[serde(default)]
    pub restrictions: Vec<RestrictionFlag>,
}

impl SelectedVisitor {
    pub fn from_record(record: &VisitorRecord, adult: bool) -> Self {
        Self {
            person_id: record.person_id,
            name: record.display_name(),
            relationship: record.relationship.clone(),
            adult,
            restrictions: record.restrictions.clone(),
        }
    }

    pub fn has_closed_restriction(&self) -> bool {
        self.restrictions.iter().any(RestrictionFlag::is_closed)
    }
}

/// The in-progress visit accumulated across the booking wizard.
///
/// Owned by the staff member's session; `version` increases on every save so
/// stores and logs can tell successive states apart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub mode: Mode,
    pub prison_id: String,
    pub prisoner: PrisonerIdentity,
    #[serde(default)]
    pub visitors: Vec<SelectedVisitor>,
    pub visit_restriction: Option<VisitRestriction>,
    pub closed_visit_reason: Option<ClosedVisitReason>,
    pub visit_slot: Option<VisitSlot>,
    /// Snapshot of the booking being edited; never mutated after population.
    pub original_visit_slot: Option<VisitSlot>,
    pub application_reference: Option<String>,
    pub visit_reference: Option<String>,
    pub visit_status: Option<VisitStatus>,
    pub additional_support: Option<AdditionalSupport>,
    pub main_contact: Option<MainContact>,
    pub request_method: Option<RequestMethod>,
    #[serde(default)]
    pub allow_over_booking: bool,
    #[serde(default)]
    pub override_booking_window: bool,
}

impl Draft {
    pub fn new(mode: Mode, prison_id: &str, prisoner: PrisonerIdentity) -> Self {
        Self {
            version: 0,
            mode,
            prison_id: prison_id.to_string(),
            prisoner,
            visitors: Vec::new(),
            visit_restriction: None,
            closed_visit_reason: None,
            visit_slot: None,
            original_visit_slot: None,
            application_reference: None,
            visit_reference: None,
            visit_status: None,
            additional_support: None,
            main_contact: None,
            request_method: None,
            allow_over_booking: false,
            override_booking_window: false,
        }
    }

    pub fn has_hold(&self) -> bool {
        self.application_reference.is_some()
    }

    pub fn visitor_ids(&self) -> Vec<i64> {
        self.visitors.iter().map(|v| v.person_id).collect()
    }
}
