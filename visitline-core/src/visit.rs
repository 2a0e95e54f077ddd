use chrono::{NaiveDateTime, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use visitline_shared::Masked;

use crate::CoreError;

/// Visit type: OPEN (social) or CLOSED (non-contact)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisitRestriction {
    Open,
    Closed,
}

impl VisitRestriction {
    pub fn label(&self) -> &'static str {
        match self {
            VisitRestriction::Open => "open",
            VisitRestriction::Closed => "closed",
        }
    }
}

impl FromStr for VisitRestriction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(VisitRestriction::Open),
            "CLOSED" => Ok(VisitRestriction::Closed),
            other => Err(CoreError::ValidationError(format!("unknown visit type {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClosedVisitReason {
    Visitor,
    Prisoner,
}

/// Remote lifecycle of a visit. CANCELLED only ever arrives from outside.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisitStatus {
    Reserved,
    Changing,
    Booked,
    Cancelled,
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VisitStatus::Reserved => "RESERVED",
            VisitStatus::Changing => "CHANGING",
            VisitStatus::Booked => "BOOKED",
            VisitStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

/// How the visit was requested
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestMethod {
    Phone,
    Website,
    Email,
    InPerson,
}

impl RequestMethod {
    pub const ALL: [RequestMethod; 4] = [
        RequestMethod::Phone,
        RequestMethod::Website,
        RequestMethod::Email,
        RequestMethod::InPerson,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            RequestMethod::Phone => "PHONE",
            RequestMethod::Website => "WEBSITE",
            RequestMethod::Email => "EMAIL",
            RequestMethod::InPerson => "IN_PERSON",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RequestMethod::Phone => "Phone call",
            RequestMethod::Website => "GOV.UK",
            RequestMethod::Email => "Email",
            RequestMethod::InPerson => "In person",
        }
    }
}

impl FromStr for RequestMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestMethod::ALL
            .into_iter()
            .find(|method| method.code() == s)
            .ok_or_else(|| CoreError::ValidationError(format!("unknown request method {}", s)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MainContact {
    /// Approved visitor chosen as contact; `None` for "someone else".
    pub contact_id: Option<i64>,
    pub contact_name: String,
    pub phone_number: Option<Masked<String>>,
}

impl MainContact {
    pub fn is_named(&self) -> bool {
        !self.contact_name.trim().is_empty()
    }

    pub fn has_phone_number(&self) -> bool {
        self.phone_number
            .as_ref()
            .is_some_and(|phone| !phone.trim().is_empty())
    }
}

/// Additional support answer. An empty `codes` list means "no support needed".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalSupport {
    pub codes: Vec<String>,
    pub other_details: Option<String>,
}

impl AdditionalSupport {
    pub const OTHER: &'static str = "OTHER";

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_required(&self) -> bool {
        !self.codes.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SupportType {
    pub code: String,
    pub description: String,
}

/// Conflicts the reservation service reports against a session for this prisoner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionConflict {
    NonAssociation,
    DoubleBooked,
}

/// A bookable slot as shown to staff. `id` is only meaningful within the slot
/// list it was generated for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VisitSlot {
    pub id: String,
    pub session_template_reference: String,
    pub prison_id: String,
    pub start_timestamp: NaiveDateTime,
    pub end_timestamp: NaiveDateTime,
    pub capacity: u32,
    pub booked_count: u32,
    pub visit_room: String,
    pub visit_restriction: VisitRestriction,
    #[serde(default)]
    pub session_conflicts: Vec<SessionConflict>,
}

impl VisitSlot {
    pub fn available_tables(&self) -> i64 {
        i64::from(self.capacity) - i64::from(self.booked_count)
    }

    pub fn is_full(&self) -> bool {
        self.booked_count >= self.capacity
    }

    pub fn is_morning(&self) -> bool {
        self.start_timestamp.hour() < 12
    }

    /// Same remote session, regardless of the list-local id.
    pub fn same_session(&self, other: &VisitSlot) -> bool {
        self.session_template_reference == other.session_template_reference
            && self.start_timestamp == other.start_timestamp
            && self.end_timestamp == other.end_timestamp
    }

    pub fn has_blocking_conflict(&self) -> bool {
        !self.session_conflicts.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitVisitor {
    pub person_id: i64,
    #[serde(default)]
    pub visit_contact: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitContact {
    pub name: String,
    pub telephone: Option<String>,
}

/// Booking as held by the reservation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub reference: String,
    pub prisoner_id: String,
    pub prison_id: String,
    pub session_template_reference: String,
    pub visit_room: String,
    pub visit_restriction: VisitRestriction,
    pub visit_status: VisitStatus,
    pub start_timestamp: NaiveDateTime,
    pub end_timestamp: NaiveDateTime,
    #[serde(default)]
    pub visitors: Vec<VisitVisitor>,
    #[serde(default)]
    pub visitor_support: Option<AdditionalSupport>,
    pub visit_contact: Option<VisitContact>,
    pub application_method: Option<RequestMethod>,
}

/// Visit references look like `ab-cd-ef-gh`.
pub fn is_valid_visit_reference(value: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-z]{2}(-[a-z]{2}){3}$").expect("static pattern"))
        .is_match(value)
}
