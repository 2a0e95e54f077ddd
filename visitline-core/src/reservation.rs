use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::draft::Draft;
use crate::slots::{SessionCapacity, VisitSession};
use crate::visit::{
    AdditionalSupport, RequestMethod, SupportType, Visit, VisitRestriction, VisitStatus,
};
use crate::{CoreError, CoreResult};

/// Application validation codes returned with HTTP 422 by the reservation service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValidationCode {
    PrisonerNotFound,
    PrisonPrisonerMismatch,
    SessionNotAvailable,
    SessionTemplateNotFound,
    NonAssociationVisits,
    VisitAlreadyBooked,
    NoVoBalance,
    NoSlotCapacity,
    UserType,
    Other(String),
}

impl ValidationCode {
    /// Every code the service is known to send.
    pub const KNOWN: [ValidationCode; 9] = [
        ValidationCode::PrisonerNotFound,
        ValidationCode::PrisonPrisonerMismatch,
        ValidationCode::SessionNotAvailable,
        ValidationCode::SessionTemplateNotFound,
        ValidationCode::NonAssociationVisits,
        ValidationCode::VisitAlreadyBooked,
        ValidationCode::NoVoBalance,
        ValidationCode::NoSlotCapacity,
        ValidationCode::UserType,
    ];

    pub fn as_code(&self) -> &str {
        match self {
            ValidationCode::PrisonerNotFound => "APPLICATION_INVALID_PRISONER_NOT_FOUND",
            ValidationCode::PrisonPrisonerMismatch => {
                "APPLICATION_INVALID_PRISON_PRISONER_MISMATCH"
            }
            ValidationCode::SessionNotAvailable => "APPLICATION_INVALID_SESSION_NOT_AVAILABLE",
            ValidationCode::SessionTemplateNotFound => {
                "APPLICATION_INVALID_SESSION_TEMPLATE_NOT_FOUND"
            }
            ValidationCode::NonAssociationVisits => "APPLICATION_INVALID_NON_ASSOCIATION_VISITS",
            ValidationCode::VisitAlreadyBooked => "APPLICATION_INVALID_VISIT_ALREADY_BOOKED",
            ValidationCode::NoVoBalance => "APPLICATION_INVALID_NO_VO_BALANCE",
            ValidationCode::NoSlotCapacity => "APPLICATION_INVALID_NO_SLOT_CAPACITY",
            ValidationCode::UserType => "APPLICATION_INVALID_USER_TYPE",
            ValidationCode::Other(code) => code,
        }
    }
}

impl From<String> for ValidationCode {
    fn from(code: String) -> Self {
        ValidationCode::KNOWN
            .into_iter()
            .find(|known| known.as_code() == code)
            .unwrap_or(ValidationCode::Other(code))
    }
}

impl From<ValidationCode> for String {
    fn from(code: ValidationCode) -> Self {
        code.as_code().to_string()
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReservationError {
    #[error("Reservation rejected: {0:?}")]
    Validation(Vec<ValidationCode>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unexpected response {status}: {message}")]
    Unexpected { status: u16, message: String },

    #[error("Reservation service unreachable: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReserveVisitor {
    pub person_id: i64,
    pub visit_contact: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    pub name: String,
    pub telephone: Option<String>,
}

/// Everything the reservation service needs to create or retarget a hold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReserveRequest {
    pub prisoner_id: String,
    pub prison_id: String,
    pub session_template_reference: String,
    pub start_timestamp: NaiveDateTime,
    pub end_timestamp: NaiveDateTime,
    pub visit_restriction: VisitRestriction,
    pub visitors: Vec<ReserveVisitor>,
    pub visitor_support: Option<AdditionalSupport>,
    pub visit_contact: Option<ContactDetails>,
    pub allow_over_booking: bool,
    pub actioned_by: String,
}

impl ReserveRequest {
    /// Built from the draft's current slot, visitors, support and contact.
    pub fn from_draft(draft: &Draft, actioned_by: &str) -> CoreResult<Self> {
        let slot = draft
            .visit_slot
            .as_ref()
            .ok_or(CoreError::IncompleteDraft("visit slot"))?;
        let visit_restriction = draft
            .visit_restriction
            .ok_or(CoreError::IncompleteDraft("visit restriction"))?;
        let contact_id = draft.main_contact.as_ref().and_then(|c| c.contact_id);

        Ok(Self {
            prisoner_id: draft.prisoner.number.clone(),
            prison_id: draft.prison_id.clone(),
            session_template_reference: slot.session_template_reference.clone(),
            start_timestamp: slot.start_timestamp,
            end_timestamp: slot.end_timestamp,
            visit_restriction,
            visitors: draft
                .visitors
                .iter()
                .map(|v| ReserveVisitor {
                    person_id: v.person_id,
                    visit_contact: Some(v.person_id) == contact_id,
                })
                .collect(),
            visitor_support: draft.additional_support.clone(),
            visit_contact: draft.main_contact.as_ref().map(|c| ContactDetails {
                name: c.contact_name.clone(),
                telephone: c.phone_number.as_ref().map(|p| p.0.clone()),
            }),
            allow_over_booking: draft.allow_over_booking,
            actioned_by: actioned_by.to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReservedVisit {
    pub application_reference: String,
    pub visit_reference: String,
    pub visit_status: VisitStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChangedVisit {
    pub application_reference: String,
    pub visit_status: VisitStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub application_method: RequestMethod,
    pub allow_over_booking: bool,
    pub actioned_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommittedVisit {
    pub reference: String,
    pub visit_status: VisitStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    pub prison_id: String,
    pub prisoner_id: String,
    pub min_number_of_days: u32,
    pub max_number_of_days: u32,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SingleSessionQuery {
    pub prison_id: String,
    pub session_date: NaiveDate,
    pub session_template_reference: String,
}

/// Remote service holding slot capacity, holds and committed bookings.
#[async_trait]
pub trait ReservationClient: Send + Sync {
    /// Create a hold for a new booking; issues the provisional visit reference.
    async fn reserve_visit(
        &self,
        request: &ReserveRequest,
    ) -> Result<ReservedVisit, ReservationError>;

    /// Retarget an existing hold. Issues no new identifiers.
    async fn change_reserved_visit(
        &self,
        application_reference: &str,
        request: &ReserveRequest,
    ) -> Result<(), ReservationError>;

    /// Open a hold derived from an existing booking.
    async fn change_booked_visit(
        &self,
        visit_reference: &str,
        request: &ReserveRequest,
    ) -> Result<ChangedVisit, ReservationError>;

    async fn book_visit(
        &self,
        application_reference: &str,
        request: &CommitRequest,
    ) -> Result<CommittedVisit, ReservationError>;

    async fn update_visit(
        &self,
        application_reference: &str,
        request: &CommitRequest,
    ) -> Result<CommittedVisit, ReservationError>;

    async fn get_visit_sessions(
        &self,
        query: &SessionQuery,
    ) -> Result<Vec<VisitSession>, ReservationError>;

    async fn get_single_visit_session(
        &self,
        query: &SingleSessionQuery,
    ) -> Result<SessionCapacity, ReservationError>;

    async fn get_visit(&self, reference: &str) -> Result<Visit, ReservationError>;

    async fn get_support_types(&self) -> Result<Vec<SupportType>, ReservationError>;
}
