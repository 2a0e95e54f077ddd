//! In-memory collaborators and canned data for exercising the journey
//! without the remote services.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Mutex;
use visitline_core::audit::{AuditError, AuditSink};
use visitline_core::directory::{DirectoryError, PrisonerDirectory};
use visitline_core::reservation::{
    ChangedVisit, CommitRequest, CommittedVisit, ReservationClient, ReservationError,
    ReserveRequest, ReservedVisit, SessionQuery, SingleSessionQuery, ValidationCode,
};
use visitline_core::slots::{SessionCapacity, VisitSession};
use visitline_core::visit::{VisitContact, VisitVisitor};
use visitline_core::{
    AdditionalSupport, Draft, MainContact, PrisonerIdentity, PrisonerProfile, RequestMethod,
    RestrictionFlag, SelectedVisitor, SupportType, Visit, VisitRestriction, VisitSlot, VisitStatus,
    VisitorRecord,
};
use visitline_shared::models::events::{AuditEvent, AuditEventKind};
use visitline_shared::Masked;

use crate::mode::Mode;
use crate::steps::{Staff, StepContext};
use crate::JourneyRules;

pub const PRISON_ID: &str = "HEI";
pub const PRISONER_NUMBER: &str = "A1234BC";
pub const APPLICATION_REFERENCE: &str = "aaa-bbb-ccc";
pub const VISIT_REFERENCE: &str = "ab-cd-ef-gh";
pub const CHANGE_APPLICATION_REFERENCE: &str = "ddd-eee-fff";

pub const OPEN_VISITOR: i64 = 4321;
pub const CHILD_VISITOR: i64 = 4322;
pub const BANNED_VISITOR: i64 = 4323;
pub const CLOSED_VISITOR: i64 = 4324;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(day: NaiveDate, hour: u32) -> NaiveDateTime {
    day.and_hms_opt(hour, 0, 0).unwrap()
}

pub fn today() -> NaiveDate {
    date(2026, 2, 2)
}

/// Day the canned sessions and slots fall on, well outside the notice period.
pub fn slot_day() -> NaiveDate {
    date(2026, 2, 10)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Reserve,
    ChangeReserved(String),
    ChangeBooked(String),
    Book(String, CommitRequest),
    Update(String, CommitRequest),
    GetSessions,
    GetSingleSession,
    GetVisit(String),
    GetSupport,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<Call>,
    rejection: Option<Vec<ValidationCode>>,
    failure: bool,
    capacity: Option<SessionCapacity>,
    sessions: Vec<VisitSession>,
    visit: Option<Visit>,
}

/// Reservation service double. Every call is recorded; the next hold or
/// commit can be made to fail with 422, and the next call of any kind with a
/// transport error.
#[derive(Default)]
pub struct FakeReservations {
    state: Mutex<FakeState>,
}

impl FakeReservations {
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn reject_next(&self, codes: Vec<ValidationCode>) {
        self.state.lock().unwrap().rejection = Some(codes);
    }

    pub fn fail_next(&self) {
        self.state.lock().unwrap().failure = true;
    }

    pub fn set_capacity(&self, capacity: SessionCapacity) {
        self.state.lock().unwrap().capacity = Some(capacity);
    }

    pub fn set_sessions(&self, sessions: Vec<VisitSession>) {
        self.state.lock().unwrap().sessions = sessions;
    }

    pub fn set_visit(&self, visit: Visit) {
        self.state.lock().unwrap().visit = Some(visit);
    }

    fn enter(&self, call: Call, rejectable: bool) -> Result<(), ReservationError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if std::mem::take(&mut state.failure) {
            return Err(ReservationError::Transport("connection reset".to_string()));
        }
        if rejectable {
            if let Some(codes) = state.rejection.take() {
                return Err(ReservationError::Validation(codes));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ReservationClient for FakeReservations {
    async fn reserve_visit(
        &self,
        _request: &ReserveRequest,
    ) -> Result<ReservedVisit, ReservationError> {
        self.enter(Call::Reserve, true)?;
        Ok(ReservedVisit {
            application_reference: APPLICATION_REFERENCE.to_string(),
            visit_reference: VISIT_REFERENCE.to_string(),
            visit_status: VisitStatus::Reserved,
        })
    }

    async fn change_reserved_visit(
        &self,
        application_reference: &str,
        _request: &ReserveRequest,
    ) -> Result<(), ReservationError> {
        self.enter(Call::ChangeReserved(application_reference.to_string()), true)
    }

    async fn change_booked_visit(
        &self,
        visit_reference: &str,
        _request: &ReserveRequest,
    ) -> Result<ChangedVisit, ReservationError> {
        self.enter(Call::ChangeBooked(visit_reference.to_string()), true)?;
        Ok(ChangedVisit {
            application_reference: CHANGE_APPLICATION_REFERENCE.to_string(),
            visit_status: VisitStatus::Changing,
        })
    }

    async fn book_visit(
        &self,
        application_reference: &str,
        request: &CommitRequest,
    ) -> Result<CommittedVisit, ReservationError> {
        self.enter(Call::Book(application_reference.to_string(), request.clone()), true)?;
        Ok(CommittedVisit {
            reference: VISIT_REFERENCE.to_string(),
            visit_status: VisitStatus::Booked,
        })
    }

    async fn update_visit(
        &self,
        application_reference: &str,
        request: &CommitRequest,
    ) -> Result<CommittedVisit, ReservationError> {
        self.enter(Call::Update(application_reference.to_string(), request.clone()), true)?;
        Ok(CommittedVisit {
            reference: VISIT_REFERENCE.to_string(),
            visit_status: VisitStatus::Booked,
        })
    }

    async fn get_visit_sessions(
        &self,
        _query: &SessionQuery,
    ) -> Result<Vec<VisitSession>, ReservationError> {
        self.enter(Call::GetSessions, false)?;
        Ok(self.state.lock().unwrap().sessions.clone())
    }

    async fn get_single_visit_session(
        &self,
        _query: &SingleSessionQuery,
    ) -> Result<SessionCapacity, ReservationError> {
        self.enter(Call::GetSingleSession, false)?;
        Ok(self.state.lock().unwrap().capacity.unwrap_or(SessionCapacity {
            open_capacity: 10,
            closed_capacity: 2,
            open_booked_count: 0,
            closed_booked_count: 0,
        }))
    }

    async fn get_visit(&self, reference: &str) -> Result<Visit, ReservationError> {
        self.enter(Call::GetVisit(reference.to_string()), false)?;
        self.state
            .lock()
            .unwrap()
            .visit
            .clone()
            .filter(|visit| visit.reference == reference)
            .ok_or_else(|| ReservationError::NotFound(reference.to_string()))
    }

    async fn get_support_types(&self) -> Result<Vec<SupportType>, ReservationError> {
        self.enter(Call::GetSupport, false)?;
        Ok(support_types())
    }
}

/// Knows one prisoner, `A1234BC`, and their four approved visitors.
#[derive(Default)]
pub struct FakeDirectory {
    prisoner_restrictions: Mutex<Vec<RestrictionFlag>>,
}

impl FakeDirectory {
    pub fn set_prisoner_restrictions(&self, restrictions: Vec<RestrictionFlag>) {
        *self.prisoner_restrictions.lock().unwrap() = restrictions;
    }
}

#[async_trait]
impl PrisonerDirectory for FakeDirectory {
    async fn get_prisoner(
        &self,
        prison_id: &str,
        prisoner_number: &str,
    ) -> Result<PrisonerProfile, DirectoryError> {
        if prisoner_number != PRISONER_NUMBER || prison_id != PRISON_ID {
            return Err(DirectoryError::NotFound(prisoner_number.to_string()));
        }
        Ok(PrisonerProfile {
            prisoner_number: PRISONER_NUMBER.to_string(),
            first_name: "John".to_string(),
            last_name: "Smith".to_string(),
            date_of_birth: Some(date(1975, 4, 2)),
            prison_id: PRISON_ID.to_string(),
            location: Some("1-1-C-028".to_string()),
            restrictions: self.prisoner_restrictions.lock().unwrap().clone(),
        })
    }

    async fn get_approved_visitors(
        &self,
        prisoner_number: &str,
    ) -> Result<Vec<VisitorRecord>, DirectoryError> {
        if prisoner_number != PRISONER_NUMBER {
            return Err(DirectoryError::NotFound(prisoner_number.to_string()));
        }
        Ok(approved_visitors())
    }
}

#[derive(Default)]
pub struct RecordingAudit {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAudit {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<AuditEventKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }
}

#[async_trait]
impl AuditSink for RecordingAudit {
    async fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Owns the fakes and policy a `StepContext` borrows.
pub struct Harness {
    pub reservations: FakeReservations,
    pub directory: FakeDirectory,
    pub audit: RecordingAudit,
    pub staff: Staff,
    pub rules: JourneyRules,
    pub today: NaiveDate,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            reservations: FakeReservations::default(),
            directory: FakeDirectory::default(),
            audit: RecordingAudit::default(),
            staff: staff(),
            rules: JourneyRules::default(),
            today: today(),
        }
    }

    pub fn ctx(&self, mode: Mode) -> StepContext<'_> {
        StepContext {
            mode,
            staff: &self.staff,
            reservations: &self.reservations,
            directory: &self.directory,
            audit: &self.audit,
            rules: &self.rules,
            today: self.today,
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn staff() -> Staff {
    Staff {
        username: "staff-user".to_string(),
        active_prison_id: PRISON_ID.to_string(),
    }
}

pub fn support_types() -> Vec<SupportType> {
    [
        ("WHEELCHAIR", "Wheelchair ramp"),
        ("INDUCTION_LOOP", "Portable induction loop for people with hearing aids"),
        ("MASK_EXEMPT", "Visitor is exempt from wearing a face covering"),
        (AdditionalSupport::OTHER, "Other"),
    ]
    .into_iter()
    .map(|(code, description)| SupportType {
        code: code.to_string(),
        description: description.to_string(),
    })
    .collect()
}

pub fn approved_visitors() -> Vec<VisitorRecord> {
    let visitor = |person_id, first: &str, dob, restrictions| VisitorRecord {
        person_id,
        first_name: first.to_string(),
        last_name: "Smith".to_string(),
        date_of_birth: Some(dob),
        relationship: if person_id == OPEN_VISITOR { "Wife" } else { "Cousin" }.to_string(),
        restrictions,
    };
    vec![
        visitor(OPEN_VISITOR, "Jeanette", date(1986, 7, 28), vec![]),
        visitor(CHILD_VISITOR, "Bob", date(2018, 3, 2), vec![]),
        visitor(
            BANNED_VISITOR,
            "Anne",
            date(1990, 1, 15),
            vec![RestrictionFlag::new("BAN", "Banned")],
        ),
        visitor(
            CLOSED_VISITOR,
            "Keith",
            date(1970, 9, 9),
            vec![RestrictionFlag::new("CLOSED", "Closed")],
        ),
    ]
}

pub fn prisoner_identity(restrictions: Vec<RestrictionFlag>) -> PrisonerIdentity {
    PrisonerIdentity {
        number: PRISONER_NUMBER.to_string(),
        name: "John Smith".to_string(),
        date_of_birth: Some(date(1975, 4, 2)),
        location: "1-1-C-028".to_string(),
        restrictions,
    }
}

/// One of the approved visitors when `person_id` is known, with the given
/// restrictions in place of their own.
pub fn selected_visitor(person_id: i64, restrictions: Vec<RestrictionFlag>) -> SelectedVisitor {
    let record = approved_visitors().into_iter().find(|v| v.person_id == person_id);
    match record {
        Some(record) => SelectedVisitor {
            restrictions,
            ..SelectedVisitor::from_record(&record, record.is_adult(today(), 18))
        },
        None => SelectedVisitor {
            person_id,
            name: format!("Visitor {}", person_id),
            relationship: "Friend".to_string(),
            adult: true,
            restrictions,
        },
    }
}

pub fn open_slot(id: &str, capacity: u32, booked_count: u32) -> VisitSlot {
    VisitSlot {
        id: id.to_string(),
        session_template_reference: "ref-a".to_string(),
        prison_id: PRISON_ID.to_string(),
        start_timestamp: at(slot_day(), 10),
        end_timestamp: at(slot_day(), 11),
        capacity,
        booked_count,
        visit_room: "Visit room 1".to_string(),
        visit_restriction: VisitRestriction::Open,
        session_conflicts: Vec::new(),
    }
}

/// A listed session on `slot_day()`, open visits only.
pub fn open_session(reference: &str, hour: u32, capacity: u32, booked_count: u32) -> VisitSession {
    VisitSession {
        session_template_reference: reference.to_string(),
        visit_room: "Visit room 1".to_string(),
        start_timestamp: at(slot_day(), hour),
        end_timestamp: at(slot_day(), hour + 1),
        open_visit_capacity: capacity,
        open_visit_booked_count: booked_count,
        closed_visit_capacity: 0,
        closed_visit_booked_count: 0,
        session_conflicts: Vec::new(),
    }
}

pub fn new_draft() -> Draft {
    Draft::new(Mode::Book, PRISON_ID, prisoner_identity(vec![]))
}

/// Visitors, visit type and slot chosen; nothing held yet.
pub fn draft_with_slot() -> Draft {
    let mut draft = new_draft();
    draft.visitors = vec![selected_visitor(OPEN_VISITOR, vec![])];
    draft.visit_restriction = Some(VisitRestriction::Open);
    draft.visit_slot = Some(open_slot("1", 10, 1));
    draft
}

/// Every step answered, hold in place, ready for commit.
pub fn reserved_draft() -> Draft {
    let mut draft = draft_with_slot();
    draft.application_reference = Some(APPLICATION_REFERENCE.to_string());
    draft.visit_reference = Some(VISIT_REFERENCE.to_string());
    draft.visit_status = Some(VisitStatus::Reserved);
    draft.additional_support = Some(AdditionalSupport::none());
    draft.main_contact = Some(MainContact {
        contact_id: Some(OPEN_VISITOR),
        contact_name: "Jeanette Smith".to_string(),
        phone_number: Some(Masked("01234567899".to_string())),
    });
    draft.request_method = Some(RequestMethod::Phone);
    draft
}

pub fn booked_draft() -> Draft {
    let mut draft = reserved_draft();
    draft.visit_status = Some(VisitStatus::Booked);
    draft
}

/// An existing open booking on `day` for the canned prisoner.
pub fn booked_visit(day: NaiveDate) -> Visit {
    Visit {
        reference: VISIT_REFERENCE.to_string(),
        prisoner_id: PRISONER_NUMBER.to_string(),
        prison_id: PRISON_ID.to_string(),
        session_template_reference: "ref-a".to_string(),
        visit_room: "Visit room 1".to_string(),
        visit_restriction: VisitRestriction::Open,
        visit_status: VisitStatus::Booked,
        start_timestamp: at(day, 10),
        end_timestamp: at(day, 11),
        visitors: vec![VisitVisitor {
            person_id: OPEN_VISITOR,
            visit_contact: true,
        }],
        visitor_support: Some(AdditionalSupport::none()),
        visit_contact: Some(VisitContact {
            name: "Jeanette Smith".to_string(),
            telephone: Some("01234567899".to_string()),
        }),
        application_method: Some(RequestMethod::Phone),
    }
}
