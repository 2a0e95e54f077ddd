//! Journey entry points: populate a fresh draft for the chosen mode.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use visitline_core::{
    is_valid_prisoner_number, is_valid_visit_reference, ClosedVisitReason, Draft, MainContact,
    PrisonerIdentity, SelectedVisitor, VisitRestriction, VisitSlot, VisitStatus,
};
use visitline_shared::Masked;

use super::{yes_no, StepContext};
use crate::mode::{JourneyRoute, Landing, Mode, Navigation, Page};
use crate::session::JourneySession;
use crate::{JourneyError, JourneyResult};

/// Starting a new booking replaces any journey already in progress.
pub async fn start_booking(
    ctx: &StepContext<'_>,
    session: &mut JourneySession,
    prisoner_number: &str,
) -> JourneyResult<Navigation> {
    if !is_valid_prisoner_number(prisoner_number) {
        return Err(JourneyError::InvalidIdentifier(prisoner_number.to_string()));
    }

    let profile = ctx
        .directory
        .get_prisoner(&ctx.staff.active_prison_id, prisoner_number)
        .await?;
    let prisoner = PrisonerIdentity::from(&profile);
    session.start(Draft::new(Mode::Book, &ctx.staff.active_prison_id, prisoner));

    info!("{} started a booking for prisoner {}", ctx.staff.username, prisoner_number);
    Ok(Navigation::Journey(JourneyRoute::book(), Page::SelectVisitors))
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartUpdateForm {
    pub confirm_override_booking_window: Option<String>,
}

/// Populate a draft from an existing booking. The booking's slot is kept as
/// the immutable `original_visit_slot` snapshot.
pub async fn start_update(
    ctx: &StepContext<'_>,
    session: &mut JourneySession,
    reference: &str,
    form: &StartUpdateForm,
) -> JourneyResult<Navigation> {
    if !is_valid_visit_reference(reference) {
        return Err(JourneyError::InvalidIdentifier(reference.to_string()));
    }

    let visit = ctx.reservations.get_visit(reference).await?;
    let to_visit = |error: &'static str| {
        Navigation::Landing(Landing::VisitDetails {
            reference: reference.to_string(),
            error,
        })
    };

    if visit.prison_id != ctx.staff.active_prison_id {
        return Ok(Navigation::Landing(Landing::Home { error: "establishment-mismatch" }));
    }
    if visit.visit_status != VisitStatus::Booked {
        return Ok(to_visit("visit-not-booked"));
    }

    let visit_date = visit.start_timestamp.date();
    if visit_date < ctx.today {
        return Ok(to_visit("visit-in-past"));
    }
    let notice_ends = ctx.today + Duration::days(i64::from(ctx.rules.min_booking_notice_days));
    let inside_notice = visit_date < notice_ends;
    let confirmed = yes_no(form.confirm_override_booking_window.as_deref()) == Some(true);
    if inside_notice && !confirmed {
        return Ok(to_visit("booking-window"));
    }

    let profile = ctx.directory.get_prisoner(&visit.prison_id, &visit.prisoner_id).await?;
    let approved = ctx.directory.get_approved_visitors(&visit.prisoner_id).await?;

    let visitors: Vec<SelectedVisitor> = visit
        .visitors
        .iter()
        .filter_map(|booked| {
            let record = approved.iter().find(|r| r.person_id == booked.person_id);
            if record.is_none() {
                warn!("Visitor {} on visit {} is no longer approved", booked.person_id, reference);
            }
            record.map(|r| {
                SelectedVisitor::from_record(r, r.is_adult(ctx.today, ctx.rules.adult_age))
            })
        })
        .collect();

    let original = VisitSlot {
        id: String::new(),
        session_template_reference: visit.session_template_reference.clone(),
        prison_id: visit.prison_id.clone(),
        start_timestamp: visit.start_timestamp,
        end_timestamp: visit.end_timestamp,
        capacity: 0,
        booked_count: 0,
        visit_room: visit.visit_room.clone(),
        visit_restriction: visit.visit_restriction,
        session_conflicts: Vec::new(),
    };

    let closed_visit_reason = match visit.visit_restriction {
        VisitRestriction::Closed
            if visitors.iter().any(SelectedVisitor::has_closed_restriction) =>
        {
            Some(ClosedVisitReason::Visitor)
        }
        VisitRestriction::Closed => Some(ClosedVisitReason::Prisoner),
        VisitRestriction::Open => None,
    };

    let main_contact = visit.visit_contact.as_ref().map(|contact| MainContact {
        contact_id: visit.visitors.iter().find(|v| v.visit_contact).map(|v| v.person_id),
        contact_name: contact.name.clone(),
        phone_number: contact.telephone.clone().map(Masked),
    });

    let mut draft = Draft::new(Mode::Update, &visit.prison_id, PrisonerIdentity::from(&profile));
    draft.visitors = visitors;
    draft.visit_restriction = Some(visit.visit_restriction);
    draft.closed_visit_reason = closed_visit_reason;
    draft.visit_slot = Some(original.clone());
    draft.original_visit_slot = Some(original);
    draft.visit_reference = Some(visit.reference.clone());
    draft.visit_status = Some(VisitStatus::Booked);
    draft.additional_support = visit.visitor_support.clone();
    draft.main_contact = main_contact;
    draft.request_method = visit.application_method;
    draft.override_booking_window = inside_notice && confirmed;
    session.start(draft);

    info!("{} started updating visit {}", ctx.staff.username, reference);
    Ok(Navigation::Journey(JourneyRoute::update(reference), Page::SelectVisitors))
}
