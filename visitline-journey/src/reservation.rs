//! Keeps the remote hold pointed at the draft.
//!
//! NONE -> RESERVED (new booking) or CHANGING (existing booking reopened),
//! later BOOKED on commit. Once an application reference exists every sync
//! retargets that hold; no second hold is ever created for the same draft.

use tracing::{info, warn};
use visitline_core::reservation::{ReservationError, ReserveRequest, ValidationCode};
use visitline_core::{CoreError, Draft};
use visitline_shared::models::events::{AuditEvent, AuditEventKind};

use crate::mode::Mode;
use crate::steps::StepContext;
use crate::JourneyResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoldOutcome {
    /// New hold and provisional visit reference issued.
    Reserved,
    /// Hold opened against the booking being edited.
    Changing,
    /// Existing hold retargeted.
    Retargeted,
    /// The service refused the hold with HTTP 422.
    Rejected(Vec<ValidationCode>),
}

pub async fn sync_hold(ctx: &StepContext<'_>, draft: &mut Draft) -> JourneyResult<HoldOutcome> {
    let request = ReserveRequest::from_draft(draft, &ctx.staff.username)?;

    let result = if let Some(application_reference) = draft.application_reference.clone() {
        ctx.reservations
            .change_reserved_visit(&application_reference, &request)
            .await
            .map(|_| {
                info!(
                    "Hold {} retargeted to {}",
                    application_reference, request.session_template_reference
                );
                HoldOutcome::Retargeted
            })
    } else if ctx.mode == Mode::Update {
        let visit_reference = draft
            .visit_reference
            .clone()
            .ok_or(CoreError::IncompleteDraft("visit reference"))?;
        ctx.reservations
            .change_booked_visit(&visit_reference, &request)
            .await
            .map(|changed| {
                info!(
                    "Booking {} reopened as hold {}",
                    visit_reference, changed.application_reference
                );
                draft.application_reference = Some(changed.application_reference);
                draft.visit_status = Some(changed.visit_status);
                HoldOutcome::Changing
            })
    } else {
        ctx.reservations.reserve_visit(&request).await.map(|reserved| {
            info!(
                "Hold {} created for prisoner {} (visit {})",
                reserved.application_reference, request.prisoner_id, reserved.visit_reference
            );
            draft.application_reference = Some(reserved.application_reference);
            draft.visit_reference = Some(reserved.visit_reference);
            draft.visit_status = Some(reserved.visit_status);
            HoldOutcome::Reserved
        })
    };

    match result {
        Ok(outcome) => {
            match outcome {
                HoldOutcome::Reserved => record(ctx, draft, AuditEventKind::ReservedVisit).await,
                HoldOutcome::Changing => record(ctx, draft, AuditEventKind::ChangedVisit).await,
                _ => {}
            }
            Ok(outcome)
        }
        Err(ReservationError::Validation(codes)) => {
            warn!("Hold for prisoner {} rejected: {:?}", request.prisoner_id, codes);
            Ok(HoldOutcome::Rejected(codes))
        }
        Err(e) => Err(e.into()),
    }
}

/// Audit failures are logged and never fail the journey.
pub(crate) async fn record(ctx: &StepContext<'_>, draft: &Draft, kind: AuditEventKind) {
    let Some(slot) = draft.visit_slot.as_ref() else {
        return;
    };
    let event = AuditEvent::new(
        kind,
        draft.visit_reference.clone(),
        draft.application_reference.clone(),
        draft.prisoner.number.clone(),
        draft.prison_id.clone(),
        ctx.staff.username.clone(),
        slot.start_timestamp,
        slot.end_timestamp,
    );
    if let Err(e) = ctx.audit.record(&event).await {
        warn!("Audit event {:?} not recorded: {}", kind, e);
    }
}
