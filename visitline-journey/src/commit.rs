//! Committing the hold, and the fixed table deciding where a rejected
//! commit (or hold) sends the user.

use tracing::{info, warn};
use visitline_core::reservation::{CommitRequest, ReservationError, ValidationCode};
use visitline_core::{CoreError, Draft};
use visitline_shared::models::events::AuditEventKind;

use crate::mode::Mode;
use crate::reservation::record;
use crate::steps::StepContext;
use crate::JourneyResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionTarget {
    /// Pick another slot; the message explains why.
    SelectDateAndTime(&'static str),
    Overbooking,
    /// Unmapped: show a generic message and leave the draft for resubmission.
    Resubmit,
}

pub const NON_ASSOCIATION_MESSAGE: &str =
    "The prisoner has a non-association with another prisoner booked into this time slot. Select a different time.";
pub const ALREADY_BOOKED_MESSAGE: &str =
    "A visitor already has a visit booked at this time. Select a different time.";

/// Every code has exactly one destination.
pub fn rejection_target(code: &ValidationCode) -> RejectionTarget {
    match code {
        ValidationCode::NonAssociationVisits => {
            RejectionTarget::SelectDateAndTime(NON_ASSOCIATION_MESSAGE)
        }
        ValidationCode::VisitAlreadyBooked => {
            RejectionTarget::SelectDateAndTime(ALREADY_BOOKED_MESSAGE)
        }
        ValidationCode::NoSlotCapacity => RejectionTarget::Overbooking,
        ValidationCode::PrisonerNotFound
        | ValidationCode::PrisonPrisonerMismatch
        | ValidationCode::SessionNotAvailable
        | ValidationCode::SessionTemplateNotFound
        | ValidationCode::NoVoBalance
        | ValidationCode::UserType
        | ValidationCode::Other(_) => RejectionTarget::Resubmit,
    }
}

/// Several codes may arrive together; they are resolved in a fixed priority
/// so the destination never depends on the order the service lists them in.
pub fn route_rejection(codes: &[ValidationCode]) -> RejectionTarget {
    const PRIORITY: [ValidationCode; 3] = [
        ValidationCode::NonAssociationVisits,
        ValidationCode::VisitAlreadyBooked,
        ValidationCode::NoSlotCapacity,
    ];
    PRIORITY
        .iter()
        .find(|code| codes.contains(*code))
        .map(rejection_target)
        .unwrap_or(RejectionTarget::Resubmit)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed { reference: String },
    Rejected { target: RejectionTarget, codes: Vec<ValidationCode> },
}

/// Book (new) or update (edit) the hold. Non-422 failures propagate.
pub async fn commit_visit(
    ctx: &StepContext<'_>,
    draft: &mut Draft,
) -> JourneyResult<CommitOutcome> {
    let application_reference = draft
        .application_reference
        .clone()
        .ok_or(CoreError::IncompleteDraft("application reference"))?;
    let application_method = draft
        .request_method
        .ok_or(CoreError::IncompleteDraft("request method"))?;

    let request = CommitRequest {
        application_method,
        allow_over_booking: draft.allow_over_booking,
        actioned_by: ctx.staff.username.clone(),
    };

    let (result, kind) = match ctx.mode {
        Mode::Book => (
            ctx.reservations.book_visit(&application_reference, &request).await,
            AuditEventKind::BookedVisit,
        ),
        Mode::Update => (
            ctx.reservations.update_visit(&application_reference, &request).await,
            AuditEventKind::UpdatedVisit,
        ),
    };

    match result {
        Ok(committed) => {
            info!(
                "Visit {} committed from hold {} ({:?}, overbooking allowed: {})",
                committed.reference, application_reference, ctx.mode, request.allow_over_booking
            );
            draft.visit_reference = Some(committed.reference.clone());
            draft.visit_status = Some(committed.visit_status);
            record(ctx, draft, kind).await;
            Ok(CommitOutcome::Committed { reference: committed.reference })
        }
        Err(ReservationError::Validation(codes)) => {
            let target = route_rejection(&codes);
            warn!("Commit of hold {} rejected: {:?} -> {:?}", application_reference, codes, target);
            Ok(CommitOutcome::Rejected { target, codes })
        }
        Err(e) => Err(e.into()),
    }
}
