use serde::{Deserialize, Serialize};
use tracing::info;
use visitline_core::VisitSlot;

use super::check::{self, CheckOutcome};
use super::date_time::HOLD_FAILED_MESSAGE;
use super::{invalid, yes_no, Rendered, StepContext};
use crate::commit::{route_rejection, RejectionTarget};
use crate::mode::{Mode, Navigation, Page};
use crate::overbooking::{current_capacity, CapacityCheck, OverbookingPoint};
use crate::reservation::{sync_hold, HoldOutcome};
use crate::session::{FieldError, JourneySession};
use crate::JourneyResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverbookingView {
    pub slot: VisitSlot,
    #[serde(flatten)]
    pub counts: CapacityCheck,
    pub is_update: bool,
    pub errors: Vec<FieldError>,
    pub form_values: serde_json::Value,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverbookingForm {
    pub confirm_overbooking: Option<String>,
}

fn page(point: OverbookingPoint) -> Page {
    match point {
        OverbookingPoint::AfterSlotSelection => Page::SlotOverbooking,
        OverbookingPoint::BeforeCommit => Page::CommitOverbooking,
    }
}

/// After a pick the listed counts are shown; before commit the counts are
/// fetched again.
pub async fn view(
    ctx: &StepContext<'_>,
    session: &mut JourneySession,
    point: OverbookingPoint,
) -> JourneyResult<Rendered<OverbookingView>> {
    let flash = session.take_flash();
    let draft = session.draft()?;
    let Some(slot) = draft.visit_slot.clone() else {
        return Ok(Rendered::Redirect(Navigation::Page(Page::SelectDateAndTime)));
    };

    let counts = match point {
        OverbookingPoint::AfterSlotSelection => CapacityCheck {
            capacity: slot.capacity,
            booked_count: slot.booked_count,
        },
        OverbookingPoint::BeforeCommit => current_capacity(ctx, draft).await?,
    };

    Ok(Rendered::Page(OverbookingView {
        slot,
        counts,
        is_update: ctx.mode == Mode::Update,
        errors: flash.errors,
        form_values: flash.form_values,
    }))
}

/// "no" goes back to slot selection. "yes" records the acceptance and
/// resumes: re-holds the slot after a pick, or commits before commit.
pub async fn submit(
    ctx: &StepContext<'_>,
    session: &mut JourneySession,
    point: OverbookingPoint,
    form: &OverbookingForm,
) -> JourneyResult<Navigation> {
    let accepted = match yes_no(form.confirm_overbooking.as_deref()) {
        Some(answer) => answer,
        None => {
            let error = FieldError::new("confirmOverbooking", "No answer selected");
            return Ok(invalid(session, page(point), vec![error], form));
        }
    };
    if !accepted {
        return Ok(Navigation::Page(Page::SelectDateAndTime));
    }

    let draft = session.draft_mut()?;
    if draft.visit_slot.is_none() {
        return Ok(Navigation::Page(Page::SelectDateAndTime));
    }
    draft.allow_over_booking = true;
    info!(
        "{} accepted overbooking for prisoner {} at {:?}",
        ctx.staff.username, draft.prisoner.number, point
    );

    match point {
        OverbookingPoint::AfterSlotSelection => {
            let outcome = sync_hold(ctx, draft).await?;
            let HoldOutcome::Rejected(codes) = outcome else {
                return Ok(Navigation::Page(Page::AdditionalSupport));
            };
            let message = match route_rejection(&codes) {
                RejectionTarget::SelectDateAndTime(message) => message,
                RejectionTarget::Overbooking | RejectionTarget::Resubmit => HOLD_FAILED_MESSAGE,
            };
            let error = FieldError::new("visitDateAndTime", message);
            Ok(invalid(session, Page::SelectDateAndTime, vec![error], &()))
        }
        OverbookingPoint::BeforeCommit => match check::commit(ctx, session).await? {
            CheckOutcome::Navigate(navigation) => Ok(navigation),
            CheckOutcome::Retry { message } => {
                let error = FieldError::new("submit", message);
                Ok(invalid(session, Page::CheckYourBooking, vec![error], &()))
            }
        },
    }
}
