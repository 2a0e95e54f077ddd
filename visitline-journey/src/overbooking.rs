//! Explicit confirmation before a slot at or over capacity is held or committed.

use serde::Serialize;
use tracing::info;
use visitline_core::reservation::SingleSessionQuery;
use visitline_core::{CoreError, Draft, VisitSlot};

use crate::steps::StepContext;
use crate::JourneyResult;

/// Where the guard was triggered from; decides where "no" and "yes" lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverbookingPoint {
    AfterSlotSelection,
    BeforeCommit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityCheck {
    pub capacity: u32,
    pub booked_count: u32,
}

impl CapacityCheck {
    pub fn is_over(&self) -> bool {
        self.booked_count >= self.capacity
    }
}

/// Trigger right after a pick: the chosen slot is already full and the user
/// has not accepted overbooking for it.
pub fn needs_confirmation_after_pick(draft: &Draft, slot: &VisitSlot) -> bool {
    slot.is_full() && !draft.allow_over_booking
}

/// Current counts for the draft's slot. When editing a booking in its own
/// session with an unchanged visit type, the booking itself is not counted.
pub async fn current_capacity(
    ctx: &StepContext<'_>,
    draft: &Draft,
) -> JourneyResult<CapacityCheck> {
    let slot = draft
        .visit_slot
        .as_ref()
        .ok_or(CoreError::IncompleteDraft("visit slot"))?;
    let restriction = draft
        .visit_restriction
        .ok_or(CoreError::IncompleteDraft("visit restriction"))?;

    let query = SingleSessionQuery {
        prison_id: draft.prison_id.clone(),
        session_date: slot.start_timestamp.date(),
        session_template_reference: slot.session_template_reference.clone(),
    };
    let session = ctx.reservations.get_single_visit_session(&query).await?;
    let (capacity, mut booked_count) = session.for_restriction(restriction);

    let own_place = draft
        .original_visit_slot
        .as_ref()
        .is_some_and(|original| {
            original.same_session(slot) && original.visit_restriction == restriction
        });
    if own_place {
        booked_count = booked_count.saturating_sub(1);
    }

    Ok(CapacityCheck { capacity, booked_count })
}

/// Late re-check before commit; time has passed since the slot was picked.
/// Skipped once overbooking has been accepted.
pub async fn late_capacity_check(
    ctx: &StepContext<'_>,
    draft: &Draft,
) -> JourneyResult<Option<CapacityCheck>> {
    if draft.allow_over_booking {
        return Ok(None);
    }
    let check = current_capacity(ctx, draft).await?;
    if check.is_over() {
        info!(
            "Slot for visit {:?} is full ({}/{}), confirmation needed",
            draft.visit_reference, check.booked_count, check.capacity
        );
        return Ok(Some(check));
    }
    Ok(None)
}
