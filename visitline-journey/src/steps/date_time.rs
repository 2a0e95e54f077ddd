use serde::{Deserialize, Serialize};
use tracing::info;
use visitline_core::reservation::SessionQuery;
use visitline_core::slots::{
    adjust_for_original_slot, build_slot_list, find_matching_slot, get_selected_slot,
    restriction_change_message, SlotFilters, SlotList,
};
use visitline_core::visit::SessionConflict;
use visitline_core::{ClosedVisitReason, CoreError, VisitRestriction};

use super::{invalid, StepContext};
use crate::commit::{
    route_rejection, RejectionTarget, ALREADY_BOOKED_MESSAGE, NON_ASSOCIATION_MESSAGE,
};
use crate::mode::{Mode, Navigation, Page};
use crate::overbooking::needs_confirmation_after_pick;
use crate::reservation::{sync_hold, HoldOutcome};
use crate::session::{FieldError, JourneySession};
use crate::JourneyResult;

pub const HOLD_FAILED_MESSAGE: &str =
    "Failed to reserve this time slot. You can select it again or choose a different time.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeView {
    pub prisoner_name: String,
    pub visit_restriction: VisitRestriction,
    pub closed_visit_reason: Option<ClosedVisitReason>,
    pub slot_list: SlotList,
    pub selected_slot_id: Option<String>,
    /// Update journeys: the slot of the booking being edited, if listed.
    pub original_slot_id: Option<String>,
    pub restriction_change_message: Option<String>,
    pub filters: SlotFilters,
    pub override_booking_window: bool,
    pub errors: Vec<FieldError>,
    pub form_values: serde_json::Value,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectDateAndTimeForm {
    pub visit_date_and_time: Option<String>,
}

/// Lists slots for the draft's visit type. New `filters` replace the saved
/// ones; otherwise the saved filters regenerate the same list.
pub async fn view(
    ctx: &StepContext<'_>,
    session: &mut JourneySession,
    filters: Option<SlotFilters>,
) -> JourneyResult<DateTimeView> {
    if let Some(filters) = filters {
        session.slot_filters = filters;
    }
    let flash = session.take_flash();
    let draft = session.draft()?;
    let restriction = draft
        .visit_restriction
        .ok_or(CoreError::IncompleteDraft("visit restriction"))?;

    let min_number_of_days = if draft.override_booking_window {
        0
    } else {
        ctx.rules.min_booking_notice_days
    };
    let query = SessionQuery {
        prison_id: draft.prison_id.clone(),
        prisoner_id: draft.prisoner.number.clone(),
        min_number_of_days,
        max_number_of_days: ctx.rules.max_booking_days,
        username: ctx.staff.username.clone(),
    };
    let sessions = ctx.reservations.get_visit_sessions(&query).await?;
    let mut slot_list =
        build_slot_list(&sessions, &draft.prison_id, restriction, &session.slot_filters);

    let mut restriction_change = None;
    let mut original_slot_id = None;
    if ctx.mode == Mode::Update {
        if let Some(original) = draft.original_visit_slot.as_ref() {
            adjust_for_original_slot(&mut slot_list, original, restriction);
            restriction_change = restriction_change_message(Some(original), restriction);
            original_slot_id = find_matching_slot(&slot_list, original)
                .filter(|slot| slot.visit_restriction == original.visit_restriction)
                .map(|slot| slot.id.clone());
        }
    }

    let selected_slot_id = draft
        .visit_slot
        .as_ref()
        .and_then(|current| {
            find_matching_slot(&slot_list, current)
                .filter(|slot| slot.visit_restriction == current.visit_restriction)
        })
        .map(|slot| slot.id.clone());

    let view = DateTimeView {
        prisoner_name: draft.prisoner.name.clone(),
        visit_restriction: restriction,
        closed_visit_reason: draft.closed_visit_reason,
        slot_list: slot_list.clone(),
        selected_slot_id,
        original_slot_id,
        restriction_change_message: restriction_change,
        filters: session.slot_filters,
        override_booking_window: draft.override_booking_window,
        errors: flash.errors,
        form_values: flash.form_values,
    };
    session.slot_list = Some(slot_list);
    Ok(view)
}

pub async fn submit(
    ctx: &StepContext<'_>,
    session: &mut JourneySession,
    form: &SelectDateAndTimeForm,
) -> JourneyResult<Navigation> {
    let slot = form
        .visit_date_and_time
        .as_deref()
        .zip(session.slot_list.as_ref())
        .and_then(|(id, list)| get_selected_slot(list, id));
    let Some(slot) = slot else {
        let error = FieldError::new("visitDateAndTime", "No time slot selected");
        return Ok(invalid(session, Page::SelectDateAndTime, vec![error], form));
    };

    if let Some(conflict) = slot.session_conflicts.first() {
        let message = match conflict {
            SessionConflict::NonAssociation => NON_ASSOCIATION_MESSAGE,
            SessionConflict::DoubleBooked => ALREADY_BOOKED_MESSAGE,
        };
        let error = FieldError::new("visitDateAndTime", message);
        return Ok(invalid(session, Page::SelectDateAndTime, vec![error], form));
    }

    let draft = session.draft_mut()?;
    let unchanged = draft
        .visit_slot
        .as_ref()
        .is_some_and(|current| {
            current.same_session(&slot) && current.visit_restriction == slot.visit_restriction
        });
    let previous_slot = draft.visit_slot.replace(slot.clone());
    let previous_allow = draft.allow_over_booking;
    if !unchanged {
        draft.allow_over_booking = false;
    }

    let outcome = sync_hold(ctx, draft).await?;
    let needs_confirmation = needs_confirmation_after_pick(draft, &slot);

    let codes = match outcome {
        HoldOutcome::Rejected(codes) => codes,
        _ if needs_confirmation => {
            info!(
                "Slot {} is full ({}/{})",
                slot.session_template_reference, slot.booked_count, slot.capacity
            );
            return Ok(Navigation::Page(Page::SlotOverbooking));
        }
        _ => return Ok(Navigation::Page(Page::AdditionalSupport)),
    };

    let message = match route_rejection(&codes) {
        RejectionTarget::Overbooking => return Ok(Navigation::Page(Page::SlotOverbooking)),
        RejectionTarget::SelectDateAndTime(message) => message,
        RejectionTarget::Resubmit => HOLD_FAILED_MESSAGE,
    };
    // The hold still points at the previous slot.
    draft.visit_slot = previous_slot;
    draft.allow_over_booking = previous_allow;

    let error = FieldError::new("visitDateAndTime", message);
    Ok(invalid(session, Page::SelectDateAndTime, vec![error], form))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{open_session, selected_visitor, Call, Harness, OPEN_VISITOR};
    use visitline_core::reservation::ValidationCode;
    use visitline_core::slots::TimeOfDay;
    use visitline_core::{Draft, VisitStatus};

    fn session() -> JourneySession {
        let mut session = JourneySession::default();
        let mut draft: Draft = crate::testing::new_draft();
        draft.visitors = vec![selected_visitor(OPEN_VISITOR, vec![])];
        draft.visit_restriction = Some(VisitRestriction::Open);
        session.start(draft);
        session
    }

    fn pick(id: &str) -> SelectDateAndTimeForm {
        SelectDateAndTimeForm {
            visit_date_and_time: Some(id.to_string()),
        }
    }

    #[tokio::test]
    async fn test_view_saves_slot_list_and_filters() {
        let harness = Harness::new();
        harness.reservations.set_sessions(vec![
            open_session("ref-a", 10, 10, 1),
            open_session("ref-b", 14, 10, 1),
        ]);
        let mut session = session();
        let filters = SlotFilters { time_of_day: Some(TimeOfDay::Afternoon), day_of_week: None };

        let view = view(&harness.ctx(Mode::Book), &mut session, Some(filters)).await.unwrap();

        assert_eq!(view.slot_list.len(), 1);
        assert_eq!(session.slot_filters, filters);
        assert_eq!(session.slot_list.as_ref().unwrap(), &view.slot_list);
        assert!(view.restriction_change_message.is_none());
    }

    #[tokio::test]
    async fn test_pick_reserves_and_continues() {
        let harness = Harness::new();
        harness.reservations.set_sessions(vec![open_session("ref-a", 10, 10, 9)]);
        let ctx = harness.ctx(Mode::Book);
        let mut session = session();
        view(&ctx, &mut session, None).await.unwrap();

        let nav = submit(&ctx, &mut session, &pick("1")).await.unwrap();

        assert_eq!(nav, Navigation::Page(Page::AdditionalSupport));
        let draft = session.draft().unwrap();
        assert_eq!(draft.visit_status, Some(VisitStatus::Reserved));
        assert_eq!(draft.visit_slot.as_ref().unwrap().session_template_reference, "ref-a");
    }

    #[tokio::test]
    async fn test_same_slot_twice_retargets_existing_hold() {
        let harness = Harness::new();
        harness.reservations.set_sessions(vec![open_session("ref-a", 10, 10, 1)]);
        let ctx = harness.ctx(Mode::Book);
        let mut session = session();
        view(&ctx, &mut session, None).await.unwrap();

        submit(&ctx, &mut session, &pick("1")).await.unwrap();
        submit(&ctx, &mut session, &pick("1")).await.unwrap();

        let calls = harness.reservations.calls();
        let reserves = calls.iter().filter(|c| matches!(c, Call::Reserve)).count();
        let retargets = calls.iter().filter(|c| matches!(c, Call::ChangeReserved(_))).count();
        assert_eq!((reserves, retargets), (1, 1));
        assert_eq!(session.draft().unwrap().application_reference.as_deref(), Some("aaa-bbb-ccc"));
    }

    #[tokio::test]
    async fn test_full_slot_goes_to_overbooking() {
        let harness = Harness::new();
        harness.reservations.set_sessions(vec![open_session("ref-a", 10, 10, 10)]);
        let ctx = harness.ctx(Mode::Book);
        let mut session = session();
        view(&ctx, &mut session, None).await.unwrap();

        let nav = submit(&ctx, &mut session, &pick("1")).await.unwrap();
        assert_eq!(nav, Navigation::Page(Page::SlotOverbooking));
    }

    #[tokio::test]
    async fn test_capacity_rejection_goes_to_overbooking() {
        let harness = Harness::new();
        harness.reservations.set_sessions(vec![open_session("ref-a", 10, 10, 3)]);
        let ctx = harness.ctx(Mode::Book);
        let mut session = session();
        view(&ctx, &mut session, None).await.unwrap();
        harness.reservations.reject_next(vec![ValidationCode::NoSlotCapacity]);

        let nav = submit(&ctx, &mut session, &pick("1")).await.unwrap();

        assert_eq!(nav, Navigation::Page(Page::SlotOverbooking));
        let draft = session.draft().unwrap();
        assert!(draft.visit_slot.is_some());
        assert!(draft.application_reference.is_none());
    }

    #[tokio::test]
    async fn test_non_association_rejection_restores_previous_slot() {
        let harness = Harness::new();
        harness
            .reservations
            .set_sessions(vec![open_session("ref-a", 10, 10, 1), open_session("ref-b", 14, 10, 1)]);
        let ctx = harness.ctx(Mode::Book);
        let mut session = session();
        view(&ctx, &mut session, None).await.unwrap();
        submit(&ctx, &mut session, &pick("1")).await.unwrap();
        harness.reservations.reject_next(vec![ValidationCode::NonAssociationVisits]);

        let nav = submit(&ctx, &mut session, &pick("2")).await.unwrap();

        assert_eq!(nav, Navigation::Page(Page::SelectDateAndTime));
        assert_eq!(session.take_flash().errors[0].message, NON_ASSOCIATION_MESSAGE);
        assert_eq!(
            session.draft().unwrap().visit_slot.as_ref().unwrap().session_template_reference,
            "ref-a"
        );
    }

    #[tokio::test]
    async fn test_unknown_slot_id_is_a_validation_error() {
        let harness = Harness::new();
        harness.reservations.set_sessions(vec![open_session("ref-a", 10, 10, 1)]);
        let ctx = harness.ctx(Mode::Book);
        let mut session = session();
        view(&ctx, &mut session, None).await.unwrap();

        let nav = submit(&ctx, &mut session, &pick("7")).await.unwrap();

        assert_eq!(nav, Navigation::Page(Page::SelectDateAndTime));
        let flash = session.take_flash();
        assert_eq!(flash.errors[0].message, "No time slot selected");
        assert_eq!(flash.form_values["visitDateAndTime"], "7");
        assert!(harness.reservations.calls().iter().all(|c| !matches!(c, Call::Reserve)));
    }

    #[tokio::test]
    async fn test_conflicting_slot_is_refused_locally() {
        let harness = Harness::new();
        let mut conflicted = open_session("ref-a", 10, 10, 1);
        conflicted.session_conflicts = vec![SessionConflict::DoubleBooked];
        harness.reservations.set_sessions(vec![conflicted]);
        let ctx = harness.ctx(Mode::Book);
        let mut session = session();
        view(&ctx, &mut session, None).await.unwrap();

        submit(&ctx, &mut session, &pick("1")).await.unwrap();

        assert_eq!(session.take_flash().errors[0].message, ALREADY_BOOKED_MESSAGE);
        assert!(session.draft().unwrap().visit_slot.is_none());
    }

    #[tokio::test]
    async fn test_update_with_restriction_change_shows_message_without_reuse() {
        let harness = Harness::new();
        let mut listed = open_session("ref-a", 10, 10, 10);
        listed.closed_visit_capacity = 1;
        listed.closed_visit_booked_count = 1;
        harness.reservations.set_sessions(vec![listed]);
        let ctx = harness.ctx(Mode::Update);

        let mut session = session();
        let original = crate::testing::open_slot("", 10, 10);
        {
            let draft = session.draft_mut().unwrap();
            draft.original_visit_slot = Some(original.clone());
            draft.visit_slot = Some(original);
            draft.visit_reference = Some("ab-cd-ef-gh".to_string());
            draft.visit_status = Some(VisitStatus::Booked);
            draft.visit_restriction = Some(VisitRestriction::Closed);
        }

        let view = view(&ctx, &mut session, None).await.unwrap();

        assert_eq!(
            view.restriction_change_message.as_deref(),
            Some("The visit type has changed from open to closed.")
        );
        let closed_slot = get_selected_slot(&view.slot_list, "1").unwrap();
        assert_eq!(closed_slot.booked_count, 1);
        assert_eq!(view.original_slot_id, None);

        let nav = submit(&ctx, &mut session, &pick("1")).await.unwrap();
        assert_eq!(nav, Navigation::Page(Page::SlotOverbooking));
        assert!(matches!(harness.reservations.calls().last(), Some(Call::ChangeBooked(_))));
    }

    #[tokio::test]
    async fn test_update_same_restriction_frees_own_place() {
        let harness = Harness::new();
        harness.reservations.set_sessions(vec![open_session("ref-a", 10, 10, 10)]);
        let ctx = harness.ctx(Mode::Update);

        let mut session = session();
        let original = crate::testing::open_slot("", 10, 10);
        {
            let draft = session.draft_mut().unwrap();
            draft.original_visit_slot = Some(original.clone());
            draft.visit_slot = Some(original);
            draft.visit_reference = Some("ab-cd-ef-gh".to_string());
            draft.visit_status = Some(VisitStatus::Booked);
        }

        let view = view(&ctx, &mut session, None).await.unwrap();
        assert_eq!(view.original_slot_id.as_deref(), Some("1"));
        assert_eq!(view.selected_slot_id.as_deref(), Some("1"));

        let nav = submit(&ctx, &mut session, &pick("1")).await.unwrap();
        assert_eq!(nav, Navigation::Page(Page::AdditionalSupport));
        assert_eq!(session.draft().unwrap().visit_status, Some(VisitStatus::Changing));
    }
}
