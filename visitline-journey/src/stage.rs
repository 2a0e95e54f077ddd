//! Forward-only completeness gate run before every wizard step.
//!
//! Checks run in a fixed order and the first failure decides the redirect.

use visitline_core::{is_valid_prisoner_number, Draft, VisitStatus};

use crate::mode::{JourneyRoute, Landing};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateReason {
    MissingSession,
    EstablishmentMismatch,
    ModeMismatch,
    ReferenceMismatch,
    MissingPrisoner,
    MissingVisitors,
    MissingVisit,
    VisitAlreadyBooked,
    MissingMainContact,
    VisitNotBooked,
}

impl GateReason {
    pub fn code(&self) -> &'static str {
        match self {
            GateReason::MissingSession => "missing-session",
            GateReason::EstablishmentMismatch => "establishment-mismatch",
            GateReason::ModeMismatch => "journey-mode-mismatch",
            GateReason::ReferenceMismatch => "visit-reference-mismatch",
            GateReason::MissingPrisoner => "missing-prisoner",
            GateReason::MissingVisitors => "missing-visitors",
            GateReason::MissingVisit => "missing-visit",
            GateReason::VisitAlreadyBooked => "visit-already-booked",
            GateReason::MissingMainContact => "missing-main-contact",
            GateReason::VisitNotBooked => "visit-not-booked",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Continue,
    RedirectTo { reason: GateReason, landing: Landing },
}

impl GateDecision {
    pub fn is_continue(&self) -> bool {
        matches!(self, GateDecision::Continue)
    }

    pub fn reason(&self) -> Option<GateReason> {
        match self {
            GateDecision::Continue => None,
            GateDecision::RedirectTo { reason, .. } => Some(*reason),
        }
    }
}

/// Decides whether a request for `stage` on `route` may proceed with `draft`.
pub fn stage_gate(
    stage: u8,
    draft: Option<&Draft>,
    active_prison_id: &str,
    route: &JourneyRoute,
) -> GateDecision {
    let Some(draft) = draft else {
        return redirect(
            GateReason::MissingSession,
            Landing::PrisonerSearch { error: Some(GateReason::MissingSession.code()) },
        );
    };

    if draft.prison_id != active_prison_id {
        return redirect(
            GateReason::EstablishmentMismatch,
            Landing::Home { error: GateReason::EstablishmentMismatch.code() },
        );
    }

    // A draft only continues in the journey that started it.
    if draft.mode != route.mode {
        let landing = Landing::Home { error: GateReason::ModeMismatch.code() };
        return redirect(GateReason::ModeMismatch, landing);
    }

    if let Some(reference) = route.reference.as_deref() {
        if draft.visit_reference.as_deref() != Some(reference) {
            return redirect(
                GateReason::ReferenceMismatch,
                Landing::Home { error: GateReason::ReferenceMismatch.code() },
            );
        }
    }

    let prisoner = &draft.prisoner;
    if prisoner.name.trim().is_empty()
        || prisoner.location.trim().is_empty()
        || !is_valid_prisoner_number(&prisoner.number)
    {
        return redirect(
            GateReason::MissingPrisoner,
            Landing::PrisonerSearch { error: Some(GateReason::MissingPrisoner.code()) },
        );
    }

    let to_profile = |reason: GateReason| {
        redirect(
            reason,
            Landing::PrisonerProfile {
                prisoner_number: prisoner.number.clone(),
                error: Some(reason.code()),
            },
        )
    };

    if stage > 1 && (draft.visitors.is_empty() || draft.visit_restriction.is_none()) {
        return to_profile(GateReason::MissingVisitors);
    }

    if stage > 2 {
        let slot_complete = draft
            .visit_slot
            .as_ref()
            .is_some_and(|slot| !slot.id.is_empty() && slot.start_timestamp < slot.end_timestamp);
        if !slot_complete || draft.visit_reference.is_none() {
            return to_profile(GateReason::MissingVisit);
        }
    }

    if stage > 2
        && stage < 6
        && !matches!(draft.visit_status, Some(VisitStatus::Reserved) | Some(VisitStatus::Changing))
    {
        return to_profile(GateReason::VisitAlreadyBooked);
    }

    if stage > 4 {
        let contact_complete = draft
            .main_contact
            .as_ref()
            .is_some_and(|contact| contact.has_phone_number() && contact.is_named());
        if !contact_complete {
            return to_profile(GateReason::MissingMainContact);
        }
    }

    if stage > 5 && draft.visit_status != Some(VisitStatus::Booked) {
        return to_profile(GateReason::VisitNotBooked);
    }

    GateDecision::Continue
}

fn redirect(reason: GateReason, landing: Landing) -> GateDecision {
    GateDecision::RedirectTo { reason, landing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{booked_draft, open_slot, reserved_draft};
    use visitline_core::{Mode, VisitRestriction};

    const PRISON: &str = "HEI";

    fn gate(stage: u8, draft: &Draft) -> Option<GateReason> {
        stage_gate(stage, Some(draft), PRISON, &JourneyRoute::book()).reason()
    }

    fn update_draft() -> Draft {
        Draft { mode: Mode::Update, ..reserved_draft() }
    }

    #[test]
    fn test_missing_draft_redirects_to_prisoner_search() {
        let decision = stage_gate(1, None, PRISON, &JourneyRoute::book());
        assert_eq!(
            decision,
            GateDecision::RedirectTo {
                reason: GateReason::MissingSession,
                landing: Landing::PrisonerSearch { error: Some("missing-session") },
            }
        );
    }

    #[test]
    fn test_establishment_mismatch_wins_over_later_checks() {
        let mut draft = reserved_draft();
        draft.visitors.clear();
        draft.main_contact = None;
        assert_eq!(
            stage_gate(5, Some(&draft), "BLI", &JourneyRoute::book()).reason(),
            Some(GateReason::EstablishmentMismatch)
        );
    }

    #[test]
    fn test_route_reference_must_match_draft() {
        let draft = update_draft();
        assert_eq!(
            stage_gate(3, Some(&draft), PRISON, &JourneyRoute::update("zz-zz-zz-zz")).reason(),
            Some(GateReason::ReferenceMismatch)
        );
        let route = JourneyRoute::update("ab-cd-ef-gh");
        assert!(stage_gate(3, Some(&draft), PRISON, &route).is_continue());
    }

    #[test]
    fn test_draft_only_continues_in_its_own_mode() {
        let update = update_draft();
        for stage in 1..=6u8 {
            assert_eq!(
                stage_gate(stage, Some(&update), PRISON, &JourneyRoute::book()),
                GateDecision::RedirectTo {
                    reason: GateReason::ModeMismatch,
                    landing: Landing::Home { error: "journey-mode-mismatch" },
                },
                "stage {}",
                stage
            );
        }

        let book = reserved_draft();
        assert_eq!(
            stage_gate(1, Some(&book), PRISON, &JourneyRoute::update("ab-cd-ef-gh")).reason(),
            Some(GateReason::ModeMismatch)
        );
    }

    #[test]
    fn test_mode_is_checked_after_establishment() {
        let update = update_draft();
        assert_eq!(
            stage_gate(1, Some(&update), "BLI", &JourneyRoute::book()).reason(),
            Some(GateReason::EstablishmentMismatch)
        );
    }

    #[test]
    fn test_malformed_prisoner_number_redirects_to_search() {
        let mut draft = reserved_draft();
        draft.prisoner.number = "A12".to_string();
        assert_eq!(gate(1, &draft), Some(GateReason::MissingPrisoner));

        let mut draft = reserved_draft();
        draft.prisoner.location = String::new();
        assert_eq!(gate(1, &draft), Some(GateReason::MissingPrisoner));
    }

    #[test]
    fn test_stage_one_needs_only_prisoner() {
        let mut draft = reserved_draft();
        draft.visitors.clear();
        draft.visit_restriction = None;
        draft.visit_slot = None;
        assert!(gate(1, &draft).is_none());
        assert_eq!(gate(2, &draft), Some(GateReason::MissingVisitors));
    }

    #[test]
    fn test_undecided_restriction_blocks_date_and_time() {
        let mut draft = reserved_draft();
        draft.visit_restriction = None;
        assert_eq!(gate(2, &draft), Some(GateReason::MissingVisitors));
    }

    #[test]
    fn test_slot_and_reference_required_after_stage_two() {
        let mut draft = reserved_draft();
        draft.visit_slot = None;
        assert!(gate(2, &draft).is_none());
        assert_eq!(gate(3, &draft), Some(GateReason::MissingVisit));

        let mut draft = reserved_draft();
        draft.visit_reference = None;
        assert_eq!(gate(3, &draft), Some(GateReason::MissingVisit));

        let mut draft = reserved_draft();
        draft.visit_slot =
            Some(visitline_core::VisitSlot { id: String::new(), ..open_slot("1", 10, 1) });
        assert_eq!(gate(3, &draft), Some(GateReason::MissingVisit));
    }

    #[test]
    fn test_booked_status_blocks_editing_stages() {
        let draft = booked_draft();
        for stage in 3..6 {
            let reason = gate(stage, &draft);
            assert_eq!(reason, Some(GateReason::VisitAlreadyBooked), "stage {}", stage);
        }
        assert!(gate(6, &draft).is_none());
    }

    #[test]
    fn test_main_contact_needs_phone_and_name() {
        let mut draft = reserved_draft();
        draft.main_contact.as_mut().unwrap().phone_number = None;
        assert!(gate(4, &draft).is_none());
        assert_eq!(gate(5, &draft), Some(GateReason::MissingMainContact));

        let mut draft = reserved_draft();
        draft.main_contact.as_mut().unwrap().contact_name = "  ".to_string();
        assert_eq!(gate(5, &draft), Some(GateReason::MissingMainContact));
    }

    #[test]
    fn test_confirmation_requires_booked() {
        let draft = reserved_draft();
        assert!(gate(5, &draft).is_none());
        assert_eq!(gate(6, &draft), Some(GateReason::VisitNotBooked));
    }

    /// Remove every subset of fields from a booked draft; for every stage the
    /// reported reason must be the earliest check in gate order that fails.
    #[test]
    fn test_earliest_violated_check_always_wins() {
        type Strip = fn(&mut Draft);
        // (field removal, reason, first stage that checks it), in gate order.
        let strips: [(Strip, GateReason, u8); 6] = [
            (|d| d.prisoner.name.clear(), GateReason::MissingPrisoner, 1),
            (|d| d.visitors.clear(), GateReason::MissingVisitors, 2),
            (|d| d.visit_restriction = None, GateReason::MissingVisitors, 2),
            (|d| d.visit_slot = None, GateReason::MissingVisit, 3),
            (|d| d.visit_reference = None, GateReason::MissingVisit, 3),
            (|d| d.main_contact = None, GateReason::MissingMainContact, 5),
        ];

        for stage in 1..=6u8 {
            for mask in 0..(1u32 << strips.len()) {
                let mut draft = booked_draft();
                let mut expected: Option<GateReason> = None;
                for (index, (strip, reason, from_stage)) in strips.iter().enumerate() {
                    // A booked draft fails the status check for stages 3 to 5,
                    // which sits between the visit and main contact checks.
                    if index == 5 && expected.is_none() && (3..6).contains(&stage) {
                        expected = Some(GateReason::VisitAlreadyBooked);
                    }
                    if mask & (1 << index) != 0 {
                        strip(&mut draft);
                        if stage >= *from_stage && expected.is_none() {
                            expected = Some(*reason);
                        }
                    }
                }
                assert_eq!(gate(stage, &draft), expected, "stage {} mask {:06b}", stage, mask);
            }
        }
    }

    #[test]
    fn test_closed_restriction_counts_as_decided() {
        let mut draft = reserved_draft();
        draft.visit_restriction = Some(VisitRestriction::Closed);
        assert!(gate(5, &draft).is_none());
    }
}
