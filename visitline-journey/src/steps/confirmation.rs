use serde::Serialize;
use tracing::info;
use visitline_core::{CoreError, VisitRestriction, VisitSlot};

use super::check::{support_descriptions, SummaryContact, SummaryVisitor};
use super::StepContext;
use crate::mode::Mode;
use crate::session::JourneySession;
use crate::JourneyResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationView {
    pub visit_reference: String,
    pub prisoner_name: String,
    pub prisoner_number: String,
    pub visitors: Vec<SummaryVisitor>,
    pub visit_slot: Option<VisitSlot>,
    pub visit_restriction: Option<VisitRestriction>,
    pub additional_support: Vec<String>,
    pub main_contact: Option<SummaryContact>,
    pub request_method: Option<&'static str>,
    pub is_update: bool,
}

/// Renders the outcome once and ends the journey: the draft is cleared
/// before the view is returned.
pub async fn view(
    ctx: &StepContext<'_>,
    session: &mut JourneySession,
) -> JourneyResult<ConfirmationView> {
    let draft = session.draft()?;
    let visit_reference = draft
        .visit_reference
        .clone()
        .ok_or(CoreError::IncompleteDraft("visit reference"))?;
    let additional_support = support_descriptions(ctx, draft.additional_support.as_ref()).await?;

    let view = ConfirmationView {
        visit_reference,
        prisoner_name: draft.prisoner.name.clone(),
        prisoner_number: draft.prisoner.number.clone(),
        visitors: draft
            .visitors
            .iter()
            .map(|v| SummaryVisitor {
                person_id: v.person_id,
                name: v.name.clone(),
                relationship: v.relationship.clone(),
                adult: v.adult,
            })
            .collect(),
        visit_slot: draft.visit_slot.clone(),
        visit_restriction: draft.visit_restriction,
        additional_support,
        main_contact: draft.main_contact.as_ref().map(|contact| SummaryContact {
            name: contact.contact_name.clone(),
            phone_number: contact.phone_number.as_ref().map(|p| p.0.clone()),
        }),
        request_method: draft.request_method.map(|m| m.description()),
        is_update: ctx.mode == Mode::Update,
    };

    info!("Journey for visit {} finished by {}", view.visit_reference, ctx.staff.username);
    session.clear_journey();
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{booked_draft, Harness};
    use visitline_core::AdditionalSupport;

    #[tokio::test]
    async fn test_confirmation_clears_the_journey() {
        let harness = Harness::new();
        let mut session = JourneySession::default();
        let mut draft = booked_draft();
        draft.additional_support = Some(AdditionalSupport {
            codes: vec!["WHEELCHAIR".to_string()],
            other_details: None,
        });
        session.start(draft);

        let view = view(&harness.ctx(Mode::Book), &mut session).await.unwrap();

        assert_eq!(view.visit_reference, "ab-cd-ef-gh");
        assert_eq!(view.additional_support, vec!["Wheelchair ramp"]);
        assert!(!view.is_update);
        assert!(session.draft.is_none());
        assert!(session.slot_list.is_none());
    }

    #[tokio::test]
    async fn test_failed_support_lookup_keeps_the_draft() {
        let harness = Harness::new();
        harness.reservations.fail_next();
        let mut session = JourneySession::default();
        let mut draft = booked_draft();
        draft.additional_support = Some(AdditionalSupport {
            codes: vec!["WHEELCHAIR".to_string()],
            other_details: None,
        });
        session.start(draft);

        assert!(view(&harness.ctx(Mode::Book), &mut session).await.is_err());
        assert!(session.draft.is_some());
    }
}
