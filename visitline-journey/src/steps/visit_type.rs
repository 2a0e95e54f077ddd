use serde::{Deserialize, Serialize};
use visitline_core::{ClosedVisitReason, PrisonerIdentity, RestrictionFlag, VisitRestriction};

use super::{invalid, StepContext};
use crate::mode::{Navigation, Page};
use crate::session::{FieldError, JourneySession};
use crate::JourneyResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitTypeView {
    pub prisoner: PrisonerIdentity,
    pub closed_restrictions: Vec<RestrictionFlag>,
    pub visit_restriction: Option<VisitRestriction>,
    pub errors: Vec<FieldError>,
    pub form_values: serde_json::Value,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitTypeForm {
    pub visit_type: Option<String>,
}

pub fn view(_ctx: &StepContext<'_>, session: &mut JourneySession) -> JourneyResult<VisitTypeView> {
    let flash = session.take_flash();
    let draft = session.draft()?;
    Ok(VisitTypeView {
        prisoner: draft.prisoner.clone(),
        closed_restrictions: draft
            .prisoner
            .restrictions
            .iter()
            .filter(|r| r.is_closed())
            .cloned()
            .collect(),
        visit_restriction: draft.visit_restriction,
        errors: flash.errors,
        form_values: flash.form_values,
    })
}

/// Records the staff member's choice for a prisoner with a closed restriction.
pub fn submit(
    _ctx: &StepContext<'_>,
    session: &mut JourneySession,
    form: &VisitTypeForm,
) -> JourneyResult<Navigation> {
    if session.draft()?.visitors.is_empty() {
        return Ok(Navigation::Page(Page::SelectVisitors));
    }

    let restriction = form
        .visit_type
        .as_deref()
        .and_then(|value| value.parse::<VisitRestriction>().ok());
    let Some(restriction) = restriction else {
        let error = FieldError::new("visitType", "No visit type selected");
        return Ok(invalid(session, Page::VisitType, vec![error], form));
    };

    let draft = session.draft_mut()?;
    draft.visit_restriction = Some(restriction);
    draft.closed_visit_reason = match restriction {
        VisitRestriction::Closed => Some(ClosedVisitReason::Prisoner),
        VisitRestriction::Open => None,
    };
    Ok(Navigation::Page(Page::SelectDateAndTime))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Mode;
    use crate::testing::{new_draft, selected_visitor, Harness, OPEN_VISITOR};

    fn session_with_visitor() -> JourneySession {
        let mut session = JourneySession::default();
        let mut draft = new_draft();
        draft.visitors = vec![selected_visitor(OPEN_VISITOR, vec![])];
        session.start(draft);
        session
    }

    #[test]
    fn test_closed_choice_records_prisoner_reason() {
        let harness = Harness::new();
        let mut session = session_with_visitor();
        let form = VisitTypeForm { visit_type: Some("CLOSED".to_string()) };

        let nav = submit(&harness.ctx(Mode::Book), &mut session, &form).unwrap();

        assert_eq!(nav, Navigation::Page(Page::SelectDateAndTime));
        let draft = session.draft().unwrap();
        assert_eq!(draft.visit_restriction, Some(VisitRestriction::Closed));
        assert_eq!(draft.closed_visit_reason, Some(ClosedVisitReason::Prisoner));
    }

    #[test]
    fn test_missing_choice_is_a_validation_error() {
        let harness = Harness::new();
        let mut session = session_with_visitor();

        let form = VisitTypeForm { visit_type: Some("SOCIAL".to_string()) };

        let nav = submit(&harness.ctx(Mode::Book), &mut session, &form).unwrap();

        assert_eq!(nav, Navigation::Page(Page::VisitType));
        assert_eq!(session.take_flash().errors[0].message, "No visit type selected");
        assert_eq!(session.draft().unwrap().visit_restriction, None);
    }

    #[test]
    fn test_requires_visitors_first() {
        let harness = Harness::new();
        let mut session = JourneySession::default();
        session.start(new_draft());
        let form = VisitTypeForm { visit_type: Some("OPEN".to_string()) };

        let nav = submit(&harness.ctx(Mode::Book), &mut session, &form).unwrap();
        assert_eq!(nav, Navigation::Page(Page::SelectVisitors));
    }
}
