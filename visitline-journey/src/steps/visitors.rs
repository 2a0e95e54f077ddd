use serde::{Deserialize, Serialize};
use tracing::debug;
use visitline_core::{PrisonerIdentity, RestrictionFlag, SelectedVisitor};

use super::{invalid, StepContext};
use crate::mode::{Navigation, Page};
use crate::restriction::{derive_restriction, RestrictionDecision};
use crate::session::{FieldError, JourneySession};
use crate::JourneyResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorOption {
    pub person_id: i64,
    pub name: String,
    pub relationship: String,
    pub adult: bool,
    pub restrictions: Vec<RestrictionFlag>,
    /// Banned visitors are listed but cannot be chosen.
    pub selectable: bool,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectVisitorsView {
    pub prisoner: PrisonerIdentity,
    pub visitors: Vec<VisitorOption>,
    pub max_total_visitors: usize,
    pub max_adults: usize,
    pub errors: Vec<FieldError>,
    pub form_values: serde_json::Value,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectVisitorsForm {
    #[serde(default)]
    pub visitors: Vec<String>,
}

pub async fn view(
    ctx: &StepContext<'_>,
    session: &mut JourneySession,
) -> JourneyResult<SelectVisitorsView> {
    let flash = session.take_flash();
    let draft = session.draft()?;
    let approved = ctx.directory.get_approved_visitors(&draft.prisoner.number).await?;
    let chosen = draft.visitor_ids();

    let visitors = approved
        .iter()
        .map(|record| VisitorOption {
            person_id: record.person_id,
            name: record.display_name(),
            relationship: record.relationship.clone(),
            adult: record.is_adult(ctx.today, ctx.rules.adult_age),
            restrictions: record.restrictions.clone(),
            selectable: !record.is_banned(),
            selected: chosen.contains(&record.person_id),
        })
        .collect();

    Ok(SelectVisitorsView {
        prisoner: draft.prisoner.clone(),
        visitors,
        max_total_visitors: ctx.rules.max_total_visitors,
        max_adults: ctx.rules.max_adults,
        errors: flash.errors,
        form_values: flash.form_values,
    })
}

pub async fn submit(
    ctx: &StepContext<'_>,
    session: &mut JourneySession,
    form: &SelectVisitorsForm,
) -> JourneyResult<Navigation> {
    let prisoner_number = session.draft()?.prisoner.number.clone();
    let approved = ctx.directory.get_approved_visitors(&prisoner_number).await?;

    let mut selected = Vec::new();
    for raw in &form.visitors {
        let record = raw
            .parse::<i64>()
            .ok()
            .and_then(|id| approved.iter().find(|r| r.person_id == id))
            .filter(|r| !r.is_banned());
        match record {
            Some(r) if !selected.iter().any(|s: &SelectedVisitor| s.person_id == r.person_id) => {
                let adult = r.is_adult(ctx.today, ctx.rules.adult_age);
                selected.push(SelectedVisitor::from_record(r, adult));
            }
            Some(_) => {}
            None => {
                let error = FieldError::new("visitors", "Invalid selection");
                return Ok(invalid(session, Page::SelectVisitors, vec![error], form));
            }
        }
    }

    if let Some(error) = check_party(ctx, &selected) {
        return Ok(invalid(session, Page::SelectVisitors, vec![error], form));
    }

    let draft = session.draft_mut()?;
    let decision = derive_restriction(&selected, &draft.prisoner);
    debug!("Visitors {:?} for {} -> {:?}", form.visitors, draft.prisoner.number, decision);

    if let Some(contact_id) = draft.main_contact.as_ref().and_then(|c| c.contact_id) {
        if !selected.iter().any(|v| v.person_id == contact_id) {
            draft.main_contact = None;
        }
    }
    draft.visitors = selected;

    match decision {
        RestrictionDecision::Decided { restriction, reason } => {
            draft.visit_restriction = Some(restriction);
            draft.closed_visit_reason = reason;
            Ok(Navigation::Page(Page::SelectDateAndTime))
        }
        RestrictionDecision::NeedsVisitType => {
            draft.visit_restriction = None;
            draft.closed_visit_reason = None;
            Ok(Navigation::Page(Page::VisitType))
        }
    }
}

fn check_party(ctx: &StepContext<'_>, selected: &[SelectedVisitor]) -> Option<FieldError> {
    let rules = ctx.rules;
    let adults = selected.iter().filter(|v| v.adult).count();

    let message = if selected.is_empty() {
        "No visitors selected".to_string()
    } else if selected.len() > rules.max_total_visitors {
        format!("Select no more than {} visitors", rules.max_total_visitors)
    } else if adults > rules.max_adults {
        format!("Select no more than {} visitors {} or older", rules.max_adults, rules.adult_age)
    } else if adults == 0 {
        format!("Add a visitor who is {} or older", rules.adult_age)
    } else {
        return None;
    };
    Some(FieldError::new("visitors", message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Mode;
    use crate::testing::{
        new_draft, Harness, BANNED_VISITOR, CHILD_VISITOR, CLOSED_VISITOR, OPEN_VISITOR,
    };
    use visitline_core::{ClosedVisitReason, RestrictionFlag, VisitRestriction};

    fn form(ids: &[i64]) -> SelectVisitorsForm {
        SelectVisitorsForm {
            visitors: ids.iter().map(|id| id.to_string()).collect(),
        }
    }

    fn session() -> JourneySession {
        let mut session = JourneySession::default();
        session.start(new_draft());
        session
    }

    #[tokio::test]
    async fn test_open_visitor_goes_to_date_and_time() {
        let harness = Harness::new();
        let mut session = session();

        let nav = submit(&harness.ctx(Mode::Book), &mut session, &form(&[OPEN_VISITOR]))
            .await
            .unwrap();

        assert_eq!(nav, Navigation::Page(Page::SelectDateAndTime));
        let draft = session.draft().unwrap();
        assert_eq!(draft.visitor_ids(), vec![OPEN_VISITOR]);
        assert_eq!(draft.visit_restriction, Some(VisitRestriction::Open));
    }

    #[tokio::test]
    async fn test_closed_visitor_decides_closed() {
        let harness = Harness::new();
        let mut session = session();

        submit(&harness.ctx(Mode::Book), &mut session, &form(&[OPEN_VISITOR, CLOSED_VISITOR]))
            .await
            .unwrap();

        let draft = session.draft().unwrap();
        assert_eq!(draft.visit_restriction, Some(VisitRestriction::Closed));
        assert_eq!(draft.closed_visit_reason, Some(ClosedVisitReason::Visitor));
    }

    #[tokio::test]
    async fn test_closed_prisoner_routes_to_visit_type() {
        let harness = Harness::new();
        let mut session = session();
        session.draft_mut().unwrap().prisoner.restrictions =
            vec![RestrictionFlag::new("CLOSED", "Closed")];
        session.draft_mut().unwrap().visit_restriction = Some(VisitRestriction::Open);

        let nav = submit(&harness.ctx(Mode::Book), &mut session, &form(&[OPEN_VISITOR]))
            .await
            .unwrap();

        assert_eq!(nav, Navigation::Page(Page::VisitType));
        assert_eq!(session.draft().unwrap().visit_restriction, None);
    }

    #[tokio::test]
    async fn test_validation_failures_flash_and_return() {
        let harness = Harness::new();
        let ctx = harness.ctx(Mode::Book);

        for (ids, message) in [
            (vec![], "No visitors selected"),
            (vec![CHILD_VISITOR], "Add a visitor who is 18 or older"),
            (vec![BANNED_VISITOR], "Invalid selection"),
            (vec![99], "Invalid selection"),
        ] {
            let mut session = session();
            let nav = submit(&ctx, &mut session, &form(&ids)).await.unwrap();
            assert_eq!(nav, Navigation::Page(Page::SelectVisitors));
            let flash = session.take_flash();
            assert_eq!(flash.errors[0].message, message, "{:?}", ids);
            assert!(session.draft().unwrap().visitors.is_empty());
        }
    }

    #[tokio::test]
    async fn test_adult_limit() {
        let mut harness = Harness::new();
        harness.rules.max_adults = 1;
        let mut session = session();

        submit(&harness.ctx(Mode::Book), &mut session, &form(&[OPEN_VISITOR, CLOSED_VISITOR]))
            .await
            .unwrap();
        assert_eq!(
            session.take_flash().errors[0].message,
            "Select no more than 1 visitors 18 or older"
        );
    }

    #[tokio::test]
    async fn test_view_marks_banned_visitors_unselectable() {
        let harness = Harness::new();
        let mut session = session();
        session.draft_mut().unwrap().visitors =
            vec![crate::testing::selected_visitor(OPEN_VISITOR, vec![])];

        let view = view(&harness.ctx(Mode::Book), &mut session).await.unwrap();

        let banned = view.visitors.iter().find(|v| v.person_id == BANNED_VISITOR).unwrap();
        assert!(!banned.selectable);
        let open = view.visitors.iter().find(|v| v.person_id == OPEN_VISITOR).unwrap();
        assert!(open.selected);
        let child = view.visitors.iter().find(|v| v.person_id == CHILD_VISITOR).unwrap();
        assert!(!child.adult);
    }
}
