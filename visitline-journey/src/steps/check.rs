use serde::Serialize;
use visitline_core::{AdditionalSupport, ClosedVisitReason, VisitRestriction, VisitSlot};

use super::{invalid, StepContext};
use crate::commit::{commit_visit, CommitOutcome, RejectionTarget};
use crate::mode::{Mode, Navigation, Page};
use crate::overbooking::late_capacity_check;
use crate::session::{FieldError, JourneySession};
use crate::JourneyResult;

pub const BOOK_FAILED_MESSAGE: &str = "Failed to book this visit. You can try to submit again.";
pub const UPDATE_FAILED_MESSAGE: &str = "Failed to update this visit. You can try to submit again.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryVisitor {
    pub person_id: i64,
    pub name: String,
    pub relationship: String,
    pub adult: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryContact {
    pub name: String,
    pub phone_number: Option<String>,
}

/// Everything collected so far, ready for the final review.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckView {
    pub prisoner_name: String,
    pub prisoner_number: String,
    pub prisoner_location: String,
    pub visitors: Vec<SummaryVisitor>,
    pub visit_slot: Option<VisitSlot>,
    pub visit_restriction: Option<VisitRestriction>,
    pub closed_visit_reason: Option<ClosedVisitReason>,
    pub additional_support: Vec<String>,
    pub main_contact: Option<SummaryContact>,
    pub request_method: Option<&'static str>,
    pub is_update: bool,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Navigate(Navigation),
    /// Show the review page again with `message`; the draft is untouched.
    Retry { message: &'static str },
}

/// `error` is shown above the summary when a commit just failed.
pub async fn view(
    ctx: &StepContext<'_>,
    session: &mut JourneySession,
    error: Option<&str>,
) -> JourneyResult<CheckView> {
    let mut errors = session.take_flash().errors;
    if let Some(message) = error {
        errors.push(FieldError::new("submit", message));
    }
    let draft = session.draft()?;
    let additional_support = support_descriptions(ctx, draft.additional_support.as_ref()).await?;

    Ok(CheckView {
        prisoner_name: draft.prisoner.name.clone(),
        prisoner_number: draft.prisoner.number.clone(),
        prisoner_location: draft.prisoner.location.clone(),
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
        closed_visit_reason: draft.closed_visit_reason,
        additional_support,
        main_contact: draft.main_contact.as_ref().map(|contact| SummaryContact {
            name: contact.contact_name.clone(),
            phone_number: contact.phone_number.as_ref().map(|p| p.0.clone()),
        }),
        request_method: draft.request_method.map(|m| m.description()),
        is_update: ctx.mode == Mode::Update,
        errors,
    })
}

/// Re-checks capacity unless overbooking was already accepted, then commits.
pub async fn submit(
    ctx: &StepContext<'_>,
    session: &mut JourneySession,
) -> JourneyResult<CheckOutcome> {
    let draft = session.draft()?;
    if draft.request_method.is_some() && late_capacity_check(ctx, draft).await?.is_some() {
        return Ok(CheckOutcome::Navigate(Navigation::Page(Page::CommitOverbooking)));
    }
    commit(ctx, session).await
}

pub(crate) async fn commit(
    ctx: &StepContext<'_>,
    session: &mut JourneySession,
) -> JourneyResult<CheckOutcome> {
    let draft = session.draft_mut()?;
    if draft.request_method.is_none() {
        return Ok(CheckOutcome::Navigate(Navigation::Page(Page::RequestMethod)));
    }

    let target = match commit_visit(ctx, draft).await? {
        CommitOutcome::Committed { .. } => {
            return Ok(CheckOutcome::Navigate(Navigation::Page(Page::Confirmation)));
        }
        CommitOutcome::Rejected { target, .. } => target,
    };

    let outcome = match target {
        RejectionTarget::SelectDateAndTime(message) => {
            let error = FieldError::new("visitDateAndTime", message);
            CheckOutcome::Navigate(invalid(session, Page::SelectDateAndTime, vec![error], &()))
        }
        RejectionTarget::Overbooking => {
            CheckOutcome::Navigate(Navigation::Page(Page::CommitOverbooking))
        }
        RejectionTarget::Resubmit => CheckOutcome::Retry {
            message: match ctx.mode {
                Mode::Book => BOOK_FAILED_MESSAGE,
                Mode::Update => UPDATE_FAILED_MESSAGE,
            },
        },
    };
    Ok(outcome)
}

/// Human-readable support lines; "other" shows the free-text details.
pub(crate) async fn support_descriptions(
    ctx: &StepContext<'_>,
    support: Option<&AdditionalSupport>,
) -> JourneyResult<Vec<String>> {
    let Some(support) = support.filter(|s| s.is_required()) else {
        return Ok(Vec::new());
    };
    let types = ctx.reservations.get_support_types().await?;

    Ok(support
        .codes
        .iter()
        .map(|code| {
            if code == AdditionalSupport::OTHER {
                if let Some(details) = support.other_details.as_ref() {
                    return details.clone();
                }
            }
            types
                .iter()
                .find(|t| &t.code == code)
                .map(|t| t.description.clone())
                .unwrap_or_else(|| code.clone())
        })
        .collect())
}
