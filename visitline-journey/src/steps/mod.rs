//! One controller per wizard page. Each takes the session (draft, saved slot
//! list, flash) plus the submitted form and answers with the next navigation.
//! Book and update journeys share these controllers; `StepContext::mode`
//! selects the mode-dependent behaviour.

pub mod additional_support;
pub mod check;
pub mod confirmation;
pub mod date_time;
pub mod main_contact;
pub mod overbooking;
pub mod request_method;
pub mod start;
pub mod visit_type;
pub mod visitors;

use chrono::NaiveDate;
use serde::Serialize;
use visitline_core::audit::AuditSink;
use visitline_core::directory::PrisonerDirectory;
use visitline_core::reservation::ReservationClient;
use visitline_core::Draft;

use crate::commit::{route_rejection, RejectionTarget};
use crate::mode::{Mode, Navigation, Page};
use crate::reservation::{sync_hold, HoldOutcome};
use crate::session::{FieldError, JourneySession};
use crate::{JourneyResult, JourneyRules};

const HOLD_UPDATE_FAILED: &str = "Your answers could not be saved. Try again.";

/// The signed-in member of staff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staff {
    pub username: String,
    pub active_prison_id: String,
}

/// Collaborators and policy a controller runs with.
pub struct StepContext<'a> {
    pub mode: Mode,
    pub staff: &'a Staff,
    pub reservations: &'a dyn ReservationClient,
    pub directory: &'a dyn PrisonerDirectory,
    pub audit: &'a dyn AuditSink,
    pub rules: &'a JourneyRules,
    pub today: NaiveDate,
}

/// Store errors and the submitted form, then send the user back to `page`.
pub(crate) fn invalid<T: Serialize>(
    session: &mut JourneySession,
    page: Page,
    errors: Vec<FieldError>,
    form: &T,
) -> Navigation {
    session.set_flash(errors, form);
    Navigation::Page(page)
}

/// Apply `change` to the draft and push it onto the hold. `None` means carry
/// on. On a refusal the draft is put back as it was, so it never runs ahead
/// of the hold, and the user is sent to wherever the refusal can be resolved.
pub(crate) async fn resync_hold<T: Serialize>(
    ctx: &StepContext<'_>,
    session: &mut JourneySession,
    page: Page,
    form: &T,
    change: impl FnOnce(&mut Draft),
) -> JourneyResult<Option<Navigation>> {
    let draft = session.draft_mut()?;
    let previous = draft.clone();
    change(draft);

    let codes = match sync_hold(ctx, draft).await {
        Ok(HoldOutcome::Rejected(codes)) => codes,
        Ok(_) => return Ok(None),
        Err(e) => {
            *draft = previous;
            return Err(e);
        }
    };
    *draft = previous;

    let navigation = match route_rejection(&codes) {
        RejectionTarget::SelectDateAndTime(message) => {
            let error = FieldError::new("visitDateAndTime", message);
            invalid(session, Page::SelectDateAndTime, vec![error], &())
        }
        RejectionTarget::Overbooking => Navigation::Page(Page::SlotOverbooking),
        RejectionTarget::Resubmit => {
            invalid(session, page, vec![FieldError::new("submit", HOLD_UPDATE_FAILED)], form)
        }
    };
    Ok(Some(navigation))
}

pub(crate) fn yes_no(value: Option<&str>) -> Option<bool> {
    match value {
        Some("yes") => Some(true),
        Some("no") => Some(false),
        _ => None,
    }
}

/// A GET that either renders its page or, when the draft cannot support the
/// page, sends the user elsewhere.
#[derive(Debug)]
pub enum Rendered<T> {
    Page(T),
    Redirect(Navigation),
}
