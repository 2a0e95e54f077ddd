//! Page handlers. GET renders the page's view model as JSON; POST runs the
//! controller and answers with a 303 to the next page.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::Form;
use serde::Serialize;
use visitline_journey::overbooking::OverbookingPoint;
use visitline_journey::steps::{
    additional_support::{self, AdditionalSupportForm},
    check::{self, CheckOutcome},
    confirmation,
    date_time::{self, SelectDateAndTimeForm},
    main_contact::{self, MainContactForm},
    overbooking::{self, OverbookingForm},
    request_method::{self, RequestMethodForm},
    visit_type::{self, VisitTypeForm},
    visitors::{self, SelectVisitorsForm},
    Rendered,
};
use visitline_journey::Page;

use super::SlotFilterQuery;
use crate::error::AppError;
use crate::extract::Journey;
use crate::state::AppState;

/// Views consume the flash, so the session is saved before answering.
async fn render<T: Serialize>(
    mut journey: Journey,
    state: &AppState,
    view: T,
) -> Result<Response, AppError> {
    journey.inner.save(state).await?;
    Ok(Json(view).into_response())
}

pub async fn select_visitors(
    State(state): State<AppState>,
    mut journey: Journey,
) -> Result<Response, AppError> {
    if let Some(redirect) = journey.gate(Page::SelectVisitors) {
        return Ok(redirect);
    }
    let (ctx, session) = journey.parts(&state);
    let view = visitors::view(&ctx, session).await?;
    render(journey, &state, view).await
}

pub async fn submit_visitors(
    State(state): State<AppState>,
    mut journey: Journey,
    Form(form): Form<SelectVisitorsForm>,
) -> Result<Response, AppError> {
    if let Some(redirect) = journey.gate(Page::SelectVisitors) {
        return Ok(redirect);
    }
    let (ctx, session) = journey.parts(&state);
    let navigation = visitors::submit(&ctx, session, &form).await?;
    journey.finish(&state, navigation).await
}

pub async fn visit_type(
    State(state): State<AppState>,
    mut journey: Journey,
) -> Result<Response, AppError> {
    if let Some(redirect) = journey.gate(Page::VisitType) {
        return Ok(redirect);
    }
    let (ctx, session) = journey.parts(&state);
    let view = visit_type::view(&ctx, session)?;
    render(journey, &state, view).await
}

pub async fn submit_visit_type(
    State(state): State<AppState>,
    mut journey: Journey,
    Form(form): Form<VisitTypeForm>,
) -> Result<Response, AppError> {
    if let Some(redirect) = journey.gate(Page::VisitType) {
        return Ok(redirect);
    }
    let (ctx, session) = journey.parts(&state);
    let navigation = visit_type::submit(&ctx, session, &form)?;
    journey.finish(&state, navigation).await
}

pub async fn select_date_and_time(
    State(state): State<AppState>,
    Query(query): Query<SlotFilterQuery>,
    mut journey: Journey,
) -> Result<Response, AppError> {
    if let Some(redirect) = journey.gate(Page::SelectDateAndTime) {
        return Ok(redirect);
    }
    let (ctx, session) = journey.parts(&state);
    let view = date_time::view(&ctx, session, query.filters()).await?;
    render(journey, &state, view).await
}

pub async fn submit_date_and_time(
    State(state): State<AppState>,
    mut journey: Journey,
    Form(form): Form<SelectDateAndTimeForm>,
) -> Result<Response, AppError> {
    if let Some(redirect) = journey.gate(Page::SelectDateAndTime) {
        return Ok(redirect);
    }
    let (ctx, session) = journey.parts(&state);
    let navigation = date_time::submit(&ctx, session, &form).await?;
    journey.finish(&state, navigation).await
}

async fn overbooking_page(
    state: AppState,
    mut journey: Journey,
    page: Page,
    point: OverbookingPoint,
) -> Result<Response, AppError> {
    if let Some(redirect) = journey.gate(page) {
        return Ok(redirect);
    }
    let (ctx, session) = journey.parts(&state);
    let rendered = overbooking::view(&ctx, session, point).await?;
    match rendered {
        Rendered::Page(view) => render(journey, &state, view).await,
        Rendered::Redirect(navigation) => journey.finish(&state, navigation).await,
    }
}

async fn overbooking_answer(
    state: AppState,
    mut journey: Journey,
    page: Page,
    point: OverbookingPoint,
    form: OverbookingForm,
) -> Result<Response, AppError> {
    if let Some(redirect) = journey.gate(page) {
        return Ok(redirect);
    }
    let (ctx, session) = journey.parts(&state);
    let navigation = overbooking::submit(&ctx, session, point, &form).await?;
    journey.finish(&state, navigation).await
}

pub async fn slot_overbooking(
    State(state): State<AppState>,
    journey: Journey,
) -> Result<Response, AppError> {
    overbooking_page(state, journey, Page::SlotOverbooking, OverbookingPoint::AfterSlotSelection)
        .await
}

pub async fn submit_slot_overbooking(
    State(state): State<AppState>,
    journey: Journey,
    Form(form): Form<OverbookingForm>,
) -> Result<Response, AppError> {
    overbooking_answer(
        state,
        journey,
        Page::SlotOverbooking,
        OverbookingPoint::AfterSlotSelection,
        form,
    )
    .await
}

pub async fn commit_overbooking(
    State(state): State<AppState>,
    journey: Journey,
) -> Result<Response, AppError> {
    overbooking_page(state, journey, Page::CommitOverbooking, OverbookingPoint::BeforeCommit).await
}

pub async fn submit_commit_overbooking(
    State(state): State<AppState>,
    journey: Journey,
    Form(form): Form<OverbookingForm>,
) -> Result<Response, AppError> {
    overbooking_answer(
        state,
        journey,
        Page::CommitOverbooking,
        OverbookingPoint::BeforeCommit,
        form,
    )
    .await
}

pub async fn additional_support(
    State(state): State<AppState>,
    mut journey: Journey,
) -> Result<Response, AppError> {
    if let Some(redirect) = journey.gate(Page::AdditionalSupport) {
        return Ok(redirect);
    }
    let (ctx, session) = journey.parts(&state);
    let view = additional_support::view(&ctx, session).await?;
    render(journey, &state, view).await
}

pub async fn submit_additional_support(
    State(state): State<AppState>,
    mut journey: Journey,
    Form(form): Form<AdditionalSupportForm>,
) -> Result<Response, AppError> {
    if let Some(redirect) = journey.gate(Page::AdditionalSupport) {
        return Ok(redirect);
    }
    let (ctx, session) = journey.parts(&state);
    let navigation = additional_support::submit(&ctx, session, &form).await?;
    journey.finish(&state, navigation).await
}

pub async fn main_contact(
    State(state): State<AppState>,
    mut journey: Journey,
) -> Result<Response, AppError> {
    if let Some(redirect) = journey.gate(Page::MainContact) {
        return Ok(redirect);
    }
    let view = main_contact::view(&mut journey.inner.session)?;
    render(journey, &state, view).await
}

pub async fn submit_main_contact(
    State(state): State<AppState>,
    mut journey: Journey,
    Form(form): Form<MainContactForm>,
) -> Result<Response, AppError> {
    if let Some(redirect) = journey.gate(Page::MainContact) {
        return Ok(redirect);
    }
    let (ctx, session) = journey.parts(&state);
    let navigation = main_contact::submit(&ctx, session, &form).await?;
    journey.finish(&state, navigation).await
}

pub async fn request_method(
    State(state): State<AppState>,
    mut journey: Journey,
) -> Result<Response, AppError> {
    if let Some(redirect) = journey.gate(Page::RequestMethod) {
        return Ok(redirect);
    }
    let view = request_method::view(&mut journey.inner.session)?;
    render(journey, &state, view).await
}

pub async fn submit_request_method(
    State(state): State<AppState>,
    mut journey: Journey,
    Form(form): Form<RequestMethodForm>,
) -> Result<Response, AppError> {
    if let Some(redirect) = journey.gate(Page::RequestMethod) {
        return Ok(redirect);
    }
    let navigation = request_method::submit(&mut journey.inner.session, &form)?;
    journey.finish(&state, navigation).await
}

pub async fn check_your_booking(
    State(state): State<AppState>,
    mut journey: Journey,
) -> Result<Response, AppError> {
    if let Some(redirect) = journey.gate(Page::CheckYourBooking) {
        return Ok(redirect);
    }
    let (ctx, session) = journey.parts(&state);
    let view = check::view(&ctx, session, None).await?;
    render(journey, &state, view).await
}

/// A generic commit failure re-renders the check page in place with the
/// error; everything else redirects.
pub async fn submit_check_your_booking(
    State(state): State<AppState>,
    mut journey: Journey,
) -> Result<Response, AppError> {
    if let Some(redirect) = journey.gate(Page::CheckYourBooking) {
        return Ok(redirect);
    }
    let (ctx, session) = journey.parts(&state);
    let outcome = check::submit(&ctx, session).await?;
    match outcome {
        CheckOutcome::Navigate(navigation) => journey.finish(&state, navigation).await,
        CheckOutcome::Retry { message } => {
            let (ctx, session) = journey.parts(&state);
            let view = check::view(&ctx, session, Some(message)).await?;
            render(journey, &state, view).await
        }
    }
}

pub async fn confirmation(
    State(state): State<AppState>,
    mut journey: Journey,
) -> Result<Response, AppError> {
    if let Some(redirect) = journey.gate(Page::Confirmation) {
        return Ok(redirect);
    }
    let (ctx, session) = journey.parts(&state);
    let view = confirmation::view(&ctx, session).await?;
    render(journey, &state, view).await
}
