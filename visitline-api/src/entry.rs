//! Ways into and out of a journey.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::post,
    Router,
};
use axum_extra::extract::Form;
use tracing::info;
use visitline_journey::steps::start::{self, StartUpdateForm};
use visitline_journey::{JourneyRoute, Landing, Mode};

use crate::error::AppError;
use crate::extract::StaffSession;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/prisoner/{prisoner_number}/book-a-visit", post(start_booking))
        .route("/visit/{reference}/update", post(start_update))
        .route("/back-to-start", post(back_to_start))
}

/// Replaces any journey in progress with a new booking for the prisoner.
async fn start_booking(
    State(state): State<AppState>,
    Path(prisoner_number): Path<String>,
    mut staff_session: StaffSession,
) -> Result<Response, AppError> {
    let ctx = state.step_context(Mode::Book, &staff_session.staff);
    let navigation =
        start::start_booking(&ctx, &mut staff_session.session, &prisoner_number).await?;
    staff_session.save(&state).await?;
    Ok(Redirect::to(&navigation.url(&JourneyRoute::book())).into_response())
}

async fn start_update(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    mut staff_session: StaffSession,
    Form(form): Form<StartUpdateForm>,
) -> Result<Response, AppError> {
    let ctx = state.step_context(Mode::Update, &staff_session.staff);
    let navigation =
        start::start_update(&ctx, &mut staff_session.session, &reference, &form).await?;
    staff_session.save(&state).await?;
    Ok(Redirect::to(&navigation.url(&JourneyRoute::update(&reference))).into_response())
}

/// Abandons the journey and drops the stored session. Any hold is left to
/// expire on the reservation side.
async fn back_to_start(
    State(state): State<AppState>,
    staff_session: StaffSession,
) -> Result<Response, AppError> {
    if staff_session.session.draft.is_some() {
        info!("{} abandoned their visit journey", staff_session.staff.username);
    }
    state.sessions.clear(&staff_session.session_id).await?;
    Ok(Redirect::to(&Landing::PrisonerSearch { error: None }.url()).into_response())
}
