use axum::extract::{FromRequestParts, RawPathParams};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::info;
use visitline_core::is_valid_visit_reference;
use visitline_journey::{
    stage_gate, GateDecision, JourneyRoute, JourneySession, Mode, Navigation, Page, Staff,
    StepContext,
};

use crate::error::AppError;
use crate::middleware::StaffClaims;
use crate::state::AppState;

/// The signed-in member of staff with their loaded journey session.
pub struct StaffSession {
    pub staff: Staff,
    pub session_id: String,
    pub session: JourneySession,
}

impl StaffSession {
    pub async fn save(&mut self, state: &AppState) -> Result<(), AppError> {
        state.sessions.save(&self.session_id, &mut self.session).await?;
        Ok(())
    }
}

impl FromRequestParts<AppState> for StaffSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<StaffClaims>()
            .cloned()
            .ok_or_else(|| AppError::AuthenticationError("Not signed in".to_string()))?;
        let session = state.sessions.load(&claims.sid).await?;

        Ok(Self {
            staff: claims.staff(),
            session_id: claims.sid,
            session,
        })
    }
}

/// A request inside a booking or update journey. The mode comes from the
/// router the page is mounted on; update journeys also carry the visit
/// reference from the URL, which must be well formed.
pub struct Journey {
    pub route: JourneyRoute,
    pub inner: StaffSession,
}

impl Journey {
    /// `Some` when the draft cannot serve `page` and the user must go elsewhere.
    pub fn gate(&self, page: Page) -> Option<Response> {
        let decision = stage_gate(
            page.stage(),
            self.inner.session.draft.as_ref(),
            &self.inner.staff.active_prison_id,
            &self.route,
        );
        match decision {
            GateDecision::Continue => None,
            GateDecision::RedirectTo { reason, landing } => {
                info!(
                    "{} denied {} for {}: {}",
                    self.route.prefix(),
                    page.slug(),
                    self.inner.staff.username,
                    reason.code()
                );
                Some(Redirect::to(&landing.url()).into_response())
            }
        }
    }

    /// Borrow the collaborators and the session at once.
    pub fn parts<'a>(
        &'a mut self,
        state: &'a AppState,
    ) -> (StepContext<'a>, &'a mut JourneySession) {
        let ctx = state.step_context(self.route.mode, &self.inner.staff);
        (ctx, &mut self.inner.session)
    }

    /// Persist the session and redirect to wherever the controller pointed.
    pub async fn finish(
        mut self,
        state: &AppState,
        navigation: Navigation,
    ) -> Result<Response, AppError> {
        self.inner.save(state).await?;
        Ok(Redirect::to(&navigation.url(&self.route)).into_response())
    }
}

impl FromRequestParts<AppState> for Journey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let mode = parts.extensions.get::<Mode>().copied().unwrap_or(Mode::Book);
        let route = match mode {
            Mode::Book => JourneyRoute::book(),
            Mode::Update => {
                let params = RawPathParams::from_request_parts(parts, state)
                    .await
                    .map_err(|e| AppError::ValidationError(e.body_text()))?;
                let reference = params
                    .iter()
                    .find(|(key, _)| *key == "reference")
                    .map(|(_, value)| value.to_string())
                    .unwrap_or_default();
                if !is_valid_visit_reference(&reference) {
                    let message = format!("Invalid visit reference: {}", reference);
                    return Err(AppError::ValidationError(message));
                }
                JourneyRoute::update(&reference)
            }
        };

        let inner = StaffSession::from_request_parts(parts, state).await?;
        Ok(Self { route, inner })
    }
}
