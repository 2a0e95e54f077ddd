use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use visitline_journey::Staff;

use crate::state::AppState;

/// Claims on the token issued to signed-in staff by the sign-in service.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StaffClaims {
    /// Staff username, recorded as `actionedBy`.
    pub sub: String,
    /// Active establishment.
    pub prison: String,
    /// Session id keying the journey state.
    pub sid: String,
    pub exp: usize,
}

impl StaffClaims {
    pub fn staff(&self) -> Staff {
        Staff {
            username: self.sub.clone(),
            active_prison_id: self.prison.clone(),
        }
    }
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Rejects requests without a valid staff token. A token must name both an
/// active establishment and a session, since journeys are keyed by them.
pub async fn staff_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = bearer_token(&req).ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = decode::<StaffClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        debug!("Rejected staff token: {}", e);
        StatusCode::UNAUTHORIZED
    })?
    .claims;

    if claims.sid.is_empty() || claims.prison.is_empty() {
        return Err(StatusCode::FORBIDDEN);
    }

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
