use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use visitline_core::directory::DirectoryError;
use visitline_core::reservation::ReservationError;
use visitline_journey::JourneyError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    ValidationError(String),
    Anyhow(anyhow::Error),
}

impl AppError {
    /// Journey failures that are the caller's fault keep their meaning;
    /// everything else is a 500.
    fn classify(err: anyhow::Error) -> (StatusCode, String) {
        match err.downcast_ref::<JourneyError>() {
            Some(JourneyError::InvalidIdentifier(id)) => {
                (StatusCode::BAD_REQUEST, format!("Invalid identifier: {}", id))
            }
            Some(JourneyError::Directory(DirectoryError::NotFound(what)))
            | Some(JourneyError::Reservation(ReservationError::NotFound(what))) => {
                (StatusCode::NOT_FOUND, format!("Not found: {}", what))
            }
            _ => {
                tracing::error!("Internal Server Error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Anyhow(err) => AppError::classify(err),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_journey_errors_map_to_statuses() {
        let status = |e: JourneyError| AppError::from(e).into_response().status();

        assert_eq!(status(JourneyError::InvalidIdentifier("A12".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(JourneyError::Directory(DirectoryError::NotFound("A1234BC".into()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(JourneyError::Reservation(ReservationError::Transport("reset".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status(JourneyError::NoDraft), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
