//! HTTP client for the visit orchestration service, which fronts the
//! reservation system and the prisoner and contact registries.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use visitline_core::directory::{DirectoryError, PrisonerDirectory};
use visitline_core::reservation::{
    ChangedVisit, CommitRequest, CommittedVisit, ReservationClient, ReservationError,
    ReserveRequest, ReservedVisit, SessionQuery, SingleSessionQuery, ValidationCode,
};
use visitline_core::slots::{SessionCapacity, VisitSession};
use visitline_core::{PrisonerProfile, SupportType, Visit, VisitorRecord};

#[derive(Clone)]
pub struct OrchestrationClient {
    http: Client,
    base_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    validation_errors: Vec<ValidationCode>,
}

/// Maps a non-success response to the error the journey acts on. Only 422
/// carries application validation codes.
pub fn map_error_response(status: u16, body: &str, resource: &str) -> ReservationError {
    match status {
        422 => {
            let codes = serde_json::from_str::<ErrorBody>(body)
                .map(|b| b.validation_errors)
                .unwrap_or_default();
            ReservationError::Validation(codes)
        }
        404 => ReservationError::NotFound(resource.to_string()),
        _ => ReservationError::Unexpected {
            status,
            message: body.chars().take(200).collect(),
        },
    }
}

fn transport(e: reqwest::Error) -> ReservationError {
    ReservationError::Transport(e.to_string())
}

fn directory_error(e: ReservationError) -> DirectoryError {
    match e {
        ReservationError::NotFound(resource) => DirectoryError::NotFound(resource),
        other => DirectoryError::Unavailable(other.to_string()),
    }
}

impl OrchestrationClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<Response, ReservationError> {
        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        debug!("{} -> {}", path, status);
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let error = map_error_response(status.as_u16(), &body, path);
        warn!("Orchestration call {} failed: {}", path, error);
        Err(error)
    }

    async fn json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<T, ReservationError> {
        self.execute(request, path).await?.json().await.map_err(transport)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ReservationError> {
        self.json(self.http.get(self.url(path)), path).await
    }
}

#[async_trait]
impl ReservationClient for OrchestrationClient {
    async fn reserve_visit(
        &self,
        request: &ReserveRequest,
    ) -> Result<ReservedVisit, ReservationError> {
        let path = "/visits/slot/reserve";
        self.json(self.http.post(self.url(path)).json(request), path).await
    }

    async fn change_reserved_visit(
        &self,
        application_reference: &str,
        request: &ReserveRequest,
    ) -> Result<(), ReservationError> {
        let path = format!("/visits/{}/slot/change", application_reference);
        self.execute(self.http.put(self.url(&path)).json(request), &path).await?;
        Ok(())
    }

    async fn change_booked_visit(
        &self,
        visit_reference: &str,
        request: &ReserveRequest,
    ) -> Result<ChangedVisit, ReservationError> {
        let path = format!("/visits/{}/change", visit_reference);
        self.json(self.http.put(self.url(&path)).json(request), &path).await
    }

    async fn book_visit(
        &self,
        application_reference: &str,
        request: &CommitRequest,
    ) -> Result<CommittedVisit, ReservationError> {
        let path = format!("/visits/{}/book", application_reference);
        self.json(self.http.put(self.url(&path)).json(request), &path).await
    }

    async fn update_visit(
        &self,
        application_reference: &str,
        request: &CommitRequest,
    ) -> Result<CommittedVisit, ReservationError> {
        let path = format!("/visits/{}/update", application_reference);
        self.json(self.http.put(self.url(&path)).json(request), &path).await
    }

    async fn get_visit_sessions(
        &self,
        query: &SessionQuery,
    ) -> Result<Vec<VisitSession>, ReservationError> {
        let path = "/visit-sessions";
        let request = self.http.get(self.url(path)).query(&[
            ("prisonId", query.prison_id.clone()),
            ("prisonerId", query.prisoner_id.clone()),
            ("min", query.min_number_of_days.to_string()),
            ("max", query.max_number_of_days.to_string()),
            ("username", query.username.clone()),
        ]);
        self.json(request, path).await
    }

    async fn get_single_visit_session(
        &self,
        query: &SingleSessionQuery,
    ) -> Result<SessionCapacity, ReservationError> {
        let path = "/visit-sessions/capacity";
        let request = self.http.get(self.url(path)).query(&[
            ("prisonCode", query.prison_id.clone()),
            ("sessionDate", query.session_date.format("%Y-%m-%d").to_string()),
            ("sessionTemplateReference", query.session_template_reference.clone()),
        ]);
        self.json(request, path).await
    }

    async fn get_visit(&self, reference: &str) -> Result<Visit, ReservationError> {
        self.get(&format!("/visits/{}", reference)).await
    }

    async fn get_support_types(&self) -> Result<Vec<SupportType>, ReservationError> {
        self.get("/visit-support").await
    }
}

#[async_trait]
impl PrisonerDirectory for OrchestrationClient {
    async fn get_prisoner(
        &self,
        prison_id: &str,
        prisoner_number: &str,
    ) -> Result<PrisonerProfile, DirectoryError> {
        self.get(&format!("/prisoner/{}/{}/profile", prison_id, prisoner_number))
            .await
            .map_err(directory_error)
    }

    async fn get_approved_visitors(
        &self,
        prisoner_number: &str,
    ) -> Result<Vec<VisitorRecord>, DirectoryError> {
        self.get(&format!("/prisoner/{}/visitors/approved", prisoner_number))
            .await
            .map_err(directory_error)
    }
}
