//! Wizard pages, mounted once per mode. Both mounts share the same handlers;
//! the `Mode` extension tells them apart.

mod handlers;

use axum::{routing::get, Extension, Router};
use chrono::Weekday;
use serde::Deserialize;
use visitline_core::slots::{SlotFilters, TimeOfDay};
use visitline_journey::{Mode, Page};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(pages("/book-a-visit", Mode::Book))
        .merge(pages("/visit/{reference}/update", Mode::Update))
}

fn pages(prefix: &str, mode: Mode) -> Router<AppState> {
    let path = |page: Page| format!("{}/{}", prefix, page.slug());

    Router::new()
        .route(
            &path(Page::SelectVisitors),
            get(handlers::select_visitors).post(handlers::submit_visitors),
        )
        .route(&path(Page::VisitType), get(handlers::visit_type).post(handlers::submit_visit_type))
        .route(
            &path(Page::SelectDateAndTime),
            get(handlers::select_date_and_time).post(handlers::submit_date_and_time),
        )
        .route(
            &path(Page::SlotOverbooking),
            get(handlers::slot_overbooking).post(handlers::submit_slot_overbooking),
        )
        .route(
            &path(Page::AdditionalSupport),
            get(handlers::additional_support).post(handlers::submit_additional_support),
        )
        .route(
            &path(Page::MainContact),
            get(handlers::main_contact).post(handlers::submit_main_contact),
        )
        .route(
            &path(Page::RequestMethod),
            get(handlers::request_method).post(handlers::submit_request_method),
        )
        .route(
            &path(Page::CheckYourBooking),
            get(handlers::check_your_booking).post(handlers::submit_check_your_booking),
        )
        .route(
            &path(Page::CommitOverbooking),
            get(handlers::commit_overbooking).post(handlers::submit_commit_overbooking),
        )
        .route(&path(Page::Confirmation), get(handlers::confirmation))
        .layer(Extension(mode))
}

/// `?timeOfDay=&dayOfTheWeek=` on the date and time page. Present keys
/// replace the saved filters; absent keys keep them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotFilterQuery {
    pub time_of_day: Option<String>,
    pub day_of_the_week: Option<String>,
}

impl SlotFilterQuery {
    pub fn filters(&self) -> Option<SlotFilters> {
        if self.time_of_day.is_none() && self.day_of_the_week.is_none() {
            return None;
        }
        let time_of_day = match self.time_of_day.as_deref() {
            Some("morning") => Some(TimeOfDay::Morning),
            Some("afternoon") => Some(TimeOfDay::Afternoon),
            _ => None,
        };
        let day_of_week = self
            .day_of_the_week
            .as_deref()
            .and_then(|day| day.parse::<Weekday>().ok());
        Some(SlotFilters { time_of_day, day_of_week })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_only_when_requested() {
        assert_eq!(SlotFilterQuery::default().filters(), None);

        let query = SlotFilterQuery {
            time_of_day: Some("afternoon".to_string()),
            day_of_the_week: Some("Tuesday".to_string()),
        };
        assert_eq!(
            query.filters(),
            Some(SlotFilters {
                time_of_day: Some(TimeOfDay::Afternoon),
                day_of_week: Some(Weekday::Tue),
            })
        );

        let cleared = SlotFilterQuery {
            time_of_day: Some(String::new()),
            day_of_the_week: None,
        };
        assert_eq!(cleared.filters(), Some(SlotFilters::default()));
    }
}
