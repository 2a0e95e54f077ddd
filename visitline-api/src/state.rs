use chrono::{Local, NaiveDate};
use std::sync::Arc;
use visitline_core::audit::AuditSink;
use visitline_core::directory::PrisonerDirectory;
use visitline_core::reservation::ReservationClient;
use visitline_journey::{JourneyRules, Mode, SessionStore, Staff, StepContext};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

/// Source of "today" for notice-period and age rules.
#[derive(Clone, Copy, Debug)]
pub enum Clock {
    System,
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::System => Local::now().date_naive(),
            Clock::Fixed(date) => *date,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn SessionStore>,
    pub reservations: Arc<dyn ReservationClient>,
    pub directory: Arc<dyn PrisonerDirectory>,
    pub audit: Arc<dyn AuditSink>,
    pub rules: JourneyRules,
    pub auth: AuthConfig,
    pub clock: Clock,
}

impl AppState {
    pub fn step_context<'a>(&'a self, mode: Mode, staff: &'a Staff) -> StepContext<'a> {
        StepContext {
            mode,
            staff,
            reservations: self.reservations.as_ref(),
            directory: self.directory.as_ref(),
            audit: self.audit.as_ref(),
            rules: &self.rules,
            today: self.clock.today(),
        }
    }
}
