pub mod commit;
pub mod mode;
pub mod overbooking;
pub mod reservation;
pub mod restriction;
pub mod session;
pub mod stage;
pub mod steps;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

use serde::Deserialize;
use visitline_core::directory::DirectoryError;
use visitline_core::reservation::ReservationError;
use visitline_core::CoreError;

pub use mode::{JourneyRoute, Landing, Mode, Navigation, Page};
pub use session::{FieldError, Flash, JourneySession, MemorySessionStore, SessionStore, StoreError};
pub use stage::{stage_gate, GateDecision, GateReason};
pub use steps::{Staff, StepContext};

#[derive(Debug, thiserror::Error)]
pub enum JourneyError {
    #[error("No visit journey in progress")]
    NoDraft,

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Reservation(#[from] ReservationError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type JourneyResult<T> = Result<T, JourneyError>;

/// Prison visit policy applied by the step controllers.
#[derive(Debug, Clone, Deserialize)]
pub struct JourneyRules {
    #[serde(default = "default_max_total_visitors")]
    pub max_total_visitors: usize,
    #[serde(default = "default_max_adults")]
    pub max_adults: usize,
    #[serde(default = "default_adult_age")]
    pub adult_age: u32,
    #[serde(default = "default_min_booking_notice_days")]
    pub min_booking_notice_days: u32,
    #[serde(default = "default_max_booking_days")]
    pub max_booking_days: u32,
}

fn default_max_total_visitors() -> usize {
    10
}

fn default_max_adults() -> usize {
    3
}

fn default_adult_age() -> u32 {
    18
}

fn default_min_booking_notice_days() -> u32 {
    2
}

fn default_max_booking_days() -> u32 {
    28
}

impl Default for JourneyRules {
    fn default() -> Self {
        Self {
            max_total_visitors: default_max_total_visitors(),
            max_adults: default_max_adults(),
            adult_age: default_adult_age(),
            min_booking_notice_days: default_min_booking_notice_days(),
            max_booking_days: default_max_booking_days(),
        }
    }
}
