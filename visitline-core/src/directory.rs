use async_trait::async_trait;

use crate::prisoner::{PrisonerProfile, VisitorRecord};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Prisoner not found: {0}")]
    NotFound(String),
    #[error("Prisoner directory unavailable: {0}")]
    Unavailable(String),
}

/// Prisoner and approved-visitor lookups.
#[async_trait]
pub trait PrisonerDirectory: Send + Sync {
    async fn get_prisoner(
        &self,
        prison_id: &str,
        prisoner_number: &str,
    ) -> Result<PrisonerProfile, DirectoryError>;

    async fn get_approved_visitors(
        &self,
        prisoner_number: &str,
    ) -> Result<Vec<VisitorRecord>, DirectoryError>;
}
