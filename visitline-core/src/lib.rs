pub mod audit;
pub mod directory;
pub mod draft;
pub mod prisoner;
pub mod reservation;
pub mod slots;
pub mod visit;

pub use draft::{Draft, Mode, PrisonerIdentity, SelectedVisitor};
pub use prisoner::{is_valid_prisoner_number, PrisonerProfile, RestrictionFlag, VisitorRecord};
pub use visit::{
    is_valid_visit_reference, AdditionalSupport, ClosedVisitReason, MainContact, RequestMethod,
    SupportType, Visit, VisitRestriction, VisitSlot, VisitStatus,
};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Incomplete draft: {0}")]
    IncompleteDraft(&'static str),
}

pub type CoreResult<T> = Result<T, CoreError>;
