use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventKind {
    ReservedVisit,
    ChangedVisit,
    BookedVisit,
    UpdatedVisit,
}

/// Audit trail entry for a hold or commit against the reservation service.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuditEvent {
    pub id: Uuid,
    pub kind: AuditEventKind,
    pub visit_reference: Option<String>,
    pub application_reference: Option<String>,
    pub prisoner_number: String,
    pub prison_id: String,
    pub actioned_by: String,
    pub start_timestamp: NaiveDateTime,
    pub end_timestamp: NaiveDateTime,
    pub timestamp: i64,
}

impl AuditEvent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: AuditEventKind,
        visit_reference: Option<String>,
        application_reference: Option<String>,
        prisoner_number: String,
        prison_id: String,
        actioned_by: String,
        start_timestamp: NaiveDateTime,
        end_timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            visit_reference,
            application_reference,
            prisoner_number,
            prison_id,
            actioned_by,
            start_timestamp,
            end_timestamp,
            timestamp: Utc::now().timestamp(),
        }
    }
}
