use async_trait::async_trait;
use visitline_shared::models::events::AuditEvent;

#[derive(Debug, thiserror::Error)]
#[error("Audit publish failed: {0}")]
pub struct AuditError(pub String);

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: &AuditEvent) -> Result<(), AuditError>;
}
