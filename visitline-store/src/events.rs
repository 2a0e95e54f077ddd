use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{error, info, warn};
use visitline_core::audit::{AuditError, AuditSink};
use visitline_shared::models::events::AuditEvent;

/// Publishes audit events as JSON to the configured topic.
#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
    audit_topic: String,
}

impl EventProducer {
    pub fn new(brokers: &str, audit_topic: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self {
            producer,
            audit_topic: audit_topic.to_string(),
        })
    }

    pub async fn publish(
        &self,
        topic: &str,
        key: &str,
        payload: &str,
    ) -> Result<(), rdkafka::error::KafkaError> {
        let record = FutureRecord::to(topic).key(key).payload(payload);

        match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
            Ok(delivery) => {
                info!(
                    "Sent message to {}/{}: partition {} offset {}",
                    topic, key, delivery.partition, delivery.offset
                );
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to send message to {}: {}", topic, e);
                Err(e)
            }
        }
    }
}

/// Events are keyed by the most stable reference available so every event
/// for one visit lands on the same partition.
fn event_key(event: &AuditEvent) -> &str {
    event
        .visit_reference
        .as_deref()
        .or(event.application_reference.as_deref())
        .unwrap_or(&event.prisoner_number)
}

/// Serialises the event and hands it to a background task; delivery is never
/// awaited by the caller. Delivery failures are logged by that task.
#[async_trait]
impl AuditSink for EventProducer {
    async fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let payload = serde_json::to_string(event).map_err(|e| AuditError(e.to_string()))?;
        let key = event_key(event).to_string();
        let producer = self.clone();
        tokio::spawn(async move {
            if producer.publish(&producer.audit_topic, &key, &payload).await.is_err() {
                warn!("Audit event for {} was not delivered", key);
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use visitline_shared::models::events::AuditEventKind;

    fn event(visit_reference: Option<&str>, application_reference: Option<&str>) -> AuditEvent {
        let start = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap().and_hms_opt(10, 0, 0).unwrap();
        AuditEvent::new(
            AuditEventKind::ReservedVisit,
            visit_reference.map(str::to_string),
            application_reference.map(str::to_string),
            "A1234BC".to_string(),
            "HEI".to_string(),
            "staff-user".to_string(),
            start,
            start + chrono::Duration::hours(1),
        )
    }

    #[test]
    fn test_event_key_prefers_visit_reference() {
        assert_eq!(event_key(&event(Some("ab-cd-ef-gh"), Some("aaa-bbb-ccc"))), "ab-cd-ef-gh");
        assert_eq!(event_key(&event(None, Some("aaa-bbb-ccc"))), "aaa-bbb-ccc");
        assert_eq!(event_key(&event(None, None)), "A1234BC");
    }

    #[tokio::test]
    async fn test_record_returns_before_delivery() {
        // Nothing listens on this port, so delivery can only end in a timeout.
        let producer = EventProducer::new("127.0.0.1:9", "visit-audit").unwrap();

        let recorded = tokio::time::timeout(
            Duration::from_millis(500),
            producer.record(&event(Some("ab-cd-ef-gh"), None)),
        )
        .await;

        assert!(matches!(recorded, Ok(Ok(()))));
    }
}
