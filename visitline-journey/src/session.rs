use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use visitline_core::slots::{SlotFilters, SlotList};
use visitline_core::Draft;

use crate::{JourneyError, JourneyResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Errors and submitted values replayed once when a step is redisplayed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Flash {
    pub errors: Vec<FieldError>,
    pub form_values: serde_json::Value,
}

impl Flash {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Per-staff-session journey state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JourneySession {
    pub draft: Option<Draft>,
    /// Most recently offered slots, so a submitted slot id can be resolved.
    pub slot_list: Option<SlotList>,
    pub slot_filters: SlotFilters,
    pub flash: Option<Flash>,
}

impl JourneySession {
    pub fn draft(&self) -> JourneyResult<&Draft> {
        self.draft.as_ref().ok_or(JourneyError::NoDraft)
    }

    pub fn draft_mut(&mut self) -> JourneyResult<&mut Draft> {
        self.draft.as_mut().ok_or(JourneyError::NoDraft)
    }

    /// Replace whatever journey was in progress with a fresh draft.
    pub fn start(&mut self, draft: Draft) {
        self.clear_journey();
        self.draft = Some(draft);
    }

    /// Drop the draft and everything derived from it.
    pub fn clear_journey(&mut self) {
        self.draft = None;
        self.slot_list = None;
        self.slot_filters = SlotFilters::default();
        self.flash = None;
    }

    pub fn set_flash<T: Serialize>(&mut self, errors: Vec<FieldError>, form: &T) {
        let form_values = serde_json::to_value(form).unwrap_or(serde_json::Value::Null);
        self.flash = Some(Flash { errors, form_values });
    }

    /// One-shot: the flash is gone after this call.
    pub fn take_flash(&mut self) -> Flash {
        self.flash.take().unwrap_or_default()
    }

    /// Called by stores before persisting.
    pub fn bump_version(&mut self) {
        if let Some(draft) = self.draft.as_mut() {
            draft.version += 1;
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Session backend error: {0}")]
    Backend(String),
    #[error("Session data corrupt: {0}")]
    Corrupt(String),
}

/// Server-side session storage keyed by the staff member's session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Missing sessions load as empty.
    async fn load(&self, session_id: &str) -> Result<JourneySession, StoreError>;

    async fn save(&self, session_id: &str, session: &mut JourneySession) -> Result<(), StoreError>;

    async fn clear(&self, session_id: &str) -> Result<(), StoreError>;
}

/// In-process store for tests and single-node development.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, JourneySession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<JourneySession, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, session_id: &str, session: &mut JourneySession) -> Result<(), StoreError> {
        session.bump_version();
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), session.clone());
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::reserved_draft;

    #[tokio::test]
    async fn test_memory_store_versions_drafts() {
        let store = MemorySessionStore::new();
        let mut session = JourneySession::default();
        session.start(reserved_draft());

        store.save("sid-1", &mut session).await.unwrap();
        store.save("sid-1", &mut session).await.unwrap();

        let loaded = store.load("sid-1").await.unwrap();
        assert_eq!(loaded.draft.unwrap().version, 2);
        assert!(store.load("sid-2").await.unwrap().draft.is_none());
    }

    #[tokio::test]
    async fn test_memory_store_clear_forgets_session() {
        let store = MemorySessionStore::new();
        let mut session = JourneySession::default();
        session.start(reserved_draft());
        store.save("sid-1", &mut session).await.unwrap();

        store.clear("sid-1").await.unwrap();

        assert_eq!(store.load("sid-1").await.unwrap(), JourneySession::default());
    }

    #[test]
    fn test_flash_is_one_shot() {
        let mut session = JourneySession::default();
        session.set_flash(
            vec![FieldError::new("visitors", "No visitors selected")],
            &serde_json::json!({ "visitors": [] }),
        );

        let flash = session.take_flash();
        assert_eq!(flash.errors.len(), 1);
        assert_eq!(flash.form_values["visitors"], serde_json::json!([]));
        assert!(session.take_flash().is_empty());
    }

    #[test]
    fn test_clear_journey_drops_everything() {
        let mut session = JourneySession::default();
        session.start(reserved_draft());
        session.slot_list = Some(SlotList::default());
        session.set_flash(vec![], &());

        session.clear_journey();
        assert_eq!(session, JourneySession::default());
    }
}
