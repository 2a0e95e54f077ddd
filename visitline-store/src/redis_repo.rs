use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, info};
use visitline_journey::{JourneySession, SessionStore, StoreError};

/// Journey sessions as one JSON document per staff session, expiring after
/// `ttl_seconds` of inactivity.
#[derive(Clone)]
pub struct RedisSessionStore {
    client: redis::Client,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    pub async fn new(connection_string: &str, ttl_seconds: u64) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client, ttl_seconds })
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(backend)
    }
}

fn session_key(session_id: &str) -> String {
    format!("visit-journey:{}", session_id)
}

fn backend(e: redis::RedisError) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, session_id: &str) -> Result<JourneySession, StoreError> {
        let mut conn = self.connection().await?;
        let stored: Option<String> = conn.get(session_key(session_id)).await.map_err(backend)?;
        match stored {
            Some(json) => {
                serde_json::from_str(&json).map_err(|e| StoreError::Corrupt(e.to_string()))
            }
            None => Ok(JourneySession::default()),
        }
    }

    async fn save(&self, session_id: &str, session: &mut JourneySession) -> Result<(), StoreError> {
        session.bump_version();
        let json = serde_json::to_string(session).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(session_key(session_id), json, self.ttl_seconds)
            .await
            .map_err(backend)?;
        debug!(
            "Session {} saved (draft version {:?})",
            session_id,
            session.draft.as_ref().map(|d| d.version)
        );
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(session_key(session_id)).await.map_err(backend)?;
        info!("Session {} cleared", session_id);
        Ok(())
    }
}
