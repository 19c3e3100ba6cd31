use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use relay_protocol::{SessionEvent, SessionId};

use crate::store::{SessionRecord, SessionStore, records_after};

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Vec<SessionRecord>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn append(&self, session_id: &SessionId, event: SessionEvent) -> Result<SessionRecord> {
        let mut sessions = self.sessions.write();
        let records = sessions.entry(session_id.clone()).or_default();
        let record = SessionRecord {
            session_id: session_id.clone(),
            sequence: records.len() as u64 + 1,
            event,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn events(&self, session_id: &SessionId, after: u64) -> Result<Vec<SessionRecord>> {
        Ok(self
            .sessions
            .read()
            .get(session_id)
            .map(|records| records_after(records, after))
            .unwrap_or_default())
    }

    async fn last_sequence(&self, session_id: &SessionId) -> Result<u64> {
        Ok(self
            .sessions
            .read()
            .get(session_id)
            .map_or(0, |records| records.len() as u64))
    }
}
