use anyhow::Result;
use async_trait::async_trait;
use relay_protocol::{SessionEvent, SessionId};
use serde::{Deserialize, Serialize};

/// A session event as recorded. Sequences start at 1 and have no gaps
/// within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub sequence: u64,
    pub event: SessionEvent,
}

/// Where session events end up once translated.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Records `event` as the next entry of the session.
    async fn append(&self, session_id: &SessionId, event: SessionEvent) -> Result<SessionRecord>;

    /// Records with `sequence > after`, in order.
    async fn events(&self, session_id: &SessionId, after: u64) -> Result<Vec<SessionRecord>>;

    /// Sequence of the newest record, `0` for an empty session.
    async fn last_sequence(&self, session_id: &SessionId) -> Result<u64>;
}

pub(crate) fn records_after(records: &[SessionRecord], after: u64) -> Vec<SessionRecord> {
    let skip = usize::try_from(after).unwrap_or(usize::MAX);
    records.iter().skip(skip).cloned().collect()
}
