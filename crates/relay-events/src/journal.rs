use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use futures_util::{Stream, StreamExt, future};
use relay_protocol::{SessionEvent, SessionId};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, instrument, warn};

use crate::jsonl::JsonlSessionStore;
use crate::memory::MemorySessionStore;
use crate::store::{SessionRecord, SessionStore};

const DEFAULT_STREAM_BUFFER: usize = 1024;

#[derive(Debug, Clone)]
pub struct JournalConfig {
    /// Directory holding the `sessions/` logs.
    pub root: PathBuf,
    /// Records a slow live subscriber may fall behind before skipping.
    pub stream_buffer: usize,
}

impl JournalConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }
}

/// Where translated session events are handed over.
///
/// Fills in the append time the translators leave unset, lets the store
/// assign the sequence, then publishes the record to live subscribers.
#[derive(Clone)]
pub struct SessionJournal {
    store: Arc<dyn SessionStore>,
    live: broadcast::Sender<SessionRecord>,
}

impl SessionJournal {
    pub fn new(store: Arc<dyn SessionStore>, stream_buffer: usize) -> Self {
        let (live, _) = broadcast::channel(stream_buffer.max(1));
        Self { store, live }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()), DEFAULT_STREAM_BUFFER)
    }

    pub fn from_config(config: &JournalConfig) -> Self {
        Self::new(
            Arc::new(JsonlSessionStore::new(&config.root)),
            config.stream_buffer,
        )
    }

    #[instrument(skip(self, event), fields(session_id = %session_id, author = %event.author))]
    pub async fn append_event(
        &self,
        session_id: &SessionId,
        mut event: SessionEvent,
    ) -> Result<SessionRecord> {
        event.timestamp.get_or_insert_with(Utc::now);
        let record = self.store.append(session_id, event).await?;
        match self.live.send(record.clone()) {
            Ok(subscribers) => debug!(sequence = record.sequence, subscribers, "record published"),
            Err(_) => debug!(sequence = record.sequence, "record stored, nobody listening"),
        }
        Ok(record)
    }

    pub async fn events(&self, session_id: &SessionId, after: u64) -> Result<Vec<SessionRecord>> {
        self.store.events(session_id, after).await
    }

    pub async fn last_sequence(&self, session_id: &SessionId) -> Result<u64> {
        self.store.last_sequence(session_id).await
    }

    /// Records of `session_id` appended from now on.
    pub fn subscribe(
        &self,
        session_id: &SessionId,
    ) -> impl Stream<Item = SessionRecord> + Send + 'static {
        let session_id = session_id.clone();
        BroadcastStream::new(self.live.subscribe()).filter_map(move |item| {
            let record = match item {
                Ok(record) if record.session_id == session_id => Some(record),
                Ok(_) => None,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(session_id = %session_id, skipped, "live subscriber fell behind");
                    None
                }
            };
            future::ready(record)
        })
    }
}
