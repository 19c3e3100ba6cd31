use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use async_trait::async_trait;
use relay_protocol::{SessionEvent, SessionId};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::store::{SessionRecord, SessionStore, records_after};

/// One JSON-lines log per session under `<root>/sessions/`.
///
/// A session's log is read and validated the first time the session is
/// touched and kept loaded afterwards, so only appends hit the disk.
#[derive(Debug)]
pub struct JsonlSessionStore {
    root: PathBuf,
    logs: Mutex<HashMap<SessionId, SessionLog>>,
}

#[derive(Debug)]
struct SessionLog {
    file: File,
    records: Vec<SessionRecord>,
}

impl SessionLog {
    async fn load(path: &Path, session_id: &SessionId) -> Result<Self> {
        let records = match fs::read_to_string(path).await {
            Ok(text) => parse_log(&text, session_id)
                .with_context(|| format!("corrupt session log {}", path.display()))?,
            Err(error) if error.kind() == ErrorKind::NotFound => Vec::new(),
            Err(error) => {
                return Err(error).with_context(|| format!("reading {}", path.display()));
            }
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("opening {}", path.display()))?;
        debug!(records = records.len(), path = %path.display(), "session log loaded");
        Ok(Self { file, records })
    }
}

fn parse_log(text: &str, session_id: &SessionId) -> Result<Vec<SessionRecord>> {
    let mut records: Vec<SessionRecord> = Vec::new();
    for record in serde_json::Deserializer::from_str(text).into_iter::<SessionRecord>() {
        let record = record?;
        let expected = records.len() as u64 + 1;
        ensure!(
            record.sequence == expected,
            "record {} found where {} was due",
            record.sequence,
            expected
        );
        ensure!(
            &record.session_id == session_id,
            "record {} belongs to session {}",
            record.sequence,
            record.session_id
        );
        records.push(record);
    }
    Ok(records)
}

impl JsonlSessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            logs: Mutex::new(HashMap::new()),
        }
    }

    /// File backing `session_id`. Characters outside `[A-Za-z0-9_-]` are
    /// replaced so any session id maps to a single file name.
    pub fn log_path(&self, session_id: &SessionId) -> PathBuf {
        let name: String = session_id
            .as_str()
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
                _ => '_',
            })
            .collect();
        self.root.join("sessions").join(format!("{name}.jsonl"))
    }

    async fn loaded<'a>(
        &self,
        logs: &'a mut HashMap<SessionId, SessionLog>,
        session_id: &SessionId,
    ) -> Result<&'a mut SessionLog> {
        match logs.entry(session_id.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let log = SessionLog::load(&self.log_path(session_id), session_id).await?;
                Ok(entry.insert(log))
            }
        }
    }
}

#[async_trait]
impl SessionStore for JsonlSessionStore {
    #[instrument(skip(self, event), fields(session_id = %session_id))]
    async fn append(&self, session_id: &SessionId, event: SessionEvent) -> Result<SessionRecord> {
        let mut logs = self.logs.lock().await;
        let log = self.loaded(&mut logs, session_id).await?;

        let record = SessionRecord {
            session_id: session_id.clone(),
            sequence: log.records.len() as u64 + 1,
            event,
        };
        let mut line = serde_json::to_vec(&record).context("encoding session record")?;
        line.push(b'\n');
        log.file
            .write_all(&line)
            .await
            .context("writing session record")?;
        log.file.flush().await?;
        log.records.push(record.clone());
        debug!(sequence = record.sequence, "session record written");
        Ok(record)
    }

    async fn events(&self, session_id: &SessionId, after: u64) -> Result<Vec<SessionRecord>> {
        let mut logs = self.logs.lock().await;
        let log = self.loaded(&mut logs, session_id).await?;
        Ok(records_after(&log.records, after))
    }

    async fn last_sequence(&self, session_id: &SessionId) -> Result<u64> {
        let mut logs = self.logs.lock().await;
        let log = self.loaded(&mut logs, session_id).await?;
        Ok(log.records.len() as u64)
    }
}
