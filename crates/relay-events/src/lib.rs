//! Session journal for translated session events.
//!
//! The translators hand finished [`SessionEvent`](relay_protocol::SessionEvent)s
//! to a [`SessionJournal`], which stamps the append time, records the event
//! through a [`SessionStore`] and fans the record out to live subscribers.
//!
//! - [`MemorySessionStore`]: in-process, for tests and one-shot runs
//! - [`JsonlSessionStore`]: one JSON-lines log per session on disk

mod journal;
mod jsonl;
mod memory;
mod store;

pub use journal::{JournalConfig, SessionJournal};
pub use jsonl::JsonlSessionStore;
pub use memory::MemorySessionStore;
pub use store::{SessionRecord, SessionStore};
