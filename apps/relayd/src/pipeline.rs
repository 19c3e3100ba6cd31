use std::io;

use anyhow::{Context, Result};
use async_stream::try_stream;
use clap::ValueEnum;
use futures_util::{Stream, StreamExt, pin_mut};
use relay_convert::{to_protocol_message, to_session_event};
use relay_events::SessionJournal;
use relay_protocol::{InvocationContext, ProtocolEvent, SessionEvent, SessionId};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Direction {
    /// Protocol events in, session events out.
    Inbound,
    /// Session events in, protocol messages out.
    Outbound,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub read: usize,
    pub emitted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Where inbound session events are recorded.
pub struct JournalSink<'a> {
    pub journal: &'a SessionJournal,
    pub session_id: &'a SessionId,
}

/// Non-blank input lines with their 1-based line numbers.
pub fn input_lines<R>(reader: R) -> impl Stream<Item = io::Result<(usize, String)>>
where
    R: AsyncBufRead + Unpin,
{
    try_stream! {
        let mut lines = reader.lines();
        let mut line_no = 0_usize;
        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            yield (line_no, line);
        }
    }
}

/// Translates every line of `reader` and writes the results to `writer` as
/// JSON lines.
///
/// Malformed lines and translation failures are logged and counted; I/O and
/// journal failures abort the run.
pub async fn run<R, W>(
    direction: Direction,
    ctx: &dyn InvocationContext,
    journal: Option<JournalSink<'_>>,
    reader: R,
    writer: &mut W,
) -> Result<Summary>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut summary = Summary::default();
    let lines = input_lines(reader);
    pin_mut!(lines);

    while let Some(item) = lines.next().await {
        let (line_no, line) = item.context("failed reading input")?;
        summary.read += 1;

        let rendered = match direction {
            Direction::Inbound => {
                let event: ProtocolEvent = match serde_json::from_str(&line) {
                    Ok(event) => event,
                    Err(error) => {
                        warn!(line_no, %error, "skipping malformed protocol event");
                        summary.failed += 1;
                        continue;
                    }
                };
                match to_session_event(Some(ctx), &event) {
                    Ok(Some(session_event)) => {
                        let session_event = match &journal {
                            Some(sink) => {
                                sink.journal
                                    .append_event(sink.session_id, session_event)
                                    .await?
                                    .event
                            }
                            None => session_event,
                        };
                        serde_json::to_string(&session_event)?
                    }
                    Ok(None) => {
                        debug!(line_no, kind = event.kind(), "nothing to emit");
                        summary.skipped += 1;
                        continue;
                    }
                    Err(error) => {
                        warn!(line_no, %error, "protocol event not translated");
                        summary.failed += 1;
                        continue;
                    }
                }
            }
            Direction::Outbound => {
                let event: SessionEvent = match serde_json::from_str(&line) {
                    Ok(event) => event,
                    Err(error) => {
                        warn!(line_no, %error, "skipping malformed session event");
                        summary.failed += 1;
                        continue;
                    }
                };
                match to_protocol_message(Some(ctx), &event) {
                    Ok(Some(message)) => serde_json::to_string(&ProtocolEvent::from(message))?,
                    Ok(None) => {
                        debug!(line_no, "session event has no content to send");
                        summary.skipped += 1;
                        continue;
                    }
                    Err(error) => {
                        warn!(line_no, %error, "session event not translated");
                        summary.failed += 1;
                        continue;
                    }
                }
            }
        };

        writer.write_all(rendered.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        summary.emitted += 1;
    }

    writer.flush().await?;
    Ok(summary)
}
