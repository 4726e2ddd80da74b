//! Activity Ledger: append-only lifecycle log plus per-room summaries
//!
//! Two sinks, both best-effort: a shared daily log file recording every
//! lifecycle event across all rooms, and an in-memory `RoomSummary` per
//! room accumulating that room's event lines. Rendering a summary to the
//! community (posting/editing a status message) is delegated to a
//! `SummaryRenderer` collaborator; the ledger only maintains the canonical
//! text. Ledger failures are logged and never propagated; a lost log line
//! must not block a lifecycle transition.

use crate::model::{ChannelId, Timestamp, UserId};
use crate::provider::ProviderError;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Mutable per-room summary of lifecycle events
///
/// Lives exactly as long as its room: created on the first recorded event,
/// discarded when the room is destroyed. The rendered artifact (if any)
/// outlives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub room_id: ChannelId,
    pub owner_id: UserId,
    pub room_name: String,
    pub created_at: Timestamp,

    /// Accumulated event lines, oldest first
    pub lines: Vec<String>,
}

/// External rendering of a room summary (e.g. an editable status message)
#[async_trait]
pub trait SummaryRenderer: Send + Sync {
    async fn render(&self, summary: &RoomSummary) -> Result<(), ProviderError>;
}

/// Append-only lifecycle event log with a per-room summary index
pub struct ActivityLedger {
    log_dir: PathBuf,
    summaries: HashMap<ChannelId, RoomSummary>,
    renderer: Option<Arc<dyn SummaryRenderer>>,
}

impl ActivityLedger {
    /// Create a ledger writing daily files under `log_dir`
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        ActivityLedger {
            log_dir: log_dir.into(),
            summaries: HashMap::new(),
            renderer: None,
        }
    }

    /// Attach a renderer notified after every recorded event
    pub fn with_renderer(mut self, renderer: Arc<dyn SummaryRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Record a lifecycle event for a room
    ///
    /// Appends to the shared daily log stream, creates or extends the
    /// room's summary, and notifies the renderer. All three are
    /// best-effort; failures are logged and swallowed.
    pub async fn record(
        &mut self,
        room_id: &ChannelId,
        owner_id: &UserId,
        room_name: &str,
        message: &str,
    ) {
        if let Err(e) = self.append_to_stream(room_name, message) {
            warn!(room = %room_id, error = %e, "failed to append ledger entry");
        }

        let summary = self
            .summaries
            .entry(room_id.clone())
            .or_insert_with(|| RoomSummary {
                room_id: room_id.clone(),
                owner_id: owner_id.clone(),
                room_name: room_name.to_string(),
                created_at: Timestamp::now(),
                lines: Vec::new(),
            });
        summary.lines.push(message.to_string());

        if let Some(renderer) = &self.renderer {
            if let Err(e) = renderer.render(summary).await {
                warn!(room = %room_id, error = %e, "summary renderer failed");
            }
        }
    }

    /// Drop the in-memory summary for a destroyed room (idempotent)
    pub fn discard(&mut self, room_id: &ChannelId) {
        self.summaries.remove(room_id);
    }

    /// Current summary for a room, if it is still tracked
    pub fn summary(&self, room_id: &ChannelId) -> Option<&RoomSummary> {
        self.summaries.get(room_id)
    }

    /// Number of tracked summaries
    pub fn summary_count(&self) -> usize {
        self.summaries.len()
    }

    fn append_to_stream(&self, room_name: &str, message: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.log_dir)?;

        let now = Utc::now();
        let path = self.log_dir.join(format!("{}.log", now.format("%Y-%m-%d")));
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(
            file,
            "[{}] {}: {}",
            now.to_rfc3339_opts(SecondsFormat::Millis, true),
            room_name,
            message
        )
    }
}
