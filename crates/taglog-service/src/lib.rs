//! Inbound facade over the tag store and render engine. Receives
//! already-validated primitive values from the chat collaborator and
//! returns transcripts; all chat-platform concerns (permissions, message
//! parsing, paging) stay with the caller.

pub mod timeparse;

pub use timeparse::{parse_clock, parse_start_time};

use std::sync::Arc;

use taglog_db::{Database, Result, StoreError, TagQuery, TagStore};
use taglog_render::render;
use taglog_types::{Order, Style, Tag};

/// Largest timestamp shift a single adjust call may apply, in seconds.
const MAX_ADJUST_OFFSET: i64 = 7200;

/// Parameters for one transcript dump.
#[derive(Debug, Clone)]
pub struct DumpRequest {
    pub guild_id: i64,
    pub start: i64,
    pub end: i64,
    pub author_id: Option<i64>,
    pub style: Style,
    pub limit: u32,
    /// Tags with fewer votes than this are dropped before rendering.
    pub min_stars: i64,
    /// Shift applied to every timestamp, seconds.
    pub offset: i64,
}

pub struct TagService {
    store: TagStore,
}

impl TagService {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            store: TagStore::new(db),
        }
    }

    pub fn store(&self) -> &TagStore {
        &self.store
    }

    /// Record a new tag. `message_id` comes from the originating chat
    /// message and must be unique; `hidden` reflects the creating
    /// channel's privacy setting.
    #[allow(clippy::too_many_arguments)]
    pub fn create_tag(
        &self,
        message_id: i64,
        guild_id: i64,
        timestamp: i64,
        text: &str,
        author_id: i64,
        hidden: bool,
        hierarchy: i64,
    ) -> Result<()> {
        self.store
            .create(message_id, guild_id, timestamp, text, author_id, hidden, hierarchy)
    }

    /// The originating message was edited: replace the text and the
    /// hierarchy level derived from its new leading markers.
    pub fn edit_tag(&self, message_id: i64, new_text: &str, new_hierarchy: i64) -> Result<()> {
        self.store.update_text(message_id, new_text, new_hierarchy)
    }

    /// Apply one reaction event as a vote delta of +1 or -1.
    pub fn vote(&self, message_id: i64, delta: i64) -> Result<()> {
        if delta != 1 && delta != -1 {
            return Err(StoreError::InvalidArgument(format!(
                "vote delta must be +1 or -1, got {delta}"
            )));
        }
        self.store.increment_vote(message_id, delta)
    }

    pub fn delete_tag(&self, message_id: i64) -> Result<()> {
        self.store.remove(message_id)
    }

    /// Shift the author's most recent tag by a signed offset. Cumulative
    /// across calls; `NotFound` when the author has no tag yet.
    pub fn adjust_latest(
        &self,
        guild_id: i64,
        author_id: i64,
        offset: i64,
        now: i64,
    ) -> Result<()> {
        if offset.abs() > MAX_ADJUST_OFFSET {
            return Err(StoreError::InvalidArgument(format!(
                "adjust offset {offset} exceeds {MAX_ADJUST_OFFSET}s"
            )));
        }
        let last = self.store.query(&TagQuery {
            guild_id,
            start: 0,
            end: now + MAX_ADJUST_OFFSET,
            author_id: Some(author_id),
            limit: 1,
            include_hidden: false,
            order: Order::Descending,
        })?;
        let tag = last.first().ok_or(StoreError::NotFound)?;
        self.store
            .update_timestamp(tag.message_id, tag.timestamp + offset)
    }

    /// Query, threshold, and render one transcript. Returns `None` when
    /// no tag survives the window and vote threshold.
    pub fn dump(&self, req: &DumpRequest) -> Result<Option<String>> {
        let tags = self.store.query(&TagQuery {
            guild_id: req.guild_id,
            start: req.start,
            end: req.end,
            author_id: req.author_id,
            limit: req.limit,
            include_hidden: false,
            order: Order::Ascending,
        })?;

        let tags: Vec<Tag> = tags
            .into_iter()
            .filter(|t| t.votes >= req.min_stars)
            .collect();
        if tags.is_empty() {
            return Ok(None);
        }

        Ok(Some(render(&tags, &req.style, req.start, req.end, req.offset)))
    }
}
