use serde::{Deserialize, Serialize};

/// One timestamped annotation on a broadcast's timeline.
///
/// `message_id` is assigned by the caller at creation and never
/// regenerated; everything else except `author_id` and `hidden` can be
/// mutated through the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub message_id: i64,
    pub guild_id: i64,
    /// Position on the stream timeline, unix seconds.
    pub timestamp: i64,
    pub text: String,
    /// Net approval. May go negative.
    pub votes: i64,
    pub author_id: i64,
    /// Excluded from queries unless explicitly requested.
    pub hidden: bool,
    /// Nesting depth relative to sibling tags in time order; 0 is top-level.
    pub hierarchy: i64,
}

/// Result ordering for time-range queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Ascending,
    Descending,
}
