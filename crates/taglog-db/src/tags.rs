//! The tag store. Implemented directly against SQLite rather than the
//! cached key/value layer: range scans over (guild, timestamp) and
//! row-level vote counters are the dominant access patterns, and the full
//! tag table is expected to outgrow a whole-table snapshot while any one
//! query's result stays small.

use std::sync::Arc;

use rusqlite::Connection;

use taglog_types::{Order, Tag};

use crate::Database;
use crate::error::{Result, StoreError};

/// Time-range query, scoped to one guild. `start` and `end` are inclusive
/// unix-second bounds. A capped single page is the full contract; there is
/// no pagination beyond `limit` and `order`.
#[derive(Debug, Clone)]
pub struct TagQuery {
    pub guild_id: i64,
    pub start: i64,
    pub end: i64,
    pub author_id: Option<i64>,
    pub limit: u32,
    pub include_hidden: bool,
    pub order: Order,
}

pub struct TagStore {
    db: Arc<Database>,
}

impl TagStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new tag with zero votes. The message id is assigned by the
    /// caller and must be unique across the whole store.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &self,
        message_id: i64,
        guild_id: i64,
        timestamp: i64,
        text: &str,
        author_id: i64,
        hidden: bool,
        hierarchy: i64,
    ) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tags (message_id, guild_id, ts, text, votes, author_id, hidden, hierarchy)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7)",
                rusqlite::params![message_id, guild_id, timestamp, text, author_id, hidden, hierarchy],
            )
            .map_err(|e| StoreError::duplicate_on_conflict(e, message_id))?;
            Ok(())
        })
    }

    /// Replace the tag's text and hierarchy level.
    pub fn update_text(&self, message_id: i64, text: &str, hierarchy: i64) -> Result<()> {
        self.db.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tags SET text = ?1, hierarchy = ?2 WHERE message_id = ?3",
                rusqlite::params![text, hierarchy, message_id],
            )?;
            require_row(changed)
        })
    }

    pub fn update_timestamp(&self, message_id: i64, timestamp: i64) -> Result<()> {
        self.db.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tags SET ts = ?1 WHERE message_id = ?2",
                rusqlite::params![timestamp, message_id],
            )?;
            require_row(changed)
        })
    }

    /// Apply a vote delta (typically +1 or -1) as an atomic counter update.
    pub fn increment_vote(&self, message_id: i64, delta: i64) -> Result<()> {
        self.db.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE tags SET votes = votes + ?1 WHERE message_id = ?2",
                rusqlite::params![delta, message_id],
            )?;
            require_row(changed)
        })
    }

    /// Delete permanently; no tombstone is kept.
    pub fn remove(&self, message_id: i64) -> Result<()> {
        self.db.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM tags WHERE message_id = ?1",
                rusqlite::params![message_id],
            )?;
            require_row(changed)
        })
    }

    pub fn contains(&self, message_id: i64) -> Result<bool> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT 1 FROM tags WHERE message_id = ?1")?;
            Ok(stmt.exists(rusqlite::params![message_id])?)
        })
    }

    /// Tags whose timestamp falls in `[start, end]`, ordered by timestamp,
    /// capped at `limit`. Hidden tags are excluded unless requested.
    pub fn query(&self, q: &TagQuery) -> Result<Vec<Tag>> {
        if q.start > q.end {
            return Err(StoreError::InvalidArgument(format!(
                "window start {} after end {}",
                q.start, q.end
            )));
        }

        self.db.with_conn(|conn| query_tags(conn, q))
    }
}

fn require_row(changed: usize) -> Result<()> {
    if changed == 0 {
        Err(StoreError::NotFound)
    } else {
        Ok(())
    }
}

fn query_tags(conn: &Connection, q: &TagQuery) -> Result<Vec<Tag>> {
    let order = match q.order {
        Order::Ascending => "ASC",
        Order::Descending => "DESC",
    };
    let sql = format!(
        "SELECT message_id, guild_id, ts, text, votes, author_id, hidden, hierarchy
         FROM tags
         WHERE guild_id = ?1 AND ts BETWEEN ?2 AND ?3
           AND (hidden = 0 OR ?4)
           AND (?5 IS NULL OR author_id = ?5)
         ORDER BY ts {order}
         LIMIT ?6"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            rusqlite::params![q.guild_id, q.start, q.end, q.include_hidden, q.author_id, q.limit],
            |row| {
                Ok(Tag {
                    message_id: row.get(0)?,
                    guild_id: row.get(1)?,
                    timestamp: row.get(2)?,
                    text: row.get(3)?,
                    votes: row.get(4)?,
                    author_id: row.get(5)?,
                    hidden: row.get(6)?,
                    hierarchy: row.get(7)?,
                })
            },
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TagStore {
        TagStore::new(Arc::new(Database::open_in_memory().unwrap()))
    }

    fn window(guild_id: i64, start: i64, end: i64) -> TagQuery {
        TagQuery {
            guild_id,
            start,
            end,
            author_id: None,
            limit: 1000,
            include_hidden: false,
            order: Order::Ascending,
        }
    }

    #[test]
    fn create_then_contains_then_remove() {
        let store = store();
        store.create(1, 10, 100, "first", 7, false, 0).unwrap();
        assert!(store.contains(1).unwrap());

        store.remove(1).unwrap();
        assert!(!store.contains(1).unwrap());
        assert!(matches!(store.remove(1), Err(StoreError::NotFound)));
    }

    #[test]
    fn duplicate_message_id_is_rejected() {
        let store = store();
        store.create(1, 10, 100, "first", 7, false, 0).unwrap();
        let err = store.create(1, 10, 200, "again", 7, false, 0).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(1)));
    }

    #[test]
    fn updates_on_missing_ids_signal_not_found() {
        let store = store();
        assert!(matches!(
            store.update_text(99, "x", 0),
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.update_timestamp(99, 5),
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.increment_vote(99, 1),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn vote_deltas_compose_additively() {
        let store = store();
        store.create(1, 10, 100, "t", 7, false, 0).unwrap();
        for _ in 0..5 {
            store.increment_vote(1, 1).unwrap();
        }
        for _ in 0..2 {
            store.increment_vote(1, -1).unwrap();
        }
        let tags = store.query(&window(10, 0, 1000)).unwrap();
        assert_eq!(tags[0].votes, 3);
    }

    #[test]
    fn votes_may_go_negative() {
        let store = store();
        store.create(1, 10, 100, "t", 7, false, 0).unwrap();
        store.increment_vote(1, -1).unwrap();
        let tags = store.query(&window(10, 0, 1000)).unwrap();
        assert_eq!(tags[0].votes, -1);
    }

    #[test]
    fn query_respects_window_guild_and_limit() {
        let store = store();
        store.create(1, 10, 100, "a", 7, false, 0).unwrap();
        store.create(2, 10, 200, "b", 7, false, 0).unwrap();
        store.create(3, 10, 300, "c", 7, false, 0).unwrap();
        store.create(4, 11, 200, "other guild", 7, false, 0).unwrap();

        // inclusive bounds
        let tags = store.query(&window(10, 100, 200)).unwrap();
        assert_eq!(
            tags.iter().map(|t| t.message_id).collect::<Vec<_>>(),
            vec![1, 2]
        );

        let mut limited = window(10, 0, 1000);
        limited.limit = 2;
        assert_eq!(store.query(&limited).unwrap().len(), 2);

        let mut desc = window(10, 0, 1000);
        desc.order = Order::Descending;
        let ts: Vec<i64> = store.query(&desc).unwrap().iter().map(|t| t.timestamp).collect();
        assert_eq!(ts, vec![300, 200, 100]);
    }

    #[test]
    fn query_filters_author_and_hidden() {
        let store = store();
        store.create(1, 10, 100, "mine", 7, false, 0).unwrap();
        store.create(2, 10, 200, "theirs", 8, false, 0).unwrap();
        store.create(3, 10, 300, "secret", 7, true, 0).unwrap();

        let mut own = window(10, 0, 1000);
        own.author_id = Some(7);
        let tags = store.query(&own).unwrap();
        assert_eq!(
            tags.iter().map(|t| t.message_id).collect::<Vec<_>>(),
            vec![1]
        );

        let mut all = window(10, 0, 1000);
        all.include_hidden = true;
        assert_eq!(store.query(&all).unwrap().len(), 3);
        assert_eq!(store.query(&window(10, 0, 1000)).unwrap().len(), 2);
    }

    #[test]
    fn malformed_window_is_rejected_before_io() {
        let store = store();
        assert!(matches!(
            store.query(&window(10, 500, 100)),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn edits_change_text_hierarchy_and_time() {
        let store = store();
        store.create(1, 10, 100, "before", 7, false, 0).unwrap();
        store.update_text(1, "after", 2).unwrap();
        store.update_timestamp(1, 150).unwrap();

        let tags = store.query(&window(10, 0, 1000)).unwrap();
        assert_eq!(tags[0].text, "after");
        assert_eq!(tags[0].hierarchy, 2);
        assert_eq!(tags[0].timestamp, 150);
    }
}
