use rusqlite::Connection;
use tracing::info;

use crate::error::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS tags (
            message_id  INTEGER PRIMARY KEY,
            guild_id    INTEGER NOT NULL,
            ts          INTEGER NOT NULL,
            text        TEXT NOT NULL,
            votes       INTEGER NOT NULL DEFAULT 0,
            author_id   INTEGER NOT NULL,
            hidden      INTEGER NOT NULL DEFAULT 0,
            hierarchy   INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_tags_guild_ts
            ON tags(guild_id, ts);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
