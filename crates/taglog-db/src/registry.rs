use std::collections::HashSet;
use std::sync::Mutex;

use crate::error::{Result, StoreError};

/// Tracks which backing tables are bound by a store instance.
///
/// Each table may be bound at most once per registry; binding twice is a
/// programming error and fails fast. Owned by process-wide setup and
/// passed to store constructors, so tests can use isolated registries.
#[derive(Debug, Default)]
pub struct TableRegistry {
    claimed: Mutex<HashSet<String>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `table` for one store binding.
    ///
    /// Table names end up interpolated into DDL, so only identifier
    /// characters are accepted.
    pub fn claim(&self, table: &str) -> Result<()> {
        if table.is_empty()
            || !table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(StoreError::InvalidArgument(format!(
                "bad table name: {table:?}"
            )));
        }
        let mut claimed = self.claimed.lock().map_err(|_| StoreError::LockPoisoned)?;
        if !claimed.insert(table.to_string()) {
            return Err(StoreError::TableAlreadyBound(table.to_string()));
        }
        Ok(())
    }
}
