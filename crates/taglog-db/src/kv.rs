//! Generic persistent key/value and key/value-set mappings.
//!
//! Both shapes write through to SQLite and serve reads from an in-memory
//! snapshot rebuilt lazily whenever it is stale. Staleness is either the
//! initial unpopulated state or a configured TTL elapsing since the last
//! rebuild. Writes from the same process update the snapshot
//! synchronously, so readers always observe their own writes.
//!
//! Every key and value is round-tripped through the serde_json codec at
//! write time and rejected if the result differs from the input. That
//! guards against persisting data that cannot be read back.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Database;
use crate::error::{Result, StoreError};
use crate::registry::TableRegistry;

/// Encode `value`, decode it back, and reject the write if the result is
/// not equal to the input. Returns the encoded text for reuse.
fn verify_round_trip<T>(value: &T) -> Result<String>
where
    T: Serialize + DeserializeOwned + PartialEq,
{
    let encoded = serde_json::to_string(value)?;
    let decoded: T = serde_json::from_str(&encoded)
        .map_err(|e| StoreError::RoundTrip(format!("decode failed: {e}")))?;
    if &decoded != value {
        return Err(StoreError::RoundTrip(format!(
            "decoded value differs from input: {encoded}"
        )));
    }
    Ok(encoded)
}

/// In-memory read cache. Invalid until first populated; a TTL, when
/// configured, marks it stale again after elapsing.
struct Snapshot<M> {
    map: M,
    valid: bool,
    refreshed_at: Option<Instant>,
}

impl<M: Default> Default for Snapshot<M> {
    fn default() -> Self {
        Self {
            map: M::default(),
            valid: false,
            refreshed_at: None,
        }
    }
}

impl<M> Snapshot<M> {
    fn stale(&self, ttl: Option<Duration>) -> bool {
        if !self.valid {
            return true;
        }
        match (ttl, self.refreshed_at) {
            (Some(ttl), Some(at)) => at.elapsed() >= ttl,
            _ => false,
        }
    }

    fn mark_fresh(&mut self) {
        self.valid = true;
        self.refreshed_at = Some(Instant::now());
    }
}

/// Persistent single-valued mapping.
pub struct PersistentMap<K, V> {
    db: Arc<Database>,
    table: String,
    cache_ttl: Option<Duration>,
    snapshot: Mutex<Snapshot<HashMap<K, V>>>,
}

impl<K, V> PersistentMap<K, V>
where
    K: Serialize + DeserializeOwned + PartialEq + Eq + Hash + Clone,
    V: Serialize + DeserializeOwned + PartialEq + Clone,
{
    /// Bind `table` and create it if missing. Each table may be bound by
    /// exactly one store instance per registry.
    pub fn open(
        db: Arc<Database>,
        registry: &TableRegistry,
        table: &str,
        cache_ttl: Option<Duration>,
    ) -> Result<Self> {
        registry.claim(table)?;
        db.with_conn(|conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS \"{table}\" (key_ TEXT PRIMARY KEY, value_ TEXT NOT NULL)"
            ))?;
            Ok(())
        })?;
        Ok(Self {
            db,
            table: table.to_string(),
            cache_ttl,
            snapshot: Mutex::new(Snapshot::default()),
        })
    }

    fn lock_snapshot(&self) -> Result<MutexGuard<'_, Snapshot<HashMap<K, V>>>> {
        self.snapshot.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn refresh_if_stale(&self, snap: &mut Snapshot<HashMap<K, V>>) -> Result<()> {
        if !snap.stale(self.cache_ttl) {
            return Ok(());
        }
        let rows = self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT key_, value_ FROM \"{}\"", self.table))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        let mut map = HashMap::with_capacity(rows.len());
        for (key_text, value_text) in rows {
            map.insert(
                serde_json::from_str(&key_text)?,
                serde_json::from_str(&value_text)?,
            );
        }
        snap.map = map;
        snap.mark_fresh();
        Ok(())
    }

    pub fn get(&self, key: &K) -> Result<Option<V>> {
        let mut snap = self.lock_snapshot()?;
        self.refresh_if_stale(&mut snap)?;
        Ok(snap.map.get(key).cloned())
    }

    /// Durable write, then synchronous snapshot update.
    pub fn set(&self, key: K, value: V) -> Result<()> {
        let key_text = verify_round_trip(&key)?;
        let value_text = verify_round_trip(&value)?;
        let mut snap = self.lock_snapshot()?;
        self.db.with_conn(|conn| {
            conn.execute(
                &format!("INSERT OR REPLACE INTO \"{}\" VALUES (?1, ?2)", self.table),
                rusqlite::params![key_text, value_text],
            )?;
            Ok(())
        })?;
        snap.map.insert(key, value);
        Ok(())
    }

    /// Silent if the key is absent.
    pub fn remove(&self, key: &K) -> Result<()> {
        let key_text = serde_json::to_string(key)?;
        let mut snap = self.lock_snapshot()?;
        self.db.with_conn(|conn| {
            conn.execute(
                &format!("DELETE FROM \"{}\" WHERE key_ = ?1", self.table),
                rusqlite::params![key_text],
            )?;
            Ok(())
        })?;
        snap.map.remove(key);
        Ok(())
    }

    pub fn entries(&self) -> Result<Vec<(K, V)>> {
        let mut snap = self.lock_snapshot()?;
        self.refresh_if_stale(&mut snap)?;
        Ok(snap
            .map
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    pub fn len(&self) -> Result<usize> {
        let mut snap = self.lock_snapshot()?;
        self.refresh_if_stale(&mut snap)?;
        Ok(snap.map.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Fixed-arity tuple key for [`PersistentSetMap`]. Each element is stored
/// in its own column; the arity is enforced by the type.
pub trait TupleKey: Sized {
    const DEPTH: usize;
    fn encode(&self) -> Result<Vec<String>>;
    fn decode(fields: &[String]) -> Result<Self>;
}

macro_rules! impl_tuple_key {
    ($depth:literal; $($t:ident . $i:tt),+) => {
        impl<$($t),+> TupleKey for ($($t,)+)
        where
            $($t: Serialize + DeserializeOwned,)+
        {
            const DEPTH: usize = $depth;

            fn encode(&self) -> Result<Vec<String>> {
                Ok(vec![$(serde_json::to_string(&self.$i)?),+])
            }

            fn decode(fields: &[String]) -> Result<Self> {
                if fields.len() != $depth {
                    return Err(StoreError::InvalidArgument(format!(
                        "expected {} key fields, got {}",
                        $depth,
                        fields.len()
                    )));
                }
                Ok(($(serde_json::from_str::<$t>(&fields[$i])?,)+))
            }
        }
    };
}

impl_tuple_key!(1; A.0);
impl_tuple_key!(2; A.0, B.1);
impl_tuple_key!(3; A.0, B.1, C.2);

fn verify_key_round_trip<K>(key: &K) -> Result<Vec<String>>
where
    K: TupleKey + PartialEq,
{
    let fields = key.encode()?;
    let decoded = K::decode(&fields)?;
    if &decoded != key {
        return Err(StoreError::RoundTrip(format!(
            "decoded key differs from input: {fields:?}"
        )));
    }
    Ok(fields)
}

/// Persistent mapping from fixed-arity tuple keys to sets of values.
///
/// The backing table carries a uniqueness constraint over (keys, value)
/// with `ON CONFLICT REPLACE`, so re-adding an existing member is a no-op
/// replace rather than a duplicate row.
pub struct PersistentSetMap<K, V> {
    db: Arc<Database>,
    cache_ttl: Option<Duration>,
    insert_sql: String,
    select_sql: String,
    delete_bucket_sql: String,
    delete_member_sql: String,
    snapshot: Mutex<Snapshot<HashMap<K, HashSet<V>>>>,
}

impl<K, V> PersistentSetMap<K, V>
where
    K: TupleKey + PartialEq + Eq + Hash + Clone,
    V: Serialize + DeserializeOwned + PartialEq + Eq + Hash + Clone,
{
    pub fn open(
        db: Arc<Database>,
        registry: &TableRegistry,
        table: &str,
        cache_ttl: Option<Duration>,
    ) -> Result<Self> {
        registry.claim(table)?;

        let key_cols: Vec<String> = (0..K::DEPTH).map(|i| format!("key_{i}")).collect();
        let col_list = key_cols.join(", ");
        let where_key = key_cols
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{col} = ?{}", i + 1))
            .collect::<Vec<_>>()
            .join(" AND ");
        let placeholders = vec!["?"; K::DEPTH + 1].join(", ");

        db.with_conn(|conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS \"{table}\" (
                    {col_decls},
                    value_ TEXT NOT NULL,
                    UNIQUE({col_list}, value_) ON CONFLICT REPLACE
                )",
                col_decls = key_cols
                    .iter()
                    .map(|c| format!("{c} TEXT NOT NULL"))
                    .collect::<Vec<_>>()
                    .join(",\n                    "),
            ))?;
            Ok(())
        })?;

        Ok(Self {
            db,
            cache_ttl,
            insert_sql: format!("INSERT INTO \"{table}\" VALUES ({placeholders})"),
            select_sql: format!("SELECT {col_list}, value_ FROM \"{table}\""),
            delete_bucket_sql: format!("DELETE FROM \"{table}\" WHERE {where_key}"),
            delete_member_sql: format!(
                "DELETE FROM \"{table}\" WHERE {where_key} AND value_ = ?{}",
                K::DEPTH + 1
            ),
            snapshot: Mutex::new(Snapshot::default()),
        })
    }

    fn lock_snapshot(&self) -> Result<MutexGuard<'_, Snapshot<HashMap<K, HashSet<V>>>>> {
        self.snapshot.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn refresh_if_stale(&self, snap: &mut Snapshot<HashMap<K, HashSet<V>>>) -> Result<()> {
        if !snap.stale(self.cache_ttl) {
            return Ok(());
        }
        let depth = K::DEPTH;
        let rows = self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(&self.select_sql)?;
            let rows = stmt
                .query_map([], |row| {
                    let mut fields = Vec::with_capacity(depth + 1);
                    for i in 0..=depth {
                        fields.push(row.get::<_, String>(i)?);
                    }
                    Ok(fields)
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        let mut map: HashMap<K, HashSet<V>> = HashMap::new();
        for fields in rows {
            let key = K::decode(&fields[..depth])?;
            let value: V = serde_json::from_str(&fields[depth])?;
            map.entry(key).or_default().insert(value);
        }
        snap.map = map;
        snap.mark_fresh();
        Ok(())
    }

    pub fn get(&self, key: &K) -> Result<Option<HashSet<V>>> {
        let mut snap = self.lock_snapshot()?;
        self.refresh_if_stale(&mut snap)?;
        Ok(snap.map.get(key).cloned())
    }

    pub fn contains_key(&self, key: &K) -> Result<bool> {
        let mut snap = self.lock_snapshot()?;
        self.refresh_if_stale(&mut snap)?;
        Ok(snap.map.contains_key(key))
    }

    /// Insert one member into the bucket.
    pub fn add(&self, key: &K, value: V) -> Result<()> {
        let key_fields = verify_key_round_trip(key)?;
        let value_text = verify_round_trip(&value)?;
        let mut snap = self.lock_snapshot()?;
        self.db.with_conn(|conn| {
            let mut fields = key_fields.clone();
            fields.push(value_text);
            conn.execute(&self.insert_sql, rusqlite::params_from_iter(fields.iter()))?;
            Ok(())
        })?;
        snap.map.entry(key.clone()).or_default().insert(value);
        Ok(())
    }

    /// Remove one member. Errors with `NotFound` if the member is absent.
    pub fn remove(&self, key: &K, value: &V) -> Result<()> {
        let mut snap = self.lock_snapshot()?;
        self.refresh_if_stale(&mut snap)?;
        let members = snap.map.get_mut(key).ok_or(StoreError::NotFound)?;
        if !members.contains(value) {
            return Err(StoreError::NotFound);
        }

        let mut fields = key.encode()?;
        fields.push(serde_json::to_string(value)?);
        self.db.with_conn(|conn| {
            conn.execute(
                &self.delete_member_sql,
                rusqlite::params_from_iter(fields.iter()),
            )?;
            Ok(())
        })?;

        members.remove(value);
        if members.is_empty() {
            snap.map.remove(key);
        }
        Ok(())
    }

    /// Replace the whole bucket in one transaction.
    pub fn replace(&self, key: &K, values: impl IntoIterator<Item = V>) -> Result<()> {
        let key_fields = verify_key_round_trip(key)?;
        let values: HashSet<V> = values.into_iter().collect();
        let mut encoded = Vec::with_capacity(values.len());
        for value in &values {
            encoded.push(verify_round_trip(value)?);
        }

        let mut snap = self.lock_snapshot()?;
        self.db.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                &self.delete_bucket_sql,
                rusqlite::params_from_iter(key_fields.iter()),
            )?;
            for value_text in &encoded {
                let mut fields = key_fields.clone();
                fields.push(value_text.clone());
                tx.execute(&self.insert_sql, rusqlite::params_from_iter(fields.iter()))?;
            }
            tx.commit()?;
            Ok(())
        })?;

        if values.is_empty() {
            snap.map.remove(key);
        } else {
            snap.map.insert(key.clone(), values);
        }
        Ok(())
    }

    /// Delete the whole bucket. Silent if the key is absent.
    pub fn remove_all(&self, key: &K) -> Result<()> {
        let key_fields = key.encode()?;
        let mut snap = self.lock_snapshot()?;
        self.db.with_conn(|conn| {
            conn.execute(
                &self.delete_bucket_sql,
                rusqlite::params_from_iter(key_fields.iter()),
            )?;
            Ok(())
        })?;
        snap.map.remove(key);
        Ok(())
    }

    pub fn keys(&self) -> Result<Vec<K>> {
        let mut snap = self.lock_snapshot()?;
        self.refresh_if_stale(&mut snap)?;
        Ok(snap.map.keys().cloned().collect())
    }

    pub fn entries(&self) -> Result<Vec<(K, HashSet<V>)>> {
        let mut snap = self.lock_snapshot()?;
        self.refresh_if_stale(&mut snap)?;
        Ok(snap
            .map
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    pub fn len(&self) -> Result<usize> {
        let mut snap = self.lock_snapshot()?;
        self.refresh_if_stale(&mut snap)?;
        Ok(snap.map.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
