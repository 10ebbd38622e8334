//! In-memory table backend
//!
//! One `Table` per resource, keyed by item id. The map is ordered so a scan
//! can resume from the id a previous page stopped at; callers still get no
//! ordering promise. Single-key operations take the table lock once, which
//! is the only atomicity this backend claims.

use std::collections::BTreeMap;
use std::ops::Bound;

use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::logger;

/// A single stored record: open schema, field name to value
pub type Item = Map<String, Value>;

/// One page of a scan: the items plus the resume cursor, if any
pub struct ScanPage {
    pub items: Vec<Item>,
    pub last: Option<String>,
}

/// Encode the position after `id` as an opaque continuation token
pub fn encode_cursor(id: &str) -> String {
    serde_json::json!({ "id": id }).to_string()
}

/// Best-effort cursor decode
///
/// A malformed token is ignored (scan restarts from the beginning), never an
/// error. Tokens are only meaningful to the backend that minted them.
pub fn decode_cursor(token: &str) -> Option<String> {
    let value: Value = match serde_json::from_str(token) {
        Ok(v) => v,
        Err(_) => {
            logger::log_warning("invalid last key provided, ignoring");
            return None;
        }
    };
    match value.get("id").and_then(Value::as_str) {
        Some(id) => Some(id.to_string()),
        None => {
            logger::log_warning("invalid last key provided, ignoring");
            None
        }
    }
}

/// An id-keyed table of items
pub struct Table {
    /// Display name used in log lines (mirrors the backing table name)
    name: String,
    rows: RwLock<BTreeMap<String, Item>>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert or replace the item stored under `id`
    pub async fn put(&self, id: &str, item: Item) {
        self.rows.write().await.insert(id.to_string(), item);
    }

    pub async fn get(&self, id: &str) -> Option<Item> {
        self.rows.read().await.get(id).cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.rows.read().await.contains_key(id)
    }

    /// Remove the item under `id`, reporting whether it existed
    pub async fn remove(&self, id: &str) -> bool {
        self.rows.write().await.remove(id).is_some()
    }

    /// Apply `mutate` to the item under `id`, returning the updated item
    ///
    /// Returns `None` when the id is absent; never inserts.
    pub async fn update<F>(&self, id: &str, mutate: F) -> Option<Item>
    where
        F: FnOnce(&mut Item),
    {
        let mut rows = self.rows.write().await;
        let item = rows.get_mut(id)?;
        mutate(item);
        Some(item.clone())
    }

    /// Read up to `limit` items, resuming after the cursor position
    ///
    /// The returned cursor is set only when rows remain past this page.
    pub async fn scan(&self, limit: usize, start_after: Option<&str>) -> ScanPage {
        let rows = self.rows.read().await;
        let range: Box<dyn Iterator<Item = (&String, &Item)>> = match start_after {
            Some(id) => Box::new(rows.range::<str, _>((Bound::Excluded(id), Bound::Unbounded))),
            None => Box::new(rows.iter()),
        };

        let mut items = Vec::new();
        let mut more = false;
        for (_, item) in range {
            if items.len() == limit {
                more = true;
                break;
            }
            items.push(item.clone());
        }

        // The cursor marks the last returned row; the next scan resumes past it.
        let last = if more {
            items
                .last()
                .and_then(|item| item.get("id").and_then(Value::as_str))
                .map(encode_cursor)
        } else {
            None
        };
        ScanPage { items, last }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table").field("name", &self.name).finish()
    }
}
