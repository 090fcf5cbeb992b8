use anyhow::{anyhow, Result};
use rocksdb::{Direction, IteratorMode, Options, DB};
use serde_json::Value;
use uuid::Uuid;

use std::str;

pub const USERS: &str = "user";
pub const DEVICES: &str = "device";
pub const DATA: &str = "data";
pub const LOGS: &str = "log";

/// Schemaless document store over rocksdb.
///
/// Documents are JSON objects keyed `"{collection}:{id}"`; the id lives in
/// the key, not in the document body, so equality queries hand back
/// `(id, doc)` pairs. No foreign keys, no multi-document transactions —
/// every cross-collection guarantee is assembled from these five calls.
pub struct Store {
    db: DB,
}

impl Store {
    pub fn new(path: &str) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self { db })
    }

    fn doc_key(collection: &str, id: &str) -> String {
        format!("{collection}:{id}")
    }

    fn collection_prefix(collection: &str) -> String {
        format!("{collection}:")
    }

    pub async fn insert(&self, collection: &str, doc: &Value) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let key = Self::doc_key(collection, &id);
        self.db.put(key, serde_json::to_vec(doc)?)?;
        Ok(id)
    }

    pub async fn get_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let key = Self::doc_key(collection, id);
        Ok(self
            .db
            .get(key)?
            .map(|v| serde_json::from_slice(&v))
            .transpose()?)
    }

    /// All documents in `collection` whose fields equal every `(field, value)`
    /// filter. Result order carries no meaning.
    pub async fn query_equals(
        &self,
        collection: &str,
        filters: &[(&str, Value)],
    ) -> Result<Vec<(String, Value)>> {
        let prefix = Self::collection_prefix(collection);
        let mut results = Vec::new();

        for item in self
            .db
            .iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward))
        {
            let (key, val) = item?;
            let k = str::from_utf8(&key)?;
            if !k.starts_with(&prefix) {
                break;
            }

            let doc: Value = serde_json::from_slice(&val)?;
            if filters
                .iter()
                .all(|(field, want)| doc.get(*field) == Some(want))
            {
                results.push((k[prefix.len()..].to_string(), doc));
            }
        }

        Ok(results)
    }

    /// Merge `patch` fields into an existing document. Returns false when the
    /// document is absent (no upsert).
    pub async fn update_by_id(&self, collection: &str, id: &str, patch: &Value) -> Result<bool> {
        let key = Self::doc_key(collection, id);
        let Some(raw) = self.db.get(&key)? else {
            return Ok(false);
        };

        let mut doc: Value = serde_json::from_slice(&raw)?;
        let Some(patch_map) = patch.as_object() else {
            return Err(anyhow!("patch must be a JSON object"));
        };
        let Some(doc_map) = doc.as_object_mut() else {
            return Err(anyhow!("stored document is not a JSON object"));
        };

        for (field, value) in patch_map {
            doc_map.insert(field.clone(), value.clone());
        }

        self.db.put(key, serde_json::to_vec(&doc)?)?;
        Ok(true)
    }

    /// Idempotent: deleting an absent id is not an error.
    pub async fn delete_by_id(&self, collection: &str, id: &str) -> Result<()> {
        let key = Self::doc_key(collection, id);
        self.db.delete(key)?;
        Ok(())
    }
}
