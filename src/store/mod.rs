//! Resource store
//!
//! Generic single-table operations parameterized by resource metadata.
//! Each resource owns one id-keyed table; create/list/get/update/delete are
//! implemented once and consult the `ResourceSpec` for per-resource behavior
//! (default fields, the forms-only soft-delete filter).

pub mod memory;

use std::collections::HashMap;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::config::TableNames;
use crate::error::{ApiError, ApiResult};
use crate::logger;
use crate::resource::{self, ResourceSpec};

pub use memory::{Item, ScanPage, Table};

fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

/// Trim string values; everything else passes through verbatim
fn trimmed(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        other => other.clone(),
    }
}

/// The process-wide mapping from resource name to backing table
///
/// Resolved once at startup and shared read-only; the tables themselves
/// provide per-key atomicity.
#[derive(Debug)]
pub struct Store {
    tables: HashMap<&'static str, Table>,
}

impl Store {
    /// Build one table per configured resource
    pub fn new(names: &TableNames) -> Self {
        let tables = resource::RESOURCES
            .iter()
            .map(|spec| (spec.name, Table::new(names.for_resource(spec.name))))
            .collect();
        Self { tables }
    }

    fn table(&self, resource: &str) -> ApiResult<&Table> {
        self.tables
            .get(resource)
            .ok_or_else(|| ApiError::UnknownResource {
                name: resource.to_string(),
                allowed: resource::allowed_names(),
            })
    }

    /// Create an item: generated id, stamped `created_at` and `read`,
    /// resource defaults, then any extra payload fields preserved verbatim
    pub async fn create(&self, spec: &ResourceSpec, payload: Item) -> ApiResult<Item> {
        let table = self.table(spec.name)?;

        let id = Uuid::new_v4().to_string();
        let mut item = Item::new();
        item.insert("id".to_string(), Value::String(id.clone()));
        item.insert("created_at".to_string(), Value::String(now_iso()));
        item.insert("read".to_string(), Value::Bool(false));

        // Required and default fields are always stamped; strings trimmed,
        // omitted fields become empty strings.
        for field in spec.required.iter().chain(spec.defaults) {
            let value = payload
                .get(*field)
                .map_or_else(|| Value::String(String::new()), trimmed);
            item.insert((*field).to_string(), value);
        }

        for (key, value) in &payload {
            if !item.contains_key(key) {
                item.insert(key.clone(), value.clone());
            }
        }

        logger::log_item_created(spec.name, table.name(), &id);
        table.put(&id, item.clone()).await;
        Ok(item)
    }

    /// List up to `limit` items with an opaque continuation cursor
    ///
    /// A malformed cursor restarts the scan rather than failing. Resources
    /// with soft delete drop items flagged `is_deleted = true` after the
    /// page is read, so a page may come back short.
    pub async fn list(
        &self,
        spec: &ResourceSpec,
        limit: usize,
        last: Option<&str>,
    ) -> ApiResult<ScanPage> {
        let table = self.table(spec.name)?;
        let start_after = last.and_then(memory::decode_cursor);

        let mut page = table.scan(limit, start_after.as_deref()).await;
        logger::log_items_scanned(page.items.len(), table.name(), limit);

        if spec.soft_delete {
            page.items
                .retain(|item| item.get("is_deleted") != Some(&Value::Bool(true)));
        }
        Ok(page)
    }

    /// Fetch a single item by id
    pub async fn get(&self, resource: &str, id: &str) -> ApiResult<Option<Item>> {
        let table = self.table(resource)?;
        let item = table.get(id).await;
        logger::log_item_fetched(table.name(), id, item.is_some());
        Ok(item)
    }

    /// Set the `read` flag, stamping `updated_at`
    pub async fn update_read_flag(
        &self,
        resource: &str,
        id: &str,
        value: bool,
    ) -> ApiResult<Option<Item>> {
        let table = self.table(resource)?;
        let updated = table
            .update(id, |item| {
                item.insert("read".to_string(), Value::Bool(value));
                item.insert("updated_at".to_string(), Value::String(now_iso()));
            })
            .await;
        if updated.is_some() {
            logger::log_read_flag_updated(table.name(), id, value);
        }
        Ok(updated)
    }

    /// Merge the given fields into an existing item, stamping `updated_at`
    ///
    /// A caller-supplied `id` is dropped, never merged. Returns `None` both
    /// for an unknown id and for an effectively empty field set.
    pub async fn partial_update(
        &self,
        resource: &str,
        id: &str,
        mut fields: Item,
    ) -> ApiResult<Option<Item>> {
        let table = self.table(resource)?;

        fields.remove("id");
        if fields.is_empty() {
            return Ok(None);
        }

        let field_names: Vec<String> = fields.keys().cloned().collect();
        let updated = table
            .update(id, |item| {
                for (key, value) in fields {
                    item.insert(key, value);
                }
                item.insert("updated_at".to_string(), Value::String(now_iso()));
            })
            .await;
        if updated.is_some() {
            logger::log_item_updated(table.name(), id, &field_names);
        }
        Ok(updated)
    }

    /// Hard-delete an item, reporting whether anything was removed
    ///
    /// Existence check then delete, two lock acquisitions apart. Concurrent
    /// deletes of the same id can both observe the item; the second removal
    /// is a no-op and both callers report success. Accepted for this scope.
    pub async fn delete(&self, resource: &str, id: &str) -> ApiResult<bool> {
        let table = self.table(resource)?;
        if !table.contains(id).await {
            logger::log_delete_missing(table.name(), id);
            return Ok(false);
        }
        table.remove(id).await;
        logger::log_item_deleted(resource, id, table.name());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::lookup;
    use serde_json::json;

    fn store() -> Store {
        Store::new(&TableNames::default())
    }

    fn payload(entries: &[(&str, Value)]) -> Item {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_create_stamps_server_fields_and_defaults() {
        let store = store();
        let spec = lookup("forms").unwrap();
        let item = store
            .create(
                spec,
                payload(&[
                    ("name", json!("  Jane Doe  ")),
                    ("email", json!("jane@example.com")),
                ]),
            )
            .await
            .unwrap();

        assert!(item["id"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(item["created_at"].as_str().is_some());
        assert_eq!(item["read"], json!(false));
        // Strings are trimmed; omitted defaults become empty strings.
        assert_eq!(item["name"], json!("Jane Doe"));
        assert_eq!(item["phone"], json!(""));
        assert_eq!(item["case_type"], json!(""));
    }

    #[tokio::test]
    async fn test_create_preserves_extra_fields_verbatim() {
        let store = store();
        let spec = lookup("services").unwrap();
        let item = store
            .create(
                spec,
                payload(&[
                    ("name", json!("Tax advisory")),
                    ("shown", json!(true)),
                    ("priority", json!(3)),
                    ("labels", json!(["tax", "advisory"])),
                ]),
            )
            .await
            .unwrap();

        assert_eq!(item["shown"], json!(true));
        assert_eq!(item["priority"], json!(3));
        assert_eq!(item["labels"], json!(["tax", "advisory"]));
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips() {
        let store = store();
        let spec = lookup("appointments").unwrap();
        let created = store
            .create(
                spec,
                payload(&[
                    ("client", json!("Acme Corp")),
                    ("datetime", json!("2024-01-01T10:00:00Z")),
                ]),
            )
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap();

        let fetched = store.get("appointments", id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_update_read_flag_touches_only_read_and_updated_at() {
        let store = store();
        let spec = lookup("messages").unwrap();
        let created = store
            .create(
                spec,
                payload(&[
                    ("sender", json!("a@example.com")),
                    ("recipient", json!("b@example.com")),
                    ("body", json!("hello")),
                ]),
            )
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap();

        let updated = store
            .update_read_flag("messages", id, true)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["read"], json!(true));
        assert!(updated["updated_at"].as_str().is_some());
        assert_eq!(updated["body"], created["body"]);
        assert_eq!(updated["created_at"], created["created_at"]);

        let missing = store.update_read_flag("messages", "ghost", true).await;
        assert!(missing.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_partial_update_drops_id_and_merges() {
        let store = store();
        let spec = lookup("cases").unwrap();
        let created = store
            .create(
                spec,
                payload(&[("case_number", json!("C-42")), ("title", json!("Doe v. Roe"))]),
            )
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap();

        let updated = store
            .partial_update(
                "cases",
                id,
                payload(&[("id", json!("override")), ("note", json!("urgent"))]),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["id"].as_str(), Some(id));
        assert_eq!(updated["note"], json!("urgent"));
        assert!(updated["updated_at"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_partial_update_nothing_effective() {
        let store = store();
        let spec = lookup("cases").unwrap();
        let created = store
            .create(
                spec,
                payload(&[("case_number", json!("C-1")), ("title", json!("T"))]),
            )
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap();

        // Only an id override: nothing left to merge.
        let result = store
            .partial_update("cases", id, payload(&[("id", json!("x"))]))
            .await
            .unwrap();
        assert!(result.is_none());

        // Unknown id: never upserts.
        let result = store
            .partial_update("cases", "ghost", payload(&[("note", json!("y"))]))
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(store.get("cases", "ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_then_double_delete() {
        let store = store();
        let spec = lookup("services").unwrap();
        let created = store
            .create(spec, payload(&[("name", json!("Notary"))]))
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap();

        assert!(store.delete("services", id).await.unwrap());
        assert!(!store.delete("services", id).await.unwrap());
        assert!(store.get("services", id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_soft_delete_filter_applies_to_forms_only() {
        let store = store();
        let forms = lookup("forms").unwrap();
        let cases = lookup("cases").unwrap();

        let kept = store
            .create(
                forms,
                payload(&[("name", json!("Keep")), ("email", json!("k@example.com"))]),
            )
            .await
            .unwrap();
        let flagged = store
            .create(
                forms,
                payload(&[("name", json!("Drop")), ("email", json!("d@example.com"))]),
            )
            .await
            .unwrap();
        store
            .partial_update(
                "forms",
                flagged["id"].as_str().unwrap(),
                payload(&[("is_deleted", json!(true))]),
            )
            .await
            .unwrap();

        let page = store.list(forms, 50, None).await.unwrap();
        let ids: Vec<&str> = page
            .items
            .iter()
            .filter_map(|item| item["id"].as_str())
            .collect();
        assert_eq!(ids, vec![kept["id"].as_str().unwrap()]);

        // The same flag on another resource is inert.
        let case = store
            .create(
                cases,
                payload(&[
                    ("case_number", json!("C-9")),
                    ("title", json!("T")),
                    ("is_deleted", json!(true)),
                ]),
            )
            .await
            .unwrap();
        let page = store.list(cases, 50, None).await.unwrap();
        assert!(page
            .items
            .iter()
            .any(|item| item["id"] == case["id"]));
    }

    #[tokio::test]
    async fn test_list_honors_limit_and_cursor() {
        let store = store();
        let spec = lookup("messages").unwrap();
        for n in 0..5 {
            store
                .create(
                    spec,
                    payload(&[
                        ("sender", json!(format!("s{n}@example.com"))),
                        ("recipient", json!("r@example.com")),
                        ("body", json!("hi")),
                    ]),
                )
                .await
                .unwrap();
        }

        let mut seen = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = store.list(spec, 2, cursor.as_deref()).await.unwrap();
            seen.extend(
                page.items
                    .iter()
                    .filter_map(|item| item["id"].as_str().map(String::from)),
            );
            match page.last {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 5);

        // A garbage cursor restarts the scan instead of failing.
        let page = store.list(spec, 50, Some("garbage")).await.unwrap();
        assert_eq!(page.items.len(), 5);
    }

    #[tokio::test]
    async fn test_unknown_resource_is_rejected() {
        let store = store();
        let err = store.get("invoices", "x").await.unwrap_err();
        assert!(err.to_string().starts_with("unknown resource 'invoices'"));
    }
}
