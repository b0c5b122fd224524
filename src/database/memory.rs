use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{Row, Store, StoreError};
use super::table::Table;
use crate::auth::AuthUser;
use crate::filter::{Filter, FilterError, Values};

/// In-process store applying the same ownership policies, defaults and
/// referential actions as the Postgres schema. Used by tests and by
/// `STORAGE_BACKEND=memory`.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<Table, Vec<Row>>,
    last_tick: Option<DateTime<Utc>>,
}

impl Inner {
    fn rows(&self, table: Table) -> &[Row] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    fn rows_mut(&mut self, table: Table) -> &mut Vec<Row> {
        self.tables.entry(table).or_default()
    }

    /// Strictly increasing clock so rows created back to back never tie
    fn tick(&mut self) -> Value {
        let mut now = Utc::now();
        if let Some(last) = self.last_tick {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_tick = Some(now);
        Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    fn find(&self, table: Table, id: Uuid) -> Option<&Row> {
        self.rows(table).iter().find(|row| uuid_of(row, "id") == Some(id))
    }

    /// Row-level policy: owner tables by `user_id`, messages through their conversation
    fn visible(&self, caller: &AuthUser, table: Table, row: &Row) -> bool {
        match table.owner_column() {
            Some(column) => uuid_of(row, column) == Some(caller.id),
            None => uuid_of(row, "conversation_id")
                .and_then(|id| self.find(Table::Conversations, id))
                .map(|conversation| uuid_of(conversation, "user_id") == Some(caller.id))
                .unwrap_or(false),
        }
    }

    fn visible_rows<'a>(&'a self, caller: &'a AuthUser, table: Table) -> impl Iterator<Item = &'a Row> + 'a {
        self.rows(table).iter().filter(move |row| self.visible(caller, table, row))
    }

    fn check_references(&self, table: Table, row: &Row) -> Result<(), StoreError> {
        let reference = match table {
            Table::Messages => Some(("conversation_id", Table::Conversations)),
            Table::NotePages => Some(("section_id", Table::NoteSections)),
            _ => None,
        };
        if let Some((column, parent)) = reference {
            if let Some(id) = uuid_of(row, column) {
                if self.find(parent, id).is_none() {
                    return Err(StoreError::ForeignKey(format!(
                        "{}.{} references missing {} {}",
                        table, column, parent, id
                    )));
                }
            }
        }
        Ok(())
    }

    fn check_not_null(table: Table, row: &Row) -> Result<(), StoreError> {
        let required: &[&str] = match table {
            Table::Conversations | Table::NotePages => &["user_id"],
            Table::Messages => &["conversation_id", "role", "content"],
            Table::NoteSections => &["user_id", "name"],
        };
        for column in required {
            if row.get(*column).map_or(true, Value::is_null) {
                return Err(StoreError::Backend(format!(
                    "null value in column \"{}\" of relation \"{}\" violates not-null constraint",
                    column, table
                )));
            }
        }
        Ok(())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn uuid_of(row: &Row, column: &str) -> Option<Uuid> {
    row.get(column).and_then(Value::as_str).and_then(|s| Uuid::parse_str(s).ok())
}

fn check_columns(table: Table, values: &Values) -> Result<(), StoreError> {
    for (column, _) in values.iter() {
        if !table.has_column(column) {
            return Err(FilterError::InvalidColumn(format!("{}.{}", table, column)).into());
        }
    }
    Ok(())
}

fn defaults(table: Table, now: &Value) -> Row {
    let mut row = Row::new();
    row.insert("id".to_string(), json!(Uuid::new_v4()));
    row.insert("created_at".to_string(), now.clone());
    if table.has_updated_at() {
        row.insert("updated_at".to_string(), now.clone());
    }
    let extra = match table {
        Table::Conversations => json!({ "user_id": null, "title": null, "archived": false }),
        Table::Messages => json!({
            "conversation_id": null,
            "role": null,
            "content": null,
            "ayah_references": [],
            "tafsir_used": []
        }),
        Table::NotePages => json!({
            "user_id": null,
            "section_id": null,
            "title": null,
            "content": null,
            "order_index": 0,
            "deleted_at": null
        }),
        Table::NoteSections => json!({ "user_id": null, "name": null, "color": null, "order_index": 0 }),
    };
    if let Value::Object(extra) = extra {
        row.extend(extra);
    }
    row
}

/// Ids are kept in canonical lowercase form like Postgres renders them
fn normalize(value: Value) -> Value {
    match value {
        Value::String(s) => match Uuid::parse_str(&s) {
            Ok(id) if s.len() == 36 => Value::String(id.to_string()),
            _ => Value::String(s),
        },
        other => other,
    }
}

fn apply_values(row: &mut Row, values: &Values) {
    for (column, param) in values.iter() {
        row.insert(column.to_string(), normalize(param.to_json()));
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(&self, caller: &AuthUser, filter: &Filter) -> Result<Vec<Row>, StoreError> {
        let inner = self.inner.read().await;
        Ok(filter.apply(inner.visible_rows(caller, filter.table()))?)
    }

    async fn count(&self, caller: &AuthUser, filter: &Filter) -> Result<i64, StoreError> {
        let inner = self.inner.read().await;
        let rows = filter.apply(inner.visible_rows(caller, filter.table()))?;
        Ok(rows.len() as i64)
    }

    async fn insert(&self, caller: &AuthUser, table: Table, values: &Values) -> Result<Row, StoreError> {
        check_columns(table, values)?;
        let mut inner = self.inner.write().await;

        let now = inner.tick();
        let mut row = defaults(table, &now);
        apply_values(&mut row, values);

        Inner::check_not_null(table, &row)?;
        inner.check_references(table, &row)?;
        if !inner.visible(caller, table, &row) {
            return Err(StoreError::PolicyViolation(table));
        }

        tracing::debug!(table = %table, "memory insert");
        inner.rows_mut(table).push(row.clone());
        Ok(row)
    }

    async fn update(&self, caller: &AuthUser, filter: &Filter, values: &Values) -> Result<Vec<Row>, StoreError> {
        let table = filter.table();
        check_columns(table, values)?;
        let mut inner = self.inner.write().await;

        let targets: Vec<usize> = inner
            .rows(table)
            .iter()
            .enumerate()
            .filter(|(_, row)| inner.visible(caller, table, row) && filter.matches(row))
            .map(|(index, _)| index)
            .collect();
        if values.is_empty() {
            let rows = inner.rows(table);
            return Ok(targets.iter().map(|index| rows[*index].clone()).collect());
        }

        let now = inner.tick();
        let mut updated = Vec::with_capacity(targets.len());
        for index in &targets {
            let mut row = inner.rows(table)[*index].clone();
            apply_values(&mut row, values);
            if table.has_updated_at() && values.get("updated_at").is_none() {
                row.insert("updated_at".to_string(), now.clone());
            }
            Inner::check_not_null(table, &row)?;
            inner.check_references(table, &row)?;
            if !inner.visible(caller, table, &row) {
                return Err(StoreError::PolicyViolation(table));
            }
            updated.push(row);
        }

        let rows = inner.rows_mut(table);
        for (index, row) in targets.iter().zip(&updated) {
            rows[*index] = row.clone();
        }
        tracing::debug!(table = %table, rows = updated.len(), "memory update");
        Ok(updated)
    }

    async fn delete(&self, caller: &AuthUser, filter: &Filter) -> Result<u64, StoreError> {
        let table = filter.table();
        let mut inner = self.inner.write().await;

        let doomed: Vec<Uuid> = inner
            .visible_rows(caller, table)
            .filter(|row| filter.matches(row))
            .filter_map(|row| uuid_of(row, "id"))
            .collect();
        if doomed.is_empty() {
            return Ok(0);
        }

        inner
            .rows_mut(table)
            .retain(|row| !uuid_of(row, "id").map_or(false, |id| doomed.contains(&id)));

        match table {
            Table::Conversations => {
                inner.rows_mut(Table::Messages).retain(|message| {
                    !uuid_of(message, "conversation_id").map_or(false, |id| doomed.contains(&id))
                });
            }
            Table::NoteSections => {
                for page in inner.rows_mut(Table::NotePages).iter_mut() {
                    if uuid_of(page, "section_id").map_or(false, |id| doomed.contains(&id)) {
                        page.insert("section_id".to_string(), Value::Null);
                    }
                }
            }
            _ => {}
        }

        tracing::debug!(table = %table, rows = doomed.len(), "memory delete");
        Ok(doomed.len() as u64)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::SortDirection;

    fn user() -> AuthUser {
        AuthUser::new(Uuid::new_v4())
    }

    async fn conversation(store: &MemoryStore, owner: &AuthUser) -> Uuid {
        let row = store
            .insert(owner, Table::Conversations, &Values::new().set("user_id", owner.id))
            .await
            .unwrap();
        uuid_of(&row, "id").unwrap()
    }

    #[tokio::test]
    async fn insert_fills_defaults() {
        let store = MemoryStore::new();
        let alice = user();
        let row = store
            .insert(&alice, Table::NotePages, &Values::new().set("user_id", alice.id).set("title", "T"))
            .await
            .unwrap();
        assert_eq!(row["order_index"], json!(0));
        assert_eq!(row["deleted_at"], Value::Null);
        assert_eq!(row["created_at"], row["updated_at"]);
    }

    #[tokio::test]
    async fn insert_for_another_owner_violates_policy() {
        let store = MemoryStore::new();
        let alice = user();
        let err = store
            .insert(&alice, Table::Conversations, &Values::new().set("user_id", Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::PolicyViolation(Table::Conversations)));
    }

    #[tokio::test]
    async fn rows_are_invisible_to_other_users() {
        let store = MemoryStore::new();
        let (alice, bob) = (user(), user());
        let id = conversation(&store, &alice).await;

        let filter = Filter::new(Table::Conversations).eq("id", id);
        assert_eq!(store.select(&alice, &filter).await.unwrap().len(), 1);
        assert!(store.select(&bob, &filter).await.unwrap().is_empty());
        assert!(store
            .update(&bob, &filter, &Values::new().set("archived", true))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(store.delete(&bob, &filter).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn messages_follow_conversation_owner() {
        let store = MemoryStore::new();
        let (alice, bob) = (user(), user());
        let id = conversation(&store, &alice).await;
        let values = Values::new().set("conversation_id", id).set("role", "user").set("content", "hi");

        store.insert(&alice, Table::Messages, &values).await.unwrap();
        let err = store.insert(&bob, Table::Messages, &values).await.unwrap_err();
        assert!(matches!(err, StoreError::PolicyViolation(Table::Messages)));

        let filter = Filter::new(Table::Messages).eq("conversation_id", id);
        assert_eq!(store.count(&alice, &filter).await.unwrap(), 1);
        assert_eq!(store.count(&bob, &filter).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn message_requires_existing_conversation() {
        let store = MemoryStore::new();
        let alice = user();
        let values = Values::new()
            .set("conversation_id", Uuid::new_v4())
            .set("role", "user")
            .set("content", "hi");
        let err = store.insert(&alice, Table::Messages, &values).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKey(_)));
    }

    #[tokio::test]
    async fn deleting_conversation_cascades_to_messages() {
        let store = MemoryStore::new();
        let alice = user();
        let id = conversation(&store, &alice).await;
        let values = Values::new().set("conversation_id", id).set("role", "user").set("content", "hi");
        store.insert(&alice, Table::Messages, &values).await.unwrap();

        let deleted = store
            .delete(&alice, &Filter::new(Table::Conversations).eq("id", id))
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        let remaining = store.count(&alice, &Filter::new(Table::Messages)).await.unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn deleting_section_clears_page_reference() {
        let store = MemoryStore::new();
        let alice = user();
        let section = store
            .insert(&alice, Table::NoteSections, &Values::new().set("user_id", alice.id).set("name", "S"))
            .await
            .unwrap();
        let section_id = uuid_of(&section, "id").unwrap();
        store
            .insert(
                &alice,
                Table::NotePages,
                &Values::new().set("user_id", alice.id).set("section_id", section_id).set("title", "P"),
            )
            .await
            .unwrap();

        store
            .delete(&alice, &Filter::new(Table::NoteSections).eq("id", section_id))
            .await
            .unwrap();
        let pages = store.select(&alice, &Filter::new(Table::NotePages)).await.unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0]["section_id"], Value::Null);
    }

    #[tokio::test]
    async fn update_refreshes_updated_at() {
        let store = MemoryStore::new();
        let alice = user();
        let id = conversation(&store, &alice).await;
        let filter = Filter::new(Table::Conversations).eq("id", id);
        let before = store.select(&alice, &filter).await.unwrap().remove(0);
        let after = store
            .update(&alice, &filter, &Values::new().set("title", "New"))
            .await
            .unwrap()
            .remove(0);
        assert_eq!(after["title"], json!("New"));
        assert_ne!(before["updated_at"], after["updated_at"]);
        assert_eq!(before["created_at"], after["created_at"]);
    }

    #[tokio::test]
    async fn creation_order_is_strict() {
        let store = MemoryStore::new();
        let alice = user();
        for _ in 0..5 {
            conversation(&store, &alice).await;
        }
        let rows = store
            .select(&alice, &Filter::new(Table::Conversations).order("created_at", SortDirection::Asc))
            .await
            .unwrap();
        let stamps: Vec<_> = rows.iter().map(|r| r["created_at"].as_str().unwrap_or_default().to_string()).collect();
        let mut unique = stamps.clone();
        unique.dedup();
        assert_eq!(unique.len(), 5);
    }
}
