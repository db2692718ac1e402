//! Durable storage for pantry entries.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rusqlite::TransactionBehavior;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::common::errors::HomeResult;
use crate::pantry::entry::PantryEntry;

/// Boxed future type for entry store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Pure state transition applied to the entries matched by name.
///
/// Receives the existing entries and returns the entries to upsert.
pub type EntryPlan = Box<dyn FnOnce(Vec<PantryEntry>) -> Vec<PantryEntry> + Send>;

/// Entry store trait.
pub trait EntryStore: Send + Sync {
    /// Return every current entry.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn find_all(&self) -> StoreFuture<'_, HomeResult<Vec<PantryEntry>>>;

    /// Return the entries whose name is in `names`. Unknown names are absent.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn find_all_where_names_in(
        &self,
        names: Vec<String>,
    ) -> StoreFuture<'_, HomeResult<Vec<PantryEntry>>>;

    /// Insert or overwrite each entry by id, all or nothing.
    ///
    /// # Errors
    /// Returns an error if storage access fails; nothing is written in that case.
    fn upsert_all(&self, entries: Vec<PantryEntry>)
    -> StoreFuture<'_, HomeResult<Vec<PantryEntry>>>;

    /// Fetch the entries named in `names`, run `plan` on them and upsert the result.
    ///
    /// An empty plan result performs no write. This default runs the read and the
    /// write as separate calls, so concurrent plans over the same names can lose
    /// updates. Backends with transactions should override it.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn read_modify_write(
        &self,
        names: Vec<String>,
        plan: EntryPlan,
    ) -> StoreFuture<'_, HomeResult<Vec<PantryEntry>>> {
        Box::pin(async move {
            let existing = self.find_all_where_names_in(names).await?;
            let planned = plan(existing);
            if planned.is_empty() {
                return Ok(Vec::new());
            }
            self.upsert_all(planned).await
        })
    }
}

/// `SQLite` implementation of the entry store.
pub struct SqliteEntryStore {
    conn: Arc<Connection>,
    table: String,
}

impl SqliteEntryStore {
    /// Table name for pantry entries.
    pub const DEFAULT_TABLE: &'static str = "pantry_entry";

    /// Initialize the store and create the table if it doesn't exist.
    ///
    /// # Errors
    /// Returns an error if database operations fail.
    pub async fn new(conn: Arc<Connection>) -> HomeResult<Self> {
        let table = Self::DEFAULT_TABLE.to_string();
        let table_name = table.clone();

        conn.call(move |conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table_name} (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    quantity REAL NOT NULL CHECK (quantity >= 0),
                    unit TEXT NOT NULL
                )"
            ))?;
            Ok(())
        })
        .await?;

        Ok(Self { conn, table })
    }
}

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PantryEntry> {
    let id: String = row.get(0)?;
    let id = id.parse().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
    })?;
    Ok(PantryEntry {
        id,
        name: row.get(1)?,
        amount: row.get(2)?,
        unit: row.get(3)?,
    })
}

fn select_by_names(
    conn: &rusqlite::Connection,
    table: &str,
    names: &[String],
) -> rusqlite::Result<Vec<PantryEntry>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = (1..=names.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT id, name, quantity, unit FROM {table} WHERE name IN ({placeholders})"
    ))?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(names.iter()), entry_from_row)?
        .collect::<Result<Vec<_>, rusqlite::Error>>()?;
    Ok(rows)
}

fn write_entries(
    conn: &rusqlite::Connection,
    table: &str,
    entries: &[PantryEntry],
) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {table} (id, name, quantity, unit)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            quantity = excluded.quantity,
            unit = excluded.unit"
    ))?;
    for entry in entries {
        stmt.execute(rusqlite::params![
            entry.id.to_string(),
            entry.name,
            entry.amount,
            entry.unit
        ])?;
    }
    Ok(())
}

fn dedup_names(mut names: Vec<String>) -> Vec<String> {
    names.sort();
    names.dedup();
    names
}

impl EntryStore for SqliteEntryStore {
    fn find_all(&self) -> StoreFuture<'_, HomeResult<Vec<PantryEntry>>> {
        Box::pin(async move {
            let table = self.table.clone();
            let rows = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT id, name, quantity, unit FROM {table} ORDER BY name"
                    ))?;
                    let rows = stmt
                        .query_map([], entry_from_row)?
                        .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                    Ok(rows)
                })
                .await?;
            Ok(rows)
        })
    }

    fn find_all_where_names_in(
        &self,
        names: Vec<String>,
    ) -> StoreFuture<'_, HomeResult<Vec<PantryEntry>>> {
        Box::pin(async move {
            let table = self.table.clone();
            let names = dedup_names(names);
            let rows = self
                .conn
                .call(move |conn| Ok(select_by_names(conn, &table, &names)?))
                .await?;
            Ok(rows)
        })
    }

    fn upsert_all(
        &self,
        entries: Vec<PantryEntry>,
    ) -> StoreFuture<'_, HomeResult<Vec<PantryEntry>>> {
        Box::pin(async move {
            if entries.is_empty() {
                return Ok(entries);
            }

            let table = self.table.clone();
            let saved = self
                .conn
                .call(move |conn| {
                    let tx = conn.transaction()?;
                    write_entries(&tx, &table, &entries)?;
                    tx.commit()?;
                    Ok(entries)
                })
                .await?;
            debug!("Upserted {} pantry entries", saved.len());
            Ok(saved)
        })
    }

    fn read_modify_write(
        &self,
        names: Vec<String>,
        plan: EntryPlan,
    ) -> StoreFuture<'_, HomeResult<Vec<PantryEntry>>> {
        Box::pin(async move {
            let table = self.table.clone();
            let names = dedup_names(names);
            let saved = self
                .conn
                .call(move |conn| {
                    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
                    let existing = select_by_names(&tx, &table, &names)?;
                    let planned = plan(existing);
                    if !planned.is_empty() {
                        write_entries(&tx, &table, &planned)?;
                    }
                    tx.commit()?;
                    Ok(planned)
                })
                .await?;
            debug!("Reconciled {} pantry entries in one transaction", saved.len());
            Ok(saved)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pantry::entry::LineItem;

    async fn store() -> SqliteEntryStore {
        let conn = Arc::new(Connection::open_in_memory().await.unwrap());
        SqliteEntryStore::new(conn).await.unwrap()
    }

    fn entry(name: &str, amount: f64, unit: &str) -> PantryEntry {
        PantryEntry::create(&LineItem::new(name, amount, unit))
    }

    #[tokio::test]
    async fn test_upsert_then_find_all() {
        let store = store().await;
        let flour = entry("flour", 500.0, "g");
        let eggs = entry("eggs", 6.0, "pcs");

        let saved = store
            .upsert_all(vec![flour.clone(), eggs.clone()])
            .await
            .unwrap();
        assert_eq!(saved, vec![flour.clone(), eggs.clone()]);

        let all = store.find_all().await.unwrap();
        assert_eq!(all, vec![eggs, flour]);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_by_id() {
        let store = store().await;
        let mut flour = entry("flour", 500.0, "g");
        store.upsert_all(vec![flour.clone()]).await.unwrap();

        flour.amount = 250.0;
        flour.unit = "grams".to_string();
        store.upsert_all(vec![flour.clone()]).await.unwrap();

        let all = store.find_all().await.unwrap();
        assert_eq!(all, vec![flour]);
    }

    #[tokio::test]
    async fn test_find_by_names_skips_unknown() {
        let store = store().await;
        let flour = entry("flour", 500.0, "g");
        store
            .upsert_all(vec![flour.clone(), entry("sugar", 1.0, "kg")])
            .await
            .unwrap();

        let found = store
            .find_all_where_names_in(vec!["flour".to_string(), "saffron".to_string()])
            .await
            .unwrap();
        assert_eq!(found, vec![flour]);
    }

    #[tokio::test]
    async fn test_find_by_names_is_case_sensitive() {
        let store = store().await;
        store.upsert_all(vec![entry("Flour", 1.0, "kg")]).await.unwrap();

        let found = store
            .find_all_where_names_in(vec!["flour".to_string()])
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_empty_names() {
        let store = store().await;
        store.upsert_all(vec![entry("flour", 1.0, "kg")]).await.unwrap();
        assert!(store.find_all_where_names_in(Vec::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_upsert_writes_nothing() {
        let store = store().await;
        store.upsert_all(vec![entry("flour", 1.0, "kg")]).await.unwrap();

        // Second row collides on the unique name, so the whole batch rolls back.
        let result = store
            .upsert_all(vec![entry("rice", 2.0, "kg"), entry("flour", 3.0, "kg")])
            .await;
        assert!(result.is_err());
        assert!(result.unwrap_err().is_storage());

        let names: Vec<String> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["flour".to_string()]);
    }

    #[tokio::test]
    async fn test_read_modify_write_applies_plan() {
        let store = store().await;
        let flour = entry("flour", 500.0, "g");
        store.upsert_all(vec![flour.clone()]).await.unwrap();

        let saved = store
            .read_modify_write(
                vec!["flour".to_string()],
                Box::new(|existing: Vec<PantryEntry>| {
                    existing
                        .into_iter()
                        .map(|mut e| {
                            e.amount -= 100.0;
                            e
                        })
                        .collect()
                }),
            )
            .await
            .unwrap();

        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, flour.id);
        let all = store.find_all().await.unwrap();
        assert!((all[0].amount - 400.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_read_modify_write_empty_plan() {
        let store = store().await;
        let saved = store
            .read_modify_write(vec!["ghost".to_string()], Box::new(|_: Vec<PantryEntry>| Vec::new()))
            .await
            .unwrap();
        assert!(saved.is_empty());
        assert!(store.find_all().await.unwrap().is_empty());
    }
}
