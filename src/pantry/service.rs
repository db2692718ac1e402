//! Inventory reconciliation: turns save/use requests into entry upserts.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::common::errors::HomeResult;
use crate::common::ids::EntryId;
use crate::pantry::entry::{LineItem, PantryEntry, validate_items};
use crate::pantry::entry_store::EntryStore;

/// Notable outcome of a use request that is not an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InventoryEvent {
    /// The requested item is not in storage and was skipped.
    Missing {
        /// Requested name.
        name: String,
    },
    /// The entry reached an amount of exactly zero.
    Depleted {
        /// Entry identifier.
        id: EntryId,
        /// Entry name.
        name: String,
    },
}

/// Result of a use request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UseReport {
    /// Entries that were updated and persisted.
    pub entries: Vec<PantryEntry>,
    /// Warnings and depletions, in request order.
    pub events: Vec<InventoryEvent>,
}

impl UseReport {
    /// Names that were requested but not found.
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|event| match event {
            InventoryEvent::Missing { name } => Some(name.as_str()),
            InventoryEvent::Depleted { .. } => None,
        })
    }
}

/// Compute the entries to upsert for a save request.
///
/// Matched names keep their id and take the requested amount and unit; unseen
/// names get a fresh entry. A name repeated in one request collapses to a single
/// entry at its first position carrying the last requested values.
#[must_use]
pub fn plan_save(items: &[LineItem], existing: Vec<PantryEntry>) -> Vec<PantryEntry> {
    let mut by_name: HashMap<String, PantryEntry> = existing
        .into_iter()
        .map(|entry| (entry.name.clone(), entry))
        .collect();
    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(items.len());
    let mut planned: Vec<PantryEntry> = Vec::with_capacity(items.len());

    for item in items {
        if let Some(&pos) = positions.get(item.name.as_str()) {
            planned[pos].amount = item.amount;
            planned[pos].unit.clone_from(&item.unit);
            continue;
        }

        let entry = match by_name.remove(&item.name) {
            Some(found) => PantryEntry {
                amount: item.amount,
                unit: item.unit.clone(),
                ..found
            },
            None => PantryEntry::create(item),
        };
        positions.insert(item.name.as_str(), planned.len());
        planned.push(entry);
    }

    planned
}

/// Compute the entries to upsert for a use request, with its events.
///
/// Amounts are subtracted and floored at zero; unit and id are unchanged.
/// Unmatched names are dropped and reported once as missing. Repeated names are
/// applied cumulatively. An entry is reported as depleted only by the line that
/// takes it from a positive amount to zero.
#[must_use]
pub fn plan_use(items: &[LineItem], existing: Vec<PantryEntry>) -> UseReport {
    let mut by_name: HashMap<String, PantryEntry> = existing
        .into_iter()
        .map(|entry| (entry.name.clone(), entry))
        .collect();
    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(items.len());
    let mut missing: HashSet<&str> = HashSet::new();
    let mut report = UseReport::default();

    for item in items {
        let pos = if let Some(&pos) = positions.get(item.name.as_str()) {
            pos
        } else if let Some(found) = by_name.remove(&item.name) {
            positions.insert(item.name.as_str(), report.entries.len());
            report.entries.push(found);
            report.entries.len() - 1
        } else {
            if missing.insert(item.name.as_str()) {
                report.events.push(InventoryEvent::Missing {
                    name: item.name.clone(),
                });
            }
            continue;
        };

        let entry = &mut report.entries[pos];
        let before = entry.amount;
        entry.amount = (before - item.amount).max(0.0);
        if before > 0.0 && entry.is_depleted() {
            report.events.push(InventoryEvent::Depleted {
                id: entry.id,
                name: entry.name.clone(),
            });
        }
    }

    report
}

/// Pantry service backed by an entry store.
#[derive(Clone)]
pub struct PantryService {
    store: Arc<dyn EntryStore>,
}

impl PantryService {
    /// Create a service over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self { store }
    }

    /// Set or create each requested line.
    ///
    /// # Errors
    /// Returns a validation error for bad items (before any storage access) or a
    /// storage error if the store fails.
    pub async fn save_food(&self, items: Vec<LineItem>) -> HomeResult<Vec<PantryEntry>> {
        info!("Incoming save food request: {items:?}");
        validate_items(&items)?;

        let names = items.iter().map(|item| item.name.clone()).collect();
        let saved = self
            .store
            .read_modify_write(
                names,
                Box::new(move |existing: Vec<PantryEntry>| {
                    plan_save(&items, existing)
                }),
            )
            .await?;

        Ok(saved)
    }

    /// Subtract each requested amount from its line, flooring at zero.
    ///
    /// Items not in storage are skipped and reported as [`InventoryEvent::Missing`].
    ///
    /// # Errors
    /// Returns a validation error for bad items (before any storage access) or a
    /// storage error if the store fails.
    pub async fn use_food(&self, items: Vec<LineItem>) -> HomeResult<UseReport> {
        info!("Incoming use food request: {items:?}");
        validate_items(&items)?;

        let names = items.iter().map(|item| item.name.clone()).collect();
        let (events_tx, events_rx) = oneshot::channel();
        let entries = self
            .store
            .read_modify_write(
                names,
                Box::new(move |existing: Vec<PantryEntry>| {
                    let report = plan_use(&items, existing);
                    let _ = events_tx.send(report.events);
                    report.entries
                }),
            )
            .await?;

        let events = events_rx.await.unwrap_or_default();
        for event in &events {
            match event {
                InventoryEvent::Missing { name } => warn!("Item not in storage: {name}"),
                InventoryEvent::Depleted { name, .. } => info!("Item {name} is now depleted"),
            }
        }

        Ok(UseReport { entries, events })
    }

    /// Return every entry as stored.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    pub async fn get_food(&self) -> HomeResult<Vec<PantryEntry>> {
        self.store.find_all().await
    }
}
