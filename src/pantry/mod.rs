//! Household inventory: entries, their store and the reconciler.

pub mod entry;
pub mod entry_store;
pub mod service;

pub use entry::{LineItem, PantryEntry};
pub use entry_store::{EntryPlan, EntryStore, SqliteEntryStore, StoreFuture};
pub use service::{InventoryEvent, PantryService, UseReport, plan_save, plan_use};
