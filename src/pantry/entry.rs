//! Pantry entry and line item models.

use serde::{Deserialize, Serialize};

use crate::common::errors::{HomeError, HomeResult};
use crate::common::ids::EntryId;

/// One named, quantified inventory line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PantryEntry {
    /// Stable identifier, assigned at creation.
    pub id: EntryId,
    /// Case-sensitive name, unique across the pantry.
    pub name: String,
    /// Non-negative quantity.
    pub amount: f64,
    /// Free-text unit.
    pub unit: String,
}

impl PantryEntry {
    /// Build an entry for a name that has never been stored.
    #[must_use]
    pub fn create(item: &LineItem) -> Self {
        Self {
            id: EntryId::new(),
            name: item.name.clone(),
            amount: item.amount,
            unit: item.unit.clone(),
        }
    }

    /// Whether the entry has been used up.
    #[must_use]
    pub fn is_depleted(&self) -> bool {
        self.amount <= 0.0
    }
}

/// A requested change for one pantry line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Name of the pantry line.
    pub name: String,
    /// Absolute amount for saves, amount to subtract for uses.
    pub amount: f64,
    /// Unit of the amount.
    pub unit: String,
}

impl LineItem {
    /// Convenience constructor.
    #[must_use]
    pub fn new(name: impl Into<String>, amount: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount,
            unit: unit.into(),
        }
    }

    /// Reject items that could break the pantry invariants.
    ///
    /// # Errors
    /// Returns a validation error for an empty name or a negative/non-finite amount.
    pub fn validate(&self) -> HomeResult<()> {
        if self.name.is_empty() {
            return Err(HomeError::Validation("item name must not be empty".to_string()));
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(HomeError::Validation(format!(
                "amount for {} must be a finite number >= 0, got {}",
                self.name, self.amount
            )));
        }
        Ok(())
    }
}

/// Validate a whole batch before touching storage.
///
/// # Errors
/// Returns the first validation error in request order.
pub fn validate_items(items: &[LineItem]) -> HomeResult<()> {
    items.iter().try_for_each(LineItem::validate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_copies_item() {
        let entry = PantryEntry::create(&LineItem::new("flour", 500.0, "g"));
        assert_eq!(entry.name, "flour");
        assert!((entry.amount - 500.0).abs() < f64::EPSILON);
        assert_eq!(entry.unit, "g");
    }

    #[test]
    fn test_validate_rejects_negative_amount() {
        assert!(LineItem::new("rice", -1.0, "kg").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nan() {
        assert!(LineItem::new("rice", f64::NAN, "kg").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        assert!(LineItem::new("", 1.0, "kg").validate().is_err());
    }

    #[test]
    fn test_validate_accepts_zero() {
        assert!(LineItem::new("salt", 0.0, "").validate().is_ok());
    }

    #[test]
    fn test_line_item_deserializes_from_request_json() {
        let item: LineItem =
            serde_json::from_str(r#"{"name":"milk","amount":1.5,"unit":"l"}"#).unwrap();
        assert_eq!(item, LineItem::new("milk", 1.5, "l"));
    }
}
