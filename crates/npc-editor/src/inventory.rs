//! Pure edits on an NPC inventory list.
//!
//! Each function takes the current list and returns the list to send as an
//! update; the session merges it only after the server accepts it. Entries
//! the editor does not recognise are carried along untouched.

use crate::model::InventoryEntry;

/// Add `quantity` of `item_id`, merging with an existing entry.
pub fn with_added(inventory: &[InventoryEntry], item_id: &str, quantity: u32) -> Vec<InventoryEntry> {
    let mut out = inventory.to_vec();
    match out
        .iter_mut()
        .find(|e| e.is_recognized() && e.item_id == item_id)
    {
        Some(entry) => entry.quantity = entry.quantity.saturating_add(quantity),
        None => out.push(InventoryEntry::new(item_id, quantity)),
    }
    out
}

/// Drop every entry for `item_id`. `None` when the item was not present.
pub fn without(inventory: &[InventoryEntry], item_id: &str) -> Option<Vec<InventoryEntry>> {
    let kept: Vec<InventoryEntry> = inventory
        .iter()
        .filter(|e| !e.is_recognized() || e.item_id != item_id)
        .cloned()
        .collect();
    (kept.len() != inventory.len()).then_some(kept)
}

/// Set the quantity of the entry at `index`. Zero removes it; any other
/// quantity leaves an unrecognised entry as it is.
pub fn with_quantity(inventory: &[InventoryEntry], index: usize, quantity: u32) -> Vec<InventoryEntry> {
    let mut out = inventory.to_vec();
    if index < out.len() {
        if quantity == 0 {
            out.remove(index);
        } else if out[index].is_recognized() {
            out[index].quantity = quantity;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_merges_quantities() {
        let inv = vec![InventoryEntry::new("sword", 2)];
        let inv = with_added(&inv, "sword", 3);
        assert_eq!(inv, vec![InventoryEntry::new("sword", 5)]);
        let inv = with_added(&inv, "bread", 1);
        assert_eq!(inv[1], InventoryEntry::new("bread", 1));
    }

    #[test]
    fn remove_reports_absence() {
        let inv = vec![InventoryEntry::new("sword", 2), InventoryEntry::new("bread", 1)];
        assert_eq!(
            without(&inv, "sword"),
            Some(vec![InventoryEntry::new("bread", 1)])
        );
        assert_eq!(without(&inv, "axe"), None);
    }

    #[test]
    fn zero_quantity_removes_entry() {
        let inv = vec![InventoryEntry::new("sword", 2), InventoryEntry::new("bread", 1)];
        assert_eq!(with_quantity(&inv, 0, 4)[0].quantity, 4);
        assert_eq!(with_quantity(&inv, 0, 0), vec![InventoryEntry::new("bread", 1)]);
        // Out of range is a no-op.
        assert_eq!(with_quantity(&inv, 9, 1), inv);
    }

    #[test]
    fn unrecognised_entries_are_carried_along() {
        let odd = InventoryEntry::unrecognized(serde_json::json!({"item": "sword", "count": 2}));
        let inv = vec![odd.clone(), InventoryEntry::new("bread", 1)];

        assert_eq!(with_added(&inv, "", 1).len(), 3);
        assert_eq!(with_added(&inv, "bread", 1)[0], odd);
        assert_eq!(without(&inv, ""), None);
        assert_eq!(with_quantity(&inv, 0, 5), inv);
        assert_eq!(with_quantity(&inv, 0, 0), vec![InventoryEntry::new("bread", 1)]);
    }
}
