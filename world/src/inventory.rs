//! Per-character item storage with one slot per item type.

use turngrid_core::{ElementId, ItemType};

use crate::element::{Item, MapElement};

/// Items carried by a character.
///
/// Each [`ItemType`] owns a single slot. Items taken off the map are stored
/// whole so they can be placed back unchanged when dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Inventory {
    slots: [Option<Item>; ItemType::ALL.len()],
}

impl Inventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the item in its slot.
    ///
    /// # Errors
    ///
    /// Returns the item unchanged when its slot is already occupied.
    pub fn add(&mut self, item: Item) -> Result<(), Item> {
        let slot = &mut self.slots[item.item_type().slot()];
        if slot.is_some() {
            return Err(item);
        }
        *slot = Some(item);
        Ok(())
    }

    /// Takes the item out of its slot.
    pub fn remove(&mut self, item_type: ItemType) -> Option<Item> {
        self.slots[item_type.slot()].take()
    }

    /// Reports whether the slot is occupied.
    #[must_use]
    pub fn has(&self, item_type: ItemType) -> bool {
        self.slots[item_type.slot()].is_some()
    }

    /// Item stored in the slot.
    #[must_use]
    pub fn get(&self, item_type: ItemType) -> Option<&Item> {
        self.slots[item_type.slot()].as_ref()
    }

    /// Whether the item with the identifier is carried.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.slots.iter().flatten().any(|item| item.id() == id)
    }

    /// Occupied slots in slot order.
    #[must_use]
    pub fn item_types(&self) -> Vec<ItemType> {
        ItemType::ALL
            .into_iter()
            .filter(|item_type| self.has(*item_type))
            .collect()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Reports whether every slot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human-readable summary of the carried items.
    #[must_use]
    pub fn description(&self) -> String {
        if self.is_empty() {
            return String::from("Empty inventory");
        }
        let names: Vec<String> = self
            .slots
            .iter()
            .flatten()
            .map(|item| format!("{} ({})", item.item_type(), item.name()))
            .collect();
        names.join(", ")
    }

    /// Empties every slot, returning the removed items.
    pub fn clear(&mut self) -> Vec<Item> {
        self.slots.iter_mut().filter_map(Option::take).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementBase;
    use turngrid_core::ItemTraits;

    fn item(id: u32, item_type: ItemType) -> Item {
        let traits = ItemTraits {
            item_type,
            ..ItemTraits::default()
        };
        let name = item_type.to_string().to_lowercase();
        Item::new(ElementBase::new(ElementId::new(id), name, "", 1, 0, 0), &traits)
    }

    #[test]
    fn one_item_per_slot() {
        let mut inventory = Inventory::new();
        assert!(inventory.add(item(1, ItemType::Key)).is_ok());
        let rejected = inventory
            .add(item(2, ItemType::Key))
            .expect_err("second key must be rejected");
        assert_eq!(rejected.id(), ElementId::new(2));
        assert_eq!(inventory.len(), 1);
        assert_eq!(
            inventory.get(ItemType::Key).map(MapElement::id),
            Some(ElementId::new(1))
        );
    }

    #[test]
    fn removing_missing_item_changes_nothing() {
        let mut inventory = Inventory::new();
        assert!(inventory.remove(ItemType::Money).is_none());
        assert!(inventory.is_empty());
    }

    #[test]
    fn description_lists_items_in_slot_order() {
        let mut inventory = Inventory::new();
        assert_eq!(inventory.description(), "Empty inventory");

        assert!(inventory.add(item(3, ItemType::Apple)).is_ok());
        assert!(inventory.add(item(4, ItemType::Key)).is_ok());
        assert_eq!(inventory.description(), "Key (key), Apple (apple)");
        assert_eq!(inventory.item_types(), vec![ItemType::Key, ItemType::Apple]);

        let cleared = inventory.clear();
        assert_eq!(cleared.len(), 2);
        assert!(inventory.is_empty());
    }
}
