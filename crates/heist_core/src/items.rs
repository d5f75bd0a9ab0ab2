//! Consumable items and the shared party inventory.

use serde::{Deserialize, Serialize};

use crate::combatant::Combatant;
use crate::error::CombatError;

/// What a consumable does when used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemEffect {
    /// Restore HP to a living ally.
    Heal(i32),
    /// Restore SP to a living ally.
    RestoreSp(i32),
    /// Bring a defeated ally back with this much HP.
    Revive(i32),
}

/// A consumable item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    /// Display name.
    pub name: String,
    /// Effect on use.
    pub effect: ItemEffect,
}

impl Item {
    /// Create a new item.
    #[must_use]
    pub fn new(name: impl Into<String>, effect: ItemEffect) -> Self {
        Self {
            name: name.into(),
            effect,
        }
    }

    /// Check whether the item would do anything to `target`.
    ///
    /// Revival items only work on defeated allies; everything else only on
    /// living ones.
    pub fn check_target(&self, target: &Combatant) -> Result<(), CombatError> {
        let applicable = match self.effect {
            ItemEffect::Revive(_) => !target.alive,
            ItemEffect::Heal(_) | ItemEffect::RestoreSp(_) => target.alive,
        };
        if applicable {
            Ok(())
        } else {
            Err(CombatError::NoEffect {
                item: self.name.clone(),
                target: target.name.clone(),
            })
        }
    }

    /// Apply the item to `target`. Returns the amount restored.
    pub fn apply(&self, target: &mut Combatant) -> Result<i32, CombatError> {
        self.check_target(target)?;
        let amount = match self.effect {
            ItemEffect::Heal(hp) => target.heal(hp),
            ItemEffect::RestoreSp(sp) => target.restore_sp(sp),
            ItemEffect::Revive(hp) => {
                target.revive(hp);
                target.hp
            }
        };
        Ok(amount)
    }
}

/// The party's shared consumables, in pickup order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Inventory {
    items: Vec<Item>,
}

impl Inventory {
    /// Create an inventory from a list of items.
    #[must_use]
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    /// Add an item at the end.
    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    /// Get an item by index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    /// Remove and return the item at `index`.
    pub fn take(&mut self, index: usize) -> Option<Item> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the inventory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over items in order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }
}
