//! Party, enemy, and item definitions.

use serde::{Deserialize, Serialize};

use crate::combatant::{Ability, Combatant, CostType, Element, Equipment, Gear};
use crate::error::DataError;
use crate::items::{Inventory, Item, ItemEffect};

/// Data-driven combatant definition.
///
/// # Example RON
///
/// ```ron
/// CombatantData(
///     name: "Skull",
///     sprite: "assets/player_skull.png",
///     max_hp: 150,
///     max_sp: 30,
///     attack: 20,
///     defense: 15,
///     skills: [
///         (name: "Lunge", cost: 5, magnitude: 25, element: Phys, cost_type: Hp),
///         (name: "Zio", cost: 4, magnitude: 25, element: Elec),
///     ],
///     weaknesses: [Wind],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantData {
    /// Display name, also the lookup key in an [`EnemyTable`].
    pub name: String,

    /// Sprite reference for the renderer.
    #[serde(default)]
    pub sprite: String,

    /// Maximum HP. Combatants start at full health.
    pub max_hp: i32,

    /// Maximum SP.
    #[serde(default)]
    pub max_sp: i32,

    /// Base attack.
    pub attack: i32,

    /// Base defense.
    #[serde(default)]
    pub defense: i32,

    /// Skills in menu order.
    #[serde(default)]
    pub skills: Vec<Ability>,

    /// Elemental weaknesses.
    #[serde(default)]
    pub weaknesses: Vec<Element>,

    /// Starting gear.
    #[serde(default)]
    pub equipment: Equipment,
}

impl CombatantData {
    /// Build a fresh combatant at full HP, SP, and ammo.
    #[must_use]
    pub fn to_combatant(&self) -> Combatant {
        Combatant::new(
            self.name.clone(),
            self.max_hp,
            self.max_sp,
            self.attack,
            self.defense,
        )
        .with_sprite(self.sprite.clone())
        .with_skills(self.skills.clone())
        .with_weaknesses(self.weaknesses.clone())
        .with_equipment(self.equipment.clone())
    }

    /// Validate stat ranges and skill definitions.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidValue`] for the first bad field.
    pub fn validate(&self) -> Result<(), DataError> {
        let invalid = |field: &str, message: String| DataError::InvalidValue {
            field: format!("{}.{field}", self.name),
            message,
        };

        if self.name.trim().is_empty() {
            return Err(DataError::InvalidValue {
                field: "name".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.max_hp <= 0 {
            return Err(invalid("max_hp", format!("must be positive, got {}", self.max_hp)));
        }
        if self.max_sp < 0 {
            return Err(invalid("max_sp", format!("must not be negative, got {}", self.max_sp)));
        }
        for skill in &self.skills {
            if skill.cost < 0 {
                return Err(invalid(
                    "skills",
                    format!("'{}' has negative cost {}", skill.name, skill.cost),
                ));
            }
        }
        Ok(())
    }
}

fn skill(name: &str, cost: i32, magnitude: i32, element: Element, cost_type: CostType) -> Ability {
    Ability::new(name, cost, magnitude, element, cost_type)
}

/// The playable roster plus the starting inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyData {
    /// Members in roster order. The first is the leader.
    pub members: Vec<CombatantData>,

    /// Starting consumables.
    #[serde(default)]
    pub inventory: Vec<Item>,
}

impl Default for PartyData {
    fn default() -> Self {
        let joker = CombatantData {
            name: "Joker".to_string(),
            sprite: "assets/player_joker.png".to_string(),
            max_hp: 100,
            max_sp: 50,
            attack: 15,
            defense: 10,
            skills: vec![
                skill("Eiha", 4, 30, Element::Curse, CostType::Sp),
                skill("Gun", 2, 20, Element::Gun, CostType::Hp),
            ],
            weaknesses: Vec::new(),
            equipment: Equipment {
                melee: Some(Gear::melee("Knife", 5)),
                ranged: Some(Gear::ranged("Tkachev", 6, 6)),
                ..Equipment::default()
            },
        };
        let skull = CombatantData {
            name: "Skull".to_string(),
            sprite: "assets/player_skull.png".to_string(),
            max_hp: 150,
            max_sp: 30,
            attack: 20,
            defense: 15,
            skills: vec![
                skill("Lunge", 5, 25, Element::Phys, CostType::Hp),
                skill("Zio", 4, 25, Element::Elec, CostType::Sp),
            ],
            weaknesses: vec![Element::Wind],
            equipment: Equipment {
                melee: Some(Gear::melee("Lead Pipe", 8)),
                ranged: Some(Gear::ranged("Shotgun", 10, 4)),
                ..Equipment::default()
            },
        };
        let mona = CombatantData {
            name: "Mona".to_string(),
            sprite: "assets/player_mona.png".to_string(),
            max_hp: 80,
            max_sp: 60,
            attack: 12,
            defense: 8,
            skills: vec![
                skill("Garu", 4, 20, Element::Wind, CostType::Sp),
                skill("Dia", 4, -30, Element::None, CostType::Sp),
            ],
            weaknesses: vec![Element::Elec],
            equipment: Equipment {
                melee: Some(Gear::melee("Scimitar", 4)),
                ranged: Some(Gear::ranged("Slingshot", 4, 8)),
                ..Equipment::default()
            },
        };
        let noir = CombatantData {
            name: "Noir".to_string(),
            sprite: "assets/player_noir.png".to_string(),
            max_hp: 110,
            max_sp: 45,
            attack: 18,
            defense: 12,
            skills: vec![
                skill("Psi", 4, 35, Element::Psi, CostType::Sp),
                skill("Mapsi", 8, 25, Element::Psi, CostType::Sp),
            ],
            weaknesses: vec![Element::Nuke],
            equipment: Equipment {
                melee: Some(Gear::melee("Battle Axe", 9)),
                ranged: Some(Gear::ranged("Grenade Launcher", 12, 3)),
                ..Equipment::default()
            },
        };

        Self {
            members: vec![joker, skull, mona, noir],
            inventory: default_inventory().iter().cloned().collect(),
        }
    }
}

impl PartyData {
    /// Parse a party definition from RON.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Parse`] on malformed input, or the first
    /// validation failure.
    pub fn from_ron_str(source: &str) -> Result<Self, DataError> {
        let party: Self = ron::from_str(source)?;
        party.validate()?;
        Ok(party)
    }

    /// Build the battle roster.
    #[must_use]
    pub fn roster(&self) -> Vec<Combatant> {
        self.members.iter().map(CombatantData::to_combatant).collect()
    }

    /// Build the starting inventory.
    #[must_use]
    pub fn starting_inventory(&self) -> Inventory {
        Inventory::new(self.inventory.clone())
    }

    /// Validate every member.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidValue`] for an empty roster or the first
    /// invalid member.
    pub fn validate(&self) -> Result<(), DataError> {
        if self.members.is_empty() {
            return Err(DataError::InvalidValue {
                field: "members".to_string(),
                message: "party needs at least one member".to_string(),
            });
        }
        self.members.iter().try_for_each(CombatantData::validate)
    }
}

/// Medicine, Snuff Soul, and a Revival Bead.
#[must_use]
pub fn default_inventory() -> Inventory {
    Inventory::new(vec![
        Item::new("Medicine", ItemEffect::Heal(50)),
        Item::new("Snuff Soul", ItemEffect::RestoreSp(20)),
        Item::new("Revival Bead", ItemEffect::Revive(50)),
    ])
}

/// Enemy definitions looked up by name when an encounter starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyTable {
    /// Known enemies.
    pub enemies: Vec<CombatantData>,
}

impl Default for EnemyTable {
    fn default() -> Self {
        let enemy = |name: &str, max_hp: i32, attack: i32, weaknesses: Vec<Element>| CombatantData {
            name: name.to_string(),
            sprite: String::new(),
            max_hp,
            max_sp: 0,
            attack,
            defense: 0,
            skills: Vec::new(),
            weaknesses,
            equipment: Equipment::default(),
        };

        Self {
            enemies: vec![
                enemy("Pixie", 50, 10, vec![Element::Gun, Element::Ice, Element::Curse]),
                enemy("Jack Frost", 120, 15, vec![Element::Fire]),
                enemy("Shadow", 30, 8, Vec::new()),
            ],
        }
    }
}

impl EnemyTable {
    /// Name used when an encounter lists no enemies.
    pub const FALLBACK: &'static str = "Shadow";

    /// Parse an enemy table from RON.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Parse`] on malformed input, or the first
    /// validation failure.
    pub fn from_ron_str(source: &str) -> Result<Self, DataError> {
        let table: Self = ron::from_str(source)?;
        table.validate()?;
        Ok(table)
    }

    /// Find an enemy by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CombatantData> {
        self.enemies.iter().find(|e| e.name == name)
    }

    /// Build the battle line-up for an encounter.
    ///
    /// Unknown names are skipped; an empty result falls back to a single
    /// [`EnemyTable::FALLBACK`] enemy (or the first table entry).
    #[must_use]
    pub fn encounter(&self, names: &[String]) -> Vec<Combatant> {
        let mut lineup: Vec<Combatant> = names
            .iter()
            .filter_map(|name| {
                let found = self.get(name);
                if found.is_none() {
                    tracing::warn!(enemy = %name, "Unknown enemy in encounter");
                }
                found
            })
            .map(CombatantData::to_combatant)
            .collect();

        if lineup.is_empty() {
            if let Some(fallback) = self.get(Self::FALLBACK).or_else(|| self.enemies.first()) {
                lineup.push(fallback.to_combatant());
            }
        }
        lineup
    }

    /// Validate every entry and reject duplicate names.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidValue`] for the first problem found.
    pub fn validate(&self) -> Result<(), DataError> {
        for (i, enemy) in self.enemies.iter().enumerate() {
            enemy.validate()?;
            if self.enemies[..i].iter().any(|e| e.name == enemy.name) {
                return Err(DataError::InvalidValue {
                    field: "enemies".to_string(),
                    message: format!("duplicate enemy '{}'", enemy.name),
                });
            }
        }
        Ok(())
    }
}
