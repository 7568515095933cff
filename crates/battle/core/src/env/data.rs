//! Static data oracle: id-indexed lookup tables.

use crate::data::{
    ActorData, ArmorData, ClassData, EnemyData, ItemData, SkillData, StateData, SystemData,
    TroopData, WeaponData,
};

/// Id-indexed table as stored in the data files: slot 0 is `null` and ids
/// may have gaps.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Table<T> {
    rows: Vec<Option<T>>,
}

impl<T> Table<T> {
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn get(&self, id: u32) -> Option<&T> {
        self.rows.get(id as usize)?.as_ref()
    }

    pub fn insert(&mut self, id: u32, row: T) {
        let index = id as usize;
        if self.rows.len() <= index {
            self.rows.resize_with(index + 1, || None);
        }
        self.rows[index] = Some(row);
    }

    /// Present rows with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(id, row)| Some((u32::try_from(id).ok()?, row.as_ref()?)))
    }

    pub fn len(&self) -> usize {
        self.rows.iter().filter(|row| row.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(u32, T)> for Table<T> {
    fn from_iter<I: IntoIterator<Item = (u32, T)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (id, row) in iter {
            table.insert(id, row);
        }
        table
    }
}

/// Read-only access to the game database.
///
/// Lookups return `None` for unknown ids; callers treat that as "invalid"
/// (dropped action, ignored effect) except at battle setup.
pub trait DataOracle: Send + Sync {
    fn skill(&self, id: u32) -> Option<&SkillData>;
    fn item(&self, id: u32) -> Option<&ItemData>;
    fn weapon(&self, id: u32) -> Option<&WeaponData>;
    fn armor(&self, id: u32) -> Option<&ArmorData>;
    fn state(&self, id: u32) -> Option<&StateData>;
    fn enemy(&self, id: u32) -> Option<&EnemyData>;
    fn troop(&self, id: u32) -> Option<&TroopData>;
    fn class(&self, id: u32) -> Option<&ClassData>;
    fn actor(&self, id: u32) -> Option<&ActorData>;
    fn system(&self) -> &SystemData;
}

/// In-memory database holding every table.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Database {
    pub actors: Table<ActorData>,
    pub classes: Table<ClassData>,
    pub skills: Table<SkillData>,
    pub items: Table<ItemData>,
    pub weapons: Table<WeaponData>,
    pub armors: Table<ArmorData>,
    pub states: Table<StateData>,
    pub enemies: Table<EnemyData>,
    pub troops: Table<TroopData>,
    pub system: SystemData,
}

impl DataOracle for Database {
    fn skill(&self, id: u32) -> Option<&SkillData> {
        self.skills.get(id)
    }

    fn item(&self, id: u32) -> Option<&ItemData> {
        self.items.get(id)
    }

    fn weapon(&self, id: u32) -> Option<&WeaponData> {
        self.weapons.get(id)
    }

    fn armor(&self, id: u32) -> Option<&ArmorData> {
        self.armors.get(id)
    }

    fn state(&self, id: u32) -> Option<&StateData> {
        self.states.get(id)
    }

    fn enemy(&self, id: u32) -> Option<&EnemyData> {
        self.enemies.get(id)
    }

    fn troop(&self, id: u32) -> Option<&TroopData> {
        self.troops.get(id)
    }

    fn class(&self, id: u32) -> Option<&ClassData> {
        self.classes.get(id)
    }

    fn actor(&self, id: u32) -> Option<&ActorData> {
        self.actors.get(id)
    }

    fn system(&self) -> &SystemData {
        &self.system
    }
}
