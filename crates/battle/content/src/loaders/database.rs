//! Database loader for editor JSON exports.
//!
//! Every table is a JSON array whose slot 0 is `null` and whose slot `n`
//! holds the record with id `n`. `System.json` is a single object.

use std::path::Path;

use battle_core::data::{
    ActorData, ArmorData, ClassData, EnemyData, ItemData, SkillData, StateData, SystemData,
    TroopData, WeaponData,
};
use battle_core::env::Table;
use battle_core::{DamageFormula, Database};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::loaders::{LoadResult, read_file};

/// A record that knows its own id.
trait Record {
    fn id(&self) -> u32;
}

macro_rules! impl_record {
    ($($ty:ty),+ $(,)?) => {
        $(impl Record for $ty {
            fn id(&self) -> u32 {
                self.id
            }
        })+
    };
}

impl_record!(
    ActorData, ClassData, SkillData, ItemData, WeaponData, ArmorData, StateData, EnemyData,
    TroopData,
);

/// Loader for the full database from a directory of JSON tables.
pub struct DatabaseLoader;

impl DatabaseLoader {
    pub const ACTORS: &'static str = "Actors.json";
    pub const CLASSES: &'static str = "Classes.json";
    pub const SKILLS: &'static str = "Skills.json";
    pub const ITEMS: &'static str = "Items.json";
    pub const WEAPONS: &'static str = "Weapons.json";
    pub const ARMORS: &'static str = "Armors.json";
    pub const STATES: &'static str = "States.json";
    pub const ENEMIES: &'static str = "Enemies.json";
    pub const TROOPS: &'static str = "Troops.json";
    pub const SYSTEM: &'static str = "System.json";

    /// Load every table from `dir`.
    ///
    /// Fails when a file is missing, malformed, or stores a record under a
    /// slot that does not match its id. Damage formulas that do not compile
    /// are only logged; they evaluate to zero damage in battle.
    pub fn load(dir: &Path) -> LoadResult<Database> {
        let database = Database {
            actors: load_table(dir, Self::ACTORS)?,
            classes: load_table(dir, Self::CLASSES)?,
            skills: load_table(dir, Self::SKILLS)?,
            items: load_table(dir, Self::ITEMS)?,
            weapons: load_table(dir, Self::WEAPONS)?,
            armors: load_table(dir, Self::ARMORS)?,
            states: load_table(dir, Self::STATES)?,
            enemies: load_table(dir, Self::ENEMIES)?,
            troops: load_table(dir, Self::TROOPS)?,
            system: load_json::<SystemData>(&dir.join(Self::SYSTEM))?,
        };

        for (id, skill) in database.skills.iter() {
            check_formula(Self::SKILLS, id, &skill.damage.formula);
        }
        for (id, item) in database.items.iter() {
            check_formula(Self::ITEMS, id, &item.damage.formula);
        }

        debug!(
            actors = database.actors.len(),
            skills = database.skills.len(),
            items = database.items.len(),
            enemies = database.enemies.len(),
            troops = database.troops.len(),
            "database loaded from {}",
            dir.display()
        );
        Ok(database)
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> LoadResult<T> {
    let content = read_file(path)?;
    serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))
}

fn load_table<T: DeserializeOwned + Record>(dir: &Path, file: &str) -> LoadResult<Table<T>> {
    let table: Table<T> = load_json(&dir.join(file))?;
    if let Some((slot, row)) = table.iter().find(|(slot, row)| *slot != row.id()) {
        anyhow::bail!("{}: slot {} holds a record with id {}", file, slot, row.id());
    }
    Ok(table)
}

fn check_formula(file: &str, id: u32, formula: &DamageFormula) {
    if let Err(err) = formula.expr() {
        warn!(file, id, formula = formula.source(), %err, "damage formula does not compile");
    }
}
