//! Static game data records.
//!
//! These mirror the editor's JSON tables (skills, items, weapons, armors,
//! states, enemies, troops, classes, actors, system). They are read-only
//! during a battle and are reached through [`crate::env::DataOracle`].
//! Field names follow the JSON files (`camelCase`) so tables deserialize
//! directly; numeric codes become enums at the deserialization boundary.

/// Declares a data enum stored as a small integer in the JSON tables.
macro_rules! data_code {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
        #[repr(u8)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value, )+
        }

        impl TryFrom<u8> for $name {
            type Error = $crate::data::UnknownCode;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $( $value => Ok(Self::$variant), )+
                    code => Err($crate::data::UnknownCode {
                        kind: stringify!($name),
                        code,
                    }),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value as u8
            }
        }
    };
}

mod actor;
mod effect;
mod enemy;
mod equip;
mod state;
mod system;
mod traits;
mod troop;
mod usable;

pub use actor::{ActorData, ClassData, Learning};
pub use effect::{Effect, EffectCode, SPECIAL_EFFECT_ESCAPE};
pub use enemy::{ConditionType, DropItem, DropKind, EnemyAction, EnemyData};
pub use equip::{ArmorData, EquipItem, WeaponData};
pub use state::{AutoRemovalTiming, StateData};
pub use system::{Messages, SystemData, Terms, format_message};
pub use traits::{PartyAbilities, SpecialFlags, Trait, TraitCode};
pub use troop::{PageConditions, PageSpan, TroopData, TroopMember, TroopPage};
pub use usable::{Damage, DamageType, HitType, ItemData, Occasion, Scope, SkillData, UsableItem};

/// A numeric code in a data table has no matching variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} code {code}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: u8,
}
