use super::Trait;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct WeaponData {
    pub id: u32,
    pub name: String,
    pub wtype_id: u32,
    pub etype_id: u32,
    pub animation_id: i32,
    pub price: i32,
    pub params: [i32; 8],
    pub traits: Vec<Trait>,
}

impl Default for WeaponData {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            wtype_id: 0,
            etype_id: 1,
            animation_id: 0,
            price: 0,
            params: [0; 8],
            traits: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct ArmorData {
    pub id: u32,
    pub name: String,
    pub atype_id: u32,
    pub etype_id: u32,
    pub price: i32,
    pub params: [i32; 8],
    pub traits: Vec<Trait>,
}

/// Reference to an equipped weapon or armor by id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EquipItem {
    Weapon(u32),
    Armor(u32),
}

impl EquipItem {
    pub const fn is_weapon(&self) -> bool {
        matches!(self, Self::Weapon(_))
    }

    pub const fn id(&self) -> u32 {
        match self {
            Self::Weapon(id) | Self::Armor(id) => *id,
        }
    }
}
