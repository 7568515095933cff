use std::collections::BTreeMap;

use crate::battler::DropReward;
use crate::config::BattleConfig;
use crate::data::{EquipItem, ItemData};

/// Party item bag: counts per item, weapon and armor id, each in
/// `0..=MAX_ITEMS`. Zero counts are not stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Inventory {
    items: BTreeMap<u32, i32>,
    weapons: BTreeMap<u32, i32>,
    armors: BTreeMap<u32, i32>,
}

fn gain(container: &mut BTreeMap<u32, i32>, id: u32, amount: i32) {
    let count = container.get(&id).copied().unwrap_or(0) + amount;
    let count = count.clamp(0, BattleConfig::MAX_ITEMS);
    if count == 0 {
        container.remove(&id);
    } else {
        container.insert(id, count);
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> impl Iterator<Item = (u32, i32)> + '_ {
        self.items.iter().map(|(&id, &n)| (id, n))
    }

    pub fn num_items(&self, item_id: u32) -> i32 {
        self.items.get(&item_id).copied().unwrap_or(0)
    }

    pub fn has_item(&self, item_id: u32) -> bool {
        self.num_items(item_id) > 0
    }

    pub fn has_max_items(&self, item_id: u32) -> bool {
        self.num_items(item_id) >= BattleConfig::MAX_ITEMS
    }

    pub fn gain_item(&mut self, item_id: u32, amount: i32) {
        gain(&mut self.items, item_id, amount);
    }

    pub fn lose_item(&mut self, item_id: u32, amount: i32) {
        gain(&mut self.items, item_id, -amount);
    }

    /// Uses up one of a consumable item; other items are kept.
    pub fn consume_item(&mut self, item: &ItemData) {
        if item.consumable {
            self.lose_item(item.id, 1);
        }
    }

    fn equip_container(&self, item: EquipItem) -> &BTreeMap<u32, i32> {
        match item {
            EquipItem::Weapon(_) => &self.weapons,
            EquipItem::Armor(_) => &self.armors,
        }
    }

    pub fn num_equip(&self, item: EquipItem) -> i32 {
        self.equip_container(item)
            .get(&item.id())
            .copied()
            .unwrap_or(0)
    }

    pub fn has_equip(&self, item: EquipItem) -> bool {
        self.num_equip(item) > 0
    }

    pub fn gain_equip(&mut self, item: EquipItem, amount: i32) {
        match item {
            EquipItem::Weapon(id) => gain(&mut self.weapons, id, amount),
            EquipItem::Armor(id) => gain(&mut self.armors, id, amount),
        }
    }

    pub fn lose_equip(&mut self, item: EquipItem, amount: i32) {
        self.gain_equip(item, -amount);
    }

    pub fn gain_drop(&mut self, drop: DropReward) {
        match drop {
            DropReward::Item(id) => self.gain_item(id, 1),
            DropReward::Equip(item) => self.gain_equip(item, 1),
        }
    }
}
