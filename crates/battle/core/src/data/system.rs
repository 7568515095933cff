//! System table: equipment slots, magic skill types and message terms.

use core::fmt::Display;

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct SystemData {
    pub game_title: String,
    pub currency_unit: String,
    /// Equipment slot names; index 0 is unused, slot ids start at 1.
    pub equip_types: Vec<String>,
    pub elements: Vec<String>,
    /// Skill types whose skills are treated as magic.
    pub magic_skills: Vec<u32>,
    pub terms: Terms,
}

impl Default for SystemData {
    fn default() -> Self {
        Self {
            game_title: String::new(),
            currency_unit: "G".into(),
            equip_types: ["", "Weapon", "Shield", "Head", "Body", "Accessory"]
                .map(String::from)
                .to_vec(),
            elements: Vec::new(),
            magic_skills: vec![1],
            terms: Terms::default(),
        }
    }
}

impl SystemData {
    /// Slot ids (1-based equip types) in slot order.
    pub fn equip_slots(&self) -> Vec<u32> {
        (1..self.equip_types.len())
            .filter_map(|id| u32::try_from(id).ok())
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct Terms {
    /// Level, Lv, HP, HP (abbr), MP, MP (abbr), TP, TP (abbr), EXP, EXP (abbr).
    pub basic: Vec<String>,
    pub params: Vec<String>,
    pub messages: Messages,
}

impl Default for Terms {
    fn default() -> Self {
        Self {
            basic: ["Level", "Lv", "HP", "HP", "MP", "MP", "TP", "TP", "EXP", "EXP"]
                .map(String::from)
                .to_vec(),
            params: [
                "Max HP",
                "Max MP",
                "Attack",
                "Defense",
                "M.Attack",
                "M.Defense",
                "Agility",
                "Luck",
                "Hit",
                "Evasion",
            ]
            .map(String::from)
            .to_vec(),
            messages: Messages::default(),
        }
    }
}

impl Terms {
    fn basic(&self, index: usize) -> &str {
        self.basic.get(index).map_or("", String::as_str)
    }

    pub fn level(&self) -> &str {
        self.basic(0)
    }

    pub fn hp(&self) -> &str {
        self.basic(2)
    }

    pub fn mp(&self) -> &str {
        self.basic(4)
    }

    pub fn tp(&self) -> &str {
        self.basic(6)
    }

    pub fn exp(&self) -> &str {
        self.basic(8)
    }

    pub fn param(&self, param_id: usize) -> &str {
        self.params.get(param_id).map_or("", String::as_str)
    }
}

/// Battle message templates. `%1`, `%2`, ... are substituted by
/// [`format_message`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct Messages {
    pub action_failure: String,
    pub actor_damage: String,
    pub actor_drain: String,
    pub actor_gain: String,
    pub actor_loss: String,
    pub actor_no_damage: String,
    pub actor_no_hit: String,
    pub actor_recovery: String,
    pub buff_add: String,
    pub buff_remove: String,
    pub counter_attack: String,
    pub critical_to_actor: String,
    pub critical_to_enemy: String,
    pub debuff_add: String,
    pub defeat: String,
    pub emerge: String,
    pub enemy_damage: String,
    pub enemy_drain: String,
    pub enemy_gain: String,
    pub enemy_loss: String,
    pub enemy_no_damage: String,
    pub enemy_no_hit: String,
    pub enemy_recovery: String,
    pub escape_failure: String,
    pub escape_start: String,
    pub evasion: String,
    pub level_up: String,
    pub magic_evasion: String,
    pub magic_reflection: String,
    pub obtain_exp: String,
    pub obtain_gold: String,
    pub obtain_item: String,
    pub obtain_skill: String,
    pub party_name: String,
    pub preemptive: String,
    pub substitute: String,
    pub surprise: String,
    pub use_item: String,
    pub victory: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            action_failure: "There was no effect on %1!".into(),
            actor_damage: "%1 took %2 damage!".into(),
            actor_drain: "%1 was drained of %2 %3!".into(),
            actor_gain: "%1 gained %2 %3!".into(),
            actor_loss: "%1 lost %2 %3!".into(),
            actor_no_damage: "%1 took no damage!".into(),
            actor_no_hit: "Miss! %1 took no damage!".into(),
            actor_recovery: "%1 recovered %2 %3!".into(),
            buff_add: "%1's %2 went up!".into(),
            buff_remove: "%1's %2 returned to normal!".into(),
            counter_attack: "%1 counterattacked!".into(),
            critical_to_actor: "A painful blow!!".into(),
            critical_to_enemy: "An excellent hit!!".into(),
            debuff_add: "%1's %2 went down!".into(),
            defeat: "%1 was defeated.".into(),
            emerge: "%1 emerged!".into(),
            enemy_damage: "%1 took %2 damage!".into(),
            enemy_drain: "%1 was drained of %2 %3!".into(),
            enemy_gain: "%1 gained %2 %3!".into(),
            enemy_loss: "%1 lost %2 %3!".into(),
            enemy_no_damage: "%1 took no damage!".into(),
            enemy_no_hit: "Miss! %1 took no damage!".into(),
            enemy_recovery: "%1 recovered %2 %3!".into(),
            escape_failure: "However, it was unable to escape!".into(),
            escape_start: "%1 has started to escape!".into(),
            evasion: "%1 evaded the attack!".into(),
            level_up: "%1 is now %2 %3!".into(),
            magic_evasion: "%1 nullified the magic!".into(),
            magic_reflection: "%1 reflected the magic!".into(),
            obtain_exp: "%1 %2 received!".into(),
            obtain_gold: "%1\\G found!".into(),
            obtain_item: "%1 found!".into(),
            obtain_skill: "%1 learned!".into(),
            party_name: "%1's Party".into(),
            preemptive: "%1 got the upper hand!".into(),
            substitute: "%1 protected %2!".into(),
            surprise: "%1 was surprised!".into(),
            use_item: "%1 uses %2!".into(),
            victory: "%1 was victorious!".into(),
        }
    }
}

/// Substitutes `%1`..`%9` in `template` with `args` (1-based). Unknown
/// placeholders become empty.
pub fn format_message(template: &str, args: &[&dyn Display]) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            if let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)) {
                chars.next();
                if let Some(arg) = (digit as usize).checked_sub(1).and_then(|i| args.get(i)) {
                    out.push_str(&arg.to_string());
                }
                continue;
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_positional_arguments() {
        let text = format_message("%1 is now %2 %3!", &[&"Harold", &"Level", &5]);
        assert_eq!(text, "Harold is now Level 5!");
    }

    #[test]
    fn missing_arguments_render_empty() {
        assert_eq!(format_message("%1 and %2", &[&"a"]), "a and ");
        assert_eq!(format_message("100%", &[]), "100%");
    }

    #[test]
    fn basic_terms_use_engine_layout() {
        let terms = Terms::default();
        assert_eq!(terms.hp(), "HP");
        assert_eq!(terms.exp(), "EXP");
        assert_eq!(terms.param(2), "Attack");
    }
}
