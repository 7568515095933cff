/// Outcome of the last action applied to a battler.
///
/// Cleared and refilled on every apply; the controller and the log read it
/// right after the apply that produced it.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ActionResult {
    pub used: bool,
    pub missed: bool,
    pub evaded: bool,
    pub physical: bool,
    pub drain: bool,
    pub critical: bool,
    pub success: bool,
    pub hp_affected: bool,
    pub hp_damage: i32,
    pub mp_damage: i32,
    pub tp_damage: i32,
    pub added_states: Vec<u32>,
    pub removed_states: Vec<u32>,
    pub added_buffs: Vec<usize>,
    pub added_debuffs: Vec<usize>,
    pub removed_buffs: Vec<usize>,
}

impl ActionResult {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_status_affected(&self) -> bool {
        !self.added_states.is_empty()
            || !self.removed_states.is_empty()
            || !self.added_buffs.is_empty()
            || !self.added_debuffs.is_empty()
            || !self.removed_buffs.is_empty()
    }

    pub const fn is_hit(&self) -> bool {
        self.used && !self.missed && !self.evaded
    }

    pub fn is_state_added(&self, state_id: u32) -> bool {
        self.added_states.contains(&state_id)
    }

    pub fn push_added_state(&mut self, state_id: u32) {
        if !self.is_state_added(state_id) {
            self.added_states.push(state_id);
        }
    }

    pub fn is_state_removed(&self, state_id: u32) -> bool {
        self.removed_states.contains(&state_id)
    }

    pub fn push_removed_state(&mut self, state_id: u32) {
        if !self.is_state_removed(state_id) {
            self.removed_states.push(state_id);
        }
    }

    pub fn is_buff_added(&self, param_id: usize) -> bool {
        self.added_buffs.contains(&param_id)
    }

    pub fn push_added_buff(&mut self, param_id: usize) {
        if !self.is_buff_added(param_id) {
            self.added_buffs.push(param_id);
        }
    }

    pub fn is_debuff_added(&self, param_id: usize) -> bool {
        self.added_debuffs.contains(&param_id)
    }

    pub fn push_added_debuff(&mut self, param_id: usize) {
        if !self.is_debuff_added(param_id) {
            self.added_debuffs.push(param_id);
        }
    }

    pub fn is_buff_removed(&self, param_id: usize) -> bool {
        self.removed_buffs.contains(&param_id)
    }

    pub fn push_removed_buff(&mut self, param_id: usize) {
        if !self.is_buff_removed(param_id) {
            self.removed_buffs.push(param_id);
        }
    }
}
