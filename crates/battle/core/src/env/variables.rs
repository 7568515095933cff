/// Game variables (`v[n]` in damage formulas) and switches read by enemy
/// action conditions and troop pages.
pub trait VariableOracle: Send + Sync {
    /// Value of variable `id`; unset variables read 0.
    fn variable(&self, id: u32) -> f64;

    fn switch(&self, id: u32) -> bool;
}

/// Plain variable and switch storage.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameVariables {
    variables: Vec<f64>,
    switches: Vec<bool>,
}

impl GameVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_variable(&mut self, id: u32, value: f64) {
        let index = id as usize;
        if self.variables.len() <= index {
            self.variables.resize(index + 1, 0.0);
        }
        self.variables[index] = value;
    }

    pub fn set_switch(&mut self, id: u32, value: bool) {
        let index = id as usize;
        if self.switches.len() <= index {
            self.switches.resize(index + 1, false);
        }
        self.switches[index] = value;
    }
}

impl VariableOracle for GameVariables {
    fn variable(&self, id: u32) -> f64 {
        self.variables.get(id as usize).copied().unwrap_or(0.0)
    }

    fn switch(&self, id: u32) -> bool {
        self.switches.get(id as usize).copied().unwrap_or(false)
    }
}
