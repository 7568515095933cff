/// Battle rule constants and tunable options.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleConfig {
    /// Slip damage (negative HP regeneration) may bring HP to zero.
    pub slip_death: bool,
    /// Party members outside the battle line still receive victory experience.
    pub bench_exp: bool,
    /// Use full-width letters when disambiguating duplicate enemy names.
    pub cjk_letters: bool,
    /// Battle started from the editor test mode: battle end exits instead of
    /// returning to the map.
    pub battle_test: bool,
}

impl BattleConfig {
    // ===== fixed rule constants =====
    pub const MAX_BATTLE_MEMBERS: usize = 4;
    pub const MAX_TP: i32 = 100;
    pub const MAX_BUFF_LEVEL: i32 = 2;
    pub const BUFF_COUNT: usize = 8;
    pub const DEATH_STATE_ID: u32 = 1;
    pub const ATTACK_SKILL_ID: u32 = 1;
    pub const GUARD_SKILL_ID: u32 = 2;
    pub const BARE_HANDS_ELEMENT_ID: i32 = 1;
    pub const MAX_GOLD: i64 = 99_999_999;
    pub const MAX_ITEMS: i32 = 99;
    /// Escape ratio gained after every failed escape attempt.
    pub const ESCAPE_RATIO_STEP: f64 = 0.1;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_SLIP_DEATH: bool = false;
    pub const DEFAULT_BENCH_EXP: bool = false;

    pub fn new() -> Self {
        Self {
            slip_death: Self::DEFAULT_SLIP_DEATH,
            bench_exp: Self::DEFAULT_BENCH_EXP,
            cjk_letters: false,
            battle_test: false,
        }
    }

    #[must_use]
    pub fn with_slip_death(mut self, slip_death: bool) -> Self {
        self.slip_death = slip_death;
        self
    }

    #[must_use]
    pub fn with_bench_exp(mut self, bench_exp: bool) -> Self {
        self.bench_exp = bench_exp;
        self
    }

    #[must_use]
    pub fn with_cjk_letters(mut self, cjk_letters: bool) -> Self {
        self.cjk_letters = cjk_letters;
        self
    }

    #[must_use]
    pub fn with_battle_test(mut self, battle_test: bool) -> Self {
        self.battle_test = battle_test;
        self
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}
