//! Hand-built database and scripted randomness for unit tests.

use crate::config::BattleConfig;
use crate::data::{
    ActorData, AutoRemovalTiming, ClassData, Damage, DamageType, Effect, EffectCode, EnemyAction,
    EnemyData, HitType, ItemData, Learning, Occasion, Scope, SkillData, StateData, Trait,
    TraitCode, TroopData, TroopMember, WeaponData,
};
use crate::env::{BattleEnv, Database, GameVariables, ScriptedRng};
use crate::formula::DamageFormula;
use crate::unit::{Combatants, Inventory, Party, Troop};

/// Owns everything a [`BattleEnv`] borrows.
pub(crate) struct Fixture {
    pub database: Database,
    pub variables: GameVariables,
    pub config: BattleConfig,
    pub rng: ScriptedRng,
    pub inventory: Inventory,
}

impl Fixture {
    // ===== actors =====
    pub const HERO: u32 = 1;
    pub const MAGE: u32 = 2;
    pub const AUTO_KNIGHT: u32 = 3;

    // ===== skills and items =====
    pub const FIRE: u32 = 3;
    pub const HEAL: u32 = 4;
    pub const BROKEN: u32 = 5;
    pub const DRAIN: u32 = 6;
    pub const POISON_TOUCH: u32 = 7;
    pub const POTION: u32 = 1;
    pub const REVIVE_ITEM: u32 = 2;
    pub const SWORD: u32 = 1;

    // ===== states =====
    pub const GUARD_STATE: u32 = 2;
    pub const CONFUSED_STATE: u32 = 3;
    pub const POISON_STATE: u32 = 4;

    // ===== enemies and troops =====
    pub const SLIME: u32 = 1;
    pub const BAT: u32 = 2;
    pub const LONE_SLIME: u32 = 1;
    pub const SLIME_TRIO: u32 = 2;
    pub const LONE_BAT: u32 = 3;

    const MAX_LEVEL: i32 = 10;
    const FALLBACK_ROLL: f64 = 0.5;

    /// Every draw returns 0.5: normal hit rates always hit, evasion and
    /// criticals never trigger.
    pub fn new() -> Self {
        Self::with_rolls(&[])
    }

    /// Replays `rolls` first, then falls back to 0.5.
    pub fn with_rolls(rolls: &[f64]) -> Self {
        Self {
            database: database(),
            variables: GameVariables::new(),
            config: BattleConfig::new(),
            rng: ScriptedRng::new(rolls.iter().copied()).with_fallback(Self::FALLBACK_ROLL),
            inventory: Inventory::default(),
        }
    }

    pub fn env(&self) -> BattleEnv<'_> {
        BattleEnv::new(&self.database, &self.rng, &self.variables, &self.config)
    }

    /// The troop as set up before battle start; no draws are consumed.
    pub fn troop(&self, env: &BattleEnv<'_>, troop_id: u32) -> Troop {
        Troop::setup(env, troop_id).expect("fixture troop")
    }

    /// Hero and mage against `troop_id`, outside battle.
    pub fn combatants(&self, env: &BattleEnv<'_>, troop_id: u32) -> Combatants {
        let party = Party::setup(env, &[Self::HERO, Self::MAGE]).expect("fixture party");
        Combatants::new(party, self.troop(env, troop_id))
    }
}

fn trait_(code: TraitCode, data_id: u32, value: f64) -> Trait {
    Trait::new(code, data_id, value)
}

/// Hit 95%, evasion 5%, critical 4%.
fn base_rates() -> Vec<Trait> {
    vec![
        trait_(TraitCode::XParam, 0, 0.95),
        trait_(TraitCode::XParam, 1, 0.05),
        trait_(TraitCode::XParam, 2, 0.04),
    ]
}

/// Same params at every level.
fn flat_params(values: [i32; 8]) -> Vec<Vec<i32>> {
    let levels = (Fixture::MAX_LEVEL + 1) as usize;
    values.iter().map(|&v| vec![v; levels]).collect()
}

fn damage(kind: DamageType, formula: &str, element_id: i32, variance: i32, critical: bool) -> Damage {
    Damage {
        kind,
        element_id,
        formula: DamageFormula::new(formula),
        variance,
        critical,
    }
}

fn database() -> Database {
    let mut db = Database::default();

    // ===== classes and actors =====
    let mut swordsman = base_rates();
    swordsman.push(trait_(TraitCode::EquipWtype, 1, 0.0));
    db.classes.insert(
        1,
        ClassData {
            id: 1,
            name: "Swordsman".into(),
            params: flat_params([200, 40, 20, 10, 10, 10, 12, 10]),
            learnings: vec![
                Learning { level: 1, skill_id: Fixture::FIRE },
                Learning { level: 3, skill_id: Fixture::HEAL },
            ],
            traits: swordsman.clone(),
            ..ClassData::default()
        },
    );
    db.classes.insert(
        2,
        ClassData {
            id: 2,
            name: "Mage".into(),
            params: flat_params([150, 100, 8, 8, 25, 20, 10, 10]),
            learnings: vec![Learning { level: 1, skill_id: Fixture::FIRE }],
            traits: base_rates(),
            ..ClassData::default()
        },
    );
    db.classes.insert(
        3,
        ClassData {
            id: 3,
            name: "Knight".into(),
            params: flat_params([220, 0, 20, 14, 5, 8, 9, 10]),
            traits: swordsman,
            ..ClassData::default()
        },
    );
    db.actors.insert(
        Fixture::HERO,
        ActorData {
            id: Fixture::HERO,
            name: "Hero".into(),
            class_id: 1,
            max_level: Fixture::MAX_LEVEL,
            equips: vec![Fixture::SWORD, 0, 0, 0, 0],
            ..ActorData::default()
        },
    );
    db.actors.insert(
        Fixture::MAGE,
        ActorData {
            id: Fixture::MAGE,
            name: "Mage".into(),
            class_id: 2,
            max_level: Fixture::MAX_LEVEL,
            ..ActorData::default()
        },
    );
    db.actors.insert(
        Fixture::AUTO_KNIGHT,
        ActorData {
            id: Fixture::AUTO_KNIGHT,
            name: "Knight".into(),
            class_id: 3,
            max_level: Fixture::MAX_LEVEL,
            equips: vec![Fixture::SWORD, 0, 0, 0, 0],
            traits: vec![trait_(TraitCode::SpecialFlag, 0, 1.0)],
            ..ActorData::default()
        },
    );
    db.weapons.insert(
        Fixture::SWORD,
        WeaponData {
            id: Fixture::SWORD,
            name: "Sword".into(),
            wtype_id: 1,
            animation_id: 6,
            params: [0, 0, 10, 0, 0, 0, 0, 0],
            traits: vec![trait_(TraitCode::AttackElement, 2, 0.0)],
            ..WeaponData::default()
        },
    );

    // ===== skills =====
    db.skills.insert(
        BattleConfig::ATTACK_SKILL_ID,
        SkillData {
            id: BattleConfig::ATTACK_SKILL_ID,
            name: "Attack".into(),
            tp_gain: 5,
            animation_id: -1,
            hit_type: HitType::Physical,
            damage: damage(DamageType::HpDamage, "a.atk * 4 - b.def * 2", -1, 20, true),
            effects: vec![Effect::new(EffectCode::AddState, 0, 1.0, 0.0)],
            ..SkillData::default()
        },
    );
    db.skills.insert(
        BattleConfig::GUARD_SKILL_ID,
        SkillData {
            id: BattleConfig::GUARD_SKILL_ID,
            name: "Guard".into(),
            scope: Scope::User,
            speed: 2000,
            effects: vec![Effect::new(EffectCode::AddState, Fixture::GUARD_STATE, 1.0, 0.0)],
            ..SkillData::default()
        },
    );
    db.skills.insert(
        Fixture::FIRE,
        SkillData {
            id: Fixture::FIRE,
            name: "Fire".into(),
            stype_id: 1,
            mp_cost: 5,
            scope: Scope::AllEnemies,
            hit_type: HitType::Magical,
            damage: damage(DamageType::HpDamage, "100 + a.mat * 2 - b.mdf * 2", 2, 20, false),
            ..SkillData::default()
        },
    );
    db.skills.insert(
        Fixture::HEAL,
        SkillData {
            id: Fixture::HEAL,
            name: "Heal".into(),
            stype_id: 1,
            mp_cost: 5,
            scope: Scope::OneAlly,
            occasion: Occasion::Always,
            damage: damage(DamageType::HpRecover, "100", 0, 0, false),
            ..SkillData::default()
        },
    );
    db.skills.insert(
        Fixture::BROKEN,
        SkillData {
            id: Fixture::BROKEN,
            name: "Broken".into(),
            damage: damage(DamageType::HpDamage, "a.unknown * 2", 0, 0, false),
            ..SkillData::default()
        },
    );
    db.skills.insert(
        Fixture::DRAIN,
        SkillData {
            id: Fixture::DRAIN,
            name: "Drain".into(),
            damage: damage(DamageType::HpDrain, "30", 0, 0, false),
            ..SkillData::default()
        },
    );
    db.skills.insert(
        Fixture::POISON_TOUCH,
        SkillData {
            id: Fixture::POISON_TOUCH,
            name: "Poison Touch".into(),
            effects: vec![Effect::new(EffectCode::AddState, Fixture::POISON_STATE, 1.0, 0.0)],
            ..SkillData::default()
        },
    );

    // ===== items =====
    db.items.insert(
        Fixture::POTION,
        ItemData {
            id: Fixture::POTION,
            name: "Potion".into(),
            effects: vec![Effect::new(EffectCode::RecoverHp, 0, 0.0, 50.0)],
            ..ItemData::default()
        },
    );
    db.items.insert(
        Fixture::REVIVE_ITEM,
        ItemData {
            id: Fixture::REVIVE_ITEM,
            name: "Revive".into(),
            scope: Scope::OneDeadAlly,
            effects: vec![
                Effect::new(EffectCode::RemoveState, BattleConfig::DEATH_STATE_ID, 1.0, 0.0),
                Effect::new(EffectCode::RecoverHp, 0, 0.1, 0.0),
            ],
            ..ItemData::default()
        },
    );

    // ===== states =====
    db.states.insert(
        BattleConfig::DEATH_STATE_ID,
        StateData {
            id: BattleConfig::DEATH_STATE_ID,
            name: "Knockout".into(),
            restriction: 4,
            priority: 100,
            message1: " has fallen!".into(),
            message2: " is slain!".into(),
            message4: " revives!".into(),
            ..StateData::default()
        },
    );
    db.states.insert(
        Fixture::GUARD_STATE,
        StateData {
            id: Fixture::GUARD_STATE,
            name: "Guard".into(),
            priority: 0,
            auto_removal_timing: AutoRemovalTiming::TurnEnd,
            remove_at_battle_end: true,
            traits: vec![trait_(TraitCode::SpecialFlag, 1, 0.0)],
            ..StateData::default()
        },
    );
    db.states.insert(
        Fixture::CONFUSED_STATE,
        StateData {
            id: Fixture::CONFUSED_STATE,
            name: "Confusion".into(),
            restriction: 3,
            priority: 70,
            min_turns: 2,
            max_turns: 4,
            auto_removal_timing: AutoRemovalTiming::ActionEnd,
            remove_at_battle_end: true,
            message1: " is confused!".into(),
            message2: " is confused!".into(),
            message4: " is no longer confused.".into(),
            ..StateData::default()
        },
    );
    db.states.insert(
        Fixture::POISON_STATE,
        StateData {
            id: Fixture::POISON_STATE,
            name: "Poison".into(),
            priority: 50,
            remove_at_battle_end: true,
            message1: " is poisoned!".into(),
            message2: " is poisoned!".into(),
            message4: " is no longer poisoned.".into(),
            traits: vec![trait_(TraitCode::XParam, 7, -0.1)],
            ..StateData::default()
        },
    );

    // ===== enemies and troops =====
    let attack_pattern = vec![EnemyAction::default()];
    db.enemies.insert(
        Fixture::SLIME,
        EnemyData {
            id: Fixture::SLIME,
            name: "Slime".into(),
            params: [150, 0, 12, 8, 5, 5, 6, 5],
            exp: 10,
            gold: 5,
            actions: attack_pattern.clone(),
            traits: base_rates(),
            ..EnemyData::default()
        },
    );
    let mut bat_traits = base_rates();
    bat_traits.push(trait_(TraitCode::ElementRate, 2, 2.0));
    db.enemies.insert(
        Fixture::BAT,
        EnemyData {
            id: Fixture::BAT,
            name: "Bat".into(),
            params: [90, 0, 14, 6, 5, 5, 15, 5],
            exp: 8,
            gold: 4,
            actions: attack_pattern,
            traits: bat_traits,
            ..EnemyData::default()
        },
    );
    let member = |enemy_id| TroopMember {
        enemy_id,
        ..TroopMember::default()
    };
    db.troops.insert(
        Fixture::LONE_SLIME,
        TroopData {
            id: Fixture::LONE_SLIME,
            name: "Slime".into(),
            members: vec![member(Fixture::SLIME)],
            ..TroopData::default()
        },
    );
    db.troops.insert(
        Fixture::SLIME_TRIO,
        TroopData {
            id: Fixture::SLIME_TRIO,
            name: "Slime*3".into(),
            members: vec![member(Fixture::SLIME); 3],
            ..TroopData::default()
        },
    );
    db.troops.insert(
        Fixture::LONE_BAT,
        TroopData {
            id: Fixture::LONE_BAT,
            name: "Bat".into(),
            members: vec![member(Fixture::BAT)],
            ..TroopData::default()
        },
    );
    db
}
