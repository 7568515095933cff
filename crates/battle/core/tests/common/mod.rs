//! Shared world for the integration tests, built only through the public API.
#![allow(dead_code)]

use battle_core::data::{
    ActorData, ClassData, Damage, DamageType, Effect, EffectCode, EnemyAction, EnemyData,
    HitType, Learning, SkillData, StateData, Trait, TraitCode, TroopData, TroopMember,
};
use battle_core::{
    BattleConfig, BattleEnv, DamageFormula, Database, GameVariables, Party, PcgRng,
};

// ===== ids =====
pub const ALICE: u32 = 1;
pub const BOB: u32 = 2;
/// Resists [`POISON`].
pub const WARDEN: u32 = 3;

pub const SPARK: u32 = 3;

pub const STUN: u32 = 2;
pub const POISON: u32 = 3;
/// Lasts anywhere between two and five turns.
pub const BLEED: u32 = 4;

pub const DUMMY: u32 = 1;
pub const WEAKLING: u32 = 2;
pub const SLIME: u32 = 3;

pub const DUMMY_TROOP: u32 = 1;
pub const WEAKLING_TROOP: u32 = 2;
pub const SLIME_TRIO: u32 = 3;

pub const MAX_LEVEL: i32 = 5;
pub const SEED: u64 = 0x5EED;

/// Everything a [`BattleEnv`] borrows, seeded deterministically.
pub struct World {
    pub database: Database,
    pub rng: PcgRng,
    pub variables: GameVariables,
    pub config: BattleConfig,
}

impl World {
    pub fn new() -> Self {
        Self::with_seed(SEED)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            database: database(),
            rng: PcgRng::new(seed),
            variables: GameVariables::new(),
            config: BattleConfig::new(),
        }
    }

    pub fn env(&self) -> BattleEnv<'_> {
        BattleEnv::new(&self.database, &self.rng, &self.variables, &self.config)
    }

    pub fn party(&self, actor_ids: &[u32]) -> Party {
        Party::setup(&self.env(), actor_ids).expect("party")
    }
}

fn flat_params(values: [i32; 8]) -> Vec<Vec<i32>> {
    let levels = (MAX_LEVEL + 1) as usize;
    values.iter().map(|&v| vec![v; levels]).collect()
}

fn certain_hit() -> Trait {
    Trait::new(TraitCode::XParam, 0, 1.0)
}

fn database() -> Database {
    let mut db = Database::default();

    // ===== classes and actors =====
    db.classes.insert(
        1,
        ClassData {
            id: 1,
            name: "Fighter".into(),
            params: flat_params([300, 30, 50, 0, 10, 10, 10, 10]),
            learnings: vec![Learning { level: 2, skill_id: SPARK }],
            traits: vec![certain_hit()],
            ..ClassData::default()
        },
    );
    for (id, name, traits) in [
        (ALICE, "Alice", Vec::new()),
        (BOB, "Bob", Vec::new()),
        (WARDEN, "Warden", vec![Trait::new(TraitCode::StateResist, POISON, 0.0)]),
    ] {
        db.actors.insert(
            id,
            ActorData {
                id,
                name: name.into(),
                class_id: 1,
                max_level: MAX_LEVEL,
                traits,
                ..ActorData::default()
            },
        );
    }

    // ===== skills =====
    db.skills.insert(
        BattleConfig::ATTACK_SKILL_ID,
        SkillData {
            id: BattleConfig::ATTACK_SKILL_ID,
            name: "Attack".into(),
            hit_type: HitType::Physical,
            damage: Damage {
                kind: DamageType::HpDamage,
                element_id: -1,
                formula: DamageFormula::new("a.atk * 4 - b.def * 2"),
                variance: 0,
                critical: true,
            },
            effects: vec![Effect::new(EffectCode::AddState, 0, 1.0, 0.0)],
            ..SkillData::default()
        },
    );
    db.skills.insert(
        BattleConfig::GUARD_SKILL_ID,
        SkillData {
            id: BattleConfig::GUARD_SKILL_ID,
            name: "Guard".into(),
            ..SkillData::default()
        },
    );
    db.skills.insert(
        SPARK,
        SkillData {
            id: SPARK,
            name: "Spark".into(),
            ..SkillData::default()
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
            ..StateData::default()
        },
    );
    db.states.insert(
        STUN,
        StateData {
            id: STUN,
            name: "Stun".into(),
            priority: 60,
            min_turns: 2,
            max_turns: 2,
            ..StateData::default()
        },
    );
    db.states.insert(
        POISON,
        StateData {
            id: POISON,
            name: "Poison".into(),
            priority: 50,
            ..StateData::default()
        },
    );
    db.states.insert(
        BLEED,
        StateData {
            id: BLEED,
            name: "Bleed".into(),
            priority: 40,
            min_turns: 2,
            max_turns: 5,
            ..StateData::default()
        },
    );

    // ===== enemies and troops =====
    let enemy = |id: u32, name: &str, mhp: i32, exp: i32| EnemyData {
        id,
        name: name.into(),
        params: [mhp, 0, 10, 0, 10, 10, 20, 10],
        exp,
        gold: 10,
        actions: vec![EnemyAction::default()],
        ..EnemyData::default()
    };
    db.enemies.insert(DUMMY, enemy(DUMMY, "Dummy", 500, 5));
    db.enemies.insert(WEAKLING, enemy(WEAKLING, "Weakling", 150, 100));
    db.enemies.insert(SLIME, enemy(SLIME, "Slime", 80, 3));

    let troop = |id: u32, name: &str, enemy_id: u32, count: usize| TroopData {
        id,
        name: name.into(),
        members: vec![
            TroopMember {
                enemy_id,
                ..TroopMember::default()
            };
            count
        ],
        ..TroopData::default()
    };
    db.troops.insert(DUMMY_TROOP, troop(DUMMY_TROOP, "Dummy", DUMMY, 1));
    db.troops.insert(WEAKLING_TROOP, troop(WEAKLING_TROOP, "Weakling", WEAKLING, 1));
    db.troops.insert(SLIME_TRIO, troop(SLIME_TRIO, "Slime*3", SLIME, 3));
    db
}
