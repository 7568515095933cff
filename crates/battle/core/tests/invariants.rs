//! Property tests over random sequences of battler mutations.
mod common;

use battle_core::{Actor, BattleConfig, BattlerOps, BattlerStats, ParamId};
use common::*;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    GainHp(i32),
    GainMp(i32),
    GainTp(i32),
    AddState(u32),
    RemoveState(u32),
    Buff(usize, i32),
    Debuff(usize, i32),
    RemoveBuff(usize),
    TurnEnd,
    RecoverAll,
}

fn state_id() -> impl Strategy<Value = u32> {
    prop_oneof![
        Just(BattleConfig::DEATH_STATE_ID),
        Just(STUN),
        Just(POISON),
        Just(BLEED),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-400..400i32).prop_map(Op::GainHp),
        (-60..60i32).prop_map(Op::GainMp),
        (-150..150i32).prop_map(Op::GainTp),
        state_id().prop_map(Op::AddState),
        state_id().prop_map(Op::RemoveState),
        (0..8usize, 1..6i32).prop_map(|(p, t)| Op::Buff(p, t)),
        (0..8usize, 1..6i32).prop_map(|(p, t)| Op::Debuff(p, t)),
        (0..8usize).prop_map(Op::RemoveBuff),
        Just(Op::TurnEnd),
        Just(Op::RecoverAll),
    ]
}

fn param(index: usize) -> ParamId {
    ParamId::from_index(index).unwrap_or(ParamId::Mhp)
}

fn apply(actor: &mut Actor, world: &World, op: &Op) {
    let env = world.env();
    // Each op stands for a separate action.
    actor.clear_result();
    match *op {
        Op::GainHp(value) => actor.gain_hp(&env, value),
        Op::GainMp(value) => actor.gain_mp(&env, value),
        Op::GainTp(value) => actor.gain_tp(&env, value),
        Op::AddState(id) => {
            actor.add_state(&env, id);
        }
        Op::RemoveState(id) => actor.remove_state(&env, id),
        Op::Buff(index, turns) => actor.add_buff(&env, param(index), turns),
        Op::Debuff(index, turns) => actor.add_debuff(&env, param(index), turns),
        Op::RemoveBuff(index) => actor.remove_buff(&env, param(index)),
        Op::TurnEnd => {
            actor.update_state_turns();
            actor.update_buff_turns();
            actor.remove_buffs_auto(&env);
        }
        Op::RecoverAll => actor.recover_all(&env),
    }
}

proptest! {
    /// Vitals stay in range and zero HP always means the death state.
    #[test]
    fn prop_vitals_and_buffs_stay_in_range(seed in any::<u64>(), ops in prop::collection::vec(op(), 1..40)) {
        let world = World::with_seed(seed);
        let env = world.env();
        let mut alice = Actor::new(&env, ALICE).unwrap();
        for op in &ops {
            apply(&mut alice, &world, op);
            prop_assert!((0..=alice.mhp(&env)).contains(&alice.hp()), "{op:?}");
            prop_assert!((0..=alice.mmp(&env)).contains(&alice.mp()), "{op:?}");
            prop_assert!((0..=BattleConfig::MAX_TP).contains(&alice.tp()), "{op:?}");
            prop_assert_eq!(alice.hp() == 0, alice.is_death_state_affected(), "{:?}", op);
            for index in 0..BattleConfig::BUFF_COUNT {
                let level = alice.buff(param(index));
                prop_assert!((-2..=2).contains(&level));
                prop_assert_eq!(alice.param_buff_rate(param(index)), 1.0 + 0.25 * f64::from(level));
            }
        }
    }

    /// A resisted state never lands, however often it is added.
    #[test]
    fn prop_resisted_state_is_never_present(seed in any::<u64>(), attempts in 1..20usize) {
        let world = World::with_seed(seed);
        let env = world.env();
        let mut warden = Actor::new(&env, WARDEN).unwrap();
        for _ in 0..attempts {
            prop_assert!(!warden.add_state(&env, POISON));
            prop_assert!(!warden.is_state_affected(POISON));
        }
        prop_assert!(warden.add_state(&env, BLEED));
    }

    /// Re-adding a removed state rolls a fresh duration inside its bounds.
    #[test]
    fn prop_readded_state_turns_stay_in_bounds(seed in any::<u64>(), decrements in 0..6usize) {
        let world = World::with_seed(seed);
        let env = world.env();
        let mut alice = Actor::new(&env, ALICE).unwrap();
        alice.add_state(&env, BLEED);
        for _ in 0..decrements {
            alice.update_state_turns();
        }
        alice.remove_state(&env, BLEED);
        alice.clear_result();
        prop_assert!(alice.add_state(&env, BLEED));
        let turns = alice.state_turns(BLEED).unwrap();
        prop_assert!((2..=5).contains(&turns));
    }

    /// Removing a buff that is not there changes nothing.
    #[test]
    fn prop_removing_a_missing_buff_is_a_no_op(index in 0..8usize, other in 0..8usize) {
        let world = World::new();
        let env = world.env();
        let mut alice = Actor::new(&env, ALICE).unwrap();
        if other != index {
            alice.add_buff(&env, param(other), 3);
        }
        alice.clear_result();
        let before = alice.clone();
        alice.remove_buff(&env, param(index));
        prop_assert_eq!(alice, before);
    }
}
