//! Battle engine integration tests

use sanguo_battle::battle::*;
use sanguo_battle::core::types::{CityId, GeneralId};
use sanguo_battle::core::{BattleError, BattleRng, EngineConfig};

/// Engine over a single neutral troop type (100/100, speed 7)
fn baseline_engine() -> BattleEngine {
    let mut tables = ScenarioTables::new(0);
    tables.troops.insert(TroopType::baseline(1));
    BattleEngine::new(Rulebook::new(tables), EngineConfig::default())
}

fn commander(id: u32, crew: u32) -> CommanderInput {
    CommanderInput::new(id, &format!("장수{}", id), crew, 1).with_stats(50.0, 50.0, 50.0)
}

/// Duel-ready commander: the approach drill adds 1 train, so 99 fights at 100
fn duelist(id: u32, crew: u32) -> CommanderInput {
    commander(id, crew).with_condition(99.0, 100.0)
}

fn side(commanders: Vec<CommanderInput>) -> SideConfig {
    SideConfig::new(NationConfig::default(), commanders)
}

#[test]
fn test_mass_baseline_fights_to_the_last_soldier() {
    let engine = baseline_engine();
    let battle = BattleConfig::new(
        BattleKind::Field,
        side(vec![commander(1, 10_000)]),
        side(vec![commander(2, 10_000)]),
    )
    .with_mode(SchedulerMode::Mass)
    .with_max_turns(100)
    .without_modifiers();

    let result = engine.run_with_rng(&battle, &mut BattleRng::pinned(1.0));
    let records = &result.log.records;

    // 83 full turns of 120 each way, then the defender's blow finishes it
    assert_eq!(records.len(), 167);
    assert!(records[..166].iter().all(|r| r.damage == 120));
    assert_eq!(records[166].damage, 40);
    assert_eq!(result.summary.turns, 84);
    assert_eq!(result.summary.winner, Winner::Defender);
    assert_eq!(result.summary.outcome, OutcomeKind::Decisive);
    assert_eq!(result.summary.attacker.remaining_hp, 0);
    assert_eq!(result.summary.defender.remaining_hp, 40);
}

#[test]
fn test_duel_baseline_exchanges_510() {
    let engine = baseline_engine();
    let battle = BattleConfig::new(
        BattleKind::Field,
        side(vec![duelist(1, 10_000)]),
        side(vec![duelist(2, 10_000)]),
    )
    .with_mode(SchedulerMode::Duel)
    .without_modifiers();

    let result = engine.run_with_rng(&battle, &mut BattleRng::pinned(1.0));
    let first = &result.log.records[0];
    assert_eq!(first.kind, ExchangeKind::Duel);
    assert_eq!(first.damage, 510);
    assert_eq!(first.remaining_hp, 9490);

    // Speed 7: the principal withdraws after seven phases
    assert_eq!(result.summary.turns, 7);
    assert_eq!(result.summary.winner, Winner::Draw);
    assert_eq!(result.summary.attacker.remaining_hp, 10_000 - 7 * 510);
    assert_eq!(result.summary.defender.remaining_hp, 10_000 - 7 * 510);
}

#[test]
fn test_duel_exchange_spares_the_lighter_hit_side() {
    let engine = baseline_engine();
    let battle = BattleConfig::new(
        BattleKind::Field,
        side(vec![duelist(1, 100)]),
        side(vec![duelist(2, 100).with_stats(90.0, 50.0, 50.0)]),
    )
    .with_mode(SchedulerMode::Duel)
    .without_modifiers();

    let result = engine.run_with_rng(&battle, &mut BattleRng::pinned(1.0));
    let records = &result.log.records;
    assert!(!(records[0].remaining_hp == 0 && records[1].remaining_hp == 0));
    assert_eq!(result.winner(), Winner::Defender);
    assert!(result.summary.defender.remaining_hp > 0);
    assert_eq!(result.summary.attacker.remaining_hp, 0);
}

#[test]
fn test_huge_armies_do_not_overflow_totals() {
    let engine = baseline_engine();
    for mode in [SchedulerMode::Mass, SchedulerMode::Duel] {
        let battle = BattleConfig::new(
            BattleKind::Field,
            side(vec![duelist(1, 3_000_000_000)]),
            side(vec![duelist(2, 3_000_000_000), duelist(3, 3_000_000_000)]),
        )
        .with_mode(mode)
        .with_max_turns(1)
        .without_modifiers();

        let result = engine.run_with_rng(&battle, &mut BattleRng::pinned(1.0));
        assert_eq!(result.summary.defender.initial_hp, 6_000_000_000, "{:?}", mode);
        assert_eq!(
            result.summary.defender.initial_hp - result.summary.defender.remaining_hp,
            result.summary.defender.casualties
        );
    }
}

#[test]
fn test_empty_attackers_yield_empty_draw() {
    let engine = BattleEngine::default();
    for mode in [SchedulerMode::Mass, SchedulerMode::Duel] {
        let battle = BattleConfig::new(BattleKind::Field, side(Vec::new()), side(vec![commander(2, 1000)]))
            .with_mode(mode);
        let result = engine.run(&battle);
        assert_eq!(result.winner(), Winner::Draw);
        assert_eq!(result.summary.outcome, OutcomeKind::Empty);
        assert_eq!(result.summary.turns, 0);
        assert!(result.log.is_empty());
        assert!(result.reports.is_empty());
    }
}

#[test]
fn test_undefended_city_falls_in_both_modes() {
    let engine = baseline_engine();
    for mode in [SchedulerMode::Mass, SchedulerMode::Duel] {
        let battle = BattleConfig::new(BattleKind::Siege, side(vec![commander(1, 10_000)]), side(Vec::new()))
            .with_city(CityConfig::new(7, "양양", 1000, 0.0))
            .with_mode(mode)
            .with_seed("siege")
            .without_modifiers();
        let result = engine.run(&battle);

        assert_eq!(result.summary.outcome, OutcomeKind::CityConquered, "{:?}", mode);
        assert_eq!(result.winner(), Winner::Attacker);
        assert_eq!(result.summary.city_hp, Some(0));
        let reward = result.conquest.as_ref().expect("city reward");
        assert_eq!(reward.city, CityId(7));
        assert_eq!(reward.conqueror, GeneralId(1));
        assert!(result.log.lines.iter().any(|l| l.contains("양양")));
    }
}

#[test]
fn test_defense_held_grants_bonus() {
    let engine = baseline_engine();
    let battle = BattleConfig::new(
        BattleKind::Defense,
        side(vec![commander(1, 500), commander(2, 500)]),
        side(vec![commander(3, 10_000).with_condition(80.0, 80.0)]),
    )
    .with_mode(SchedulerMode::Duel)
    .without_modifiers();

    let result = engine.run_with_rng(&battle, &mut BattleRng::pinned(1.0));
    assert_eq!(result.winner(), Winner::Defender);
    assert_eq!(result.summary.outcome, OutcomeKind::DefenseHeld);
    assert_eq!(result.summary.attacker.remaining_hp, 0);

    let holder = result.reports.iter().find(|r| r.general == GeneralId(3)).unwrap();
    assert_eq!(holder.train_delta, 4.0);
    assert!(holder.atmos_delta > 0.0);
    assert!(result.conquest.is_none());
}

#[test]
fn test_same_seed_same_battle() {
    let engine = BattleEngine::default();
    let battle = BattleConfig::new(
        BattleKind::Field,
        SideConfig::new(
            NationConfig::new(1, "촉"),
            vec![
                CommanderInput::new(1, "관우", 8000, 1300).with_stats(95.0, 97.0, 75.0).with_skill("charge"),
                CommanderInput::new(2, "장비", 7000, 1100).with_stats(85.0, 98.0, 30.0),
            ],
        ),
        SideConfig::new(
            NationConfig::new(2, "위"),
            vec![
                CommanderInput::new(3, "하후돈", 7000, 1300).with_stats(90.0, 90.0, 60.0),
                CommanderInput::new(4, "하후연", 6000, 1200).with_stats(88.0, 85.0, 65.0).with_skill("volley"),
            ],
        ),
    );

    for mode in [SchedulerMode::Mass, SchedulerMode::Duel] {
        let battle = battle.clone().with_mode(mode).with_seed("적벽");
        let a = serde_json::to_string(&engine.run(&battle)).unwrap();
        let b = serde_json::to_string(&engine.run(&battle)).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn test_run_many_matches_sequential_runs() {
    let engine = BattleEngine::default();
    let battles: Vec<BattleConfig> = (0..16u64)
        .map(|seed| {
            BattleConfig::new(
                BattleKind::Field,
                side(vec![CommanderInput::new(1, "조운", 5000, 1300)]),
                side(vec![CommanderInput::new(2, "장합", 5000, 1100)]),
            )
            .with_seed(seed)
            .with_mode(if seed % 2 == 0 { SchedulerMode::Mass } else { SchedulerMode::Duel })
        })
        .collect();

    let parallel = engine.run_many(&battles);
    let sequential: Vec<BattleResult> = battles.iter().map(|b| engine.run(b)).collect();
    assert_eq!(parallel, sequential);
}

#[test]
fn test_battle_config_from_json() {
    let json = r#"{
        "kind": "field",
        "mode": "mass",
        "terrain": "plain",
        "seed": "hulao",
        "max_turns": 20,
        "attacker": {
            "nation": { "id": 1, "name": "연합군" },
            "commanders": [
                { "id": 10, "name": "여포", "crew": 6000, "crew_type": 1300, "leadership": 90, "strength": 100 }
            ]
        },
        "defender": {
            "commanders": [
                { "id": 20, "name": "관우", "crew": 5000, "crew_type": 1100 },
                { "id": 21, "name": "장비", "crew": 5000, "crew_type": 1100 }
            ]
        }
    }"#;
    let battle = BattleConfig::from_json_str(json).unwrap();
    assert_eq!(battle.mode, SchedulerMode::Mass);
    assert_eq!(battle.attacker.commanders[0].strength, Some(100.0));
    assert_eq!(battle.defender.commanders[0].train, None);
    assert!(battle.supply_connected);
    assert!(battle.apply_modifiers);

    let result = BattleEngine::default().run(&battle);
    assert!(result.summary.turns <= 20);
    assert_eq!(result.reports.len(), 3);
}

#[test]
fn test_bad_input_is_an_error() {
    assert!(matches!(
        BattleConfig::from_json_str("{ not json"),
        Err(BattleError::SerdeError(_))
    ));
    assert!(matches!(
        BattleConfig::load("/nonexistent/battle.json"),
        Err(BattleError::IoError(_))
    ));
    assert!(matches!(
        EngineConfig::from_toml_str("stat_min = 200.0"),
        Err(BattleError::InvalidConfig(_))
    ));
    assert!(matches!(
        EngineConfig::from_toml_str("stat_min = \"low\""),
        Err(BattleError::RulesError(_))
    ));
}

#[test]
fn test_engine_config_override_changes_outcome() {
    let config = EngineConfig::from_toml_str("arm_per_phase = 1000.0").unwrap();
    let mut tables = ScenarioTables::new(0);
    tables.troops.insert(TroopType::baseline(1));
    let engine = BattleEngine::new(Rulebook::new(tables), config);

    let battle = BattleConfig::new(
        BattleKind::Field,
        side(vec![duelist(1, 10_000)]),
        side(vec![duelist(2, 10_000)]),
    )
    .without_modifiers();
    let result = engine.run_with_rng(&battle, &mut BattleRng::pinned(1.0));
    assert!(result.log.records[0].damage > 510);
}

#[test]
fn test_narration_uses_particles() {
    let engine = BattleEngine::default();
    let battle = BattleConfig::new(
        BattleKind::Field,
        SideConfig::new(NationConfig::new(1, "촉"), vec![CommanderInput::new(1, "관우", 3000, 1100)]),
        SideConfig::new(NationConfig::new(2, "오"), vec![CommanderInput::new(2, "감녕", 3000, 1200)]),
    )
    .with_seed(3u64);
    let result = engine.run(&battle);
    assert!(!result.log.lines.is_empty());
    assert!(result.log.lines.iter().all(|l| !l.contains('{')));
}
