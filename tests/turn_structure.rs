//! Turn structure: step advancement, turn rotation and turn-based actions

use cardboard_rs::core::{CardDefinition, CardType, Color, Mana, PlayerId};
use cardboard_rs::game::{
    phase::positions_per_turn, EventHandler, Game, GameConfig, GameEvent, Phase, PlayerSetup, Step,
};
use cardboard_rs::zones::ZoneId;
use cardboard_rs::{MtgError, Result};
use similar_asserts::assert_eq;

fn forests(count: usize) -> Vec<CardDefinition> {
    vec![CardDefinition::new("Forest").with_type(CardType::Land); count]
}

fn bears() -> CardDefinition {
    CardDefinition::new("Grizzly Bears")
        .with_cost("1G")
        .with_type(CardType::Creature)
        .with_pt(2, 2)
}

fn started_game(config: GameConfig) -> (Game, PlayerId, PlayerId) {
    let mut game = Game::with_config(config);
    let alice = game
        .add_player(PlayerSetup::new("Alice").with_library(forests(20)))
        .unwrap();
    let bob = game
        .add_player(PlayerSetup::new("Bob").with_library(forests(20)))
        .unwrap();
    game.start().unwrap();
    (game, alice, bob)
}

fn advance(game: &mut Game, steps: usize) {
    for _ in 0..steps {
        game.next_step().unwrap();
    }
}

fn event_ids(game: &Game) -> Vec<String> {
    game.events().history().iter().map(|e| e.id()).collect()
}

#[test]
fn test_next_step_requires_started_game() {
    let mut game = Game::new();
    game.add_player(PlayerSetup::new("Alice")).unwrap();
    assert!(matches!(game.next_step(), Err(MtgError::RequirementNotMet { .. })));
    assert!(matches!(game.end_turn(), Err(MtgError::RequirementNotMet { .. })));
}

#[test]
fn test_full_lap_ends_turn_once() {
    let (mut game, _, _) = started_game(GameConfig::default());
    let first = game.turn().active_player().unwrap();
    game.clear_history();

    advance(&mut game, positions_per_turn());

    let ids = event_ids(&game);
    assert_eq!(ids.iter().filter(|id| *id == "game.turn.ended").count(), 1);
    assert_eq!(game.turn().phase(), Some(Phase::Beginning));
    assert_eq!(game.turn().step(), Some(Step::Untap));
    assert_eq!(game.turn().turn_number(), 2);
    assert_ne!(game.turn().active_player(), Some(first));
}

#[test]
fn test_phases_in_order() {
    let (mut game, _, _) = started_game(GameConfig::default());
    let mut seen = vec![(game.turn().phase(), game.turn().step())];
    for _ in 1..positions_per_turn() {
        game.next_step().unwrap();
        seen.push((game.turn().phase(), game.turn().step()));
    }

    let expected = vec![
        (Some(Phase::Beginning), Some(Step::Untap)),
        (Some(Phase::Beginning), Some(Step::Upkeep)),
        (Some(Phase::Beginning), Some(Step::Draw)),
        (Some(Phase::FirstMain), None),
        (Some(Phase::Combat), Some(Step::BeginningOfCombat)),
        (Some(Phase::Combat), Some(Step::DeclareAttackers)),
        (Some(Phase::Combat), Some(Step::DeclareBlockers)),
        (Some(Phase::Combat), Some(Step::CombatDamage)),
        (Some(Phase::Combat), Some(Step::EndOfCombat)),
        (Some(Phase::SecondMain), None),
        (Some(Phase::Ending), Some(Step::End)),
        (Some(Phase::Ending), Some(Step::Cleanup)),
    ];
    assert_eq!(seen, expected);
}

#[test]
fn test_lap_end_event_order() {
    let (mut game, _, _) = started_game(GameConfig::default());
    advance(&mut game, positions_per_turn() - 1);
    assert_eq!(game.turn().step(), Some(Step::Cleanup));
    game.clear_history();

    game.next_step().unwrap();
    assert_eq!(
        event_ids(&game),
        vec![
            "game.turn.phase.ending.cleanup.ended",
            "game.turn.phase.ending.ended",
            "game.turn.phase.beginning.started",
            "game.turn.phase.beginning.untap.started",
            "game.turn.ended",
            "game.turn.started",
        ]
    );
}

#[test]
fn test_main_phase_has_no_step_events() {
    let (mut game, _, _) = started_game(GameConfig::default());
    advance(&mut game, 2);
    game.clear_history();

    game.next_step().unwrap();
    assert_eq!(
        event_ids(&game),
        vec![
            "game.turn.phase.beginning.draw.ended",
            "game.turn.phase.beginning.ended",
            "game.turn.phase.first_main.started",
        ]
    );
}

#[test]
fn test_first_draw_skipped() {
    let (mut game, _, _) = started_game(GameConfig::default());
    let first = game.turn().active_player().unwrap();

    advance(&mut game, 2);
    assert_eq!(game.turn().step(), Some(Step::Draw));
    assert_eq!(game.zones(first).unwrap().hand.len(), 7);

    advance(&mut game, positions_per_turn());
    let second = game.turn().active_player().unwrap();
    assert_eq!(game.turn().step(), Some(Step::Draw));
    assert_eq!(game.zones(second).unwrap().hand.len(), 8);
    assert_eq!(game.zones(first).unwrap().hand.len(), 7);
}

#[test]
fn test_first_draw_when_configured() {
    let (mut game, _, _) = started_game(GameConfig::new().with_first_draw());
    let first = game.turn().active_player().unwrap();

    advance(&mut game, 2);
    assert_eq!(game.zones(first).unwrap().hand.len(), 8);
    assert_eq!(game.zones(first).unwrap().library.len(), 12);
}

#[test]
fn test_mana_empties_between_steps() {
    let (mut game, alice, bob) = started_game(GameConfig::default());
    game.add_mana(alice, Mana::of(Color::Green, 3)).unwrap();
    game.add_mana(bob, Mana::of(Color::Red, 1)).unwrap();
    assert_eq!(game.player(alice).unwrap().mana_pool.total(), 3);

    game.next_step().unwrap();
    assert!(game.player(alice).unwrap().mana_pool.is_empty());
    assert!(game.player(bob).unwrap().mana_pool.is_empty());
}

/// Adds a white mana to the active player when upkeep begins
#[derive(Debug)]
struct UpkeepMana;

impl EventHandler for UpkeepMana {
    fn name(&self) -> &str {
        "upkeep mana"
    }

    fn handle(&mut self, game: &mut Game, event: &GameEvent) -> Result<()> {
        if *event == GameEvent::StepStarted(Phase::Beginning, Step::Upkeep) {
            if let Some(active) = game.turn().active_player() {
                game.add_mana(active, Mana::of(Color::White, 1))?;
            }
        }
        Ok(())
    }
}

#[test]
fn test_step_handlers_run_before_pools_empty() {
    let (mut game, _, _) = started_game(GameConfig::default());
    game.subscribe(Box::new(UpkeepMana));
    let active = game.turn().active_player().unwrap();
    game.clear_history();

    game.next_step().unwrap();

    assert_eq!(game.turn().step(), Some(Step::Upkeep));
    assert_eq!(game.player(active).unwrap().mana_pool.get(Color::White), 0);
    assert!(event_ids(&game).contains(&"player.mana.white.added".to_string()));
}

#[test]
fn test_end_turn_keeps_phase_cursor() {
    let (mut game, _, _) = started_game(GameConfig::default());
    let first = game.turn().active_player().unwrap();
    advance(&mut game, 3);
    assert_eq!(game.turn().phase(), Some(Phase::FirstMain));
    game.clear_history();

    game.end_turn().unwrap();

    assert_eq!(event_ids(&game), vec!["game.turn.ended", "game.turn.started"]);
    assert_ne!(game.turn().active_player(), Some(first));
    assert_eq!(game.turn().turn_number(), 2);
    assert_eq!(game.turn().phase(), Some(Phase::FirstMain));
}

#[test]
fn test_turn_order_wraps_around() {
    let (mut game, _, _) = started_game(GameConfig::default());
    let order = game.turn().order();
    for turn in 0..5 {
        assert_eq!(game.turn().active_player(), Some(order[turn % 2]));
        game.end_turn().unwrap();
    }
    assert_eq!(game.turn().turn_number(), 6);
}

#[test]
fn test_cleanup_removes_damage() {
    let (mut game, alice, _) = started_game(GameConfig::default());
    let bears = game
        .create_card(&bears(), alice, ZoneId::battlefield())
        .unwrap();
    game.deal_damage(bears, 1).unwrap();

    advance(&mut game, positions_per_turn() - 2);
    assert_eq!(game.turn().step(), Some(Step::End));
    assert_eq!(game.card(bears).unwrap().damage, 1);

    game.next_step().unwrap();
    assert_eq!(game.turn().step(), Some(Step::Cleanup));
    assert_eq!(game.card(bears).unwrap().damage, 0);
}

#[test]
fn test_untap_at_turn_start() {
    let (mut game, alice, bob) = started_game(GameConfig::default());
    let mine = game
        .create_card(&bears(), alice, ZoneId::battlefield())
        .unwrap();
    let theirs = game
        .create_card(&bears(), bob, ZoneId::battlefield())
        .unwrap();
    game.tap(mine).unwrap();
    game.tap(theirs).unwrap();

    game.end_turn().unwrap();
    let active = game.turn().active_player().unwrap();
    let (untapped, still_tapped) = if active == alice {
        (mine, theirs)
    } else {
        (theirs, mine)
    };
    assert!(!game.card(untapped).unwrap().is_tapped());
    assert!(game.card(still_tapped).unwrap().is_tapped());

    game.end_turn().unwrap();
    assert!(!game.card(still_tapped).unwrap().is_tapped());
}

#[test]
fn test_land_drop_resets_each_turn() {
    let (mut game, _, _) = started_game(GameConfig::default());
    let active = game.turn().active_player().unwrap();
    let hand = game.zones(active).unwrap().hand.cards().to_vec();

    game.play(hand[0]).unwrap();
    let err = game.play(hand[1]).unwrap_err();
    assert!(matches!(err, MtgError::InvalidAction(_)));

    game.end_turn().unwrap();
    game.end_turn().unwrap();
    assert_eq!(game.turn().active_player(), Some(active));
    game.play(hand[1]).unwrap();
    assert_eq!(game.battlefield().len(), 2);
}
