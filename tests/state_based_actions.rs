//! State-based actions and priority

use cardboard_rs::core::{CardDefinition, CardId, CardType, DeathReason, PlayerId};
use cardboard_rs::game::{Frontend, Game, GameConfig, GameEvent, PlayerSetup};
use cardboard_rs::zones::ZoneId;
use similar_asserts::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

fn forests(count: usize) -> Vec<CardDefinition> {
    vec![CardDefinition::new("Forest").with_type(CardType::Land); count]
}

fn bears() -> CardDefinition {
    CardDefinition::new("Grizzly Bears")
        .with_cost("1G")
        .with_type(CardType::Creature)
        .with_pt(2, 2)
}

fn started_game(library: usize) -> (Game, PlayerId, PlayerId) {
    let mut game = Game::with_config(GameConfig::default());
    let alice = game
        .add_player(PlayerSetup::new("Alice").with_library(forests(library)))
        .unwrap();
    let bob = game
        .add_player(PlayerSetup::new("Bob").with_library(forests(library)))
        .unwrap();
    game.start().unwrap();
    (game, alice, bob)
}

/// Remembers who was granted priority
#[derive(Debug, Default)]
struct RecordingFrontend {
    calls: Rc<RefCell<Vec<PlayerId>>>,
}

impl Frontend for RecordingFrontend {
    fn priority_granted(&mut self, _game: &Game, player: PlayerId) {
        self.calls.borrow_mut().push(player);
    }

    fn select_cards(
        &mut self,
        _game: &Game,
        _player: PlayerId,
        choices: &[CardId],
        count: usize,
    ) -> Vec<CardId> {
        choices.iter().rev().take(count).copied().collect()
    }
}

// ----- permanents -----------------------------------------------------------

#[test]
fn test_lethal_damage_goes_to_graveyard() {
    let (mut game, alice, _) = started_game(20);
    let bears = game
        .create_card(&bears(), alice, ZoneId::battlefield())
        .unwrap();
    game.tap(bears).unwrap();
    game.deal_damage(bears, 2).unwrap();

    // Damage alone does nothing until the next check
    assert!(game.battlefield().contains(bears));

    game.clear_history();
    game.check_state_based_actions().unwrap();

    assert!(game.zones(alice).unwrap().graveyard.contains(bears));
    let card = game.card(bears).unwrap();
    assert_eq!(card.zone(), Some(ZoneId::graveyard(alice)));
    assert_eq!(card.damage, 0);
    assert!(!card.is_tapped());
    assert_eq!(
        game.events().history().to_vec(),
        vec![GameEvent::ZoneChanged {
            card: bears,
            from: ZoneId::battlefield(),
            to: ZoneId::graveyard(alice),
        }]
    );
}

#[test]
fn test_survivable_damage_stays() {
    let (mut game, alice, _) = started_game(20);
    let bears = game
        .create_card(&bears(), alice, ZoneId::battlefield())
        .unwrap();
    game.deal_damage(bears, 1).unwrap();

    game.check_state_based_actions().unwrap();
    assert!(game.battlefield().contains(bears));
}

#[test]
fn test_planeswalker_without_loyalty() {
    let (mut game, _, bob) = started_game(20);
    let walker = CardDefinition::new("Chandra Nalaar")
        .with_cost("3RR")
        .with_type(CardType::Planeswalker)
        .with_loyalty(6);
    let chandra = game
        .create_card(&walker, bob, ZoneId::battlefield())
        .unwrap();

    game.check_state_based_actions().unwrap();
    assert!(game.battlefield().contains(chandra));

    game.card_mut(chandra).unwrap().loyalty = Some(0);
    game.check_state_based_actions().unwrap();
    assert!(game.zones(bob).unwrap().graveyard.contains(chandra));
}

#[test]
fn test_unattached_enchantment_goes_to_graveyard() {
    let (mut game, alice, _) = started_game(20);
    let aura = CardDefinition::new("Holy Strength")
        .with_cost("W")
        .with_type(CardType::Enchantment)
        .with_subtype("Aura");
    let bears = game
        .create_card(&bears(), alice, ZoneId::battlefield())
        .unwrap();
    let attached = game
        .create_card(&aura, alice, ZoneId::battlefield())
        .unwrap();
    let loose = game
        .create_card(&aura, alice, ZoneId::battlefield())
        .unwrap();
    game.attach(attached, bears).unwrap();

    game.check_state_based_actions().unwrap();

    assert!(game.battlefield().contains(attached));
    assert!(game.zones(alice).unwrap().graveyard.contains(loose));
}

#[test]
fn test_aura_falls_off_with_its_creature() {
    let (mut game, alice, _) = started_game(20);
    let aura = CardDefinition::new("Holy Strength")
        .with_type(CardType::Enchantment)
        .with_subtype("Aura");
    let bears = game
        .create_card(&bears(), alice, ZoneId::battlefield())
        .unwrap();
    let strength = game
        .create_card(&aura, alice, ZoneId::battlefield())
        .unwrap();
    game.attach(strength, bears).unwrap();

    game.deal_damage(bears, 5).unwrap();
    game.check_state_based_actions().unwrap();
    let graveyard = &game.zones(alice).unwrap().graveyard;
    assert_eq!(graveyard.cards().to_vec(), vec![bears, strength]);
    assert_eq!(game.card(strength).unwrap().attached_to, None);
}

// ----- players --------------------------------------------------------------

#[test]
fn test_zero_life_ends_two_player_game() {
    let (mut game, alice, bob) = started_game(20);
    let calls = Rc::new(RefCell::new(Vec::new()));
    game.set_frontend(
        alice,
        Box::new(RecordingFrontend {
            calls: Rc::clone(&calls),
        }),
    )
    .unwrap();
    game.set_frontend(
        bob,
        Box::new(RecordingFrontend {
            calls: Rc::clone(&calls),
        }),
    )
    .unwrap();

    game.lose_life(alice, 20).unwrap();
    assert!(!game.player(alice).unwrap().is_dead());

    game.grant_priority(Some(bob)).unwrap();

    assert_eq!(game.player(alice).unwrap().death_by(), Some(&DeathReason::Life));
    assert_eq!(game.ended(), Some(true));
    assert_eq!(game.winner(), Some(bob));
    assert!(calls.borrow().is_empty());
    assert!(!game
        .events()
        .history()
        .iter()
        .any(|e| matches!(e, GameEvent::PriorityGranted { .. })));
}

#[test]
fn test_priority_reaches_frontend() {
    let (mut game, alice, bob) = started_game(20);
    let calls = Rc::new(RefCell::new(Vec::new()));
    for player in [alice, bob] {
        game.set_frontend(
            player,
            Box::new(RecordingFrontend {
                calls: Rc::clone(&calls),
            }),
        )
        .unwrap();
    }
    let active = game.turn().active_player().unwrap();

    game.grant_priority(None).unwrap();
    game.grant_priority(Some(bob)).unwrap();

    assert_eq!(*calls.borrow(), vec![active, bob]);
    assert_eq!(game.ended(), Some(false));
    let granted: Vec<_> = game
        .events()
        .history()
        .iter()
        .filter_map(|e| match e {
            GameEvent::PriorityGranted { player } => Some(*player),
            _ => None,
        })
        .collect();
    assert_eq!(granted, vec![active, bob]);
}

#[test]
fn test_frontend_selection_is_filtered() {
    let (mut game, alice, _) = started_game(20);
    game.set_frontend(alice, Box::<RecordingFrontend>::default())
        .unwrap();
    let hand = game.zones(alice).unwrap().hand.cards().to_vec();

    let picked = game.select_cards(alice, &hand[..3], 2).unwrap();
    assert_eq!(picked, vec![hand[2], hand[1]]);
}

#[test]
fn test_drawing_from_short_library() {
    let (mut game, alice, _) = started_game(10);
    assert_eq!(game.zones(alice).unwrap().library.len(), 3);

    game.draw(alice, 5).unwrap();

    let zones = game.zones(alice).unwrap();
    assert!(zones.library.is_empty());
    assert_eq!(zones.hand.len(), 10);
    assert!(game.player(alice).unwrap().drew_from_empty_library());
    assert!(!game.player(alice).unwrap().is_dead());

    game.check_state_based_actions().unwrap();
    assert_eq!(
        game.player(alice).unwrap().death_by(),
        Some(&DeathReason::Library)
    );
}

#[test]
fn test_poison_limit() {
    let (mut game, alice, _) = started_game(20);
    game.add_poison(alice, 9).unwrap();
    game.check_state_based_actions().unwrap();
    assert!(!game.player(alice).unwrap().is_dead());

    game.add_poison(alice, 1).unwrap();
    game.check_state_based_actions().unwrap();
    assert_eq!(
        game.player(alice).unwrap().death_by(),
        Some(&DeathReason::Poison)
    );
}

#[test]
fn test_multiplayer_game_continues() {
    let mut game = Game::new();
    let players: Vec<_> = ["Alice", "Bob", "Carol"]
        .into_iter()
        .map(|name| {
            game.add_player(PlayerSetup::new(name).with_library(forests(10)))
                .unwrap()
        })
        .collect();
    game.start().unwrap();

    game.set_life(players[0], 0).unwrap();
    game.grant_priority(Some(players[1])).unwrap();

    assert_eq!(game.ended(), Some(false));
    assert_eq!(game.living_players(), vec![players[1], players[2]]);
}
