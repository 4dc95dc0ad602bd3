//! Game actions and mechanics
//!
//! Every public action validates its preconditions before touching any
//! state, fires its events on the game's bus and dispatches them before
//! returning.

use crate::core::{
    Ability, Card, CardId, CardKind, Characteristics, DeathReason, Mana, ManaCost, Player,
    PlayerId, StatusChange, StatusFlag,
};
use crate::game::events::{EventBus, GameEvent};
use crate::game::logger::log_if_verbose;
use crate::game::phase::Step;
use crate::game::Game;
use crate::zones::{ZoneId, ZoneKind};
use crate::{MtgError, Result};

impl Game {
    /// A player together with the bus, for player methods that fire events
    fn player_and_events(&mut self, id: PlayerId) -> Result<(&mut Player, &mut EventBus)> {
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(MtgError::EntityNotFound(id.as_u32()))?;
        Ok((player, &mut self.events))
    }

    // ----- life and death --------------------------------------------------

    pub fn set_life(&mut self, player: PlayerId, amount: i32) -> Result<()> {
        let (player, events) = self.player_and_events(player)?;
        player.set_life(amount, events);
        self.dispatch_events()
    }

    pub fn gain_life(&mut self, player: PlayerId, amount: i32) -> Result<()> {
        if amount < 0 {
            return Err(MtgError::InvalidValue(format!(
                "Cannot gain a negative amount of life ({amount})"
            )));
        }
        let life = self.player(player)?.life();
        self.set_life(player, life.saturating_add(amount))
    }

    pub fn lose_life(&mut self, player: PlayerId, amount: i32) -> Result<()> {
        if amount < 0 {
            return Err(MtgError::InvalidValue(format!(
                "Cannot lose a negative amount of life ({amount})"
            )));
        }
        let life = self.player(player)?.life();
        self.set_life(player, life.saturating_sub(amount))
    }

    pub fn add_poison(&mut self, player: PlayerId, counters: u32) -> Result<()> {
        let player = self.player_mut(player)?;
        player.poison = player.poison.saturating_add(counters);
        Ok(())
    }

    /// The player loses the game. Does not end it; see `end_if_dead`.
    pub fn die(&mut self, player: PlayerId, reason: DeathReason) -> Result<()> {
        self.kill(player, reason)?;
        self.dispatch_events()
    }

    pub(super) fn kill(&mut self, player: PlayerId, reason: DeathReason) -> Result<()> {
        let (dying, events) = self.player_and_events(player)?;
        dying.die(reason.clone(), events)?;
        let name = dying.to_string();
        self.logger.normal(&format!("{name} died ({reason})"));
        Ok(())
    }

    pub fn concede(&mut self, player: PlayerId) -> Result<()> {
        let conceding = self.player(player)?;
        if let Some(reason) = conceding.death_by() {
            return Err(MtgError::requirement(
                conceding,
                "alive",
                format!("dead ({reason})"),
            ));
        }
        self.events.trigger(GameEvent::Conceded { player });
        self.kill(player, DeathReason::Concede)?;
        self.dispatch_events()
    }

    // ----- cards in hand and library ---------------------------------------

    /// Draw `count` cards. Asking for more cards than the library holds
    /// draws what is there and flags the player for the state-based check.
    pub fn draw(&mut self, player: PlayerId, count: usize) -> Result<()> {
        self.require_started()?;
        self.draw_cards(player, count)?;
        self.dispatch_events()
    }

    pub(super) fn draw_cards(&mut self, player: PlayerId, count: usize) -> Result<()> {
        let available = self.zones(player)?.library.len();
        if count > available {
            self.player_mut(player)?.drew_from_empty_library = true;
        }

        for _ in 0..count.min(available) {
            let zones = self.zones_mut(player)?;
            let Some(card) = zones.library.pop() else {
                break;
            };
            zones.hand.add(card);
            let hand = zones.hand.id();
            let drawn = self.cards.get_mut(card)?;
            drawn.zone = Some(hand);
            log_if_verbose!(self.logger, "Player {player} draws {} ({card})", drawn.name);
            self.events.trigger(GameEvent::Drew { player, card });
        }
        Ok(())
    }

    // ----- mana ------------------------------------------------------------

    pub fn add_mana(&mut self, player: PlayerId, mana: Mana) -> Result<()> {
        self.require_started()?;
        let (player, events) = self.player_and_events(player)?;
        player.mana_pool.add(mana, events)?;
        self.dispatch_events()
    }

    pub fn pay_mana(&mut self, player: PlayerId, mana: &Mana) -> Result<()> {
        self.require_started()?;
        let (player, events) = self.player_and_events(player)?;
        player.mana_pool.pay(mana, events)?;
        self.dispatch_events()
    }

    pub fn pay_cost(&mut self, player: PlayerId, cost: &ManaCost) -> Result<()> {
        self.require_started()?;
        let (player, events) = self.player_and_events(player)?;
        player.mana_pool.pay_cost(cost, events)?;
        self.dispatch_events()
    }

    // ----- playing cards ---------------------------------------------------

    /// Play a card: a land goes onto the battlefield as the controller's
    /// land drop, anything else is cast onto the stack.
    pub fn play(&mut self, card: CardId) -> Result<()> {
        self.require_started()?;
        let played = self.card(card)?;
        let controller = played.controller;
        let from = match played.zone() {
            Some(zone) => zone,
            None => return Err(MtgError::requirement(played, "in a zone", "no zone")),
        };

        if played.is_land() {
            let player = self.player(controller)?;
            if !player.can_play_land() {
                return Err(MtgError::InvalidAction(format!(
                    "{player} cannot play another land this turn."
                )));
            }
            self.relocate(card, from, ZoneId::battlefield())?;
            self.player_mut(controller)?.play_land();
            self.events.trigger(GameEvent::LandPlayed {
                card,
                player: controller,
            });
        } else {
            self.relocate(card, from, ZoneId::stack())?;
            self.events.trigger(GameEvent::CardCast {
                card,
                player: controller,
            });
        }
        self.dispatch_events()
    }

    /// Put a token with the given characteristics onto the battlefield
    pub fn create_token(&mut self, chars: Characteristics, controller: PlayerId) -> Result<CardId> {
        self.player(controller)?;
        let id = self.next_id();
        let token = Card::from_characteristics(id, CardKind::Token, chars, controller);
        log_if_verbose!(self.logger, "Token {} created for player {controller}", token.name);
        self.cards.insert(id, token);
        self.put(id, ZoneId::battlefield())?;
        Ok(id)
    }

    /// Put a copy of a spell on the stack onto the stack
    pub fn copy_spell(&mut self, spell: CardId) -> Result<CardId> {
        let original = self.card(spell)?;
        if original.zone() != Some(ZoneId::stack()) {
            return Err(MtgError::NotInZone {
                object: format!("Spell {spell}"),
                zone: ZoneId::stack(),
            });
        }
        let chars = original.characteristics();
        let controller = original.controller;

        let id = self.next_id();
        let copy = Card::from_characteristics(id, CardKind::SpellCopy { of: spell }, chars, controller);
        self.cards.insert(id, copy);
        self.put(id, ZoneId::stack())?;
        Ok(id)
    }

    /// Resolve the ability at `index` of `card`
    pub fn resolve_ability(&mut self, card: CardId, index: usize) -> Result<()> {
        let source = self.card(card)?;
        let ability = source.abilities.get(index).cloned().ok_or_else(|| {
            MtgError::InvalidValue(format!("{source} has no ability #{index}"))
        })?;
        match ability {
            Ability::Implemented(behavior) => behavior.resolve(self, card)?,
            Ability::NotImplemented { text } => {
                return Err(MtgError::InvalidAction(format!(
                    "Ability not implemented: {text}"
                )))
            }
        }
        self.dispatch_events()
    }

    // ----- permanents ------------------------------------------------------

    fn require_on_battlefield(&self, card: CardId) -> Result<&Card> {
        let permanent = self.card(card)?;
        match permanent.zone() {
            Some(zone) if zone.kind == ZoneKind::Battlefield => Ok(permanent),
            Some(zone) => Err(MtgError::requirement(permanent, "battlefield", zone)),
            None => Err(MtgError::requirement(permanent, "battlefield", "no zone")),
        }
    }

    /// Turn one status flag of a permanent on or off.
    ///
    /// Requires a started game, the card on the battlefield and the flag
    /// currently holding the opposite value.
    pub fn set_status(&mut self, card: CardId, flag: StatusFlag, value: bool) -> Result<()> {
        self.require_started()?;
        self.change_status(card, flag, value)?;
        self.dispatch_events()
    }

    fn change_status(&mut self, card: CardId, flag: StatusFlag, value: bool) -> Result<()> {
        let permanent = self.require_on_battlefield(card)?;
        let current = permanent.status.get(flag);
        if current == value {
            return Err(MtgError::requirement(
                permanent,
                format!("{flag} = {}", !value),
                format!("{flag} = {current}"),
            ));
        }

        let permanent = self.cards.get_mut(card)?;
        permanent.status.set(flag, value);
        let status = StatusChange {
            flag,
            active: value,
        };
        log_if_verbose!(self.logger, "{} is now {status}", permanent.name);
        self.events.trigger(GameEvent::StatusChanged { card, status });
        Ok(())
    }

    pub fn tap(&mut self, card: CardId) -> Result<()> {
        self.set_status(card, StatusFlag::Tapped, true)
    }

    pub fn untap(&mut self, card: CardId) -> Result<()> {
        self.set_status(card, StatusFlag::Tapped, false)
    }

    pub fn flip(&mut self, card: CardId) -> Result<()> {
        self.set_status(card, StatusFlag::Flipped, true)
    }

    pub fn unflip(&mut self, card: CardId) -> Result<()> {
        self.set_status(card, StatusFlag::Flipped, false)
    }

    pub fn turn_face_up(&mut self, card: CardId) -> Result<()> {
        self.set_status(card, StatusFlag::FaceUp, true)
    }

    pub fn turn_face_down(&mut self, card: CardId) -> Result<()> {
        self.set_status(card, StatusFlag::FaceUp, false)
    }

    pub fn phase_in(&mut self, card: CardId) -> Result<()> {
        self.set_status(card, StatusFlag::PhasedIn, true)
    }

    pub fn phase_out(&mut self, card: CardId) -> Result<()> {
        self.set_status(card, StatusFlag::PhasedIn, false)
    }

    /// Attach a permanent (aura, equipment) to another permanent
    pub fn attach(&mut self, card: CardId, to: CardId) -> Result<()> {
        if card == to {
            return Err(MtgError::InvalidAction(format!(
                "Card {card} cannot be attached to itself"
            )));
        }
        self.require_on_battlefield(to)?;
        self.require_on_battlefield(card)?;
        self.cards.get_mut(card)?.attached_to = Some(to);
        Ok(())
    }

    pub fn detach(&mut self, card: CardId) -> Result<()> {
        self.cards.get_mut(card)?.attached_to = None;
        Ok(())
    }

    /// Mark damage on a permanent. Lethal damage is only acted on by the
    /// next state-based action check.
    pub fn deal_damage(&mut self, card: CardId, amount: u32) -> Result<()> {
        self.require_on_battlefield(card)?;
        let permanent = self.cards.get_mut(card)?;
        permanent.damage = permanent.damage.saturating_add(amount);
        Ok(())
    }

    // ----- turn-based actions ----------------------------------------------

    /// Actions the rules perform on entering the current step
    pub(super) fn turn_based_actions(&mut self) -> Result<()> {
        match self.turn.step() {
            Some(Step::Draw) => {
                let first_turn = self.turn.turn_number() == 1;
                if first_turn && self.config.skip_first_draw {
                    return Ok(());
                }
                if let Some(active) = self.turn.active_player() {
                    self.draw_cards(active, 1)?;
                }
            }
            Some(Step::Cleanup) => {
                for card in self.battlefield.cards().to_vec() {
                    self.cards.get_mut(card)?.damage = 0;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Untap every tapped permanent `player` controls
    pub(super) fn untap_permanents(&mut self, player: PlayerId) -> Result<()> {
        let tapped: Vec<CardId> = self
            .battlefield
            .iter()
            .filter(|&id| {
                self.cards
                    .get(id)
                    .map(|c| c.controller == player && c.is_tapped())
                    .unwrap_or(false)
            })
            .collect();
        for card in tapped {
            self.change_status(card, StatusFlag::Tapped, false)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{CardDefinition, CardType, Color, StatusFlag};
    use crate::game::events::GameEvent;
    use crate::game::{Game, PlayerSetup};
    use crate::zones::ZoneId;
    use crate::MtgError;

    fn bears() -> CardDefinition {
        CardDefinition::new("Grizzly Bears")
            .with_cost("1G")
            .with_type(CardType::Creature)
            .with_pt(2, 2)
    }

    fn started_game() -> (Game, crate::core::PlayerId) {
        let mut game = Game::new();
        let alice = game.add_player(PlayerSetup::new("Alice")).unwrap();
        game.start().unwrap();
        game.clear_history();
        (game, alice)
    }

    #[test]
    fn test_tap_requires_battlefield_and_opposite_value() {
        let (mut game, alice) = started_game();
        let in_hand = game.create_card(&bears(), alice, ZoneId::hand(alice)).unwrap();
        assert!(matches!(game.tap(in_hand), Err(MtgError::RequirementNotMet { .. })));

        let bear = game.create_card(&bears(), alice, ZoneId::battlefield()).unwrap();
        game.tap(bear).unwrap();
        assert!(game.card(bear).unwrap().is_tapped());

        let err = game.tap(bear).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Grizzly Bears: expected is_tapped = false, got is_tapped = true"
        );

        game.untap(bear).unwrap();
        let statuses: Vec<_> = game
            .events()
            .history()
            .iter()
            .filter_map(|e| match e {
                GameEvent::StatusChanged { status, .. } => Some(status.name()),
                _ => None,
            })
            .collect();
        assert_eq!(statuses, vec!["tapped", "untapped"]);
    }

    #[test]
    fn test_status_needs_started_game() {
        let mut game = Game::new();
        let alice = game.add_player(PlayerSetup::new("Alice")).unwrap();
        let bear = game.create_card(&bears(), alice, ZoneId::battlefield()).unwrap();
        assert!(game.set_status(bear, StatusFlag::FaceUp, false).is_err());
        assert!(game.card(bear).unwrap().is_face_up());
    }

    #[test]
    fn test_all_status_togglers() {
        let (mut game, alice) = started_game();
        let bear = game.create_card(&bears(), alice, ZoneId::battlefield()).unwrap();

        game.flip(bear).unwrap();
        game.turn_face_down(bear).unwrap();
        game.phase_out(bear).unwrap();
        let card = game.card(bear).unwrap();
        assert!(card.is_flipped() && !card.is_face_up() && !card.is_phased_in());

        game.unflip(bear).unwrap();
        game.turn_face_up(bear).unwrap();
        game.phase_in(bear).unwrap();
        assert!(game.phase_in(bear).is_err());
        assert_eq!(game.events().history().len(), 6);
    }

    #[test]
    fn test_play_land_limit() {
        let (mut game, alice) = started_game();
        let forest = CardDefinition::new("Forest").with_type(CardType::Land);
        let first = game.create_card(&forest, alice, ZoneId::hand(alice)).unwrap();
        let second = game.create_card(&forest, alice, ZoneId::hand(alice)).unwrap();

        game.play(first).unwrap();
        assert!(game.battlefield().contains(first));

        let err = game.play(second).unwrap_err();
        assert_eq!(
            err,
            MtgError::InvalidAction("Player: Alice cannot play another land this turn.".into())
        );
        assert!(game.zones(alice).unwrap().hand.contains(second));
    }

    #[test]
    fn test_cast_moves_card_to_stack() {
        let (mut game, alice) = started_game();
        let bear = game.create_card(&bears(), alice, ZoneId::hand(alice)).unwrap();

        game.play(bear).unwrap();
        assert_eq!(game.card(bear).unwrap().zone(), Some(ZoneId::stack()));
        let ids: Vec<_> = game.events().history().iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["card.zone_changed", "card.cast"]);
    }

    #[test]
    fn test_copy_spell_requires_stack() {
        let (mut game, alice) = started_game();
        let bear = game.create_card(&bears(), alice, ZoneId::hand(alice)).unwrap();
        assert!(matches!(game.copy_spell(bear), Err(MtgError::NotInZone { .. })));

        game.play(bear).unwrap();
        let copy = game.copy_spell(bear).unwrap();
        let copied = game.card(copy).unwrap();
        assert!(copied.is_spell_copy());
        assert_eq!(copied.name.as_str(), "Grizzly Bears");
        assert_eq!(game.stack().peek_top(), Some(copy));
    }

    #[test]
    fn test_mana_actions() {
        let (mut game, alice) = started_game();
        game.add_mana(alice, crate::core::Mana::of(Color::Green, 2)).unwrap();
        assert!(game
            .pay_mana(alice, &crate::core::Mana::of(Color::Green, 3))
            .is_err());
        game.pay_cost(alice, &crate::core::ManaCost::from_string("1")).unwrap();
        assert_eq!(game.player(alice).unwrap().mana_pool.get(Color::Green), 1);
    }

    #[test]
    fn test_life_changes() {
        let (mut game, alice) = started_game();
        game.lose_life(alice, 3).unwrap();
        game.gain_life(alice, 1).unwrap();
        assert_eq!(game.player(alice).unwrap().life(), 18);
        assert!(matches!(game.gain_life(alice, -1), Err(MtgError::InvalidValue(_))));

        let ids: Vec<_> = game.events().history().iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["player.life.lost", "player.life.gained"]);
    }

    #[test]
    fn test_concede() {
        let (mut game, alice) = started_game();
        game.concede(alice).unwrap();
        assert_eq!(
            game.player(alice).unwrap().death_by(),
            Some(&crate::core::DeathReason::Concede)
        );
        let ids: Vec<_> = game.events().history().iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["player.conceded", "player.died"]);
        assert!(game.concede(alice).is_err());
    }
}
