//! Main game state structure

use crate::core::{
    Card, CardCatalog, CardDefinition, CardId, EntityId, EntityStore, MemoryCatalog, Player,
    PlayerId, PlayerName,
};
use crate::game::events::{EventBus, EventHandler, GameEvent, HandlerId};
use crate::game::frontend::{Frontend, NoFrontend};
use crate::game::logger::{log_if_verbose, GameLogger};
use crate::game::phase::TurnManager;
use crate::game::GameConfig;
use crate::zones::{PlayerZones, Zone, ZoneId, ZoneKind};
use crate::{MtgError, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use rustc_hash::FxHashMap;
use std::fmt;
use std::rc::Rc;

/// Index of a team in the game's team list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeamId(pub usize);

/// Everything needed to add a player
#[derive(Debug, Clone, Default)]
pub struct PlayerSetup {
    pub name: PlayerName,
    /// Library contents, bottom first
    pub library: Vec<CardDefinition>,
    /// Team to join; `None` starts a new team
    pub team: Option<TeamId>,
}

impl PlayerSetup {
    pub fn new(name: impl Into<PlayerName>) -> Self {
        PlayerSetup {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_library(mut self, library: Vec<CardDefinition>) -> Self {
        self.library = library;
        self
    }

    #[must_use]
    pub fn on_team(mut self, team: TeamId) -> Self {
        self.team = Some(team);
        self
    }
}

/// Complete game state
///
/// The game owns every card, player and zone, the turn manager and the
/// event bus. All mutation goes through `Game` methods so that zone
/// membership, the cards' zone back-references and the fired events agree.
#[derive(Debug)]
pub struct Game {
    /// All cards, tokens and spell copies in the game
    pub(super) cards: EntityStore<Card>,

    /// Players in the order they were added
    pub(super) players: Vec<Player>,

    /// Zones for each player
    pub(super) player_zones: Vec<(PlayerId, PlayerZones)>,

    pub(super) teams: Vec<Vec<PlayerId>>,

    /// Shared battlefield (all players)
    pub(super) battlefield: Zone,

    /// The stack (for spells and abilities)
    pub(super) stack: Zone,

    pub(super) turn: TurnManager,

    pub(super) events: EventBus,

    /// Centralized logger for game events
    pub logger: GameLogger,

    /// Drives library shuffles and turn order
    pub(super) rng: ChaCha12Rng,

    pub(super) config: GameConfig,

    catalog: Rc<dyn CardCatalog>,

    frontends: FxHashMap<PlayerId, Box<dyn Frontend>>,

    /// None = not started, Some(false) = in progress, Some(true) = over
    pub(super) ended: Option<bool>,

    /// Set while the state-based action sweep runs
    pub(super) checking_sba: bool,

    /// Set while `dispatch_events` drains the queue
    dispatching: bool,

    /// Unified entity ID generator (shared across all entity types)
    next_entity_id: u32,
}

impl Game {
    pub fn new() -> Self {
        Self::with_config(GameConfig::default())
    }

    pub fn with_config(config: GameConfig) -> Self {
        Game {
            cards: EntityStore::new(),
            players: Vec::new(),
            player_zones: Vec::new(),
            teams: Vec::new(),
            battlefield: Zone::new(ZoneId::battlefield()),
            stack: Zone::new(ZoneId::stack()),
            turn: TurnManager::new(),
            events: EventBus::new(config.record_history),
            logger: GameLogger::new(),
            rng: ChaCha12Rng::seed_from_u64(config.seed),
            catalog: Rc::new(MemoryCatalog::new()),
            frontends: FxHashMap::default(),
            ended: None,
            checking_sba: false,
            dispatching: false,
            next_entity_id: 0,
            config,
        }
    }

    /// Use `catalog` for ability implementations of cards created from now on
    #[must_use]
    pub fn with_catalog(mut self, catalog: Rc<dyn CardCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn catalog(&self) -> &dyn CardCatalog {
        self.catalog.as_ref()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Get next entity ID (unified across all entity types)
    pub(super) fn next_id<T>(&mut self) -> EntityId<T> {
        let id = EntityId::new(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    // ----- lifecycle -------------------------------------------------------

    pub fn is_started(&self) -> bool {
        self.ended.is_some()
    }

    pub fn has_ended(&self) -> bool {
        self.ended == Some(true)
    }

    /// None before start, then whether the game is over
    pub fn ended(&self) -> Option<bool> {
        self.ended
    }

    pub(super) fn require_started(&self) -> Result<()> {
        if self.is_started() {
            Ok(())
        } else {
            Err(MtgError::requirement(&*self, "started", "not started"))
        }
    }

    /// Add a player with the given library. Only possible before the start.
    pub fn add_player(&mut self, setup: PlayerSetup) -> Result<PlayerId> {
        if self.is_started() {
            return Err(MtgError::requirement(&*self, "not started", "started"));
        }
        if let Some(TeamId(team)) = setup.team {
            if team >= self.teams.len() {
                return Err(MtgError::NoSuchTeam(team));
            }
        }

        let player_id = self.next_id();
        let mut player = Player::new(player_id, setup.name, self.config.starting_life);
        player.hand_size = self.config.hand_size;
        player.lands_per_turn = self.config.lands_per_turn;

        let mut zones = PlayerZones::new(player_id);
        let catalog = Rc::clone(&self.catalog);
        for def in &setup.library {
            let card_id = self.next_id();
            let mut card = def.instantiate(card_id, player_id, catalog.as_ref());
            card.zone = Some(zones.library.id());
            self.cards.insert(card_id, card);
            zones.library.add(card_id);
        }

        match setup.team {
            Some(TeamId(team)) => self.teams[team].push(player_id),
            None => self.teams.push(vec![player_id]),
        }
        self.players.push(player);
        self.player_zones.push((player_id, zones));
        self.frontends.insert(player_id, Box::new(NoFrontend));
        Ok(player_id)
    }

    /// Start the game: randomize turn order, enter the first step, then
    /// every player shuffles and draws an opening hand.
    pub fn start(&mut self) -> Result<()> {
        if self.is_started() {
            return Err(MtgError::requirement(&*self, "not started", "started"));
        }
        let players = self.players();
        if players.is_empty() {
            return Err(MtgError::requirement(&*self, "at least 1 player", "0 players"));
        }

        self.events.trigger(GameEvent::GameStarted);
        self.ended = Some(false);
        self.logger
            .normal(&format!("Game started with {} players", players.len()));
        self.turn.start(&players, &mut self.rng, &mut self.events)?;
        self.log_turn_start();

        for player in players {
            self.shuffle_library(player)?;
            let hand_size = self.player(player)?.hand_size;
            self.draw_cards(player, hand_size)?;
        }
        self.dispatch_events()
    }

    /// End the game. Ending an ended game does nothing.
    pub fn end(&mut self) -> Result<()> {
        self.require_started()?;
        if self.has_ended() {
            return Ok(());
        }
        self.ended = Some(true);
        self.events.trigger(GameEvent::GameEnded);
        match self.winner() {
            Some(winner) => {
                let name = self.player(winner)?.to_string();
                self.logger.normal(&format!("Game over, {name} wins"));
            }
            None => self.logger.normal("Game over"),
        }
        self.dispatch_events()
    }

    /// End the game if at most one living player is left.
    ///
    /// Returns whether the game is over afterwards.
    pub fn end_if_dead(&mut self) -> Result<bool> {
        self.require_started()?;
        if !self.has_ended() && self.living_players().len() <= 1 {
            self.end()?;
        }
        Ok(self.has_ended())
    }

    /// The last player standing, once the game is over
    pub fn winner(&self) -> Option<PlayerId> {
        if !self.has_ended() {
            return None;
        }
        match self.living_players().as_slice() {
            [winner] => Some(*winner),
            _ => None,
        }
    }

    /// Run state-based actions, then give `to` (default: the active player)
    /// priority unless the game ended meanwhile.
    pub fn grant_priority(&mut self, to: Option<PlayerId>) -> Result<()> {
        self.require_started()?;
        let player = match to.or_else(|| self.turn.active_player()) {
            Some(player) => player,
            None => return Err(MtgError::requirement("Priority", "a player", "none")),
        };
        self.player(player)?;

        self.check_state_based_actions()?;
        if self.end_if_dead()? {
            return Ok(());
        }

        self.events.trigger(GameEvent::PriorityGranted { player });
        self.dispatch_events()?;
        self.with_frontend(player, |frontend, game| {
            frontend.priority_granted(game, player);
        });
        Ok(())
    }

    // ----- turn structure --------------------------------------------------

    pub fn turn(&self) -> &TurnManager {
        &self.turn
    }

    /// Advance to the next step (or phase), perform its turn-based actions
    /// and empty every mana pool. Completing the last step ends the turn.
    ///
    /// Handlers see the step's events before the pools are emptied.
    pub fn next_step(&mut self) -> Result<()> {
        self.require_started()?;
        let lap_complete = self.turn.next(&mut self.events)?;
        self.turn_based_actions()?;
        self.dispatch_events()?;
        for player in &mut self.players {
            player.mana_pool.empty();
        }
        if lap_complete {
            self.rotate_turn()?;
        }
        self.dispatch_events()
    }

    /// End the current turn and pass it to the next player in order.
    ///
    /// The phase cursor stays where it is; `next_step` calls this exactly
    /// when the cursor completes a lap.
    pub fn end_turn(&mut self) -> Result<()> {
        self.require_started()?;
        self.rotate_turn()?;
        self.dispatch_events()
    }

    fn rotate_turn(&mut self) -> Result<()> {
        let active = self.turn.end(&mut self.events)?;
        self.player_mut(active)?.reset_lands_played();
        self.log_turn_start();
        self.untap_permanents(active)
    }

    fn log_turn_start(&self) {
        if let Some(active) = self.turn.active_player() {
            let name = self
                .player(active)
                .map(|p| p.to_string())
                .unwrap_or_else(|_| active.to_string());
            self.logger
                .normal(&format!("Turn {}: {}", self.turn.turn_number(), name));
        }
    }

    // ----- players and teams -----------------------------------------------

    /// All players, team by team
    pub fn players(&self) -> Vec<PlayerId> {
        self.teams.iter().flatten().copied().collect()
    }

    pub fn living_players(&self) -> Vec<PlayerId> {
        self.players()
            .into_iter()
            .filter(|&id| self.player(id).map(|p| !p.is_dead()).unwrap_or(false))
            .collect()
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .ok_or(MtgError::EntityNotFound(id.as_u32()))
    }

    pub(super) fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(MtgError::EntityNotFound(id.as_u32()))
    }

    pub fn teams(&self) -> &[Vec<PlayerId>] {
        &self.teams
    }

    pub fn team_of(&self, player: PlayerId) -> Option<TeamId> {
        self.teams
            .iter()
            .position(|team| team.contains(&player))
            .map(TeamId)
    }

    /// Every player not on `player`'s team
    pub fn opponents(&self, player: PlayerId) -> Vec<PlayerId> {
        let team = self.team_of(player);
        self.teams
            .iter()
            .enumerate()
            .filter(|(idx, _)| Some(TeamId(*idx)) != team)
            .flat_map(|(_, members)| members.iter().copied())
            .collect()
    }

    // ----- frontends -------------------------------------------------------

    pub fn set_frontend(&mut self, player: PlayerId, frontend: Box<dyn Frontend>) -> Result<()> {
        self.player(player)?;
        self.frontends.insert(player, frontend);
        Ok(())
    }

    /// Ask `player`'s frontend to choose up to `count` of `choices`
    pub fn select_cards(
        &mut self,
        player: PlayerId,
        choices: &[CardId],
        count: usize,
    ) -> Result<Vec<CardId>> {
        self.player(player)?;
        let mut picked =
            self.with_frontend(player, |frontend, game| {
                frontend.select_cards(game, player, choices, count)
            });
        picked.retain(|card| choices.contains(card));
        picked.truncate(count);
        Ok(picked)
    }

    /// Call a frontend with a read-only view of the game. The frontend is
    /// taken out of the map for the duration of the call.
    fn with_frontend<R>(
        &mut self,
        player: PlayerId,
        f: impl FnOnce(&mut dyn Frontend, &Game) -> R,
    ) -> R {
        let mut frontend = self
            .frontends
            .remove(&player)
            .unwrap_or_else(|| Box::new(NoFrontend));
        let out = f(frontend.as_mut(), &*self);
        self.frontends.insert(player, frontend);
        out
    }

    // ----- events ----------------------------------------------------------

    /// Read access to the bus (history, pending events)
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn clear_history(&mut self) {
        self.events.clear_history();
    }

    pub fn subscribe(&mut self, handler: Box<dyn EventHandler>) -> HandlerId {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: HandlerId) {
        self.events.unsubscribe(id);
    }

    /// Deliver queued events to the handlers, in subscription order.
    ///
    /// Called by every public operation before it returns. While dispatch
    /// is running, nested calls return at once and the outer loop delivers
    /// whatever the handlers triggered. A failing handler stops dispatch and
    /// drops the remaining queue.
    pub fn dispatch_events(&mut self) -> Result<()> {
        if self.dispatching {
            return Ok(());
        }
        self.dispatching = true;
        let result = self.drain_events();
        self.dispatching = false;
        if result.is_err() {
            self.events.discard_queued();
        }
        result
    }

    fn drain_events(&mut self) -> Result<()> {
        while let Some(event) = self.events.pop_queued() {
            #[cfg(feature = "verbose-logging")]
            self.logger.event(&event);

            let mut handlers = self.events.take_handlers();
            let mut outcome = Ok(());
            for (id, handler) in handlers.iter_mut() {
                if self.events.is_removed(*id) {
                    continue;
                }
                if let Err(err) = handler.handle(self, &event) {
                    outcome = Err(MtgError::Handler {
                        handler: handler.name().to_string(),
                        message: err.to_string(),
                    });
                    break;
                }
            }
            self.events.restore_handlers(handlers);
            outcome?;
        }
        Ok(())
    }

    // ----- cards and zones -------------------------------------------------

    pub fn card(&self, id: CardId) -> Result<&Card> {
        self.cards.get(id)
    }

    /// Mutable access to a card's characteristics. Zone membership can only
    /// change through the zone operations.
    pub fn card_mut(&mut self, id: CardId) -> Result<&mut Card> {
        self.cards.get_mut(id)
    }

    pub fn cards(&self) -> &EntityStore<Card> {
        &self.cards
    }

    pub fn battlefield(&self) -> &Zone {
        &self.battlefield
    }

    pub fn stack(&self) -> &Zone {
        &self.stack
    }

    /// Get player zones for a specific player
    pub fn zones(&self, player: PlayerId) -> Result<&PlayerZones> {
        self.player_zones
            .iter()
            .find(|(id, _)| *id == player)
            .map(|(_, zones)| zones)
            .ok_or(MtgError::EntityNotFound(player.as_u32()))
    }

    pub(super) fn zones_mut(&mut self, player: PlayerId) -> Result<&mut PlayerZones> {
        self.player_zones
            .iter_mut()
            .find(|(id, _)| *id == player)
            .map(|(_, zones)| zones)
            .ok_or(MtgError::EntityNotFound(player.as_u32()))
    }

    pub fn zone(&self, id: ZoneId) -> Result<&Zone> {
        match (id.kind, id.owner) {
            (ZoneKind::Battlefield, _) => Ok(&self.battlefield),
            (ZoneKind::Stack, _) => Ok(&self.stack),
            (kind, Some(owner)) => self
                .zones(owner)?
                .get_zone(kind)
                .ok_or_else(|| unowned_zone(id)),
            (_, None) => Err(unowned_zone(id)),
        }
    }

    pub(super) fn zone_mut(&mut self, id: ZoneId) -> Result<&mut Zone> {
        match (id.kind, id.owner) {
            (ZoneKind::Battlefield, _) => Ok(&mut self.battlefield),
            (ZoneKind::Stack, _) => Ok(&mut self.stack),
            (kind, Some(owner)) => self
                .zones_mut(owner)?
                .get_zone_mut(kind)
                .ok_or_else(|| unowned_zone(id)),
            (_, None) => Err(unowned_zone(id)),
        }
    }

    /// Find the zone holding `card` by scanning every zone.
    /// Cards are in no zone until the game has started.
    pub fn locate(&self, card: CardId) -> Option<ZoneId> {
        if !self.is_started() {
            return None;
        }
        if self.battlefield.contains(card) {
            return Some(self.battlefield.id());
        }
        if self.stack.contains(card) {
            return Some(self.stack.id());
        }
        self.player_zones
            .iter()
            .flat_map(|(_, zones)| zones.all())
            .find(|zone| zone.contains(card))
            .map(Zone::id)
    }

    pub fn shuffle_library(&mut self, player: PlayerId) -> Result<()> {
        let zones = self
            .player_zones
            .iter_mut()
            .find(|(id, _)| *id == player)
            .map(|(_, zones)| zones)
            .ok_or(MtgError::EntityNotFound(player.as_u32()))?;
        zones.library.shuffle(&mut self.rng)
    }

    /// Put a card that is in no zone into `to`. Fires no event.
    pub fn put(&mut self, card: CardId, to: ZoneId) -> Result<()> {
        let current = self.card(card)?;
        if let Some(zone) = current.zone {
            return Err(MtgError::requirement(current, "in no zone", zone));
        }
        self.zone_mut(to)?.add(card);
        self.cards.get_mut(card)?.zone = Some(to);
        Ok(())
    }

    /// Create a card from `def` owned by `owner` directly in `zone`
    pub fn create_card(
        &mut self,
        def: &CardDefinition,
        owner: PlayerId,
        zone: ZoneId,
    ) -> Result<CardId> {
        self.player(owner)?;
        self.zone(zone)?;
        let card_id = self.next_id();
        let card = def.instantiate(card_id, owner, self.catalog.as_ref());
        self.cards.insert(card_id, card);
        self.put(card_id, zone)?;
        Ok(card_id)
    }

    /// Move a card from the zone it is in to `to`
    pub fn move_card(&mut self, card: CardId, to: ZoneId) -> Result<()> {
        let current = self.card(card)?;
        let from = match current.zone {
            Some(zone) => zone,
            None => return Err(MtgError::requirement(current, "in a zone", "no zone")),
        };
        self.relocate(card, from, to)?;
        self.dispatch_events()
    }

    /// Move a card out of the named zone into `to`. Fails if the card is
    /// not in `from`.
    pub fn move_card_from(&mut self, card: CardId, from: ZoneId, to: ZoneId) -> Result<()> {
        self.relocate(card, from, to)?;
        self.dispatch_events()
    }

    /// Remove from `from`, add to `to`, fix up the back-reference and fire
    /// `card.zone_changed`. Nothing changes if `card` is not in `from`.
    pub(super) fn relocate(&mut self, card: CardId, from: ZoneId, to: ZoneId) -> Result<()> {
        self.card(card)?;
        self.zone(to)?;
        self.zone_mut(from)?.remove(card)?;
        self.zone_mut(to)?.add(card);

        let leaving_battlefield =
            from.kind == ZoneKind::Battlefield && to.kind != ZoneKind::Battlefield;
        let moved = self.cards.get_mut(card)?;
        moved.zone = Some(to);
        if leaving_battlefield {
            moved.reset_permanent_state();
        }
        log_if_verbose!(self.logger, "{} moves from {from} to {to}", moved.name);

        if leaving_battlefield {
            for other in self.battlefield.cards().to_vec() {
                let attached = self.cards.get_mut(other)?;
                if attached.attached_to == Some(card) {
                    attached.attached_to = None;
                }
            }
        }

        self.events.trigger(GameEvent::ZoneChanged { card, from, to });
        Ok(())
    }
}

fn unowned_zone(id: ZoneId) -> MtgError {
    MtgError::InvalidValue(format!("{} zone needs an owner", id.kind.name()))
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} player game", self.players.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CardType;

    fn forest() -> CardDefinition {
        CardDefinition::new("Forest").with_type(CardType::Land)
    }

    #[test]
    fn test_add_player_builds_library() {
        let mut game = Game::new();
        let alice = game
            .add_player(PlayerSetup::new("Alice").with_library(vec![forest(); 3]))
            .unwrap();

        let zones = game.zones(alice).unwrap();
        assert_eq!(zones.library.len(), 3);
        for card in zones.library.iter() {
            let card = game.card(card).unwrap();
            assert_eq!(card.owner, alice);
            assert_eq!(card.controller, alice);
            assert_eq!(card.zone(), Some(ZoneId::library(alice)));
        }
        assert_eq!(game.team_of(alice), Some(TeamId(0)));
    }

    #[test]
    fn test_teams() {
        let mut game = Game::new();
        let a = game.add_player(PlayerSetup::new("A")).unwrap();
        let b = game.add_player(PlayerSetup::new("B").on_team(TeamId(0))).unwrap();
        let c = game.add_player(PlayerSetup::new("C")).unwrap();

        assert_eq!(game.teams().len(), 2);
        assert_eq!(game.team_of(b), Some(TeamId(0)));
        assert_eq!(game.opponents(a), vec![c]);
        assert_eq!(game.opponents(c), vec![a, b]);

        let err = game.add_player(PlayerSetup::new("D").on_team(TeamId(5))).unwrap_err();
        assert_eq!(err, MtgError::NoSuchTeam(5));
        assert_eq!(game.players().len(), 3);
    }

    #[test]
    fn test_unstarted_game_reports_nothing() {
        let game = Game::new();
        assert_eq!(game.ended(), None);
        assert!(!game.is_started());
        assert_eq!(game.turn().active_player(), None);
        assert_eq!(game.turn().phase(), None);
    }

    #[test]
    fn test_start_requires_a_player() {
        let mut game = Game::new();
        assert!(matches!(game.start(), Err(MtgError::RequirementNotMet { .. })));
        assert!(!game.is_started());
    }

    #[test]
    fn test_locate_and_put() {
        let mut game = Game::new();
        let alice = game.add_player(PlayerSetup::new("Alice")).unwrap();
        let card = game
            .create_card(&forest(), alice, ZoneId::hand(alice))
            .unwrap();

        assert_eq!(game.locate(card), None);
        assert_eq!(game.card(card).unwrap().zone(), Some(ZoneId::hand(alice)));
        assert!(matches!(
            game.put(card, ZoneId::battlefield()),
            Err(MtgError::RequirementNotMet { .. })
        ));

        game.start().unwrap();
        assert_eq!(game.locate(card), Some(ZoneId::hand(alice)));
    }

    #[test]
    fn test_relocate_missing_card_changes_nothing() {
        let mut game = Game::new();
        let alice = game.add_player(PlayerSetup::new("Alice")).unwrap();
        let card = game
            .create_card(&forest(), alice, ZoneId::hand(alice))
            .unwrap();

        let err = game
            .move_card_from(card, ZoneId::stack(), ZoneId::battlefield())
            .unwrap_err();
        assert_eq!(err.to_string(), format!("Card {card} not found in stack"));
        assert!(game.zones(alice).unwrap().hand.contains(card));
        assert!(game.battlefield().is_empty());
        assert!(game.events().history().is_empty());
    }

    #[test]
    fn test_player_zone_needs_owner() {
        let game = Game::new();
        assert!(matches!(
            game.zone(ZoneId::shared(ZoneKind::Hand)),
            Err(MtgError::InvalidValue(_))
        ));
        assert_eq!(game.zone(ZoneId::stack()).unwrap().kind(), ZoneKind::Stack);
    }
}
