//! State-based actions
//!
//! The sweep runs at priority boundaries (`grant_priority`), not after
//! every mutation: losing life or taking damage only marks the state, and
//! the next sweep acts on it.

use crate::core::{CardId, CardKind, CardType, DeathReason};
use crate::game::events::GameEvent;
use crate::game::logger::log_if_verbose;
use crate::game::Game;
use crate::zones::ZoneId;
use crate::Result;

impl Game {
    /// Check every living player and every permanent once, applying the
    /// state-based actions that hold. Calls made while a sweep is already
    /// running return without doing anything.
    pub fn check_state_based_actions(&mut self) -> Result<()> {
        self.require_started()?;
        if self.checking_sba {
            return Ok(());
        }
        self.checking_sba = true;
        let result = self.sweep();
        self.checking_sba = false;
        result?;
        self.dispatch_events()
    }

    fn sweep(&mut self) -> Result<()> {
        self.check_players()?;
        self.check_permanents()?;
        self.check_misplaced_objects()
    }

    fn check_players(&mut self) -> Result<()> {
        let poison_limit = self.config.poison_limit;
        for id in self.players() {
            let player = self.player(id)?;
            if player.is_dead() {
                continue;
            }
            let reason = if player.life() <= 0 {
                DeathReason::Life
            } else if player.drew_from_empty_library() {
                DeathReason::Library
            } else if player.poison >= poison_limit {
                DeathReason::Poison
            } else {
                continue;
            };
            self.kill(id, reason)?;
        }
        Ok(())
    }

    fn check_permanents(&mut self) -> Result<()> {
        for card in self.battlefield.cards().to_vec() {
            let permanent = self.card(card)?;
            let dies = if permanent.is_creature() {
                permanent.has_lethal_damage()
            } else if permanent.is_type(CardType::Planeswalker) {
                permanent.loyalty.unwrap_or(0) <= 0
            } else if permanent.is_type(CardType::Enchantment) {
                permanent.attached_to.is_none()
            } else {
                false
            };
            if dies {
                let owner = permanent.owner;
                self.relocate(card, ZoneId::battlefield(), ZoneId::graveyard(owner))?;
            }
        }
        Ok(())
    }

    /// Tokens off the battlefield and spell copies off the stack
    fn check_misplaced_objects(&mut self) -> Result<()> {
        for id in self.cards.ids_sorted() {
            let object = self.card(id)?;
            let misplaced = match object.kind {
                CardKind::Card => false,
                CardKind::Token => object.zone() != Some(ZoneId::battlefield()),
                CardKind::SpellCopy { .. } => object.zone() != Some(ZoneId::stack()),
            };
            if misplaced {
                self.cease_to_exist(id)?;
            }
        }
        Ok(())
    }

    /// Remove an object from its zone and from the game
    fn cease_to_exist(&mut self, card: CardId) -> Result<()> {
        if let Some(zone) = self.card(card)?.zone() {
            self.zone_mut(zone)?.remove(card)?;
        }
        if let Some(removed) = self.cards.remove(card) {
            log_if_verbose!(self.logger, "{} ceases to exist", removed.name);
        }
        self.events.trigger(GameEvent::CeasedToExist { card });
        Ok(())
    }
}
