//! Frontend trait: the interface between the engine and whoever plays
//!
//! The game calls a player's frontend when that player receives priority,
//! and card implementations call it when a choice must be made. Frontends
//! see a read-only `Game`.

use crate::core::{CardId, PlayerId};
use crate::game::Game;

pub trait Frontend: std::fmt::Debug {
    /// The player was granted priority
    fn priority_granted(&mut self, game: &Game, player: PlayerId);

    /// Choose up to `count` cards out of `choices`
    fn select_cards(
        &mut self,
        game: &Game,
        player: PlayerId,
        choices: &[CardId],
        count: usize,
    ) -> Vec<CardId>;
}

/// Frontend that never acts: ignores priority and takes the first `count`
/// choices
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFrontend;

impl Frontend for NoFrontend {
    fn priority_granted(&mut self, _game: &Game, _player: PlayerId) {}

    fn select_cards(
        &mut self,
        _game: &Game,
        _player: PlayerId,
        choices: &[CardId],
        count: usize,
    ) -> Vec<CardId> {
        choices.iter().take(count).copied().collect()
    }
}
