//! Player representation

use crate::core::{EntityId, GameEntity, ManaPool, PlayerName};
use crate::game::events::{EventBus, GameEvent};
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type PlayerId = EntityId<Player>;

/// Why a player left the game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathReason {
    /// Life total was 0 or less
    Life,
    /// Drew from an empty library
    Library,
    /// Ten or more poison counters
    Poison,
    Concede,
    /// Lost to a card effect
    Effect(String),
}

impl fmt::Display for DeathReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeathReason::Life => write!(f, "life"),
            DeathReason::Library => write!(f, "library"),
            DeathReason::Poison => write!(f, "poison"),
            DeathReason::Concede => write!(f, "concede"),
            DeathReason::Effect(effect) => write!(f, "{effect}"),
        }
    }
}

/// Represents a player in the game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: PlayerName,

    life: i32,

    /// Poison counters
    pub poison: u32,

    pub mana_pool: ManaPool,

    /// Cards drawn at game start
    pub hand_size: usize,

    pub lands_this_turn: u32,
    pub lands_per_turn: u32,

    death_by: Option<DeathReason>,

    /// Set by a draw that asked for more cards than the library held;
    /// read by the state-based action sweep
    pub(crate) drew_from_empty_library: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<PlayerName>, starting_life: i32) -> Self {
        Player {
            id,
            name: name.into(),
            life: starting_life,
            poison: 0,
            mana_pool: ManaPool::new(id),
            hand_size: 7,
            lands_this_turn: 0,
            lands_per_turn: 1,
            death_by: None,
            drew_from_empty_library: false,
        }
    }

    pub fn life(&self) -> i32 {
        self.life
    }

    /// Set the life total, firing gained or lost (nothing if unchanged)
    pub fn set_life(&mut self, amount: i32, events: &mut EventBus) {
        let player = self.id;
        if amount == self.life {
            return;
        } else if amount > self.life {
            events.trigger(GameEvent::LifeGained {
                player,
                amount: amount.abs_diff(self.life),
            });
        } else {
            events.trigger(GameEvent::LifeLost {
                player,
                amount: amount.abs_diff(self.life),
            });
        }
        self.life = amount;
    }

    pub fn is_dead(&self) -> bool {
        self.death_by.is_some()
    }

    pub fn death_by(&self) -> Option<&DeathReason> {
        self.death_by.as_ref()
    }

    pub fn drew_from_empty_library(&self) -> bool {
        self.drew_from_empty_library
    }

    /// End the player's life. A player can only die once.
    pub fn die(&mut self, reason: DeathReason, events: &mut EventBus) -> Result<()> {
        if let Some(previous) = &self.death_by {
            return Err(MtgError::requirement(
                &*self,
                "alive",
                format!("dead ({previous})"),
            ));
        }
        events.trigger(GameEvent::Died {
            player: self.id,
            reason: reason.clone(),
        });
        self.death_by = Some(reason);
        Ok(())
    }

    pub fn can_play_land(&self) -> bool {
        self.lands_this_turn < self.lands_per_turn
    }

    pub fn play_land(&mut self) {
        self.lands_this_turn += 1;
    }

    pub fn reset_lands_played(&mut self) {
        self.lands_this_turn = 0;
    }
}

impl GameEntity<Player> for Player {
    fn id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.as_str().is_empty() {
            write!(f, "Player")
        } else {
            write!(f, "Player: {}", self.name)
        }
    }
}
