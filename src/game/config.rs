//! Game configuration
//!
//! Rule constants a game is created with. Everything has the standard
//! two-player default; builders override single values.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub starting_life: i32,

    /// Cards drawn by each player when the game starts
    pub hand_size: usize,

    pub lands_per_turn: u32,

    /// Poison counters at which a player loses
    pub poison_limit: u32,

    /// Seed for library shuffles and turn order
    pub seed: u64,

    /// The player who goes first skips the draw of turn 1
    pub skip_first_draw: bool,

    /// Keep every triggered event in the bus history
    pub record_history: bool,
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_starting_life(mut self, life: i32) -> Self {
        self.starting_life = life;
        self
    }

    #[must_use]
    pub fn with_hand_size(mut self, hand_size: usize) -> Self {
        self.hand_size = hand_size;
        self
    }

    #[must_use]
    pub fn with_first_draw(mut self) -> Self {
        self.skip_first_draw = false;
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            starting_life: 20,
            hand_size: 7,
            lands_per_turn: 1,
            poison_limit: 10,
            seed: 0,
            skip_first_draw: true,
            record_history: true,
        }
    }
}
