//! Cardboard - a rules engine for Magic: The Gathering style card games
//!
//! Models cards, players and zones, the phase/step turn cycle and the
//! state-based actions, connected by a per-game event bus.

pub mod core;
pub mod error;
pub mod game;
pub mod zones;

pub use error::{MtgError, Result};
