//! Game state, turn structure, events and the rules that drive them

pub mod actions;
pub mod config;
pub mod events;
pub mod frontend;
pub mod logger;
pub mod phase;
pub mod sba;
pub mod state;

pub use config::GameConfig;
pub use events::{EventBus, EventHandler, GameEvent, HandlerId};
pub use frontend::{Frontend, NoFrontend};
pub use logger::{GameLogger, LogEntry, OutputFormat, OutputMode, VerbosityLevel};
pub use phase::{Phase, Step, TurnManager};
pub use state::{Game, PlayerSetup, TeamId};
