//! Game events and the per-game event bus
//!
//! Components publish by calling `EventBus::trigger`, which records the
//! event and queues it. `Game::dispatch_events` then hands each queued event
//! to every subscribed handler in subscription order. Events raised while
//! handlers run are queued behind the current one, so dispatch is
//! breadth-first and never re-enters a handler.

use crate::core::{CardId, Color, DeathReason, PlayerId, StatusChange};
use crate::game::phase::{Phase, Step};
use crate::game::Game;
use crate::zones::ZoneId;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Everything that can happen in a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    GameStarted,
    GameEnded,
    TurnStarted { player: PlayerId },
    TurnEnded { player: PlayerId },
    PhaseStarted(Phase),
    PhaseEnded(Phase),
    StepStarted(Phase, Step),
    StepEnded(Phase, Step),

    LifeGained { player: PlayerId, amount: u32 },
    LifeLost { player: PlayerId, amount: u32 },
    ManaAdded { player: PlayerId, color: Color },
    ManaRemoved { player: PlayerId, color: Color },
    Drew { player: PlayerId, card: CardId },
    Died { player: PlayerId, reason: DeathReason },
    Conceded { player: PlayerId },
    PriorityGranted { player: PlayerId },

    StatusChanged { card: CardId, status: StatusChange },
    ZoneChanged { card: CardId, from: ZoneId, to: ZoneId },
    CardCast { card: CardId, player: PlayerId },
    LandPlayed { card: CardId, player: PlayerId },
    CeasedToExist { card: CardId },
}

impl GameEvent {
    /// Dotted event id, e.g. `game.turn.phase.combat.declare_attackers.started`
    pub fn id(&self) -> String {
        match self {
            GameEvent::GameStarted => "game.started".to_string(),
            GameEvent::GameEnded => "game.ended".to_string(),
            GameEvent::TurnStarted { .. } => "game.turn.started".to_string(),
            GameEvent::TurnEnded { .. } => "game.turn.ended".to_string(),
            GameEvent::PhaseStarted(phase) => format!("game.turn.phase.{}.started", phase.name()),
            GameEvent::PhaseEnded(phase) => format!("game.turn.phase.{}.ended", phase.name()),
            GameEvent::StepStarted(phase, step) => {
                format!("game.turn.phase.{}.{}.started", phase.name(), step.name())
            }
            GameEvent::StepEnded(phase, step) => {
                format!("game.turn.phase.{}.{}.ended", phase.name(), step.name())
            }
            GameEvent::LifeGained { .. } => "player.life.gained".to_string(),
            GameEvent::LifeLost { .. } => "player.life.lost".to_string(),
            GameEvent::ManaAdded { color, .. } => format!("player.mana.{}.added", color.name()),
            GameEvent::ManaRemoved { color, .. } => {
                format!("player.mana.{}.removed", color.name())
            }
            GameEvent::Drew { .. } => "player.draw".to_string(),
            GameEvent::Died { .. } => "player.died".to_string(),
            GameEvent::Conceded { .. } => "player.conceded".to_string(),
            GameEvent::PriorityGranted { .. } => "player.priority_granted".to_string(),
            GameEvent::StatusChanged { .. } => "card.status_changed".to_string(),
            GameEvent::ZoneChanged { .. } => "card.zone_changed".to_string(),
            GameEvent::CardCast { .. } => "card.cast".to_string(),
            GameEvent::LandPlayed { .. } => "card.land_played".to_string(),
            GameEvent::CeasedToExist { .. } => "card.ceased_to_exist".to_string(),
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::TurnStarted { player } | GameEvent::TurnEnded { player } => {
                write!(f, "{} (player {player})", self.id())
            }
            GameEvent::LifeGained { player, amount } | GameEvent::LifeLost { player, amount } => {
                write!(f, "{} (player {player}, {amount})", self.id())
            }
            GameEvent::Died { player, reason } => {
                write!(f, "{} (player {player}, {reason})", self.id())
            }
            GameEvent::StatusChanged { card, status } => {
                write!(f, "{} (card {card}, {status})", self.id())
            }
            GameEvent::ZoneChanged { card, from, to } => {
                write!(f, "{} (card {card}, {from} -> {to})", self.id())
            }
            GameEvent::Drew { player, card }
            | GameEvent::CardCast { card, player }
            | GameEvent::LandPlayed { card, player } => {
                write!(f, "{} (player {player}, card {card})", self.id())
            }
            _ => write!(f, "{}", self.id()),
        }
    }
}

/// A subscriber to game events
///
/// Handlers get mutable access to the game and may change it or trigger
/// further events; those are delivered after the current event has reached
/// every handler.
pub trait EventHandler: fmt::Debug {
    /// Name used in error messages
    fn name(&self) -> &str;

    fn handle(&mut self, game: &mut Game, event: &GameEvent) -> Result<()>;
}

/// Returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u32);

type Subscription = (HandlerId, Box<dyn EventHandler>);

/// Queue, history and subscribers of one game's events
#[derive(Debug, Default)]
pub struct EventBus {
    queue: VecDeque<GameEvent>,
    history: Vec<GameEvent>,
    record_history: bool,
    handlers: Vec<Subscription>,
    /// Unsubscribed while the handler list was out for dispatch
    removed: Vec<HandlerId>,
    next_handler: u32,
}

impl EventBus {
    pub fn new(record_history: bool) -> Self {
        EventBus {
            record_history,
            ..Default::default()
        }
    }

    /// Publish an event: record it and queue it for dispatch
    pub fn trigger(&mut self, event: GameEvent) {
        if self.record_history {
            self.history.push(event.clone());
        }
        self.queue.push_back(event);
    }

    /// Every event triggered since the last `clear_history`, in order
    pub fn history(&self) -> &[GameEvent] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Number of events waiting for dispatch
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn subscribe(&mut self, handler: Box<dyn EventHandler>) -> HandlerId {
        let id = HandlerId(self.next_handler);
        self.next_handler += 1;
        self.handlers.push((id, handler));
        id
    }

    pub fn unsubscribe(&mut self, id: HandlerId) {
        match self.handlers.iter().position(|(h, _)| *h == id) {
            Some(pos) => {
                self.handlers.remove(pos);
            }
            None => self.removed.push(id),
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub(crate) fn pop_queued(&mut self) -> Option<GameEvent> {
        self.queue.pop_front()
    }

    pub(crate) fn discard_queued(&mut self) {
        self.queue.clear();
    }

    /// Take the handler list out so handlers can borrow the game mutably
    pub(crate) fn take_handlers(&mut self) -> Vec<Subscription> {
        std::mem::take(&mut self.handlers)
    }

    /// Put the handler list back, keeping handlers subscribed in the
    /// meantime (after the existing ones) and dropping unsubscribed ones
    pub(crate) fn restore_handlers(&mut self, mut handlers: Vec<Subscription>) {
        handlers.append(&mut self.handlers);
        let removed = std::mem::take(&mut self.removed);
        handlers.retain(|(id, _)| !removed.contains(id));
        self.handlers = handlers;
    }

    pub(crate) fn is_removed(&self, id: HandlerId) -> bool {
        self.removed.contains(&id)
    }
}
