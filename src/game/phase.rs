//! Turn phases and steps, and the turn manager that cycles through them

use crate::core::PlayerId;
use crate::game::events::{EventBus, GameEvent};
use crate::{MtgError, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Major phases of a turn, in turn order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Beginning,
    FirstMain,
    Combat,
    SecondMain,
    Ending,
}

/// Specific steps within phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    // Beginning Phase
    Untap,
    Upkeep,
    Draw,

    // Combat Phase
    BeginningOfCombat,
    DeclareAttackers,
    DeclareBlockers,
    CombatDamage,
    EndOfCombat,

    // Ending Phase
    End,
    Cleanup,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Beginning,
        Phase::FirstMain,
        Phase::Combat,
        Phase::SecondMain,
        Phase::Ending,
    ];

    /// Name used in event ids (`game.turn.phase.<name>.started`)
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Beginning => "beginning",
            Phase::FirstMain => "first_main",
            Phase::Combat => "combat",
            Phase::SecondMain => "second_main",
            Phase::Ending => "ending",
        }
    }

    /// Steps of this phase in order. Main phases have none.
    pub fn steps(&self) -> &'static [Step] {
        match self {
            Phase::Beginning => &[Step::Untap, Step::Upkeep, Step::Draw],
            Phase::FirstMain | Phase::SecondMain => &[],
            Phase::Combat => &[
                Step::BeginningOfCombat,
                Step::DeclareAttackers,
                Step::DeclareBlockers,
                Step::CombatDamage,
                Step::EndOfCombat,
            ],
            Phase::Ending => &[Step::End, Step::Cleanup],
        }
    }

    /// Number of `next()` calls this phase takes; a stepless phase still
    /// occupies one position
    fn positions(&self) -> usize {
        self.steps().len().max(1)
    }
}

impl Step {
    /// Get the phase this step belongs to
    pub fn phase(&self) -> Phase {
        match self {
            Step::Untap | Step::Upkeep | Step::Draw => Phase::Beginning,
            Step::BeginningOfCombat
            | Step::DeclareAttackers
            | Step::DeclareBlockers
            | Step::CombatDamage
            | Step::EndOfCombat => Phase::Combat,
            Step::End | Step::Cleanup => Phase::Ending,
        }
    }

    /// Name used in event ids, unique within the step's phase
    pub fn name(&self) -> &'static str {
        match self {
            Step::Untap => "untap",
            Step::Upkeep => "upkeep",
            Step::Draw => "draw",
            Step::BeginningOfCombat => "beginning",
            Step::DeclareAttackers => "declare_attackers",
            Step::DeclareBlockers => "declare_blockers",
            Step::CombatDamage => "combat_damage",
            Step::EndOfCombat => "end",
            Step::End => "end",
            Step::Cleanup => "cleanup",
        }
    }
}

/// Total `next()` calls in one lap of the phase cycle
pub fn positions_per_turn() -> usize {
    Phase::ALL.iter().map(Phase::positions).sum()
}

/// Drives the phase/step cycle and the rotation of the active player
///
/// The phase cycle and the turn order rotate independently: `end()` only
/// rotates the players, so ending a turn from the middle of a phase leaves
/// the phase cursor where it was. `Game::next_step` keeps the two in step
/// by calling `end()` exactly when the phase cycle completes a lap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnManager {
    /// Current phase is always at the front
    phases: VecDeque<Phase>,
    step_index: usize,
    /// Turn order; the active player is at the front
    order: VecDeque<PlayerId>,
    started: bool,
    turn_number: u32,
}

impl TurnManager {
    pub fn new() -> Self {
        TurnManager {
            phases: Phase::ALL.into_iter().collect(),
            step_index: 0,
            order: VecDeque::new(),
            started: false,
            turn_number: 1,
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whose turn it is, or None before the game starts
    pub fn active_player(&self) -> Option<PlayerId> {
        if self.started {
            self.order.front().copied()
        } else {
            None
        }
    }

    /// Turn order starting with the active player (empty before start)
    pub fn order(&self) -> Vec<PlayerId> {
        self.order.iter().copied().collect()
    }

    pub fn phase(&self) -> Option<Phase> {
        if self.started {
            self.phases.front().copied()
        } else {
            None
        }
    }

    /// Current step, or None before start and during stepless phases
    pub fn step(&self) -> Option<Step> {
        let phase = self.phase()?;
        phase.steps().get(self.step_index).copied()
    }

    /// Current turn number (starts at 1)
    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    /// True when the cursor sits on the first step of the first phase
    pub fn at_turn_start(&self) -> bool {
        self.phases.front() == Some(&Phase::ALL[0]) && self.step_index == 0
    }

    fn require_started(&self) -> Result<()> {
        if self.started {
            Ok(())
        } else {
            Err(MtgError::requirement("Turn manager", "started", "not started"))
        }
    }

    /// Randomize the turn order and enter the first step of the first phase
    pub fn start(
        &mut self,
        players: &[PlayerId],
        rng: &mut impl Rng,
        events: &mut EventBus,
    ) -> Result<()> {
        if self.started {
            return Err(MtgError::requirement("Turn manager", "not started", "started"));
        }
        let mut order = players.to_vec();
        order.shuffle(rng);
        self.order = order.into_iter().collect();
        self.started = true;

        if let Some(player) = self.active_player() {
            events.trigger(GameEvent::TurnStarted { player });
        }
        self.fire_entered(true, events);
        Ok(())
    }

    /// Advance to the next step, or the next phase when the steps run out.
    ///
    /// Returns true when the cursor has come back to the first step of the
    /// first phase, i.e. the caller must end the turn.
    pub fn next(&mut self, events: &mut EventBus) -> Result<bool> {
        self.require_started()?;
        let Some(phase) = self.phases.front().copied() else {
            return Err(MtgError::InvalidAction("Turn manager has no phases".to_string()));
        };

        if let Some(step) = phase.steps().get(self.step_index) {
            events.trigger(GameEvent::StepEnded(phase, *step));
        }

        let entered_phase = self.step_index + 1 >= phase.positions();
        if entered_phase {
            events.trigger(GameEvent::PhaseEnded(phase));
            self.phases.rotate_left(1);
            self.step_index = 0;
        } else {
            self.step_index += 1;
        }

        self.fire_entered(entered_phase, events);
        Ok(self.at_turn_start())
    }

    fn fire_entered(&self, entered_phase: bool, events: &mut EventBus) {
        let Some(phase) = self.phases.front().copied() else {
            return;
        };
        if entered_phase {
            events.trigger(GameEvent::PhaseStarted(phase));
        }
        if let Some(step) = phase.steps().get(self.step_index) {
            events.trigger(GameEvent::StepStarted(phase, *step));
        }
    }

    /// End the current turn: the next player in order becomes active.
    ///
    /// The phase cursor is not touched.
    pub fn end(&mut self, events: &mut EventBus) -> Result<PlayerId> {
        self.require_started()?;
        let Some(ending) = self.order.front().copied() else {
            return Err(MtgError::InvalidAction("Turn order is empty".to_string()));
        };
        events.trigger(GameEvent::TurnEnded { player: ending });
        self.order.rotate_left(1);
        self.turn_number += 1;
        let player = self.order.front().copied().unwrap_or(ending);
        events.trigger(GameEvent::TurnStarted { player });
        Ok(player)
    }
}

impl Default for TurnManager {
    fn default() -> Self {
        Self::new()
    }
}
