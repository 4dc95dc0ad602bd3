//! Error types for the rules engine

use crate::zones::ZoneId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MtgError {
    /// A precondition of the operation did not hold (game not started,
    /// player already dead, card already tapped, ...)
    #[error("{subject}: expected {expected}, got {got}")]
    RequirementNotMet {
        subject: String,
        expected: String,
        got: String,
    },

    #[error("Invalid game action: {0}")]
    InvalidAction(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(u32),

    #[error("{object} not found in {zone}")]
    NotInZone { object: String, zone: ZoneId },

    #[error("Game has no such team {0}")]
    NoSuchTeam(usize),

    #[error("Event handler '{handler}' failed: {message}")]
    Handler { handler: String, message: String },
}

impl MtgError {
    /// Build a `RequirementNotMet` from anything displayable
    pub fn requirement(
        subject: impl std::fmt::Display,
        expected: impl std::fmt::Display,
        got: impl std::fmt::Display,
    ) -> Self {
        MtgError::RequirementNotMet {
            subject: subject.to_string(),
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MtgError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::ZoneKind;

    #[test]
    fn test_requirement_message() {
        let err = MtgError::requirement("Game", "started", "not started");
        assert_eq!(err.to_string(), "Game: expected started, got not started");
    }

    #[test]
    fn test_not_in_zone_message() {
        let err = MtgError::NotInZone {
            object: "Card 3".to_string(),
            zone: ZoneId::shared(ZoneKind::Stack),
        };
        assert_eq!(err.to_string(), "Card 3 not found in stack");
    }

    #[test]
    fn test_no_such_team_message() {
        assert_eq!(MtgError::NoSuchTeam(4).to_string(), "Game has no such team 4");
    }
}
