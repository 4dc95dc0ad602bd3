//! Core game types and entities

pub mod card;
pub mod catalog;
pub mod entity;
pub mod mana;
pub mod player;
pub mod types;

pub use card::{Card, CardId, CardKind, Characteristics, Status, StatusChange, StatusFlag};
pub use catalog::{Ability, AbilityBehavior, CardCatalog, CardDefinition, MemoryCatalog};
pub use entity::{EntityId, EntityStore, GameEntity};
pub use mana::{Color, Mana, ManaCost, ManaPool};
pub use player::{DeathReason, Player, PlayerId};
pub use types::{CardName, CardType, PlayerName, Subtype, Supertype};
