//! Game zones (Library, Hand, Graveyard, Battlefield, etc.)
//!
//! A `Zone` only stores membership. Changing membership is crate-private:
//! the game performs every add/remove so that the card's zone
//! back-reference and the zone-changed event stay in step with it.

use crate::core::{CardId, PlayerId};
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Different zones where cards can exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneKind {
    Library,
    Hand,
    Battlefield,
    Graveyard,
    Exile,
    Stack,
}

impl ZoneKind {
    pub fn name(&self) -> &'static str {
        match self {
            ZoneKind::Library => "library",
            ZoneKind::Hand => "hand",
            ZoneKind::Battlefield => "battlefield",
            ZoneKind::Graveyard => "graveyard",
            ZoneKind::Exile => "exile",
            ZoneKind::Stack => "stack",
        }
    }

    /// Library and stack order is part of the game state (top = end)
    pub fn is_ordered(&self) -> bool {
        matches!(self, ZoneKind::Library | ZoneKind::Stack)
    }

    /// Battlefield and stack belong to the game, not a player
    pub fn is_shared(&self) -> bool {
        matches!(self, ZoneKind::Battlefield | ZoneKind::Stack)
    }
}

/// Identifies one zone of one game: its kind plus its owner
/// (`None` for the shared battlefield and stack)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneId {
    pub kind: ZoneKind,
    pub owner: Option<PlayerId>,
}

impl ZoneId {
    pub fn shared(kind: ZoneKind) -> Self {
        ZoneId { kind, owner: None }
    }

    pub fn owned(kind: ZoneKind, owner: PlayerId) -> Self {
        ZoneId {
            kind,
            owner: Some(owner),
        }
    }

    pub fn battlefield() -> Self {
        ZoneId::shared(ZoneKind::Battlefield)
    }

    pub fn stack() -> Self {
        ZoneId::shared(ZoneKind::Stack)
    }

    pub fn library(owner: PlayerId) -> Self {
        ZoneId::owned(ZoneKind::Library, owner)
    }

    pub fn hand(owner: PlayerId) -> Self {
        ZoneId::owned(ZoneKind::Hand, owner)
    }

    pub fn graveyard(owner: PlayerId) -> Self {
        ZoneId::owned(ZoneKind::Graveyard, owner)
    }

    pub fn exile(owner: PlayerId) -> Self {
        ZoneId::owned(ZoneKind::Exile, owner)
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.owner {
            Some(owner) => write!(f, "{} of player {}", self.kind.name(), owner),
            None => write!(f, "{}", self.kind.name()),
        }
    }
}

/// A zone containing cards. For ordered zones the last element is the top.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    id: ZoneId,
    cards: Vec<CardId>,
}

impl Zone {
    pub fn new(id: ZoneId) -> Self {
        Zone {
            id,
            cards: Vec::new(),
        }
    }

    pub fn id(&self) -> ZoneId {
        self.id
    }

    pub fn kind(&self) -> ZoneKind {
        self.id.kind
    }

    pub fn owner(&self) -> Option<PlayerId> {
        self.id.owner
    }

    /// Put a card on top (ordered zones) or at the end of iteration order
    pub(crate) fn add(&mut self, card_id: CardId) {
        self.cards.push(card_id);
    }

    pub(crate) fn remove(&mut self, card_id: CardId) -> Result<()> {
        // remove() rather than swap_remove(): iteration order must stay
        // deterministic even for unordered zones
        match self.cards.iter().position(|&id| id == card_id) {
            Some(pos) => {
                self.cards.remove(pos);
                Ok(())
            }
            None => Err(MtgError::NotInZone {
                object: format!("Card {card_id}"),
                zone: self.id,
            }),
        }
    }

    /// Remove and return the top card
    pub(crate) fn pop(&mut self) -> Option<CardId> {
        self.cards.pop()
    }

    /// Shuffle the zone in place. Only libraries can be shuffled.
    pub(crate) fn shuffle(&mut self, rng: &mut impl rand::Rng) -> Result<()> {
        use rand::seq::SliceRandom;
        if self.id.kind != ZoneKind::Library {
            return Err(MtgError::InvalidAction(format!(
                "Cannot shuffle {}: only libraries are shuffled",
                self.id
            )));
        }
        self.cards.shuffle(rng);
        Ok(())
    }

    pub fn contains(&self, card_id: CardId) -> bool {
        self.cards.contains(&card_id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Look at top card without removing it
    pub fn peek_top(&self) -> Option<CardId> {
        self.cards.last().copied()
    }

    /// The top `n` cards, bottom-most first (fewer if the zone is smaller)
    pub fn top(&self, n: usize) -> &[CardId] {
        let start = self.cards.len().saturating_sub(n);
        &self.cards[start..]
    }

    /// Card at `index`, counting from the bottom
    pub fn get(&self, index: usize) -> Option<CardId> {
        self.cards.get(index).copied()
    }

    pub fn cards(&self) -> &[CardId] {
        &self.cards
    }

    pub fn iter(&self) -> impl Iterator<Item = CardId> + '_ {
        self.cards.iter().copied()
    }
}

/// Collection of all zones for a player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerZones {
    pub library: Zone,
    pub hand: Zone,
    pub graveyard: Zone,
    pub exile: Zone,
}

impl PlayerZones {
    pub fn new(player_id: PlayerId) -> Self {
        PlayerZones {
            library: Zone::new(ZoneId::library(player_id)),
            hand: Zone::new(ZoneId::hand(player_id)),
            graveyard: Zone::new(ZoneId::graveyard(player_id)),
            exile: Zone::new(ZoneId::exile(player_id)),
        }
    }

    pub fn get_zone(&self, zone: ZoneKind) -> Option<&Zone> {
        match zone {
            ZoneKind::Library => Some(&self.library),
            ZoneKind::Hand => Some(&self.hand),
            ZoneKind::Graveyard => Some(&self.graveyard),
            ZoneKind::Exile => Some(&self.exile),
            _ => None,
        }
    }

    pub fn get_zone_mut(&mut self, zone: ZoneKind) -> Option<&mut Zone> {
        match zone {
            ZoneKind::Library => Some(&mut self.library),
            ZoneKind::Hand => Some(&mut self.hand),
            ZoneKind::Graveyard => Some(&mut self.graveyard),
            ZoneKind::Exile => Some(&mut self.exile),
            _ => None,
        }
    }

    /// Zones in the order they are searched when locating a card
    pub fn all(&self) -> [&Zone; 4] {
        [&self.exile, &self.hand, &self.graveyard, &self.library]
    }
}
