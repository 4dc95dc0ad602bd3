//! Card definitions and the catalog that maps names to them
//!
//! The catalog is the engine's only source of card characteristics and
//! ability implementations. Implementations are resolved once, when a card
//! is created; a card whose name has no implementation gets one
//! `Ability::NotImplemented` marker per printed ability.

use crate::core::{Card, CardId, CardName, CardType, ManaCost, PlayerId, Subtype, Supertype};
use crate::game::Game;
use crate::{MtgError, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::rc::Rc;

/// Behaviour behind an implemented ability
pub trait AbilityBehavior: fmt::Debug {
    /// Rules text this behaviour implements
    fn text(&self) -> &str;

    /// Apply the ability's effect for `source`
    fn resolve(&self, game: &mut Game, source: CardId) -> Result<()>;
}

/// One ability of a card, resolved at card creation
#[derive(Debug, Clone)]
pub enum Ability {
    Implemented(Rc<dyn AbilityBehavior>),
    NotImplemented { text: String },
}

impl Ability {
    pub fn is_implemented(&self) -> bool {
        matches!(self, Ability::Implemented(_))
    }

    pub fn text(&self) -> &str {
        match self {
            Ability::Implemented(behavior) => behavior.text(),
            Ability::NotImplemented { text } => text,
        }
    }
}

/// Printed characteristics of a card, as stored in a catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub name: CardName,
    /// Mana cost in symbol form, e.g. "2RR"
    pub mana_cost: Option<String>,
    pub types: Vec<CardType>,
    pub subtypes: Vec<Subtype>,
    pub supertypes: Vec<Supertype>,
    pub power: Option<i32>,
    pub toughness: Option<i32>,
    pub loyalty: Option<i32>,
    /// Printed ability texts
    pub abilities: Vec<String>,
}

impl CardDefinition {
    pub fn new(name: impl Into<CardName>) -> Self {
        CardDefinition {
            name: name.into(),
            mana_cost: None,
            types: Vec::new(),
            subtypes: Vec::new(),
            supertypes: Vec::new(),
            power: None,
            toughness: None,
            loyalty: None,
            abilities: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_cost(mut self, cost: &str) -> Self {
        self.mana_cost = Some(cost.to_string());
        self
    }

    #[must_use]
    pub fn with_type(mut self, card_type: CardType) -> Self {
        self.types.push(card_type);
        self
    }

    #[must_use]
    pub fn with_subtype(mut self, subtype: impl Into<Subtype>) -> Self {
        self.subtypes.push(subtype.into());
        self
    }

    #[must_use]
    pub fn with_supertype(mut self, supertype: Supertype) -> Self {
        self.supertypes.push(supertype);
        self
    }

    #[must_use]
    pub fn with_pt(mut self, power: i32, toughness: i32) -> Self {
        self.power = Some(power);
        self.toughness = Some(toughness);
        self
    }

    #[must_use]
    pub fn with_loyalty(mut self, loyalty: i32) -> Self {
        self.loyalty = Some(loyalty);
        self
    }

    #[must_use]
    pub fn with_ability(mut self, text: &str) -> Self {
        self.abilities.push(text.to_string());
        self
    }

    /// Create a card instance from this definition
    pub fn instantiate(&self, id: CardId, owner: PlayerId, catalog: &dyn CardCatalog) -> Card {
        let mut card = Card::new(id, self.name.clone(), owner);
        if let Some(cost) = &self.mana_cost {
            card.mana_cost = Some(ManaCost::from_string(cost));
        }
        card.types = SmallVec::from_vec(self.types.clone());
        card.subtypes = SmallVec::from_vec(self.subtypes.clone());
        card.supertypes = SmallVec::from_vec(self.supertypes.clone());
        card.base_power = self.power;
        card.base_toughness = self.toughness;
        card.power = self.power;
        card.toughness = self.toughness;
        card.loyalty = self.loyalty;
        card.abilities = match catalog.implementation(&self.name) {
            Some(behaviors) => behaviors.into_iter().map(Ability::Implemented).collect(),
            None => self
                .abilities
                .iter()
                .map(|text| Ability::NotImplemented { text: text.clone() })
                .collect(),
        };
        card
    }
}

/// Lookup of card definitions and ability implementations by name
pub trait CardCatalog: fmt::Debug {
    fn definition(&self, name: &str) -> Option<&CardDefinition>;

    /// Ability implementations for a card, if the catalog has them
    fn implementation(&self, name: &CardName) -> Option<Vec<Rc<dyn AbilityBehavior>>>;
}

/// In-memory catalog with case-insensitive name lookup
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    cards: FxHashMap<String, CardDefinition>,
    implementations: FxHashMap<String, Vec<Rc<dyn AbilityBehavior>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_card(&mut self, card_def: CardDefinition) {
        self.cards.insert(card_def.name.to_lowercase(), card_def);
    }

    /// Register the ability implementations for a card name
    pub fn implement(&mut self, name: &str, behaviors: Vec<Rc<dyn AbilityBehavior>>) {
        self.implementations.insert(name.to_lowercase(), behaviors);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cards.contains_key(&name.to_lowercase())
    }

    /// Definitions for a list of names, failing on the first unknown one
    pub fn decklist(&self, names: &[&str]) -> Result<Vec<CardDefinition>> {
        names
            .iter()
            .map(|name| {
                self.definition(name)
                    .cloned()
                    .ok_or_else(|| MtgError::InvalidValue(format!("Unknown card '{name}'")))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl CardCatalog for MemoryCatalog {
    fn definition(&self, name: &str) -> Option<&CardDefinition> {
        self.cards.get(&name.to_lowercase())
    }

    fn implementation(&self, name: &CardName) -> Option<Vec<Rc<dyn AbilityBehavior>>> {
        self.implementations.get(&name.to_lowercase()).cloned()
    }
}
