//! Game objects: cards, tokens and spell copies

use crate::core::{
    Ability, CardName, CardType, Color, EntityId, GameEntity, ManaCost, PlayerId, Subtype,
    Supertype,
};
use crate::zones::ZoneId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

pub type CardId = EntityId<Card>;

/// What kind of game object a `Card` is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardKind {
    /// A physical card
    Card,
    /// A marker on the battlefield that is not a card
    Token,
    /// A copy of a spell; exists only on the stack
    SpellCopy { of: CardId },
}

/// The four independent status flags of a permanent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusFlag {
    Tapped,
    Flipped,
    FaceUp,
    PhasedIn,
}

impl StatusFlag {
    /// Name of the transition that turns the flag on
    pub fn on_name(&self) -> &'static str {
        match self {
            StatusFlag::Tapped => "tapped",
            StatusFlag::Flipped => "flipped",
            StatusFlag::FaceUp => "face up",
            StatusFlag::PhasedIn => "phased in",
        }
    }

    /// Name of the transition that turns the flag off
    pub fn off_name(&self) -> &'static str {
        match self {
            StatusFlag::Tapped => "untapped",
            StatusFlag::Flipped => "unflipped",
            StatusFlag::FaceUp => "face down",
            StatusFlag::PhasedIn => "phased out",
        }
    }

    fn attribute(&self) -> &'static str {
        match self {
            StatusFlag::Tapped => "is_tapped",
            StatusFlag::Flipped => "is_flipped",
            StatusFlag::FaceUp => "is_face_up",
            StatusFlag::PhasedIn => "is_phased_in",
        }
    }
}

impl fmt::Display for StatusFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.attribute())
    }
}

/// A named status transition, carried by `card.status_changed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub flag: StatusFlag,
    pub active: bool,
}

impl StatusChange {
    pub fn name(&self) -> &'static str {
        if self.active {
            self.flag.on_name()
        } else {
            self.flag.off_name()
        }
    }
}

impl fmt::Display for StatusChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Current values of the status flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub tapped: bool,
    pub flipped: bool,
    pub face_up: bool,
    pub phased_in: bool,
}

impl Status {
    pub fn get(&self, flag: StatusFlag) -> bool {
        match flag {
            StatusFlag::Tapped => self.tapped,
            StatusFlag::Flipped => self.flipped,
            StatusFlag::FaceUp => self.face_up,
            StatusFlag::PhasedIn => self.phased_in,
        }
    }

    pub(crate) fn set(&mut self, flag: StatusFlag, value: bool) {
        match flag {
            StatusFlag::Tapped => self.tapped = value,
            StatusFlag::Flipped => self.flipped = value,
            StatusFlag::FaceUp => self.face_up = value,
            StatusFlag::PhasedIn => self.phased_in = value,
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status {
            tapped: false,
            flipped: false,
            face_up: true,
            phased_in: true,
        }
    }
}

/// The copiable characteristics of an object
#[derive(Debug, Clone, Default)]
pub struct Characteristics {
    pub name: CardName,
    pub mana_cost: Option<ManaCost>,
    pub colors: Vec<Color>,
    pub types: Vec<CardType>,
    pub subtypes: Vec<Subtype>,
    pub supertypes: Vec<Supertype>,
    pub abilities: Vec<Ability>,
    pub power: Option<i32>,
    pub toughness: Option<i32>,
    pub loyalty: Option<i32>,
}

/// A game object during play
///
/// Owner is fixed at creation; controller can change. `zone` is the
/// back-reference kept current by the game's zone operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub kind: CardKind,
    pub name: CardName,
    pub mana_cost: Option<ManaCost>,
    pub types: SmallVec<[CardType; 2]>,
    pub subtypes: SmallVec<[Subtype; 2]>,
    pub supertypes: SmallVec<[Supertype; 1]>,
    pub base_power: Option<i32>,
    pub base_toughness: Option<i32>,
    pub power: Option<i32>,
    pub toughness: Option<i32>,
    pub loyalty: Option<i32>,
    #[serde(skip)]
    pub abilities: Vec<Ability>,
    /// Damage marked this turn, removed in the cleanup step
    pub damage: u32,
    pub owner: PlayerId,
    pub controller: PlayerId,
    pub status: Status,
    pub attached_to: Option<CardId>,
    /// Colors set by an effect, overriding the mana cost's colors
    pub changed_colors: Vec<Color>,
    pub(crate) zone: Option<ZoneId>,
}

impl Card {
    pub fn new(id: CardId, name: impl Into<CardName>, owner: PlayerId) -> Self {
        Card {
            id,
            kind: CardKind::Card,
            name: name.into(),
            mana_cost: None,
            types: SmallVec::new(),
            subtypes: SmallVec::new(),
            supertypes: SmallVec::new(),
            base_power: None,
            base_toughness: None,
            power: None,
            toughness: None,
            loyalty: None,
            abilities: Vec::new(),
            damage: 0,
            owner,
            controller: owner,
            status: Status::default(),
            attached_to: None,
            changed_colors: Vec::new(),
            zone: None,
        }
    }

    /// Build an object from a characteristics snapshot (tokens, spell copies)
    pub fn from_characteristics(
        id: CardId,
        kind: CardKind,
        chars: Characteristics,
        owner: PlayerId,
    ) -> Self {
        let mut card = Card::new(id, chars.name, owner);
        card.kind = kind;
        card.mana_cost = chars.mana_cost;
        card.types = SmallVec::from_vec(chars.types);
        card.subtypes = SmallVec::from_vec(chars.subtypes);
        card.supertypes = SmallVec::from_vec(chars.supertypes);
        card.abilities = chars.abilities;
        card.base_power = chars.power;
        card.base_toughness = chars.toughness;
        card.power = chars.power;
        card.toughness = chars.toughness;
        card.loyalty = chars.loyalty;
        card.changed_colors = chars.colors;
        card
    }

    pub fn characteristics(&self) -> Characteristics {
        Characteristics {
            name: self.name.clone(),
            mana_cost: self.mana_cost,
            colors: self.colors(),
            types: self.types.to_vec(),
            subtypes: self.subtypes.to_vec(),
            supertypes: self.supertypes.to_vec(),
            abilities: self.abilities.clone(),
            power: self.power,
            toughness: self.toughness,
            loyalty: self.loyalty,
        }
    }

    /// Zone the card was last put into, or None if it is in no zone
    pub fn zone(&self) -> Option<ZoneId> {
        self.zone
    }

    pub fn is_type(&self, card_type: CardType) -> bool {
        self.types.contains(&card_type)
    }

    pub fn is_creature(&self) -> bool {
        self.is_type(CardType::Creature)
    }

    pub fn is_land(&self) -> bool {
        self.is_type(CardType::Land)
    }

    pub fn is_token(&self) -> bool {
        self.kind == CardKind::Token
    }

    pub fn is_spell_copy(&self) -> bool {
        matches!(self.kind, CardKind::SpellCopy { .. })
    }

    pub fn is_tapped(&self) -> bool {
        self.status.tapped
    }

    pub fn is_flipped(&self) -> bool {
        self.status.flipped
    }

    pub fn is_face_up(&self) -> bool {
        self.status.face_up
    }

    pub fn is_phased_in(&self) -> bool {
        self.status.phased_in
    }

    pub fn colors(&self) -> Vec<Color> {
        if !self.changed_colors.is_empty() {
            return self.changed_colors.clone();
        }
        self.mana_cost.map(|cost| cost.colors()).unwrap_or_default()
    }

    pub fn converted_mana_cost(&self) -> u32 {
        self.mana_cost.map(|cost| cost.cmc()).unwrap_or(0)
    }

    /// Forget battlefield-only state when leaving the battlefield
    pub(crate) fn reset_permanent_state(&mut self) {
        self.status = Status::default();
        self.damage = 0;
        self.attached_to = None;
        self.controller = self.owner;
    }

    /// True when marked damage is lethal or toughness is zero or less
    pub fn has_lethal_damage(&self) -> bool {
        match self.toughness {
            Some(toughness) => toughness <= 0 || i64::from(self.damage) >= i64::from(toughness),
            None => false,
        }
    }
}

impl GameEntity<Card> for Card {
    fn id(&self) -> CardId {
        self.id
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
