//! Mana costs, mana amounts and the per-player mana pool

use crate::core::PlayerId;
use crate::game::events::{EventBus, GameEvent};
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mana colors, plus colorless
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Blue,
    Black,
    Red,
    Green,
    Colorless,
}

impl Color {
    /// Order of the six mana pool counters
    pub const POOLS: [Color; 6] = [
        Color::Colorless,
        Color::White,
        Color::Blue,
        Color::Black,
        Color::Red,
        Color::Green,
    ];

    /// Lowercase name used in event ids (`player.mana.<name>.added`)
    pub fn name(&self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Blue => "blue",
            Color::Black => "black",
            Color::Red => "red",
            Color::Green => "green",
            Color::Colorless => "colorless",
        }
    }

    /// Map a mana symbol (W, U, B, R, G, C) to its color
    pub fn from_symbol(symbol: char) -> Option<Color> {
        match symbol {
            'W' => Some(Color::White),
            'U' => Some(Color::Blue),
            'B' => Some(Color::Black),
            'R' => Some(Color::Red),
            'G' => Some(Color::Green),
            'C' => Some(Color::Colorless),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "W"),
            Color::Blue => write!(f, "U"),
            Color::Black => write!(f, "B"),
            Color::Red => write!(f, "R"),
            Color::Green => write!(f, "G"),
            Color::Colorless => write!(f, "C"),
        }
    }
}

/// A mana cost parsed from its string form (e.g., "2RR" = 2 generic + 2 red)
///
/// Counters saturate instead of wrapping, so absurd costs stay absurd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManaCost {
    pub generic: u32,
    pub x: u16,
    pub white: u16,
    pub blue: u16,
    pub black: u16,
    pub red: u16,
    pub green: u16,
    pub colorless: u16,
}

impl ManaCost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a mana cost string like "2RR", "1UB" or "XG"
    pub fn from_string(s: &str) -> Self {
        let mut cost = ManaCost::new();

        for c in s.chars() {
            let symbol = match c {
                'W' => &mut cost.white,
                'U' => &mut cost.blue,
                'B' => &mut cost.black,
                'R' => &mut cost.red,
                'G' => &mut cost.green,
                'C' => &mut cost.colorless,
                'X' => &mut cost.x,
                _ => {
                    // Hybrid and phyrexian symbols are not modelled
                    if let Some(digit) = c.to_digit(10) {
                        cost.generic = cost.generic.saturating_mul(10).saturating_add(digit);
                    }
                    continue;
                }
            };
            *symbol = symbol.saturating_add(1);
        }

        cost
    }

    /// Converted mana cost. X counts as zero.
    pub fn cmc(&self) -> u32 {
        [
            self.white,
            self.blue,
            self.black,
            self.red,
            self.green,
            self.colorless,
        ]
        .into_iter()
        .fold(self.generic, |total, n| total.saturating_add(u32::from(n)))
    }

    /// Colors named by the colored symbols of this cost
    pub fn colors(&self) -> Vec<Color> {
        [
            (Color::White, self.white),
            (Color::Blue, self.blue),
            (Color::Black, self.black),
            (Color::Red, self.red),
            (Color::Green, self.green),
        ]
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(c, _)| c)
        .collect()
    }
}

impl fmt::Display for ManaCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.x {
            write!(f, "X")?;
        }
        if self.generic > 0 {
            write!(f, "{}", self.generic)?;
        }
        for (symbol, count) in [
            ('W', self.white),
            ('U', self.blue),
            ('B', self.black),
            ('R', self.red),
            ('G', self.green),
            ('C', self.colorless),
        ] {
            for _ in 0..count {
                write!(f, "{symbol}")?;
            }
        }
        Ok(())
    }
}

/// A signed amount of mana per pool, used for adding to and paying from a
/// `ManaPool`. Negative values subtract when added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Mana {
    pub colorless: i64,
    pub white: i64,
    pub blue: i64,
    pub black: i64,
    pub red: i64,
    pub green: i64,
}

impl Mana {
    pub fn new() -> Self {
        Self::default()
    }

    /// `amount` of a single color
    pub fn of(color: Color, amount: i64) -> Self {
        Mana::new().with(color, amount)
    }

    /// Builder: set one color's amount
    #[must_use]
    pub fn with(mut self, color: Color, amount: i64) -> Self {
        *self.slot_mut(color) = amount;
        self
    }

    pub fn get(&self, color: Color) -> i64 {
        match color {
            Color::Colorless => self.colorless,
            Color::White => self.white,
            Color::Blue => self.blue,
            Color::Black => self.black,
            Color::Red => self.red,
            Color::Green => self.green,
        }
    }

    fn slot_mut(&mut self, color: Color) -> &mut i64 {
        match color {
            Color::Colorless => &mut self.colorless,
            Color::White => &mut self.white,
            Color::Blue => &mut self.blue,
            Color::Black => &mut self.black,
            Color::Red => &mut self.red,
            Color::Green => &mut self.green,
        }
    }

    #[must_use]
    pub fn negated(&self) -> Self {
        let mut out = Mana::new();
        for color in Color::POOLS {
            *out.slot_mut(color) = -self.get(color);
        }
        out
    }
}

/// Mana pool for a player
///
/// Six non-negative counters. Every change made through `set`, `add` or
/// `pay` fires an added/removed event for the affected color; `empty` resets
/// silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaPool {
    owner: PlayerId,
    pub(crate) colorless: u32,
    pub(crate) white: u32,
    pub(crate) blue: u32,
    pub(crate) black: u32,
    pub(crate) red: u32,
    pub(crate) green: u32,
}

impl ManaPool {
    pub fn new(owner: PlayerId) -> Self {
        ManaPool {
            owner,
            colorless: 0,
            white: 0,
            blue: 0,
            black: 0,
            red: 0,
            green: 0,
        }
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn get(&self, color: Color) -> u32 {
        match color {
            Color::Colorless => self.colorless,
            Color::White => self.white,
            Color::Blue => self.blue,
            Color::Black => self.black,
            Color::Red => self.red,
            Color::Green => self.green,
        }
    }

    fn slot_mut(&mut self, color: Color) -> &mut u32 {
        match color {
            Color::Colorless => &mut self.colorless,
            Color::White => &mut self.white,
            Color::Blue => &mut self.blue,
            Color::Black => &mut self.black,
            Color::Red => &mut self.red,
            Color::Green => &mut self.green,
        }
    }

    /// Counters in pool order: colorless, white, blue, black, red, green
    pub fn contents(&self) -> [u32; 6] {
        Color::POOLS.map(|c| self.get(c))
    }

    pub fn is_empty(&self) -> bool {
        self.contents().iter().all(|&n| n == 0)
    }

    pub fn total(&self) -> u32 {
        self.contents().iter().sum()
    }

    /// Set one counter, firing added/removed by comparison with the previous
    /// value. Negative amounts are rejected before anything changes.
    pub fn set(&mut self, color: Color, amount: i64, events: &mut EventBus) -> Result<()> {
        if amount < 0 {
            return Err(MtgError::InvalidValue(format!(
                "{} mana pool would be negative.",
                capitalize(color.name())
            )));
        }
        let amount = u32::try_from(amount)
            .map_err(|_| MtgError::InvalidValue(format!("{amount} mana is out of range")))?;

        let current = self.get(color);
        if amount == current {
            return Ok(());
        }

        let player = self.owner;
        if amount > current {
            events.trigger(GameEvent::ManaAdded { player, color });
        } else {
            events.trigger(GameEvent::ManaRemoved { player, color });
        }
        *self.slot_mut(color) = amount;
        Ok(())
    }

    /// Add (or with negative amounts, remove) mana. If any counter would go
    /// negative the pool is left untouched.
    pub fn add(&mut self, mana: Mana, events: &mut EventBus) -> Result<()> {
        let mut targets = [0i64; 6];
        for (slot, color) in targets.iter_mut().zip(Color::POOLS) {
            *slot = i64::from(self.get(color))
                .checked_add(mana.get(color))
                .ok_or_else(|| {
                    MtgError::InvalidValue(format!("{} mana is out of range", color.name()))
                })?;
            if *slot < 0 {
                return Err(MtgError::InvalidValue(format!(
                    "{} mana pool would be negative.",
                    capitalize(color.name())
                )));
            }
            if *slot > i64::from(u32::MAX) {
                return Err(MtgError::InvalidValue(format!("{slot} mana is out of range")));
            }
        }

        for (amount, color) in targets.into_iter().zip(Color::POOLS) {
            self.set(color, amount, events)?;
        }
        Ok(())
    }

    /// True iff every requested amount fits in the matching counter
    pub fn can_pay(&self, mana: &Mana) -> bool {
        Color::POOLS
            .iter()
            .all(|&c| mana.get(c) <= i64::from(self.get(c)))
    }

    /// Debit exactly `mana`, or fail without debiting anything
    pub fn pay(&mut self, mana: &Mana, events: &mut EventBus) -> Result<()> {
        if Color::POOLS.iter().any(|&c| mana.get(c) < 0) {
            return Err(MtgError::InvalidValue(
                "Cannot pay a negative amount of mana.".to_string(),
            ));
        }
        if !self.can_pay(mana) {
            return Err(MtgError::InvalidAction(format!(
                "Not enough mana for payment. Pool has: {self}"
            )));
        }
        self.add(mana.negated(), events)
    }

    /// Work out which mana pays `cost`: colored symbols from their own
    /// counters, generic from whatever remains in WUBRG then colorless order.
    pub fn payment_for(&self, cost: &ManaCost) -> Option<Mana> {
        let mut payment = Mana::new()
            .with(Color::White, cost.white.into())
            .with(Color::Blue, cost.blue.into())
            .with(Color::Black, cost.black.into())
            .with(Color::Red, cost.red.into())
            .with(Color::Green, cost.green.into())
            .with(Color::Colorless, cost.colorless.into());
        if !self.can_pay(&payment) {
            return None;
        }

        let mut generic_remaining = i64::from(cost.generic);
        for color in [
            Color::White,
            Color::Blue,
            Color::Black,
            Color::Red,
            Color::Green,
            Color::Colorless,
        ] {
            let spare = i64::from(self.get(color)) - payment.get(color);
            let used = generic_remaining.min(spare);
            *payment.slot_mut(color) += used;
            generic_remaining -= used;
        }

        (generic_remaining == 0).then_some(payment)
    }

    /// Pay a parsed mana cost from this pool
    pub fn pay_cost(&mut self, cost: &ManaCost, events: &mut EventBus) -> Result<()> {
        let payment = self.payment_for(cost).ok_or_else(|| {
            MtgError::InvalidAction(format!(
                "Insufficient mana to pay cost {cost}. Pool has: {self}"
            ))
        })?;
        self.pay(&payment, events)
    }

    /// Reset every counter to zero. Fires no events.
    pub fn empty(&mut self) {
        for color in Color::POOLS {
            *self.slot_mut(color) = 0;
        }
    }
}

impl fmt::Display for ManaPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}W, {}U, {}B, {}R, {}G)",
            self.colorless, self.white, self.blue, self.black, self.red, self.green
        )
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
