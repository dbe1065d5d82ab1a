//! Purpose tags for chain positions.
//!
//! Every position in a [`TransformerChain`](crate::chain::TransformerChain)
//! carries a [`Scope`] saying when the transform there is meant to run:
//! during training, during testing, when scoring (serving), or any mix.
//! [`TransformerChain::model_for`](crate::chain::TransformerChain::model_for)
//! uses [`keep`] to cut a chain down to one purpose before persisting it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// Non-empty combination of `Training`, `Testing` and `Scoring` bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Scope(u32);

impl Scope {
    pub const TRAINING: Scope = Scope(0b001);
    pub const TESTING: Scope = Scope(0b010);
    pub const SCORING: Scope = Scope(0b100);
    pub const TRAIN_TEST: Scope = Scope(0b011);
    pub const EVERYTHING: Scope = Scope(0b111);

    const NAMES: [(Scope, &'static str); 3] = [
        (Scope::TRAINING, "Training"),
        (Scope::TESTING, "Testing"),
        (Scope::SCORING, "Scoring"),
    ];

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Parse persisted bits. Zero and unknown bits are rejected.
    pub fn from_bits(bits: u32) -> Option<Scope> {
        if bits == 0 || bits & !Scope::EVERYTHING.0 != 0 {
            None
        } else {
            Some(Scope(bits))
        }
    }

    /// True if the two scopes share at least one bit.
    pub const fn intersects(self, other: Scope) -> bool {
        self.0 & other.0 != 0
    }

    /// True if every bit of `other` is set in `self`.
    pub const fn contains(self, other: Scope) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::EVERYTHING
    }
}

impl TryFrom<u32> for Scope {
    type Error = String;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        Scope::from_bits(bits).ok_or_else(|| format!("invalid scope bits {bits:#x}"))
    }
}

impl From<Scope> for u32 {
    fn from(scope: Scope) -> u32 {
        scope.0
    }
}

impl BitOr for Scope {
    type Output = Scope;

    fn bitor(self, rhs: Scope) -> Scope {
        Scope(self.0 | rhs.0)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Scope::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "{}", names.join("|"))
    }
}

/// Whether a position tagged `scope` survives filtering by `filter`.
pub fn keep(scope: Scope, filter: Scope) -> bool {
    scope.intersects(filter)
}
