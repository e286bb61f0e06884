/// Reactions and the vote transition table
///
/// A visitor holds at most one reaction per quote. Clicking a button
/// toggles that reaction; clicking the opposite button switches it. Each
/// click maps to exactly one delta request and one new ledger state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// A visitor's stance on a quote. "No reaction" is `Option::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Like,
    Dislike,
}

impl Reaction {
    /// Storage and URL form
    pub fn as_str(self) -> &'static str {
        match self {
            Reaction::Like => "like",
            Reaction::Dislike => "dislike",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Reaction::Like => Reaction::Dislike,
            Reaction::Dislike => Reaction::Like,
        }
    }
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reaction {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Reaction::Like),
            "dislike" => Ok(Reaction::Dislike),
            other => Err(LedgerError::UnknownReaction(other.to_string())),
        }
    }
}

/// Direction of a counter change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increase,
    Decrease,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Increase => "increase",
            Direction::Decrease => "decrease",
        }
    }
}

/// One server mutation: move the `kind` counter in `direction`, and when
/// `reverse_opposite` is set, decrement the opposite counter in the same
/// request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteDelta {
    pub kind: Reaction,
    pub direction: Direction,
    pub reverse_opposite: bool,
}

/// Result of looking up a click in the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// The request to send
    pub delta: VoteDelta,
    /// What the ledger holds once the request succeeds
    pub next: Option<Reaction>,
}

/// Compute the delta request and next ledger state for a click.
///
/// | current | clicked | delta                          | next    |
/// |---------|---------|--------------------------------|---------|
/// | none    | X       | increase X                     | X       |
/// | X       | X       | decrease X                     | none    |
/// | !X      | X       | increase X, reverse opposite   | X       |
pub fn transition(current: Option<Reaction>, clicked: Reaction) -> Transition {
    match current {
        None => Transition {
            delta: VoteDelta {
                kind: clicked,
                direction: Direction::Increase,
                reverse_opposite: false,
            },
            next: Some(clicked),
        },
        Some(held) if held == clicked => Transition {
            delta: VoteDelta {
                kind: clicked,
                direction: Direction::Decrease,
                reverse_opposite: false,
            },
            next: None,
        },
        Some(_) => Transition {
            delta: VoteDelta {
                kind: clicked,
                direction: Direction::Increase,
                reverse_opposite: true,
            },
            next: Some(clicked),
        },
    }
}
