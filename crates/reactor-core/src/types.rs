//! Common types used across Reactor.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ReactorError, Result};

/// How a plan node schedules its work.
///
/// Blocks write the mode as a token (`s`, `p`); operators write it as a
/// separator between their children (`+`, `*`). Both spellings decode to the
/// same variant. Anything else is kept verbatim as [`Mode::Unknown`] so the
/// node can be described, but it refuses to execute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mode {
    /// Work runs one unit at a time, in order.
    Sequential,
    /// All units are launched at once and joined.
    Concurrent,
    /// Unrecognised token.
    Unknown(String),
}

impl Mode {
    /// Decode a block token or operator separator.
    pub fn from_token(token: &str) -> Self {
        match token {
            "s" | "+" => Mode::Sequential,
            "p" | "*" => Mode::Concurrent,
            other => Mode::Unknown(other.to_string()),
        }
    }

    /// The token used in the textual form of a block.
    pub fn token(&self) -> &str {
        match self {
            Mode::Sequential => "s",
            Mode::Concurrent => "p",
            Mode::Unknown(raw) => raw,
        }
    }

    /// The separator used in the textual form of an operator.
    ///
    /// An unknown combinator renders its raw token.
    pub fn separator(&self) -> &str {
        match self {
            Mode::Sequential => "+",
            Mode::Concurrent => "*",
            Mode::Unknown(raw) => raw,
        }
    }

    /// Returns true for the two executable variants.
    pub fn is_known(&self) -> bool {
        !matches!(self, Mode::Unknown(_))
    }

    /// Fail with a configuration error if this mode cannot be executed.
    ///
    /// `node` names the kind of node for the error message.
    pub fn ensure_known(&self, node: &str) -> Result<()> {
        match self {
            Mode::Unknown(raw) => Err(ReactorError::unsupported_mode(node, raw)),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl From<String> for Mode {
    fn from(token: String) -> Self {
        Mode::from_token(&token)
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.token().to_string()
    }
}
