use crate::error::SpreadError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rule combining per-layer activation inputs into an actor decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    /// Active if every layer gives a positive input
    And,

    /// Active if any layer gives a positive input
    Or,
}

impl Protocol {
    pub fn evaluate(&self, inputs: impl IntoIterator<Item = bool>) -> bool {
        let mut inputs = inputs.into_iter();
        match self {
            Protocol::And => inputs.all(|i| i),
            Protocol::Or => inputs.any(|i| i),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::And => write!(f, "AND"),
            Protocol::Or => write!(f, "OR"),
        }
    }
}

impl FromStr for Protocol {
    type Err = SpreadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AND" => Ok(Protocol::And),
            "OR" => Ok(Protocol::Or),
            other => Err(SpreadError::UnknownProtocol(other.to_string())),
        }
    }
}
