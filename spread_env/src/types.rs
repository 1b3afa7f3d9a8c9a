//! Common types for the spreading environment abstraction.

use serde::{Deserialize, Serialize};

/// Identity of an actor shared across all layers of a multilayer network.
///
/// Loaders may key actors by names or by integers; both are stored in
/// their textual form so that ordering and hashing stay uniform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Creates an ActorId from anything printable.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the textual form of the id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ActorId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for ActorId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<usize> for ActorId {
    fn from(id: usize) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_id_conversions_agree() {
        assert_eq!(ActorId::from(7u64), ActorId::from("7"));
        assert_eq!(ActorId::from(7usize), ActorId::new("7"));
        assert_eq!(ActorId::from("bob").as_str(), "bob");
    }

    #[test]
    fn test_actor_id_ordering_is_textual() {
        let mut ids = vec![ActorId::from("b"), ActorId::from("a"), ActorId::from("c")];
        ids.sort();
        assert_eq!(ids, vec![ActorId::from("a"), ActorId::from("b"), ActorId::from("c")]);
    }
}
