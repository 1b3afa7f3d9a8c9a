//! Actors - identities shared across the layers of a multilayer network.

use crate::error::{Result, SpreadError};
use indexmap::IndexMap;
use spread_env::ActorId;

/// A view of one actor and its state in every layer it lives in.
///
/// Actors are not stored by the network. They are rebuilt on demand from
/// the union of the layers' node sets, so an `Actor` is a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    id: ActorId,
    states: IndexMap<String, Option<String>>,
}

impl Actor {
    /// Creates an actor from its id and `layer -> state` mapping.
    pub fn new(id: ActorId, states: IndexMap<String, Option<String>>) -> Self {
        Self { id, states }
    }

    pub fn id(&self) -> &ActorId {
        &self.id
    }

    /// Names of the layers where the actor exists.
    pub fn layers(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }

    /// States of the actor keyed by layer (`None` when not initialised).
    pub fn states(&self) -> &IndexMap<String, Option<String>> {
        &self.states
    }

    /// State in one layer; `None` if the actor is absent or unset there.
    pub fn state(&self, layer: &str) -> Option<&str> {
        self.states.get(layer).and_then(|s| s.as_deref())
    }

    pub fn is_in(&self, layer: &str) -> bool {
        self.states.contains_key(layer)
    }

    /// True when the actor is in `state` in every layer it lives in.
    pub fn is_uniformly(&self, state: &str) -> bool {
        self.states.values().all(|s| s.as_deref() == Some(state))
    }

    /// Returns the actor states in the canonical compartmental form.
    ///
    /// Labels are `"layer.state"` strings sorted lexicographically, e.g.
    /// `["aware.UA", "ill.I", "vacc.V"]`.
    pub fn joint_state(&self) -> Result<Vec<String>> {
        let mut labels = self
            .states
            .iter()
            .map(|(layer, state)| match state {
                Some(state) => Ok(format!("{layer}.{state}")),
                None => Err(SpreadError::UnsetState {
                    actor: self.id.to_string(),
                    layer: layer.clone(),
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        labels.sort();
        Ok(labels)
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "actor id: {}, layers and states: {{", self.id)?;
        for (i, (layer, state)) in self.states.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{layer}: {}", state.as_deref().unwrap_or("None"))?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(states: &[(&str, Option<&str>)]) -> Actor {
        Actor::new(
            ActorId::from("a"),
            states
                .iter()
                .map(|(l, s)| (l.to_string(), s.map(str::to_string)))
                .collect(),
        )
    }

    #[test]
    fn test_joint_state_is_sorted() {
        let a = actor(&[("vacc", Some("V")), ("ill", Some("I")), ("aware", Some("UA"))]);
        assert_eq!(a.joint_state().unwrap(), vec!["aware.UA", "ill.I", "vacc.V"]);
    }

    #[test]
    fn test_joint_state_rejects_unset() {
        let a = actor(&[("ill", Some("I")), ("aware", None)]);
        assert!(matches!(
            a.joint_state(),
            Err(SpreadError::UnsetState { layer, .. }) if layer == "aware"
        ));
    }

    #[test]
    fn test_uniform_state() {
        let a = actor(&[("l1", Some("1")), ("l2", Some("1"))]);
        assert!(a.is_uniformly("1"));
        assert!(!a.is_uniformly("0"));

        let b = actor(&[("l1", Some("1")), ("l2", Some("0"))]);
        assert!(!b.is_uniformly("1"));
    }

    #[test]
    fn test_state_lookup() {
        let a = actor(&[("l1", Some("S"))]);
        assert_eq!(a.state("l1"), Some("S"));
        assert_eq!(a.state("l2"), None);
        assert!(a.is_in("l1"));
        assert!(!a.is_in("l2"));
        assert_eq!(a.to_string(), "actor id: a, layers and states: {l1: S}");
    }
}
