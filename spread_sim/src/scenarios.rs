//! Built-in propagation scenarios.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScenarioId {
    /// Three coupled processes (illness, awareness, vaccination) on the
    /// Les Miserables graph
    Dsaa,

    /// Independent cascade over a two-layer small world, OR protocol
    Cascade,

    /// Linear threshold over a three-layer small world, AND protocol
    Threshold,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![ScenarioId::Dsaa, ScenarioId::Cascade, ScenarioId::Threshold]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Dsaa => "dsaa",
            ScenarioId::Cascade => "cascade",
            ScenarioId::Threshold => "threshold",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Dsaa => "ill/aware/vacc compartments, budgets (84,13,3) (77,23) (90,10)",
            ScenarioId::Cascade => "MIC, p=0.3, 10% seeds, 2 layers x 100 actors",
            ScenarioId::Threshold => "MLT, mi=0.2, 20% degree-central seeds, 3 layers x 60 actors",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dsaa" | "compartmental" => Ok(ScenarioId::Dsaa),
            "cascade" | "mic" | "micm" => Ok(ScenarioId::Cascade),
            "threshold" | "mlt" | "mltm" => Ok(ScenarioId::Threshold),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
