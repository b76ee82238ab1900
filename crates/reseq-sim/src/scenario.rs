//! Scenarios: named arrival schedules for a reassembly buffer.
//!
//! The built-ins reproduce the canonical demo runs; anything else comes from
//! a word list plus impairment, or from a scenario file.

use reseq_core::config::ReassemblyConfig;

use crate::impairment::ImpairmentConfig;

/// One action of a scenario driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Hand a packet to the buffer. Sequences are signed because scenarios
    /// come from untrusted files; negatives are refused at the packet boundary.
    Deliver { sequence: i64, payload: String },
    /// Fire a simulated retransmission timeout.
    Timeout,
}

impl Step {
    pub fn deliver(sequence: i64, payload: impl Into<String>) -> Self {
        Step::Deliver {
            sequence,
            payload: payload.into(),
        }
    }
}

/// A named arrival schedule for one logical stream.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub buffer: ReassemblyConfig,
    pub steps: Vec<Step>,
}

/// Names of the built-in scenarios, in run order.
pub const BUILTIN_SCENARIOS: [&str; 4] = ["basic", "duplicates", "missing", "complex"];

const FOX: [&str; 9] = [
    "The", "quick", "brown", "fox", "jumps", "over", "the", "lazy", "dog",
];

impl Scenario {
    pub fn new(name: impl Into<String>, buffer: ReassemblyConfig, steps: Vec<Step>) -> Self {
        Scenario {
            name: name.into(),
            description: String::new(),
            buffer,
            steps,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// A known-length stream of `words`, delivered through `impairment`.
    pub fn from_words<S: AsRef<str>>(
        name: impl Into<String>,
        words: &[S],
        impairment: &ImpairmentConfig,
    ) -> Self {
        let buffer = ReassemblyConfig::with_total(i64::try_from(words.len()).ok());
        Scenario::new(name, buffer, impairment.schedule(words))
    }

    /// Look up a built-in scenario by name.
    pub fn builtin(name: &str) -> Option<Scenario> {
        let scenario = match name {
            "basic" => Scenario::new(
                "basic",
                ReassemblyConfig::default(),
                vec![
                    Step::deliver(2, "!"),
                    Step::deliver(0, "Hello"),
                    Step::deliver(1, "World"),
                ],
            )
            .with_description("packets 2, 0, 1"),
            "duplicates" => Scenario::new(
                "duplicates",
                ReassemblyConfig::default(),
                vec![
                    Step::deliver(0, "Hello"),
                    Step::deliver(2, "!"),
                    Step::deliver(1, "World"),
                    Step::deliver(0, "Hello"),
                    Step::deliver(1, "World"),
                ],
            )
            .with_description("packets 0, 2, 1, then 0 and 1 again"),
            "missing" => Scenario::new(
                "missing",
                ReassemblyConfig::with_total(Some(6)),
                vec![
                    Step::deliver(4, "last"),
                    Step::deliver(0, "This"),
                    Step::deliver(2, "test"),
                    Step::Timeout,
                    Step::deliver(1, "is"),
                    Step::deliver(3, "a"),
                    Step::deliver(5, "message"),
                ],
            )
            .with_description("packets 4, 0, 2 with 1, 3, 5 retransmitted after a timeout"),
            "complex" => {
                let steps = [8usize, 2, 5, 0, 7, 1, 6, 3, 4]
                    .iter()
                    .map(|&seq| Step::deliver(seq as i64, FOX[seq]))
                    .collect();
                Scenario::new("complex", ReassemblyConfig::default(), steps)
                    .with_description("nine words in order 8, 2, 5, 0, 7, 1, 6, 3, 4")
            }
            _ => return None,
        };
        Some(scenario)
    }

    /// All built-in scenarios.
    pub fn builtins() -> Vec<Scenario> {
        BUILTIN_SCENARIOS
            .iter()
            .filter_map(|name| Scenario::builtin(name))
            .collect()
    }

    /// Number of deliver steps, duplicates included.
    pub fn arrivals(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, Step::Deliver { .. }))
            .count()
    }
}
