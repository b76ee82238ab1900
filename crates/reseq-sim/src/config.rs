//! Scenario files.
//!
//! A TOML document holds any number of `[[scenario]]` tables, each either an
//! explicit `steps` list or a `words` list scheduled through the impairment
//! model. [`ScenarioFileInput::resolve`] validates the file and produces
//! runnable [`Scenario`]s.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use reseq_core::config::ReassemblyConfigInput;

use crate::impairment::ImpairmentConfig;
use crate::scenario::{Scenario, Step};

pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid scenario TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported config version {0}")]
    UnsupportedVersion(u32),
    #[error("scenario #{0} has no name")]
    MissingName(usize),
    #[error("duplicate scenario name {0:?}")]
    DuplicateName(String),
    #[error("scenario {0:?} needs either `steps` or `words`")]
    NoArrivals(String),
    #[error("scenario {0:?} sets both `steps` and `words`")]
    ConflictingArrivals(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScenarioFileInput {
    pub version: u32,
    /// Default impairment for `words` scenarios without their own.
    pub impairment: Option<ImpairmentConfig>,
    #[serde(rename = "scenario")]
    pub scenarios: Vec<ScenarioInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScenarioInput {
    pub name: String,
    pub description: Option<String>,
    pub buffer: ReassemblyConfigInput,
    pub steps: Vec<StepInput>,
    pub words: Vec<String>,
    pub impairment: Option<ImpairmentConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepInput {
    Deliver { seq: i64, payload: String },
    Timeout,
}

impl From<StepInput> for Step {
    fn from(input: StepInput) -> Self {
        match input {
            StepInput::Deliver { seq, payload } => Step::Deliver {
                sequence: seq,
                payload,
            },
            StepInput::Timeout => Step::Timeout,
        }
    }
}

impl ScenarioFileInput {
    pub fn resolve(self) -> Result<Vec<Scenario>, ConfigError> {
        let version = if self.version == 0 {
            CONFIG_VERSION
        } else {
            self.version
        };
        if version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion(version));
        }

        let mut names = HashSet::new();
        let mut out = Vec::with_capacity(self.scenarios.len());
        for (idx, input) in self.scenarios.into_iter().enumerate() {
            let name = input.name.trim().to_string();
            if name.is_empty() {
                return Err(ConfigError::MissingName(idx));
            }
            if !names.insert(name.clone()) {
                return Err(ConfigError::DuplicateName(name));
            }

            let scenario = match (input.steps.is_empty(), input.words.is_empty()) {
                (true, true) => return Err(ConfigError::NoArrivals(name)),
                (false, false) => return Err(ConfigError::ConflictingArrivals(name)),
                (false, true) => {
                    let steps = input.steps.into_iter().map(Step::from).collect();
                    Scenario::new(name, input.buffer.resolve(), steps)
                }
                (true, false) => {
                    let impairment = input
                        .impairment
                        .or_else(|| self.impairment.clone())
                        .unwrap_or_default();
                    // The word count is the stream length unless set explicitly.
                    let explicit_total = input.buffer.total_packets.is_some();
                    let mut buffer = input.buffer.resolve();
                    if !explicit_total {
                        buffer.total_packets = Some(input.words.len() as u64);
                    }
                    Scenario::new(name, buffer, impairment.schedule(input.words.as_slice()))
                }
            };

            out.push(match input.description {
                Some(desc) => scenario.with_description(desc),
                None => scenario,
            });
        }

        Ok(out)
    }
}

/// Parse scenarios from TOML text. Empty input yields no scenarios.
pub fn from_toml_str(input: &str) -> Result<Vec<Scenario>, ConfigError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    let parsed: ScenarioFileInput = toml::from_str(input)?;
    parsed.resolve()
}

/// Read and parse a scenario file.
pub fn load(path: &Path) -> Result<Vec<Scenario>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    from_toml_str(&text)
}
