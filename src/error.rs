//! Error types for the evolutionary engine.

use crate::checkpoint::CheckpointError;

/// Boxed error returned by a task evaluator
pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// Invalid construction parameters, detected before any generation runs
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroInputs,
    ZeroOutputs,
    ZeroPopulation,
    ZeroSpecies,
    TooManySpecies { species: usize, population: usize },
    ProbabilityOutOfRange { name: &'static str, value: f64 },
    NegativeMagnitude { name: &'static str, value: f64 },
    ZeroIterations,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroInputs => write!(f, "input node count must be > 0"),
            Self::ZeroOutputs => write!(f, "output node count must be > 0"),
            Self::ZeroPopulation => write!(f, "population size must be > 0"),
            Self::ZeroSpecies => write!(f, "species count must be > 0"),
            Self::TooManySpecies { species, population } => write!(
                f,
                "species count ({}) cannot exceed population size ({})",
                species, population
            ),
            Self::ProbabilityOutOfRange { name, value } => {
                write!(f, "{} must be within [0, 1], got {}", name, value)
            }
            Self::NegativeMagnitude { name, value } => {
                write!(f, "{} must be a finite value >= 0, got {}", name, value)
            }
            Self::ZeroIterations => write!(f, "speciation max_iterations must be > 0"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors that abort a training run
#[derive(Debug)]
pub enum NeatError {
    Config(ConfigError),
    /// The task failed to score a genome
    Evaluation { index: usize, source: TaskError },
    /// The task returned NaN or an infinite score
    InvalidFitness { index: usize, value: f64 },
    /// A network was driven with the wrong number of inputs
    InputSize { expected: usize, found: usize },
    Checkpoint(CheckpointError),
}

impl std::fmt::Display for NeatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Configuration error: {}", e),
            Self::Evaluation { index, source } => {
                write!(f, "Evaluation of genome {} failed: {}", index, source)
            }
            Self::InvalidFitness { index, value } => {
                write!(f, "Genome {} received non-finite fitness {}", index, value)
            }
            Self::InputSize { expected, found } => {
                write!(f, "Input size mismatch: expected {}, found {}", expected, found)
            }
            Self::Checkpoint(e) => write!(f, "Checkpoint error: {}", e),
        }
    }
}

impl std::error::Error for NeatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Evaluation { source, .. } => Some(source.as_ref()),
            Self::Checkpoint(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for NeatError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<CheckpointError> for NeatError {
    fn from(e: CheckpointError) -> Self {
        Self::Checkpoint(e)
    }
}

pub type Result<T> = std::result::Result<T, NeatError>;
