//! Configuration system for NEAT training runs.
//!
//! Supports YAML configuration files with sensible defaults.

use crate::error::ConfigError;
use crate::neural::MutationConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub population: PopulationConfig,
    pub mutation: MutationConfig,
    pub reproduction: ReproductionConfig,
    #[serde(default)]
    pub speciation: SpeciationConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Genome shape shared by the whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Number of input nodes
    pub inputs: usize,
    /// Number of output nodes
    pub outputs: usize,
    /// Initial value emitted by the bias node
    pub bias: f64,
    /// Restrict genomes to feed-forward topologies
    pub acyclic: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Genomes per generation
    pub size: usize,
    /// Generation budget
    pub max_generations: usize,
    /// Fixed number of species (k-means clusters)
    pub num_species: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReproductionConfig {
    /// Probability that a gene disabled in either parent stays disabled
    pub disable_prob: f64,
    /// Share of each species copied unchanged into the next generation
    pub elitism_prop: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciationConfig {
    /// Upper bound on k-means refinement iterations per generation
    pub max_iterations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Score genomes on the rayon thread pool
    pub parallel: bool,
}

/// Logging and checkpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Generations between summary log lines
    pub stats_interval: usize,
    /// Generations between checkpoints
    pub checkpoint_interval: usize,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            inputs: 2,
            outputs: 1,
            bias: 1.0,
            acyclic: false,
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: 150,
            max_generations: 100,
            num_species: 5,
        }
    }
}

impl Default for ReproductionConfig {
    fn default() -> Self {
        Self {
            disable_prob: 0.75,
            elitism_prop: 0.1,
        }
    }
}

impl Default for SpeciationConfig {
    fn default() -> Self {
        Self { max_iterations: 100 }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stats_interval: 10,
            checkpoint_interval: 25,
            log_level: "info".to_string(),
        }
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ProbabilityOutOfRange { name, value })
    }
}

fn check_magnitude(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NegativeMagnitude { name, value })
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.inputs == 0 {
            return Err(ConfigError::ZeroInputs);
        }
        if self.network.outputs == 0 {
            return Err(ConfigError::ZeroOutputs);
        }
        if self.population.size == 0 {
            return Err(ConfigError::ZeroPopulation);
        }
        if self.population.num_species == 0 {
            return Err(ConfigError::ZeroSpecies);
        }
        if self.population.num_species > self.population.size {
            return Err(ConfigError::TooManySpecies {
                species: self.population.num_species,
                population: self.population.size,
            });
        }
        if self.speciation.max_iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }

        let m = &self.mutation;
        check_probability("weight_mutation_prob", m.weight_mutation_prob)?;
        check_probability("bias_mutation_prob", m.bias_mutation_prob)?;
        check_probability("node_addition_prob", m.node_addition_prob)?;
        check_probability("conn_addition_prob", m.conn_addition_prob)?;
        check_magnitude("weight_mutation_size", m.weight_mutation_size)?;
        check_magnitude("bias_mutation_size", m.bias_mutation_size)?;
        check_probability("disable_prob", self.reproduction.disable_prob)?;
        check_probability("elitism_prop", self.reproduction.elitism_prop)?;

        Ok(())
    }
}
