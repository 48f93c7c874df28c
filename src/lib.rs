//! # NEAT-EVOLVE
//!
//! Neuroevolution of augmenting topologies: evolves network structure and
//! weights together against a user supplied fitness task.
//!
//! ## Features
//!
//! - **Speciated**: k-means species in innovation-indexed weight space
//! - **Parallel**: Genomes are scored on all CPU cores via Rayon
//! - **Pluggable**: Task, activation and parent selection are traits
//! - **Configurable**: YAML configuration files
//! - **Reproducible**: Seeded random number generation and resumable checkpoints
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use neat_evolve::{Config, Neat, RankSelection};
//! use neat_evolve::tasks::Xor;
//! use neat_evolve::neural::Sigmoid;
//!
//! let config = Config::default();
//! let mut neat = Neat::new_with_seed(Xor::new(Sigmoid), RankSelection, config, 42).unwrap();
//!
//! let best = neat.train().unwrap();
//! println!("Best fitness: {}", best.fitness());
//! println!("Nodes: {}, genes: {}", best.node_count(), best.connections().len());
//! ```
//!
//! ## Custom tasks
//!
//! ```rust
//! use neat_evolve::{Genome, Task};
//! use neat_evolve::error::TaskError;
//! use neat_evolve::neural::{Network, Tanh};
//!
//! struct Balance;
//!
//! impl Task for Balance {
//!     fn evaluate(&self, genome: &Genome) -> Result<f64, TaskError> {
//!         let mut net = Network::new(genome, Tanh);
//!         let out = net.activate(&[0.5, -0.5])?;
//!         Ok(1.0 - out[0].abs())
//!     }
//! }
//! ```
//!
//! ## Checkpoints
//!
//! ```rust,no_run
//! use neat_evolve::{Config, Neat, RankSelection};
//! use neat_evolve::checkpoint::Checkpoint;
//! use neat_evolve::neural::Sigmoid;
//! use neat_evolve::tasks::Xor;
//!
//! let mut neat = Neat::new(Xor::new(Sigmoid), RankSelection, Config::default()).unwrap();
//! neat.initialize().unwrap();
//! neat.run(10).unwrap();
//!
//! // Save checkpoint
//! neat.create_checkpoint().save("checkpoint.bin").unwrap();
//!
//! // Load checkpoint and finish the run
//! let loaded = Checkpoint::load("checkpoint.bin").unwrap();
//! let mut restored = Neat::from_checkpoint(Xor::new(Sigmoid), RankSelection, loaded).unwrap();
//! let best = restored.resume().unwrap();
//! ```

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod evolution;
pub mod neural;
pub mod stats;
pub mod tasks;

// Re-export main types
pub use config::Config;
pub use error::{ConfigError, NeatError, Result};
pub use evolution::{Neat, RankSelection, SelectionPolicy, Task, TournamentSelection};
pub use neural::{ConnectionGene, Genome, Network};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
