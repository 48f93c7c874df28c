//! Genome representation and network phenotypes.
//!
//! Implements NEAT-style genomes with:
//! - Innovation-tracked connection genes
//! - Weight, bias and structural mutations (add node, add connection)
//! - Crossover aligned on innovation ids
//! - Feed-forward and recurrent evaluation

mod crossover;
mod gene;
mod genome;
mod innovation;
mod mutations;
mod network;

pub use crossover::FITNESS_TIE_EPSILON;
pub use gene::{ConnectionGene, NodeId};
pub use genome::{Genome, UNEVALUATED};
pub use innovation::{GenerationInnovations, InnovationLedger};
pub use mutations::MutationConfig;
pub use network::{ActivationFunction, Network, Sigmoid, Tanh};
