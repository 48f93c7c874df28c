//! Connection genes.

use serde::{Deserialize, Serialize};

/// Dense per-genome node identifier
pub type NodeId = usize;

/// A directed, weighted edge tagged with its historical innovation id
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionGene {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f64,
    pub enabled: bool,
    pub innovation: usize,
}

impl ConnectionGene {
    pub fn new(source: NodeId, target: NodeId, weight: f64, innovation: usize) -> Self {
        Self {
            source,
            target,
            weight,
            enabled: true,
            innovation,
        }
    }

    /// Largest node id this gene refers to
    #[inline]
    pub fn max_node(&self) -> NodeId {
        self.source.max(self.target)
    }
}
