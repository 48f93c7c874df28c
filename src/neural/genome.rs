//! Genome representation: innovation-sorted connection genes over dense node ids.
//!
//! Node layout is fixed for a run:
//! `[0, inputs)` inputs, `inputs` the bias node, then `outputs` output nodes,
//! then hidden nodes in creation order.

use super::gene::{ConnectionGene, NodeId};
use super::innovation::InnovationLedger;
use super::mutations::MutationConfig;
use crate::error::{ConfigError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fitness reported by a genome that has not been evaluated yet
pub const UNEVALUATED: f64 = f64::NEG_INFINITY;

/// A network individual
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Genome {
    pub(crate) inputs: usize,
    pub(crate) outputs: usize,
    pub(crate) connections: Vec<ConnectionGene>,
    pub(crate) node_count: usize,
    /// Longest-path depth per node; empty unless the genome is acyclic
    pub(crate) depths: Vec<usize>,
    pub(crate) bias: f64,
    pub(crate) fitness: f64,
    pub(crate) mutation: MutationConfig,
    pub(crate) acyclic: bool,
}

impl Genome {
    /// Create a minimal genome: one gene per input -> output pair.
    ///
    /// The minimal genes use innovation ids `0..inputs * outputs` in every
    /// genome of a run, so the ledger only reserves that range.
    pub fn new<R: Rng + ?Sized>(
        inputs: usize,
        outputs: usize,
        bias: f64,
        mutation: MutationConfig,
        acyclic: bool,
        ledger: &InnovationLedger,
        rng: &mut R,
    ) -> Result<Self> {
        if inputs == 0 {
            return Err(ConfigError::ZeroInputs.into());
        }
        if outputs == 0 {
            return Err(ConfigError::ZeroOutputs.into());
        }

        ledger.reserve(inputs * outputs);

        let first_output = inputs + 1;
        let mut connections = Vec::with_capacity(inputs * outputs);
        for i in 0..inputs {
            for o in 0..outputs {
                let weight = rng.gen_range(-1.0..1.0);
                connections.push(ConnectionGene::new(i, first_output + o, weight, i * outputs + o));
            }
        }

        Ok(Self::from_parts(
            inputs,
            outputs,
            connections,
            inputs + 1 + outputs,
            bias,
            mutation,
            acyclic,
        ))
    }

    /// Assemble a genome from an already chosen gene list.
    ///
    /// Genes are sorted by innovation id and the node count is widened so
    /// that every gene refers to an existing node.
    pub(crate) fn from_parts(
        inputs: usize,
        outputs: usize,
        mut connections: Vec<ConnectionGene>,
        node_count: usize,
        bias: f64,
        mutation: MutationConfig,
        acyclic: bool,
    ) -> Self {
        connections.sort_by_key(|c| c.innovation);
        connections.dedup_by_key(|c| c.innovation);

        let referenced = connections.iter().map(|c| c.max_node() + 1).max().unwrap_or(0);
        let node_count = node_count.max(referenced).max(inputs + 1 + outputs);

        let mut genome = Self {
            inputs,
            outputs,
            connections,
            node_count,
            depths: Vec::new(),
            bias,
            fitness: UNEVALUATED,
            mutation,
            acyclic,
        };
        if acyclic {
            genome.update_depths();
        }
        genome
    }

    #[inline]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    #[inline]
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    /// Whether a task has scored this genome
    pub fn is_evaluated(&self) -> bool {
        self.fitness != UNEVALUATED
    }

    /// Total nodes: inputs, bias, outputs and hidden nodes
    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Connection genes, ascending by innovation id
    #[inline]
    pub fn connections(&self) -> &[ConnectionGene] {
        &self.connections
    }

    pub fn input_count(&self) -> usize {
        self.inputs
    }

    pub fn output_count(&self) -> usize {
        self.outputs
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn is_acyclic(&self) -> bool {
        self.acyclic
    }

    pub fn mutation_config(&self) -> &MutationConfig {
        &self.mutation
    }

    /// Node depths (acyclic genomes only, empty otherwise)
    pub fn depths(&self) -> &[usize] {
        &self.depths
    }

    #[inline]
    pub fn bias_node(&self) -> NodeId {
        self.inputs
    }

    /// Ids of the output nodes
    pub fn output_nodes(&self) -> std::ops::Range<NodeId> {
        let first = self.inputs + 1;
        first..first + self.outputs
    }

    /// Inputs and the bias node never receive connections
    #[inline]
    pub fn is_source_node(&self, node: NodeId) -> bool {
        node <= self.inputs
    }

    /// Number of hidden nodes added by mutation
    pub fn hidden_count(&self) -> usize {
        self.node_count - (self.inputs + 1 + self.outputs)
    }

    pub fn enabled_connection_count(&self) -> usize {
        self.connections.iter().filter(|c| c.enabled).count()
    }

    /// Position of the gene with the given innovation id
    pub fn find_innovation(&self, innovation: usize) -> Option<usize> {
        self.connections
            .binary_search_by_key(&innovation, |c| c.innovation)
            .ok()
    }

    pub fn contains_innovation(&self, innovation: usize) -> bool {
        self.find_innovation(innovation).is_some()
    }

    /// Whether any gene (enabled or not) already links `source -> target`
    pub fn has_connection(&self, source: NodeId, target: NodeId) -> bool {
        self.connections
            .iter()
            .any(|c| c.source == source && c.target == target)
    }

    /// Insert a gene keeping the innovation ordering
    pub(crate) fn insert_gene(&mut self, gene: ConnectionGene) {
        match self
            .connections
            .binary_search_by_key(&gene.innovation, |c| c.innovation)
        {
            Ok(pos) => self.connections[pos] = gene,
            Err(pos) => self.connections.insert(pos, gene),
        }
    }

    /// Recompute longest-path depths over all genes.
    ///
    /// Inputs and bias sit at depth 0; every other node is at least 1.
    pub(crate) fn update_depths(&mut self) {
        let n = self.node_count;
        let mut depths: Vec<usize> = (0..n)
            .map(|node| if self.is_source_node(node) { 0 } else { 1 })
            .collect();

        let mut outgoing: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        let mut in_degree = vec![0usize; n];
        for gene in &self.connections {
            outgoing[gene.source].push(gene.target);
            in_degree[gene.target] += 1;
        }

        // Kahn's algorithm; relax depths in topological order
        let mut queue: Vec<NodeId> = (0..n).filter(|&node| in_degree[node] == 0).collect();
        while let Some(node) = queue.pop() {
            for &next in &outgoing[node] {
                depths[next] = depths[next].max(depths[node] + 1);
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push(next);
                }
            }
        }

        self.depths = depths;
    }

    /// Check structural invariants: sorted unique innovations and in-range nodes
    pub fn is_valid(&self) -> bool {
        let sorted = self
            .connections
            .windows(2)
            .all(|w| w[0].innovation < w[1].innovation);
        let in_range = self
            .connections
            .iter()
            .all(|c| c.source < self.node_count && c.target < self.node_count);
        let finite = self.bias.is_finite() && self.connections.iter().all(|c| c.weight.is_finite());
        sorted && in_range && finite
    }
}
