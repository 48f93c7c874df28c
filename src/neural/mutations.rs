//! Genome mutations (NEAT-style).

use super::gene::{ConnectionGene, NodeId};
use super::genome::Genome;
use super::innovation::GenerationInnovations;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Mutation probabilities and magnitudes a genome is built with
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Probability of perturbing each connection weight
    pub weight_mutation_prob: f64,
    /// Bound of the uniform weight perturbation
    pub weight_mutation_size: f64,
    /// Probability of perturbing the bias value
    pub bias_mutation_prob: f64,
    /// Bound of the uniform bias perturbation
    pub bias_mutation_size: f64,
    /// Probability of splitting a connection with a new node
    pub node_addition_prob: f64,
    /// Probability of adding a new connection
    pub conn_addition_prob: f64,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            weight_mutation_prob: 0.8,
            weight_mutation_size: 0.5,
            bias_mutation_prob: 0.7,
            bias_mutation_size: 0.5,
            node_addition_prob: 0.03,
            conn_addition_prob: 0.05,
        }
    }
}

impl MutationConfig {
    /// No mutation at all: reproduction reduces to selection and crossover
    pub fn none() -> Self {
        Self {
            weight_mutation_prob: 0.0,
            weight_mutation_size: 0.0,
            bias_mutation_prob: 0.0,
            bias_mutation_size: 0.0,
            node_addition_prob: 0.0,
            conn_addition_prob: 0.0,
        }
    }
}

/// Uniform draw in `[-size, size)`, zero for a zero size
#[inline]
fn perturbation<R: Rng + ?Sized>(rng: &mut R, size: f64) -> f64 {
    if size > 0.0 {
        rng.gen_range(-size..size)
    } else {
        0.0
    }
}

impl Genome {
    /// Apply all mutations according to the genome's own configuration
    pub fn mutate<R: Rng + ?Sized>(&mut self, innovations: &mut GenerationInnovations, rng: &mut R) {
        let config = self.mutation;

        self.mutate_weights(config.weight_mutation_prob, config.weight_mutation_size, rng);

        if rng.gen::<f64>() < config.bias_mutation_prob {
            self.bias += perturbation(rng, config.bias_mutation_size);
        }

        // Structural mutations
        if rng.gen::<f64>() < config.node_addition_prob {
            self.add_node(innovations, rng);
        }

        if rng.gen::<f64>() < config.conn_addition_prob {
            self.add_connection(innovations, rng);
        }
    }

    /// Perturb each weight independently with the given probability
    pub fn mutate_weights<R: Rng + ?Sized>(&mut self, prob: f64, size: f64, rng: &mut R) {
        for gene in &mut self.connections {
            if rng.gen::<f64>() < prob {
                gene.weight += perturbation(rng, size);
            }
        }
    }

    /// Split a random enabled connection `a -> b` into `a -> n -> b`.
    ///
    /// The incoming gene gets weight 1.0 and the outgoing gene the old
    /// weight. Returns the new node id, or `None` when nothing is enabled.
    pub fn add_node<R: Rng + ?Sized>(
        &mut self,
        innovations: &mut GenerationInnovations,
        rng: &mut R,
    ) -> Option<NodeId> {
        let enabled: Vec<usize> = self
            .connections
            .iter()
            .enumerate()
            .filter(|(_, c)| c.enabled)
            .map(|(i, _)| i)
            .collect();
        if enabled.is_empty() {
            return None;
        }

        let idx = enabled[rng.gen_range(0..enabled.len())];
        let split = self.connections[idx].clone();
        self.connections[idx].enabled = false;

        let node = self.node_count;
        self.node_count += 1;

        let (mut incoming, mut outgoing) = innovations.split(split.innovation);
        if self.contains_innovation(incoming) {
            incoming = innovations.fresh();
        }
        if self.contains_innovation(outgoing) {
            outgoing = innovations.fresh();
        }

        self.insert_gene(ConnectionGene::new(split.source, node, 1.0, incoming));
        self.insert_gene(ConnectionGene::new(node, split.target, split.weight, outgoing));

        if self.acyclic {
            self.update_depths();
        }

        Some(node)
    }

    /// Connect a previously unconnected pair of nodes.
    ///
    /// Targets are never inputs or the bias node. In acyclic mode the source
    /// must be strictly shallower than the target.
    pub fn add_connection<R: Rng + ?Sized>(
        &mut self,
        innovations: &mut GenerationInnovations,
        rng: &mut R,
    ) -> Option<(NodeId, NodeId)> {
        let existing: HashSet<(NodeId, NodeId)> = self
            .connections
            .iter()
            .map(|c| (c.source, c.target))
            .collect();

        let mut candidates = Vec::new();
        for source in 0..self.node_count {
            for target in (self.inputs + 1)..self.node_count {
                if existing.contains(&(source, target)) {
                    continue;
                }
                if self.acyclic && self.depths[source] >= self.depths[target] {
                    continue;
                }
                candidates.push((source, target));
            }
        }
        if candidates.is_empty() {
            return None;
        }

        let (source, target) = candidates[rng.gen_range(0..candidates.len())];
        let mut innovation = innovations.connection(source, target);
        if self.contains_innovation(innovation) {
            innovation = innovations.fresh();
        }

        let weight = rng.gen_range(-1.0..1.0);
        self.insert_gene(ConnectionGene::new(source, target, weight, innovation));

        if self.acyclic {
            self.update_depths();
        }

        Some((source, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::InnovationLedger;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn setup(acyclic: bool, config: MutationConfig) -> (InnovationLedger, Genome, ChaCha8Rng) {
        let ledger = InnovationLedger::new();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let genome = Genome::new(3, 2, 1.0, config, acyclic, &ledger, &mut rng).unwrap();
        (ledger, genome, rng)
    }

    fn has_unique_innovations(genome: &Genome) -> bool {
        let ids: HashSet<usize> = genome.connections().iter().map(|c| c.innovation).collect();
        ids.len() == genome.connections().len()
    }

    #[test]
    fn test_weight_mutation() {
        let (_ledger, mut genome, mut rng) = setup(false, MutationConfig::default());
        let original: Vec<f64> = genome.connections().iter().map(|c| c.weight).collect();

        genome.mutate_weights(1.0, 0.1, &mut rng);

        let changed = genome
            .connections()
            .iter()
            .zip(original.iter())
            .all(|(c, w)| (c.weight - w).abs() > 0.0 && (c.weight - w).abs() <= 0.1 + 1e-12);
        assert!(changed, "Every weight should move by at most the mutation size");
    }

    #[test]
    fn test_zero_probabilities_leave_genome_untouched() {
        let (ledger, mut genome, mut rng) = setup(false, MutationConfig::none());
        let before = genome.clone();

        let mut innovations = GenerationInnovations::new(&ledger);
        for _ in 0..50 {
            genome.mutate(&mut innovations, &mut rng);
        }

        assert_eq!(genome.connections(), before.connections());
        assert_eq!(genome.bias(), before.bias());
        assert_eq!(ledger.count(), 6);
    }

    #[test]
    fn test_add_node_splits_connection() {
        let (ledger, mut genome, mut rng) = setup(false, MutationConfig::default());
        let mut innovations = GenerationInnovations::new(&ledger);

        let node = genome.add_node(&mut innovations, &mut rng).unwrap();

        assert_eq!(node, 6);
        assert_eq!(genome.node_count(), 7);
        assert_eq!(genome.connections().len(), 8);
        assert_eq!(genome.enabled_connection_count(), 7);

        let disabled = genome.connections().iter().find(|c| !c.enabled).unwrap();
        let incoming = genome.connections().iter().find(|c| c.target == node).unwrap();
        let outgoing = genome.connections().iter().find(|c| c.source == node).unwrap();
        assert_eq!(incoming.source, disabled.source);
        assert_eq!(incoming.weight, 1.0);
        assert_eq!(outgoing.target, disabled.target);
        assert_eq!(outgoing.weight, disabled.weight);
        assert!(genome.is_valid());
    }

    #[test]
    fn test_add_connection_uses_new_pair() {
        let (ledger, mut genome, mut rng) = setup(false, MutationConfig::default());
        let mut innovations = GenerationInnovations::new(&ledger);

        let (source, target) = genome.add_connection(&mut innovations, &mut rng).unwrap();

        assert!(!genome.is_source_node(target));
        assert_eq!(genome.connections().len(), 7);
        assert_eq!(
            genome
                .connections()
                .iter()
                .filter(|c| c.source == source && c.target == target)
                .count(),
            1
        );
    }

    #[test]
    fn test_acyclic_connections_point_forward() {
        let config = MutationConfig {
            node_addition_prob: 0.5,
            conn_addition_prob: 0.8,
            ..MutationConfig::default()
        };
        let (ledger, mut genome, mut rng) = setup(true, config);

        for _ in 0..40 {
            let mut innovations = GenerationInnovations::new(&ledger);
            genome.mutate(&mut innovations, &mut rng);
        }

        let depths = genome.depths();
        assert!(genome
            .connections()
            .iter()
            .all(|c| depths[c.source] < depths[c.target]));
        assert!(has_unique_innovations(&genome));
        assert!(genome.is_valid());
    }

    #[test]
    fn test_structural_mutations_keep_innovations_unique() {
        let config = MutationConfig {
            node_addition_prob: 0.9,
            conn_addition_prob: 0.9,
            ..MutationConfig::default()
        };
        let (ledger, mut genome, mut rng) = setup(false, config);
        let mut innovations = GenerationInnovations::new(&ledger);

        // One shared generation record: merged ids must still stay unique
        for _ in 0..30 {
            genome.mutate(&mut innovations, &mut rng);
        }

        assert!(has_unique_innovations(&genome));
        assert!(genome.is_valid());
        assert!(genome.hidden_count() > 0);
    }

    #[test]
    fn test_same_split_in_two_genomes_shares_ids() {
        let ledger = InnovationLedger::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut a = Genome::new(1, 1, 1.0, MutationConfig::default(), false, &ledger, &mut rng).unwrap();
        let mut b = a.clone();

        let mut innovations = GenerationInnovations::new(&ledger);
        a.add_node(&mut innovations, &mut rng);
        b.add_node(&mut innovations, &mut rng);

        let ids_a: Vec<usize> = a.connections().iter().map(|c| c.innovation).collect();
        let ids_b: Vec<usize> = b.connections().iter().map(|c| c.innovation).collect();
        assert_eq!(ids_a, ids_b);
        assert_eq!(ledger.count(), 3);
    }
}
