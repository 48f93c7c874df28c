//! Runnable networks built from genomes.

use super::gene::NodeId;
use super::genome::Genome;
use crate::error::{NeatError, Result};

/// Scalar activation applied at every non-input node
pub trait ActivationFunction: Sync {
    fn activate(&self, x: f64) -> f64;
}

impl<F> ActivationFunction for F
where
    F: Fn(f64) -> f64 + Sync,
{
    #[inline]
    fn activate(&self, x: f64) -> f64 {
        self(x)
    }
}

/// Logistic sigmoid
#[derive(Clone, Copy, Debug, Default)]
pub struct Sigmoid;

impl ActivationFunction for Sigmoid {
    #[inline]
    fn activate(&self, x: f64) -> f64 {
        1.0 / (1.0 + (-x).exp())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Tanh;

impl ActivationFunction for Tanh {
    #[inline]
    fn activate(&self, x: f64) -> f64 {
        x.tanh()
    }
}

/// Phenotype of a genome.
///
/// Acyclic genomes are evaluated in depth order, so one call propagates a
/// signal through the whole network. Cyclic genomes advance one synchronous
/// step per call from the previous node values, which the network keeps
/// until [`Network::reset`].
#[derive(Debug)]
pub struct Network<'g, A: ActivationFunction> {
    genome: &'g Genome,
    activation: A,
    /// Enabled incoming edges per node: (source, weight)
    incoming: Vec<Vec<(NodeId, f64)>>,
    /// Non-source nodes in evaluation order
    order: Vec<NodeId>,
    values: Vec<f64>,
}

impl<'g, A: ActivationFunction> Network<'g, A> {
    pub fn new(genome: &'g Genome, activation: A) -> Self {
        let n = genome.node_count();
        let mut incoming = vec![Vec::new(); n];
        for gene in genome.connections().iter().filter(|c| c.enabled) {
            incoming[gene.target].push((gene.source, gene.weight));
        }

        let mut order: Vec<NodeId> = (0..n).filter(|&node| !genome.is_source_node(node)).collect();
        if genome.is_acyclic() {
            let depths = genome.depths();
            order.sort_by_key(|&node| depths[node]);
        }

        Self {
            genome,
            activation,
            incoming,
            order,
            values: vec![0.0; n],
        }
    }

    /// Feed `inputs` and return the output node values
    pub fn activate(&mut self, inputs: &[f64]) -> Result<Vec<f64>> {
        let genome = self.genome;
        if inputs.len() != genome.input_count() {
            return Err(NeatError::InputSize {
                expected: genome.input_count(),
                found: inputs.len(),
            });
        }

        self.values[..inputs.len()].copy_from_slice(inputs);
        self.values[genome.bias_node()] = genome.bias();

        if genome.is_acyclic() {
            for &node in &self.order {
                let sum: f64 = self.incoming[node]
                    .iter()
                    .map(|&(source, weight)| weight * self.values[source])
                    .sum();
                self.values[node] = self.activation.activate(sum);
            }
        } else {
            let previous = self.values.clone();
            for &node in &self.order {
                let sum: f64 = self.incoming[node]
                    .iter()
                    .map(|&(source, weight)| weight * previous[source])
                    .sum();
                self.values[node] = self.activation.activate(sum);
            }
        }

        Ok(genome.output_nodes().map(|node| self.values[node]).collect())
    }

    /// Clear recurrent state
    pub fn reset(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
    }
}
