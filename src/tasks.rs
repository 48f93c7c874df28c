//! Demonstration tasks.

use crate::error::TaskError;
use crate::evolution::Task;
use crate::neural::{ActivationFunction, Genome, Network, Sigmoid};

/// Input and expected output for each of the four XOR cases
pub const XOR_CASES: [([f64; 2], f64); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

/// Two-input XOR; fitness is `4 - sum of squared errors`, so a perfect
/// network scores 4.
#[derive(Clone, Debug, Default)]
pub struct Xor<A: ActivationFunction = Sigmoid> {
    activation: A,
}

impl<A: ActivationFunction + Clone> Xor<A> {
    pub fn new(activation: A) -> Self {
        Self { activation }
    }

    /// Network output for every case, in `XOR_CASES` order
    pub fn outputs(&self, genome: &Genome) -> Result<Vec<f64>, TaskError> {
        // A cyclic network moves a signal one edge per step
        let settle_steps = if genome.is_acyclic() { 0 } else { genome.hidden_count() };
        let mut outputs = Vec::with_capacity(XOR_CASES.len());
        for (inputs, _) in XOR_CASES.iter() {
            // Fresh network per case so recurrent state never leaks
            let mut network = Network::new(genome, self.activation.clone());
            let mut out = network.activate(inputs)?;
            for _ in 0..settle_steps {
                out = network.activate(inputs)?;
            }
            outputs.push(out.first().copied().unwrap_or(0.0));
        }
        Ok(outputs)
    }

    /// Whether rounding every output gives the right answer
    pub fn solves(&self, genome: &Genome) -> bool {
        self.outputs(genome)
            .map(|outputs| {
                outputs
                    .iter()
                    .zip(XOR_CASES.iter())
                    .all(|(out, (_, expected))| (out.round() - expected).abs() < f64::EPSILON)
            })
            .unwrap_or(false)
    }
}

impl<A: ActivationFunction + Clone> Task for Xor<A> {
    fn evaluate(&self, genome: &Genome) -> Result<f64, TaskError> {
        let outputs = self.outputs(genome)?;
        let error: f64 = outputs
            .iter()
            .zip(XOR_CASES.iter())
            .map(|(out, (_, expected))| (out - expected).powi(2))
            .sum();
        Ok(XOR_CASES.len() as f64 - error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::{ConnectionGene, MutationConfig};

    /// Hand-wired XOR: h = OR-ish, g = AND-ish, out = h AND NOT g
    fn xor_genome() -> Genome {
        // inputs 0,1; bias 2; output 3; hidden 4, 5
        let genes = vec![
            ConnectionGene::new(0, 4, 20.0, 0),
            ConnectionGene::new(1, 4, 20.0, 1),
            ConnectionGene::new(2, 4, -10.0, 2),
            ConnectionGene::new(0, 5, 20.0, 3),
            ConnectionGene::new(1, 5, 20.0, 4),
            ConnectionGene::new(2, 5, -30.0, 5),
            ConnectionGene::new(4, 3, 20.0, 6),
            ConnectionGene::new(5, 3, -20.0, 7),
            ConnectionGene::new(2, 3, -10.0, 8),
        ];
        Genome::from_parts(2, 1, genes, 6, 1.0, MutationConfig::none(), true)
    }

    #[test]
    fn test_hand_wired_xor_scores_high() {
        let task = Xor::new(Sigmoid);
        let genome = xor_genome();

        assert!(task.solves(&genome));
        let fitness = task.evaluate(&genome).unwrap();
        assert!(fitness > 3.99, "fitness {}", fitness);
        assert!(fitness <= 4.0);
    }

    #[test]
    fn test_empty_network_scores_three() {
        // No genes: every output is sigmoid(0) = 0.5, error 4 * 0.25
        let genome = Genome::from_parts(2, 1, Vec::new(), 4, 1.0, MutationConfig::none(), true);
        let fitness = Xor::new(Sigmoid).evaluate(&genome).unwrap();
        assert!((fitness - 3.0).abs() < 1e-12);
        assert!(!Xor::new(Sigmoid).solves(&genome));
    }

    #[test]
    fn test_cyclic_network_settles() {
        let mut genome = xor_genome();
        genome.acyclic = false;
        genome.depths.clear();

        assert!(Xor::new(Sigmoid).solves(&genome));
    }
}
