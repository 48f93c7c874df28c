//! Genetic crossover between genomes, aligned on innovation ids.

use super::genome::Genome;
use rand::Rng;

/// Fitness difference below which two parents count as equally fit
pub const FITNESS_TIE_EPSILON: f64 = 0.001;

impl Genome {
    /// Produce one child from two parents.
    ///
    /// Equally fit parents in a cyclic run are merged gene by gene. In every
    /// other case the child takes the fitter parent's structure (a random
    /// parent on a tie) and only mixes the weights of matching genes.
    pub fn crossover<R: Rng + ?Sized>(
        &self,
        other: &Self,
        disable_prob: f64,
        acyclic: bool,
        rng: &mut R,
    ) -> Self {
        let tie = (self.fitness - other.fitness).abs() < FITNESS_TIE_EPSILON;

        if tie && !acyclic {
            self.crossover_aligned(other, rng)
        } else {
            let self_is_base = if tie {
                rng.gen::<f64>() < 0.5
            } else {
                self.fitness > other.fitness
            };
            let (base, donor) = if self_is_base { (self, other) } else { (other, self) };
            base.crossover_fitter_parent(donor, disable_prob, acyclic, rng)
        }
    }

    /// Keep the base structure, mix weights and enabled flags of matching genes
    fn crossover_fitter_parent<R: Rng + ?Sized>(
        &self,
        donor: &Self,
        disable_prob: f64,
        acyclic: bool,
        rng: &mut R,
    ) -> Self {
        let mut genes = self.connections.clone();

        for gene in &mut genes {
            let Some(pos) = donor.find_innovation(gene.innovation) else {
                continue;
            };
            let matching = &donor.connections[pos];

            // Either copy disabled: disabled again with the preset probability
            if !gene.enabled || !matching.enabled {
                gene.enabled = rng.gen::<f64>() >= disable_prob;
            }
            if rng.gen::<f64>() < 0.5 {
                gene.weight = matching.weight;
            }
        }

        Genome::from_parts(
            self.inputs,
            self.outputs,
            genes,
            self.node_count.max(donor.node_count),
            self.bias,
            self.mutation,
            acyclic,
        )
    }

    /// Merge both gene lists in innovation order.
    ///
    /// Matching genes come from either parent with equal chance; disjoint and
    /// excess genes are each kept with probability one half.
    fn crossover_aligned<R: Rng + ?Sized>(&self, other: &Self, rng: &mut R) -> Self {
        let (a, b) = (&self.connections, &other.connections);
        let mut genes = Vec::with_capacity(a.len().max(b.len()));
        let (mut i, mut j) = (0, 0);

        while i < a.len() && j < b.len() {
            if a[i].innovation == b[j].innovation {
                let gene = if rng.gen::<f64>() < 0.5 { &a[i] } else { &b[j] };
                genes.push(gene.clone());
                i += 1;
                j += 1;
            } else if a[i].innovation < b[j].innovation {
                if rng.gen::<f64>() < 0.5 {
                    genes.push(a[i].clone());
                }
                i += 1;
            } else {
                if rng.gen::<f64>() < 0.5 {
                    genes.push(b[j].clone());
                }
                j += 1;
            }
        }

        // Excess genes of whichever parent is longer
        for gene in a[i..].iter().chain(b[j..].iter()) {
            if rng.gen::<f64>() < 0.5 {
                genes.push(gene.clone());
            }
        }

        let bias = if rng.gen::<f64>() < 0.5 { self.bias } else { other.bias };

        Genome::from_parts(
            self.inputs,
            self.outputs,
            genes,
            self.node_count.max(other.node_count),
            bias,
            self.mutation,
            false,
        )
    }
}
