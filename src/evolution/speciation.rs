//! Speciation by k-means clustering in innovation-indexed weight space.
//!
//! Every genome becomes a point whose coordinate `k` is the weight of its gene
//! with innovation id `k` (0 when absent). The population is partitioned into
//! exactly `num_species` clusters; centroids survive between generations so
//! that species keep their identity while their members change.

use crate::neural::Genome;
use ndarray::{Array2, ArrayView1};
use rand::seq::index;
use rand::Rng;

/// Fixed-size k-means speciator
#[derive(Clone, Debug)]
pub struct Speciator {
    num_species: usize,
    max_iterations: usize,
    centroids: Option<Array2<f64>>,
}

/// Build the `genomes x dims` weight matrix
pub fn weight_space(genomes: &[Genome], dims: usize) -> Array2<f64> {
    let mut data = Array2::zeros((genomes.len(), dims));
    for (i, genome) in genomes.iter().enumerate() {
        for gene in genome.connections() {
            if gene.innovation < dims {
                data[[i, gene.innovation]] = gene.weight;
            }
        }
    }
    data
}

/// Arena indices of the members of each species
pub fn species_members(assignments: &[usize], num_species: usize) -> Vec<Vec<usize>> {
    let mut members = vec![Vec::new(); num_species];
    for (genome, &species) in assignments.iter().enumerate() {
        members[species].push(genome);
    }
    members
}

#[inline]
fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl Speciator {
    pub fn new(num_species: usize, max_iterations: usize) -> Self {
        Self {
            num_species,
            max_iterations,
            centroids: None,
        }
    }

    /// Restore a speciator from saved centroid rows
    pub fn with_centroids(num_species: usize, max_iterations: usize, rows: &[Vec<f64>]) -> Self {
        let dims = rows.iter().map(Vec::len).max().unwrap_or(0);
        let centroids = if rows.len() == num_species {
            let mut c = Array2::zeros((num_species, dims));
            for (k, row) in rows.iter().enumerate() {
                for (d, &value) in row.iter().enumerate() {
                    c[[k, d]] = value;
                }
            }
            Some(c)
        } else {
            None
        };

        Self {
            num_species,
            max_iterations,
            centroids,
        }
    }

    pub fn num_species(&self) -> usize {
        self.num_species
    }

    pub fn centroids(&self) -> Option<&Array2<f64>> {
        self.centroids.as_ref()
    }

    /// Centroids as plain rows (checkpoint form)
    pub fn centroid_rows(&self) -> Vec<Vec<f64>> {
        self.centroids
            .as_ref()
            .map(|c| c.rows().into_iter().map(|row| row.to_vec()).collect())
            .unwrap_or_default()
    }

    /// Assign every genome a species index in `[0, num_species)`.
    ///
    /// With `init` the centroids are sampled from the population; otherwise
    /// the previous centroids (zero-padded to `dims`) seed the refinement.
    pub fn speciate<R: Rng + ?Sized>(
        &mut self,
        genomes: &[Genome],
        dims: usize,
        init: bool,
        rng: &mut R,
    ) -> Vec<usize> {
        let n = genomes.len();
        if n == 0 {
            return Vec::new();
        }

        let data = weight_space(genomes, dims);
        let mut centroids = match (&self.centroids, init) {
            (Some(previous), false) => Self::pad(previous, dims),
            _ => self.sample_centroids(&data, rng),
        };

        let mut assignments = vec![usize::MAX; n];
        for iteration in 0..self.max_iterations {
            let mut changed = false;
            for (i, point) in data.rows().into_iter().enumerate() {
                let mut best = 0;
                let mut best_dist = f64::INFINITY;
                for (k, centroid) in centroids.rows().into_iter().enumerate() {
                    let dist = squared_distance(point, centroid);
                    if dist < best_dist {
                        best = k;
                        best_dist = dist;
                    }
                }
                if assignments[i] != best {
                    assignments[i] = best;
                    changed = true;
                }
            }

            if !changed {
                log::trace!("k-means converged after {} iterations", iteration);
                break;
            }

            // Empty clusters keep their previous centroid
            let mut sums = Array2::<f64>::zeros((self.num_species, dims));
            let mut counts = vec![0usize; self.num_species];
            for (i, &k) in assignments.iter().enumerate() {
                let mut row = sums.row_mut(k);
                row += &data.row(i);
                counts[k] += 1;
            }
            for (k, &count) in counts.iter().enumerate() {
                if count > 0 {
                    let mean = sums.row(k).mapv(|v| v / count as f64);
                    centroids.row_mut(k).assign(&mean);
                }
            }
        }

        if log::log_enabled!(log::Level::Debug) {
            let sizes: Vec<usize> = species_members(&assignments, self.num_species)
                .iter()
                .map(Vec::len)
                .collect();
            log::debug!("Species sizes: {:?}", sizes);
        }

        self.centroids = Some(centroids);
        assignments
    }

    /// Distinct genomes chosen uniformly as initial centroids
    fn sample_centroids<R: Rng + ?Sized>(&self, data: &Array2<f64>, rng: &mut R) -> Array2<f64> {
        let n = data.nrows();
        let k = self.num_species;
        let mut centroids = Array2::zeros((k, data.ncols()));

        let picks = index::sample(rng, n, k.min(n));
        for (slot, row) in picks.iter().enumerate() {
            centroids.row_mut(slot).assign(&data.row(row));
        }
        centroids
    }

    fn pad(previous: &Array2<f64>, dims: usize) -> Array2<f64> {
        let mut padded = Array2::zeros((previous.nrows(), dims));
        let keep = previous.ncols().min(dims);
        for (k, row) in previous.rows().into_iter().enumerate() {
            for d in 0..keep {
                padded[[k, d]] = row[d];
            }
        }
        padded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::{ConnectionGene, MutationConfig};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn genome(weights: &[f64]) -> Genome {
        let genes = weights
            .iter()
            .enumerate()
            .map(|(i, &w)| ConnectionGene::new(i % 2, 3, w, i))
            .collect();
        Genome::from_parts(2, 1, genes, 4, 1.0, MutationConfig::default(), false)
    }

    fn two_clusters() -> Vec<Genome> {
        let mut genomes = Vec::new();
        for i in 0..5 {
            let jitter = i as f64 * 0.01;
            genomes.push(genome(&[1.0 + jitter, 1.0 - jitter]));
            genomes.push(genome(&[-1.0 - jitter, -1.0 + jitter]));
        }
        genomes
    }

    #[test]
    fn test_weight_space() {
        let genomes = vec![genome(&[0.5, -0.5]), genome(&[2.0])];
        let data = weight_space(&genomes, 3);

        assert_eq!(data.dim(), (2, 3));
        assert_eq!(data[[0, 1]], -0.5);
        assert_eq!(data[[1, 0]], 2.0);
        assert_eq!(data[[1, 1]], 0.0);
    }

    #[test]
    fn test_separated_groups_split() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let genomes = two_clusters();
        let mut speciator = Speciator::new(2, 50);

        let assignments = speciator.speciate(&genomes, 2, true, &mut rng);

        assert_eq!(assignments.len(), 10);
        assert!(assignments.iter().all(|&s| s < 2));
        let positive = assignments[0];
        for (i, &s) in assignments.iter().enumerate() {
            if i % 2 == 0 {
                assert_eq!(s, positive);
            } else {
                assert_ne!(s, positive);
            }
        }
    }

    #[test]
    fn test_incremental_keeps_labels() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let genomes = two_clusters();
        let mut speciator = Speciator::new(2, 50);
        let first = speciator.speciate(&genomes, 2, true, &mut rng);

        // Points move slightly and a new innovation appears
        let moved: Vec<Genome> = genomes
            .iter()
            .map(|g| {
                let w: Vec<f64> = g.connections().iter().map(|c| c.weight * 1.1).collect();
                genome(&[w[0], w[1], 0.05])
            })
            .collect();
        let second = speciator.speciate(&moved, 3, false, &mut rng);

        assert_eq!(first, second);
        assert_eq!(speciator.centroids().unwrap().ncols(), 3);
    }

    #[test]
    fn test_identical_genomes_leave_species_empty() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let genomes: Vec<Genome> = (0..6).map(|_| genome(&[0.3, 0.3])).collect();
        let mut speciator = Speciator::new(3, 20);

        let assignments = speciator.speciate(&genomes, 2, true, &mut rng);
        let members = species_members(&assignments, 3);

        // Ties go to the lowest index, so everything lands in species 0
        assert_eq!(members[0].len(), 6);
        assert!(members[1].is_empty());
        assert!(members[2].is_empty());
    }

    #[test]
    fn test_centroid_rows_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let genomes = two_clusters();
        let mut speciator = Speciator::new(2, 50);
        let assignments = speciator.speciate(&genomes, 2, true, &mut rng);

        let rows = speciator.centroid_rows();
        let mut restored = Speciator::with_centroids(2, 50, &rows);
        let again = restored.speciate(&genomes, 2, false, &mut rng);

        assert_eq!(assignments, again);
    }
}
