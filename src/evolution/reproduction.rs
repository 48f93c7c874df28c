//! Next-generation construction: allotment, elitism, crossover and mutation.

use super::selection::SelectionPolicy;
use crate::neural::{GenerationInnovations, Genome};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// What one species received in a reproduction step
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesAllotment {
    /// Members in the parent generation
    pub members: usize,
    pub mean_fitness: f64,
    /// Offspring slots in the next generation
    pub size: usize,
    /// Slots filled by unmodified copies of the best members
    pub elites: usize,
}

/// Reproduction parameters for a run
#[derive(Clone, Debug)]
pub struct Reproduction {
    pub pop_size: usize,
    pub elitism_prop: f64,
    pub disable_prob: f64,
    pub acyclic: bool,
}

/// Split `pop_size` slots between species in proportion to mean fitness.
///
/// Negative means count as zero. Empty species get nothing; every species
/// with members gets at least one slot (there are never more occupied
/// species than slots when called from reproduction). Rounding drift is
/// settled over the occupied species in index order. A total fitness that
/// is not positive falls back to an even split.
pub fn allot_sizes(mean_fitnesses: &[f64], member_counts: &[usize], pop_size: usize) -> Vec<usize> {
    let mut sizes = vec![0usize; mean_fitnesses.len()];
    let occupied: Vec<usize> = (0..mean_fitnesses.len())
        .filter(|&s| member_counts[s] > 0)
        .collect();
    if occupied.is_empty() || pop_size == 0 {
        return sizes;
    }
    let floor = usize::from(occupied.len() <= pop_size);

    let total: f64 = occupied.iter().map(|&s| mean_fitnesses[s].max(0.0)).sum();
    if total > 0.0 && total.is_finite() {
        for &s in &occupied {
            // share <= 1, so no size exceeds pop_size
            let share = mean_fitnesses[s].max(0.0) / total;
            sizes[s] = ((share * pop_size as f64).round() as usize).max(floor);
        }
    } else {
        log::warn!(
            "Total mean fitness is {}, splitting the population evenly over {} species",
            total,
            occupied.len()
        );
        for &s in &occupied {
            sizes[s] = (pop_size / occupied.len()).max(floor);
        }
    }

    let allotted: usize = sizes.iter().sum();
    if allotted < pop_size {
        // Deficit: whole rounds over every occupied species, then the rest
        // to the first ones in index order
        let deficit = pop_size - allotted;
        let (rounds, rest) = (deficit / occupied.len(), deficit % occupied.len());
        for (i, &s) in occupied.iter().enumerate() {
            sizes[s] += rounds + usize::from(i < rest);
        }
    } else if allotted > pop_size {
        // Surplus: one slot per pass from each species above the floor, in
        // index order. Floors sum to at most pop_size.
        let mut surplus = allotted - pop_size;
        while surplus > 0 {
            for &s in &occupied {
                if surplus == 0 {
                    break;
                }
                if sizes[s] > floor {
                    sizes[s] -= 1;
                    surplus -= 1;
                }
            }
        }
    }

    sizes
}

/// Elites per species: `round(elitism_prop * size)`, at least one for every
/// species that has members and offspring slots. Together with the slot
/// floor of [`allot_sizes`] every non-empty species keeps its best member.
pub fn elite_counts(sizes: &[usize], member_counts: &[usize], elitism_prop: f64) -> Vec<usize> {
    sizes
        .iter()
        .zip(member_counts)
        .map(|(&size, &members)| {
            if size == 0 || members == 0 {
                0
            } else {
                let elites = (elitism_prop * size as f64).round() as usize;
                elites.max(1).min(size).min(members)
            }
        })
        .collect()
}

impl Reproduction {
    /// Build the next generation from the current one and its species
    /// membership (arena indices into `genomes`).
    pub fn reproduce<S, R>(
        &self,
        genomes: &[Genome],
        species: &[Vec<usize>],
        selection: &S,
        innovations: &mut GenerationInnovations,
        rng: &mut R,
    ) -> (Vec<Genome>, Vec<SpeciesAllotment>)
    where
        S: SelectionPolicy,
        R: Rng + ?Sized,
    {
        let member_counts: Vec<usize> = species.iter().map(Vec::len).collect();
        let mean_fitnesses: Vec<f64> = species
            .iter()
            .map(|members| {
                if members.is_empty() {
                    0.0
                } else {
                    members.iter().map(|&i| genomes[i].fitness()).sum::<f64>() / members.len() as f64
                }
            })
            .collect();

        let sizes = allot_sizes(&mean_fitnesses, &member_counts, self.pop_size);
        let elites = elite_counts(&sizes, &member_counts, self.elitism_prop);
        log::debug!("Allotted sizes: {:?}, elites: {:?}", sizes, elites);

        let mut next = Vec::with_capacity(self.pop_size);
        for (s, members) in species.iter().enumerate() {
            if sizes[s] == 0 {
                continue;
            }

            // Stable sorts keep arena order among equal fitnesses
            let mut ascending = members.clone();
            ascending.sort_by(|&a, &b| genomes[a].fitness().total_cmp(&genomes[b].fitness()));
            let mut descending = members.clone();
            descending.sort_by(|&a, &b| genomes[b].fitness().total_cmp(&genomes[a].fitness()));

            let start = next.len();
            next.extend(descending.iter().take(elites[s]).map(|&i| genomes[i].clone()));

            let fitnesses: Vec<f64> = ascending.iter().map(|&i| genomes[i].fitness()).collect();
            while next.len() - start < sizes[s] {
                let (first, second) = selection.select(&fitnesses, rng);
                let mut child = genomes[ascending[first]].crossover(
                    &genomes[ascending[second]],
                    self.disable_prob,
                    self.acyclic,
                    rng,
                );
                child.mutate(innovations, rng);
                next.push(child);
            }
        }

        let report = (0..species.len())
            .map(|s| SpeciesAllotment {
                members: member_counts[s],
                mean_fitness: mean_fitnesses[s],
                size: sizes[s],
                elites: elites[s],
            })
            .collect();

        (next, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::RankSelection;
    use crate::neural::{InnovationLedger, MutationConfig};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_allotment_deficit_goes_to_first_species() {
        let sizes = allot_sizes(&[1.0, 1.0, 1.0], &[3, 3, 4], 10);
        assert_eq!(sizes, vec![4, 3, 3]);
    }

    #[test]
    fn test_allotment_surplus_taken_in_index_order() {
        // 2.5 rounds up to 3 for all four species: 12 slots for 10
        let sizes = allot_sizes(&[1.0, 1.0, 1.0, 1.0], &[2, 2, 3, 3], 10);
        assert_eq!(sizes, vec![2, 2, 3, 3]);
    }

    #[test]
    fn test_allotment_skips_empty_species() {
        // 2.5 and 7.5 both round up; the surplus slot leaves species 1
        let sizes = allot_sizes(&[0.0, 2.0, 6.0], &[0, 5, 5], 10);
        assert_eq!(sizes, vec![0, 2, 8]);

        // Deficit must not land on the empty species 0
        let sizes = allot_sizes(&[0.0, 1.0, 1.0, 1.0], &[0, 3, 3, 4], 10);
        assert_eq!(sizes, vec![0, 4, 3, 3]);
    }

    #[test]
    fn test_allotment_zero_total_is_uniform() {
        assert_eq!(allot_sizes(&[0.0, 0.0], &[3, 7], 10), vec![5, 5]);
        assert_eq!(allot_sizes(&[0.0, 0.0], &[3, 4], 7), vec![4, 3]);
        assert_eq!(allot_sizes(&[-1.0, -2.0], &[3, 4], 10), vec![5, 5]);
    }

    #[test]
    fn test_allotment_mixed_sign_means() {
        // A raw total of 1e-8 would blow the positive share up past the
        // population; the negative mean counts as zero instead
        let sizes = allot_sizes(&[1.0, -0.99999999], &[5, 5], 10);
        assert_eq!(sizes, vec![9, 1]);

        let sizes = allot_sizes(&[-3.0, 2.0, 6.0], &[4, 3, 3], 20);
        assert_eq!(sizes, vec![1, 4, 15]);
    }

    #[test]
    fn test_allotment_keeps_every_occupied_species() {
        let sizes = allot_sizes(&[100.0, 1.0], &[5, 5], 10);
        assert_eq!(sizes, vec![9, 1]);
        assert_eq!(elite_counts(&sizes, &[5, 5], 0.1), vec![1, 1]);

        // One slot per species is all there is
        let sizes = allot_sizes(&[50.0, 0.0, 0.0], &[1, 1, 1], 3);
        assert_eq!(sizes, vec![1, 1, 1]);
    }

    #[test]
    fn test_allotment_conservation() {
        let mut rng = ChaCha8Rng::seed_from_u64(77);
        for _ in 0..500 {
            let k = rng.gen_range(1..8);
            let pop = rng.gen_range(k..200);
            let counts: Vec<usize> = (0..k).map(|_| rng.gen_range(0..20)).collect();
            if counts.iter().all(|&c| c == 0) {
                continue;
            }
            let means: Vec<f64> = counts
                .iter()
                .map(|&c| if c == 0 { 0.0 } else { rng.gen_range(-50.0..100.0) })
                .collect();

            let sizes = allot_sizes(&means, &counts, pop);
            assert_eq!(sizes.iter().sum::<usize>(), pop);
            let elites = elite_counts(&sizes, &counts, 0.1);
            for ((size, count), elite) in sizes.iter().zip(&counts).zip(&elites) {
                if *count == 0 {
                    assert_eq!(*size, 0);
                } else {
                    assert!(*size >= 1);
                    assert!(*elite >= 1 && elite <= size);
                }
            }
        }
    }

    #[test]
    fn test_elitism_floor() {
        let elites = elite_counts(&[10, 3, 0, 4], &[8, 2, 5, 0], 0.1);
        assert_eq!(elites, vec![1, 1, 0, 0]);

        let elites = elite_counts(&[10, 20], &[10, 1], 0.5);
        assert_eq!(elites, vec![5, 1]);
    }

    fn population(ledger: &InnovationLedger, rng: &mut ChaCha8Rng) -> Vec<Genome> {
        (0..12)
            .map(|i| {
                let mut g =
                    Genome::new(2, 1, 1.0, MutationConfig::default(), false, ledger, rng).unwrap();
                g.set_fitness(i as f64 + 1.0);
                g
            })
            .collect()
    }

    #[test]
    fn test_reproduce_fills_population() {
        let ledger = InnovationLedger::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let genomes = population(&ledger, &mut rng);
        let species = vec![(0..6).collect::<Vec<_>>(), Vec::new(), (6..12).collect()];

        let reproduction = Reproduction {
            pop_size: 12,
            elitism_prop: 0.2,
            disable_prob: 0.75,
            acyclic: false,
        };
        let mut innovations = GenerationInnovations::new(&ledger);
        let (next, report) =
            reproduction.reproduce(&genomes, &species, &RankSelection, &mut innovations, &mut rng);

        assert_eq!(next.len(), 12);
        assert_eq!(report.iter().map(|r| r.size).sum::<usize>(), 12);
        assert_eq!(report[1].size, 0);
        for r in report.iter().filter(|r| r.members > 0 && r.size > 0) {
            assert!(r.elites >= 1);
        }

        // The best member of each species comes first, unchanged
        let first = &next[0];
        assert_eq!(first.fitness(), 6.0);
        assert_eq!(first.connections(), genomes[5].connections());
        let second_start = report[0].size;
        assert_eq!(next[second_start].fitness(), 12.0);
        assert_eq!(next[second_start].connections(), genomes[11].connections());
    }

    #[test]
    fn test_reproduce_singleton_species() {
        let ledger = InnovationLedger::new();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let genomes = population(&ledger, &mut rng);
        let species = vec![vec![3], (0..12).filter(|&i| i != 3).collect()];

        let reproduction = Reproduction {
            pop_size: 12,
            elitism_prop: 0.1,
            disable_prob: 0.75,
            acyclic: true,
        };
        let mut innovations = GenerationInnovations::new(&ledger);
        let (next, _) =
            reproduction.reproduce(&genomes, &species, &RankSelection, &mut innovations, &mut rng);

        assert_eq!(next.len(), 12);
        assert!(next.iter().all(Genome::is_valid));
    }
}
