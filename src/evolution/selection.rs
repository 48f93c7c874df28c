//! Parent selection policies.

use rand::Rng;

/// Picks two parents from a fitness vector sorted in ascending order.
///
/// Implementations must return two distinct indices whenever the vector has
/// at least two entries, favouring higher (fitter) positions.
pub trait SelectionPolicy: Send + Sync {
    fn select<R: Rng + ?Sized>(&self, fitnesses: &[f64], rng: &mut R) -> (usize, usize);
}

/// Rank selection: in a vector of `N` ascending fitnesses, position `p`
/// (rank `p + 1`) is drawn with probability `2(p + 1) / (N(N + 1))`.
/// The second parent is redrawn until it differs from the first.
#[derive(Clone, Copy, Debug, Default)]
pub struct RankSelection;

impl RankSelection {
    /// Redraws before falling back to the fittest other position
    const MAX_RETRIES: usize = 64;

    fn pick<R: Rng + ?Sized>(n: usize, rng: &mut R) -> usize {
        let total = (n * (n + 1) / 2) as f64;
        let mut u = rng.gen::<f64>() * total;

        for pos in 0..n {
            let weight = (pos + 1) as f64;
            if u < weight {
                return pos;
            }
            u -= weight;
        }
        n - 1
    }
}

impl SelectionPolicy for RankSelection {
    fn select<R: Rng + ?Sized>(&self, fitnesses: &[f64], rng: &mut R) -> (usize, usize) {
        let n = fitnesses.len();
        if n < 2 {
            return (0, 0);
        }

        let first = Self::pick(n, rng);
        for _ in 0..Self::MAX_RETRIES {
            let second = Self::pick(n, rng);
            if second != first {
                return (first, second);
            }
        }

        let fallback = if first == n - 1 { n - 2 } else { n - 1 };
        (first, fallback)
    }
}

/// Tournament selection: the fittest of `size` uniform draws wins
#[derive(Clone, Copy, Debug)]
pub struct TournamentSelection {
    pub size: usize,
}

impl Default for TournamentSelection {
    fn default() -> Self {
        Self { size: 3 }
    }
}

impl TournamentSelection {
    fn pick<R: Rng + ?Sized>(&self, n: usize, exclude: Option<usize>, rng: &mut R) -> usize {
        let pool = if exclude.is_some() { n - 1 } else { n };
        let mut winner = None;

        for _ in 0..self.size.max(1) {
            let mut candidate = rng.gen_range(0..pool);
            if let Some(skip) = exclude {
                if candidate >= skip {
                    candidate += 1;
                }
            }
            // Ascending order: a larger index is at least as fit
            winner = Some(winner.map_or(candidate, |w: usize| w.max(candidate)));
        }

        winner.unwrap_or(0)
    }
}

impl SelectionPolicy for TournamentSelection {
    fn select<R: Rng + ?Sized>(&self, fitnesses: &[f64], rng: &mut R) -> (usize, usize) {
        let n = fitnesses.len();
        if n < 2 {
            return (0, 0);
        }

        let first = self.pick(n, None, rng);
        let second = self.pick(n, Some(first), rng);
        (first, second)
    }
}
