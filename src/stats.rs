//! Statistics tracking for training runs.

use crate::evolution::SpeciesAllotment;
use crate::neural::Genome;
use serde::{Deserialize, Serialize};

/// Statistics snapshot for one evaluated generation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation index (0 = initial population)
    pub generation: usize,
    /// Population count
    pub population: usize,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub worst_fitness: f64,
    /// Members per species before reproduction
    pub species_sizes: Vec<usize>,
    /// Offspring slots per species
    pub species_allotment: Vec<usize>,
    /// Mean node count
    pub nodes_mean: f64,
    /// Largest node count
    pub nodes_max: usize,
    /// Mean number of enabled connections
    pub connections_mean: f64,
    /// Innovations handed out so far in the run
    pub innovations: usize,
}

impl GenerationStats {
    /// Summarise an evaluated population and its allotment
    pub fn from_generation(
        generation: usize,
        genomes: &[Genome],
        allotment: &[SpeciesAllotment],
        innovations: usize,
    ) -> Self {
        let mut stats = Self {
            generation,
            population: genomes.len(),
            species_sizes: allotment.iter().map(|a| a.members).collect(),
            species_allotment: allotment.iter().map(|a| a.size).collect(),
            innovations,
            ..Self::default()
        };

        if genomes.is_empty() {
            return stats;
        }

        let n = genomes.len() as f64;
        let fitnesses = genomes.iter().map(Genome::fitness);
        stats.best_fitness = fitnesses.clone().fold(f64::NEG_INFINITY, f64::max);
        stats.worst_fitness = fitnesses.clone().fold(f64::INFINITY, f64::min);
        stats.mean_fitness = fitnesses.sum::<f64>() / n;

        stats.nodes_mean = genomes.iter().map(|g| g.node_count() as f64).sum::<f64>() / n;
        stats.nodes_max = genomes.iter().map(Genome::node_count).max().unwrap_or(0);
        stats.connections_mean = genomes
            .iter()
            .map(|g| g.enabled_connection_count() as f64)
            .sum::<f64>()
            / n;

        stats
    }

    /// Number of species that have at least one member
    pub fn occupied_species(&self) -> usize {
        self.species_sizes.iter().filter(|&&s| s > 0).count()
    }

    /// Format stats as a one-line summary
    pub fn summary(&self) -> String {
        format!(
            "Gen:{:4} | Best:{:.4} | Mean:{:.4} | Worst:{:.4} | Species:{}/{} | Nodes:{:.1} | Conns:{:.1} | Innov:{}",
            self.generation,
            self.best_fitness,
            self.mean_fitness,
            self.worst_fitness,
            self.occupied_species(),
            self.species_sizes.len(),
            self.nodes_mean,
            self.connections_mean,
            self.innovations,
        )
    }
}

/// Historical statistics tracker
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsHistory {
    /// One snapshot per completed generation
    pub snapshots: Vec<GenerationStats>,
    /// Generations between summary log lines
    pub interval: usize,
}

impl StatsHistory {
    pub fn new(interval: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            interval,
        }
    }

    /// Whether `generation` gets a summary line; an interval of 0 never does
    pub fn is_due(&self, generation: usize) -> bool {
        self.interval > 0 && generation % self.interval == 0
    }

    /// Record a stats snapshot
    pub fn record(&mut self, stats: GenerationStats) {
        self.snapshots.push(stats);
    }

    pub fn get(&self, generation: usize) -> Option<&GenerationStats> {
        self.snapshots.iter().find(|s| s.generation == generation)
    }

    pub fn latest(&self) -> Option<&GenerationStats> {
        self.snapshots.last()
    }

    /// Best fitness over time
    pub fn best_fitness_series(&self) -> Vec<(usize, f64)> {
        self.snapshots
            .iter()
            .map(|s| (s.generation, s.best_fitness))
            .collect()
    }

    /// Mean fitness over time
    pub fn mean_fitness_series(&self) -> Vec<(usize, f64)> {
        self.snapshots
            .iter()
            .map(|s| (s.generation, s.mean_fitness))
            .collect()
    }

    /// Mean network size over time
    pub fn complexity_series(&self) -> Vec<(usize, f64)> {
        self.snapshots
            .iter()
            .map(|s| (s.generation, s.nodes_mean))
            .collect()
    }

    /// Save history to file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)
    }

    /// Load history from file
    pub fn load(path: &str) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::{InnovationLedger, MutationConfig};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_stats_from_generation() {
        let ledger = InnovationLedger::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let genomes: Vec<Genome> = (0..4)
            .map(|i| {
                let mut g =
                    Genome::new(3, 2, 1.0, MutationConfig::default(), false, &ledger, &mut rng)
                        .unwrap();
                g.set_fitness(i as f64);
                g
            })
            .collect();
        let allotment = vec![
            SpeciesAllotment { members: 3, mean_fitness: 1.0, size: 2, elites: 1 },
            SpeciesAllotment { members: 0, mean_fitness: 0.0, size: 0, elites: 0 },
            SpeciesAllotment { members: 1, mean_fitness: 3.0, size: 2, elites: 1 },
        ];

        let stats = GenerationStats::from_generation(7, &genomes, &allotment, ledger.count());

        assert_eq!(stats.generation, 7);
        assert_eq!(stats.population, 4);
        assert_eq!(stats.best_fitness, 3.0);
        assert_eq!(stats.worst_fitness, 0.0);
        assert!((stats.mean_fitness - 1.5).abs() < 1e-12);
        assert_eq!(stats.nodes_mean, 6.0);
        assert_eq!(stats.connections_mean, 6.0);
        assert_eq!(stats.innovations, 6);
        assert_eq!(stats.occupied_species(), 2);
        assert!(stats.summary().contains("Species:2/3"));
    }

    #[test]
    fn test_stats_history() {
        let mut history = StatsHistory::new(10);

        for i in 0..5 {
            history.record(GenerationStats {
                generation: i,
                best_fitness: i as f64 * 2.0,
                ..GenerationStats::default()
            });
        }

        let series = history.best_fitness_series();
        assert_eq!(series.len(), 5);
        assert_eq!(series[0], (0, 0.0));
        assert_eq!(series[4], (4, 8.0));
        assert_eq!(history.get(3).map(|s| s.best_fitness), Some(6.0));
        assert_eq!(history.latest().map(|s| s.generation), Some(4));
    }

    #[test]
    fn test_summary_interval() {
        let history = StatsHistory::new(10);
        assert!(history.is_due(0));
        assert!(!history.is_due(7));
        assert!(history.is_due(30));

        let silent = StatsHistory::new(0);
        assert!(!silent.is_due(0));
        assert!(!silent.is_due(10));
    }

    #[test]
    fn test_history_json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let path = path.to_string_lossy();

        let mut history = StatsHistory::new(1);
        history.record(GenerationStats {
            generation: 0,
            species_sizes: vec![3, 2],
            ..GenerationStats::default()
        });
        history.save(&path).unwrap();

        let loaded = StatsHistory::load(&path).unwrap();
        assert_eq!(loaded, history);
    }
}
