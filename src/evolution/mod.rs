//! Evolution engine: the generational loop and its collaborators.
//!
//! Each generation is evaluated, reproduced and re-speciated in that order,
//! with no overlap between generations:
//!
//! ```text
//! initialize -> [evaluate -> reproduce -> speciate] x max_generations -> evaluate -> best
//! ```

mod reproduction;
mod selection;
mod speciation;

pub use reproduction::{allot_sizes, elite_counts, Reproduction, SpeciesAllotment};
pub use selection::{RankSelection, SelectionPolicy, TournamentSelection};
pub use speciation::{species_members, weight_space, Speciator};

use crate::checkpoint::Checkpoint;
use crate::config::Config;
use crate::error::{NeatError, Result, TaskError};
use crate::neural::{GenerationInnovations, Genome, InnovationLedger};
use crate::stats::{GenerationStats, StatsHistory};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// The problem being optimised.
///
/// `evaluate` must depend only on the genome (reset any episodic state per
/// call); it is called once per genome per generation, possibly from several
/// threads at once.
pub trait Task: Sync {
    fn evaluate(&self, genome: &Genome) -> std::result::Result<f64, TaskError>;
}

/// NEAT trainer owning the population
pub struct Neat<T: Task, S: SelectionPolicy = RankSelection> {
    task: T,
    selection: S,
    config: Config,

    // Population
    genomes: Vec<Genome>,
    assignments: Vec<usize>,
    generation: usize,
    initialized: bool,

    // Evolution machinery
    ledger: InnovationLedger,
    speciator: Speciator,
    reproduction: Reproduction,

    // Statistics
    history: StatsHistory,
    last_allotment: Vec<SpeciesAllotment>,

    // Random number generator (seeded for reproducibility)
    rng: ChaCha8Rng,
    seed: u64,
}

impl<T: Task, S: SelectionPolicy> Neat<T, S> {
    /// Create a trainer with a random seed
    pub fn new(task: T, selection: S, config: Config) -> Result<Self> {
        let seed = rand::thread_rng().gen();
        Self::new_with_seed(task, selection, config, seed)
    }

    /// Create a trainer with a specific seed for reproducibility
    pub fn new_with_seed(task: T, selection: S, config: Config, seed: u64) -> Result<Self> {
        config.validate()?;

        let speciator = Speciator::new(
            config.population.num_species,
            config.speciation.max_iterations,
        );
        let reproduction = Self::reproduction_from(&config);

        Ok(Self {
            task,
            selection,
            genomes: Vec::with_capacity(config.population.size),
            assignments: Vec::new(),
            generation: 0,
            initialized: false,
            ledger: InnovationLedger::new(),
            speciator,
            reproduction,
            history: StatsHistory::new(config.logging.stats_interval),
            last_allotment: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            config,
        })
    }

    fn reproduction_from(config: &Config) -> Reproduction {
        Reproduction {
            pop_size: config.population.size,
            elitism_prop: config.reproduction.elitism_prop,
            disable_prob: config.reproduction.disable_prob,
            acyclic: config.network.acyclic,
        }
    }

    /// Restore a trainer from a checkpoint; the run continues exactly where
    /// it was saved.
    pub fn from_checkpoint(task: T, selection: S, checkpoint: Checkpoint) -> Result<Self> {
        let config = checkpoint.config;
        config.validate()?;

        let speciator = Speciator::with_centroids(
            config.population.num_species,
            config.speciation.max_iterations,
            &checkpoint.centroids,
        );
        let reproduction = Self::reproduction_from(&config);

        Ok(Self {
            task,
            selection,
            genomes: checkpoint.genomes,
            assignments: checkpoint.assignments,
            generation: checkpoint.generation,
            initialized: true,
            ledger: InnovationLedger::starting_at(checkpoint.innovation_count),
            speciator,
            reproduction,
            history: checkpoint.history,
            last_allotment: Vec::new(),
            rng: checkpoint.rng,
            seed: checkpoint.seed,
            config,
        })
    }

    /// Snapshot of the current run
    pub fn create_checkpoint(&self) -> Checkpoint {
        Checkpoint::new(
            self.config.clone(),
            self.generation,
            self.genomes.clone(),
            self.assignments.clone(),
            self.speciator.centroid_rows(),
            self.ledger.count(),
            self.rng.clone(),
            self.seed,
            self.history.clone(),
        )
    }

    /// Reset the ledger, build the minimal population and speciate it
    pub fn initialize(&mut self) -> Result<()> {
        self.ledger.reset();
        self.genomes.clear();
        self.generation = 0;
        self.history = StatsHistory::new(self.config.logging.stats_interval);

        let net = &self.config.network;
        for _ in 0..self.config.population.size {
            let genome = Genome::new(
                net.inputs,
                net.outputs,
                net.bias,
                self.config.mutation,
                net.acyclic,
                &self.ledger,
                &mut self.rng,
            )?;
            self.genomes.push(genome);
        }

        self.speciator = Speciator::new(
            self.config.population.num_species,
            self.config.speciation.max_iterations,
        );
        self.assignments =
            self.speciator
                .speciate(&self.genomes, self.ledger.count(), true, &mut self.rng);
        self.initialized = true;

        log::info!(
            "Initialized population: {} genomes, {} species, {} innovations",
            self.genomes.len(),
            self.config.population.num_species,
            self.ledger.count()
        );
        Ok(())
    }

    /// Run the full generation budget from scratch and return the best
    /// genome of the final generation
    pub fn train(&mut self) -> Result<Genome> {
        self.initialize()?;
        self.run(self.config.population.max_generations)?;
        self.finish()
    }

    /// Continue until the configured generation budget is used up
    pub fn resume(&mut self) -> Result<Genome> {
        if !self.initialized {
            self.initialize()?;
        }
        let remaining = self
            .config
            .population
            .max_generations
            .saturating_sub(self.generation);
        self.run(remaining)?;
        self.finish()
    }

    /// Advance `generations` generations
    pub fn run(&mut self, generations: usize) -> Result<()> {
        for _ in 0..generations {
            self.step()?;
        }
        Ok(())
    }

    /// Run generations, calling `callback` after each one
    pub fn run_with_callback<F>(&mut self, generations: usize, mut callback: F) -> Result<()>
    where
        F: FnMut(&Self),
    {
        for _ in 0..generations {
            self.step()?;
            callback(self);
        }
        Ok(())
    }

    /// One generation: evaluate, reproduce, speciate
    pub fn step(&mut self) -> Result<()> {
        if !self.initialized {
            self.initialize()?;
        }

        self.evaluate()?;

        let species = species_members(&self.assignments, self.config.population.num_species);
        let innovations_before = self.ledger.count();
        let (next, allotment, structural) = {
            let mut innovations = GenerationInnovations::new(&self.ledger);
            let (next, allotment) = self.reproduction.reproduce(
                &self.genomes,
                &species,
                &self.selection,
                &mut innovations,
                &mut self.rng,
            );
            (next, allotment, innovations.recorded())
        };

        let stats = GenerationStats::from_generation(
            self.generation,
            &self.genomes,
            &allotment,
            self.ledger.count(),
        );
        if self.history.is_due(self.generation) {
            log::info!("{}", stats.summary());
        }
        log::debug!(
            "Generation {}: {} structural mutations, {} new innovations",
            self.generation,
            structural,
            self.ledger.count() - innovations_before
        );
        self.history.record(stats);

        self.genomes = next;
        self.last_allotment = allotment;
        self.assignments =
            self.speciator
                .speciate(&self.genomes, self.ledger.count(), false, &mut self.rng);
        self.generation += 1;

        Ok(())
    }

    /// Score every genome with the task
    pub fn evaluate(&mut self) -> Result<()> {
        let task = &self.task;
        let score = |(index, genome): (usize, &Genome)| -> Result<f64> {
            let value = task
                .evaluate(genome)
                .map_err(|source| NeatError::Evaluation { index, source })?;
            if value.is_finite() {
                Ok(value)
            } else {
                Err(NeatError::InvalidFitness { index, value })
            }
        };

        let scores: Vec<f64> = if self.config.evaluation.parallel {
            self.genomes.par_iter().enumerate().map(score).collect::<Result<_>>()?
        } else {
            self.genomes.iter().enumerate().map(score).collect::<Result<_>>()?
        };

        for (genome, fitness) in self.genomes.iter_mut().zip(scores) {
            genome.set_fitness(fitness);
        }
        Ok(())
    }

    /// Evaluate the current generation and return its best genome
    pub fn finish(&mut self) -> Result<Genome> {
        self.evaluate()?;
        let best = self.best().cloned().ok_or(NeatError::Config(
            crate::error::ConfigError::ZeroPopulation,
        ))?;
        log::info!(
            "Training finished after {} generations: best fitness {:.4}, {} nodes, {} connections",
            self.generation,
            best.fitness(),
            best.node_count(),
            best.connections().len()
        );
        Ok(best)
    }

    /// First genome with the highest fitness in the current population
    pub fn best(&self) -> Option<&Genome> {
        let mut best: Option<&Genome> = None;
        for genome in &self.genomes {
            match best {
                Some(b) if genome.fitness() <= b.fitness() => {}
                _ => best = Some(genome),
            }
        }
        best
    }

    pub fn population(&self) -> &[Genome] {
        &self.genomes
    }

    /// Species index of every genome in the current population
    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }

    /// Arena indices per species for the current population
    pub fn species(&self) -> Vec<Vec<usize>> {
        species_members(&self.assignments, self.config.population.num_species)
    }

    /// Allotment of the most recent reproduction step
    pub fn last_allotment(&self) -> &[SpeciesAllotment] {
        &self.last_allotment
    }

    /// Completed generations
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn innovation_count(&self) -> usize {
        self.ledger.count()
    }

    pub fn history(&self) -> &StatsHistory {
        &self.history
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn task(&self) -> &T {
        &self.task
    }
}
