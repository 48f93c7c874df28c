//! NEAT-EVOLVE - CLI Entry Point
//!
//! Trains networks on the XOR demonstration task.

use clap::{Parser, Subcommand};
use neat_evolve::checkpoint::{Checkpoint, CheckpointManager};
use neat_evolve::neural::Sigmoid;
use neat_evolve::tasks::Xor;
use neat_evolve::{Config, Genome, Neat, RankSelection};
use std::path::{Path, PathBuf};
use std::time::Instant;

type Trainer = Neat<Xor<Sigmoid>, RankSelection>;

#[derive(Parser)]
#[command(name = "neat")]
#[command(version)]
#[command(about = "Neuroevolution of augmenting topologies")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a new population on XOR
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Override the configured generation budget
        #[arg(short, long)]
        generations: Option<usize>,

        /// Output directory for checkpoints and results
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Resume training from checkpoint
    Resume {
        /// Checkpoint file to resume from
        #[arg(short, long)]
        checkpoint: PathBuf,

        /// Additional generations (defaults to the rest of the budget)
        #[arg(short, long)]
        generations: Option<usize>,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Analyze a checkpoint file
    Analyze {
        /// Checkpoint file
        checkpoint: PathBuf,
    },
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            generations,
            output,
            seed,
            quiet,
        } => run_training(config, generations, output, seed, quiet),

        Commands::Resume {
            checkpoint,
            generations,
            output,
        } => resume_training(checkpoint, generations, output),

        Commands::Init { output } => generate_config(output),

        Commands::Analyze { checkpoint } => analyze_checkpoint(checkpoint),
    }
}

fn run_training(
    config_path: PathBuf,
    generations: Option<usize>,
    output: PathBuf,
    seed: Option<u64>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut config, loaded) = if config_path.exists() {
        (Config::from_file(&config_path)?, true)
    } else {
        (Config::default(), false)
    };
    if let Some(g) = generations {
        config.population.max_generations = g;
    }

    init_logging(if quiet { "warn" } else { config.logging.log_level.as_str() });
    if loaded {
        log::info!("Loaded config from {:?}", config_path);
    } else {
        log::info!("Using default configuration");
    }

    std::fs::create_dir_all(&output)?;

    let task = Xor::new(Sigmoid);
    let mut neat = match seed {
        Some(s) => {
            log::info!("Using seed: {}", s);
            Neat::new_with_seed(task, RankSelection, config.clone(), s)?
        }
        None => Neat::new(task, RankSelection, config.clone())?,
    };

    println!("Starting training");
    println!("  Population: {}", config.population.size);
    println!("  Species: {}", config.population.num_species);
    println!("  Generations: {}", config.population.max_generations);
    println!("  Seed: {}", neat.seed());
    println!();

    neat.initialize()?;
    let start = Instant::now();
    train_loop(&mut neat, config.population.max_generations, &output)?;
    let best = neat.finish()?;

    report(&neat, &best, start.elapsed().as_secs_f64());
    save_results(&neat, &best, &output)
}

fn resume_training(
    checkpoint_path: PathBuf,
    generations: Option<usize>,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let checkpoint = Checkpoint::load(&checkpoint_path)?;
    init_logging(&checkpoint.config.logging.log_level);
    log::info!("Loaded checkpoint {:?}", checkpoint_path);

    let mut neat = Neat::from_checkpoint(Xor::new(Sigmoid), RankSelection, checkpoint)?;
    let remaining = generations.unwrap_or_else(|| {
        neat.config()
            .population
            .max_generations
            .saturating_sub(neat.generation())
    });

    println!("Resumed at generation {}", neat.generation());
    println!("Running {} additional generations", remaining);
    println!();

    std::fs::create_dir_all(&output)?;

    let start = Instant::now();
    train_loop(&mut neat, remaining, &output)?;
    let best = neat.finish()?;

    report(&neat, &best, start.elapsed().as_secs_f64());
    save_results(&neat, &best, &output)
}

fn train_loop(
    neat: &mut Trainer,
    generations: usize,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut checkpoint_mgr = CheckpointManager::new(
        output,
        neat.config().logging.checkpoint_interval,
        10, // Keep last 10 checkpoints
    )?;

    for _ in 0..generations {
        neat.step()?;

        if checkpoint_mgr.should_save(neat.generation()) {
            match checkpoint_mgr.save(&neat.create_checkpoint()) {
                Ok(path) => log::info!("Checkpoint saved: {}", path.display()),
                Err(e) => log::error!("Checkpoint error: {}", e),
            }
        }
    }
    Ok(())
}

fn report(neat: &Trainer, best: &Genome, elapsed: f64) {
    println!();
    println!("=== Training Complete ===");
    println!("Time: {:.2}s", elapsed);
    println!("Generations: {}", neat.generation());
    println!("Innovations: {}", neat.innovation_count());
    println!("Best fitness: {:.4}", best.fitness());
    println!(
        "Best network: {} nodes ({} hidden), {} genes ({} enabled)",
        best.node_count(),
        best.hidden_count(),
        best.connections().len(),
        best.enabled_connection_count()
    );
    if let Ok(outputs) = neat.task().outputs(best) {
        println!("XOR outputs: {:?}", outputs);
    }
    println!("Solved: {}", neat.task().solves(best));
}

fn save_results(
    neat: &Trainer,
    best: &Genome,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let final_path = output.join("final_checkpoint.bin");
    neat.create_checkpoint().save(&final_path)?;
    println!("Final checkpoint: {:?}", final_path);

    let genome_path = output.join("best_genome.json");
    std::fs::write(&genome_path, serde_json::to_string_pretty(best)?)?;
    println!("Best genome: {:?}", genome_path);

    let stats_path = output.join("stats_history.json");
    neat.history().save(&stats_path.to_string_lossy())?;
    println!("Stats history: {:?}", stats_path);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}

fn analyze_checkpoint(checkpoint_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Checkpoint Analysis ===");
    println!("File: {:?}", checkpoint_path);
    println!();

    let checkpoint = Checkpoint::load(&checkpoint_path)?;

    println!("Generation: {}", checkpoint.generation);
    println!("Population: {}", checkpoint.genomes.len());
    println!("Innovations: {}", checkpoint.innovation_count);
    println!("Seed: {}", checkpoint.seed);
    println!();

    let genomes = &checkpoint.genomes;
    if !genomes.is_empty() {
        let n = genomes.len() as f64;
        let avg_nodes = genomes.iter().map(|g| g.node_count() as f64).sum::<f64>() / n;
        let max_nodes = genomes.iter().map(Genome::node_count).max().unwrap_or(0);
        let avg_genes = genomes.iter().map(|g| g.connections().len() as f64).sum::<f64>() / n;
        let avg_enabled =
            genomes.iter().map(|g| g.enabled_connection_count() as f64).sum::<f64>() / n;

        println!("Average node count: {:.2}", avg_nodes);
        println!("Max node count: {}", max_nodes);
        println!("Average genes: {:.2} ({:.2} enabled)", avg_genes, avg_enabled);

        let k = checkpoint.config.population.num_species;
        let mut sizes = vec![0usize; k];
        for &s in checkpoint.assignments.iter().filter(|&&s| s < k) {
            sizes[s] += 1;
        }
        println!();
        println!("Species sizes: {:?}", sizes);
    }

    if let Some(last) = checkpoint.history.latest() {
        println!();
        println!("Last recorded: {}", last.summary());
    }

    println!();
    println!(
        "Checkpoint size: {:.2} MB",
        checkpoint.size_bytes() as f64 / 1_000_000.0
    );

    Ok(())
}
