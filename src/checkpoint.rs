//! Checkpoint system for saving and resuming training runs.

use crate::config::Config;
use crate::neural::Genome;
use crate::stats::StatsHistory;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

const MAGIC: &[u8; 4] = b"NEAT";

/// Complete trainer state between two generations
#[derive(Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Version for compatibility checking
    pub version: u32,
    /// Completed generations
    pub generation: usize,
    pub config: Config,
    /// Current (not yet evaluated) population
    pub genomes: Vec<Genome>,
    /// Species index per genome
    pub assignments: Vec<usize>,
    /// k-means centroids, one row per species
    pub centroids: Vec<Vec<f64>>,
    /// Innovation ids handed out so far
    pub innovation_count: usize,
    /// Generator state, so a resumed run draws the same numbers
    pub rng: ChaCha8Rng,
    /// Seed the run was started with
    pub seed: u64,
    pub history: StatsHistory,
}

impl Checkpoint {
    /// Current checkpoint version
    pub const VERSION: u32 = 1;

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        generation: usize,
        genomes: Vec<Genome>,
        assignments: Vec<usize>,
        centroids: Vec<Vec<f64>>,
        innovation_count: usize,
        rng: ChaCha8Rng,
        seed: u64,
        history: StatsHistory,
    ) -> Self {
        Self {
            version: Self::VERSION,
            generation,
            config,
            genomes,
            assignments,
            centroids,
            innovation_count,
            rng,
            seed,
            history,
        }
    }

    /// Save checkpoint to binary file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(MAGIC)?;
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;

        Ok(())
    }

    /// Load checkpoint from binary file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(CheckpointError::InvalidFormat("Invalid magic bytes".to_string()));
        }

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        let checkpoint: Checkpoint = bincode::deserialize(&buffer)?;

        if checkpoint.version != Self::VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: Self::VERSION,
                found: checkpoint.version,
            });
        }

        Ok(checkpoint)
    }

    /// Get approximate size in bytes
    pub fn size_bytes(&self) -> usize {
        bincode::serialized_size(self).unwrap_or(0) as usize
    }
}

/// Errors that can occur during checkpoint operations
#[derive(Debug)]
pub enum CheckpointError {
    Io(std::io::Error),
    Serialization(bincode::Error),
    InvalidFormat(String),
    VersionMismatch { expected: u32, found: u32 },
}

impl std::fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
            Self::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            Self::VersionMismatch { expected, found } => {
                write!(f, "Version mismatch: expected {}, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for CheckpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Serialization(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CheckpointError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<bincode::Error> for CheckpointError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e)
    }
}

/// Periodic checkpoint writer that keeps the newest few files
pub struct CheckpointManager {
    /// Directory holding the checkpoint files
    pub base_dir: PathBuf,
    /// Generations between checkpoints
    pub interval: usize,
    /// Maximum checkpoints to keep
    pub max_checkpoints: usize,
    last_checkpoint: Option<usize>,
}

impl CheckpointManager {
    pub fn new<P: Into<PathBuf>>(
        base_dir: P,
        interval: usize,
        max_checkpoints: usize,
    ) -> Result<Self, CheckpointError> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;

        Ok(Self {
            base_dir,
            interval,
            max_checkpoints,
            last_checkpoint: None,
        })
    }

    /// Check if a checkpoint should be saved after `generation`
    pub fn should_save(&self, generation: usize) -> bool {
        self.interval > 0
            && generation > 0
            && generation % self.interval == 0
            && self.last_checkpoint != Some(generation)
    }

    /// File name for a generation; zero padding keeps lexical order numeric
    pub fn checkpoint_path(&self, generation: usize) -> PathBuf {
        self.base_dir.join(format!("checkpoint_{:08}.bin", generation))
    }

    /// Save checkpoint and drop the oldest files beyond the limit
    pub fn save(&mut self, checkpoint: &Checkpoint) -> Result<PathBuf, CheckpointError> {
        let path = self.checkpoint_path(checkpoint.generation);
        checkpoint.save(&path)?;
        self.last_checkpoint = Some(checkpoint.generation);
        log::debug!("Checkpoint written to {}", path.display());

        self.cleanup()?;
        Ok(path)
    }

    fn checkpoint_files(&self) -> Result<Vec<PathBuf>, CheckpointError> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.base_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("checkpoint_")
            })
            .map(|entry| entry.path())
            .collect();
        files.sort();
        Ok(files)
    }

    fn cleanup(&self) -> Result<(), CheckpointError> {
        let files = self.checkpoint_files()?;
        if files.len() > self.max_checkpoints {
            let to_remove = files.len() - self.max_checkpoints;
            for path in files.into_iter().take(to_remove) {
                std::fs::remove_file(&path)?;
                log::trace!("Removed old checkpoint {}", path.display());
            }
        }
        Ok(())
    }

    /// Most recent checkpoint in the directory
    pub fn find_latest(&self) -> Option<PathBuf> {
        self.checkpoint_files().ok()?.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::{InnovationLedger, MutationConfig};
    use rand::{Rng, SeedableRng};

    fn create_test_checkpoint(generation: usize) -> Checkpoint {
        let ledger = InnovationLedger::new();
        let mut rng = ChaCha8Rng::seed_from_u64(12345);
        let genomes = (0..3)
            .map(|_| Genome::new(2, 1, 1.0, MutationConfig::default(), false, &ledger, &mut rng))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        Checkpoint::new(
            Config::default(),
            generation,
            genomes,
            vec![0, 1, 0],
            vec![vec![0.5, -0.5], vec![0.1, 0.2]],
            ledger.count(),
            rng,
            12345,
            StatsHistory::new(10),
        )
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.bin");
        let checkpoint = create_test_checkpoint(40);

        checkpoint.save(&path).unwrap();
        let mut loaded = Checkpoint::load(&path).unwrap();

        assert_eq!(loaded.generation, 40);
        assert_eq!(loaded.genomes.len(), 3);
        assert_eq!(loaded.genomes[1].connections(), checkpoint.genomes[1].connections());
        assert_eq!(loaded.assignments, checkpoint.assignments);
        assert_eq!(loaded.centroids, checkpoint.centroids);
        assert_eq!(loaded.innovation_count, 2);
        assert_eq!(loaded.seed, 12345);

        // Generator state continues where it was saved
        let mut original = checkpoint.rng.clone();
        assert_eq!(loaded.rng.gen::<u64>(), original.gen::<u64>());
    }

    #[test]
    fn test_bad_magic_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.bin");
        std::fs::write(&path, b"JUNK0000").unwrap();

        assert!(matches!(
            Checkpoint::load(&path),
            Err(CheckpointError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_checkpoint_size() {
        let checkpoint = create_test_checkpoint(0);
        let size = checkpoint.size_bytes();

        assert!(size > 0);
        assert!(size < 1_000_000);
    }

    #[test]
    fn test_manager_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = CheckpointManager::new(dir.path(), 5, 2).unwrap();

        assert!(!manager.should_save(0));
        assert!(!manager.should_save(3));
        assert!(manager.should_save(5));

        for generation in [5, 10, 15] {
            manager.save(&create_test_checkpoint(generation)).unwrap();
        }
        assert!(!manager.should_save(15));

        let files = manager.checkpoint_files().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(manager.find_latest(), Some(manager.checkpoint_path(15)));
        assert!(!manager.checkpoint_path(5).exists());
    }
}
