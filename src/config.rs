use std::path::PathBuf;

use clap::Args;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Serialize, Deserialize};

use crate::data::point::DataPoint;
use crate::data::toy::two_clusters;
use crate::error::Result;
use crate::network::checkpoint::{CheckpointStore, DEFAULT_CHECKPOINT_PATH};
use crate::network::network::Network;

/// Driver settings: topology, learning rate, dataset shape and where the
/// checkpoint lives.
///
/// Every field has a default, so a JSON file only needs the fields it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Widths from input to output. Ignored when a checkpoint is restored.
    pub layer_sizes: Vec<usize>,
    pub learn_rate: f64,
    /// Seeds both dataset generation and initial weights.
    pub seed: u64,
    pub checkpoint_path: PathBuf,
    /// Label-1 points, both inputs uniform in `[2, 25)`.
    pub positive_samples: usize,
    /// Label-0 points, both inputs uniform in `[0, 100)`.
    pub negative_samples: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            layer_sizes: vec![2, 6, 6, 6, 2],
            learn_rate: 0.6,
            seed: 1,
            checkpoint_path: PathBuf::from(DEFAULT_CHECKPOINT_PATH),
            positive_samples: 50,
            negative_samples: 300,
        }
    }
}

impl RunConfig {
    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a config from a JSON file; absent fields keep defaults.
    pub fn load_json(path: &str) -> std::io::Result<RunConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

/// Everything a driver needs to start: the dataset, the network and the
/// store it checkpoints to.
pub struct Prepared {
    pub network: Network,
    pub data: Vec<DataPoint>,
    pub store: CheckpointStore,
    /// True when `network` was read from the checkpoint.
    pub restored: bool,
}

impl RunConfig {
    /// Generates the dataset from `seed`, then restores the checkpoint or
    /// builds a randomised network from the same RNG stream.
    pub fn prepare(&self) -> Result<Prepared> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let data = two_clusters(&mut rng, self.positive_samples, self.negative_samples)?;
        let store = CheckpointStore::new(&self.checkpoint_path);
        let (network, restored) = store.open_or_init(&self.layer_sizes, &mut rng)?;
        Ok(Prepared { network, data, store, restored })
    }
}

/// Command-line flags shared by the binaries. Flags override values from
/// `--config`, which override the defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// JSON file with a `RunConfig`
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Checkpoint file to restore from and save to
    #[arg(long, value_name = "PATH")]
    pub checkpoint: Option<PathBuf>,

    /// Gradient-descent learning rate
    #[arg(long)]
    pub learn_rate: Option<f64>,

    /// Seed for dataset generation and initial weights
    #[arg(long)]
    pub seed: Option<u64>,
}

impl RunArgs {
    pub fn resolve(&self) -> std::io::Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load_json(path)?,
            None => RunConfig::default(),
        };
        if let Some(path) = &self.checkpoint {
            config.checkpoint_path = path.clone();
        }
        if let Some(rate) = self.learn_rate {
            config.learn_rate = rate;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        Ok(config)
    }
}
