use std::fs;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Serialize, Deserialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::network::network::Network;

/// Default checkpoint location, relative to the working directory.
pub const DEFAULT_CHECKPOINT_PATH: &str = "train.json";

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct CheckpointOut<'a> {
    format_version: u32,
    network: &'a Network,
}

#[derive(Deserialize)]
struct CheckpointIn {
    format_version: u32,
    network: Network,
}

/// A single best-cost snapshot of a [`Network`] kept at a fixed path.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> CheckpointStore {
        CheckpointStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, reason: impl ToString) -> Error {
        Error::CorruptCheckpoint { path: self.path.clone(), reason: reason.to_string() }
    }

    /// Reads the stored network, or `Ok(None)` when no checkpoint exists.
    pub fn load(&self) -> Result<Option<Network>> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let checkpoint: CheckpointIn =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| self.corrupt(e))?;
        if checkpoint.format_version != FORMAT_VERSION {
            return Err(self.corrupt(format!(
                "unsupported format version {} (expected {})",
                checkpoint.format_version, FORMAT_VERSION
            )));
        }
        Ok(Some(checkpoint.network))
    }

    /// Serializes `network` to the checkpoint path.
    ///
    /// The JSON is written to a sibling temporary file and renamed over the
    /// target, so the checkpoint is always either the old or the new snapshot.
    pub fn save(&self, network: &Network) -> Result<()> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let file = fs::File::create(&tmp)?;
        let mut writer = BufWriter::new(file);
        let checkpoint = CheckpointOut { format_version: FORMAT_VERSION, network };
        serde_json::to_writer_pretty(&mut writer, &checkpoint)
            .map_err(|e| std::io::Error::new(ErrorKind::Other, e))?;
        writer.flush()?;
        drop(writer);
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Restores the checkpoint if there is one, otherwise builds a network
    /// from `layer_sizes` and randomises its weights with `rng`.
    ///
    /// A restored checkpoint is authoritative: `layer_sizes` is ignored. The
    /// flag is `true` when the network came from disk. A corrupt checkpoint
    /// is an error, never a silent fresh start.
    pub fn open_or_init<R: Rng + ?Sized>(&self, layer_sizes: &[usize], rng: &mut R) -> Result<(Network, bool)> {
        if let Some(network) = self.load()? {
            let stored = network.layer_sizes();
            if stored != layer_sizes {
                warn!(?stored, requested = ?layer_sizes, "checkpoint layer sizes override the requested ones");
            }
            info!(path = %self.path.display(), lowest_cost = network.lowest_cost(), "restored checkpoint");
            return Ok((network, true));
        }
        let mut network = Network::new(layer_sizes)?;
        network.randomize_weights(rng);
        info!(?layer_sizes, "no checkpoint found, starting from random weights");
        Ok((network, false))
    }
}
