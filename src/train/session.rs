use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};

use serde::{Serialize, Deserialize};
use tracing::{error, info};

use crate::data::point::DataPoint;
use crate::error::{Error, Result};
use crate::network::checkpoint::CheckpointStore;
use crate::network::network::Network;
use crate::train::loop_fn::train_step;
use crate::train::step_stats::StepStats;

// ---------------------------------------------------------------------------
// Shared progress slot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionStatus {
    /// No continuous training is running.
    Idle,
    /// The worker is stepping continuously between requests.
    Running,
    /// Continuous training stopped because a step failed.
    Failed { reason: String },
}

/// Latest training state, overwritten by the worker after every step and
/// sampled by readers whenever they like.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub status: SessionStatus,
    pub latest: Option<StepStats>,
}

/// One dataset point with the class the network currently predicts for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointReport {
    pub inputs: Vec<f64>,
    pub label: usize,
    pub predicted: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetReport {
    pub points: Vec<PointReport>,
    pub cost: f64,
}

// ---------------------------------------------------------------------------
// Worker protocol
// ---------------------------------------------------------------------------

type Reply<T> = mpsc::Sender<Result<T>>;

enum Command {
    Classify(Vec<f64>, Reply<usize>),
    MeanCost(Reply<f64>),
    Step(Reply<StepStats>),
    Report(Reply<DatasetReport>),
    LayerOutputs(usize, Vec<f64>, Reply<Vec<f64>>),
    Start,
    Stop,
}

struct Worker {
    network: Network,
    data: Vec<DataPoint>,
    store: CheckpointStore,
    learn_rate: f64,
    step: usize,
    running: bool,
    progress: Arc<Mutex<Progress>>,
}

impl Worker {
    fn run(mut self, rx: mpsc::Receiver<Command>) -> Network {
        loop {
            let command = if self.running {
                match rx.try_recv() {
                    Ok(cmd) => Some(cmd),
                    Err(mpsc::TryRecvError::Empty) => None,
                    Err(mpsc::TryRecvError::Disconnected) => break,
                }
            } else {
                match rx.recv() {
                    Ok(cmd) => Some(cmd),
                    Err(_) => break,
                }
            };

            match command {
                Some(cmd) => self.handle(cmd),
                None => self.background_step(),
            }
        }
        info!(steps = self.step, "training session closed");
        self.network
    }

    fn handle(&mut self, command: Command) {
        // A failed send means the caller gave up waiting; nothing to do.
        match command {
            Command::Classify(inputs, reply) => {
                let _ = reply.send(self.network.classify(&inputs));
            }
            Command::MeanCost(reply) => {
                let _ = reply.send(self.network.cost_multiple(&self.data));
            }
            Command::Step(reply) => {
                let _ = reply.send(self.step_once());
            }
            Command::Report(reply) => {
                let _ = reply.send(self.report());
            }
            Command::LayerOutputs(index, inputs, reply) => {
                let result = match self.network.layers.get(index) {
                    Some(layer) => layer.calculate_outputs(&inputs),
                    None => Err(Error::InvalidTopology(format!(
                        "no layer {index}, network has {}",
                        self.network.layers.len()
                    ))),
                };
                let _ = reply.send(result);
            }
            Command::Start => {
                if !self.running {
                    info!(learn_rate = self.learn_rate, "continuous training started");
                }
                self.running = true;
                self.set_status(SessionStatus::Running);
            }
            Command::Stop => {
                if self.running {
                    info!(steps = self.step, "continuous training stopped");
                }
                self.running = false;
                self.set_status(SessionStatus::Idle);
            }
        }
    }

    fn step_once(&mut self) -> Result<StepStats> {
        let stats = train_step(&mut self.network, &self.data, &self.store, self.learn_rate, self.step + 1)?;
        self.step = stats.step;
        if let Ok(mut progress) = self.progress.lock() {
            progress.latest = Some(stats.clone());
        }
        Ok(stats)
    }

    fn background_step(&mut self) {
        if let Err(e) = self.step_once() {
            error!(error = %e, "training step failed, stopping");
            self.running = false;
            self.set_status(SessionStatus::Failed { reason: e.to_string() });
        }
    }

    fn report(&self) -> Result<DatasetReport> {
        let points = self
            .data
            .iter()
            .map(|p| -> Result<PointReport> {
                Ok(PointReport {
                    inputs: p.inputs().to_vec(),
                    label: p.label(),
                    predicted: self.network.classify(p.inputs())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let cost = self.network.cost_multiple(&self.data)?;
        Ok(DatasetReport { points, cost })
    }

    fn set_status(&self, status: SessionStatus) {
        if let Ok(mut progress) = self.progress.lock() {
            progress.status = status;
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Owner of a [`Network`] that serializes every read and training step
/// through one worker thread.
///
/// All operations go through a [`SessionHandle`]; none of them can observe a
/// network in the middle of a finite-difference step.
pub struct Session;

impl Session {
    /// Moves `network`, `data` and `store` into a new worker thread.
    pub fn spawn(network: Network, data: Vec<DataPoint>, store: CheckpointStore, learn_rate: f64) -> SessionHandle {
        let (tx, rx) = mpsc::channel();
        let progress = Arc::new(Mutex::new(Progress { status: SessionStatus::Idle, latest: None }));
        let layer_sizes = network.layer_sizes();
        let worker = Worker {
            network,
            data,
            store,
            learn_rate,
            step: 0,
            running: false,
            progress: progress.clone(),
        };
        let join = thread::spawn(move || worker.run(rx));
        SessionHandle {
            tx,
            progress,
            layer_sizes,
            join: Arc::new(Mutex::new(Some(join))),
        }
    }
}

/// Cloneable client side of a training session.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Command>,
    progress: Arc<Mutex<Progress>>,
    layer_sizes: Vec<usize>,
    join: Arc<Mutex<Option<JoinHandle<Network>>>>,
}

impl SessionHandle {
    fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx.send(make(reply_tx)).map_err(|_| Error::SessionClosed)?;
        reply_rx.recv().map_err(|_| Error::SessionClosed)?
    }

    pub fn classify(&self, inputs: Vec<f64>) -> Result<usize> {
        self.request(|reply| Command::Classify(inputs, reply))
    }

    pub fn mean_cost(&self) -> Result<f64> {
        self.request(Command::MeanCost)
    }

    /// Runs exactly one training step and waits for it to finish.
    pub fn train_step(&self) -> Result<StepStats> {
        self.request(Command::Step)
    }

    pub fn report(&self) -> Result<DatasetReport> {
        self.request(Command::Report)
    }

    /// Raw outputs of a single layer, for diagnostics.
    pub fn layer_outputs(&self, index: usize, inputs: Vec<f64>) -> Result<Vec<f64>> {
        self.request(|reply| Command::LayerOutputs(index, inputs, reply))
    }

    /// Starts stepping continuously; requests are still served between steps.
    pub fn start(&self) -> Result<()> {
        self.tx.send(Command::Start).map_err(|_| Error::SessionClosed)
    }

    /// Stops continuous training after the step in flight, if any.
    pub fn stop(&self) -> Result<()> {
        self.tx.send(Command::Stop).map_err(|_| Error::SessionClosed)
    }

    /// Widths of the network the session owns. Training never changes them.
    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    pub fn progress(&self) -> Progress {
        match self.progress.lock() {
            Ok(p) => p.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Shuts the worker down and returns the network it owned.
    ///
    /// Consumes this handle; the worker only exits once every clone of the
    /// handle has been dropped.
    pub fn shutdown(self) -> Result<Network> {
        let join = self.join.lock().map_err(|_| Error::SessionClosed)?.take();
        drop(self.tx);
        let join = join.ok_or(Error::SessionClosed)?;
        join.join().map_err(|_| Error::SessionClosed)
    }
}
