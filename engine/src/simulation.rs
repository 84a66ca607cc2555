//! Timed generation advances with start/stop control.
//!
//! A [`SimulationLoop`] owns the grid and a background worker thread. While
//! running, the worker waits one interval, advances the grid by a generation
//! and publishes the result, then waits again. Every command and every advance
//! goes through the same mutex, so a toggle can never interleave with a
//! neighbor-counting pass and readers only ever see complete generations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info};
use rand::Rng;

use crate::config::SimulationConfig;
use crate::error::GridError;
use crate::grid::{CellState, Grid};
use crate::pattern::Pattern;

/// Snapshots queued per subscriber before further ones are skipped.
pub const SUBSCRIBER_BACKLOG: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
}

impl RunState {
    pub fn is_running(self) -> bool {
        self == RunState::Running
    }
}

/// A published grid together with the number of generations advanced since
/// the grid was last cleared, randomized or replaced.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub generation: u64,
    pub grid: Arc<Grid>,
}

struct Board {
    // Copy-on-write: outstanding snapshots keep the old generation alive.
    grid: Arc<Grid>,
    generation: u64,
    /// Bumped on every start/stop so a pending wait can tell its cadence
    /// was interrupted.
    epoch: u64,
    shutdown: bool,
    subscribers: Vec<SyncSender<Snapshot>>,
}

impl Board {
    fn snapshot(&self) -> Snapshot {
        Snapshot {
            generation: self.generation,
            grid: Arc::clone(&self.grid),
        }
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        self.subscribers
            .retain(|subscriber| match subscriber.try_send(snapshot.clone()) {
                Ok(()) | Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Disconnected(_)) => false,
            });
    }

    fn advance(&mut self) -> u64 {
        self.grid = Arc::new(self.grid.next_generation());
        self.generation += 1;
        debug!(
            "advanced to generation {} (population {})",
            self.generation,
            self.grid.population()
        );
        self.publish();
        self.generation
    }

    fn grid_mut(&mut self) -> &mut Grid {
        Arc::make_mut(&mut self.grid)
    }
}

struct Shared {
    board: Mutex<Board>,
    wake: Condvar,
    running: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Board> {
        // Grids are replaced whole, so a poisoned board is still consistent.
        self.board.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stops the cadence. Takes the board guard so that an advance either
    /// finishes before the stop or observes it.
    fn halt(&self, board: &mut Board) -> bool {
        let was_running = self.running.swap(false, Ordering::AcqRel);
        board.epoch += 1;
        self.wake.notify_all();
        was_running
    }
}

/// Drives a [`Grid`] through generations at a fixed cadence.
pub struct SimulationLoop {
    shared: Arc<Shared>,
    config: SimulationConfig,
    worker: Option<JoinHandle<()>>,
}

impl SimulationLoop {
    /// Creates a stopped loop over an all-dead grid.
    pub fn new(config: SimulationConfig) -> Result<Self, GridError> {
        config.validate()?;
        let grid = Grid::new(config.rows, config.cols)?;
        Ok(Self::spawn(grid, config))
    }

    /// Creates a stopped loop over an existing grid. The grid's dimensions
    /// take precedence over the ones in `config`.
    pub fn with_grid(grid: Grid, config: SimulationConfig) -> Self {
        let (rows, cols) = grid.dimensions();
        Self::spawn(grid, config.with_dimensions(rows, cols))
    }

    fn spawn(grid: Grid, config: SimulationConfig) -> Self {
        let shared = Arc::new(Shared {
            board: Mutex::new(Board {
                grid: Arc::new(grid),
                generation: 0,
                epoch: 0,
                shutdown: false,
                subscribers: Vec::new(),
            }),
            wake: Condvar::new(),
            running: AtomicBool::new(false),
        });

        let worker_shared = Arc::clone(&shared);
        let interval = config.interval;
        let worker = thread::spawn(move || drive(&worker_shared, interval));

        Self {
            shared,
            config,
            worker: Some(worker),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.config.rows, self.config.cols)
    }

    pub fn run_state(&self) -> RunState {
        if self.shared.is_running() {
            RunState::Running
        } else {
            RunState::Stopped
        }
    }

    /// Starts the cadence; the first advance happens one interval from now.
    /// Does nothing if already running.
    pub fn start(&self) {
        let mut board = self.shared.lock();
        if self.shared.running.swap(true, Ordering::AcqRel) {
            return;
        }
        board.epoch += 1;
        self.shared.wake.notify_all();
        info!("simulation started at generation {}", board.generation);
    }

    /// Stops the cadence. Once this returns no further generation is
    /// published until the next [`start`](Self::start) or
    /// [`tick_once`](Self::tick_once).
    pub fn stop(&self) {
        let mut board = self.shared.lock();
        if self.shared.halt(&mut board) {
            info!("simulation stopped at generation {}", board.generation);
        }
    }

    /// Advances exactly one generation whatever the run state, returning the
    /// new generation number.
    pub fn tick_once(&self) -> u64 {
        self.shared.lock().advance()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.shared.lock().snapshot()
    }

    /// Returns a channel that receives every grid published from now on:
    /// advances as well as edits.
    ///
    /// At most [`SUBSCRIBER_BACKLOG`] snapshots wait in the channel; while it
    /// is full, new publications are skipped for that receiver. A receiver
    /// that falls behind can call [`snapshot`](Self::snapshot) to catch up.
    pub fn subscribe(&self) -> Receiver<Snapshot> {
        let (tx, rx) = mpsc::sync_channel(SUBSCRIBER_BACKLOG);
        self.shared.lock().subscribers.push(tx);
        rx
    }

    /// Flips one cell. The run state is left alone.
    pub fn toggle_cell(&self, row: usize, col: usize) -> Result<CellState, GridError> {
        let mut board = self.shared.lock();
        let state = board.grid_mut().toggle(row, col)?;
        board.publish();
        Ok(state)
    }

    /// Places a pattern at `(row, col)`. The run state is left alone.
    pub fn stamp_pattern(&self, pattern: &Pattern, row: usize, col: usize) -> usize {
        let mut board = self.shared.lock();
        let placed = board.grid_mut().stamp(pattern, row, col);
        board.publish();
        placed
    }

    /// Replaces the whole grid and resets the generation counter. The grid
    /// must have the loop's dimensions.
    pub fn set_grid(&self, grid: Grid) -> Result<(), GridError> {
        let (rows, cols) = grid.dimensions();
        if (rows, cols) != self.dimensions() {
            return Err(GridError::InvalidDimensions { rows, cols });
        }
        let mut board = self.shared.lock();
        board.grid = Arc::new(grid);
        board.generation = 0;
        board.publish();
        Ok(())
    }

    /// Stops the loop and refills the grid at the configured density.
    pub fn randomize_grid(&self) {
        self.randomize_grid_with(&mut rand::rng());
    }

    pub fn randomize_grid_with<R: Rng>(&self, rng: &mut R) {
        let mut board = self.shared.lock();
        self.shared.halt(&mut board);
        board.grid_mut().randomize_with(rng, self.config.density);
        board.generation = 0;
        info!(
            "grid randomized (population {})",
            board.grid.population()
        );
        board.publish();
    }

    /// Stops the loop and kills every cell.
    pub fn clear_grid(&self) {
        let mut board = self.shared.lock();
        self.shared.halt(&mut board);
        board.grid_mut().clear();
        board.generation = 0;
        info!("grid cleared");
        board.publish();
    }
}

impl Drop for SimulationLoop {
    fn drop(&mut self) {
        {
            let mut board = self.shared.lock();
            board.shutdown = true;
            self.shared.halt(&mut board);
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("simulation worker panicked");
            }
        }
    }
}

/// Worker body: sleeps while stopped, otherwise advances once per interval.
fn drive(shared: &Shared, interval: Duration) {
    let mut board = shared.lock();
    loop {
        if board.shutdown {
            return;
        }
        if !shared.is_running() {
            board = shared
                .wake
                .wait(board)
                .unwrap_or_else(PoisonError::into_inner);
            continue;
        }

        let epoch = board.epoch;
        let deadline = Instant::now() + interval;
        loop {
            let now = Instant::now();
            if now >= deadline || board.shutdown || board.epoch != epoch {
                break;
            }
            board = shared
                .wake
                .wait_timeout(board, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }

        // Read the flag now, at execution time, not when the wait began.
        if board.shutdown || board.epoch != epoch || !shared.is_running() {
            continue;
        }
        board.advance();
    }
}
