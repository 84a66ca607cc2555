use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use life_engine::pattern::{BLINKER, BLOCK};
use life_engine::simulation::SUBSCRIBER_BACKLOG;
use life_engine::{CellState, Grid, GridError, RunState, SimulationConfig, SimulationLoop};
use rand::rngs::StdRng;
use rand::SeedableRng;

const WAIT: Duration = Duration::from_secs(2);

fn config(interval_ms: u64) -> SimulationConfig {
    SimulationConfig::default()
        .with_dimensions(3, 3)
        .with_interval(Duration::from_millis(interval_ms))
}

fn blinker() -> Grid {
    ".#.\n.#.\n.#.".parse().expect("blinker")
}

#[test]
fn starts_stopped_with_dead_grid() {
    let sim = SimulationLoop::new(SimulationConfig::default()).expect("loop");
    assert_eq!(sim.run_state(), RunState::Stopped);
    assert_eq!(sim.dimensions(), (35, 35));

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.generation, 0);
    assert!(snapshot.grid.is_empty());
}

#[test]
fn rejects_zero_dimensions() {
    let result = SimulationLoop::new(SimulationConfig::default().with_dimensions(0, 4));
    assert!(matches!(
        result,
        Err(GridError::InvalidDimensions { rows: 0, cols: 4 })
    ));
}

#[test]
fn running_loop_publishes_successive_generations() {
    let sim = SimulationLoop::with_grid(blinker(), config(10));
    let updates = sim.subscribe();
    sim.start();
    assert_eq!(sim.run_state(), RunState::Running);

    let first = updates.recv_timeout(WAIT).expect("first generation");
    let second = updates.recv_timeout(WAIT).expect("second generation");
    sim.stop();

    assert_eq!(first.generation, 1);
    assert_eq!(*first.grid, blinker().next_generation());
    assert_eq!(second.generation, 2);
    assert_eq!(*second.grid, blinker());
}

#[test]
fn stop_before_first_advance_keeps_grid() {
    let sim = SimulationLoop::with_grid(blinker(), config(50));
    let updates = sim.subscribe();

    sim.start();
    sim.stop();
    std::thread::sleep(Duration::from_millis(200));

    assert_eq!(sim.run_state(), RunState::Stopped);
    let snapshot = sim.snapshot();
    assert_eq!(*snapshot.grid, blinker());
    assert_eq!(snapshot.generation, 0);
    assert!(updates.try_recv().is_err());
}

#[test]
fn nothing_is_published_after_stop_returns() {
    let sim = SimulationLoop::with_grid(blinker(), config(5));
    let updates = sim.subscribe();
    sim.start();
    updates.recv_timeout(WAIT).expect("an advance while running");

    sim.stop();
    let at_stop = sim.snapshot();
    std::thread::sleep(Duration::from_millis(60));

    assert_eq!(sim.snapshot().generation, at_stop.generation);
    assert!(updates
        .try_iter()
        .all(|snapshot| snapshot.generation <= at_stop.generation));
}

#[test]
fn restart_resumes_from_current_generation() {
    let sim = SimulationLoop::with_grid(blinker(), config(10));
    let updates = sim.subscribe();

    sim.start();
    updates.recv_timeout(WAIT).expect("advance");
    sim.stop();
    let paused_at = sim.snapshot().generation;
    let _: Vec<_> = updates.try_iter().collect();

    sim.start();
    let resumed = updates.recv_timeout(WAIT).expect("advance after restart");
    sim.stop();
    assert_eq!(resumed.generation, paused_at + 1);
}

#[test]
fn start_and_stop_are_idempotent() {
    let sim = SimulationLoop::new(config(1_000)).expect("loop");
    sim.stop();
    assert_eq!(sim.run_state(), RunState::Stopped);
    sim.start();
    sim.start();
    assert_eq!(sim.run_state(), RunState::Running);
    sim.stop();
    sim.stop();
    assert_eq!(sim.run_state(), RunState::Stopped);
}

#[test]
fn tick_once_ignores_run_state() {
    let sim = SimulationLoop::with_grid(blinker(), config(1_000));
    assert_eq!(sim.tick_once(), 1);
    assert_eq!(sim.run_state(), RunState::Stopped);
    assert_eq!(*sim.snapshot().grid, blinker().next_generation());
    assert_eq!(sim.tick_once(), 2);
    assert_eq!(*sim.snapshot().grid, blinker());
}

#[test]
fn clear_always_stops() {
    let sim = SimulationLoop::with_grid(blinker(), config(1_000));
    sim.clear_grid();
    assert_eq!(sim.run_state(), RunState::Stopped);

    sim.set_grid(blinker()).expect("same dimensions");
    sim.start();
    sim.clear_grid();
    assert_eq!(sim.run_state(), RunState::Stopped);

    let snapshot = sim.snapshot();
    assert!(snapshot.grid.is_empty());
    assert_eq!(snapshot.generation, 0);
}

#[test]
fn randomize_stops_and_uses_configured_density() {
    let sim = SimulationLoop::new(config(1_000).with_density(1.0)).expect("loop");
    sim.start();
    sim.randomize_grid();
    assert_eq!(sim.run_state(), RunState::Stopped);
    assert_eq!(sim.snapshot().grid.population(), 9);

    let empty = SimulationLoop::new(config(1_000).with_density(0.0)).expect("loop");
    empty.randomize_grid_with(&mut StdRng::seed_from_u64(7));
    assert!(empty.snapshot().grid.is_empty());
}

#[test]
fn toggle_does_not_stop_and_twice_restores() {
    let sim = SimulationLoop::new(config(1_000)).expect("loop");
    sim.start();

    assert_eq!(sim.toggle_cell(1, 1), Ok(CellState::Alive));
    assert_eq!(sim.run_state(), RunState::Running);
    assert_eq!(sim.toggle_cell(1, 1), Ok(CellState::Dead));
    assert!(sim.snapshot().grid.is_empty());

    assert!(matches!(
        sim.toggle_cell(3, 0),
        Err(GridError::IndexOutOfBounds { row: 3, col: 0, .. })
    ));
    sim.stop();
}

#[test]
fn edits_are_published() {
    let sim = SimulationLoop::new(config(1_000)).expect("loop");
    let updates = sim.subscribe();

    sim.toggle_cell(0, 0).expect("in bounds");
    let toggled = updates.recv_timeout(WAIT).expect("toggle published");
    assert_eq!(toggled.grid.get(0, 0), Ok(CellState::Alive));

    sim.clear_grid();
    let cleared = updates.recv_timeout(WAIT).expect("clear published");
    assert!(cleared.grid.is_empty());
}

#[test]
fn published_snapshots_are_not_affected_by_later_edits() {
    let sim = SimulationLoop::new(config(1_000)).expect("loop");
    let before = sim.snapshot();
    sim.stamp_pattern(&BLOCK, 0, 0);
    assert!(before.grid.is_empty());
    assert_eq!(sim.snapshot().grid.population(), 4);
}

#[test]
fn set_grid_checks_dimensions() {
    let sim = SimulationLoop::new(config(1_000)).expect("loop");
    let wrong = Grid::new(4, 4).expect("grid");
    assert_eq!(
        sim.set_grid(wrong),
        Err(GridError::InvalidDimensions { rows: 4, cols: 4 })
    );

    let mut right = Grid::new(3, 3).expect("grid");
    right.stamp(&BLINKER, 0, 0);
    sim.tick_once();
    sim.set_grid(right.clone()).expect("matching dimensions");
    let snapshot = sim.snapshot();
    assert_eq!(*snapshot.grid, right);
    assert_eq!(snapshot.generation, 0);
}

#[test]
fn dropped_subscribers_are_pruned() {
    let sim = SimulationLoop::new(config(1_000)).expect("loop");
    drop(sim.subscribe());
    let live = sim.subscribe();
    sim.tick_once();
    assert_eq!(live.recv_timeout(WAIT).map(|s| s.generation), Ok(1));
    assert_eq!(live.try_recv().map(|s| s.generation), Err(std::sync::mpsc::TryRecvError::Empty));
}

#[test]
fn drop_interrupts_a_long_interval() {
    let sim = SimulationLoop::new(config(60_000)).expect("loop");
    let updates = sim.subscribe();
    sim.start();

    let started = Instant::now();
    drop(sim);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(
        updates.recv_timeout(Duration::from_millis(10)).map(|s| s.generation),
        Err(RecvTimeoutError::Disconnected)
    );
}

#[test]
fn stamp_far_outside_the_grid_is_dropped() {
    let sim = SimulationLoop::new(config(1_000)).expect("loop");
    assert_eq!(sim.stamp_pattern(&BLOCK, 0, usize::MAX), 0);
    assert_eq!(sim.stamp_pattern(&BLOCK, usize::MAX, usize::MAX), 0);
    assert!(sim.snapshot().grid.is_empty());
    // The board is still usable afterwards.
    assert_eq!(sim.toggle_cell(0, 0), Ok(CellState::Alive));
}

#[test]
fn idle_subscriber_backlog_is_bounded() {
    let sim = SimulationLoop::with_grid(blinker(), config(1_000));
    let updates = sim.subscribe();
    let total = SUBSCRIBER_BACKLOG as u64 + 20;
    for _ in 0..total {
        sim.tick_once();
    }

    let queued: Vec<u64> = updates.try_iter().map(|s| s.generation).collect();
    assert_eq!(queued.len(), SUBSCRIBER_BACKLOG);
    assert_eq!(queued.last(), Some(&(SUBSCRIBER_BACKLOG as u64)));
    assert_eq!(sim.snapshot().generation, total);

    // A drained subscriber keeps receiving.
    sim.tick_once();
    assert_eq!(
        updates.recv_timeout(WAIT).map(|s| s.generation),
        Ok(total + 1)
    );
}
