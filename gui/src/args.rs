use std::time::Duration;

use clap::Parser;
use life_engine::config::{DEFAULT_CELL_SIZE, DEFAULT_COLS, DEFAULT_DENSITY, DEFAULT_ROWS};
use life_engine::SimulationConfig;

/// Conway's Game of Life on a bounded grid.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Number of grid rows
    #[arg(long, default_value_t = DEFAULT_ROWS)]
    pub rows: usize,

    /// Number of grid columns
    #[arg(long, default_value_t = DEFAULT_COLS)]
    pub cols: usize,

    /// Edge length of a cell in pixels
    #[arg(long, default_value_t = DEFAULT_CELL_SIZE)]
    pub cell_size: f32,

    /// Milliseconds between two generations while running
    #[arg(long, default_value_t = 100)]
    pub interval_ms: u64,

    /// Share of cells left alive by "Random", between 0 and 1
    #[arg(long, default_value_t = DEFAULT_DENSITY, value_parser = parse_density)]
    pub density: f64,

    /// Pattern placed in the middle of the grid at startup (block, blinker,
    /// glider, toad or beacon)
    #[arg(short, long)]
    pub pattern: Option<String>,
}

impl Args {
    pub fn to_config(&self) -> SimulationConfig {
        SimulationConfig {
            rows: self.rows,
            cols: self.cols,
            cell_size: self.cell_size,
            interval: Duration::from_millis(self.interval_ms),
            density: self.density,
        }
    }
}

fn parse_density(value: &str) -> Result<f64, String> {
    let density: f64 = value
        .parse()
        .map_err(|err| format!("`{value}` is not a number: {err}"))?;
    if (0.0..=1.0).contains(&density) {
        Ok(density)
    } else {
        Err(format!("density must be between 0 and 1, got {density}"))
    }
}
