use std::time::Duration;

use crate::error::GridError;

pub const DEFAULT_ROWS: usize = 35;
pub const DEFAULT_COLS: usize = 35;
/// Edge length of a drawn cell in pixels. Only the presentation layer reads it.
pub const DEFAULT_CELL_SIZE: f32 = 17.0;
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);
/// Share of cells left alive by a randomize.
pub const DEFAULT_DENSITY: f64 = 0.2;

/// Tunables for a [`SimulationLoop`](crate::simulation::SimulationLoop).
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub rows: usize,
    pub cols: usize,
    pub cell_size: f32,
    /// Delay between two timed advances.
    pub interval: Duration,
    pub density: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            cell_size: DEFAULT_CELL_SIZE,
            interval: DEFAULT_INTERVAL,
            density: DEFAULT_DENSITY,
        }
    }
}

impl SimulationConfig {
    pub fn with_dimensions(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    pub fn validate(&self) -> Result<(), GridError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(GridError::InvalidDimensions {
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_board() {
        let config = SimulationConfig::default();
        assert_eq!((config.rows, config.cols), (35, 35));
        assert_eq!(config.interval, Duration::from_millis(100));
        assert_eq!(config.density, 0.2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let config = SimulationConfig::default().with_dimensions(0, 10);
        assert_eq!(
            config.validate(),
            Err(GridError::InvalidDimensions { rows: 0, cols: 10 })
        );
    }
}
