use std::fmt;
use std::ops::Not;
use std::str::FromStr;

use rand::Rng;

use crate::error::GridError;
use crate::grid::CellState::{Alive, Dead};
use crate::pattern::Pattern;

/// Offsets of the eight cells surrounding a cell.
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const ALIVE_SYMBOL: char = '#';
const DEAD_SYMBOL: char = '.';

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellState {
    #[default]
    Dead,
    Alive,
}

impl CellState {
    pub fn is_alive(self) -> bool {
        self == Alive
    }
}

impl Not for CellState {
    type Output = CellState;

    fn not(self) -> CellState {
        match self {
            Alive => Dead,
            Dead => Alive,
        }
    }
}

impl From<bool> for CellState {
    fn from(alive: bool) -> Self {
        if alive {
            Alive
        } else {
            Dead
        }
    }
}

/// A bounded `rows x cols` matrix of cells. Dimensions are fixed at
/// construction; cells past the edges simply do not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Vec<CellState>>,
}

impl Grid {
    /// Creates an all-dead grid.
    pub fn new(rows: usize, cols: usize) -> Result<Self, GridError> {
        if rows == 0 || cols == 0 {
            return Err(GridError::InvalidDimensions { rows, cols });
        }
        Ok(Grid {
            cells: vec![vec![Dead; cols]; rows],
        })
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn cols(&self) -> usize {
        self.cells[0].len()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    pub fn get(&self, row: usize, col: usize) -> Result<CellState, GridError> {
        self.check_bounds(row, col)?;
        Ok(self.cells[row][col])
    }

    pub fn set(&mut self, row: usize, col: usize, state: CellState) -> Result<(), GridError> {
        self.check_bounds(row, col)?;
        self.cells[row][col] = state;
        Ok(())
    }

    /// Flips a single cell and returns its new state.
    pub fn toggle(&mut self, row: usize, col: usize) -> Result<CellState, GridError> {
        let next = !self.get(row, col)?;
        self.cells[row][col] = next;
        Ok(next)
    }

    /// Overwrites every cell; each one is alive with probability `density`.
    pub fn randomize(&mut self, density: f64) {
        self.randomize_with(&mut rand::rng(), density);
    }

    /// Same as [`Grid::randomize`] but draws from the given generator.
    pub fn randomize_with<R: Rng>(&mut self, rng: &mut R, density: f64) {
        let density = if density.is_nan() { 0.0 } else { density.clamp(0.0, 1.0) };
        for row in self.cells.iter_mut() {
            for cell in row.iter_mut() {
                *cell = rng.random_bool(density).into();
            }
        }
    }

    pub fn clear(&mut self) {
        for row in self.cells.iter_mut() {
            row.fill(Dead);
        }
    }

    /// Sets the cells of `pattern` alive, shifted by `(row, col)`. Cells that
    /// land outside the grid are dropped. Returns how many cells were placed.
    pub fn stamp(&mut self, pattern: &Pattern, row: usize, col: usize) -> usize {
        let (rows, cols) = self.dimensions();
        let mut placed = 0;
        for &(dr, dc) in pattern.cells {
            let (Some(r), Some(c)) = (row.checked_add(dr), col.checked_add(dc)) else {
                continue;
            };
            if r < rows && c < cols {
                self.cells[r][c] = Alive;
                placed += 1;
            }
        }
        placed
    }

    /// Computes the following generation without touching `self`.
    ///
    /// Every neighbor count reads this grid, so no cell of the new generation
    /// can influence another cell's count within the same pass.
    pub fn next_generation(&self) -> Grid {
        let mut next = vec![vec![Dead; self.cols()]; self.rows()];

        for (row, next_row) in next.iter_mut().enumerate() {
            for (col, next_cell) in next_row.iter_mut().enumerate() {
                let alive_neighbors = self.count_alive_neighbors(row, col);

                *next_cell = match (self.cells[row][col], alive_neighbors) {
                    (_, n) if !(2..=3).contains(&n) => Dead, // Under- or overpopulated
                    (Dead, 3) => Alive,                      // Born
                    (state, _) => state,                     // Unchanged
                };
            }
        }

        Grid { cells: next }
    }

    /// Number of alive cells among the in-bounds neighbors of a cell.
    pub fn alive_neighbors(&self, row: usize, col: usize) -> Result<usize, GridError> {
        self.check_bounds(row, col)?;
        Ok(self.count_alive_neighbors(row, col))
    }

    pub fn population(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| cell.is_alive())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.population() == 0
    }

    /// Iterates over the rows, top to bottom.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[CellState]> {
        self.cells.iter().map(Vec::as_slice)
    }

    fn count_alive_neighbors(&self, row: usize, col: usize) -> usize {
        let (rows, cols) = self.dimensions();

        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(|&(dr, dc)| {
                let r = row.checked_add_signed(dr)?;
                let c = col.checked_add_signed(dc)?;
                (r < rows && c < cols).then(|| self.cells[r][c])
            })
            .filter(|cell| cell.is_alive())
            .count()
    }

    fn check_bounds(&self, row: usize, col: usize) -> Result<(), GridError> {
        let (rows, cols) = self.dimensions();
        if row < rows && col < cols {
            Ok(())
        } else {
            Err(GridError::IndexOutOfBounds {
                row,
                col,
                rows,
                cols,
            })
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, row) in self.cells.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            for cell in row {
                let symbol = if cell.is_alive() { ALIVE_SYMBOL } else { DEAD_SYMBOL };
                write!(f, "{symbol}")?;
            }
        }
        Ok(())
    }
}

/// Parses the text form written by `Display`. `#` marks a live cell and any
/// other character a dead one; blank lines and surrounding whitespace are
/// ignored. Every row must have the same width.
impl FromStr for Grid {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cells: Vec<Vec<CellState>> = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.chars().map(|ch| (ch == ALIVE_SYMBOL).into()).collect())
            .collect();

        let rows = cells.len();
        let cols = cells.first().map_or(0, Vec::len);
        if rows == 0 || cells.iter().any(|row| row.len() != cols) {
            return Err(GridError::InvalidDimensions { rows, cols });
        }

        Ok(Grid { cells })
    }
}
