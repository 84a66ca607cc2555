/*!
* A live cell dies if it has fewer than two live neighbors.
* A live cell with two or three live neighbors lives on to the next generation.
* A live cell with more than three live neighbors dies.
* A dead cell will be brought back to live if it has exactly three live neighbors.
*
* The grid is bounded: cells beyond its edges do not exist and never count
* as neighbors.
*/

pub mod config;
pub mod error;
pub mod grid;
pub mod pattern;
pub mod simulation;

pub use config::SimulationConfig;
pub use error::GridError;
pub use grid::{CellState, Grid};
pub use pattern::Pattern;
pub use simulation::{RunState, SimulationLoop, Snapshot};
