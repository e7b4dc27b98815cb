mod error;
mod field;
mod grid;
mod sim;
mod solver;

pub use error::ConfigError;
pub use field::Field;
pub use grid::Grid;
pub use sim::{FluidSim, SimParams, DEFAULT_GRID_SIZE, DEFAULT_RELAX_ITERATIONS};
pub use solver::{
    advect, diffuse, enforce_boundary, lin_solve, max_divergence, project, FieldKind, RelaxMode,
};
