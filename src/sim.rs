use crate::error::ConfigError;
use crate::field::Field;
use crate::grid::Grid;
use crate::solver::{self, FieldKind, RelaxMode};

pub const DEFAULT_GRID_SIZE: usize = 128;
pub const DEFAULT_RELAX_ITERATIONS: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimParams {
    pub size: usize,
    pub dt: f32,
    pub diffusion: f32,
    pub viscosity: f32,
    pub relax_iterations: usize,
    pub relax_mode: RelaxMode,
    /// Subtracted from every density cell by `fade_density`, clamped
    /// to [0, 255].
    pub density_fade: f32,
    /// Multiplies every velocity component in `fade_velocity`.
    pub velocity_damping: f32,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            size: DEFAULT_GRID_SIZE,
            dt: 0.1,
            diffusion: 0.0,
            viscosity: 0.0,
            relax_iterations: DEFAULT_RELAX_ITERATIONS,
            relax_mode: RelaxMode::GaussSeidel,
            density_fade: 0.05,
            velocity_damping: 0.99,
        }
    }
}

/// Owned simulation state: velocity, density, and the scratch
/// generations the solver reads from. All buffers are allocated once
/// at construction and keep their size for the lifetime of the sim.
#[derive(Clone, Debug)]
pub struct FluidSim {
    params: SimParams,
    vel_x: Field,
    vel_y: Field,
    vel_x_prev: Field,
    vel_y_prev: Field,
    density: Field,
    density_prev: Field,
    pressure: Field,
    divergence: Field,
}

impl FluidSim {
    pub fn new(params: SimParams) -> Result<Self, ConfigError> {
        if !(params.dt > 0.0) || !params.dt.is_finite() {
            return Err(ConfigError::InvalidTimeStep(params.dt));
        }
        if params.diffusion < 0.0 {
            return Err(ConfigError::NegativeDiffusion(params.diffusion));
        }
        if params.viscosity < 0.0 {
            return Err(ConfigError::NegativeViscosity(params.viscosity));
        }
        if params.size <= 2 {
            return Err(ConfigError::GridTooSmall(params.size));
        }
        if params.relax_iterations == 0 {
            return Err(ConfigError::NoRelaxIterations);
        }
        let grid = Grid::new(params.size);
        log::debug!(
            "fluid sim: {n}x{n} grid, dt={dt}, diffusion={diff:e}, viscosity={visc:e}",
            n = grid.n(),
            dt = params.dt,
            diff = params.diffusion,
            visc = params.viscosity,
        );
        Ok(Self {
            params,
            vel_x: Field::new(grid),
            vel_y: Field::new(grid),
            vel_x_prev: Field::new(grid),
            vel_y_prev: Field::new(grid),
            density: Field::new(grid),
            density_prev: Field::new(grid),
            pressure: Field::new(grid),
            divergence: Field::new(grid),
        })
    }

    pub fn params(&self) -> SimParams {
        self.params
    }

    pub fn grid(&self) -> Grid {
        self.density.grid()
    }

    /// Advances the simulation by one frame: diffuse and project the
    /// velocity field, self-advect it, project again, then diffuse and
    /// advect density along the result. Decay is not applied here; the
    /// frame driver calls `fade_density`/`fade_velocity` itself.
    pub fn step(&mut self) {
        let SimParams {
            dt,
            diffusion,
            viscosity,
            relax_iterations: iters,
            relax_mode: mode,
            ..
        } = self.params;

        solver::diffuse(
            &mut self.vel_x_prev,
            &self.vel_x,
            viscosity,
            dt,
            iters,
            FieldKind::VelocityX,
            mode,
        );
        solver::diffuse(
            &mut self.vel_y_prev,
            &self.vel_y,
            viscosity,
            dt,
            iters,
            FieldKind::VelocityY,
            mode,
        );
        solver::project(
            &mut self.vel_x_prev,
            &mut self.vel_y_prev,
            &mut self.pressure,
            &mut self.divergence,
            iters,
            mode,
        );
        // The pre-advection field carries itself.
        solver::advect(
            &mut self.vel_x,
            &self.vel_x_prev,
            &self.vel_x_prev,
            &self.vel_y_prev,
            dt,
            FieldKind::VelocityX,
        );
        solver::advect(
            &mut self.vel_y,
            &self.vel_y_prev,
            &self.vel_x_prev,
            &self.vel_y_prev,
            dt,
            FieldKind::VelocityY,
        );
        solver::project(
            &mut self.vel_x,
            &mut self.vel_y,
            &mut self.pressure,
            &mut self.divergence,
            iters,
            mode,
        );
        solver::diffuse(
            &mut self.density_prev,
            &self.density,
            diffusion,
            dt,
            iters,
            FieldKind::Scalar,
            mode,
        );
        solver::advect(
            &mut self.density,
            &self.density_prev,
            &self.vel_x,
            &self.vel_y,
            dt,
            FieldKind::Scalar,
        );

        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "step: total_density={:.3} max_velocity={:.5}",
                self.total_density(),
                self.max_velocity(),
            );
        }
    }

    pub fn add_density(&mut self, x: i32, y: i32, amount: f32) {
        self.density.add(x, y, amount);
    }

    pub fn add_velocity(&mut self, x: i32, y: i32, dx: f32, dy: f32) {
        self.vel_x.add(x, y, dx);
        self.vel_y.add(x, y, dy);
    }

    pub fn fade_density(&mut self) {
        let fade = self.params.density_fade;
        self.density.update(|value| (value - fade).clamp(0.0, 255.0));
    }

    pub fn fade_velocity(&mut self) {
        let damping = self.params.velocity_damping;
        self.vel_x.update(|value| value * damping);
        self.vel_y.update(|value| value * damping);
    }

    /// Zeroes every field. Cheaper than rebuilding the sim when an
    /// interactive driver wants a reset.
    pub fn clear(&mut self) {
        self.vel_x.fill(0.0);
        self.vel_y.fill(0.0);
        self.vel_x_prev.fill(0.0);
        self.vel_y_prev.fill(0.0);
        self.density.fill(0.0);
        self.density_prev.fill(0.0);
        self.pressure.fill(0.0);
        self.divergence.fill(0.0);
    }

    pub fn density(&self) -> &Field {
        &self.density
    }

    pub fn velocity_x(&self) -> &Field {
        &self.vel_x
    }

    pub fn velocity_y(&self) -> &Field {
        &self.vel_y
    }

    pub fn total_density(&self) -> f32 {
        self.density.sum()
    }

    pub fn max_velocity(&self) -> f32 {
        self.vel_x.max_abs().max(self.vel_y.max_abs())
    }

    pub fn max_divergence(&self) -> f32 {
        solver::max_divergence(&self.vel_x, &self.vel_y)
    }
}
