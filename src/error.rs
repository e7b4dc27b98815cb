use thiserror::Error;

/// Rejected construction parameters. Runtime inputs never error: out of
/// range injection coordinates are clamped, not reported.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("time step must be positive and finite, got {0}")]
    InvalidTimeStep(f32),
    #[error("diffusion rate must be non-negative, got {0}")]
    NegativeDiffusion(f32),
    #[error("viscosity must be non-negative, got {0}")]
    NegativeViscosity(f32),
    #[error("grid size must be greater than 2, got {0}")]
    GridTooSmall(usize),
    #[error("relaxation iteration count must be greater than zero")]
    NoRelaxIterations,
}
