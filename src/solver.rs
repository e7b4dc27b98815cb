use crate::field::Field;

/// Selects the wall treatment a field receives at the grid border.
/// Velocity components reflect off the walls they are normal to; every
/// other field is mirrored (zero-gradient).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    VelocityX,
    VelocityY,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RelaxMode {
    /// Sequential in-place row-major sweep; neighbor reads within a
    /// sweep see values already updated by that sweep.
    #[default]
    GaussSeidel,
    /// Reads the previous sweep's values only. Converges slightly
    /// slower at equal iteration counts but has no update-order
    /// dependency, so large grids relax rows in parallel.
    Jacobi,
}

pub fn enforce_boundary(field: &mut Field, kind: FieldKind) {
    let n = field.grid().n() as i32;
    for i in 1..n - 1 {
        let bottom = field.get(i, 1);
        let top = field.get(i, n - 2);
        field.set(i, 0, if kind == FieldKind::VelocityY { -bottom } else { bottom });
        field.set(i, n - 1, if kind == FieldKind::VelocityY { -top } else { top });
    }
    for j in 1..n - 1 {
        let left = field.get(1, j);
        let right = field.get(n - 2, j);
        field.set(0, j, if kind == FieldKind::VelocityX { -left } else { left });
        field.set(n - 1, j, if kind == FieldKind::VelocityX { -right } else { right });
    }
    field.set(0, 0, 0.5 * (field.get(1, 0) + field.get(0, 1)));
    field.set(0, n - 1, 0.5 * (field.get(1, n - 1) + field.get(0, n - 2)));
    field.set(n - 1, 0, 0.5 * (field.get(n - 2, 0) + field.get(n - 1, 1)));
    field.set(
        n - 1,
        n - 1,
        0.5 * (field.get(n - 2, n - 1) + field.get(n - 1, n - 2)),
    );
}

/// Iteratively relaxes `x[i] = (x0[i] + a * sum(neighbors)) / c` over
/// the interior, boundary-enforcing after every sweep. The iteration
/// count is deliberately small in real-time use, so the result is an
/// approximation of the fixed point, not a converged solution.
pub fn lin_solve(
    x: &mut Field,
    x0: &Field,
    a: f32,
    c: f32,
    iterations: usize,
    kind: FieldKind,
    mode: RelaxMode,
) {
    assert_eq!(x.grid(), x0.grid(), "field grid mismatch");
    match mode {
        RelaxMode::GaussSeidel => lin_solve_gauss_seidel(x, x0, a, c, iterations, kind),
        RelaxMode::Jacobi => lin_solve_jacobi(x, x0, a, c, iterations, kind),
    }
}

fn lin_solve_gauss_seidel(
    x: &mut Field,
    x0: &Field,
    a: f32,
    c: f32,
    iterations: usize,
    kind: FieldKind,
) {
    let n = x.grid().n() as i32;
    let c_recip = 1.0 / c;
    for _ in 0..iterations {
        for j in 1..n - 1 {
            for i in 1..n - 1 {
                let neighbors =
                    x.get(i + 1, j) + x.get(i - 1, j) + x.get(i, j + 1) + x.get(i, j - 1);
                x.set(i, j, (x0.get(i, j) + a * neighbors) * c_recip);
            }
        }
        enforce_boundary(x, kind);
    }
}

fn lin_solve_jacobi(
    x: &mut Field,
    x0: &Field,
    a: f32,
    c: f32,
    iterations: usize,
    kind: FieldKind,
) {
    let n = x.grid().n();
    let c_recip = 1.0 / c;
    let mut prev = x.clone();
    for _ in 0..iterations {
        prev.copy_from(x);
        x.update_with_index(|i, j, value| {
            if i == 0 || j == 0 || i == n - 1 || j == n - 1 {
                return value;
            }
            let (i, j) = (i as i32, j as i32);
            let neighbors =
                prev.get(i + 1, j) + prev.get(i - 1, j) + prev.get(i, j + 1) + prev.get(i, j - 1);
            (x0.get(i, j) + a * neighbors) * c_recip
        });
        enforce_boundary(x, kind);
    }
}

pub fn diffuse(
    x: &mut Field,
    x0: &Field,
    rate: f32,
    dt: f32,
    iterations: usize,
    kind: FieldKind,
    mode: RelaxMode,
) {
    let n = x.grid().n() as f32;
    let a = dt * rate * (n - 2.0) * (n - 2.0);
    lin_solve(x, x0, a, 1.0 + 6.0 * a, iterations, kind, mode);
}

/// Removes the divergent component of the velocity field: solve for a
/// scalar potential against the cell divergence, then subtract its
/// gradient. Pressure and divergence land in the caller's buffers.
pub fn project(
    vel_x: &mut Field,
    vel_y: &mut Field,
    pressure: &mut Field,
    divergence: &mut Field,
    iterations: usize,
    mode: RelaxMode,
) {
    assert_eq!(vel_x.grid(), vel_y.grid(), "field grid mismatch");
    assert_eq!(vel_x.grid(), pressure.grid(), "field grid mismatch");
    assert_eq!(vel_x.grid(), divergence.grid(), "field grid mismatch");
    let n = vel_x.grid().n() as i32;
    let n_f = vel_x.grid().n() as f32;
    for j in 1..n - 1 {
        for i in 1..n - 1 {
            let div = -0.5
                * (vel_x.get(i + 1, j) - vel_x.get(i - 1, j) + vel_y.get(i, j + 1)
                    - vel_y.get(i, j - 1))
                / n_f;
            divergence.set(i, j, div);
            pressure.set(i, j, 0.0);
        }
    }
    enforce_boundary(divergence, FieldKind::Scalar);
    enforce_boundary(pressure, FieldKind::Scalar);
    lin_solve(pressure, divergence, 1.0, 6.0, iterations, FieldKind::Scalar, mode);
    for j in 1..n - 1 {
        for i in 1..n - 1 {
            let grad_x = 0.5 * (pressure.get(i + 1, j) - pressure.get(i - 1, j)) * n_f;
            let grad_y = 0.5 * (pressure.get(i, j + 1) - pressure.get(i, j - 1)) * n_f;
            vel_x.add(i, j, -grad_x);
            vel_y.add(i, j, -grad_y);
        }
    }
    enforce_boundary(vel_x, FieldKind::VelocityX);
    enforce_boundary(vel_y, FieldKind::VelocityY);
}

/// Semi-Lagrangian transport: backtrace each interior cell along the
/// carrier velocity and bilinearly sample the source field there.
pub fn advect(
    d: &mut Field,
    d0: &Field,
    vel_x: &Field,
    vel_y: &Field,
    dt: f32,
    kind: FieldKind,
) {
    assert_eq!(d.grid(), d0.grid(), "field grid mismatch");
    let n = d.grid().n() as i32;
    let n_f = d.grid().n() as f32;
    let dt0 = dt * (n_f - 2.0);
    for j in 1..n - 1 {
        for i in 1..n - 1 {
            let x = (i as f32 - dt0 * vel_x.get(i, j)).clamp(0.5, n_f + 0.5);
            let y = (j as f32 - dt0 * vel_y.get(i, j)).clamp(0.5, n_f + 0.5);
            let i0 = x.floor();
            let j0 = y.floor();
            let s1 = x - i0;
            let s0 = 1.0 - s1;
            let t1 = y - j0;
            let t0 = 1.0 - t1;
            let i0 = i0 as i32;
            let i1 = i0 + 1;
            let j0 = j0 as i32;
            let j1 = j0 + 1;
            let value = s0 * (t0 * d0.get(i0, j0) + t1 * d0.get(i0, j1))
                + s1 * (t0 * d0.get(i1, j0) + t1 * d0.get(i1, j1));
            d.set(i, j, value);
        }
    }
    enforce_boundary(d, kind);
}

/// Largest interior divergence magnitude, measured with the same
/// stencil `project` controls. Diagnostic only.
pub fn max_divergence(vel_x: &Field, vel_y: &Field) -> f32 {
    assert_eq!(vel_x.grid(), vel_y.grid(), "field grid mismatch");
    let n = vel_x.grid().n() as i32;
    let n_f = vel_x.grid().n() as f32;
    let mut max = 0.0f32;
    for j in 1..n - 1 {
        for i in 1..n - 1 {
            let div = -0.5
                * (vel_x.get(i + 1, j) - vel_x.get(i - 1, j) + vel_y.get(i, j + 1)
                    - vel_y.get(i, j - 1))
                / n_f;
            max = max.max(div.abs());
        }
    }
    max
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use std::f32::consts::PI;

    fn assert_close(a: f32, b: f32, tol: f32) {
        assert!(
            (a - b).abs() <= tol,
            "expected {a} to be within {tol} of {b}"
        );
    }

    fn swirl(grid: Grid) -> (Field, Field) {
        // Mid-frequency pattern; period-4 waves are where the compact
        // relaxation actually bites.
        let vel_x = Field::from_fn(grid, |x, y| {
            0.1 * (0.5 * PI * x as f32).sin() * (0.5 * PI * y as f32).sin()
        });
        let vel_y = Field::from_fn(grid, |x, y| {
            0.1 * (0.5 * PI * x as f32).cos() * (0.5 * PI * y as f32).cos()
        });
        (vel_x, vel_y)
    }

    #[test]
    fn boundary_negates_normal_velocity() {
        let grid = Grid::new(6);
        let mut field = Field::from_fn(grid, |x, y| (x + y * 6) as f32 + 1.0);
        enforce_boundary(&mut field, FieldKind::VelocityX);
        for j in 1..5 {
            assert_close(field.get(0, j), -field.get(1, j), 1e-6);
            assert_close(field.get(5, j), -field.get(4, j), 1e-6);
        }
        // Tangential walls mirror.
        for i in 1..5 {
            assert_close(field.get(i, 0), field.get(i, 1), 1e-6);
            assert_close(field.get(i, 5), field.get(i, 4), 1e-6);
        }
    }

    #[test]
    fn boundary_mirrors_scalar_field() {
        let grid = Grid::new(6);
        let mut field = Field::from_fn(grid, |x, y| (x * 2 + y) as f32 + 1.0);
        enforce_boundary(&mut field, FieldKind::Scalar);
        for j in 1..5 {
            assert_close(field.get(0, j), field.get(1, j), 1e-6);
            assert_close(field.get(5, j), field.get(4, j), 1e-6);
        }
        for i in 1..5 {
            assert_close(field.get(i, 0), field.get(i, 1), 1e-6);
            assert_close(field.get(i, 5), field.get(i, 4), 1e-6);
        }
    }

    #[test]
    fn boundary_corners_average_orthogonal_neighbors() {
        let grid = Grid::new(5);
        let mut field = Field::from_fn(grid, |x, y| (x * 7 + y * 3) as f32);
        enforce_boundary(&mut field, FieldKind::Scalar);
        assert_close(
            field.get(0, 0),
            0.5 * (field.get(1, 0) + field.get(0, 1)),
            1e-6,
        );
        assert_close(
            field.get(4, 4),
            0.5 * (field.get(3, 4) + field.get(4, 3)),
            1e-6,
        );
    }

    #[test]
    fn lin_solve_with_unit_divisor_copies_source() {
        // a = 0, c = 1 is the diffusion-rate-zero case.
        let grid = Grid::new(8);
        let source = Field::from_fn(grid, |x, y| (x * y) as f32);
        let mut target = Field::from_fn(grid, |_, _| 42.0);
        lin_solve(
            &mut target,
            &source,
            0.0,
            1.0,
            2,
            FieldKind::Scalar,
            RelaxMode::GaussSeidel,
        );
        for j in 1..7 {
            for i in 1..7 {
                assert_close(target.get(i, j), source.get(i, j), 1e-6);
            }
        }
    }

    #[test]
    fn diffuse_with_zero_rate_is_interior_identity() {
        let grid = Grid::new(10);
        let source = Field::from_fn(grid, |x, y| (x as f32).sin() + (y as f32).cos());
        let mut target = Field::new(grid);
        diffuse(
            &mut target,
            &source,
            0.0,
            0.25,
            2,
            FieldKind::Scalar,
            RelaxMode::GaussSeidel,
        );
        for j in 1..9 {
            for i in 1..9 {
                assert_close(target.get(i, j), source.get(i, j), 1e-6);
            }
        }
    }

    #[test]
    fn diffuse_spreads_a_point_source() {
        let grid = Grid::new(16);
        let mut source = Field::new(grid);
        source.set(8, 8, 100.0);
        let mut target = Field::new(grid);
        diffuse(
            &mut target,
            &source,
            0.0005,
            0.1,
            4,
            FieldKind::Scalar,
            RelaxMode::GaussSeidel,
        );
        assert!(target.get(8, 8) < 100.0);
        assert!(target.get(7, 8) > 0.0);
        assert!(target.get(8, 9) > 0.0);
    }

    #[test]
    fn projection_reduces_divergence() {
        let grid = Grid::new(32);
        let (mut vel_x, mut vel_y) = swirl(grid);
        let mut pressure = Field::new(grid);
        let mut divergence = Field::new(grid);
        let before = max_divergence(&vel_x, &vel_y);
        assert!(before > 1e-4, "test field should start divergent");
        project(
            &mut vel_x,
            &mut vel_y,
            &mut pressure,
            &mut divergence,
            20,
            RelaxMode::GaussSeidel,
        );
        let after = max_divergence(&vel_x, &vel_y);
        assert!(
            after < 0.9 * before,
            "projection should reduce divergence: before={before} after={after}"
        );
    }

    #[test]
    fn repeated_projection_keeps_shrinking_divergence() {
        let grid = Grid::new(32);
        let (mut vel_x, mut vel_y) = swirl(grid);
        let mut pressure = Field::new(grid);
        let mut divergence = Field::new(grid);
        let before = max_divergence(&vel_x, &vel_y);
        for _ in 0..8 {
            project(
                &mut vel_x,
                &mut vel_y,
                &mut pressure,
                &mut divergence,
                20,
                RelaxMode::GaussSeidel,
            );
        }
        let after = max_divergence(&vel_x, &vel_y);
        assert!(
            after < 0.5 * before,
            "eight projections should compound: before={before} after={after}"
        );
    }

    #[test]
    fn jacobi_projection_also_reduces_divergence() {
        let grid = Grid::new(32);
        let (mut vel_x, mut vel_y) = swirl(grid);
        let mut pressure = Field::new(grid);
        let mut divergence = Field::new(grid);
        let before = max_divergence(&vel_x, &vel_y);
        project(
            &mut vel_x,
            &mut vel_y,
            &mut pressure,
            &mut divergence,
            40,
            RelaxMode::Jacobi,
        );
        let after = max_divergence(&vel_x, &vel_y);
        assert!(
            after < 0.9 * before,
            "jacobi projection should reduce divergence: before={before} after={after}"
        );
    }

    #[test]
    fn advection_with_zero_velocity_is_interior_identity() {
        let grid = Grid::new(12);
        let source = Field::from_fn(grid, |x, y| (x * 3 + y * 5) as f32);
        let vel_x = Field::new(grid);
        let vel_y = Field::new(grid);
        let mut target = Field::new(grid);
        advect(&mut target, &source, &vel_x, &vel_y, 0.5, FieldKind::Scalar);
        for j in 1..11 {
            for i in 1..11 {
                assert_close(target.get(i, j), source.get(i, j), 1e-5);
            }
        }
    }

    #[test]
    fn advection_pulls_values_upstream() {
        let grid = Grid::new(16);
        let mut source = Field::new(grid);
        source.set(5, 8, 10.0);
        // Uniform rightward flow; dt * (n - 2) * v = one cell exactly.
        let v = 1.0 / (16.0 - 2.0);
        let vel_x = Field::from_fn(grid, |_, _| v);
        let vel_y = Field::new(grid);
        let mut target = Field::new(grid);
        advect(&mut target, &source, &vel_x, &vel_y, 1.0, FieldKind::Scalar);
        assert_close(target.get(6, 8), 10.0, 1e-4);
        assert_close(target.get(5, 8), 0.0, 1e-4);
    }
}
