use crate::state::{u_idx, v_idx, GridState};
use super::params::SimParams;

/// Target Courant number for the adaptive timestep.
pub const CFL_TARGET: f64 = 0.8;
pub const DT_MIN: f64 = 1e-4;
pub const DT_MAX: f64 = 1e-2;
/// Keeps the CFL denominator away from zero on a still field.
pub const SPEED_EPSILON: f64 = 1e-6;

/// Clamp a floored sample coordinate into `[0, hi]`.
#[inline(always)]
fn clamp_index(k: f64, hi: usize) -> usize {
    // `as i64` saturates, so huge or NaN coordinates still land in range.
    (k as i64).clamp(0, hi as i64) as usize
}

/// Bilinear sample of `u` at physical `(x, y)`. Face `i` sits at `x = i/n`,
/// row `j` at `y = (j + 0.5)/n`; indices clamp to the nearest valid face.
pub fn bilinear_u(u: &[f64], n: usize, x: f64, y: f64) -> f64 {
    let n_f = n as f64;
    let fx = x * n_f;
    let fy = y * n_f - 0.5;
    let i = fx.floor();
    let j = fy.floor();
    let tx = fx - i;
    let ty = fy - j;

    let i0 = clamp_index(i, n);
    let i1 = clamp_index(i + 1.0, n);
    let j0 = clamp_index(j, n - 1);
    let j1 = clamp_index(j + 1.0, n - 1);

    let v00 = u[u_idx(i0, j0, n)];
    let v10 = u[u_idx(i1, j0, n)];
    let v01 = u[u_idx(i0, j1, n)];
    let v11 = u[u_idx(i1, j1, n)];

    (1.0 - tx) * (1.0 - ty) * v00 + tx * (1.0 - ty) * v10 + (1.0 - tx) * ty * v01 + tx * ty * v11
}

/// Bilinear sample of `v` at physical `(x, y)`. Column `i` sits at
/// `x = (i + 0.5)/n`, face row `j` at `y = j/n`.
pub fn bilinear_v(v: &[f64], n: usize, x: f64, y: f64) -> f64 {
    let n_f = n as f64;
    let fx = x * n_f - 0.5;
    let fy = y * n_f;
    let i = fx.floor();
    let j = fy.floor();
    let tx = fx - i;
    let ty = fy - j;

    let i0 = clamp_index(i, n - 1);
    let i1 = clamp_index(i + 1.0, n - 1);
    let j0 = clamp_index(j, n);
    let j1 = clamp_index(j + 1.0, n);

    let v00 = v[v_idx(i0, j0, n)];
    let v10 = v[v_idx(i1, j0, n)];
    let v01 = v[v_idx(i0, j1, n)];
    let v11 = v[v_idx(i1, j1, n)];

    (1.0 - tx) * (1.0 - ty) * v00 + tx * (1.0 - ty) * v10 + (1.0 - tx) * ty * v01 + tx * ty * v11
}

/// CFL-limited timestep for a given peak speed.
pub fn cfl_timestep(max_speed: f64, dx: f64) -> f64 {
    (CFL_TARGET * dx / (max_speed + SPEED_EPSILON)).clamp(DT_MIN, DT_MAX)
}

/// Advection timestep for this step.
///
/// With auto-CFL on, this reads `state.speed` before it is recomputed, so
/// the controller always lags one step behind the velocity it advects.
pub fn select_timestep(params: &SimParams, state: &GridState) -> f64 {
    if params.auto_cfl {
        cfl_timestep(state.max_speed(), state.dx)
    } else {
        params.dt
    }
}

/// Semi-Lagrangian self-advection of both velocity components.
/// Every face reads the pre-advection field; results land in the scratch
/// buffers, which are then swapped in.
pub fn advect_velocity(state: &mut GridState, dt: f64) {
    let n = state.n;
    let n_f = n as f64;
    let GridState { u, v, u_next, v_next, .. } = state;

    for j in 0..n {
        let y = (j as f64 + 0.5) / n_f;
        for i in 0..=n {
            let x = i as f64 / n_f;
            let vel_x = bilinear_u(u, n, x, y);
            let vel_y = bilinear_v(v, n, x, y);
            u_next[u_idx(i, j, n)] = bilinear_u(u, n, x - vel_x * dt, y - vel_y * dt);
        }
    }

    for j in 0..=n {
        let y = j as f64 / n_f;
        for i in 0..n {
            let x = (i as f64 + 0.5) / n_f;
            let vel_x = bilinear_u(u, n, x, y);
            let vel_y = bilinear_v(v, n, x, y);
            v_next[v_idx(i, j, n)] = bilinear_v(v, n, x - vel_x * dt, y - vel_y * dt);
        }
    }

    std::mem::swap(u, u_next);
    std::mem::swap(v, v_next);
}

/// Weighted-Jacobi smoothing standing in for viscous diffusion.
/// `new = (1 - a) old + a/4 (left + right + down + up)` with `a = 0.1 nu`.
/// Interior `u` faces and interior `v` rows are relaxed; neighbors past the
/// wall are replaced by the center sample. Boundary faces carry over.
pub fn diffuse_velocity(state: &mut GridState, nu: f64, iterations: usize) {
    let n = state.n;
    let alpha = nu * 0.1;
    let GridState { u, v, u_next, v_next, .. } = state;

    for _ in 0..iterations {
        u_next.copy_from_slice(u);
        for j in 0..n {
            for i in 1..n {
                let c = u[u_idx(i, j, n)];
                let left = u[u_idx(i - 1, j, n)];
                let right = u[u_idx(i + 1, j, n)];
                let down = if j > 0 { u[u_idx(i, j - 1, n)] } else { c };
                let up = if j + 1 < n { u[u_idx(i, j + 1, n)] } else { c };
                u_next[u_idx(i, j, n)] = (1.0 - alpha) * c + alpha * 0.25 * (left + right + down + up);
            }
        }

        v_next.copy_from_slice(v);
        for j in 1..n {
            for i in 0..n {
                let c = v[v_idx(i, j, n)];
                let left = if i > 0 { v[v_idx(i - 1, j, n)] } else { c };
                let right = if i + 1 < n { v[v_idx(i + 1, j, n)] } else { c };
                let down = v[v_idx(i, j - 1, n)];
                let up = v[v_idx(i, j + 1, n)];
                v_next[v_idx(i, j, n)] = (1.0 - alpha) * c + alpha * 0.25 * (left + right + down + up);
            }
        }

        std::mem::swap(u, u_next);
        std::mem::swap(v, v_next);
    }
}
