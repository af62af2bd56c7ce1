use crate::state::{u_idx, v_idx, GridState};
use super::params::{CursorState, ForceDirection, SimParams};

/// The force band spans face columns `0..=FORCE_BAND_COLUMNS`, inlet face included.
pub const FORCE_BAND_COLUMNS: usize = 5;

/// Rebuild `fx`/`fy` from the cursor, or copy the locked snapshot through.
///
/// While locked, cursor motion has no effect: the snapshot captured by
/// [`lock_forces`] is what gets integrated.
pub fn compose_forces(state: &mut GridState, cursor: &CursorState, params: &SimParams) {
    let n = state.n;
    state.fx.fill(0.0);
    state.fy.fill(0.0);

    if cursor.locked {
        state.fx.copy_from_slice(&state.locked_fx);
        state.fy.copy_from_slice(&state.locked_fy);
        return;
    }

    let n_f = n as f64;
    let m = params.force_magnitude;
    let sigma2 = params.force_sigma * params.force_sigma;
    let reach = params.force_radius / n_f;
    let band = FORCE_BAND_COLUMNS.min(n);

    for j in 0..n {
        let y = (j as f64 + 0.5) / n_f;
        let dy = y - cursor.y;
        if dy.abs() > reach {
            continue;
        }
        let weight = (-(dy * dy) / (2.0 * sigma2 / (n_f * n_f))).exp();

        for i in 0..=band {
            match params.force_direction {
                ForceDirection::Rightward => {
                    state.fx[u_idx(i, j, n)] += m * weight;
                }
                ForceDirection::Upward => {
                    if i < n {
                        state.fy[v_idx(i, j, n)] += m * weight;
                    }
                }
                ForceDirection::Swirl => {
                    state.fx[u_idx(i, j, n)] += -m * weight * dy * n_f;
                    if i < n {
                        state.fy[v_idx(i, j, n)] += m * weight * 0.1;
                    }
                }
            }
        }
    }
}

/// Explicit Euler force integration, no clamping.
pub fn apply_forces(state: &mut GridState, dt: f64) {
    for (u, f) in state.u.iter_mut().zip(&state.fx) {
        *u += dt * f;
    }
    for (v, f) in state.v.iter_mut().zip(&state.fy) {
        *v += dt * f;
    }
}

/// Capture the current force fields as the persistent lock snapshot.
pub fn lock_forces(state: &mut GridState) {
    state.locked_fx.copy_from_slice(&state.fx);
    state.locked_fy.copy_from_slice(&state.fy);
}

/// Clear the lock snapshot.
pub fn unlock_forces(state: &mut GridState) {
    state.locked_fx.fill(0.0);
    state.locked_fy.fill(0.0);
}
