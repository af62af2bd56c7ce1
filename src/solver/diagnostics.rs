use crate::state::{cell_idx, u_idx, v_idx, GridState};

/// Scalar summary of one step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Diagnostics {
    /// Timestep used for advection.
    pub dt: f64,
    /// `max_speed * dt / dx` over the speed field of this step.
    pub cfl: f64,
    /// `mean(0.5 * speed^2)` over cells.
    pub kinetic_energy: f64,
    /// `mean(0.5 * omega^2)` over cells.
    pub enstrophy: f64,
    pub max_divergence: f64,
    pub max_vorticity: f64,
}

impl Diagnostics {
    pub fn is_finite(&self) -> bool {
        [self.dt, self.cfl, self.kinetic_energy, self.enstrophy, self.max_divergence, self.max_vorticity]
            .iter()
            .all(|x| x.is_finite())
    }
}

/// Forward-difference divergence per cell.
pub fn compute_divergence(state: &mut GridState) {
    let n = state.n;
    let dx = state.dx;
    for j in 0..n {
        for i in 0..n {
            let du = state.u[u_idx(i + 1, j, n)] - state.u[u_idx(i, j, n)];
            let dv = state.v[v_idx(i, j + 1, n)] - state.v[v_idx(i, j, n)];
            state.div[cell_idx(i, j, n)] = (du + dv) / dx;
        }
    }
}

/// Vorticity `dv/dx - du/dy` by central differences of the face samples
/// nearest each cell. Neighbors past the edge fall back to the center sample.
pub fn compute_vorticity(state: &mut GridState) {
    let n = state.n;
    let two_dx = 2.0 * state.dx;
    for j in 0..n {
        for i in 0..n {
            let v_c = state.v[v_idx(i, j, n)];
            let v_right = if i + 1 < n { state.v[v_idx(i + 1, j, n)] } else { v_c };
            let v_left = if i > 0 { state.v[v_idx(i - 1, j, n)] } else { v_c };

            let u_c = state.u[u_idx(i, j, n)];
            let u_up = if j + 1 < n { state.u[u_idx(i, j + 1, n)] } else { u_c };
            let u_down = if j > 0 { state.u[u_idx(i, j - 1, n)] } else { u_c };

            let dvdx = (v_right - v_left) / two_dx;
            let dudy = (u_up - u_down) / two_dx;
            state.omega[cell_idx(i, j, n)] = dvdx - dudy;
        }
    }
}

/// Magnitude of the face-averaged, cell-centered velocity.
pub fn compute_speed(state: &mut GridState) {
    let n = state.n;
    for j in 0..n {
        for i in 0..n {
            let uc = 0.5 * (state.u[u_idx(i, j, n)] + state.u[u_idx(i + 1, j, n)]);
            let vc = 0.5 * (state.v[v_idx(i, j, n)] + state.v[v_idx(i, j + 1, n)]);
            state.speed[cell_idx(i, j, n)] = (uc * uc + vc * vc).sqrt();
        }
    }
}

/// Norm of the central-difference gradient of `speed`, edges duplicated.
/// Reads `speed`, so it must run after [`compute_speed`].
pub fn compute_grad_mag(state: &mut GridState) {
    let n = state.n;
    let two_dx = 2.0 * state.dx;
    let GridState { speed, grad_mag, .. } = state;
    for j in 0..n {
        for i in 0..n {
            let c = speed[cell_idx(i, j, n)];
            let left = if i > 0 { speed[cell_idx(i - 1, j, n)] } else { c };
            let right = if i + 1 < n { speed[cell_idx(i + 1, j, n)] } else { c };
            let down = if j > 0 { speed[cell_idx(i, j - 1, n)] } else { c };
            let up = if j + 1 < n { speed[cell_idx(i, j + 1, n)] } else { c };
            let dsdx = (right - left) / two_dx;
            let dsdy = (up - down) / two_dx;
            grad_mag[cell_idx(i, j, n)] = dsdx.hypot(dsdy);
        }
    }
}

/// Pressure stand-in: `p = -0.5 div`. It is display-only and never
/// subtracted from the velocity, so divergence stays in the flow.
pub fn compute_pressure_proxy(state: &mut GridState) {
    for (p, d) in state.p.iter_mut().zip(&state.div) {
        *p = -0.5 * d;
    }
}

/// Recompute every derived field from the current velocities.
pub fn compute_derived_fields(state: &mut GridState) {
    compute_divergence(state);
    compute_vorticity(state);
    compute_speed(state);
    compute_grad_mag(state);
    compute_pressure_proxy(state);
}

/// Reduce the derived fields to a [`Diagnostics`] record.
/// Uses the speed of this step, unlike the CFL controller which uses the
/// previous one.
pub fn summarize(state: &GridState, dt: f64) -> Diagnostics {
    let cells = (state.n * state.n) as f64;
    let mut max_speed = 0.0_f64;
    let mut kinetic_energy = 0.0;
    let mut enstrophy = 0.0;
    let mut max_divergence = 0.0_f64;
    let mut max_vorticity = 0.0_f64;

    for ((&s, &w), &d) in state.speed.iter().zip(&state.omega).zip(&state.div) {
        max_speed = max_speed.max(s);
        kinetic_energy += 0.5 * s * s;
        enstrophy += 0.5 * w * w;
        max_divergence = max_divergence.max(d.abs());
        max_vorticity = max_vorticity.max(w.abs());
    }

    Diagnostics {
        dt,
        cfl: max_speed * dt / state.dx,
        kinetic_energy: kinetic_energy / cells,
        enstrophy: enstrophy / cells,
        max_divergence,
        max_vorticity,
    }
}
