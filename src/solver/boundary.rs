use std::f64::consts::PI;

use crate::state::{u_idx, v_idx, GridState, SeededRng};
use super::params::{BoundaryKind, InflowProfile, SimParams};

/// Uniform damping applied to every face after boundary enforcement.
pub const VELOCITY_DAMPING: f64 = 0.998;

/// Relative amplitude of the Gaussian jitter in `InflowProfile::Turbulent`.
pub const TURBULENT_INTENSITY: f64 = 0.1;

/// Profile multiplier at normalized height `y` and time `t`.
pub fn inflow_profile(profile: InflowProfile, y: f64, t: f64, rng: &mut SeededRng) -> f64 {
    match profile {
        InflowProfile::Uniform => 1.0,
        InflowProfile::Parabolic => 4.0 * y * (1.0 - y),
        InflowProfile::Sinusoidal => (PI * y).sin(),
        InflowProfile::Noisy => 1.0 + 0.3 * (2.0 * PI * y + 2.0 * t).sin() * (3.0 * t).cos(),
        InflowProfile::Turbulent => {
            // Box-Muller blows up on a zero uniform draw; draw again.
            let g = loop {
                let g = rng.next_gaussian();
                if g.is_finite() {
                    break g;
                }
            };
            1.0 + TURBULENT_INTENSITY * g
        }
    }
}

/// Impose the inlet profile on the leftmost `u` faces and zero the
/// leftmost `v` column. Other walls are left to `enforce_boundaries`.
pub fn apply_inflow(state: &mut GridState, params: &SimParams, t: f64) {
    let n = state.n;
    for j in 0..n {
        let y = (j as f64 + 0.5) / n as f64;
        let profile = inflow_profile(params.inflow_profile, y, t, &mut state.rng);
        state.u[u_idx(0, j, n)] = params.inflow_velocity * profile;
    }
    for j in 0..=n {
        state.v[v_idx(0, j, n)] = 0.0;
    }
}

/// Wall conditions plus global damping.
///   - `NoSlip`: bottom and top rows of `u` are zeroed.
///   - `FreeSlip`: `u` is left alone.
///   - Both: leftmost and rightmost `v` columns are zeroed.
pub fn enforce_boundaries(state: &mut GridState, bc: BoundaryKind) {
    let n = state.n;

    if bc == BoundaryKind::NoSlip {
        for i in 0..=n {
            state.u[u_idx(i, 0, n)] = 0.0;
            state.u[u_idx(i, n - 1, n)] = 0.0;
        }
    }

    for j in 0..=n {
        state.v[v_idx(0, j, n)] = 0.0;
        state.v[v_idx(n - 1, j, n)] = 0.0;
    }

    for x in state.u.iter_mut().chain(state.v.iter_mut()) {
        *x *= VELOCITY_DAMPING;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{u_idx, v_idx, GridState};

    fn params_with(profile: InflowProfile, velocity: f64) -> SimParams {
        SimParams {
            inflow_profile: profile,
            inflow_velocity: velocity,
            ..SimParams::default()
        }
    }

    #[test]
    fn test_uniform_inflow_small_grid() {
        let n = 4;
        let mut state = GridState::new(n);
        apply_inflow(&mut state, &params_with(InflowProfile::Uniform, 1.0), 0.0);
        for j in 0..n {
            for i in 0..=n {
                let expected = if i == 0 { 1.0 } else { 0.0 };
                assert_eq!(state.u[u_idx(i, j, n)], expected, "u at ({}, {})", i, j);
            }
        }
        assert!(state.v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_inflow_zeroes_left_v_column_only() {
        let n = 6;
        let mut state = GridState::new(n);
        state.v.fill(0.7);
        apply_inflow(&mut state, &params_with(InflowProfile::Uniform, 1.0), 0.0);
        for j in 0..=n {
            assert_eq!(state.v[v_idx(0, j, n)], 0.0, "left v column at row {}", j);
            for i in 1..n {
                assert_eq!(state.v[v_idx(i, j, n)], 0.7, "interior v at ({}, {})", i, j);
            }
        }
    }

    #[test]
    fn test_parabolic_profile_peaks_at_center() {
        let n = 8;
        let mut state = GridState::new(n);
        apply_inflow(&mut state, &params_with(InflowProfile::Parabolic, 2.0), 0.0);
        let edge = state.u[u_idx(0, 0, n)];
        let center = state.u[u_idx(0, n / 2, n)];
        // y = 1/16 at the first row
        let y = 0.5 / n as f64;
        assert!((edge - 2.0 * 4.0 * y * (1.0 - y)).abs() < 1e-12);
        assert!(center > edge, "center {} should exceed edge {}", center, edge);
        // symmetric about the centerline
        let top = state.u[u_idx(0, n - 1, n)];
        assert!((edge - top).abs() < 1e-12);
    }

    #[test]
    fn test_sinusoidal_profile() {
        let mut rng = SeededRng::new(1);
        assert!((inflow_profile(InflowProfile::Sinusoidal, 0.5, 0.0, &mut rng) - 1.0).abs() < 1e-12);
        assert!(inflow_profile(InflowProfile::Sinusoidal, 0.0, 0.0, &mut rng).abs() < 1e-12);
    }

    #[test]
    fn test_noisy_profile_is_deterministic_and_bounded() {
        let mut rng = SeededRng::new(1);
        for k in 0..50 {
            let t = k as f64 * 0.37;
            let a = inflow_profile(InflowProfile::Noisy, 0.3, t, &mut rng);
            let b = inflow_profile(InflowProfile::Noisy, 0.3, t, &mut rng);
            assert_eq!(a, b);
            assert!((0.7..=1.3).contains(&a), "noisy profile out of band: {}", a);
        }
        // At t = 0 the ripple is sin(2 pi y)
        let v = inflow_profile(InflowProfile::Noisy, 0.25, 0.0, &mut rng);
        assert!((v - 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_turbulent_profile_consumes_rng() {
        let n = 16;
        let mut a = GridState::new(n);
        let mut b = GridState::new(n);
        let params = params_with(InflowProfile::Turbulent, 1.0);
        apply_inflow(&mut a, &params, 0.0);
        apply_inflow(&mut b, &params, 0.0);
        assert_eq!(a.u, b.u, "same seed must give the same inlet");

        let first: Vec<f64> = (0..n).map(|j| a.u[u_idx(0, j, n)]).collect();
        assert!(first.iter().all(|x| x.is_finite()));
        assert!(first.windows(2).any(|w| w[0] != w[1]), "rows should differ");

        apply_inflow(&mut a, &params, 0.0);
        let second: Vec<f64> = (0..n).map(|j| a.u[u_idx(0, j, n)]).collect();
        assert_ne!(first, second, "successive steps draw fresh samples");
    }

    #[test]
    fn test_noslip_zeroes_top_and_bottom_u() {
        let n = 8;
        let mut state = GridState::new(n);
        state.u.fill(1.0);
        state.v.fill(1.0);
        enforce_boundaries(&mut state, BoundaryKind::NoSlip);
        for i in 0..=n {
            assert_eq!(state.u[u_idx(i, 0, n)], 0.0);
            assert_eq!(state.u[u_idx(i, n - 1, n)], 0.0);
        }
        assert_eq!(state.u[u_idx(3, 3, n)], VELOCITY_DAMPING);
    }

    #[test]
    fn test_side_v_columns_zero_for_both_kinds() {
        let n = 8;
        for bc in [BoundaryKind::FreeSlip, BoundaryKind::NoSlip] {
            let mut state = GridState::new(n);
            state.v.fill(-0.5);
            enforce_boundaries(&mut state, bc);
            for j in 0..=n {
                assert_eq!(state.v[v_idx(0, j, n)], 0.0, "{:?} left column row {}", bc, j);
                assert_eq!(state.v[v_idx(n - 1, j, n)], 0.0, "{:?} right column row {}", bc, j);
            }
            assert_eq!(state.v[v_idx(2, 2, n)], -0.5 * VELOCITY_DAMPING);
        }
    }

    #[test]
    fn test_freeslip_leaves_u_walls() {
        let n = 8;
        let mut state = GridState::new(n);
        state.u.fill(1.0);
        enforce_boundaries(&mut state, BoundaryKind::FreeSlip);
        for i in 0..=n {
            assert_eq!(state.u[u_idx(i, 0, n)], VELOCITY_DAMPING);
            assert_eq!(state.u[u_idx(i, n - 1, n)], VELOCITY_DAMPING);
        }
    }

    #[test]
    fn test_damping_decreases_energy() {
        let n = 12;
        let mut state = GridState::new(n);
        let mut rng = SeededRng::new(99);
        for x in state.u.iter_mut().chain(state.v.iter_mut()) {
            *x = rng.next() * 2.0 - 1.0;
        }
        let mut before = state.face_energy();
        for _ in 0..10 {
            enforce_boundaries(&mut state, BoundaryKind::FreeSlip);
            let after = state.face_energy();
            assert!(after <= before, "energy grew: {} -> {}", before, after);
            before = after;
        }
    }
}
