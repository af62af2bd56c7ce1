use crate::solver::{CursorState, Diagnostics};

/// Default grid resolution used by the viewer.
pub const DEFAULT_N: usize = 128;

/// Seed the grid RNG starts from after allocation or reset.
pub const RNG_SEED: u32 = 42;

/// Park-Miller minimal standard generator.
/// `seed` always stays in `[1, MODULUS - 1]`.
pub struct SeededRng {
    seed: u64,
}

impl SeededRng {
    pub const MODULUS: u64 = 2_147_483_647;
    pub const MULTIPLIER: u64 = 16_807;

    pub fn new(seed: u32) -> Self {
        let seed = seed as u64;
        assert!(
            (1..Self::MODULUS).contains(&seed),
            "seed must be in [1, {}], got {}",
            Self::MODULUS - 1,
            seed
        );
        Self { seed }
    }

    /// Returns a value in [0, 1). Zero only when the state lands on 1.
    pub fn next(&mut self) -> f64 {
        self.seed = (self.seed * Self::MULTIPLIER) % Self::MODULUS;
        (self.seed - 1) as f64 / (Self::MODULUS - 1) as f64
    }

    /// Box-Muller deviate. Non-finite when the first uniform draw is 0.
    pub fn next_gaussian(&mut self) -> f64 {
        let u1 = self.next();
        let u2 = self.next();
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

/// Index into `u`: face `i` in `0..=n`, row `j` in `0..n`.
#[inline(always)]
pub const fn u_idx(i: usize, j: usize, n: usize) -> usize {
    j * (n + 1) + i
}

/// Index into `v`: column `i` in `0..n`, face row `j` in `0..=n`.
#[inline(always)]
pub const fn v_idx(i: usize, j: usize, n: usize) -> usize {
    j * n + i
}

/// Index into a cell-centered field.
#[inline(always)]
pub const fn cell_idx(i: usize, j: usize, n: usize) -> usize {
    j * n + i
}

/// Staggered-grid solver state on the unit square.
///
/// `u` lives on vertical faces, `v` on horizontal faces, everything else at
/// cell centers. Only `u`, `v` and the locked force snapshot carry meaning
/// across steps; `speed` is additionally read once by the CFL controller
/// before it is recomputed.
pub struct GridState {
    pub n: usize,
    pub dx: f64,
    pub u: Vec<f64>,
    pub v: Vec<f64>,
    /// Scratch write targets for advection/diffusion, swapped with `u`/`v`.
    pub u_next: Vec<f64>,
    pub v_next: Vec<f64>,
    /// Pressure proxy, `-0.5 * div`.
    pub p: Vec<f64>,
    pub div: Vec<f64>,
    pub omega: Vec<f64>,
    pub speed: Vec<f64>,
    pub grad_mag: Vec<f64>,
    pub fx: Vec<f64>,
    pub fy: Vec<f64>,
    pub locked_fx: Vec<f64>,
    pub locked_fy: Vec<f64>,
    pub rng: SeededRng,
}

impl GridState {
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "grid resolution must be > 0");
        let faces = (n + 1) * n;
        let cells = n * n;
        Self {
            n,
            dx: 1.0 / n as f64,
            u: vec![0.0; faces],
            v: vec![0.0; faces],
            u_next: vec![0.0; faces],
            v_next: vec![0.0; faces],
            p: vec![0.0; cells],
            div: vec![0.0; cells],
            omega: vec![0.0; cells],
            speed: vec![0.0; cells],
            grad_mag: vec![0.0; cells],
            fx: vec![0.0; faces],
            fy: vec![0.0; faces],
            locked_fx: vec![0.0; faces],
            locked_fy: vec![0.0; faces],
            rng: SeededRng::new(RNG_SEED),
        }
    }

    /// Zero every buffer in place and reseed the RNG. Shapes are kept.
    pub fn reset(&mut self) {
        for buf in [
            &mut self.u,
            &mut self.v,
            &mut self.u_next,
            &mut self.v_next,
            &mut self.p,
            &mut self.div,
            &mut self.omega,
            &mut self.speed,
            &mut self.grad_mag,
            &mut self.fx,
            &mut self.fy,
            &mut self.locked_fx,
            &mut self.locked_fy,
        ] {
            buf.fill(0.0);
        }
        self.rng = SeededRng::new(RNG_SEED);
    }

    /// Largest value of the cell-centered speed field as last computed.
    pub fn max_speed(&self) -> f64 {
        self.speed.iter().copied().fold(0.0_f64, f64::max)
    }

    /// Sum of squared face velocities, a discrete energy norm of the raw field.
    #[cfg(test)]
    pub fn face_energy(&self) -> f64 {
        self.u.iter().chain(self.v.iter()).map(|x| x * x).sum()
    }

    /// Copy the render-facing fields into a pre-allocated snapshot.
    pub fn snapshot_into(&self, dst: &mut FrameSnapshot) {
        debug_assert_eq!(dst.n, self.n);
        dst.u.copy_from_slice(&self.u);
        dst.v.copy_from_slice(&self.v);
        dst.p.copy_from_slice(&self.p);
        dst.div.copy_from_slice(&self.div);
        dst.omega.copy_from_slice(&self.omega);
        dst.speed.copy_from_slice(&self.speed);
        dst.grad_mag.copy_from_slice(&self.grad_mag);
    }
}

/// Read-only copy of the grid handed from the physics thread to the renderer.
pub struct FrameSnapshot {
    pub n: usize,
    pub u: Vec<f64>,
    pub v: Vec<f64>,
    pub p: Vec<f64>,
    pub div: Vec<f64>,
    pub omega: Vec<f64>,
    pub speed: Vec<f64>,
    pub grad_mag: Vec<f64>,
    pub diagnostics: Diagnostics,
    pub cursor: CursorState,
    pub time: f64,
    pub steps: u64,
    pub paused: bool,
}

impl FrameSnapshot {
    /// Pre-allocate a snapshot buffer for an `n x n` grid.
    pub fn new_empty(n: usize) -> Self {
        let faces = (n + 1) * n;
        let cells = n * n;
        Self {
            n,
            u: vec![0.0; faces],
            v: vec![0.0; faces],
            p: vec![0.0; cells],
            div: vec![0.0; cells],
            omega: vec![0.0; cells],
            speed: vec![0.0; cells],
            grad_mag: vec![0.0; cells],
            diagnostics: Diagnostics::default(),
            cursor: CursorState::default(),
            time: 0.0,
            steps: 0,
            paused: false,
        }
    }
}
