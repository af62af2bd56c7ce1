use serde::Deserialize;

/// Shape of the velocity profile imposed on the left inlet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InflowProfile {
    #[default]
    Uniform,
    /// `4y(1-y)`: zero at the walls, 1 on the centerline.
    Parabolic,
    Sinusoidal,
    /// Closed-form time-varying ripple, deterministic in `t`.
    Noisy,
    /// Gaussian jitter drawn from the grid RNG every step.
    Turbulent,
}

impl InflowProfile {
    pub fn next(self) -> Self {
        match self {
            Self::Uniform => Self::Parabolic,
            Self::Parabolic => Self::Sinusoidal,
            Self::Sinusoidal => Self::Noisy,
            Self::Noisy => Self::Turbulent,
            Self::Turbulent => Self::Uniform,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Uniform => "uniform",
            Self::Parabolic => "parabolic",
            Self::Sinusoidal => "sinusoidal",
            Self::Noisy => "noisy",
            Self::Turbulent => "turbulent",
        }
    }
}

/// Direction of the force injected near the inlet around the cursor row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceDirection {
    #[default]
    Rightward,
    Upward,
    Swirl,
}

impl ForceDirection {
    pub fn next(self) -> Self {
        match self {
            Self::Rightward => Self::Upward,
            Self::Upward => Self::Swirl,
            Self::Swirl => Self::Rightward,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Rightward => "rightward",
            Self::Upward => "upward",
            Self::Swirl => "swirl",
        }
    }
}

/// Wall treatment for the top and bottom rows of `u`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    #[default]
    FreeSlip,
    NoSlip,
}

impl BoundaryKind {
    pub fn next(self) -> Self {
        match self {
            Self::FreeSlip => Self::NoSlip,
            Self::NoSlip => Self::FreeSlip,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::FreeSlip => "free-slip",
            Self::NoSlip => "no-slip",
        }
    }
}

/// Parameters supplied to every step. The solver never mutates them.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimParams {
    pub reynolds: f64,
    pub inflow_velocity: f64,
    pub inflow_profile: InflowProfile,
    pub force_magnitude: f64,
    /// Half-height of the forced band, in cells.
    pub force_radius: f64,
    /// Gaussian falloff width, in cells.
    pub force_sigma: f64,
    pub force_direction: ForceDirection,
    pub auto_cfl: bool,
    /// Fixed timestep. Always used for force integration; used for
    /// advection too when `auto_cfl` is off.
    pub dt: f64,
    pub boundary: BoundaryKind,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            reynolds: 100.0,
            inflow_velocity: 0.5,
            inflow_profile: InflowProfile::Uniform,
            force_magnitude: 2.0,
            force_radius: 20.0,
            force_sigma: 0.1,
            force_direction: ForceDirection::Rightward,
            auto_cfl: true,
            dt: 0.001,
            boundary: BoundaryKind::FreeSlip,
        }
    }
}

impl SimParams {
    /// Kinematic viscosity `nu = 1/Re`.
    pub fn viscosity(&self) -> f64 {
        1.0 / self.reynolds
    }

    /// Number of diffusion passes: `min(3, floor(100 nu))`.
    pub fn diffusion_iterations(&self) -> usize {
        ((self.viscosity() * 100.0).floor() as usize).min(3)
    }
}

/// Cursor as seen by the force composer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorState {
    /// Normalized row position, 0 = first grid row, 1 = last.
    pub y: f64,
    pub locked: bool,
}

impl Default for CursorState {
    fn default() -> Self {
        Self { y: 0.5, locked: false }
    }
}
