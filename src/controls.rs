use crate::solver::SimParams;

/// Number of adjustable parameters.
pub const PARAM_COUNT: usize = 6;

/// Selection state for the keyboard parameter controls.
pub struct ControlState {
    pub selected: usize,
}

impl ControlState {
    pub fn new() -> Self {
        Self { selected: 0 }
    }

    pub fn navigate(&mut self, delta: isize) {
        let count = PARAM_COUNT as isize;
        self.selected = ((self.selected as isize + delta).rem_euclid(count)) as usize;
    }

    pub fn selected_def(&self) -> &'static ParamDef {
        &PARAM_DEFS[self.selected]
    }
}

/// Definition of an adjustable parameter.
pub struct ParamDef {
    pub name: &'static str,
    pub desc: &'static str,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub fine_step: f64,
    pub default: f64,
    pub get: fn(&SimParams) -> f64,
    pub set: fn(&mut SimParams, f64),
}

impl ParamDef {
    /// Value formatted for the status line.
    pub fn format(&self, params: &SimParams) -> String {
        let val = (self.get)(params);
        if self.step >= 0.1 {
            format!("{:.2}", val)
        } else if self.step >= 0.001 {
            format!("{:.3}", val)
        } else {
            format!("{:.4}", val)
        }
    }
}

/// Reynolds number is adjusted on a log10 scale.
pub const PARAM_DEFS: [ParamDef; PARAM_COUNT] = [
    ParamDef {
        name: "logRe",
        desc: "log10 Reynolds number",
        min: 1.0,
        max: 7.0,
        step: 0.1,
        fine_step: 0.01,
        default: 2.0,
        get: |p| p.reynolds.log10(),
        set: |p, v| p.reynolds = 10f64.powf(v),
    },
    ParamDef {
        name: "inflow",
        desc: "inlet velocity",
        min: 0.0,
        max: 2.0,
        step: 0.1,
        fine_step: 0.01,
        default: 0.5,
        get: |p| p.inflow_velocity,
        set: |p, v| p.inflow_velocity = v,
    },
    ParamDef {
        name: "force",
        desc: "cursor force magnitude",
        min: 0.0,
        max: 10.0,
        step: 0.5,
        fine_step: 0.1,
        default: 2.0,
        get: |p| p.force_magnitude,
        set: |p, v| p.force_magnitude = v,
    },
    ParamDef {
        name: "radius",
        desc: "force band half-height (cells)",
        min: 5.0,
        max: 50.0,
        step: 1.0,
        fine_step: 0.5,
        default: 20.0,
        get: |p| p.force_radius,
        set: |p, v| p.force_radius = v,
    },
    ParamDef {
        name: "sigma",
        desc: "force gaussian width (cells)",
        min: 0.01,
        max: 0.5,
        step: 0.01,
        fine_step: 0.001,
        default: 0.1,
        get: |p| p.force_sigma,
        set: |p, v| p.force_sigma = v,
    },
    ParamDef {
        name: "dt",
        desc: "fixed timestep",
        min: 1e-4,
        max: 1e-2,
        step: 1e-3,
        fine_step: 1e-4,
        default: 0.001,
        get: |p| p.dt,
        set: |p, v| p.dt = v,
    },
];

/// Adjust a parameter by delta steps (positive = increase, negative = decrease).
/// If `fine` is true, use fine_step instead of step.
/// Returns true if the value actually changed.
pub fn adjust_param(params: &mut SimParams, selected: usize, delta: i32, fine: bool) -> bool {
    let def = &PARAM_DEFS[selected];
    let old = (def.get)(params);
    let step = if fine { def.fine_step } else { def.step };
    let new_val = (old + delta as f64 * step).clamp(def.min, def.max);
    (def.set)(params, new_val);
    (new_val - old).abs() > 1e-12
}

/// Reset a parameter to its default value.
pub fn reset_param(params: &mut SimParams, selected: usize) {
    let def = &PARAM_DEFS[selected];
    (def.set)(params, def.default);
}

/// Arrow density range for the velocity view.
pub const ARROW_DENSITY_MIN: f64 = 0.5;
pub const ARROW_DENSITY_MAX: f64 = 4.0;
pub const ARROW_DENSITY_STEP: f64 = 0.25;
pub const ARROW_DENSITY_DEFAULT: f64 = 1.5;

/// Step the arrow density by `delta` notches, clamped to its range.
pub fn adjust_arrow_density(density: f64, delta: i32) -> f64 {
    (density + delta as f64 * ARROW_DENSITY_STEP).clamp(ARROW_DENSITY_MIN, ARROW_DENSITY_MAX)
}

/// One-line summary of the switchable settings and the selected slider.
pub fn format_status(params: &SimParams, state: &ControlState) -> String {
    let def = state.selected_def();
    format!(
        "{} {}={} | Re={:.0} {} {} {} cfl={}",
        def.desc,
        def.name,
        def.format(params),
        params.reynolds,
        params.inflow_profile.label(),
        params.force_direction.label(),
        params.boundary.label(),
        if params.auto_cfl { "auto" } else { "fixed" },
    )
}
