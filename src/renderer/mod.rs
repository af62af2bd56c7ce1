mod color;

// Re-export public API
pub use color::{diverging_rgba, max_magnitude, normalize_linear, normalize_log};

use serde::Deserialize;

use color::{arrow_color, ARROW_BACKGROUND, CURSOR_FREE, CURSOR_LOCKED};
use crate::state::{cell_idx, u_idx, v_idx, FrameSnapshot};

/// Which field the main view shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Pressure,
    /// Arrow plot of the cell-centered velocity.
    Velocity,
    Divergence,
    #[default]
    Vorticity,
    Speed,
    GradientMagnitude,
}

impl DisplayMode {
    /// Cycle to the next display mode.
    pub fn next(self) -> Self {
        match self {
            DisplayMode::Pressure => DisplayMode::Velocity,
            DisplayMode::Velocity => DisplayMode::Divergence,
            DisplayMode::Divergence => DisplayMode::Vorticity,
            DisplayMode::Vorticity => DisplayMode::Speed,
            DisplayMode::Speed => DisplayMode::GradientMagnitude,
            DisplayMode::GradientMagnitude => DisplayMode::Pressure,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::Pressure => "pressure",
            DisplayMode::Velocity => "velocity",
            DisplayMode::Divergence => "divergence",
            DisplayMode::Vorticity => "vorticity",
            DisplayMode::Speed => "speed",
            DisplayMode::GradientMagnitude => "grad mag",
        }
    }

    /// Cell field shown by a scalar mode; `None` for the arrow plot.
    pub fn scalar_field(self, snap: &FrameSnapshot) -> Option<&[f64]> {
        match self {
            DisplayMode::Pressure => Some(&snap.p),
            DisplayMode::Velocity => None,
            DisplayMode::Divergence => Some(&snap.div),
            DisplayMode::Vorticity => Some(&snap.omega),
            DisplayMode::Speed => Some(&snap.speed),
            DisplayMode::GradientMagnitude => Some(&snap.grad_mag),
        }
    }
}

/// Options that change how a frame is drawn but not what is simulated.
#[derive(Clone, Copy, Debug)]
pub struct RenderOptions {
    pub mode: DisplayMode,
    pub log_scale: bool,
    /// Arrows every `max(1, floor(8 / density))` cells.
    pub arrow_density: f64,
    /// Force band half-height in cells, for the cursor indicator.
    pub force_radius: f64,
}

/// Minimum cursor indicator height in pixels.
const CURSOR_MIN_HEIGHT: usize = 10;
const CURSOR_WIDTH: usize = 4;
const ARROW_SCALE: f64 = 15.0;
const ARROW_HEAD: f64 = 3.0;

/// Cells between arrows for a given density.
pub fn arrow_stride(density: f64) -> usize {
    let stride = (8.0 / density).floor();
    if stride.is_finite() && stride >= 1.0 { stride as usize } else { 1 }
}

/// Map each display pixel to its cell (nearest, row 0 at the top) and
/// color it from the normalized field.
fn render_scalar(buf: &mut [u8], width: usize, height: usize, n: usize, data: &[f64], log_scale: bool) {
    let max_mag = max_magnitude(data);
    for py in 0..height {
        let j = (py * n / height).min(n - 1);
        for px in 0..width {
            let i = (px * n / width).min(n - 1);
            let val = data[cell_idx(i, j, n)];
            let normalized = if log_scale {
                normalize_log(val, max_mag)
            } else {
                normalize_linear(val, max_mag)
            };
            let off = (py * width + px) * 4;
            buf[off..off + 4].copy_from_slice(&diverging_rgba(normalized));
        }
    }
}

// Source-over blend with constant alpha.
#[inline]
fn alpha_blend(buf: &mut [u8], off: usize, color: [f64; 3], alpha: f64) {
    for c in 0..3 {
        let dst = buf[off + c] as f64;
        buf[off + c] = (dst + (color[c] - dst) * alpha).clamp(0.0, 255.0) as u8;
    }
}

/// Bresenham line with alpha-blended color, clipped to the frame.
fn draw_line_blended(
    buf: &mut [u8], width: usize, height: usize,
    x0: isize, y0: isize, x1: isize, y1: isize,
    color: [f64; 3], alpha: f64,
) {
    let mut cx = x0;
    let mut cy = y0;
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx: isize = if x0 < x1 { 1 } else { -1 };
    let sy: isize = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if cx >= 0 && (cx as usize) < width && cy >= 0 && (cy as usize) < height {
            let off = (cy as usize * width + cx as usize) * 4;
            alpha_blend(buf, off, color, alpha);
        }
        if cx == x1 && cy == y1 { break; }
        let e2 = 2 * err;
        if e2 >= dy { err += dy; cx += sx; }
        if e2 <= dx { err += dx; cy += sy; }
    }
}

/// Cell-centered velocity from the two bounding faces per component.
fn cell_velocity(snap: &FrameSnapshot, i: usize, j: usize) -> (f64, f64) {
    let n = snap.n;
    let uc = 0.5 * (snap.u[u_idx(i, j, n)] + snap.u[u_idx(i + 1, j, n)]);
    let vc = 0.5 * (snap.v[v_idx(i, j, n)] + snap.v[v_idx(i, j + 1, n)]);
    (uc, vc)
}

/// Dark background plus one arrow per sampled cell. Arrow length is
/// `min(15 speed / (max + 0.01), 1.5 cell)` and opacity fades with speed.
fn render_velocity(buf: &mut [u8], width: usize, height: usize, snap: &FrameSnapshot, density: f64) {
    let n = snap.n;
    for px in buf.chunks_exact_mut(4) {
        px.copy_from_slice(&[ARROW_BACKGROUND[0], ARROW_BACKGROUND[1], ARROW_BACKGROUND[2], 255]);
    }

    let mut max_speed = 0.0_f64;
    for j in 0..n {
        for i in 0..n {
            let (uc, vc) = cell_velocity(snap, i, j);
            max_speed = max_speed.max(uc.hypot(vc));
        }
    }

    let cell_w = width as f64 / n as f64;
    let cell_h = height as f64 / n as f64;
    let cell = cell_w.min(cell_h);
    let stride = arrow_stride(density);

    for j in (0..n).step_by(stride) {
        for i in (0..n).step_by(stride) {
            let (uc, vc) = cell_velocity(snap, i, j);
            let speed = uc.hypot(vc);
            if speed < 0.001 {
                continue;
            }

            let x = (i as f64 + 0.5) * cell_w;
            let y = (j as f64 + 0.5) * cell_h;
            let length = (ARROW_SCALE * speed / (max_speed + 0.01)).min(cell * 1.5);
            let angle = vc.atan2(uc);
            let opacity = (speed / (max_speed * 0.3 + 0.01)).min(1.0);
            let color = arrow_color(uc);

            let ex = x + length * angle.cos();
            let ey = y + length * angle.sin();
            draw_line_blended(buf, width, height, x as isize, y as isize, ex as isize, ey as isize, color, opacity);

            // two barbs at +-30 degrees back from the tip
            for side in [-1.0_f64, 1.0] {
                let a = angle + side * std::f64::consts::FRAC_PI_6;
                let hx = ex - ARROW_HEAD * a.cos();
                let hy = ey - ARROW_HEAD * a.sin();
                draw_line_blended(buf, width, height, ex as isize, ey as isize, hx as isize, hy as isize, color, opacity);
            }
        }
    }
}

/// Vertical bar on the left edge centered on the cursor row.
fn render_cursor(buf: &mut [u8], width: usize, height: usize, snap: &FrameSnapshot, force_radius: f64) {
    let n = snap.n;
    let cell_h = height as f64 / n as f64;
    let radius_px = (force_radius * cell_h).max(0.0);
    let bar_h = ((2.0 * radius_px).round() as usize).max(CURSOR_MIN_HEIGHT);
    let center = (snap.cursor.y * height as f64).round() as isize;
    let top = center - (bar_h / 2) as isize;
    let color = if snap.cursor.locked { CURSOR_LOCKED } else { CURSOR_FREE };

    for dy in 0..bar_h as isize {
        let y = top + dy;
        if y < 0 || y as usize >= height {
            continue;
        }
        for x in 0..CURSOR_WIDTH.min(width) {
            let off = (y as usize * width + x) * 4;
            buf[off..off + 4].copy_from_slice(&[color[0], color[1], color[2], 255]);
        }
    }
}

/// Render a frame into a pre-allocated RGBA buffer of `width x height`.
/// The buffer is resized as needed.
pub fn render_into(buf: &mut Vec<u8>, snap: &FrameSnapshot, width: usize, height: usize, opts: &RenderOptions) {
    buf.resize(width * height * 4, 0);
    if width == 0 || height == 0 || snap.n == 0 {
        return;
    }

    match opts.mode.scalar_field(snap) {
        Some(data) => render_scalar(buf, width, height, snap.n, data, opts.log_scale),
        None => render_velocity(buf, width, height, snap, opts.arrow_density),
    }
    render_cursor(buf, width, height, snap, opts.force_radius);
}

/// Convert RGBA &[u8] buffer to 0RGB &[u32] buffer for minifb.
pub fn rgba_to_argb(rgba: &[u8], out: &mut [u32]) {
    for (dst, pixel) in out.iter_mut().zip(rgba.chunks_exact(4)) {
        *dst = (pixel[0] as u32) << 16 | (pixel[1] as u32) << 8 | pixel[2] as u32;
    }
}
