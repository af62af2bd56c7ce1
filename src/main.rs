mod config;
mod controls;
mod physics;
mod renderer;
mod solver;
mod state;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::{debug, info};
use minifb::{Key, KeyRepeat, MouseMode, Window, WindowOptions};

use config::Config;
use controls::ControlState;
use physics::{Control, PhysicsChannels};
use renderer::RenderOptions;
use solver::{Diagnostics, SimParams, Simulation};
use state::FrameSnapshot;

/// Interactive 2D channel flow driven by a cursor-placed force band.
#[derive(Parser, Debug)]
#[command(name = "flowlab", version, about)]
struct Cli {
    /// YAML config file (defaults to ./flowlab.yaml when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run without a window and log diagnostics
    #[arg(long)]
    headless: bool,

    /// Number of steps to run in headless mode
    #[arg(long, default_value_t = 1000)]
    steps: u64,

    /// Grid resolution N (overrides the config file)
    #[arg(long)]
    resolution: Option<usize>,

    /// Log filter, e.g. `info` or `flowlab=debug` (overrides RUST_LOG)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

fn init_logging(level: Option<&str>) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.parse_filters(level);
    }
    builder.init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut cfg = config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(n) = cli.resolution {
        cfg.grid.resolution = n;
    }
    cfg.validate().context("validating configuration")?;
    Ok(cfg)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());
    let cfg = load_config(&cli)?;
    info!(
        "grid {}x{}, Re={}, inflow={} ({})",
        cfg.grid.resolution,
        cfg.grid.resolution,
        cfg.physics.reynolds,
        cfg.physics.inflow_velocity,
        cfg.physics.inflow_profile.label(),
    );

    if cli.headless {
        run_headless(&cfg, cli.steps);
        Ok(())
    } else {
        run_gui(&cfg)
    }
}

fn format_diagnostics(diag: &Diagnostics) -> String {
    format!(
        "dt={:.1e} CFL={:.2} KE={:.3e} Z={:.3e} div={:.2e} vort={:.2e}",
        diag.dt, diag.cfl, diag.kinetic_energy, diag.enstrophy, diag.max_divergence, diag.max_vorticity,
    )
}

fn format_title(fps: u32, snap: Option<&FrameSnapshot>, mode: renderer::DisplayMode, status: &str) -> String {
    match snap {
        Some(s) => format!(
            "flowlab | {fps} fps | t={:.3} {} | {}{}{} | {}",
            s.time,
            format_diagnostics(&s.diagnostics),
            mode.label(),
            if s.cursor.locked { " | LOCKED" } else { "" },
            if s.paused { " | paused" } else { "" },
            status,
        ),
        None => format!("flowlab | {fps} fps | {} | {}", mode.label(), status),
    }
}

/// Fixed cursor at mid-height; the force band stays on for the whole run.
fn run_headless(cfg: &Config, steps: u64) {
    let mut sim = Simulation::new(cfg.grid.resolution);
    let started = Instant::now();
    let mut remaining = steps;
    while remaining > 0 {
        let chunk = remaining.min(cfg.display.steps_per_frame as u64);
        physics::advance_frame(&mut sim, &cfg.physics, chunk as usize, cfg.log_interval);
        remaining -= chunk;
    }
    let elapsed = started.elapsed();
    info!(
        "{} steps in {:.2}s ({:.1} steps/s)",
        sim.steps,
        elapsed.as_secs_f64(),
        sim.steps as f64 / elapsed.as_secs_f64().max(1e-9),
    );
    println!("step={} t={:.4} {}", sim.steps, sim.time, format_diagnostics(&sim.last));
}

fn send_params(tx: &std::sync::mpsc::Sender<SimParams>, params: &SimParams) {
    debug!("params updated: {:?}", params);
    let _ = tx.send(params.clone());
}

fn run_gui(cfg: &Config) -> Result<()> {
    let n = cfg.grid.resolution;
    let mut params = cfg.physics.clone();
    let mut mode = cfg.display.mode;
    let mut log_scale = cfg.display.log_scale;
    let mut arrow_density = cfg.display.arrow_density;
    let mut control_state = ControlState::new();
    let mut status_text = controls::format_status(&params, &control_state);

    let mut w = cfg.display.width.max(n);
    let mut h = cfg.display.height.max(n);
    let mut window = Window::new(
        "flowlab",
        w,
        h,
        WindowOptions {
            resize: true,
            ..WindowOptions::default()
        },
    )
    .map_err(|e| anyhow!("failed to create window: {e}"))?;
    window.set_target_fps(cfg.display.target_fps);

    // Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("setting Ctrl+C handler")?;

    let (channels, physics_thread) = physics::spawn_physics_thread(
        n,
        params.clone(),
        cfg.display.steps_per_frame,
        cfg.log_interval,
        running.clone(),
    );
    let PhysicsChannels { param_tx, cursor_tx, control_tx, snap_rx, snap_return_tx } = channels;

    let mut framebuf = vec![0u32; w * h];
    let mut rgba_buf: Vec<u8> = Vec::new();
    let mut frame_count = 0u32;
    let mut last_fps_time = Instant::now();
    let mut display_fps = 0u32;
    let mut last_snap: Option<FrameSnapshot> = None;
    let mut needs_redraw = false;
    let mut paused = false;
    let mut last_mouse_y: Option<f32> = None;

    while window.is_open() && running.load(Ordering::SeqCst) {
        // --- Keyboard handling ---
        if window.is_key_pressed(Key::Escape, KeyRepeat::No) {
            break;
        }

        if window.is_key_pressed(Key::Space, KeyRepeat::No) {
            let _ = control_tx.send(Control::ToggleLock);
        }
        if window.is_key_pressed(Key::P, KeyRepeat::No) {
            paused = !paused;
            let _ = control_tx.send(Control::SetPaused(paused));
        }
        if paused && window.is_key_pressed(Key::S, KeyRepeat::Yes) {
            let _ = control_tx.send(Control::SingleStep);
        }
        if window.is_key_pressed(Key::R, KeyRepeat::No) {
            let _ = control_tx.send(Control::Reset);
        }

        if window.is_key_pressed(Key::V, KeyRepeat::No) || window.is_key_pressed(Key::M, KeyRepeat::No) {
            mode = mode.next();
            needs_redraw = true;
        }
        if window.is_key_pressed(Key::L, KeyRepeat::No) {
            log_scale = !log_scale;
            needs_redraw = true;
        }
        // [ / ]: arrow density
        for (key, delta) in [(Key::LeftBracket, -1), (Key::RightBracket, 1)] {
            if window.is_key_pressed(key, KeyRepeat::Yes) {
                arrow_density = controls::adjust_arrow_density(arrow_density, delta);
                debug!("arrow density {arrow_density}");
                needs_redraw = true;
            }
        }

        // Tab/Up/Down: select parameter
        let mut nav = 0;
        if window.is_key_pressed(Key::Tab, KeyRepeat::No) || window.is_key_pressed(Key::Down, KeyRepeat::Yes) {
            nav += 1;
        }
        if window.is_key_pressed(Key::Up, KeyRepeat::Yes) {
            nav -= 1;
        }
        if nav != 0 {
            control_state.navigate(nav);
            status_text = controls::format_status(&params, &control_state);
        }

        // Left/Right: adjust, Comma/Period: fine adjust
        let mut changed = false;
        for (key, delta, fine) in [
            (Key::Left, -1, false),
            (Key::Right, 1, false),
            (Key::Comma, -1, true),
            (Key::Period, 1, true),
        ] {
            if window.is_key_pressed(key, KeyRepeat::Yes) {
                changed |= controls::adjust_param(&mut params, control_state.selected, delta, fine);
            }
        }
        if window.is_key_pressed(Key::Backspace, KeyRepeat::No) {
            controls::reset_param(&mut params, control_state.selected);
            changed = true;
        }

        // Enumerated settings
        if window.is_key_pressed(Key::I, KeyRepeat::No) {
            params.inflow_profile = params.inflow_profile.next();
            changed = true;
        }
        if window.is_key_pressed(Key::F, KeyRepeat::No) {
            params.force_direction = params.force_direction.next();
            changed = true;
        }
        if window.is_key_pressed(Key::B, KeyRepeat::No) {
            params.boundary = params.boundary.next();
            changed = true;
        }
        if window.is_key_pressed(Key::C, KeyRepeat::No) {
            params.auto_cfl = !params.auto_cfl;
            changed = true;
        }
        if changed {
            send_params(&param_tx, &params);
            status_text = controls::format_status(&params, &control_state);
            needs_redraw = true;
        }

        // --- Cursor follows the mouse inside the window ---
        if let Some((_, my)) = window.get_mouse_pos(MouseMode::Discard) {
            if last_mouse_y != Some(my) {
                last_mouse_y = Some(my);
                let _ = cursor_tx.send(my as f64 / h.max(1) as f64);
            }
        }

        // --- Check for window resize ---
        let (new_w, new_h) = window.get_size();
        if (new_w != w || new_h != h) && new_w > 0 && new_h > 0 {
            w = new_w;
            h = new_h;
            framebuf = vec![0u32; w * h];
            needs_redraw = true;
        }

        let opts = RenderOptions {
            mode,
            log_scale,
            arrow_density,
            force_radius: params.force_radius,
        };

        // --- Non-blocking: grab latest snapshot if available ---
        let mut snap = None;
        while let Ok(s) = snap_rx.try_recv() {
            if let Some(stale) = snap.replace(s) {
                let _ = snap_return_tx.send(stale);
            }
        }

        if let Some(s) = snap {
            renderer::render_into(&mut rgba_buf, &s, w, h, &opts);
            renderer::rgba_to_argb(&rgba_buf, &mut framebuf);
            // Return old snapshot buffer to physics thread for reuse
            if let Some(old) = last_snap.take() {
                let _ = snap_return_tx.send(old);
            }
            last_snap = Some(s);
            needs_redraw = false;
        } else if needs_redraw {
            if let Some(ref s) = last_snap {
                renderer::render_into(&mut rgba_buf, s, w, h, &opts);
                renderer::rgba_to_argb(&rgba_buf, &mut framebuf);
            }
            needs_redraw = false;
        }

        window
            .update_with_buffer(&framebuf, w, h)
            .map_err(|e| anyhow!("failed to update window: {e}"))?;

        frame_count += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            display_fps = frame_count;
            frame_count = 0;
            last_fps_time = now;
        }
        window.set_title(&format_title(display_fps, last_snap.as_ref(), mode, &status_text));
    }

    // Shutdown
    running.store(false, Ordering::SeqCst);
    drop(snap_rx);
    physics_thread
        .join()
        .map_err(|_| anyhow!("physics thread panicked"))?;
    info!("window closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["flowlab"]);
        assert!(!cli.headless);
        assert_eq!(cli.steps, 1000);
        assert!(cli.config.is_none());
        assert!(cli.resolution.is_none());
    }

    #[test]
    fn test_cli_headless_overrides() {
        let cli = Cli::parse_from(["flowlab", "--headless", "--steps", "25", "--resolution", "32", "--log-level", "debug"]);
        assert!(cli.headless);
        assert_eq!(cli.steps, 25);
        assert_eq!(cli.resolution, Some(32));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let cli = Cli::parse_from(["flowlab", "--config", "/nonexistent/flowlab.yaml"]);
        assert!(load_config(&cli).is_err(), "explicit missing config must fail");
    }

    #[test]
    fn test_title_includes_lock_and_diagnostics() {
        let mut snap = FrameSnapshot::new_empty(4);
        snap.cursor.locked = true;
        snap.diagnostics.cfl = 0.5;
        let title = format_title(60, Some(&snap), renderer::DisplayMode::Speed, "status");
        assert!(title.contains("60 fps"), "{}", title);
        assert!(title.contains("CFL=0.50"), "{}", title);
        assert!(title.contains("LOCKED"), "{}", title);
        assert!(title.contains("speed"), "{}", title);
        assert!(!title.contains("paused"), "{}", title);
    }

    #[test]
    fn test_headless_pipeline_no_panic() {
        let mut cfg = Config::default();
        cfg.grid.resolution = 16;
        cfg.display.steps_per_frame = 3;
        cfg.log_interval = 0;
        run_headless(&cfg, 10);
    }
}
