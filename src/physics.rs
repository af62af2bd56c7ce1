use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::solver::{Diagnostics, SimParams, Simulation};
use crate::state::FrameSnapshot;

/// Session commands from the UI that are not parameter updates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Control {
    ToggleLock,
    Reset,
    SetPaused(bool),
    /// Advance one step while paused.
    SingleStep,
}

/// Channels connecting the main (render) thread to the physics thread.
pub struct PhysicsChannels {
    pub param_tx: mpsc::Sender<SimParams>,
    /// Normalized cursor row, applied before the next step.
    pub cursor_tx: mpsc::Sender<f64>,
    pub control_tx: mpsc::Sender<Control>,
    pub snap_rx: mpsc::Receiver<FrameSnapshot>,
    pub snap_return_tx: mpsc::Sender<FrameSnapshot>,
}

/// Advance `steps` solver steps, logging diagnostics every `log_interval`
/// steps. Returns the diagnostics of the last step, or `None` if `steps` is 0.
pub fn advance_frame(
    sim: &mut Simulation,
    params: &SimParams,
    steps: usize,
    log_interval: u64,
) -> Option<Diagnostics> {
    let mut last = None;
    for _ in 0..steps {
        let diag = sim.advance(params);
        if !diag.is_finite() {
            warn!("non-finite diagnostics at step {}: {:?}", sim.steps, diag);
        } else if log_interval > 0 && sim.steps % log_interval == 0 {
            log_diagnostics(sim.steps, sim.time, &diag);
        }
        last = Some(diag);
    }
    last
}

pub fn log_diagnostics(step: u64, time: f64, diag: &Diagnostics) {
    info!(
        "step={} t={:.4} dt={:.2e} CFL={:.3} KE={:.6e} enstrophy={:.6e} max|div|={:.3e} max|omega|={:.3e}",
        step,
        time,
        diag.dt,
        diag.cfl,
        diag.kinetic_energy,
        diag.enstrophy,
        diag.max_divergence,
        diag.max_vorticity,
    );
}

/// Spawn the physics simulation thread and return its channels + join handle.
pub fn spawn_physics_thread(
    n: usize,
    params: SimParams,
    steps_per_frame: usize,
    log_interval: u64,
    running: Arc<AtomicBool>,
) -> (PhysicsChannels, std::thread::JoinHandle<()>) {
    let (param_tx, param_rx) = mpsc::channel::<SimParams>();
    let (cursor_tx, cursor_rx) = mpsc::channel::<f64>();
    let (control_tx, control_rx) = mpsc::channel::<Control>();
    let (snap_tx, snap_rx) = mpsc::sync_channel::<FrameSnapshot>(1);
    let (snap_return_tx, snap_return_rx) = mpsc::channel::<FrameSnapshot>();

    let handle = std::thread::spawn(move || {
        let mut sim = Simulation::new(n);
        let mut params = params;
        let mut snap_buf = FrameSnapshot::new_empty(n);
        let mut paused = false;

        while running.load(Ordering::SeqCst) {
            while let Ok(new_params) = param_rx.try_recv() {
                params = new_params;
            }
            // Only the latest cursor position matters.
            if let Some(y) = cursor_rx.try_iter().last() {
                sim.set_cursor_y(y);
            }
            let mut pending_steps = if paused { 0 } else { steps_per_frame };
            while let Ok(control) = control_rx.try_recv() {
                match control {
                    Control::ToggleLock => {
                        sim.toggle_lock();
                        debug!("forcing {}", if sim.cursor.locked { "locked" } else { "unlocked" });
                    }
                    Control::Reset => {
                        sim.reset();
                        info!("simulation reset");
                    }
                    Control::SetPaused(p) => {
                        paused = p;
                        pending_steps = if paused { 0 } else { steps_per_frame };
                    }
                    Control::SingleStep => {
                        if paused {
                            pending_steps += 1;
                        }
                    }
                }
            }

            advance_frame(&mut sim, &params, pending_steps, log_interval);

            sim.snapshot_into(&mut snap_buf);
            snap_buf.paused = paused;
            if snap_tx.send(snap_buf).is_err() {
                break;
            }
            snap_buf = snap_return_rx
                .try_recv()
                .ok()
                .filter(|b| b.n == n)
                .unwrap_or_else(|| FrameSnapshot::new_empty(n));

            if paused {
                std::thread::sleep(Duration::from_millis(5));
            }
        }
        debug!("physics thread exiting after {} steps", sim.steps);
    });

    let channels = PhysicsChannels {
        param_tx,
        cursor_tx,
        control_tx,
        snap_rx,
        snap_return_tx,
    };
    (channels, handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_frame_counts_steps() {
        let mut sim = Simulation::new(8);
        let diag = advance_frame(&mut sim, &SimParams::default(), 5, 2);
        assert_eq!(sim.steps, 5);
        assert_eq!(diag, Some(sim.last));
    }

    #[test]
    fn test_advance_frame_zero_steps() {
        let mut sim = Simulation::new(8);
        assert!(advance_frame(&mut sim, &SimParams::default(), 0, 1).is_none());
        assert_eq!(sim.steps, 0);
    }

    #[test]
    fn test_physics_thread_delivers_snapshots() {
        let running = Arc::new(AtomicBool::new(true));
        let (ch, handle) = spawn_physics_thread(8, SimParams::default(), 2, 0, running.clone());

        let first = ch.snap_rx.recv().unwrap();
        assert_eq!(first.n, 8);
        assert_eq!(first.steps, 2);
        assert!(!first.paused);
        ch.snap_return_tx.send(first).unwrap();

        ch.cursor_tx.send(0.25).unwrap();
        ch.control_tx.send(Control::SetPaused(true)).unwrap();
        // drain until both the pause and the cursor move are observed
        let paused = loop {
            let snap = ch.snap_rx.recv().unwrap();
            if snap.paused && snap.cursor.y == 0.25 {
                break snap;
            }
        };
        let frozen = paused.steps;
        let again = ch.snap_rx.recv().unwrap();
        assert_eq!(again.steps, frozen, "paused thread must not step");

        ch.control_tx.send(Control::SingleStep).unwrap();
        let stepped = loop {
            let snap = ch.snap_rx.recv().unwrap();
            if snap.steps != frozen {
                break snap;
            }
        };
        assert_eq!(stepped.steps, frozen + 1);

        ch.control_tx.send(Control::Reset).unwrap();
        let reset = loop {
            let snap = ch.snap_rx.recv().unwrap();
            if snap.steps == 0 {
                break snap;
            }
        };
        assert_eq!(reset.time, 0.0);

        running.store(false, Ordering::SeqCst);
        drop(ch);
        handle.join().unwrap();
    }
}
