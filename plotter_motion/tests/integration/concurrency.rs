//! Integration test: tick thread against command and snapshot threads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use plotter_common::motion::config::PlotterConfig;
use plotter_common::motion::reply::Reply;
use plotter_common::motion::state::MachineState;
use plotter_common::motion::types::{Axis, Vector2D};
use plotter_motion::shared::SharedController;
use plotter_motion::sim::{LimitSwitch, SimulatedAxis, SimulatedBrush};

use super::core_with;

type Shared = SharedController<SimulatedAxis, SimulatedBrush>;

fn shared() -> Shared {
    SharedController::new(core_with(
        &PlotterConfig::default(),
        LimitSwitch::Never,
        LimitSwitch::Never,
    ))
}

fn spawn_ticker(ctl: Shared, running: Arc<AtomicBool>) -> thread::JoinHandle<u32> {
    thread::spawn(move || {
        let mut now = 0u32;
        while running.load(Ordering::Acquire) {
            now = now.wrapping_add(1);
            ctl.tick(now);
            thread::sleep(Duration::from_micros(50));
        }
        now
    })
}

/// Relations that hold between whole operations and never inside one.
fn assert_consistent(state: &MachineState, margin: f32) {
    assert_eq!(state.position.x, state.axis_x.last_position, "{state:?}");
    assert_eq!(state.position.y, state.axis_y.last_position, "{state:?}");
    for axis in Axis::ALL {
        let info = state.axis(axis);
        assert!(!(info.moving && info.homing), "{axis}: {info:?}");
        assert!(!(info.moving && info.within_margin(margin)), "{axis}: {info:?}");
        assert!(info.drive.abs() <= 1.0, "{axis}: {info:?}");
        if !info.is_busy() {
            assert_eq!(info.drive, 0.0, "{axis}: {info:?}");
        }
    }
}

#[test]
fn snapshots_are_never_torn() {
    let ctl = shared();
    let margin = ctl.with(|core| core.axis(Axis::X).margin());
    let running = Arc::new(AtomicBool::new(true));
    let ticker = spawn_ticker(ctl.clone(), running.clone());

    let reader = {
        let ctl = ctl.clone();
        let running = running.clone();
        thread::spawn(move || {
            let mut seen = 0u32;
            while running.load(Ordering::Acquire) {
                assert_consistent(&ctl.get_state(), margin);
                seen += 1;
                thread::yield_now();
            }
            seen
        })
    };

    let targets = [
        Vector2D::new(2.0, 1.0),
        Vector2D::new(-1.5, 0.5),
        Vector2D::new(0.25, -2.0),
        Vector2D::new(0.0, 0.0),
    ];
    for round in 0..40 {
        let target = targets[round % targets.len()];
        match round % 5 {
            0 => {
                ctl.with(|core| core.jog(Vector2D::new(-600.0, 300.0))).unwrap();
            }
            1 => {
                ctl.stop();
            }
            _ => {
                ctl.with(|core| core.move_to(target, 3000.0)).unwrap();
            }
        }
        assert_consistent(&ctl.get_state(), margin);
        thread::sleep(Duration::from_micros(300));
    }

    assert_eq!(ctl.stop(), Reply::Finished);
    running.store(false, Ordering::Release);
    let ticks_run = ticker.join().unwrap();
    let snapshots = reader.join().unwrap();

    let state = ctl.get_state();
    assert!(state.is_idle());
    assert_consistent(&state, margin);
    assert!(snapshots > 0);
    assert_eq!(ctl.ticks() + ctl.skipped_ticks(), u64::from(ticks_run));
}

#[test]
fn tick_does_not_wait_for_a_held_command() {
    let ctl = shared();
    let (locked_tx, locked_rx) = mpsc::channel();
    let (ticked_tx, ticked_rx) = mpsc::channel();

    let holder = {
        let ctl = ctl.clone();
        thread::spawn(move || {
            ctl.with(|core| {
                core.move_to(Vector2D::new(5.0, 0.0), 1200.0).unwrap();
                locked_tx.send(()).unwrap();
                // Hold the core until the ticker has tried three times.
                ticked_rx.recv().unwrap();
            });
        })
    };

    locked_rx.recv().unwrap();
    let results: Vec<bool> = (1..=3).map(|now| ctl.tick(now)).collect();
    ticked_tx.send(()).unwrap();
    holder.join().unwrap();

    assert_eq!(results, [false, false, false]);
    assert_eq!(ctl.skipped_ticks(), 3);
    assert_eq!(ctl.ticks(), 0);

    // The command completed whole and the next tick proceeds from it.
    assert!(ctl.get_state().axis_x.moving);
    assert!(ctl.tick(4));
    assert_eq!(ctl.ticks(), 1);
}

#[test]
fn stop_from_another_thread_lands_before_next_tick() {
    let ctl = shared();
    ctl.with(|core| core.jog(Vector2D::new(1200.0, -1200.0))).unwrap();
    for now in 1..=20 {
        assert!(ctl.tick(now));
    }

    let stopper = {
        let ctl = ctl.clone();
        thread::spawn(move || ctl.stop())
    };
    assert_eq!(stopper.join().unwrap(), Reply::Finished);

    let stopped = ctl.get_state();
    assert!(stopped.is_idle());
    assert!(ctl.tick(21));
    let after = ctl.get_state();
    assert_eq!(after.axis_x.drive, 0.0);
    assert_eq!(after.axis_y.drive, 0.0);
}
