//! Integration test: homing sequence, debounce, timeout.

use plotter_common::motion::config::{HomingDirection, PlotterConfig};
use plotter_common::motion::error::AxisFault;
use plotter_common::motion::reply::Reply;
use plotter_common::motion::state::AxisMode;
use plotter_common::motion::types::{Axis, Vector2D};
use plotter_motion::orchestrator::MotionOrchestrator;
use plotter_motion::sim::{LimitSwitch, SimulatedAxis, SimulatedBrush};

use super::{Core, core_with, tick_until_reply};

fn short_timeout(ticks: u32) -> PlotterConfig {
    let mut config = PlotterConfig::default();
    config.axes.x.homing_timeout_ticks = ticks;
    config.axes.y.homing_timeout_ticks = ticks;
    config
}

#[test]
fn homes_x_then_y_and_zeroes_both() {
    let mut core = core_with(
        &PlotterConfig::default(),
        LimitSwitch::Below(-2.0),
        LimitSwitch::Below(-3.0),
    );
    let mut now = 0;

    core.home().unwrap();
    let state = core.get_state();
    assert!(state.homing_sequence);
    assert_eq!(state.axis_x.mode(), AxisMode::Homing);
    assert_eq!(state.axis_y.mode(), AxisMode::Idle);

    // Y waits for X.
    for _ in 0..50 {
        now += 1;
        core.update(now);
    }
    assert_eq!(core.axis(Axis::Y).driver().switch_reads(), 0);
    assert!(core.axis(Axis::X).driver().position() < 0.0);

    assert_eq!(tick_until_reply(&mut core, &mut now, 5_000), Some(Reply::Finished));

    let state = core.get_state();
    assert!(state.is_idle());
    assert!(!state.has_fault());
    assert_eq!(state.position, Vector2D::ZERO);
    assert!(core.axis(Axis::X).driver().position() <= -2.0);
    assert!(core.axis(Axis::Y).driver().position() <= -3.0);
}

#[test]
fn positive_homing_direction() {
    let mut config = PlotterConfig::default();
    config.axes.x.homing_direction = HomingDirection::Positive;
    let mut core = core_with(&config, LimitSwitch::Above(1.5), LimitSwitch::Below(-0.5));
    let mut now = 0;

    core.home().unwrap();
    assert_eq!(tick_until_reply(&mut core, &mut now, 5_000), Some(Reply::Finished));
    assert!(core.axis(Axis::X).driver().position() >= 1.5);
    assert_eq!(core.get_state().position.x, 0.0);
}

#[test]
fn timeout_faults_axis_and_fails_sequence() {
    let mut core = core_with(&short_timeout(100), LimitSwitch::Never, LimitSwitch::Never);
    let mut now = 0;

    core.home().unwrap();
    assert_eq!(tick_until_reply(&mut core, &mut now, 1_000), Some(Reply::Unknown));
    // X times out after 100 ticks, then Y gets its own 100.
    assert_eq!(now, 200);

    let state = core.get_state();
    assert!(state.has_fault());
    for axis in Axis::ALL {
        let info = state.axis(axis);
        assert!(info.faults.contains(AxisFault::HOMING_TIMEOUT));
        assert!(!info.homing && !info.moving);
        assert_eq!(info.drive, 0.0);
        assert_eq!(info.homing_ticks, 100);
    }
}

#[test]
fn retry_after_timeout_clears_fault() {
    let mut core = core_with(
        &short_timeout(100),
        LimitSwitch::AfterReads(150),
        LimitSwitch::Never,
    );
    let mut now = 0;

    core.home_axis(Axis::X).unwrap();
    assert_eq!(tick_until_reply(&mut core, &mut now, 1_000), Some(Reply::Unknown));
    assert!(core.get_state().axis_x.faults.contains(AxisFault::HOMING_TIMEOUT));

    core.home_axis(Axis::X).unwrap();
    assert!(!core.get_state().axis_x.faults.contains(AxisFault::HOMING_TIMEOUT));

    // Closed from read 150, confirmed on the fourth consecutive read.
    assert_eq!(tick_until_reply(&mut core, &mut now, 1_000), Some(Reply::Finished));
    let state = core.get_state();
    assert_eq!(state.axis_x.homing_ticks, 53);
    assert!(!state.has_fault());
}

#[test]
fn bouncing_switch_restarts_debounce() {
    let config = PlotterConfig::default();
    let sx = SimulatedAxis::new(&config.axes.x)
        .with_limit_switch(LimitSwitch::AfterReads(10))
        .with_bounce(6);
    let sy = SimulatedAxis::new(&config.axes.y).with_limit_switch(LimitSwitch::AfterReads(0));
    let mut core: Core = MotionOrchestrator::new(sx, sy, SimulatedBrush::default(), &config);
    core.update(0);

    core.home_axis(Axis::X).unwrap();
    let mut counters = Vec::new();
    let mut reply = None;
    for now in 1..=30 {
        core.update(now);
        counters.push(core.get_state().axis_x.margin_check_counter);
        reply = core.take_reply();
        if reply.is_some() {
            break;
        }
    }

    // Reads 10..15 chatter, 16.. stay closed; four in a row confirm.
    assert_eq!(&counters[9..15], &[1, 0, 1, 0, 1, 0]);
    assert_eq!(counters.len(), 19);
    assert_eq!(reply, Some(Reply::Finished));
    assert_eq!(core.get_state().axis_x.homing_ticks, 19);
}

#[test]
fn stop_aborts_homing_without_reply() {
    let mut core = core_with(&PlotterConfig::default(), LimitSwitch::Never, LimitSwitch::Never);
    core.home().unwrap();
    for now in 1..=20 {
        core.update(now);
    }

    assert_eq!(core.stop(), Reply::Finished);
    let state = core.get_state();
    assert!(state.is_idle());
    assert!(!state.has_fault());

    for now in 21..=200 {
        core.update(now);
        assert_eq!(core.take_reply(), None);
    }
}

#[test]
fn move_supersedes_homing_sequence() {
    let mut core = core_with(&PlotterConfig::default(), LimitSwitch::Never, LimitSwitch::Never);
    let mut now = 0;
    core.home().unwrap();
    for _ in 0..20 {
        now += 1;
        core.update(now);
    }

    core.move_to(Vector2D::new(3.0, 3.0), 1500.0).unwrap();
    let state = core.get_state();
    assert!(!state.homing_sequence);
    assert!(!state.axis_x.homing);

    assert_eq!(tick_until_reply(&mut core, &mut now, 10_000), Some(Reply::Finished));
    assert_eq!(core.get_state().axis_y.homing_ticks, 0);
}

#[test]
fn full_sequence_replaces_single_axis_homing() {
    let mut core = core_with(&PlotterConfig::default(), LimitSwitch::Never, LimitSwitch::Never);
    let mut now = 0;

    core.home_axis(Axis::Y).unwrap();
    for _ in 0..10 {
        now += 1;
        core.update(now);
    }
    assert_eq!(core.get_state().axis_y.mode(), AxisMode::Homing);

    core.home().unwrap();
    let state = core.get_state();
    assert_eq!(state.axis_x.mode(), AxisMode::Homing);
    assert_eq!(state.axis_y.mode(), AxisMode::Idle);

    for _ in 0..190 {
        now += 1;
        core.update(now);
        let state = core.get_state();
        assert!(state.axis_x.homing, "x left homing at {now}");
        assert!(!state.axis_y.homing, "y homing alongside x at {now}");
    }
    assert_eq!(core.take_reply(), None);
}
