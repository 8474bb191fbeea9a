//! Integration test: coordinated moves, disable, stop.

use plotter_common::motion::config::PlotterConfig;
use plotter_common::motion::error::MotionError;
use plotter_common::motion::reply::Reply;
use plotter_common::motion::state::AxisMode;
use plotter_common::motion::types::{Axis, Vector2D};
use plotter_motion::axis::MoveStatus;
use plotter_motion::orchestrator::split_feedrate;

use super::{default_core, tick_until_reply};

const MARGIN: f32 = 0.05;

#[test]
fn moves_converge_within_margin() {
    let mut core = default_core();
    let mut now = 0;

    for target in [
        Vector2D::new(12.0, 4.5),
        Vector2D::new(-3.0, 8.0),
        Vector2D::new(0.0, -6.25),
    ] {
        assert_eq!(core.move_to(target, 2400.0), Ok(MoveStatus::InProgress));
        assert_eq!(tick_until_reply(&mut core, &mut now, 30_000), Some(Reply::Finished));

        let state = core.get_state();
        assert!(!state.axis_x.moving && !state.axis_y.moving);
        assert_eq!(state.axis_x.drive, 0.0);
        assert_eq!(state.axis_y.drive, 0.0);
        assert!((state.position.x - target.x).abs() <= MARGIN, "{state:?}");
        assert!((state.position.y - target.y).abs() <= MARGIN, "{state:?}");
    }
}

#[test]
fn split_feedrate_ratio_and_path_speed() {
    for (delta, feedrate) in [
        (Vector2D::new(30.0, 40.0), 1000.0),
        (Vector2D::new(-7.0, 1.0), 600.0),
        (Vector2D::new(0.0, -5.0), 1500.0),
    ] {
        let split = split_feedrate(delta, feedrate);
        assert!((split.length() - feedrate).abs() < feedrate * 1e-5);
        if delta.y != 0.0 && split.y != 0.0 {
            let ratio = split.x / split.y;
            assert!((ratio - delta.x.abs() / delta.y.abs()).abs() < 1e-4);
        }
    }

    // Exact components where the arithmetic is exact.
    assert_eq!(split_feedrate(Vector2D::new(100.0, 0.0), 50.0), Vector2D::new(50.0, 0.0));
    assert_eq!(split_feedrate(Vector2D::new(30.0, 40.0), 50.0), Vector2D::new(30.0, 40.0));
    assert_eq!(split_feedrate(Vector2D::ZERO, 50.0), Vector2D::ZERO);
}

#[test]
fn coordinated_axes_arrive_together() {
    let mut core = default_core();
    core.move_to(Vector2D::new(30.0, 40.0), 3000.0).unwrap();

    let mut done = [None, None];
    for now in 1..=5_000u32 {
        core.update(now);
        let state = core.get_state();
        for axis in Axis::ALL {
            if done[axis.index()].is_none() && !state.axis(axis).moving {
                done[axis.index()] = Some(now);
            }
        }
        if done.iter().all(Option::is_some) {
            break;
        }
    }

    let (tx, ty) = (done[0].unwrap(), done[1].unwrap());
    // 50 mm at 3000 mm/min is 1000 ms of interpolation.
    assert!(tx >= 950 && ty >= 950);
    assert!(tx.abs_diff(ty) <= 20, "x finished at {tx}, y at {ty}");
}

#[test]
fn relative_square_returns_to_start() {
    let mut core = default_core();
    let mut now = 0;
    core.positioning_relative();

    for step in [
        Vector2D::new(5.0, 0.0),
        Vector2D::new(0.0, 5.0),
        Vector2D::new(-5.0, 0.0),
        Vector2D::new(0.0, -5.0),
    ] {
        core.move_to(step, 1800.0).unwrap();
        assert_eq!(tick_until_reply(&mut core, &mut now, 20_000), Some(Reply::Finished));
    }

    // Each leg starts from the measured position, so error does not accumulate
    // beyond one margin per axis.
    let pos = core.get_state().position;
    assert!(pos.x.abs() <= 2.0 * MARGIN, "{pos:?}");
    assert!(pos.y.abs() <= 2.0 * MARGIN, "{pos:?}");
}

#[test]
fn disabled_axis_rejects_every_motion_without_state_change() {
    let mut core = default_core();
    core.disable_axis(Axis::X);
    let before = core.get_state();

    assert_eq!(
        core.move_to(Vector2D::new(1.0, 1.0), 600.0),
        Err(MotionError::AxisDisabled(Axis::X))
    );
    assert_eq!(
        core.move_axis(Axis::X, 1.0, 600.0),
        Err(MotionError::AxisDisabled(Axis::X))
    );
    assert_eq!(
        core.jog(Vector2D::new(100.0, 100.0)),
        Err(MotionError::AxisDisabled(Axis::X))
    );
    assert_eq!(core.home(), Err(MotionError::AxisDisabled(Axis::X)));
    assert_eq!(core.get_state(), before);

    // The enabled axis is still usable on its own.
    assert_eq!(core.move_axis(Axis::Y, 1.0, 600.0), Ok(MoveStatus::InProgress));
}

#[test]
fn disable_mid_move_stops_and_enable_does_not_resume() {
    let mut core = default_core();
    core.move_to(Vector2D::new(20.0, 20.0), 1200.0).unwrap();
    for now in 1..=100 {
        core.update(now);
    }
    core.disable_axis(Axis::X);
    assert_eq!(core.take_reply(), Some(Reply::Unknown));
    let frozen = core.get_state().axis_x.last_position;

    for now in 101..=300 {
        core.update(now);
        assert_eq!(core.get_state().axis_x.last_position, frozen);
    }

    core.enable_axis(Axis::X);
    for now in 301..=600 {
        core.update(now);
    }
    let state = core.get_state();
    assert_eq!(state.axis_x.mode(), AxisMode::Idle);
    assert_eq!(state.axis_x.last_position, frozen);
}

#[test]
fn stop_is_idempotent() {
    let mut core = default_core();
    core.jog(Vector2D::new(-900.0, 450.0)).unwrap();
    for now in 1..=50 {
        core.update(now);
    }

    assert_eq!(core.stop(), Reply::Finished);
    let once = core.get_state();
    assert!(once.is_idle());

    assert_eq!(core.stop(), Reply::Finished);
    assert_eq!(core.get_state(), once);
}

#[test]
fn zero_feedrate_coordinated_move_is_rejected() {
    let mut core = default_core();
    let before = core.get_state();
    assert_eq!(
        core.move_to(Vector2D::new(4.0, 0.0), 0.0),
        Err(MotionError::InvalidFeedrate(0.0))
    );
    assert_eq!(core.get_state(), before);
}

#[test]
fn custom_axis_tuning_is_honored() {
    let mut config = PlotterConfig::default();
    config.axes.x.ticks_per_mm = 40.0;
    config.axes.x.margin = 0.1;
    let mut core = super::core_with(
        &config,
        plotter_motion::sim::LimitSwitch::Never,
        plotter_motion::sim::LimitSwitch::Never,
    );
    let mut now = 0;

    core.move_to(Vector2D::new(7.5, 0.0), 1200.0).unwrap();
    assert_eq!(tick_until_reply(&mut core, &mut now, 20_000), Some(Reply::Finished));
    assert!((core.get_state().position.x - 7.5).abs() <= 0.1);
    assert_eq!(core.axis(Axis::X).encoder().ticks_per_mm(), 40.0);
}

#[test]
fn rejected_jog_and_move_leave_both_axes_untouched() {
    let mut core = default_core();
    let before = core.get_state();

    assert!(matches!(
        core.jog(Vector2D::new(600.0, f32::NAN)),
        Err(MotionError::InvalidFeedrate(f)) if f.is_nan()
    ));
    assert!(!core.axis(Axis::X).info().moving);
    assert_eq!(core.get_state(), before);

    assert_eq!(
        core.jog(Vector2D::new(f32::INFINITY, 600.0)),
        Err(MotionError::InvalidFeedrate(f32::INFINITY))
    );
    assert!(matches!(
        core.move_to(Vector2D::new(5.0, f32::NAN), 600.0),
        Err(MotionError::InvalidFeedrate(_))
    ));
    assert_eq!(core.get_state(), before);

    for now in 1..=50 {
        core.update(now);
    }
    assert!(core.get_state().is_idle());
    assert_eq!(core.take_reply(), None);
}

#[test]
fn stopping_one_axis_fails_the_coordinated_move() {
    let mut core = default_core();
    let mut now = 0;
    assert_eq!(
        core.move_to(Vector2D::new(20.0, 20.0), 1200.0),
        Ok(MoveStatus::InProgress)
    );
    for _ in 0..50 {
        now += 1;
        core.update(now);
    }

    assert_eq!(core.stop_axis(Axis::X, false), None);
    assert_eq!(core.take_reply(), Some(Reply::Unknown));
    assert!(!core.get_state().axis_x.moving);

    // The move never reached its target, so it never reports finished.
    assert_eq!(tick_until_reply(&mut core, &mut now, 3_000), None);
    assert!(core.get_state().position.x < 20.0 - MARGIN);
}

#[test]
fn stopping_an_idle_axis_keeps_the_other_axis_move() {
    let mut core = default_core();
    let mut now = 0;
    core.move_axis(Axis::Y, 3.0, 1200.0).unwrap();
    for _ in 0..20 {
        now += 1;
        core.update(now);
    }

    assert_eq!(core.stop_axis(Axis::X, true), Some(Reply::Finished));
    assert_eq!(core.take_reply(), None);
    assert_eq!(tick_until_reply(&mut core, &mut now, 5_000), Some(Reply::Finished));
}
