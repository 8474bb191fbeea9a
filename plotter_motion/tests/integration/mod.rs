//! Shared fixtures for the integration suites.

mod concurrency;
mod homing;
mod motion;

use plotter_common::motion::config::PlotterConfig;
use plotter_common::motion::reply::Reply;
use plotter_motion::orchestrator::MotionOrchestrator;
use plotter_motion::sim::{LimitSwitch, SimulatedAxis, SimulatedBrush};

pub type Core = MotionOrchestrator<SimulatedAxis, SimulatedBrush>;

/// Core over simulated axes with the given switch models, ticked once at t=0.
pub fn core_with(config: &PlotterConfig, x: LimitSwitch, y: LimitSwitch) -> Core {
    let sx = SimulatedAxis::new(&config.axes.x).with_limit_switch(x);
    let sy = SimulatedAxis::new(&config.axes.y).with_limit_switch(y);
    let mut core = MotionOrchestrator::new(sx, sy, SimulatedBrush::default(), config);
    core.update(0);
    core
}

pub fn default_core() -> Core {
    core_with(&PlotterConfig::default(), LimitSwitch::Never, LimitSwitch::Never)
}

/// Tick at 1 ms steps until a reply is produced or `max` ticks pass.
pub fn tick_until_reply(core: &mut Core, now: &mut u32, max: u32) -> Option<Reply> {
    for _ in 0..max {
        *now += 1;
        core.update(*now);
        if let Some(reply) = core.take_reply() {
            return Some(reply);
        }
    }
    None
}
