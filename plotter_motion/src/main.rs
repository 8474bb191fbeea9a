//! # Plotter Motion Controller
//!
//! Host build of the plotter firmware core. Runs the motion core against
//! the simulated drivers, paces `update()` on a dedicated tick thread and
//! serves the line protocol on stdin/stdout:
//!
//! - one command per input line
//! - `ACK\n` / `NACK\n` per command, after the move or homing completes
//!   for `G00`/`G01`/`G28`
//! - lines received while a command is in flight are queued; `M112` is
//!   executed immediately

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use clap::Parser;
use plotter_common::config::LogLevel;
use plotter_common::motion::config::{AxisConfig, HomingDirection, PlotterConfig};
use plotter_common::motion::reply::Reply;
use plotter_motion::command::{Command, CommandDispatcher, Dispatch};
use plotter_motion::config::load_config;
use plotter_motion::cycle::{TickRunner, rt_setup};
use plotter_motion::line::parse_line;
use plotter_motion::orchestrator::MotionOrchestrator;
use plotter_motion::shared::SharedController;
use plotter_motion::sim::{LimitSwitch, LoggingLed, SimulatedAxis, SimulatedBrush};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Simulated limit switch distance from the power-on position [mm].
const SIM_SWITCH_DISTANCE: f32 = 2.0;

/// Poll period for deferred replies.
const REPLY_POLL: Duration = Duration::from_millis(1);

/// Plotter motion controller (host simulation)
#[derive(Parser, Debug)]
#[command(name = "plotter_motion")]
#[command(version)]
#[command(about = "Two-axis plotter motion core driven by a line protocol on stdin")]
struct Args {
    /// Path to the plotter configuration TOML.
    #[arg(default_value = "config/plotter.toml")]
    config: PathBuf,

    /// CPU core to pin the tick thread to (default: 1).
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority (default: 80).
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    // Tracing needs the configured level, so the file is read first and any
    // error is reported once the subscriber is up.
    let config = load_config(&args.config);
    let level = config
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, level);

    info!("Plotter motion v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = match config {
        Ok(config) => run(&args, &config),
        Err(e) => Err(e.into()),
    };
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Plotter motion shutdown complete");
}

fn run(args: &Args, config: &PlotterConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        path = %args.config.display(),
        service = %config.shared.service_name,
        cycle_time_us = config.cycle_time_us,
        rapid_feedrate = config.rapid_feedrate,
        "configuration loaded"
    );

    let core = MotionOrchestrator::new(
        simulated_axis(&config.axes.x),
        simulated_axis(&config.axes.y),
        SimulatedBrush::default(),
        config,
    );
    let shared = SharedController::new(core);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let tick_thread = spawn_tick_thread(args, config, shared.clone(), running.clone())?;
    let mut dispatcher = CommandDispatcher::new(shared, LoggingLed::default(), config.rapid_feedrate);

    let serve_result = serve(&mut dispatcher, &running);

    running.store(false, Ordering::SeqCst);
    match tick_thread.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => return Err("tick thread panicked".into()),
    }
    info!(
        ticks = dispatcher.core().ticks(),
        skipped = dispatcher.core().skipped_ticks(),
        "tick statistics"
    );
    serve_result
}

fn simulated_axis(config: &AxisConfig) -> SimulatedAxis {
    let switch = match config.homing_direction {
        HomingDirection::Negative => LimitSwitch::Below(-SIM_SWITCH_DISTANCE),
        HomingDirection::Positive => LimitSwitch::Above(SIM_SWITCH_DISTANCE),
    };
    SimulatedAxis::new(config).with_limit_switch(switch)
}

fn spawn_tick_thread(
    args: &Args,
    config: &PlotterConfig,
    shared: SharedController<SimulatedAxis, SimulatedBrush>,
    running: Arc<AtomicBool>,
) -> io::Result<thread::JoinHandle<Result<(), plotter_motion::cycle::CycleError>>> {
    let cpu_core = args.cpu_core;
    let rt_priority = args.rt_priority;
    let cycle_time_us = config.cycle_time_us;

    thread::Builder::new().name("tick".into()).spawn(move || {
        rt_setup(cpu_core, rt_priority)?;
        info!(cpu_core, rt_priority, "RT setup complete");
        let mut runner = TickRunner::new(shared, cycle_time_us, running.clone());
        let result = runner.run();
        // A failed tick loop takes the command side down with it.
        running.store(false, Ordering::SeqCst);
        result
    })
}

/// Serve the line protocol until stdin closes or shutdown is requested.
fn serve(
    dispatcher: &mut CommandDispatcher<SimulatedAxis, SimulatedBrush, LoggingLed>,
    running: &AtomicBool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = mpsc::channel::<String>();
    thread::Builder::new().name("stdin".into()).spawn(move || {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("stdin read failed: {e}");
                    break;
                }
            }
        }
    })?;

    let stdout = io::stdout();
    let mut queue: VecDeque<String> = VecDeque::new();
    let mut in_flight = false;
    let mut input_open = true;

    while running.load(Ordering::SeqCst) {
        if in_flight {
            if let Some(reply) = dispatcher.poll_reply() {
                write_reply(&mut stdout.lock(), reply)?;
                in_flight = false;
            }
        }

        while !in_flight {
            let Some(line) = queue.pop_front() else { break };
            if let Some(outcome) = dispatcher.dispatch_line(&line) {
                in_flight = emit(&mut stdout.lock(), outcome)?;
            }
        }

        if !input_open {
            if !in_flight && queue.is_empty() {
                break;
            }
            thread::sleep(REPLY_POLL);
            continue;
        }

        match rx.recv_timeout(REPLY_POLL) {
            Ok(line) if in_flight && parse_line(&line) == Ok(Command::EmergencyStop) => {
                let outcome = dispatcher.dispatch(Command::EmergencyStop);
                in_flight = emit(&mut stdout.lock(), outcome)?;
            }
            Ok(line) => queue.push_back(line),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => input_open = false,
        }
    }
    Ok(())
}

/// Write an immediate outcome. Returns true if a reply is still owed.
fn emit(out: &mut impl Write, outcome: Dispatch) -> io::Result<bool> {
    match outcome {
        Dispatch::Reply(reply) => write_reply(out, reply).map(|()| false),
        Dispatch::Report(line) => {
            out.write_all(line.as_bytes())?;
            write_reply(out, Reply::Finished).map(|()| false)
        }
        Dispatch::Pending => Ok(true),
    }
}

fn write_reply(out: &mut impl Write, reply: Reply) -> io::Result<()> {
    out.write_all(reply.as_str().as_bytes())?;
    out.flush()
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
///
/// `--verbose` forces DEBUG. Logs go to stderr; stdout carries the protocol.
fn setup_tracing(args: &Args, level: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        level.as_directive()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .compact()
            .init();
    }
}
