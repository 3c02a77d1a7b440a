//! Tickloop CLI - record and replay scripts on a simulated drive line
//!
//! Provides subcommands for initializing storage, recording a simulated
//! operator session, replaying a stored script and inspecting scripts.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use tickloop::activities;
use tickloop::runtime::activity::{ActivityExt, from_fn, once_action, unless, wrap_action};
use tickloop::runtime::drive::{Odometry, RobotState, SimRobot};
use tickloop::runtime::sequence::all;
use tickloop::runtime::storage::{self, ScriptStore};
use tickloop::runtime::{Host, Machine, Reel, RuntimeConfig, ScriptCatalog};

#[derive(Parser)]
#[command(name = "tickloop")]
#[command(about = "Record and replay tick-driven machine state", long_about = None)]
struct Cli {
    /// Root directory for runtime storage
    #[arg(short, long, default_value = ".tickloop")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize storage and write a default config
    Init {
        /// Tick period in milliseconds
        #[arg(long, default_value = "20")]
        tick_period_ms: u64,
    },

    /// Record a simulated operator session
    Record {
        /// Script name to store the recording under
        #[arg(short, long)]
        name: String,

        /// Number of ticks to record
        #[arg(short, long, default_value = "150")]
        ticks: u64,
    },

    /// Replay a stored script
    Play {
        /// Script name (default: the configured autonomous script)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List stored scripts
    List,

    /// Print a stored script as JSON
    Dump {
        /// Script name
        #[arg(short, long)]
        name: String,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { tick_period_ms } => {
            let config = RuntimeConfig {
                root: cli.root.clone(),
                tick_period_ms,
                ..RuntimeConfig::default()
            };
            storage::init_storage(&config.root)?;
            storage::write_config(&config)?;
            println!("Initialized tickloop storage at {:?}", cli.root);
        }

        Commands::Record { name, ticks } => {
            let config = storage::load_config(&cli.root)?;
            let (reel, odometry) = record_session(&config, ticks)?;
            let store = ScriptStore::new(cli.root);
            let path = store.save(&name, &reel)?;

            println!("Recorded {} frames to {:?}", reel.len(), path);
            println!("  fingerprint: {}", reel.fingerprint()?);
            print_odometry(&odometry);
        }

        Commands::Play { name } => {
            let config = storage::load_config(&cli.root)?;
            let name = name.unwrap_or_else(|| config.autonomous_script.clone());

            let store = ScriptStore::new(cli.root.clone());
            store.register_all(ScriptCatalog::global())?;
            let registry = ScriptCatalog::global().snapshot();
            let script: Reel<RobotState> = registry
                .get_script(&name)
                .with_context(|| format!("Failed to load script '{}'", name))?;

            let (replayed, odometry) = replay(&config, &script)?;
            let matches = replayed.fingerprint()? == script.fingerprint()?;

            println!("Replayed {} of {} frames from '{}'", replayed.len(), script.len(), name);
            println!("  reproduces recording: {}", if matches { "yes" } else { "NO" });
            print_odometry(&odometry);
        }

        Commands::List => {
            let store = ScriptStore::new(cli.root);
            let names = store.list()?;
            if names.is_empty() {
                println!("No scripts stored");
            }
            for name in names {
                println!("  {}", name);
            }
        }

        Commands::Dump { name } => {
            let store = ScriptStore::new(cli.root);
            let reel: Reel<RobotState> = store.load(&name)?;
            println!("{}", reel.to_json_pretty()?);
        }
    }

    Ok(())
}

/// Drive the simulated robot through a scripted operator session while recording
fn record_session(config: &RuntimeConfig, ticks: u64) -> Result<(Reel<RobotState>, Odometry)> {
    let mut host = Host::new(SimRobot::new(config.tick_period_ms));
    let robot = host.machine();
    let tick = Rc::new(Cell::new(0u64));

    // Simulated stick: forward, then an arc, then a pause while "held" near the end.
    let stick = {
        let robot = robot.clone();
        let tick = tick.clone();
        wrap_action(move || {
            let t = tick.get();
            let (forward, turn) = if t < ticks / 2 { (0.6, 0.0) } else { (0.4, 0.3) };
            robot.borrow_mut().drive_line.arcade_drive(forward, turn, true);
        })
    };
    let pause_held = {
        let tick = tick.clone();
        from_fn(move || tick.get() + 10 >= ticks)
    };
    let shift = {
        let robot = robot.clone();
        once_action(move || robot.borrow_mut().drive_line.shift_high())
    };
    let clock = {
        let tick = tick.clone();
        wrap_action(move || tick.set(tick.get() + 1))
    };
    let stop_when_paused = {
        let robot = robot.clone();
        let tick = tick.clone();
        wrap_action(move || {
            if tick.get() + 10 >= ticks {
                robot.borrow_mut().drive_line.stop();
            }
        })
    };

    host.set_teleop(
        all(activities![
            unless(pause_held, all(activities![shift, stick])),
            stop_when_paused,
            clock,
        ])
        .boxed(),
    );

    host.teleop_init();
    host.recorder_mut().start_recording()?;
    host.run(ticks);
    host.recorder_mut().stop_recording();

    let odometry = robot.borrow().drive_line.odometry();
    Ok((host.recorder().script().clone(), odometry))
}

/// Replay `script` on a fresh robot, collecting every state it applied
fn replay(config: &RuntimeConfig, script: &Reel<RobotState>) -> Result<(Reel<RobotState>, Odometry)> {
    let mut host = Host::new(SimRobot::new(config.tick_period_ms));
    let robot = host.machine();
    host.autonomous_init(script)?;

    let mut replayed = Reel::new();
    let mut odometry = robot.borrow().drive_line.odometry();
    while host.is_replaying() {
        host.tick();
        if host.is_replaying() {
            replayed.add(robot.borrow().state());
            odometry = robot.borrow().drive_line.odometry();
        }
    }
    host.disabled_init();

    Ok((replayed, odometry))
}

fn print_odometry(odometry: &Odometry) {
    println!(
        "  odometry: distance {:.3} m, heading {:.1} deg",
        odometry.distance(),
        odometry.heading
    );
}
