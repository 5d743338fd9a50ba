//! `wheelbot` – runs the robot controller against simulated hardware.
//!
//! 1. Initialises `tracing` (and OTLP export when configured).
//! 2. Loads `wheelbot.toml`, writing the default robot when it is missing.
//! 3. Starts the WebSocket bridge so remote operators can publish commands
//!    and watch telemetry.
//! 4. Runs the control loop on its own thread until **Ctrl-C**, then shuts
//!    the robot down and exits.

mod config;

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::Colorize;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use wheelbot_hal::sim::SimHardware;
use wheelbot_kernel::{StateListener, StateTransition};
use wheelbot_middleware::{Communication, MessageBus, WsBridge};
use wheelbot_runtime::telemetry::{LoggingOptions, init_tracing};
use wheelbot_runtime::{ControlLoop, Rover};
use wheelbot_types::{OperatingState, RobotConfiguration};

fn main() -> ExitCode {
    // The OTLP exporter is synchronous, so tracing comes up before the
    // Tokio runtime exists.
    let _guard = init_tracing(&LoggingOptions::from_env("wheelbot"));

    print_banner();

    let path = config::config_path(
        std::env::args().nth(1),
        std::env::var("WHEELBOT_CONFIG").ok(),
    );
    let cfg = match config::load_or_init(&path) {
        Ok((cfg, created)) => {
            let verb = if created { "Default config written to" } else { "Config loaded from" };
            println!("  {} {}", verb, path.display().to_string().bold());
            cfg
        }
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {}", "Failed to start async runtime".red(), e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cfg)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "wheelbot exited with an error");
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: RobotConfiguration) -> Result<(), String> {
    let bus = MessageBus::default();

    // ── WebSocket bridge ──────────────────────────────────────────────────
    let addr: SocketAddr = cfg
        .communication
        .bridge_addr
        .parse()
        .map_err(|e| format!("Invalid bridge address {}: {}", cfg.communication.bridge_addr, e))?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind bridge on {addr}: {e}"))?;
    info!(addr = %addr, "ws bridge listening");
    let bridge = WsBridge::new(bus.clone());
    tokio::spawn(async move {
        if let Err(e) = bridge.serve(listener).await {
            error!(error = %e, "ws bridge stopped");
        }
    });

    // ── Robot ─────────────────────────────────────────────────────────────
    let comms = Communication::new(bus.clone(), &cfg.robot_name, &cfg.communication)
        .map_err(|e| e.to_string())?;
    let command_topic = comms.topics().command();
    let (hardware, handles) = SimHardware::from_config(&cfg);
    info!(
        rangers = handles.rangers.len(),
        line_sensors = handles.line.len(),
        climate = handles.climate.is_some(),
        color = handles.color.is_some(),
        "simulated hardware ready"
    );
    let mut rover = Rover::new(&cfg, hardware, comms);
    rover.add_state_listener(Box::new(ConsoleListener));

    println!(
        "  Robot {} on {} · commands: {}",
        cfg.robot_name.bold(),
        format!("ws://{addr}").cyan(),
        command_topic.dimmed()
    );
    println!("  Press {} to stop.\n", "Ctrl-C".bold());

    // ── Shutdown flag ─────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping the robot …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; the robot can only be stopped by killing the process");
    }

    // ── Control loop ──────────────────────────────────────────────────────
    let spacing = Duration::from_millis(cfg.control_loop.tick_spacing_ms);
    let control = ControlLoop::new(rover, spacing, shutdown)
        .spawn()
        .map_err(|e| format!("Failed to spawn control thread: {e}"))?;

    let rover: Rover = tokio::task::spawn_blocking(move || control.join())
        .await
        .map_err(|e| format!("Control thread join failed: {e}"))?
        .map_err(|_| "Control thread panicked".to_string())?;

    println!(
        "  {} Robot {} after {} ticks.",
        "✓".green().bold(),
        rover.state().display_str(),
        rover.tick_count()
    );
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Console output
// ─────────────────────────────────────────────────────────────────────────────

/// Prints every state transition to the terminal.
struct ConsoleListener;

impl StateListener for ConsoleListener {
    fn on_transition(&mut self, transition: &StateTransition) {
        let label = transition.current.display_str();
        let label = match transition.current {
            OperatingState::EmergencyStopped | OperatingState::Fault => label.red().bold(),
            OperatingState::Stopped => label.yellow().bold(),
            OperatingState::Operating => label.green().bold(),
            _ => label.cyan().bold(),
        };
        println!(
            "  {} {} → {}  {}",
            transition.timestamp.format("%H:%M:%S").to_string().dimmed(),
            transition.previous.display_str().dimmed(),
            label,
            transition.reason
        );
    }
}

fn print_banner() {
    println!();
    println!("{}", r#"  _      ____           _ __        __ "#.bold().cyan());
    println!("{}", r#" | | /| / / /  ___ ___ / / /  ___  / /_"#.bold().cyan());
    println!("{}", r#" | |/ |/ / _ \/ -_) -_) / _ \/ _ \/ __/"#.bold().cyan());
    println!("{}", r#" |__/|__/_//_/\__/\__/_/_.__/\___/\__/ "#.bold().cyan());
    println!();
    println!("  {}", "Onboard controller for wheeled robots".dimmed());
    println!();
}
