#![deny(warnings)]

//! Headless line-oriented terminal for the Seed robot.
//!
//! Reads one command per line from stdin (or from `--exec` arguments) and
//! prints each response to stdout. Logs go to stderr.

use anyhow::{Context, Result};
use robot_config::RobotConfig;
use robot_console::{register_robot_commands, CommandDispatcher, CommandResult, SharedEnvironment};
use robot_sensors::BaselineEnvironment;
use robot_upgrades::SharedRobot;
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<String>,
    seed: Option<u64>,
    exec: Vec<String>,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next(),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--exec" => args.exec.extend(it.next()),
            _ => {}
        }
    }
    args
}

fn version_text() -> String {
    format!(
        "seed-terminal {} (git {}, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_SHA"),
        env!("BUILD_DATE")
    )
}

fn build_console(cfg: &RobotConfig) -> Result<CommandDispatcher> {
    let robot = SharedRobot::new(cfg.build_robot()?);
    let env: SharedEnvironment = Arc::new(Mutex::new(BaselineEnvironment::default()));
    let mut dispatcher = CommandDispatcher::new();
    register_robot_commands(&mut dispatcher, robot, env);
    dispatcher.register_command_with_summary(
        "version",
        "Show build information",
        |_: &[&str]| -> CommandResult { Ok(version_text()) },
    );
    Ok(dispatcher)
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = parse_args();
    info!(config = ?args.config, seed = ?args.seed, "starting terminal");

    let mut cfg = match &args.config {
        Some(path) => RobotConfig::load(path).with_context(|| format!("loading {path}"))?,
        None => RobotConfig::default(),
    };
    if let Some(seed) = args.seed {
        cfg = cfg.with_seed(seed);
    }
    let mut console = build_console(&cfg)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if !args.exec.is_empty() {
        for line in &args.exec {
            if let Some(response) = console.execute(line) {
                writeln!(out, "{response}")?;
            }
        }
        return Ok(());
    }

    writeln!(
        out,
        "{} terminal ready. Type 'help' for available commands, 'exit' to quit.",
        cfg.designation
    )?;
    write!(out, "> ")?;
    out.flush()?;
    for line in io::stdin().lock().lines() {
        let line = line?;
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }
        if let Some(response) = console.execute(&line) {
            writeln!(out, "{response}")?;
        }
        write!(out, "> ")?;
        out.flush()?;
    }
    Ok(())
}
