//! Built-in terminal commands backed by a shared robot.

use crate::{CommandDispatcher, CommandError, CommandResult};
use robot_core::{EnvironmentalFactor, Position, Requirements, ResourceKind};
use robot_sensors::{BaselineEnvironment, SensorKind};
use robot_upgrades::{Robot, SharedRobot, UpgradeCategory};
use std::fmt::Write as _;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Environment shared between the host and the command handlers.
pub type SharedEnvironment = Arc<Mutex<BaselineEnvironment>>;

/// Usage and summary of every built-in command, in help order.
pub const BUILTIN_COMMANDS: &[(&str, &str)] = &[
    ("help", "Display this help text"),
    ("status", "Check robot status"),
    ("scan", "Perform basic environmental scan"),
    ("clear", "Clear terminal history"),
    ("sensors", "List installed sensors"),
    ("read <sensor>", "Take a single sensor reading"),
    ("temperature <value>", "Set the ambient temperature"),
    ("power <0-100>", "Set the power level"),
    ("resources", "Show resource balances"),
    ("grant <resource> <amount>", "Add resources to the ledger"),
    ("upgrades [category]", "List available upgrades"),
    ("upgrade <id>", "Apply an upgrade"),
];

/// The text printed by `help`.
pub fn help_text() -> String {
    let mut out = String::from("Available commands:");
    for (usage, summary) in BUILTIN_COMMANDS {
        let _ = write!(out, "\n- {usage}: {summary}");
    }
    out
}

fn lock_env(env: &SharedEnvironment) -> MutexGuard<'_, BaselineEnvironment> {
    env.lock().unwrap_or_else(PoisonError::into_inner)
}

fn format_amounts(amounts: &Requirements) -> String {
    amounts
        .iter()
        .map(|(kind, n)| format!("{kind} {n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn status_report(robot: &Robot) -> String {
    let mut out = format!(
        "{} STATUS REPORT\n---------------------",
        robot.designation()
    );
    let _ = write!(out, "\nPower: {}%", robot.power_percent());
    let cpu = robot.processor();
    let _ = write!(
        out,
        "\nProcessor: {} IPS, {} KiB",
        cpu.instructions_per_second, cpu.memory_kb
    );
    let draw: f64 = robot.sensors().iter().map(|s| s.power_consumption()).sum();
    let _ = write!(
        out,
        "\nSensors: {} operational ({draw:.1} W)",
        robot.sensors().len()
    );
    let balances = ResourceKind::ALL
        .iter()
        .map(|&k| format!("{k} {}", robot.ledger().balance(k)))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = write!(out, "\nResources: {balances}");
    let catalog = robot.catalog();
    let affordable = catalog
        .iter()
        .filter(|(_, spec)| robot.ledger().can_afford(&spec.requirements))
        .count();
    let _ = write!(
        out,
        "\nUpgrades: {affordable} of {} affordable",
        catalog.len()
    );
    out
}

fn sensor_list(robot: &Robot) -> String {
    if robot.sensors().is_empty() {
        return "No sensors installed.".to_string();
    }
    robot
        .sensors()
        .iter()
        .map(|s| {
            format!(
                "{}: range {:.1} m, precision {:.2}, power {:.1} W",
                s.kind().label(),
                s.range(),
                s.precision(),
                s.power_consumption()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn upgrade_list(robot: &Robot, only: Option<UpgradeCategory>) -> String {
    let catalog = robot.catalog();
    let mut out = String::new();
    for category in catalog.list_categories() {
        if only.is_some_and(|c| c != category) {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = write!(out, "[{category}]");
        for spec in catalog.list_specs(category) {
            let mark = if robot.ledger().can_afford(&spec.requirements) {
                "ready"
            } else {
                "locked"
            };
            let _ = write!(
                out,
                "\n- {}: {} ({}) [{mark}]",
                spec.id,
                spec.name,
                format_amounts(&spec.requirements)
            );
            if !spec.description.is_empty() {
                let _ = write!(out, "\n    {}", spec.description);
            }
        }
    }
    if out.is_empty() {
        out.push_str("No upgrades available.");
    }
    out
}

fn one_arg<'a>(args: &[&'a str], usage: &str) -> Result<&'a str, CommandError> {
    match args {
        [value] => Ok(*value),
        _ => Err(CommandError::Usage(usage.to_string())),
    }
}

/// Register the built-in commands on `dispatcher`.
///
/// Handlers hold clones of `robot` and `env`; each acquires one lock at a time.
pub fn register_robot_commands(
    dispatcher: &mut CommandDispatcher,
    robot: SharedRobot,
    env: SharedEnvironment,
) {
    let summary = |name: &str| {
        BUILTIN_COMMANDS
            .iter()
            .find(|(usage, _)| usage.split_whitespace().next() == Some(name))
            .map(|(_, s)| *s)
            .unwrap_or("")
    };

    dispatcher.register_command_with_summary("help", summary("help"), |_: &[&str]| -> CommandResult {
        Ok(help_text())
    });

    dispatcher.register_command_with_summary("clear", summary("clear"), |_: &[&str]| -> CommandResult {
        Ok("Terminal cleared.".to_string())
    });

    let r = robot.clone();
    dispatcher.register_command_with_summary("status", summary("status"), move |_: &[&str]| -> CommandResult {
        Ok(r.with(|robot| status_report(robot)))
    });

    let r = robot.clone();
    let e = env.clone();
    dispatcher.register_command_with_summary("scan", summary("scan"), move |_: &[&str]| -> CommandResult {
        let snapshot = lock_env(&e).clone();
        let readings = r.with(|robot| robot.sensors_mut().read_all(Position::ORIGIN, &snapshot));
        let mut out = String::from("BASIC SCAN COMPLETE\n------------------");
        if readings.is_empty() {
            out.push_str("\nNo sensors installed.");
        }
        for reading in readings {
            let _ = write!(out, "\n- {}: {reading}", reading.kind.label());
        }
        Ok(out)
    });

    let r = robot.clone();
    dispatcher.register_command_with_summary("sensors", summary("sensors"), move |_: &[&str]| -> CommandResult {
        Ok(r.with(|robot| sensor_list(robot)))
    });

    let r = robot.clone();
    let e = env.clone();
    dispatcher.register_command_with_summary("read", summary("read"), move |args: &[&str]| -> CommandResult {
        let kind: SensorKind = one_arg(args, "Usage: read <sensor>")?.parse()?;
        let snapshot = lock_env(&e).clone();
        let reading = r.with(|robot| robot.read_sensor(kind, Position::ORIGIN, &snapshot))?;
        Ok(format!("{}: {reading}", kind.label()))
    });

    let e = env;
    dispatcher.register_command_with_summary(
        "temperature",
        summary("temperature"),
        move |args: &[&str]| -> CommandResult {
            let value = args
                .first()
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    CommandError::Usage(
                        "Invalid temperature value. Usage: temperature [value]".to_string(),
                    )
                })?;
            lock_env(&e).set(EnvironmentalFactor::Temperature, value);
            Ok(format!("Temperature sensor reading updated to {value}°C"))
        },
    );

    let r = robot.clone();
    dispatcher.register_command_with_summary("power", summary("power"), move |args: &[&str]| -> CommandResult {
        let usage = || CommandError::Usage("Invalid power value. Usage: power [0-100]".to_string());
        let value = args
            .first()
            .and_then(|s| s.parse::<f32>().ok())
            .ok_or_else(usage)?;
        r.with(|robot| robot.set_power_percent(value))
            .map_err(|_| usage())?;
        Ok(format!("Power level updated to {value}%"))
    });

    let r = robot.clone();
    dispatcher.register_command_with_summary(
        "resources",
        summary("resources"),
        move |_: &[&str]| -> CommandResult {
            Ok(ResourceKind::ALL
                .iter()
                .map(|&k| format!("{k}: {}", r.balance(k)))
                .collect::<Vec<_>>()
                .join("\n"))
        },
    );

    let r = robot.clone();
    dispatcher.register_command_with_summary("grant", summary("grant"), move |args: &[&str]| -> CommandResult {
        let usage = || CommandError::Usage("Usage: grant <resource> <amount>".to_string());
        let [kind, amount] = args else {
            return Err(usage());
        };
        let kind: ResourceKind = kind.parse()?;
        let amount = amount
            .parse::<u64>()
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(usage)?;
        r.grant(kind, amount);
        Ok(format!("Granted {amount} {kind} (balance {})", r.balance(kind)))
    });

    let r = robot.clone();
    dispatcher.register_command_with_summary("upgrades", summary("upgrades"), move |args: &[&str]| -> CommandResult {
        let only = match args {
            [] => None,
            [category] => Some(category.parse::<UpgradeCategory>()?),
            _ => return Err(CommandError::Usage("Usage: upgrades [category]".to_string())),
        };
        Ok(r.with(|robot| upgrade_list(robot, only)))
    });

    let r = robot;
    dispatcher.register_command_with_summary("upgrade", summary("upgrade"), move |args: &[&str]| -> CommandResult {
        let id = one_arg(args, "Usage: upgrade <id>")?;
        let applied = r.apply(id)?;
        Ok(format!(
            "Upgrade applied: {} (spent {})",
            applied.name,
            format_amounts(&applied.spent)
        ))
    });
}
