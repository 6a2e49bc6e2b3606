#![deny(warnings)]

//! Text command dispatch for the robot terminal.
//!
//! The host feeds one raw line per user action into
//! [`CommandDispatcher::execute`] and displays the returned string. Handler
//! failures and unknown commands come back as plain text; nothing here
//! returns an error to the host.

use robot_core::ParseTagError;
use robot_sensors::SensorError;
use robot_upgrades::UpgradeError;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::debug;

mod robot_commands;

pub use robot_commands::{help_text, register_robot_commands, SharedEnvironment, BUILTIN_COMMANDS};

/// Failure reported by a command handler.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum CommandError {
    /// Bad or missing arguments; the message carries usage text.
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Upgrade(#[from] UpgradeError),
    #[error(transparent)]
    Sensor(#[from] SensorError),
    #[error(transparent)]
    Parse(#[from] ParseTagError),
}

pub type CommandResult = Result<String, CommandError>;

/// A registered command implementation.
pub trait CommandHandler: Send {
    fn handle(&mut self, args: &[&str]) -> CommandResult;
}

impl<F> CommandHandler for F
where
    F: FnMut(&[&str]) -> CommandResult + Send,
{
    fn handle(&mut self, args: &[&str]) -> CommandResult {
        self(args)
    }
}

/// Whether a handler is currently running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Dispatching,
}

struct Registered {
    summary: Option<String>,
    handler: Box<dyn CommandHandler>,
}

/// Maps lowercase command names to handlers.
pub struct CommandDispatcher {
    handlers: HashMap<String, Registered>,
    state: DispatchState,
}

impl fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("CommandDispatcher")
            .field("commands", &names)
            .field("state", &self.state)
            .finish()
    }
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
            state: DispatchState::Idle,
        }
    }
}

/// Reply for a command token with no handler.
pub fn unknown_command(token: &str) -> String {
    format!("Unknown command: {token}\nType 'help' for available commands.")
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name` (case-insensitive). An existing handler
    /// with the same name is replaced.
    pub fn register_command<H>(&mut self, name: &str, handler: H)
    where
        H: CommandHandler + 'static,
    {
        self.insert(name, None, Box::new(handler));
    }

    /// Like [`register_command`](Self::register_command) with a one-line summary.
    pub fn register_command_with_summary<H>(&mut self, name: &str, summary: &str, handler: H)
    where
        H: CommandHandler + 'static,
    {
        self.insert(name, Some(summary.to_string()), Box::new(handler));
    }

    fn insert(&mut self, name: &str, summary: Option<String>, handler: Box<dyn CommandHandler>) {
        let key = normalize(name);
        if self.handlers.contains_key(&key) {
            debug!(command = %key, "overwriting command handler");
        }
        self.handlers.insert(key, Registered { summary, handler });
    }

    /// Remove a command. Returns whether it was registered.
    pub fn unregister_command(&mut self, name: &str) -> bool {
        self.handlers.remove(&normalize(name)).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(&normalize(name))
    }

    /// Registered names with their summaries, sorted by name.
    pub fn commands(&self) -> Vec<(&str, Option<&str>)> {
        let mut out: Vec<(&str, Option<&str>)> = self
            .handlers
            .iter()
            .map(|(name, r)| (name.as_str(), r.summary.as_deref()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Parse and run one raw input line.
    ///
    /// Returns `None` for blank input. Otherwise the first whitespace-separated
    /// token selects the handler and the rest are its arguments.
    pub fn execute(&mut self, raw_line: &str) -> Option<String> {
        let line = raw_line.trim();
        let mut parts = line.split_whitespace();
        let token = parts.next()?;
        let args: Vec<&str> = parts.collect();

        let Some(entry) = self.handlers.get_mut(&token.to_lowercase()) else {
            debug!(command = token, "unknown command");
            return Some(unknown_command(token));
        };

        debug!(command = token, args = args.len(), "dispatching");
        self.state = DispatchState::Dispatching;
        let result = entry.handler.handle(&args);
        self.state = DispatchState::Idle;

        Some(match result {
            Ok(response) => response,
            Err(e) => {
                debug!(command = token, error = %e, "command failed");
                format!("Error: {e}")
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dispatcher() -> CommandDispatcher {
        let mut d = CommandDispatcher::new();
        d.register_command("help", |_: &[&str]| -> CommandResult { Ok("HELP TEXT".into()) });
        d.register_command("echo", |args: &[&str]| -> CommandResult { Ok(args.join(",")) });
        d.register_command("fail", |_: &[&str]| -> CommandResult {
            Err(CommandError::Usage("Usage: fail".into()))
        });
        d
    }

    #[test]
    fn blank_input_is_a_no_op() {
        let mut d = dispatcher();
        assert_eq!(d.execute(""), None);
        assert_eq!(d.execute("   \t  "), None);
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut d = dispatcher();
        assert_eq!(d.execute("HELP").as_deref(), Some("HELP TEXT"));
        assert_eq!(d.execute("  Help  ").as_deref(), Some("HELP TEXT"));
    }

    #[test]
    fn unknown_command_keeps_original_token() {
        let mut d = dispatcher();
        let out = d.execute("FrobNicate now").unwrap();
        assert!(out.contains("FrobNicate"));
        assert!(out.contains("help"));
        let out = d.execute("frobnicate").unwrap();
        assert!(out.contains("frobnicate"));
    }

    #[test]
    fn arguments_are_whitespace_split() {
        let mut d = dispatcher();
        assert_eq!(d.execute("echo  a   b\tc ").as_deref(), Some("a,b,c"));
        assert_eq!(d.execute("echo").as_deref(), Some(""));
    }

    #[test]
    fn handler_failure_becomes_text() {
        let mut d = dispatcher();
        assert_eq!(d.execute("fail").as_deref(), Some("Error: Usage: fail"));
        assert_eq!(d.state(), DispatchState::Idle);
    }

    #[test]
    fn re_registration_overwrites() {
        let mut d = dispatcher();
        d.register_command("HELP", |_: &[&str]| -> CommandResult { Ok("new help".into()) });
        assert_eq!(d.execute("help").as_deref(), Some("new help"));
        assert_eq!(d.commands().len(), 3);
    }

    #[test]
    fn handlers_may_keep_state() {
        struct Counter(u32);
        impl CommandHandler for Counter {
            fn handle(&mut self, _args: &[&str]) -> CommandResult {
                self.0 += 1;
                Ok(self.0.to_string())
            }
        }
        let mut d = CommandDispatcher::new();
        d.register_command("tick", Counter(0));
        d.execute("tick");
        assert_eq!(d.execute("tick").as_deref(), Some("2"));
    }

    #[test]
    fn unregister_and_summaries() {
        let mut d = dispatcher();
        d.register_command_with_summary("Ping", "Reply with pong", |_: &[&str]| -> CommandResult {
            Ok("pong".into())
        });
        assert!(d.contains("PING"));
        let cmds = d.commands();
        assert_eq!(cmds[3], ("ping", Some("Reply with pong")));
        assert!(d.unregister_command("ping"));
        assert!(!d.unregister_command("ping"));
        assert!(d.execute("ping").unwrap().starts_with("Unknown command: ping"));
    }

    proptest! {
        #[test]
        fn whitespace_only_never_dispatches(s in "[ \t\r\n]{0,16}") {
            let mut d = dispatcher();
            prop_assert_eq!(d.execute(&s), None);
        }

        #[test]
        fn unknown_tokens_are_echoed(token in "[a-zA-Z][a-zA-Z0-9_]{0,12}") {
            prop_assume!(!["help", "echo", "fail"].contains(&token.to_lowercase().as_str()));
            let mut d = dispatcher();
            let out = d.execute(&token).unwrap();
            prop_assert!(out.contains(&token));
        }
    }
}
