//! # Command Interpreter
//!
//! Turns operator command lines into queued reply payloads.
//!
//! | Command                         | Effect                               |
//! |---------------------------------|--------------------------------------|
//! | `ping`                          | queue `1,000.00`                     |
//! | `led1 <v>` / `set-value <v>`    | queue `2,<v mod 100>` (2 decimals)   |
//! | `clearq` / `clear-queue`        | drop every pending reply             |
//!
//! Anything else is reported to the operator and queues nothing.

use tracing::{debug, info};

use super::line::{LineAssembler, RawCommandLine};
use crate::link::protocol::OutboundPayload;
use crate::link::queue::{EnqueueOutcome, OutboundQueue};

/// Tokenized command line
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedCommand {
    pub name: String,
    /// First argument; 0.0 when absent or not numeric
    pub float_arg: f64,
    /// Second argument; 0 when absent or not numeric
    pub int_arg: i32,
}

impl ParsedCommand {
    /// Split on whitespace: name, float argument, integer argument
    pub fn parse(line: &RawCommandLine) -> Self {
        let mut tokens = line.as_str().split_ascii_whitespace();
        let mut parsed = Self::default();

        if let Some(name) = tokens.next() {
            parsed.name = name.to_string();
        }
        if let Some(token) = tokens.next() {
            parsed.float_arg = lenient_parse(token).unwrap_or(0.0);
        }
        if let Some(token) = tokens.next() {
            parsed.int_arg = lenient_parse(token).unwrap_or(0);
        }

        parsed
    }
}

/// Parse the longest numeric prefix of `token` ("12.5abc" → 12.5)
fn lenient_parse<T: std::str::FromStr>(token: &str) -> Option<T> {
    (1..=token.len())
        .rev()
        .find_map(|end| token.get(..end).and_then(|prefix| prefix.parse().ok()))
}

/// Recognised operator commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    SetValue,
    ClearQueue,
}

impl Command {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ping" => Some(Command::Ping),
            "led1" | "set-value" | "set" => Some(Command::SetValue),
            "clearq" | "clear-queue" => Some(Command::ClearQueue),
            _ => None,
        }
    }
}

/// Outcome of dispatching one command line
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Reply appended to the outbound queue
    Queued(OutboundPayload),
    /// Reply built but the queue was full
    Dropped(OutboundPayload),
    /// Queue drained; number of replies discarded
    Cleared(usize),
    /// Unrecognised command name
    Unknown(String),
    /// Blank line
    Empty,
}

impl Dispatch {
    /// Diagnostic line for the operator console
    pub fn operator_message(&self) -> Option<String> {
        match self {
            Dispatch::Queued(payload) => Some(format!("Queued: {}", payload)),
            Dispatch::Dropped(payload) => Some(format!("Queue full, dropped: {}", payload)),
            Dispatch::Cleared(count) => Some(format!("Cleared queue ({} pending dropped)", count)),
            Dispatch::Unknown(name) => Some(format!("Invalid command: {}", name)),
            Dispatch::Empty => None,
        }
    }
}

/// Owns operator line assembly and maps complete lines onto the queue
#[derive(Debug, Clone)]
pub struct CommandInterpreter {
    assembler: LineAssembler,
}

impl CommandInterpreter {
    pub fn new(assembler: LineAssembler) -> Self {
        Self { assembler }
    }

    /// Feed raw operator input; every completed line is dispatched at once
    pub fn ingest(&mut self, bytes: &[u8], queue: &mut OutboundQueue) -> Vec<Dispatch> {
        bytes
            .iter()
            .filter_map(|&b| self.assembler.push(b))
            .map(|line| Self::dispatch(&line, queue))
            .collect()
    }

    /// Interpret one complete line against the queue
    pub fn dispatch(line: &RawCommandLine, queue: &mut OutboundQueue) -> Dispatch {
        let parsed = ParsedCommand::parse(line);
        if parsed.name.is_empty() {
            return Dispatch::Empty;
        }

        debug!(
            "Operator command '{}' (float {}, int {})",
            parsed.name, parsed.float_arg, parsed.int_arg
        );

        let payload = match Command::from_name(&parsed.name) {
            Some(Command::Ping) => OutboundPayload::ping_ack(),
            Some(Command::SetValue) => OutboundPayload::set_value(parsed.float_arg),
            Some(Command::ClearQueue) => {
                let removed = queue.clear();
                info!("Outbound queue cleared ({} pending replies dropped)", removed);
                return Dispatch::Cleared(removed);
            }
            None => return Dispatch::Unknown(parsed.name),
        };

        match queue.enqueue(payload.clone()) {
            EnqueueOutcome::Queued => Dispatch::Queued(payload),
            EnqueueOutcome::Dropped => Dispatch::Dropped(payload),
        }
    }

    /// Bytes of the line currently being assembled
    pub fn pending_len(&self) -> usize {
        self.assembler.len()
    }
}
