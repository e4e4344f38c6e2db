//! # Command Module
//!
//! Operator command handling.
//!
//! This module handles:
//! - Assembling command lines from a byte stream (bounded, truncating)
//! - Tokenizing lines into a command name and numeric arguments
//! - Mapping commands onto the outbound reply queue

pub mod interpreter;
pub mod line;

pub use interpreter::{Command, CommandInterpreter, Dispatch, ParsedCommand};
pub use line::{LineAssembler, RawCommandLine};
