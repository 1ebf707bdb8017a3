//! Shared command-parsing error kind. `spec.md` §7 groups "missing command,
//! unknown command, malformed arguments, out-of-range" and the wait-conflict
//! case under one `CommandError` response discipline: reply `error`, stay in
//! `WAITING`.

use thiserror::Error;

use crate::adapter::RuntimeError;
use crate::registry::RegistryError;
use crate::ClockError;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    #[error("field '{field}' has the wrong type (expected {expected})")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("Could not find handler for command. Discarding.")]
    UnknownCommand,
    #[error("unknown {field} '{value}'")]
    UnknownVariant { field: &'static str, value: String },
    #[error("another callback is already registered")]
    WaitConflict,
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Clock(#[from] ClockError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("{0}")]
    Invalid(String),
}
