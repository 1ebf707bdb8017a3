use thiserror::Error;

use crate::{ClockError, CodecError, CommandError, ConnectionError, RegistryError, RuntimeError};

/// Crate-wide error, composed from the leaf error kinds of each component.
///
/// Mirrors the error-kind taxonomy of `spec.md` §7: `IoError`/`FrameError`
/// live under [`CodecError`] and [`ConnectionError`], `CommandError`,
/// `WaitConflict` and `SimulatorEnd`/`FatalInit` are represented directly.
#[derive(Debug, Error)]
pub enum VerisocksError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Clock(#[from] ClockError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("exiting: end of simulation reached with a wait still pending")]
    SimulatorEnd,
    #[error("fatal initialization error: {0}")]
    FatalInit(String),
}

/// Terminal outcome of [`crate::Fsm::run`]. `Clean` maps to process exit code
/// 0, `Error` to a non-zero code, per `spec.md` §3's `EXIT`/`ERROR` states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Clean,
    Error,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        match self {
            ExitCode::Clean => 0,
            ExitCode::Error => 1,
        }
    }
}
