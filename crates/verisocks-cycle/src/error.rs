//! Errors surfaced while assembling a [`crate::Driver`], before any socket
//! exists to report them over.

use thiserror::Error;

use verisocks_core::{ClockError, RegistryError};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Clock(#[from] ClockError),
}
