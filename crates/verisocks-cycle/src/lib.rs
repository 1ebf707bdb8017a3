//! Cycle-driven Verisocks embedding ("Embedding B", `spec.md` §4.3): a
//! [`verisocks_core::SimAdapter`] implementation with no foreign simulator
//! behind it, suitable for unit-testing a synchronous model or for
//! standalone demos like `demos/toy-counter`.

mod adapter;
mod driver;
mod error;
mod model;

pub use adapter::CycleAdapter;
pub use driver::{Driver, DEFAULT_PORT, DEFAULT_TIMEOUT_SEC};
pub use error::DriverError;
pub use model::CycleModel;
