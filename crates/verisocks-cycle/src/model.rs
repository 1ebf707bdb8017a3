//! The user-supplied behavioral model a [`crate::Driver`] steps forward.

use verisocks_core::{ClockMap, Registry};

/// Evaluated once per event the [`crate::CycleAdapter`] processes: a clock
/// edge, or a value written through `set`. Implementors read and write
/// their registered bindings through `registry`; `clocks` is exposed
/// read-only so a model can branch on edge phase without re-deriving it
/// from the registry's mirrored clock output cell.
pub trait CycleModel {
    fn eval(&mut self, registry: &mut Registry, clocks: &ClockMap);
}
