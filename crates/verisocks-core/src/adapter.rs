//! The narrow interface the core consumes from a concrete simulator
//! integration, per `spec.md` §4.3. Neither embedding's simulator-specific
//! code lives in this crate; only the contract does.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("handle does not resolve to a writable cell")]
    NotWritable,
    #[error("value {0:?} is not representable for this cell's primitive kind")]
    TypeMismatch(Value),
    #[error("memory index {index} out of range (depth {depth})")]
    IndexOutOfRange { index: usize, depth: usize },
}

/// An opaque, pre-resolved reference to a simulator-owned cell.
///
/// Mirrors `celox::SignalRef`'s design: a single resolve-by-name lookup
/// produces a `Copy` handle that every later access reuses, rather than
/// re-hashing the name on every `get`/`set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(pub u64);

/// A one-shot wait registration identifier threaded through
/// [`SimAdapter::schedule_after_delay`] and friends back to
/// [`crate::WaitManager::resume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WaitToken(pub u64);

/// The transport-neutral value type moved between the wire, the registry and
/// the simulator. `spec.md` §4.3 lists `Int(i32) | Real(f64) | Event(bool) |
/// String`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Real(f64),
    Event(bool),
    Str(String),
}

impl Value {
    /// Widens any numeric value to `f64` for JSON transport, per `spec.md`
    /// §4.4 ("Reading a scalar ... widening to f64 for transport").
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            Value::Event(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Str(_) => None,
        }
    }
}

/// Underlying simulator handle classification, surfaced verbatim by
/// `get {sel:"type"}` (`spec.md` §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Scalar,
    Memory,
    NamedEvent,
    Parameter,
}

/// The simulator-agnostic interface the Control FSM drives.
///
/// Embedding A wraps a foreign interpreter's VPI-like procedural interface;
/// Embedding B (`verisocks-cycle`) implements this directly over an owned
/// event queue (`spec.md` §4.3).
pub trait SimAdapter {
    fn resolve_path(&self, path: &str) -> Option<Handle>;
    fn read_value(&self, h: Handle) -> Value;
    fn write_value(&mut self, h: Handle, v: Value) -> Result<(), RuntimeError>;
    fn handle_kind(&self, h: Handle) -> HandleKind;
    fn memory_depth(&self, h: Handle) -> usize;
    fn memory_word(&self, h: Handle, i: usize) -> Option<Handle>;

    fn now_ticks(&self) -> u64;
    /// Base-10 exponent of one simulator tick in seconds, e.g. `-9` for ns.
    fn precision_exp10(&self) -> i16;

    /// Display name of the elaborated top-level model, for `get
    /// {sel:"sim_info"}` (`spec.md` §4.7).
    fn model_name(&self) -> String;
    /// Fully hierarchical instance path of the top-level model.
    fn model_hier_name(&self) -> String;

    fn schedule_after_delay(&mut self, dt_ticks: u64, token: WaitToken);
    fn schedule_at_time(&mut self, t_ticks: u64, token: WaitToken);
    fn schedule_value_change(&mut self, h: Handle, token: WaitToken);
    fn schedule_next_event(&mut self, token: WaitToken);
    fn cancel(&mut self, token: WaitToken);

    fn got_finish(&self) -> bool;
    fn request_finish(&mut self);

    /// Advances the simulator to the next scheduled event, firing any
    /// callbacks that come due. Returns `false` when the event queue is
    /// empty and no wait remains outstanding (the Embedding-B main loop
    /// uses this to detect `SIM_FINISH`, `spec.md` §4.6).
    fn step(&mut self, wait: &mut crate::WaitManager) -> bool;
}
