//! Protocol and control layer shared by every Verisocks simulator embedding.
//!
//! This crate treats the simulator as an abstract collaborator (the
//! [`adapter::SimAdapter`] trait): it owns message framing, command dispatch,
//! the variable/clock models and the wait/callback bookkeeping, but never
//! calls into a concrete simulator API directly.

mod adapter;
mod clocks;
mod codec;
mod command;
mod dispatch;
mod error;
mod fsm;
mod handlers;
mod net;
mod registry;
mod reply;
mod util;
mod wait;

pub(crate) use fxhash::FxHashMap as HashMap;
#[allow(unused_imports)]
pub(crate) use fxhash::FxHashSet as HashSet;

pub use adapter::{Handle, HandleKind, RuntimeError, SimAdapter, Value, WaitToken};
pub use clocks::{Clock, ClockError, ClockMap};
pub use codec::{decode_message, encode, encode_json, CodecError, ContentType, Header, Message};
pub use error::{ExitCode, VerisocksError};
pub use fsm::{Fsm, FsmState};
pub use net::{ConnectionError, ConnectionManager};
pub use registry::{Binding, Cell, Primitive, Registry, RegistryError, VarKind};
pub use reply::Reply;
pub use wait::{Wait, WaitCheck, WaitManager};

pub use command::CommandError;

/// Runs the Control FSM against a freshly-bound loopback socket until it
/// reaches `EXIT` or `ERROR`, exactly as `spec.md` §6 describes the
/// interpreter-driven embedding's `init(port[, timeout_seconds])` user-task
/// surface. Generic over [`SimAdapter`] so either embedding can drive it.
pub fn init(adapter: impl SimAdapter, port: u16, timeout_sec: Option<u32>) -> ExitCode {
    let timeout = timeout_sec.unwrap_or(120);
    let mut fsm = match Fsm::bind(adapter, port, timeout) {
        Ok(fsm) => fsm,
        Err(err) => {
            tracing::error!(%err, "failed to bind control socket");
            return ExitCode::Error;
        }
    };
    fsm.run()
}
