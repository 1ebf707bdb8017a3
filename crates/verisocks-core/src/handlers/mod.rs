//! One module per verb (`spec.md` §4.7), each exposing a `handle` (or, for
//! `run`'s sub-commands, per-`cb` functions invoked from `dispatch`).

pub mod control;
pub mod get;
pub mod info;
pub mod run;
pub mod set;

use serde_json::Value as Json;

use crate::adapter::WaitToken;
use crate::reply::Reply;
use crate::wait::WaitManager;
use crate::SimAdapter;

/// Everything a handler needs: the simulator collaborator and the single
/// outstanding wait slot. Handlers never see the socket, the FSM state, or
/// (for Embedding B) the Variable Registry/Clock Engine directly — those
/// are internal to whichever [`SimAdapter`] implementation is in play,
/// matching `spec.md` §4.3's "the core never calls simulator-specific APIs
/// directly".
pub struct HandlerCtx<'a> {
    pub adapter: &'a mut dyn SimAdapter,
    pub wait: &'a mut WaitManager,
    token_seq: &'a mut u64,
}

impl<'a> HandlerCtx<'a> {
    pub fn new(adapter: &'a mut dyn SimAdapter, wait: &'a mut WaitManager, token_seq: &'a mut u64) -> Self {
        Self {
            adapter,
            wait,
            token_seq,
        }
    }

    pub fn next_token(&mut self) -> WaitToken {
        *self.token_seq += 1;
        WaitToken(*self.token_seq)
    }
}

/// What the Control FSM should do after a handler returns, per the PROCESSING
/// row of `spec.md` §4.6's transition table.
#[derive(Debug)]
pub enum HandlerOutcome {
    /// Send `Reply` now; return to `WAITING`.
    Immediate(Reply),
    /// A wait was registered with [`crate::WaitManager`]; transition to
    /// `SIM_RUNNING`. `FireReply` says how to build the ack once it fires.
    Armed(FireReply),
    /// `finish`: send `Reply` now, then drain to `SIM_FINISH` → `EXIT`.
    Finish(Reply),
    /// `exit`: send `Reply` now, then drain remaining events → `EXIT`.
    Exit(Reply),
}

/// How to phrase the ack once an armed [`crate::Wait`] is satisfied, per
/// `spec.md` §4.7's "Reached callback …" replies.
#[derive(Debug, Clone, Copy)]
pub enum FireReply {
    ForTime,
    UntilTime,
    UntilChange,
    ToNext,
}

impl FireReply {
    pub fn ack(self) -> Reply {
        let label = match self {
            FireReply::ForTime => "for_time",
            FireReply::UntilTime => "until_time",
            FireReply::UntilChange => "until_change",
            FireReply::ToNext => "to_next",
        };
        Reply::Ack(format!("Reached callback '{label}'"))
    }
}

pub(crate) fn json_to_value(v: &Json) -> Option<crate::adapter::Value> {
    match v {
        Json::Number(n) => n.as_f64().map(crate::adapter::Value::Real),
        Json::String(s) => Some(crate::adapter::Value::Str(s.clone())),
        Json::Bool(b) => Some(crate::adapter::Value::Event(*b)),
        _ => None,
    }
}
