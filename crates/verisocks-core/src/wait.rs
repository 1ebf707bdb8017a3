//! At most one outstanding wait at a time: registration, trigger and
//! teardown, per `spec.md` §4.8 / §3 "Wait state".

use crate::adapter::{Handle, Value, WaitToken};
use crate::command::CommandError;

/// Exactly one of `None`, `Time(target)`, `ValueEq(handle, target)`,
/// `EventFired(handle)`, per `spec.md` §3.
#[derive(Debug, Clone)]
pub enum Wait {
    Time(u64),
    ValueEq { handle: Handle, target: Value },
    EventFired(Handle),
    NextEvent,
}

/// Outcome of re-checking a [`Wait`] against a freshly observed value —
/// `ValueEq` re-arms itself on mismatch rather than firing (`spec.md` §4.7
/// `run {cb:"until_change"}`).
pub enum WaitCheck {
    Satisfied,
    StillArmed,
}

struct Armed {
    wait: Wait,
    token: WaitToken,
}

/// Owns the single outstanding [`Wait`], if any.
#[derive(Default)]
pub struct WaitManager {
    armed: Option<Armed>,
}

impl WaitManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn peek(&self) -> Option<&Wait> {
        self.armed.as_ref().map(|a| &a.wait)
    }

    /// Token of the currently armed wait, if any. A cycle-driven adapter
    /// uses this to call [`WaitManager::check_value`] without having to
    /// thread the token back out of the handler that registered it.
    pub fn armed_token(&self) -> Option<WaitToken> {
        self.armed.as_ref().map(|a| a.token)
    }

    /// Registers `wait`, failing with [`CommandError::WaitConflict`] if one
    /// is already outstanding, per `spec.md` §5 "Shared-resource policy".
    pub fn register(&mut self, wait: Wait, token: WaitToken) -> Result<(), CommandError> {
        if self.armed.is_some() {
            return Err(CommandError::WaitConflict);
        }
        self.armed = Some(Armed { wait, token });
        Ok(())
    }

    /// Checks a just-observed value against an armed `ValueEq`/`EventFired`
    /// wait. Returns `None` if nothing is armed for `token`.
    pub fn check_value(&mut self, token: WaitToken, observed: &Value) -> Option<WaitCheck> {
        let armed = self.armed.as_ref()?;
        if armed.token != token {
            return None;
        }
        match &armed.wait {
            Wait::ValueEq { target, .. } => {
                if values_equal(target, observed) {
                    Some(WaitCheck::Satisfied)
                } else {
                    Some(WaitCheck::StillArmed)
                }
            }
            Wait::EventFired(_) => Some(WaitCheck::Satisfied),
            Wait::Time(_) | Wait::NextEvent => Some(WaitCheck::Satisfied),
        }
    }

    /// Tears down the current wait, returning its token for cancellation
    /// with the [`crate::SimAdapter`].
    pub fn take(&mut self) -> Option<WaitToken> {
        self.armed.take().map(|a| a.token)
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Real(x), Value::Real(y)) => x == y,
        (Value::Int(x), Value::Real(y)) | (Value::Real(y), Value::Int(x)) => *x as f64 == *y,
        (Value::Event(x), Value::Event(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        _ => false,
    }
}
