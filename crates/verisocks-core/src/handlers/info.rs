//! `info`, per `spec.md` §4.7.

use serde_json::Value as Json;

use crate::command::CommandError;
use crate::dispatch::require_str;
use crate::reply::Reply;

use super::{HandlerCtx, HandlerOutcome};

pub fn handle(_ctx: &mut HandlerCtx, cmd: &Json) -> Result<HandlerOutcome, CommandError> {
    let value = require_str(cmd, "value")?;
    if value.is_empty() {
        return Err(CommandError::Invalid("'value' must not be empty".into()));
    }
    tracing::info!(target: "verisocks::client", "{value}");
    Ok(HandlerOutcome::Immediate(Reply::Ack(
        "command info received".to_string(),
    )))
}
