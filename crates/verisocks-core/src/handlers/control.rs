//! `stop`, `finish`, `exit`, per `spec.md` §4.7.

use serde_json::Value as Json;

use crate::command::CommandError;
use crate::reply::Reply;

use super::{HandlerCtx, HandlerOutcome};

pub fn stop(ctx: &mut HandlerCtx, _cmd: &Json) -> Result<HandlerOutcome, CommandError> {
    if let Some(token) = ctx.wait.take() {
        ctx.adapter.cancel(token);
    }
    Ok(HandlerOutcome::Immediate(Reply::Ack(
        "Processing stop command - Simulation stopped/paused".to_string(),
    )))
}

pub fn finish(ctx: &mut HandlerCtx, _cmd: &Json) -> Result<HandlerOutcome, CommandError> {
    if let Some(token) = ctx.wait.take() {
        ctx.adapter.cancel(token);
    }
    ctx.adapter.request_finish();
    Ok(HandlerOutcome::Finish(Reply::Ack(
        "Processing finish command - Terminating simulation.".to_string(),
    )))
}

pub fn exit(ctx: &mut HandlerCtx, _cmd: &Json) -> Result<HandlerOutcome, CommandError> {
    if let Some(token) = ctx.wait.take() {
        ctx.adapter.cancel(token);
    }
    Ok(HandlerOutcome::Exit(Reply::Ack(
        "Processing exit command - Quitting Verisocks.".to_string(),
    )))
}
