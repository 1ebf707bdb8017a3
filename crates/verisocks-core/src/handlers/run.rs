//! `run {cb: for_time | until_time | until_change | to_next}`, per
//! `spec.md` §4.7.
//!
//! Every sub-command checks [`crate::WaitManager::is_armed`] *before*
//! calling any `adapter.schedule_*`, so a `WaitConflict` never leaves a
//! dangling scheduled callback behind (`spec.md` §5 "Shared-resource
//! policy").

use serde_json::Value as Json;

use crate::adapter::HandleKind;
use crate::command::CommandError;
use crate::dispatch::{require_f64, require_str};
use crate::util::time::to_ticks;
use crate::wait::Wait;

use super::{json_to_value, FireReply, HandlerCtx, HandlerOutcome};

pub fn handle(ctx: &mut HandlerCtx, cmd: &Json) -> Result<HandlerOutcome, CommandError> {
    let cb = require_str(cmd, "cb")?;
    match cb {
        "for_time" => for_time(ctx, cmd),
        "until_time" => until_time(ctx, cmd),
        "until_change" => until_change(ctx, cmd),
        "to_next" => to_next(ctx),
        other => Err(CommandError::UnknownVariant {
            field: "cb",
            value: other.to_string(),
        }),
    }
}

fn for_time(ctx: &mut HandlerCtx, cmd: &Json) -> Result<HandlerOutcome, CommandError> {
    if ctx.wait.is_armed() {
        return Err(CommandError::WaitConflict);
    }
    let time = require_f64(cmd, "time")?;
    if time <= 0.0 {
        return Err(CommandError::Invalid("'time' must be > 0".into()));
    }
    let unit = require_str(cmd, "time_unit")?;
    let dt = to_ticks(time, unit, ctx.adapter.precision_exp10())?;
    let token = ctx.next_token();
    ctx.wait.register(Wait::Time(ctx.adapter.now_ticks() + dt), token)?;
    ctx.adapter.schedule_after_delay(dt, token);
    Ok(HandlerOutcome::Armed(FireReply::ForTime))
}

fn until_time(ctx: &mut HandlerCtx, cmd: &Json) -> Result<HandlerOutcome, CommandError> {
    if ctx.wait.is_armed() {
        return Err(CommandError::WaitConflict);
    }
    let time = require_f64(cmd, "time")?;
    let unit = require_str(cmd, "time_unit")?;
    let target = to_ticks(time, unit, ctx.adapter.precision_exp10())?;
    let now = ctx.adapter.now_ticks();
    if target <= now {
        return Err(CommandError::Invalid(format!(
            "target time {target} must be strictly greater than now ({now})"
        )));
    }
    let token = ctx.next_token();
    ctx.wait.register(Wait::Time(target), token)?;
    ctx.adapter.schedule_at_time(target, token);
    Ok(HandlerOutcome::Armed(FireReply::UntilTime))
}

fn until_change(ctx: &mut HandlerCtx, cmd: &Json) -> Result<HandlerOutcome, CommandError> {
    if ctx.wait.is_armed() {
        return Err(CommandError::WaitConflict);
    }
    let path = require_str(cmd, "path")?;
    let handle = ctx
        .adapter
        .resolve_path(path)
        .ok_or_else(|| CommandError::Invalid(format!("unknown path '{path}'")))?;
    let token = ctx.next_token();

    // Named-event paths ignore `value`: the first fire satisfies, per
    // `spec.md` §4.7. Everything else compares the new value against the
    // required `value` field with format-appropriate equality.
    if ctx.adapter.handle_kind(handle) == HandleKind::NamedEvent {
        ctx.wait.register(Wait::EventFired(handle), token)?;
    } else {
        let raw = cmd.get("value").ok_or(CommandError::MissingField("value"))?;
        let target = json_to_value(raw).ok_or(CommandError::WrongType {
            field: "value",
            expected: "number, string or bool",
        })?;
        ctx.wait.register(Wait::ValueEq { handle, target }, token)?;
    }
    ctx.adapter.schedule_value_change(handle, token);
    Ok(HandlerOutcome::Armed(FireReply::UntilChange))
}

fn to_next(ctx: &mut HandlerCtx) -> Result<HandlerOutcome, CommandError> {
    if ctx.wait.is_armed() {
        return Err(CommandError::WaitConflict);
    }
    let token = ctx.next_token();
    ctx.wait.register(Wait::NextEvent, token)?;
    ctx.adapter.schedule_next_event(token);
    Ok(HandlerOutcome::Armed(FireReply::ToNext))
}
