//! `get {sel: sim_info | sim_time | value | type}`, per `spec.md` §4.7.

use serde_json::{json, Value as Json};

use crate::adapter::{HandleKind, Value};
use crate::command::CommandError;
use crate::dispatch::require_str;
use crate::reply::Reply;
use crate::util::range::{parse_path, RangeSel};
use crate::util::time::{ticks_to_seconds, unit_for_exponent};

use super::{HandlerCtx, HandlerOutcome};

pub fn handle(ctx: &mut HandlerCtx, cmd: &Json) -> Result<HandlerOutcome, CommandError> {
    let sel = require_str(cmd, "sel")?;
    match sel {
        "sim_info" => sim_info(ctx),
        "sim_time" => sim_time(ctx),
        "value" => value(ctx, cmd),
        "type" => type_(ctx, cmd),
        other => Err(CommandError::UnknownVariant {
            field: "sel",
            value: other.to_string(),
        }),
    }
}

fn sim_info(ctx: &mut HandlerCtx) -> Result<HandlerOutcome, CommandError> {
    let exp = ctx.adapter.precision_exp10();
    let unit = unit_for_exponent(exp);
    Ok(HandlerOutcome::Immediate(Reply::Result(json!({
        "product": "verisocks-rs",
        "version": env!("CARGO_PKG_VERSION"),
        "model_name": ctx.adapter.model_name(),
        "model_hier_name": ctx.adapter.model_hier_name(),
        "time_unit": unit,
        "time_precision": format!("1{unit}"),
    }))))
}

fn sim_time(ctx: &mut HandlerCtx) -> Result<HandlerOutcome, CommandError> {
    let seconds = ticks_to_seconds(ctx.adapter.now_ticks(), ctx.adapter.precision_exp10());
    Ok(HandlerOutcome::Immediate(Reply::Result(json!({
        "time": seconds,
    }))))
}

fn value_to_json(v: &Value) -> Json {
    match v {
        Value::Int(i) => json!(*i as f64),
        Value::Real(r) => json!(r),
        Value::Event(b) => json!(if *b { 1 } else { 0 }),
        Value::Str(s) => json!(s),
    }
}

fn value(ctx: &mut HandlerCtx, cmd: &Json) -> Result<HandlerOutcome, CommandError> {
    let path = require_str(cmd, "path")?;
    let (name, raw_sel) = parse_path(path)?;
    let handle = ctx
        .adapter
        .resolve_path(name)
        .ok_or_else(|| CommandError::Invalid(format!("unknown path '{name}'")))?;
    let kind = ctx.adapter.handle_kind(handle);

    match raw_sel {
        None => match kind {
            HandleKind::Memory => {
                let depth = ctx.adapter.memory_depth(handle);
                let values: Vec<Json> = (0..depth)
                    .map(|i| {
                        let word = ctx.adapter.memory_word(handle, i).expect("in-range index");
                        value_to_json(&ctx.adapter.read_value(word))
                    })
                    .collect();
                Ok(HandlerOutcome::Immediate(Reply::Result(
                    json!({ "value": values }),
                )))
            }
            _ => {
                let v = ctx.adapter.read_value(handle);
                Ok(HandlerOutcome::Immediate(Reply::Result(
                    json!({ "value": value_to_json(&v) }),
                )))
            }
        },
        Some(raw) => {
            if kind != HandleKind::Memory {
                return Err(CommandError::Invalid(format!(
                    "'{name}' is not an array; cannot apply a range selector"
                )));
            }
            let depth = ctx.adapter.memory_depth(handle);
            let sel = raw.resolve(depth)?;
            match sel {
                RangeSel::Single(i) => {
                    let word = ctx.adapter.memory_word(handle, i).expect("in-range index");
                    let v = ctx.adapter.read_value(word);
                    Ok(HandlerOutcome::Immediate(Reply::Result(
                        json!({ "value": value_to_json(&v) }),
                    )))
                }
                RangeSel::Range(indices) => {
                    let values: Vec<Json> = indices
                        .into_iter()
                        .map(|i| {
                            let word = ctx.adapter.memory_word(handle, i).expect("in-range index");
                            value_to_json(&ctx.adapter.read_value(word))
                        })
                        .collect();
                    Ok(HandlerOutcome::Immediate(Reply::Result(
                        json!({ "value": values }),
                    )))
                }
            }
        }
    }
}

/// Numeric type-code rendering of the underlying handle kind, per
/// `spec.md` §4.7: "Embedding-agnostic callers typically don't use this".
fn type_(ctx: &mut HandlerCtx, cmd: &Json) -> Result<HandlerOutcome, CommandError> {
    let path = require_str(cmd, "path")?;
    let (name, _) = parse_path(path)?;
    let handle = ctx
        .adapter
        .resolve_path(name)
        .ok_or_else(|| CommandError::Invalid(format!("unknown path '{name}'")))?;
    let code = match ctx.adapter.handle_kind(handle) {
        HandleKind::Scalar => 0,
        HandleKind::Memory => 1,
        HandleKind::NamedEvent => 2,
        HandleKind::Parameter => 3,
    };
    Ok(HandlerOutcome::Immediate(Reply::Result(json!({
        "value": code,
    }))))
}
