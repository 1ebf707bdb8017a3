//! `set {path, value}`, per `spec.md` §4.7: scalar and array writes, with
//! array writes zipping `value` against the cell list so a shorter list
//! leaves the tail untouched and a longer one has its surplus ignored.

use serde_json::Value as Json;

use crate::adapter::HandleKind;
use crate::command::CommandError;
use crate::dispatch::require_str;
use crate::reply::Reply;
use crate::util::range::parse_path;

use super::{json_to_value, HandlerCtx, HandlerOutcome};

pub fn handle(ctx: &mut HandlerCtx, cmd: &Json) -> Result<HandlerOutcome, CommandError> {
    let path = require_str(cmd, "path")?;
    let (name, raw_sel) = parse_path(path)?;
    let handle = ctx
        .adapter
        .resolve_path(name)
        .ok_or_else(|| CommandError::Invalid(format!("unknown path '{name}'")))?;
    let kind = ctx.adapter.handle_kind(handle);

    if kind == HandleKind::Parameter {
        return Err(CommandError::Invalid(format!(
            "'{name}' is a parameter and cannot be written at runtime"
        )));
    }

    match raw_sel {
        None if kind == HandleKind::Memory => {
            let values = cmd
                .get("value")
                .and_then(Json::as_array)
                .ok_or(CommandError::WrongType {
                    field: "value",
                    expected: "array",
                })?;
            let depth = ctx.adapter.memory_depth(handle);
            for i in 0..depth.min(values.len()) {
                let v = json_to_value(&values[i])
                    .ok_or(CommandError::WrongType {
                        field: "value",
                        expected: "number, string or bool",
                    })?;
                let word = ctx.adapter.memory_word(handle, i).expect("in-range index");
                ctx.adapter.write_value(word, v)?;
            }
            Ok(HandlerOutcome::Immediate(Reply::Ack(
                "command set received".to_string(),
            )))
        }
        None => {
            // `value` defaults to 0 when omitted, per `spec.md` §4.7.
            let v = match cmd.get("value") {
                Some(raw) => json_to_value(raw).ok_or(CommandError::WrongType {
                    field: "value",
                    expected: "number, string or bool",
                })?,
                None => crate::adapter::Value::Real(0.0),
            };
            ctx.adapter.write_value(handle, v)?;
            Ok(HandlerOutcome::Immediate(Reply::Ack(
                "command set received".to_string(),
            )))
        }
        Some(raw) => {
            if kind != HandleKind::Memory {
                return Err(CommandError::Invalid(format!(
                    "'{name}' is not an array; cannot apply a range selector"
                )));
            }
            let depth = ctx.adapter.memory_depth(handle);
            let sel = raw.resolve(depth)?;
            let indices = match sel {
                crate::util::range::RangeSel::Single(i) => vec![i],
                crate::util::range::RangeSel::Range(is) => is,
            };
            let value = cmd.get("value").ok_or(CommandError::MissingField("value"))?;
            let values: Vec<&Json> = if indices.len() == 1 {
                vec![value]
            } else {
                value
                    .as_array()
                    .ok_or(CommandError::WrongType {
                        field: "value",
                        expected: "array",
                    })?
                    .iter()
                    .collect()
            };
            for (i, v) in indices.iter().zip(values.iter()) {
                let val = json_to_value(v).ok_or(CommandError::WrongType {
                    field: "value",
                    expected: "number, string or bool",
                })?;
                let word = ctx.adapter.memory_word(handle, *i).expect("in-range index");
                ctx.adapter.write_value(word, val)?;
            }
            Ok(HandlerOutcome::Immediate(Reply::Ack(
                "command set received".to_string(),
            )))
        }
    }
}
