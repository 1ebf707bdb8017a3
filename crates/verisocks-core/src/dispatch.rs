//! Command name → handler table, then sub-command key for hierarchical
//! commands (`get`, `run`), per `spec.md` §4.6 and the closed command/
//! sub-command sets of §6.

use serde_json::Value as Json;

use crate::command::CommandError;
use crate::handlers::{self, HandlerCtx, HandlerOutcome};

/// Looks up `cmd["command"]` and routes to the matching handler module. The
/// closed set is `{info, get, set, run, stop, finish, exit}` (`spec.md`
/// §6); anything else yields [`CommandError::UnknownCommand`], which the
/// FSM turns into the exact reply text `spec.md` §4.7 specifies.
pub fn dispatch(ctx: &mut HandlerCtx, cmd: &Json) -> Result<HandlerOutcome, CommandError> {
    let command = cmd
        .get("command")
        .and_then(Json::as_str)
        .ok_or(CommandError::MissingField("command"))?;

    match command {
        "info" => handlers::info::handle(ctx, cmd),
        "get" => handlers::get::handle(ctx, cmd),
        "set" => handlers::set::handle(ctx, cmd),
        "run" => handlers::run::handle(ctx, cmd),
        "stop" => handlers::control::stop(ctx, cmd),
        "finish" => handlers::control::finish(ctx, cmd),
        "exit" => handlers::control::exit(ctx, cmd),
        _ => Err(CommandError::UnknownCommand),
    }
}

pub(crate) fn require_str<'a>(cmd: &'a Json, field: &'static str) -> Result<&'a str, CommandError> {
    cmd.get(field)
        .and_then(Json::as_str)
        .ok_or(CommandError::MissingField(field))
}

pub(crate) fn require_f64(cmd: &Json, field: &'static str) -> Result<f64, CommandError> {
    cmd.get(field)
        .and_then(Json::as_f64)
        .ok_or(CommandError::MissingField(field))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;
    use test_case::test_case;

    use crate::adapter::{Handle, HandleKind, RuntimeError, SimAdapter, Value, WaitToken};
    use crate::handlers::{HandlerCtx, HandlerOutcome};
    use crate::reply::Reply;
    use crate::wait::WaitManager;

    use super::dispatch;

    /// Minimal [`SimAdapter`] for exercising command dispatch without a real
    /// simulator or socket: every binding is a flat table of handles, no
    /// `step`/event model behind it.
    #[derive(Default)]
    struct FakeAdapter {
        next: u64,
        names: HashMap<String, Handle>,
        kinds: HashMap<u64, HandleKind>,
        scalars: HashMap<u64, Value>,
        arrays: HashMap<u64, Vec<Handle>>,
        now: u64,
        scheduled: Vec<WaitToken>,
        finish: bool,
    }

    impl FakeAdapter {
        fn add_scalar(&mut self, name: &str, kind: HandleKind, value: Value) -> Handle {
            let h = Handle(self.next);
            self.next += 1;
            self.names.insert(name.to_string(), h);
            self.kinds.insert(h.0, kind);
            self.scalars.insert(h.0, value);
            h
        }

        fn add_array(&mut self, name: &str, values: Vec<Value>) -> Handle {
            let base = Handle(self.next);
            self.next += 1;
            self.names.insert(name.to_string(), base);
            self.kinds.insert(base.0, HandleKind::Memory);
            let mut elems = Vec::new();
            for v in values {
                let h = Handle(self.next);
                self.next += 1;
                self.kinds.insert(h.0, HandleKind::Scalar);
                self.scalars.insert(h.0, v);
                elems.push(h);
            }
            self.arrays.insert(base.0, elems);
            base
        }
    }

    impl SimAdapter for FakeAdapter {
        fn resolve_path(&self, path: &str) -> Option<Handle> {
            self.names.get(path).copied()
        }

        fn read_value(&self, h: Handle) -> Value {
            self.scalars.get(&h.0).cloned().expect("handle has no value")
        }

        fn write_value(&mut self, h: Handle, v: Value) -> Result<(), RuntimeError> {
            self.scalars.insert(h.0, v);
            Ok(())
        }

        fn handle_kind(&self, h: Handle) -> HandleKind {
            self.kinds[&h.0]
        }

        fn memory_depth(&self, h: Handle) -> usize {
            self.arrays.get(&h.0).map_or(0, Vec::len)
        }

        fn memory_word(&self, h: Handle, i: usize) -> Option<Handle> {
            self.arrays.get(&h.0)?.get(i).copied()
        }

        fn now_ticks(&self) -> u64 {
            self.now
        }

        fn precision_exp10(&self) -> i16 {
            -9
        }

        fn model_name(&self) -> String {
            "fake".to_string()
        }

        fn model_hier_name(&self) -> String {
            "tb.fake".to_string()
        }

        fn schedule_after_delay(&mut self, _dt_ticks: u64, token: WaitToken) {
            self.scheduled.push(token);
        }

        fn schedule_at_time(&mut self, _t_ticks: u64, token: WaitToken) {
            self.scheduled.push(token);
        }

        fn schedule_value_change(&mut self, _h: Handle, token: WaitToken) {
            self.scheduled.push(token);
        }

        fn schedule_next_event(&mut self, token: WaitToken) {
            self.scheduled.push(token);
        }

        fn cancel(&mut self, token: WaitToken) {
            self.scheduled.retain(|t| *t != token);
        }

        fn got_finish(&self) -> bool {
            self.finish
        }

        fn request_finish(&mut self) {
            self.finish = true;
        }

        fn step(&mut self, _wait: &mut WaitManager) -> bool {
            false
        }
    }

    fn dispatch_with(adapter: &mut FakeAdapter, cmd: &serde_json::Value) -> Result<HandlerOutcome, CommandError> {
        let mut wait = WaitManager::new();
        let mut token_seq = 0u64;
        let mut ctx = HandlerCtx::new(adapter, &mut wait, &mut token_seq);
        dispatch(&mut ctx, cmd)
    }

    use crate::CommandError;

    #[test]
    fn info_ack_text_is_exact() {
        let mut adapter = FakeAdapter::default();
        let cmd = json!({"command": "info", "value": "hello"});
        match dispatch_with(&mut adapter, &cmd).unwrap() {
            HandlerOutcome::Immediate(Reply::Ack(msg)) => {
                assert_eq!(msg, "command info received");
            }
            _ => panic!("expected an immediate ack"),
        }
    }

    #[test]
    fn unknown_command_error_text_is_exact() {
        let mut adapter = FakeAdapter::default();
        let cmd = json!({"command": "bogus"});
        let err = dispatch_with(&mut adapter, &cmd).unwrap_err();
        assert_eq!(err.to_string(), "Could not find handler for command. Discarding.");
    }

    #[test]
    fn set_scalar_defaults_to_zero_when_value_omitted() {
        let mut adapter = FakeAdapter::default();
        let h = adapter.add_scalar("v", HandleKind::Scalar, Value::Real(5.0));
        let cmd = json!({"command": "set", "path": "v"});
        dispatch_with(&mut adapter, &cmd).unwrap();
        assert_eq!(adapter.read_value(h), Value::Real(0.0));
    }

    #[test]
    fn set_array_write_zips_and_leaves_tail_untouched() {
        let mut adapter = FakeAdapter::default();
        adapter.add_array(
            "a",
            vec![Value::Int(0), Value::Int(0), Value::Int(0), Value::Int(0)],
        );
        let cmd = json!({"command": "set", "path": "a", "value": [7, 8]});
        dispatch_with(&mut adapter, &cmd).unwrap();
        let base = adapter.names["a"];
        let depth = adapter.memory_depth(base);
        let values: Vec<_> = (0..depth)
            .map(|i| adapter.read_value(adapter.memory_word(base, i).unwrap()))
            .collect();
        assert_eq!(
            values,
            vec![Value::Real(7.0), Value::Real(8.0), Value::Int(0), Value::Int(0)]
        );
    }

    #[test]
    fn run_for_time_rejects_nonpositive_time() {
        let mut adapter = FakeAdapter::default();
        let cmd = json!({"command": "run", "cb": "for_time", "time": 0, "time_unit": "ns"});
        let err = dispatch_with(&mut adapter, &cmd).unwrap_err();
        assert!(matches!(err, CommandError::Invalid(_)));
    }

    #[test]
    fn run_until_time_rejects_non_strictly_future_target() {
        let mut adapter = FakeAdapter::default();
        adapter.now = 100;
        let cmd = json!({"command": "run", "cb": "until_time", "time": 100, "time_unit": "ns"});
        let err = dispatch_with(&mut adapter, &cmd).unwrap_err();
        assert!(matches!(err, CommandError::Invalid(_)));
    }

    #[test]
    fn second_wait_while_one_is_armed_is_a_conflict() {
        let mut adapter = FakeAdapter::default();
        let mut wait = WaitManager::new();
        let mut token_seq = 0u64;

        {
            let mut ctx = HandlerCtx::new(&mut adapter, &mut wait, &mut token_seq);
            let cmd = json!({"command": "run", "cb": "to_next"});
            assert!(matches!(
                dispatch(&mut ctx, &cmd).unwrap(),
                HandlerOutcome::Armed(_)
            ));
        }
        {
            let mut ctx = HandlerCtx::new(&mut adapter, &mut wait, &mut token_seq);
            let cmd = json!({"command": "run", "cb": "to_next"});
            let err = dispatch(&mut ctx, &cmd).unwrap_err();
            assert_eq!(err.to_string(), "another callback is already registered");
        }
    }

    #[test]
    fn until_change_requires_value_for_non_event_path() {
        let mut adapter = FakeAdapter::default();
        adapter.add_scalar("v", HandleKind::Scalar, Value::Int(0));
        let cmd = json!({"command": "run", "cb": "until_change", "path": "v"});
        let err = dispatch_with(&mut adapter, &cmd).unwrap_err();
        assert!(matches!(err, CommandError::MissingField("value")));
    }

    #[test]
    fn until_change_on_named_event_ignores_value() {
        let mut adapter = FakeAdapter::default();
        adapter.add_scalar("done", HandleKind::NamedEvent, Value::Event(false));
        let cmd = json!({"command": "run", "cb": "until_change", "path": "done"});
        let outcome = dispatch_with(&mut adapter, &cmd).unwrap();
        assert!(matches!(outcome, HandlerOutcome::Armed(_)));
    }

    #[test_case(json!({"command": "bogus"}), "command" ; "unknown top-level command")]
    #[test_case(json!({"command": "get", "sel": "bogus"}), "sel" ; "unknown get sel")]
    #[test_case(json!({"command": "run", "cb": "bogus"}), "cb" ; "unknown run cb")]
    fn closed_set_violation_reports_the_offending_field(cmd: serde_json::Value, want_field: &str) {
        let mut adapter = FakeAdapter::default();
        let err = dispatch_with(&mut adapter, &cmd).unwrap_err();
        if want_field == "command" {
            assert!(matches!(err, CommandError::UnknownCommand));
        } else {
            assert!(matches!(
                err,
                CommandError::UnknownVariant { field, value }
                    if field == want_field && value == "bogus"
            ));
        }
    }
}
