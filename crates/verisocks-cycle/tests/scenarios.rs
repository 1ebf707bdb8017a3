//! End-to-end scenarios against a real `Driver::run()`, covering the
//! concrete cases from `spec.md` §8: sim info/time before any `run`, a
//! scalar set/get round trip, and a clock-driven `until_time` wait that
//! lands exactly on a clock edge.

use std::io::Write;
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use serde_json::{json, Value as Json};
use uuid::Uuid;

use verisocks_core::{decode_message, encode_json, ExitCode, Primitive, Registry};
use verisocks_cycle::{CycleModel, Driver};

struct NoopModel;

impl CycleModel for NoopModel {
    fn eval(&mut self, _registry: &mut Registry, _clocks: &verisocks_core::ClockMap) {}
}

fn send(stream: &mut TcpStream, cmd: &Json, uuid: Option<Uuid>) {
    let frame = encode_json(cmd, uuid).unwrap();
    stream.write_all(&frame).unwrap();
}

fn recv(stream: &mut TcpStream) -> (Json, Option<Uuid>) {
    let (msg, _) = decode_message(stream, 1 << 16).unwrap();
    (msg.json().unwrap(), msg.header.uuid)
}

fn connect(port: u16) -> TcpStream {
    for _ in 0..200 {
        if let Ok(s) = TcpStream::connect(("127.0.0.1", port)) {
            return s;
        }
        thread::sleep(Duration::from_millis(10));
    }
    panic!("server never started listening on {port}");
}

#[test]
fn sim_info_and_sim_time_before_any_run() {
    let port = 18461;
    let driver = Driver::new(NoopModel, "scenarios")
        .model_hier_name("tb.scenarios")
        .port(port)
        .timeout_seconds(5)
        .register_scalar("x", Primitive::U32, 32)
        .unwrap();
    let handle = thread::spawn(move || driver.run());

    let mut stream = connect(port);
    send(&mut stream, &json!({"command": "get", "sel": "sim_info"}), None);
    let (reply, _) = recv(&mut stream);
    assert_eq!(reply["type"], "result");
    assert_eq!(reply["model_name"], "scenarios");
    assert_eq!(reply["time_unit"], "ns");
    assert_eq!(reply["time_precision"], "1ns");

    send(&mut stream, &json!({"command": "get", "sel": "sim_time"}), None);
    let (reply, _) = recv(&mut stream);
    assert_eq!(reply["time"], 0.0);

    send(&mut stream, &json!({"command": "exit"}), None);
    recv(&mut stream);
    assert_eq!(handle.join().unwrap(), ExitCode::Clean);
}

#[test]
fn scalar_set_then_get_round_trips_with_uuid_echo() {
    let port = 18462;
    let driver = Driver::new(NoopModel, "scenarios")
        .port(port)
        .timeout_seconds(5)
        .register_scalar("x", Primitive::U32, 32)
        .unwrap();
    let handle = thread::spawn(move || driver.run());

    let mut stream = connect(port);
    let set_id = Uuid::new_v4();
    send(&mut stream, &json!({"command": "set", "path": "x", "value": 7}), Some(set_id));
    let (reply, echoed) = recv(&mut stream);
    assert_eq!(reply["type"], "ack");
    assert_eq!(echoed, Some(set_id));

    send(&mut stream, &json!({"command": "get", "sel": "value", "path": "x"}), None);
    let (reply, _) = recv(&mut stream);
    assert_eq!(reply["value"], 7.0);

    send(&mut stream, &json!({"command": "exit"}), None);
    recv(&mut stream);
    assert_eq!(handle.join().unwrap(), ExitCode::Clean);
}

/// A 10-tick, 50% duty clock toggles at every multiple of 5. `until_time`
/// to tick 25 should land exactly on a rising edge (`spec.md` §8's
/// "Clock invariants" scenario).
#[test]
fn until_time_lands_on_a_clock_edge() {
    let port = 18463;
    let driver = Driver::new(NoopModel, "scenarios")
        .port(port)
        .timeout_seconds(5)
        .register_clock("clk", 10, 0.5)
        .unwrap();
    let handle = thread::spawn(move || driver.run());

    let mut stream = connect(port);
    send(
        &mut stream,
        &json!({"command": "run", "cb": "until_time", "time": 25, "time_unit": "ns"}),
        None,
    );
    let (reply, _) = recv(&mut stream);
    assert_eq!(reply["type"], "ack");
    assert_eq!(reply["value"], "Reached callback 'until_time'");

    send(&mut stream, &json!({"command": "get", "sel": "sim_time"}), None);
    let (reply, _) = recv(&mut stream);
    assert_eq!(reply["time"], 25e-9);

    send(&mut stream, &json!({"command": "get", "sel": "value", "path": "clk"}), None);
    let (reply, _) = recv(&mut stream);
    assert_eq!(reply["value"], 1.0);

    send(&mut stream, &json!({"command": "exit"}), None);
    recv(&mut stream);
    assert_eq!(handle.join().unwrap(), ExitCode::Clean);
}

/// A zero-length declared header is a recoverable framing error, `spec.md`
/// §8's "frame parse fails" scenario: the client gets an error reply and the
/// session stays in `WAITING`, rather than the connection being torn down.
#[test]
fn zero_length_header_frame_gets_an_error_reply_and_stays_in_waiting() {
    let port = 18464;
    let driver = Driver::new(NoopModel, "scenarios")
        .port(port)
        .timeout_seconds(5)
        .register_scalar("x", Primitive::U32, 32)
        .unwrap();
    let handle = thread::spawn(move || driver.run());

    let mut stream = connect(port);
    stream.write_all(&[0u8, 0u8]).unwrap();
    let (reply, _) = recv(&mut stream);
    assert_eq!(reply["type"], "error");

    send(&mut stream, &json!({"command": "info", "value": "still here"}), None);
    let (reply, _) = recv(&mut stream);
    assert_eq!(reply["type"], "ack");

    send(&mut stream, &json!({"command": "exit"}), None);
    recv(&mut stream);
    assert_eq!(handle.join().unwrap(), ExitCode::Clean);
}
