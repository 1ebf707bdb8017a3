//! The Control FSM, per `spec.md` §4.6: `INIT → CONNECT → WAITING →
//! PROCESSING → {WAITING | SIM_RUNNING} → SIM_FINISH → EXIT/ERROR`. Single
//! thread, cooperative: nothing here blocks except the two explicit waits
//! ([`net::ConnectionManager::accept`]'s poll loop and a blocking socket
//! read in `WAITING`).

use std::io::Write;
use std::net::TcpStream;

use serde_json::Value as Json;
use uuid::Uuid;

use crate::codec::{self, ContentType};
use crate::dispatch::dispatch;
use crate::error::{ExitCode, VerisocksError};
use crate::handlers::{FireReply, HandlerCtx, HandlerOutcome};
use crate::net::{self, ConnectionManager};
use crate::reply::Reply;
use crate::SimAdapter;

/// Bound on a single frame's payload; larger declared lengths are truncated
/// and reported as [`crate::CodecError::Truncated`], per `spec.md` §4.1.
const MAX_PAYLOAD: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsmState {
    Init,
    Connect,
    Waiting,
    Processing,
    SimRunning,
    SimFinish,
    Exit,
    Error,
}

pub struct Fsm<A: SimAdapter> {
    adapter: A,
    wait: crate::WaitManager,
    token_seq: u64,
    port: u16,
    timeout_sec: u32,
    armed_reply: Option<FireReply>,
    armed_uuid: Option<Uuid>,
}

impl<A: SimAdapter> Fsm<A> {
    /// `INIT`: stash the adapter and control-socket parameters. The socket
    /// itself is not bound until [`Fsm::run`] reaches `CONNECT`, so a
    /// construction failure here can only ever be a programmer error, never
    /// an I/O one.
    pub fn bind(adapter: A, port: u16, timeout_sec: u32) -> Result<Self, VerisocksError> {
        Ok(Self {
            adapter,
            wait: crate::WaitManager::new(),
            token_seq: 0,
            port,
            timeout_sec,
            armed_reply: None,
            armed_uuid: None,
        })
    }

    /// Binds once, then services clients one at a time for the life of the
    /// process: a disconnect in `WAITING` returns to `CONNECT` for the next
    /// client rather than ending the process, per `spec.md` §4.6's
    /// `WAITING --read<0(disconnect)--> CONNECT` row. Only `EXIT`/`ERROR`
    /// end the loop.
    pub fn run(&mut self) -> ExitCode {
        let listener = match ConnectionManager::bind(self.port, self.timeout_sec) {
            Ok(l) => l,
            Err(err) => {
                tracing::error!(%err, "CONNECT: failed to bind control socket");
                return ExitCode::Error;
            }
        };

        loop {
            let mut stream = match listener.accept() {
                Ok(s) => s,
                Err(err) => {
                    tracing::error!(%err, "CONNECT: no client arrived within the timeout");
                    return ExitCode::Error;
                }
            };

            let mut state = FsmState::Waiting;
            let outcome = loop {
                state = match state {
                    FsmState::Waiting => self.step_waiting(&mut stream),
                    FsmState::Processing => unreachable!("folded into step_waiting"),
                    FsmState::SimRunning => self.step_sim_running(&mut stream),
                    FsmState::SimFinish => self.step_sim_finish(&mut stream),
                    FsmState::Connect => break None,
                    FsmState::Exit => break Some(ExitCode::Clean),
                    FsmState::Error => break Some(ExitCode::Error),
                    FsmState::Init => unreachable!("handled before the loop"),
                };
            };

            match outcome {
                None => {
                    drop(stream);
                    self.wait = crate::WaitManager::new();
                    self.armed_reply = None;
                    self.armed_uuid = None;
                    continue;
                }
                Some(code) => {
                    net::shutdown_session(stream, listener);
                    return code;
                }
            }
        }
    }

    /// `WAITING`: block for the next frame. Per `spec.md` §4.6, a clean
    /// disconnect returns to `CONNECT` for the next client; a frame that is
    /// too large or fails to parse gets an error reply and stays in
    /// `WAITING`; only a broken connection (anything other than a graceful
    /// EOF) is fatal to the session.
    fn step_waiting(&mut self, stream: &mut TcpStream) -> FsmState {
        let (msg, _) = match codec::decode_message(stream, MAX_PAYLOAD) {
            Ok(pair) => pair,
            Err(err) if is_disconnect(&err) => {
                tracing::info!("WAITING: client disconnected");
                return FsmState::Connect;
            }
            Err(err) if is_recoverable_framing(&err) => {
                tracing::warn!(%err, "WAITING: frame decode failed");
                self.send_error(stream, None, &err.to_string());
                return FsmState::Waiting;
            }
            Err(err) => {
                tracing::error!(%err, "WAITING: connection broken");
                return FsmState::Error;
            }
        };

        let cmd = match msg.header.content_type {
            ContentType::Json => match msg.json() {
                Ok(c) => c,
                Err(err) => {
                    self.send_error(stream, msg.header.uuid, &err.to_string());
                    return FsmState::Waiting;
                }
            },
            other => {
                self.send_error(
                    stream,
                    msg.header.uuid,
                    &format!("expected application/json, got {other:?}"),
                );
                return FsmState::Waiting;
            }
        };

        self.process(stream, msg.header.uuid, &cmd)
    }

    /// `PROCESSING`: dispatch one command and act on its
    /// [`HandlerOutcome`]. Never durable — every branch returns to
    /// `WAITING`, `SIM_RUNNING`, or a terminal state before the loop in
    /// [`Fsm::run`] iterates again, so `FsmState::Processing` never actually
    /// appears as a loop state.
    fn process(&mut self, stream: &mut TcpStream, uuid: Option<Uuid>, cmd: &Json) -> FsmState {
        let mut ctx = HandlerCtx::new(&mut self.adapter, &mut self.wait, &mut self.token_seq);
        match dispatch(&mut ctx, cmd) {
            Ok(HandlerOutcome::Immediate(reply)) => {
                self.send(stream, uuid, &reply);
                FsmState::Waiting
            }
            Ok(HandlerOutcome::Armed(fire)) => {
                self.armed_reply = Some(fire);
                self.armed_uuid = uuid;
                FsmState::SimRunning
            }
            Ok(HandlerOutcome::Finish(reply)) => {
                self.send(stream, uuid, &reply);
                FsmState::SimFinish
            }
            Ok(HandlerOutcome::Exit(reply)) => {
                self.send(stream, uuid, &reply);
                FsmState::Exit
            }
            Err(err) => {
                self.send_error(stream, uuid, &err.to_string());
                FsmState::Waiting
            }
        }
    }

    /// `SIM_RUNNING`: drive the adapter forward one event at a time until
    /// either the armed wait fires or the simulator runs out of events.
    /// Running out of events while a wait is still outstanding is the one
    /// place `spec.md` §4.6 treats as fatal: the client asked for a
    /// callback the simulation will never deliver.
    fn step_sim_running(&mut self, stream: &mut TcpStream) -> FsmState {
        loop {
            if !self.wait.is_armed() {
                let fire = self.armed_reply.take().expect("wait fired with no pending ack");
                let uuid = self.armed_uuid.take();
                self.send(stream, uuid, &fire.ack());
                return FsmState::Waiting;
            }
            let has_more = self.adapter.step(&mut self.wait);
            if self.adapter.got_finish() {
                return FsmState::SimFinish;
            }
            if !has_more && self.wait.is_armed() {
                tracing::error!("SIM_RUNNING: simulation ended with a wait still pending");
                let uuid = self.armed_uuid.take();
                self.send_error(
                    stream,
                    uuid,
                    &VerisocksError::SimulatorEnd.to_string(),
                );
                return FsmState::Error;
            }
        }
    }

    /// `SIM_FINISH`: drain any remaining scheduled events (best effort; the
    /// simulator is allowed to ignore this) then move to `EXIT`.
    fn step_sim_finish(&mut self, _stream: &mut TcpStream) -> FsmState {
        if let Some(token) = self.wait.take() {
            self.adapter.cancel(token);
        }
        FsmState::Exit
    }

    fn send(&self, stream: &mut TcpStream, uuid: Option<Uuid>, reply: &Reply) {
        self.write_frame(stream, uuid, reply);
    }

    fn send_error(&self, stream: &mut TcpStream, uuid: Option<Uuid>, message: &str) {
        self.write_frame(stream, uuid, &Reply::Error(message.to_string()));
    }

    fn write_frame(&self, stream: &mut TcpStream, uuid: Option<Uuid>, reply: &Reply) {
        match codec::encode_json(&reply.to_json(), uuid) {
            Ok(frame) => {
                if let Err(err) = stream.write_all(&frame) {
                    tracing::error!(%err, "failed to write reply frame");
                }
            }
            Err(err) => tracing::error!(%err, "failed to encode reply frame"),
        }
    }
}

fn is_disconnect(err: &crate::CodecError) -> bool {
    matches!(
        err,
        crate::CodecError::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof
    )
}

/// `spec.md` §4.6's "frame > buffer" and "frame parse fails" rows: a
/// malformed or oversized frame gets an error reply and the session stays in
/// `WAITING`, rather than tearing down the connection.
fn is_recoverable_framing(err: &crate::CodecError) -> bool {
    matches!(
        err,
        crate::CodecError::ShortHeader
            | crate::CodecError::HeaderTooLong(_)
            | crate::CodecError::Truncated { .. }
            | crate::CodecError::InvalidJson(_)
            | crate::CodecError::InvalidContentType(_)
    )
}
