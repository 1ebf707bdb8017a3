//! [`CycleAdapter`]: a [`SimAdapter`] over an owned [`Registry`]/[`ClockMap`]
//! pair with no external simulator kernel behind it — every "event" is a
//! clock edge or a scheduled wait deadline this adapter tracks itself.
//!
//! Grounded on `celox::scheduler::Scheduler`'s "advance to next event,
//! drain everything due at that timestamp" shape, simplified from its
//! `BinaryHeap<SimEvent>` down to a single `Option<Pending>` slot: the
//! Wait Manager already enforces at most one outstanding wait, so a
//! priority queue that never holds more than one element buys nothing.

use fxhash::FxHashMap;

use verisocks_core::{
    Handle, HandleKind, Registry, RegistryError, RuntimeError, SimAdapter, Value, WaitCheck,
    WaitManager, WaitToken,
};

use crate::model::CycleModel;

#[derive(Debug, Clone, Copy)]
struct Deadline {
    time: u64,
    token: WaitToken,
}

enum Pending {
    Deadline(Deadline),
    ValueWatch { handle: Handle, token: WaitToken },
    NextEvent(WaitToken),
}

enum HandleEntry {
    Name(String),
    ArrayElem(String, usize),
}

/// Owns the Variable Registry and Clock Engine for the cycle-driven
/// embedding and drives a user [`CycleModel`] forward one event at a time.
pub struct CycleAdapter {
    registry: Registry,
    clocks: verisocks_core::ClockMap,
    model: Box<dyn CycleModel>,
    now: u64,
    precision_exp10: i16,
    model_name: String,
    model_hier_name: String,
    finish: bool,
    pending: Option<Pending>,
    names: FxHashMap<String, Handle>,
    elems: FxHashMap<(u64, usize), Handle>,
    handles: Vec<HandleEntry>,
}

impl CycleAdapter {
    pub(crate) fn new(
        registry: Registry,
        clocks: verisocks_core::ClockMap,
        model: Box<dyn CycleModel>,
        precision_exp10: i16,
        model_name: String,
        model_hier_name: String,
    ) -> Self {
        Self {
            registry,
            clocks,
            model,
            now: 0,
            precision_exp10,
            model_name,
            model_hier_name,
            finish: false,
            pending: None,
            names: FxHashMap::default(),
            elems: FxHashMap::default(),
            handles: Vec::new(),
        }
    }

    /// Allocates (or reuses) a [`Handle`] for a top-level binding name,
    /// called once per name by [`crate::Driver`]'s `register_*` methods
    /// right after the binding lands in the [`Registry`].
    pub(crate) fn bind_name(&mut self, name: &str) -> Handle {
        if let Some(h) = self.names.get(name) {
            return *h;
        }
        let handle = Handle(self.handles.len() as u64);
        self.handles.push(HandleEntry::Name(name.to_string()));
        self.names.insert(name.to_string(), handle);
        handle
    }

    /// Like [`CycleAdapter::bind_name`], but for an array binding: also
    /// pre-allocates one element [`Handle`] per index so
    /// [`SimAdapter::memory_word`] stays a pure read-only lookup.
    pub(crate) fn bind_array(&mut self, name: &str, depth: usize) -> Handle {
        let base = self.bind_name(name);
        for i in 0..depth {
            let elem = Handle(self.handles.len() as u64);
            self.handles.push(HandleEntry::ArrayElem(name.to_string(), i));
            self.elems.insert((base.0, i), elem);
        }
        base
    }

    fn entry(&self, h: Handle) -> &HandleEntry {
        &self.handles[h.0 as usize]
    }

    /// Advances to the next due clock edge or scheduled wait deadline and
    /// reconciles the armed wait against it. Returns `false` once neither
    /// source has anything left to schedule.
    fn advance(&mut self, wait: &mut WaitManager) -> bool {
        let deadline_time = match &self.pending {
            Some(Pending::Deadline(d)) => Some(d.time),
            _ => None,
        };
        let clock_time = self.clocks.next_event_time();
        let next_time = match (deadline_time, clock_time) {
            (None, None) => return false,
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (Some(a), Some(b)) => a.min(b),
        };

        self.now = next_time;
        self.clocks.eval(next_time);
        self.model.eval(&mut self.registry, &self.clocks);
        self.reconcile(wait, next_time);
        true
    }

    fn reconcile(&mut self, wait: &mut WaitManager, next_time: u64) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        match pending {
            Pending::Deadline(d) => {
                if d.time <= next_time {
                    wait.check_value(d.token, &Value::Event(true));
                    wait.take();
                } else {
                    self.pending = Some(Pending::Deadline(d));
                }
            }
            Pending::ValueWatch { handle, token } => {
                let observed = self.read_value(handle);
                match wait.check_value(token, &observed) {
                    Some(WaitCheck::Satisfied) => {
                        wait.take();
                    }
                    _ => self.pending = Some(Pending::ValueWatch { handle, token }),
                }
            }
            Pending::NextEvent(token) => {
                wait.check_value(token, &Value::Event(true));
                wait.take();
            }
        }
    }
}

impl SimAdapter for CycleAdapter {
    fn resolve_path(&self, path: &str) -> Option<Handle> {
        self.names.get(path).copied()
    }

    fn read_value(&self, h: Handle) -> Value {
        match self.entry(h) {
            HandleEntry::Name(name) => self
                .registry
                .get(name)
                .expect("handle table entry without a live binding")
                .read_scalar(),
            HandleEntry::ArrayElem(name, i) => self
                .registry
                .get(name)
                .expect("handle table entry without a live binding")
                .read_index(*i)
                .expect("in-range array element handle"),
        }
    }

    fn write_value(&mut self, h: Handle, v: Value) -> Result<(), RuntimeError> {
        let result = match self.entry(h) {
            HandleEntry::Name(name) => self
                .registry
                .get(name)
                .expect("handle table entry without a live binding")
                .write_scalar(&v),
            HandleEntry::ArrayElem(name, i) => self
                .registry
                .get(name)
                .expect("handle table entry without a live binding")
                .write_index(*i, &v),
        };
        result.map_err(|err| match err {
            RegistryError::TypeMismatch(v) => RuntimeError::TypeMismatch(v),
            RegistryError::IndexOutOfRange { index, depth, .. } => {
                RuntimeError::IndexOutOfRange {
                    index: index as usize,
                    depth,
                }
            }
            _ => RuntimeError::NotWritable,
        })
    }

    fn handle_kind(&self, h: Handle) -> HandleKind {
        match self.entry(h) {
            HandleEntry::Name(name) => {
                let binding = self
                    .registry
                    .get(name)
                    .expect("handle table entry without a live binding");
                match binding.kind {
                    verisocks_core::VarKind::Scalar | verisocks_core::VarKind::Clock => {
                        HandleKind::Scalar
                    }
                    verisocks_core::VarKind::Param => HandleKind::Parameter,
                    verisocks_core::VarKind::Event => HandleKind::NamedEvent,
                    verisocks_core::VarKind::Array => HandleKind::Memory,
                }
            }
            HandleEntry::ArrayElem(..) => HandleKind::Scalar,
        }
    }

    fn memory_depth(&self, h: Handle) -> usize {
        match self.entry(h) {
            HandleEntry::Name(name) => self
                .registry
                .get(name)
                .map(|b| b.depth)
                .unwrap_or(0),
            HandleEntry::ArrayElem(..) => 0,
        }
    }

    fn memory_word(&self, h: Handle, i: usize) -> Option<Handle> {
        self.elems.get(&(h.0, i)).copied()
    }

    fn now_ticks(&self) -> u64 {
        self.now
    }

    fn precision_exp10(&self) -> i16 {
        self.precision_exp10
    }

    fn model_name(&self) -> String {
        self.model_name.clone()
    }

    fn model_hier_name(&self) -> String {
        self.model_hier_name.clone()
    }

    fn schedule_after_delay(&mut self, dt_ticks: u64, token: WaitToken) {
        self.pending = Some(Pending::Deadline(Deadline {
            time: self.now + dt_ticks,
            token,
        }));
    }

    fn schedule_at_time(&mut self, t_ticks: u64, token: WaitToken) {
        self.pending = Some(Pending::Deadline(Deadline { time: t_ticks, token }));
    }

    fn schedule_value_change(&mut self, h: Handle, token: WaitToken) {
        self.pending = Some(Pending::ValueWatch { handle: h, token });
    }

    fn schedule_next_event(&mut self, token: WaitToken) {
        self.pending = Some(Pending::NextEvent(token));
    }

    fn cancel(&mut self, token: WaitToken) {
        let matches = match &self.pending {
            Some(Pending::Deadline(d)) => d.token == token,
            Some(Pending::ValueWatch { token: t, .. }) => *t == token,
            Some(Pending::NextEvent(t)) => *t == token,
            None => false,
        };
        if matches {
            self.pending = None;
        }
    }

    fn got_finish(&self) -> bool {
        self.finish
    }

    fn request_finish(&mut self) {
        self.finish = true;
    }

    fn step(&mut self, wait: &mut WaitManager) -> bool {
        self.advance(wait)
    }
}
