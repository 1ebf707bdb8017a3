//! The Embedding B program surface, per `spec.md` §6: "a top-level driver
//! object parameterized by the model type, constructed with `(model_ref,
//! port=5100, timeout_seconds=120)`; exposes `register_scalar`,
//! `register_param`, `register_array`, `register_event`, `register_clock`
//! ... before calling `run()`".

use verisocks_core::{Binding, ClockMap, ExitCode, Primitive, Registry};

use crate::adapter::CycleAdapter;
use crate::error::DriverError;
use crate::model::CycleModel;

pub const DEFAULT_PORT: u16 = 5100;
pub const DEFAULT_TIMEOUT_SEC: u32 = 120;

/// Builds a [`CycleAdapter`] by accumulating bindings, then hands it to
/// [`verisocks_core::init`]. A chain of fallible `register_*` calls
/// followed by a single terminal `run()`.
pub struct Driver {
    registry: Registry,
    clocks: ClockMap,
    model: Box<dyn CycleModel>,
    port: u16,
    timeout_sec: u32,
    precision_exp10: i16,
    model_name: String,
    model_hier_name: String,
    adapter_names: Vec<AdapterOp>,
}

/// A binding to replay against the [`CycleAdapter`] once it exists —
/// `Registry` is built up on the `Driver` first so `register_*` can
/// surface `RegistryError`/`ClockError` before any socket is touched.
enum AdapterOp {
    Name(String),
    Array(String, usize),
}

impl Driver {
    pub fn new(model: impl CycleModel + 'static, model_name: impl Into<String>) -> Self {
        Self {
            registry: Registry::new(),
            clocks: ClockMap::new(),
            model: Box::new(model),
            port: DEFAULT_PORT,
            timeout_sec: DEFAULT_TIMEOUT_SEC,
            precision_exp10: -9,
            model_name: model_name.into(),
            model_hier_name: String::new(),
            adapter_names: Vec::new(),
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn timeout_seconds(mut self, timeout_sec: u32) -> Self {
        self.timeout_sec = timeout_sec;
        self
    }

    /// Base-10 exponent of one tick in seconds (e.g. `-9` for ns), used by
    /// `get {sel:"sim_info"/"sim_time"}` and `run`'s time-unit conversion.
    pub fn precision_exp10(mut self, exp10: i16) -> Self {
        self.precision_exp10 = exp10;
        self
    }

    pub fn model_hier_name(mut self, hier: impl Into<String>) -> Self {
        self.model_hier_name = hier.into();
        self
    }

    pub fn register_scalar(
        mut self,
        name: impl Into<String>,
        primitive: Primitive,
        width: u32,
    ) -> Result<Self, DriverError> {
        let name = name.into();
        self.registry.insert(Binding::scalar(name.clone(), primitive, width))?;
        self.adapter_names.push(AdapterOp::Name(name));
        Ok(self)
    }

    pub fn register_param(
        mut self,
        name: impl Into<String>,
        primitive: Primitive,
        width: u32,
    ) -> Result<Self, DriverError> {
        let name = name.into();
        self.registry.insert(Binding::param(name.clone(), primitive, width))?;
        self.adapter_names.push(AdapterOp::Name(name));
        Ok(self)
    }

    pub fn register_event(mut self, name: impl Into<String>) -> Result<Self, DriverError> {
        let name = name.into();
        self.registry.insert(Binding::event(name.clone()))?;
        self.adapter_names.push(AdapterOp::Name(name));
        Ok(self)
    }

    pub fn register_array(
        mut self,
        name: impl Into<String>,
        primitive: Primitive,
        width: u32,
        depth: usize,
    ) -> Result<Self, DriverError> {
        let name = name.into();
        self.registry
            .insert(Binding::array(name.clone(), primitive, width, depth))?;
        self.adapter_names.push(AdapterOp::Array(name, depth));
        Ok(self)
    }

    /// Registers a clock, configures its period/duty and enables it at
    /// `t=0`, per `spec.md` §4.5. Its output is also readable as an
    /// ordinary scalar path (the shared `Rc<RefCell<_>>` cell backing both
    /// the registry binding and the `Clock`).
    pub fn register_clock(
        mut self,
        name: impl Into<String>,
        period_ticks: u64,
        duty: f64,
    ) -> Result<Self, DriverError> {
        let name = name.into();
        let binding = self.clocks.add_clock(name.clone());
        self.registry.insert(binding)?;
        let clock = self.clocks.get_mut(&name).expect("just registered above");
        clock.set_period(period_ticks, duty)?;
        clock.enable(0);
        self.adapter_names.push(AdapterOp::Name(name));
        Ok(self)
    }

    /// Builds the adapter and runs the Control FSM until `EXIT`/`ERROR`.
    pub fn run(self) -> ExitCode {
        let mut adapter = CycleAdapter::new(
            self.registry,
            self.clocks,
            self.model,
            self.precision_exp10,
            self.model_name,
            self.model_hier_name,
        );
        for op in self.adapter_names {
            match op {
                AdapterOp::Name(name) => {
                    adapter.bind_name(&name);
                }
                AdapterOp::Array(name, depth) => {
                    adapter.bind_array(&name, depth);
                }
            }
        }
        verisocks_core::init(adapter, self.port, Some(self.timeout_sec))
    }
}
