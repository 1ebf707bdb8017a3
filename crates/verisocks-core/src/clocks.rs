//! Programmable square-wave oscillators, per `spec.md` §4.5.

use thiserror::Error;

use crate::registry::{Binding, SharedCell};
use crate::HashMap;

#[derive(Debug, Error)]
pub enum ClockError {
    #[error("clock period must be > 0")]
    InvalidPeriod,
    #[error("duty cycle must be in (0, 1)")]
    InvalidDuty,
    #[error("period too short for duty cycle {duty} at period {period} ticks")]
    DegenerateSplit { period: u64, duty: f64 },
    #[error("unknown clock '{0}'")]
    UnknownClock(String),
}

/// `(name, data_ref, period_ticks, duty, period_high, period_low,
/// next_event_time, prev_event_time, cycle_count, enabled)`, per `spec.md`
/// §3 "Clock".
pub struct Clock {
    pub name: String,
    cell: SharedCell,
    pub period_ticks: u64,
    pub duty: f64,
    pub period_high: u64,
    pub period_low: u64,
    pub next_event_time: u64,
    pub prev_event_time: u64,
    pub cycle_count: u64,
    pub enabled: bool,
}

impl Clock {
    fn new(name: impl Into<String>, cell: SharedCell) -> Self {
        Self {
            name: name.into(),
            cell,
            period_ticks: 0,
            duty: 0.5,
            period_high: 0,
            period_low: 0,
            next_event_time: 0,
            prev_event_time: 0,
            cycle_count: 0,
            enabled: false,
        }
    }

    pub fn value(&self) -> u8 {
        self.cell.borrow().as_bit()
    }

    /// `period_high = ⌊duty·period⌋`, `period_low = period - period_high`;
    /// both must be ≥1, per `spec.md` §4.5.
    pub fn set_period(&mut self, period_ticks: u64, duty: f64) -> Result<(), ClockError> {
        if period_ticks == 0 {
            return Err(ClockError::InvalidPeriod);
        }
        if !(duty > 0.0 && duty < 1.0) {
            return Err(ClockError::InvalidDuty);
        }
        let period_high = (duty * period_ticks as f64).floor() as u64;
        let period_low = period_ticks - period_high;
        if period_high == 0 || period_low == 0 {
            return Err(ClockError::DegenerateSplit {
                period: period_ticks,
                duty,
            });
        }
        self.period_ticks = period_ticks;
        self.duty = duty;
        self.period_high = period_high;
        self.period_low = period_low;
        Ok(())
    }

    /// Arms the clock: first transition is 0→1 after `period_low` ticks
    /// (the clock starts low), per `spec.md` §3's Clock invariants. A no-op
    /// if already enabled.
    pub fn enable(&mut self, t_now: u64) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        self.cycle_count = 0;
        self.prev_event_time = t_now;
        self.next_event_time = t_now + self.period_low;
        self.cell.borrow_mut().set_bit(0);
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Toggles when `t == next_event_time`; no-op otherwise, per `spec.md`
    /// §4.5. Increments `cycle_count` on each 1→0 transition.
    pub fn eval(&mut self, t: u64) {
        if !self.enabled || t != self.next_event_time {
            return;
        }
        self.prev_event_time = t;
        if self.value() == 0 {
            self.cell.borrow_mut().set_bit(1);
            self.next_event_time = t + self.period_high;
        } else {
            self.cell.borrow_mut().set_bit(0);
            self.next_event_time = t + self.period_low;
            self.cycle_count += 1;
        }
    }
}

/// Owns every registered [`Clock`]; answers queries the Embedding-B main
/// loop needs (`spec.md` §4.5's "map" operations).
#[derive(Default)]
pub struct ClockMap {
    clocks: HashMap<String, Clock>,
}

impl ClockMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a clock, initially disabled with value 0, and returns the
    /// [`Binding`] the caller should also insert into the [`crate::Registry`]
    /// so the clock's output is readable as a normal scalar path.
    pub fn add_clock(&mut self, name: impl Into<String>) -> Binding {
        let name = name.into();
        let (binding, cell) = Binding::clock_cell(name.clone());
        self.clocks.insert(name.clone(), Clock::new(name, cell));
        binding
    }

    pub fn get(&self, name: &str) -> Option<&Clock> {
        self.clocks.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Clock> {
        self.clocks.get_mut(name)
    }

    pub fn has_next_event(&self) -> bool {
        self.clocks.values().any(|c| c.enabled)
    }

    pub fn next_event_time(&self) -> Option<u64> {
        self.clocks
            .values()
            .filter(|c| c.enabled)
            .map(|c| c.next_event_time)
            .min()
    }

    /// Evaluates every clock at `t`; clocks whose `next_event_time == t`
    /// toggle, all others are untouched. Order across simultaneous clocks is
    /// unspecified but total, per `spec.md` §4.5.
    pub fn eval(&mut self, t: u64) {
        for clock in self.clocks.values_mut() {
            clock.eval(t);
        }
    }
}
