//! Narrow interfaces between the core and its collaborators.

use crate::error::SlotResult;
use crate::evaluator::SpinResult;
use crate::event::SlotEvent;
use crate::heat::HeatTier;
use crate::snapshot::RunProgress;
use std::cell::RefCell;
use std::rc::Rc;

/// What a round needs from a machine: one resolved spin at a time.
pub trait SlotMachinePort {
    fn spin(&mut self) -> SlotResult<SpinResult>;

    /// Told after every spin so tier modifiers can follow the heat.
    fn apply_heat_tier(&mut self, _tier: HeatTier) {}

    /// Multiplier on the heat gained from `result`.
    fn heat_gain_scale(&self, _result: &SpinResult) -> f64 {
        1.0
    }
}

/// Observer attached to a machine at construction.
pub trait SpinDiagnostics {
    fn record(&mut self, event: &SlotEvent);
}

/// Forwards every event to the `log` facade at debug level.
pub struct LogDiagnostics;

impl SpinDiagnostics for LogDiagnostics {
    fn record(&mut self, event: &SlotEvent) {
        log::debug!("[slot] {} {:?}", event.event_type(), event);
    }
}

/// Cloneable in-memory event sink; every clone sees the same events.
#[derive(Debug, Clone, Default)]
pub struct SharedEventLog {
    events: Rc<RefCell<Vec<SlotEvent>>>,
}

impl SharedEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SlotEvent> {
        self.events.borrow().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn drain(&self) -> Vec<SlotEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl SpinDiagnostics for SharedEventLog {
    fn record(&mut self, event: &SlotEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

pub trait ProgressStore {
    fn save(&mut self, progress: &RunProgress) -> SlotResult<()>;
    fn load(&self) -> SlotResult<Option<RunProgress>>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryProgressStore {
    saved: Option<RunProgress>,
    pub save_count: usize,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(progress: RunProgress) -> Self {
        Self { saved: Some(progress), save_count: 0 }
    }
}

impl ProgressStore for MemoryProgressStore {
    fn save(&mut self, progress: &RunProgress) -> SlotResult<()> {
        self.saved = Some(progress.clone());
        self.save_count += 1;
        Ok(())
    }

    fn load(&self) -> SlotResult<Option<RunProgress>> {
        Ok(self.saved.clone())
    }
}
