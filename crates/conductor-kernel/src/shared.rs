//! Thread-safe handle to a kernel.
//!
//! Every operation takes the single lock for its whole duration, so spend
//! updates, headroom draws and the one-shot exceedance flag are serialized
//! across threads. Exceedance callbacks run while the lock is held and must
//! not call back into the same handle.

use std::sync::Arc;

use conductor_budget::BudgetStatus;
use conductor_core::{EngineRegistry, KernelConfig, LifecycleState, Result};
use conductor_port::{Message, PortMetrics};
use parking_lot::Mutex;

use crate::kernel::Kernel;
use crate::types::{KernelSnapshot, TickResult};

#[derive(Clone)]
pub struct SharedKernel {
    inner: Arc<Mutex<Kernel>>,
}

impl SharedKernel {
    pub fn new<R>(registry: &R, config: KernelConfig) -> Result<Self>
    where
        R: EngineRegistry + ?Sized,
    {
        Ok(Self::from_kernel(Kernel::new(registry, config)?))
    }

    pub fn from_kernel(kernel: Kernel) -> Self {
        Self {
            inner: Arc::new(Mutex::new(kernel)),
        }
    }

    /// Run `f` with exclusive access, for sequences that must not interleave
    /// with other threads. Also the way to reach any `Kernel` method without a
    /// dedicated forwarder here.
    pub fn with<T>(&self, f: impl FnOnce(&mut Kernel) -> T) -> T {
        f(&mut self.inner.lock())
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.inner.lock().lifecycle()
    }

    pub fn start(&self) -> Result<()> {
        self.inner.lock().start()
    }

    pub fn stop(&self) -> Result<()> {
        self.inner.lock().stop()
    }

    pub fn tick(&self) -> Result<TickResult> {
        self.inner.lock().tick()
    }

    pub fn send_message(&self, message: Message) -> Result<()> {
        self.inner.lock().send_message(message)
    }

    pub fn receive_messages(&self, engine: &str) -> Result<Vec<Message>> {
        self.inner.lock().receive_messages(engine)
    }

    pub fn pending_messages(&self, engine: &str) -> Result<usize> {
        self.inner.lock().pending_messages(engine)
    }

    pub fn spend(&self, engine: &str, tokens: u64) -> Result<BudgetStatus> {
        self.inner.lock().spend(engine, tokens)
    }

    pub fn budget_status(&self, engine: &str) -> Result<BudgetStatus> {
        self.inner.lock().budget_status(engine)
    }

    pub fn port_metrics(&self, engine: &str) -> Result<PortMetrics> {
        self.inner.lock().port_metrics(engine)
    }

    pub fn headroom(&self) -> f64 {
        self.inner.lock().headroom()
    }

    pub fn enable_burst(&self, engine: &str) -> Result<()> {
        self.inner.lock().enable_burst(engine)
    }

    pub fn disable_burst(&self, engine: &str) -> Result<()> {
        self.inner.lock().disable_burst(engine)
    }

    pub fn reset_budget(&self, engine: &str) -> Result<()> {
        self.inner.lock().reset_budget(engine)
    }

    pub fn reset_all_budgets(&self) {
        self.inner.lock().reset_all_budgets();
    }

    pub fn sleep(&self, engine: &str) -> Result<()> {
        self.inner.lock().sleep(engine)
    }

    pub fn wake(&self, engine: &str) -> Result<()> {
        self.inner.lock().wake(engine)
    }

    pub fn is_sleeping(&self, engine: &str) -> Result<bool> {
        self.inner.lock().is_sleeping(engine)
    }

    pub fn on_budget_exceeded<F>(&self, callback: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.inner.lock().on_budget_exceeded(callback);
    }

    pub fn snapshot(&self) -> KernelSnapshot {
        self.inner.lock().snapshot()
    }
}
