//! Kernel — owns one scheduler, one budget ledger and one port per engine.
//!
//! `tick()` only decides who runs this round. Draining ports is a separate,
//! caller-driven step through [`Kernel::receive_messages`], so a driver can
//! process each engine's inbox on its own cadence.

use std::collections::HashMap;

use conductor_budget::{BudgetManager, BudgetStatus};
use conductor_core::{EngineRegistry, Error, KernelConfig, LifecycleState, Result};
use conductor_port::{Message, Port, PortMetrics};
use conductor_sched::Scheduler;
use tracing::{debug, info};

use crate::types::{KernelSnapshot, TickResult};

pub struct Kernel {
    config: KernelConfig,
    state: LifecycleState,
    tick_count: u64,
    engines: Vec<String>,
    scheduler: Scheduler,
    budget: BudgetManager,
    ports: HashMap<String, Port>,
}

impl Kernel {
    /// Build a kernel from a registry. The registry is read once here; the
    /// engine set is fixed from then on.
    ///
    /// Each engine's weight is both its scheduling weight and its budget
    /// percentage.
    pub fn new<R>(registry: &R, config: KernelConfig) -> Result<Self>
    where
        R: EngineRegistry + ?Sized,
    {
        config.validate()?;

        let descriptors = registry.descriptors();
        let mut scheduler = Scheduler::new(config.slots_per_round);
        let mut budget = BudgetManager::new(config.total_budget, config.headroom_percent);
        let mut ports = HashMap::with_capacity(descriptors.len());
        let mut engines = Vec::with_capacity(descriptors.len());

        for descriptor in &descriptors {
            descriptor.validate()?;
            scheduler.register(&descriptor.name, descriptor.weight)?;
            budget.register_engine(&descriptor.name, descriptor.weight)?;
            ports.insert(
                descriptor.name.clone(),
                Port::new(descriptor.name.clone(), config.mailbox_capacity),
            );
            engines.push(descriptor.name.clone());
        }

        info!(
            "Kernel initialized: engines={}, total_budget={}, headroom={}",
            engines.len(),
            config.total_budget,
            budget.headroom()
        );

        Ok(Self {
            config,
            state: LifecycleState::Idle,
            tick_count: 0,
            engines,
            scheduler,
            budget,
            ports,
        })
    }

    /// Build with the given total budget and default settings otherwise.
    pub fn with_budget<R>(registry: &R, total_budget: u64) -> Result<Self>
    where
        R: EngineRegistry + ?Sized,
    {
        Self::new(registry, KernelConfig::with_budget(total_budget))
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.state
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Engine names in registration order.
    pub fn engine_names(&self) -> &[String] {
        &self.engines
    }

    // ---------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------

    pub fn start(&mut self) -> Result<()> {
        self.transition(LifecycleState::Idle, LifecycleState::Running, "start")
    }

    /// Stop a running kernel. Only valid from `Running`: stopping an idle
    /// kernel is an `InvalidTransition`, and `Stopped` is terminal.
    pub fn stop(&mut self) -> Result<()> {
        self.transition(LifecycleState::Running, LifecycleState::Stopped, "stop")
    }

    fn transition(
        &mut self,
        from: LifecycleState,
        to: LifecycleState,
        operation: &'static str,
    ) -> Result<()> {
        if self.state != from {
            return Err(Error::InvalidTransition {
                state: self.state,
                operation,
            });
        }
        self.state = to;
        info!("Kernel {}: {} -> {}", operation, from, to);
        Ok(())
    }

    /// Advance one round. Requires `Running`.
    pub fn tick(&mut self) -> Result<TickResult> {
        if self.state != LifecycleState::Running {
            return Err(Error::InvalidTransition {
                state: self.state,
                operation: "tick",
            });
        }

        self.tick_count += 1;
        let scheduled = self.scheduler.schedule();
        debug!(tick = self.tick_count, slots = scheduled.len(), "Tick");

        Ok(TickResult {
            scheduled,
            tick_count: self.tick_count,
        })
    }

    // ---------------------------------------------------------------
    // Messaging
    // ---------------------------------------------------------------

    /// Route a message to its receiver's port.
    ///
    /// A positive `token_cost` is charged to the sender before delivery and
    /// stays charged even if the receiver's port is full. Budget state never
    /// blocks delivery.
    pub fn send_message(&mut self, message: Message) -> Result<()> {
        let port = self
            .ports
            .get_mut(&message.receiver)
            .ok_or_else(|| Error::UnknownEngine(message.receiver.clone()))?;

        if message.token_cost > 0 {
            self.budget.spend(&message.sender, message.token_cost)?;
        }

        debug!(
            id = %message.id,
            sender = %message.sender,
            receiver = %message.receiver,
            kind = %message.kind,
            cost = message.token_cost,
            "Message routed"
        );
        port.enqueue(message)
    }

    /// Drain an engine's port, oldest message first.
    pub fn receive_messages(&mut self, engine: &str) -> Result<Vec<Message>> {
        Ok(self.port_mut(engine)?.drain())
    }

    pub fn pending_messages(&self, engine: &str) -> Result<usize> {
        Ok(self.port(engine)?.pending())
    }

    pub fn port_metrics(&self, engine: &str) -> Result<PortMetrics> {
        Ok(self.port(engine)?.metrics())
    }

    fn port(&self, engine: &str) -> Result<&Port> {
        self.ports
            .get(engine)
            .ok_or_else(|| Error::UnknownEngine(engine.to_string()))
    }

    fn port_mut(&mut self, engine: &str) -> Result<&mut Port> {
        self.ports
            .get_mut(engine)
            .ok_or_else(|| Error::UnknownEngine(engine.to_string()))
    }

    // ---------------------------------------------------------------
    // Budget
    // ---------------------------------------------------------------

    pub fn spend(&mut self, engine: &str, tokens: u64) -> Result<BudgetStatus> {
        self.budget.spend(engine, tokens)
    }

    pub fn budget_status(&self, engine: &str) -> Result<BudgetStatus> {
        self.budget.status(engine)
    }

    pub fn headroom(&self) -> f64 {
        self.budget.headroom()
    }

    pub fn enable_burst(&mut self, engine: &str) -> Result<()> {
        self.budget.enable_burst(engine)
    }

    pub fn disable_burst(&mut self, engine: &str) -> Result<()> {
        self.budget.disable_burst(engine)
    }

    pub fn reset_budget(&mut self, engine: &str) -> Result<()> {
        self.budget.reset(engine)
    }

    pub fn reset_all_budgets(&mut self) {
        self.budget.reset_all();
    }

    /// Register a handler called with the engine name whenever an engine
    /// newly exceeds its budget. Handlers run synchronously inside the call
    /// that caused the transition.
    pub fn on_budget_exceeded<F>(&mut self, callback: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.budget.on_exceeded(callback);
    }

    // ---------------------------------------------------------------
    // Scheduling
    // ---------------------------------------------------------------

    pub fn sleep(&mut self, engine: &str) -> Result<()> {
        self.scheduler.sleep(engine)
    }

    pub fn wake(&mut self, engine: &str) -> Result<()> {
        self.scheduler.wake(engine)
    }

    pub fn is_sleeping(&self, engine: &str) -> Result<bool> {
        self.scheduler.is_sleeping(engine)
    }

    /// Snapshot of lifecycle, tick count, headroom and every engine's budget.
    pub fn snapshot(&self) -> KernelSnapshot {
        KernelSnapshot {
            state: self.state,
            tick_count: self.tick_count,
            headroom: self.budget.headroom(),
            engines: self.budget.statuses(),
        }
    }
}
