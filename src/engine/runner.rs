//! Engine runner: the single task that owns the controller
//!
//! All engine state is mutated from this loop only. It reacts to three
//! inputs: the fixed-period cycle trigger, transport events and operator
//! commands.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::common::channels::create_transport_channel;
use crate::common::errors::{EngineError, Result};
use crate::common::traits::Transport;
use crate::common::types::{EngineEvent, TransportEvent};
use crate::config::types::AppConfig;
use crate::engine::controller::{CycleOutcome, TradeController};

/// Operator requests accepted by the runner
#[derive(Debug, Clone)]
pub enum EngineCommand {
    StartTrading,
    StopTrading,
    SingleTrade,
    SetStrategy(String),
    ChangeMarket(String),
    ResetSession,
    UpdateConfig(Box<AppConfig>),
    Shutdown,
}

pub struct EngineRunner<T: Transport> {
    controller: TradeController<T>,
    transport_events: mpsc::Receiver<TransportEvent>,
    commands: mpsc::Receiver<EngineCommand>,
    /// Keep trying to start trading as ticks arrive
    auto_start: bool,
}

impl<T: Transport> EngineRunner<T> {
    /// Wrap an already connected controller
    pub fn new(
        controller: TradeController<T>,
        transport_events: mpsc::Receiver<TransportEvent>,
        commands: mpsc::Receiver<EngineCommand>,
    ) -> Self {
        Self {
            controller,
            transport_events,
            commands,
            auto_start: false,
        }
    }

    /// Build a controller around `transport`, connect it and subscribe to
    /// the configured market
    pub async fn connect(
        transport: T,
        config: AppConfig,
        events: mpsc::UnboundedSender<EngineEvent>,
        commands: mpsc::Receiver<EngineCommand>,
    ) -> Result<Self> {
        config.validate()?;
        let (sender, receiver) = create_transport_channel();
        let mut controller = TradeController::new(transport, config, events);
        controller.connect(sender).await?;
        Ok(Self::new(controller, receiver, commands))
    }

    /// Start trading automatically once enough ticks are buffered
    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    pub fn controller(&self) -> &TradeController<T> {
        &self.controller
    }

    /// Run until `Shutdown` or until every input has closed
    ///
    /// Returns the controller so callers can inspect the final state.
    pub async fn run(mut self) -> TradeController<T> {
        let mut period = self.cycle_period();
        let mut cycle = cycle_interval(period);
        let mut transport_open = true;
        let mut commands_open = true;

        info!(
            cycle_ms = period.as_millis() as u64,
            auto_start = self.auto_start,
            "engine runner started"
        );

        loop {
            tokio::select! {
                biased;

                // Operator commands (highest priority)
                command = self.commands.recv(), if commands_open => match command {
                    Some(EngineCommand::Shutdown) => {
                        info!("shutdown requested");
                        break;
                    }
                    Some(command) => {
                        self.handle_command(command).await;
                        if self.cycle_period() != period {
                            period = self.cycle_period();
                            cycle = cycle_interval(period);
                            info!(cycle_ms = period.as_millis() as u64, "cycle interval changed");
                        }
                    }
                    None => {
                        debug!("command channel closed");
                        commands_open = false;
                    }
                },

                event = self.transport_events.recv(), if transport_open => match event {
                    Some(event) => {
                        let is_tick = matches!(event, TransportEvent::Tick(_));
                        self.controller.handle_transport_event(event).await;
                        if is_tick {
                            self.try_auto_start();
                        }
                    }
                    None => {
                        warn!("transport event channel closed");
                        transport_open = false;
                    }
                },

                _ = cycle.tick() => {
                    match self.controller.on_cycle().await {
                        CycleOutcome::Vetoed { strategy } => debug!(strategy = %strategy, "cycle vetoed"),
                        CycleOutcome::Submitted(config) => debug!(market = %config.market, "cycle submitted"),
                        _ => {}
                    }
                }
            }

            if !transport_open && !commands_open {
                info!("all inputs closed");
                break;
            }
        }

        if let Err(e) = self.controller.disconnect().await {
            warn!(error = %e, "disconnect failed");
        }
        info!("engine runner stopped");
        self.controller
    }

    async fn handle_command(&mut self, command: EngineCommand) {
        debug!(command = ?command, "command");
        match command {
            EngineCommand::StartTrading => {
                self.auto_start = false;
                if let Err(e) = self.controller.start_trading() {
                    warn!(error = %e, "cannot start trading");
                    self.controller.report_failure("start trading", &e);
                }
            }
            EngineCommand::StopTrading => {
                self.auto_start = false;
                self.controller.stop_trading("Stopped by operator");
            }
            EngineCommand::SingleTrade => match self.controller.execute_single_trade().await {
                Ok(CycleOutcome::Vetoed { strategy }) => {
                    info!(strategy = %strategy, "single trade vetoed by strategy")
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "single trade failed");
                    self.controller.report_failure("single trade", &e);
                }
            },
            EngineCommand::SetStrategy(name) => {
                if self.controller.set_active_strategy(&name).is_none() {
                    let err = EngineError::Configuration(format!("unknown strategy: {name}"));
                    self.controller.report_failure("set strategy", &err);
                }
            }
            EngineCommand::ChangeMarket(market) => {
                if let Err(e) = self.controller.change_market(&market).await {
                    warn!(market = %market, error = %e, "market change failed");
                    self.controller.report_failure("change market", &e);
                }
            }
            EngineCommand::ResetSession => self.controller.reset_session(),
            EngineCommand::UpdateConfig(config) => {
                if let Err(e) = self.controller.update_config(*config) {
                    warn!(error = %e, "rejected configuration update");
                    self.controller.report_failure("update config", &e);
                }
            }
            EngineCommand::Shutdown => {}
        }
    }

    fn try_auto_start(&mut self) {
        if !self.auto_start || self.controller.is_trading() {
            return;
        }
        match self.controller.start_trading() {
            Ok(()) => {
                info!("auto-start: enough ticks buffered");
                self.auto_start = false;
            }
            Err(EngineError::InsufficientTicks { have, need }) => {
                debug!(have, need, "auto-start waiting for ticks");
            }
            Err(e) => {
                warn!(error = %e, "auto-start abandoned");
                self.auto_start = false;
                self.controller.report_failure("start trading", &e);
            }
        }
    }

    fn cycle_period(&self) -> Duration {
        Duration::from_millis(self.controller.config().engine.cycle_interval_ms)
    }
}

/// First trigger one full period from now, late triggers are not bunched
fn cycle_interval(period: Duration) -> Interval {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
