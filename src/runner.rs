//! Scenario driver: synthetic broker populations feeding the engine tick by tick.

use tracing::info;

use crate::clock::Clock;
use crate::config::ScenarioConfig;
use crate::error::EngineError;
use crate::ledger::InMemoryLedger;
use crate::population::BrokerLoad;
use crate::repo::{InMemoryBootstrap, InMemorySubscriptionRepo};
use crate::utility::engine::{DistributionUtilityEngine, TickReport};
use crate::utility::report::BillingReport;
use crate::utility::types::{
    BootstrapRecord, CapacityTransaction, DistributionTransaction, SupplyDemand,
};

/// Everything produced by one scenario run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// One report per tick, in timeslot order.
    pub reports: Vec<TickReport>,
    /// Aggregate billing summary.
    pub billing: BillingReport,
    /// Capacity transactions as posted to the ledger.
    pub capacity: Vec<CapacityTransaction>,
    /// Meter/transport transactions as posted to the ledger.
    pub distribution: Vec<DistributionTransaction>,
}

/// Runs a complete scenario.
///
/// Bootstrap history and live usage come from separately seeded load
/// models, so the same scenario and seed always produce the same output.
///
/// # Errors
///
/// Returns [`EngineError::Config`] if the scenario is invalid, or any
/// error raised by the engine during the run.
pub fn run_scenario(config: &ScenarioConfig) -> Result<RunResult, EngineError> {
    let errors = config.validate();
    if !errors.is_empty() {
        return Err(EngineError::Config(errors));
    }

    let sim = &config.simulation;
    let broker_count = config.brokers.len() as u64;
    let dt_hr = 24.0 / sim.slots_per_day as f64;

    let bootstrap_len = sim.bootstrap_days * sim.slots_per_day;
    let mut bootstrap = InMemoryBootstrap::default();
    for (i, broker) in config.brokers.iter().enumerate() {
        let seed = sim.seed.wrapping_add(broker_count + i as u64);
        let mut history = BrokerLoad::from_config(broker, sim, seed);
        bootstrap.push(BootstrapRecord {
            customer: broker.name.clone(),
            net_usage: (0..bootstrap_len).map(|t| history.net_usage_kwh(t)).collect(),
        });
    }

    let mut loads: Vec<BrokerLoad> = config
        .brokers
        .iter()
        .enumerate()
        .map(|(i, broker)| BrokerLoad::from_config(broker, sim, sim.seed.wrapping_add(i as u64)))
        .collect();

    let mut repo = InMemorySubscriptionRepo::new();
    for load in &loads {
        for sub in load.subscriptions() {
            repo.subscribe(load.broker.clone(), sub);
        }
    }

    let mut engine = DistributionUtilityEngine::initialize(
        config.distribution.clone(),
        &bootstrap,
        InMemoryLedger::new(),
        repo,
    )?;

    let total = sim.days * sim.slots_per_day;
    let mut clock = Clock::starting_at(sim.first_timeslot, total);
    let mut reports = Vec::with_capacity(total);

    clock.try_run(|slot| {
        let supply_demand: SupplyDemand = loads
            .iter_mut()
            .map(|load| (load.broker.clone(), load.usage(slot)))
            .collect();
        engine.accounting_mut().set_supply_demand(supply_demand);
        reports.push(engine.activate(slot as f64 * dt_hr, slot)?);
        Ok::<(), EngineError>(())
    })?;

    let billing = BillingReport::from_reports(&reports);
    info!(
        ticks = billing.ticks,
        windows = billing.windows_assessed,
        peaks = billing.peaks_billed,
        capacity_fees = billing.total_capacity_fees(),
        distribution_fees = billing.total_distribution_fees(),
        "scenario complete"
    );

    let ledger = engine.into_accounting();
    Ok(RunResult {
        reports,
        billing,
        capacity: ledger.capacity_transactions().to_vec(),
        distribution: ledger.distribution_transactions().to_vec(),
    })
}
