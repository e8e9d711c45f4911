//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use du_sim::config::DistributionConfig;
use du_sim::ledger::InMemoryLedger;
use du_sim::repo::{InMemoryBootstrap, InMemorySubscriptionRepo};
use du_sim::utility::engine::{DistributionUtilityEngine, TickReport};
use du_sim::utility::types::{BrokerId, SupplyDemand, Timeslot, UsageByType, UsageType};

/// Engine wired to the in-memory collaborators.
pub type TestEngine = DistributionUtilityEngine<InMemoryLedger, InMemorySubscriptionRepo>;

/// Bootstrap whose total magnitudes are `[5, 8, 11, 14]` (two customers).
pub fn reference_bootstrap() -> InMemoryBootstrap {
    let mut bootstrap = InMemoryBootstrap::from_series("Podunk", vec![-3.0, -4.0, -5.0, -6.0]);
    bootstrap.push(du_sim::utility::types::BootstrapRecord {
        customer: "Acme".to_string(),
        net_usage: vec![-2.0, -4.0, -6.0, -8.0],
    });
    bootstrap
}

/// Capacity-only configuration with the reference coefficient (1.1) and fee (10 per kWh).
pub fn capacity_config(interval: usize, count: usize) -> DistributionConfig {
    DistributionConfig {
        use_capacity_fee: true,
        assessment_interval: interval,
        assessment_count: count,
        std_coefficient: 1.1,
        fee_per_point: 10.0,
        ..DistributionConfig::default()
    }
}

/// Builds an engine over the reference bootstrap and an empty subscription repo.
pub fn capacity_engine(interval: usize, count: usize) -> TestEngine {
    DistributionUtilityEngine::initialize(
        capacity_config(interval, count),
        &reference_bootstrap(),
        InMemoryLedger::new(),
        InMemorySubscriptionRepo::new(),
    )
    .expect("reference config should be valid")
}

/// Supply/demand where each present broker only consumes `net` kWh (negative).
pub fn supply_demand(usage: &[(&str, Option<f64>)]) -> SupplyDemand {
    usage
        .iter()
        .map(|(broker, net)| {
            (
                BrokerId::from(*broker),
                net.map(|kwh| UsageByType::from([(UsageType::Consume, kwh)])),
            )
        })
        .collect()
}

/// Feeds one tick's usage to the ledger and activates the engine.
pub fn tick(engine: &mut TestEngine, timeslot: Timeslot, usage: &[(&str, Option<f64>)]) -> TickReport {
    engine.accounting_mut().set_supply_demand(supply_demand(usage));
    engine
        .activate(timeslot as f64, timeslot)
        .expect("tick should succeed")
}

/// Asserts `actual` is within `tol` of `expected`.
pub fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() < tol,
        "expected {expected} +/- {tol}, got {actual}"
    );
}
