mod common;

use std::collections::BTreeMap;

use common::{assert_close, reference_bootstrap, supply_demand};
use du_sim::config::DistributionConfig;
use du_sim::error::EngineError;
use du_sim::ledger::InMemoryLedger;
use du_sim::repo::InMemorySubscriptionRepo;
use du_sim::utility::engine::DistributionUtilityEngine;
use du_sim::utility::transport::TransportRate;
use du_sim::utility::types::{BrokerId, CustomerClass, CustomerInfo, Subscription};

fn reference_repo() -> InMemorySubscriptionRepo {
    let podunk = CustomerInfo::new("Podunk", CustomerClass::Small);
    let acme = CustomerInfo::new("Acme", CustomerClass::Large);
    let mut repo = InMemorySubscriptionRepo::new();
    repo.subscribe("broker1", Subscription::new(podunk.clone(), 10));
    repo.subscribe("broker1", Subscription::new(acme.clone(), 5));
    repo.subscribe("broker1", Subscription::new(podunk.clone(), 20));
    repo.subscribe("broker1", Subscription::new(acme.clone(), 3));
    repo.subscribe("broker2", Subscription::new(podunk, 18));
    repo.subscribe("broker2", Subscription::new(acme.clone(), 7));
    repo.subscribe("broker3", Subscription::new(acme, 15));
    repo
}

fn meter_config() -> DistributionConfig {
    DistributionConfig {
        use_meter_fee: true,
        m_small: 0.12,
        m_large: 0.18,
        ..DistributionConfig::default()
    }
}

#[test]
fn meter_fee_charges_every_subscribed_broker() {
    let mut engine = DistributionUtilityEngine::initialize(
        meter_config(),
        &reference_bootstrap(),
        InMemoryLedger::new(),
        reference_repo(),
    )
    .expect("valid config");

    let report = engine.activate(0.0, 0).expect("tick should succeed");
    assert!(report.capacity.is_empty());
    assert_eq!(report.distribution.len(), 3);

    let b1 = &report.distribution[0];
    assert_eq!(b1.broker, BrokerId::from("broker1"));
    assert_eq!((b1.small_meters, b1.large_meters), (30, 8));
    assert_eq!(b1.kwh, 0.0);
    assert_close(b1.fee, 30.0 * 0.12 + 8.0 * 0.18, 1e-6);
    assert_close(report.distribution[1].fee, 3.42, 1e-6);
    assert_close(report.distribution[2].fee, 2.7, 1e-6);

    let posted = engine.accounting().distribution_transactions();
    assert_eq!(posted.len(), 3);
    assert_eq!(posted, report.distribution.as_slice());
}

#[test]
fn meter_fee_repeats_every_tick() {
    let mut engine = DistributionUtilityEngine::initialize(
        meter_config(),
        &reference_bootstrap(),
        InMemoryLedger::new(),
        reference_repo(),
    )
    .expect("valid config");
    for slot in 0..4 {
        engine.activate(slot as f64, slot).expect("tick should succeed");
    }
    assert_eq!(engine.accounting().distribution_transactions().len(), 12);
}

#[derive(Debug)]
struct TieredRate {
    per_broker: BTreeMap<String, f64>,
    default_rate: f64,
}

impl TransportRate for TieredRate {
    fn fee(&self, broker: &BrokerId, kwh: f64) -> f64 {
        kwh * self
            .per_broker
            .get(broker.as_str())
            .copied()
            .unwrap_or(self.default_rate)
    }
}

#[test]
fn transport_fee_uses_custom_rate_and_skips_missing_brokers() {
    let config = DistributionConfig {
        use_transport_fee: true,
        ..DistributionConfig::default()
    };
    let rate = TieredRate {
        per_broker: BTreeMap::from([("broker2".to_string(), 0.5)]),
        default_rate: 0.1,
    };
    let mut engine = DistributionUtilityEngine::initialize(
        config,
        &reference_bootstrap(),
        InMemoryLedger::new(),
        InMemorySubscriptionRepo::new(),
    )
    .expect("valid config")
    .with_transport_rate(rate);

    engine.accounting_mut().set_supply_demand(supply_demand(&[
        ("broker1", Some(-10.0)),
        ("broker2", Some(-4.0)),
        ("broker3", None),
    ]));
    let report = engine.activate(0.0, 0).expect("tick should succeed");

    assert_eq!(report.distribution.len(), 2);
    assert_close(report.distribution[0].kwh, 10.0, 1e-12);
    assert_close(report.distribution[0].fee, 1.0, 1e-12);
    assert_close(report.distribution[1].fee, 2.0, 1e-12);
}

#[test]
fn meter_and_transport_post_one_transaction_per_broker() {
    let config = DistributionConfig {
        use_transport_fee: true,
        transport_rate: 0.01,
        ..meter_config()
    };
    let mut engine = DistributionUtilityEngine::initialize(
        config,
        &reference_bootstrap(),
        InMemoryLedger::new(),
        reference_repo(),
    )
    .expect("valid config");
    engine
        .accounting_mut()
        .set_supply_demand(supply_demand(&[("broker1", Some(-100.0)), ("broker4", Some(-50.0))]));

    let report = engine.activate(0.0, 0).expect("tick should succeed");
    let brokers: Vec<&str> = report.distribution.iter().map(|t| t.broker.as_str()).collect();
    assert_eq!(brokers, vec!["broker1", "broker2", "broker3", "broker4"]);

    let b1 = &report.distribution[0];
    assert_eq!((b1.small_meters, b1.large_meters), (30, 8));
    assert_close(b1.kwh, 100.0, 1e-12);
    // meter 30 * 0.12 + 8 * 0.18, transport 100 kWh * 0.01
    assert_close(b1.fee, 30.0 * 0.12 + 8.0 * 0.18 + 1.0, 1e-9);

    let b4 = &report.distribution[3];
    assert_eq!((b4.small_meters, b4.large_meters), (0, 0));
    assert_close(b4.fee, 0.5, 1e-12);
}

#[test]
fn misconfiguration_reports_every_problem() {
    let config = DistributionConfig {
        use_capacity_fee: true,
        assessment_interval: 3,
        assessment_count: 4,
        m_small: -0.1,
        ..DistributionConfig::default()
    };
    let result = DistributionUtilityEngine::initialize(
        config,
        &reference_bootstrap(),
        InMemoryLedger::new(),
        InMemorySubscriptionRepo::new(),
    );
    let Err(EngineError::Config(errors)) = result else {
        panic!("expected configuration errors");
    };
    let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
    assert!(fields.contains(&"distribution.assessment_count"));
    assert!(fields.contains(&"distribution.m_small"));
}

#[test]
fn property_map_configures_engine() {
    let props: BTreeMap<String, String> = [
        ("distributionutility.distributionUtilityService.useMeterFee", "true"),
        ("distributionutility.distributionUtilityService.mSmall", "0.12"),
        ("distributionutility.distributionUtilityService.mLarge", "0.18"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let config = DistributionConfig::from_properties(&props).expect("valid properties");

    let mut engine = DistributionUtilityEngine::initialize(
        config,
        &reference_bootstrap(),
        InMemoryLedger::new(),
        reference_repo(),
    )
    .expect("valid config");
    let report = engine.activate(0.0, 0).expect("tick should succeed");
    assert_close(report.distribution[0].fee, 5.04, 1e-6);
}
