//! In-memory subscription repository and bootstrap source.

use std::collections::BTreeMap;

use crate::utility::ports::{BootstrapSource, SubscriptionRepo};
use crate::utility::types::{BootstrapRecord, BrokerId, Subscription};

/// Subscriptions held per broker.
#[derive(Debug, Clone, Default)]
pub struct InMemorySubscriptionRepo {
    subscriptions: BTreeMap<BrokerId, Vec<Subscription>>,
}

impl InMemorySubscriptionRepo {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a subscription held by `broker`.
    pub fn subscribe(&mut self, broker: impl Into<BrokerId>, subscription: Subscription) {
        self.subscriptions
            .entry(broker.into())
            .or_default()
            .push(subscription);
    }
}

impl SubscriptionRepo for InMemorySubscriptionRepo {
    fn brokers(&self) -> Vec<BrokerId> {
        self.subscriptions.keys().cloned().collect()
    }

    fn active_subscriptions(&self, broker: &BrokerId) -> Vec<Subscription> {
        self.subscriptions.get(broker).cloned().unwrap_or_default()
    }
}

/// Fixed set of bootstrap records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBootstrap {
    records: Vec<BootstrapRecord>,
}

impl InMemoryBootstrap {
    /// Wraps a list of records.
    pub fn new(records: Vec<BootstrapRecord>) -> Self {
        Self { records }
    }

    /// Single-customer bootstrap holding `net_usage`.
    pub fn from_series(customer: impl Into<String>, net_usage: Vec<f64>) -> Self {
        Self::new(vec![BootstrapRecord {
            customer: customer.into(),
            net_usage,
        }])
    }

    /// Adds one customer's series.
    pub fn push(&mut self, record: BootstrapRecord) {
        self.records.push(record);
    }
}

impl BootstrapSource for InMemoryBootstrap {
    fn bootstrap_records(&self) -> Vec<BootstrapRecord> {
        self.records.clone()
    }
}
