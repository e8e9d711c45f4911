//! Collaborator interfaces consumed by the distribution-utility engine.

use crate::error::LedgerError;

use super::types::{
    BootstrapRecord, BrokerId, CapacityTransaction, DistributionTransaction, Subscription,
    SupplyDemand,
};

/// Accounting service: the source of per-tick usage and the sink for charges.
pub trait Accounting {
    /// Supply and demand of every known broker for the current tick.
    fn current_supply_demand_by_broker(&self) -> SupplyDemand;

    /// Posts a capacity charge.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] if the ledger rejects the transaction.
    fn add_capacity_transaction(&mut self, tx: CapacityTransaction) -> Result<(), LedgerError>;

    /// Posts a meter/transport charge.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] if the ledger rejects the transaction.
    fn add_distribution_transaction(
        &mut self,
        tx: DistributionTransaction,
    ) -> Result<(), LedgerError>;
}

/// Historical per-customer usage supplied before live operation.
pub trait BootstrapSource {
    /// One net-usage series per customer model.
    fn bootstrap_records(&self) -> Vec<BootstrapRecord>;
}

/// Tariff subscription repository.
pub trait SubscriptionRepo {
    /// Every broker known to the repository, in broker order.
    fn brokers(&self) -> Vec<BrokerId>;

    /// Active subscriptions held by `broker`.
    fn active_subscriptions(&self, broker: &BrokerId) -> Vec<Subscription>;
}

/// Per-timeslot magnitudes of the summed customer usage in a bootstrap record set.
///
/// Series of unequal length are summed over the customers that cover each
/// timeslot.
pub fn bootstrap_magnitudes(records: &[BootstrapRecord]) -> Vec<f64> {
    let len = records.iter().map(|r| r.net_usage.len()).max().unwrap_or(0);
    (0..len)
        .map(|t| {
            records
                .iter()
                .filter_map(|r| r.net_usage.get(t))
                .sum::<f64>()
                .abs()
        })
        .collect()
}
