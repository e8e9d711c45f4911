//! In-memory accounting ledger used by the scenario driver and tests.

use crate::error::LedgerError;
use crate::utility::ports::Accounting;
use crate::utility::types::{CapacityTransaction, DistributionTransaction, SupplyDemand};

/// Accounting collaborator that keeps everything in memory.
///
/// The driver sets the tick's supply/demand before each `activate` call;
/// posted transactions accumulate in posting order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    supply_demand: SupplyDemand,
    capacity: Vec<CapacityTransaction>,
    distribution: Vec<DistributionTransaction>,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the supply/demand reported for the next tick.
    pub fn set_supply_demand(&mut self, supply_demand: SupplyDemand) {
        self.supply_demand = supply_demand;
    }

    /// Capacity transactions posted so far.
    pub fn capacity_transactions(&self) -> &[CapacityTransaction] {
        &self.capacity
    }

    /// Meter/transport transactions posted so far.
    pub fn distribution_transactions(&self) -> &[DistributionTransaction] {
        &self.distribution
    }
}

impl Accounting for InMemoryLedger {
    fn current_supply_demand_by_broker(&self) -> SupplyDemand {
        self.supply_demand.clone()
    }

    fn add_capacity_transaction(&mut self, tx: CapacityTransaction) -> Result<(), LedgerError> {
        if !tx.fee.is_finite() {
            return Err(LedgerError::Rejected {
                kind: "capacity",
                broker: tx.broker.to_string(),
                reason: format!("non-finite fee {}", tx.fee),
            });
        }
        self.capacity.push(tx);
        Ok(())
    }

    fn add_distribution_transaction(
        &mut self,
        tx: DistributionTransaction,
    ) -> Result<(), LedgerError> {
        if !tx.fee.is_finite() {
            return Err(LedgerError::Rejected {
                kind: "distribution",
                broker: tx.broker.to_string(),
                reason: format!("non-finite fee {}", tx.fee),
            });
        }
        self.distribution.push(tx);
        Ok(())
    }
}
