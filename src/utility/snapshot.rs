//! Per-timeslot broker usage snapshots with explicit "no data" markers.

use std::collections::BTreeMap;

use super::types::{BrokerId, SupplyDemand, Timeslot, net_usage};

/// Net usage of every known broker at one timeslot.
///
/// A broker mapped to `None` reported no data and is excluded from the
/// timeslot's total and from any allocation against it.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageSnapshot {
    timeslot: Timeslot,
    usage: BTreeMap<BrokerId, Option<f64>>,
}

impl UsageSnapshot {
    /// Creates an empty snapshot for `timeslot`.
    pub fn new(timeslot: Timeslot) -> Self {
        Self {
            timeslot,
            usage: BTreeMap::new(),
        }
    }

    /// Builds a snapshot from the accounting collaborator's supply/demand report.
    pub fn from_supply_demand(timeslot: Timeslot, supply_demand: &SupplyDemand) -> Self {
        let usage = supply_demand
            .iter()
            .map(|(broker, usage)| (broker.clone(), usage.as_ref().map(net_usage)))
            .collect();
        Self { timeslot, usage }
    }

    /// Adds a broker's net usage, or a no-data marker when `net_kwh` is `None`.
    pub fn with_broker(mut self, broker: impl Into<BrokerId>, net_kwh: Option<f64>) -> Self {
        self.usage.insert(broker.into(), net_kwh);
        self
    }

    /// Timeslot this snapshot describes.
    pub fn timeslot(&self) -> Timeslot {
        self.timeslot
    }

    /// Net usage of `broker`, `None` if it is unknown or reported no data.
    pub fn get(&self, broker: &BrokerId) -> Option<f64> {
        self.usage.get(broker).copied().flatten()
    }

    /// Brokers that reported data, with their net usage, in broker order.
    pub fn present(&self) -> impl Iterator<Item = (&BrokerId, f64)> {
        self.usage
            .iter()
            .filter_map(|(broker, usage)| usage.map(|kwh| (broker, kwh)))
    }

    /// Every broker listed in the snapshot, including those without data.
    pub fn brokers(&self) -> impl Iterator<Item = &BrokerId> {
        self.usage.keys()
    }

    /// `|sum of present brokers' net usage|`, or `None` when no broker reported.
    pub fn total_magnitude(&self) -> Option<f64> {
        let mut present = self.present().peekable();
        present.peek()?;
        Some(present.map(|(_, kwh)| kwh).sum::<f64>().abs())
    }
}

/// Timeslot-indexed store of usage snapshots.
#[derive(Debug, Clone, Default)]
pub struct UsageSnapshotStore {
    snapshots: BTreeMap<Timeslot, UsageSnapshot>,
}

impl UsageSnapshotStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a snapshot, replacing any earlier one for the same timeslot.
    pub fn record(&mut self, snapshot: UsageSnapshot) {
        self.snapshots.insert(snapshot.timeslot(), snapshot);
    }

    /// Returns the snapshot for `timeslot`, if retained.
    pub fn get(&self, timeslot: Timeslot) -> Option<&UsageSnapshot> {
        self.snapshots.get(&timeslot)
    }

    /// Total usage magnitude at `timeslot`; `None` if absent or no broker reported.
    pub fn total_magnitude(&self, timeslot: Timeslot) -> Option<f64> {
        self.get(timeslot).and_then(UsageSnapshot::total_magnitude)
    }

    /// Drops every snapshot older than `timeslot`.
    pub fn prune_before(&mut self, timeslot: Timeslot) {
        self.snapshots = self.snapshots.split_off(&timeslot);
    }

    /// Number of retained snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns `true` when no snapshot is retained.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
