//! Peak-responsibility capacity fee allocation.

use tracing::{debug, warn};

use super::snapshot::UsageSnapshot;
use super::types::CapacityTransaction;
use super::window::CandidatePeak;

/// Apportions the excess load of a confirmed peak across the brokers present at it.
///
/// Excess is `max(0, total_magnitude - threshold)`. Each present broker is
/// charged `min(1, |usage| / total_magnitude)` of the excess, at
/// `fee_per_point` per kWh. A peak that does not exceed the threshold still
/// produces zero-kWh bookkeeping transactions for every listed broker; a
/// peak with no load produces nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityFeeAllocator {
    fee_per_point: f64,
}

impl CapacityFeeAllocator {
    /// Creates an allocator charging `fee_per_point` per excess kWh.
    pub fn new(fee_per_point: f64) -> Self {
        Self { fee_per_point }
    }

    /// Charge per excess kWh.
    pub fn fee_per_point(&self) -> f64 {
        self.fee_per_point
    }

    /// Computes the capacity transactions for one peak.
    ///
    /// # Arguments
    ///
    /// * `peak` - Peak selected by the window assessor
    /// * `snapshot` - Broker usage at the peak's timeslot
    /// * `threshold` - Statistical threshold shared by every peak of the window
    ///
    /// # Returns
    ///
    /// One transaction per billed broker, in broker order.
    pub fn allocate(
        &self,
        peak: &CandidatePeak,
        snapshot: &UsageSnapshot,
        threshold: f64,
    ) -> Vec<CapacityTransaction> {
        let total = peak.total_magnitude;
        if total <= 0.0 {
            warn!(timeslot = peak.timeslot, "peak has no load, skipping allocation");
            return Vec::new();
        }

        let excess = (total - threshold).max(0.0);
        debug!(
            timeslot = peak.timeslot,
            total, threshold, excess, "allocating capacity excess"
        );

        if excess == 0.0 {
            return snapshot
                .brokers()
                .map(|broker| CapacityTransaction {
                    broker: broker.clone(),
                    peak_timeslot: peak.timeslot,
                    threshold,
                    kwh: 0.0,
                    fee: 0.0,
                })
                .collect();
        }

        snapshot
            .present()
            .map(|(broker, usage)| {
                let share = (usage.abs() / total).min(1.0);
                let kwh = share * excess;
                CapacityTransaction {
                    broker: broker.clone(),
                    peak_timeslot: peak.timeslot,
                    threshold,
                    kwh,
                    fee: kwh * self.fee_per_point,
                }
            })
            .collect()
    }
}
