//! Post-hoc billing summary computed from tick reports.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::engine::TickReport;
use super::types::{BrokerId, Timeslot};

/// Charges accumulated by one broker over a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrokerBill {
    /// Excess kWh billed at peaks.
    pub capacity_kwh: f64,
    /// Capacity fees.
    pub capacity_fee: f64,
    /// Peaks the broker was charged a non-zero amount for.
    pub peaks_charged: usize,
    /// Transported kWh.
    pub distribution_kwh: f64,
    /// Meter and transport fees.
    pub distribution_fee: f64,
}

impl BrokerBill {
    /// Sum of capacity and distribution fees.
    pub fn total_fee(&self) -> f64 {
        self.capacity_fee + self.distribution_fee
    }
}

/// Aggregate billing figures derived from a complete run.
///
/// Computed post-hoc from `&[TickReport]` so the summary always agrees
/// with what was posted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BillingReport {
    /// Number of ticks processed.
    pub ticks: usize,
    /// Number of windows assessed.
    pub windows_assessed: usize,
    /// Distinct peak timeslots that produced capacity transactions.
    pub peaks_billed: usize,
    /// Highest threshold applied in the run.
    pub max_threshold: Option<f64>,
    /// Per-broker totals, in broker order.
    pub brokers: BTreeMap<BrokerId, BrokerBill>,
}

impl BillingReport {
    /// Computes the summary from every tick report of a run.
    pub fn from_reports(reports: &[TickReport]) -> Self {
        let mut brokers: BTreeMap<BrokerId, BrokerBill> = BTreeMap::new();
        let mut peaks: BTreeSet<Timeslot> = BTreeSet::new();
        let mut windows_assessed = 0;
        let mut max_threshold: Option<f64> = None;

        for r in reports {
            if let Some(threshold) = r.threshold {
                windows_assessed += 1;
                max_threshold = Some(max_threshold.map_or(threshold, |m| m.max(threshold)));
            }
            for tx in &r.capacity {
                peaks.insert(tx.peak_timeslot);
                let bill = brokers.entry(tx.broker.clone()).or_default();
                bill.capacity_kwh += tx.kwh;
                bill.capacity_fee += tx.fee;
                if tx.kwh > 0.0 {
                    bill.peaks_charged += 1;
                }
            }
            for tx in &r.distribution {
                let bill = brokers.entry(tx.broker.clone()).or_default();
                bill.distribution_kwh += tx.kwh;
                bill.distribution_fee += tx.fee;
            }
        }

        Self {
            ticks: reports.len(),
            windows_assessed,
            peaks_billed: peaks.len(),
            max_threshold,
            brokers,
        }
    }

    /// Capacity fees across all brokers.
    pub fn total_capacity_fees(&self) -> f64 {
        self.brokers.values().map(|b| b.capacity_fee).sum()
    }

    /// Meter and transport fees across all brokers.
    pub fn total_distribution_fees(&self) -> f64 {
        self.brokers.values().map(|b| b.distribution_fee).sum()
    }
}

impl fmt::Display for BillingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Billing Report ---")?;
        writeln!(f, "Ticks processed:       {}", self.ticks)?;
        writeln!(f, "Windows assessed:      {}", self.windows_assessed)?;
        writeln!(f, "Peaks billed:          {}", self.peaks_billed)?;
        match self.max_threshold {
            Some(t) => writeln!(f, "Max threshold:         {t:.2} kWh")?,
            None => writeln!(f, "Max threshold:         n/a")?,
        }
        writeln!(f, "Capacity fees:         {:.2}", self.total_capacity_fees())?;
        writeln!(f, "Distribution fees:     {:.2}", self.total_distribution_fees())?;
        for (broker, bill) in &self.brokers {
            writeln!(
                f,
                "  {broker:<12} capacity {:>9.3} kWh {:>10.2}  distribution {:>10.2}  total {:>10.2}",
                bill.capacity_kwh,
                bill.capacity_fee,
                bill.distribution_fee,
                bill.total_fee()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utility::types::{CapacityTransaction, DistributionTransaction};

    fn capacity(broker: &str, peak: Timeslot, kwh: f64) -> CapacityTransaction {
        CapacityTransaction {
            broker: broker.into(),
            peak_timeslot: peak,
            threshold: 10.0,
            kwh,
            fee: kwh * 10.0,
        }
    }

    fn meter(broker: &str, fee: f64) -> DistributionTransaction {
        DistributionTransaction {
            broker: broker.into(),
            small_meters: 1,
            large_meters: 0,
            kwh: 0.0,
            fee,
        }
    }

    #[test]
    fn empty_reports_give_empty_summary() {
        let report = BillingReport::from_reports(&[]);
        assert_eq!(report.ticks, 0);
        assert_eq!(report.max_threshold, None);
        assert_eq!(report.total_capacity_fees(), 0.0);
    }

    #[test]
    fn sums_per_broker_and_counts_peaks() {
        let reports = vec![
            TickReport {
                timeslot: 0,
                threshold: None,
                capacity: vec![],
                distribution: vec![meter("a", 1.0), meter("b", 2.0)],
            },
            TickReport {
                timeslot: 1,
                threshold: Some(12.0),
                capacity: vec![capacity("a", 0, 0.5), capacity("b", 0, 0.0)],
                distribution: vec![meter("a", 1.0)],
            },
        ];
        let report = BillingReport::from_reports(&reports);
        assert_eq!(report.ticks, 2);
        assert_eq!(report.windows_assessed, 1);
        assert_eq!(report.peaks_billed, 1);
        assert_eq!(report.max_threshold, Some(12.0));

        let a = &report.brokers[&BrokerId::from("a")];
        assert!((a.capacity_fee - 5.0).abs() < 1e-12);
        assert!((a.distribution_fee - 2.0).abs() < 1e-12);
        assert_eq!(a.peaks_charged, 1);
        assert_eq!(report.brokers[&BrokerId::from("b")].peaks_charged, 0);
        assert!((report.total_distribution_fees() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn display_lists_brokers() {
        let reports = vec![TickReport {
            timeslot: 0,
            distribution: vec![meter("north", 1.5)],
            ..TickReport::default()
        }];
        let text = BillingReport::from_reports(&reports).to_string();
        assert!(text.starts_with("--- Billing Report ---"));
        assert!(text.contains("north"));
        assert!(text.contains("Max threshold:         n/a"));
    }
}
