//! Per-tick orchestration of capacity, meter, and transport billing.

use std::collections::{BTreeMap, VecDeque};

use tracing::{debug, info};

use crate::config::DistributionConfig;
use crate::error::EngineError;

use super::capacity::CapacityFeeAllocator;
use super::meter::MeterFeeCalculator;
use super::ports::{Accounting, BootstrapSource, SubscriptionRepo, bootstrap_magnitudes};
use super::snapshot::{UsageSnapshot, UsageSnapshotStore};
use super::stats::RunningStatistics;
use super::transport::{FlatTransportRate, TransportFeeCalculator, TransportRate};
use super::types::{
    BrokerId, CapacityTransaction, DistributionTransaction, Timeslot, delivered_kwh,
};
use super::window::PeakWindowAssessor;

/// Everything the engine posted during one `activate` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Timeslot that was activated.
    pub timeslot: Timeslot,
    /// Threshold applied if a window was assessed on this tick.
    pub threshold: Option<f64>,
    /// Capacity transactions posted, peak by peak, brokers in order.
    pub capacity: Vec<CapacityTransaction>,
    /// Meter/transport transactions posted, in broker order.
    pub distribution: Vec<DistributionTransaction>,
}

/// A charge waiting to be accepted by the ledger.
#[derive(Debug, Clone, PartialEq)]
enum Posting {
    Capacity(CapacityTransaction),
    Distribution(DistributionTransaction),
}

/// Distribution utility: bills brokers for grid capacity and distribution.
///
/// Generic over its collaborators for static dispatch. Owns all mutable
/// billing state; every change happens inside [`activate`](Self::activate).
///
/// # Examples
///
/// ```
/// use du_sim::config::DistributionConfig;
/// use du_sim::ledger::InMemoryLedger;
/// use du_sim::repo::{InMemoryBootstrap, InMemorySubscriptionRepo};
/// use du_sim::utility::engine::DistributionUtilityEngine;
///
/// let config = DistributionConfig {
///     use_capacity_fee: true,
///     ..DistributionConfig::default()
/// };
/// let bootstrap = InMemoryBootstrap::from_series("Podunk", vec![-5.0, -8.0, -11.0, -14.0]);
/// let engine = DistributionUtilityEngine::initialize(
///     config,
///     &bootstrap,
///     InMemoryLedger::new(),
///     InMemorySubscriptionRepo::new(),
/// )
/// .expect("valid configuration");
/// assert_eq!(engine.running_count(), 4);
/// assert!((engine.running_mean() - 9.5).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct DistributionUtilityEngine<A: Accounting, S: SubscriptionRepo> {
    config: DistributionConfig,
    stats: RunningStatistics,
    snapshots: UsageSnapshotStore,
    assessor: PeakWindowAssessor,
    allocator: CapacityFeeAllocator,
    meter: MeterFeeCalculator,
    transport: TransportFeeCalculator,
    accounting: A,
    subscriptions: S,
    pending: VecDeque<Posting>,
    last_timeslot: Option<Timeslot>,
}

impl<A: Accounting, S: SubscriptionRepo> DistributionUtilityEngine<A, S> {
    /// Validates the configuration, seeds the usage statistics, and takes
    /// ownership of the collaborators.
    ///
    /// # Arguments
    ///
    /// * `config` - Engine configuration
    /// * `bootstrap` - Historical per-customer usage used to seed the statistics
    /// * `accounting` - Supply/demand source and transaction sink
    /// * `subscriptions` - Tariff subscription repository
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] with every validation problem found.
    pub fn initialize(
        config: DistributionConfig,
        bootstrap: &impl BootstrapSource,
        accounting: A,
        subscriptions: S,
    ) -> Result<Self, EngineError> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(EngineError::Config(errors));
        }

        let mut stats = RunningStatistics::new();
        stats.seed(bootstrap_magnitudes(&bootstrap.bootstrap_records()));
        info!(
            seeded = stats.count(),
            mean = stats.mean(),
            sigma = stats.sigma(),
            capacity = config.use_capacity_fee,
            meter = config.use_meter_fee,
            transport = config.use_transport_fee,
            "distribution utility initialized"
        );

        Ok(Self {
            stats,
            snapshots: UsageSnapshotStore::new(),
            assessor: PeakWindowAssessor::new(config.assessment_interval, config.assessment_count),
            allocator: CapacityFeeAllocator::new(config.fee_per_point),
            meter: MeterFeeCalculator::new(config.m_small, config.m_large),
            transport: TransportFeeCalculator::new(FlatTransportRate::new(config.transport_rate)),
            config,
            accounting,
            subscriptions,
            pending: VecDeque::new(),
            last_timeslot: None,
        })
    }

    /// Replaces the flat transport rate with a custom schedule.
    pub fn with_transport_rate(mut self, rate: impl TransportRate + 'static) -> Self {
        self.transport = TransportFeeCalculator::new(rate);
        self
    }

    /// Processes one tick.
    ///
    /// Assesses the previous window when it is complete, records this
    /// tick's usage, and posts meter and transport charges. Windows count
    /// activations, not timeslot numbers: a window of `assessment_interval`
    /// closes after that many `activate` calls even when the timeslots
    /// between them skip values.
    ///
    /// Charges are queued before posting and leave the queue only once the
    /// ledger accepts them. If the ledger refuses one, the tick's usage is
    /// still recorded and the refused charge, with everything queued after
    /// it, is posted first on the next call to `activate` or
    /// [`retry_pending`](Self::retry_pending).
    ///
    /// # Arguments
    ///
    /// * `time_hr` - Simulation time of the tick (hours), used for logging
    /// * `timeslot` - Timeslot index; must increase on every call
    ///
    /// # Returns
    ///
    /// A [`TickReport`] listing every transaction posted, earlier backlog
    /// included.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutOfOrder`] without touching any state if
    /// `timeslot` does not advance, or [`EngineError::Ledger`] if the ledger
    /// refuses a transaction.
    pub fn activate(&mut self, time_hr: f64, timeslot: Timeslot) -> Result<TickReport, EngineError> {
        if let Some(last) = self.last_timeslot
            && timeslot <= last
        {
            return Err(EngineError::OutOfOrder {
                last,
                got: timeslot,
            });
        }

        let supply_demand = self.accounting.current_supply_demand_by_broker();
        let mut report = TickReport {
            timeslot,
            ..TickReport::default()
        };

        if self.config.use_capacity_fee {
            report.threshold = self.assess_due_window();

            let snapshot = UsageSnapshot::from_supply_demand(timeslot, &supply_demand);
            let magnitude = snapshot.total_magnitude();
            self.snapshots.record(snapshot);
            if let Some(magnitude) = magnitude {
                self.stats.observe(magnitude);
            }
            self.assessor.push(timeslot, magnitude);
            debug!(
                time_hr,
                timeslot,
                ?magnitude,
                mean = self.stats.mean(),
                sigma = self.stats.sigma(),
                "usage recorded"
            );
        }
        self.last_timeslot = Some(timeslot);

        if self.config.use_meter_fee || self.config.use_transport_fee {
            let mut charges: BTreeMap<BrokerId, DistributionTransaction> = BTreeMap::new();

            if self.config.use_meter_fee {
                for broker in self.subscriptions.brokers() {
                    let subs = self.subscriptions.active_subscriptions(&broker);
                    if let Some(tx) = self.meter.charge(&broker, &subs) {
                        charges.insert(broker, tx);
                    }
                }
            }

            if self.config.use_transport_fee {
                for (broker, usage) in &supply_demand {
                    let Some(usage) = usage else { continue };
                    let tx = self.transport.charge(broker, delivered_kwh(usage));
                    charges
                        .entry(broker.clone())
                        .and_modify(|combined| {
                            combined.kwh = tx.kwh;
                            combined.fee += tx.fee;
                        })
                        .or_insert(tx);
                }
            }

            self.pending
                .extend(charges.into_values().map(Posting::Distribution));
        }

        self.post_pending(&mut report)?;
        Ok(report)
    }

    /// Posts charges a previous call left queued after a ledger refusal.
    ///
    /// # Returns
    ///
    /// A [`TickReport`] for the last activated timeslot listing the
    /// transactions posted by this call.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Ledger`] if the ledger refuses a transaction
    /// again; it stays queued together with everything after it.
    pub fn retry_pending(&mut self) -> Result<TickReport, EngineError> {
        let mut report = TickReport {
            timeslot: self.last_timeslot.unwrap_or_default(),
            ..TickReport::default()
        };
        self.post_pending(&mut report)?;
        Ok(report)
    }

    /// Number of charges still waiting for the ledger.
    pub fn pending_postings(&self) -> usize {
        self.pending.len()
    }

    /// Selects the due window's peaks and queues their capacity charges.
    ///
    /// Returns the threshold applied, if a window was due.
    fn assess_due_window(&mut self) -> Option<f64> {
        let window = self.assessor.take_due()?;

        let threshold = self.stats.threshold(self.config.std_coefficient);
        debug!(
            start = ?window.start,
            end = ?window.end,
            peaks = window.peaks.len(),
            threshold,
            "assessing window"
        );

        for peak in &window.peaks {
            let Some(snapshot) = self.snapshots.get(peak.timeslot) else {
                continue;
            };
            let charges = self.allocator.allocate(peak, snapshot, threshold);
            self.pending.extend(charges.into_iter().map(Posting::Capacity));
        }

        if let Some(end) = window.end {
            self.snapshots.prune_before(end + 1);
        }
        Some(threshold)
    }

    /// Posts queued charges in order, stopping at the first refusal.
    fn post_pending(&mut self, report: &mut TickReport) -> Result<(), EngineError> {
        while let Some(posting) = self.pending.front() {
            match posting {
                Posting::Capacity(tx) => {
                    self.accounting.add_capacity_transaction(tx.clone())?;
                    report.capacity.push(tx.clone());
                }
                Posting::Distribution(tx) => {
                    self.accounting.add_distribution_transaction(tx.clone())?;
                    report.distribution.push(tx.clone());
                }
            }
            self.pending.pop_front();
        }
        Ok(())
    }

    /// Whether capacity fees are billed.
    pub fn using_capacity_fee(&self) -> bool {
        self.config.use_capacity_fee
    }

    /// Assessment window length in ticks.
    pub fn assessment_interval(&self) -> usize {
        self.config.assessment_interval
    }

    /// Peaks billed per window.
    pub fn assessment_count(&self) -> usize {
        self.config.assessment_count
    }

    /// Sigma multiplier of the threshold.
    pub fn std_coefficient(&self) -> f64 {
        self.config.std_coefficient
    }

    /// Charge per excess kWh.
    pub fn fee_per_point(&self) -> f64 {
        self.allocator.fee_per_point()
    }

    /// Running mean of total usage magnitude.
    pub fn running_mean(&self) -> f64 {
        self.stats.mean()
    }

    /// Running sample standard deviation of total usage magnitude.
    pub fn running_sigma(&self) -> f64 {
        self.stats.sigma()
    }

    /// Observations behind the running statistics, bootstrap included.
    pub fn running_count(&self) -> u64 {
        self.stats.count()
    }

    /// Number of windows assessed so far.
    pub fn windows_assessed(&self) -> usize {
        self.assessor.windows_assessed()
    }

    /// Returns a reference to the engine configuration.
    pub fn config(&self) -> &DistributionConfig {
        &self.config
    }

    /// Returns a reference to the accounting collaborator.
    pub fn accounting(&self) -> &A {
        &self.accounting
    }

    /// Returns a mutable reference to the accounting collaborator.
    pub fn accounting_mut(&mut self) -> &mut A {
        &mut self.accounting
    }

    /// Returns a reference to the subscription repository.
    pub fn subscriptions(&self) -> &S {
        &self.subscriptions
    }

    /// Consumes the engine and returns its accounting collaborator.
    pub fn into_accounting(self) -> A {
        self.accounting
    }
}
