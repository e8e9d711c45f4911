//! Distribution utility: capacity, meter, and transport billing of brokers.

pub mod capacity;
pub mod engine;
pub mod meter;
pub mod ports;
pub mod report;
pub mod snapshot;
pub mod stats;
pub mod transport;
pub mod types;
pub mod window;

pub use capacity::CapacityFeeAllocator;
pub use engine::{DistributionUtilityEngine, TickReport};
pub use meter::MeterFeeCalculator;
pub use ports::{Accounting, BootstrapSource, SubscriptionRepo};
pub use report::{BillingReport, BrokerBill};
pub use snapshot::{UsageSnapshot, UsageSnapshotStore};
pub use stats::RunningStatistics;
pub use transport::{FlatTransportRate, TransportFeeCalculator, TransportRate};
pub use types::{
    BootstrapRecord, BrokerId, CapacityTransaction, CustomerClass, CustomerInfo,
    DistributionTransaction, Subscription, SupplyDemand, Timeslot, UsageByType, UsageType,
};
pub use window::{AssessedWindow, AssessmentWindow, CandidatePeak, PeakWindowAssessor, WindowState};
