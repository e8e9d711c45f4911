//! Core distribution-utility types: broker identity, usage, customers, and billing records.

use std::collections::BTreeMap;
use std::fmt;

/// Discrete simulation timeslot index.
pub type Timeslot = usize;

/// Identity of a market participant whose usage is tracked and billed.
///
/// Ordered by name so that every per-broker iteration is deterministic.
///
/// # Examples
///
/// ```
/// use du_sim::utility::types::BrokerId;
///
/// let a = BrokerId::from("alpha");
/// let b = BrokerId::from("beta");
/// assert!(a < b);
/// assert_eq!(a.to_string(), "alpha");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BrokerId(String);

impl BrokerId {
    /// Creates a broker identity from any string-like name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the broker name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BrokerId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for BrokerId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for BrokerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Kind of energy flow reported by the accounting collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UsageType {
    /// Energy drawn from the grid (negative kWh).
    Consume,
    /// Energy fed into the grid (positive kWh).
    Produce,
}

/// Signed kWh per usage type for one broker at one timeslot.
pub type UsageByType = BTreeMap<UsageType, f64>;

/// Current supply/demand for every known broker.
///
/// `None` marks a broker with no data this tick, which is different from zero usage.
pub type SupplyDemand = BTreeMap<BrokerId, Option<UsageByType>>;

/// Net usage of one broker: the sum of its usage entries (negative = net consumption).
pub fn net_usage(usage: &UsageByType) -> f64 {
    usage.values().sum()
}

/// Energy delivered to one broker's customers: the magnitude of its consumption entries.
pub fn delivered_kwh(usage: &UsageByType) -> f64 {
    usage
        .iter()
        .filter(|(kind, _)| **kind == UsageType::Consume)
        .map(|(_, kwh)| kwh.abs())
        .sum()
}

/// Customer size class used for per-meter fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomerClass {
    /// Households and small businesses.
    Small,
    /// Industrial and commercial customers.
    Large,
}

/// A customer model: a named population of identical customers.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerInfo {
    /// Customer model name.
    pub name: String,
    /// Size class of every customer in the population.
    pub class: CustomerClass,
}

impl CustomerInfo {
    /// Creates a customer model.
    pub fn new(name: impl Into<String>, class: CustomerClass) -> Self {
        Self {
            name: name.into(),
            class,
        }
    }
}

/// An active tariff subscription held by a broker.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    /// Subscribed customer model.
    pub customer: CustomerInfo,
    /// Number of individual customers (meters) committed to the tariff.
    pub customers_committed: u32,
}

impl Subscription {
    /// Creates a subscription for `customers_committed` customers of `customer`.
    pub fn new(customer: CustomerInfo, customers_committed: u32) -> Self {
        Self {
            customer,
            customers_committed,
        }
    }
}

/// Historical net-usage series for one customer model, used to seed statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapRecord {
    /// Customer model name.
    pub customer: String,
    /// Net usage per historical timeslot (kWh, negative = consumption).
    pub net_usage: Vec<f64>,
}

/// Capacity charge for one broker's share of one billed peak.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityTransaction {
    /// Billed broker.
    pub broker: BrokerId,
    /// Timeslot of the peak.
    pub peak_timeslot: Timeslot,
    /// Threshold the peak was assessed against (kWh).
    pub threshold: f64,
    /// Broker's share of the excess above the threshold (kWh).
    pub kwh: f64,
    /// Charge for that share.
    pub fee: f64,
}

/// Per-tick meter and transport charge for one broker.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionTransaction {
    /// Billed broker.
    pub broker: BrokerId,
    /// Committed small-class customers (meters).
    pub small_meters: u64,
    /// Committed large-class customers (meters).
    pub large_meters: u64,
    /// Transported energy (kWh).
    pub kwh: f64,
    /// Total charge.
    pub fee: f64,
}
