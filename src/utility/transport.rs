//! Per-kWh transport fee with a pluggable rate schedule.

use super::types::{BrokerId, DistributionTransaction};

/// Rate schedule for energy transported on behalf of a broker.
pub trait TransportRate: std::fmt::Debug {
    /// Charge for transporting `kwh` for `broker`.
    fn fee(&self, broker: &BrokerId, kwh: f64) -> f64;
}

/// Same price per kWh for every broker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatTransportRate {
    /// Price per transported kWh.
    pub rate_per_kwh: f64,
}

impl FlatTransportRate {
    /// Creates a flat rate.
    pub fn new(rate_per_kwh: f64) -> Self {
        Self { rate_per_kwh }
    }
}

impl TransportRate for FlatTransportRate {
    fn fee(&self, _broker: &BrokerId, kwh: f64) -> f64 {
        kwh * self.rate_per_kwh
    }
}

/// Charges each broker for the energy delivered to its customers.
#[derive(Debug)]
pub struct TransportFeeCalculator {
    rate: Box<dyn TransportRate>,
}

impl TransportFeeCalculator {
    /// Creates a calculator using `rate`.
    pub fn new(rate: impl TransportRate + 'static) -> Self {
        Self {
            rate: Box::new(rate),
        }
    }

    /// Computes one broker's transport charge for `delivered_kwh`.
    pub fn charge(&self, broker: &BrokerId, delivered_kwh: f64) -> DistributionTransaction {
        DistributionTransaction {
            broker: broker.clone(),
            small_meters: 0,
            large_meters: 0,
            kwh: delivered_kwh,
            fee: self.rate.fee(broker, delivered_kwh),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct PerBroker;

    impl TransportRate for PerBroker {
        fn fee(&self, broker: &BrokerId, kwh: f64) -> f64 {
            if broker.as_str() == "discounted" {
                kwh * 0.01
            } else {
                kwh * 0.02
            }
        }
    }

    #[test]
    fn flat_rate_scales_with_kwh() {
        let calc = TransportFeeCalculator::new(FlatTransportRate::new(0.05));
        let tx = calc.charge(&BrokerId::from("b"), 12.0);
        assert_eq!(tx.kwh, 12.0);
        assert!((tx.fee - 0.6).abs() < 1e-12);
        assert_eq!((tx.small_meters, tx.large_meters), (0, 0));
    }

    #[test]
    fn custom_rate_schedule_is_used() {
        let calc = TransportFeeCalculator::new(PerBroker);
        let a = calc.charge(&BrokerId::from("discounted"), 100.0);
        let b = calc.charge(&BrokerId::from("regular"), 100.0);
        assert!((a.fee - 1.0).abs() < 1e-12);
        assert!((b.fee - 2.0).abs() < 1e-12);
    }
}
