//! Per-meter distribution fee.

use super::types::{BrokerId, CustomerClass, DistributionTransaction, Subscription};

/// Charges each broker a fixed rate per committed customer, by size class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterFeeCalculator {
    m_small: f64,
    m_large: f64,
}

impl MeterFeeCalculator {
    /// Creates a calculator with per-meter rates for small and large customers.
    pub fn new(m_small: f64, m_large: f64) -> Self {
        Self { m_small, m_large }
    }

    /// Computes one broker's meter charge.
    ///
    /// Returns `None` when the broker holds no active subscription.
    ///
    /// # Examples
    ///
    /// ```
    /// use du_sim::utility::meter::MeterFeeCalculator;
    /// use du_sim::utility::types::{BrokerId, CustomerClass, CustomerInfo, Subscription};
    ///
    /// let calc = MeterFeeCalculator::new(0.12, 0.18);
    /// let subs = [
    ///     Subscription::new(CustomerInfo::new("Podunk", CustomerClass::Small), 30),
    ///     Subscription::new(CustomerInfo::new("Acme", CustomerClass::Large), 8),
    /// ];
    /// let tx = calc.charge(&BrokerId::from("b1"), &subs).expect("broker has subscriptions");
    /// assert_eq!((tx.small_meters, tx.large_meters), (30, 8));
    /// assert!((tx.fee - (30.0 * 0.12 + 8.0 * 0.18)).abs() < 1e-9);
    /// ```
    pub fn charge(
        &self,
        broker: &BrokerId,
        subscriptions: &[Subscription],
    ) -> Option<DistributionTransaction> {
        if subscriptions.is_empty() {
            return None;
        }

        // summed in u64 so many u32 commitments cannot wrap
        let (small, large) = subscriptions.iter().fold((0_u64, 0_u64), |(small, large), sub| {
            let committed = u64::from(sub.customers_committed);
            match sub.customer.class {
                CustomerClass::Small => (small.saturating_add(committed), large),
                CustomerClass::Large => (small, large.saturating_add(committed)),
            }
        });

        Some(DistributionTransaction {
            broker: broker.clone(),
            small_meters: small,
            large_meters: large,
            kwh: 0.0,
            fee: small as f64 * self.m_small + large as f64 * self.m_large,
        })
    }
}
