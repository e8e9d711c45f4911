use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::config::{BrokerConfig, SimulationConfig};
use crate::utility::types::{
    BrokerId, CustomerClass, CustomerInfo, Subscription, UsageByType, UsageType,
};

/// Per-tick consumption and production of one broker's customer population.
///
/// Consumption follows a daily sinusoid around the population's mean with
/// Gaussian noise; production is a half-sine solar shape between sunrise
/// and sunset. Both are reported in broker-net convention: consumption
/// negative, production positive.
///
/// # Examples
///
/// ```
/// use du_sim::config::{BrokerConfig, SimulationConfig};
/// use du_sim::population::BrokerLoad;
///
/// let broker = BrokerConfig { noise_std: 0.0, ..BrokerConfig::default() };
/// let mut load = BrokerLoad::from_config(&broker, &SimulationConfig::default(), 42);
///
/// // no production at midnight, so net usage is pure consumption
/// let net = load.net_usage_kwh(0);
/// assert!(net < 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct BrokerLoad {
    /// Broker serving the population.
    pub broker: BrokerId,

    /// Committed small-class customers.
    pub small_customers: u32,

    /// Committed large-class customers.
    pub large_customers: u32,

    /// Mean consumption of the whole population per tick (kWh).
    pub mean_kwh: f64,

    /// Daily swing as a fraction of `mean_kwh`.
    pub daily_swing: f64,

    /// Phase offset of the daily swing in radians.
    pub phase_rad: f64,

    /// Noise standard deviation as a fraction of consumption.
    pub noise_std: f64,

    /// Population solar production at the daily peak (kWh per tick).
    pub solar_peak_kwh: f64,

    /// Probability that a tick reports no data.
    pub dropout_prob: f64,

    slots_per_day: usize,
    sunrise_slot: usize,
    sunset_slot: usize,
    rng: StdRng,
}

impl BrokerLoad {
    /// Builds a broker's load model from scenario configuration.
    ///
    /// # Arguments
    ///
    /// * `broker` - Broker population parameters
    /// * `sim` - Day length and sunrise/sunset slots
    /// * `seed` - Random seed for reproducible noise and dropouts
    pub fn from_config(broker: &BrokerConfig, sim: &SimulationConfig, seed: u64) -> Self {
        let mean_kwh = f64::from(broker.small_customers) * broker.small_kwh
            + f64::from(broker.large_customers) * broker.large_kwh;
        Self {
            broker: BrokerId::new(broker.name.as_str()),
            small_customers: broker.small_customers,
            large_customers: broker.large_customers,
            mean_kwh,
            daily_swing: broker.daily_swing,
            phase_rad: broker.phase_rad,
            noise_std: broker.noise_std.max(0.0),
            solar_peak_kwh: f64::from(broker.small_customers) * broker.solar_kwh_peak,
            dropout_prob: broker.dropout_prob.clamp(0.0, 1.0),
            slots_per_day: sim.slots_per_day.max(1),
            sunrise_slot: sim.sunrise_slot,
            sunset_slot: sim.sunset_slot,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Energy consumed by the population at `timeslot` (kWh, non-negative).
    pub fn consumption_kwh(&mut self, timeslot: usize) -> f64 {
        let day_pos = (timeslot % self.slots_per_day) as f64 / self.slots_per_day as f64;
        let angle = 2.0 * std::f64::consts::PI * day_pos + self.phase_rad;
        let shaped = self.mean_kwh * (1.0 + self.daily_swing * angle.sin());
        let noise = gaussian_noise(&mut self.rng, self.noise_std) * shaped;
        (shaped + noise).max(0.0)
    }

    /// Energy produced by the population's solar panels at `timeslot` (kWh).
    pub fn production_kwh(&self, timeslot: usize) -> f64 {
        self.solar_peak_kwh
            * daylight_frac(
                timeslot,
                self.slots_per_day,
                self.sunrise_slot,
                self.sunset_slot,
            )
    }

    /// Net usage at `timeslot`: production minus consumption.
    pub fn net_usage_kwh(&mut self, timeslot: usize) -> f64 {
        self.production_kwh(timeslot) - self.consumption_kwh(timeslot)
    }

    /// Usage report for `timeslot`, or `None` when the broker drops out.
    ///
    /// The dropout roll is drawn every tick so the noise sequence does not
    /// depend on how many ticks dropped out.
    pub fn usage(&mut self, timeslot: usize) -> Option<UsageByType> {
        let dropped = self.rng.random::<f64>() < self.dropout_prob;
        let consume = -self.consumption_kwh(timeslot);
        let produce = self.production_kwh(timeslot);
        if dropped {
            return None;
        }
        Some(UsageByType::from([
            (UsageType::Consume, consume),
            (UsageType::Produce, produce),
        ]))
    }

    /// Subscriptions the population holds with its broker.
    pub fn subscriptions(&self) -> Vec<Subscription> {
        let mut subs = Vec::with_capacity(2);
        if self.small_customers > 0 {
            subs.push(Subscription::new(
                CustomerInfo::new(format!("{}-residential", self.broker), CustomerClass::Small),
                self.small_customers,
            ));
        }
        if self.large_customers > 0 {
            subs.push(Subscription::new(
                CustomerInfo::new(format!("{}-commercial", self.broker), CustomerClass::Large),
                self.large_customers,
            ));
        }
        subs
    }
}

/// Half-sine daylight fraction in `[0, 1]`, zero outside `[sunrise, sunset)`.
pub fn daylight_frac(timeslot: usize, slots_per_day: usize, sunrise: usize, sunset: usize) -> f64 {
    let slot = timeslot % slots_per_day.max(1);
    if slot < sunrise || slot >= sunset {
        return 0.0;
    }
    let span = (sunset - sunrise) as f64;
    let x = (slot - sunrise) as f64 + 0.5;
    (std::f64::consts::PI * x / span).sin()
}

/// Gaussian noise with mean 0 and standard deviation `std_dev` (Box-Muller).
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_broker() -> BrokerConfig {
        BrokerConfig {
            name: "alpha".to_string(),
            small_customers: 10,
            large_customers: 1,
            small_kwh: 1.0,
            large_kwh: 10.0,
            daily_swing: 0.0,
            noise_std: 0.0,
            solar_kwh_peak: 0.5,
            dropout_prob: 0.0,
            ..BrokerConfig::default()
        }
    }

    #[test]
    fn flat_noiseless_consumption_is_mean() {
        let mut load = BrokerLoad::from_config(&quiet_broker(), &SimulationConfig::default(), 1);
        for t in 0..48 {
            assert!((load.consumption_kwh(t) - 20.0).abs() < 1e-9);
        }
    }

    #[test]
    fn no_solar_at_night() {
        let load = BrokerLoad::from_config(&quiet_broker(), &SimulationConfig::default(), 1);
        assert_eq!(load.production_kwh(0), 0.0);
        assert_eq!(load.production_kwh(23), 0.0);
        assert!(load.production_kwh(12) > 4.9);
        assert!(load.production_kwh(12) <= 5.0);
    }

    #[test]
    fn usage_uses_broker_net_signs() {
        let mut load = BrokerLoad::from_config(&quiet_broker(), &SimulationConfig::default(), 1);
        let usage = load.usage(12).unwrap_or_default();
        assert!(usage[&UsageType::Consume] < 0.0);
        assert!(usage[&UsageType::Produce] > 0.0);
    }

    #[test]
    fn full_dropout_never_reports() {
        let broker = BrokerConfig {
            dropout_prob: 1.0,
            ..quiet_broker()
        };
        let mut load = BrokerLoad::from_config(&broker, &SimulationConfig::default(), 1);
        assert!((0..24).all(|t| load.usage(t).is_none()));
    }

    #[test]
    fn same_seed_same_noise() {
        let broker = BrokerConfig {
            noise_std: 0.2,
            ..quiet_broker()
        };
        let sim = SimulationConfig::default();
        let mut a = BrokerLoad::from_config(&broker, &sim, 9);
        let mut b = BrokerLoad::from_config(&broker, &sim, 9);
        for t in 0..24 {
            assert_eq!(a.consumption_kwh(t), b.consumption_kwh(t));
        }
    }

    #[test]
    fn subscriptions_by_class() {
        let load = BrokerLoad::from_config(&quiet_broker(), &SimulationConfig::default(), 1);
        let subs = load.subscriptions();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].customer.class, CustomerClass::Small);
        assert_eq!(subs[0].customers_committed, 10);
        assert_eq!(subs[1].customers_committed, 1);
    }

    #[test]
    fn daylight_frac_is_symmetric() {
        let a = daylight_frac(6, 24, 6, 18);
        let b = daylight_frac(17, 24, 6, 18);
        assert!((a - b).abs() < 1e-12);
        assert_eq!(daylight_frac(30, 24, 6, 18), daylight_frac(6, 24, 6, 18));
    }
}
