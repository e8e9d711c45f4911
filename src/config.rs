//! Engine configuration, TOML scenario configuration, and preset definitions.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Prefix carried by distribution-utility keys in a shared property map.
pub const PROPERTY_PREFIX: &str = "distributionutility.distributionUtilityService.";

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"distribution.assessment_count"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Distribution-utility engine configuration.
///
/// Immutable once the engine is initialized. Every fee is disabled by
/// default; enable them in TOML under `[distribution]` or through
/// [`DistributionConfig::from_properties`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DistributionConfig {
    /// Bill brokers for their share of confirmed load peaks.
    pub use_capacity_fee: bool,
    /// Charge brokers per committed customer meter.
    pub use_meter_fee: bool,
    /// Charge brokers per kWh delivered to their customers.
    pub use_transport_fee: bool,
    /// Assessment window length in timeslots (must be > 0).
    pub assessment_interval: usize,
    /// Number of peaks billed per window (1..=assessment_interval).
    pub assessment_count: usize,
    /// Multiplier applied to sigma when computing the threshold.
    pub std_coefficient: f64,
    /// Charge per excess kWh at a billed peak.
    pub fee_per_point: f64,
    /// Meter fee per small customer per timeslot.
    pub m_small: f64,
    /// Meter fee per large customer per timeslot.
    pub m_large: f64,
    /// Flat transport fee per delivered kWh.
    pub transport_rate: f64,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            use_capacity_fee: false,
            use_meter_fee: false,
            use_transport_fee: false,
            assessment_interval: 24,
            assessment_count: 1,
            std_coefficient: 1.2,
            fee_per_point: 10.0,
            m_small: 0.015,
            m_large: 0.05,
            transport_rate: 0.01,
        }
    }
}

impl DistributionConfig {
    /// Builds a configuration from string-keyed properties.
    ///
    /// Keys are the camelCase names (`useCapacityFee`, `assessmentInterval`,
    /// `stdCoefficient`, ...), optionally prefixed with [`PROPERTY_PREFIX`].
    /// Dotted keys belonging to other services are ignored. Missing keys
    /// keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns every unknown key and unparsable value found.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use du_sim::config::DistributionConfig;
    ///
    /// let props = BTreeMap::from([
    ///     ("useCapacityFee".to_string(), "true".to_string()),
    ///     ("assessmentInterval".to_string(), "2".to_string()),
    /// ]);
    /// let cfg = DistributionConfig::from_properties(&props).expect("valid properties");
    /// assert!(cfg.use_capacity_fee);
    /// assert_eq!(cfg.assessment_interval, 2);
    /// ```
    pub fn from_properties(props: &BTreeMap<String, String>) -> Result<Self, Vec<ConfigError>> {
        let mut cfg = Self::default();
        let mut errors = Vec::new();

        for (key, value) in props {
            let name = match key.strip_prefix(PROPERTY_PREFIX) {
                Some(name) => name,
                None if key.contains('.') => continue,
                None => key.as_str(),
            };
            let value = value.trim();
            let result = match name {
                "useCapacityFee" => parse_into(value, &mut cfg.use_capacity_fee),
                "useMeterFee" => parse_into(value, &mut cfg.use_meter_fee),
                "useTransportFee" => parse_into(value, &mut cfg.use_transport_fee),
                "assessmentInterval" => parse_into(value, &mut cfg.assessment_interval),
                "assessmentCount" => parse_into(value, &mut cfg.assessment_count),
                "stdCoefficient" => parse_into(value, &mut cfg.std_coefficient),
                "feePerPoint" => parse_into(value, &mut cfg.fee_per_point),
                "mSmall" => parse_into(value, &mut cfg.m_small),
                "mLarge" => parse_into(value, &mut cfg.m_large),
                "transportRate" => parse_into(value, &mut cfg.transport_rate),
                _ => Err("unknown key".to_string()),
            };
            if let Err(message) = result {
                errors.push(ConfigError::new(key.as_str(), message));
            }
        }

        if errors.is_empty() {
            Ok(cfg)
        } else {
            Err(errors)
        }
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is usable.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.assessment_interval == 0 {
            errors.push(ConfigError::new(
                "distribution.assessment_interval",
                "must be > 0",
            ));
        }
        if self.assessment_count == 0 {
            errors.push(ConfigError::new(
                "distribution.assessment_count",
                "must be > 0",
            ));
        }
        if self.assessment_count > self.assessment_interval {
            errors.push(ConfigError::new(
                "distribution.assessment_count",
                format!(
                    "must be <= distribution.assessment_interval ({})",
                    self.assessment_interval
                ),
            ));
        }

        let non_negative = [
            ("distribution.std_coefficient", self.std_coefficient),
            ("distribution.fee_per_point", self.fee_per_point),
            ("distribution.m_small", self.m_small),
            ("distribution.m_large", self.m_large),
            ("distribution.transport_rate", self.transport_rate),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                errors.push(ConfigError::new(field, "must be a finite number >= 0"));
            }
        }

        errors
    }
}

fn parse_into<T: std::str::FromStr>(value: &str, slot: &mut T) -> Result<(), String> {
    *slot = value
        .parse()
        .map_err(|_| format!("cannot parse \"{value}\""))?;
    Ok(())
}

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulation timing and global parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Distribution-utility engine parameters.
    #[serde(default)]
    pub distribution: DistributionConfig,
    /// Broker customer populations.
    #[serde(default = "default_brokers")]
    pub brokers: Vec<BrokerConfig>,
}

/// Simulation timing and global parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of timeslots per simulated day (must be > 0).
    pub slots_per_day: usize,
    /// Number of days to simulate (must be > 0).
    pub days: usize,
    /// Days of history generated to seed the usage statistics.
    pub bootstrap_days: usize,
    /// Index of the first live timeslot.
    pub first_timeslot: usize,
    /// Master random seed.
    pub seed: u64,
    /// First timeslot of the day with solar production (inclusive).
    pub sunrise_slot: usize,
    /// Last timeslot of the day with solar production (exclusive).
    pub sunset_slot: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            slots_per_day: 24,
            days: 7,
            bootstrap_days: 14,
            first_timeslot: 0,
            seed: 42,
            sunrise_slot: 6,
            sunset_slot: 18,
        }
    }
}

/// One broker's customer population and load shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrokerConfig {
    /// Broker name (must be unique).
    pub name: String,
    /// Committed small-class customers.
    pub small_customers: u32,
    /// Committed large-class customers.
    pub large_customers: u32,
    /// Mean consumption per small customer per timeslot (kWh).
    pub small_kwh: f64,
    /// Mean consumption per large customer per timeslot (kWh).
    pub large_kwh: f64,
    /// Daily sinusoidal swing as a fraction of mean consumption.
    pub daily_swing: f64,
    /// Phase offset of the daily swing (radians).
    pub phase_rad: f64,
    /// Gaussian noise standard deviation as a fraction of consumption.
    pub noise_std: f64,
    /// Peak solar production per small customer per timeslot (kWh).
    pub solar_kwh_peak: f64,
    /// Probability that the broker reports no data in a timeslot (0.0-1.0).
    pub dropout_prob: f64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            name: "broker".to_string(),
            small_customers: 100,
            large_customers: 2,
            small_kwh: 0.6,
            large_kwh: 12.0,
            daily_swing: 0.4,
            phase_rad: 1.2,
            noise_std: 0.05,
            solar_kwh_peak: 0.3,
            dropout_prob: 0.0,
        }
    }
}

fn default_brokers() -> Vec<BrokerConfig> {
    vec![
        BrokerConfig {
            name: "alpha".to_string(),
            ..BrokerConfig::default()
        },
        BrokerConfig {
            name: "beta".to_string(),
            small_customers: 60,
            large_customers: 5,
            daily_swing: 0.6,
            ..BrokerConfig::default()
        },
        BrokerConfig {
            name: "gamma".to_string(),
            small_customers: 150,
            large_customers: 0,
            solar_kwh_peak: 0.5,
            ..BrokerConfig::default()
        },
    ]
}

impl ScenarioConfig {
    /// Returns the baseline scenario: capacity and meter fees, daily windows.
    pub fn baseline() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            distribution: DistributionConfig {
                use_capacity_fee: true,
                use_meter_fee: true,
                ..DistributionConfig::default()
            },
            brokers: default_brokers(),
        }
    }

    /// Returns the peak-stress preset: sharp daily swings, two peaks per window,
    /// and brokers that sometimes report no data.
    pub fn peak_stress() -> Self {
        let brokers = default_brokers()
            .into_iter()
            .map(|b| BrokerConfig {
                daily_swing: 0.9,
                noise_std: 0.15,
                dropout_prob: 0.05,
                ..b
            })
            .collect();
        Self {
            simulation: SimulationConfig::default(),
            distribution: DistributionConfig {
                use_capacity_fee: true,
                use_meter_fee: true,
                assessment_count: 2,
                std_coefficient: 0.8,
                fee_per_point: 25.0,
                ..DistributionConfig::default()
            },
            brokers,
        }
    }

    /// Returns the meter-only preset: meter and transport fees, no capacity fee.
    pub fn meter_only() -> Self {
        Self {
            simulation: SimulationConfig {
                days: 2,
                ..SimulationConfig::default()
            },
            distribution: DistributionConfig {
                use_meter_fee: true,
                use_transport_fee: true,
                ..DistributionConfig::default()
            },
            brokers: default_brokers(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "peak_stress", "meter_only"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "peak_stress" => Ok(Self::peak_stress()),
            "meter_only" => Ok(Self::meter_only()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.slots_per_day == 0 {
            errors.push(ConfigError::new("simulation.slots_per_day", "must be > 0"));
        }
        if s.days == 0 {
            errors.push(ConfigError::new("simulation.days", "must be > 0"));
        }
        if s.sunrise_slot >= s.sunset_slot {
            errors.push(ConfigError::new(
                "simulation.sunrise_slot",
                "must be < simulation.sunset_slot",
            ));
        }
        if s.slots_per_day > 0 && s.sunset_slot > s.slots_per_day {
            errors.push(ConfigError::new(
                "simulation.sunset_slot",
                "must be <= simulation.slots_per_day",
            ));
        }

        errors.extend(self.distribution.validate());

        if self.brokers.is_empty() {
            errors.push(ConfigError::new("brokers", "at least one broker is required"));
        }
        for (i, b) in self.brokers.iter().enumerate() {
            let field = |name: &str| format!("brokers[{i}].{name}");
            if b.name.trim().is_empty() {
                errors.push(ConfigError::new(field("name"), "must not be empty"));
            }
            if self.brokers[..i].iter().any(|other| other.name == b.name) {
                errors.push(ConfigError::new(
                    field("name"),
                    format!("duplicate broker name \"{}\"", b.name),
                ));
            }
            for (name, value) in [
                ("small_kwh", b.small_kwh),
                ("large_kwh", b.large_kwh),
                ("noise_std", b.noise_std),
                ("solar_kwh_peak", b.solar_kwh_peak),
            ] {
                if !value.is_finite() || value < 0.0 {
                    errors.push(ConfigError::new(field(name), "must be a finite number >= 0"));
                }
            }
            if !(0.0..=1.0).contains(&b.daily_swing) {
                errors.push(ConfigError::new(field("daily_swing"), "must be in [0.0, 1.0]"));
            }
            if !(0.0..=1.0).contains(&b.dropout_prob) {
                errors.push(ConfigError::new(field("dropout_prob"), "must be in [0.0, 1.0]"));
            }
        }

        errors
    }
}
