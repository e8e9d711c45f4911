//! Synthetic broker customer populations that drive the scenario.

/// Per-broker consumption, solar production, and dropout model.
pub mod load;

pub use load::BrokerLoad;
