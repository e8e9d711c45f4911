//! Distribution utility billing simulator.
//!
//! Bills energy brokers for their share of confirmed grid load peaks
//! (capacity fee) and for metering and energy transport, driven tick by
//! tick from synthetic broker populations.

pub mod clock;
pub mod config;
pub mod error;
/// CSV export of posted transactions.
pub mod io;
pub mod ledger;
/// Synthetic broker customer populations.
pub mod population;
pub mod repo;
pub mod runner;
pub mod telemetry;
pub mod utility;
