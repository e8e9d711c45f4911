//! CSV export for posted capacity and distribution transactions.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::utility::types::{CapacityTransaction, DistributionTransaction};

/// Column header for capacity transaction export.
const CAPACITY_HEADER: &str = "broker,peak_timeslot,threshold,kwh,fee";

/// Column header for distribution transaction export.
const DISTRIBUTION_HEADER: &str = "broker,small_meters,large_meters,kwh,fee";

/// Exports capacity transactions to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_capacity_csv(txs: &[CapacityTransaction], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_capacity_csv(io::BufWriter::new(file), txs)
}

/// Writes capacity transactions as CSV to any writer.
///
/// One row per transaction, in posting order. Produces identical bytes
/// for identical inputs.
///
/// # Arguments
///
/// * `writer` - Destination implementing `Write`
/// * `txs` - Capacity transactions to write
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_capacity_csv(writer: impl Write, txs: &[CapacityTransaction]) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(CAPACITY_HEADER.split(','))?;

    for tx in txs {
        wtr.write_record(&[
            tx.broker.to_string(),
            tx.peak_timeslot.to_string(),
            format!("{:.6}", tx.threshold),
            format!("{:.6}", tx.kwh),
            format!("{:.6}", tx.fee),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports distribution transactions to a CSV file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_distribution_csv(txs: &[DistributionTransaction], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_distribution_csv(io::BufWriter::new(file), txs)
}

/// Writes distribution transactions as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_distribution_csv(
    writer: impl Write,
    txs: &[DistributionTransaction],
) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(DISTRIBUTION_HEADER.split(','))?;

    for tx in txs {
        wtr.write_record(&[
            tx.broker.to_string(),
            tx.small_meters.to_string(),
            tx.large_meters.to_string(),
            format!("{:.6}", tx.kwh),
            format!("{:.6}", tx.fee),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
