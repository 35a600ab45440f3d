//! Collection of observed values and detection of discrepancies.

mod collector;
mod detector;

pub use collector::{ObservedValue, ValueCollector};
pub use detector::{Detection, Discrepancy, DiscrepancyDetector, DiscrepancyKind, UnmappedColumn};
