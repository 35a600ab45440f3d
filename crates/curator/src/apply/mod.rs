//! Writing approved corrections back to a store.
//!
//! The [`BatchApplier`] turns a frozen [`CorrectionPlan`](crate::curation::CorrectionPlan)
//! into one [`EntityUpdate`] per entity and dispatches them to an
//! [`EntityStore`] with bounded concurrency. Per-entity failures are
//! collected into the [`ApplyReport`]; partial success is a normal outcome.

mod applier;
mod cell;
mod result;
mod store;

pub use applier::{ApplyConfig, BatchApplier};
pub use cell::rewrite_cell;
pub use result::{ApplyError, ApplyReport, ApplyResult};
pub use store::{CellChange, EntityStore, EntityUpdate, TableStore};
