//! Review of discrepancies and the correction plans it produces.
//!
//! A [`ReviewSession`] is driven through discrete calls by whatever front
//! end presents it; nothing here prompts or blocks. Sessions and plans are
//! plain JSON documents, so a review can be resumed later and an approved
//! plan handed to a separate apply run.
//!
//! # Usage
//!
//! ```no_run
//! use curator::Curator;
//!
//! let curator = Curator::new();
//! let mut session = curator.review("metadata.tsv", "model.jsonld").unwrap();
//!
//! while let Some(id) = session.next_pending().map(|d| d.id.clone()) {
//!     if session.accept(&id).is_err() {
//!         session.skip(&id).unwrap();
//!     }
//! }
//!
//! let plan = session.approve().unwrap();
//! plan.save("metadata.plan.json").unwrap();
//! ```

mod decision;
mod persistence;
mod plan;
mod session;

pub use decision::{Decision, DecisionStatus, ReviewAction};
pub use persistence::{plan_path, session_path};
pub use plan::{CellSnapshot, CorrectionPlan, NewTerm, PlanEntry};
pub use session::{FORMAT_VERSION, ReviewSession, ReviewSummary};
