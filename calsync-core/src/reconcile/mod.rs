//! Three-way reconciliation between the tasks side, the schedule side and
//! the canonical store.
//!
//! A pass runs in two phases over fresh snapshots:
//!
//! 1. **Add pass** (`add_detector`): every untracked observation gets a
//!    synthetic id, a counterpart in the other source and a canonical record.
//! 2. **Reconcile pass** (`conflict_resolver`): every canonical record is
//!    compared with both sources and the result propagated.
//!
//! `orchestrator` strings the phases together under a deadline.

mod add_detector;
mod conflict_resolver;
pub mod matcher;
mod orchestrator;
pub mod report;
pub mod resolution;

pub use orchestrator::{Phase, Plan, PlannedAddition, Reconciler};
pub use report::{Change, ChangeKind, Failure, PassReport};
pub use resolution::{Action, Resolution, resolve};
