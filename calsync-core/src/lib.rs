//! Core of calsync: keeps a task-database calendar and a scheduling calendar
//! in step through a canonical store of tracked events.
//!
//! - `event`: the source-neutral `Event` and the two `Side`s
//! - `source`: the `EventSource`/`EventStore` contracts the engine runs against
//! - `reconcile`: the add pass, the reconcile pass and the `Reconciler` driving them
//! - `remote`: `EventSource` backed by provider binaries speaking JSON over stdio
//! - `store`: file-backed `EventStore`
//! - `config`: `~/.config/calsync/config.toml`

pub mod config;
pub mod error;
pub mod event;
pub mod identity;
pub mod palette;
pub mod reconcile;
pub mod remote;
pub mod source;
pub mod store;

pub use error::{SyncError, SyncResult};
pub use event::{Event, Side};
pub use source::{EventSource, EventStore, SyncWindow};
