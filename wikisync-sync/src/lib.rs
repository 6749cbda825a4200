//! # wikisync-sync
//!
//! Pushes remote records into wiki documents.
//!
//! A [`Source`] couples a registry-resolved binding with its document
//! strategy and a snapshot of its records. A [`Synchronizer`] runs one of
//! the update operations (dirty-driven, acknowledging each dirty record) or
//! one of the publish operations (full regeneration) against it, through the
//! [`RecordStore`] and [`DocumentStore`] collaborators.
//!
//! [`pipeline::run`] is the entrypoint the CLI calls.

pub mod error;
pub mod links;
pub mod pipeline;
pub mod source;
pub mod store;
pub mod synchronizer;

pub use error::SyncError;
pub use links::StoreLinks;
pub use pipeline::{open_source, Mode, Resource};
pub use source::Source;
pub use store::{DocumentStore, RecordStore, StoreError};
pub use synchronizer::{Advisory, Operation, SyncOptions, SyncResult, Synchronizer, WriteResult};
