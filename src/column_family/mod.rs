//! Column family registry.
//!
//! Every open [`Session`](crate::Session) keeps a name → handle index of the
//! column families the engine currently holds. The index is populated at open
//! from the families recorded on disk (just `"default"` for a fresh database)
//! and changes only through explicit create and drop calls.
//!
//! # Concurrency Model
//!
//! One reader/writer lock guards the index:
//! - lookups and listings take it shared and run in parallel
//! - create and drop take it exclusively, serializing against each other and
//!   against readers for the duration of the engine call
//!
//! # Handle lifetime
//!
//! [`ColumnFamilyHandle`]s are reference counted. Dropping a family removes it
//! from the index and asks the engine to drop it right away; the engine-side
//! handle object is released once the last operation or cursor that bound it
//! finishes. Any later use of a stale handle reports
//! [`StatusCode::ColumnFamilyDropped`](crate::StatusCode::ColumnFamilyDropped).

pub(crate) mod registry;
pub(crate) mod state;

pub use registry::DEFAULT_COLUMN_FAMILY;
pub use state::ColumnFamilyHandle;
