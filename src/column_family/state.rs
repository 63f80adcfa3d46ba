use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared state behind a [`ColumnFamilyHandle`].
///
/// The registry indexes one of these per live column family. Transactions and
/// raw callers hold clones of the surrounding `Arc`, so the state outlives a
/// drop from the registry for as long as anyone still references it.
pub(crate) struct ColumnFamilyState {
    /// Name of this column family.
    pub name: String,
    /// Registry-assigned identifier, unique within one session. Identity
    /// across sessions is the `Arc` itself.
    pub id: u64,
    /// Set once the family has been dropped from the engine.
    pub dropped: AtomicBool,
}

impl ColumnFamilyState {
    pub fn new(name: String, id: u64) -> Self {
        Self {
            name,
            id,
            dropped: AtomicBool::new(false),
        }
    }

    pub fn mark_dropped(&self) {
        self.dropped.store(true, Ordering::Release);
    }
}

/// A reference to one column family of an open [`Session`](crate::Session).
///
/// Handles are cheap to clone and may be shared across threads. A handle stays
/// valid as an object after its column family is dropped, but every operation
/// through it then fails with [`StatusCode::ColumnFamilyDropped`]. Re-creating
/// a family under the same name yields a new, distinct handle.
///
/// [`StatusCode::ColumnFamilyDropped`]: crate::StatusCode::ColumnFamilyDropped
#[derive(Clone)]
pub struct ColumnFamilyHandle {
    pub(crate) state: Arc<ColumnFamilyState>,
}

impl ColumnFamilyHandle {
    pub(crate) fn new(state: Arc<ColumnFamilyState>) -> Self {
        Self { state }
    }

    /// Returns the name of this column family.
    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn id(&self) -> u64 {
        self.state.id
    }

    /// True once the column family has been dropped through the registry.
    pub fn is_dropped(&self) -> bool {
        self.state.dropped.load(Ordering::Acquire)
    }

    /// Number of live references to this handle, the registry's own included.
    pub fn reference_count(&self) -> usize {
        Arc::strong_count(&self.state)
    }
}

impl PartialEq for ColumnFamilyHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl Eq for ColumnFamilyHandle {}

impl fmt::Debug for ColumnFamilyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnFamilyHandle")
            .field("name", &self.state.name)
            .field("id", &self.state.id)
            .field("dropped", &self.is_dropped())
            .finish()
    }
}
