use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use rocksdb::Options;

use super::state::{ColumnFamilyHandle, ColumnFamilyState};
use crate::status::{Severity, Status, StatusCode, SubCode};

/// Name of the column family every engine instance carries.
pub const DEFAULT_COLUMN_FAMILY: &str = "default";

/// The engine-side half of column family management.
///
/// The registry decides *whether* a family may be created or dropped; the
/// catalog carries the request out. Implemented by the session's engine.
pub(crate) trait FamilyCatalog {
    fn create_family(&self, name: &str, options: &Options) -> Result<(), Status>;
    fn drop_family(&self, name: &str) -> Result<(), Status>;
}

/// Name → handle index for the column families of one session.
///
/// A single reader/writer lock guards the map. Lookups and listings share it;
/// create and drop take it exclusively and hold it across the engine call, so
/// a name is present in the map exactly while the engine has a live family
/// behind it.
pub(crate) struct ColumnFamilyRegistry {
    families: RwLock<HashMap<String, Arc<ColumnFamilyState>>>,
    next_id: AtomicU64,
}

impl ColumnFamilyRegistry {
    /// Builds the registry from the families the engine was opened with.
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        let next_id = AtomicU64::new(0);
        let families = names
            .into_iter()
            .map(|name| {
                let id = next_id.fetch_add(1, Ordering::Relaxed);
                (name.clone(), Arc::new(ColumnFamilyState::new(name, id)))
            })
            .collect();

        Self {
            families: RwLock::new(families),
            next_id,
        }
    }

    /// Returns the handle registered under `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<ColumnFamilyHandle> {
        let families = self.families.read().unwrap();
        families.get(name).cloned().map(ColumnFamilyHandle::new)
    }

    /// Returns the default family's handle.
    ///
    /// The default family is registered at open and cannot be dropped, so a
    /// miss here means the registry was built wrong.
    pub fn lookup_default(&self) -> Result<ColumnFamilyHandle, Status> {
        self.lookup(DEFAULT_COLUMN_FAMILY)
            .ok_or_else(|| Status::unknown_column_family(DEFAULT_COLUMN_FAMILY))
    }

    /// Creates a family named `name` through `catalog` and registers it.
    ///
    /// Existence is probed under the read lock first, so rejecting a duplicate
    /// does not block other readers. The probe is repeated under the write
    /// lock: of two racing creators, the one that loses gets the duplicate
    /// error and the engine is asked only once.
    pub fn create<C: FamilyCatalog + ?Sized>(
        &self,
        catalog: &C,
        options: &Options,
        name: &str,
    ) -> Result<ColumnFamilyHandle, Status> {
        {
            let families = self.families.read().unwrap();
            if families.contains_key(name) {
                return Err(Status::duplicate_column_family(name));
            }
        }

        let mut families = self.families.write().unwrap();
        if families.contains_key(name) {
            return Err(Status::duplicate_column_family(name));
        }

        catalog.create_family(name, options)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let state = Arc::new(ColumnFamilyState::new(name.to_string(), id));
        families.insert(name.to_string(), state.clone());

        #[cfg(feature = "logging")]
        log::info!("created column family '{name}' (id {id})");

        Ok(ColumnFamilyHandle::new(state))
    }

    /// Drops the family registered under `name`.
    ///
    /// Unknown names fail without touching the engine. On success the entry
    /// leaves the map and outstanding handles observe the drop; the engine's
    /// own handle object is released once the last in-flight user lets go.
    pub fn remove<C: FamilyCatalog + ?Sized>(&self, catalog: &C, name: &str) -> Result<(), Status> {
        let mut families = self.families.write().unwrap();

        let Some(state) = families.get(name) else {
            return Err(Status::unknown_column_family(name));
        };

        if name == DEFAULT_COLUMN_FAMILY {
            return Err(
                Status::new(StatusCode::InvalidArgument, SubCode::None, Severity::NoError)
                    .with_message("the default column family cannot be dropped"),
            );
        }

        catalog.drop_family(name)?;

        state.mark_dropped();
        families.remove(name);

        #[cfg(feature = "logging")]
        log::info!("dropped column family '{name}'");

        Ok(())
    }

    /// Snapshot of the registered names.
    pub fn list(&self) -> BTreeSet<String> {
        let families = self.families.read().unwrap();
        families.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.families.read().unwrap().len()
    }

    /// Runs `bind` under the read lock if `handle` is still the registered
    /// family for its name. Handles from another session never match.
    ///
    /// Holding the read lock keeps a concurrent drop or same-name re-create
    /// from slipping in between the liveness check and `bind`.
    pub fn resolve<T>(
        &self,
        handle: &ColumnFamilyHandle,
        bind: impl FnOnce(&str) -> Option<T>,
    ) -> Result<T, Status> {
        let families = self.families.read().unwrap();
        let live = families
            .get(handle.name())
            .is_some_and(|state| Arc::ptr_eq(state, &handle.state));

        if !live {
            #[cfg(feature = "logging")]
            log::warn!("access through dropped column family '{}'", handle.name());

            return Err(dropped(handle.name()));
        }

        bind(handle.name()).ok_or_else(|| dropped(handle.name()))
    }
}

fn dropped(name: &str) -> Status {
    Status::new(
        StatusCode::ColumnFamilyDropped,
        SubCode::None,
        Severity::NoError,
    )
    .with_message(format!("column family '{name}' has been dropped"))
}
