//! The open engine and its factories.
//!
//! A [`Session`] owns the engine, opened in one [`ConcurrencyMode`] for its
//! whole lifetime, together with the column family registry. It hands out
//! [`Transaction`]s and [`RawAccess`] views that borrow it.

mod builder;
pub(crate) mod config;
pub(crate) mod engine;

pub use builder::SessionBuilder;
pub use config::{ConcurrencyMode, FlushConfig, ReadConfig, WriteConfig};

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rocksdb::Options;

use crate::column_family::ColumnFamilyHandle;
use crate::column_family::registry::ColumnFamilyRegistry;
use crate::raw::RawAccess;
use crate::status::Status;
use crate::transaction::{Transaction, TransactionOptions};
use engine::{BoundFamily, Engine, recorded_families};

/// An open database.
///
/// `Session` is `Send + Sync`; share it by reference between threads and
/// give each thread its own transactions.
///
/// # Example
///
/// ```ignore
/// use rockbridge::{Session, TransactionOptions};
///
/// let session = Session::open("my_database")?;
/// let users = session.create_column_family("users")?;
///
/// let mut txn = session.transaction();
/// txn.put(&users, b"alice", b"admin")?;
/// txn.commit()?;
///
/// assert_eq!(session.raw().get(&users, b"alice")?, Some(b"admin".to_vec()));
/// ```
pub struct Session {
    path: PathBuf,
    registry: ColumnFamilyRegistry,
    engine: Engine,
    family_options: Options,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Opens or creates a pessimistic session at `path` with default
    /// settings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Status> {
        SessionBuilder::new().open(path)
    }

    pub(crate) fn open_with_builder(
        path: PathBuf,
        builder: &SessionBuilder,
    ) -> Result<Self, Status> {
        let options = builder.engine_options();
        let families = recorded_families(&options, &path);

        let engine = Engine::open(
            builder.concurrency_mode(),
            &options,
            &builder.transaction_db_options(),
            &path,
            &families,
        )?;

        #[cfg(feature = "logging")]
        log::info!(
            "opened {:?} session at {} with {} column families",
            engine.mode(),
            path.display(),
            families.len()
        );

        Ok(Self {
            path,
            registry: ColumnFamilyRegistry::new(families),
            engine,
            family_options: options,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> ConcurrencyMode {
        self.engine.mode()
    }

    pub(crate) fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Binds `handle` to the engine's family object for one call or cursor.
    pub(crate) fn bind(&self, handle: &ColumnFamilyHandle) -> Result<BoundFamily<'_>, Status> {
        self.registry
            .resolve(handle, |name| self.engine.cf_handle(name))
    }

    /// Looks up a column family by name. Absence is not an error.
    pub fn column_family(&self, name: &str) -> Option<ColumnFamilyHandle> {
        self.registry.lookup(name)
    }

    pub fn default_column_family(&self) -> Result<ColumnFamilyHandle, Status> {
        self.registry.lookup_default()
    }

    /// Creates a column family with the session's own engine options.
    ///
    /// # Errors
    ///
    /// A name already in use fails with
    /// [`BridgeCode::DuplicateColumnFamily`](crate::BridgeCode::DuplicateColumnFamily).
    pub fn create_column_family(&self, name: &str) -> Result<ColumnFamilyHandle, Status> {
        self.registry.create(&self.engine, &self.family_options, name)
    }

    pub fn create_column_family_with_options(
        &self,
        name: &str,
        options: &Options,
    ) -> Result<ColumnFamilyHandle, Status> {
        self.registry.create(&self.engine, options, name)
    }

    /// Drops a column family.
    ///
    /// Operations already running against it, and cursors still open on it,
    /// finish normally; the engine releases the family after the last of
    /// them. New operations through any of its handles fail with
    /// [`StatusCode::ColumnFamilyDropped`](crate::StatusCode::ColumnFamilyDropped).
    ///
    /// # Errors
    ///
    /// An unknown name fails with
    /// [`BridgeCode::UnknownColumnFamily`](crate::BridgeCode::UnknownColumnFamily)
    /// and the default family cannot be dropped.
    pub fn drop_column_family(&self, name: &str) -> Result<(), Status> {
        self.registry.remove(&self.engine, name)
    }

    pub fn list_column_families(&self) -> BTreeSet<String> {
        self.registry.list()
    }

    /// Non-transactional access with default read and write settings.
    pub fn raw(&self) -> RawAccess<'_> {
        RawAccess::new(self, ReadConfig::default(), WriteConfig::default())
    }

    /// Begins a transaction.
    ///
    /// Returns `None` if `options` were built for the other concurrency mode.
    pub fn begin_transaction(&self, options: TransactionOptions) -> Option<Transaction<'_>> {
        let transaction = Transaction::begin(self, options);

        #[cfg(feature = "logging")]
        if transaction.is_none() {
            log::warn!("rejected transaction options for a {:?} session", self.mode());
        }

        transaction
    }

    /// Begins a transaction with default options for this session's mode.
    pub fn transaction(&self) -> Transaction<'_> {
        let options = TransactionOptions::for_mode(self.mode());
        match Transaction::begin(self, options) {
            Some(transaction) => transaction,
            None => unreachable!("default options always match the session mode"),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("path", &self.path)
            .field("mode", &self.mode())
            .field("column_families", &self.registry.len())
            .finish()
    }
}

#[cfg(feature = "logging")]
impl Drop for Session {
    fn drop(&mut self) {
        log::info!("closing session at {}", self.path.display());
    }
}
