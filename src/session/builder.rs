use std::path::Path;
use std::time::Duration;

use rocksdb::{Options, TransactionDBOptions};

use super::Session;
use super::config::ConcurrencyMode;
use super::engine::millis;
use crate::status::Status;

/// Memtable budget handed to the engine's level-style compaction preset.
const LEVEL_STYLE_MEMTABLE_BUDGET: usize = 512 * 1024 * 1024;

/// Builder for configuring and opening a [`Session`].
///
/// # Example
///
/// ```ignore
/// use rockbridge::Session;
///
/// let session = Session::builder()
///     .optimistic()
///     .increase_parallelism(4)
///     .open("my_database")?;
/// ```
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    mode: ConcurrencyMode,
    create_if_missing: bool,
    paranoid_checks: Option<bool>,
    bulk_load: bool,
    parallelism: Option<i32>,
    level_style_compaction: bool,
    default_lock_timeout: Option<Duration>,
    max_num_locks: Option<i64>,
}

impl SessionBuilder {
    /// Creates a builder for a pessimistic session that creates its
    /// database if missing.
    pub fn new() -> Self {
        Self {
            mode: ConcurrencyMode::Pessimistic,
            create_if_missing: true,
            paranoid_checks: None,
            bulk_load: false,
            parallelism: None,
            level_style_compaction: false,
            default_lock_timeout: None,
            max_num_locks: None,
        }
    }

    /// Opens with row locking and optional deadlock detection. This is the
    /// default.
    #[must_use]
    pub fn pessimistic(mut self) -> Self {
        self.mode = ConcurrencyMode::Pessimistic;
        self
    }

    /// Opens without locks; conflicts are validated at commit.
    #[must_use]
    pub fn optimistic(mut self) -> Self {
        self.mode = ConcurrencyMode::Optimistic;
        self
    }

    /// Sets the concurrency mode directly.
    #[must_use]
    pub fn mode(mut self, mode: ConcurrencyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Default: true
    #[must_use]
    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Makes the engine fail aggressively when it detects corruption.
    #[must_use]
    pub fn paranoid_checks(mut self, enabled: bool) -> Self {
        self.paranoid_checks = Some(enabled);
        self
    }

    /// Tunes the engine for loading lots of data. Disables automatic
    /// compaction.
    #[must_use]
    pub fn prepare_for_bulk_load(mut self) -> Self {
        self.bulk_load = true;
        self
    }

    /// Sets the number of background threads for flushes and compactions.
    #[must_use]
    pub fn increase_parallelism(mut self, threads: i32) -> Self {
        self.parallelism = Some(threads);
        self
    }

    #[must_use]
    pub fn optimize_level_style_compaction(mut self) -> Self {
        self.level_style_compaction = true;
        self
    }

    /// Lock wait used by pessimistic transactions that do not set their own,
    /// and by raw writes that hit a locked key. Ignored by optimistic sessions.
    #[must_use]
    pub fn default_lock_timeout(mut self, timeout: Duration) -> Self {
        self.default_lock_timeout = Some(timeout);
        self
    }

    /// Caps the number of row locks held per column family. Ignored by
    /// optimistic sessions.
    #[must_use]
    pub fn max_num_locks(mut self, locks: i64) -> Self {
        self.max_num_locks = Some(locks);
        self
    }

    pub fn concurrency_mode(&self) -> ConcurrencyMode {
        self.mode
    }

    pub(crate) fn engine_options(&self) -> Options {
        let mut options = Options::default();
        options.create_if_missing(self.create_if_missing);
        options.create_missing_column_families(true);
        if let Some(enabled) = self.paranoid_checks {
            options.set_paranoid_checks(enabled);
        }
        if self.bulk_load {
            options.prepare_for_bulk_load();
        }
        if let Some(threads) = self.parallelism {
            options.increase_parallelism(threads);
        }
        if self.level_style_compaction {
            options.optimize_level_style_compaction(LEVEL_STYLE_MEMTABLE_BUDGET);
        }
        options
    }

    pub(crate) fn transaction_db_options(&self) -> TransactionDBOptions {
        let mut options = TransactionDBOptions::default();
        if let Some(timeout) = self.default_lock_timeout {
            options.set_txn_lock_timeout(millis(timeout));
            options.set_default_lock_timeout(millis(timeout));
        }
        if let Some(locks) = self.max_num_locks {
            options.set_max_num_locks(locks);
        }
        options
    }

    /// Opens or creates the database at `path`.
    ///
    /// Every column family recorded at `path` is opened and registered.
    ///
    /// # Errors
    ///
    /// Returns the engine's status if the database cannot be opened, for
    /// example because it is missing and `create_if_missing` is off, or it
    /// is locked by another process.
    pub fn open(self, path: impl AsRef<Path>) -> Result<Session, Status> {
        Session::open_with_builder(path.as_ref().to_path_buf(), &self)
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
