//! Transactions over an open [`Session`].
//!
//! A [`Transaction`] buffers its writes inside an engine transaction and
//! reads them back merged with committed data. Every transaction also hands
//! out a [`RawAccess`] view that bypasses it entirely: raw reads see only
//! committed data as of each call, raw writes apply immediately.
//!
//! Range deletion exists only on the raw path. Buffered transactional writes
//! are point operations.

mod options;
mod savepoint;

pub use options::{PessimisticOptions, TransactionKind, TransactionOptions};

use rocksdb::ReadOptions;

use crate::column_family::ColumnFamilyHandle;
use crate::cursor::Cursor;
use crate::raw::RawAccess;
use crate::session::Session;
use crate::session::config::ConcurrencyMode;
use crate::session::engine::{EngineTransaction, MultiGetResults, ReadPoint};
use crate::status::{Severity, Status, StatusCode, SubCode};
use savepoint::SavepointStack;

/// Lifecycle of a [`Transaction`]. Both terminal states allow
/// [`Transaction::renew`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionState {
    Active,
    Committed,
    RolledBack,
}

/// One unit of work against a [`Session`].
///
/// Reads take `&self`; writes, savepoints, commit and rollback take
/// `&mut self`, so a transaction cannot be written to while one of its
/// cursors is alive. A transaction is single-owner and may move between
/// threads but is never shared between them.
///
/// Dropping an active transaction rolls it back.
pub struct Transaction<'a> {
    session: &'a Session,
    options: TransactionOptions,
    inner: Option<EngineTransaction<'a>>,
    read_point: ReadPoint<'a>,
    savepoints: SavepointStack,
    state: TransactionState,
}

impl<'a> Transaction<'a> {
    /// Begins a transaction, or returns `None` if `options` are for the
    /// other concurrency mode.
    pub(crate) fn begin(session: &'a Session, options: TransactionOptions) -> Option<Self> {
        let inner = session.engine().begin(
            &options.kind,
            options.snapshot,
            &options.write.to_engine(),
        )?;
        let read_point = begin_read_point(&options);

        #[cfg(feature = "logging")]
        log::debug!(
            "began {:?} transaction (snapshot: {})",
            options.mode(),
            options.snapshot
        );

        Some(Self {
            session,
            options,
            inner: Some(inner),
            read_point,
            savepoints: SavepointStack::default(),
            state: TransactionState::Active,
        })
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn mode(&self) -> ConcurrencyMode {
        self.options.mode()
    }

    pub fn options(&self) -> &TransactionOptions {
        &self.options
    }

    /// Non-transactional access to the same session, using this
    /// transaction's raw read and write settings.
    pub fn raw(&self) -> RawAccess<'a> {
        RawAccess::new(
            self.session,
            self.options.raw_read.clone(),
            self.options.raw_write.clone(),
        )
    }

    fn active(&self) -> Result<&EngineTransaction<'a>, Status> {
        match (&self.inner, self.state) {
            (Some(inner), TransactionState::Active) => Ok(inner),
            (_, state) => Err(Status::contract(format!(
                "transaction is {state:?} and can no longer be used"
            ))),
        }
    }

    fn read_options(&self) -> ReadOptions {
        self.options.read.to_engine()
    }

    /// Reads `key`, seeing this transaction's own pending writes.
    pub fn get(&self, cf: &ColumnFamilyHandle, key: &[u8]) -> Result<Option<Vec<u8>>, Status> {
        let inner = self.active()?;
        let family = self.session.bind(cf)?;
        Ok(inner.get(&family, key, self.read_options(), &self.read_point)?)
    }

    /// Reads `key` and registers it for conflict detection.
    ///
    /// A pessimistic transaction takes an exclusive lock on the key and may
    /// fail here with a timed-out or busy status. An optimistic transaction
    /// records the key's version and fails at commit if it changed.
    ///
    /// The value is read at the transaction's own snapshot, taken at begin
    /// when `TransactionOptions::snapshot` is set, and otherwise from the
    /// latest committed data. A view from [`set_snapshot`](Self::set_snapshot)
    /// is not used here.
    pub fn get_for_update(
        &self,
        cf: &ColumnFamilyHandle,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>, Status> {
        let inner = self.active()?;
        let family = self.session.bind(cf)?;
        Ok(inner.get_for_update(&family, key, self.read_options())?)
    }

    /// Batch form of [`get`](Self::get).
    ///
    /// The outer error reports failures that affect the whole batch. Each
    /// key gets its own result, positionally matching `keys` including
    /// duplicates.
    pub fn multi_get<K: AsRef<[u8]>>(
        &self,
        cf: &ColumnFamilyHandle,
        keys: &[K],
    ) -> Result<Vec<Result<Option<Vec<u8>>, Status>>, Status> {
        let inner = self.active()?;
        let family = self.session.bind(cf)?;
        Ok(per_key(inner.multi_get(&family, keys, self.read_options(), &self.read_point)))
    }

    /// Iterates the family with this transaction's pending writes merged in.
    pub fn iterator(&self, cf: &ColumnFamilyHandle) -> Result<Cursor<'_>, Status> {
        let inner = self.active()?;
        let family = self.session.bind(cf)?;
        let cursor = inner.raw_cursor(&family, self.read_options(), &self.read_point);
        Ok(Cursor::new(cursor, family))
    }

    pub fn put(&mut self, cf: &ColumnFamilyHandle, key: &[u8], value: &[u8]) -> Result<(), Status> {
        let inner = self.active()?;
        let family = self.session.bind(cf)?;
        Ok(inner.put(&family, key, value)?)
    }

    pub fn delete(&mut self, cf: &ColumnFamilyHandle, key: &[u8]) -> Result<(), Status> {
        let inner = self.active()?;
        let family = self.session.bind(cf)?;
        Ok(inner.delete(&family, key)?)
    }

    /// Takes a fresh read view for subsequent [`get`](Self::get),
    /// [`multi_get`](Self::multi_get) and [`iterator`](Self::iterator) calls,
    /// replacing any earlier one.
    ///
    /// Plain reads only. Conflict detection keeps the snapshot chosen at
    /// begin, and [`get_for_update`](Self::get_for_update) keeps reading at it.
    pub fn set_snapshot(&mut self) -> Result<(), Status> {
        self.active()?;
        self.read_point = ReadPoint::View(self.session.engine().snapshot());
        Ok(())
    }

    pub fn has_snapshot(&self) -> bool {
        !matches!(self.read_point, ReadPoint::Latest)
    }

    pub fn savepoint_depth(&self) -> usize {
        self.savepoints.depth()
    }

    pub fn set_savepoint(&mut self) -> Result<(), Status> {
        self.active()?.set_savepoint();
        self.savepoints.push();
        Ok(())
    }

    /// Undoes every write made since the most recent savepoint and removes
    /// that savepoint.
    pub fn rollback_to_savepoint(&mut self) -> Result<(), Status> {
        self.active()?;
        let Some(count) = self.savepoints.take() else {
            return Err(no_savepoint());
        };

        let inner = self.active()?;
        for _ in 0..count {
            inner.rollback_to_savepoint()?;
        }
        Ok(())
    }

    /// Removes the most recent savepoint without undoing anything. A later
    /// [`rollback_to_savepoint`](Self::rollback_to_savepoint) then unwinds to
    /// the savepoint below it.
    pub fn pop_savepoint(&mut self) -> Result<(), Status> {
        self.active()?;
        if self.savepoints.pop() {
            Ok(())
        } else {
            Err(no_savepoint())
        }
    }

    /// Makes the buffered writes durable and visible.
    ///
    /// On success the read view is released and the state becomes
    /// [`TransactionState::Committed`]. A failed commit leaves nothing
    /// applied: the state becomes [`TransactionState::RolledBack`] and the
    /// engine's status is returned unchanged. Optimistic conflicts surface
    /// here; check [`Status::is_conflict`].
    pub fn commit(&mut self) -> Result<(), Status> {
        self.active()?;
        let Some(inner) = self.finish() else {
            return Err(Status::contract("transaction has no engine transaction"));
        };

        match inner.commit() {
            Ok(()) => {
                self.state = TransactionState::Committed;

                #[cfg(feature = "logging")]
                log::debug!("committed {:?} transaction", self.mode());

                Ok(())
            }
            Err(err) => {
                self.state = TransactionState::RolledBack;
                let status = Status::from(err);

                #[cfg(feature = "logging")]
                log::warn!("commit failed: {status}");

                Err(status)
            }
        }
    }

    /// Discards the buffered writes and releases locks.
    ///
    /// Rolling back twice is harmless. Rolling back a committed transaction
    /// is an error.
    pub fn rollback(&mut self) -> Result<(), Status> {
        match self.state {
            TransactionState::RolledBack => return Ok(()),
            TransactionState::Committed => {
                return Err(Status::contract("cannot roll back a committed transaction"));
            }
            TransactionState::Active => {}
        }

        let inner = self.finish();
        self.state = TransactionState::RolledBack;
        if let Some(inner) = inner {
            inner.rollback()?;
        }

        #[cfg(feature = "logging")]
        log::debug!("rolled back {:?} transaction", self.mode());

        Ok(())
    }

    /// Restarts a committed or rolled-back transaction with the options it
    /// was begun with.
    pub fn renew(&mut self) -> Result<(), Status> {
        if self.state == TransactionState::Active {
            return Err(Status::contract("cannot renew an active transaction"));
        }

        let engine = self.session.engine();
        let inner = engine
            .begin(
                &self.options.kind,
                self.options.snapshot,
                &self.options.write.to_engine(),
            )
            .ok_or_else(|| Status::contract("transaction options do not match the session"))?;

        self.inner = Some(inner);
        self.read_point = begin_read_point(&self.options);
        self.savepoints.clear();
        self.state = TransactionState::Active;
        Ok(())
    }

    fn finish(&mut self) -> Option<EngineTransaction<'a>> {
        self.read_point = ReadPoint::Latest;
        self.savepoints.clear();
        self.inner.take()
    }
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("mode", &self.mode())
            .field("state", &self.state)
            .field("snapshot", &self.has_snapshot())
            .field("savepoints", &self.savepoints.depth())
            .finish()
    }
}

fn begin_read_point<'a>(options: &TransactionOptions) -> ReadPoint<'a> {
    if options.snapshot {
        ReadPoint::Transaction
    } else {
        ReadPoint::Latest
    }
}

pub(crate) fn per_key(results: MultiGetResults) -> Vec<Result<Option<Vec<u8>>, Status>> {
    results
        .into_iter()
        .map(|result| result.map_err(Status::from))
        .collect()
}

fn no_savepoint() -> Status {
    Status::new(StatusCode::NotFound, SubCode::None, Severity::NoError)
        .with_message("no savepoint set")
}
