use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DB, DBAccess, FlushOptions, MultiThreaded,
    OptimisticTransactionDB, OptimisticTransactionOptions, Options, ReadOptions,
    SnapshotWithThreadMode, TransactionDB, TransactionDBOptions, WriteBatchWithTransaction,
    WriteOptions,
};

use super::config::ConcurrencyMode;
use crate::column_family::DEFAULT_COLUMN_FAMILY;
use crate::column_family::registry::FamilyCatalog;
use crate::cursor::PositionalRead;
use crate::status::{Severity, Status, StatusCode, SubCode};
use crate::transaction::{PessimisticOptions, TransactionKind};

pub(crate) type PessimisticDb = TransactionDB<MultiThreaded>;
pub(crate) type OptimisticDb = OptimisticTransactionDB<MultiThreaded>;

/// An engine column family bound for the duration of one call or cursor.
pub(crate) type BoundFamily<'a> = Arc<BoundColumnFamily<'a>>;

pub(crate) type MultiGetResults = Vec<Result<Option<Vec<u8>>, rocksdb::Error>>;

/// The opened engine, in whichever mode the session chose.
pub(crate) enum Engine {
    Pessimistic(PessimisticDb),
    Optimistic(OptimisticDb),
}

macro_rules! on_db {
    ($engine:expr, $db:ident => $body:expr) => {
        match $engine {
            Engine::Pessimistic($db) => $body,
            Engine::Optimistic($db) => $body,
        }
    };
}

macro_rules! on_txn {
    ($txn:expr, $t:ident => $body:expr) => {
        match $txn {
            EngineTransaction::Pessimistic($t) => $body,
            EngineTransaction::Optimistic($t) => $body,
        }
    };
}

/// Column families physically present at `path`, or just the default family
/// when nothing has been recorded there yet.
pub(crate) fn recorded_families(options: &Options, path: &Path) -> Vec<String> {
    let mut names = DB::list_cf(options, path).unwrap_or_default();
    if names.is_empty() {
        names.push(DEFAULT_COLUMN_FAMILY.to_string());
    }
    names
}

pub(crate) fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

impl Engine {
    pub fn open(
        mode: ConcurrencyMode,
        options: &Options,
        txn_db_options: &TransactionDBOptions,
        path: &Path,
        families: &[String],
    ) -> Result<Self, rocksdb::Error> {
        let descriptors = families
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(name.as_str(), options.clone()));

        match mode {
            ConcurrencyMode::Pessimistic => {
                PessimisticDb::open_cf_descriptors(options, txn_db_options, path, descriptors)
                    .map(Engine::Pessimistic)
            }
            ConcurrencyMode::Optimistic => {
                OptimisticDb::open_cf_descriptors(options, path, descriptors)
                    .map(Engine::Optimistic)
            }
        }
    }

    pub fn mode(&self) -> ConcurrencyMode {
        match self {
            Engine::Pessimistic(_) => ConcurrencyMode::Pessimistic,
            Engine::Optimistic(_) => ConcurrencyMode::Optimistic,
        }
    }

    pub fn cf_handle(&self, name: &str) -> Option<BoundFamily<'_>> {
        on_db!(self, db => db.cf_handle(name))
    }

    pub fn snapshot(&self) -> ReadView<'_> {
        match self {
            Engine::Pessimistic(db) => ReadView::Pessimistic(db.snapshot()),
            Engine::Optimistic(db) => ReadView::Optimistic(db.snapshot()),
        }
    }

    pub fn get(
        &self,
        cf: &BoundFamily<'_>,
        key: &[u8],
        options: &ReadOptions,
    ) -> Result<Option<Vec<u8>>, rocksdb::Error> {
        on_db!(self, db => db.get_cf_opt(cf, key, options))
    }

    pub fn multi_get<K: AsRef<[u8]>>(
        &self,
        cf: &BoundFamily<'_>,
        keys: &[K],
        options: &ReadOptions,
    ) -> MultiGetResults {
        on_db!(self, db => db.multi_get_cf_opt(keys.iter().map(|key| (cf, key.as_ref())), options))
    }

    pub fn put(
        &self,
        cf: &BoundFamily<'_>,
        key: &[u8],
        value: &[u8],
        options: &WriteOptions,
    ) -> Result<(), rocksdb::Error> {
        on_db!(self, db => db.put_cf_opt(cf, key, value, options))
    }

    pub fn delete(
        &self,
        cf: &BoundFamily<'_>,
        key: &[u8],
        options: &WriteOptions,
    ) -> Result<(), rocksdb::Error> {
        on_db!(self, db => db.delete_cf_opt(cf, key, options))
    }

    /// Deletes every key in `[start, end)`.
    ///
    /// `TransactionDB` has no range delete in the binding, so pessimistic mode
    /// collects the range into one atomic batch of point deletes instead.
    pub fn delete_range(
        &self,
        cf: &BoundFamily<'_>,
        start: &[u8],
        end: &[u8],
        options: &WriteOptions,
    ) -> Result<(), rocksdb::Error> {
        match self {
            Engine::Optimistic(db) => db.delete_range_cf_opt(cf, start, end, options),
            Engine::Pessimistic(db) => {
                let mut scan = ReadOptions::default();
                scan.set_iterate_upper_bound(end.to_vec());

                let mut batch = WriteBatchWithTransaction::<true>::default();
                let mut iter = db.raw_iterator_cf_opt(cf, scan);
                iter.seek(start);
                while let Some(key) = iter.key() {
                    batch.delete_cf(cf, key);
                    iter.next();
                }
                iter.status()?;
                drop(iter);

                db.write_opt(batch, options)
            }
        }
    }

    pub fn flush(&self, cf: &BoundFamily<'_>, options: &FlushOptions) -> Result<(), Status> {
        match self {
            Engine::Optimistic(db) => db.flush_cf_opt(cf, options).map_err(Status::from),
            Engine::Pessimistic(_) => Err(Status::new(
                StatusCode::NotSupported,
                SubCode::None,
                Severity::NoError,
            )
            .with_message("flush is not available on a pessimistic session")),
        }
    }

    pub fn raw_cursor<'a>(
        &'a self,
        cf: &BoundFamily<'a>,
        options: ReadOptions,
    ) -> Box<dyn PositionalRead + 'a> {
        match self {
            Engine::Pessimistic(db) => Box::new(db.raw_iterator_cf_opt(cf, options)),
            Engine::Optimistic(db) => Box::new(db.raw_iterator_cf_opt(cf, options)),
        }
    }

    /// Starts an engine transaction, or `None` if `kind` belongs to the other
    /// mode.
    pub fn begin(
        &self,
        kind: &TransactionKind,
        snapshot: bool,
        write: &WriteOptions,
    ) -> Option<EngineTransaction<'_>> {
        match (self, kind) {
            (Engine::Pessimistic(db), TransactionKind::Pessimistic(options)) => {
                let options = pessimistic_options(options, snapshot);
                Some(EngineTransaction::Pessimistic(
                    db.transaction_opt(write, &options),
                ))
            }
            (Engine::Optimistic(db), TransactionKind::Optimistic) => {
                let mut options = OptimisticTransactionOptions::default();
                options.set_snapshot(snapshot);
                Some(EngineTransaction::Optimistic(
                    db.transaction_opt(write, &options),
                ))
            }
            _ => None,
        }
    }
}

fn pessimistic_options(
    options: &PessimisticOptions,
    snapshot: bool,
) -> rocksdb::TransactionOptions {
    let mut engine = rocksdb::TransactionOptions::default();
    engine.set_snapshot(snapshot);
    engine.set_deadlock_detect(options.deadlock_detect);
    if let Some(timeout) = options.lock_timeout {
        engine.set_lock_timeout(millis(timeout));
    }
    if let Some(depth) = options.deadlock_detect_depth {
        engine.set_deadlock_detect_depth(depth);
    }
    if let Some(expiration) = options.expiration {
        engine.set_expiration(millis(expiration));
    }
    engine
}

impl FamilyCatalog for Engine {
    fn create_family(&self, name: &str, options: &Options) -> Result<(), Status> {
        on_db!(self, db => db.create_cf(name, options)).map_err(Status::from)
    }

    fn drop_family(&self, name: &str) -> Result<(), Status> {
        on_db!(self, db => db.drop_cf(name)).map_err(Status::from)
    }
}

/// A consistent point-in-time view taken from the engine.
pub(crate) enum ReadView<'a> {
    Pessimistic(SnapshotWithThreadMode<'a, PessimisticDb>),
    Optimistic(SnapshotWithThreadMode<'a, OptimisticDb>),
}

impl ReadView<'_> {
    /// Points `options` at this view. The view must outlive every read made
    /// with `options`.
    pub fn apply(&self, options: &mut ReadOptions) {
        match self {
            ReadView::Pessimistic(snapshot) => options.set_snapshot(snapshot),
            ReadView::Optimistic(snapshot) => options.set_snapshot(snapshot),
        }
    }
}

/// The point in time a transactional read observes.
pub(crate) enum ReadPoint<'a> {
    /// Latest committed data.
    Latest,
    /// The engine transaction's own snapshot, the one conflict checks
    /// validate against. Reads latest data when the transaction has none.
    Transaction,
    /// A view taken after the transaction began.
    View(ReadView<'a>),
}

impl ReadPoint<'_> {
    /// `own` is the engine transaction's snapshot and must outlive every read
    /// made with the returned options.
    fn apply<D: DBAccess>(
        &self,
        mut options: ReadOptions,
        own: &SnapshotWithThreadMode<'_, D>,
    ) -> ReadOptions {
        match self {
            ReadPoint::Latest => {}
            ReadPoint::Transaction => options.set_snapshot(own),
            ReadPoint::View(view) => view.apply(&mut options),
        }
        options
    }
}

/// The engine transaction behind a bridge [`Transaction`](crate::Transaction).
pub(crate) enum EngineTransaction<'a> {
    Pessimistic(rocksdb::Transaction<'a, PessimisticDb>),
    Optimistic(rocksdb::Transaction<'a, OptimisticDb>),
}

impl EngineTransaction<'_> {
    pub fn get(
        &self,
        cf: &BoundFamily<'_>,
        key: &[u8],
        options: ReadOptions,
        at: &ReadPoint<'_>,
    ) -> Result<Option<Vec<u8>>, rocksdb::Error> {
        on_txn!(self, txn => {
            let own = txn.snapshot();
            txn.get_cf_opt(cf, key, &at.apply(options, &own))
        })
    }

    /// Always reads at the transaction's own snapshot, whatever view plain
    /// reads use, so the value returned is the one the engine validates.
    pub fn get_for_update(
        &self,
        cf: &BoundFamily<'_>,
        key: &[u8],
        options: ReadOptions,
    ) -> Result<Option<Vec<u8>>, rocksdb::Error> {
        on_txn!(self, txn => {
            let own = txn.snapshot();
            let options = ReadPoint::Transaction.apply(options, &own);
            txn.get_for_update_cf_opt(cf, key, true, &options)
        })
    }

    pub fn multi_get<K: AsRef<[u8]>>(
        &self,
        cf: &BoundFamily<'_>,
        keys: &[K],
        options: ReadOptions,
        at: &ReadPoint<'_>,
    ) -> MultiGetResults {
        on_txn!(self, txn => {
            let own = txn.snapshot();
            let options = at.apply(options, &own);
            txn.multi_get_cf_opt(keys.iter().map(|key| (cf, key.as_ref())), &options)
        })
    }

    pub fn put(
        &self,
        cf: &BoundFamily<'_>,
        key: &[u8],
        value: &[u8],
    ) -> Result<(), rocksdb::Error> {
        on_txn!(self, txn => txn.put_cf(cf, key, value))
    }

    pub fn delete(&self, cf: &BoundFamily<'_>, key: &[u8]) -> Result<(), rocksdb::Error> {
        on_txn!(self, txn => txn.delete_cf(cf, key))
    }

    pub fn raw_cursor<'s>(
        &'s self,
        cf: &BoundFamily<'_>,
        options: ReadOptions,
        at: &ReadPoint<'_>,
    ) -> Box<dyn PositionalRead + 's> {
        match self {
            EngineTransaction::Pessimistic(txn) => {
                let own = txn.snapshot();
                Box::new(txn.raw_iterator_cf_opt(cf, at.apply(options, &own)))
            }
            EngineTransaction::Optimistic(txn) => {
                let own = txn.snapshot();
                Box::new(txn.raw_iterator_cf_opt(cf, at.apply(options, &own)))
            }
        }
    }

    pub fn set_savepoint(&self) {
        on_txn!(self, txn => txn.set_savepoint())
    }

    pub fn rollback_to_savepoint(&self) -> Result<(), rocksdb::Error> {
        on_txn!(self, txn => txn.rollback_to_savepoint())
    }

    pub fn rollback(&self) -> Result<(), rocksdb::Error> {
        on_txn!(self, txn => txn.rollback())
    }

    pub fn commit(self) -> Result<(), rocksdb::Error> {
        on_txn!(self, txn => txn.commit())
    }
}
