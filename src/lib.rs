//! # rockbridge
//!
//! Transactions and column families over an embedded RocksDB engine.
//!
//! A [`Session`] opens the engine in one of two concurrency modes and keeps
//! a registry of its column families. Work happens either inside a
//! [`Transaction`] or directly against the engine through [`RawAccess`].
//!
//! ## Features
//!
//! - **Pessimistic or optimistic**: row locking with lock timeouts and
//!   deadlock detection, or lock-free transactions validated at commit
//! - **Concurrent column family registry**: create, drop, look up and list
//!   families from any thread; dropping one never invalidates operations
//!   already running against it
//! - **Nested savepoints** with rollback and pop
//! - **Structured status**: every failure carries the engine's code, subcode
//!   and severity, or a [`BridgeCode`] for conditions the bridge detects
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rockbridge::{Session, TransactionOptions};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::builder().pessimistic().open("my_database")?;
//! let accounts = session.create_column_family("accounts")?;
//!
//! let options = TransactionOptions::pessimistic()
//!     .lock_timeout(Duration::from_millis(200))
//!     .deadlock_detect(true);
//! let mut txn = session.begin_transaction(options).expect("pessimistic session");
//!
//! let balance = txn.get_for_update(&accounts, b"alice")?;
//! txn.put(&accounts, b"alice", b"100")?;
//! txn.commit()?;
//!
//! let mut cursor = session.raw().iterator(&accounts)?;
//! cursor.seek_to_first();
//! while cursor.is_valid() {
//!     println!("{:?} => {:?}", cursor.key(), cursor.value());
//!     cursor.next();
//! }
//! cursor.status()?;
//! # let _ = balance;
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! Enable the `logging` feature to route open, registry and transaction
//! lifecycle events through the [`log`](https://docs.rs/log) facade.

pub mod column_family;
mod cursor;
mod raw;
mod session;
mod status;
mod transaction;

pub use column_family::{ColumnFamilyHandle, DEFAULT_COLUMN_FAMILY};
pub use cursor::Cursor;
pub use raw::RawAccess;
pub use session::{ConcurrencyMode, FlushConfig, ReadConfig, Session, SessionBuilder, WriteConfig};
pub use status::{BridgeCode, Severity, Status, StatusCode, SubCode};
pub use transaction::{
    PessimisticOptions, Transaction, TransactionKind, TransactionOptions, TransactionState,
};

/// The wrapped engine crate, for column family [`Options`](rocksdb::Options).
pub use rocksdb;
