use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::session::config::{ConcurrencyMode, ReadConfig, WriteConfig};

/// Locking behavior of a pessimistic transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PessimisticOptions {
    /// How long a write or `get_for_update` waits for a row lock before
    /// failing with a timed-out status. `None` uses the session default.
    pub lock_timeout: Option<Duration>,

    /// Detect lock cycles between transactions and fail one side instead of
    /// letting both wait out their timeouts.
    ///
    /// Default: false
    pub deadlock_detect: bool,

    /// How far the wait-for graph is followed. `None` uses the engine default.
    pub deadlock_detect_depth: Option<i64>,

    /// Age after which the transaction's locks may be stolen by others.
    pub expiration: Option<Duration>,
}

/// Mode-specific part of [`TransactionOptions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Pessimistic(PessimisticOptions),
    Optimistic,
}

impl TransactionKind {
    pub fn mode(&self) -> ConcurrencyMode {
        match self {
            TransactionKind::Pessimistic(_) => ConcurrencyMode::Pessimistic,
            TransactionKind::Optimistic => ConcurrencyMode::Optimistic,
        }
    }
}

/// Everything a transaction is begun with.
///
/// The transactional and raw access paths each get their own read and write
/// settings. Raw reads never see the transaction's read view.
///
/// # Example
///
/// ```ignore
/// let options = TransactionOptions::pessimistic()
///     .lock_timeout(Duration::from_millis(100))
///     .deadlock_detect(true)
///     .snapshot(true);
/// let txn = session.begin_transaction(options).expect("pessimistic session");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOptions {
    pub kind: TransactionKind,
    /// Take a read view when the transaction begins.
    pub snapshot: bool,
    pub read: ReadConfig,
    pub raw_read: ReadConfig,
    pub write: WriteConfig,
    pub raw_write: WriteConfig,
}

impl TransactionOptions {
    fn with_kind(kind: TransactionKind) -> Self {
        Self {
            kind,
            snapshot: false,
            read: ReadConfig::default(),
            raw_read: ReadConfig::default(),
            write: WriteConfig::default(),
            raw_write: WriteConfig::default(),
        }
    }

    pub fn pessimistic() -> Self {
        Self::with_kind(TransactionKind::Pessimistic(PessimisticOptions::default()))
    }

    pub fn optimistic() -> Self {
        Self::with_kind(TransactionKind::Optimistic)
    }

    /// Default options for a session opened in `mode`.
    pub fn for_mode(mode: ConcurrencyMode) -> Self {
        match mode {
            ConcurrencyMode::Pessimistic => Self::pessimistic(),
            ConcurrencyMode::Optimistic => Self::optimistic(),
        }
    }

    pub fn mode(&self) -> ConcurrencyMode {
        self.kind.mode()
    }

    #[must_use]
    pub fn snapshot(mut self, snapshot: bool) -> Self {
        self.snapshot = snapshot;
        self
    }

    /// Has no effect on optimistic options.
    #[must_use]
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        if let TransactionKind::Pessimistic(options) = &mut self.kind {
            options.lock_timeout = Some(timeout);
        }
        self
    }

    /// Has no effect on optimistic options.
    #[must_use]
    pub fn deadlock_detect(mut self, detect: bool) -> Self {
        if let TransactionKind::Pessimistic(options) = &mut self.kind {
            options.deadlock_detect = detect;
        }
        self
    }

    #[must_use]
    pub fn read_config(mut self, read: ReadConfig) -> Self {
        self.read = read;
        self
    }

    #[must_use]
    pub fn raw_read_config(mut self, read: ReadConfig) -> Self {
        self.raw_read = read;
        self
    }

    #[must_use]
    pub fn write_config(mut self, write: WriteConfig) -> Self {
        self.write = write;
        self
    }

    #[must_use]
    pub fn raw_write_config(mut self, write: WriteConfig) -> Self {
        self.raw_write = write;
        self
    }
}
