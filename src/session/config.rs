use rocksdb::{FlushOptions, ReadOptions, WriteOptions};
use serde::{Deserialize, Serialize};

/// Which concurrency-control strategy a session was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    /// Row locks taken eagerly, with optional deadlock detection.
    Pessimistic,
    /// No locks; conflicting writes are detected when committing.
    Optimistic,
}

/// Read settings applied to one access path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadConfig {
    /// Verify block checksums on every read.
    ///
    /// Default: true
    pub verify_checksums: bool,

    /// Ignore prefix extractors and iterate in total key order.
    ///
    /// Default: false
    pub total_order_seek: bool,

    /// Populate the block cache with blocks read for this path.
    ///
    /// Default: true
    pub fill_cache: bool,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            verify_checksums: true,
            total_order_seek: false,
            fill_cache: true,
        }
    }
}

impl ReadConfig {
    pub(crate) fn to_engine(&self) -> ReadOptions {
        let mut options = ReadOptions::default();
        options.set_verify_checksums(self.verify_checksums);
        options.set_total_order_seek(self.total_order_seek);
        options.fill_cache(self.fill_cache);
        options
    }
}

/// Write settings applied to one access path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteConfig {
    /// Skip the engine's write-ahead log. Writes become volatile until flushed.
    ///
    /// Default: false
    pub disable_wal: bool,

    /// Fsync the write-ahead log before acknowledging a write.
    ///
    /// Default: false
    pub sync: bool,
}

impl WriteConfig {
    pub(crate) fn to_engine(&self) -> WriteOptions {
        let mut options = WriteOptions::default();
        options.disable_wal(self.disable_wal);
        options.set_sync(self.sync);
        options
    }
}

/// Settings for an explicit memtable flush.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushConfig {
    /// Block until the flush has finished.
    ///
    /// Default: true
    pub wait: bool,
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self { wait: true }
    }
}

impl FlushConfig {
    pub(crate) fn to_engine(&self) -> FlushOptions {
        let mut options = FlushOptions::default();
        options.set_wait(self.wait);
        options
    }
}
