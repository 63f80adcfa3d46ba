use crate::column_family::ColumnFamilyHandle;
use crate::cursor::Cursor;
use crate::session::Session;
use crate::session::config::{FlushConfig, ReadConfig, WriteConfig};
use crate::status::{Severity, Status, StatusCode, SubCode};
use crate::transaction::per_key;

/// Direct, non-transactional access to a session's engine.
///
/// Reads observe committed data as of each call and never a transaction's
/// pending writes or read view. Writes are applied immediately. In a
/// pessimistic session a raw write to a key locked by an open transaction
/// waits for that lock like any other writer.
#[derive(Clone)]
pub struct RawAccess<'a> {
    session: &'a Session,
    read: ReadConfig,
    write: WriteConfig,
}

impl<'a> RawAccess<'a> {
    pub(crate) fn new(session: &'a Session, read: ReadConfig, write: WriteConfig) -> Self {
        Self {
            session,
            read,
            write,
        }
    }

    pub fn read_config(&self) -> &ReadConfig {
        &self.read
    }

    pub fn write_config(&self) -> &WriteConfig {
        &self.write
    }

    pub fn get(&self, cf: &ColumnFamilyHandle, key: &[u8]) -> Result<Option<Vec<u8>>, Status> {
        let family = self.session.bind(cf)?;
        Ok(self
            .session
            .engine()
            .get(&family, key, &self.read.to_engine())?)
    }

    /// Per-key results in the order of `keys`, duplicates included.
    pub fn multi_get<K: AsRef<[u8]>>(
        &self,
        cf: &ColumnFamilyHandle,
        keys: &[K],
    ) -> Result<Vec<Result<Option<Vec<u8>>, Status>>, Status> {
        let family = self.session.bind(cf)?;
        let results = self
            .session
            .engine()
            .multi_get(&family, keys, &self.read.to_engine());
        Ok(per_key(results))
    }

    pub fn put(&self, cf: &ColumnFamilyHandle, key: &[u8], value: &[u8]) -> Result<(), Status> {
        let family = self.session.bind(cf)?;
        Ok(self
            .session
            .engine()
            .put(&family, key, value, &self.write.to_engine())?)
    }

    pub fn delete(&self, cf: &ColumnFamilyHandle, key: &[u8]) -> Result<(), Status> {
        let family = self.session.bind(cf)?;
        Ok(self
            .session
            .engine()
            .delete(&family, key, &self.write.to_engine())?)
    }

    /// Deletes every key in `[start, end)`.
    ///
    /// An empty range is a no-op. `start > end` is rejected.
    pub fn delete_range(
        &self,
        cf: &ColumnFamilyHandle,
        start: &[u8],
        end: &[u8],
    ) -> Result<(), Status> {
        if start > end {
            return Err(
                Status::new(StatusCode::InvalidArgument, SubCode::None, Severity::NoError)
                    .with_message("range start is after range end"),
            );
        }
        let family = self.session.bind(cf)?;
        if start == end {
            return Ok(());
        }
        Ok(self
            .session
            .engine()
            .delete_range(&family, start, end, &self.write.to_engine())?)
    }

    /// Iterates committed data only.
    pub fn iterator(&self, cf: &ColumnFamilyHandle) -> Result<Cursor<'a>, Status> {
        let family = self.session.bind(cf)?;
        let cursor = self
            .session
            .engine()
            .raw_cursor(&family, self.read.to_engine());
        Ok(Cursor::new(cursor, family))
    }

    /// Flushes the family's memtable. Only optimistic sessions support this.
    pub fn flush(&self, cf: &ColumnFamilyHandle, config: &FlushConfig) -> Result<(), Status> {
        let family = self.session.bind(cf)?;
        self.session.engine().flush(&family, &config.to_engine())
    }
}
