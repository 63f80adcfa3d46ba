use rocksdb::{DBAccess, DBRawIteratorWithThreadMode};

use crate::session::engine::BoundFamily;
use crate::status::Status;

/// Positional access shared by every engine iterator the bridge hands out.
pub(crate) trait PositionalRead {
    fn seek_to_first(&mut self);
    fn seek_to_last(&mut self);
    fn seek(&mut self, key: &[u8]);
    fn seek_for_prev(&mut self, key: &[u8]);
    fn next(&mut self);
    fn prev(&mut self);
    fn valid(&self) -> bool;
    fn key(&self) -> Option<&[u8]>;
    fn value(&self) -> Option<&[u8]>;
    fn status(&self) -> Result<(), rocksdb::Error>;
}

impl<D: DBAccess> PositionalRead for DBRawIteratorWithThreadMode<'_, D> {
    fn seek_to_first(&mut self) {
        DBRawIteratorWithThreadMode::seek_to_first(self);
    }

    fn seek_to_last(&mut self) {
        DBRawIteratorWithThreadMode::seek_to_last(self);
    }

    fn seek(&mut self, key: &[u8]) {
        DBRawIteratorWithThreadMode::seek(self, key);
    }

    fn seek_for_prev(&mut self, key: &[u8]) {
        DBRawIteratorWithThreadMode::seek_for_prev(self, key);
    }

    fn next(&mut self) {
        DBRawIteratorWithThreadMode::next(self);
    }

    fn prev(&mut self) {
        DBRawIteratorWithThreadMode::prev(self);
    }

    fn valid(&self) -> bool {
        DBRawIteratorWithThreadMode::valid(self)
    }

    fn key(&self) -> Option<&[u8]> {
        DBRawIteratorWithThreadMode::key(self)
    }

    fn value(&self) -> Option<&[u8]> {
        DBRawIteratorWithThreadMode::value(self)
    }

    fn status(&self) -> Result<(), rocksdb::Error> {
        DBRawIteratorWithThreadMode::status(self)
    }
}

/// A positional reader over one column family and one read view.
///
/// A fresh cursor is unpositioned: call one of the seek methods first.
/// [`Cursor::is_valid`] decides whether [`Cursor::key`] and [`Cursor::value`]
/// return anything. Becoming invalid is not by itself an error; once a scan
/// stops, check [`Cursor::status`] to tell an exhausted range from a failure.
///
/// A cursor created by a transaction sees that transaction's pending writes
/// merged into the committed data. A raw cursor sees committed data only.
///
/// # Example
///
/// ```ignore
/// let mut cursor = session.raw().iterator(&cf)?;
/// cursor.seek_to_first();
/// while cursor.is_valid() {
///     println!("{:?} => {:?}", cursor.key(), cursor.value());
///     cursor.next();
/// }
/// cursor.status()?;
/// ```
pub struct Cursor<'a> {
    inner: Box<dyn PositionalRead + 'a>,
    // Keeps the engine family alive while the cursor is, even if it is
    // dropped from the registry meanwhile.
    _family: BoundFamily<'a>,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(inner: Box<dyn PositionalRead + 'a>, family: BoundFamily<'a>) -> Self {
        Self {
            inner,
            _family: family,
        }
    }

    pub fn seek_to_first(&mut self) {
        self.inner.seek_to_first();
    }

    pub fn seek_to_last(&mut self) {
        self.inner.seek_to_last();
    }

    /// Positions at the first key at or after `key`.
    pub fn seek(&mut self, key: &[u8]) {
        self.inner.seek(key);
    }

    /// Positions at the last key at or before `key`.
    pub fn seek_for_prev(&mut self, key: &[u8]) {
        self.inner.seek_for_prev(key);
    }

    /// Advances to the next key. Does nothing on an invalid cursor.
    pub fn next(&mut self) {
        if self.inner.valid() {
            self.inner.next();
        }
    }

    /// Steps back to the previous key. Does nothing on an invalid cursor.
    pub fn prev(&mut self) {
        if self.inner.valid() {
            self.inner.prev();
        }
    }

    pub fn is_valid(&self) -> bool {
        self.inner.valid()
    }

    pub fn key(&self) -> Option<&[u8]> {
        self.inner.key()
    }

    pub fn value(&self) -> Option<&[u8]> {
        self.inner.value()
    }

    /// `Ok(())` unless iteration stopped because of an engine failure.
    pub fn status(&self) -> Result<(), Status> {
        self.inner.status().map_err(Status::from)
    }
}
