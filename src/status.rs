//! Structured outcome of every fallible bridge operation.
//!
//! A [`Status`] is the Rust form of the engine's `code`/`subcode`/`severity`
//! triple, extended with a [`BridgeCode`] for conditions the bridge invents on
//! its own (duplicate or unknown column family names, misuse of a finished
//! transaction). Bridge-origin statuses always use the reserved
//! [`StatusCode::Bridge`] code, so callers can tell them apart from engine
//! failures without looking at the message text.

use std::fmt;

use rocksdb::ErrorKind;

/// Primary classification of an outcome.
///
/// Discriminants match the engine's native numbering. [`StatusCode::Bridge`]
/// sits outside the native range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StatusCode {
    Ok = 0,
    NotFound = 1,
    Corruption = 2,
    NotSupported = 3,
    InvalidArgument = 4,
    IoError = 5,
    MergeInProgress = 6,
    Incomplete = 7,
    ShutdownInProgress = 8,
    TimedOut = 9,
    Aborted = 10,
    Busy = 11,
    Expired = 12,
    TryAgain = 13,
    CompactionTooLarge = 14,
    ColumnFamilyDropped = 15,
    /// Reserved for conditions raised by the bridge itself.
    Bridge = u8::MAX,
}

impl StatusCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    fn from_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotFound => StatusCode::NotFound,
            ErrorKind::Corruption => StatusCode::Corruption,
            ErrorKind::NotSupported => StatusCode::NotSupported,
            ErrorKind::InvalidArgument => StatusCode::InvalidArgument,
            ErrorKind::IOError => StatusCode::IoError,
            ErrorKind::MergeInProgress => StatusCode::MergeInProgress,
            ErrorKind::Incomplete => StatusCode::Incomplete,
            ErrorKind::ShutdownInProgress => StatusCode::ShutdownInProgress,
            ErrorKind::TimedOut => StatusCode::TimedOut,
            ErrorKind::Aborted => StatusCode::Aborted,
            ErrorKind::Busy => StatusCode::Busy,
            ErrorKind::Expired => StatusCode::Expired,
            ErrorKind::TryAgain => StatusCode::TryAgain,
            ErrorKind::CompactionTooLarge => StatusCode::CompactionTooLarge,
            ErrorKind::ColumnFamilyDropped => StatusCode::ColumnFamilyDropped,
            // Messages raised by the binding itself (bad paths, unknown family
            // names) carry no engine prefix and parse as `Unknown`.
            _ => StatusCode::InvalidArgument,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusCode::Ok => "ok",
            StatusCode::NotFound => "not found",
            StatusCode::Corruption => "corruption",
            StatusCode::NotSupported => "not supported",
            StatusCode::InvalidArgument => "invalid argument",
            StatusCode::IoError => "I/O error",
            StatusCode::MergeInProgress => "merge in progress",
            StatusCode::Incomplete => "incomplete",
            StatusCode::ShutdownInProgress => "shutdown in progress",
            StatusCode::TimedOut => "timed out",
            StatusCode::Aborted => "aborted",
            StatusCode::Busy => "busy",
            StatusCode::Expired => "expired",
            StatusCode::TryAgain => "try again",
            StatusCode::CompactionTooLarge => "compaction too large",
            StatusCode::ColumnFamilyDropped => "column family dropped",
            StatusCode::Bridge => "bridge error",
        };
        f.write_str(name)
    }
}

/// Refinement of a [`StatusCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SubCode {
    None = 0,
    MutexTimeout = 1,
    LockTimeout = 2,
    LockLimit = 3,
    NoSpace = 4,
    Deadlock = 5,
    StaleFile = 6,
    MemoryLimit = 7,
    SpaceLimit = 8,
    PathNotFound = 9,
    MergeOperandsInsufficientCapacity = 10,
    ManualCompactionPaused = 11,
    Overwritten = 12,
    TxnNotPrepared = 13,
    IoFenced = 14,
    /// Reserved for conditions raised by the bridge itself.
    Bridge = u8::MAX,
}

/// The engine renders a subcode as a fixed phrase inside its status text.
/// The binding only hands us that text, so the subcode is recovered from it.
const SUBCODE_MESSAGES: &[(&str, SubCode)] = &[
    ("Timeout Acquiring Mutex", SubCode::MutexTimeout),
    ("Timeout waiting to lock key", SubCode::LockTimeout),
    (
        "Failed to acquire lock due to max_num_locks limit",
        SubCode::LockLimit,
    ),
    ("No space left on device", SubCode::NoSpace),
    ("Deadlock", SubCode::Deadlock),
    ("Stale file handle", SubCode::StaleFile),
    ("Memory limit reached", SubCode::MemoryLimit),
    ("Space limit reached", SubCode::SpaceLimit),
    ("No such file or directory", SubCode::PathNotFound),
    (
        "Insufficient capacity for merge operands",
        SubCode::MergeOperandsInsufficientCapacity,
    ),
    ("Manual compaction paused", SubCode::ManualCompactionPaused),
    ("(overwritten)", SubCode::Overwritten),
    ("Txn not prepared", SubCode::TxnNotPrepared),
    ("IO fenced off", SubCode::IoFenced),
];

impl SubCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    fn from_message(message: &str) -> Self {
        SUBCODE_MESSAGES
            .iter()
            .find(|(phrase, _)| message.contains(phrase))
            .map_or(SubCode::None, |(_, subcode)| *subcode)
    }
}

/// How bad an error is for the engine as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Severity {
    NoError = 0,
    SoftError = 1,
    HardError = 2,
    FatalError = 3,
    UnrecoverableError = 4,
}

/// Conditions that originate in the bridge and have no engine equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BridgeCode {
    /// Contract violation or any other bridge-side failure.
    Generic = 1,
    DuplicateColumnFamily = 2,
    UnknownColumnFamily = 3,
}

impl BridgeCode {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Outcome of a bridge operation.
///
/// `Status::ok()` is the only value for which [`Status::is_ok`] holds: code
/// `Ok`, subcode `None`, severity `NoError` and no bridge code. Every other
/// value describes a failure, and fallible operations return it as the `Err`
/// side of a `Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    code: StatusCode,
    subcode: SubCode,
    severity: Severity,
    bridge_code: Option<BridgeCode>,
    message: Option<String>,
}

impl Status {
    pub fn ok() -> Self {
        Self {
            code: StatusCode::Ok,
            subcode: SubCode::None,
            severity: Severity::NoError,
            bridge_code: None,
            message: None,
        }
    }

    /// Builds a native status from its parts.
    pub fn new(code: StatusCode, subcode: SubCode, severity: Severity) -> Self {
        Self {
            code,
            subcode,
            severity,
            bridge_code: None,
            message: None,
        }
    }

    /// Converts an engine failure, keeping its text as the message.
    pub fn from_engine(err: rocksdb::Error) -> Self {
        let code = StatusCode::from_kind(err.kind());
        let message = err.into_string();
        Self {
            code,
            subcode: SubCode::from_message(&message),
            severity: Severity::NoError,
            bridge_code: None,
            message: Some(message),
        }
    }

    fn bridge(bridge_code: BridgeCode, message: String) -> Self {
        Self {
            code: StatusCode::Bridge,
            subcode: SubCode::Bridge,
            severity: Severity::SoftError,
            bridge_code: Some(bridge_code),
            message: Some(message),
        }
    }

    pub(crate) fn duplicate_column_family(name: &str) -> Self {
        Self::bridge(
            BridgeCode::DuplicateColumnFamily,
            format!("column family '{name}' already exists"),
        )
    }

    pub(crate) fn unknown_column_family(name: &str) -> Self {
        Self::bridge(
            BridgeCode::UnknownColumnFamily,
            format!("column family '{name}' not found"),
        )
    }

    pub(crate) fn contract(message: impl Into<String>) -> Self {
        Self::bridge(BridgeCode::Generic, message.into())
    }

    pub(crate) fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    pub fn subcode(&self) -> SubCode {
        self.subcode
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Present only for bridge-origin statuses.
    pub fn bridge_code(&self) -> Option<BridgeCode> {
        self.bridge_code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok
            && self.subcode == SubCode::None
            && self.severity == Severity::NoError
    }

    pub fn is_bridge(&self) -> bool {
        self.bridge_code.is_some()
    }

    pub fn is_not_found(&self) -> bool {
        self.code == StatusCode::NotFound
    }

    pub fn is_timed_out(&self) -> bool {
        self.code == StatusCode::TimedOut
    }

    pub fn is_busy(&self) -> bool {
        self.code == StatusCode::Busy
    }

    /// True for the outcomes a commit or lock acquisition reports when another
    /// writer got there first. The caller decides whether to retry.
    pub fn is_conflict(&self) -> bool {
        matches!(self.code, StatusCode::Busy | StatusCode::TryAgain)
    }

    /// `Ok(())` for the clean status, `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), Status> {
        if self.is_ok() { Ok(()) } else { Err(self) }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::ok()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        if !matches!(self.subcode, SubCode::None | SubCode::Bridge) {
            write!(f, " ({:?})", self.subcode)?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Status {}

impl From<rocksdb::Error> for Status {
    fn from(err: rocksdb::Error) -> Self {
        Status::from_engine(err)
    }
}
