pub mod file;
pub mod memory;

pub use file::FileLedger;
pub use memory::MemoryLedger;

use crate::error::Result;
use crate::record::Record;

/// Append-only record log backing a [`Store`](crate::store::Store).
///
/// Implementations must preserve:
/// - Append-only semantics: lines are never rewritten or removed
/// - Durability before return: `append` only succeeds once the record is recoverable
/// - Order: `read_all` yields lines in exactly the order they were appended
pub trait Ledger {
    /// Append a record (synchronous, flushed to stable storage before returning).
    ///
    /// Returns the 1-based position of the new line. On error the record must be treated as
    /// not written.
    fn append(&mut self, record: &Record) -> Result<u64>;

    /// Read every raw line from the start of the log, in append order.
    ///
    /// One-shot scan; a fresh call re-reads from the beginning. A log that does not exist
    /// yields an empty vector.
    fn read_all(&self) -> Result<Vec<String>>;

    /// Number of lines currently in the log.
    fn sequence(&self) -> u64;

    /// Flush and release the underlying resources.
    fn close(self) -> Result<()>
    where
        Self: Sized;
}
