pub mod config;
pub mod error;
pub mod logger;
pub mod record;
pub mod replay;
pub mod storage;
pub mod store;

pub use error::{Error, Result};
pub use record::Record;
pub use replay::ReplayReport;
pub use storage::{FileLedger, Ledger, MemoryLedger};
pub use store::Store;
