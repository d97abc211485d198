use crate::error::Result;
use crate::record::Record;
use crate::replay::{replay_to_tip, ReplayReport};
use crate::storage::Ledger;
use std::collections::HashMap;

/// In-memory key-value map made durable by a [`Ledger`].
///
/// A `Store` only exists once recovery has finished: construction replays the whole ledger and
/// fails outright if the ledger cannot be read. Every `put` reaches stable storage before it
/// becomes visible through `get`.
///
/// `put` takes `&mut self`, so append-then-apply is exclusive. Sharing a store between threads
/// needs a single `Mutex<Store<_>>` around it.
#[derive(Debug)]
pub struct Store<L: Ledger> {
    ledger: L,
    data: HashMap<String, String>,
    recovery: ReplayReport,
}

impl<L: Ledger> Store<L> {
    /// Take ownership of an opened ledger and rebuild state from it.
    pub fn new(ledger: L) -> Result<Self> {
        let (data, recovery) = replay_to_tip(&ledger)?;
        Ok(Store {
            ledger,
            data,
            recovery,
        })
    }

    /// Record `key = value` in the ledger, then apply it in memory.
    ///
    /// If the append fails the error is returned and the map is left as it was.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let record = Record::put(key, value);
        self.ledger.append(&record)?;

        match record {
            Record::Put { key, value } => {
                self.data.insert(key, value);
            }
        }
        Ok(())
    }

    /// Current value for `key`, or `None` if it was never set.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// All entries, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Counters from the replay that built this store.
    pub fn recovery(&self) -> ReplayReport {
        self.recovery
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Close the underlying ledger. The in-memory map is dropped with the store.
    pub fn close(self) -> Result<()> {
        self.ledger.close()
    }
}
