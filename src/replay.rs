//! Replay: rebuild the in-memory map from ledger lines.
//!
//! Corrupt or foreign lines never fail recovery. They are logged, counted and skipped, so a
//! damaged line cannot hide the valid records after it.

use crate::error::Result;
use crate::record::Record;
use crate::storage::Ledger;
use std::collections::HashMap;
use tracing::{info, warn};

/// Outcome counters for one replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Records applied to the map
    pub applied: u64,
    /// Non-blank lines that failed to parse
    pub skipped: u64,
    /// Empty lines, ignored
    pub blank: u64,
}

impl ReplayReport {
    pub fn is_clean(&self) -> bool {
        self.skipped == 0
    }
}

/// Apply `lines` in order onto `map`. Later records for a key overwrite earlier ones.
pub fn replay_lines<I, S>(lines: I, map: &mut HashMap<String, String>) -> ReplayReport
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut report = ReplayReport::default();

    for (index, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        if line.trim().is_empty() {
            report.blank += 1;
            continue;
        }

        match Record::parse(line) {
            Ok(Record::Put { key, value }) => {
                map.insert(key, value);
                report.applied += 1;
            }
            Err(reason) => {
                warn!(line = index + 1, %reason, "skipping corrupt ledger entry");
                report.skipped += 1;
            }
        }
    }

    report
}

/// Read the whole ledger and replay it into a fresh map.
///
/// Only I/O errors from the ledger are returned; parse failures end up in the report.
pub fn replay_to_tip<L: Ledger>(ledger: &L) -> Result<(HashMap<String, String>, ReplayReport)> {
    let lines = ledger.read_all()?;
    let mut map = HashMap::new();
    let report = replay_lines(&lines, &mut map);

    info!(
        applied = report.applied,
        skipped = report.skipped,
        keys = map.len(),
        "recovered state from ledger"
    );

    Ok((map, report))
}
