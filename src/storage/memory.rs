use crate::error::Result;
use crate::record::Record;
use crate::storage::Ledger;

/// Volatile ledger for tests, local demos, and embedding.
///
/// Keeps the encoded lines in a vector; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    lines: Vec<String>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from raw lines, as if read back from a file (may contain corrupt entries).
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MemoryLedger {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Append a raw line without encoding it.
    pub fn push_raw(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl Ledger for MemoryLedger {
    fn append(&mut self, record: &Record) -> Result<u64> {
        self.lines.push(record.encode());
        Ok(self.lines.len() as u64)
    }

    fn read_all(&self) -> Result<Vec<String>> {
        Ok(self.lines.clone())
    }

    fn sequence(&self) -> u64 {
        self.lines.len() as u64
    }

    fn close(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_order() {
        let mut ledger = MemoryLedger::new();
        ledger.append(&Record::put("a", "1")).unwrap();
        ledger.push_raw("garbage");
        ledger.append(&Record::put("b", "2")).unwrap();

        assert_eq!(ledger.read_all().unwrap(), vec!["PUT:a:1", "garbage", "PUT:b:2"]);
        assert_eq!(ledger.sequence(), 3);
    }
}
