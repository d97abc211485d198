use crate::error::{Error, Result};
use crate::record::{self, Record};
use crate::storage::Ledger;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File-backed ledger: one encoded record per `\n`-terminated line.
///
/// The file is opened in append mode. Each append is followed by `sync_all` so an
/// acknowledged record survives a crash. Bytes past the last acknowledged append (left by a
/// write that failed partway) are cut off before the next record is written.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    file: File,
    sequence: u64,
    committed_len: u64,
}

impl FileLedger {
    /// Open the ledger at `path`, creating the file if needed.
    ///
    /// Fails if the path is inaccessible (missing directory, permissions). If a previous
    /// process crashed mid-append and left an unterminated last line, that line is sealed with
    /// an invalid escape and a newline: it can never replay as a record, and later records
    /// start on a line of their own. Existing bytes are never touched.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::ledger("open", e))?;

        let (sequence, torn_tail) = scan(&path).map_err(|e| Error::ledger("scan", e))?;

        if let Some(fragment) = torn_tail {
            warn!(path = %path.display(), line = sequence, "sealing unterminated ledger tail");
            file.write_all(record::torn_suffix(&fragment))
                .map_err(|e| Error::ledger("seal", e))?;
            file.sync_all().map_err(|e| Error::ledger("sync", e))?;
        }

        let committed_len = file
            .metadata()
            .map_err(|e| Error::ledger("inspect", e))?
            .len();

        info!(path = %path.display(), lines = sequence, "opened ledger");

        Ok(FileLedger {
            path,
            file,
            sequence,
            committed_len,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cut the file back to the end of the last acknowledged record.
    fn discard_unacknowledged(&mut self) -> Result<()> {
        let len = self
            .file
            .metadata()
            .map_err(|e| Error::ledger("inspect", e))?
            .len();

        if len > self.committed_len {
            warn!(
                path = %self.path.display(),
                bytes = len - self.committed_len,
                "discarding unacknowledged ledger bytes"
            );
            self.file
                .set_len(self.committed_len)
                .map_err(|e| Error::ledger("repair", e))?;
        }
        Ok(())
    }

    fn write_line(&mut self, line: &[u8]) -> Result<()> {
        self.file
            .write_all(line)
            .map_err(|e| Error::ledger("append to", e))?;

        // Not acknowledged until it is on stable storage
        self.file
            .sync_all()
            .map_err(|e| Error::ledger("sync", e))
    }
}

impl Ledger for FileLedger {
    fn append(&mut self, record: &Record) -> Result<u64> {
        let mut line = record.encode();
        line.push('\n');

        self.discard_unacknowledged()?;

        if let Err(e) = self.write_line(line.as_bytes()) {
            // Retried at the start of the next append if this fails too
            if let Err(repair) = self.discard_unacknowledged() {
                warn!(%repair, "could not discard partial append");
            }
            return Err(e);
        }

        self.committed_len += line.len() as u64;
        self.sequence += 1;
        debug!(seq = self.sequence, opcode = record.opcode(), "appended record");
        Ok(self.sequence)
    }

    fn read_all(&self) -> Result<Vec<String>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::ledger("read", e)),
        };

        let mut reader = BufReader::new(file);
        let mut lines = Vec::new();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let n = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| Error::ledger("read", e))?;
            if n == 0 {
                break;
            }
            if buf.last() == Some(&b'\n') {
                buf.pop();
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
            }
            lines.push(String::from_utf8_lossy(&buf).into_owned());
        }

        Ok(lines)
    }

    fn sequence(&self) -> u64 {
        self.sequence
    }

    fn close(self) -> Result<()> {
        self.file
            .sync_all()
            .map_err(|e| Error::ledger("close", e))?;
        debug!(path = %self.path.display(), "closed ledger");
        Ok(())
    }
}

/// Count lines and return the last one if it is missing its terminator.
fn scan(path: &Path) -> io::Result<(u64, Option<Vec<u8>>)> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut buf = Vec::new();
    let mut lines = 0u64;
    let mut terminated = true;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        lines += 1;
        terminated = buf.last() == Some(&b'\n');
    }

    Ok((lines, if terminated { None } else { Some(buf) }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_ledger() -> (FileLedger, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let ledger = FileLedger::open(temp_dir.path().join("wal.log")).unwrap();
        (ledger, temp_dir)
    }

    #[test]
    fn test_append_and_read_back() {
        let (mut ledger, _temp_dir) = create_test_ledger();

        assert_eq!(ledger.append(&Record::put("hello", "world")).unwrap(), 1);
        assert_eq!(ledger.append(&Record::put("foo", "bar")).unwrap(), 2);

        let lines = ledger.read_all().unwrap();
        assert_eq!(lines, vec!["PUT:hello:world", "PUT:foo:bar"]);
        assert_eq!(ledger.sequence(), 2);
    }

    #[test]
    fn test_on_disk_format() {
        let (mut ledger, temp_dir) = create_test_ledger();
        ledger.append(&Record::put("x", "42")).unwrap();
        ledger.append(&Record::put("y", "hello")).unwrap();

        let raw = fs::read_to_string(temp_dir.path().join("wal.log")).unwrap();
        assert_eq!(raw, "PUT:x:42\nPUT:y:hello\n");
    }

    #[test]
    fn test_reopen_preserves_and_extends() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wal.log");

        {
            let mut ledger = FileLedger::open(&path).unwrap();
            ledger.append(&Record::put("key", "value")).unwrap();
            ledger.close().unwrap();
        }

        let mut ledger = FileLedger::open(&path).unwrap();
        assert_eq!(ledger.sequence(), 1);
        assert_eq!(ledger.append(&Record::put("key", "other")).unwrap(), 2);
        assert_eq!(
            ledger.read_all().unwrap(),
            vec!["PUT:key:value", "PUT:key:other"]
        );
    }

    #[test]
    fn test_open_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("no-such-dir").join("wal.log");

        let err = FileLedger::open(&path).unwrap_err();
        assert_eq!(err.io_kind(), Some(io::ErrorKind::NotFound));
    }

    #[test]
    fn test_read_all_after_file_removed_is_empty() {
        let (ledger, temp_dir) = create_test_ledger();
        fs::remove_file(temp_dir.path().join("wal.log")).unwrap();

        assert!(ledger.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_read_all_is_restartable() {
        let (mut ledger, _temp_dir) = create_test_ledger();
        ledger.append(&Record::put("a", "1")).unwrap();

        let first = ledger.read_all().unwrap();
        ledger.append(&Record::put("b", "2")).unwrap();
        let second = ledger.read_all().unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second, vec!["PUT:a:1", "PUT:b:2"]);
    }

    #[test]
    fn test_torn_tail_is_sealed_on_open() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wal.log");
        fs::write(&path, "PUT:a:1\nPUT:b:tr").unwrap();

        let mut ledger = FileLedger::open(&path).unwrap();
        assert_eq!(ledger.sequence(), 2);
        ledger.append(&Record::put("c", "3")).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw, "PUT:a:1\nPUT:b:tr\\?\nPUT:c:3\n");

        let lines = ledger.read_all().unwrap();
        assert!(Record::parse(&lines[1]).is_err());
        assert_eq!(lines[2], "PUT:c:3");
    }

    #[test]
    fn test_torn_tail_on_dangling_escape_stays_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wal.log");
        fs::write(&path, "PUT:a:1\nPUT:b:x\\").unwrap();

        let ledger = FileLedger::open(&path).unwrap();
        let lines = ledger.read_all().unwrap();
        assert_eq!(lines[1], "PUT:b:x\\?");
        assert!(Record::parse(&lines[1]).is_err());
    }

    #[test]
    fn test_partial_write_is_discarded_before_next_append() {
        let (mut ledger, temp_dir) = create_test_ledger();
        ledger.append(&Record::put("a", "1")).unwrap();

        // What a write_all that ran out of space leaves behind
        ledger.file.write_all(b"PUT:k:new-va").unwrap();

        assert_eq!(ledger.append(&Record::put("b", "2")).unwrap(), 2);

        let raw = fs::read_to_string(temp_dir.path().join("wal.log")).unwrap();
        assert_eq!(raw, "PUT:a:1\nPUT:b:2\n");
    }

    #[test]
    fn test_crlf_and_invalid_utf8_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wal.log");
        fs::write(&path, b"PUT:a:1\r\n\xff\xfe\nPUT:b:2\n").unwrap();

        let ledger = FileLedger::open(&path).unwrap();
        let lines = ledger.read_all().unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "PUT:a:1");
        assert_eq!(lines[2], "PUT:b:2");
    }
}
