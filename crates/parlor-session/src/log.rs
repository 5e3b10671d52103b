//! Persistence for the account store.
//!
//! The log is a flat list of `name,password` lines. It is always loaded
//! whole at startup and rewritten whole after every new account.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::Account;

/// One persisted account, as it appears in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub name: String,
    pub password: String,
}

/// Backing storage for [`AccountStore`](crate::AccountStore).
pub trait AccountLog: Send {
    /// Reads every persisted account. A log that doesn't exist yet is
    /// empty, not an error.
    fn load_all(&self) -> io::Result<Vec<AccountRecord>>;

    /// Replaces the persisted log with exactly `accounts`.
    fn save_all(&mut self, accounts: &[Account]) -> io::Result<()>;
}

// ---------------------------------------------------------------------------
// FileAccountLog
// ---------------------------------------------------------------------------

/// Account log in a newline-delimited text file.
///
/// Saves go to a sibling `.tmp` file that is then renamed over the log,
/// so a crash mid-write leaves the previous log intact.
#[derive(Debug, Clone)]
pub struct FileAccountLog {
    path: PathBuf,
}

impl FileAccountLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl AccountLog for FileAccountLog {
    fn load_all(&self) -> io::Result<Vec<AccountRecord>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no account log yet, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut records = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').collect();
            match fields.as_slice() {
                [name, password] => records.push(AccountRecord {
                    name: (*name).to_owned(),
                    password: (*password).to_owned(),
                }),
                _ => tracing::warn!(
                    path = %self.path.display(),
                    line = lineno + 1,
                    "skipping malformed account record"
                ),
            }
        }
        Ok(records)
    }

    fn save_all(&mut self, accounts: &[Account]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut out = String::new();
        for account in accounts {
            out.push_str(account.name());
            out.push(',');
            out.push_str(account.password());
            out.push('\n');
        }
        let tmp = self.temp_path();
        fs::write(&tmp, out)?;
        fs::rename(&tmp, &self.path)
    }
}

// ---------------------------------------------------------------------------
// MemoryAccountLog
// ---------------------------------------------------------------------------

/// In-memory account log. Clones share the same records, so a test can
/// keep one handle and inspect what the store persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryAccountLog {
    records: Arc<Mutex<Vec<AccountRecord>>>,
}

impl MemoryAccountLog {
    /// Creates a log pre-populated with `records`.
    pub fn with_records(records: Vec<AccountRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }

    /// Snapshot of the persisted records.
    pub fn records(&self) -> Vec<AccountRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl AccountLog for MemoryAccountLog {
    fn load_all(&self) -> io::Result<Vec<AccountRecord>> {
        Ok(self.records())
    }

    fn save_all(&mut self, accounts: &[Account]) -> io::Result<()> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *records = accounts
            .iter()
            .map(|a| AccountRecord {
                name: a.name().to_owned(),
                password: a.password().to_owned(),
            })
            .collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str, password: &str) -> Account {
        Account::new(name.to_owned(), password.to_owned())
    }

    #[test]
    fn test_file_log_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileAccountLog::new(dir.path().join("PlayerAccounts.txt"));

        assert!(log.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_file_log_save_then_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = FileAccountLog::new(dir.path().join("PlayerAccounts.txt"));

        log.save_all(&[account("alice", "pw1"), account("bob", "pw2")])
            .unwrap();

        let text = fs::read_to_string(log.path()).unwrap();
        assert_eq!(text, "alice,pw1\nbob,pw2\n");
        let names: Vec<String> = log.load_all().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[test]
    fn test_file_log_save_is_full_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = FileAccountLog::new(dir.path().join("PlayerAccounts.txt"));

        log.save_all(&[account("alice", "pw1")]).unwrap();
        log.save_all(&[account("alice", "pw1"), account("bob", "pw2")])
            .unwrap();

        assert_eq!(log.load_all().unwrap().len(), 2, "no duplicated lines");
        assert!(!log.temp_path().exists(), "temp file renamed away");
    }

    #[test]
    fn test_file_log_skips_blank_and_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PlayerAccounts.txt");
        fs::write(&path, "alice,pw1\n\nbroken\ncarol,pw3,extra\nbob,pw2\r\n").unwrap();

        let records = FileAccountLog::new(&path).load_all().unwrap();

        assert_eq!(
            records,
            vec![
                AccountRecord {
                    name: "alice".into(),
                    password: "pw1".into()
                },
                AccountRecord {
                    name: "bob".into(),
                    password: "pw2".into()
                },
            ]
        );
    }

    #[test]
    fn test_file_log_creates_missing_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = FileAccountLog::new(dir.path().join("data").join("accounts.txt"));

        log.save_all(&[account("alice", "pw1")]).unwrap();

        assert_eq!(log.load_all().unwrap().len(), 1);
    }

    #[test]
    fn test_memory_log_clones_share_records() {
        let observer = MemoryAccountLog::default();
        let mut log = observer.clone();

        log.save_all(&[account("alice", "pw1")]).unwrap();

        assert_eq!(observer.records().len(), 1);
    }
}
