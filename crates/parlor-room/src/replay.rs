//! Replay persistence: one log of accepted moves per room.
//!
//! Every accepted move rewrites the room's whole log. Logs outlive their
//! rooms so a finished game can still be inspected.

use std::collections::HashMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use parlor_protocol::{MovePayload, RoomId};

/// One accepted move as recorded in a replay log.
pub type ReplayEntry = MovePayload;

/// Backing storage for replay logs, keyed by room.
pub trait ReplayStore: Send {
    /// Replaces the persisted log of `room` with exactly `entries`.
    fn save(&mut self, room: RoomId, entries: &[ReplayEntry]) -> io::Result<()>;

    /// Reads back the persisted log of `room`, oldest move first. A room
    /// with nothing persisted has an empty log.
    fn load(&self, room: RoomId) -> io::Result<Vec<ReplayEntry>>;

    /// The highest room id with a persisted log, if any.
    fn last_room(&self) -> io::Result<Option<RoomId>> {
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// FileReplayStore
// ---------------------------------------------------------------------------

/// Keeps each room's log in `<dir>/replay-<room>.txt` as `slot,mark` lines.
#[derive(Debug, Clone)]
pub struct FileReplayStore {
    dir: PathBuf,
}

impl FileReplayStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the log of `room` lives.
    pub fn path_for(&self, room: RoomId) -> PathBuf {
        self.dir.join(format!("replay-{}.txt", room.0))
    }
}

impl ReplayStore for FileReplayStore {
    fn save(&mut self, room: RoomId, entries: &[ReplayEntry]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut out = String::new();
        for entry in entries {
            for field in [&entry.slot, &entry.mark] {
                if field.contains([',', '\r', '\n']) {
                    return Err(io::Error::new(
                        ErrorKind::InvalidInput,
                        format!("replay field {field:?} cannot be stored as a line"),
                    ));
                }
            }
            out.push_str(&entry.slot);
            out.push(',');
            out.push_str(&entry.mark);
            out.push('\n');
        }
        let path = self.path_for(room);
        let tmp = path.with_extension("txt.tmp");
        fs::write(&tmp, out)?;
        fs::rename(&tmp, &path)
    }

    fn load(&self, room: RoomId) -> io::Result<Vec<ReplayEntry>> {
        let path = self.path_for(room);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut entries = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match line.split(',').collect::<Vec<_>>().as_slice() {
                [slot, mark] => entries.push(ReplayEntry::new(*slot, *mark)),
                _ => tracing::warn!(
                    path = %path.display(),
                    line = lineno + 1,
                    "skipping malformed replay record"
                ),
            }
        }
        Ok(entries)
    }

    fn last_room(&self) -> io::Result<Option<RoomId>> {
        let listing = match fs::read_dir(&self.dir) {
            Ok(listing) => listing,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let mut last = None;
        for item in listing {
            let name = item?.file_name();
            let id = name
                .to_str()
                .and_then(|n| n.strip_prefix("replay-"))
                .and_then(|n| n.strip_suffix(".txt"))
                .and_then(|n| n.parse::<u64>().ok());
            if let Some(id) = id {
                last = last.max(Some(RoomId(id)));
            }
        }
        Ok(last)
    }
}

// ---------------------------------------------------------------------------
// MemoryReplayStore
// ---------------------------------------------------------------------------

/// Replay logs held in memory. Clones share the same logs.
#[derive(Debug, Clone, Default)]
pub struct MemoryReplayStore {
    logs: Arc<Mutex<HashMap<RoomId, Vec<ReplayEntry>>>>,
}

impl MemoryReplayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of what has been persisted for `room`.
    pub fn entries(&self, room: RoomId) -> Vec<ReplayEntry> {
        self.lock().get(&room).cloned().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RoomId, Vec<ReplayEntry>>> {
        self.logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ReplayStore for MemoryReplayStore {
    fn save(&mut self, room: RoomId, entries: &[ReplayEntry]) -> io::Result<()> {
        self.lock().insert(room, entries.to_vec());
        Ok(())
    }

    fn load(&self, room: RoomId) -> io::Result<Vec<ReplayEntry>> {
        Ok(self.entries(room))
    }

    fn last_room(&self) -> io::Result<Option<RoomId>> {
        Ok(self.lock().keys().max().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moves() -> Vec<ReplayEntry> {
        vec![ReplayEntry::new("4", "X"), ReplayEntry::new("0", "O")]
    }

    #[test]
    fn test_file_store_save_then_load_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileReplayStore::new(dir.path());

        store.save(RoomId(1), &moves()).unwrap();

        assert_eq!(store.load(RoomId(1)).unwrap(), moves());
        let text = fs::read_to_string(store.path_for(RoomId(1))).unwrap();
        assert_eq!(text, "4,X\n0,O\n");
    }

    #[test]
    fn test_file_store_rooms_do_not_share_a_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileReplayStore::new(dir.path());

        store.save(RoomId(1), &moves()).unwrap();
        store.save(RoomId(2), &[ReplayEntry::new("8", "O")]).unwrap();

        assert_eq!(store.load(RoomId(1)).unwrap().len(), 2);
        assert_eq!(store.load(RoomId(2)).unwrap(), vec![ReplayEntry::new("8", "O")]);
    }

    #[test]
    fn test_file_store_missing_log_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReplayStore::new(dir.path().join("not-yet"));

        assert!(store.load(RoomId(7)).unwrap().is_empty());
    }

    #[test]
    fn test_file_store_save_is_full_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileReplayStore::new(dir.path());

        store.save(RoomId(1), &moves()[..1]).unwrap();
        store.save(RoomId(1), &moves()).unwrap();

        assert_eq!(store.load(RoomId(1)).unwrap(), moves());
    }

    #[test]
    fn test_file_store_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReplayStore::new(dir.path());
        fs::write(store.path_for(RoomId(3)), "4,X\nbogus\n\n0,O,extra\n2,O\n").unwrap();

        let entries = store.load(RoomId(3)).unwrap();

        assert_eq!(entries, vec![ReplayEntry::new("4", "X"), ReplayEntry::new("2", "O")]);
    }

    #[test]
    fn test_file_store_refuses_fields_with_line_breaks() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileReplayStore::new(dir.path());
        store.save(RoomId(1), &moves()).unwrap();

        let result = store.save(RoomId(1), &[ReplayEntry::new("4", "X\n5")]);

        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(store.load(RoomId(1)).unwrap(), moves());
    }

    #[test]
    fn test_file_store_last_room_reads_highest_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileReplayStore::new(dir.path());
        assert_eq!(store.last_room().unwrap(), None);

        store.save(RoomId(2), &moves()).unwrap();
        store.save(RoomId(10), &[]).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        assert_eq!(store.last_room().unwrap(), Some(RoomId(10)));
    }

    #[test]
    fn test_file_store_last_room_of_missing_dir_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileReplayStore::new(dir.path().join("not-yet"));

        assert_eq!(store.last_room().unwrap(), None);
    }

    #[test]
    fn test_memory_store_clones_share_logs() {
        let inspector = MemoryReplayStore::new();
        let mut store = inspector.clone();

        store.save(RoomId(1), &moves()).unwrap();

        assert_eq!(inspector.entries(RoomId(1)), moves());
        assert!(inspector.entries(RoomId(2)).is_empty());
    }
}
