//! File-backed reconciliation store.
//!
//! One JSON document per canonical event, named after its synthetic id.
//! Writes go through a temp file and a rename so a crash never leaves a
//! half-written record behind.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::{SyncError, SyncResult};
use crate::event::Event;
use crate::source::EventStore;

const RECORD_EXTENSION: &str = "json";

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &str) -> SyncResult<PathBuf> {
        // Ids become file names; refuse anything that could escape the directory
        if id.is_empty()
            || id.starts_with('.')
            || id.contains(|c: char| c == '/' || c == '\\' || c.is_control())
        {
            return Err(SyncError::Store(format!("Unusable record id '{}'", id)));
        }
        Ok(self.dir.join(format!("{}.{}", id, RECORD_EXTENSION)))
    }

    async fn read_record(path: &Path) -> SyncResult<Event> {
        let content = fs::read_to_string(path).await?;
        serde_json::from_str(&content).map_err(|e| {
            SyncError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}

impl EventStore for FileStore {
    async fn list_all(&self) -> SyncResult<Vec<Event>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == RECORD_EXTENSION) {
                paths.push(path);
            }
        }
        // Sort for deterministic pass order
        paths.sort();

        let mut events = Vec::with_capacity(paths.len());
        for path in paths {
            events.push(Self::read_record(&path).await?);
        }

        debug!(count = events.len(), dir = %self.dir.display(), "listed canonical events");
        Ok(events)
    }

    async fn get(&self, id: &str) -> SyncResult<Option<Event>> {
        let path = self.record_path(id)?;
        match fs::try_exists(&path).await? {
            true => Ok(Some(Self::read_record(&path).await?)),
            false => Ok(None),
        }
    }

    async fn put(&self, event: &Event) -> SyncResult<()> {
        let id = event
            .id
            .as_deref()
            .ok_or_else(|| SyncError::Store(format!("'{}' has no identifier", event.title)))?;
        let path = self.record_path(id)?;
        let temp = path.with_extension(format!("{}.tmp", RECORD_EXTENSION));

        let content = serde_json::to_string_pretty(event)
            .map_err(|e| SyncError::Serialization(e.to_string()))?;

        fs::create_dir_all(&self.dir).await?;
        fs::write(&temp, content).await?;
        fs::rename(&temp, &path).await?;
        Ok(())
    }

    async fn remove(&self, id: &str) -> SyncResult<()> {
        let path = self.record_path(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // Already gone is the state we wanted
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn make_test_event(id: &str) -> Event {
        Event {
            id: Some(id.to_string()),
            title: "Dentist".to_string(),
            start: Utc.with_ymd_and_hms(2030, 3, 20, 15, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2030, 3, 20, 16, 0, 0).unwrap(),
            all_day: false,
            description: "Bring forms".to_string(),
            color: Some("pink".to_string()),
            created: None,
            updated: Some(Utc.with_ymd_and_hms(2030, 3, 1, 8, 0, 0).unwrap()),
            tasks_id: Some("page-1".to_string()),
            schedule_id: Some("gcal-1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_put_get_and_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("events"));

        let mut event = make_test_event("e1");
        store.put(&event).await.unwrap();
        assert_eq!(store.get("e1").await.unwrap(), Some(event.clone()));

        event.title = "Dentist (rescheduled)".to_string();
        store.put(&event).await.unwrap();
        assert_eq!(store.get("e1").await.unwrap().unwrap().title, "Dentist (rescheduled)");
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_record_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_all_on_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("not-created-yet"));
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_all_is_sorted_and_skips_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.put(&make_test_event("b")).await.unwrap();
        store.put(&make_test_event("a")).await.unwrap();
        std::fs::write(dir.path().join("c.json.tmp"), "garbage").unwrap();

        let ids: Vec<_> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .filter_map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.put(&make_test_event("e1")).await.unwrap();

        store.remove("e1").await.unwrap();
        store.remove("e1").await.unwrap();
        assert_eq!(store.get("e1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.get("../escape").await.is_err());
        assert!(store.put(&make_test_event("")).await.is_err());
    }
}
