use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::users::repo::{self, exists_by_phone, find_by_email, IdsExhausted};
use crate::users::repo_types::User;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("records file {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("records file {path} has {count} unreadable record(s)")]
    UnreadableRecords { path: PathBuf, count: usize },
    #[error("cannot encode records: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    IdsExhausted(#[from] IdsExhausted),
    #[error("Phone number already registered")]
    DuplicatePhone,
    #[error("Email already registered")]
    DuplicateEmail,
}

/// Builds the record to insert once its id is known.
pub type BuildRecord = Box<dyn FnOnce(u64) -> User + Send>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Whole collection; an absent, unreadable or malformed file reads as empty.
    /// Individual records that do not decode are skipped.
    async fn load(&self) -> Vec<User>;
    /// Replaces the whole collection.
    async fn save(&self, users: &[User]) -> Result<(), StoreError>;
    /// Allocates an id, builds the record and appends it unless its phone or email
    /// is already registered. Runs as one unit against the current collection.
    async fn insert(&self, build: BuildRecord) -> Result<User, StoreError>;
    /// Assigns ids to records lacking one and persists them. Returns the count repaired.
    async fn repair_ids(&self) -> Result<usize, StoreError>;
}

/// Collection kept as a pretty-printed JSON array in a single file.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Reads the file as a list and decodes each entry on its own.
    /// Returns the decoded records and how many entries were skipped.
    async fn read(&self) -> Result<(Vec<User>, usize), StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), 0)),
            Err(e) => return Err(self.io_err(e)),
        };
        let entries: Vec<serde_json::Value> =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Malformed {
                path: self.path.clone(),
                source,
            })?;

        let mut users = Vec::with_capacity(entries.len());
        let mut skipped = 0;
        for (index, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<User>(entry) {
                Ok(user) => users.push(user),
                Err(e) => {
                    warn!(path = %self.path.display(), index, error = %e, "skipping unreadable record");
                    skipped += 1;
                }
            }
        }
        Ok((users, skipped))
    }

    /// Like `read`, but any skipped record is an error so a rewrite never drops it.
    async fn read_strict(&self) -> Result<Vec<User>, StoreError> {
        match self.read().await? {
            (users, 0) => Ok(users),
            (_, count) => Err(StoreError::UnreadableRecords {
                path: self.path.clone(),
                count,
            }),
        }
    }

    async fn write(&self, users: &[User]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(users).map_err(StoreError::Encode)?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| self.io_err(e))?;
        }

        // Write next to the target, then rename over it
        let mut temp_path = self.path.clone().into_os_string();
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);
        tokio::fs::write(&temp_path, &json)
            .await
            .map_err(|e| self.io_err(e))?;
        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&temp_path).await {
                warn!(path = %temp_path.display(), error = %cleanup, "could not remove temp file");
            }
            return Err(self.io_err(e));
        }

        debug!(path = %self.path.display(), records = users.len(), "records saved");
        Ok(())
    }
}

#[async_trait]
impl UserStore for JsonFileStore {
    async fn load(&self) -> Vec<User> {
        let _guard = self.lock.lock().await;
        match self.read().await {
            Ok((users, _)) => users,
            Err(e) => {
                warn!(error = %e, "treating records file as empty");
                Vec::new()
            }
        }
    }

    async fn save(&self, users: &[User]) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.write(users).await
    }

    async fn insert(&self, build: BuildRecord) -> Result<User, StoreError> {
        let _guard = self.lock.lock().await;
        let mut users = self.read_strict().await?;

        let user = build(repo::next_id(&users)?);
        if exists_by_phone(&users, &user.phone) {
            return Err(StoreError::DuplicatePhone);
        }
        if let Some(email) = user.email.as_deref() {
            if find_by_email(&users, email).is_some() {
                return Err(StoreError::DuplicateEmail);
            }
        }

        users.push(user.clone());
        self.write(&users).await?;
        Ok(user)
    }

    async fn repair_ids(&self) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().await;
        let mut users = self.read_strict().await?;
        let repaired = repo::repair_ids(&mut users)?;
        if repaired > 0 {
            self.write(&users).await?;
        }
        Ok(repaired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo::tests::user;
    use std::sync::Arc;

    fn store() -> (tempfile::TempDir, JsonFileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data").join("users.json"));
        (dir, store)
    }

    #[tokio::test]
    async fn missing_file_loads_empty_and_is_not_created() {
        let (_dir, store) = store();
        assert!(store.load().await.is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn malformed_file_loads_empty() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();

        for content in ["not json", "{\"id\": 1}", "[1, 2, 3]", ""] {
            std::fs::write(store.path(), content).unwrap();
            assert!(store.load().await.is_empty(), "{content:?}");
        }
    }

    #[tokio::test]
    async fn save_then_load_roundtrip() {
        let (_dir, store) = store();
        let users = vec![
            user(Some(1), "a", "9000000001", Some("a@example.com")),
            user(Some(2), "b", "9000000002", None),
        ];
        store.save(&users).await.unwrap();

        let loaded = store.load().await;
        assert_eq!(loaded, users);

        store.save(&loaded).await.unwrap();
        assert_eq!(store.load().await, users);

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.starts_with("[\n"), "pretty printed");
    }

    #[tokio::test]
    async fn save_reports_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        // parent "directory" is a regular file
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let store = JsonFileStore::new(blocker.join("users.json"));

        let err = store.save(&[]).await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[tokio::test]
    async fn insert_allocates_sequential_ids() {
        let (_dir, store) = store();
        let a = store
            .insert(Box::new(|id| user(Some(id), "a", "9000000001", None)))
            .await
            .unwrap();
        let b = store
            .insert(Box::new(|id| user(Some(id), "b", "9000000002", None)))
            .await
            .unwrap();
        assert_eq!(a.id, Some(1));
        assert_eq!(b.id, Some(2));
        assert_eq!(store.load().await.len(), 2);
    }

    #[tokio::test]
    async fn insert_rejects_duplicates_and_leaves_store_unchanged() {
        let (_dir, store) = store();
        store
            .insert(Box::new(|id| user(Some(id), "a", "9876543210", Some("a@example.com"))))
            .await
            .unwrap();

        let err = store
            .insert(Box::new(|id| user(Some(id), "b", "919876543210", None)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicatePhone));

        let err = store
            .insert(Box::new(|id| user(Some(id), "c", "9000000003", Some("A@Example.com"))))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));

        assert_eq!(store.load().await.len(), 1);
    }

    #[tokio::test]
    async fn insert_refuses_to_overwrite_a_malformed_file() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "garbage").unwrap();

        let err = store
            .insert(Box::new(|id| user(Some(id), "a", "9000000001", None)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "garbage");
    }

    fn raw_record(id: u64, phone: &str) -> serde_json::Value {
        serde_json::to_value(user(Some(id), "r", phone, None)).unwrap()
    }

    #[tokio::test]
    async fn one_bad_record_does_not_hide_the_rest() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();

        let mut broken = raw_record(2, "9000000002");
        broken.as_object_mut().unwrap().remove("is_active");
        let content = serde_json::to_string(&vec![raw_record(1, "9000000001"), broken]).unwrap();
        std::fs::write(store.path(), &content).unwrap();

        let loaded = store.load().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, Some(1));

        let err = store
            .insert(Box::new(|id| user(Some(id), "a", "9000000003", None)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UnreadableRecords { count: 1, .. }));
        assert!(matches!(
            store.repair_ids().await.unwrap_err(),
            StoreError::UnreadableRecords { .. }
        ));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), content);
    }

    #[tokio::test]
    async fn insert_fails_cleanly_when_ids_run_out() {
        let (_dir, store) = store();
        let full = vec![user(Some(u64::MAX), "a", "9000000001", None)];
        store.save(&full).await.unwrap();

        let err = store
            .insert(Box::new(|id| user(Some(id), "b", "9000000002", None)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::IdsExhausted(_)));
        assert_eq!(store.load().await, full);

        // the lock was released
        store.save(&full).await.unwrap();
    }

    #[tokio::test]
    async fn failed_rename_removes_temp_file() {
        let (_dir, store) = store();
        // a non-empty directory cannot be replaced by a file
        std::fs::create_dir_all(store.path().join("occupied")).unwrap();

        let err = store.save(&[]).await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        let temp = store.path().with_file_name("users.json.tmp");
        assert!(!temp.exists());
    }

    #[tokio::test]
    async fn concurrent_inserts_keep_every_record() {
        let (_dir, store) = store();
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for i in 0..8u64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let phone = format!("90000000{:02}", i);
                store
                    .insert(Box::new(move |id| user(Some(id), "n", &phone, None)))
                    .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let users = store.load().await;
        assert_eq!(users.len(), 8);
        let mut ids: Vec<_> = users.iter().filter_map(|u| u.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn repair_persists_assigned_ids() {
        let (_dir, store) = store();
        store
            .save(&[
                user(None, "a", "9000000001", None),
                user(Some(4), "b", "9000000002", None),
            ])
            .await
            .unwrap();

        assert_eq!(store.repair_ids().await.unwrap(), 1);
        let ids: Vec<_> = store.load().await.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![Some(5), Some(4)]);

        assert_eq!(store.repair_ids().await.unwrap(), 0);
    }
}
