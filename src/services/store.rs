use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::WatchError;
use crate::kernel::presence::{PresenceRecord, SteamId};

/// Durable id -> last known presence mapping.
///
/// `load` of an unknown id yields the inactive baseline rather than an
/// error. `save` of a single record is atomic.
pub trait PresenceStore {
    fn load(&self, id: SteamId) -> impl Future<Output = Result<PresenceRecord, WatchError>> + Send;
    fn save(&self, record: &PresenceRecord) -> impl Future<Output = Result<(), WatchError>> + Send;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<SteamId, PresenceRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = PresenceRecord>) -> Self {
        Self {
            records: Mutex::new(records.into_iter().map(|r| (r.id, r)).collect()),
        }
    }

    /// Stored record, without the baseline fallback.
    pub async fn get(&self, id: SteamId) -> Option<PresenceRecord> {
        self.records.lock().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }
}

impl PresenceStore for MemoryStore {
    async fn load(&self, id: SteamId) -> Result<PresenceRecord, WatchError> {
        Ok(self
            .records
            .lock()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_else(|| PresenceRecord::baseline(id)))
    }

    async fn save(&self, record: &PresenceRecord) -> Result<(), WatchError> {
        self.records.lock().await.insert(record.id, record.clone());
        Ok(())
    }
}

/// JSON file of all records, rewritten through a temp file + rename on
/// every save.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    records: Mutex<HashMap<SteamId, PresenceRecord>>,
}

impl FileStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, WatchError> {
        let path = path.into();
        let records = match tokio::fs::read(&path).await {
            Ok(data) => {
                let list: Vec<PresenceRecord> = serde_json::from_slice(&data)
                    .map_err(|e| WatchError::Config(format!("failed to parse {}: {}", path.display(), e)))?;
                list.into_iter().map(|r| (r.id, r)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(WatchError::Config(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        debug!(path = %path.display(), records = records.len(), "opened presence store");
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    async fn persist(&self, records: &HashMap<SteamId, PresenceRecord>) -> std::io::Result<()> {
        let mut list: Vec<&PresenceRecord> = records.values().collect();
        list.sort_by_key(|r| r.id);
        let json = serde_json::to_vec_pretty(&list)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await
    }
}

impl PresenceStore for FileStore {
    async fn load(&self, id: SteamId) -> Result<PresenceRecord, WatchError> {
        Ok(self
            .records
            .lock()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_else(|| PresenceRecord::baseline(id)))
    }

    async fn save(&self, record: &PresenceRecord) -> Result<(), WatchError> {
        let mut records = self.records.lock().await;
        let previous = records.insert(record.id, record.clone());

        if let Err(e) = self.persist(&records).await {
            // Keep memory consistent with what is on disk.
            match previous {
                Some(p) => records.insert(p.id, p),
                None => records.remove(&record.id),
            };
            return Err(WatchError::store(record.id, e));
        }
        Ok(())
    }
}

/// Either concrete store, chosen at startup from configuration.
#[derive(Debug)]
pub enum AnyStore {
    Memory(MemoryStore),
    File(FileStore),
}

impl PresenceStore for AnyStore {
    async fn load(&self, id: SteamId) -> Result<PresenceRecord, WatchError> {
        match self {
            AnyStore::Memory(s) => s.load(id).await,
            AnyStore::File(s) => s.load(id).await,
        }
    }

    async fn save(&self, record: &PresenceRecord) -> Result<(), WatchError> {
        match self {
            AnyStore::Memory(s) => s.save(record).await,
            AnyStore::File(s) => s.save(record).await,
        }
    }
}
