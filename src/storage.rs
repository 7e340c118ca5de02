use crate::errors::PersistenceError;
use crate::ledger::CompletionMap;
use crate::models::Habit;
use std::{
    collections::HashMap,
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{
    fs,
    sync::{mpsc, oneshot, Mutex},
};
use tracing::{debug, error, warn};

pub const HABITS_KEY: &str = "habits";
pub const COMPLETIONS_KEY: &str = "completed_habits";

/// Durable key-value storage for JSON blobs.
pub trait KeyValueStore: Send + Sync + 'static {
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, PersistenceError>> + Send;

    fn set(
        &self,
        key: &str,
        value: Vec<u8>,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
}

/// One `<key>.json` file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        match fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), PersistenceError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

/// In-process store; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), PersistenceError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Typed load/save of habits and completions over a [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct PersistenceGateway<S> {
    store: S,
}

impl<S: KeyValueStore> PersistenceGateway<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn load_habits(&self) -> Result<Vec<Habit>, PersistenceError> {
        match self.store.get(HABITS_KEY).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn save_habits(&self, habits: &[Habit]) -> Result<(), PersistenceError> {
        let payload = serde_json::to_vec_pretty(habits)?;
        self.store.set(HABITS_KEY, payload).await
    }

    pub async fn load_completions(&self) -> Result<CompletionMap, PersistenceError> {
        match self.store.get(COMPLETIONS_KEY).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(CompletionMap::new()),
        }
    }

    pub async fn save_completions(&self, days: &CompletionMap) -> Result<(), PersistenceError> {
        let payload = serde_json::to_vec_pretty(days)?;
        self.store.set(COMPLETIONS_KEY, payload).await
    }

    /// Loads completions, falling back to an empty ledger on any failure.
    pub async fn load_completions_or_default(&self) -> CompletionMap {
        self.load_completions().await.unwrap_or_else(|err| {
            error!("failed to load completions: {err}");
            CompletionMap::new()
        })
    }

    async fn write(&self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        match snapshot {
            Snapshot::Habits(habits) => self.save_habits(habits).await,
            Snapshot::Completions(days) => self.save_completions(days).await,
        }
    }
}

/// A full copy of one persisted collection.
#[derive(Debug, Clone)]
pub enum Snapshot {
    Habits(Vec<Habit>),
    Completions(CompletionMap),
}

impl Snapshot {
    fn key(&self) -> &'static str {
        match self {
            Snapshot::Habits(_) => HABITS_KEY,
            Snapshot::Completions(_) => COMPLETIONS_KEY,
        }
    }
}

#[derive(Debug)]
enum Command {
    Save(Snapshot),
    Flush(oneshot::Sender<()>),
}

/// Handle to the background writer. Saves are queued and written in order;
/// callers never wait on them.
#[derive(Debug, Clone)]
pub struct Persister {
    tx: mpsc::UnboundedSender<Command>,
}

impl Persister {
    /// Spawns the writer task on the current tokio runtime.
    pub fn spawn<S: KeyValueStore>(gateway: PersistenceGateway<S>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    Command::Save(snapshot) => match gateway.write(&snapshot).await {
                        Ok(()) => debug!(key = snapshot.key(), "snapshot persisted"),
                        Err(err) => {
                            error!(key = snapshot.key(), "failed to persist snapshot: {err}")
                        }
                    },
                    Command::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });
        Self { tx }
    }

    /// A handle with no writer behind it; every save is dropped.
    pub fn detached() -> Self {
        let (tx, _) = mpsc::unbounded_channel();
        Self { tx }
    }

    pub fn save(&self, snapshot: Snapshot) {
        let key = snapshot.key();
        if self.tx.send(Command::Save(snapshot)).is_err() {
            warn!(key, "persistence writer unavailable; snapshot dropped");
        }
    }

    /// Waits until every save queued before this call has been attempted.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(Command::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}
