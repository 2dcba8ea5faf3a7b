use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Key under which the task collection is stored.
pub const TASKS_KEY: &str = "tasks";

/// Opaque key-value persistence for serialized blobs.
pub trait BlobStore {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// One `<key>.json` file per key inside a data directory.
#[derive(Debug)]
pub struct FileBlobStore {
    pub data_dir: PathBuf,
}

impl FileBlobStore {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let data_dir = data_dir.to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;

        info!(data_dir = %data_dir.display(), "opened blob store");
        Ok(Self { data_dir })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{key}.json"))
    }
}

impl BlobStore for FileBlobStore {
    #[tracing::instrument(skip(self))]
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(text) => {
                debug!(file = %path.display(), bytes = text.len(), "read blob");
                Ok(Some(text))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(file = %path.display(), "blob absent");
                Ok(None)
            }
            Err(err) => Err(err).with_context(|| format!("failed reading {}", path.display())),
        }
    }

    #[tracing::instrument(skip(self, value))]
    fn write(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.path_for(key);
        debug!(file = %path.display(), bytes = value.len(), "writing blob atomically");
        write_atomic(&path, value)
    }
}

fn write_atomic(path: &Path, value: &str) -> anyhow::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(value.as_bytes())?;
    temp.flush()?;

    temp.persist(path)
        .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

    Ok(())
}

/// In-process store. `fail_writes` makes every write error out, which is how
/// storage quota failures are simulated.
#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStore {
    blobs: HashMap<String, String>,
    pub fail_writes: bool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(key: &str, value: &str) -> Self {
        let mut store = Self::default();
        store.blobs.insert(key.to_string(), value.to_string());
        store
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.blobs.get(key).map(String::as_str)
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        if self.fail_writes {
            return Err(anyhow!("storage quota exceeded while writing {key}"));
        }
        self.blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
