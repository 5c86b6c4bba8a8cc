/*
[INPUT]:  Session file path and key/value pairs
[OUTPUT]: JSON file holding the persisted session
[POS]:    Storage layer - durable backend across process restarts
[UPDATE]: When the file format or permissions change
*/

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use super::Storage;
use crate::http::Result;

/// Storage persisted as a flat JSON object on disk
///
/// The whole file is rewritten on every `set`/`delete`.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    data: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open the storage file, starting empty if it does not exist yet
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = Self::load(&path).await?;
        debug!(path = %path.display(), keys = data.len(), "session file loaded");

        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(path: &Path) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(path).await {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, data: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, content).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut guard = self.data.lock().await;
        let mut next = guard.clone();
        next.insert(key.to_string(), value.to_string());
        self.save(&next).await?;
        *guard = next;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut guard = self.data.lock().await;
        if !guard.contains_key(key) {
            return Ok(());
        }
        let mut next = guard.clone();
        next.remove(key);
        self.save(&next).await?;
        *guard = next;
        Ok(())
    }
}
