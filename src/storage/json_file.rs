use super::{KeyValueStore, MemoryStore};
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

/// A JSON object persisted in a single file.
///
/// The whole object is re-read on every access and rewritten on every
/// mutation. Writes land in a sibling temp file that is synced to disk and
/// then renamed over the original, so readers only ever see a complete
/// document, even after a power loss.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    /// Open the file at `path`, creating it (and its parent directories) as `{}` if missing
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
            let file = JsonFile { path };
            file.write(&Map::new())?;
            return Ok(file);
        }
        Ok(JsonFile { path })
    }

    pub fn read(&self) -> Result<Map<String, Value>> {
        let content = fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        serde_json::from_str(&content).map_err(|e| Error::corrupt(&self.path, e))
    }

    pub fn write(&self, data: &Map<String, Value>) -> Result<()> {
        let content =
            serde_json::to_string_pretty(data).map_err(|e| Error::corrupt(&self.path, e))?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut tmp = File::create(&tmp_path).map_err(|e| Error::io(&tmp_path, e))?;
        tmp.write_all(content.as_bytes())
            .and_then(|_| tmp.sync_all())
            .map_err(|e| Error::io(&tmp_path, e))?;
        drop(tmp);

        fs::rename(&tmp_path, &self.path).map_err(|e| Error::io(&self.path, e))?;
        self.sync_parent()
    }

    /// Flush the directory entry so the rename itself survives a crash
    #[cfg(unix)]
    fn sync_parent(&self) -> Result<()> {
        let parent = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent,
            None => std::path::Path::new("."),
        };
        File::open(parent)
            .and_then(|dir| dir.sync_all())
            .map_err(|e| Error::io(parent, e))
    }

    #[cfg(not(unix))]
    fn sync_parent(&self) -> Result<()> {
        Ok(())
    }

    /// Copy the current contents into a volatile store
    pub fn to_memory(&self) -> Result<MemoryStore> {
        let mut store = MemoryStore::new();
        for (key, value) in self.read()? {
            store.set(&key, value)?;
        }
        Ok(store)
    }
}

impl KeyValueStore for JsonFile {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read()?.remove(key))
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let mut data = self.read()?;
        data.insert(key.to_string(), value);
        self.write(&data)
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        let mut data = self.read()?;
        if data.remove(key).is_some() {
            self.write(&data)?;
        }
        Ok(())
    }

    fn get_all(&self) -> Result<Map<String, Value>> {
        self.read()
    }
}
