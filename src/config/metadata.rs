use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{bail, Context, Result};
use tracing::debug;

/// Flat string key/value persistence used to record manager metadata.
pub trait MetadataStore: Send + Sync {
    fn get_value(&self, key: &str) -> Option<String>;
    fn set_value(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryMetadata {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryMetadata {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetadataStore for MemoryMetadata {
    fn get_value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn set_value(&self, key: &str, value: &str) -> Result<()> {
        if key.is_empty() {
            bail!("metadata key is empty");
        }
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// JSON object file, rewritten on every `set_value`.
#[derive(Debug)]
pub struct JsonFileMetadata {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl JsonFileMetadata {
    /// Open `path`, creating an empty object file when it does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if path.as_os_str().is_empty() {
            bail!("metadata file path is empty");
        }

        let values = if path.is_file() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("read metadata file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parse metadata file {}", path.display()))?
        } else {
            let empty = HashMap::new();
            write_json(&path, &empty)?;
            empty
        };

        Ok(Self { path, values: Mutex::new(values) })
    }
}

impl MetadataStore for JsonFileMetadata {
    fn get_value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned()
    }

    fn set_value(&self, key: &str, value: &str) -> Result<()> {
        if key.is_empty() {
            bail!("metadata key is empty");
        }
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = values.clone();
        next.insert(key.to_owned(), value.to_owned());
        write_json(&self.path, &next)?;
        *values = next;
        debug!("metadata '{}' saved to {}", key, self.path.display());
        Ok(())
    }
}

fn write_json(path: &Path, values: &HashMap<String, String>) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(values)?)
        .with_context(|| format!("write metadata file {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replace metadata file {}", path.display()))?;
    Ok(())
}
