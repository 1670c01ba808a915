// src/db/local_store.rs

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};

use crate::common::error::AppError;

/// Armazenamento local chave -> JSON, um arquivo por chave dentro de `dir`.
///
/// `max_bytes` limita o total ocupado por todas as chaves, como a cota de um
/// armazenamento de navegador. Cada gravação é atômica (arquivo temporário + rename).
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl LocalStore {
    pub fn open(dir: impl Into<PathBuf>, max_bytes: usize) -> Result<Self, AppError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, max_bytes })
    }

    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let bytes = serde_json::to_vec(value)?;
        let path = self.path_for(key);

        let used = self.usage_excluding(&path)?;
        if used + bytes.len() > self.max_bytes {
            return Err(AppError::StorageFull { key: key.to_string(), size: bytes.len() });
        }

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), AppError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file))
    }

    fn usage_excluding(&self, skip: &Path) -> Result<usize, AppError> {
        let mut total = 0usize;
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if path == skip || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            total += entry.metadata()?.len() as usize;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn missing_key_reads_as_none() {
        let dir = tempdir().unwrap();
        let store = LocalStore::open(dir.path(), 1024).unwrap();
        let value: Option<serde_json::Value> = store.read("nada").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn write_then_read_and_remove() {
        let dir = tempdir().unwrap();
        let store = LocalStore::open(dir.path(), 1024).unwrap();

        store.write("pixConfig.abc", &json!({"banco": "748"})).unwrap();
        let value: serde_json::Value = store.read("pixConfig.abc").unwrap().unwrap();
        assert_eq!(value["banco"], "748");

        store.remove("pixConfig.abc").unwrap();
        store.remove("pixConfig.abc").unwrap();
        assert!(store.read::<serde_json::Value>("pixConfig.abc").unwrap().is_none());
    }

    #[test]
    fn keys_never_escape_the_directory() {
        let dir = tempdir().unwrap();
        let store = LocalStore::open(dir.path(), 1024).unwrap();
        store.write("../fora", &json!(1)).unwrap();
        assert!(dir.path().join(".._fora.json").exists());
    }

    #[test]
    fn quota_counts_other_keys_but_not_the_one_being_replaced() {
        let dir = tempdir().unwrap();
        let store = LocalStore::open(dir.path(), 40).unwrap();

        store.write("a", &"x".repeat(20)).unwrap();
        // Regravar a mesma chave não soma o tamanho antigo.
        store.write("a", &"y".repeat(20)).unwrap();

        let err = store.write("b", &"z".repeat(30)).unwrap_err();
        assert!(matches!(err, AppError::StorageFull { ref key, .. } if key == "b"));
        assert!(store.read::<String>("b").unwrap().is_none());
    }
}
