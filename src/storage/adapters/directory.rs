//! Directory-backed key-value store.

use crate::storage::ports::{KeyValueStore, KeyValueStoreError, KeyValueStoreResult};
use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::io::ErrorKind;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Key-value store keeping one file per key inside a directory.
///
/// Writes go to a hidden temporary file which is then renamed over the
/// target, so readers see either the old or the new value. File access runs
/// on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct DirectoryKeyValueStore {
    dir: Arc<Dir>,
}

impl DirectoryKeyValueStore {
    /// Opens (creating if needed) the directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueStoreError::Unavailable`] when the directory cannot
    /// be created or opened.
    pub fn open(path: &Utf8Path) -> KeyValueStoreResult<Self> {
        Dir::create_ambient_dir_all(path, ambient_authority())
            .map_err(KeyValueStoreError::unavailable)?;
        let dir = Dir::open_ambient_dir(path, ambient_authority())
            .map_err(KeyValueStoreError::unavailable)?;
        Ok(Self { dir: Arc::new(dir) })
    }

    /// Runs `f` against the directory on the blocking thread pool.
    async fn run_blocking<F, T>(&self, f: F) -> KeyValueStoreResult<T>
    where
        F: FnOnce(&Dir) -> KeyValueStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let dir = Arc::clone(&self.dir);
        tokio::task::spawn_blocking(move || f(&*dir))
            .await
            .map_err(KeyValueStoreError::unavailable)?
    }
}

fn validate_key(key: &str) -> KeyValueStoreResult<()> {
    let is_valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|character| character.is_ascii_alphanumeric() || matches!(character, '-' | '_' | '.'));
    if is_valid {
        Ok(())
    } else {
        Err(KeyValueStoreError::InvalidKey(key.to_owned()))
    }
}

/// Hidden per-write file name; keys never start with a dot.
fn staging_name(key: &str) -> String {
    format!(".{key}.{}.tmp", Uuid::new_v4().simple())
}

#[async_trait]
impl KeyValueStore for DirectoryKeyValueStore {
    async fn get(&self, key: &str) -> KeyValueStoreResult<Option<String>> {
        validate_key(key)?;
        let name = key.to_owned();
        self.run_blocking(move |dir| match dir.read_to_string(&name) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(KeyValueStoreError::unavailable(err)),
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> KeyValueStoreResult<()> {
        validate_key(key)?;
        let name = key.to_owned();
        let contents = value.to_owned();
        self.run_blocking(move |dir| {
            let staging = staging_name(&name);
            dir.write(&staging, contents)
                .map_err(KeyValueStoreError::unavailable)?;
            dir.rename(&staging, dir, &name).map_err(|err| {
                if let Err(cleanup) = dir.remove_file(&staging) {
                    debug!(file = %staging, error = %cleanup, "staging file left behind");
                }
                KeyValueStoreError::unavailable(err)
            })
        })
        .await
    }

    async fn remove(&self, key: &str) -> KeyValueStoreResult<()> {
        validate_key(key)?;
        let name = key.to_owned();
        self.run_blocking(move |dir| match dir.remove_file(&name) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(KeyValueStoreError::unavailable(err)),
        })
        .await
    }
}
