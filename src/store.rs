//! Durable client-side storage for the session.
//!
//! The store is a flat string map with a fixed set of keys ([`StorageKey`]).
//! Values are read on demand rather than cached so that every request sees the
//! latest token, the same way a browser reads local storage.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use utf8path::Path;

use crate::error::{Error, Result};

/// The keys the client persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
    /// Bearer token for resource endpoints.
    AccessToken,
    /// Token used to obtain a new access token.
    RefreshToken,
    /// Name of the signed-in user.
    Username,
    /// Thread that was open when the client last ran.
    ActiveThread,
}

impl StorageKey {
    /// Every key, in storage order.
    pub const ALL: [StorageKey; 4] = [
        StorageKey::AccessToken,
        StorageKey::RefreshToken,
        StorageKey::Username,
        StorageKey::ActiveThread,
    ];

    /// The key's name on disk.
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::AccessToken => "access_token",
            StorageKey::RefreshToken => "refresh_token",
            StorageKey::Username => "username",
            StorageKey::ActiveThread => "active_thread",
        }
    }
}

/// Key-value storage that outlives the process.
pub trait TokenStore: Send + Sync {
    /// Reads a key.
    fn get(&self, key: StorageKey) -> Result<Option<String>>;

    /// Writes a key.
    fn set(&self, key: StorageKey, value: &str) -> Result<()>;

    /// Removes a key; removing an absent key is not an error.
    fn remove(&self, key: StorageKey) -> Result<()>;

    /// Removes every key.
    fn clear(&self) -> Result<()> {
        for key in StorageKey::ALL {
            self.remove(key)?;
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

///////////////////////////////////////////// Memory ////////////////////////////////////////////

/// A store that lives only as long as the process. Used by tests and by
/// callers that do not want credentials on disk.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: Mutex<BTreeMap<StorageKey, String>>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently set.
    pub fn len(&self) -> usize {
        lock(&self.values).len()
    }

    /// True when no key is set.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: StorageKey) -> Result<Option<String>> {
        Ok(lock(&self.values).get(&key).cloned())
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        lock(&self.values).insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<()> {
        lock(&self.values).remove(&key);
        Ok(())
    }
}

////////////////////////////////////////////// File /////////////////////////////////////////////

/// A store backed by a JSON object in a single file.
///
/// Every write rewrites the whole file. On unix the file is created with mode
/// 0600 because it holds bearer tokens.
pub struct FileTokenStore {
    path: Path<'static>,
    guard: Mutex<()>,
}

impl FileTokenStore {
    /// Opens (without creating) the store at `path`.
    pub fn new(path: Path<'static>) -> Self {
        Self {
            path,
            guard: Mutex::new(()),
        }
    }

    /// The file backing this store.
    pub fn path(&self) -> &Path<'static> {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(self.path.as_str()) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => serde_json::from_str(&text).map_err(|err| {
                Error::serialization(
                    format!("failed to parse session store {}", self.path.as_str()),
                    Some(Box::new(err)),
                )
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(Error::io(
                format!("failed to read session store {}", self.path.as_str()),
                err,
            )),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = std::path::Path::new(self.path.as_str()).parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|err| Error::io("failed to create session store directory", err))?;
        }
        let text = serde_json::to_string_pretty(map)?;
        // Staged beside the store with owner-only permissions, then renamed over it.
        let staging = format!("{}.tmp", self.path.as_str());
        let written = write_private(&staging, text.as_bytes())
            .and_then(|()| fs::rename(&staging, self.path.as_str()));
        if let Err(err) = written {
            let _ = fs::remove_file(&staging);
            return Err(Error::io("failed to write session store", err));
        }
        Ok(())
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = lock(&self.guard);
        let mut map = self.read_map()?;
        if f(&mut map) {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: StorageKey) -> Result<Option<String>> {
        let _guard = lock(&self.guard);
        Ok(self.read_map()?.remove(key.as_str()))
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        self.update(|map| {
            map.insert(key.as_str().to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: StorageKey) -> Result<()> {
        self.update(|map| map.remove(key.as_str()).is_some())
    }

    fn clear(&self) -> Result<()> {
        self.update(|map| {
            let changed = !map.is_empty();
            map.clear();
            changed
        })
    }
}

/// Creates `path` readable by the owner only and writes `contents` to it.
fn write_private(path: &str, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        // A leftover staging file keeps the mode it was created with.
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> Path<'static> {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let dir = std::env::temp_dir();
        let path = format!(
            "{}/flowchat-store-{}-{}-{}/session.json",
            dir.display(),
            std::process::id(),
            name,
            nanos
        );
        Path::from(path.as_str()).into_owned()
    }

    #[test]
    fn key_names() {
        let names: Vec<_> = StorageKey::ALL.iter().map(StorageKey::as_str).collect();
        assert_eq!(
            names,
            vec!["access_token", "refresh_token", "username", "active_thread"]
        );
    }

    #[test]
    fn memory_store_set_get_clear() {
        let store = MemoryTokenStore::new();
        store.set(StorageKey::AccessToken, "a1").unwrap();
        store.set(StorageKey::Username, "ada").unwrap();
        assert_eq!(
            store.get(StorageKey::AccessToken).unwrap().as_deref(),
            Some("a1")
        );
        assert_eq!(store.len(), 2);
        store.clear().unwrap();
        assert!(store.is_empty());
        store.remove(StorageKey::RefreshToken).unwrap();
    }

    #[test]
    fn file_store_persists_across_instances() {
        let path = scratch_path("persist");
        let store = FileTokenStore::new(path.clone());
        assert_eq!(store.get(StorageKey::AccessToken).unwrap(), None);
        store.set(StorageKey::AccessToken, "a1").unwrap();
        store.set(StorageKey::RefreshToken, "r1").unwrap();
        store.set(StorageKey::ActiveThread, "7").unwrap();

        let reopened = FileTokenStore::new(path.clone());
        assert_eq!(
            reopened.get(StorageKey::RefreshToken).unwrap().as_deref(),
            Some("r1")
        );
        reopened.remove(StorageKey::ActiveThread).unwrap();
        assert_eq!(store.get(StorageKey::ActiveThread).unwrap(), None);

        reopened.clear().unwrap();
        for key in StorageKey::ALL {
            assert_eq!(store.get(key).unwrap(), None);
        }
        let _ = fs::remove_file(path.as_str());
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let path = scratch_path("private");
        let store = FileTokenStore::new(path.clone());
        store.set(StorageKey::AccessToken, "secret").unwrap();
        let mode = fs::metadata(path.as_str()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        let _ = fs::remove_file(path.as_str());
    }

    #[cfg(unix)]
    #[test]
    fn file_store_never_exposes_tokens_under_wider_mode() {
        use std::os::unix::fs::PermissionsExt;
        let path = scratch_path("replace");
        let parent = std::path::Path::new(path.as_str()).parent().unwrap().to_owned();
        fs::create_dir_all(&parent).unwrap();
        fs::write(path.as_str(), "{}").unwrap();
        fs::set_permissions(path.as_str(), fs::Permissions::from_mode(0o644)).unwrap();
        let staging = format!("{}.tmp", path.as_str());
        fs::write(&staging, "").unwrap();
        fs::set_permissions(&staging, fs::Permissions::from_mode(0o666)).unwrap();

        let store = FileTokenStore::new(path.clone());
        store.set(StorageKey::AccessToken, "secret").unwrap();

        let mode = fs::metadata(path.as_str()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!std::path::Path::new(&staging).exists());
        assert_eq!(
            store.get(StorageKey::AccessToken).unwrap().as_deref(),
            Some("secret")
        );
        let _ = fs::remove_dir_all(parent);
    }

    #[cfg(unix)]
    #[test]
    fn failed_write_leaves_no_token_behind() {
        let path = scratch_path("blocked");
        let parent = std::path::Path::new(path.as_str()).parent().unwrap().to_owned();
        fs::create_dir_all(path.as_str()).unwrap();

        let store = FileTokenStore::new(path.clone());
        let err = store.set(StorageKey::AccessToken, "secret").unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
        assert!(!std::path::Path::new(&format!("{}.tmp", path.as_str())).exists());
        let _ = fs::remove_dir_all(parent);
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let path = scratch_path("corrupt");
        let store = FileTokenStore::new(path.clone());
        store.set(StorageKey::Username, "ada").unwrap();
        fs::write(path.as_str(), "not json").unwrap();
        let err = store.get(StorageKey::Username).unwrap_err();
        assert!(matches!(err, Error::Serialization { .. }));
        let _ = fs::remove_file(path.as_str());
    }
}
