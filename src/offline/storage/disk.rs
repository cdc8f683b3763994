//! On-disk cache storage.
//!
//! ```text
//! <root>/
//! └── <hex(generation name)>/
//!     └── <blake3(key)>.entry     JSON header line + raw body
//! ```
//!
//! Each entry is one file written to a temp name and renamed into place,
//! so readers see either the old entry or the new one, never a mix.
//! `put_all` stages every entry before renaming any of them and removes
//! what it placed if a later rename fails.

use std::fs;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::{CacheStorage, CacheStore};
use crate::offline::error::StorageError;
use crate::offline::request::RequestKey;
use crate::offline::response::{Response, ResponseKind};

const ENTRY_EXT: &str = "entry";

/// Distinguishes temp files of concurrent writers.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Generations persisted under a root directory.
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn generation_dir(&self, name: &str) -> PathBuf {
        self.root.join(hex::encode(name.as_bytes()))
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn CacheStore>, StorageError> {
        let dir = self.generation_dir(name);
        let created = dir.clone();
        blocking(move || fs::create_dir_all(&created).map_err(|e| StorageError::Io(created, e)))
            .await?;
        Ok(Arc::new(DiskStore { dir }))
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let root = self.root.clone();
        blocking(move || {
            let entries = match fs::read_dir(&root) {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(StorageError::Io(root, e)),
            };
            let names = entries
                .filter_map(Result::ok)
                .filter(|e| e.path().is_dir())
                .filter_map(|e| decode_name(&e.file_name().to_string_lossy()))
                .collect();
            Ok(names)
        })
        .await
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        let dir = self.generation_dir(name);
        blocking(move || match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(dir, e)),
        })
        .await
    }

    async fn has(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.generation_dir(name).is_dir())
    }
}

/// A single generation directory.
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    fn entry_path(&self, key: &RequestKey) -> PathBuf {
        self.dir.join(format!("{}.{ENTRY_EXT}", key.digest()))
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn lookup(&self, key: &RequestKey) -> Result<Option<Response>, StorageError> {
        let path = self.entry_path(key);
        let key = key.clone();
        blocking(move || {
            let raw = match fs::read(&path) {
                Ok(raw) => raw,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(StorageError::Io(path, e)),
            };
            let (header, body) = decode_entry(&path, raw)?;
            // Digest collision: treat as a miss.
            if header.key != key {
                return Ok(None);
            }
            Ok(Some(header.into_response(body)))
        })
        .await
    }

    async fn put(&self, key: RequestKey, response: Response) -> Result<(), StorageError> {
        let path = self.entry_path(&key);
        blocking(move || {
            let raw = encode_entry(&path, key, &response)?;
            let tmp = write_temp(&path, &raw)?;
            fs::rename(&tmp, &path).map_err(|e| {
                let _ = fs::remove_file(&tmp);
                StorageError::Io(path, e)
            })
        })
        .await
    }

    async fn put_all(&self, entries: Vec<(RequestKey, Response)>) -> Result<(), StorageError> {
        let staged = entries
            .into_iter()
            .map(|(key, response)| {
                let path = self.entry_path(&key);
                let raw = encode_entry(&path, key, &response)?;
                Ok((path, raw))
            })
            .collect::<Result<Vec<_>, StorageError>>()?;

        blocking(move || {
            let mut temps = Vec::with_capacity(staged.len());
            for (path, raw) in staged {
                match write_temp(&path, &raw) {
                    Ok(tmp) => temps.push((tmp, path)),
                    Err(e) => {
                        remove_quietly(temps.iter().map(|(tmp, _)| tmp));
                        return Err(e);
                    }
                }
            }

            for (i, (tmp, path)) in temps.iter().enumerate() {
                if let Err(e) = fs::rename(tmp, path) {
                    remove_quietly(temps[..i].iter().map(|(_, placed)| placed));
                    remove_quietly(temps[i..].iter().map(|(pending, _)| pending));
                    return Err(StorageError::Io(path.clone(), e));
                }
            }
            Ok(())
        })
        .await
    }

    async fn keys(&self) -> Result<Vec<RequestKey>, StorageError> {
        let dir = self.dir.clone();
        blocking(move || {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(StorageError::Io(dir, e)),
            };
            let mut keys = Vec::new();
            for entry in entries.filter_map(Result::ok) {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == ENTRY_EXT) {
                    keys.push(read_header(&path)?.key);
                }
            }
            Ok(keys)
        })
        .await
    }
}

// =============================================================================
// Entry format
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct EntryHeader {
    key: RequestKey,
    status: u16,
    #[serde(default)]
    status_text: String,
    headers: Vec<(String, String)>,
    kind: ResponseKind,
}

impl EntryHeader {
    fn new(key: RequestKey, response: &Response) -> Self {
        Self {
            key,
            status: response.status,
            status_text: response.status_text.clone(),
            headers: response.headers.clone(),
            kind: response.kind,
        }
    }

    fn into_response(self, body: Bytes) -> Response {
        Response {
            status: self.status,
            status_text: self.status_text,
            headers: self.headers,
            body,
            kind: self.kind,
        }
    }
}

fn decode_entry(path: &Path, raw: Vec<u8>) -> Result<(EntryHeader, Bytes), StorageError> {
    let split = raw.iter().position(|&b| b == b'\n').unwrap_or(raw.len());
    let header: EntryHeader =
        serde_json::from_slice(&raw[..split]).map_err(|e| StorageError::Corrupt(path.into(), e))?;
    let len = raw.len();
    let body = Bytes::from(raw).slice((split + 1).min(len)..);
    Ok((header, body))
}

fn read_header(path: &Path) -> Result<EntryHeader, StorageError> {
    let file = fs::File::open(path).map_err(|e| StorageError::Io(path.into(), e))?;
    let mut line = String::new();
    BufReader::new(file)
        .read_line(&mut line)
        .map_err(|e| StorageError::Io(path.into(), e))?;
    serde_json::from_str(line.trim_end()).map_err(|e| StorageError::Corrupt(path.into(), e))
}

fn encode_entry(
    path: &Path,
    key: RequestKey,
    response: &Response,
) -> Result<Vec<u8>, StorageError> {
    let header = EntryHeader::new(key, response);
    let mut raw =
        serde_json::to_vec(&header).map_err(|e| StorageError::Corrupt(path.into(), e))?;
    raw.push(b'\n');
    raw.extend_from_slice(&response.body);
    Ok(raw)
}

/// Write `contents` next to `path` under a unique temp name.
fn write_temp(path: &Path, contents: &[u8]) -> Result<PathBuf, StorageError> {
    let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let tmp = path.with_extension(format!("{}.{seq}.tmp", std::process::id()));
    fs::write(&tmp, contents).map_err(|e| StorageError::Io(tmp.clone(), e))?;
    Ok(tmp)
}

fn remove_quietly<'a>(paths: impl Iterator<Item = &'a PathBuf>) {
    for path in paths {
        let _ = fs::remove_file(path);
    }
}

fn decode_name(dir_name: &str) -> Option<String> {
    String::from_utf8(hex::decode(dir_name).ok()?).ok()
}

/// Run filesystem work on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use url::Url;

    fn key(path: &str) -> RequestKey {
        RequestKey::new("GET", &Url::parse("https://a.example/").unwrap().join(path).unwrap())
    }

    #[tokio::test]
    async fn test_put_lookup_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let response = Response::new(200, &b"body { color: red }\nline two"[..])
            .with_header("Content-Type", "text/css")
            .with_kind(ResponseKind::Cors);

        {
            let storage = DiskStorage::new(dir.path());
            let store = storage.open("ll-toolbox-v2").await.unwrap();
            store.put(key("style.css"), response.clone()).await.unwrap();
        }

        let storage = DiskStorage::new(dir.path());
        assert_eq!(storage.keys().await.unwrap(), vec!["ll-toolbox-v2".to_string()]);
        let store = storage.open("ll-toolbox-v2").await.unwrap();
        let hit = store.lookup(&key("style.css")).await.unwrap();
        assert_eq!(hit, Some(response));
    }

    #[tokio::test]
    async fn test_empty_body() {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path());
        let store = storage.open("v1").await.unwrap();
        store.put(key("empty"), Response::new(200, "")).await.unwrap();

        let hit = store.lookup(&key("empty")).await.unwrap().unwrap();
        assert!(hit.body.is_empty());
    }

    #[tokio::test]
    async fn test_miss_and_keys() {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path());
        let store = storage.open("v1").await.unwrap();
        assert_eq!(store.lookup(&key("nope")).await.unwrap(), None);

        store.put(key("a"), Response::new(200, "a")).await.unwrap();
        store.put(key("b"), Response::new(200, "b")).await.unwrap();
        store.put(key("a"), Response::new(200, "a2")).await.unwrap();

        let mut keys = store.keys().await.unwrap();
        keys.sort_by(|x, y| x.url().cmp(y.url()));
        assert_eq!(keys, vec![key("a"), key("b")]);
    }

    #[tokio::test]
    async fn test_delete_generation() {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path());
        storage.open("old").await.unwrap();
        storage.open("new").await.unwrap();

        assert!(storage.delete("old").await.unwrap());
        assert!(!storage.delete("old").await.unwrap());
        assert_eq!(storage.keys().await.unwrap(), vec!["new".to_string()]);
        assert!(storage.has("new").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_all_writes_every_entry() {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path());
        let store = storage.open("v1").await.unwrap();
        store
            .put_all(vec![
                (key("a"), Response::new(200, "a")),
                (key("b"), Response::new(200, "b")),
            ])
            .await
            .unwrap();

        assert_eq!(store.len().await.unwrap(), 2);
        let hit = store.lookup(&key("b")).await.unwrap().unwrap();
        assert_eq!(&hit.body[..], b"b");
    }

    #[tokio::test]
    async fn test_put_all_failure_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path());
        let store = storage.open("v1").await.unwrap();

        // A directory where the second entry belongs makes its rename fail.
        let gen_dir = dir.path().join(hex::encode("v1"));
        fs::create_dir(gen_dir.join(format!("{}.{ENTRY_EXT}", key("b").digest()))).unwrap();

        let result = store
            .put_all(vec![
                (key("a"), Response::new(200, "a")),
                (key("b"), Response::new(200, "b")),
            ])
            .await;

        assert!(result.is_err());
        assert_eq!(store.lookup(&key("a")).await.unwrap(), None);
        let leftovers: Vec<_> = fs::read_dir(&gen_dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().is_file())
            .collect();
        assert!(leftovers.is_empty(), "leftover files: {leftovers:?}");
    }

    #[tokio::test]
    async fn test_keys_on_missing_root() {
        let dir = TempDir::new().unwrap();
        let storage = DiskStorage::new(dir.path().join("absent"));
        assert!(storage.keys().await.unwrap().is_empty());
    }
}
