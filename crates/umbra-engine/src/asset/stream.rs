use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::AssetUri;

/// Opens byte streams for resolved asset locations.
///
/// Supplied by the host; the engine never interprets the storage scheme itself.
pub trait AssetStreamProvider {
    fn open_stream(&self, uri: &AssetUri) -> io::Result<Box<dyn Read>>;
}

/// Reads `file://` URIs and scheme-less paths relative to a root directory.
#[derive(Debug, Clone)]
pub struct FileStreamProvider {
    root: PathBuf,
}

impl FileStreamProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetStreamProvider for FileStreamProvider {
    fn open_stream(&self, uri: &AssetUri) -> io::Result<Box<dyn Read>> {
        match uri.scheme() {
            None | Some("file") => {
                let path = self.root.join(uri.path());
                let file = File::open(&path)?;
                Ok(Box::new(BufReader::new(file)))
            }
            Some(other) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported asset scheme '{other}'"),
            )),
        }
    }
}

/// In-memory asset table, keyed by the full URI string.
#[derive(Debug, Clone, Default)]
pub struct MemoryStreamProvider {
    entries: FxHashMap<AssetUri, Arc<[u8]>>,
}

impl MemoryStreamProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uri: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.entries.insert(AssetUri::new(uri), bytes.into());
    }

    pub fn with(mut self, uri: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.insert(uri, bytes);
        self
    }
}

impl AssetStreamProvider for MemoryStreamProvider {
    fn open_stream(&self, uri: &AssetUri) -> io::Result<Box<dyn Read>> {
        let bytes = self.entries.get(uri).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no in-memory asset '{uri}'"))
        })?;
        Ok(Box::new(Cursor::new(Arc::clone(bytes))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_provider_serves_inserted_bytes() {
        let streams = MemoryStreamProvider::new().with("a.txt", b"hello".as_slice());
        let mut out = String::new();
        streams
            .open_stream(&AssetUri::new("a.txt"))
            .unwrap()
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn memory_provider_reports_not_found() {
        let err = MemoryStreamProvider::new()
            .open_stream(&AssetUri::new("missing"))
            .err()
            .unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn file_provider_rejects_foreign_schemes() {
        let err = FileStreamProvider::new(".")
            .open_stream(&AssetUri::new("db://noise"))
            .err()
            .unwrap();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }
}
