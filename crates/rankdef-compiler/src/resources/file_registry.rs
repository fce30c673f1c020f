use std::fmt;

use dashmap::DashMap;

/// Opaque handle of a distributed file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileReference(String);

impl FileReference {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Assigns file references to content that must reach the nodes.
pub trait FileRegistry: Send + Sync {
    fn add_blob(&self, name: &str, content: &[u8]) -> FileReference;
}

/// Keeps blobs in memory; references are derived from a CRC32 of the content.
#[derive(Debug, Default)]
pub struct InMemoryFileRegistry {
    blobs: DashMap<FileReference, (String, Vec<u8>)>,
}

impl InMemoryFileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blob(&self, reference: &FileReference) -> Option<Vec<u8>> {
        self.blobs.get(reference).map(|entry| entry.value().1.clone())
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl FileRegistry for InMemoryFileRegistry {
    fn add_blob(&self, name: &str, content: &[u8]) -> FileReference {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(name.as_bytes());
        hasher.update(content);
        let reference = FileReference(format!("{:08x}", hasher.finalize()));
        self.blobs
            .entry(reference.clone())
            .or_insert_with(|| (name.to_owned(), content.to_vec()));
        reference
    }
}
