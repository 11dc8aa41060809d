//! The artifact table
//!
//! Named build outputs shared by every collaborator of a build. The pipeline
//! only touches it through [`ArtifactStore`]: it adds new entries and
//! overwrites an existing one only when minifying that same asset in place.

use std::hash::Hasher;
use std::sync::{Arc, OnceLock};

use dashmap::{DashMap, DashSet};
use rapidhash::fast::RapidHasher;

/// Content of one artifact, addressable as a single concatenated blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Source {
    parts: Vec<Arc<str>>,
}

impl Source {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self {
            parts: vec![text.into()],
        }
    }

    /// Append another chunk to the blob.
    pub fn push(&mut self, part: impl Into<Arc<str>>) {
        self.parts.push(part.into());
    }

    /// The concatenated text.
    pub fn text(&self) -> String {
        match self.parts.as_slice() {
            [single] => single.to_string(),
            parts => parts.concat(),
        }
    }

    pub fn len(&self) -> usize {
        self.parts.iter().map(|p| p.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Source {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for Source {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// An artifact with a lazily computed digest of its content.
#[derive(Debug)]
pub struct Asset {
    source: Source,
    digest: OnceLock<u64>,
}

impl Asset {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            digest: OnceLock::new(),
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// rapidhash of the concatenated content, computed on first use.
    pub fn digest(&self) -> u64 {
        *self.digest.get_or_init(|| {
            let mut hasher = RapidHasher::default();
            hasher.write(self.source.text().as_bytes());
            hasher.finish()
        })
    }
}

/// The only mutation surface the pipeline uses on a host's artifacts.
///
/// Methods take `&self` so concurrently running units can share one store;
/// implementations provide their own interior mutability.
pub trait ArtifactStore {
    fn get(&self, name: &str) -> Option<Source>;

    fn set(&self, name: &str, source: Source);

    fn has(&self, name: &str) -> bool;

    fn names(&self) -> Vec<String>;
}

/// In-memory artifact table.
///
/// Tracks which names were written since the last [`AssetTable::take_written`],
/// so a host can persist just those.
#[derive(Debug, Default)]
pub struct AssetTable {
    assets: DashMap<String, Arc<Asset>>,
    written: DashSet<String>,
}

impl AssetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the table without marking the entry as written.
    pub fn insert(&self, name: impl Into<String>, source: impl Into<Source>) {
        self.assets
            .insert(name.into(), Arc::new(Asset::new(source.into())));
    }

    pub fn asset(&self, name: &str) -> Option<Arc<Asset>> {
        self.assets.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Digest of the named asset, if present.
    pub fn digest(&self, name: &str) -> Option<u64> {
        self.asset(name).map(|asset| asset.digest())
    }

    /// Text of the named asset, if present.
    pub fn text(&self, name: &str) -> Option<String> {
        self.asset(name).map(|asset| asset.source().text())
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Names written through [`ArtifactStore::set`] since the last call, sorted.
    pub fn take_written(&self) -> Vec<String> {
        let mut names: Vec<String> = self.written.iter().map(|n| n.key().clone()).collect();
        for name in &names {
            self.written.remove(name);
        }
        names.sort();
        names
    }
}

impl ArtifactStore for AssetTable {
    fn get(&self, name: &str) -> Option<Source> {
        self.assets.get(name).map(|entry| entry.source().clone())
    }

    fn set(&self, name: &str, source: Source) {
        self.assets
            .insert(name.to_string(), Arc::new(Asset::new(source)));
        self.written.insert(name.to_string());
    }

    fn has(&self, name: &str) -> bool {
        self.assets.contains_key(name)
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.assets.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_concatenates_parts() {
        let mut source = Source::new("a{");
        source.push("color:red}");
        assert_eq!(source.text(), "a{color:red}");
        assert_eq!(source.len(), 12);
        assert!(!source.is_empty());
    }

    #[test]
    fn test_digest_is_content_based() {
        let mut split = Source::new("hello ");
        split.push("world");
        let a = Asset::new(split);
        let b = Asset::new(Source::from("hello world"));
        let c = Asset::new(Source::from("different"));
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), c.digest());
    }

    #[test]
    fn test_set_tracks_written_names() {
        let table = AssetTable::new();
        table.insert("seed.css", "a{}");
        table.set("b.css", Source::from("b{}"));
        table.set("a.css", Source::from("a{}"));

        assert!(table.has("seed.css"));
        assert_eq!(table.names(), ["a.css", "b.css", "seed.css"]);
        assert_eq!(table.take_written(), ["a.css", "b.css"]);
        assert!(table.take_written().is_empty());
    }

    #[test]
    fn test_overwrite_resets_digest() {
        let table = AssetTable::new();
        table.insert("a.css", "a { color: red }");
        let before = table.digest("a.css").unwrap();
        table.set("a.css", Source::from("a{color:red}"));
        assert_ne!(table.digest("a.css").unwrap(), before);
        assert_eq!(table.text("a.css").as_deref(), Some("a{color:red}"));
    }
}
