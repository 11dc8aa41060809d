//! Compiled units: groups of assets produced by one compilation pass.

use std::fmt;

use camino::Utf8Path;

/// Identity of a unit, stable across incremental passes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnitId {
    Named(String),
    Index(u64),
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitId::Named(name) => f.write_str(name),
            UnitId::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for UnitId {
    fn from(name: &str) -> Self {
        UnitId::Named(name.to_string())
    }
}

impl From<String> for UnitId {
    fn from(name: String) -> Self {
        UnitId::Named(name)
    }
}

impl From<u64> for UnitId {
    fn from(index: u64) -> Self {
        UnitId::Index(index)
    }
}

/// What the filename deriver may know about a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitMeta {
    pub id: UnitId,
    pub name: Option<String>,
}

impl UnitMeta {
    /// The unit's name, falling back to its id.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.id.to_string(),
        }
    }
}

/// A unit as the host build hands it over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub id: UnitId,
    pub name: Option<String>,
    /// Output manifest: member asset names, in emission order
    pub files: Vec<String>,
    /// Content hash maintained by the host; changes whenever a member changes
    pub hash: String,
    /// Whether this unit carries the runtime bootstrap
    pub runtime: bool,
}

impl Unit {
    pub fn new(id: impl Into<UnitId>, hash: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            files: Vec::new(),
            hash: hash.into(),
            runtime: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files.extend(files.into_iter().map(Into::into));
        self
    }

    pub fn with_runtime(mut self, runtime: bool) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn meta(&self) -> UnitMeta {
        UnitMeta {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }

    /// Member assets that are stylesheets, in manifest order.
    pub fn stylesheets(&self) -> impl Iterator<Item = &str> {
        self.files
            .iter()
            .map(String::as_str)
            .filter(|name| is_stylesheet(name))
    }
}

/// Whether an asset name identifies a stylesheet.
pub fn is_stylesheet(name: &str) -> bool {
    Utf8Path::new(name).extension() == Some("css")
}
