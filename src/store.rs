use crate::error::{Error, Result};
use crate::output::write_json;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A flat collection of JSON documents addressed by id.
pub trait DocumentStore {
    /// Ids of every stored document, in a stable order.
    fn list(&self) -> Result<Vec<String>>;

    fn load(&self, id: &str) -> Result<Value>;

    /// Store `doc` under `id`, replacing any previous document.
    fn save(&self, id: &str, doc: &Value) -> Result<()>;
}

/// Documents kept as `<root>/<id>` files; the id is the file name.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
    ignored: Vec<String>,
    pretty: bool,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignored: Vec::new(),
            pretty: false,
        }
    }

    /// Entry names that `list` never reports.
    pub fn ignoring<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }
}

impl DocumentStore for FsStore {
    fn list(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => Error::DirectoryNotFound {
                path: self.root.clone(),
            },
            _ => Error::StorageRead {
                path: self.root.clone(),
                source,
            },
        })?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| Error::StorageRead {
                path: self.root.clone(),
                source,
            })?;
            let Ok(name) = entry.file_name().into_string() else {
                tracing::warn!(entry = ?entry.path(), "skipping non UTF-8 entry name");
                continue;
            };
            if self.ignored.iter().any(|ignored| *ignored == name) {
                tracing::trace!(%name, "ignored entry");
                continue;
            }
            ids.push(name);
        }

        // read_dir order is filesystem dependent
        ids.sort();
        Ok(ids)
    }

    fn load(&self, id: &str) -> Result<Value> {
        let path = self.path_of(id);
        let contents = fs::read(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => Error::DescriptorNotFound { path: path.clone() },
            _ => Error::StorageRead {
                path: path.clone(),
                source,
            },
        })?;
        serde_json::from_slice(&contents).map_err(|source| Error::MalformedDescriptor { path, source })
    }

    fn save(&self, id: &str, doc: &Value) -> Result<()> {
        write_json(&self.path_of(id), doc, self.pretty)
    }
}

/// In-memory store, ordered by id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RefCell<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, id: impl Into<String>, doc: Value) -> Self {
        self.docs.borrow_mut().insert(id.into(), doc);
        self
    }

    pub fn get(&self, id: &str) -> Option<Value> {
        self.docs.borrow().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.docs.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.borrow().is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn list(&self) -> Result<Vec<String>> {
        Ok(self.docs.borrow().keys().cloned().collect())
    }

    fn load(&self, id: &str) -> Result<Value> {
        self.get(id)
            .ok_or_else(|| Error::DescriptorNotFound { path: id.into() })
    }

    fn save(&self, id: &str, doc: &Value) -> Result<()> {
        self.docs.borrow_mut().insert(id.to_owned(), doc.clone());
        Ok(())
    }
}

/// Looks up the source text of a contract by its logical name.
pub trait SourceLookup {
    fn source_of(&self, contract: &str) -> Result<String>;
}

const SOURCE_EXTENSION: &str = "sol";

/// Solidity sources stored as `<root>/<contract>.sol`.
#[derive(Debug, Clone)]
pub struct SourceDir {
    root: PathBuf,
}

impl SourceDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SourceLookup for SourceDir {
    fn source_of(&self, contract: &str) -> Result<String> {
        let path = self.root.join(format!("{contract}.{SOURCE_EXTENSION}"));
        fs::read_to_string(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => Error::SourceNotFound { path: path.clone() },
            _ => Error::StorageRead {
                path: path.clone(),
                source,
            },
        })
    }
}

impl SourceLookup for BTreeMap<String, String> {
    fn source_of(&self, contract: &str) -> Result<String> {
        self.get(contract).cloned().ok_or_else(|| Error::SourceNotFound {
            path: contract.into(),
        })
    }
}

/// Contract name of a stored document: its id with the extension stripped.
pub fn logical_name(id: &str) -> &str {
    Path::new(id)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(id)
}
