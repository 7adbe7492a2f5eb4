use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Failure reported by a [`TagStore`]. The renderer attaches the tag stack
/// trace when converting it into a [`crate::TagupError`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("tag not found")]
    NotFound,

    /// The store does not implement the named capability.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

/// Source of tag bodies.
pub trait TagStore {
    /// Fetch the markup body of a tag.
    fn get_tag(&self, _name: &str) -> Result<String, FetchError> {
        Err(FetchError::NotImplemented("get_tag"))
    }

    /// Called once per render with every distinct tag name the document
    /// references literally.
    fn prefetch_tags(&self, _names: &HashSet<String>) {}
}

impl<T: TagStore + ?Sized> TagStore for &T {
    fn get_tag(&self, name: &str) -> Result<String, FetchError> {
        (**self).get_tag(name)
    }

    fn prefetch_tags(&self, names: &HashSet<String>) {
        (**self).prefetch_tags(names)
    }
}

impl<T: TagStore + ?Sized> TagStore for Box<T> {
    fn get_tag(&self, name: &str) -> Result<String, FetchError> {
        (**self).get_tag(name)
    }

    fn prefetch_tags(&self, names: &HashSet<String>) {
        (**self).prefetch_tags(names)
    }
}

/// Store without a fetch capability. Any tag expansion fails with
/// [`FetchError::NotImplemented`]; markup without tags still renders.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl TagStore for NullStore {}

/// Store backed by an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tags: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, body: impl Into<String>) -> &mut Self {
        self.tags.insert(name.into(), body.into());
        self
    }

    pub fn with_tags(tags: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        let mut store = Self::new();
        for (name, body) in tags {
            store.insert(name, body);
        }
        store
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }
}

impl<N: Into<String>, B: Into<String>> FromIterator<(N, B)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (N, B)>>(iter: I) -> Self {
        Self::with_tags(iter)
    }
}

impl TagStore for MemoryStore {
    fn get_tag(&self, name: &str) -> Result<String, FetchError> {
        self.tags.get(name).cloned().ok_or(FetchError::NotFound)
    }
}

/// Store that reads `<root>/<name>.<extension>` files.
///
/// Names that would escape the root directory (path separators, `.`, `..`)
/// are reported as not found.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    extension: String,
}

impl DirectoryStore {
    pub const DEFAULT_EXTENSION: &'static str = "tag";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: Self::DEFAULT_EXTENSION.to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `name`, if the name is a plain file stem.
    pub fn tag_path(&self, name: &str) -> Option<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(stem)), None) if stem == name => {
                let mut file = stem.to_os_string();
                if !self.extension.is_empty() {
                    file.push(".");
                    file.push(&self.extension);
                }
                Some(self.root.join(file))
            }
            _ => None,
        }
    }
}

impl TagStore for DirectoryStore {
    fn get_tag(&self, name: &str) -> Result<String, FetchError> {
        let path = self.tag_path(name).ok_or(FetchError::NotFound)?;
        std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FetchError::NotFound,
            _ => FetchError::Backend(Box::new(e)),
        })
    }
}
