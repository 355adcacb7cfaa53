use serde::{Deserialize, Serialize};

/// Suffix of documents that may be used as reference material
pub const MARKDOWN_SUFFIX: &str = ".md";

/// The set of document paths chosen as reference material.
///
/// Keeps insertion order so the prompt built from it is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ReferenceSelection {
    paths: Vec<String>,
}

impl ReferenceSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a path. Returns false if it was already selected.
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        let path = path.into();
        if self.contains(&path) {
            return false;
        }
        self.paths.push(path);
        true
    }

    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.paths.len();
        self.paths.retain(|p| p != path);
        self.paths.len() != before
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.paths.clone()
    }
}

impl<S: Into<String>> FromIterator<S> for ReferenceSelection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut selection = ReferenceSelection::new();
        for path in iter {
            selection.insert(path);
        }
        selection
    }
}

impl From<Vec<String>> for ReferenceSelection {
    fn from(paths: Vec<String>) -> Self {
        paths.into_iter().collect()
    }
}

impl From<ReferenceSelection> for Vec<String> {
    fn from(selection: ReferenceSelection) -> Self {
        selection.paths
    }
}

/// A resolved reference document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDoc {
    pub name: String,
    pub content: String,
}

pub fn is_markdown(path: &str) -> bool {
    path.ends_with(MARKDOWN_SUFFIX)
}
