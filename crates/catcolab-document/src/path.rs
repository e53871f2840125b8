//! Paths into JSON documents
//!
//! Provides [`DocPath`] for addressing a node inside a document value, used as
//! the target of patch operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// One step of a [`DocPath`]
///
/// Serialized untagged: numbers are list indices, strings are map keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Position in a list
    Index(usize),
    /// Key in a map
    Key(String),
}

impl PathSegment {
    /// The segment as a map key
    ///
    /// An index addressing a map is read as its decimal key.
    #[must_use]
    pub fn as_key(&self) -> String {
        match self {
            Self::Index(index) => index.to_string(),
            Self::Key(key) => key.clone(),
        }
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Key(key) => write!(f, "{}", key.replace('~', "~0").replace('/', "~1")),
        }
    }
}

/// Path within a document tree
///
/// Displayed as a JSON pointer, e.g. `/notebook/cellOrder/0`; the root path
/// displays as the empty string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocPath(Vec<PathSegment>);

impl DocPath {
    /// Create path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// Empty path (root)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path of a single map key below the root
    #[inline]
    #[must_use]
    pub fn key(key: impl Into<String>) -> Self {
        Self(vec![PathSegment::Key(key.into())])
    }

    /// Path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is the root
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Parent path and last segment (if not root)
    #[must_use]
    pub fn split_last(&self) -> Option<(Self, &PathSegment)> {
        let (last, parent) = self.0.split_last()?;
        Some((Self(parent.to_vec()), last))
    }

    /// Append a map key, returning new path
    #[must_use]
    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(PathSegment::Key(key.into()));
        new
    }

    /// Append a list index, returning new path
    #[must_use]
    pub fn child_index(&self, index: usize) -> Self {
        let mut new = self.clone();
        new.0.push(PathSegment::Index(index));
        new
    }

    /// Check if this path is a prefix of another
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.0.len() <= other.0.len() && self.0 == other.0[..self.0.len()]
    }

    /// Node at this path, if present
    #[must_use]
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.0.iter().try_fold(root, |node, segment| match (node, segment) {
            (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
            (Value::Object(map), segment) => map.get(&segment.as_key()),
            _ => None,
        })
    }

    /// Mutable node at this path, if present
    pub fn resolve_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
        let mut node = root;
        for segment in &self.0 {
            node = match (node, segment) {
                (Value::Array(items), PathSegment::Index(index)) => items.get_mut(*index)?,
                (Value::Object(map), segment) => map.get_mut(&segment.as_key())?,
                _ => return None,
            };
        }
        Some(node)
    }
}

impl Display for DocPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for DocPath {
    type Err = PathError;

    /// Parse a JSON pointer; all-digit segments become indices.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        let rest = s
            .strip_prefix('/')
            .ok_or_else(|| PathError::MissingLeadingSlash(s.to_string()))?;
        let segments = rest
            .split('/')
            .map(|raw| {
                let key = raw.replace("~1", "/").replace("~0", "~");
                match key.parse::<usize>() {
                    Ok(index) if !key.starts_with('+') => PathSegment::Index(index),
                    _ => PathSegment::Key(key),
                }
            })
            .collect();
        Ok(Self(segments))
    }
}

/// Path parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Pointer does not start with `/`
    #[error("path must start with '/': {0}")]
    MissingLeadingSlash(String),
}
