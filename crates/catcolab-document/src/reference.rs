//! Document identifiers, stable references and permissions

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Backend-issued document reference id
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefId(String);

impl RefId {
    /// Create ref id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RefId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RefId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// CRDT document locator, e.g. `automerge:2j9k...`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create locator
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Locator string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Reference to a document, at its head or pinned to a version
///
/// A pinned reference always resolves to the same content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StableRef {
    /// Referenced document
    #[serde(rename = "_id")]
    pub ref_id: RefId,
    /// Pinned version, `None` for head
    #[serde(rename = "_version", default)]
    pub version: Option<String>,
    /// Server qualifier, `None` for the configured server
    #[serde(rename = "_server", default)]
    pub server: Option<String>,
}

impl StableRef {
    /// Reference to the head of a document
    #[must_use]
    pub fn head(ref_id: impl Into<RefId>) -> Self {
        Self {
            ref_id: ref_id.into(),
            version: None,
            server: None,
        }
    }

    /// Reference pinned to a version
    #[must_use]
    pub fn at_version(ref_id: impl Into<RefId>, version: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            version: Some(version.into()),
            server: None,
        }
    }

    /// Qualify with a server
    #[must_use]
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    /// Check if reference follows the head
    #[inline]
    #[must_use]
    pub fn is_head(&self) -> bool {
        self.version.is_none()
    }
}

impl Display for StableRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.ref_id, self.version.as_deref().unwrap_or("head"))
    }
}

/// Permission levels, ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PermissionLevel {
    /// View
    Read,
    /// Edit content
    Write,
    /// Manage sharing
    Maintain,
    /// Owner
    Own,
}

/// Permissions granted on a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Permissions {
    /// Level for everyone
    #[serde(default)]
    pub anyone: Option<PermissionLevel>,
    /// Level for the current user
    #[serde(default)]
    pub user: Option<PermissionLevel>,
}

impl Permissions {
    /// Highest level from either source
    #[inline]
    #[must_use]
    pub fn effective(&self) -> Option<PermissionLevel> {
        self.anyone.max(self.user)
    }

    /// Check for write access
    #[inline]
    #[must_use]
    pub fn can_write(&self) -> bool {
        self.effective() >= Some(PermissionLevel::Write)
    }
}

/// Backend metadata of a document obtained through the resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocRef {
    /// Backend reference id
    pub ref_id: RefId,
    /// Granted permissions
    pub permissions: Permissions,
    /// Whether the document receives live edits
    pub is_live: bool,
}

impl DocRef {
    /// Create doc ref
    #[must_use]
    pub fn new(ref_id: RefId, permissions: Permissions, is_live: bool) -> Self {
        Self {
            ref_id,
            permissions,
            is_live,
        }
    }

    /// Check if local changes are allowed
    #[inline]
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.is_live && self.permissions.can_write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn effective_permission_is_max() {
        let perms = Permissions {
            anyone: Some(PermissionLevel::Read),
            user: Some(PermissionLevel::Maintain),
        };
        assert_eq!(perms.effective(), Some(PermissionLevel::Maintain));
        assert!(perms.can_write());

        let read_only = Permissions {
            anyone: Some(PermissionLevel::Read),
            user: None,
        };
        assert!(!read_only.can_write());
        assert_eq!(Permissions::default().effective(), None);
    }

    #[test]
    fn writable_requires_live_and_write() {
        let write = Permissions {
            anyone: None,
            user: Some(PermissionLevel::Write),
        };
        assert!(DocRef::new("r".into(), write, true).is_writable());
        assert!(!DocRef::new("r".into(), write, false).is_writable());
    }

    #[test]
    fn stable_ref_wire_shape() {
        let pinned = StableRef::at_version("abc", "v3").with_server("backend.catcolab.org");
        assert!(!pinned.is_head());
        assert_eq!(
            serde_json::to_value(&pinned).unwrap(),
            json!({"_id": "abc", "_version": "v3", "_server": "backend.catcolab.org"})
        );
        let head: StableRef = serde_json::from_value(json!({"_id": "abc"})).unwrap();
        assert!(head.is_head());
        assert_eq!(head.to_string(), "abc@head");
    }

    #[test]
    fn permission_levels_parse() {
        let perms: Permissions =
            serde_json::from_value(json!({"anyone": "Read", "user": "Own"})).unwrap();
        assert_eq!(perms.user, Some(PermissionLevel::Own));
    }
}
