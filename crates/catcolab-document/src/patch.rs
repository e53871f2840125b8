//! Structural patches between document values
//!
//! Provides [`Patch`], an ordered list of [`PatchOp`]s computed by [`diff`]
//! and applied with [`Patch::apply`].
//!
//! NOT whole-document replacement - a patch touches only the nodes that
//! differ, so applying it through a CRDT's mutation API merges with whatever
//! other replicas change concurrently.

use crate::path::{DocPath, PathSegment};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One structural operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PatchOp {
    /// Set a map key or overwrite a list element
    ///
    /// Putting at index `len` appends; putting at the root replaces it.
    Put {
        /// Target node
        path: DocPath,
        /// New value
        value: Value,
    },

    /// Remove a map key or list element
    ///
    /// Removing an absent map key is a no-op, so replaying a delete that a
    /// peer already applied converges.
    Delete {
        /// Target node
        path: DocPath,
    },

    /// Insert list elements before the index named by the last segment
    Insert {
        /// List path plus insertion index
        path: DocPath,
        /// Elements to insert, in order
        values: Vec<Value>,
    },
}

impl PatchOp {
    /// Target path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &DocPath {
        match self {
            Self::Put { path, .. } | Self::Delete { path } | Self::Insert { path, .. } => path,
        }
    }

    /// Check if replaying this op on its own output is a no-op
    ///
    /// Puts and map-key deletes are; list inserts and list deletes shift
    /// positions and are not.
    #[must_use]
    pub fn is_idempotent(&self) -> bool {
        match self {
            Self::Put { .. } => true,
            Self::Delete { path } => !matches!(path.segments().last(), Some(PathSegment::Index(_))),
            Self::Insert { .. } => false,
        }
    }
}

/// Ordered list of structural operations
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch {
    ops: Vec<PatchOp>,
}

impl Patch {
    /// Create patch from ops
    #[inline]
    #[must_use]
    pub fn new(ops: Vec<PatchOp>) -> Self {
        Self { ops }
    }

    /// Operations in application order
    #[inline]
    #[must_use]
    pub fn ops(&self) -> &[PatchOp] {
        &self.ops
    }

    /// Number of operations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if the patch changes nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Consume into ops
    #[inline]
    #[must_use]
    pub fn into_ops(self) -> Vec<PatchOp> {
        self.ops
    }

    /// Apply all operations to `target`
    ///
    /// Either every operation applies or `target` is left untouched.
    ///
    /// # Errors
    /// Returns error if an operation addresses a missing or mistyped node
    pub fn apply(&self, target: &mut Value) -> Result<(), PatchError> {
        let mut working = target.clone();
        for op in &self.ops {
            apply_op(&mut working, op)?;
        }
        *target = working;
        Ok(())
    }
}

impl IntoIterator for Patch {
    type Item = PatchOp;
    type IntoIter = std::vec::IntoIter<PatchOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

/// Compute the structural difference `before → after`
///
/// Applying the result to `before` yields `after`. Equal subtrees produce no
/// operations; maps recurse key by key; lists keep their common prefix and
/// suffix and patch only the middle.
#[must_use]
pub fn diff(before: &Value, after: &Value) -> Patch {
    let mut ops = Vec::new();
    diff_into(&DocPath::root(), before, after, &mut ops);
    Patch::new(ops)
}

fn diff_into(path: &DocPath, before: &Value, after: &Value, ops: &mut Vec<PatchOp>) {
    if before == after {
        return;
    }
    match (before, after) {
        (Value::Object(old), Value::Object(new)) => {
            for key in old.keys().filter(|key| !new.contains_key(*key)) {
                ops.push(PatchOp::Delete {
                    path: path.child_key(key.as_str()),
                });
            }
            for (key, new_value) in new {
                let child = path.child_key(key.as_str());
                match old.get(key) {
                    Some(old_value) => diff_into(&child, old_value, new_value, ops),
                    None => ops.push(PatchOp::Put {
                        path: child,
                        value: new_value.clone(),
                    }),
                }
            }
        }
        (Value::Array(old), Value::Array(new)) => diff_lists(path, old, new, ops),
        _ => ops.push(PatchOp::Put {
            path: path.clone(),
            value: after.clone(),
        }),
    }
}

fn diff_lists(path: &DocPath, old: &[Value], new: &[Value], ops: &mut Vec<PatchOp>) {
    let prefix = old.iter().zip(new).take_while(|(a, b)| a == b).count();
    let max_suffix = old.len().min(new.len()) - prefix;
    let suffix = old
        .iter()
        .rev()
        .zip(new.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];
    let shared = old_mid.len().min(new_mid.len());

    for (offset, (a, b)) in old_mid.iter().zip(new_mid).enumerate() {
        diff_into(&path.child_index(prefix + offset), a, b, ops);
    }

    // Highest index first so earlier deletes do not shift later ones
    for offset in (shared..old_mid.len()).rev() {
        ops.push(PatchOp::Delete {
            path: path.child_index(prefix + offset),
        });
    }

    if new_mid.len() > shared {
        ops.push(PatchOp::Insert {
            path: path.child_index(prefix + shared),
            values: new_mid[shared..].to_vec(),
        });
    }
}

fn apply_op(root: &mut Value, op: &PatchOp) -> Result<(), PatchError> {
    let Some((parent_path, last)) = op.path().split_last() else {
        return match op {
            PatchOp::Put { value, .. } => {
                *root = value.clone();
                Ok(())
            }
            PatchOp::Delete { .. } | PatchOp::Insert { .. } => Err(PatchError::RootOperation),
        };
    };

    let parent = parent_path
        .resolve_mut(root)
        .ok_or_else(|| PatchError::PathNotFound(parent_path.clone()))?;

    match (op, parent) {
        (PatchOp::Put { value, .. }, Value::Object(map)) => {
            map.insert(last.as_key(), value.clone());
            Ok(())
        }
        (PatchOp::Delete { .. }, Value::Object(map)) => {
            map.remove(&last.as_key());
            Ok(())
        }
        (op, Value::Array(items)) => {
            let PathSegment::Index(index) = *last else {
                return Err(PatchError::NotAContainer(op.path().clone()));
            };
            let len = items.len();
            match op {
                PatchOp::Put { value, .. } if index < len => items[index] = value.clone(),
                PatchOp::Put { value, .. } if index == len => items.push(value.clone()),
                PatchOp::Delete { .. } if index < len => {
                    items.remove(index);
                }
                PatchOp::Insert { values, .. } if index <= len => {
                    items.splice(index..index, values.iter().cloned());
                }
                _ => {
                    return Err(PatchError::IndexOutOfBounds {
                        path: op.path().clone(),
                        len,
                    })
                }
            }
            Ok(())
        }
        (op, _) => Err(PatchError::NotAContainer(op.path().clone())),
    }
}

/// Errors while applying a patch
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatchError {
    /// Parent of the target does not exist
    #[error("path not found: {0}")]
    PathNotFound(DocPath),

    /// List index past the end
    #[error("index out of bounds at {path} (len {len})")]
    IndexOutOfBounds {
        /// Offending path
        path: DocPath,
        /// Length of the list
        len: usize,
    },

    /// Parent is a scalar, or a list addressed by key
    #[error("not a container: {0}")]
    NotAContainer(DocPath),

    /// Delete or insert at the document root
    #[error("cannot delete or insert at the document root")]
    RootOperation,
}
