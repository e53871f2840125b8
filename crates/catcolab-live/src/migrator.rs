//! Schema migration for persisted documents
//!
//! # Core Concepts
//!
//! - [`Migrator`]: pure, deterministic and idempotent document upgrade
//! - [`MigrationChain`]: ordered, contiguous [`MigrationStep`]s stamping
//!   `version` after each step
//! - [`plan_migration`]: migrated value plus the structural patch to reach it
//!
//! # Invariants
//! - A document at the current version plans no operations.
//! - Only the patch is ever written to a CRDT, never the migrated value.

use crate::error::MigrationError;
use crate::migrations::CANONICAL_STEPS;
use catcolab_document::{diff, version_of, Patch};
use serde_json::Value;

/// Upgrades documents to the current schema version
pub trait Migrator: Send + Sync {
    /// Version every migrated document ends at
    fn current_version(&self) -> &str;

    /// Migrate a document to [`Self::current_version`]
    ///
    /// # Errors
    /// Returns error for unknown versions or malformed content
    fn migrate(&self, doc: &Value) -> Result<Value, MigrationError>;
}

/// Function upgrading a document by one version, in place
pub type StepFn = fn(&mut Value) -> Result<(), MigrationError>;

/// One version-to-version upgrade
#[derive(Debug, Clone, Copy)]
pub struct MigrationStep {
    /// Version the step reads
    pub from: &'static str,
    /// Version the step produces
    pub to: &'static str,
    /// Human-readable summary
    pub description: &'static str,
    /// Upgrade function; `version` is stamped by the chain afterwards
    pub apply: StepFn,
}

/// Ordered, contiguous sequence of migration steps
#[derive(Debug, Clone)]
pub struct MigrationChain {
    steps: Vec<MigrationStep>,
}

impl MigrationChain {
    /// Create chain from steps
    ///
    /// # Errors
    /// Returns error if the chain is empty, a step does not change the
    /// version, or a step does not start where the previous one ended
    pub fn new(steps: Vec<MigrationStep>) -> Result<Self, MigrationError> {
        if steps.is_empty() {
            return Err(MigrationError::InvalidChain("no steps".into()));
        }
        if let Some(step) = steps.iter().find(|step| step.from == step.to) {
            return Err(MigrationError::InvalidChain(format!(
                "step '{}' does not change the version",
                step.from
            )));
        }
        if let Some(pair) = steps.windows(2).find(|pair| pair[0].to != pair[1].from) {
            return Err(MigrationError::InvalidChain(format!(
                "step ending at '{}' is followed by step starting at '{}'",
                pair[0].to, pair[1].from
            )));
        }
        Ok(Self { steps })
    }

    /// Chain upgrading any released document to the current version
    #[must_use]
    pub fn canonical() -> Self {
        Self {
            steps: CANONICAL_STEPS.to_vec(),
        }
    }

    /// Steps in order
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }

    /// Version the last step produces
    #[must_use]
    pub fn latest_version(&self) -> &'static str {
        self.steps.last().map_or("", |step| step.to)
    }

    /// Index of the first step to run for `version`
    fn start_of(&self, version: &str) -> Option<usize> {
        if version == self.latest_version() {
            return Some(self.steps.len());
        }
        self.steps.iter().position(|step| step.from == version)
    }
}

impl Default for MigrationChain {
    fn default() -> Self {
        Self::canonical()
    }
}

impl Migrator for MigrationChain {
    fn current_version(&self) -> &str {
        self.latest_version()
    }

    fn migrate(&self, doc: &Value) -> Result<Value, MigrationError> {
        let version = version_of(doc);
        let start = self
            .start_of(version)
            .ok_or_else(|| MigrationError::UnsupportedVersion {
                found: version.to_string(),
                latest: self.latest_version().to_string(),
            })?;

        let mut migrated = doc.clone();
        for step in &self.steps[start..] {
            (step.apply)(&mut migrated)?;
            stamp_version(&mut migrated, step.to)?;
        }
        Ok(migrated)
    }
}

fn stamp_version(doc: &mut Value, version: &str) -> Result<(), MigrationError> {
    let map = doc
        .as_object_mut()
        .ok_or_else(|| MigrationError::malformed(version, "document is not an object"))?;
    map.insert("version".into(), Value::String(version.to_string()));
    Ok(())
}

/// Outcome of planning a migration
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationPlan {
    from: String,
    to: String,
    migrated: Value,
    patch: Patch,
}

impl MigrationPlan {
    /// Version before migration
    #[inline]
    #[must_use]
    pub fn from_version(&self) -> &str {
        &self.from
    }

    /// Version after migration
    #[inline]
    #[must_use]
    pub fn to_version(&self) -> &str {
        &self.to
    }

    /// Migrated document
    #[inline]
    #[must_use]
    pub fn migrated(&self) -> &Value {
        &self.migrated
    }

    /// Structural patch from the original to the migrated document
    #[inline]
    #[must_use]
    pub fn patch(&self) -> &Patch {
        &self.patch
    }

    /// Consume into the migrated document
    #[inline]
    #[must_use]
    pub fn into_migrated(self) -> Value {
        self.migrated
    }
}

/// Plan the migration of `before`
///
/// Returns `None` when `before` is already at the current version.
///
/// # Errors
/// Returns error if migration fails or stops short of the current version
pub fn plan_migration(
    migrator: &dyn Migrator,
    before: &Value,
) -> Result<Option<MigrationPlan>, MigrationError> {
    let from = version_of(before);
    let current = migrator.current_version();
    if from == current {
        return Ok(None);
    }

    let migrated = migrator.migrate(before)?;
    let to = version_of(&migrated);
    if to != current {
        return Err(MigrationError::IncompleteMigration {
            expected: current.to_string(),
            actual: to.to_string(),
        });
    }

    let patch = diff(before, &migrated);
    Ok(Some(MigrationPlan {
        from: from.to_string(),
        to: to.to_string(),
        migrated,
        patch,
    }))
}

/// Migrate a detached snapshot in memory
///
/// # Errors
/// Returns error if migration fails
pub fn migrate_snapshot(migrator: &dyn Migrator, doc: Value) -> Result<Value, MigrationError> {
    match plan_migration(migrator, &doc)? {
        Some(plan) => Ok(plan.into_migrated()),
        None => Ok(doc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rename_title(doc: &mut Value) -> Result<(), MigrationError> {
        let map = doc
            .as_object_mut()
            .ok_or_else(|| MigrationError::malformed("0", "not an object"))?;
        if let Some(title) = map.remove("title") {
            map.insert("name".into(), title);
        }
        Ok(())
    }

    fn add_tags(doc: &mut Value) -> Result<(), MigrationError> {
        if let Some(map) = doc.as_object_mut() {
            map.entry("tags").or_insert_with(|| json!([]));
        }
        Ok(())
    }

    fn two_step_chain() -> MigrationChain {
        MigrationChain::new(vec![
            MigrationStep {
                from: "0",
                to: "1",
                description: "title → name",
                apply: rename_title,
            },
            MigrationStep {
                from: "1",
                to: "2",
                description: "add tags",
                apply: add_tags,
            },
        ])
        .unwrap()
    }

    #[test]
    fn chain_runs_from_document_version() {
        let chain = two_step_chain();
        assert_eq!(chain.current_version(), "2");

        let from_zero = chain.migrate(&json!({"title": "M"})).unwrap();
        assert_eq!(from_zero, json!({"name": "M", "tags": [], "version": "2"}));

        let from_one = chain
            .migrate(&json!({"title": "kept", "version": "1"}))
            .unwrap();
        assert_eq!(from_one, json!({"title": "kept", "tags": [], "version": "2"}));
    }

    #[test]
    fn unknown_and_future_versions_fail() {
        let chain = two_step_chain();
        let err = chain.migrate(&json!({"version": "9"})).unwrap_err();
        assert_eq!(
            err,
            MigrationError::UnsupportedVersion {
                found: "9".into(),
                latest: "2".into()
            }
        );
    }

    #[test]
    fn non_contiguous_chain_is_rejected() {
        let result = MigrationChain::new(vec![
            MigrationStep {
                from: "0",
                to: "1",
                description: "",
                apply: rename_title,
            },
            MigrationStep {
                from: "2",
                to: "3",
                description: "",
                apply: add_tags,
            },
        ]);
        assert!(matches!(result, Err(MigrationError::InvalidChain(_))));
        assert!(matches!(
            MigrationChain::new(Vec::new()),
            Err(MigrationError::InvalidChain(_))
        ));
    }

    #[test]
    fn plan_is_none_at_current_version() {
        let chain = two_step_chain();
        let plan = plan_migration(&chain, &json!({"name": "M", "version": "2"})).unwrap();
        assert!(plan.is_none());
    }

    #[test]
    fn plan_carries_structural_patch() {
        let chain = two_step_chain();
        let before = json!({"title": "M", "version": "0"});
        let plan = plan_migration(&chain, &before).unwrap().unwrap();
        assert_eq!(plan.from_version(), "0");
        assert_eq!(plan.to_version(), "2");

        let mut replica = before.clone();
        plan.patch().apply(&mut replica).unwrap();
        assert_eq!(&replica, plan.migrated());
    }

    struct Stalling;

    impl Migrator for Stalling {
        fn current_version(&self) -> &str {
            "2"
        }

        fn migrate(&self, doc: &Value) -> Result<Value, MigrationError> {
            let mut doc = doc.clone();
            stamp_version(&mut doc, "1")?;
            Ok(doc)
        }
    }

    #[test]
    fn incomplete_migration_is_reported() {
        let err = plan_migration(&Stalling, &json!({"version": "0"})).unwrap_err();
        assert_eq!(
            err,
            MigrationError::IncompleteMigration {
                expected: "2".into(),
                actual: "1".into()
            }
        );
    }

    #[test]
    fn snapshot_migration_passes_current_documents_through() {
        let chain = two_step_chain();
        let current = json!({"name": "M", "version": "2"});
        assert_eq!(migrate_snapshot(&chain, current.clone()).unwrap(), current);
    }
}
