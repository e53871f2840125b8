//! Subcommand implementations
//!
//! Each command reads document JSON files and returns the text to print.

use anyhow::{Context, Result};
use catcolab_document::{diff, version_of, ContentHash, Document, DocumentKind};
use catcolab_live::{plan_migration, MigrationChain, Migrator};
use serde_json::Value;
use std::fmt::Write as _;
use std::path::Path;

pub(crate) fn read_json(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn pretty<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("failed to encode output")
}

/// Migrate to the current version; print the document or only its patch
pub(crate) fn migrate(path: &Path, patch_only: bool) -> Result<String> {
    let doc = read_json(path)?;
    let chain = MigrationChain::canonical();
    let plan = plan_migration(&chain, &doc)
        .with_context(|| format!("failed to migrate {}", path.display()))?;

    match plan {
        Some(plan) => {
            tracing::info!(
                "{}: version {} -> {} ({} ops)",
                path.display(),
                plan.from_version(),
                plan.to_version(),
                plan.patch().len()
            );
            if patch_only {
                pretty(plan.patch())
            } else {
                pretty(plan.migrated())
            }
        }
        None => {
            tracing::info!(
                "{}: already at version {}",
                path.display(),
                chain.current_version()
            );
            if patch_only {
                pretty(&diff(&doc, &doc))
            } else {
                pretty(&doc)
            }
        }
    }
}

/// Structural patch from one file to another
pub(crate) fn diff_files(before: &Path, after: &Path) -> Result<String> {
    let patch = diff(&read_json(before)?, &read_json(after)?);
    tracing::debug!("{} ops", patch.len());
    pretty(&patch)
}

/// Content hash of a file's canonical JSON
pub(crate) fn hash(path: &Path) -> Result<String> {
    Ok(ContentHash::of_value(&read_json(path)?).to_string())
}

/// Summary of a document after migration
pub(crate) fn inspect(path: &Path) -> Result<String> {
    let raw = read_json(path)?;
    let stored = version_of(&raw).to_string();
    let migrated = MigrationChain::canonical()
        .migrate(&raw)
        .with_context(|| format!("failed to migrate {}", path.display()))?;
    let doc = Document::from_value(migrated)
        .with_context(|| format!("{} is not a CatColab document", path.display()))?;

    let mut out = String::new();
    writeln!(out, "type:    {}", doc.doc_type())?;
    writeln!(out, "name:    {}", doc.name())?;
    if stored == doc.version() {
        writeln!(out, "version: {}", doc.version())?;
    } else {
        writeln!(out, "version: {} (stored: {stored})", doc.version())?;
    }
    writeln!(
        out,
        "cells:   {} ({} formal)",
        doc.cell_count(),
        doc.formal_cell_count()
    )?;
    write!(out, "hash:    {}", ContentHash::of_value(&raw).short())?;
    Ok(out)
}
