//! Released document schema upgrades
//!
//! Version "0" stored notebooks as a list of cells, either bare or under a
//! `cells` key. Version "1" stores a map of cell contents keyed by cell id
//! plus an order list, so concurrent edits to different cells merge
//! independently.

use crate::error::MigrationError;
use crate::migrator::MigrationStep;
use serde_json::{Map, Value};

/// Steps of [`MigrationChain::canonical`](crate::MigrationChain::canonical)
pub(crate) const CANONICAL_STEPS: &[MigrationStep] = &[MigrationStep {
    from: "0",
    to: "1",
    description: "notebook cell list → cellContents/cellOrder",
    apply: cells_to_contents_and_order,
}];

fn cells_to_contents_and_order(doc: &mut Value) -> Result<(), MigrationError> {
    let map = doc
        .as_object_mut()
        .ok_or_else(|| MigrationError::malformed("0", "document is not an object"))?;

    let cells = match map.get_mut("notebook") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(cells)) => std::mem::take(cells),
        Some(Value::Object(notebook)) if notebook.contains_key("cellContents") => return Ok(()),
        Some(Value::Object(notebook)) => match notebook.remove("cells") {
            Some(Value::Array(cells)) => cells,
            None => Vec::new(),
            Some(_) => {
                return Err(MigrationError::malformed("0", "notebook cells is not a list"));
            }
        },
        Some(_) => return Err(MigrationError::malformed("0", "notebook is not a list")),
    };

    map.insert("notebook".into(), restructure(cells)?);
    Ok(())
}

// Later duplicates of an id are dropped.
fn restructure(cells: Vec<Value>) -> Result<Value, MigrationError> {
    let mut contents = Map::new();
    let mut order = Vec::with_capacity(cells.len());

    for cell in cells {
        let id = cell
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| MigrationError::malformed("0", "cell without an id"))?
            .to_string();
        if contents.contains_key(&id) {
            continue;
        }
        order.push(Value::String(id.clone()));
        contents.insert(id, cell);
    }

    let mut notebook = Map::new();
    notebook.insert("cellContents".into(), Value::Object(contents));
    notebook.insert("cellOrder".into(), Value::Array(order));
    Ok(Value::Object(notebook))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrator::{MigrationChain, Migrator};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn cell_list_becomes_contents_and_order() {
        let doc = json!({
            "type": "model",
            "name": "M",
            "notebook": {"cells": [
                {"tag": "stem", "id": "b"},
                {"tag": "rich-text", "id": "a", "content": "hi"},
            ]}
        });
        let migrated = MigrationChain::canonical().migrate(&doc).unwrap();
        assert_eq!(
            migrated,
            json!({
                "type": "model",
                "name": "M",
                "version": "1",
                "notebook": {
                    "cellContents": {
                        "a": {"tag": "rich-text", "id": "a", "content": "hi"},
                        "b": {"tag": "stem", "id": "b"},
                    },
                    "cellOrder": ["b", "a"],
                }
            })
        );
    }

    #[test]
    fn bare_list_notebook_is_accepted() {
        let doc = json!({"type": "model", "notebook": [{"tag": "stem", "id": "x"}]});
        let migrated = MigrationChain::canonical().migrate(&doc).unwrap();
        assert_eq!(migrated["notebook"]["cellOrder"], json!(["x"]));
    }

    #[test]
    fn new_shape_is_left_as_is() {
        let notebook = json!({"cellContents": {}, "cellOrder": []});
        let doc = json!({"type": "model", "version": "0", "notebook": notebook});
        let migrated = MigrationChain::canonical().migrate(&doc).unwrap();
        assert_eq!(migrated["notebook"], notebook);
        assert_eq!(migrated["version"], json!("1"));
    }

    #[test]
    fn missing_notebook_becomes_empty() {
        let migrated = MigrationChain::canonical()
            .migrate(&json!({"type": "model"}))
            .unwrap();
        assert_eq!(
            migrated["notebook"],
            json!({"cellContents": {}, "cellOrder": []})
        );
    }

    #[test]
    fn cell_without_id_fails() {
        let doc = json!({"type": "model", "notebook": [{"tag": "stem"}]});
        let err = MigrationChain::canonical().migrate(&doc).unwrap_err();
        assert!(matches!(err, MigrationError::Malformed { .. }));
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let doc = json!({"type": "model", "notebook": [
            {"tag": "rich-text", "id": "a", "content": "first"},
            {"tag": "rich-text", "id": "a", "content": "second"},
        ]});
        let migrated = MigrationChain::canonical().migrate(&doc).unwrap();
        assert_eq!(migrated["notebook"]["cellOrder"], json!(["a"]));
        assert_eq!(
            migrated["notebook"]["cellContents"]["a"]["content"],
            json!("first")
        );
    }

    #[test]
    fn canonical_chain_is_contiguous() {
        let chain = MigrationChain::new(CANONICAL_STEPS.to_vec()).unwrap();
        assert_eq!(chain.current_version(), catcolab_document::CURRENT_VERSION);
    }
}
