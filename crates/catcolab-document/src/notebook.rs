//! Notebooks: ordered cells of rich text and formal content
//!
//! Stored as a map of cell contents plus an order list, so that concurrent
//! reorderings and edits of different cells merge independently.

use crate::reconcile::{reuse_arc, Reconcile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// A notebook cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag")]
pub enum Cell<J> {
    /// Prose
    #[serde(rename = "rich-text")]
    RichText {
        /// Cell id
        id: Uuid,
        /// Text content
        content: String,
    },

    /// Formal judgment, participates in validation
    #[serde(rename = "formal")]
    Formal {
        /// Cell id
        id: Uuid,
        /// Judgment
        content: J,
    },

    /// Empty placeholder
    #[serde(rename = "stem")]
    Stem {
        /// Cell id
        id: Uuid,
    },
}

impl<J> Cell<J> {
    /// Cell id
    #[inline]
    #[must_use]
    pub fn id(&self) -> Uuid {
        match self {
            Self::RichText { id, .. } | Self::Formal { id, .. } | Self::Stem { id } => *id,
        }
    }

    /// Judgment of a formal cell
    #[inline]
    #[must_use]
    pub fn formal(&self) -> Option<&J> {
        match self {
            Self::Formal { content, .. } => Some(content),
            Self::RichText { .. } | Self::Stem { .. } => None,
        }
    }

    /// Check if cell is formal
    #[inline]
    #[must_use]
    pub fn is_formal(&self) -> bool {
        matches!(self, Self::Formal { .. })
    }
}

/// Ordered collection of cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notebook<J> {
    /// Cells by id
    pub cell_contents: BTreeMap<Uuid, Arc<Cell<J>>>,
    /// Display order
    pub cell_order: Vec<Uuid>,
}

impl<J> Default for Notebook<J> {
    fn default() -> Self {
        Self {
            cell_contents: BTreeMap::new(),
            cell_order: Vec::new(),
        }
    }
}

impl<J> Notebook<J> {
    /// Create empty notebook
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cell
    pub fn push(&mut self, cell: Cell<J>) {
        let id = cell.id();
        if self.cell_contents.insert(id, Arc::new(cell)).is_none() {
            self.cell_order.push(id);
        }
    }

    /// Remove a cell by id
    pub fn remove(&mut self, id: Uuid) -> Option<Arc<Cell<J>>> {
        self.cell_order.retain(|other| *other != id);
        self.cell_contents.remove(&id)
    }

    /// Cell by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&Arc<Cell<J>>> {
        self.cell_contents.get(&id)
    }

    /// Cells in display order
    ///
    /// Ids in the order list without contents are skipped.
    pub fn cells(&self) -> impl Iterator<Item = &Arc<Cell<J>>> + '_ {
        self.cell_order
            .iter()
            .filter_map(|id| self.cell_contents.get(id))
    }

    /// Number of ordered cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells().count()
    }

    /// Check if notebook has no cells
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells().next().is_none()
    }

    /// Formal cells in display order
    #[must_use]
    pub fn formal_cells(&self) -> FormalCells<J> {
        FormalCells(self.cells().filter(|cell| cell.is_formal()).cloned().collect())
    }
}

impl<J: PartialEq> Reconcile for Notebook<J> {
    fn reconcile(prev: &Self, next: Self) -> Self {
        let cell_contents = next
            .cell_contents
            .into_iter()
            .map(|(id, cell)| match prev.cell_contents.get(&id) {
                Some(old) => (id, reuse_arc(old, cell)),
                None => (id, cell),
            })
            .collect();
        Self {
            cell_contents,
            cell_order: next.cell_order,
        }
    }
}

/// Formal cells of a notebook, in order
///
/// Holds the shared cell allocations so successive projections can be compared
/// cheaply with [`FormalCells::same_as`].
#[derive(Debug, Clone, PartialEq)]
pub struct FormalCells<J>(Vec<Arc<Cell<J>>>);

impl<J> Default for FormalCells<J> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<J> FormalCells<J> {
    /// Number of formal cells
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no formal cells
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shared cells
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[Arc<Cell<J>>] {
        &self.0
    }

    /// Judgments in order
    pub fn judgments(&self) -> impl Iterator<Item = &J> + '_ {
        self.0.iter().filter_map(|cell| cell.formal())
    }
}

impl<J: PartialEq> FormalCells<J> {
    /// Check if both lists hold the same cells
    ///
    /// Pointer-equal cells compare in constant time; the rest by value.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|(a, b)| Arc::ptr_eq(a, b) || a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judgment::{ModelJudgment, ObType};
    use serde_json::json;

    fn object(name: &str) -> Cell<ModelJudgment> {
        let id = Uuid::new_v4();
        Cell::Formal {
            id,
            content: ModelJudgment::object(Uuid::new_v4(), name, ObType::new("Object")),
        }
    }

    fn text(content: &str) -> Cell<ModelJudgment> {
        Cell::RichText {
            id: Uuid::new_v4(),
            content: content.into(),
        }
    }

    #[test]
    fn cells_follow_order_list() {
        let mut notebook = Notebook::new();
        let a = object("a");
        let b = text("note");
        let (a_id, b_id) = (a.id(), b.id());
        notebook.push(a);
        notebook.push(b);
        notebook.cell_order.reverse();

        let ids: Vec<_> = notebook.cells().map(|cell| cell.id()).collect();
        assert_eq!(ids, vec![b_id, a_id]);
        assert_eq!(notebook.len(), 2);
    }

    #[test]
    fn formal_cells_filter_in_order() {
        let mut notebook = Notebook::new();
        notebook.push(object("x"));
        notebook.push(text("between"));
        notebook.push(Cell::Stem { id: Uuid::new_v4() });
        notebook.push(object("y"));

        let formal = notebook.formal_cells();
        assert_eq!(formal.len(), 2);
        let names: Vec<_> = formal
            .judgments()
            .map(|judgment| match judgment {
                ModelJudgment::Object { name, .. } | ModelJudgment::Morphism { name, .. } => {
                    name.as_str()
                }
            })
            .collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn remove_drops_from_order() {
        let mut notebook = Notebook::new();
        let cell = object("x");
        let id = cell.id();
        notebook.push(cell);
        assert!(notebook.remove(id).is_some());
        assert!(notebook.is_empty());
        assert!(notebook.cell_order.is_empty());
    }

    #[test]
    fn wire_shape() {
        let id = Uuid::new_v4();
        let mut notebook = Notebook::<ModelJudgment>::new();
        notebook.push(Cell::Stem { id });
        let value = serde_json::to_value(&notebook).unwrap();
        assert_eq!(
            value,
            json!({
                "cellContents": { id.to_string(): {"tag": "stem", "id": id} },
                "cellOrder": [id],
            })
        );
        let back: Notebook<ModelJudgment> = serde_json::from_value(value).unwrap();
        assert_eq!(back, notebook);
    }

    #[test]
    fn reconcile_reuses_untouched_cells() {
        let mut prev = Notebook::new();
        prev.push(object("x"));
        prev.push(text("note"));

        let mut next = prev.clone();
        let note_id = prev.cell_order[1];
        next.cell_contents = prev
            .cell_contents
            .iter()
            .map(|(id, cell)| (*id, Arc::new((**cell).clone())))
            .collect();
        next.cell_contents.insert(
            note_id,
            Arc::new(Cell::RichText {
                id: note_id,
                content: "edited".into(),
            }),
        );

        let reconciled = Notebook::reconcile(&prev, next);
        let formal_prev = prev.formal_cells();
        let formal_next = reconciled.formal_cells();
        assert!(Arc::ptr_eq(&formal_prev.cells()[0], &formal_next.cells()[0]));
        assert!(formal_prev.same_as(&formal_next));
        assert!(!Arc::ptr_eq(
            &prev.cell_contents[&note_id],
            &reconciled.cell_contents[&note_id]
        ));
    }

    #[test]
    fn same_as_compares_by_value_without_shared_allocation() {
        let mut notebook = Notebook::new();
        notebook.push(object("x"));
        let copy: Notebook<ModelJudgment> =
            serde_json::from_value(serde_json::to_value(&notebook).unwrap()).unwrap();
        assert!(notebook.formal_cells().same_as(&copy.formal_cells()));

        let mut other = copy.clone();
        other.push(object("y"));
        assert!(!notebook.formal_cells().same_as(&other.formal_cells()));
    }
}
