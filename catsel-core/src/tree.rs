//! Category option tree and its arena builder.
//!
//! Records arrive flat, in whatever order the catalog returns them. The
//! builder allocates one arena slot per id it sees (a record's own id or a
//! parent id), links children to parents strictly through id lookups, and
//! only materializes the nested [`TreeNode`] structure in a final pass from
//! the root. Nodes that never become reachable from the root are dropped.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::category::CategoryRecord;
use crate::identity::{CategoryId, ROOT_ID};

/// Ordered children of the implicit root.
pub type Forest = Vec<TreeNode>;

/// One option of the select widget.
///
/// Field names on the wire follow what the tree widget expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub value: CategoryId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// Tells the widget not to run its template engine over the label.
    #[serde(rename = "__disableTmpl", default, skip_serializing_if = "is_false")]
    pub disable_tmpl: bool,
    #[serde(rename = "optgroup", default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl TreeNode {
    /// A bare node carrying only its id.
    pub fn placeholder(value: CategoryId) -> Self {
        Self {
            value,
            label: None,
            is_active: None,
            disable_tmpl: false,
            children: Vec::new(),
        }
    }

    /// Whether this node only carries its id.
    pub fn is_placeholder(&self) -> bool {
        self.label.is_none() && self.is_active.is_none()
    }

    /// Number of nodes in this subtree, this node included.
    pub fn subtree_len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Depth-first search for a node by id.
    pub fn find(&self, id: CategoryId) -> Option<&TreeNode> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.value == id {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    fn detached(&self) -> Self {
        Self {
            value: self.value,
            label: self.label.clone(),
            is_active: self.is_active,
            disable_tmpl: self.disable_tmpl,
            children: Vec::new(),
        }
    }
}

/// One node of a forest in flat form.
///
/// A flat forest lists nodes in pre-order; `parent` is the position of the
/// node's parent in that list, `None` for top-level nodes. Nesting depth
/// never shows up in the flat form, so it serializes at any tree depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatNode {
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
    #[serde(flatten)]
    pub node: TreeNode,
}

/// Flatten a forest into pre-order [`FlatNode`]s.
pub fn flatten_forest(forest: &[TreeNode]) -> Vec<FlatNode> {
    let mut flat = Vec::new();
    let mut stack: Vec<(&TreeNode, Option<usize>)> =
        forest.iter().rev().map(|node| (node, None)).collect();
    while let Some((node, parent)) = stack.pop() {
        let position = flat.len();
        flat.push(FlatNode {
            parent,
            node: node.detached(),
        });
        stack.extend(node.children.iter().rev().map(|child| (child, Some(position))));
    }
    flat
}

/// Rebuild a forest from pre-order [`FlatNode`]s.
///
/// Fails with the position of the first node whose parent does not precede
/// it.
pub fn unflatten_forest(flat: Vec<FlatNode>) -> Result<Forest, usize> {
    nest(flat.into_iter().map(|f| (f.node, f.parent)))
}

/// Nest childless nodes given in pre-order with their parent positions.
fn nest<I>(items: I) -> Result<Forest, usize>
where
    I: IntoIterator<Item = (TreeNode, Option<usize>)>,
{
    let mut nodes: Vec<Option<TreeNode>> = Vec::new();
    let mut parents: Vec<Option<usize>> = Vec::new();
    for (position, (node, parent)) in items.into_iter().enumerate() {
        if parent.is_some_and(|p| p >= position) {
            return Err(position);
        }
        nodes.push(Some(node));
        parents.push(parent);
    }

    // Descendants sit after their ancestors, so walking backwards hands each
    // node to its parent only once its own children are complete.
    let mut top = Vec::new();
    for position in (0..nodes.len()).rev() {
        let Some(mut node) = nodes[position].take() else {
            continue;
        };
        node.children.reverse();
        match parents[position] {
            Some(parent) => {
                if let Some(parent) = nodes[parent].as_mut() {
                    parent.children.push(node);
                }
            }
            None => top.push(node),
        }
    }
    top.reverse();
    Ok(top)
}

/// Arena slot for one category id.
#[derive(Debug)]
struct ArenaNode {
    value: CategoryId,
    label: Option<String>,
    is_active: Option<bool>,
    disable_tmpl: bool,
    children: Vec<usize>,
    linked: bool,
}

impl ArenaNode {
    fn bare(value: CategoryId) -> Self {
        Self {
            value,
            label: None,
            is_active: None,
            disable_tmpl: false,
            children: Vec::new(),
            linked: false,
        }
    }
}

/// Builds a [`Forest`] from flat category records.
///
/// # Example
///
/// ```
/// use catsel_core::{CategoryRecord, CategoryTreeBuilder};
///
/// let mut builder = CategoryTreeBuilder::new();
/// builder.push(&CategoryRecord::new(2, 1, "Shoes", true, "1/2"));
/// builder.push(&CategoryRecord::new(3, 2, "Red Shoes", true, "1/2/3"));
///
/// let forest = builder.into_forest().expect("root has children");
/// assert_eq!(forest[0].children[0].label.as_deref(), Some("Red Shoes"));
/// ```
#[derive(Debug)]
pub struct CategoryTreeBuilder {
    nodes: Vec<ArenaNode>,
    index: HashMap<CategoryId, usize>,
    records: usize,
}

impl Default for CategoryTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CategoryTreeBuilder {
    /// Create a builder holding only the unlabelled root.
    pub fn new() -> Self {
        let mut builder = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            records: 0,
        };
        builder.slot(ROOT_ID);
        builder
    }

    /// Build directly from an iterator of records.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a CategoryRecord>,
    {
        let mut builder = Self::new();
        for record in records {
            builder.push(record);
        }
        builder
    }

    /// Arena index for `id`, allocating a bare slot on first sight.
    fn slot(&mut self, id: CategoryId) -> usize {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(ArenaNode::bare(id));
        self.index.insert(id, idx);
        idx
    }

    /// Add one record: label its node and hang it under its parent.
    ///
    /// A node is linked to a parent at most once; a repeated id only refreshes
    /// its label and active flag. Self-parented records are never linked.
    pub fn push(&mut self, record: &CategoryRecord) {
        self.records += 1;
        let own = self.slot(record.id);
        let parent = self.slot(record.parent_id);

        let node = &mut self.nodes[own];
        node.label = Some(record.name.clone());
        node.is_active = Some(record.is_active);
        node.disable_tmpl = true;

        if own == parent || node.linked {
            return;
        }
        node.linked = true;
        self.nodes[parent].children.push(own);
    }

    /// Number of records pushed so far.
    pub fn record_count(&self) -> usize {
        self.records
    }

    /// Materialize the tree from the root.
    ///
    /// Every arena slot is emitted at most once, so malformed input can
    /// neither loop nor duplicate a subtree. The walk is iterative and
    /// handles chains of any depth.
    pub fn finish(&self) -> TreeNode {
        let root = self.index[&ROOT_ID];
        let mut emitted = vec![false; self.nodes.len()];
        emitted[root] = true;

        let mut order: Vec<(TreeNode, Option<usize>)> = Vec::new();
        let mut stack: Vec<(usize, Option<usize>)> = vec![(root, None)];
        while let Some((idx, parent)) = stack.pop() {
            let position = order.len();
            order.push((self.emit(idx), parent));
            for &child in self.nodes[idx].children.iter().rev() {
                if !emitted[child] {
                    emitted[child] = true;
                    stack.push((child, Some(position)));
                }
            }
        }

        let unreachable = emitted.iter().filter(|seen| !**seen).count();
        if unreachable > 0 {
            tracing::debug!(
                unreachable,
                records = self.records,
                "Dropped category nodes not connected to the root"
            );
        }

        // Parents always precede children in `order`, so nesting cannot fail
        // and yields exactly the root.
        nest(order)
            .ok()
            .and_then(|mut top| top.pop())
            .unwrap_or_else(|| TreeNode::placeholder(ROOT_ID))
    }

    /// Childless output node for one arena slot.
    fn emit(&self, idx: usize) -> TreeNode {
        let slot = &self.nodes[idx];
        if slot.value == ROOT_ID {
            // The root never carries option attributes of its own.
            return TreeNode::placeholder(ROOT_ID);
        }
        TreeNode {
            value: slot.value,
            label: slot.label.clone(),
            is_active: slot.is_active,
            disable_tmpl: slot.disable_tmpl,
            children: Vec::new(),
        }
    }

    /// The root's children, or `None` when nothing hangs under the root.
    pub fn into_forest(self) -> Option<Forest> {
        let root = self.finish();
        if root.children.is_empty() {
            None
        } else {
            Some(root.children)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: CategoryId, parent: CategoryId, name: &str) -> CategoryRecord {
        CategoryRecord::new(id, parent, name, true, format!("{}/{}", parent, id))
    }

    #[test]
    fn test_empty_builder_yields_none() {
        assert!(CategoryTreeBuilder::new().into_forest().is_none());
    }

    #[test]
    fn test_nested_tree() {
        let records = vec![
            record(2, ROOT_ID, "Shoes"),
            record(3, 2, "Red Shoes"),
            record(4, ROOT_ID, "Hats"),
        ];
        let forest = CategoryTreeBuilder::from_records(&records)
            .into_forest()
            .unwrap();

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].value, 2);
        assert_eq!(forest[0].label.as_deref(), Some("Shoes"));
        assert!(forest[0].disable_tmpl);
        assert_eq!(forest[0].children[0].value, 3);
        assert_eq!(forest[1].value, 4);
        assert!(forest[1].children.is_empty());
    }

    #[test]
    fn test_child_before_parent_keeps_discovery_order() {
        let records = vec![
            record(3, 2, "Red Shoes"),
            record(5, ROOT_ID, "Bags"),
            record(2, ROOT_ID, "Shoes"),
        ];
        let forest = CategoryTreeBuilder::from_records(&records)
            .into_forest()
            .unwrap();

        let values: Vec<_> = forest.iter().map(|n| n.value).collect();
        assert_eq!(values, vec![5, 2]);
        assert_eq!(forest[1].children[0].label.as_deref(), Some("Red Shoes"));
    }

    #[test]
    fn test_orphan_subtree_dropped() {
        let records = vec![record(2, ROOT_ID, "Shoes"), record(8, 77, "Lost")];
        let builder = CategoryTreeBuilder::from_records(&records);
        let root = builder.finish();
        assert!(root.find(8).is_none());
        assert!(root.find(77).is_none());
        assert_eq!(root.subtree_len(), 2);
    }

    #[test]
    fn test_root_record_is_not_an_option() {
        let records = vec![
            CategoryRecord::new(ROOT_ID, 0, "Root Catalog", true, "1"),
            record(5, ROOT_ID, "Bags"),
        ];
        let root = CategoryTreeBuilder::from_records(&records).finish();
        assert!(root.label.is_none());
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].label.as_deref(), Some("Bags"));
    }

    #[test]
    fn test_cycles_and_self_parents_terminate() {
        let records = vec![
            record(2, ROOT_ID, "A"),
            record(3, 2, "B"),
            record(2, 3, "A again"),
            record(9, 9, "Self"),
        ];
        let root = CategoryTreeBuilder::from_records(&records).finish();
        assert_eq!(root.subtree_len(), 3);
        assert_eq!(root.find(2).unwrap().label.as_deref(), Some("A again"));
        assert!(root.find(9).is_none());
    }

    #[test]
    fn test_inactive_flag_kept() {
        let records = vec![CategoryRecord::new(6, ROOT_ID, "Sale", false, "1/6")];
        let forest = CategoryTreeBuilder::from_records(&records)
            .into_forest()
            .unwrap();
        assert_eq!(forest[0].is_active, Some(false));
    }

    #[test]
    fn test_wire_format() {
        let records = vec![record(2, ROOT_ID, "Shoes"), record(3, 2, "Red Shoes")];
        let forest = CategoryTreeBuilder::from_records(&records)
            .into_forest()
            .unwrap();
        let json = serde_json::to_value(&forest).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "value": 2,
                "label": "Shoes",
                "is_active": true,
                "__disableTmpl": true,
                "optgroup": [{
                    "value": 3,
                    "label": "Red Shoes",
                    "is_active": true,
                    "__disableTmpl": true
                }]
            }])
        );
    }

    fn chain(depth: u32) -> Vec<CategoryRecord> {
        (0..depth)
            .map(|level| {
                let id = ROOT_ID + 1 + level;
                record(id, id - 1, "Level")
            })
            .collect()
    }

    #[test]
    fn test_deep_chain_builds() {
        let forest = CategoryTreeBuilder::from_records(&chain(1_000))
            .into_forest()
            .unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].subtree_len(), 1_000);
        assert!(forest[0].find(ROOT_ID + 1_000).is_some());
    }

    #[test]
    fn test_flatten_and_unflatten() {
        let records = vec![
            record(2, ROOT_ID, "Shoes"),
            record(3, 2, "Red Shoes"),
            record(6, 2, "Boots"),
            record(4, ROOT_ID, "Hats"),
        ];
        let forest = CategoryTreeBuilder::from_records(&records)
            .into_forest()
            .unwrap();

        let flat = flatten_forest(&forest);
        let positions: Vec<_> = flat.iter().map(|f| (f.node.value, f.parent)).collect();
        assert_eq!(
            positions,
            vec![(2, None), (3, Some(0)), (6, Some(0)), (4, None)]
        );
        assert!(flat.iter().all(|f| f.node.children.is_empty()));
        assert_eq!(unflatten_forest(flat).unwrap(), forest);
    }

    #[test]
    fn test_flat_wire_format() {
        let records = vec![record(2, ROOT_ID, "Shoes"), record(3, 2, "Red")];
        let forest = CategoryTreeBuilder::from_records(&records)
            .into_forest()
            .unwrap();
        let json = serde_json::to_value(flatten_forest(&forest)).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"value": 2, "label": "Shoes", "is_active": true, "__disableTmpl": true},
                {"p": 0, "value": 3, "label": "Red", "is_active": true, "__disableTmpl": true}
            ])
        );
    }

    #[test]
    fn test_unflatten_rejects_forward_parent() {
        let flat = vec![
            FlatNode {
                parent: Some(1),
                node: TreeNode::placeholder(2),
            },
            FlatNode {
                parent: None,
                node: TreeNode::placeholder(3),
            },
        ];
        assert_eq!(unflatten_forest(flat), Err(0));
    }

    #[test]
    fn test_placeholder_roundtrip_shape() {
        let node = TreeNode::placeholder(42);
        assert!(node.is_placeholder());
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            serde_json::json!({"value": 42})
        );
    }
}
