use std::collections::VecDeque;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::graph::{
    GraphId, GraphManager, LabelHAlign, LabelVAlign, NodeId, NodeLabel, Padding,
};

/// Caller-side graph: nodes may nest through `parent`, edges reference node ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Elements {
    #[serde(default)]
    pub nodes: Vec<NodeElement>,
    #[serde(default)]
    pub edges: Vec<EdgeElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeElement {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default = "default_node_size")]
    pub width: f64,
    #[serde(default = "default_node_size")]
    pub height: f64,
    /// Initial center.
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<PaddingElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LabelElement>,
}

fn default_node_size() -> f64 {
    40.0
}

impl NodeElement {
    pub fn new(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            parent: None,
            width,
            height,
            x: 0.0,
            y: 0.0,
            padding: None,
            label: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeElement {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl EdgeElement {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Either one value for all sides or per-side values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaddingElement {
    Uniform(f64),
    Sides {
        #[serde(default)]
        left: f64,
        #[serde(default)]
        top: f64,
        #[serde(default)]
        right: f64,
        #[serde(default)]
        bottom: f64,
    },
}

impl From<PaddingElement> for Padding {
    fn from(p: PaddingElement) -> Self {
        match p {
            PaddingElement::Uniform(v) => Padding::uniform(v),
            PaddingElement::Sides {
                left,
                top,
                right,
                bottom,
            } => Padding {
                left,
                top,
                right,
                bottom,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelElement {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub halign: LabelHAlign,
    #[serde(default)]
    pub valign: LabelVAlign,
}

impl From<LabelElement> for NodeLabel {
    fn from(l: LabelElement) -> Self {
        NodeLabel {
            width: l.width,
            height: l.height,
            halign: l.halign,
            valign: l.valign,
        }
    }
}

impl Elements {
    /// Rejects duplicate ids, parents that do not exist or form a cycle, and edges with a
    /// missing endpoint.
    pub fn validate(&self) -> Result<()> {
        let mut parents: FxHashMap<&str, Option<&str>> = FxHashMap::default();
        for n in &self.nodes {
            if parents.insert(n.id.as_str(), n.parent.as_deref()).is_some() {
                return Err(Error::DuplicateNodeId { id: n.id.clone() });
            }
        }
        for n in &self.nodes {
            if let Some(parent) = &n.parent {
                if !parents.contains_key(parent.as_str()) {
                    return Err(Error::UnknownParent {
                        id: n.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }
        for n in &self.nodes {
            let mut seen: FxHashSet<&str> = FxHashSet::default();
            let mut current = Some(n.id.as_str());
            while let Some(id) = current {
                if !seen.insert(id) {
                    return Err(Error::ParentCycle { id: n.id.clone() });
                }
                current = parents.get(id).copied().flatten();
            }
        }

        let mut edge_ids: FxHashSet<&str> = FxHashSet::default();
        for e in &self.edges {
            if !edge_ids.insert(e.id.as_str()) {
                return Err(Error::DuplicateEdgeId { id: e.id.clone() });
            }
            if !parents.contains_key(e.source.as_str()) || !parents.contains_key(e.target.as_str()) {
                return Err(Error::MissingEndpoint {
                    edge_id: e.id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Size of a leaf once its label is folded in: labels beside the node add to the extent,
/// centered labels only widen it when larger.
pub fn leaf_dimensions_with_label(width: f64, height: f64, label: &LabelElement) -> (f64, f64) {
    let w = match label.halign {
        LabelHAlign::Left | LabelHAlign::Right => width + label.width,
        LabelHAlign::Center => width.max(label.width),
    };
    let h = match label.valign {
        LabelVAlign::Top | LabelVAlign::Bottom => height + label.height,
        LabelVAlign::Center => height.max(label.height),
    };
    (w, h)
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Builds the nested graphs top-down, members in input order, and adds the edges. Self-loops
/// and repeated edges between the same pair are skipped. Returns the node handle of every
/// external id, in input order.
pub(crate) fn populate(
    gm: &mut GraphManager,
    elements: &Elements,
    include_labels: bool,
) -> Result<IndexMap<String, NodeId>> {
    elements.validate()?;
    let root = gm.add_root();

    let compounds: FxHashSet<&str> = elements
        .nodes
        .iter()
        .filter_map(|n| n.parent.as_deref())
        .collect();
    let mut children: FxHashMap<Option<&str>, Vec<&str>> = FxHashMap::default();
    let mut index: IndexMap<String, NodeId> = IndexMap::with_capacity(elements.nodes.len());
    for n in &elements.nodes {
        let (mut w, mut h) = (finite_or_zero(n.width), finite_or_zero(n.height));
        if include_labels && !compounds.contains(n.id.as_str()) {
            if let Some(label) = &n.label {
                (w, h) = leaf_dimensions_with_label(w, h, label);
            }
        }
        let node = gm.new_node(Rect::centered(finite_or_zero(n.x), finite_or_zero(n.y), w, h));
        let data = gm.node_mut(node);
        data.padding = n.padding.map(Padding::from);
        data.label = n.label.map(NodeLabel::from);
        data.external_key = Some(n.id.clone());
        index.insert(n.id.clone(), node);
        children.entry(n.parent.as_deref()).or_default().push(n.id.as_str());
    }

    // Parents are attached before their members, graph by graph.
    let mut queue: VecDeque<(Option<&str>, GraphId)> = VecDeque::from([(None, root)]);
    while let Some((parent, graph)) = queue.pop_front() {
        for &id in children.get(&parent).map(Vec::as_slice).unwrap_or_default() {
            let node = index[id];
            gm.add_node(graph, node)?;
            if compounds.contains(id) {
                let child = gm.add_graph(node)?;
                queue.push_back((Some(id), child));
            }
        }
    }

    let mut pairs: IndexSet<(NodeId, NodeId)> = IndexSet::new();
    let mut skipped = 0usize;
    for e in &elements.edges {
        let (Some(&source), Some(&target)) = (index.get(&e.source), index.get(&e.target)) else {
            return Err(Error::MissingEndpoint {
                edge_id: e.id.clone(),
            });
        };
        let key = if source <= target {
            (source, target)
        } else {
            (target, source)
        };
        if source == target || !pairs.insert(key) {
            skipped += 1;
            continue;
        }
        let edge = gm.add_edge(source, target)?;
        gm.edge_mut(edge).external_key = Some(e.id.clone());
    }
    debug!(
        nodes = index.len(),
        edges = elements.edges.len() - skipped,
        skipped,
        "populated graph"
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::{EdgeElement, Elements, LabelElement, NodeElement, leaf_dimensions_with_label, populate};
    use crate::error::Error;
    use crate::graph::{GraphManager, LabelHAlign, LabelVAlign};

    fn elements(nodes: Vec<NodeElement>, edges: Vec<EdgeElement>) -> Elements {
        Elements { nodes, edges }
    }

    #[test]
    fn rejects_parent_cycles() {
        let els = elements(
            vec![
                NodeElement::new("a", 10.0, 10.0).with_parent("b"),
                NodeElement::new("b", 10.0, 10.0).with_parent("a"),
            ],
            vec![],
        );
        assert!(matches!(els.validate(), Err(Error::ParentCycle { .. })));
    }

    #[test]
    fn rejects_duplicates_and_unknown_references() {
        let dup = elements(
            vec![NodeElement::new("a", 1.0, 1.0), NodeElement::new("a", 1.0, 1.0)],
            vec![],
        );
        assert!(matches!(dup.validate(), Err(Error::DuplicateNodeId { id }) if id == "a"));

        let orphan = elements(vec![NodeElement::new("a", 1.0, 1.0).with_parent("x")], vec![]);
        assert!(matches!(orphan.validate(), Err(Error::UnknownParent { .. })));

        let dangling = elements(
            vec![NodeElement::new("a", 1.0, 1.0)],
            vec![EdgeElement::new("e", "a", "zz")],
        );
        assert!(matches!(dangling.validate(), Err(Error::MissingEndpoint { edge_id }) if edge_id == "e"));
    }

    #[test]
    fn nests_children_and_skips_loops_and_parallel_edges() {
        let els = elements(
            vec![
                NodeElement::new("leaf", 10.0, 10.0).with_parent("box"),
                NodeElement::new("box", 0.0, 0.0),
                NodeElement::new("other", 10.0, 10.0).at(f64::NAN, 5.0),
            ],
            vec![
                EdgeElement::new("e1", "leaf", "other"),
                EdgeElement::new("e2", "other", "leaf"),
                EdgeElement::new("e3", "other", "other"),
            ],
        );
        let mut gm = GraphManager::default();
        let index = populate(&mut gm, &els, false).unwrap();
        assert_eq!(index.keys().collect::<Vec<_>>(), ["leaf", "box", "other"]);
        let boxed = index["box"];
        assert_eq!(gm.node(index["leaf"]).owner(), gm.node(boxed).child());
        assert_eq!(gm.all_edges().len(), 1);
        assert_eq!(gm.node(index["other"]).center().x, 0.0);
    }

    #[test]
    fn side_labels_extend_and_centered_labels_widen() {
        let side = LabelElement {
            width: 30.0,
            height: 8.0,
            halign: LabelHAlign::Right,
            valign: LabelVAlign::Bottom,
        };
        assert_eq!(leaf_dimensions_with_label(20.0, 20.0, &side), (50.0, 28.0));
        let centered = LabelElement {
            halign: LabelHAlign::Center,
            valign: LabelVAlign::Center,
            ..side
        };
        assert_eq!(leaf_dimensions_with_label(20.0, 20.0, &centered), (30.0, 20.0));
    }

    #[test]
    fn padding_accepts_number_or_sides() {
        let uniform: NodeElement =
            serde_json::from_str(r#"{"id":"a","padding":5}"#).unwrap();
        assert_eq!(uniform.width, 40.0);
        assert!(matches!(uniform.padding, Some(super::PaddingElement::Uniform(v)) if v == 5.0));
        let sides: NodeElement =
            serde_json::from_str(r#"{"id":"a","padding":{"left":2,"top":3}}"#).unwrap();
        let p = crate::graph::Padding::from(sides.padding.unwrap());
        assert_eq!((p.left, p.top, p.right), (2.0, 3.0, 0.0));
    }
}
