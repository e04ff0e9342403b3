use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::packing::{Organization, PackedItem, tile_nodes};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::graph::{GraphId, GraphManager, NodeId, Padding};

/// Zero-degree siblings moved under a dummy compound.
#[derive(Debug, Clone, PartialEq)]
pub struct ZeroDegreeGroup {
    pub owner: GraphId,
    pub members: Vec<NodeId>,
}

/// A compound whose members were packed and taken out of the simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearedCompound {
    pub members: Vec<NodeId>,
    pub pack: Organization,
}

/// Bookkeeping that lets the tiling steps after the simulation undo the ones before it.
#[derive(Debug, Clone, Default)]
pub struct TilingState {
    to_be_tiled: FxHashMap<NodeId, bool>,
    member_groups: IndexMap<NodeId, ZeroDegreeGroup>,
    compound_order: Vec<NodeId>,
    cleared: IndexMap<NodeId, ClearedCompound>,
    zero_degree_packs: IndexMap<NodeId, Organization>,
}

impl TilingState {
    /// Dummy compounds and the groups they hold, in creation order.
    pub fn member_groups(&self) -> &IndexMap<NodeId, ZeroDegreeGroup> {
        &self.member_groups
    }

    /// Cleared compounds, innermost first.
    pub fn compound_order(&self) -> &[NodeId] {
        &self.compound_order
    }

    pub fn cleared_compound(&self, node: NodeId) -> Option<&ClearedCompound> {
        self.cleared.get(&node)
    }

    pub fn zero_degree_pack(&self, dummy: NodeId) -> Option<&Organization> {
        self.zero_degree_packs.get(&dummy)
    }

    fn is_dummy(&self, node: NodeId) -> bool {
        self.member_groups.contains_key(&node)
    }

    /// A compound is tiled when no descendant has an edge and every member is a leaf or a
    /// tiled compound itself. Memoized per node.
    pub fn is_to_be_tiled(&mut self, gm: &GraphManager, node: NodeId) -> bool {
        if let Some(&memo) = self.to_be_tiled.get(&node) {
            return memo;
        }
        let Some(child) = gm.node(node).child() else {
            self.to_be_tiled.insert(node, false);
            return false;
        };

        let mut tiled = true;
        for &member in gm.graph(child).nodes() {
            if gm.degree(member) > 0 {
                tiled = false;
                break;
            }
            if gm.node(member).child().is_none() {
                self.to_be_tiled.insert(member, false);
                continue;
            }
            if !self.is_to_be_tiled(gm, member) {
                tiled = false;
                break;
            }
        }
        self.to_be_tiled.insert(node, tiled);
        tiled
    }

    /// Moves every set of two or more zero-degree siblings into a fresh dummy compound that
    /// inherits the parent's padding. Siblings inside a tiled compound are left alone.
    pub fn group_zero_degree_members(&mut self, gm: &mut GraphManager) -> Result<()> {
        let mut groups: IndexMap<GraphId, Vec<NodeId>> = IndexMap::new();
        for node in gm.all_nodes().iter().copied() {
            if gm.degree_with_children(node) != 0 {
                continue;
            }
            if gm.parent_of(node).is_some_and(|p| self.is_to_be_tiled(gm, p)) {
                continue;
            }
            let owner = gm.node(node).owner().ok_or(Error::NodeDetached { node })?;
            groups.entry(owner).or_default().push(node);
        }

        for (owner, members) in groups {
            if members.len() < 2 {
                continue;
            }
            let padding = gm
                .graph(owner)
                .parent()
                .and_then(|p| gm.node(p).padding)
                .unwrap_or(Padding::uniform(0.0));
            let (sx, sy) = members.iter().fold((0.0, 0.0), |(x, y), m| {
                let c = gm.node(*m).center();
                (x + c.x, y + c.y)
            });
            let n = members.len() as f64;
            let dummy = gm.create_node(owner, Rect::centered(sx / n, sy / n, 0.0, 0.0))?;
            gm.node_mut(dummy).padding = Some(padding);
            let graph = gm.add_graph(dummy)?;
            for &member in &members {
                gm.remove_node(member)?;
                gm.add_node(graph, member)?;
            }
            debug!(members = members.len(), "grouped zero-degree members");
            self.member_groups.insert(dummy, ZeroDegreeGroup { owner, members });
        }
        Ok(())
    }

    /// Packs the members of every tiled compound, innermost first, removes the child graphs
    /// and sizes each compound to its pack.
    pub fn clear_compounds(
        &mut self,
        gm: &mut GraphManager,
        vertical_padding: f64,
        horizontal_padding: f64,
    ) -> Result<()> {
        let Some(root) = gm.root() else {
            return Ok(());
        };
        let mut order = Vec::new();
        self.fill_compound_order(gm, root, &mut order);

        for &compound in &order {
            let Some(child) = gm.node(compound).child() else {
                continue;
            };
            let members = gm.graph(child).nodes().to_vec();
            let padding = compound_padding(gm, compound);
            let pack = tile_nodes(
                packed_items(gm, &members),
                padding.left + padding.right,
                vertical_padding,
                horizontal_padding,
            );
            gm.remove_graph(child)?;
            if !members.is_empty() {
                let rect = &mut gm.node_mut(compound).rect;
                rect.width = pack.width;
                rect.height = pack.height;
            }
            self.cleared.insert(compound, ClearedCompound { members, pack });
        }
        debug!(compounds = order.len(), "cleared tiled compounds");
        self.compound_order = order;
        Ok(())
    }

    fn fill_compound_order(&mut self, gm: &GraphManager, graph: GraphId, order: &mut Vec<NodeId>) {
        for &node in gm.graph(graph).nodes() {
            if let Some(child) = gm.node(node).child() {
                if !gm.graph(child).nodes().is_empty() {
                    self.fill_compound_order(gm, child, order);
                }
            }
            if !self.is_dummy(node) && self.is_to_be_tiled(gm, node) {
                order.push(node);
            }
        }
    }

    /// Packs each dummy compound's members and takes them out of the simulation.
    pub fn clear_zero_degree_members(
        &mut self,
        gm: &mut GraphManager,
        vertical_padding: f64,
        horizontal_padding: f64,
    ) -> Result<()> {
        for (&dummy, group) in &self.member_groups {
            let padding = compound_padding(gm, dummy);
            let pack = tile_nodes(
                packed_items(gm, &group.members),
                padding.left + padding.right,
                vertical_padding,
                horizontal_padding,
            );
            if let Some(child) = gm.node(dummy).child() {
                gm.remove_graph(child)?;
            }
            let center = gm.node(dummy).center();
            gm.node_mut(dummy).rect = Rect::centered(center.x, center.y, pack.width, pack.height);
            self.zero_degree_packs.insert(dummy, pack);
        }
        Ok(())
    }

    /// Puts zero-degree members back into their original graphs at their packed offsets from
    /// the dummy's final position, then drops the dummies.
    pub fn repopulate_zero_degree_members(&mut self, gm: &mut GraphManager) -> Result<()> {
        for (dummy, group) in std::mem::take(&mut self.member_groups) {
            if let Some(pack) = self.zero_degree_packs.swap_remove(&dummy) {
                let rect = gm.node(dummy).rect;
                let padding = compound_padding(gm, dummy);
                for (node, at) in pack.adjust_locations(rect.x, rect.y, padding.left, padding.top) {
                    let r = &mut gm.node_mut(node).rect;
                    r.x = at.x;
                    r.y = at.y;
                }
            }
            if let Some(child) = gm.node(dummy).child() {
                gm.remove_graph(child)?;
            }
            for &member in &group.members {
                gm.add_node(group.owner, member)?;
            }
            gm.remove_node(dummy)?;
        }
        Ok(())
    }

    /// Re-creates the child graphs of cleared compounds, outermost first, with members placed
    /// at their packed offsets inside the compound's padding.
    pub fn repopulate_compounds(&mut self, gm: &mut GraphManager) -> Result<()> {
        for compound in std::mem::take(&mut self.compound_order).into_iter().rev() {
            let Some(cleared) = self.cleared.swap_remove(&compound) else {
                continue;
            };
            let rect = gm.node(compound).rect;
            let padding = compound_padding(gm, compound);
            let placed = cleared
                .pack
                .adjust_locations(rect.x, rect.y, padding.left, padding.top);
            for (node, at) in placed {
                let r = &mut gm.node_mut(node).rect;
                r.x = at.x;
                r.y = at.y;
            }
            let graph = gm.add_graph(compound)?;
            for &member in &cleared.members {
                gm.add_node(graph, member)?;
            }
        }
        Ok(())
    }
}

fn compound_padding(gm: &GraphManager, node: NodeId) -> Padding {
    gm.node(node)
        .padding
        .unwrap_or(Padding::uniform(gm.settings().margin))
}

fn packed_items(gm: &GraphManager, members: &[NodeId]) -> Vec<PackedItem> {
    members
        .iter()
        .map(|&node| {
            let r = gm.node(node).rect;
            PackedItem {
                node,
                width: r.width,
                height: r.height,
            }
        })
        .collect()
}
