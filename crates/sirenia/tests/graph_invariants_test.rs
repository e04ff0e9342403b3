use sirenia::graph::{EdgePlacement, GraphManager};
use sirenia::{CoseLayout, Layout, LayoutConfig, Rect};

fn rect() -> Rect {
    Rect::new(0.0, 0.0, 20.0, 20.0)
}

/// root: a, b, c(compound: d, e(compound: f))
fn nested() -> (GraphManager, Vec<sirenia::NodeId>) {
    let mut gm = GraphManager::default();
    let root = gm.add_root();
    let a = gm.create_node(root, rect()).unwrap();
    let b = gm.create_node(root, rect()).unwrap();
    let c = gm.create_node(root, rect()).unwrap();
    let cg = gm.add_graph(c).unwrap();
    let d = gm.create_node(cg, rect()).unwrap();
    let e = gm.create_node(cg, rect()).unwrap();
    let eg = gm.add_graph(e).unwrap();
    let f = gm.create_node(eg, rect()).unwrap();
    gm.add_edge(a, b).unwrap();
    gm.add_edge(b, d).unwrap();
    gm.add_edge(d, f).unwrap();
    gm.add_edge(f, a).unwrap();
    (gm, vec![a, b, c, d, e, f])
}

fn assert_placement(gm: &GraphManager) {
    for &edge in gm.all_edges().iter() {
        let e = gm.edge(edge);
        let (so, to) = (gm.node(e.source()).owner(), gm.node(e.target()).owner());
        assert_eq!(e.is_inter_graph(), so != to, "edge {edge:?}");
        let in_graphs = gm
            .graphs()
            .iter()
            .filter(|g| gm.graph(**g).edges().contains(&edge))
            .count();
        let in_inter = gm.inter_graph_edges().iter().filter(|x| **x == edge).count();
        if e.is_inter_graph() {
            assert_eq!((in_graphs, in_inter), (0, 1));
        } else {
            assert_eq!((in_graphs, in_inter), (1, 0));
            assert_eq!(e.placement(), EdgePlacement::Graph(so.unwrap()));
        }
    }
}

#[test]
fn every_member_is_owned_by_its_graph_exactly_once() {
    let (gm, _) = nested();
    for &graph in gm.graphs() {
        for &node in gm.graph(graph).nodes() {
            assert_eq!(gm.node(node).owner(), Some(graph));
            let listed = gm
                .graphs()
                .iter()
                .filter(|g| gm.graph(**g).nodes().contains(&node))
                .count();
            assert_eq!(listed, 1);
        }
    }
    assert_eq!(gm.all_nodes().len(), 6);
}

#[test]
fn edges_live_in_exactly_one_list() {
    let (gm, _) = nested();
    assert_placement(&gm);
    assert_eq!(gm.inter_graph_edges().len(), 3);
}

#[test]
fn removing_a_node_detaches_its_edges() {
    let (mut gm, n) = nested();
    let (a, b, d) = (n[0], n[1], n[3]);
    let bd = gm.edges_between(b, d)[0];
    gm.remove_node(b).unwrap();

    assert_eq!(gm.node(b).owner(), None);
    assert!(gm.node(b).edges().is_empty());
    assert!(!gm.node(a).edges().iter().any(|e| gm.edge(*e).other_end(a) == Some(b)));
    assert!(!gm.node(d).edges().contains(&bd));
    assert_eq!(gm.edge(bd).placement(), EdgePlacement::Detached);
    assert_eq!(gm.all_nodes().len(), 5);
    assert_placement(&gm);
}

#[test]
fn edge_to_own_parent_makes_the_layout_unsuccessful() {
    let mut layout = CoseLayout::new(LayoutConfig::default());
    let gm = layout.base_mut().graph_manager_mut();
    let root = gm.add_root();
    let parent = gm.create_node(root, rect()).unwrap();
    let child_graph = gm.add_graph(parent).unwrap();
    let child = gm.create_node(child_graph, rect()).unwrap();
    gm.create_node(child_graph, rect()).unwrap();
    gm.add_edge(child, parent).unwrap();
    assert!(gm.includes_invalid_edge());

    let before = layout.base().graph_manager().node(child).center();
    assert!(!layout.run_layout().unwrap());
    assert!(layout.base().is_layout_finished());
    assert_eq!(layout.base().graph_manager().node(child).center(), before);
}

#[test]
fn lowest_common_ancestor_of_cousins() {
    let (mut gm, n) = nested();
    gm.calc_lowest_common_ancestors().unwrap();
    let (a, c, f) = (n[0], n[2], n[5]);
    let fa = gm.edges_between(f, a)[0];
    let e = gm.edge(fa);
    assert_eq!(e.lca(), gm.root());
    assert_eq!(e.source_in_lca(), Some(c));
    assert_eq!(e.target_in_lca(), Some(a));
}
