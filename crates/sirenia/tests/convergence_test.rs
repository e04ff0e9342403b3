use sirenia::fd::{FdLayout, SimulationPhase};
use sirenia::{AnimateMode, CoseLayout, ForceDirected, Layout, LayoutConfig, Quality, Rect};

fn ring(layout: &mut impl Layout, n: usize) {
    let gm = layout.base_mut().graph_manager_mut();
    let root = gm.add_root();
    let nodes: Vec<_> = (0..n)
        .map(|_| gm.create_node(root, Rect::new(0.0, 0.0, 30.0, 30.0)).unwrap())
        .collect();
    for i in 0..n {
        gm.add_edge(nodes[i], nodes[(i + 1) % n]).unwrap();
    }
}

#[test]
fn ring_converges_within_the_iteration_budget() {
    let mut layout = FdLayout::new(LayoutConfig::default());
    ring(&mut layout, 12);
    assert!(layout.run_layout().unwrap());
    assert_eq!(layout.fd().phase(), SimulationPhase::Converged);
    assert!(layout.fd().total_iterations() <= layout.fd().max_iterations());
    assert!(layout.base().is_layout_finished());
}

#[test]
fn ticking_by_hand_reaches_convergence() {
    let config = LayoutConfig {
        animate: AnimateMode::During,
        quality: Quality::Draft,
        ..LayoutConfig::default()
    };
    let mut layout = CoseLayout::new(config);
    ring(&mut layout, 8);
    assert!(layout.run_layout().unwrap());
    assert!(!layout.base().is_layout_finished());
    assert_eq!(layout.fd().total_iterations(), 0);

    let cap = layout.fd().max_iterations() + 1;
    let mut ticks = 0;
    while !layout.tick().unwrap() {
        ticks += 1;
        assert!(ticks <= cap, "simulation did not stop");
    }
    // Further ticks are no-ops.
    let iterations = layout.fd().total_iterations();
    assert!(layout.tick().unwrap());
    assert_eq!(layout.fd().total_iterations(), iterations);

    layout.finish_layout(true).unwrap();
    assert!(layout.base().is_layout_finished());
}

#[test]
fn cooling_never_rises_while_simulating() {
    let config = LayoutConfig {
        animate: AnimateMode::During,
        ..LayoutConfig::default()
    };
    let mut layout = CoseLayout::new(config);
    ring(&mut layout, 10);
    layout.run_layout().unwrap();

    let mut last = layout.fd().cooling_factor();
    while !layout.tick().unwrap() {
        if layout.fd().phase() != SimulationPhase::Simulating {
            break;
        }
        let now = layout.fd().cooling_factor();
        assert!(now <= last);
        last = now;
    }
    assert!(last >= 0.04);
}

#[test]
fn same_seed_gives_same_layout() {
    let run = |seed: u64| {
        let mut layout = FdLayout::new(LayoutConfig {
            random_seed: seed,
            ..LayoutConfig::default()
        });
        ring(&mut layout, 6);
        layout.run_layout().unwrap();
        let gm = layout.base().graph_manager();
        gm.all_nodes()
            .iter()
            .map(|n| gm.node(*n).center())
            .collect::<Vec<_>>()
    };
    assert_eq!(run(7), run(7));
    assert_ne!(run(7), run(8));
}
