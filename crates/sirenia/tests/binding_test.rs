use std::collections::BTreeMap;

use sirenia::{
    AnimateMode, EdgeElement, Elements, Error, LayoutEvent, LayoutObserver, LayoutOptions,
    LayoutRun, NodeElement, Point, run,
};

#[derive(Default)]
struct Recorder {
    events: Vec<LayoutEvent>,
    position_updates: usize,
}

impl LayoutObserver for Recorder {
    fn on_event(&mut self, event: LayoutEvent) {
        self.events.push(event);
    }

    fn on_positions(&mut self, positions: &BTreeMap<String, Point>) {
        assert!(!positions.is_empty());
        self.position_updates += 1;
    }
}

fn small_graph() -> Elements {
    Elements {
        nodes: vec![
            NodeElement::new("a", 40.0, 40.0),
            NodeElement::new("b", 40.0, 40.0),
            NodeElement::new("group", 0.0, 0.0),
            NodeElement::new("c", 30.0, 30.0).with_parent("group"),
            NodeElement::new("d", 30.0, 30.0).with_parent("group"),
        ],
        edges: vec![
            EdgeElement::new("ab", "a", "b"),
            EdgeElement::new("bc", "b", "c"),
            EdgeElement::new("cd", "c", "d"),
        ],
    }
}

#[test]
fn run_reports_every_node() {
    let result = run(&small_graph(), LayoutOptions::default()).unwrap();
    assert!(result.success);
    let ids: Vec<&str> = result.positions.keys().map(String::as_str).collect();
    assert_eq!(ids, ["a", "b", "c", "d", "group"]);
    assert_eq!(result.sizes["a"].width, 40.0);
    assert!(result.sizes["group"].width > 30.0);
    assert_eq!(result.fit.map(|f| f.padding), Some(10.0));
}

#[test]
fn end_mode_emits_start_ready_stop_once() {
    let mut layout =
        LayoutRun::with_observer(&small_graph(), LayoutOptions::default(), Recorder::default())
            .unwrap();
    layout.start().unwrap();
    assert!(layout.is_finished());
    let recorder = layout.into_observer();
    assert_eq!(
        recorder.events,
        [LayoutEvent::Start, LayoutEvent::Ready, LayoutEvent::Stop]
    );
    assert_eq!(recorder.position_updates, 1);
}

#[test]
fn during_mode_advances_frame_by_frame() {
    let options = LayoutOptions {
        animate: AnimateMode::During,
        refresh: 5,
        ..LayoutOptions::default()
    };
    let mut layout =
        LayoutRun::with_observer(&small_graph(), options, Recorder::default()).unwrap();
    layout.start().unwrap();
    assert!(!layout.is_finished());
    assert_eq!(layout.observer().events, [LayoutEvent::Start]);

    assert!(!layout.frame().unwrap());
    assert_eq!(
        layout.observer().events,
        [LayoutEvent::Start, LayoutEvent::Ready]
    );

    let mut frames = 1;
    while !layout.frame().unwrap() {
        frames += 1;
        assert!(frames < 10_000);
    }
    assert!(frames > 1);
    let recorder = layout.observer();
    assert_eq!(
        recorder.events,
        [LayoutEvent::Start, LayoutEvent::Ready, LayoutEvent::Stop]
    );
    assert!(recorder.position_updates >= frames);
}

#[test]
fn stop_finalizes_an_animated_run() {
    let options = LayoutOptions {
        animate: AnimateMode::During,
        refresh: 1,
        ..LayoutOptions::default()
    };
    let mut layout =
        LayoutRun::with_observer(&small_graph(), options, Recorder::default()).unwrap();
    layout.frame().unwrap();
    layout.stop();
    assert!(layout.frame().unwrap());
    assert!(layout.is_finished());
    assert_eq!(layout.observer().events.last(), Some(&LayoutEvent::Stop));
    // The hierarchy is restored even after an early stop.
    assert_eq!(layout.positions().len(), 5);
}

#[test]
fn incremental_run_starts_from_given_positions() {
    let elements = Elements {
        nodes: vec![
            NodeElement::new("a", 20.0, 20.0).at(0.0, 0.0),
            NodeElement::new("b", 20.0, 20.0).at(70.0, 0.0),
        ],
        edges: vec![EdgeElement::new("ab", "a", "b")],
    };
    let options = LayoutOptions {
        randomize: false,
        ..LayoutOptions::default()
    };
    let result = run(&elements, options).unwrap();
    let (a, b) = (result.positions["a"], result.positions["b"]);
    // No scatter and no translation: the pair stays near where it started.
    assert!(a.x < b.x);
    assert!((a.y - b.y).abs() < 20.0);
    assert!(a.x.abs() < 100.0 && b.x < 200.0);
}

#[test]
fn invalid_elements_are_rejected_before_layout() {
    let mut elements = small_graph();
    elements.edges.push(EdgeElement::new("dangling", "a", "nowhere"));
    let err = run(&elements, LayoutOptions::default()).unwrap_err();
    assert!(matches!(err, Error::MissingEndpoint { ref edge_id } if edge_id == "dangling"));

    let mut elements = small_graph();
    elements.nodes.push(NodeElement::new("a", 1.0, 1.0));
    assert!(matches!(
        run(&elements, LayoutOptions::default()),
        Err(Error::DuplicateNodeId { .. })
    ));
}

#[test]
fn options_parse_from_json() {
    let elements: Elements = serde_json::from_str(
        r#"{
            "nodes": [{"id": "a"}, {"id": "b", "width": 10, "height": 10}],
            "edges": [{"id": "e", "source": "a", "target": "b"}]
        }"#,
    )
    .unwrap();
    let options: LayoutOptions =
        serde_json::from_str(r#"{"quality": "draft", "animate": false, "fit": false}"#).unwrap();
    let result = run(&elements, options).unwrap();
    assert!(result.success);
    assert_eq!(result.sizes["a"].width, 40.0);
    assert!(result.fit.is_none());
}
