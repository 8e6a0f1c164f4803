use gatecraft::component::{ComponentKind, ComponentType, GateProps};
use gatecraft::config::EditorConfig;
use gatecraft::editor::{ComponentPatch, EditorCommand, EditorHistory, EditorSession};
use gatecraft::model::{PortDirection, Rotation, WireEnd, WireKey};
use gatecraft::{Circuit, Component, GridPoint, Wire};
use pretty_assertions::assert_eq;

fn p(x: i32, y: i32) -> GridPoint {
    GridPoint::new(x, y)
}

fn commands() -> Vec<EditorCommand> {
    let wire = Wire::routed(
        Some("w".into()),
        WireEnd::attached("in", PortDirection::Output, 0, p(2, 1)),
        WireEnd::attached("g", PortDirection::Input, 1, p(8, 2)),
        &[p(5, 1)],
    );
    let tap = Wire::routed(
        Some("t".into()),
        WireEnd::detached(PortDirection::Output, p(5, 1)),
        WireEnd::attached("out", PortDirection::Input, 0, p(5, 9)),
        &[],
    );
    vec![
        EditorCommand::AddComponent {
            index: None,
            component: Box::new(Component::of_type("in", ComponentType::Input, p(0, 0))),
        },
        EditorCommand::AddComponent {
            index: None,
            component: Box::new(Component::of_type("g", ComponentType::OrGate, p(8, 0))),
        },
        EditorCommand::AddComponent {
            index: Some(0),
            component: Box::new(Component::of_type("out", ComponentType::Output, p(5, 8))),
        },
        EditorCommand::AddWire {
            index: None,
            wire: Box::new(wire),
            junctions: Vec::new(),
        },
        EditorCommand::TapWire {
            source: WireKey::Id("w".into()),
            at: p(5, 1),
            wire: Box::new(tap),
        },
        EditorCommand::MoveComponents {
            ids: vec!["g".into()],
            dx: 2,
            dy: 1,
        },
        EditorCommand::RotateComponents {
            ids: vec!["out".into()],
            clockwise: false,
        },
        EditorCommand::UpdateComponent {
            id: "g".into(),
            patch: ComponentPatch::kind(ComponentKind::OrGate(GateProps {
                inverted_inputs: vec![1],
                ..GateProps::default()
            })),
        },
        EditorCommand::MoveWirePoint {
            wire: WireKey::Id("w".into()),
            index: 0,
            to: p(2, 3),
        },
        EditorCommand::RemoveWire {
            key: WireKey::Id("w".into()),
        },
        EditorCommand::RemoveComponent { id: "in".into() },
    ]
}

#[test]
fn undo_all_then_redo_all_restores_each_state() {
    let mut circuit = Circuit::new("c", "main");
    let mut history = EditorHistory::new(100);
    let mut states = vec![circuit.clone()];
    for command in commands() {
        history
            .execute(&mut circuit, &command)
            .unwrap_or_else(|e| panic!("{}: {e}", command.description()));
        states.push(circuit.clone());
    }

    for expected in states.iter().rev().skip(1) {
        assert!(history.undo(&mut circuit));
        assert_eq!(&circuit, expected);
    }
    assert!(!history.undo(&mut circuit));

    for expected in states.iter().skip(1) {
        assert!(history.redo(&mut circuit));
        assert_eq!(&circuit, expected);
    }
    assert!(!history.redo(&mut circuit));
}

#[test]
fn group_is_one_undo_step() {
    let mut circuit = Circuit::new("c", "main");
    let mut history = EditorHistory::new(100);
    let before = circuit.clone();

    history.start_group("Place gates");
    for command in commands().into_iter().take(5) {
        history.execute(&mut circuit, &command).unwrap();
    }
    assert!(history.end_group());
    let placed = circuit.clone();

    assert_eq!(history.history_info().undo_count, 1);
    assert!(history.undo(&mut circuit));
    assert_eq!(circuit, before);
    assert!(history.redo(&mut circuit));
    assert_eq!(circuit, placed);
}

#[test]
fn session_delete_selection_restores_wires_and_junctions() {
    let mut session = EditorSession::new(EditorConfig::default().with_max_undo_levels(5));
    session.create_circuit("main");
    let input = session
        .add_component(ComponentType::Input.default_kind(), p(0, 0))
        .unwrap();
    let gate = session
        .add_component(ComponentType::AndGate.default_kind(), p(8, 0))
        .unwrap();
    let output = session
        .add_component(ComponentType::Output.default_kind(), p(4, 6))
        .unwrap();
    let trunk = session.connect((&input, 0), (&gate, 0), &[]).unwrap();
    session
        .tap_wire(WireKey::Id(trunk.clone()), p(4, 1), (&output, 0), &[])
        .unwrap();
    let report = session.validate().unwrap();
    assert!(report.valid, "{:?}", report.errors);
    assert_eq!(report.connections.len(), 2);

    let before = session.active_circuit().unwrap().clone();
    session.delete(&[input.clone()]).unwrap();
    let circuit = session.active_circuit().unwrap();
    assert!(circuit.component(&input).is_none());
    assert!(circuit.wire_by_id(&trunk).is_none());
    assert!(circuit.junctions.is_empty());

    assert!(session.undo());
    assert_eq!(session.active_circuit().unwrap(), &before);
}

#[test]
fn history_depth_is_bounded() {
    let mut session = EditorSession::new(EditorConfig::default().with_max_undo_levels(2));
    session.create_circuit("main");
    let id = session
        .add_component(ComponentType::Input.default_kind(), p(0, 0))
        .unwrap();
    for rotation in [Rotation::R90, Rotation::R180, Rotation::R270] {
        session
            .update_component(&id, ComponentPatch::rotation(rotation))
            .unwrap();
    }
    let info = session.history_info();
    assert_eq!(info.undo_count, 2);
    assert!(session.undo());
    assert!(session.undo());
    assert!(!session.undo());
    let rotation = session.active_circuit().unwrap().component(&id).unwrap().rotation;
    assert_eq!(rotation, Rotation::R90);
}
