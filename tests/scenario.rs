use gatecraft::generator::generate_circuit;
use gatecraft::model::CircuitDoc;
use gatecraft::routing::route;
use gatecraft::validate::validate_circuit;
use gatecraft::GridPoint;
use pretty_assertions::assert_eq;

const DOC: &str = r#"{
  "version": 1,
  "active": "main",
  "circuits": [
    {
      "id": "main",
      "name": "Main",
      "components": [
        {"id": "a", "kind": {"type": "input", "props": {}}, "position": {"x": 5, "y": 5}},
        {"id": "g", "kind": {"type": "and-gate", "props": {}}, "position": {"x": 10, "y": 5}}
      ],
      "wires": [
        {
          "id": "w1",
          "points": [{"x": 7, "y": 6}, {"x": 10, "y": 6}, {"x": 10, "y": 5}],
          "start": {"component_id": "a", "port_index": 0, "port_type": "output", "pos": {"x": 7, "y": 6}},
          "end": {"component_id": "g", "port_index": 0, "port_type": "input", "pos": {"x": 10, "y": 5}}
        }
      ]
    }
  ]
}"#;

#[test]
fn input_to_and_gate() {
    let doc = CircuitDoc::from_json_str(DOC).expect("parse document");
    let circuit = doc.active_circuit().expect("active circuit");

    let report = validate_circuit(circuit);
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.connections.len(), 1);
    let connection = &report.connections[0];
    assert_eq!(connection.key(), ("a", 0, "g", 0));
    assert_eq!(connection.wire_id.as_deref(), Some("w1"));

    let program = generate_circuit(circuit);
    assert_eq!(
        program.code,
        "from ggl import circuit, io, logic\n\
         \n\
         circuit0 = circuit.Circuit(js_logging=True)\n\
         \n\
         input0 = io.Input(js_id=\"a\")\n\
         input0.value = 0\n\
         and0 = logic.And(js_id=\"g\")\n\
         \n\
         circuit0.connect(input0, and0.input(\"0\"), js_id=\"w1\")\n\
         \n\
         circuit0.run()\n"
    );
}

#[test]
fn stored_path_matches_router() {
    let doc = CircuitDoc::from_json_str(DOC).unwrap();
    let wire = &doc.circuits[0].wires[0];
    assert_eq!(wire.points, route(GridPoint::new(7, 6), GridPoint::new(10, 5), &[]));
}

#[test]
fn validation_ignores_stale_descriptors() {
    let mut doc = CircuitDoc::from_json_str(DOC).unwrap();
    let wire = &mut doc.circuits[0].wires[0];
    wire.end.component_id = Some("nowhere".into());
    wire.end.port_index = 7;
    let report = validate_circuit(&doc.circuits[0]);
    assert!(report.valid);
    assert_eq!(report.connections[0].key(), ("a", 0, "g", 0));
}

#[test]
fn moved_endpoint_invalidates_wire() {
    let mut doc = CircuitDoc::from_json_str(DOC).unwrap();
    let circuit = &mut doc.circuits[0];
    circuit.wires[0].points.push(GridPoint::new(10, 4));
    let report = validate_circuit(circuit);
    assert!(!report.valid);
    assert!(report.connections.is_empty());
    assert_eq!(
        report.errors[0].to_string(),
        "Wire 0: end position (10, 4) has no port"
    );
    assert!(generate_circuit(circuit).code.lines().all(|l| !l.contains("connect")));
}
