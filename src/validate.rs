//! Circuit validation: wire geometry to netlist.
//!
//! Each wire's first and last points are resolved against component ports;
//! the cached [`WireEnd`](crate::model::WireEnd) descriptors are ignored.
//! Problems are collected per wire and never abort validation, so a
//! partially valid circuit still yields the connections that do resolve.

use crate::geometry::port_at;
use crate::model::{Circuit, ComponentMap, GridPoint, PortDirection, Wire, WireJunction};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WireEndKind {
    Start,
    End,
}

impl fmt::Display for WireEndKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WireEndKind::Start => "start",
            WireEndKind::End => "end",
        })
    }
}

/// A resolved source → destination port pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    /// Index of the wire this connection came from.
    pub wire_index: usize,
    pub wire_id: Option<String>,
    pub source: String,
    pub source_port: usize,
    pub dest: String,
    pub dest_port: usize,
}

impl Connection {
    /// Identity of the port pair, ignoring which wire produced it.
    pub fn key(&self) -> (&str, usize, &str, usize) {
        (&self.source, self.source_port, &self.dest, self.dest_port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("Wire {wire_index}: {end} position {pos} has no port")]
    UnresolvedEndpoint {
        wire_index: usize,
        end: WireEndKind,
        pos: GridPoint,
    },

    #[error("Wire {wire_index}: {end} position {pos} touches {candidates} ports")]
    AmbiguousEndpoint {
        wire_index: usize,
        end: WireEndKind,
        pos: GridPoint,
        candidates: usize,
    },

    #[error("Wire {wire_index}: both ends are {direction} ports")]
    SameDirection {
        wire_index: usize,
        direction: PortDirection,
    },

    #[error("Wire {wire_index}: connects component `{component_id}` to itself")]
    SelfLoop {
        wire_index: usize,
        component_id: String,
    },

    #[error("Wire {wire_index}: junction on wire {source_wire_index} does not lead to an output")]
    BrokenJunction {
        wire_index: usize,
        source_wire_index: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationWarning {
    #[error("Component `{component_id}` input {port} ({name}) is not connected")]
    UnconnectedInput {
        component_id: String,
        port: usize,
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    /// Connections of every wire that passed, in wire order.
    pub connections: Vec<Connection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PortRef {
    component_id: String,
    direction: PortDirection,
    index: usize,
}

struct Resolver<'a> {
    components: &'a ComponentMap,
    wires: &'a [Wire],
    junctions: &'a [WireJunction],
}

impl Resolver<'_> {
    fn resolve_end(&self, wire_index: usize, end: WireEndKind, pos: GridPoint) -> Result<PortRef, ValidationError> {
        let hits = port_at(pos, self.components.values());
        match hits.as_slice() {
            [] => Err(ValidationError::UnresolvedEndpoint { wire_index, end, pos }),
            [hit] => Ok(PortRef {
                component_id: hit.component.id.clone(),
                direction: hit.port_type,
                index: hit.port_index,
            }),
            many => Err(ValidationError::AmbiguousEndpoint {
                wire_index,
                end,
                pos,
                candidates: many.len(),
            }),
        }
    }

    fn pair(&self, wire_index: usize, a: PortRef, b: PortRef) -> Result<Connection, Vec<ValidationError>> {
        if a.direction == b.direction {
            return Err(vec![ValidationError::SameDirection {
                wire_index,
                direction: a.direction,
            }]);
        }
        let (source, dest) = match a.direction {
            PortDirection::Output => (a, b),
            PortDirection::Input => (b, a),
        };
        if source.component_id == dest.component_id {
            return Err(vec![ValidationError::SelfLoop {
                wire_index,
                component_id: source.component_id,
            }]);
        }
        Ok(Connection {
            wire_index,
            wire_id: self.wires[wire_index].id.clone(),
            source: source.component_id,
            source_port: source.index,
            dest: dest.component_id,
            dest_port: dest.index,
        })
    }

    fn resolve_wire(&self, wire_index: usize, depth: usize) -> Result<Connection, Vec<ValidationError>> {
        let wire = &self.wires[wire_index];
        let tap = wire
            .id
            .as_deref()
            .and_then(|id| self.junctions.iter().find(|j| j.connected_wire_id == id));
        match tap {
            Some(junction) => self.resolve_tap(wire_index, wire, junction, depth),
            None => self.resolve_direct(wire_index, wire),
        }
    }

    fn resolve_direct(&self, wire_index: usize, wire: &Wire) -> Result<Connection, Vec<ValidationError>> {
        let start = self.resolve_end(wire_index, WireEndKind::Start, wire.start_point());
        let end = self.resolve_end(wire_index, WireEndKind::End, wire.end_point());
        match (start, end) {
            (Ok(a), Ok(b)) => self.pair(wire_index, a, b),
            (a, b) => Err(a.err().into_iter().chain(b.err()).collect()),
        }
    }

    /// A tapping wire inherits the source port of the wire it taps; only its
    /// far end is resolved geometrically.
    fn resolve_tap(
        &self,
        wire_index: usize,
        wire: &Wire,
        junction: &WireJunction,
        depth: usize,
    ) -> Result<Connection, Vec<ValidationError>> {
        let broken = || {
            vec![ValidationError::BrokenJunction {
                wire_index,
                source_wire_index: junction.source_wire_index,
            }]
        };
        if depth >= self.junctions.len()
            || junction.source_wire_index >= self.wires.len()
            || junction.source_wire_index == wire_index
        {
            return Err(broken());
        }
        let upstream = self
            .resolve_wire(junction.source_wire_index, depth + 1)
            .map_err(|_| broken())?;
        let source = PortRef {
            component_id: upstream.source,
            direction: PortDirection::Output,
            index: upstream.source_port,
        };
        let (end, pos) = if wire.start_point() == junction.pos {
            (WireEndKind::End, wire.end_point())
        } else {
            (WireEndKind::Start, wire.start_point())
        };
        let far = self.resolve_end(wire_index, end, pos).map_err(|e| vec![e])?;
        self.pair(wire_index, source, far)
    }
}

fn unconnected_inputs(components: &ComponentMap, connections: &[Connection]) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    for component in components.values() {
        let layout = crate::geometry::connections_for(&component.kind);
        for (port, local) in layout.inputs.iter().enumerate() {
            let connected = connections
                .iter()
                .any(|c| c.dest == component.id && c.dest_port == port);
            if !connected {
                warnings.push(ValidationWarning::UnconnectedInput {
                    component_id: component.id.clone(),
                    port,
                    name: local.name.clone(),
                });
            }
        }
    }
    warnings
}

/// Validate wires against components, resolving junction taps.
///
/// Pure: the inputs are only read, so calling this repeatedly is safe.
pub fn validate(components: &ComponentMap, wires: &[Wire], junctions: &[WireJunction]) -> ValidationReport {
    let resolver = Resolver {
        components,
        wires,
        junctions,
    };
    let mut errors = Vec::new();
    let mut connections = Vec::new();
    for wire_index in 0..wires.len() {
        match resolver.resolve_wire(wire_index, 0) {
            Ok(connection) => connections.push(connection),
            Err(mut wire_errors) => errors.append(&mut wire_errors),
        }
    }
    let warnings = unconnected_inputs(components, &connections);
    log::debug!(
        "validated {} wire(s): {} connection(s), {} error(s), {} warning(s)",
        wires.len(),
        connections.len(),
        errors.len(),
        warnings.len()
    );
    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
        connections,
    }
}

pub fn validate_circuit(circuit: &Circuit) -> ValidationReport {
    validate(&circuit.components, &circuit.wires, &circuit.junctions)
}

/// Connections of the wires that pass validation, in wire order.
pub fn valid_connections(components: &ComponentMap, wires: &[Wire], junctions: &[WireJunction]) -> Vec<Connection> {
    validate(components, wires, junctions).connections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentType};
    use crate::model::WireEnd;

    fn p(x: i32, y: i32) -> GridPoint {
        GridPoint::new(x, y)
    }

    fn wire(id: Option<&str>, from: GridPoint, to: GridPoint) -> Wire {
        Wire::routed(
            id.map(str::to_string),
            WireEnd::detached(PortDirection::Output, from),
            WireEnd::detached(PortDirection::Input, to),
            &[],
        )
    }

    fn circuit_with(components: &[(&str, ComponentType, (i32, i32))]) -> Circuit {
        let mut circuit = Circuit::new("c", "main");
        for &(id, ty, pos) in components {
            circuit
                .insert_component(None, Component::of_type(id, ty, pos.into()))
                .unwrap();
        }
        circuit
    }

    #[test]
    fn single_wire_resolves_to_connection() {
        let mut circuit = circuit_with(&[
            ("compA", ComponentType::Input, (5, 5)),
            ("compB", ComponentType::AndGate, (10, 6)),
        ]);
        circuit.wires.push(wire(None, p(7, 6), p(10, 6)));
        let connections = valid_connections(&circuit.components, &circuit.wires, &circuit.junctions);
        assert_eq!(
            connections,
            vec![Connection {
                wire_index: 0,
                wire_id: None,
                source: "compA".into(),
                source_port: 0,
                dest: "compB".into(),
                dest_port: 0,
            }]
        );
    }

    #[test]
    fn reversed_wire_is_oriented_output_first() {
        let mut circuit = circuit_with(&[
            ("a", ComponentType::Input, (5, 5)),
            ("g", ComponentType::AndGate, (10, 6)),
        ]);
        circuit.wires.push(wire(Some("w"), p(10, 8), p(7, 6)));
        let report = validate_circuit(&circuit);
        assert!(report.valid);
        assert_eq!(report.connections[0].source, "a");
        assert_eq!(report.connections[0].dest, "g");
        assert_eq!(report.connections[0].dest_port, 1);
        assert_eq!(report.connections[0].wire_id.as_deref(), Some("w"));
    }

    #[test]
    fn unresolved_ends_are_both_reported() {
        let mut circuit = circuit_with(&[("a", ComponentType::Input, (0, 0))]);
        circuit.wires.push(wire(None, p(20, 20), p(30, 20)));
        let report = validate_circuit(&circuit);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(
            report.errors[0],
            ValidationError::UnresolvedEndpoint {
                wire_index: 0,
                end: WireEndKind::Start,
                pos: p(20, 20),
            }
        );
        assert_eq!(
            report.errors[0].to_string(),
            "Wire 0: start position (20, 20) has no port"
        );
    }

    #[test]
    fn shared_vertex_is_ambiguous() {
        let mut circuit = circuit_with(&[
            ("a", ComponentType::AndGate, (0, 0)),
            ("b", ComponentType::AndGate, (3, 1)),
            ("out", ComponentType::Output, (10, 0)),
        ]);
        circuit.wires.push(wire(None, p(3, 1), p(10, 1)));
        let report = validate_circuit(&circuit);
        assert!(matches!(
            report.errors.as_slice(),
            [ValidationError::AmbiguousEndpoint { candidates: 2, end: WireEndKind::Start, .. }]
        ));
        assert!(report.connections.is_empty());
    }

    #[test]
    fn same_direction_and_self_loop() {
        let mut circuit = circuit_with(&[
            ("a", ComponentType::Input, (0, 0)),
            ("b", ComponentType::Input, (0, 4)),
            ("g", ComponentType::AndGate, (10, 0)),
        ]);
        circuit.wires.push(wire(None, p(2, 1), p(2, 5)));
        circuit.wires.push(wire(None, p(13, 1), p(10, 0)));
        let report = validate_circuit(&circuit);
        assert_eq!(
            report.errors,
            vec![
                ValidationError::SameDirection {
                    wire_index: 0,
                    direction: PortDirection::Output,
                },
                ValidationError::SelfLoop {
                    wire_index: 1,
                    component_id: "g".into(),
                },
            ]
        );
    }

    #[test]
    fn valid_wires_survive_invalid_neighbours() {
        let mut circuit = circuit_with(&[
            ("a", ComponentType::Input, (5, 5)),
            ("g", ComponentType::AndGate, (10, 6)),
        ]);
        circuit.wires.push(wire(None, p(50, 50), p(60, 50)));
        circuit.wires.push(wire(Some("ok"), p(7, 6), p(10, 6)));
        let report = validate_circuit(&circuit);
        assert!(!report.valid);
        assert_eq!(report.connections.len(), 1);
        assert_eq!(report.connections[0].wire_index, 1);
    }

    #[test]
    fn junction_tap_inherits_source() {
        let mut circuit = circuit_with(&[
            ("a", ComponentType::Input, (0, 0)),
            ("o1", ComponentType::Output, (10, 0)),
            ("o2", ComponentType::Output, (10, 4)),
        ]);
        let mut trunk = wire(Some("trunk"), p(2, 1), p(10, 1));
        crate::routing::insert_vertex(&mut trunk.points, p(5, 1));
        circuit.wires.push(trunk);
        circuit.wires.push(wire(Some("tap"), p(5, 1), p(10, 5)));
        circuit.junctions.push(WireJunction {
            pos: p(5, 1),
            source_wire_index: 0,
            connected_wire_id: "tap".into(),
        });
        let report = validate_circuit(&circuit);
        assert!(report.valid, "{:?}", report.errors);
        let pairs: Vec<_> = report
            .connections
            .iter()
            .map(|c| (c.source.as_str(), c.dest.as_str(), c.wire_id.as_deref()))
            .collect();
        assert_eq!(pairs, vec![("a", "o1", Some("trunk")), ("a", "o2", Some("tap"))]);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn junction_cycle_is_broken() {
        let mut circuit = circuit_with(&[("o", ComponentType::Output, (10, 0))]);
        circuit.wires.push(wire(Some("x"), p(5, 5), p(10, 1)));
        circuit.wires.push(wire(Some("y"), p(5, 5), p(10, 1)));
        circuit.junctions.push(WireJunction {
            pos: p(5, 5),
            source_wire_index: 1,
            connected_wire_id: "x".into(),
        });
        circuit.junctions.push(WireJunction {
            pos: p(5, 5),
            source_wire_index: 0,
            connected_wire_id: "y".into(),
        });
        let report = validate_circuit(&circuit);
        assert_eq!(report.errors.len(), 2);
        assert!(report
            .errors
            .iter()
            .all(|e| matches!(e, ValidationError::BrokenJunction { .. })));
    }

    #[test]
    fn unconnected_inputs_are_warnings() {
        let mut circuit = circuit_with(&[
            ("a", ComponentType::Input, (5, 5)),
            ("g", ComponentType::AndGate, (10, 6)),
        ]);
        circuit.wires.push(wire(None, p(7, 6), p(10, 6)));
        let report = validate_circuit(&circuit);
        assert!(report.valid);
        assert_eq!(
            report.warnings,
            vec![ValidationWarning::UnconnectedInput {
                component_id: "g".into(),
                port: 1,
                name: "1".into(),
            }]
        );
    }

    #[test]
    fn validation_is_repeatable() {
        let mut circuit = circuit_with(&[
            ("a", ComponentType::Input, (5, 5)),
            ("g", ComponentType::AndGate, (10, 6)),
        ]);
        circuit.wires.push(wire(None, p(7, 6), p(10, 6)));
        let before = circuit.clone();
        let first = validate_circuit(&circuit);
        let second = validate_circuit(&circuit);
        assert_eq!(first, second);
        assert_eq!(circuit, before);
    }
}
