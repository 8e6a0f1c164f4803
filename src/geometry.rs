//! Port geometry: where a component's ports sit on the grid.
//!
//! [`connections_for`] gives local positions, [`world_ports_for`] rotates and
//! translates them, and [`port_at`] finds every port at a grid point. All
//! arithmetic is integer; rotation uses exact quarter-turn matrices.

use crate::component::{Component, ComponentKind};
use crate::model::{Circuit, GridPoint, PortDirection, WireEnd};
use crate::registry::{self, LocalPort, PortLayout};

/// Local port layout of a kind, including per-port flag offsets.
///
/// An inverted gate input is moved one unit away from the body to leave room
/// for its bubble.
pub fn connections_for(kind: &ComponentKind) -> PortLayout {
    let mut layout = registry::port_layout(kind);
    if let Some(gate) = kind.gate_props() {
        for (index, port) in layout.inputs.iter_mut().enumerate() {
            if gate.is_inverted(index) {
                port.x -= 1;
            }
        }
    }
    layout
}

impl PortLayout {
    pub fn ports(&self, direction: PortDirection) -> &[LocalPort] {
        match direction {
            PortDirection::Input => &self.inputs,
            PortDirection::Output => &self.outputs,
        }
    }

    pub fn count(&self, direction: PortDirection) -> usize {
        self.ports(direction).len()
    }

    /// Rotation pivot: the first output, else the first input, else the
    /// origin.
    pub fn pivot(&self) -> GridPoint {
        self.outputs
            .first()
            .or_else(|| self.inputs.first())
            .map(|p| GridPoint::new(p.x, p.y))
            .unwrap_or_default()
    }
}

/// A port resolved to world coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldPort {
    pub component_id: String,
    pub direction: PortDirection,
    pub index: usize,
    pub name: String,
    pub pos: GridPoint,
}

fn to_world(component: &Component, pivot: GridPoint, port: &LocalPort) -> GridPoint {
    let local = component
        .rotation
        .rotate_about(GridPoint::new(port.x, port.y), pivot);
    local.offset(component.position.x, component.position.y)
}

/// All ports of a component in world coordinates, outputs first.
pub fn world_ports_for(component: &Component) -> Vec<WorldPort> {
    let layout = connections_for(&component.kind);
    let pivot = layout.pivot();
    let mut ports = Vec::with_capacity(layout.inputs.len() + layout.outputs.len());
    for direction in [PortDirection::Output, PortDirection::Input] {
        for (index, port) in layout.ports(direction).iter().enumerate() {
            ports.push(WorldPort {
                component_id: component.id.clone(),
                direction,
                index,
                name: port.name.clone(),
                pos: to_world(component, pivot, port),
            });
        }
    }
    ports
}

/// One port in world coordinates.
pub fn world_port(component: &Component, direction: PortDirection, index: usize) -> Option<WorldPort> {
    world_ports_for(component)
        .into_iter()
        .find(|p| p.direction == direction && p.index == index)
}

/// World-space bounding box `(min, max)` of a component body.
pub fn world_bounds(component: &Component) -> (GridPoint, GridPoint) {
    let (w, h) = registry::dimensions(&component.kind);
    let pivot = connections_for(&component.kind).pivot();
    let corners = [(0, 0), (w, 0), (0, h), (w, h)].map(|(x, y)| {
        component
            .rotation
            .rotate_about(GridPoint::new(x, y), pivot)
            .offset(component.position.x, component.position.y)
    });
    let min = GridPoint::new(
        corners.iter().map(|p| p.x).min().unwrap_or_default(),
        corners.iter().map(|p| p.y).min().unwrap_or_default(),
    );
    let max = GridPoint::new(
        corners.iter().map(|p| p.x).max().unwrap_or_default(),
        corners.iter().map(|p| p.y).max().unwrap_or_default(),
    );
    (min, max)
}

/// A port found at a queried point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortHit<'a> {
    pub component: &'a Component,
    pub port_type: PortDirection,
    pub port_index: usize,
    pub name: String,
}

/// Every port located exactly at `point`. Several hits are possible when
/// ports share a grid vertex; all of them are returned.
pub fn port_at<'a, I>(point: GridPoint, components: I) -> Vec<PortHit<'a>>
where
    I: IntoIterator<Item = &'a Component>,
{
    ports_at(point, components, None)
}

/// Like [`port_at`], optionally restricted to one direction.
pub fn ports_at<'a, I>(
    point: GridPoint,
    components: I,
    direction: Option<PortDirection>,
) -> Vec<PortHit<'a>>
where
    I: IntoIterator<Item = &'a Component>,
{
    let mut hits = Vec::new();
    for component in components {
        for port in world_ports_for(component) {
            if port.pos != point || direction.is_some_and(|d| d != port.direction) {
                continue;
            }
            hits.push(PortHit {
                component,
                port_type: port.direction,
                port_index: port.index,
                name: port.name,
            });
        }
    }
    hits
}

/// Closest port within `max_distance` (Manhattan) of `point`, used to snap
/// a dragged wire end. Ties go to the first component in iteration order.
pub fn nearest_port<'a, I>(
    point: GridPoint,
    components: I,
    direction: Option<PortDirection>,
    max_distance: i32,
) -> Option<(PortHit<'a>, GridPoint)>
where
    I: IntoIterator<Item = &'a Component>,
{
    let mut best: Option<(i32, PortHit<'a>, GridPoint)> = None;
    for component in components {
        for port in world_ports_for(component) {
            if direction.is_some_and(|d| d != port.direction) {
                continue;
            }
            let distance = port.pos.manhattan(point);
            if distance > max_distance || best.as_ref().is_some_and(|(d, _, _)| *d <= distance) {
                continue;
            }
            best = Some((
                distance,
                PortHit {
                    component,
                    port_type: port.direction,
                    port_index: port.index,
                    name: port.name,
                },
                port.pos,
            ));
        }
    }
    best.map(|(_, hit, pos)| (hit, pos))
}

/// Rewrite every wire's cached end descriptors from its geometry. An end
/// that resolves to exactly one port is attached to it; anything else is
/// detached. Returns the number of descriptors that changed.
pub fn reconcile_wire_ends(circuit: &mut Circuit) -> usize {
    let changed: usize = (0..circuit.wires.len())
        .map(|index| reconcile_wire(circuit, index))
        .sum();
    if changed > 0 {
        log::debug!("reconciled {changed} wire end descriptor(s) in circuit `{}`", circuit.id);
    }
    changed
}

/// Reconcile the descriptors of one wire. Returns how many of its two ends
/// changed.
pub fn reconcile_wire(circuit: &mut Circuit, index: usize) -> usize {
    let Some(wire) = circuit.wires.get(index) else {
        return 0;
    };
    let start = describe_end(circuit, wire.start_point(), wire.start.port_type);
    let end = describe_end(circuit, wire.end_point(), wire.end.port_type);
    let wire = &mut circuit.wires[index];
    let changed = usize::from(wire.start != start) + usize::from(wire.end != end);
    wire.start = start;
    wire.end = end;
    changed
}

fn describe_end(circuit: &Circuit, point: GridPoint, fallback: PortDirection) -> WireEnd {
    let hits = port_at(point, circuit.components.values());
    match hits.as_slice() {
        [hit] => WireEnd::attached(hit.component.id.clone(), hit.port_type, hit.port_index, point),
        _ => WireEnd::detached(fallback, point),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentType, GateProps};
    use crate::model::{Rotation, Wire};

    fn gate(id: &str, x: i32, y: i32) -> Component {
        Component::of_type(id, ComponentType::AndGate, GridPoint::new(x, y))
    }

    fn positions(component: &Component) -> Vec<GridPoint> {
        world_ports_for(component).into_iter().map(|p| p.pos).collect()
    }

    #[test]
    fn unrotated_ports_are_translated() {
        let g = gate("g", 10, 5);
        assert_eq!(
            positions(&g),
            vec![GridPoint::new(13, 6), GridPoint::new(10, 5), GridPoint::new(10, 7)]
        );
    }

    #[test]
    fn rotation_turns_about_first_output() {
        let g = gate("g", 0, 0).with_rotation(Rotation::R90);
        // pivot (3,1); input (0,0) -> offset (-3,-1) -> (1,-3) -> (4,-2)
        let ports = world_ports_for(&g);
        assert_eq!(ports[0].pos, GridPoint::new(3, 1));
        assert_eq!(ports[1].pos, GridPoint::new(4, -2));
        assert_eq!(ports[2].pos, GridPoint::new(2, -2));
    }

    #[test]
    fn full_turn_restores_every_port() {
        for ty in ComponentType::ALL {
            let base = Component::of_type("c", ty, GridPoint::new(7, -3));
            let expected = positions(&base);
            let mut turned = base.clone();
            for _ in 0..4 {
                turned.rotation = turned.rotation.clockwise();
            }
            assert_eq!(positions(&turned), expected, "{ty}");
        }
    }

    #[test]
    fn inverted_input_is_offset_before_rotation() {
        let mut props = GateProps::default();
        props.inverted_inputs = vec![1];
        let g = Component::new("g", ComponentKind::NandGate(props), GridPoint::new(0, 0));
        let layout = connections_for(&g.kind);
        assert_eq!((layout.inputs[0].x, layout.inputs[1].x), (0, -1));

        let turned = g.with_rotation(Rotation::R180);
        // pivot (3,1); (-1,2) -> offset (-4,1) -> (4,-1) -> (7,0)
        assert_eq!(world_port(&turned, PortDirection::Input, 1).unwrap().pos, GridPoint::new(7, 0));
    }

    #[test]
    fn output_pin_pivots_on_its_input() {
        let out = Component::of_type("o", ComponentType::Output, GridPoint::new(4, 4))
            .with_rotation(Rotation::R270);
        assert_eq!(positions(&out), vec![GridPoint::new(4, 5)]);
    }

    #[test]
    fn port_at_reports_every_match() {
        let a = gate("a", 0, 0); // output at (3,1)
        let b = gate("b", 3, 1); // input 0 at (3,1)
        let comps = [a, b];
        let hits = port_at(GridPoint::new(3, 1), comps.iter());
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].component.id, "a");
        assert_eq!(hits[0].port_type, PortDirection::Output);
        assert_eq!(hits[1].component.id, "b");
        assert_eq!(hits[1].port_type, PortDirection::Input);

        let only_inputs = ports_at(GridPoint::new(3, 1), comps.iter(), Some(PortDirection::Input));
        assert_eq!(only_inputs.len(), 1);
        assert!(port_at(GridPoint::new(50, 50), comps.iter()).is_empty());
    }

    #[test]
    fn nearest_port_snaps_within_range() {
        let comps = [gate("a", 0, 0)];
        let (hit, pos) = nearest_port(GridPoint::new(4, 1), comps.iter(), None, 2).unwrap();
        assert_eq!(hit.port_type, PortDirection::Output);
        assert_eq!(pos, GridPoint::new(3, 1));
        assert!(nearest_port(GridPoint::new(20, 20), comps.iter(), None, 2).is_none());
    }

    #[test]
    fn bounds_follow_rotation() {
        let g = gate("g", 0, 0);
        assert_eq!(world_bounds(&g), (GridPoint::new(0, 0), GridPoint::new(3, 2)));
        let turned = g.with_rotation(Rotation::R90);
        let (min, max) = world_bounds(&turned);
        assert_eq!((max.x - min.x, max.y - min.y), (2, 3));
    }

    #[test]
    fn reconcile_attaches_resolvable_ends() {
        let mut circuit = Circuit::new("c", "main");
        circuit
            .insert_component(None, Component::of_type("in", ComponentType::Input, GridPoint::new(5, 5)))
            .unwrap();
        circuit.insert_component(None, gate("g", 10, 5)).unwrap();
        let wire = Wire::routed(
            None,
            WireEnd::detached(PortDirection::Output, GridPoint::new(7, 6)),
            WireEnd::detached(PortDirection::Input, GridPoint::new(10, 5)),
            &[],
        );
        circuit.insert_wire(None, wire).unwrap();

        assert_eq!(reconcile_wire_ends(&mut circuit), 2);
        let w = &circuit.wires[0];
        assert_eq!(w.start.component_id.as_deref(), Some("in"));
        assert_eq!(w.end.component_id.as_deref(), Some("g"));
        assert_eq!(reconcile_wire_ends(&mut circuit), 0);
    }
}
