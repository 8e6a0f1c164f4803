//! Copy, paste and duplicate support.
//!
//! [`copy`] captures a selection with positions relative to its bounding
//! box; [`instantiate`] turns captured elements into fresh, placeable ones
//! with new ids. Placing them is an [`EditorCommand::Paste`] or
//! [`EditorCommand::Duplicate`](super::EditorCommand::Duplicate).
//!
//! [`EditorCommand::Paste`]: super::EditorCommand::Paste

use crate::component::Component;
use crate::geometry::{port_at, world_bounds};
use crate::model::{Circuit, GridPoint, Wire, WireJunction};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A set of components with the wires and junctions among them.
///
/// Junction `source_wire_index` values index into `wires`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardElements {
    pub components: Vec<Component>,
    pub wires: Vec<Wire>,
    pub junctions: Vec<WireJunction>,
}

impl ClipboardElements {
    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.wires.is_empty()
    }

    fn translate(&mut self, dx: i32, dy: i32) {
        for component in &mut self.components {
            component.position = component.position.offset(dx, dy);
        }
        for wire in &mut self.wires {
            wire.translate(dx, dy);
        }
        for junction in &mut self.junctions {
            junction.pos = junction.pos.offset(dx, dy);
        }
    }
}

/// Deterministic id source: `<prefix>-<kind>-<n>`, skipping ids already in
/// use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdGenerator {
    prefix: String,
    next: usize,
}

impl IdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }

    pub fn next_id(&mut self, kind: &str, taken: impl Fn(&str) -> bool) -> String {
        loop {
            self.next += 1;
            let id = format!("{}-{kind}-{}", self.prefix, self.next);
            if !taken(&id) {
                return id;
            }
        }
    }

    /// A component id unused in `circuit`.
    pub fn component_id(&mut self, circuit: &Circuit) -> String {
        self.next_id("comp", |id| circuit.components.contains_key(id))
    }

    /// A wire id unused in `circuit`.
    pub fn wire_id(&mut self, circuit: &Circuit) -> String {
        self.next_id("wire", |id| circuit.wire_by_id(id).is_some())
    }
}

fn on_selected_port(point: GridPoint, selected: &[&Component]) -> bool {
    !port_at(point, selected.iter().copied()).is_empty()
}

/// Top-left corner of the bounding box of the components named in `ids`.
pub fn selection_origin(circuit: &Circuit, ids: &[String]) -> Option<GridPoint> {
    ids.iter()
        .filter_map(|id| circuit.component(id))
        .map(|c| world_bounds(c).0)
        .reduce(|a, b| GridPoint::new(a.x.min(b.x), a.y.min(b.y)))
}

/// Capture `ids` from `circuit`.
///
/// A wire is captured when both of its ends sit on ports of selected
/// components, or when it taps a captured wire and its far end sits on a
/// selected port. Positions become relative to the selection's top-left
/// corner.
pub fn copy(circuit: &Circuit, ids: &[String]) -> ClipboardElements {
    let selected: Vec<&Component> = circuit
        .components
        .values()
        .filter(|c| ids.contains(&c.id))
        .collect();
    let Some(origin) = selection_origin(circuit, ids) else {
        return ClipboardElements::default();
    };

    let mut captured: Vec<usize> = Vec::new();
    for (index, wire) in circuit.wires.iter().enumerate() {
        let start = on_selected_port(wire.start_point(), &selected);
        let end = on_selected_port(wire.end_point(), &selected);
        if start && end {
            captured.push(index);
        }
    }
    // Taps of captured wires, repeated until no more are found.
    loop {
        let mut grew = false;
        for junction in &circuit.junctions {
            let Some((tap_index, tap)) = circuit.wire_by_id(&junction.connected_wire_id) else {
                continue;
            };
            if captured.contains(&tap_index) || !captured.contains(&junction.source_wire_index) {
                continue;
            }
            let far = if tap.start_point() == junction.pos { tap.end_point() } else { tap.start_point() };
            if on_selected_port(far, &selected) {
                captured.push(tap_index);
                grew = true;
            }
        }
        if !grew {
            break;
        }
    }
    captured.sort_unstable();

    let mut elements = ClipboardElements {
        components: selected.into_iter().cloned().collect(),
        wires: captured.iter().map(|&i| circuit.wires[i].clone()).collect(),
        junctions: Vec::new(),
    };
    for junction in &circuit.junctions {
        let source = captured.iter().position(|&i| i == junction.source_wire_index);
        let tap_captured = elements.wires.iter().any(|w| w.has_id(&junction.connected_wire_id));
        if let (Some(source), true) = (source, tap_captured) {
            elements.junctions.push(WireJunction {
                source_wire_index: source,
                ..junction.clone()
            });
        }
    }
    elements.translate(-origin.x, -origin.y);
    log::debug!(
        "copied {} component(s), {} wire(s), {} junction(s)",
        elements.components.len(),
        elements.wires.len(),
        elements.junctions.len()
    );
    elements
}

/// Give captured elements fresh ids (unique in `circuit`) and place them
/// with their top-left corner at `origin`.
pub fn instantiate(
    elements: &ClipboardElements,
    origin: GridPoint,
    ids: &mut IdGenerator,
    circuit: &Circuit,
) -> ClipboardElements {
    let mut placed = elements.clone();
    let mut component_ids: HashMap<String, String> = HashMap::new();
    for component in &mut placed.components {
        let fresh = ids.next_id("comp", |id| {
            circuit.components.contains_key(id) || component_ids.values().any(|v| v == id)
        });
        component_ids.insert(component.id.clone(), fresh.clone());
        component.id = fresh;
    }

    let mut wire_ids: HashMap<String, String> = HashMap::new();
    let mut taken_wires: Vec<String> = Vec::new();
    for wire in &mut placed.wires {
        let fresh = ids.next_id("wire", |id| {
            circuit.wire_by_id(id).is_some() || taken_wires.iter().any(|t| t == id)
        });
        if let Some(old) = wire.id.replace(fresh.clone()) {
            wire_ids.insert(old, fresh.clone());
        }
        taken_wires.push(fresh);
        for end in [&mut wire.start, &mut wire.end] {
            end.component_id = end
                .component_id
                .as_ref()
                .and_then(|id| component_ids.get(id).cloned());
        }
    }
    placed.junctions.retain_mut(|junction| match wire_ids.get(&junction.connected_wire_id) {
        Some(fresh) => {
            junction.connected_wire_id = fresh.clone();
            true
        }
        None => false,
    });

    placed.translate(origin.x, origin.y);
    placed
}
