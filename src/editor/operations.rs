//! Reversible editing commands.
//!
//! Every change to a circuit is an [`EditorCommand`]. [`apply`] performs it
//! and returns the command that reverses it, computed from the state just
//! before the change. Applying that inverse hands back the forward command
//! again, so undo and redo are the same operation pointed in opposite
//! directions.
//!
//! # Design
//!
//! Commands carry ids and indices, never references: a command is looked up
//! against the live circuit each time it is applied. Preconditions are
//! checked before anything is touched, so a rejected command leaves the
//! circuit as it was. Geometry-changing commands (moves, rotations, wire
//! drags) capture the affected wires and junctions and invert to an exact
//! [`EditorCommand::SetGeometry`] restore.

use super::clipboard::ClipboardElements;
use crate::component::{Component, ComponentKind};
use crate::error::{CircuitError, CommandError};
use crate::geometry::{port_at, reconcile_wire, world_port};
use crate::model::{Circuit, GridPoint, PortDirection, Rotation, Wire, WireJunction, WireKey};
use crate::routing::{insert_vertex, move_point, path_position, refresh_junctions};
use std::collections::{BTreeMap, BTreeSet, HashSet};

// ────────────────────────────────────────────────────────────────────────────
// Command data
// ────────────────────────────────────────────────────────────────────────────

/// Fields to overwrite on a component. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentPatch {
    pub position: Option<GridPoint>,
    pub rotation: Option<Rotation>,
    /// Replacement properties; must keep the component's type.
    pub kind: Option<ComponentKind>,
}

impl ComponentPatch {
    pub fn position(position: GridPoint) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn rotation(rotation: Rotation) -> Self {
        Self {
            rotation: Some(rotation),
            ..Self::default()
        }
    }

    pub fn kind(kind: ComponentKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.rotation.is_none() && self.kind.is_none()
    }
}

/// Exact positions to restore: component placement, whole wires by index
/// and junctions by index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Geometry {
    pub components: Vec<(String, GridPoint, Rotation)>,
    pub wires: Vec<(usize, Wire)>,
    pub junctions: Vec<(usize, WireJunction)>,
}

/// A single undoable editor operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCommand {
    /// Insert a component at `index` in declaration order (end if `None`).
    AddComponent {
        index: Option<usize>,
        component: Box<Component>,
    },
    /// Remove a component. Wires attached to it are left in place; see
    /// [`delete_components`] for removing both.
    RemoveComponent { id: String },
    UpdateComponent { id: String, patch: ComponentPatch },
    /// Translate components; wire ends sitting on their ports follow.
    MoveComponents { ids: Vec<String>, dx: i32, dy: i32 },
    /// Turn components a quarter turn; wire ends sitting on their ports
    /// follow.
    RotateComponents { ids: Vec<String>, clockwise: bool },
    /// Insert a wire, then re-insert `junctions` at their recorded indices.
    AddWire {
        index: Option<usize>,
        wire: Box<Wire>,
        junctions: Vec<(usize, WireJunction)>,
    },
    /// Remove a wire and every junction that taps it or is its tap point.
    RemoveWire { key: WireKey },
    /// Drag one vertex of a wire path.
    MoveWirePoint {
        wire: WireKey,
        index: usize,
        to: GridPoint,
    },
    /// Add `wire` as a branch starting at point `at` of `source`.
    TapWire {
        source: WireKey,
        at: GridPoint,
        wire: Box<Wire>,
    },
    SetGeometry(Box<Geometry>),
    /// Place clipboard elements that already carry fresh ids and absolute
    /// positions.
    Paste(Box<ClipboardElements>),
    /// Same placement as [`EditorCommand::Paste`], recorded as a duplicate.
    Duplicate(Box<ClipboardElements>),
    /// Several commands applied, undone and redone as one step.
    Group {
        label: String,
        commands: Vec<EditorCommand>,
    },
}

impl EditorCommand {
    /// Short human-readable label for history listings.
    pub fn description(&self) -> String {
        match self {
            EditorCommand::AddComponent { component, .. } => {
                format!("Add {}", component.component_type())
            }
            EditorCommand::RemoveComponent { id } => format!("Remove component `{id}`"),
            EditorCommand::UpdateComponent { id, .. } => format!("Update component `{id}`"),
            EditorCommand::MoveComponents { ids, .. } => format!("Move {} component(s)", ids.len()),
            EditorCommand::RotateComponents { ids, .. } => {
                format!("Rotate {} component(s)", ids.len())
            }
            EditorCommand::AddWire { .. } => "Add wire".to_string(),
            EditorCommand::RemoveWire { key } => format!("Remove wire {key}"),
            EditorCommand::MoveWirePoint { wire, .. } => format!("Move point of wire {wire}"),
            EditorCommand::TapWire { source, .. } => format!("Branch wire {source}"),
            EditorCommand::SetGeometry(_) => "Restore geometry".to_string(),
            EditorCommand::Paste(elements) => {
                format!("Paste {} component(s)", elements.components.len())
            }
            EditorCommand::Duplicate(elements) => {
                format!("Duplicate {} component(s)", elements.components.len())
            }
            EditorCommand::Group { label, .. } => label.clone(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Apply
// ────────────────────────────────────────────────────────────────────────────

/// Apply `command` to `circuit`, returning its inverse.
pub fn apply(circuit: &mut Circuit, command: &EditorCommand) -> Result<EditorCommand, CommandError> {
    let result = match command {
        EditorCommand::AddComponent { index, component } => {
            circuit.insert_component(*index, (**component).clone())?;
            Ok(EditorCommand::RemoveComponent {
                id: component.id.clone(),
            })
        }
        EditorCommand::RemoveComponent { id } => {
            let (index, component) = circuit
                .remove_component(id)
                .ok_or_else(|| CircuitError::ComponentNotFound(id.clone()))?;
            Ok(EditorCommand::AddComponent {
                index: Some(index),
                component: Box::new(component),
            })
        }
        EditorCommand::UpdateComponent { id, patch } => update_component(circuit, id, patch),
        EditorCommand::MoveComponents { ids, dx, dy } => transform_components(
            circuit,
            ids,
            |c| c.position = c.position.offset(*dx, *dy),
            Some((*dx, *dy)),
        ),
        EditorCommand::RotateComponents { ids, clockwise } => transform_components(
            circuit,
            ids,
            |c| {
                c.rotation = if *clockwise {
                    c.rotation.clockwise()
                } else {
                    c.rotation.counter_clockwise()
                }
            },
            None,
        ),
        EditorCommand::AddWire {
            index,
            wire,
            junctions,
        } => add_wire(circuit, *index, wire, junctions),
        EditorCommand::RemoveWire { key } => remove_wire(circuit, key),
        EditorCommand::MoveWirePoint { wire, index, to } => move_wire_point(circuit, wire, *index, *to),
        EditorCommand::TapWire { source, at, wire } => tap_wire(circuit, source, *at, wire),
        EditorCommand::SetGeometry(geometry) => set_geometry(circuit, geometry),
        EditorCommand::Paste(elements) | EditorCommand::Duplicate(elements) => place(circuit, elements),
        EditorCommand::Group { label, commands } => apply_group(circuit, label, commands),
    };
    if let Err(e) = &result {
        log::debug!("{} rejected: {e}", command.description());
    }
    result
}

fn resolve_wire(circuit: &Circuit, key: &WireKey) -> Result<usize, CircuitError> {
    circuit
        .wire_index(key)
        .ok_or_else(|| CircuitError::WireNotFound(key.to_string()))
}

fn update_component(
    circuit: &mut Circuit,
    id: &str,
    patch: &ComponentPatch,
) -> Result<EditorCommand, CommandError> {
    if patch.is_empty() {
        return Err(CommandError::Empty("empty component update"));
    }
    let component = circuit
        .component_mut(id)
        .ok_or_else(|| CircuitError::ComponentNotFound(id.to_string()))?;
    if let Some(kind) = &patch.kind {
        if kind.component_type() != component.component_type() {
            return Err(CommandError::UnsupportedUpdate {
                component: id.to_string(),
                what: "a change of component type",
            });
        }
    }
    let mut undo = ComponentPatch::default();
    if let Some(position) = patch.position {
        undo.position = Some(std::mem::replace(&mut component.position, position));
    }
    if let Some(rotation) = patch.rotation {
        undo.rotation = Some(std::mem::replace(&mut component.rotation, rotation));
    }
    if let Some(kind) = &patch.kind {
        undo.kind = Some(std::mem::replace(&mut component.kind, kind.clone()));
    }
    Ok(EditorCommand::UpdateComponent {
        id: id.to_string(),
        patch: undo,
    })
}

fn add_wire(
    circuit: &mut Circuit,
    index: Option<usize>,
    wire: &Wire,
    junctions: &[(usize, WireJunction)],
) -> Result<EditorCommand, CommandError> {
    let wire_count = circuit.wires.len() + 1;
    let mut junction_count = circuit.junctions.len();
    for (at, junction) in junctions {
        if *at > junction_count {
            return Err(CircuitError::IndexOutOfRange {
                index: *at,
                len: junction_count,
            }
            .into());
        }
        if junction.source_wire_index >= wire_count {
            return Err(CircuitError::wire_index(junction.source_wire_index).into());
        }
        junction_count += 1;
    }
    let at = circuit.insert_wire(index, wire.clone())?;
    for (index, junction) in junctions {
        circuit.insert_junction(Some(*index), junction.clone())?;
    }
    Ok(EditorCommand::RemoveWire {
        key: WireKey::for_wire(wire, at),
    })
}

fn remove_wire(circuit: &mut Circuit, key: &WireKey) -> Result<EditorCommand, CommandError> {
    let index = resolve_wire(circuit, key)?;
    let mut junctions = Vec::new();
    for at in circuit.junctions_touching(index).into_iter().rev() {
        if let Some(junction) = circuit.remove_junction(at) {
            junctions.push((at, junction));
        }
    }
    junctions.reverse();
    let wire = circuit
        .remove_wire_at(index)
        .ok_or_else(|| CircuitError::wire_index(index))?;
    Ok(EditorCommand::AddWire {
        index: Some(index),
        wire: Box::new(wire),
        junctions,
    })
}

/// State captured before a geometry change; diffed against the result to
/// build the exact inverse.
struct Snapshot {
    components: Vec<(String, GridPoint, Rotation)>,
    wires: Vec<Wire>,
    junctions: Vec<WireJunction>,
}

impl Snapshot {
    fn take(circuit: &Circuit, ids: &[String]) -> Result<Self, CircuitError> {
        let components = ids
            .iter()
            .map(|id| {
                circuit
                    .component(id)
                    .map(|c| (id.clone(), c.position, c.rotation))
                    .ok_or_else(|| CircuitError::ComponentNotFound(id.clone()))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self {
            components,
            wires: circuit.wires.clone(),
            junctions: circuit.junctions.clone(),
        })
    }

    fn into_inverse(self, circuit: &Circuit) -> EditorCommand {
        fn changed<T: PartialEq>(before: Vec<T>, after: &[T]) -> Vec<(usize, T)> {
            before
                .into_iter()
                .enumerate()
                .filter(|(i, item)| after.get(*i) != Some(item))
                .collect()
        }
        EditorCommand::SetGeometry(Box::new(Geometry {
            components: self.components,
            wires: changed(self.wires, &circuit.wires),
            junctions: changed(self.junctions, &circuit.junctions),
        }))
    }
}

/// A wire end that sits on a port of a component being transformed.
struct Anchor {
    wire: usize,
    at_start: bool,
    component: String,
    direction: PortDirection,
    port: usize,
}

fn anchors_on(circuit: &Circuit, ids: &[String]) -> Vec<Anchor> {
    let selected: Vec<&Component> = ids.iter().filter_map(|id| circuit.component(id)).collect();
    let mut anchors = Vec::new();
    for (wire, w) in circuit.wires.iter().enumerate() {
        for (at_start, point) in [(true, w.start_point()), (false, w.end_point())] {
            if let Some(hit) = port_at(point, selected.iter().copied()).into_iter().next() {
                anchors.push(Anchor {
                    wire,
                    at_start,
                    component: hit.component.id.clone(),
                    direction: hit.port_type,
                    port: hit.port_index,
                });
            }
        }
    }
    anchors
}

type AnchorsByWire<'a> = BTreeMap<usize, Vec<&'a Anchor>>;

fn end_anchored(by_wire: &AnchorsByWire, index: usize, at_start: bool) -> bool {
    by_wire
        .get(&index)
        .is_some_and(|ends| ends.iter().any(|a| a.at_start == at_start))
}

/// True if `point` is where `wire` taps one of the `carried` wires.
fn taps_carried(circuit: &Circuit, wire: &Wire, point: GridPoint, carried: &BTreeSet<usize>) -> bool {
    circuit.junctions.iter().any(|j| {
        j.pos == point && carried.contains(&j.source_wire_index) && wire.has_id(&j.connected_wire_id)
    })
}

/// Wires that move rigidly with a translation: each end sits on a moved
/// port or taps a wire that itself moves rigidly.
fn carried_wires(circuit: &Circuit, by_wire: &AnchorsByWire) -> BTreeSet<usize> {
    let mut carried = BTreeSet::new();
    loop {
        let joined: Vec<usize> = circuit
            .wires
            .iter()
            .enumerate()
            .filter(|(index, wire)| {
                !carried.contains(index)
                    && (end_anchored(by_wire, *index, true)
                        || taps_carried(circuit, wire, wire.start_point(), &carried))
                    && (end_anchored(by_wire, *index, false)
                        || taps_carried(circuit, wire, wire.end_point(), &carried))
            })
            .map(|(index, _)| index)
            .collect();
        if joined.is_empty() {
            return carried;
        }
        carried.extend(joined);
    }
}

/// Re-attach anchored wire ends after their components changed. Under a
/// translation, wires found by [`carried_wires`] move as a whole together
/// with the junctions on them; every other anchored end is re-routed.
fn follow_anchors(circuit: &mut Circuit, anchors: &[Anchor], shift: Option<(i32, i32)>) {
    let mut by_wire: AnchorsByWire = BTreeMap::new();
    for anchor in anchors {
        by_wire.entry(anchor.wire).or_default().push(anchor);
    }

    let mut carried = BTreeSet::new();
    if let Some((dx, dy)) = shift {
        carried = carried_wires(circuit, &by_wire);
        for &index in &carried {
            let old = circuit.wires[index].points.clone();
            circuit.wires[index].translate(dx, dy);
            shift_junctions(circuit, index, dx, dy, &carried);
            reconcile_wire(circuit, index);
            refresh_junctions(circuit, index, &old);
        }
    }

    for (index, ends) in by_wire {
        if carried.contains(&index) {
            continue;
        }
        let old = circuit.wires[index].points.clone();
        let mut points = old.clone();
        for anchor in ends {
            let Some(port) = circuit
                .component(&anchor.component)
                .and_then(|c| world_port(c, anchor.direction, anchor.port))
            else {
                continue;
            };
            let vertex = if anchor.at_start { 0 } else { points.len().saturating_sub(1) };
            if let Some(moved) = move_point(&points, vertex, port.pos) {
                points = moved;
            }
        }
        let wire = &mut circuit.wires[index];
        wire.points = points;
        wire.sync_end_positions();
        reconcile_wire(circuit, index);
        refresh_junctions(circuit, index, &old);
    }
}

/// Move the junctions on wire `source` by `(dx, dy)` and drag the tapping
/// end of each branch along. Carried branches move on their own.
fn shift_junctions(
    circuit: &mut Circuit,
    source: usize,
    dx: i32,
    dy: i32,
    carried: &BTreeSet<usize>,
) {
    for j in 0..circuit.junctions.len() {
        if circuit.junctions[j].source_wire_index != source {
            continue;
        }
        let old_pos = circuit.junctions[j].pos;
        let new_pos = old_pos.offset(dx, dy);
        circuit.junctions[j].pos = new_pos;

        let tap_id = circuit.junctions[j].connected_wire_id.clone();
        let Some((tap_index, tap)) = circuit.wire_by_id(&tap_id) else {
            continue;
        };
        if carried.contains(&tap_index) {
            continue;
        }
        let tap_old = tap.points.clone();
        let vertex = if tap.start_point() == old_pos { 0 } else { tap_old.len().saturating_sub(1) };
        if let Some(points) = move_point(&tap_old, vertex, new_pos) {
            let tap = &mut circuit.wires[tap_index];
            tap.points = points;
            tap.sync_end_positions();
            refresh_junctions(circuit, tap_index, &tap_old);
        }
    }
}

fn transform_components(
    circuit: &mut Circuit,
    ids: &[String],
    mut transform: impl FnMut(&mut Component),
    shift: Option<(i32, i32)>,
) -> Result<EditorCommand, CommandError> {
    if ids.is_empty() {
        return Err(CommandError::Empty("no components selected"));
    }
    let snapshot = Snapshot::take(circuit, ids)?;
    let anchors = anchors_on(circuit, ids);
    for id in ids {
        if let Some(component) = circuit.component_mut(id) {
            transform(component);
        }
    }
    follow_anchors(circuit, &anchors, shift);
    Ok(snapshot.into_inverse(circuit))
}

fn move_wire_point(
    circuit: &mut Circuit,
    key: &WireKey,
    index: usize,
    to: GridPoint,
) -> Result<EditorCommand, CommandError> {
    let wire = resolve_wire(circuit, key)?;
    let old = circuit.wires[wire].points.clone();
    let points = move_point(&old, index, to).ok_or(CommandError::VertexOutOfRange { wire, index })?;
    if points == old {
        return Err(CommandError::Empty("wire point did not move"));
    }
    let snapshot = Snapshot::take(circuit, &[])?;
    circuit.wires[wire].points = points;
    circuit.wires[wire].sync_end_positions();
    reconcile_wire(circuit, wire);
    refresh_junctions(circuit, wire, &old);
    Ok(snapshot.into_inverse(circuit))
}

fn tap_wire(
    circuit: &mut Circuit,
    source: &WireKey,
    at: GridPoint,
    wire: &Wire,
) -> Result<EditorCommand, CommandError> {
    let tap_id = wire.id.clone().ok_or(CommandError::UnnamedTap)?;
    let source_index = resolve_wire(circuit, source)?;
    if circuit.wire_by_id(&tap_id).is_some() {
        return Err(CircuitError::DuplicateWireId(tap_id).into());
    }
    let original = circuit.wires[source_index].clone();
    if path_position(&original.points, at).is_none() {
        return Err(CommandError::PointNotOnWire {
            wire: source_index,
            x: at.x,
            y: at.y,
        });
    }
    insert_vertex(&mut circuit.wires[source_index].points, at);
    circuit.insert_wire(None, wire.clone())?;
    circuit.junctions.push(WireJunction {
        pos: at,
        source_wire_index: source_index,
        connected_wire_id: tap_id.clone(),
    });
    Ok(EditorCommand::Group {
        label: "Remove branch".to_string(),
        commands: vec![
            EditorCommand::RemoveWire {
                key: WireKey::Id(tap_id),
            },
            EditorCommand::SetGeometry(Box::new(Geometry {
                wires: vec![(source_index, original)],
                ..Geometry::default()
            })),
        ],
    })
}

fn set_geometry(circuit: &mut Circuit, geometry: &Geometry) -> Result<EditorCommand, CommandError> {
    for (id, _, _) in &geometry.components {
        if circuit.component(id).is_none() {
            return Err(CircuitError::ComponentNotFound(id.clone()).into());
        }
    }
    if let Some((index, _)) = geometry.wires.iter().find(|(i, _)| *i >= circuit.wires.len()) {
        return Err(CircuitError::wire_index(*index).into());
    }
    let len = circuit.junctions.len();
    if let Some((index, _)) = geometry.junctions.iter().find(|(i, _)| *i >= len) {
        return Err(CircuitError::IndexOutOfRange { index: *index, len }.into());
    }

    let mut undo = Geometry::default();
    for (id, position, rotation) in &geometry.components {
        if let Some(component) = circuit.component_mut(id) {
            undo.components.push((id.clone(), component.position, component.rotation));
            component.position = *position;
            component.rotation = *rotation;
        }
    }
    for (index, wire) in &geometry.wires {
        let previous = std::mem::replace(&mut circuit.wires[*index], wire.clone());
        undo.wires.push((*index, previous));
    }
    for (index, junction) in &geometry.junctions {
        let previous = std::mem::replace(&mut circuit.junctions[*index], junction.clone());
        undo.junctions.push((*index, previous));
    }
    Ok(EditorCommand::SetGeometry(Box::new(undo)))
}

fn place(circuit: &mut Circuit, elements: &ClipboardElements) -> Result<EditorCommand, CommandError> {
    if elements.is_empty() {
        return Err(CommandError::Empty("nothing to place"));
    }
    let mut component_ids = HashSet::new();
    for component in &elements.components {
        if circuit.component(&component.id).is_some() || !component_ids.insert(component.id.as_str()) {
            return Err(CircuitError::DuplicateComponentId(component.id.clone()).into());
        }
    }
    let mut wire_ids = HashSet::new();
    for id in elements.wires.iter().filter_map(|w| w.id.as_deref()) {
        if circuit.wire_by_id(id).is_some() || !wire_ids.insert(id) {
            return Err(CircuitError::DuplicateWireId(id.to_string()).into());
        }
    }
    if let Some(junction) = elements
        .junctions
        .iter()
        .find(|j| j.source_wire_index >= elements.wires.len())
    {
        return Err(CircuitError::wire_index(junction.source_wire_index).into());
    }

    let base = circuit.wires.len();
    for component in &elements.components {
        circuit.insert_component(None, component.clone())?;
    }
    for wire in &elements.wires {
        circuit.insert_wire(None, wire.clone())?;
    }
    for junction in &elements.junctions {
        circuit.junctions.push(WireJunction {
            source_wire_index: junction.source_wire_index + base,
            ..junction.clone()
        });
    }

    let mut commands: Vec<EditorCommand> = elements
        .wires
        .iter()
        .enumerate()
        .rev()
        .map(|(i, wire)| EditorCommand::RemoveWire {
            key: WireKey::for_wire(wire, base + i),
        })
        .collect();
    commands.extend(
        elements
            .components
            .iter()
            .rev()
            .map(|c| EditorCommand::RemoveComponent { id: c.id.clone() }),
    );
    Ok(EditorCommand::Group {
        label: "Remove placed elements".to_string(),
        commands,
    })
}

fn apply_group(
    circuit: &mut Circuit,
    label: &str,
    commands: &[EditorCommand],
) -> Result<EditorCommand, CommandError> {
    if commands.is_empty() {
        return Err(CommandError::Empty("empty group"));
    }
    let mut inverses = Vec::with_capacity(commands.len());
    for command in commands {
        match apply(circuit, command) {
            Ok(inverse) => inverses.push(inverse),
            Err(e) => {
                for inverse in inverses.iter().rev() {
                    if let Err(rollback) = apply(circuit, inverse) {
                        log::warn!("rolling back `{label}` failed: {rollback}");
                    }
                }
                return Err(e);
            }
        }
    }
    inverses.reverse();
    Ok(EditorCommand::Group {
        label: label.to_string(),
        commands: inverses,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Selection-level builders
// ────────────────────────────────────────────────────────────────────────────

/// Delete components together with every wire attached to them, as one
/// group.
pub fn delete_components(circuit: &Circuit, ids: &[String]) -> EditorCommand {
    let mut wires: Vec<usize> = anchors_on(circuit, ids).iter().map(|a| a.wire).collect();
    wires.extend(
        circuit
            .wires
            .iter()
            .enumerate()
            .filter(|(_, w)| ids.iter().any(|id| w.touches_component(id)))
            .map(|(i, _)| i),
    );
    wires.sort_unstable();
    wires.dedup();

    let mut commands: Vec<EditorCommand> = wires
        .into_iter()
        .rev()
        .map(|i| EditorCommand::RemoveWire {
            key: WireKey::for_wire(&circuit.wires[i], i),
        })
        .collect();
    commands.extend(ids.iter().map(|id| EditorCommand::RemoveComponent { id: id.clone() }));
    EditorCommand::Group {
        label: format!("Delete {} component(s)", ids.len()),
        commands,
    }
}

/// Delete wires by key as one group.
pub fn delete_wires(circuit: &Circuit, keys: &[WireKey]) -> EditorCommand {
    let mut indices: Vec<usize> = keys.iter().filter_map(|k| circuit.wire_index(k)).collect();
    indices.sort_unstable();
    indices.dedup();
    EditorCommand::Group {
        label: format!("Delete {} wire(s)", indices.len()),
        commands: indices
            .into_iter()
            .rev()
            .map(|i| EditorCommand::RemoveWire {
                key: WireKey::for_wire(&circuit.wires[i], i),
            })
            .collect(),
    }
}
