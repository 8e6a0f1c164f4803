//! An editing session: the store, one undo history per circuit, the id
//! generator and the clipboard.
//!
//! All edits to the active circuit go through [`EditorSession::execute`] or
//! one of the helpers built on it, so everything a session does can be
//! undone. Values reported back by the execution engine arrive as
//! [`RuntimeEvent`]s and take the same path.

use super::clipboard::{ClipboardElements, IdGenerator, copy, instantiate, selection_origin};
use super::history::{EditorHistory, HistoryInfo};
use super::operations::{ComponentPatch, EditorCommand, delete_components, delete_wires};
use crate::component::{Component, ComponentKind};
use crate::config::{EditorConfig, GeneratorOptions};
use crate::error::{CircuitError, CommandError};
use crate::generator::{GeneratedProgram, generate_with};
use crate::geometry::{nearest_port, world_port};
use crate::model::{Circuit, GridPoint, PortDirection, Wire, WireEnd, WireKey};
use crate::store::CircuitStore;
use crate::validate::{ValidationReport, validate_circuit};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A value change reported by the execution engine: a memory cell write
/// when `address` is set, otherwise the value of an I/O component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeEvent {
    pub component_id: String,
    #[serde(default)]
    pub address: Option<usize>,
    pub value: u64,
}

#[derive(Debug, Clone)]
pub struct EditorSession {
    store: CircuitStore,
    histories: HashMap<String, EditorHistory>,
    ids: IdGenerator,
    config: EditorConfig,
    clipboard: Option<ClipboardElements>,
}

fn active(store: &CircuitStore) -> Result<&Circuit, CircuitError> {
    store.active_circuit().ok_or(CircuitError::NoActiveCircuit)
}

fn port_end(
    circuit: &Circuit,
    (component_id, index): (&str, usize),
    direction: PortDirection,
) -> Result<WireEnd, CommandError> {
    let component = circuit
        .component(component_id)
        .ok_or_else(|| CircuitError::ComponentNotFound(component_id.to_string()))?;
    let port = world_port(component, direction, index).ok_or_else(|| CommandError::NoSuchPort {
        component: component_id.to_string(),
        direction,
        index,
    })?;
    Ok(WireEnd::attached(component_id, direction, index, port.pos))
}

fn width_max(bits: u32) -> u64 {
    if bits >= 64 { u64::MAX } else { (1u64 << bits) - 1 }
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_store(CircuitStore::new(), config)
    }

    pub fn with_store(store: CircuitStore, config: EditorConfig) -> Self {
        Self {
            store,
            histories: HashMap::new(),
            ids: IdGenerator::new(config.id_prefix.clone()),
            config,
            clipboard: None,
        }
    }

    pub fn store(&self) -> &CircuitStore {
        &self.store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn active_circuit(&self) -> Option<&Circuit> {
        self.store.active_circuit()
    }

    pub fn create_circuit(&mut self, name: impl Into<String>) -> String {
        self.store.create_circuit(name)
    }

    pub fn set_active(&mut self, id: &str) -> Result<(), CircuitError> {
        self.store.set_active(id)
    }

    /// Delete a circuit together with its history.
    pub fn delete_circuit(&mut self, id: &str) -> Option<Circuit> {
        self.histories.remove(id);
        self.store.delete_circuit(id)
    }

    fn active_parts(&mut self) -> Result<(&mut Circuit, &mut EditorHistory), CircuitError> {
        let circuit = self
            .store
            .active_circuit_mut()
            .ok_or(CircuitError::NoActiveCircuit)?;
        let max = self.config.max_undo_levels;
        let history = self
            .histories
            .entry(circuit.id.clone())
            .or_insert_with(|| EditorHistory::new(max));
        Ok((circuit, history))
    }

    /// Apply a command to the active circuit and record it.
    pub fn execute(&mut self, command: &EditorCommand) -> Result<(), CommandError> {
        let (circuit, history) = self.active_parts()?;
        history.execute(circuit, command)
    }

    pub fn undo(&mut self) -> bool {
        self.active_parts()
            .is_ok_and(|(circuit, history)| history.undo(circuit))
    }

    pub fn redo(&mut self) -> bool {
        self.active_parts()
            .is_ok_and(|(circuit, history)| history.redo(circuit))
    }

    pub fn start_group(&mut self, label: impl Into<String>) {
        if let Ok((_, history)) = self.active_parts() {
            history.start_group(label);
        }
    }

    pub fn end_group(&mut self) -> bool {
        self.active_parts().is_ok_and(|(_, history)| history.end_group())
    }

    pub fn history_info(&self) -> HistoryInfo {
        self.store
            .active_id()
            .and_then(|id| self.histories.get(id))
            .map(EditorHistory::history_info)
            .unwrap_or_default()
    }

    /// Place a new component with a generated id and return the id.
    pub fn add_component(&mut self, kind: ComponentKind, position: GridPoint) -> Result<String, CommandError> {
        let id = self.ids.component_id(active(&self.store)?);
        self.execute(&EditorCommand::AddComponent {
            index: None,
            component: Box::new(Component::new(id.clone(), kind, position)),
        })?;
        Ok(id)
    }

    pub fn update_component(&mut self, id: &str, patch: ComponentPatch) -> Result<(), CommandError> {
        self.execute(&EditorCommand::UpdateComponent {
            id: id.to_string(),
            patch,
        })
    }

    /// Draw a wire from output port `from` to input port `to`, given as
    /// `(component id, port index)`, and return the wire id.
    pub fn connect(
        &mut self,
        from: (&str, usize),
        to: (&str, usize),
        waypoints: &[GridPoint],
    ) -> Result<String, CommandError> {
        let circuit = active(&self.store)?;
        let start = port_end(circuit, from, PortDirection::Output)?;
        let end = port_end(circuit, to, PortDirection::Input)?;
        let id = self.ids.wire_id(circuit);
        self.execute(&EditorCommand::AddWire {
            index: None,
            wire: Box::new(Wire::routed(Some(id.clone()), start, end, waypoints)),
            junctions: Vec::new(),
        })?;
        Ok(id)
    }

    /// Branch off wire `source` at `at` towards input port `to`; returns the
    /// new wire's id.
    pub fn tap_wire(
        &mut self,
        source: WireKey,
        at: GridPoint,
        to: (&str, usize),
        waypoints: &[GridPoint],
    ) -> Result<String, CommandError> {
        let circuit = active(&self.store)?;
        let end = port_end(circuit, to, PortDirection::Input)?;
        let id = self.ids.wire_id(circuit);
        let start = WireEnd::detached(PortDirection::Output, at);
        self.execute(&EditorCommand::TapWire {
            source,
            at,
            wire: Box::new(Wire::routed(Some(id.clone()), start, end, waypoints)),
        })?;
        Ok(id)
    }

    /// Delete components and the wires attached to them in one step.
    pub fn delete(&mut self, ids: &[String]) -> Result<(), CommandError> {
        let command = delete_components(active(&self.store)?, ids);
        self.execute(&command)
    }

    pub fn delete_wires(&mut self, keys: &[WireKey]) -> Result<(), CommandError> {
        let command = delete_wires(active(&self.store)?, keys);
        self.execute(&command)
    }

    pub fn move_components(&mut self, ids: &[String], dx: i32, dy: i32) -> Result<(), CommandError> {
        self.execute(&EditorCommand::MoveComponents {
            ids: ids.to_vec(),
            dx,
            dy,
        })
    }

    pub fn rotate(&mut self, ids: &[String], clockwise: bool) -> Result<(), CommandError> {
        self.execute(&EditorCommand::RotateComponents {
            ids: ids.to_vec(),
            clockwise,
        })
    }

    /// Drag the start or end of a wire to `to`. The end snaps to a port of
    /// the same direction within the configured snap distance.
    pub fn drag_wire_end(&mut self, key: WireKey, at_start: bool, to: GridPoint) -> Result<(), CommandError> {
        let circuit = active(&self.store)?;
        let index = circuit
            .wire_index(&key)
            .ok_or_else(|| CircuitError::WireNotFound(key.to_string()))?;
        let wire = &circuit.wires[index];
        let (direction, vertex) = if at_start {
            (wire.start.port_type, 0)
        } else {
            (wire.end.port_type, wire.points.len().saturating_sub(1))
        };
        let target = nearest_port(to, circuit.components.values(), Some(direction), self.config.snap_distance)
            .map_or(to, |(_, pos)| pos);
        self.execute(&EditorCommand::MoveWirePoint {
            wire: key,
            index: vertex,
            to: target,
        })
    }

    /// Copy components (and the wires among them) to the clipboard. Returns
    /// the number of components copied.
    pub fn copy(&mut self, ids: &[String]) -> Result<usize, CircuitError> {
        let elements = copy(active(&self.store)?, ids);
        let count = elements.components.len();
        if !elements.is_empty() {
            self.clipboard = Some(elements);
        }
        Ok(count)
    }

    pub fn clipboard(&self) -> Option<&ClipboardElements> {
        self.clipboard.as_ref()
    }

    /// Paste the clipboard with its top-left corner at `origin`; returns the
    /// new component ids.
    pub fn paste(&mut self, origin: GridPoint) -> Result<Vec<String>, CommandError> {
        let elements = self
            .clipboard
            .as_ref()
            .ok_or(CommandError::Empty("clipboard is empty"))?;
        let placed = instantiate(elements, origin, &mut self.ids, active(&self.store)?);
        let ids = placed.components.iter().map(|c| c.id.clone()).collect();
        self.execute(&EditorCommand::Paste(Box::new(placed)))?;
        Ok(ids)
    }

    /// Copy and place `ids` at their own position plus the configured
    /// offset, leaving the clipboard alone.
    pub fn duplicate(&mut self, ids: &[String]) -> Result<Vec<String>, CommandError> {
        let circuit = active(&self.store)?;
        let elements = copy(circuit, ids);
        let Some(origin) = selection_origin(circuit, ids) else {
            return Err(CommandError::Empty("no components selected"));
        };
        let offset = self.config.duplicate_offset;
        let placed = instantiate(&elements, origin.offset(offset.x, offset.y), &mut self.ids, circuit);
        let new_ids = placed.components.iter().map(|c| c.id.clone()).collect();
        self.execute(&EditorCommand::Duplicate(Box::new(placed)))?;
        Ok(new_ids)
    }

    /// Reflect an engine-reported value into the component's properties.
    /// Values are clamped to the component's bit width; an unchanged value
    /// records nothing.
    pub fn apply_runtime_event(&mut self, event: &RuntimeEvent) -> Result<(), CommandError> {
        let component = active(&self.store)?
            .component(&event.component_id)
            .ok_or_else(|| CircuitError::ComponentNotFound(event.component_id.clone()))?;
        let mut kind = component.kind.clone();
        match (event.address, &mut kind) {
            (Some(address), ComponentKind::Rom(memory) | ComponentKind::Ram(memory)) => {
                let len = memory.cell_count();
                if address >= len {
                    return Err(CircuitError::IndexOutOfRange { index: address, len }.into());
                }
                if memory.data.len() <= address {
                    memory.data.resize(address + 1, 0);
                }
                memory.data[address] = event.value.min(memory.max_value());
            }
            (None, ComponentKind::Input(io) | ComponentKind::Output(io) | ComponentKind::Constant(io)) => {
                io.value = event.value.min(width_max(io.bits));
            }
            _ => {
                return Err(CommandError::UnsupportedUpdate {
                    component: event.component_id.clone(),
                    what: "a runtime value",
                });
            }
        }
        if kind == component.kind {
            return Ok(());
        }
        log::trace!("runtime update of `{}`", event.component_id);
        self.update_component(&event.component_id, ComponentPatch::kind(kind))
    }

    pub fn validate(&self) -> Result<ValidationReport, CircuitError> {
        Ok(validate_circuit(active(&self.store)?))
    }

    pub fn generate(&self, options: &GeneratorOptions) -> Result<GeneratedProgram, CircuitError> {
        let circuit = active(&self.store)?;
        Ok(generate_with(&circuit.components, &circuit.wires, &circuit.junctions, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentType, MemoryProps};

    fn p(x: i32, y: i32) -> GridPoint {
        GridPoint::new(x, y)
    }

    /// Input at (0,0) wired to the first input of an AND gate at (6,0).
    fn session_with_gate() -> (EditorSession, String, String) {
        let mut session = EditorSession::new(EditorConfig::default());
        session.create_circuit("main");
        let input = session
            .add_component(ComponentType::Input.default_kind(), p(0, 0))
            .unwrap();
        let gate = session
            .add_component(ComponentType::AndGate.default_kind(), p(6, 0))
            .unwrap();
        session.connect((&input, 0), (&gate, 0), &[]).unwrap();
        (session, input, gate)
    }

    #[test]
    fn test_edits_are_undoable() {
        let (mut session, input, _) = session_with_gate();
        assert_eq!(input, "c-comp-1");
        assert_eq!(session.history_info().undo_count, 3);
        assert!(session.undo());
        assert!(session.active_circuit().unwrap().wires.is_empty());
        assert!(session.redo());
        let report = session.validate().unwrap();
        assert!(report.valid);
        assert_eq!(report.connections.len(), 1);
    }

    #[test]
    fn test_connect_checks_ports() {
        let (mut session, input, gate) = session_with_gate();
        let err = session.connect((&input, 0), (&gate, 5), &[]);
        assert!(matches!(err, Err(CommandError::NoSuchPort { index: 5, .. })));
    }

    #[test]
    fn test_drag_snaps_to_nearby_port() {
        let (mut session, _, gate) = session_with_gate();
        session.drag_wire_end(WireKey::Index(0), false, p(6, 3)).unwrap();
        let wire = &session.active_circuit().unwrap().wires[0];
        assert_eq!(wire.end_point(), p(6, 2));
        assert_eq!(wire.end.component_id.as_deref(), Some(gate.as_str()));
        assert_eq!(wire.end.port_index, 1);
    }

    #[test]
    fn test_paste_and_duplicate() {
        let (mut session, input, gate) = session_with_gate();
        assert_eq!(session.copy(&[input.clone(), gate.clone()]).unwrap(), 2);
        let pasted = session.paste(p(0, 10)).unwrap();
        assert_eq!(pasted, vec!["c-comp-4".to_string(), "c-comp-5".to_string()]);
        let circuit = session.active_circuit().unwrap();
        assert_eq!(circuit.components.len(), 4);
        assert_eq!(circuit.wires.len(), 2);
        assert!(session.validate().unwrap().valid);

        assert!(session.undo());
        assert_eq!(session.active_circuit().unwrap().components.len(), 2);

        let copies = session.duplicate(&[input]).unwrap();
        let copy = session.active_circuit().unwrap().component(&copies[0]).unwrap();
        assert_eq!(copy.position, p(2, 2));
    }

    #[test]
    fn test_move_and_rotate_keep_the_wire_attached() {
        let (mut session, input, gate) = session_with_gate();
        session.move_components(&[gate.clone()], 0, 4).unwrap();
        session.rotate(&[gate.clone()], true).unwrap();
        let report = session.validate().unwrap();
        assert!(report.valid, "{:?}", report.errors);
        assert_eq!(report.connections.len(), 1);
        assert_eq!(session.history_info().undo_labels[..2], ["Rotate 1 component(s)", "Move 1 component(s)"]);

        assert!(session.undo());
        assert!(session.undo());
        let circuit = session.active_circuit().unwrap();
        assert_eq!(circuit.component(&gate).unwrap().position, p(6, 0));
        assert_eq!(circuit.wires[0].start.component_id.as_deref(), Some(input.as_str()));
        assert_eq!(session.rotate(&[], false), Err(CommandError::Empty("no components selected")));
    }

    #[test]
    fn test_configured_ids_and_offset() {
        let config = EditorConfig::new()
            .with_id_prefix("t")
            .with_duplicate_offset(p(0, 6));
        let mut session = EditorSession::new(config);
        session.create_circuit("main");
        let clock = session
            .add_component(ComponentType::Clock.default_kind(), p(1, 1))
            .unwrap();
        assert_eq!(clock, "t-comp-1");
        let copies = session.duplicate(&[clock]).unwrap();
        assert_eq!(copies, vec!["t-comp-2".to_string()]);
        let copy = session.active_circuit().unwrap().component(&copies[0]).unwrap();
        assert_eq!(copy.position, p(1, 7));
    }

    #[test]
    fn test_paste_with_empty_clipboard() {
        let (mut session, _, _) = session_with_gate();
        assert_eq!(
            session.paste(p(0, 0)),
            Err(CommandError::Empty("clipboard is empty"))
        );
    }

    #[test]
    fn test_runtime_events() {
        let mut session = EditorSession::new(EditorConfig::default());
        session.create_circuit("main");
        let ram = session
            .add_component(ComponentKind::Ram(MemoryProps::default()), p(0, 0))
            .unwrap();
        let input = session
            .add_component(ComponentType::Input.default_kind(), p(0, 20))
            .unwrap();
        let gate = session
            .add_component(ComponentType::AndGate.default_kind(), p(10, 20))
            .unwrap();

        let write = |component: &str, address: Option<usize>, value: u64| RuntimeEvent {
            component_id: component.to_string(),
            address,
            value,
        };
        session.apply_runtime_event(&write(&ram, Some(3), 300)).unwrap();
        let data = |s: &EditorSession| match &s.active_circuit().unwrap().component(&ram).unwrap().kind {
            ComponentKind::Ram(m) => m.data.clone(),
            _ => unreachable!(),
        };
        assert_eq!(data(&session), vec![0, 0, 0, 255]);
        assert_eq!(
            session.apply_runtime_event(&write(&ram, Some(16), 1)),
            Err(CircuitError::IndexOutOfRange { index: 16, len: 16 }.into())
        );

        session.apply_runtime_event(&write(&input, None, 5)).unwrap();
        let value = session
            .active_circuit()
            .unwrap()
            .component(&input)
            .and_then(|c| c.kind.io_props())
            .map(|io| io.value);
        assert_eq!(value, Some(1));

        assert!(matches!(
            session.apply_runtime_event(&write(&gate, None, 1)),
            Err(CommandError::UnsupportedUpdate { .. })
        ));

        assert!(session.undo());
        assert!(session.undo());
        assert!(data(&session).is_empty());
    }

    #[test]
    fn test_each_circuit_has_its_own_history() {
        let (mut session, _, _) = session_with_gate();
        let other = session.create_circuit("other");
        session.set_active(&other).unwrap();
        assert!(!session.undo());
        session
            .add_component(ComponentType::Clock.default_kind(), p(0, 0))
            .unwrap();
        assert_eq!(session.history_info().undo_count, 1);
        assert!(session.delete_circuit(&other).is_some());
        assert_eq!(session.history_info().undo_count, 3);
    }
}
