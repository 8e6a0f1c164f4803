//! The circuit store: the one owner of every circuit being edited.
//!
//! Commands, validation and generation all borrow circuits from here; nothing
//! else holds a live reference across an edit.

use crate::component::{Component, ComponentKind, SubcircuitProps};
use crate::error::CircuitError;
use crate::model::{Circuit, CircuitDoc, Wire};
use indexmap::IndexMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CircuitStore {
    circuits: IndexMap<String, Circuit>,
    active: Option<String>,
    next_id: usize,
}

impl CircuitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a loaded document. The document's active id is
    /// kept if it names one of its circuits.
    pub fn from_doc(doc: CircuitDoc) -> Self {
        let mut store = Self::new();
        for circuit in doc.circuits {
            store.circuits.insert(circuit.id.clone(), circuit);
        }
        store.active = doc
            .active
            .filter(|id| store.circuits.contains_key(id))
            .or_else(|| store.circuits.keys().next().cloned());
        store
    }

    pub fn to_doc(&self) -> CircuitDoc {
        CircuitDoc {
            active: self.active.clone(),
            ..CircuitDoc::new(self.circuits.values().cloned().collect())
        }
    }

    fn fresh_id(&mut self) -> String {
        loop {
            self.next_id += 1;
            let id = format!("circuit-{}", self.next_id);
            if !self.circuits.contains_key(&id) {
                return id;
            }
        }
    }

    /// Create an empty circuit and return its id. The first circuit created
    /// becomes active.
    pub fn create_circuit(&mut self, name: impl Into<String>) -> String {
        let id = self.fresh_id();
        let circuit = Circuit::new(id.clone(), name);
        log::debug!("created circuit `{id}` ({})", circuit.name);
        self.circuits.insert(id.clone(), circuit);
        if self.active.is_none() {
            self.active = Some(id.clone());
        }
        id
    }

    pub fn get_circuit(&self, id: &str) -> Option<&Circuit> {
        self.circuits.get(id)
    }

    pub fn circuits(&self) -> impl Iterator<Item = &Circuit> {
        self.circuits.values()
    }

    pub fn len(&self) -> usize {
        self.circuits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.circuits.is_empty()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_circuit(&self) -> Option<&Circuit> {
        self.active.as_deref().and_then(|id| self.circuits.get(id))
    }

    pub fn active_circuit_mut(&mut self) -> Option<&mut Circuit> {
        match self.active.as_deref() {
            Some(id) => self.circuits.get_mut(id),
            None => None,
        }
    }

    pub fn set_active(&mut self, id: &str) -> Result<(), CircuitError> {
        if !self.circuits.contains_key(id) {
            return Err(CircuitError::CircuitNotFound(id.to_string()));
        }
        self.active = Some(id.to_string());
        Ok(())
    }

    /// Delete a circuit. If it was active, the first remaining circuit takes
    /// over.
    pub fn delete_circuit(&mut self, id: &str) -> Option<Circuit> {
        let removed = self.circuits.shift_remove(id)?;
        if self.active.as_deref() == Some(id) {
            self.active = self.circuits.keys().next().cloned();
        }
        log::debug!("deleted circuit `{id}`");
        Some(removed)
    }

    /// Insert or wholesale replace a circuit (bulk import). Returns the
    /// circuit it replaced, if any.
    pub fn replace_circuit(&mut self, circuit: Circuit) -> Option<Circuit> {
        let id = circuit.id.clone();
        let previous = self.circuits.insert(id.clone(), circuit);
        if self.active.is_none() {
            self.active = Some(id);
        }
        previous
    }

    fn active_or_err(&mut self) -> Result<&mut Circuit, CircuitError> {
        self.active_circuit_mut().ok_or(CircuitError::NoActiveCircuit)
    }

    pub fn add_component(&mut self, component: Component) -> Result<(), CircuitError> {
        self.active_or_err()?.insert_component(None, component)?;
        Ok(())
    }

    /// Remove a component from the active circuit. Wires are left alone.
    pub fn remove_component(&mut self, id: &str) -> Option<Component> {
        self.active_circuit_mut()?
            .remove_component(id)
            .map(|(_, component)| component)
    }

    pub fn update_component<F>(&mut self, id: &str, update: F) -> Result<(), CircuitError>
    where
        F: FnOnce(&mut Component),
    {
        let component = self
            .active_or_err()?
            .component_mut(id)
            .ok_or_else(|| CircuitError::ComponentNotFound(id.to_string()))?;
        update(component);
        Ok(())
    }

    /// Append a wire to the active circuit, returning its index.
    pub fn add_wire(&mut self, wire: Wire) -> Result<usize, CircuitError> {
        self.active_or_err()?.insert_wire(None, wire)
    }

    /// Remove a wire by id from the active circuit, together with every
    /// junction that taps it or is its tap point.
    pub fn remove_wire(&mut self, id: &str) -> Option<Wire> {
        let circuit = self.active_circuit_mut()?;
        let (index, _) = circuit.wire_by_id(id)?;
        for junction in circuit.junctions_touching(index).into_iter().rev() {
            circuit.remove_junction(junction);
        }
        circuit.remove_wire_at(index)
    }

    /// The interface a sub-circuit instance of `circuit_id` exposes: one
    /// input per Input pin and one output per Output pin, in declaration
    /// order, named by label (or by position when unlabelled).
    pub fn subcircuit_props(&self, circuit_id: &str) -> Result<SubcircuitProps, CircuitError> {
        let circuit = self
            .get_circuit(circuit_id)
            .ok_or_else(|| CircuitError::CircuitNotFound(circuit_id.to_string()))?;
        let mut props = SubcircuitProps {
            circuit_id: circuit.id.clone(),
            name: circuit.name.clone(),
            ..SubcircuitProps::default()
        };
        for component in circuit.components.values() {
            let list = match &component.kind {
                ComponentKind::Input(_) => &mut props.inputs,
                ComponentKind::Output(_) => &mut props.outputs,
                _ => continue,
            };
            let label = component.kind.label();
            let name = if label.is_empty() { list.len().to_string() } else { label.to_string() };
            list.push(name);
        }
        Ok(props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentType, IoProps};
    use crate::model::{GridPoint, PortDirection, WireEnd, WireJunction};

    fn labelled(id: &str, kind: fn(IoProps) -> ComponentKind, label: &str) -> Component {
        let props = IoProps {
            label: label.into(),
            ..IoProps::default()
        };
        Component::new(id, kind(props), GridPoint::default())
    }

    fn wire(id: &str) -> Wire {
        Wire::routed(
            Some(id.into()),
            WireEnd::detached(PortDirection::Output, GridPoint::new(0, 0)),
            WireEnd::detached(PortDirection::Input, GridPoint::new(4, 0)),
            &[],
        )
    }

    #[test]
    fn first_circuit_becomes_active() {
        let mut store = CircuitStore::new();
        let a = store.create_circuit("A");
        let b = store.create_circuit("B");
        assert_ne!(a, b);
        assert_eq!(store.active_id(), Some(a.as_str()));
        store.set_active(&b).unwrap();
        assert_eq!(store.active_circuit().unwrap().name, "B");
        assert_eq!(
            store.set_active("nope"),
            Err(CircuitError::CircuitNotFound("nope".into()))
        );
    }

    #[test]
    fn deleting_the_active_circuit_moves_activity() {
        let mut store = CircuitStore::new();
        let a = store.create_circuit("A");
        let b = store.create_circuit("B");
        assert!(store.delete_circuit(&a).is_some());
        assert_eq!(store.active_id(), Some(b.as_str()));
        assert!(store.delete_circuit(&a).is_none());
    }

    #[test]
    fn replacing_a_circuit_keeps_its_slot() {
        let mut store = CircuitStore::new();
        assert!(store.replace_circuit(Circuit::new("imported", "Imported")).is_none());
        assert_eq!(store.active_id(), Some("imported"));

        let b = store.create_circuit("B");
        let mut edited = Circuit::new("imported", "Renamed");
        edited.insert_wire(None, wire("w")).unwrap();
        let previous = store.replace_circuit(edited).unwrap();
        assert_eq!(previous.name, "Imported");

        let order: Vec<_> = store.circuits().map(|c| c.id.as_str()).collect();
        assert_eq!(order, vec!["imported", b.as_str()]);
        assert_eq!(store.get_circuit("imported").unwrap().wires.len(), 1);
    }

    #[test]
    fn component_crud_on_active_circuit() {
        let mut store = CircuitStore::new();
        assert_eq!(
            store.add_component(Component::of_type("x", ComponentType::Input, GridPoint::default())),
            Err(CircuitError::NoActiveCircuit)
        );
        store.create_circuit("main");
        store
            .add_component(Component::of_type("x", ComponentType::Input, GridPoint::default()))
            .unwrap();
        store
            .update_component("x", |c| c.position = GridPoint::new(3, 4))
            .unwrap();
        assert_eq!(
            store.active_circuit().unwrap().component("x").unwrap().position,
            GridPoint::new(3, 4)
        );
        assert!(store.remove_component("x").is_some());
        assert!(store.remove_component("x").is_none());
    }

    #[test]
    fn removing_a_wire_drops_its_junctions() {
        let mut store = CircuitStore::new();
        store.create_circuit("main");
        store.add_wire(wire("trunk")).unwrap();
        store.add_wire(wire("tap")).unwrap();
        store.active_circuit_mut().unwrap().junctions.push(WireJunction {
            pos: GridPoint::new(2, 0),
            source_wire_index: 0,
            connected_wire_id: "tap".into(),
        });
        let removed = store.remove_wire("trunk").unwrap();
        assert!(removed.has_id("trunk"));
        let circuit = store.active_circuit().unwrap();
        assert!(circuit.junctions.is_empty());
        assert_eq!(circuit.wires.len(), 1);
        assert!(store.remove_wire("trunk").is_none());
    }

    #[test]
    fn subcircuit_interface_comes_from_pins() {
        let mut store = CircuitStore::new();
        let id = store.create_circuit("Half Adder");
        store.add_component(labelled("a", ComponentKind::Input, "a")).unwrap();
        store.add_component(labelled("b", ComponentKind::Input, "")).unwrap();
        store.add_component(labelled("s", ComponentKind::Output, "sum")).unwrap();
        let props = store.subcircuit_props(&id).unwrap();
        assert_eq!(props.name, "Half Adder");
        assert_eq!(props.inputs, vec!["a".to_string(), "1".to_string()]);
        assert_eq!(props.outputs, vec!["sum".to_string()]);
    }

    #[test]
    fn doc_round_trip_keeps_active() {
        let mut store = CircuitStore::new();
        store.create_circuit("A");
        let b = store.create_circuit("B");
        store.set_active(&b).unwrap();
        let restored = CircuitStore::from_doc(store.to_doc());
        assert_eq!(restored.active_id(), Some(b.as_str()));
        assert_eq!(restored.len(), 2);
    }
}
