use crate::component::Component;
use crate::error::CircuitError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ────────────────────────────────────────────────────────────────────────────
// CircuitDoc – JSON document wrapper
// ────────────────────────────────────────────────────────────────────────────

const DOC_VERSION: u32 = 1;

fn doc_version() -> u32 {
    DOC_VERSION
}

/// A saved set of circuits plus the id of the one being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitDoc {
    #[serde(default = "doc_version")]
    pub version: u32,
    pub circuits: Vec<Circuit>,
    #[serde(default)]
    pub active: Option<String>,
}

/// On disk a file may hold either a full document or a single circuit.
#[derive(Deserialize)]
#[serde(untagged)]
enum DocOrCircuit {
    Doc(CircuitDoc),
    Circuit(Circuit),
}

impl CircuitDoc {
    pub fn new(circuits: Vec<Circuit>) -> Self {
        let active = circuits.first().map(|c| c.id.clone());
        Self {
            version: DOC_VERSION,
            circuits,
            active,
        }
    }

    /// Parse a document (or a bare circuit) from JSON text.
    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        let doc = match serde_json::from_str::<DocOrCircuit>(text)? {
            DocOrCircuit::Doc(doc) => doc,
            DocOrCircuit::Circuit(circuit) => CircuitDoc::new(vec![circuit]),
        };
        if doc.version != DOC_VERSION {
            anyhow::bail!("Unsupported document version: {}", doc.version);
        }
        Ok(doc)
    }

    /// Save the document as pretty-printed JSON.
    pub fn save_to_json<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Load a document from a JSON file, checking the version.
    pub fn load_from_json<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// The active circuit, falling back to the first one.
    pub fn active_circuit(&self) -> Option<&Circuit> {
        self.active
            .as_deref()
            .and_then(|id| self.circuits.iter().find(|c| c.id == id))
            .or_else(|| self.circuits.first())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Grid primitives
// ────────────────────────────────────────────────────────────────────────────

/// A point on the editor grid. Grid units, never pixels.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn manhattan(self, other: GridPoint) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for GridPoint {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Component rotation in quarter turns, clockwise on a y-down grid.
///
/// Serialized as a plain number of degrees; anything other than
/// 0/90/180/270 is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [Rotation::R0, Rotation::R90, Rotation::R180, Rotation::R270];

    pub fn from_degrees(degrees: i64) -> Result<Self, CircuitError> {
        match degrees {
            0 => Ok(Rotation::R0),
            90 => Ok(Rotation::R90),
            180 => Ok(Rotation::R180),
            270 => Ok(Rotation::R270),
            other => Err(CircuitError::InvalidRotation(other)),
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 90,
            Rotation::R180 => 180,
            Rotation::R270 => 270,
        }
    }

    /// The next quarter turn clockwise (270 wraps to 0).
    pub fn clockwise(self) -> Self {
        match self {
            Rotation::R0 => Rotation::R90,
            Rotation::R90 => Rotation::R180,
            Rotation::R180 => Rotation::R270,
            Rotation::R270 => Rotation::R0,
        }
    }

    pub fn counter_clockwise(self) -> Self {
        match self {
            Rotation::R0 => Rotation::R270,
            Rotation::R90 => Rotation::R0,
            Rotation::R180 => Rotation::R90,
            Rotation::R270 => Rotation::R180,
        }
    }

    /// Rotate an offset vector. The matrices only contain 0 and ±1, so the
    /// result is exact.
    pub fn apply(self, dx: i32, dy: i32) -> (i32, i32) {
        match self {
            Rotation::R0 => (dx, dy),
            Rotation::R90 => (-dy, dx),
            Rotation::R180 => (-dx, -dy),
            Rotation::R270 => (dy, -dx),
        }
    }

    /// Rotate `point` about `pivot`.
    pub fn rotate_about(self, point: GridPoint, pivot: GridPoint) -> GridPoint {
        let (dx, dy) = self.apply(point.x - pivot.x, point.y - pivot.y);
        GridPoint::new(pivot.x + dx, pivot.y + dy)
    }
}

impl TryFrom<i64> for Rotation {
    type Error = CircuitError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Rotation::from_degrees(value)
    }
}

impl From<Rotation> for i64 {
    fn from(r: Rotation) -> Self {
        r.degrees() as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    pub fn opposite(self) -> Self {
        match self {
            PortDirection::Input => PortDirection::Output,
            PortDirection::Output => PortDirection::Input,
        }
    }
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PortDirection::Input => "input",
            PortDirection::Output => "output",
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wires and junctions
// ────────────────────────────────────────────────────────────────────────────

/// Cached description of what a wire end is attached to.
///
/// The cache may drift from geometry; the validator always re-resolves
/// the wire's first and last points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEnd {
    #[serde(default)]
    pub component_id: Option<String>,
    #[serde(default)]
    pub port_index: usize,
    pub port_type: PortDirection,
    pub pos: GridPoint,
}

impl WireEnd {
    pub fn attached(
        component_id: impl Into<String>,
        port_type: PortDirection,
        port_index: usize,
        pos: GridPoint,
    ) -> Self {
        Self {
            component_id: Some(component_id.into()),
            port_index,
            port_type,
            pos,
        }
    }

    /// An end that is not (yet) attached to a component, e.g. a junction tap.
    pub fn detached(port_type: PortDirection, pos: GridPoint) -> Self {
        Self {
            component_id: None,
            port_index: 0,
            port_type,
            pos,
        }
    }

    pub fn is_attached_to(&self, component_id: &str) -> bool {
        self.component_id.as_deref() == Some(component_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wire {
    /// Wires loaded from older documents may not carry an id.
    #[serde(default)]
    pub id: Option<String>,
    pub points: Vec<GridPoint>,
    pub start: WireEnd,
    pub end: WireEnd,
}

impl Wire {
    /// Build a wire whose path is routed from `start.pos` to `end.pos`
    /// through `waypoints`.
    pub fn routed(
        id: Option<String>,
        start: WireEnd,
        end: WireEnd,
        waypoints: &[GridPoint],
    ) -> Self {
        let points = crate::routing::route(start.pos, end.pos, waypoints);
        Self {
            id,
            points,
            start,
            end,
        }
    }

    /// Geometric start of the wire.
    pub fn start_point(&self) -> GridPoint {
        self.points.first().copied().unwrap_or(self.start.pos)
    }

    /// Geometric end of the wire.
    pub fn end_point(&self) -> GridPoint {
        self.points.last().copied().unwrap_or(self.end.pos)
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.id.as_deref() == Some(id)
    }

    pub fn touches_component(&self, component_id: &str) -> bool {
        self.start.is_attached_to(component_id) || self.end.is_attached_to(component_id)
    }

    /// Re-sync the cached end positions with the first and last points.
    pub fn sync_end_positions(&mut self) {
        if let (Some(&first), Some(&last)) = (self.points.first(), self.points.last()) {
            self.start.pos = first;
            self.end.pos = last;
        }
    }

    pub fn translate(&mut self, dx: i32, dy: i32) {
        self.points = crate::routing::translate_path(&self.points, dx, dy);
        self.start.pos = self.start.pos.offset(dx, dy);
        self.end.pos = self.end.pos.offset(dx, dy);
    }
}

/// A point where wire `connected_wire_id` taps into the path of the wire at
/// `source_wire_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireJunction {
    pub pos: GridPoint,
    pub source_wire_index: usize,
    pub connected_wire_id: String,
}

/// How commands and callers address a wire: by id when it has one, by
/// position in the circuit's wire list otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireKey {
    Id(String),
    Index(usize),
}

impl WireKey {
    pub fn for_wire(wire: &Wire, index: usize) -> Self {
        match &wire.id {
            Some(id) => WireKey::Id(id.clone()),
            None => WireKey::Index(index),
        }
    }
}

impl fmt::Display for WireKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireKey::Id(id) => write!(f, "`{id}`"),
            WireKey::Index(i) => write!(f, "#{i}"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Circuit
// ────────────────────────────────────────────────────────────────────────────

/// Components keyed by id, in declaration order.
pub type ComponentMap = IndexMap<String, Component>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    pub id: String,
    pub name: String,
    #[serde(default, with = "component_list")]
    pub components: ComponentMap,
    #[serde(default)]
    pub wires: Vec<Wire>,
    #[serde(default)]
    pub junctions: Vec<WireJunction>,
}

impl Circuit {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            components: ComponentMap::new(),
            wires: Vec::new(),
            junctions: Vec::new(),
        }
    }

    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.get(id)
    }

    pub fn component_mut(&mut self, id: &str) -> Option<&mut Component> {
        self.components.get_mut(id)
    }

    /// Insert a component at `index` (or at the end), keeping ids unique.
    /// Returns the position it landed at.
    pub fn insert_component(
        &mut self,
        index: Option<usize>,
        component: Component,
    ) -> Result<usize, CircuitError> {
        if self.components.contains_key(&component.id) {
            return Err(CircuitError::DuplicateComponentId(component.id));
        }
        let len = self.components.len();
        match index {
            Some(i) if i > len => Err(CircuitError::IndexOutOfRange { index: i, len }),
            Some(i) => {
                self.components.shift_insert(i, component.id.clone(), component);
                Ok(i)
            }
            None => {
                self.components.insert(component.id.clone(), component);
                Ok(len)
            }
        }
    }

    /// Remove a component, returning its former position and value.
    pub fn remove_component(&mut self, id: &str) -> Option<(usize, Component)> {
        self.components
            .shift_remove_full(id)
            .map(|(index, _, component)| (index, component))
    }

    pub fn wire_index(&self, key: &WireKey) -> Option<usize> {
        match key {
            WireKey::Id(id) => self.wires.iter().position(|w| w.has_id(id)),
            WireKey::Index(i) => (*i < self.wires.len()).then_some(*i),
        }
    }

    pub fn wire_by_id(&self, id: &str) -> Option<(usize, &Wire)> {
        self.wires.iter().enumerate().find(|(_, w)| w.has_id(id))
    }

    /// Insert a wire, shifting junction references to wires at or after
    /// `index`.
    pub fn insert_wire(&mut self, index: Option<usize>, wire: Wire) -> Result<usize, CircuitError> {
        if let Some(id) = &wire.id {
            if self.wire_by_id(id).is_some() {
                return Err(CircuitError::DuplicateWireId(id.clone()));
            }
        }
        let len = self.wires.len();
        let index = index.unwrap_or(len);
        if index > len {
            return Err(CircuitError::IndexOutOfRange { index, len });
        }
        self.wires.insert(index, wire);
        for junction in &mut self.junctions {
            if junction.source_wire_index >= index {
                junction.source_wire_index += 1;
            }
        }
        Ok(index)
    }

    /// Remove the wire at `index`. Junctions tapping later wires are
    /// re-indexed; junctions touching this wire must be detached first
    /// (see [`Circuit::junctions_touching`]).
    pub fn remove_wire_at(&mut self, index: usize) -> Option<Wire> {
        if index >= self.wires.len() {
            return None;
        }
        let wire = self.wires.remove(index);
        for junction in &mut self.junctions {
            if junction.source_wire_index > index {
                junction.source_wire_index -= 1;
            }
        }
        Some(wire)
    }

    /// Indices of junctions that tap the wire at `index` or whose tapping
    /// wire is that wire, ascending.
    pub fn junctions_touching(&self, index: usize) -> Vec<usize> {
        let wire_id = self.wires.get(index).and_then(|w| w.id.as_deref());
        self.junctions
            .iter()
            .enumerate()
            .filter(|(_, j)| {
                j.source_wire_index == index || Some(j.connected_wire_id.as_str()) == wire_id
            })
            .map(|(i, _)| i)
            .collect()
    }

    pub fn insert_junction(
        &mut self,
        index: Option<usize>,
        junction: WireJunction,
    ) -> Result<usize, CircuitError> {
        let len = self.junctions.len();
        let index = index.unwrap_or(len);
        if index > len {
            return Err(CircuitError::IndexOutOfRange { index, len });
        }
        self.junctions.insert(index, junction);
        Ok(index)
    }

    pub fn remove_junction(&mut self, index: usize) -> Option<WireJunction> {
        (index < self.junctions.len()).then(|| self.junctions.remove(index))
    }

    /// The junction through which the wire with `wire_id` taps another wire.
    pub fn junction_for_tap(&self, wire_id: &str) -> Option<&WireJunction> {
        self.junctions.iter().find(|j| j.connected_wire_id == wire_id)
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.wires.is_empty()
    }
}

/// Serialize the component map as a plain list; ids live inside each entry.
mod component_list {
    use super::ComponentMap;
    use crate::component::Component;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(map: &ComponentMap, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(map.values())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ComponentMap, D::Error> {
        let list = Vec::<Component>::deserialize(deserializer)?;
        let mut map = ComponentMap::with_capacity(list.len());
        for component in list {
            if map.contains_key(&component.id) {
                return Err(D::Error::custom(format!(
                    "duplicate component id `{}`",
                    component.id
                )));
            }
            map.insert(component.id.clone(), component);
        }
        Ok(map)
    }
}
