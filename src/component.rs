//! Component instances and their typed property sets.
//!
//! Every component kind carries its own property struct. Missing fields take
//! the kind's defaults when deserializing, so `{"type": "and-gate",
//! "props": {}}` is a plain two-input AND gate.

use crate::error::CircuitError;
use crate::model::{GridPoint, Rotation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ────────────────────────────────────────────────────────────────────────────
// Component types
// ────────────────────────────────────────────────────────────────────────────

/// The closed set of component types the editor knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentType {
    Input,
    Output,
    Constant,
    Clock,
    AndGate,
    OrGate,
    XorGate,
    NandGate,
    NorGate,
    XnorGate,
    NotGate,
    Splitter,
    Merger,
    Multiplexer,
    Decoder,
    PriorityEncoder,
    Register,
    Rom,
    Ram,
    Adder,
    Subtract,
    Multiply,
    Divide,
    Compare,
    Shift,
    Subcircuit,
}

impl ComponentType {
    /// All types, in registry order.
    pub const ALL: [ComponentType; 26] = [
        ComponentType::Input,
        ComponentType::Output,
        ComponentType::Constant,
        ComponentType::Clock,
        ComponentType::AndGate,
        ComponentType::OrGate,
        ComponentType::XorGate,
        ComponentType::NandGate,
        ComponentType::NorGate,
        ComponentType::XnorGate,
        ComponentType::NotGate,
        ComponentType::Splitter,
        ComponentType::Merger,
        ComponentType::Multiplexer,
        ComponentType::Decoder,
        ComponentType::PriorityEncoder,
        ComponentType::Register,
        ComponentType::Rom,
        ComponentType::Ram,
        ComponentType::Adder,
        ComponentType::Subtract,
        ComponentType::Multiply,
        ComponentType::Divide,
        ComponentType::Compare,
        ComponentType::Shift,
        ComponentType::Subcircuit,
    ];

    /// The tag used in saved documents.
    pub fn as_str(self) -> &'static str {
        crate::registry::entry(self).tag
    }

    /// A component kind of this type with default properties.
    pub fn default_kind(self) -> ComponentKind {
        match self {
            ComponentType::Input => ComponentKind::Input(IoProps::default()),
            ComponentType::Output => ComponentKind::Output(IoProps::default()),
            ComponentType::Constant => ComponentKind::Constant(IoProps::default()),
            ComponentType::Clock => ComponentKind::Clock(ClockProps::default()),
            ComponentType::AndGate => ComponentKind::AndGate(GateProps::default()),
            ComponentType::OrGate => ComponentKind::OrGate(GateProps::default()),
            ComponentType::XorGate => ComponentKind::XorGate(GateProps::default()),
            ComponentType::NandGate => ComponentKind::NandGate(GateProps::default()),
            ComponentType::NorGate => ComponentKind::NorGate(GateProps::default()),
            ComponentType::XnorGate => ComponentKind::XnorGate(GateProps::default()),
            ComponentType::NotGate => ComponentKind::NotGate(GateProps::default()),
            ComponentType::Splitter => ComponentKind::Splitter(SplitterProps::default()),
            ComponentType::Merger => ComponentKind::Merger(SplitterProps::default()),
            ComponentType::Multiplexer => ComponentKind::Multiplexer(MuxProps::default()),
            ComponentType::Decoder => ComponentKind::Decoder(DecoderProps::default()),
            ComponentType::PriorityEncoder => {
                ComponentKind::PriorityEncoder(PriorityEncoderProps::default())
            }
            ComponentType::Register => ComponentKind::Register(RegisterProps::default()),
            ComponentType::Rom => ComponentKind::Rom(MemoryProps::default()),
            ComponentType::Ram => ComponentKind::Ram(MemoryProps::default()),
            ComponentType::Adder => ComponentKind::Adder(ArithmeticProps::default()),
            ComponentType::Subtract => ComponentKind::Subtract(ArithmeticProps::default()),
            ComponentType::Multiply => ComponentKind::Multiply(ArithmeticProps::default()),
            ComponentType::Divide => ComponentKind::Divide(ArithmeticProps::default()),
            ComponentType::Compare => ComponentKind::Compare(ArithmeticProps::default()),
            ComponentType::Shift => ComponentKind::Shift(ShiftProps::default()),
            ComponentType::Subcircuit => ComponentKind::Subcircuit(SubcircuitProps::default()),
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = CircuitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::registry::lookup(s)
            .map(|entry| entry.ty)
            .ok_or_else(|| CircuitError::UnknownComponentType(s.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Property structs
// ────────────────────────────────────────────────────────────────────────────

/// Display base for I/O values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum NumberBase {
    Binary,
    #[default]
    Decimal,
    Hex,
}

impl TryFrom<u32> for NumberBase {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(NumberBase::Binary),
            10 => Ok(NumberBase::Decimal),
            16 => Ok(NumberBase::Hex),
            other => Err(format!("unsupported number base {other}")),
        }
    }
}

impl From<NumberBase> for u32 {
    fn from(base: NumberBase) -> Self {
        match base {
            NumberBase::Binary => 2,
            NumberBase::Decimal => 10,
            NumberBase::Hex => 16,
        }
    }
}

/// Inputs, outputs and constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoProps {
    pub label: String,
    pub bits: u32,
    pub value: u64,
    pub base: NumberBase,
}

impl Default for IoProps {
    fn default() -> Self {
        Self {
            label: String::new(),
            bits: 1,
            value: 0,
            base: NumberBase::Decimal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockProps {
    pub label: String,
    pub frequency: u32,
}

impl Default for ClockProps {
    fn default() -> Self {
        Self {
            label: String::new(),
            frequency: 1,
        }
    }
}

/// Logic gates. NOT gates always have exactly one input and ignore
/// `num_inputs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateProps {
    pub label: String,
    pub bits: u32,
    pub num_inputs: usize,
    /// Indices of inputs drawn with an inversion bubble.
    pub inverted_inputs: Vec<usize>,
}

impl Default for GateProps {
    fn default() -> Self {
        Self {
            label: String::new(),
            bits: 1,
            num_inputs: 2,
            inverted_inputs: Vec::new(),
        }
    }
}

impl GateProps {
    pub fn with_inputs(num_inputs: usize) -> Self {
        Self {
            num_inputs,
            ..Self::default()
        }
    }

    pub fn is_inverted(&self, input: usize) -> bool {
        self.inverted_inputs.contains(&input)
    }
}

/// Inclusive bit range of a splitter output or merger input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitRange {
    pub start: u32,
    pub end: u32,
}

/// Splitters and mergers. `bits` is the width of the wide side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterProps {
    pub label: String,
    pub bits: u32,
    pub ranges: Vec<BitRange>,
}

impl Default for SplitterProps {
    fn default() -> Self {
        Self {
            label: String::new(),
            bits: 8,
            ranges: (0..4)
                .map(|i| BitRange {
                    start: 2 * i,
                    end: 2 * i + 1,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorPosition {
    Top,
    #[default]
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MuxProps {
    pub label: String,
    pub bits: u32,
    pub num_inputs: usize,
    pub selector: SelectorPosition,
}

impl Default for MuxProps {
    fn default() -> Self {
        Self {
            label: String::new(),
            bits: 1,
            num_inputs: 4,
            selector: SelectorPosition::Bottom,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderProps {
    pub label: String,
    pub num_outputs: usize,
    pub selector: SelectorPosition,
}

impl Default for DecoderProps {
    fn default() -> Self {
        Self {
            label: String::new(),
            num_outputs: 4,
            selector: SelectorPosition::Bottom,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityEncoderProps {
    pub label: String,
    pub num_inputs: usize,
}

impl Default for PriorityEncoderProps {
    fn default() -> Self {
        Self {
            label: String::new(),
            num_inputs: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterProps {
    pub label: String,
    pub bits: u32,
}

impl Default for RegisterProps {
    fn default() -> Self {
        Self {
            label: String::new(),
            bits: 8,
        }
    }
}

/// ROM and RAM. `data` holds cell contents from address 0 upward; missing
/// cells read as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryProps {
    pub label: String,
    pub address_bits: u32,
    pub data_bits: u32,
    pub data: Vec<u64>,
}

impl Default for MemoryProps {
    fn default() -> Self {
        Self {
            label: String::new(),
            address_bits: 4,
            data_bits: 8,
            data: Vec::new(),
        }
    }
}

impl MemoryProps {
    pub fn cell_count(&self) -> usize {
        1usize << self.address_bits.min(24)
    }

    pub fn max_value(&self) -> u64 {
        if self.data_bits >= 64 {
            u64::MAX
        } else {
            (1u64 << self.data_bits) - 1
        }
    }

    /// Full memory image, clamped to the data width.
    pub fn image(&self) -> Vec<u64> {
        let max = self.max_value();
        let mut cells = vec![0; self.cell_count()];
        for (cell, value) in cells.iter_mut().zip(&self.data) {
            *cell = (*value).min(max);
        }
        cells
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArithmeticProps {
    pub label: String,
    pub bits: u32,
}

impl Default for ArithmeticProps {
    fn default() -> Self {
        Self {
            label: String::new(),
            bits: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftMode {
    #[default]
    LogicalLeft,
    LogicalRight,
    ArithmeticRight,
}

impl ShiftMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ShiftMode::LogicalLeft => "logical_left",
            ShiftMode::LogicalRight => "logical_right",
            ShiftMode::ArithmeticRight => "arithmetic_right",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftProps {
    pub label: String,
    pub bits: u32,
    pub mode: ShiftMode,
}

impl Default for ShiftProps {
    fn default() -> Self {
        Self {
            label: String::new(),
            bits: 8,
            mode: ShiftMode::LogicalLeft,
        }
    }
}

/// An instance of another circuit. The port names are captured from the
/// referenced circuit's input and output pins when the instance is placed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubcircuitProps {
    pub circuit_id: String,
    pub name: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// ComponentKind
// ────────────────────────────────────────────────────────────────────────────

/// Component type plus its properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "props", rename_all = "kebab-case")]
pub enum ComponentKind {
    Input(IoProps),
    Output(IoProps),
    Constant(IoProps),
    Clock(ClockProps),
    AndGate(GateProps),
    OrGate(GateProps),
    XorGate(GateProps),
    NandGate(GateProps),
    NorGate(GateProps),
    XnorGate(GateProps),
    NotGate(GateProps),
    Splitter(SplitterProps),
    Merger(SplitterProps),
    Multiplexer(MuxProps),
    Decoder(DecoderProps),
    PriorityEncoder(PriorityEncoderProps),
    Register(RegisterProps),
    Rom(MemoryProps),
    Ram(MemoryProps),
    Adder(ArithmeticProps),
    Subtract(ArithmeticProps),
    Multiply(ArithmeticProps),
    Divide(ArithmeticProps),
    Compare(ArithmeticProps),
    Shift(ShiftProps),
    Subcircuit(SubcircuitProps),
}

impl ComponentKind {
    pub fn component_type(&self) -> ComponentType {
        match self {
            ComponentKind::Input(_) => ComponentType::Input,
            ComponentKind::Output(_) => ComponentType::Output,
            ComponentKind::Constant(_) => ComponentType::Constant,
            ComponentKind::Clock(_) => ComponentType::Clock,
            ComponentKind::AndGate(_) => ComponentType::AndGate,
            ComponentKind::OrGate(_) => ComponentType::OrGate,
            ComponentKind::XorGate(_) => ComponentType::XorGate,
            ComponentKind::NandGate(_) => ComponentType::NandGate,
            ComponentKind::NorGate(_) => ComponentType::NorGate,
            ComponentKind::XnorGate(_) => ComponentType::XnorGate,
            ComponentKind::NotGate(_) => ComponentType::NotGate,
            ComponentKind::Splitter(_) => ComponentType::Splitter,
            ComponentKind::Merger(_) => ComponentType::Merger,
            ComponentKind::Multiplexer(_) => ComponentType::Multiplexer,
            ComponentKind::Decoder(_) => ComponentType::Decoder,
            ComponentKind::PriorityEncoder(_) => ComponentType::PriorityEncoder,
            ComponentKind::Register(_) => ComponentType::Register,
            ComponentKind::Rom(_) => ComponentType::Rom,
            ComponentKind::Ram(_) => ComponentType::Ram,
            ComponentKind::Adder(_) => ComponentType::Adder,
            ComponentKind::Subtract(_) => ComponentType::Subtract,
            ComponentKind::Multiply(_) => ComponentType::Multiply,
            ComponentKind::Divide(_) => ComponentType::Divide,
            ComponentKind::Compare(_) => ComponentType::Compare,
            ComponentKind::Shift(_) => ComponentType::Shift,
            ComponentKind::Subcircuit(_) => ComponentType::Subcircuit,
        }
    }

    /// Gate properties, for any of the logic gate kinds.
    pub fn gate_props(&self) -> Option<&GateProps> {
        match self {
            ComponentKind::AndGate(p)
            | ComponentKind::OrGate(p)
            | ComponentKind::XorGate(p)
            | ComponentKind::NandGate(p)
            | ComponentKind::NorGate(p)
            | ComponentKind::XnorGate(p)
            | ComponentKind::NotGate(p) => Some(p),
            _ => None,
        }
    }

    pub fn io_props(&self) -> Option<&IoProps> {
        match self {
            ComponentKind::Input(p) | ComponentKind::Output(p) | ComponentKind::Constant(p) => {
                Some(p)
            }
            _ => None,
        }
    }

    /// The user-visible label. Subcircuits are labelled by their circuit name.
    pub fn label(&self) -> &str {
        match self {
            ComponentKind::Input(p) | ComponentKind::Output(p) | ComponentKind::Constant(p) => {
                &p.label
            }
            ComponentKind::Clock(p) => &p.label,
            ComponentKind::AndGate(p)
            | ComponentKind::OrGate(p)
            | ComponentKind::XorGate(p)
            | ComponentKind::NandGate(p)
            | ComponentKind::NorGate(p)
            | ComponentKind::XnorGate(p)
            | ComponentKind::NotGate(p) => &p.label,
            ComponentKind::Splitter(p) | ComponentKind::Merger(p) => &p.label,
            ComponentKind::Multiplexer(p) => &p.label,
            ComponentKind::Decoder(p) => &p.label,
            ComponentKind::PriorityEncoder(p) => &p.label,
            ComponentKind::Register(p) => &p.label,
            ComponentKind::Rom(p) | ComponentKind::Ram(p) => &p.label,
            ComponentKind::Adder(p)
            | ComponentKind::Subtract(p)
            | ComponentKind::Multiply(p)
            | ComponentKind::Divide(p)
            | ComponentKind::Compare(p) => &p.label,
            ComponentKind::Shift(p) => &p.label,
            ComponentKind::Subcircuit(p) => &p.name,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Component
// ────────────────────────────────────────────────────────────────────────────

/// A placed component instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: String,
    pub kind: ComponentKind,
    #[serde(default)]
    pub position: GridPoint,
    #[serde(default)]
    pub rotation: Rotation,
}

impl Component {
    pub fn new(id: impl Into<String>, kind: ComponentKind, position: GridPoint) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            rotation: Rotation::R0,
        }
    }

    /// A component of the given type with default properties.
    pub fn of_type(id: impl Into<String>, ty: ComponentType, position: GridPoint) -> Self {
        Self::new(id, ty.default_kind(), position)
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn component_type(&self) -> ComponentType {
        self.kind.component_type()
    }
}
