//! Static component registry.
//!
//! One [`RegistryEntry`] per [`ComponentType`], plus the per-kind port
//! layout and bounding box. Layouts are in local, unrotated grid units with
//! the component's top-left corner at the origin.

use crate::component::{ComponentKind, ComponentType, SelectorPosition};
use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Io,
    Logic,
    Wiring,
    Plexer,
    Memory,
    Arithmetic,
    Subcircuit,
}

/// Static description of one component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    pub ty: ComponentType,
    /// Tag used in saved documents.
    pub tag: &'static str,
    pub display_name: &'static str,
    pub category: Category,
    /// Engine module that provides the class.
    pub module: &'static str,
    pub class_name: &'static str,
    /// Generated variable names are `<var_prefix><n>`.
    pub var_prefix: &'static str,
    /// Connections must address ports by name even when there is only one.
    pub requires_named_ports: bool,
}

const fn entry_of(
    ty: ComponentType,
    tag: &'static str,
    display_name: &'static str,
    category: Category,
    module: &'static str,
    class_name: &'static str,
    var_prefix: &'static str,
    requires_named_ports: bool,
) -> RegistryEntry {
    RegistryEntry {
        ty,
        tag,
        display_name,
        category,
        module,
        class_name,
        var_prefix,
        requires_named_ports,
    }
}

use Category::*;
use ComponentType as T;

/// Indexed by `ComponentType as usize`; order must match [`ComponentType::ALL`].
pub static REGISTRY: [RegistryEntry; 26] = [
    entry_of(T::Input, "input", "Input", Io, "io", "Input", "input", false),
    entry_of(T::Output, "output", "Output", Io, "io", "Output", "output", false),
    entry_of(T::Constant, "constant", "Constant", Io, "io", "Constant", "constant", false),
    entry_of(T::Clock, "clock", "Clock", Io, "io", "Clock", "clk", false),
    entry_of(T::AndGate, "and-gate", "AND", Logic, "logic", "And", "and", false),
    entry_of(T::OrGate, "or-gate", "OR", Logic, "logic", "Or", "or", false),
    entry_of(T::XorGate, "xor-gate", "XOR", Logic, "logic", "Xor", "xor", false),
    entry_of(T::NandGate, "nand-gate", "NAND", Logic, "logic", "Nand", "nand", false),
    entry_of(T::NorGate, "nor-gate", "NOR", Logic, "logic", "Nor", "nor", false),
    entry_of(T::XnorGate, "xnor-gate", "XNOR", Logic, "logic", "Xnor", "xnor", false),
    entry_of(T::NotGate, "not-gate", "NOT", Logic, "logic", "Not", "not", false),
    entry_of(T::Splitter, "splitter", "Splitter", Wiring, "wires", "Splitter", "splitter", false),
    entry_of(T::Merger, "merger", "Merger", Wiring, "wires", "Merger", "merger", false),
    entry_of(T::Multiplexer, "multiplexer", "Multiplexer", Plexer, "plexers", "Multiplexer", "mux", false),
    entry_of(T::Decoder, "decoder", "Decoder", Plexer, "plexers", "Decoder", "decoder", true),
    entry_of(
        T::PriorityEncoder,
        "priority-encoder",
        "Priority Encoder",
        Plexer,
        "plexers",
        "PriorityEncoder",
        "priorityEncoder",
        true,
    ),
    entry_of(T::Register, "register", "Register", Memory, "memory", "Register", "reg", true),
    entry_of(T::Rom, "rom", "ROM", Memory, "memory", "ROM", "rom", true),
    entry_of(T::Ram, "ram", "RAM", Memory, "memory", "RAM", "ram", true),
    entry_of(T::Adder, "adder", "Adder", Arithmetic, "arithmetic", "Adder", "adder", true),
    entry_of(T::Subtract, "subtract", "Subtractor", Arithmetic, "arithmetic", "Subtract", "sub", true),
    entry_of(T::Multiply, "multiply", "Multiplier", Arithmetic, "arithmetic", "Multiply", "mul", true),
    entry_of(T::Divide, "divide", "Divider", Arithmetic, "arithmetic", "Divide", "div", true),
    entry_of(T::Compare, "compare", "Comparator", Arithmetic, "arithmetic", "Comparator", "comp", true),
    entry_of(T::Shift, "shift", "Barrel Shifter", Arithmetic, "arithmetic", "BarrelShifter", "shft", true),
    // Module, class and prefix come from the referenced circuit's name.
    entry_of(T::Subcircuit, "subcircuit", "Subcircuit", Subcircuit, "", "", "", true),
];

/// Registry entry for a type.
pub fn entry(ty: ComponentType) -> &'static RegistryEntry {
    &REGISTRY[ty as usize]
}

/// Look up an entry by its document tag.
pub fn lookup(tag: &str) -> Option<&'static RegistryEntry> {
    REGISTRY.iter().find(|e| e.tag == tag)
}

pub fn requires_named_ports(ty: ComponentType) -> bool {
    entry(ty).requires_named_ports
}

/// Turn a circuit name into a usable module/class identifier.
pub fn module_identifier(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

/// `(module, class)` that instantiates this kind in generated code.
pub fn class_path(kind: &ComponentKind) -> (Cow<'static, str>, Cow<'static, str>) {
    match kind {
        ComponentKind::Subcircuit(props) => {
            let ident = module_identifier(&props.name);
            (Cow::Owned(ident.clone()), Cow::Owned(ident))
        }
        other => {
            let e = entry(other.component_type());
            (Cow::Borrowed(e.module), Cow::Borrowed(e.class_name))
        }
    }
}

pub fn var_prefix(kind: &ComponentKind) -> Cow<'static, str> {
    match kind {
        ComponentKind::Subcircuit(props) => {
            Cow::Owned(module_identifier(&props.name).to_ascii_lowercase())
        }
        other => Cow::Borrowed(entry(other.component_type()).var_prefix),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Port layout
// ────────────────────────────────────────────────────────────────────────────

/// A port in local, unrotated grid coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPort {
    pub name: String,
    pub x: i32,
    pub y: i32,
}

impl LocalPort {
    pub fn new(name: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortLayout {
    pub inputs: Vec<LocalPort>,
    pub outputs: Vec<LocalPort>,
}

/// Ports named by their index, as the engine names gate and plexer pins.
fn numbered(count: usize, x: i32, y: impl Fn(i32) -> i32) -> Vec<LocalPort> {
    (0..count as i32)
        .map(|i| LocalPort::new(i.to_string(), x, y(i)))
        .collect()
}

fn named(ports: &[(&str, i32, i32)]) -> Vec<LocalPort> {
    ports
        .iter()
        .map(|&(name, x, y)| LocalPort::new(name, x, y))
        .collect()
}

/// `a / b` rounded half up, for non-negative operands.
fn div_round(a: i32, b: i32) -> i32 {
    (2 * a + b) / (2 * b)
}

fn gate_output_y(num_inputs: usize) -> i32 {
    if num_inputs <= 2 { 1 } else { num_inputs as i32 - 1 }
}

fn plexer_height(count: usize, min: i32) -> i32 {
    (2 * count as i32).max(min)
}

fn selector_y(selector: SelectorPosition, height: i32) -> i32 {
    match selector {
        SelectorPosition::Top => 0,
        SelectorPosition::Bottom => height,
    }
}

fn memory_output_x(address_bits: u32) -> i32 {
    (address_bits.div_ceil(2) as i32).max(4)
}

/// Base port layout of a kind, before per-port flag offsets.
pub fn port_layout(kind: &ComponentKind) -> PortLayout {
    match kind {
        ComponentKind::Input(_) | ComponentKind::Constant(_) | ComponentKind::Clock(_) => {
            PortLayout {
                inputs: Vec::new(),
                outputs: named(&[("0", 2, 1)]),
            }
        }
        ComponentKind::Output(_) => PortLayout {
            inputs: named(&[("0", 0, 1)]),
            outputs: Vec::new(),
        },
        ComponentKind::NotGate(_) => PortLayout {
            inputs: named(&[("0", 0, 1)]),
            outputs: named(&[("0", 3, 1)]),
        },
        ComponentKind::AndGate(p)
        | ComponentKind::OrGate(p)
        | ComponentKind::XorGate(p)
        | ComponentKind::NandGate(p)
        | ComponentKind::NorGate(p)
        | ComponentKind::XnorGate(p) => PortLayout {
            inputs: numbered(p.num_inputs, 0, |i| 2 * i),
            outputs: named(&[("0", 3, gate_output_y(p.num_inputs))]),
        },
        ComponentKind::Splitter(p) => {
            let k = p.ranges.len() as i32;
            PortLayout {
                inputs: named(&[("0", 0, k.max(1))]),
                outputs: numbered(p.ranges.len(), 2, |i| 2 * i + 1),
            }
        }
        ComponentKind::Merger(p) => {
            let k = p.ranges.len() as i32;
            PortLayout {
                inputs: numbered(p.ranges.len(), 0, |i| 2 * i + 1),
                outputs: named(&[("0", 2, k.max(1))]),
            }
        }
        ComponentKind::Multiplexer(p) => {
            let h = plexer_height(p.num_inputs, 4);
            let mut inputs = numbered(p.num_inputs, 0, |i| 1 + 2 * i);
            inputs.push(LocalPort::new("sel", 1, selector_y(p.selector, h)));
            PortLayout {
                inputs,
                outputs: named(&[("0", 2, h / 2)]),
            }
        }
        ComponentKind::Decoder(p) => {
            let h = plexer_height(p.num_outputs, 4);
            PortLayout {
                inputs: vec![LocalPort::new("sel", 1, selector_y(p.selector, h))],
                outputs: numbered(p.num_outputs, 2, |i| 1 + 2 * i),
            }
        }
        ComponentKind::PriorityEncoder(p) => {
            let h = plexer_height(p.num_inputs, 6);
            PortLayout {
                inputs: numbered(p.num_inputs, 0, |i| 1 + 2 * i),
                outputs: vec![
                    LocalPort::new("inum", 3, div_round(h, 3)),
                    LocalPort::new("any", 3, div_round(2 * h, 3)),
                ],
            }
        }
        ComponentKind::Register(_) => PortLayout {
            inputs: named(&[("D", 0, 1), ("CLK", 0, 3), ("en", 0, 5)]),
            outputs: named(&[("Q", 4, 3)]),
        },
        ComponentKind::Rom(p) => {
            let w = memory_output_x(p.address_bits);
            PortLayout {
                inputs: named(&[("A", 0, 1), ("sel", 0, 3)]),
                outputs: vec![LocalPort::new("D", w, (w + 1).max(5) / 2)],
            }
        }
        ComponentKind::Ram(p) => {
            let w = memory_output_x(p.address_bits);
            PortLayout {
                inputs: named(&[("A", 0, 1), ("D", 0, 3), ("str", 0, 5), ("sel", 0, 7), ("clr", 0, 9)]),
                outputs: vec![LocalPort::new("D", w, 5)],
            }
        }
        ComponentKind::Adder(_) => PortLayout {
            inputs: named(&[("a", 0, 1), ("b", 0, 3), ("cin", 0, 5)]),
            outputs: named(&[("sum", 4, 2), ("cout", 4, 4)]),
        },
        ComponentKind::Subtract(_) => PortLayout {
            inputs: named(&[("a", 0, 1), ("b", 0, 3), ("cin", 0, 5)]),
            outputs: named(&[("diff", 4, 2), ("cout", 4, 4)]),
        },
        ComponentKind::Multiply(_) => PortLayout {
            inputs: named(&[("a", 0, 1), ("b", 0, 3)]),
            outputs: named(&[("mul", 4, 2)]),
        },
        ComponentKind::Divide(_) => PortLayout {
            inputs: named(&[("a", 0, 1), ("b", 0, 3)]),
            outputs: named(&[("q", 4, 1), ("r", 4, 3)]),
        },
        ComponentKind::Compare(_) => PortLayout {
            inputs: named(&[("a", 0, 2), ("b", 0, 4)]),
            outputs: named(&[("lt", 4, 1), ("eq", 4, 3), ("gt", 4, 5)]),
        },
        ComponentKind::Shift(_) => PortLayout {
            inputs: named(&[("in", 0, 1), ("shift", 0, 3)]),
            outputs: named(&[("out", 4, 2)]),
        },
        ComponentKind::Subcircuit(p) => PortLayout {
            inputs: p
                .inputs
                .iter()
                .enumerate()
                .map(|(i, name)| LocalPort::new(name.clone(), 0, 1 + 2 * i as i32))
                .collect(),
            outputs: p
                .outputs
                .iter()
                .enumerate()
                .map(|(i, name)| LocalPort::new(name.clone(), 4, 1 + 2 * i as i32))
                .collect(),
        },
    }
}

/// Unrotated bounding box `(width, height)` in grid units.
pub fn dimensions(kind: &ComponentKind) -> (i32, i32) {
    match kind {
        ComponentKind::Input(_)
        | ComponentKind::Output(_)
        | ComponentKind::Constant(_)
        | ComponentKind::Clock(_) => (2, 2),
        ComponentKind::NotGate(_) => (3, 2),
        ComponentKind::AndGate(p)
        | ComponentKind::OrGate(p)
        | ComponentKind::XorGate(p)
        | ComponentKind::NandGate(p)
        | ComponentKind::NorGate(p)
        | ComponentKind::XnorGate(p) => (3, (2 * (p.num_inputs as i32 - 1)).max(2)),
        ComponentKind::Splitter(p) | ComponentKind::Merger(p) => {
            (2, (2 * p.ranges.len() as i32).max(2))
        }
        ComponentKind::Multiplexer(p) => (2, plexer_height(p.num_inputs, 4)),
        ComponentKind::Decoder(p) => (2, plexer_height(p.num_outputs, 4)),
        ComponentKind::PriorityEncoder(p) => (3, plexer_height(p.num_inputs, 6)),
        ComponentKind::Register(_) => (4, 6),
        ComponentKind::Rom(p) => (memory_output_x(p.address_bits), 5),
        ComponentKind::Ram(p) => (memory_output_x(p.address_bits), 10),
        ComponentKind::Adder(_) | ComponentKind::Subtract(_) => (4, 6),
        ComponentKind::Multiply(_) | ComponentKind::Divide(_) | ComponentKind::Shift(_) => (4, 4),
        ComponentKind::Compare(_) => (4, 6),
        ComponentKind::Subcircuit(p) => (4, (2 * p.inputs.len().max(p.outputs.len()) as i32).max(2)),
    }
}
