//! GGL program generator.
//!
//! Turns a circuit into the program text consumed by the GGL simulation
//! engine. Wires are resolved through [`validate`], so only wires whose
//! geometry lands on exactly one port at each end produce `connect` lines.
//!
//! Output is deterministic: components are emitted in declaration order and
//! variable counters restart for every call.

use super::pyfmt::{Kwargs, PyValue, escape_str, format_io_value};
use crate::component::{Component, ComponentKind, SplitterProps};
use crate::config::GeneratorOptions;
use crate::geometry::connections_for;
use crate::model::{Circuit, ComponentMap, PortDirection, Wire, WireJunction};
use crate::registry::{self, module_identifier};
use crate::validate::{ValidationReport, validate};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Result of one generation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedProgram {
    pub code: String,
    /// GGL modules imported by the header, always including `circuit`.
    pub imports: BTreeSet<String>,
    /// Sub-circuit modules imported with `from <Name> import <Name>`.
    pub component_imports: BTreeSet<String>,
    /// Component id to generated variable name, in emission order.
    pub var_names: IndexMap<String, String>,
    /// The validation pass the connections were taken from.
    pub report: ValidationReport,
}

impl GeneratedProgram {
    pub fn var_name(&self, component_id: &str) -> Option<&str> {
        self.var_names.get(component_id).map(String::as_str)
    }

    /// True when every wire resolved; otherwise some wires were skipped.
    pub fn is_complete(&self) -> bool {
        self.report.valid
    }
}

/// Hands out `<prefix><n>` names, counting per prefix and skipping names
/// that are already taken.
struct Namer {
    counters: HashMap<String, usize>,
    taken: HashSet<String>,
}

impl Namer {
    fn new(reserved: impl IntoIterator<Item = String>) -> Self {
        Self {
            counters: HashMap::new(),
            taken: reserved.into_iter().collect(),
        }
    }

    fn next(&mut self, prefix: &str) -> String {
        let mut prefix = prefix.to_string();
        if prefix.ends_with(|c: char| c.is_ascii_digit()) {
            prefix.push('_');
        }
        let counter = self.counters.entry(prefix.clone()).or_insert(0);
        loop {
            let candidate = format!("{prefix}{counter}");
            *counter += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

fn ranges_value(props: &SplitterProps) -> PyValue {
    PyValue::List(
        props
            .ranges
            .iter()
            .map(|r| PyValue::Tuple(vec![PyValue::Int(r.start as u64), PyValue::Int(r.end as u64)]))
            .collect(),
    )
}

fn int(v: impl Into<u64>) -> PyValue {
    PyValue::Int(v.into())
}

/// Constructor keyword arguments, label first, without the id tag.
fn kwargs_for(kind: &ComponentKind) -> Kwargs {
    let mut kw = Kwargs::new();
    if !matches!(kind, ComponentKind::Subcircuit(_)) {
        kw.label(kind.label());
    }
    match kind {
        ComponentKind::Input(p) | ComponentKind::Output(p) | ComponentKind::Constant(p) => {
            kw.push_unless("bits", int(p.bits), int(1u32));
        }
        ComponentKind::Clock(p) => {
            kw.push("frequency", int(p.frequency));
        }
        ComponentKind::NotGate(p) => {
            kw.push_unless("bits", int(p.bits), int(1u32));
        }
        ComponentKind::AndGate(p)
        | ComponentKind::OrGate(p)
        | ComponentKind::XorGate(p)
        | ComponentKind::NandGate(p)
        | ComponentKind::NorGate(p)
        | ComponentKind::XnorGate(p) => {
            kw.push_unless("bits", int(p.bits), int(1u32))
                .push_unless("num_inputs", int(p.num_inputs as u64), int(2u32));
            if !p.inverted_inputs.is_empty() {
                let inverted = p.inverted_inputs.iter().map(|&i| int(i as u64)).collect();
                kw.push("inverted_inputs", PyValue::List(inverted));
            }
        }
        ComponentKind::Splitter(p) => {
            kw.push("bits", int(p.bits)).push("splits", ranges_value(p));
        }
        ComponentKind::Merger(p) => {
            kw.push("bits", int(p.bits)).push("merge_inputs", ranges_value(p));
        }
        ComponentKind::Multiplexer(p) => {
            kw.push_unless("bits", int(p.bits), int(1u32))
                .push("num_inputs", int(p.num_inputs as u64));
        }
        ComponentKind::Decoder(p) => {
            kw.push("num_outputs", int(p.num_outputs as u64));
        }
        ComponentKind::PriorityEncoder(p) => {
            kw.push("num_inputs", int(p.num_inputs as u64));
        }
        ComponentKind::Register(p) => {
            kw.push("bits", int(p.bits));
        }
        ComponentKind::Rom(p) => {
            let image = p.image().into_iter().map(PyValue::Int).collect();
            kw.push("address_bits", int(p.address_bits))
                .push("data_bits", int(p.data_bits))
                .push("data", PyValue::List(image));
        }
        ComponentKind::Ram(p) => {
            kw.push("address_bits", int(p.address_bits))
                .push("data_bits", int(p.data_bits));
        }
        ComponentKind::Adder(p)
        | ComponentKind::Subtract(p)
        | ComponentKind::Multiply(p)
        | ComponentKind::Divide(p)
        | ComponentKind::Compare(p) => {
            kw.push("bits", int(p.bits));
        }
        ComponentKind::Shift(p) => {
            kw.push("bits", int(p.bits))
                .push("mode", PyValue::Str(p.mode.as_str().to_string()));
        }
        ComponentKind::Subcircuit(_) => {}
    }
    kw
}

fn instantiation(var: &str, component: &Component) -> String {
    let (module, class) = registry::class_path(&component.kind);
    let kwargs = kwargs_for(&component.kind);
    let callee = match &component.kind {
        ComponentKind::Subcircuit(_) => class.into_owned(),
        _ => format!("{module}.{class}"),
    };
    let id_tag = format!("js_id=\"{}\"", escape_str(&component.id));
    if kwargs.is_empty() {
        format!("{var} = {callee}({id_tag})")
    } else {
        format!("{var} = {callee}({kwargs}, {id_tag})")
    }
}

/// Reference to a port: the bare variable when the component has a single
/// port in that direction and no named-port requirement.
fn port_ref(var: &str, component: &Component, direction: PortDirection, index: usize) -> String {
    let layout = connections_for(&component.kind);
    let ports = layout.ports(direction);
    let named = registry::requires_named_ports(component.component_type()) || ports.len() > 1;
    if !named {
        return var.to_string();
    }
    let name = ports
        .get(index)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| index.to_string());
    let method = match direction {
        PortDirection::Input => "input",
        PortDirection::Output => "output",
    };
    format!("{var}.{method}(\"{}\")", escape_str(&name))
}

/// Generate with default options.
pub fn generate(components: &ComponentMap, wires: &[Wire], junctions: &[WireJunction]) -> GeneratedProgram {
    generate_with(components, wires, junctions, &GeneratorOptions::default())
}

pub fn generate_circuit(circuit: &Circuit) -> GeneratedProgram {
    generate(&circuit.components, &circuit.wires, &circuit.junctions)
}

pub fn generate_with(
    components: &ComponentMap,
    wires: &[Wire],
    junctions: &[WireJunction],
    options: &GeneratorOptions,
) -> GeneratedProgram {
    emit(components, wires, junctions, options, None)
}

/// Generate an importable module for a circuit used as a sub-circuit.
///
/// The program never calls `run()` and ends with
/// `<Name> = circuit.Component(<circuit_var>)`.
pub fn generate_component_module(circuit: &Circuit, name: &str) -> GeneratedProgram {
    generate_component_module_with(circuit, name, &GeneratorOptions::default())
}

/// [`generate_component_module`] with explicit options; `include_run` is
/// ignored.
pub fn generate_component_module_with(
    circuit: &Circuit,
    name: &str,
    options: &GeneratorOptions,
) -> GeneratedProgram {
    let options = options.clone().with_run(false);
    let ident = module_identifier(name);
    let mut program = emit(
        &circuit.components,
        &circuit.wires,
        &circuit.junctions,
        &options,
        Some(&ident),
    );
    program
        .code
        .push_str(&format!("\n{ident} = circuit.Component({})\n", options.circuit_var));
    program
}

fn emit(
    components: &ComponentMap,
    wires: &[Wire],
    junctions: &[WireJunction],
    options: &GeneratorOptions,
    module_name: Option<&str>,
) -> GeneratedProgram {
    let report = validate(components, wires, junctions);
    if !report.valid {
        log::warn!(
            "generating with {} validation error(s); unresolved wires are skipped",
            report.errors.len()
        );
    }

    let mut imports = BTreeSet::from(["circuit".to_string()]);
    let mut component_imports = BTreeSet::new();
    for component in components.values() {
        match &component.kind {
            ComponentKind::Subcircuit(props) => {
                let ident = module_identifier(&props.name);
                if Some(ident.as_str()) != module_name {
                    component_imports.insert(ident);
                }
            }
            other => {
                imports.insert(registry::entry(other.component_type()).module.to_string());
            }
        }
    }

    let reserved = imports
        .iter()
        .chain(&component_imports)
        .cloned()
        .chain([options.circuit_var.clone()])
        .chain(module_name.map(str::to_string));
    let mut namer = Namer::new(reserved);

    let mut var_names = IndexMap::with_capacity(components.len());
    let mut body = Vec::with_capacity(components.len());
    for component in components.values() {
        let var = namer.next(&registry::var_prefix(&component.kind));
        body.push(instantiation(&var, component));
        if let ComponentKind::Input(p) | ComponentKind::Constant(p) = &component.kind {
            body.push(format!("{var}.value = {}", format_io_value(p)));
        }
        var_names.insert(component.id.clone(), var);
    }

    let mut seen = HashSet::new();
    let mut connects = Vec::new();
    for connection in &report.connections {
        let key = connection.key();
        if !seen.insert((key.0.to_string(), key.1, key.2.to_string(), key.3)) {
            log::debug!("skipping duplicate connection from wire {}", connection.wire_index);
            continue;
        }
        let (Some(src), Some(dst)) = (
            components.get(&connection.source),
            components.get(&connection.dest),
        ) else {
            continue;
        };
        let src_ref = port_ref(&var_names[&src.id], src, PortDirection::Output, connection.source_port);
        let dst_ref = port_ref(&var_names[&dst.id], dst, PortDirection::Input, connection.dest_port);
        let mut line = format!("{}.connect({src_ref}, {dst_ref}", options.circuit_var);
        if let Some(id) = &connection.wire_id {
            line.push_str(&format!(", js_id=\"{}\"", escape_str(id)));
        }
        line.push(')');
        connects.push(line);
    }

    let mut code = String::new();
    let modules: Vec<&str> = imports.iter().map(String::as_str).collect();
    code.push_str(&format!("from ggl import {}\n", modules.join(", ")));
    for name in &component_imports {
        code.push_str(&format!("from {name} import {name}\n"));
    }
    code.push('\n');
    let ctor_args = if options.js_logging { "js_logging=True" } else { "" };
    code.push_str(&format!("{} = circuit.Circuit({ctor_args})\n", options.circuit_var));
    for block in [&body, &connects] {
        if block.is_empty() {
            continue;
        }
        code.push('\n');
        for line in block {
            code.push_str(line);
            code.push('\n');
        }
    }
    if options.include_run {
        code.push_str(&format!("\n{}.run()\n", options.circuit_var));
    }

    log::debug!(
        "generated {} component(s), {} connection(s)",
        var_names.len(),
        connects.len()
    );

    GeneratedProgram {
        code,
        imports,
        component_imports,
        var_names,
        report,
    }
}
