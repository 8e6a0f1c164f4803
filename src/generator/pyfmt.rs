//! Python literal formatting for generated program text.

use crate::component::{IoProps, NumberBase};
use std::fmt;

/// A keyword-argument value as it appears in the generated source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PyValue {
    Int(u64),
    Str(String),
    Bool(bool),
    List(Vec<PyValue>),
    Tuple(Vec<PyValue>),
}

impl fmt::Display for PyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PyValue::Int(v) => write!(f, "{v}"),
            PyValue::Str(s) => write!(f, "\"{}\"", escape_str(s)),
            PyValue::Bool(true) => f.write_str("True"),
            PyValue::Bool(false) => f.write_str("False"),
            PyValue::List(items) => {
                f.write_str("[")?;
                write_items(f, items, ", ")?;
                f.write_str("]")
            }
            // Tuples are written compactly, matching the engine's own
            // examples: `(0,1)`.
            PyValue::Tuple(items) => {
                f.write_str("(")?;
                write_items(f, items, ",")?;
                f.write_str(")")
            }
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[PyValue], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Escape text for a double-quoted Python string literal.
pub fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

/// Keyword arguments in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Kwargs(Vec<(&'static str, PyValue)>);

impl Kwargs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &'static str, value: PyValue) -> &mut Self {
        self.0.push((name, value));
        self
    }

    /// Push only if `value` differs from the engine's default.
    pub fn push_unless(&mut self, name: &'static str, value: PyValue, default: PyValue) -> &mut Self {
        if value != default {
            self.0.push((name, value));
        }
        self
    }

    pub fn label(&mut self, label: &str) -> &mut Self {
        if !label.is_empty() {
            self.0.push(("label", PyValue::Str(label.to_string())));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Kwargs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

/// Format an I/O value in its display base, zero-padded to the bit width.
pub fn format_io_value(props: &IoProps) -> String {
    match props.base {
        NumberBase::Hex => {
            let width = props.bits.div_ceil(4) as usize;
            format!("0x{:0width$X}", props.value)
        }
        NumberBase::Binary => format!("0b{:0width$b}", props.value, width = props.bits as usize),
        NumberBase::Decimal => props.value.to_string(),
    }
}
