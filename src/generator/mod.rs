//! Program text generation for the GGL simulation engine.
//!
//! This module provides:
//! - [`ggl`] – Turn a validated circuit into engine source text.
//! - [`pyfmt`] – Literal formatting and escaping for the emitted text.

pub mod ggl;
pub mod pyfmt;

pub use ggl::{
    GeneratedProgram, generate, generate_circuit, generate_component_module,
    generate_component_module_with, generate_with,
};
