//! Digital logic circuit editor core.
//!
//! This crate holds circuits built from logic components on an integer
//! grid, resolves which ports their wires touch, and turns the valid
//! connections into program text for the external simulation engine.
//!
//! The binary `gatecraft` validates circuit documents and prints generated
//! programs.

pub mod component;
pub mod config;
pub mod editor;
pub mod error;
pub mod generator;
pub mod geometry;
pub mod model;
pub mod registry;
pub mod routing;
pub mod store;
pub mod validate;

pub use component::{Component, ComponentKind, ComponentType};
pub use error::{CircuitError, CommandError};
pub use model::{Circuit, CircuitDoc, GridPoint, PortDirection, Rotation, Wire, WireJunction};
pub use validate::{ValidationReport, validate_circuit};
