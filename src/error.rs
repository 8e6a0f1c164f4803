//! Error types shared across the crate.

use crate::model::PortDirection;
use thiserror::Error;

/// Failures of the circuit store and of model-level conversions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitError {
    #[error("unknown component type `{0}`")]
    UnknownComponentType(String),

    #[error("rotation must be one of 0, 90, 180 or 270 degrees, got {0}")]
    InvalidRotation(i64),

    #[error("no circuit with id `{0}`")]
    CircuitNotFound(String),

    #[error("no active circuit")]
    NoActiveCircuit,

    #[error("component `{0}` not found")]
    ComponentNotFound(String),

    #[error("component id `{0}` is already in use")]
    DuplicateComponentId(String),

    #[error("wire id `{0}` is already in use")]
    DuplicateWireId(String),

    #[error("wire {0} not found")]
    WireNotFound(String),

    #[error("index {index} is out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Reasons a command refuses to apply.
///
/// Commands check their preconditions before touching the circuit, so a
/// failed command leaves the circuit unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error(transparent)]
    Circuit(#[from] CircuitError),

    #[error("point {x},{y} does not lie on wire {wire}")]
    PointNotOnWire { wire: usize, x: i32, y: i32 },

    #[error("vertex {index} is out of range for wire {wire}")]
    VertexOutOfRange { wire: usize, index: usize },

    #[error("cannot apply {what} to component `{component}`")]
    UnsupportedUpdate { component: String, what: &'static str },

    #[error("component `{component}` has no {direction} port {index}")]
    NoSuchPort {
        component: String,
        direction: PortDirection,
        index: usize,
    },

    #[error("a wire that taps another wire needs an id")]
    UnnamedTap,

    #[error("nothing to do: {0}")]
    Empty(&'static str),
}

impl CircuitError {
    pub fn wire_index(index: usize) -> Self {
        CircuitError::WireNotFound(format!("#{index}"))
    }
}
