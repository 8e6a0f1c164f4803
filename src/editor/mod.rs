//! Circuit editing with undo/redo.
//!
//! - **Commands**: every edit is an [`EditorCommand`] whose application
//!   returns its own inverse
//! - **History**: bounded undo/redo stacks with grouping
//! - **Clipboard**: copy, paste and duplicate with fresh ids
//! - **Session**: one store, one history per circuit, and the entry point
//!   for values reported by the execution engine

pub mod clipboard;
pub mod history;
pub mod operations;
pub mod session;

pub use clipboard::{ClipboardElements, IdGenerator};
pub use history::{EditorHistory, HistoryEntry, HistoryInfo};
pub use operations::{
    ComponentPatch, EditorCommand, Geometry, apply, delete_components, delete_wires,
};
pub use session::{EditorSession, RuntimeEvent};
