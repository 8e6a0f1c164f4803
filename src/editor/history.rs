//! Undo/redo history for one circuit.
//!
//! The history stores inverse commands. Undoing applies the stored inverse
//! and keeps *its* inverse for redo, so both stacks hold ready-to-apply
//! commands.
//!
//! ```ignore
//! let mut history = EditorHistory::new(100);
//! history.execute(&mut circuit, &command)?;
//! history.undo(&mut circuit); // reverts the command
//! history.redo(&mut circuit); // re-applies it
//! ```

use super::operations::{EditorCommand, apply};
use crate::error::CommandError;
use crate::model::Circuit;
use serde::Serialize;

/// One undoable step: the command that reverts it and its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub label: String,
    pub command: EditorCommand,
}

#[derive(Debug, Clone)]
struct OpenGroup {
    label: String,
    inverses: Vec<EditorCommand>,
    depth: usize,
}

/// Counts and recent labels, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryInfo {
    pub undo_count: usize,
    pub redo_count: usize,
    pub undo_labels: Vec<String>,
    pub redo_labels: Vec<String>,
    pub grouping: bool,
}

#[derive(Debug, Clone)]
pub struct EditorHistory {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    max_size: usize,
    open_group: Option<OpenGroup>,
}

impl EditorHistory {
    /// Create a new history with the given maximum undo depth.
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_size,
            open_group: None,
        }
    }

    fn push(&mut self, entry: HistoryEntry) {
        self.undo_stack.push(entry);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.max_size {
            let dropped = self.undo_stack.remove(0);
            log::debug!("undo limit {} reached, dropped `{}`", self.max_size, dropped.label);
        }
    }

    /// Apply `command` and record it. Inside a group the step is collected
    /// into the group instead of becoming its own entry.
    pub fn execute(&mut self, circuit: &mut Circuit, command: &EditorCommand) -> Result<(), CommandError> {
        let inverse = apply(circuit, command)?;
        match &mut self.open_group {
            Some(group) => group.inverses.push(inverse),
            None => self.push(HistoryEntry {
                label: command.description(),
                command: inverse,
            }),
        }
        Ok(())
    }

    /// Undo the last step, returning true if an undo was performed.
    /// Refused while a group is open.
    pub fn undo(&mut self, circuit: &mut Circuit) -> bool {
        if self.open_group.is_some() {
            log::debug!("undo refused while a group is open");
            return false;
        }
        let Some(entry) = self.undo_stack.pop() else {
            return false;
        };
        match apply(circuit, &entry.command) {
            Ok(redo) => {
                self.redo_stack.push(HistoryEntry {
                    label: entry.label,
                    command: redo,
                });
                true
            }
            Err(e) => {
                log::warn!("undo of `{}` failed: {e}", entry.label);
                self.undo_stack.push(entry);
                false
            }
        }
    }

    /// Redo the last undone step, returning true if a redo was performed.
    pub fn redo(&mut self, circuit: &mut Circuit) -> bool {
        if self.open_group.is_some() {
            log::debug!("redo refused while a group is open");
            return false;
        }
        let Some(entry) = self.redo_stack.pop() else {
            return false;
        };
        match apply(circuit, &entry.command) {
            Ok(undo) => {
                self.undo_stack.push(HistoryEntry {
                    label: entry.label,
                    command: undo,
                });
                true
            }
            Err(e) => {
                log::warn!("redo of `{}` failed: {e}", entry.label);
                self.redo_stack.push(entry);
                false
            }
        }
    }

    /// Start collecting steps into one entry. Nested calls only deepen the
    /// current group; the outermost label wins.
    pub fn start_group(&mut self, label: impl Into<String>) {
        match &mut self.open_group {
            Some(group) => group.depth += 1,
            None => {
                self.open_group = Some(OpenGroup {
                    label: label.into(),
                    inverses: Vec::new(),
                    depth: 1,
                })
            }
        }
    }

    /// Close the current group. Returns true when the outermost group closed
    /// with at least one step and was pushed as a single entry.
    pub fn end_group(&mut self) -> bool {
        let Some(group) = &mut self.open_group else {
            return false;
        };
        group.depth -= 1;
        if group.depth > 0 {
            return false;
        }
        let Some(mut group) = self.open_group.take() else {
            return false;
        };
        if group.inverses.is_empty() {
            return false;
        }
        group.inverses.reverse();
        self.push(HistoryEntry {
            command: EditorCommand::Group {
                label: group.label.clone(),
                commands: group.inverses,
            },
            label: group.label,
        });
        true
    }

    pub fn is_grouping(&self) -> bool {
        self.open_group.is_some()
    }

    /// Returns true if there are commands to undo.
    pub fn can_undo(&self) -> bool {
        self.open_group.is_none() && !self.undo_stack.is_empty()
    }

    /// Returns true if there are commands to redo.
    pub fn can_redo(&self) -> bool {
        self.open_group.is_none() && !self.redo_stack.is_empty()
    }

    /// Clear all history, including an open group.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.open_group = None;
    }

    pub fn history_info(&self) -> HistoryInfo {
        let labels = |stack: &[HistoryEntry]| -> Vec<String> {
            stack.iter().rev().map(|e| e.label.clone()).collect()
        };
        HistoryInfo {
            undo_count: self.undo_stack.len(),
            redo_count: self.redo_stack.len(),
            undo_labels: labels(&self.undo_stack),
            redo_labels: labels(&self.redo_stack),
            grouping: self.is_grouping(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentType};
    use crate::model::GridPoint;

    fn add(id: &str) -> EditorCommand {
        EditorCommand::AddComponent {
            index: None,
            component: Box::new(Component::of_type(id, ComponentType::Input, GridPoint::new(0, 0))),
        }
    }

    fn nudge(id: &str) -> EditorCommand {
        EditorCommand::MoveComponents {
            ids: vec![id.to_string()],
            dx: 1,
            dy: 0,
        }
    }

    #[test]
    fn test_undo_redo() {
        let mut circuit = Circuit::new("c", "main");
        let mut history = EditorHistory::new(10);
        history.execute(&mut circuit, &add("a")).unwrap();
        let after = circuit.clone();

        assert!(history.undo(&mut circuit));
        assert!(circuit.is_empty());
        assert!(!history.undo(&mut circuit));
        assert!(history.redo(&mut circuit));
        assert_eq!(circuit, after);
        assert!(!history.redo(&mut circuit));
    }

    #[test]
    fn test_failed_command_is_not_recorded() {
        let mut circuit = Circuit::new("c", "main");
        let mut history = EditorHistory::new(10);
        assert!(history.execute(&mut circuit, &nudge("missing")).is_err());
        assert!(!history.can_undo());
    }

    #[test]
    fn test_history_max_size() {
        let mut circuit = Circuit::new("c", "main");
        let mut history = EditorHistory::new(3);
        history.execute(&mut circuit, &add("a")).unwrap();
        for _ in 0..4 {
            history.execute(&mut circuit, &nudge("a")).unwrap();
        }

        let mut undo_count = 0;
        while history.undo(&mut circuit) {
            undo_count += 1;
        }
        assert_eq!(undo_count, 3);
        assert_eq!(circuit.component("a").unwrap().position, GridPoint::new(1, 0));
    }

    #[test]
    fn test_execute_clears_redo() {
        let mut circuit = Circuit::new("c", "main");
        let mut history = EditorHistory::new(10);
        history.execute(&mut circuit, &add("a")).unwrap();
        history.execute(&mut circuit, &nudge("a")).unwrap();
        assert!(history.undo(&mut circuit));
        assert!(history.can_redo());
        history.execute(&mut circuit, &add("b")).unwrap();
        assert!(!history.can_redo());
    }

    #[test]
    fn test_group_undoes_in_one_step() {
        let mut circuit = Circuit::new("c", "main");
        let mut history = EditorHistory::new(10);
        history.start_group("Build");
        history.execute(&mut circuit, &add("a")).unwrap();
        history.start_group("inner");
        history.execute(&mut circuit, &nudge("a")).unwrap();
        assert!(!history.end_group());
        history.execute(&mut circuit, &add("b")).unwrap();
        assert!(!history.undo(&mut circuit));
        assert!(history.end_group());

        let info = history.history_info();
        assert_eq!(info.undo_count, 1);
        assert_eq!(info.undo_labels, vec!["Build".to_string()]);

        let built = circuit.clone();
        assert!(history.undo(&mut circuit));
        assert!(circuit.is_empty());
        assert!(history.redo(&mut circuit));
        assert_eq!(circuit, built);
    }

    #[test]
    fn test_empty_or_missing_group() {
        let mut circuit = Circuit::new("c", "main");
        let mut history = EditorHistory::new(10);
        assert!(!history.end_group());
        history.execute(&mut circuit, &add("a")).unwrap();
        assert!(history.undo(&mut circuit));
        history.start_group("nothing");
        assert!(!history.end_group());
        assert!(!history.is_grouping());
        assert_eq!(history.history_info().undo_count, 0);
        assert!(history.can_redo());
    }
}
