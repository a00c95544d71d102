//! Dense clause-local substitution
//!
//! During clause evaluation every binding is a constant, and the annotator
//! numbers the clause's variables densely, so bindings live in a flat slot
//! array. Backtracking records set slots on a trail and unwinds to a mark.

use datalog_ast::Symbol;

#[derive(Debug, Clone)]
pub struct ClauseSubstitution {
    slots: Vec<Option<Symbol>>,
    trail: Vec<usize>,
}

impl ClauseSubstitution {
    pub fn new(var_count: usize) -> Self {
        ClauseSubstitution {
            slots: vec![None; var_count],
            trail: Vec::new(),
        }
    }

    pub fn get(&self, slot: usize) -> Option<Symbol> {
        self.slots[slot]
    }

    /// Bind a slot. Slots are never rebound; backtracking clears them.
    pub fn set(&mut self, slot: usize, value: Symbol) {
        debug_assert!(self.slots[slot].is_none(), "slot {} already bound", slot);
        self.slots[slot] = Some(value);
        self.trail.push(slot);
    }

    /// Current trail position, to unwind to later.
    pub fn mark(&self) -> usize {
        self.trail.len()
    }

    /// Unbind everything set since `mark`.
    pub fn undo_to(&mut self, mark: usize) {
        while self.trail.len() > mark {
            if let Some(slot) = self.trail.pop() {
                self.slots[slot] = None;
            }
        }
    }
}
