use std::collections::HashMap;

/// Expanded/collapsed detail panels, tracked independently per message id.
#[derive(Debug, Clone, Default)]
pub struct ExpansionState {
    expanded: HashMap<i64, bool>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips one message's panel and returns its new state.
    pub fn toggle(&mut self, id: i64) -> bool {
        let entry = self.expanded.entry(id).or_insert(false);
        *entry = !*entry;
        *entry
    }

    pub fn is_expanded(&self, id: i64) -> bool {
        self.expanded.get(&id).copied().unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.expanded.clear();
    }
}
