use indexmap::IndexSet;

/// Multi-select state driven by gestures. Ids keep selection order.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selected: IndexSet<String>,
    selection_mode: bool,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the list is in multi-select mode.
    pub fn is_active(&self) -> bool {
        self.selection_mode
    }

    pub fn ids(&self) -> &IndexSet<String> {
        &self.selected
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Add `id` and enter selection mode. Returns false if it was already selected.
    pub fn select(&mut self, id: impl Into<String>) -> bool {
        self.selection_mode = true;
        self.selected.insert(id.into())
    }

    pub fn deselect(&mut self, id: &str) -> bool {
        let removed = self.selected.shift_remove(id);
        if self.selected.is_empty() {
            self.selection_mode = false;
        }
        removed
    }

    /// Flip membership of `id`. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.contains(id) {
            self.deselect(id);
            false
        } else {
            self.select(id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.selection_mode = false;
    }

    /// Drop ids that no longer exist after the sequence was rebuilt.
    pub fn retain_existing<'a>(&mut self, existing: impl IntoIterator<Item = &'a str>) {
        if self.selected.is_empty() {
            return;
        }
        let existing: std::collections::HashSet<&str> = existing.into_iter().collect();
        self.selected.retain(|id| existing.contains(id.as_str()));
        if self.selected.is_empty() {
            self.selection_mode = false;
        }
    }
}
