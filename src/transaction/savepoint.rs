/// Bridge-side bookkeeping for nested savepoints.
///
/// The engine can set a savepoint and roll back to the most recent one, but
/// cannot discard one without rolling back. Each level here counts how many
/// engine savepoints it spans: popping a level folds its count into the level
/// below, and rolling a level back unwinds that many engine savepoints.
#[derive(Debug, Default)]
pub(crate) struct SavepointStack {
    levels: Vec<usize>,
}

impl SavepointStack {
    pub fn push(&mut self) {
        self.levels.push(1);
    }

    /// Discards the newest level, keeping its writes. Returns `false` if
    /// there was nothing to pop.
    pub fn pop(&mut self) -> bool {
        let Some(top) = self.levels.pop() else {
            return false;
        };
        if let Some(below) = self.levels.last_mut() {
            *below += top;
        }
        // Without a level below, the engine savepoints stay behind unnamed.
        // Nothing can roll back to them, and commit or rollback clears them.
        true
    }

    /// Removes the newest level and returns how many engine savepoints must
    /// be unwound to undo it.
    pub fn take(&mut self) -> Option<usize> {
        self.levels.pop()
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }
}
