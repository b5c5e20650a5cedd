/// Double-latched instance counts for one drawable category.
///
/// The update phase writes `unselected`/`selected`; the render phase only
/// ever reads the `*_to_draw` latches, which change exclusively through
/// [`InstanceCounter::promote`]. Promoting after a batch fully populated its
/// attribute arrays is what keeps a concurrent renderer from observing a
/// half-written update.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstanceCounter {
    unselected: usize,
    selected: usize,
    unselected_to_draw: usize,
    selected_to_draw: usize,
}

impl InstanceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write-side update; invisible to the render phase until promoted.
    pub fn set_counts(&mut self, unselected: usize, selected: usize) {
        self.unselected = unselected;
        self.selected = selected;
    }

    /// Write-side reset; invisible to the render phase until promoted.
    pub fn clear_counts(&mut self) {
        self.unselected = 0;
        self.selected = 0;
    }

    /// Commits the freshly written counts to the render phase.
    pub fn promote(&mut self) {
        self.unselected_to_draw = self.unselected;
        self.selected_to_draw = self.selected;
    }

    pub fn unselected_to_draw(&self) -> usize {
        self.unselected_to_draw
    }

    pub fn selected_to_draw(&self) -> usize {
        self.selected_to_draw
    }

    pub fn total_to_draw(&self) -> usize {
        self.unselected_to_draw + self.selected_to_draw
    }
}
