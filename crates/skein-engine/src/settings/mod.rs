//! Engine configuration surface.

use crate::coords::Color;

/// How world updaters are scheduled relative to rendering.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum UpdaterExecutionMode {
    /// Updaters run inline on the frame thread.
    Synchronous,
    /// Updaters run on the worker pool; the frame thread blocks until the
    /// outstanding batch completes.
    #[default]
    ConcurrentSynchronous,
    /// Updaters run on the worker pool; the frame thread polls completion
    /// and renders the previously promoted data while a batch is in flight.
    ConcurrentAsynchronous,
}

impl UpdaterExecutionMode {
    pub fn is_concurrent(self) -> bool {
        !matches!(self, UpdaterExecutionMode::Synchronous)
    }

    /// Whether the frame thread waits for an in-flight batch.
    pub fn is_blocking(self) -> bool {
        matches!(self, UpdaterExecutionMode::ConcurrentSynchronous)
    }
}

/// Visual options read by the streaming engine and renderers every tick.
#[derive(Debug, Clone)]
pub struct RenderingOptions {
    pub show_nodes: bool,
    pub show_edges: bool,

    /// When a selection exists, drop non-selected entities entirely instead
    /// of dimming them in the back layer.
    pub hide_non_selected: bool,

    /// Selecting a node also selects its direct neighbours.
    pub auto_select_neighbours: bool,

    /// How much the back layer fades towards the background color, in
    /// [0, 1]; >= 1 behaves like `hide_non_selected`.
    pub lighten_non_selected_factor: f32,

    pub edge_scale: f32,

    /// Replace selected-edge colors with the directional highlight colors
    /// below instead of the edge's own color.
    pub edge_selection_color: bool,
    pub edge_both_selection_color: Color,
    pub edge_out_selection_color: Color,
    pub edge_in_selection_color: Color,
}

impl Default for RenderingOptions {
    fn default() -> Self {
        Self {
            show_nodes: true,
            show_edges: true,
            hide_non_selected: false,
            auto_select_neighbours: true,
            lighten_non_selected_factor: 0.85,
            edge_scale: 2.0,
            edge_selection_color: false,
            edge_both_selection_color: Color::rgb(0.25, 0.35, 0.9),
            edge_out_selection_color: Color::rgb(0.9, 0.25, 0.25),
            edge_in_selection_color: Color::rgb(0.95, 0.75, 0.2),
        }
    }
}

impl RenderingOptions {
    /// Effective hide decision for a tick: explicit hide, or a lighten
    /// factor that would fade unselected entities out completely anyway.
    pub fn effectively_hides_non_selected(&self) -> bool {
        self.hide_non_selected || self.lighten_non_selected_factor >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lighten_factor_of_one_hides() {
        let mut options = RenderingOptions::default();
        assert!(!options.effectively_hides_non_selected());

        options.lighten_non_selected_factor = 1.0;
        assert!(options.effectively_hides_non_selected());

        options.lighten_non_selected_factor = 0.5;
        options.hide_non_selected = true;
        assert!(options.effectively_hides_non_selected());
    }

    #[test]
    fn execution_mode_flags() {
        assert!(!UpdaterExecutionMode::Synchronous.is_concurrent());
        assert!(UpdaterExecutionMode::ConcurrentSynchronous.is_blocking());
        assert!(UpdaterExecutionMode::ConcurrentAsynchronous.is_concurrent());
        assert!(!UpdaterExecutionMode::ConcurrentAsynchronous.is_blocking());
    }
}
