//! Input handling: windowing-agnostic events, the shared state handed to
//! listeners, and the camera/selection actions they trigger.
//!
//! The embedder translates its windowing events into [`InputEvent`] and
//! queues them on the engine; listeners run on the frame thread at the top
//! of every `display()` call.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, RwLock};

use glam::Vec2;

use crate::camera::Camera;
use crate::coords::Rect2D;
use crate::graph::{GraphIndex, NodeId, SelectionModel};
use crate::pipeline::{category, PipelineElement};
use crate::settings::RenderingOptions;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Engine-owned input event, already translated from whatever windowing
/// stack the embedder runs. Positions are screen pixels, origin top-left.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputEvent {
    PointerMoved { position: Vec2 },
    ButtonPressed { button: MouseButton, position: Vec2 },
    ButtonReleased { button: MouseButton, position: Vec2 },
    /// Scroll wheel; positive `delta` zooms in.
    WheelScrolled { delta: f32, position: Vec2 },
    Resized { width: f32, height: f32 },
}

/// Shared state listeners operate on, lent out by the engine for the
/// duration of one event dispatch.
pub struct InputContext<'a> {
    pub camera: &'a RwLock<Camera>,
    pub selection: &'a RwLock<SelectionModel>,
    pub options: &'a RwLock<RenderingOptions>,
    pub graph: &'a dyn GraphIndex,
}

impl InputContext<'_> {
    pub fn actions(&self) -> InputActions<'_> {
        InputActions { ctx: self }
    }
}

/// High-level camera and selection operations over an [`InputContext`].
pub struct InputActions<'a> {
    ctx: &'a InputContext<'a>,
}

impl InputActions<'_> {
    /// Picks the topmost node under a screen position, or clears the
    /// selection when the position hits empty space.
    pub fn select_nodes_under_position(&self, screen: Vec2) {
        let world = self.ctx.camera.read().unwrap().screen_to_world(screen);
        match self.ctx.graph.node_under_position(world) {
            Some(node) => self.select_nodes([node]),
            None => self.clear_selection(),
        }
    }

    /// Selects every node inside the screen rectangle spanned by two
    /// corners, in any corner order.
    pub fn select_nodes_in_rectangle(&self, corner_a: Vec2, corner_b: Vec2) {
        let camera = self.ctx.camera.read().unwrap();
        let a = camera.screen_to_world(corner_a);
        let b = camera.screen_to_world(corner_b);
        drop(camera);

        let rect = Rect2D::from_corners(a, b);
        let mut nodes = Vec::new();
        self.ctx.graph.nodes_inside_rectangle(rect, &mut nodes);
        self.select_nodes(nodes);
    }

    /// Makes the given nodes the selection, together with their incident
    /// edges; when `auto_select_neighbours` is on, direct neighbours join as
    /// the derived neighbour set.
    pub fn select_nodes(&self, nodes: impl IntoIterator<Item = NodeId>) {
        let node_set: HashSet<NodeId> = nodes.into_iter().collect();

        let mut edge_set = HashSet::new();
        let mut scratch_edges = Vec::new();
        for &node in &node_set {
            scratch_edges.clear();
            self.ctx.graph.edges_of(node, &mut scratch_edges);
            edge_set.extend(scratch_edges.iter().copied());
        }

        let mut neighbours = HashSet::new();
        if self.ctx.options.read().unwrap().auto_select_neighbours {
            let mut scratch_nodes = Vec::new();
            for &node in &node_set {
                scratch_nodes.clear();
                self.ctx.graph.neighbors(node, &mut scratch_nodes);
                neighbours.extend(scratch_nodes.iter().copied());
            }
            neighbours.retain(|n| !node_set.contains(n));
        }

        let mut selection = self.ctx.selection.write().unwrap();
        selection.set_selection(node_set, edge_set);
        selection.set_neighbours(neighbours);
    }

    pub fn clear_selection(&self) {
        self.ctx.selection.write().unwrap().clear();
    }

    /// Pans by a screen-pixel delta. Screen Y grows downward, world Y
    /// upward, and the world distance covered shrinks as zoom grows.
    pub fn pan(&self, screen_dx: f32, screen_dy: f32) {
        let mut camera = self.ctx.camera.write().unwrap();
        let zoom = camera.zoom();
        camera.translate_by(Vec2::new(screen_dx / zoom, -screen_dy / zoom));
    }

    /// Multiplies zoom by `1.1^quantity`, anchored so the world point under
    /// `screen_pos` stays put.
    pub fn zoom_at(&self, quantity: f32, screen_pos: Vec2) {
        let mut camera = self.ctx.camera.write().unwrap();
        let new_zoom = camera.zoom() * 1.1f32.powf(quantity);
        camera.zoom_anchored(new_zoom, screen_pos);
    }

    /// Centers the camera on the whole graph, zoomed to fit its bounds.
    pub fn center_on_graph(&self) {
        let bounds = self.ctx.graph.graph_boundaries();
        let mut camera = self.ctx.camera.write().unwrap();
        camera.center_on(bounds.center(), bounds.width(), bounds.height());
    }
}

/// In-progress rectangle-selection drag, shared between the default
/// listener (writer) and the overlay renderer (reader). Corners are screen
/// pixels in press/current order, not normalized.
#[derive(Debug, Clone, Default)]
pub struct SelectionRectangle {
    inner: Arc<Mutex<Option<[Vec2; 2]>>>,
}

impl SelectionRectangle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<[Vec2; 2]> {
        *self.inner.lock().unwrap()
    }

    fn set(&self, corners: [Vec2; 2]) {
        *self.inner.lock().unwrap() = Some(corners);
    }

    fn clear(&self) {
        *self.inner.lock().unwrap() = None;
    }
}

/// Pixels of pointer travel before a press turns into a drag instead of a
/// click.
const DRAG_THRESHOLD: f32 = 4.0;

#[derive(Debug)]
struct DragState {
    button: MouseButton,
    origin: Vec2,
    last: Vec2,
    moved: bool,
}

/// Stock mouse interaction: left click picks, left drag rectangle-selects,
/// right or middle drag pans, wheel zooms at the cursor.
pub struct DefaultInputListener {
    drag: Option<DragState>,
    selection_rectangle: SelectionRectangle,
}

impl DefaultInputListener {
    pub fn new() -> Self {
        Self {
            drag: None,
            selection_rectangle: SelectionRectangle::new(),
        }
    }

    /// Handle for the overlay renderer drawing the drag rectangle.
    pub fn selection_rectangle(&self) -> SelectionRectangle {
        self.selection_rectangle.clone()
    }

    fn pointer_moved(&mut self, position: Vec2, ctx: &InputContext<'_>) -> bool {
        let Some(drag) = &mut self.drag else {
            return false;
        };

        match drag.button {
            MouseButton::Left => {
                if drag.moved || (position - drag.origin).length() >= DRAG_THRESHOLD {
                    drag.moved = true;
                    let origin = drag.origin;
                    self.selection_rectangle.set([origin, position]);
                    ctx.actions().select_nodes_in_rectangle(origin, position);
                }
            }
            MouseButton::Right | MouseButton::Middle => {
                let delta = position - drag.last;
                drag.moved = true;
                ctx.actions().pan(delta.x, delta.y);
            }
        }
        drag.last = position;
        true
    }

    fn button_released(
        &mut self,
        button: MouseButton,
        position: Vec2,
        ctx: &InputContext<'_>,
    ) -> bool {
        let Some(drag) = self.drag.take_if(|d| d.button == button) else {
            return false;
        };

        if button == MouseButton::Left {
            if drag.moved {
                ctx.actions()
                    .select_nodes_in_rectangle(drag.origin, position);
                self.selection_rectangle.clear();
            } else {
                ctx.actions().select_nodes_under_position(position);
            }
        }
        true
    }
}

impl Default for DefaultInputListener {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineElement for DefaultInputListener {
    fn name(&self) -> &str {
        "default-input"
    }

    fn category(&self) -> &str {
        category::INPUT
    }
}

impl crate::pipeline::InputListener<InputEvent> for DefaultInputListener {
    fn process_event(&mut self, event: &InputEvent, ctx: &mut InputContext<'_>) -> bool {
        match *event {
            InputEvent::PointerMoved { position } => self.pointer_moved(position, ctx),
            InputEvent::ButtonPressed { button, position } => {
                self.drag = Some(DragState {
                    button,
                    origin: position,
                    last: position,
                    moved: false,
                });
                true
            }
            InputEvent::ButtonReleased { button, position } => {
                self.button_released(button, position, ctx)
            }
            InputEvent::WheelScrolled { delta, position } => {
                ctx.actions().zoom_at(delta, position);
                true
            }
            InputEvent::Resized { width, height } => {
                ctx.camera.write().unwrap().reshape(width, height);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::coords::Color;
    use crate::graph::{EdgeId, MemoryGraph};
    use crate::pipeline::InputListener as _;

    use super::*;

    struct Fixture {
        camera: RwLock<Camera>,
        selection: RwLock<SelectionModel>,
        options: RwLock<RenderingOptions>,
        graph: MemoryGraph,
        nodes: Vec<NodeId>,
    }

    /// A - B - C chain at x = 0, 100, 200, camera 1:1 over an 800x600
    /// viewport centered on the origin.
    fn fixture() -> Fixture {
        let graph = MemoryGraph::new();
        let nodes = vec![
            graph.add_node(Vec2::new(0.0, 0.0), 5.0, Color::WHITE),
            graph.add_node(Vec2::new(100.0, 0.0), 5.0, Color::WHITE),
            graph.add_node(Vec2::new(200.0, 0.0), 5.0, Color::WHITE),
        ];
        graph.add_edge(nodes[0], nodes[1], 1.0, false, None);
        graph.add_edge(nodes[1], nodes[2], 1.0, false, None);

        let mut camera = Camera::new();
        camera.reshape(800.0, 600.0);
        camera.set_zoom(1.0);

        Fixture {
            camera: RwLock::new(camera),
            selection: RwLock::new(SelectionModel::new()),
            options: RwLock::new(RenderingOptions::default()),
            graph,
            nodes,
        }
    }

    impl Fixture {
        fn ctx(&self) -> InputContext<'_> {
            InputContext {
                camera: &self.camera,
                selection: &self.selection,
                options: &self.options,
                graph: &self.graph,
            }
        }
    }

    #[test]
    fn selecting_a_node_collects_incident_edges_and_neighbours() {
        let f = fixture();
        f.ctx().actions().select_nodes([f.nodes[0]]);

        let selection = f.selection.read().unwrap();
        assert!(selection.is_node_selected(f.nodes[0]));
        assert!(selection.is_neighbour(f.nodes[1]));
        assert!(!selection.is_neighbour(f.nodes[0]));
        // Only A's incident edge, not B-C.
        assert!(selection.is_edge_selected(EdgeId(0)));
        assert!(!selection.is_edge_selected(EdgeId(1)));
    }

    #[test]
    fn neighbours_skipped_when_disabled() {
        let f = fixture();
        f.options.write().unwrap().auto_select_neighbours = false;
        f.ctx().actions().select_nodes([f.nodes[0]]);

        let selection = f.selection.read().unwrap();
        assert!(!selection.is_neighbour(f.nodes[1]));
    }

    #[test]
    fn point_pick_selects_and_empty_space_clears() {
        let f = fixture();
        let ctx = f.ctx();

        // Node A sits at world origin, the viewport center.
        ctx.actions()
            .select_nodes_under_position(Vec2::new(400.0, 300.0));
        assert!(f.selection.read().unwrap().is_node_selected(f.nodes[0]));

        ctx.actions()
            .select_nodes_under_position(Vec2::new(450.0, 300.0));
        assert!(!f.selection.read().unwrap().some_selection());
    }

    #[test]
    fn rectangle_selection_normalizes_corners() {
        let f = fixture();
        // Corners given bottom-right to top-left, covering A and B.
        f.ctx()
            .actions()
            .select_nodes_in_rectangle(Vec2::new(520.0, 320.0), Vec2::new(380.0, 280.0));

        let selection = f.selection.read().unwrap();
        assert!(selection.is_node_selected(f.nodes[0]));
        assert!(selection.is_node_selected(f.nodes[1]));
        assert!(!selection.is_node_selected(f.nodes[2]));
    }

    #[test]
    fn pan_divides_by_zoom_and_flips_y() {
        let f = fixture();
        f.camera.write().unwrap().set_zoom(2.0);
        f.ctx().actions().pan(10.0, 20.0);

        let camera = f.camera.read().unwrap();
        assert!((camera.translate().x - 5.0).abs() < 1e-5);
        assert!((camera.translate().y + 10.0).abs() < 1e-5);
    }

    #[test]
    fn wheel_zoom_multiplies_by_ratio_powers() {
        let f = fixture();
        f.ctx().actions().zoom_at(2.0, Vec2::new(400.0, 300.0));
        let zoom = f.camera.read().unwrap().zoom();
        assert!((zoom - 1.1f32.powi(2)).abs() < 1e-5);
    }

    #[test]
    fn center_on_graph_fits_bounds() {
        let f = fixture();
        f.ctx().actions().center_on_graph();

        let camera = f.camera.read().unwrap();
        let bounds = camera.view_boundaries();
        assert!((bounds.center().x - 100.0).abs() < 1e-2);
        assert!(bounds.width() >= 210.0 - 1e-2);
    }

    #[test]
    fn left_drag_publishes_rectangle_and_selects_on_release() {
        let f = fixture();
        let mut listener = DefaultInputListener::new();
        let rectangle = listener.selection_rectangle();
        let mut ctx = f.ctx();

        listener.process_event(
            &InputEvent::ButtonPressed {
                button: MouseButton::Left,
                position: Vec2::new(380.0, 280.0),
            },
            &mut ctx,
        );
        listener.process_event(
            &InputEvent::PointerMoved {
                position: Vec2::new(520.0, 320.0),
            },
            &mut ctx,
        );
        assert!(rectangle.get().is_some());

        listener.process_event(
            &InputEvent::ButtonReleased {
                button: MouseButton::Left,
                position: Vec2::new(520.0, 320.0),
            },
            &mut ctx,
        );
        assert!(rectangle.get().is_none());

        let selection = f.selection.read().unwrap();
        assert!(selection.is_node_selected(f.nodes[0]));
        assert!(selection.is_node_selected(f.nodes[1]));
    }

    #[test]
    fn short_left_press_is_a_click_not_a_drag() {
        let f = fixture();
        let mut listener = DefaultInputListener::new();
        let mut ctx = f.ctx();

        listener.process_event(
            &InputEvent::ButtonPressed {
                button: MouseButton::Left,
                position: Vec2::new(400.0, 300.0),
            },
            &mut ctx,
        );
        listener.process_event(
            &InputEvent::PointerMoved {
                position: Vec2::new(401.0, 300.0),
            },
            &mut ctx,
        );
        listener.process_event(
            &InputEvent::ButtonReleased {
                button: MouseButton::Left,
                position: Vec2::new(401.0, 300.0),
            },
            &mut ctx,
        );

        assert!(f.selection.read().unwrap().is_node_selected(f.nodes[0]));
    }

    #[test]
    fn right_drag_pans() {
        let f = fixture();
        let mut listener = DefaultInputListener::new();
        let mut ctx = f.ctx();

        listener.process_event(
            &InputEvent::ButtonPressed {
                button: MouseButton::Right,
                position: Vec2::new(100.0, 100.0),
            },
            &mut ctx,
        );
        listener.process_event(
            &InputEvent::PointerMoved {
                position: Vec2::new(130.0, 90.0),
            },
            &mut ctx,
        );

        let camera = f.camera.read().unwrap();
        assert!((camera.translate().x - 30.0).abs() < 1e-5);
        assert!((camera.translate().y - 10.0).abs() < 1e-5);
    }
}
