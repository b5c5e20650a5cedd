//! Camera transform: zoom + pan + viewport to matrices.
//!
//! Every mutation synchronously recomputes the derived matrices and the
//! world-visible boundary rectangle, so renderers and updaters never observe
//! a stale inverse across a frame boundary.

use glam::{Mat4, Vec2, Vec3};

use crate::coords::Rect2D;

pub const MIN_ZOOM: f32 = 0.001;
pub const MAX_ZOOM: f32 = 1000.0;

pub const DEFAULT_ZOOM: f32 = 0.3;

/// Zoom/translate/viewport state with derived model-view-projection matrices.
///
/// Conventions: world +Y up, screen +Y down; the projection is an
/// orthographic box of `[-w/2, w/2] x [-h/2, h/2]`; the model matrix is
/// identity.
#[derive(Debug, Clone)]
pub struct Camera {
    zoom: f32,
    translate: Vec2,
    width: f32,
    height: f32,

    model: Mat4,
    view: Mat4,
    projection: Mat4,
    mvp: Mat4,
    mvp_inverse: Mat4,

    view_boundaries: Rect2D,
}

impl Camera {
    pub fn new() -> Self {
        let mut camera = Self {
            zoom: DEFAULT_ZOOM,
            translate: Vec2::ZERO,
            width: 0.0,
            height: 0.0,
            model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            mvp: Mat4::IDENTITY,
            mvp_inverse: Mat4::IDENTITY,
            view_boundaries: Rect2D::default(),
        };
        camera.recompute();
        camera
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn translate(&self) -> Vec2 {
        self.translate
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }

    pub fn mvp(&self) -> Mat4 {
        self.mvp
    }

    pub fn mvp_inverse(&self) -> Mat4 {
        self.mvp_inverse
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.model
    }

    pub fn mvp_floats(&self) -> [f32; 16] {
        self.mvp.to_cols_array()
    }

    /// World-space rectangle currently visible through the viewport.
    pub fn view_boundaries(&self) -> Rect2D {
        self.view_boundaries
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        self.recompute();
    }

    pub fn set_translate(&mut self, translate: Vec2) {
        self.translate = translate;
        self.recompute();
    }

    pub fn translate_by(&mut self, delta: Vec2) {
        self.translate += delta;
        self.recompute();
    }

    pub fn reshape(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.recompute();
    }

    /// Centers the camera on `center` and, when `width`/`height` are
    /// positive, rescales zoom so that the visible rectangle covers at least
    /// that world extent.
    pub fn center_on(&mut self, center: Vec2, width: f32, height: f32) {
        self.translate = -center;
        self.recompute();

        if width > 0.0 && height > 0.0 {
            let visible = self.view_boundaries;
            let zoom_factor =
                (width / visible.width()).max(height / visible.height());
            self.zoom = (self.zoom / zoom_factor).clamp(MIN_ZOOM, MAX_ZOOM);
            self.recompute();
        }
    }

    /// Changes zoom while keeping the world point under `screen_pos` visually
    /// fixed (scroll-to-zoom anchoring).
    pub fn zoom_anchored(&mut self, new_zoom: f32, screen_pos: Vec2) {
        let new_zoom = new_zoom.clamp(MIN_ZOOM, MAX_ZOOM);

        let view = self.view_boundaries;
        let center = view.center();
        let diff = self.screen_to_world(screen_pos) - center;
        let translation = diff * (self.zoom / new_zoom) - diff;

        self.translate += translation;
        self.zoom = new_zoom;
        self.recompute();
    }

    /// Unprojects screen pixels (origin top-left, +Y down) to world
    /// coordinates at z = 0.
    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        let half_width = self.width / 2.0;
        let half_height = self.height / 2.0;

        let x_normalized = (-half_width + screen.x) / half_width;
        let y_normalized = (half_height - screen.y) / half_height;

        let world = self
            .mvp_inverse
            .project_point3(Vec3::new(x_normalized, y_normalized, 0.0));
        Vec2::new(world.x, world.y)
    }

    /// Projects world coordinates to screen pixels (origin top-left,
    /// +Y down). Inverse of [`Camera::screen_to_world`].
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        let clip = self.mvp.project_point3(Vec3::new(world.x, world.y, 0.0));

        let half_width = self.width / 2.0;
        let half_height = self.height / 2.0;
        Vec2::new(
            half_width + clip.x * half_width,
            half_height - clip.y * half_height,
        )
    }

    fn recompute(&mut self) {
        // model stays identity
        self.view = Mat4::from_scale(Vec3::new(self.zoom, self.zoom, 1.0))
            * Mat4::from_translation(Vec3::new(self.translate.x, self.translate.y, 0.0));

        let half_width = self.width / 2.0;
        let half_height = self.height / 2.0;
        self.projection = Mat4::orthographic_rh(
            -half_width,
            half_width,
            -half_height,
            half_height,
            -1.0,
            1.0,
        );

        self.mvp = self.projection * self.view * self.model;
        self.mvp_inverse = self.mvp.inverse();

        let a = self.mvp_inverse.project_point3(Vec3::new(-1.0, -1.0, 0.0));
        let b = self.mvp_inverse.project_point3(Vec3::new(1.0, 1.0, 0.0));
        self.view_boundaries = Rect2D::from_corners(Vec2::new(a.x, a.y), Vec2::new(b.x, b.y));
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
