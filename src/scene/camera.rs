use glam::{Mat4, Vec2};

/// Orthographic 2D camera. `position` is the world point shown at the centre
/// of the viewport; `viewport` is the visible extent in world units at zoom 1.
#[derive(Clone, Copy, Debug)]
pub struct Camera2D {
    pub position: Vec2,
    pub viewport: Vec2,
    pub zoom: f32,
}

impl Camera2D {
    const NEAR: f32 = -1.0;
    const FAR: f32 = 1.0;

    pub fn new(position: Vec2, viewport: Vec2) -> Self {
        Self {
            position,
            viewport,
            zoom: 1.0,
        }
    }

    /// Half of the visible area in world units, after zoom.
    pub fn half_extent(&self) -> Vec2 {
        self.viewport / (2.0 * self.zoom.max(f32::EPSILON))
    }

    pub fn projection(&self) -> Mat4 {
        let half = self.half_extent();
        Mat4::orthographic_rh(-half.x, half.x, -half.y, half.y, Self::NEAR, Self::FAR)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::from_translation(-self.position.extend(0.0))
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Keeps the visible height and widens the viewport to match `aspect`.
    pub fn fit_aspect(&mut self, aspect: f32) {
        if aspect > 0.0 {
            self.viewport.x = self.viewport.y * aspect;
        }
    }
}

impl Default for Camera2D {
    fn default() -> Self {
        Self::new(Vec2::new(960.0, 540.0), Vec2::new(1920.0, 1080.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn to_ndc(camera: &Camera2D, world: Vec2) -> Vec3 {
        let clip = camera.view_proj() * world.extend(0.0).extend(1.0);
        clip.truncate() / clip.w
    }

    #[test]
    fn camera_position_maps_to_screen_centre() {
        let cam = Camera2D::default();
        let ndc = to_ndc(&cam, cam.position);
        assert!(ndc.truncate().abs_diff_eq(Vec2::ZERO, 1e-5));
        // z = 0 must land inside wgpu's [0, 1] depth range
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn viewport_edges_map_to_ndc_edges() {
        let cam = Camera2D::new(Vec2::ZERO, Vec2::new(200.0, 100.0));
        let right_top = to_ndc(&cam, Vec2::new(100.0, 50.0));
        assert!(right_top.truncate().abs_diff_eq(Vec2::ONE, 1e-5));
    }

    #[test]
    fn zoom_shrinks_visible_area() {
        let mut cam = Camera2D::new(Vec2::ZERO, Vec2::new(200.0, 100.0));
        cam.zoom = 2.0;
        let edge = to_ndc(&cam, Vec2::new(50.0, 25.0));
        assert!(edge.truncate().abs_diff_eq(Vec2::ONE, 1e-5));
    }

    #[test]
    fn fit_aspect_keeps_height() {
        let mut cam = Camera2D::new(Vec2::ZERO, Vec2::new(100.0, 100.0));
        cam.fit_aspect(2.0);
        assert_eq!(cam.viewport, Vec2::new(200.0, 100.0));
    }
}
