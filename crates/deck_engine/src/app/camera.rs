use glam::{Vec2, Vec3};

use super::scene::Ray;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

/// Pinhole camera looking down +Z with +Y up.
///
/// Screen space is in pixels with the origin at the top-left corner and +Y
/// pointing down, matching window cursor coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub vertical_fov_radians: f32,
    pub viewport: Viewport,
}

impl Camera {
    fn half_extent_tangents(&self) -> Vec2 {
        let tan_y = (self.vertical_fov_radians * 0.5).tan();
        Vec2::new(tan_y * self.viewport.aspect(), tan_y)
    }

    /// Direction through `screen_px`, scaled so that its Z component is 1.
    fn view_direction(&self, screen_px: Vec2) -> Vec3 {
        let width = self.viewport.width.max(1) as f32;
        let height = self.viewport.height.max(1) as f32;
        let ndc_x = screen_px.x / width * 2.0 - 1.0;
        let ndc_y = 1.0 - screen_px.y / height * 2.0;
        let tangents = self.half_extent_tangents();
        Vec3::new(ndc_x * tangents.x, ndc_y * tangents.y, 1.0)
    }

    pub fn ray_through(&self, screen_px: Vec2) -> Ray {
        Ray {
            origin: self.position,
            direction: self.view_direction(screen_px).normalize(),
        }
    }

    /// World point under `screen_px` lying `depth` units in front of the camera.
    pub fn screen_to_world(&self, screen_px: Vec2, depth: f32) -> Vec3 {
        self.position + self.view_direction(screen_px) * depth
    }

    /// Projects a world point to pixels. Points at or behind the camera plane yield `None`.
    pub fn world_to_screen(&self, world: Vec3) -> Option<Vec2> {
        let relative = world - self.position;
        if relative.z <= f32::EPSILON {
            return None;
        }
        let tangents = self.half_extent_tangents();
        let ndc_x = relative.x / (relative.z * tangents.x);
        let ndc_y = relative.y / (relative.z * tangents.y);
        Some(Vec2::new(
            (ndc_x + 1.0) * 0.5 * self.viewport.width as f32,
            (1.0 - ndc_y) * 0.5 * self.viewport.height as f32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera {
            position: Vec3::new(0.0, 0.0, -10.0),
            vertical_fov_radians: std::f32::consts::FRAC_PI_2,
            viewport: Viewport {
                width: 800,
                height: 600,
            },
        }
    }

    #[test]
    fn viewport_center_maps_straight_ahead() {
        let point = camera().screen_to_world(Vec2::new(400.0, 300.0), 10.0);
        assert!(point.distance(Vec3::ZERO) < 1e-5);
    }

    #[test]
    fn screen_y_grows_downward() {
        let top = camera().screen_to_world(Vec2::new(400.0, 0.0), 10.0);
        assert!(top.y > 0.0);
        let bottom = camera().screen_to_world(Vec2::new(400.0, 600.0), 10.0);
        assert!(bottom.y < 0.0);
    }

    #[test]
    fn world_to_screen_inverts_screen_to_world() {
        let camera = camera();
        let screen = Vec2::new(123.0, 456.0);
        let world = camera.screen_to_world(screen, 7.5);
        let back = camera.world_to_screen(world).expect("in front");
        assert!(back.distance(screen) < 1e-2);
    }

    #[test]
    fn points_behind_camera_do_not_project() {
        assert!(camera().world_to_screen(Vec3::new(0.0, 0.0, -20.0)).is_none());
    }

    #[test]
    fn ray_direction_is_normalized() {
        let ray = camera().ray_through(Vec2::new(10.0, 20.0));
        assert!((ray.direction.length() - 1.0).abs() < 1e-5);
        assert_eq!(ray.origin, Vec3::new(0.0, 0.0, -10.0));
    }
}
