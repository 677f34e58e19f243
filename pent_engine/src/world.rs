use serde::{Deserialize, Serialize};

/// World position the game view is centred on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Camera {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Camera {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Camera { x, y, z }
    }

    /// Isometric projection of a world point, relative to the camera.
    pub fn project(&self, x: i32, y: i32, z: i32) -> (i32, i32) {
        let sx = (x - y) / 4 - (self.x - self.y) / 4;
        let sy = (x + y) / 8 - z - ((self.x + self.y) / 8 - self.z);
        (sx, sy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_position_projects_to_the_origin() {
        let camera = Camera::new(640, 320, 8);
        assert_eq!(camera.project(640, 320, 8), (0, 0));
        assert_eq!(camera.project(644, 320, 8), (1, 0));
        assert_eq!(camera.project(648, 328, 8), (0, 2));
        assert_eq!(camera.project(640, 320, 10), (0, -2));
    }
}
