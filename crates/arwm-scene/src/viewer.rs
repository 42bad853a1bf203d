use glam::{Mat4, Quat, Vec3};

/// Per-tick viewer head pose. Update functions take this explicitly instead
/// of querying the device, which keeps them pure and testable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerPose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl ViewerPose {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// World-space gaze direction.
    pub fn forward(&self) -> Vec3 {
        (self.orientation * Vec3::NEG_Z).normalize()
    }
}

impl Default for ViewerPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }
}

/// Camera for the AR scene. Orientation comes from head tracking; in
/// desktop pointer mode it is driven by the host shell.
pub struct Camera {
    pub position: Vec3,
    pub orientation: Quat,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Aspect ratio (width / height).
    pub aspect_ratio: f32,
    /// Near clipping plane (meters).
    pub near: f32,
    /// Far clipping plane (meters).
    pub far: f32,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            fov_y_degrees: 46.0,
            aspect_ratio: 1920.0 / 1080.0,
            near: 0.1,
            far: 100.0,
        }
    }

    pub fn pose(&self) -> ViewerPose {
        ViewerPose::new(self.position, self.orientation)
    }

    /// View matrix (inverse of the camera world transform).
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.orientation.conjugate()) * Mat4::from_translation(-self.position)
    }

    /// Perspective projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.aspect_ratio,
            self.near,
            self.far,
        )
    }

    /// Inverse view-projection, for unprojecting cursor rays.
    pub fn inverse_view_proj(&self) -> Mat4 {
        (self.projection_matrix() * self.view_matrix()).inverse()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pose_faces_negative_z() {
        let pose = ViewerPose::default();
        assert!((pose.forward() - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn rotated_pose_forward_follows_orientation() {
        let pose = ViewerPose::new(Vec3::ZERO, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        assert!((pose.forward() - Vec3::NEG_X).length() < 1e-5);
    }
}
