use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

/// Rays whose direction is closer than this to perpendicular with a plane
/// normal are treated as parallel (no intersection).
pub const PARALLEL_EPSILON: f32 = 1e-6;

/// A world-space ray with unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self {
            origin,
            dir: dir.normalize(),
        }
    }

    /// Ray from a pointer/controller pose: origin at the pose translation,
    /// direction along the pose's forward axis (device-space -Z rotated
    /// into world space).
    pub fn from_pose(position: Vec3, orientation: Quat) -> Self {
        Self {
            origin: position,
            dir: (orientation * Vec3::NEG_Z).normalize(),
        }
    }

    /// Unproject a cursor position in normalized device coordinates through
    /// an inverse view-projection matrix into a world ray.
    pub fn from_ndc(ndc: Vec2, inv_view_proj: Mat4) -> Self {
        let near = inv_view_proj * Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        let far = inv_view_proj * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);

        let near = near.truncate() / near.w;
        let far = far.truncate() / far.w;

        Self {
            origin: near,
            dir: (far - near).normalize(),
        }
    }

    /// Ray through two world points.
    pub fn through(origin: Vec3, target: Vec3) -> Self {
        Self::new(origin, target - origin)
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// An infinite plane through `point` with unit `normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub point: Vec3,
}

impl Plane {
    pub fn new(normal: Vec3, point: Vec3) -> Self {
        Self {
            normal: normal.normalize(),
            point,
        }
    }
}

/// Ray-plane intersection. Returns `None` when the ray is parallel to the
/// plane or the intersection lies behind the ray origin.
pub fn intersect_ray_plane(ray: &Ray, plane: &Plane) -> Option<Vec3> {
    let denom = plane.normal.dot(ray.dir);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }

    let t = (plane.point - ray.origin).dot(plane.normal) / denom;
    if t < 0.0 {
        return None;
    }

    Some(ray.point_at(t))
}

/// Texture UV to content pixel coordinates.
///
/// Texture V runs bottom-up while content pixel Y runs top-down, so V is
/// flipped. Omitting the flip mirrors every forwarded click vertically.
pub fn uv_to_pixel(uv: Vec2, width: u32, height: u32) -> Vec2 {
    Vec2::new(uv.x * width as f32, (1.0 - uv.y) * height as f32)
}

/// Inverse of [`uv_to_pixel`].
pub fn pixel_to_uv(pixel: Vec2, width: u32, height: u32) -> Vec2 {
    Vec2::new(pixel.x / width as f32, 1.0 - pixel.y / height as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_from_pose_is_deterministic() {
        let pos = Vec3::new(1.0, 2.0, 3.0);
        let rot = Quat::from_rotation_y(0.7);
        let a = Ray::from_pose(pos, rot);
        let b = Ray::from_pose(pos, rot);
        assert_eq!(a, b);
        assert!((a.dir.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn identity_pose_looks_down_negative_z() {
        let ray = Ray::from_pose(Vec3::ZERO, Quat::IDENTITY);
        assert!((ray.dir - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn ray_hits_facing_plane() {
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let plane = Plane::new(Vec3::Z, Vec3::new(0.0, 0.0, -3.0));
        let hit = intersect_ray_plane(&ray, &plane).unwrap();
        assert!((hit - Vec3::new(0.0, 0.0, -3.0)).length() < 1e-6);
    }

    #[test]
    fn parallel_ray_misses() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);
        let plane = Plane::new(Vec3::Z, Vec3::new(0.0, 0.0, -3.0));
        assert!(intersect_ray_plane(&ray, &plane).is_none());
    }

    #[test]
    fn plane_behind_origin_misses() {
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let plane = Plane::new(Vec3::Z, Vec3::new(0.0, 0.0, 5.0));
        assert!(intersect_ray_plane(&ray, &plane).is_none());
    }

    #[test]
    fn uv_corners_flip_y() {
        let (w, h) = (512, 256);
        assert_eq!(uv_to_pixel(Vec2::new(0.0, 0.0), w, h), Vec2::new(0.0, 256.0));
        assert_eq!(uv_to_pixel(Vec2::new(1.0, 1.0), w, h), Vec2::new(512.0, 0.0));
    }

    #[test]
    fn uv_pixel_round_trip() {
        let (w, h) = (512, 256);
        for uv in [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.25, 0.75),
        ] {
            let back = pixel_to_uv(uv_to_pixel(uv, w, h), w, h);
            assert!((back - uv).length() < 1e-6);
        }
    }

    #[test]
    fn ndc_center_ray_matches_camera_forward() {
        let view = Mat4::IDENTITY;
        let proj = Mat4::perspective_rh(46.0_f32.to_radians(), 16.0 / 9.0, 0.1, 100.0);
        let inv = (proj * view).inverse();
        let ray = Ray::from_ndc(Vec2::ZERO, inv);
        assert!((ray.dir - Vec3::NEG_Z).length() < 1e-4);
    }
}
