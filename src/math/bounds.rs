use glam::{Mat4, Vec3};

#[derive(Debug, Clone, Copy)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    /// Sphere around the AABB center with the radius of the farthest
    /// input point. Tight enough that picking distances stay honest; the
    /// AABB corner would overshoot for flat or round meshes.
    pub fn from_points(points: impl Iterator<Item = Vec3>) -> BoundingSphere {
        let points: Vec<Vec3> = points.collect();

        if points.is_empty() {
            return BoundingSphere {
                center: Vec3::ZERO,
                radius: 0.0,
            };
        }

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for &point in &points {
            min = min.min(point);
            max = max.max(point);
        }

        let center = (min + max) * 0.5;
        let radius = points
            .iter()
            .map(|&point| (point - center).length())
            .fold(0.0, f32::max);
        BoundingSphere { center, radius }
    }

    pub fn transform(&self, matrix: &Mat4) -> BoundingSphere {
        let center = matrix.transform_point3(self.center);
        let scale = matrix.to_scale_rotation_translation().0;
        let radius = self.radius * scale.max_element();
        BoundingSphere { center, radius }
    }

    #[allow(dead_code)]
    pub fn contains_point(&self, point: Vec3) -> bool {
        (point - self.center).length_squared() <= self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_points_wraps_extremes() {
        let sphere = BoundingSphere::from_points(
            [Vec3::new(-1.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0)].into_iter(),
        );
        assert_eq!(sphere.center, Vec3::new(1.0, 0.0, 0.0));
        assert!((sphere.radius - 2.0).abs() < 1e-6);
        assert!(sphere.contains_point(Vec3::new(2.5, 0.0, 0.0)));
        assert!(!sphere.contains_point(Vec3::new(4.0, 0.0, 0.0)));
    }

    #[test]
    fn radius_comes_from_the_farthest_point_not_the_aabb_corner() {
        // Four points of a flat cross: the AABB corner sits at sqrt(2),
        // but no actual point is farther than 1 from the center.
        let sphere = BoundingSphere::from_points(
            [
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(-1.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(0.0, 0.0, -1.0),
            ]
            .into_iter(),
        );
        assert!(sphere.center.length() < 1e-6);
        assert!((sphere.radius - 1.0).abs() < 1e-6);
    }

    #[test]
    fn transform_scales_radius() {
        let sphere = BoundingSphere {
            center: Vec3::ZERO,
            radius: 1.0,
        };
        let transformed = sphere.transform(&Mat4::from_scale(Vec3::splat(2.0)));
        assert!((transformed.radius - 2.0).abs() < 1e-6);
    }
}
