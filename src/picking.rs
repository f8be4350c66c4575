use glam::{Vec2, Vec3};

use crate::math::bounds::BoundingSphere;
use crate::scene_graph::object3d::ObjectId;
use crate::scene_graph::scene::Scene;

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    /// Distance along the ray to the nearest intersection with the sphere,
    /// or None if the ray misses or the sphere is behind the origin.
    pub fn intersect_sphere(&self, sphere: &BoundingSphere) -> Option<f32> {
        let to_center = sphere.center - self.origin;
        let projected = to_center.dot(self.dir);
        let closest_sq = to_center.length_squared() - projected * projected;
        let radius_sq = sphere.radius * sphere.radius;

        if closest_sq > radius_sq {
            return None;
        }

        let half_chord = (radius_sq - closest_sq).sqrt();
        let near = projected - half_chord;
        let far = projected + half_chord;

        if near >= 0.0 {
            Some(near)
        } else if far >= 0.0 {
            // Origin is inside the sphere.
            Some(0.0)
        } else {
            None
        }
    }
}

/// Converts window pixel coordinates to normalized device coordinates
/// (x right, y up, both in [-1, 1]).
pub fn ndc_from_pixels(position: Vec2, resolution: Vec2) -> Vec2 {
    Vec2::new(
        position.x / resolution.x * 2.0 - 1.0,
        -(position.y / resolution.y * 2.0 - 1.0),
    )
}

/// Casts `ray` against every visible interactive object and returns the
/// nearest hit. Objects without an interactive tag never participate, so a
/// closer untagged mesh cannot mask a tagged one behind it.
pub fn pick(scene: &Scene, ray: &Ray) -> Option<(ObjectId, f32)> {
    let mut nearest: Option<(ObjectId, f32)> = None;

    for (id, object) in scene.objects.iter() {
        if !object.visible || !object.is_interactive() {
            continue;
        }
        let Some(model_id) = object.model_id else {
            continue;
        };
        let Some(model) = scene.models.get(model_id) else {
            continue;
        };

        let world_bounds = model.bounds.transform(&object.transform.get_world_matrix());
        let Some(distance) = ray.intersect_sphere(&world_bounds) else {
            continue;
        };

        if nearest.is_none_or(|(_, best)| distance < best) {
            nearest = Some((id, distance));
        }
    }

    nearest
}

/// Receives hover metadata. The production implementation logs; a richer
/// overlay can plug in without touching the picking code.
pub trait TooltipSink {
    fn show(&mut self, name: &str, description: &str);
    fn hide(&mut self);
}

pub struct LogTooltip;

impl TooltipSink for LogTooltip {
    fn show(&mut self, name: &str, description: &str) {
        log::info!("{}: {}", name, description);
    }

    fn hide(&mut self) {}
}

/// Tracks the hovered object across pointer events and notifies the sink
/// exactly once per transition, never per repeated event.
#[derive(Default)]
pub struct HoverTracker {
    current: Option<ObjectId>,
}

impl HoverTracker {
    pub fn observe(&mut self, hit: Option<ObjectId>, scene: &Scene, sink: &mut dyn TooltipSink) {
        if hit == self.current {
            return;
        }

        self.current = hit;

        match hit.and_then(|id| scene.get_object(id)).and_then(|o| o.tag.as_ref()) {
            Some(tag) => sink.show(&tag.name, &tag.description),
            None => sink.hide(),
        }
    }

    #[allow(dead_code)]
    pub fn hovered(&self) -> Option<ObjectId> {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;
    use crate::scene_graph::object3d::ItemTag;
    use glam::Vec4;

    fn tag(name: &str, interactive: bool) -> ItemTag {
        ItemTag {
            name: name.to_string(),
            description: format!("{} description", name),
            interactive,
        }
    }

    fn spawn_sphere(scene: &mut Scene, name: &str, position: Vec3, item: Option<ItemTag>) -> ObjectId {
        let id = scene.spawn_model(Model::uv_sphere(name, 1.0, 6, 8, Vec4::ONE), position, 1.0);
        if let Some(item) = item {
            scene.tag_subtree(id, &item);
        }
        id
    }

    #[derive(Default)]
    struct CountingSink {
        shows: Vec<String>,
        hides: usize,
    }

    impl TooltipSink for CountingSink {
        fn show(&mut self, name: &str, _description: &str) {
            self.shows.push(name.to_string());
        }

        fn hide(&mut self) {
            self.hides += 1;
        }
    }

    #[test]
    fn untagged_mesh_in_front_does_not_mask_tagged_mesh() {
        let mut scene = Scene::new();
        spawn_sphere(&mut scene, "Rock", Vec3::new(0.0, 0.0, 3.0), None);
        let specter = spawn_sphere(
            &mut scene,
            "Specter",
            Vec3::new(0.0, 0.0, 5.0),
            Some(tag("Specter", true)),
        );
        scene.update_transforms();

        let ray = Ray {
            origin: Vec3::ZERO,
            dir: Vec3::Z,
        };
        let (hit, distance) = pick(&scene, &ray).expect("tagged sphere should be hit");
        assert_eq!(hit, specter);
        assert!((distance - 4.0).abs() < 1e-4);
    }

    #[test]
    fn nearest_tagged_hit_wins() {
        let mut scene = Scene::new();
        let near = spawn_sphere(
            &mut scene,
            "Near",
            Vec3::new(0.0, 0.0, 3.0),
            Some(tag("Near", true)),
        );
        spawn_sphere(
            &mut scene,
            "Far",
            Vec3::new(0.0, 0.0, 8.0),
            Some(tag("Far", true)),
        );
        scene.update_transforms();

        let ray = Ray {
            origin: Vec3::ZERO,
            dir: Vec3::Z,
        };
        let (hit, _) = pick(&scene, &ray).unwrap();
        assert_eq!(hit, near);
    }

    #[test]
    fn non_interactive_tag_is_ignored() {
        let mut scene = Scene::new();
        spawn_sphere(
            &mut scene,
            "Scenery",
            Vec3::new(0.0, 0.0, 3.0),
            Some(tag("Scenery", false)),
        );
        scene.update_transforms();

        let ray = Ray {
            origin: Vec3::ZERO,
            dir: Vec3::Z,
        };
        assert!(pick(&scene, &ray).is_none());
    }

    #[test]
    fn hover_notifications_fire_once_per_transition() {
        let mut scene = Scene::new();
        let specter = spawn_sphere(
            &mut scene,
            "Specter",
            Vec3::new(0.0, 0.0, 5.0),
            Some(tag("Specter", true)),
        );
        scene.update_transforms();

        let mut tracker = HoverTracker::default();
        let mut sink = CountingSink::default();

        // Repeated hits on the same object: one show.
        for _ in 0..10 {
            tracker.observe(Some(specter), &scene, &mut sink);
        }
        assert_eq!(sink.shows, vec!["Specter".to_string()]);
        assert_eq!(sink.hides, 0);

        // Repeated misses: one hide.
        for _ in 0..10 {
            tracker.observe(None, &scene, &mut sink);
        }
        assert_eq!(sink.shows.len(), 1);
        assert_eq!(sink.hides, 1);

        // Re-entering shows again.
        tracker.observe(Some(specter), &scene, &mut sink);
        assert_eq!(sink.shows.len(), 2);
    }

    #[test]
    fn ndc_conversion_flips_y() {
        let resolution = Vec2::new(800.0, 600.0);
        let center = ndc_from_pixels(Vec2::new(400.0, 300.0), resolution);
        assert!(center.length() < 1e-6);

        let top_left = ndc_from_pixels(Vec2::ZERO, resolution);
        assert_eq!(top_left, Vec2::new(-1.0, 1.0));
    }
}
