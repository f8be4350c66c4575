use glam::{Quat, Vec3, Vec4};
use rand::Rng;

use crate::config::SceneConfig;
use crate::model::Model;
use crate::scene_graph::object3d::{Object3D, ObjectId};
use crate::scene_graph::scene::Scene;
use crate::scene_graph::scene_model::SceneModel;

const GROUND_RADIUS: f32 = 20.0;
const MOON_POSITION: Vec3 = Vec3::new(-14.0, 18.0, -26.0);

/// Handles to the environment objects that get touched every frame.
pub struct Environment {
    pub moon: ObjectId,
    #[allow(dead_code)]
    pub ground: ObjectId,
}

/// Builds the static garden: ground disc, moon, and a ring of dead trees.
/// Deterministic apart from the seeded rng used for tree placement.
pub fn populate(scene: &mut Scene, config: &SceneConfig, rng: &mut impl Rng) -> Environment {
    let ground = scene.spawn_model(
        Model::disc(
            "Ground",
            GROUND_RADIUS,
            48,
            Vec4::new(0.02, 0.02, 0.02, 1.0),
        ),
        Vec3::ZERO,
        1.0,
    );

    let moon = scene.spawn_model(
        Model::uv_sphere("Moon", 2.5, 24, 32, Vec4::new(0.1, 0.1, 0.12, 1.0)),
        MOON_POSITION,
        1.0,
    );

    spawn_tree_ring(scene, config.tree_count, rng);

    Environment { moon, ground }
}

/// One shared spruce silhouette, instanced around the clearing with random
/// heading and scale.
fn spawn_tree_ring(scene: &mut Scene, count: usize, rng: &mut impl Rng) {
    if count == 0 {
        return;
    }

    let trunk = Model::cylinder("Trunk", 0.18, 1.4, 8, Vec4::new(0.05, 0.03, 0.02, 1.0));
    let mut canopy =
        Model::cone("Canopy", 1.3, 4.2, 10, Vec4::new(0.02, 0.05, 0.03, 1.0)).translated(Vec3::Y * 1.1);
    canopy.primitives[0].index = 1;

    // Merge into a single model so every tree is one draw instance.
    let mut tree = trunk;
    tree.primitives.extend(canopy.primitives);
    tree.name = "Spruce".to_string();

    let model_id = scene.add_model(SceneModel::new(tree));

    for _ in 0..count {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let radius = rng.gen_range(11.0..GROUND_RADIUS - 1.5);
        let position = Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius);

        let mut object = Object3D::default();
        object.name = "Spruce".to_string();
        object.model_id = Some(model_id);
        object.transform.set_transform(
            position,
            Quat::from_rotation_y(rng.gen_range(0.0..std::f32::consts::TAU)),
            rng.gen_range(0.8..1.7),
        );
        scene.add_object(object);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn populate_is_deterministic_for_a_fixed_seed() {
        let config = SceneConfig::default();

        let mut scene_a = Scene::new();
        let mut rng_a = StdRng::seed_from_u64(config.seed);
        populate(&mut scene_a, &config, &mut rng_a);

        let mut scene_b = Scene::new();
        let mut rng_b = StdRng::seed_from_u64(config.seed);
        populate(&mut scene_b, &config, &mut rng_b);

        assert_eq!(scene_a.objects.len(), scene_b.objects.len());

        let translations_a: Vec<Vec3> = scene_a
            .objects
            .iter()
            .map(|(_, o)| o.transform.translation())
            .collect();
        let translations_b: Vec<Vec3> = scene_b
            .objects
            .iter()
            .map(|(_, o)| o.transform.translation())
            .collect();
        assert_eq!(translations_a, translations_b);
    }

    #[test]
    fn trees_stay_on_the_ground_disc() {
        let config = SceneConfig::default();
        let mut scene = Scene::new();
        let mut rng = StdRng::seed_from_u64(config.seed);
        populate(&mut scene, &config, &mut rng);

        for (_, object) in scene.objects.iter() {
            if object.name == "Spruce" {
                let position = object.transform.translation();
                assert!(position.y == 0.0);
                assert!(Vec3::new(position.x, 0.0, position.z).length() <= GROUND_RADIUS);
            }
        }
    }
}
