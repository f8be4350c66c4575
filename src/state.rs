use glam::{Quat, Vec2, Vec3, Vec4};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::assets::{AssetLoader, LoadedAsset, LogProgress, ProgressSink, MANIFEST};
use crate::atmosphere::Atmosphere;
use crate::audio::ThunderAudio;
use crate::camera::OrbitCamera;
use crate::config::SceneConfig;
use crate::environment::{self, Environment};
use crate::lightning::Lightning;
use crate::lights::LightRig;
use crate::particles::ParticleGroup;
use crate::picking::{self, HoverTracker, LogTooltip, TooltipSink};
use crate::scene_graph::object3d::{ItemTag, ObjectId};
use crate::scene_graph::scene::Scene;

const ITEM_BOB_AMPLITUDE: f32 = 0.15;
const ITEM_SPIN_SPEED: f32 = 0.12;

/// Per-frame animation bookkeeping for one loaded prop.
struct ItemAnimation {
    object: ObjectId,
    base: Vec3,
    scale: f32,
    phase: f32,
    angle: f32,
}

/// Everything the garden mutates per frame, owned in one place and passed
/// explicitly to the update; there is no ambient global state.
pub struct SceneState {
    pub camera: OrbitCamera,
    pub scene: Scene,
    pub particles: Vec<ParticleGroup>,
    pub lights: LightRig,
    pub lightning: Lightning,
    pub atmosphere: Atmosphere,
    pub audio: ThunderAudio,
    pub config: SceneConfig,
    pub time: f32,

    loader: AssetLoader,
    items: Vec<ItemAnimation>,
    environment: Environment,
    hover: HoverTracker,
    tooltip: Box<dyn TooltipSink>,
    progress: Box<dyn ProgressSink>,
    rng: StdRng,
}

impl SceneState {
    pub fn new(config: SceneConfig) -> anyhow::Result<Self> {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut scene = Scene::new();

        let environment = environment::populate(&mut scene, &config, &mut rng);

        let particles = vec![
            ParticleGroup::fog(config.fog_count, &mut rng),
            ParticleGroup::embers(config.ember_count, &mut rng),
            ParticleGroup::rain(config.rain_count, &mut rng),
            ParticleGroup::leaves(config.leaf_count, &mut rng),
            ParticleGroup::bats(config.bat_count, &mut rng),
        ];

        let loader = AssetLoader::start(MANIFEST)?;

        Ok(Self {
            camera: OrbitCamera::new(config.auto_rotate),
            scene,
            particles,
            lights: LightRig::night_defaults(),
            lightning: Lightning::new(),
            atmosphere: Atmosphere::new(),
            audio: ThunderAudio::new(),
            config,
            time: 0.0,
            loader,
            items: Vec::new(),
            environment,
            hover: HoverTracker::default(),
            tooltip: Box::new(LogTooltip),
            progress: Box::new(LogProgress),
            rng,
        })
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn loading_progress(&self) -> f32 {
        self.loader.progress()
    }

    /// Advances every time-varying visual parameter by one frame. `dt` is
    /// the wall-clock delta; the look is deliberately frame-rate dependent
    /// to match the original's feel.
    pub fn update(&mut self, dt: f32) {
        self.time += dt;

        let ready = self.loader.poll_completed(self.progress.as_mut());
        for loaded in ready {
            self.integrate_loaded(loaded);
        }

        self.camera.update(dt, self.time, &mut self.rng);
        self.atmosphere.update(dt);

        let moon_color = self.atmosphere.moon_color();
        if let Some(moon) = self.scene.get_object_mut(self.environment.moon) {
            moon.emissive = moon_color.extend(0.0);
        }

        self.lights.update(
            self.time,
            &mut self.rng,
            self.camera.eye(),
            self.camera.forward(),
            moon_color,
        );

        if self.lightning.maybe_strike(&mut self.rng) {
            self.camera.shake();
            self.audio.play_thunder();
        }
        self.lightning.update(dt);

        let storm = self.lightning.is_active();
        for group in &mut self.particles {
            group.set_storm(storm);
            group.update(dt, self.time);
        }

        for item in &mut self.items {
            item.angle += ITEM_SPIN_SPEED * dt;
            let bob = (self.time + item.phase).sin() * ITEM_BOB_AMPLITUDE;
            self.scene.set_object_transform(
                item.object,
                item.base + Vec3::Y * bob,
                Quat::from_rotation_y(item.angle),
                item.scale,
            );
        }
    }

    fn integrate_loaded(&mut self, loaded: LoadedAsset) {
        let Some(gltf_scene) = loaded.document.scenes().next() else {
            log::warn!("{} has no scenes, dropping", loaded.spec.name);
            return;
        };

        let tag = ItemTag {
            name: loaded.spec.name.to_string(),
            description: loaded.spec.description.to_string(),
            interactive: true,
        };

        let root = self.scene.spawn_gltf_scene(
            loaded.spec.name,
            &loaded.buffers,
            &gltf_scene,
            Some(&tag),
        );

        self.scene.set_object_transform(
            root,
            loaded.spec.position,
            Quat::IDENTITY,
            loaded.spec.scale,
        );

        self.items.push(ItemAnimation {
            object: root,
            base: loaded.spec.position,
            scale: loaded.spec.scale,
            phase: self.items.len() as f32,
            angle: 0.0,
        });

        log::info!("{} joined the garden", loaded.spec.name);
    }

    /// Pointer-move hook. Converts to NDC, picks against tagged objects,
    /// and lets the hover tracker decide whether the tooltip sink hears
    /// about it.
    pub fn pointer_moved(&mut self, pixel: Vec2, resolution: Vec2) {
        if resolution.x <= 0.0 || resolution.y <= 0.0 {
            return;
        }

        let ndc = picking::ndc_from_pixels(pixel, resolution);
        let ray = self.camera.picking_ray(ndc, resolution);
        let hit = picking::pick(&self.scene, &ray).map(|(id, _)| id);
        self.hover
            .observe(hit, &self.scene, self.tooltip.as_mut());
    }

    /// First click unlocks audio, mirroring browser autoplay rules.
    pub fn pointer_clicked(&mut self) {
        self.audio.unlock();
    }

    /// Drops in-flight loads. Called on shutdown so a late import cannot
    /// land in a dead scene.
    pub fn teardown(&mut self) {
        self.loader.cancel_all();
    }

    /// Fog parameters for the renderer, already tinted by the blood moon
    /// and brightened while lightning is up.
    pub fn fog(&self) -> Vec4 {
        let flash = self.lightning.flash_intensity();
        let color = self.atmosphere.fog_color() + Vec3::splat(flash * 0.25);
        color.extend(crate::atmosphere::FOG_DENSITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn three_hundred_updates_never_fault() {
        let mut state = SceneState::new(SceneConfig::default()).unwrap();

        for _ in 0..300 {
            state.update(DT);

            let blood = state.atmosphere.blood();
            assert!((0.0..=1.0).contains(&blood));

            let moon = state.atmosphere.moon_color();
            assert!(moon.is_finite());

            assert!((0.0..=1.0).contains(&state.loading_progress()));
            assert!(state.item_count() <= MANIFEST.len());
        }

        assert!(state.time > 4.9 && state.time < 5.1);
    }

    #[test]
    fn shake_runs_out_and_idle_bob_resumes() {
        let mut state = SceneState::new(SceneConfig::default()).unwrap();
        state.camera.shake();

        for _ in 0..120 {
            state.update(DT);
        }

        assert_eq!(state.camera.shake_timer(), 0.0);
    }

    #[test]
    fn pointer_over_empty_sky_hovers_nothing() {
        let mut state = SceneState::new(SceneConfig::default()).unwrap();
        state.update(DT);

        // No interactive props are loaded in tests, so any pick misses.
        state.pointer_moved(Vec2::new(10.0, 10.0), Vec2::new(1280.0, 720.0));
        assert!(state.hover.hovered().is_none());
    }

    /// Single-triangle glTF document; the buffer bytes are assembled in
    /// `wisp_asset` and handed over the way the loader would.
    const WISP_GLTF: &str = r#"{
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": [0]}],
        "nodes": [{"mesh": 0, "name": "Wisp"}],
        "meshes": [{"name": "Wisp Mesh", "primitives": [
            {"attributes": {"POSITION": 0, "NORMAL": 1}, "indices": 2}
        ]}],
        "accessors": [
            {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
             "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
            {"bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3"},
            {"bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR"}
        ],
        "bufferViews": [
            {"buffer": 0, "byteOffset": 0, "byteLength": 36},
            {"buffer": 0, "byteOffset": 36, "byteLength": 36},
            {"buffer": 0, "byteOffset": 72, "byteLength": 6}
        ],
        "buffers": [{"byteLength": 78}]
    }"#;

    fn wisp_asset() -> LoadedAsset {
        let mut bytes = Vec::new();
        for position in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for component in position {
                bytes.extend_from_slice(&component.to_le_bytes());
            }
        }
        for _ in 0..3 {
            for component in [0.0f32, 0.0, 1.0] {
                bytes.extend_from_slice(&component.to_le_bytes());
            }
        }
        for index in [0u16, 1, 2] {
            bytes.extend_from_slice(&index.to_le_bytes());
        }

        let gltf = gltf::Gltf::from_slice(WISP_GLTF.as_bytes()).unwrap();
        LoadedAsset {
            spec: &MANIFEST[0],
            document: gltf.document,
            buffers: vec![gltf::buffer::Data(bytes)],
        }
    }

    #[test]
    fn completed_load_adds_one_fully_tagged_item() {
        let mut state = SceneState::new(SceneConfig::default()).unwrap();
        let before = state.item_count();

        state.integrate_loaded(wisp_asset());

        assert_eq!(state.item_count(), before + 1);
        let root = state.items.last().unwrap().object;

        // The root lands where the manifest places it.
        let object = state.scene.get_object(root).unwrap();
        assert_eq!(object.transform.translation(), MANIFEST[0].position);

        // Every node in the subtree carries the manifest metadata.
        let mut pending = vec![root];
        let mut seen = 0;
        while let Some(id) = pending.pop() {
            let object = state.scene.get_object(id).unwrap();
            let tag = object.tag.as_ref().expect("untagged node in subtree");
            assert_eq!(tag.name, MANIFEST[0].name);
            assert_eq!(tag.description, MANIFEST[0].description);
            assert!(object.is_interactive());
            seen += 1;
            pending.extend(object.child_ids.iter().copied());
        }
        // At least the group root and the mesh node.
        assert!(seen >= 2);

        // The new item animates like the rest: it bobs around its base.
        state.update(DT);
        let world_y = state
            .scene
            .get_object(root)
            .unwrap()
            .transform
            .translation()
            .y;
        assert!((world_y - MANIFEST[0].position.y).abs() <= 0.2);
    }

    #[test]
    fn lightning_strike_shakes_the_camera() {
        let mut state = SceneState::new(SceneConfig::default()).unwrap();

        // Drive the machine directly; the random roll is too rare for a test.
        assert!(state.lightning.strike());
        state.camera.shake();
        state.update(DT);

        assert!(state.lightning.is_active());
        assert!(state.camera.shake_timer() > 0.0);

        // Rain is boosted while the sequence runs.
        let rain = state
            .particles
            .iter()
            .find(|g| g.kind == crate::particles::ParticleKind::Rain)
            .unwrap();
        assert!(rain.opacity > 0.5);
    }
}
