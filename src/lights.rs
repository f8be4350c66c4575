use glam::Vec3;
use rand::Rng;

/// Ambient fill, purple like the original garden.
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

pub struct PointLight {
    pub position: Vec3,
    pub radius: f32,
    pub color: Vec3,
    pub intensity: f32,
}

pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    /// Cosines of the cone angles.
    pub inner_cutoff: f32,
    pub outer_cutoff: f32,
}

const EMBER_BASE_INTENSITY: f32 = 4.0;
const EMBER_FLICKER_AMPLITUDE: f32 = 1.1;
const EMBER_JITTER: f32 = 0.5;

const TORCH_BASE_INTENSITY: f32 = 2.2;
/// Chance per frame that the handheld torch browns out for a moment.
const TORCH_DIP_CHANCE: f64 = 0.02;
const TORCH_DIP_FACTOR: f32 = 0.35;

pub struct LightRig {
    pub ambient: AmbientLight,
    pub moonlight: DirectionalLight,
    pub ember: PointLight,
    pub torch: SpotLight,
}

impl LightRig {
    pub fn night_defaults() -> Self {
        Self {
            ambient: AmbientLight {
                color: Vec3::new(0.17, 0.06, 0.33),
                intensity: 0.5,
            },
            moonlight: DirectionalLight {
                direction: Vec3::new(-0.35, -0.8, -0.5).normalize(),
                color: Vec3::new(0.29, 0.33, 0.39),
                intensity: 0.8,
            },
            ember: PointLight {
                position: Vec3::new(0.0, -2.0, 0.0),
                radius: 20.0,
                color: Vec3::new(1.0, 0.3, 0.0),
                intensity: EMBER_BASE_INTENSITY,
            },
            torch: SpotLight {
                position: Vec3::ZERO,
                direction: Vec3::NEG_Z,
                color: Vec3::new(1.0, 0.9, 0.7),
                intensity: TORCH_BASE_INTENSITY,
                inner_cutoff: 0.94,
                outer_cutoff: 0.85,
            },
        }
    }

    /// Per-frame flicker and re-aiming. The ember light breathes with a
    /// sinusoid plus uniform jitter; the torch rides the camera and dips on
    /// rare frames; the moonlight picks up the blood-moon tint.
    pub fn update(
        &mut self,
        time: f32,
        rng: &mut impl Rng,
        camera_eye: Vec3,
        camera_forward: Vec3,
        moon_color: Vec3,
    ) {
        self.ember.intensity = (EMBER_BASE_INTENSITY
            + (time * 7.0).sin() * EMBER_FLICKER_AMPLITUDE
            + rng.gen_range(-EMBER_JITTER..EMBER_JITTER))
        .max(0.0);

        self.torch.position = camera_eye;
        self.torch.direction = camera_forward;
        self.torch.intensity = if rng.gen_bool(TORCH_DIP_CHANCE) {
            TORCH_BASE_INTENSITY * TORCH_DIP_FACTOR
        } else {
            TORCH_BASE_INTENSITY
        };

        self.moonlight.color = moon_color * 0.4;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn ember_flicker_never_goes_negative() {
        let mut rig = LightRig::night_defaults();
        let mut rng = StdRng::seed_from_u64(3);

        for frame in 0..600 {
            rig.update(frame as f32 / 60.0, &mut rng, Vec3::ZERO, Vec3::NEG_Z, Vec3::ONE);
            assert!(rig.ember.intensity >= 0.0);
            assert!(
                rig.ember.intensity
                    <= EMBER_BASE_INTENSITY + EMBER_FLICKER_AMPLITUDE + EMBER_JITTER
            );
        }
    }

    #[test]
    fn torch_follows_the_camera() {
        let mut rig = LightRig::night_defaults();
        let mut rng = StdRng::seed_from_u64(3);

        let eye = Vec3::new(4.0, 5.0, -2.0);
        let forward = Vec3::new(0.0, -0.3, 1.0).normalize();
        rig.update(0.0, &mut rng, eye, forward, Vec3::ONE);

        assert_eq!(rig.torch.position, eye);
        assert_eq!(rig.torch.direction, forward);
        assert!(
            rig.torch.intensity == TORCH_BASE_INTENSITY
                || rig.torch.intensity == TORCH_BASE_INTENSITY * TORCH_DIP_FACTOR
        );
    }
}
