use glam::Vec3;

/// Full pale-to-blood-and-back cycle, comfortably over a minute.
pub const BLOOD_MOON_PERIOD: f32 = 75.0;

const MOON_PALE: Vec3 = Vec3::new(0.82, 0.85, 0.95);
const MOON_BLOOD: Vec3 = Vec3::new(0.95, 0.18, 0.1);

const FOG_NIGHT: Vec3 = Vec3::new(0.039, 0.039, 0.078);
const FOG_BLOOD: Vec3 = Vec3::new(0.11, 0.03, 0.035);

pub const FOG_DENSITY: f32 = 0.045;

/// Slow "blood moon" cycle tinting the moon and the fog. Pure function of
/// accumulated time, so it can never drift out of its color range.
pub struct Atmosphere {
    cycle: f32,
}

impl Atmosphere {
    pub fn new() -> Self {
        Self { cycle: 0.0 }
    }

    pub fn update(&mut self, dt: f32) {
        self.cycle += dt;
    }

    /// Blend position in [0, 1]: 0 is the pale moon, 1 is fully blood red.
    pub fn blood(&self) -> f32 {
        0.5 - 0.5 * (self.cycle * std::f32::consts::TAU / BLOOD_MOON_PERIOD).cos()
    }

    pub fn moon_color(&self) -> Vec3 {
        MOON_PALE.lerp(MOON_BLOOD, self.blood())
    }

    pub fn fog_color(&self) -> Vec3 {
        FOG_NIGHT.lerp(FOG_BLOOD, self.blood() * 0.7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blood_cycle_stays_in_unit_range() {
        let mut atmosphere = Atmosphere::new();
        for _ in 0..300 {
            atmosphere.update(1.0 / 60.0);
            let blood = atmosphere.blood();
            assert!((0.0..=1.0).contains(&blood));

            let moon = atmosphere.moon_color();
            for channel in [moon.x, moon.y, moon.z] {
                assert!((0.0..=1.0).contains(&channel));
            }
        }
    }

    #[test]
    fn cycle_starts_pale_and_reaches_blood_at_half_period() {
        let mut atmosphere = Atmosphere::new();
        assert!(atmosphere.blood() < 1e-6);

        atmosphere.update(BLOOD_MOON_PERIOD / 2.0);
        assert!((atmosphere.blood() - 1.0).abs() < 1e-3);

        atmosphere.update(BLOOD_MOON_PERIOD / 2.0);
        assert!(atmosphere.blood() < 1e-3);
    }
}
