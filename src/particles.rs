use glam::{Vec3, Vec4};
use rand::Rng;

/// Vertical band particles fall through. Rain and leaves reset to the top
/// when they drop past the bottom.
const FALL_TOP: f32 = 20.0;
const FALL_BOTTOM: f32 = 0.0;
const SPREAD: f32 = 40.0;

const RAIN_SPEED: f32 = 18.0;
const LEAF_SPEED: f32 = 1.6;
const EMBER_SPEED: f32 = 0.9;

const RAIN_BASE_OPACITY: f32 = 0.35;
const RAIN_STORM_OPACITY: f32 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    Fog,
    Embers,
    Rain,
    Leaves,
    Bats,
}

pub struct Particle {
    pub position: Vec3,
    /// Spawn anchor. Fog bobs around it, bats orbit the scene at its
    /// radius, fallers keep its horizontal placement.
    pub home: Vec3,
    pub phase: f32,
    pub size: f32,
    /// Vertical squash factor for wing flapping; 1.0 everywhere else.
    pub flap: f32,
}

pub struct ParticleGroup {
    pub kind: ParticleKind,
    pub particles: Vec<Particle>,
    pub color: Vec3,
    pub opacity: f32,
    storm: bool,
}

impl ParticleGroup {
    fn spawn(
        kind: ParticleKind,
        count: usize,
        color: Vec3,
        opacity: f32,
        size: f32,
        rng: &mut impl Rng,
    ) -> Self {
        let particles = (0..count)
            .map(|_| {
                let home = Vec3::new(
                    rng.gen_range(-0.5..0.5) * SPREAD,
                    rng.gen_range(FALL_BOTTOM..FALL_TOP),
                    rng.gen_range(-0.5..0.5) * SPREAD,
                );
                Particle {
                    position: home,
                    home,
                    phase: rng.gen_range(0.0..std::f32::consts::TAU),
                    size: size * rng.gen_range(0.7..1.3),
                    flap: 1.0,
                }
            })
            .collect();

        Self {
            kind,
            particles,
            color,
            opacity,
            storm: false,
        }
    }

    pub fn fog(count: usize, rng: &mut impl Rng) -> Self {
        let mut group = Self::spawn(
            ParticleKind::Fog,
            count,
            Vec3::new(0.45, 0.42, 0.58),
            0.16,
            5.0,
            rng,
        );
        // Fog hugs the ground.
        for particle in &mut group.particles {
            particle.home.y = rng.gen_range(0.3..2.0);
            particle.position = particle.home;
        }
        group
    }

    pub fn embers(count: usize, rng: &mut impl Rng) -> Self {
        let mut group = Self::spawn(
            ParticleKind::Embers,
            count,
            Vec3::new(1.0, 0.45, 0.1),
            0.7,
            0.08,
            rng,
        );
        for particle in &mut group.particles {
            particle.home.y = rng.gen_range(0.0..6.0);
            particle.position = particle.home;
        }
        group
    }

    pub fn rain(count: usize, rng: &mut impl Rng) -> Self {
        Self::spawn(
            ParticleKind::Rain,
            count,
            Vec3::new(0.55, 0.6, 0.8),
            RAIN_BASE_OPACITY,
            0.05,
            rng,
        )
    }

    pub fn leaves(count: usize, rng: &mut impl Rng) -> Self {
        Self::spawn(
            ParticleKind::Leaves,
            count,
            Vec3::new(0.55, 0.3, 0.08),
            0.9,
            0.25,
            rng,
        )
    }

    pub fn bats(count: usize, rng: &mut impl Rng) -> Self {
        let mut group = Self::spawn(
            ParticleKind::Bats,
            count,
            Vec3::new(0.08, 0.06, 0.1),
            1.0,
            0.6,
            rng,
        );
        for particle in &mut group.particles {
            // Orbit radius comes from the spawn point; keep them high up.
            particle.home.y = rng.gen_range(6.0..12.0);
            particle.position = particle.home;
        }
        group
    }

    /// Raises rain visibility while a lightning sequence is active. Other
    /// kinds ignore the storm flag.
    pub fn set_storm(&mut self, active: bool) {
        self.storm = active;
        if self.kind == ParticleKind::Rain {
            self.opacity = if active {
                RAIN_STORM_OPACITY
            } else {
                RAIN_BASE_OPACITY
            };
        }
    }

    pub fn update(&mut self, dt: f32, time: f32) {
        match self.kind {
            ParticleKind::Fog => {
                for p in &mut self.particles {
                    p.position.y = p.home.y + (time * 0.5 + p.phase).sin() * 0.4;
                }
            }
            ParticleKind::Embers => {
                for p in &mut self.particles {
                    p.position.y += EMBER_SPEED * dt;
                    if p.position.y > 7.0 {
                        p.position.y = 0.0;
                    }
                    p.position.x = p.home.x + (time * 0.7 + p.phase).sin() * 0.5;
                    p.position.z = p.home.z + (time * 0.6 + p.phase).cos() * 0.5;
                }
            }
            ParticleKind::Rain => {
                for p in &mut self.particles {
                    p.position.y -= RAIN_SPEED * dt;
                    if p.position.y < FALL_BOTTOM {
                        p.position.y = FALL_TOP;
                    }
                }
            }
            ParticleKind::Leaves => {
                for p in &mut self.particles {
                    p.position.y -= LEAF_SPEED * dt;
                    if p.position.y < FALL_BOTTOM {
                        p.position.y = FALL_TOP;
                    }
                    p.position.x = p.home.x + (time + p.phase).sin() * 1.5;
                    p.flap = 0.6 + 0.4 * (time * 3.0 + p.phase).sin().abs();
                }
            }
            ParticleKind::Bats => {
                for p in &mut self.particles {
                    let radius = Vec3::new(p.home.x, 0.0, p.home.z).length().max(4.0);
                    let angle = time * 0.6 + p.phase;
                    p.position = Vec3::new(
                        angle.cos() * radius,
                        p.home.y + (time * 2.0 + p.phase).sin() * 1.2,
                        angle.sin() * radius,
                    );
                    p.flap = 0.35 + 0.65 * (time * 9.0 + p.phase).sin().abs();
                }
            }
        }
    }

    pub fn color_with_opacity(&self) -> Vec4 {
        self.color.extend(self.opacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn rain_stays_inside_fall_band() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut rain = ParticleGroup::rain(64, &mut rng);

        for frame in 0..1000 {
            rain.update(DT, frame as f32 * DT);
            for p in &rain.particles {
                assert!(
                    p.position.y >= FALL_BOTTOM && p.position.y <= FALL_TOP,
                    "rain particle escaped the fall band: {}",
                    p.position.y
                );
            }
        }
    }

    #[test]
    fn leaves_wrap_to_top_after_falling_out() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut leaves = ParticleGroup::leaves(16, &mut rng);
        leaves.particles[0].position.y = FALL_BOTTOM + 0.001;

        // One oversized step pushes it past the bottom; it must reappear at
        // the top, not keep falling.
        leaves.update(1.0, 0.0);
        assert_eq!(leaves.particles[0].position.y, FALL_TOP);
    }

    #[test]
    fn storm_flag_only_raises_rain_opacity() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut rain = ParticleGroup::rain(4, &mut rng);
        let mut fog = ParticleGroup::fog(4, &mut rng);
        let fog_opacity = fog.opacity;

        rain.set_storm(true);
        fog.set_storm(true);
        assert_eq!(rain.opacity, RAIN_STORM_OPACITY);
        assert_eq!(fog.opacity, fog_opacity);

        rain.set_storm(false);
        assert_eq!(rain.opacity, RAIN_BASE_OPACITY);
    }

    #[test]
    fn fog_bobs_around_its_anchor() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut fog = ParticleGroup::fog(8, &mut rng);

        for frame in 0..600 {
            fog.update(DT, frame as f32 * DT);
            for p in &fog.particles {
                assert!((p.position.y - p.home.y).abs() <= 0.4 + 1e-4);
                assert_eq!(p.position.x, p.home.x);
            }
        }
    }

    #[test]
    fn bats_keep_flying_without_faults() {
        let mut rng = StdRng::seed_from_u64(21);
        let mut bats = ParticleGroup::bats(5, &mut rng);

        for frame in 0..600 {
            bats.update(DT, frame as f32 * DT);
            for p in &bats.particles {
                assert!(p.position.is_finite());
                assert!(p.flap > 0.0 && p.flap <= 1.0);
            }
        }
    }
}
