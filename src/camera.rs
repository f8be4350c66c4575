use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};
use rand::Rng;

use crate::picking::Ray;

const FOV_Y: f32 = 60.0;
const NEAR: f32 = 0.1;
const FAR: f32 = 400.0;

const MIN_DISTANCE: f32 = 5.0;
const MAX_DISTANCE: f32 = 25.0;
const MIN_PITCH: f32 = 0.05;
const MAX_PITCH: f32 = 1.4;

const AUTO_ROTATE_SPEED: f32 = 0.08;
const DAMPING: f32 = 6.0;

/// Fixed per-frame decrement, so a shake always settles within
/// `1.0 / SHAKE_DECREMENT` frames regardless of frame rate.
const SHAKE_DECREMENT: f32 = 1.0 / 45.0;
const SHAKE_STRENGTH: f32 = 0.35;
const IDLE_BOB_AMPLITUDE: f32 = 0.12;

/// Orbit camera circling the garden. Drag input and auto-rotation steer
/// goal angles; the actual angles chase them with exponential damping.
pub struct OrbitCamera {
    pub target: Vec3,
    yaw: f32,
    pitch: f32,
    distance: f32,
    yaw_goal: f32,
    pitch_goal: f32,
    distance_goal: f32,
    auto_rotate: bool,
    shake_timer: f32,
    eye: Vec3,
}

impl OrbitCamera {
    pub fn new(auto_rotate: bool) -> Self {
        let yaw = 0.6;
        let pitch = 0.45;
        let distance = 14.0;
        let mut camera = Self {
            target: Vec3::new(0.0, 2.0, 0.0),
            yaw,
            pitch,
            distance,
            yaw_goal: yaw,
            pitch_goal: pitch,
            distance_goal: distance,
            auto_rotate,
            shake_timer: 0.0,
            eye: Vec3::ZERO,
        };
        camera.eye = camera.orbit_position();
        camera
    }

    pub fn orbit(&mut self, delta: Vec2) {
        self.yaw_goal += delta.x * 0.005;
        self.pitch_goal = (self.pitch_goal + delta.y * 0.005).clamp(MIN_PITCH, MAX_PITCH);
    }

    pub fn zoom(&mut self, amount: f32) {
        self.distance_goal = (self.distance_goal - amount).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn shake(&mut self) {
        self.shake_timer = 1.0;
    }

    pub fn shake_timer(&self) -> f32 {
        self.shake_timer
    }

    pub fn update(&mut self, dt: f32, time: f32, rng: &mut impl Rng) {
        if self.auto_rotate {
            self.yaw_goal += AUTO_ROTATE_SPEED * dt;
        }

        let blend = 1.0 - (-DAMPING * dt).exp();
        self.yaw += (self.yaw_goal - self.yaw) * blend;
        self.pitch += (self.pitch_goal - self.pitch) * blend;
        self.distance += (self.distance_goal - self.distance) * blend;

        let mut eye = self.orbit_position();

        if self.shake_timer > 0.0 {
            let jolt = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            eye += jolt * SHAKE_STRENGTH * self.shake_timer;
            self.shake_timer = (self.shake_timer - SHAKE_DECREMENT).max(0.0);
        } else {
            eye.y += (time * 0.8).sin() * IDLE_BOB_AMPLITUDE;
        }

        self.eye = eye;
    }

    fn orbit_position(&self) -> Vec3 {
        let offset = Vec3::new(
            self.pitch.cos() * self.yaw.cos(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.sin(),
        ) * self.distance;
        self.target + offset
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.eye).normalize()
    }

    pub fn view_proj(&self, resolution: Vec2) -> Mat4 {
        let view = Mat4::look_at_lh(self.eye, self.target, Vec3::Y);
        let projection =
            Mat4::perspective_lh(FOV_Y.to_radians(), resolution.x / resolution.y, NEAR, FAR);
        projection * view
    }

    /// Ray from the eye through a point given in normalized device
    /// coordinates (x right, y up, both in [-1, 1]).
    pub fn picking_ray(&self, ndc: Vec2, resolution: Vec2) -> Ray {
        let inverse = self.view_proj(resolution).inverse();
        let near = inverse * glam::Vec4::new(ndc.x, ndc.y, 0.1, 1.0);
        let far = inverse * glam::Vec4::new(ndc.x, ndc.y, 0.9, 1.0);
        let near = near.xyz() / near.w;
        let far = far.xyz() / far.w;

        Ray {
            origin: self.eye,
            dir: (far - near).normalize(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn shake_timer_strictly_decreases_to_zero() {
        let mut camera = OrbitCamera::new(false);
        let mut rng = StdRng::seed_from_u64(7);
        camera.shake();

        let mut previous = camera.shake_timer();
        assert_eq!(previous, 1.0);

        let mut frames = 0;
        while camera.shake_timer() > 0.0 {
            camera.update(DT, frames as f32 * DT, &mut rng);
            let current = camera.shake_timer();
            assert!(current < previous, "shake timer must strictly decrease");
            previous = current;
            frames += 1;
            assert!(frames <= 60, "shake did not settle in a bounded frame count");
        }

        // Idle bob resumes once the timer is spent.
        camera.update(DT, 10.0, &mut rng);
        assert_eq!(camera.shake_timer(), 0.0);
    }

    #[test]
    fn damping_converges_on_goal_angles() {
        let mut camera = OrbitCamera::new(false);
        let mut rng = StdRng::seed_from_u64(7);
        camera.orbit(Vec2::new(200.0, 0.0));

        for frame in 0..240 {
            camera.update(DT, frame as f32 * DT, &mut rng);
        }

        assert!((camera.yaw - camera.yaw_goal).abs() < 1e-3);
    }

    #[test]
    fn zoom_respects_distance_limits() {
        let mut camera = OrbitCamera::new(false);
        camera.zoom(1000.0);
        assert_eq!(camera.distance_goal, MIN_DISTANCE);
        camera.zoom(-1000.0);
        assert_eq!(camera.distance_goal, MAX_DISTANCE);
    }

    #[test]
    fn picking_ray_points_at_target_through_screen_center() {
        let mut camera = OrbitCamera::new(false);
        let mut rng = StdRng::seed_from_u64(7);
        camera.update(DT, 0.0, &mut rng);

        let resolution = Vec2::new(1280.0, 720.0);
        let ray = camera.picking_ray(Vec2::ZERO, resolution);
        let to_target = (camera.target - camera.eye()).normalize();
        assert!(ray.dir.dot(to_target) > 0.99);
    }
}
