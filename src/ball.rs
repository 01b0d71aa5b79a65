use three_d::*;

use crate::config::BallConfig;
use crate::physics::{SphereHandle, World};

/// Kinematic sphere on a fixed orbit. The solver never moves it; it only
/// pushes cloth particles out of its way.
pub struct Ball {
    config: BallConfig,
    sphere: SphereHandle,
}

impl Ball {
    pub fn new(world: &mut World, config: &BallConfig) -> Self {
        let sphere = world.add_sphere(position_at(config, 0.0), config.radius);
        Self {
            config: config.clone(),
            sphere,
        }
    }

    /// Moves the collider to where the orbit puts it at `time_ms`.
    pub fn update(&self, world: &mut World, time_ms: f64) -> Vec3 {
        let position = position_at(&self.config, time_ms);
        world.set_sphere_position(self.sphere, position);
        position
    }

    pub fn position(&self, world: &World) -> Vec3 {
        world.sphere(self.sphere).center
    }

    /// Model matrix of the rendered sphere.
    pub fn transformation(&self, world: &World) -> Mat4 {
        Mat4::from_translation(self.position(world))
            * Mat4::from_scale(self.config.radius * self.config.visual_scale)
    }
}

/// `(0, sin(t / period) * ay, -1 + cos(t / period) * az)` around the
/// configured center.
pub fn position_at(config: &BallConfig, time_ms: f64) -> Vec3 {
    let phase = time_ms / config.period;
    vec3(
        config.center[0],
        config.center[1] + phase.sin() as f32 * config.amplitude_y,
        config.center[2] + phase.cos() as f32 * config.amplitude_z,
    )
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).magnitude() < 1e-5
    }

    #[test]
    fn orbit_starts_in_front_of_center() {
        let config = BallConfig::default();
        assert!(close(position_at(&config, 0.0), vec3(0.0, 0.0, 0.0)));
    }

    #[test]
    fn orbit_quarter_turn() {
        let config = BallConfig::default();
        let t = std::f64::consts::FRAC_PI_2 * config.period;
        assert!(close(position_at(&config, t), vec3(0.0, 0.5, -1.0)));
    }

    #[test]
    fn orbit_is_periodic() {
        let config = BallConfig::default();
        let full = 2.0 * std::f64::consts::PI * config.period;
        assert!(close(position_at(&config, 1234.0), position_at(&config, 1234.0 + full)));
    }

    #[test]
    fn update_moves_the_collider() {
        let config = BallConfig::default();
        let mut world = World::new(&PhysicsConfig::default());
        let ball = Ball::new(&mut world, &config);

        let p = ball.update(&mut world, 800.0);

        assert_eq!(ball.position(&world), p);
        assert!(close(p, vec3(0.0, 2.0f64.sin() as f32 * 0.5, -1.0 + 2.0f64.cos() as f32)));
    }
}
