use three_d::*;

use crate::ball::Ball;
use crate::cloth::Cloth;
use crate::config::SceneConfig;
use crate::mannequin::Mannequin;
use crate::physics::World;
use crate::pointer::PointerSample;

/// Simulation side of the demo: the physics world and the bodies in it.
/// Rendering reads from it, never the other way round.
pub struct Scene {
    pub config: SceneConfig,
    pub world: World,
    pub cloth: Cloth,
    pub ball: Ball,
    pub mannequin: Option<Mannequin>,
}

impl Scene {
    pub fn new(config: SceneConfig) -> Self {
        let mut world = World::new(&config.physics);
        let cloth = Cloth::new(&mut world, &config.cloth);
        let ball = Ball::new(&mut world, &config.ball);

        Self {
            config,
            world,
            cloth,
            ball,
            mannequin: None,
        }
    }

    /// Anchors the cloth's pinned row under the pointer.
    pub fn apply_pointer(&mut self, sample: PointerSample) {
        let target = sample.target(self.config.pointer.scale);
        self.cloth
            .set_position(&mut self.world, target.x, target.y, target.z);
    }

    /// One rendered frame: move the ball, step physics, mirror the cloth.
    /// Returns the number of physics steps taken.
    pub fn update(&mut self, accumulated_time_ms: f64, elapsed_time_ms: f64) -> usize {
        self.ball.update(&mut self.world, accumulated_time_ms);
        let steps = self.world.step((elapsed_time_ms / 1000.0) as f32);
        self.cloth.sync_vertices(&self.world);
        steps
    }

    pub fn ball_transformation(&self) -> Mat4 {
        self.ball.transformation(&self.world)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_scene_builds_cloth_and_ball() {
        let scene = Scene::new(SceneConfig::default());

        assert_eq!(scene.world.num_particles(), 256);
        assert_eq!(scene.cloth.stitches().len(), 930);
        assert!(scene.mannequin.is_none());
    }

    #[test]
    fn pointer_moves_the_pinned_row() {
        let mut scene = Scene::new(SceneConfig::default());

        scene.apply_pointer(PointerSample { x: 0.5, y: -0.25 });

        let corner = scene.world.particle_position(scene.cloth.particle(0, 0));
        assert_eq!(corner, vec3(1.0, -1.5, 0.0));
    }

    #[test]
    fn update_steps_and_syncs() {
        let mut scene = Scene::new(SceneConfig::default());
        let frame_ms = 1000.0 / 60.0;

        let mut steps = 0;
        let mut time = 0.0;
        for _ in 0..10 {
            time += frame_ms;
            steps += scene.update(time, frame_ms);
        }

        assert!(steps >= 9);
        let ball = scene.ball.position(&scene.world);
        assert_eq!(ball, crate::ball::position_at(&scene.config.ball, time));
        for (vi, v) in scene.cloth.vertices().iter().enumerate() {
            let handle = scene.cloth.particle(vi / 16, vi % 16);
            assert_eq!(*v, scene.world.particle_position(handle));
        }
    }

    #[test]
    fn cloth_stays_clear_of_the_ball() {
        let mut scene = Scene::new(SceneConfig::default());
        let frame_ms = 1000.0 / 60.0;

        let mut time = 0.0;
        for _ in 0..120 {
            time += frame_ms;
            scene.update(time, frame_ms);
        }

        let ball = scene.ball.position(&scene.world);
        let radius = scene.config.ball.radius;
        for v in scene.cloth.vertices() {
            // constraints run after the last collision pass, allow some give
            assert!((*v - ball).magnitude() > radius * 0.8, "{:?} inside ball at {:?}", v, ball);
        }
    }
}
