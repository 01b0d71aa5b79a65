//! Particle world the cloth hangs in.
//!
//! Point masses are integrated with position-based dynamics: positions are
//! advanced from the implied velocity, then distance constraints and sphere
//! colliders are projected a fixed number of times per step. A particle with
//! zero mass is never moved by the solver; only [`World::set_particle_position`]
//! moves it.

use three_d::*;

use crate::config::PhysicsConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParticleHandle(usize);

impl ParticleHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SphereHandle(usize);

#[derive(Debug, Clone)]
struct Particle {
    position: Vec3,
    previous: Vec3,
    inv_mass: f32,
    linear_damping: f32,
}

impl Particle {
    fn is_static(&self) -> bool {
        self.inv_mass == 0.0
    }
}

/// Holds two particles at a fixed separation.
#[derive(Debug, Clone, Copy)]
pub struct DistanceConstraint {
    pub a: ParticleHandle,
    pub b: ParticleHandle,
    pub distance: f32,
}

/// Static or kinematic sphere. Particles are pushed out to its surface.
#[derive(Debug, Clone, Copy)]
pub struct SphereCollider {
    pub center: Vec3,
    pub radius: f32,
}

pub struct World {
    gravity: Vec3,
    iterations: usize,
    step: f32,
    max_substeps: usize,
    accumulator: f32,

    particles: Vec<Particle>,
    constraints: Vec<DistanceConstraint>,
    spheres: Vec<SphereCollider>,
}

impl World {
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            gravity: vec3(config.gravity[0], config.gravity[1], config.gravity[2]),
            iterations: config.iterations.max(1),
            step: config.step,
            max_substeps: config.max_substeps.max(1),
            accumulator: 0.0,
            particles: Vec::new(),
            constraints: Vec::new(),
            spheres: Vec::new(),
        }
    }

    /// Adds a point mass. A `mass` of 0 makes the particle immovable.
    pub fn add_particle(&mut self, position: Vec3, mass: f32, linear_damping: f32) -> ParticleHandle {
        let inv_mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
        self.particles.push(Particle {
            position,
            previous: position,
            inv_mass,
            linear_damping,
        });
        ParticleHandle(self.particles.len() - 1)
    }

    pub fn add_distance_constraint(&mut self, a: ParticleHandle, b: ParticleHandle, distance: f32) {
        self.constraints.push(DistanceConstraint { a, b, distance });
    }

    pub fn add_sphere(&mut self, center: Vec3, radius: f32) -> SphereHandle {
        self.spheres.push(SphereCollider { center, radius });
        SphereHandle(self.spheres.len() - 1)
    }

    pub fn particle_position(&self, handle: ParticleHandle) -> Vec3 {
        self.particles[handle.0].position
    }

    pub fn is_static(&self, handle: ParticleHandle) -> bool {
        self.particles[handle.0].is_static()
    }

    /// Teleports a particle. It keeps no velocity from the move.
    pub fn set_particle_position(&mut self, handle: ParticleHandle, position: Vec3) {
        let particle = &mut self.particles[handle.0];
        particle.position = position;
        particle.previous = position;
    }

    pub fn sphere(&self, handle: SphereHandle) -> SphereCollider {
        self.spheres[handle.0]
    }

    pub fn set_sphere_position(&mut self, handle: SphereHandle, center: Vec3) {
        self.spheres[handle.0].center = center;
    }

    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    pub fn constraints(&self) -> &[DistanceConstraint] {
        &self.constraints
    }

    /// Advances the world by `dt` seconds in fixed steps and returns how
    /// many steps ran. Time beyond `max_substeps` steps is dropped.
    pub fn step(&mut self, dt: f32) -> usize {
        self.accumulator += dt.max(0.0);
        let mut substeps = 0;
        while self.accumulator >= self.step && substeps < self.max_substeps {
            self.step_fixed();
            self.accumulator -= self.step;
            substeps += 1;
        }
        if substeps == self.max_substeps {
            self.accumulator = self.accumulator.min(self.step);
        }
        substeps
    }

    /// Runs exactly one fixed step.
    pub fn step_fixed(&mut self) {
        let h = self.step;
        self.integrate(h);
        for _ in 0..self.iterations {
            self.solve_constraints();
            self.solve_spheres();
        }
    }

    fn integrate(&mut self, h: f32) {
        let gravity = self.gravity;
        for particle in self.particles.iter_mut().filter(|p| !p.is_static()) {
            let mut velocity = (particle.position - particle.previous) / h;
            velocity *= (1.0 - particle.linear_damping).powf(h);
            velocity += gravity * h;
            particle.previous = particle.position;
            particle.position += velocity * h;
        }
    }

    fn solve_constraints(&mut self) {
        for constraint in &self.constraints {
            let (a, b) = (constraint.a.0, constraint.b.0);
            let wa = self.particles[a].inv_mass;
            let wb = self.particles[b].inv_mass;
            let w = wa + wb;
            if w == 0.0 {
                continue;
            }

            let delta = self.particles[b].position - self.particles[a].position;
            let length = delta.magnitude();
            if length < f32::EPSILON {
                continue;
            }
            let correction = delta * ((length - constraint.distance) / (length * w));

            self.particles[a].position += correction * wa;
            self.particles[b].position -= correction * wb;
        }
    }

    fn solve_spheres(&mut self) {
        for sphere in &self.spheres {
            for particle in self.particles.iter_mut().filter(|p| !p.is_static()) {
                let offset = particle.position - sphere.center;
                let distance = offset.magnitude();
                if distance >= sphere.radius {
                    continue;
                }
                let normal = if distance < f32::EPSILON {
                    vec3(0.0, 1.0, 0.0)
                } else {
                    offset / distance
                };
                particle.position = sphere.center + normal * sphere.radius;
            }
        }
    }
}
