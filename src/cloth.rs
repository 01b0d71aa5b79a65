use three_d::*;

use crate::config::ClothConfig;
use crate::log;
use crate::physics::{ParticleHandle, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StitchKind {
    /// (r, c) to (r, c + 1)
    Right,
    /// (r, c) to (r + 1, c)
    Down,
    /// (r, c) to (r + 1, c + 1)
    ShearDown,
    /// (r, c) to (r - 1, c + 1)
    ShearUp,
    /// (r, c) to (r, c + 2)
    FlexRight,
    /// (r, c) to (r + 2, c)
    FlexDown,
}

/// A distance constraint between two grid cells, as `(row, col)` pairs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stitch {
    pub from: (usize, usize),
    pub to: (usize, usize),
    pub kind: StitchKind,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spacing {
    pub x: f32,
    pub y: f32,
    pub diagonal: f32,
}

impl Spacing {
    pub fn new(width: f32, height: f32, cols: usize, rows: usize) -> Self {
        let x = width / cols as f32;
        let y = height / rows as f32;
        Self {
            x,
            y,
            diagonal: (x * x + y * y).sqrt(),
        }
    }
}

/// Edge particles of the first row are anchored: two columns on each side.
pub fn is_pinned(row: usize, col: usize, cols: usize) -> bool {
    row == 0 && (col < 2 || col + 3 > cols)
}

/// Stitches for a `rows` x `cols` grid, in row-major order of their first
/// cell.
pub fn stitch_topology(rows: usize, cols: usize, spacing: &Spacing, flex: bool) -> Vec<Stitch> {
    let mut stitches = Vec::new();
    let mut push = |from, to, kind, distance| {
        stitches.push(Stitch {
            from,
            to,
            kind,
            distance,
        })
    };

    for r in 0..rows {
        for c in 0..cols {
            if c + 1 < cols {
                push((r, c), (r, c + 1), StitchKind::Right, spacing.x);
            }
            if r + 1 < rows {
                push((r, c), (r + 1, c), StitchKind::Down, spacing.y);
            }
            if r + 1 < rows && c + 1 < cols {
                push((r, c), (r + 1, c + 1), StitchKind::ShearDown, spacing.diagonal);
            }
            if r > 0 && c + 1 < cols {
                push((r, c), (r - 1, c + 1), StitchKind::ShearUp, spacing.diagonal);
            }
            if flex {
                if c + 2 < cols {
                    push((r, c), (r, c + 2), StitchKind::FlexRight, spacing.x * 2.0);
                }
                if r + 2 < rows {
                    push((r, c), (r + 2, c), StitchKind::FlexDown, spacing.y * 2.0);
                }
            }
        }
    }

    stitches
}

/// Triangles of a plane with `cols` x `rows` vertices, laid out row-major.
pub fn plane_indices(rows: usize, cols: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity(rows.saturating_sub(1) * cols.saturating_sub(1) * 6);
    for iy in 0..rows.saturating_sub(1) {
        for ix in 0..cols.saturating_sub(1) {
            let a = (ix + cols * iy) as u32;
            let b = (ix + cols * (iy + 1)) as u32;
            let c = (ix + 1 + cols * (iy + 1)) as u32;
            let d = (ix + 1 + cols * iy) as u32;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    indices
}

/// A grid of particles in the physics world plus the mesh that mirrors them.
///
/// Topology is fixed at construction. The vertex buffer is a projection of
/// particle positions and is rewritten by [`Cloth::sync_vertices`].
pub struct Cloth {
    rows: usize,
    cols: usize,
    spacing: Spacing,
    particles: Vec<ParticleHandle>,
    stitches: Vec<Stitch>,
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
}

impl Cloth {
    pub fn new(world: &mut World, config: &ClothConfig) -> Self {
        let rows = config.resolution_y;
        let cols = config.resolution_x;
        let spacing = Spacing::new(config.width, config.height, cols, rows);
        let mass = config.particle_mass();

        let mut particles = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                let position = vec3(
                    c as f32 * config.width / cols as f32,
                    r as f32 * -config.height / rows as f32 + config.top,
                    0.0,
                );
                let mass = if is_pinned(r, c, cols) { 0.0 } else { mass };
                particles.push(world.add_particle(position, mass, config.linear_damping));
            }
        }

        let stitches = stitch_topology(rows, cols, &spacing, config.flex_stitches);
        for stitch in &stitches {
            let a = particles[stitch.from.0 * cols + stitch.from.1];
            let b = particles[stitch.to.0 * cols + stitch.to.1];
            world.add_distance_constraint(a, b, stitch.distance);
        }
        log!(
            "Cloth::new(): {}x{} particles, {} stitches",
            rows,
            cols,
            stitches.len()
        );

        let vertices = particles.iter().map(|p| world.particle_position(*p)).collect();

        Self {
            rows,
            cols,
            spacing,
            particles,
            stitches,
            vertices,
            indices: plane_indices(rows, cols),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn spacing(&self) -> Spacing {
        self.spacing
    }

    pub fn stitches(&self) -> &[Stitch] {
        &self.stitches
    }

    pub fn particle(&self, row: usize, col: usize) -> ParticleHandle {
        self.particles[row * self.cols + col]
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Where each pinned particle goes when the first row is anchored at
    /// `(x, y, z)`, as `(col, position)`.
    pub fn pin_targets(&self, x: f32, y: f32, z: f32) -> Vec<(usize, Vec3)> {
        let left = -self.spacing.x * self.cols as f32 / 2.0;
        (0..self.cols)
            .filter(|c| is_pinned(0, *c, self.cols))
            .map(|c| (c, vec3(left + x + self.spacing.x * c as f32, y, z)))
            .collect()
    }

    pub fn set_position(&self, world: &mut World, x: f32, y: f32, z: f32) {
        for (c, target) in self.pin_targets(x, y, z) {
            world.set_particle_position(self.particle(0, c), target);
        }
    }

    /// Copies every particle's simulated position into its vertex.
    pub fn sync_vertices(&mut self, world: &World) {
        for (vi, v) in self.vertices.iter_mut().enumerate() {
            let x = vi % self.cols;
            let y = vi / self.cols;
            *v = world.particle_position(self.particles[y * self.cols + x]);
        }
    }

    /// Current vertices as a plane mesh with freshly computed normals.
    pub fn cpu_mesh(&self) -> CpuMesh {
        let mut mesh = CpuMesh {
            positions: Positions::F32(self.vertices.clone()),
            indices: Indices::U32(self.indices.clone()),
            ..Default::default()
        };
        mesh.compute_normals();
        mesh
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;

    fn stock_cloth() -> (World, Cloth) {
        let mut world = World::new(&PhysicsConfig::default());
        let cloth = Cloth::new(&mut world, &ClothConfig::default());
        (world, cloth)
    }

    fn count(stitches: &[Stitch], kind: StitchKind) -> usize {
        stitches.iter().filter(|s| s.kind == kind).count()
    }

    #[test]
    fn sixteen_square_grid_has_930_stitches() {
        let spacing = Spacing::new(4.0, 4.0, 16, 16);
        let stitches = stitch_topology(16, 16, &spacing, false);

        assert_eq!(count(&stitches, StitchKind::Right), 240);
        assert_eq!(count(&stitches, StitchKind::Down), 240);
        assert_eq!(count(&stitches, StitchKind::ShearDown), 225);
        assert_eq!(count(&stitches, StitchKind::ShearUp), 225);
        assert_eq!(stitches.len(), 930);
    }

    #[test]
    fn stitch_count_follows_grid_shape() {
        for (rows, cols) in [(2, 4), (3, 7), (10, 5), (16, 16)] {
            let spacing = Spacing::new(1.0, 1.0, cols, rows);
            let stitches = stitch_topology(rows, cols, &spacing, false);
            let expected = 2 * rows * cols - rows - cols + 2 * (rows - 1) * (cols - 1);
            assert_eq!(stitches.len(), expected, "{}x{}", rows, cols);
        }
    }

    #[test]
    fn flex_stitches_skip_one_particle() {
        let spacing = Spacing::new(4.0, 4.0, 16, 16);
        let stitches = stitch_topology(16, 16, &spacing, true);

        assert_eq!(count(&stitches, StitchKind::FlexRight), 14 * 16);
        assert_eq!(count(&stitches, StitchKind::FlexDown), 14 * 16);
        let flex = stitches
            .iter()
            .find(|s| s.kind == StitchKind::FlexRight)
            .unwrap();
        assert_eq!(flex.distance, spacing.x * 2.0);
    }

    #[test]
    fn stitch_distances_match_spacing() {
        let spacing = Spacing::new(4.0, 2.0, 8, 4);
        assert_eq!(spacing.x, 0.5);
        assert_eq!(spacing.y, 0.5);

        for stitch in stitch_topology(4, 8, &spacing, false) {
            let expected = match stitch.kind {
                StitchKind::Right => spacing.x,
                StitchKind::Down => spacing.y,
                _ => spacing.diagonal,
            };
            assert_eq!(stitch.distance, expected);
        }
    }

    #[test]
    fn stitch_partners_stay_inside_grid() {
        let spacing = Spacing::new(1.0, 1.0, 5, 3);
        for stitch in stitch_topology(3, 5, &spacing, true) {
            assert!(stitch.to.0 < 3 && stitch.to.1 < 5, "{:?}", stitch);
            assert_ne!(stitch.from, stitch.to);
        }
    }

    #[test]
    fn each_stitch_kind_reaches_its_neighbor() {
        let spacing = Spacing::new(1.0, 1.0, 6, 5);
        let from_interior: Vec<_> = stitch_topology(5, 6, &spacing, true)
            .into_iter()
            .filter(|s| s.from == (2, 3))
            .map(|s| (s.kind, s.to))
            .collect();

        let expected = [
            (StitchKind::Right, (2, 4)),
            (StitchKind::Down, (3, 3)),
            (StitchKind::ShearDown, (3, 4)),
            (StitchKind::ShearUp, (1, 4)),
            (StitchKind::FlexRight, (2, 5)),
            (StitchKind::FlexDown, (4, 3)),
        ];
        assert_eq!(from_interior.len(), expected.len());
        for pair in expected {
            assert!(from_interior.contains(&pair), "missing {:?}", pair);
        }
    }

    #[test]
    fn only_first_row_edges_are_pinned() {
        let pinned: Vec<usize> = (0..16).filter(|c| is_pinned(0, *c, 16)).collect();
        assert_eq!(pinned, vec![0, 1, 14, 15]);
        assert!((0..16).all(|c| !is_pinned(1, c, 16)));
    }

    #[test]
    fn new_cloth_places_particles_and_masses() {
        let (world, cloth) = stock_cloth();

        assert_eq!(world.num_particles(), 256);
        assert_eq!(world.constraints().len(), 930);
        assert_eq!(cloth.vertices().len(), 256);

        assert_eq!(world.particle_position(cloth.particle(0, 0)), vec3(0.0, 2.0, 0.0));
        assert_eq!(world.particle_position(cloth.particle(4, 2)), vec3(0.5, 1.0, 0.0));

        assert!(world.is_static(cloth.particle(0, 1)));
        assert!(world.is_static(cloth.particle(0, 14)));
        assert!(!world.is_static(cloth.particle(0, 2)));
        assert!(!world.is_static(cloth.particle(1, 0)));
    }

    #[test]
    fn pin_targets_center_the_row_on_the_pointer() {
        let (_, cloth) = stock_cloth();
        let targets = cloth.pin_targets(1.0, 0.5, 0.0);

        let cols: Vec<usize> = targets.iter().map(|(c, _)| *c).collect();
        assert_eq!(cols, vec![0, 1, 14, 15]);
        assert_eq!(targets[0].1, vec3(-1.0, 0.5, 0.0));
        assert_eq!(targets[1].1, vec3(-0.75, 0.5, 0.0));
        assert_eq!(targets[3].1, vec3(2.75, 0.5, 0.0));
    }

    #[test]
    fn set_position_moves_only_pinned_particles() {
        let (mut world, cloth) = stock_cloth();
        let free_before = world.particle_position(cloth.particle(0, 5));

        cloth.set_position(&mut world, 0.0, 3.0, 1.0);

        assert_eq!(world.particle_position(cloth.particle(0, 0)), vec3(-2.0, 3.0, 1.0));
        assert_eq!(world.particle_position(cloth.particle(0, 15)), vec3(1.75, 3.0, 1.0));
        assert_eq!(world.particle_position(cloth.particle(0, 5)), free_before);
    }

    #[test]
    fn sync_copies_particles_into_row_major_vertices() {
        let (mut world, mut cloth) = stock_cloth();
        world.set_particle_position(cloth.particle(3, 7), vec3(9.0, 8.0, 7.0));

        cloth.sync_vertices(&world);

        assert_eq!(cloth.vertices()[3 * 16 + 7], vec3(9.0, 8.0, 7.0));
        for (vi, v) in cloth.vertices().iter().enumerate() {
            let handle = cloth.particle(vi / 16, vi % 16);
            assert_eq!(*v, world.particle_position(handle));
        }
    }

    #[test]
    fn sync_tracks_the_simulation() {
        let (mut world, mut cloth) = stock_cloth();
        for _ in 0..30 {
            world.step_fixed();
        }

        cloth.sync_vertices(&world);

        // pinned corner holds, nothing rises above its start
        assert_eq!(cloth.vertices()[0], vec3(0.0, 2.0, 0.0));
        let bottom = cloth.vertices()[15 * 16 + 8];
        assert!(bottom.y <= 2.0 - 15.0 * 0.25 + 1e-4);
        for (vi, v) in cloth.vertices().iter().enumerate() {
            assert_eq!(*v, world.particle_position(cloth.particle(vi / 16, vi % 16)));
        }
    }

    #[test]
    fn plane_mesh_covers_every_quad() {
        let indices = plane_indices(3, 4);
        assert_eq!(indices.len(), 2 * 3 * 6);
        assert_eq!(&indices[..6], &[0, 4, 1, 4, 5, 1]);
        assert!(indices.iter().all(|i| *i < 12));
    }

    #[test]
    fn cpu_mesh_has_normals_per_vertex() {
        let (_, cloth) = stock_cloth();
        let mesh = cloth.cpu_mesh();

        assert_eq!(mesh.positions.len(), 256);
        let normals = mesh.normals.unwrap();
        assert_eq!(normals.len(), 256);
        // flat starting plane faces along z
        assert!((normals[17].z.abs() - 1.0).abs() < 1e-4);
    }
}
