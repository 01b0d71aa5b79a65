use three_d::*;

use crate::cloth::Cloth;
use crate::error::DemoError;
use crate::log;

/// Debug view of the cloth: a small sphere per particle and a line per
/// stitch, drawn with raw GL on top of the rendered scene.
pub struct StitchOverlay {
    program: Option<context::Program>,
    u_projection: Option<context::UniformLocation>,
    u_view: Option<context::UniformLocation>,
    u_model: Option<context::UniformLocation>,
    u_color: Option<context::UniformLocation>,
    a_position: u32,

    // For particles (spheres)
    sphere_vertices: Option<context::Buffer>,
    sphere_indices: Option<context::Buffer>,
    num_sphere_indices: usize,

    // For stitches (lines)
    line_vertices: Option<context::Buffer>,
    line_data: Vec<f32>,

    pub particle_radius: f32,
}

impl StitchOverlay {
    const VERT_SHADER: &'static str = r#"#version 300 es
        precision highp float;

        in vec3 position;

        uniform mat4 projection;
        uniform mat4 view;
        uniform mat4 model;

        void main() {
            gl_Position = projection * view * model * vec4(position, 1.0);
        }
    "#;

    const FRAG_SHADER: &'static str = r#"#version 300 es
        precision highp float;

        uniform vec4 color;
        out vec4 fragColor;

        void main() {
            fragColor = color;
        }
    "#;

    const PARTICLE_COLOR: [f32; 4] = [1.0, 1.0, 0.0, 1.0];
    const STITCH_COLOR: [f32; 4] = [0.0, 1.0, 0.0, 1.0];

    pub fn new() -> Self {
        Self {
            program: None,
            u_projection: None,
            u_view: None,
            u_model: None,
            u_color: None,
            a_position: 0,
            sphere_vertices: None,
            sphere_indices: None,
            num_sphere_indices: 0,
            line_vertices: None,
            line_data: Vec::new(),
            particle_radius: 0.03,
        }
    }

    pub fn init(&mut self, gl: &Context) -> Result<(), DemoError> {
        let program_id = create_glsl_program(gl, Self::VERT_SHADER, Self::FRAG_SHADER)?;
        self.program = Some(program_id);

        unsafe {
            gl.use_program(self.program);
            {
                self.u_projection = gl.get_uniform_location(program_id, "projection");
                self.u_view = gl.get_uniform_location(program_id, "view");
                self.u_model = gl.get_uniform_location(program_id, "model");
                self.u_color = gl.get_uniform_location(program_id, "color");
                self.a_position = gl
                    .get_attrib_location(program_id, "position")
                    .ok_or_else(|| DemoError::Gl("missing attribute: position".to_string()))?;

                let (vertices, indices) = generate_sphere(8, 8);
                self.num_sphere_indices = indices.len();
                self.sphere_vertices = Some(gl.create_buffer().map_err(DemoError::Gl)?);
                gl.bind_buffer(context::ARRAY_BUFFER, self.sphere_vertices);
                gl.buffer_data_u8_slice(
                    context::ARRAY_BUFFER,
                    transmute_slice::<_, u8>(&vertices),
                    context::STATIC_DRAW,
                );

                self.sphere_indices = Some(gl.create_buffer().map_err(DemoError::Gl)?);
                gl.bind_buffer(context::ELEMENT_ARRAY_BUFFER, self.sphere_indices);
                gl.buffer_data_u8_slice(
                    context::ELEMENT_ARRAY_BUFFER,
                    transmute_slice::<_, u8>(&indices),
                    context::STATIC_DRAW,
                );

                self.line_vertices = Some(gl.create_buffer().map_err(DemoError::Gl)?);

                gl.bind_buffer(context::ARRAY_BUFFER, None);
                gl.bind_buffer(context::ELEMENT_ARRAY_BUFFER, None);
            }
            gl.use_program(None);
        }
        log!("StitchOverlay::init(): ready");

        Ok(())
    }

    pub fn render(&mut self, gl: &Context, camera: &Camera, cloth: &Cloth) {
        if self.program.is_none() {
            return;
        }
        let projection = *camera.projection();
        let view = *camera.view();
        let projection: &[f32; 16] = projection.as_ref();
        let view: &[f32; 16] = view.as_ref();

        fill_line_data(cloth, &mut self.line_data);

        unsafe {
            gl.use_program(self.program);
            {
                gl.uniform_matrix_4_f32_slice(self.u_projection.as_ref(), false, projection);
                gl.uniform_matrix_4_f32_slice(self.u_view.as_ref(), false, view);
                gl.enable_vertex_attrib_array(self.a_position);

                // Stitches, already in world space
                let identity = Mat4::identity();
                let identity: &[f32; 16] = identity.as_ref();
                gl.uniform_matrix_4_f32_slice(self.u_model.as_ref(), false, identity);
                let [r, g, b, a] = Self::STITCH_COLOR;
                gl.uniform_4_f32(self.u_color.as_ref(), r, g, b, a);
                gl.bind_buffer(context::ARRAY_BUFFER, self.line_vertices);
                gl.buffer_data_u8_slice(
                    context::ARRAY_BUFFER,
                    transmute_slice::<_, u8>(&self.line_data),
                    context::DYNAMIC_DRAW,
                );
                gl.vertex_attrib_pointer_f32(self.a_position, 3, context::FLOAT, false, 0, 0);
                gl.draw_arrays(context::LINES, 0, (self.line_data.len() / 3) as i32);

                // Particles
                let [r, g, b, a] = Self::PARTICLE_COLOR;
                gl.uniform_4_f32(self.u_color.as_ref(), r, g, b, a);
                gl.bind_buffer(context::ARRAY_BUFFER, self.sphere_vertices);
                gl.bind_buffer(context::ELEMENT_ARRAY_BUFFER, self.sphere_indices);
                gl.vertex_attrib_pointer_f32(self.a_position, 3, context::FLOAT, false, 0, 0);
                for v in cloth.vertices() {
                    let model = Mat4::from_translation(*v) * Mat4::from_scale(self.particle_radius);
                    let model: &[f32; 16] = model.as_ref();
                    gl.uniform_matrix_4_f32_slice(self.u_model.as_ref(), false, model);
                    gl.draw_elements(
                        context::TRIANGLES,
                        self.num_sphere_indices as i32,
                        context::UNSIGNED_INT,
                        0,
                    );
                }

                // three-d sets up its own attributes per draw
                gl.disable_vertex_attrib_array(self.a_position);
                gl.bind_buffer(context::ARRAY_BUFFER, None);
                gl.bind_buffer(context::ELEMENT_ARRAY_BUFFER, None);
            }
            gl.use_program(None);
        }
    }
}

/// Two endpoints per stitch, flattened to xyz triples.
fn fill_line_data(cloth: &Cloth, data: &mut Vec<f32>) {
    data.clear();
    let cols = cloth.cols();
    let vertices = cloth.vertices();
    for stitch in cloth.stitches() {
        let a = vertices[stitch.from.0 * cols + stitch.from.1];
        let b = vertices[stitch.to.0 * cols + stitch.to.1];
        data.extend_from_slice(&[a.x, a.y, a.z, b.x, b.y, b.z]);
    }
}

fn generate_sphere(lat_segments: usize, long_segments: usize) -> (Vec<f32>, Vec<u32>) {
    let mut vertices = Vec::with_capacity((lat_segments + 1) * (long_segments + 1) * 3);
    let mut indices = Vec::with_capacity(lat_segments * long_segments * 6);

    for lat in 0..=lat_segments {
        let theta = lat as f32 * std::f32::consts::PI / lat_segments as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for long in 0..=long_segments {
            let phi = long as f32 * 2.0 * std::f32::consts::PI / long_segments as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();
            vertices.extend_from_slice(&[sin_theta * cos_phi, cos_theta, sin_theta * sin_phi]);
        }
    }

    for lat in 0..lat_segments {
        for long in 0..long_segments {
            let first = (lat * (long_segments + 1) + long) as u32;
            let second = first + 1;
            let third = ((lat + 1) * (long_segments + 1) + long) as u32;
            let fourth = third + 1;

            indices.extend_from_slice(&[first, second, third]);
            indices.extend_from_slice(&[second, fourth, third]);
        }
    }

    (vertices, indices)
}

fn create_glsl_program(gl: &Context, vs_source: &str, fs_source: &str) -> Result<context::Program, DemoError> {
    unsafe {
        let vert_shader = gl.create_shader(context::VERTEX_SHADER).map_err(DemoError::Gl)?;
        let frag_shader = gl.create_shader(context::FRAGMENT_SHADER).map_err(DemoError::Gl)?;

        gl.shader_source(vert_shader, vs_source);
        gl.shader_source(frag_shader, fs_source);
        gl.compile_shader(vert_shader);
        gl.compile_shader(frag_shader);

        let id = gl.create_program().map_err(DemoError::Gl)?;

        gl.attach_shader(id, vert_shader);
        gl.attach_shader(id, frag_shader);
        gl.link_program(id);

        if !gl.get_program_link_status(id) {
            let log = [
                gl.get_shader_info_log(vert_shader),
                gl.get_shader_info_log(frag_shader),
                gl.get_program_info_log(id),
            ]
            .into_iter()
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
            return Err(DemoError::Gl(format!("gl.get_program_link_status(): {}", log)));
        }

        gl.detach_shader(id, vert_shader);
        gl.detach_shader(id, frag_shader);
        gl.delete_shader(vert_shader);
        gl.delete_shader(frag_shader);

        Ok(id)
    }
}

fn transmute_slice<T, U>(slice: &[T]) -> &[U] {
    unsafe {
        std::slice::from_raw_parts(
            slice.as_ptr() as *const U,
            slice.len() * std::mem::size_of::<T>() / std::mem::size_of::<U>(),
        )
    }
}
