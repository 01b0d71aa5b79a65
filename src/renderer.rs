use three_d::*;

use crate::config::SceneConfig;
use crate::error::DemoError;
use crate::log;
use crate::mannequin::Mannequin;
use crate::pointer;
use crate::scene::Scene;
use crate::stitch_overlay::StitchOverlay;

fn srgba(rgb: [u8; 3]) -> Srgba {
    Srgba::new(rgb[0], rgb[1], rgb[2], 255)
}

fn double_sided(context: &Context, rgb: [u8; 3]) -> PhysicalMaterial {
    let mut material = PhysicalMaterial::new_opaque(
        context,
        &CpuMaterial {
            albedo: srgba(rgb),
            ..Default::default()
        },
    );
    material.render_states.cull = Cull::None;
    material
}

pub async fn main(config: SceneConfig) -> Result<(), DemoError> {
    let window = Window::new(WindowSettings {
        title: "Drape".to_string(),
        #[cfg(not(target_arch = "wasm32"))]
        max_size: Some((1280, 720)),
        ..Default::default()
    })
    .map_err(|e| DemoError::Gl(e.to_string()))?;
    let context = window.gl();

    let mut camera = Camera::new_perspective(
        window.viewport(),
        vec3(0.0, 0.0, 5.0),
        vec3(0.0, 0.0, 0.0),
        vec3(0.0, 1.0, 0.0),
        degrees(75.0),
        0.1,
        1000.0,
    );
    let mut control = OrbitControl::new(*camera.target(), 1.0, 100.0);

    let light = DirectionalLight::new(&context, 1.0, Srgba::WHITE, &vec3(-1.0, -1.0, -1.0));
    let ambient = AmbientLight::new(&context, 0.3, Srgba::WHITE);

    let mut scene = Scene::new(config);

    if scene.config.mannequin.enabled {
        match Mannequin::load(&context, &mut scene.world, &scene.config.mannequin).await {
            Ok(mannequin) => {
                log!(
                    "renderer::main(): mannequin loaded, {} collision spheres",
                    mannequin.num_spheres()
                );
                scene.mannequin = Some(mannequin);
            }
            Err(e) => log!("renderer::main(): WARNING: mannequin not loaded: {}", e),
        }
    }

    let mut cloth_gm = Gm::new(
        Mesh::new(&context, &scene.cloth.cpu_mesh()),
        double_sided(&context, scene.config.cloth.color),
    );
    let mut ball_gm = Gm::new(
        Mesh::new(&context, &CpuMesh::sphere(32)),
        PhysicalMaterial::new_opaque(
            &context,
            &CpuMaterial {
                albedo: srgba(scene.config.ball.color),
                ..Default::default()
            },
        ),
    );

    let mut overlay = if scene.config.debug.stitches {
        let mut overlay = StitchOverlay::new();
        overlay.init(&context)?;
        Some(overlay)
    } else {
        None
    };

    #[cfg(target_arch = "wasm32")]
    let mut pointer_listener = if scene.config.debug.orbit_camera {
        None
    } else {
        Some(pointer::PointerListener::attach()?)
    };

    log!("renderer::main(): starting render loop");
    window.render_loop(move |mut frame_input| {
        camera.set_viewport(frame_input.viewport);

        if scene.config.debug.orbit_camera {
            control.handle_events(&mut camera, &mut frame_input.events);
        } else {
            #[cfg(target_arch = "wasm32")]
            let sample = pointer_listener.as_mut().and_then(|l| l.latest());
            #[cfg(not(target_arch = "wasm32"))]
            let sample = pointer::latest_from_events(&frame_input.events, frame_input.viewport);

            if let Some(sample) = sample {
                scene.apply_pointer(sample);
            }
        }

        scene.update(frame_input.accumulated_time, frame_input.elapsed_time);

        cloth_gm.geometry = Mesh::new(&context, &scene.cloth.cpu_mesh());
        ball_gm.set_transformation(scene.ball_transformation());

        let mannequin = scene.mannequin.as_ref().map(|m| m.model());
        frame_input
            .screen()
            .clear(ClearState::color_and_depth(0.9, 0.9, 0.9, 1.0, 1.0))
            .render(
                &camera,
                cloth_gm
                    .into_iter()
                    .chain(&ball_gm)
                    .chain(mannequin.into_iter().flatten()),
                &[&light, &ambient],
            );

        if let Some(overlay) = overlay.as_mut() {
            overlay.render(&context, &camera, &scene.cloth);
        }

        FrameOutput::default()
    });

    Ok(())
}
