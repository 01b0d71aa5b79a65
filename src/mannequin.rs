//! Static figure the cloth can drape over.
//!
//! The model carries a node (by default `collisions`) whose children are
//! unit spheres placed and scaled over the body. Each child becomes a static
//! collider in the physics world; the rest of the model is only drawn.

use serde::Deserialize;
use three_d::{vec3, Context, CpuModel, InnerSpace, Mat4, Model, PhysicalMaterial, Vec3};

use crate::config::MannequinConfig;
use crate::error::DemoError;
use crate::log;
use crate::physics::{SphereHandle, World};
use crate::utils::fetch_bytes;

const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF"
const GLB_CHUNK_JSON: u32 = 0x4E4F_534A; // "JSON"

#[derive(Debug, Default, Deserialize)]
struct GltfDocument {
    #[serde(default)]
    nodes: Vec<GltfNode>,
}

#[derive(Debug, Default, Deserialize)]
struct GltfNode {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    children: Vec<usize>,
    translation: Option<[f32; 3]>,
    scale: Option<[f32; 3]>,
    /// Column-major local transform, used when TRS is absent.
    matrix: Option<[f32; 16]>,
}

impl GltfNode {
    fn local_position(&self) -> Vec3 {
        if let Some(t) = self.translation {
            return vec3(t[0], t[1], t[2]);
        }
        match self.matrix {
            Some(m) => vec3(m[12], m[13], m[14]),
            None => vec3(0.0, 0.0, 0.0),
        }
    }

    fn local_scale_x(&self) -> f32 {
        if let Some(s) = self.scale {
            return s[0];
        }
        match self.matrix {
            Some(m) => vec3(m[0], m[1], m[2]).magnitude(),
            None => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionSphere {
    pub center: Vec3,
    pub radius: f32,
}

/// Pulls the JSON chunk out of a binary glTF container.
fn glb_json(bytes: &[u8]) -> Result<&[u8], String> {
    let word = |offset: usize| -> Result<u32, String> {
        bytes
            .get(offset..offset.saturating_add(4))
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or_else(|| format!("truncated at byte {}", offset))
    };

    if word(0)? != GLB_MAGIC {
        return Err("not a binary glTF file".to_string());
    }
    let chunk_length = word(12)? as usize;
    if word(16)? != GLB_CHUNK_JSON {
        return Err("first chunk is not JSON".to_string());
    }
    20usize
        .checked_add(chunk_length)
        .and_then(|end| bytes.get(20..end))
        .ok_or_else(|| "truncated JSON chunk".to_string())
}

/// Collision spheres from the children of the node named `node_name`,
/// shifted by `offset` and grown by `padding`.
pub fn collision_spheres(
    path: &str,
    glb: &[u8],
    node_name: &str,
    offset: Vec3,
    padding: f32,
) -> Result<Vec<CollisionSphere>, DemoError> {
    let json = glb_json(glb).map_err(|e| DemoError::model(path, e))?;
    let document: GltfDocument = serde_json::from_slice(json).map_err(|e| DemoError::model(path, e))?;

    let parent = document
        .nodes
        .iter()
        .find(|n| n.name.as_deref() == Some(node_name))
        .ok_or_else(|| DemoError::MissingNode {
            path: path.to_string(),
            node: node_name.to_string(),
        })?;

    parent
        .children
        .iter()
        .map(|i| {
            let child = document
                .nodes
                .get(*i)
                .ok_or_else(|| DemoError::model(path, format!("child node {} out of range", i)))?;
            Ok(CollisionSphere {
                center: child.local_position() + offset,
                radius: child.local_scale_x() + padding,
            })
        })
        .collect()
}

pub struct Mannequin {
    model: Model<PhysicalMaterial>,
    spheres: Vec<SphereHandle>,
}

impl Mannequin {
    /// Fetches the model and registers its collision spheres with `world`.
    pub async fn load(context: &Context, world: &mut World, config: &MannequinConfig) -> Result<Self, DemoError> {
        let bytes = fetch_bytes(&config.url).await?;
        let offset = vec3(config.position[0], config.position[1], config.position[2]);

        let spheres = collision_spheres(&config.url, &bytes, &config.collision_node, offset, config.padding)?
            .into_iter()
            .map(|s| world.add_sphere(s.center, s.radius))
            .collect::<Vec<_>>();
        log!("Mannequin::load(): {} collision spheres", spheres.len());

        let mut raw = three_d_asset::io::RawAssets::new();
        raw.insert(&config.url, bytes);
        let cpu_model: CpuModel = raw
            .deserialize(&config.url)
            .map_err(|e| DemoError::model(&config.url, e))?;

        let mut model = Model::<PhysicalMaterial>::new(context, &cpu_model)
            .map_err(|e| DemoError::model(&config.url, e))?;
        for part in model.iter_mut() {
            let transformation = Mat4::from_translation(offset) * part.transformation();
            part.set_transformation(transformation);
        }

        Ok(Self { model, spheres })
    }

    pub fn model(&self) -> &Model<PhysicalMaterial> {
        &self.model
    }

    pub fn num_spheres(&self) -> usize {
        self.spheres.len()
    }
}
