use serde::{Deserialize, Serialize};

use crate::error::DemoError;

/// Upper bound on cloth particles. Keeps mesh indices well inside `u32`.
pub const MAX_PARTICLES: usize = 256 * 256;

/// Everything the demo scene can be tuned with. Defaults reproduce the
/// stock scene: a 4x4 cloth of 16x16 particles over a bouncing ball.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub cloth: ClothConfig,
    pub ball: BallConfig,
    pub physics: PhysicsConfig,
    pub pointer: PointerConfig,
    pub mannequin: MannequinConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClothConfig {
    pub width: f32,
    pub height: f32,
    pub resolution_x: usize,
    pub resolution_y: usize,
    /// Vertical offset of the first row.
    pub top: f32,
    pub linear_damping: f32,
    /// Adds stitches skipping one particle, at twice the spacing.
    pub flex_stitches: bool,
    pub color: [u8; 3],
}

impl Default for ClothConfig {
    fn default() -> Self {
        Self {
            width: 4.0,
            height: 4.0,
            resolution_x: 16,
            resolution_y: 16,
            top: 2.0,
            linear_damping: 0.2,
            flex_stitches: false,
            color: [255, 0, 0],
        }
    }
}

impl ClothConfig {
    /// Mass of every free particle.
    pub fn particle_mass(&self) -> f32 {
        (1.0 / self.width) * self.height
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallConfig {
    pub radius: f32,
    /// Scale of the rendered sphere relative to `radius`.
    pub visual_scale: f32,
    /// Milliseconds per radian of the orbit.
    pub period: f64,
    pub amplitude_y: f32,
    pub amplitude_z: f32,
    pub center: [f32; 3],
    pub color: [u8; 3],
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            visual_scale: 0.8,
            period: 400.0,
            amplitude_y: 0.5,
            amplitude_z: 1.0,
            center: [0.0, 0.0, -1.0],
            color: [0, 0, 255],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: [f32; 3],
    pub iterations: usize,
    /// Fixed step in seconds.
    pub step: f32,
    pub max_substeps: usize,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -20.0, 0.0],
            iterations: 10,
            step: 1.0 / 60.0,
            max_substeps: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    /// World units per unit of normalized pointer offset.
    pub scale: f32,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self { scale: 6.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MannequinConfig {
    pub enabled: bool,
    pub url: String,
    pub position: [f32; 3],
    /// Name of the node whose children are collision spheres.
    pub collision_node: String,
    /// Added to each collision sphere's radius.
    pub padding: f32,
}

impl Default for MannequinConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "/mannequin.glb".to_string(),
            position: [0.0, 0.0, -0.3],
            collision_node: "collisions".to_string(),
            padding: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Draws particles and stitches on top of the cloth.
    pub stitches: bool,
    /// Lets the mouse orbit the camera. Disables pointer pinning.
    pub orbit_camera: bool,
}

impl SceneConfig {
    pub fn from_json(json: &str) -> Result<Self, DemoError> {
        let config: SceneConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DemoError> {
        let cloth = &self.cloth;
        // four pinned columns must fit in the first row
        if cloth.resolution_x < 4 {
            return Err(DemoError::Config(format!(
                "cloth.resolution_x must be at least 4, got {}",
                cloth.resolution_x
            )));
        }
        if cloth.resolution_y < 2 {
            return Err(DemoError::Config(format!(
                "cloth.resolution_y must be at least 2, got {}",
                cloth.resolution_y
            )));
        }
        match cloth.resolution_x.checked_mul(cloth.resolution_y) {
            Some(n) if n <= MAX_PARTICLES => {}
            _ => {
                return Err(DemoError::Config(format!(
                    "cloth grid {}x{} exceeds {} particles",
                    cloth.resolution_x, cloth.resolution_y, MAX_PARTICLES
                )))
            }
        }

        self.check_finite()?;

        if !(cloth.width > 0.0 && cloth.height > 0.0) {
            return Err(DemoError::Config(format!(
                "cloth size must be positive, got {}x{}",
                cloth.width, cloth.height
            )));
        }
        if !(0.0..1.0).contains(&cloth.linear_damping) {
            return Err(DemoError::Config(format!(
                "cloth.linear_damping must be in [0, 1), got {}",
                cloth.linear_damping
            )));
        }
        if self.physics.iterations == 0 {
            return Err(DemoError::Config("physics.iterations must be at least 1".to_string()));
        }
        if !(self.physics.step > 0.0) {
            return Err(DemoError::Config(format!(
                "physics.step must be positive, got {}",
                self.physics.step
            )));
        }
        if !(self.ball.radius > 0.0) || !(self.ball.period > 0.0) {
            return Err(DemoError::Config(
                "ball.radius and ball.period must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// serde_json reads out-of-range floats such as `1e39` as infinity.
    fn check_finite(&self) -> Result<(), DemoError> {
        let fields: [(&str, &[f32]); 12] = [
            ("cloth.width", &[self.cloth.width]),
            ("cloth.height", &[self.cloth.height]),
            ("cloth.top", &[self.cloth.top]),
            ("cloth.linear_damping", &[self.cloth.linear_damping]),
            ("ball.radius", &[self.ball.radius]),
            ("ball.visual_scale", &[self.ball.visual_scale]),
            ("ball.amplitude", &[self.ball.amplitude_y, self.ball.amplitude_z]),
            ("ball.center", &self.ball.center),
            ("physics.gravity", &self.physics.gravity),
            ("physics.step", &[self.physics.step]),
            ("pointer.scale", &[self.pointer.scale]),
            ("mannequin", &[
                self.mannequin.padding,
                self.mannequin.position[0],
                self.mannequin.position[1],
                self.mannequin.position[2],
            ]),
        ];
        for (name, values) in fields {
            if values.iter().any(|v| !v.is_finite()) {
                return Err(DemoError::Config(format!("{} must be finite, got {:?}", name, values)));
            }
        }
        if !self.ball.period.is_finite() {
            return Err(DemoError::Config(format!(
                "ball.period must be finite, got {}",
                self.ball.period
            )));
        }
        Ok(())
    }
}
