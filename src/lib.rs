#![allow(clippy::new_without_default)]

use wasm_bindgen::prelude::*;

mod utils;

pub mod ball;
pub mod cloth;
pub mod config;
pub mod error;
pub mod mannequin;
pub mod physics;
pub mod pointer;
mod renderer;
pub mod scene;
pub mod stitch_overlay;

use config::SceneConfig;

#[wasm_bindgen(start)]
pub fn dummy_main() {}

/// Starts the stock scene.
#[wasm_bindgen]
pub async fn run() -> Result<(), JsValue> {
    utils::set_panic_hook();
    renderer::main(SceneConfig::default()).await?;
    Ok(())
}

/// Starts a scene described by a JSON [`SceneConfig`]. Missing fields keep
/// their defaults.
#[wasm_bindgen]
pub async fn run_with_config(json: String) -> Result<(), JsValue> {
    utils::set_panic_hook();
    let config = SceneConfig::from_json(&json)?;
    renderer::main(config).await?;
    Ok(())
}
