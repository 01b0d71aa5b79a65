use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("invalid config: {0}")]
    Config(String),

    #[error("failed to parse config: {0}")]
    ConfigJson(#[from] serde_json::Error),

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("failed to decode model {path}: {reason}")]
    Model { path: String, reason: String },

    #[error("model {path} has no node named {node:?}")]
    MissingNode { path: String, node: String },

    #[error("GL setup failed: {0}")]
    Gl(String),

    #[error("DOM error: {0}")]
    Dom(String),
}

impl DemoError {
    #[cfg(target_arch = "wasm32")]
    pub(crate) fn fetch(url: &str, e: JsValue) -> Self {
        DemoError::Fetch {
            url: url.to_string(),
            reason: crate::utils::js_error_string(&e),
        }
    }

    pub(crate) fn model(path: &str, reason: impl ToString) -> Self {
        DemoError::Model {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<DemoError> for JsValue {
    fn from(e: DemoError) -> JsValue {
        JsValue::from_str(&e.to_string())
    }
}
