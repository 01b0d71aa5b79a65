#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use crate::error::DemoError;

/// Logs to the browser console on wasm and to stderr natively.
#[macro_export]
macro_rules! log {
    ( $( $t:tt )* ) => {{
        #[cfg(target_arch = "wasm32")]
        web_sys::console::log_1(&format!( $( $t )* ).into());
        #[cfg(not(target_arch = "wasm32"))]
        eprintln!( $( $t )* );
    }}
}


pub fn set_panic_hook() {
    // When the `console_error_panic_hook` feature is enabled, we can call the
    // `set_panic_hook` function at least once during initialization, and then
    // we will get better error messages if our code ever panics.
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}


/// Fetches `url` relative to the page and returns the response body.
#[cfg(target_arch = "wasm32")]
pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>, DemoError> {
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Request, RequestInit, RequestMode, Response};

    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::SameOrigin);

    let request = Request::new_with_str_and_init(url, &opts)
        .map_err(|e| DemoError::fetch(url, e))?;

    let window = web_sys::window().ok_or_else(|| DemoError::Fetch {
        url: url.to_string(),
        reason: "no global window".to_string(),
    })?;
    let resp_value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| DemoError::fetch(url, e))?;
    let resp: Response = resp_value
        .dyn_into()
        .map_err(|e| DemoError::fetch(url, e))?;

    if !resp.ok() {
        return Err(DemoError::Fetch {
            url: url.to_string(),
            reason: format!("HTTP {}", resp.status()),
        });
    }

    let buffer = JsFuture::from(resp.array_buffer().map_err(|e| DemoError::fetch(url, e))?)
        .await
        .map_err(|e| DemoError::fetch(url, e))?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    log!("fetch_bytes(): url={}, len={}", url, bytes.len());

    Ok(bytes)
}


/// Reads `path` from disk.
#[cfg(not(target_arch = "wasm32"))]
pub async fn fetch_bytes(path: &str) -> Result<Vec<u8>, DemoError> {
    std::fs::read(path.trim_start_matches('/')).map_err(|e| DemoError::Fetch {
        url: path.to_string(),
        reason: e.to_string(),
    })
}


/// Converts a JS exception into a printable string.
#[cfg(target_arch = "wasm32")]
pub fn js_error_string(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}
