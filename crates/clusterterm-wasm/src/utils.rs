use std::fmt::Display;

use wasm_bindgen::JsValue;

use clusterterm_terminal::types::DEFAULT_API_PREFIX;

/// Cluster API base for the page this module was loaded from
pub fn page_base_url() -> Result<String, JsValue> {
    let location = crate::window()?.location();
    let protocol = location
        .protocol()
        .map_err(|_| JsValue::from_str("Failed to get page protocol"))?;
    let host = location
        .host()
        .map_err(|_| JsValue::from_str("Failed to get host"))?;
    Ok(base_url(&protocol, &host))
}

/// `protocol` as reported by `location.protocol`, e.g. `https:`
pub fn base_url(protocol: &str, host: &str) -> String {
    let scheme = if protocol == "https:" { "https" } else { "http" };
    format!("{}://{}/{}", scheme, host, DEFAULT_API_PREFIX)
}

/// Map a Rust error to a JS exception value
pub fn js_error(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Best-effort text of a thrown JS value
pub fn describe(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}
