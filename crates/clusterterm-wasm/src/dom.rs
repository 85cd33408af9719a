use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement};

const STATE_ATTRIBUTE: &str = "data-terminal-state";
const ERROR_ATTRIBUTE: &str = "data-terminal-error";

/// Get element by ID
pub fn get_element_by_id(document: &Document, id: &str) -> Result<Element, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Element not found: {}", id)))
}

/// Get HTML element by ID
pub fn get_html_element_by_id(document: &Document, id: &str) -> Result<HtmlElement, JsValue> {
    let element = get_element_by_id(document, id)?;
    element
        .dyn_into::<HtmlElement>()
        .map_err(|_| JsValue::from_str(&format!("Element is not HtmlElement: {}", id)))
}

/// Expose session state to the page's stylesheet: the loading indicator and
/// the inline error surface key off these attributes.
pub fn reflect_state(element: &Element, state: &str, error: Option<&str>) {
    let _ = element.set_attribute(STATE_ATTRIBUTE, state);
    let _ = match error {
        Some(message) => element.set_attribute(ERROR_ATTRIBUTE, message),
        None => element.remove_attribute(ERROR_ATTRIBUTE),
    };
}

pub fn clear_state(element: &Element) {
    let _ = element.remove_attribute(STATE_ATTRIBUTE);
    let _ = element.remove_attribute(ERROR_ATTRIBUTE);
}
