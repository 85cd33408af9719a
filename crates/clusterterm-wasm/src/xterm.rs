//! Bindings for xterm.js and its fit addon, loaded by the page as
//! `window.Terminal` and `window.FitAddon.FitAddon`.

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use clusterterm_terminal::types::Dimensions;
use clusterterm_terminal::{TerminalEmulator, DEFAULT_SCROLLBACK_LINES};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = Terminal)]
    type XTerm;

    #[wasm_bindgen(constructor, js_class = Terminal, catch)]
    fn new(options: &JsValue) -> Result<XTerm, JsValue>;

    #[wasm_bindgen(method)]
    fn open(this: &XTerm, parent: &HtmlElement);

    #[wasm_bindgen(method)]
    fn write(this: &XTerm, data: &str);

    #[wasm_bindgen(method, js_name = onData)]
    fn on_data(this: &XTerm, listener: &Closure<dyn FnMut(String)>) -> Disposable;

    #[wasm_bindgen(method, js_name = loadAddon)]
    fn load_addon(this: &XTerm, addon: &XFitAddon);

    #[wasm_bindgen(method, getter)]
    fn rows(this: &XTerm) -> u16;

    #[wasm_bindgen(method, getter)]
    fn cols(this: &XTerm) -> u16;

    #[wasm_bindgen(method)]
    fn dispose(this: &XTerm);

    type Disposable;

    #[wasm_bindgen(method, js_name = dispose)]
    fn dispose_listener(this: &Disposable);
}

#[wasm_bindgen(js_namespace = FitAddon)]
extern "C" {
    #[wasm_bindgen(js_name = FitAddon)]
    type XFitAddon;

    #[wasm_bindgen(constructor, js_class = FitAddon, catch)]
    fn new() -> Result<XFitAddon, JsValue>;

    #[wasm_bindgen(method)]
    fn fit(this: &XFitAddon);

    #[wasm_bindgen(method, js_name = proposeDimensions)]
    fn propose_dimensions(this: &XFitAddon) -> JsValue;
}

/// An xterm.js terminal mounted in a container element
pub struct XtermEmulator {
    term: XTerm,
    fit: XFitAddon,
    input: Option<(Disposable, Closure<dyn FnMut(String)>)>,
    disposed: bool,
}

impl XtermEmulator {
    /// Mount a terminal in `container`; every chunk the user types is passed
    /// to `on_input`.
    pub fn open(
        container: &HtmlElement,
        on_input: impl FnMut(String) + 'static,
    ) -> Result<Self, JsValue> {
        let options = js_sys::Object::new();
        js_sys::Reflect::set(&options, &"cursorBlink".into(), &JsValue::TRUE)?;
        js_sys::Reflect::set(
            &options,
            &"scrollback".into(),
            &JsValue::from(DEFAULT_SCROLLBACK_LINES as u32),
        )?;

        let term = XTerm::new(&options)?;
        let fit = XFitAddon::new()?;
        term.load_addon(&fit);
        term.open(container);

        let listener = Closure::<dyn FnMut(String)>::new(on_input);
        let subscription = term.on_data(&listener);

        Ok(Self {
            term,
            fit,
            input: Some((subscription, listener)),
            disposed: false,
        })
    }
}

impl TerminalEmulator for XtermEmulator {
    fn write(&mut self, data: &str) {
        if !self.disposed {
            self.term.write(data);
        }
    }

    fn size(&self) -> Dimensions {
        Dimensions::new(self.term.rows(), self.term.cols()).unwrap_or_default()
    }

    // proposeDimensions is undefined while the container is hidden or has
    // no layout yet
    fn fit(&mut self) -> Option<Dimensions> {
        if self.disposed {
            return None;
        }
        let proposed = self.fit.propose_dimensions();
        if proposed.is_undefined() || proposed.is_null() {
            return None;
        }
        let field = |name: &str| {
            js_sys::Reflect::get(&proposed, &name.into())
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0)
        };
        if !(field("cols") >= 1.0 && field("rows") >= 1.0) {
            return None;
        }
        self.fit.fit();
        Dimensions::new(self.term.rows(), self.term.cols()).ok()
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some((subscription, _listener)) = self.input.take() {
            subscription.dispose_listener();
        }
        self.term.dispose();
    }
}

impl Drop for XtermEmulator {
    fn drop(&mut self) {
        self.dispose();
    }
}
