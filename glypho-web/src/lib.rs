//! Glypho page updater for the browser
//!
//! Load the module from the preview page and call `start()`: the container
//! `article#markdown` gets the `init` response, then every `sse` message
//! except the `"false"` sentinel. Prism and MathJax must be loaded by the page.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Element, EventSource, MessageEvent, Response};

use glypho::{
    Container, GlyphoError, Highlighter, PageUpdater, Result, TypesetOptions, Typesetter,
    DEFAULT_SELECTOR, INIT_PATH, SSE_PATH,
};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = Prism, js_name = highlightAllUnder)]
    fn prism_highlight_all_under(element: &Element) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = MathJax, js_name = typeset)]
    fn mathjax_typeset() -> std::result::Result<JsValue, JsValue>;
}

/// The container element in the live page
pub struct DomContainer {
    element: Element,
}

impl DomContainer {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &Element {
        &self.element
    }
}

impl Container for DomContainer {
    fn replace_content(&mut self, html: &str) -> Result<()> {
        self.element.set_inner_html(html);
        Ok(())
    }

    fn content(&self) -> String {
        self.element.inner_html()
    }
}

fn js_error(call: &str, err: JsValue) -> GlyphoError {
    GlyphoError::Hook {
        command: call.to_string(),
        message: err.as_string().unwrap_or_else(|| format!("{:?}", err)),
    }
}

/// `Prism.highlightAllUnder(container)`
#[derive(Debug, Default)]
pub struct PrismHighlighter;

impl Highlighter<DomContainer> for PrismHighlighter {
    fn highlight_all_under(&mut self, container: &DomContainer) -> Result<()> {
        prism_highlight_all_under(container.element())
            .map_err(|e| js_error("Prism.highlightAllUnder", e))
    }
}

/// `MathJax.typeset()` over the whole document
#[derive(Debug, Default)]
pub struct MathJaxTypesetter;

impl Typesetter<DomContainer> for MathJaxTypesetter {
    fn typeset(&mut self, _container: &DomContainer) -> Result<()> {
        mathjax_typeset()
            .map(|_| ())
            .map_err(|e| js_error("MathJax.typeset", e))
    }
}

type LivePage = PageUpdater<DomContainer, PrismHighlighter, MathJaxTypesetter>;

/// MathJax configuration with the default inline delimiters, as a JSON string
/// to assign to `window.MathJax` before MathJax loads
#[wasm_bindgen]
pub fn mathjax_config() -> String {
    TypesetOptions::default().mathjax_config().to_string()
}

/// Load the initial content and follow the push channel
#[wasm_bindgen]
pub fn start() -> std::result::Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let element = document
        .query_selector(DEFAULT_SELECTOR)?
        .ok_or_else(|| JsValue::from_str("container article#markdown not found"))?;

    let page: Rc<RefCell<LivePage>> = Rc::new(RefCell::new(PageUpdater::new(
        DomContainer::new(element),
        PrismHighlighter,
        MathJaxTypesetter,
    )));

    let initial = page.clone();
    let request = window.fetch_with_str(INIT_PATH);
    spawn_local(async move {
        match fetch_text(request).await {
            Ok(body) => report(initial.borrow_mut().load_initial(body)),
            Err(e) => web_sys::console::error_2(&"glypho: initial fetch failed".into(), &e),
        }
    });

    let source = EventSource::new(SSE_PATH)?;
    let live = page;
    let onmessage = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
        if let Some(data) = event.data().as_string() {
            report(live.borrow_mut().handle_payload(&data).map(|_| ()));
        }
    });
    source.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));

    // Both live for the page's lifetime
    onmessage.forget();
    std::mem::forget(source);

    Ok(())
}

async fn fetch_text(request: js_sys::Promise) -> std::result::Result<String, JsValue> {
    let response: Response = JsFuture::from(request).await?.dyn_into()?;
    let text = JsFuture::from(response.text()?).await?;
    Ok(text.as_string().unwrap_or_default())
}

fn report(result: Result<()>) {
    if let Err(e) = result {
        web_sys::console::error_1(&format!("glypho: {}", e).into());
    }
}
