use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, EventTarget, HtmlElement, Window};

use crate::api::ApiClient;
use crate::config::SiteConfig;
use crate::notify::Notifier;
use crate::results::ResultSlots;
use crate::storage::BrowserStorage;
use crate::telemetry::Telemetry;

/// Everything a controller needs, built once at startup and shared.
pub struct PageContext {
    pub window: Window,
    pub document: Document,
    pub config: SiteConfig,
    pub store: BrowserStorage,
    pub notifier: Notifier,
    pub api: ApiClient,
    pub telemetry: Telemetry,
    pub results: ResultSlots,
}

pub type SharedContext = Rc<PageContext>;

impl PageContext {
    pub fn query(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    pub fn query_all(&self, selector: &str) -> Vec<Element> {
        query_all_in(&self.document, selector)
    }

    pub fn by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    /// Last path segment of the current location, lowercased.
    pub fn current_page(&self) -> String {
        let path = self.window.location().pathname().unwrap_or_default();
        crate::auth::page_name(&path)
    }

    pub fn navigate(&self, href: &str) {
        if let Err(err) = self.window.location().set_href(href) {
            log::error!("Navigation to {} failed: {:?}", href, err);
        }
    }
}

pub fn query_all_in(root: &Document, selector: &str) -> Vec<Element> {
    let mut found = Vec::new();
    if let Ok(list) = root.query_selector_all(selector) {
        for i in 0..list.length() {
            if let Some(el) = list.get(i).and_then(|node| node.dyn_into::<Element>().ok()) {
                found.push(el);
            }
        }
    }
    found
}

pub fn query_in(root: &Element, selector: &str) -> Option<Element> {
    root.query_selector(selector).ok().flatten()
}

pub fn as_html(el: &Element) -> Option<HtmlElement> {
    el.dyn_ref::<HtmlElement>().cloned()
}

pub fn set_style(el: &Element, property: &str, value: &str) {
    if let Some(html) = as_html(el) {
        let _ = html.style().set_property(property, value);
    }
}

pub fn event_element(event: &Event) -> Option<Element> {
    event.target().and_then(|t| t.dyn_into::<Element>().ok())
}

pub fn closest(el: &Element, selector: &str) -> Option<Element> {
    el.closest(selector).ok().flatten()
}

pub fn listen(target: &EventTarget, event: &str, handler: impl FnMut(Event) + 'static) {
    listen_with(target, event, false, handler);
}

/// Capturing-phase listener, runs before any page handler can stop the event.
pub fn listen_capture(target: &EventTarget, event: &str, handler: impl FnMut(Event) + 'static) {
    listen_with(target, event, true, handler);
}

fn listen_with(target: &EventTarget, event: &str, capture: bool, handler: impl FnMut(Event) + 'static) {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    if let Err(err) = target.add_event_listener_with_callback_and_bool(
        event,
        closure.as_ref().unchecked_ref(),
        capture,
    ) {
        log::warn!("Could not listen for {}: {:?}", event, err);
    }
    // Listeners live as long as the page.
    closure.forget();
}
