//! Navigation and page chrome: mobile menu, anchors, scroll effects,
//! reveal-on-scroll sections, lazy images, the statistics counters and the
//! keyboard/screen-reader aids.

use gloo_timers::callback::{Interval, Timeout};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Element, Event, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit,
    KeyboardEvent, ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition,
};

use crate::dom::{as_html, listen, set_style, SharedContext};
use crate::format::format_with_commas;

const SCROLLED_OFFSET_PX: f64 = 50.0;
const FADE_THRESHOLD: f64 = 0.1;
const FADE_ROOT_MARGIN: &str = "0px 0px -50px 0px";
const STATS_THRESHOLD: f64 = 0.5;
const COUNTER_STEPS: i64 = 100;
const COUNTER_FRAME_MS: u32 = 16;
const OVERLAY_MS: u32 = 2_000;

const MAIN_CONTENT_ID: &str = "main-content";
const MAIN_CANDIDATES: [&str; 3] = ["main", ".dashboard-main", ".tool-main"];
const FOCUSABLE: &str = "a, button, input, select, textarea, [tabindex]:not([tabindex=\"-1\"])";
const SKIP_LINK_STYLE: &str = "position: absolute; left: 6px; background: #667eea; color: white; \
    padding: 8px; text-decoration: none; border-radius: 4px; z-index: 10000; transition: top 0.3s;";

/// Selector for an in-page anchor, `None` for a bare `#` or a non-fragment.
pub fn anchor_selector(href: &str) -> Option<&str> {
    (href.starts_with('#') && href.len() > 1).then_some(href)
}

/// How far down the page the reader is, 0..=100.
pub fn scroll_percent(scroll_top: f64, scroll_height: f64, view_height: f64) -> f64 {
    let scrollable = scroll_height - view_height;
    if scrollable <= 0.0 {
        return 0.0;
    }
    (scroll_top / scrollable * 100.0).clamp(0.0, 100.0)
}

/// Where Tab (or Shift+Tab) should land instead of leaving the page, given
/// the focused element's index among `count` focusable elements.
pub fn wrapped_focus(focused: Option<usize>, count: usize, backwards: bool) -> Option<usize> {
    let last = count.checked_sub(1)?;
    match (focused, backwards) {
        (Some(0), true) => Some(last),
        (Some(i), false) if i == last => Some(0),
        _ => None,
    }
}

/// Skip link sits off-screen until it takes focus.
pub fn skip_link_top(focused: bool) -> &'static str {
    if focused {
        "6px"
    } else {
        "-40px"
    }
}

/// Counts up to `target` in fixed steps, yielding the text to show each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterAnimation {
    target: i64,
    increment: f64,
    current: f64,
    finished: bool,
}

impl CounterAnimation {
    pub fn new(target: i64) -> Self {
        Self {
            target,
            increment: target as f64 / COUNTER_STEPS as f64,
            current: 0.0,
            finished: false,
        }
    }
}

impl Iterator for CounterAnimation {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.finished {
            return None;
        }
        if self.increment > 0.0 && self.current < self.target as f64 {
            self.current += self.increment;
            if self.current < self.target as f64 {
                return Some(format_with_commas(self.current.floor() as i64));
            }
        }
        self.finished = true;
        Some(format_with_commas(self.target))
    }
}

pub fn attach(ctx: &SharedContext) {
    attach_menu(ctx);
    attach_anchors(ctx);
    attach_scroll_effects(ctx);
    mark_active_link(ctx);
    fade_in_sections(ctx);
    lazy_load_images(ctx);
    animate_statistics(ctx);
    attach_external_links(ctx);
    label_buttons(ctx);
    insert_skip_link(ctx);
    mark_main_landmark(ctx);
    attach_focus_wrap(ctx);
}

fn attach_menu(ctx: &SharedContext) {
    let (Some(hamburger), Some(menu)) = (ctx.query(".hamburger"), ctx.query(".nav-menu")) else {
        return;
    };

    {
        let (hamburger, menu) = (hamburger.clone(), menu.clone());
        listen(&hamburger.clone(), "click", move |_event: Event| {
            let _ = hamburger.class_list().toggle("active");
            let _ = menu.class_list().toggle("active");
        });
    }

    for link in ctx.query_all(".nav-link") {
        let (hamburger, menu) = (hamburger.clone(), menu.clone());
        listen(&link, "click", move |_event: Event| {
            let _ = hamburger.class_list().remove_1("active");
            let _ = menu.class_list().remove_1("active");
        });
    }
}

fn attach_anchors(ctx: &SharedContext) {
    for anchor in ctx.query_all("a[href^=\"#\"]") {
        let ctx = ctx.clone();
        let link = anchor.clone();
        listen(&anchor, "click", move |event: Event| {
            let href = link.get_attribute("href").unwrap_or_default();
            let Some(selector) = anchor_selector(&href) else {
                return;
            };
            event.prevent_default();
            if let Some(target) = ctx.query(selector) {
                let options = ScrollIntoViewOptions::new();
                options.set_behavior(ScrollBehavior::Smooth);
                options.set_block(ScrollLogicalPosition::Start);
                target.scroll_into_view_with_scroll_into_view_options(&options);
            }
        });
    }
}

fn attach_scroll_effects(ctx: &SharedContext) {
    let ctx = ctx.clone();
    listen(&ctx.window.clone(), "scroll", move |_event: Event| {
        let scroll_top = ctx.window.scroll_y().unwrap_or(0.0);

        if let Some(navbar) = ctx.query(".navbar") {
            let _ = if scroll_top > SCROLLED_OFFSET_PX {
                navbar.class_list().add_1("scrolled")
            } else {
                navbar.class_list().remove_1("scrolled")
            };
        }

        if let Some(fill) = ctx.query(".progress-fill") {
            let scroll_height = ctx
                .document
                .body()
                .map(|b| b.scroll_height() as f64)
                .unwrap_or(0.0);
            let view_height = ctx
                .window
                .inner_height()
                .ok()
                .and_then(|h| h.as_f64())
                .unwrap_or(0.0);
            let percent = scroll_percent(scroll_top, scroll_height, view_height);
            set_style(&fill, "width", &format!("{}%", percent));
        }
    });
}

fn mark_active_link(ctx: &SharedContext) {
    let page = ctx.current_page();
    for link in ctx.query_all(".nav-link") {
        if link.get_attribute("href").is_some_and(|href| href.to_lowercase() == page) {
            let _ = link.class_list().add_1("active");
        }
    }
}

/// Calls `on_enter` once per element as it scrolls into view, then stops
/// watching it.
fn on_first_visible(
    elements: Vec<Element>,
    threshold: Option<f64>,
    root_margin: Option<&str>,
    mut on_enter: impl FnMut(&Element) + 'static,
) {
    if elements.is_empty() {
        return;
    }

    let callback = Closure::wrap(Box::new(move |entries: js_sys::Array, observer: IntersectionObserver| {
        for entry in entries.iter() {
            let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                continue;
            };
            if entry.is_intersecting() {
                let target = entry.target();
                on_enter(&target);
                observer.unobserve(&target);
            }
        }
    }) as Box<dyn FnMut(js_sys::Array, IntersectionObserver)>);

    let options = IntersectionObserverInit::new();
    if let Some(threshold) = threshold {
        options.set_threshold(&JsValue::from_f64(threshold));
    }
    if let Some(margin) = root_margin {
        options.set_root_margin(margin);
    }

    match IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &options) {
        Ok(observer) => {
            for el in &elements {
                observer.observe(el);
            }
            callback.forget();
        }
        Err(err) => log::warn!("IntersectionObserver unavailable: {:?}", err),
    }
}

fn fade_in_sections(ctx: &SharedContext) {
    let sections = ctx.query_all("section");
    for section in &sections {
        let _ = section.class_list().add_1("fade-in");
    }
    on_first_visible(sections, Some(FADE_THRESHOLD), Some(FADE_ROOT_MARGIN), |section| {
        let _ = section.class_list().add_1("visible");
    });
}

fn lazy_load_images(ctx: &SharedContext) {
    on_first_visible(ctx.query_all("img[data-src]"), None, None, |img| {
        if let Some(src) = img.get_attribute("data-src") {
            let _ = img.set_attribute("src", &src);
        }
        let _ = img.class_list().remove_1("lazy");
    });
}

fn animate_statistics(ctx: &SharedContext) {
    let Some(stats) = ctx.query(".statistics") else {
        return;
    };
    let counters = ctx.query_all(".stat-number[data-target]");
    on_first_visible(vec![stats], Some(STATS_THRESHOLD), None, move |_| {
        for counter in &counters {
            let target = counter
                .get_attribute("data-target")
                .and_then(|t| t.trim().parse::<i64>().ok());
            if let Some(target) = target {
                run_counter(counter.clone(), target);
            }
        }
    });
}

fn run_counter(counter: Element, target: i64) {
    let mut frames = CounterAnimation::new(target);
    let slot = std::rc::Rc::new(std::cell::RefCell::new(None::<Interval>));
    let handle = slot.clone();
    let interval = Interval::new(COUNTER_FRAME_MS, move || match frames.next() {
        Some(text) => counter.set_text_content(Some(&text)),
        None => {
            // Dropping the interval cancels it.
            handle.borrow_mut().take();
        }
    });
    *slot.borrow_mut() = Some(interval);
}

fn attach_external_links(ctx: &SharedContext) {
    for link in ctx.query_all("a[href^=\"http\"]") {
        let ctx = ctx.clone();
        listen(&link, "click", move |_event: Event| {
            let Some(overlay) = ctx.by_id("loadingOverlay") else {
                return;
            };
            set_style(&overlay, "display", "flex");
            Timeout::new(OVERLAY_MS, move || set_style(&overlay, "display", "none")).forget();
        });
    }
}

fn label_buttons(ctx: &SharedContext) {
    for button in ctx.query_all("button:not([aria-label])") {
        let text = button.text_content().unwrap_or_default();
        let text = text.trim();
        if !text.is_empty() {
            let _ = button.set_attribute("aria-label", text);
        }
    }
}

fn insert_skip_link(ctx: &SharedContext) {
    let (Some(body), Ok(link)) = (ctx.document.body(), ctx.document.create_element("a")) else {
        return;
    };
    let _ = link.set_attribute("href", &format!("#{}", MAIN_CONTENT_ID));
    let _ = link.set_attribute("class", "skip-link");
    link.set_text_content(Some("Skip to main content"));
    let _ = link.set_attribute("style", SKIP_LINK_STYLE);
    set_style(&link, "top", skip_link_top(false));

    for (event, focused) in [("focus", true), ("blur", false)] {
        let target = link.clone();
        listen(&link, event, move |_event: Event| {
            set_style(&target, "top", skip_link_top(focused));
        });
    }

    if let Err(err) = body.insert_before(&link, body.first_child().as_ref()) {
        log::warn!("Could not insert skip link: {:?}", err);
    }
}

fn mark_main_landmark(ctx: &SharedContext) {
    if let Some(main) = MAIN_CANDIDATES.iter().find_map(|selector| ctx.query(selector)) {
        main.set_id(MAIN_CONTENT_ID);
        let _ = main.set_attribute("role", "main");
    }
}

/// Keeps Tab cycling within the page instead of escaping to the browser UI.
fn attach_focus_wrap(ctx: &SharedContext) {
    let ctx = ctx.clone();
    listen(&ctx.document.clone(), "keydown", move |event: Event| {
        let Some(key) = event.dyn_ref::<KeyboardEvent>() else {
            return;
        };
        if key.key() != "Tab" {
            return;
        }

        let focusable = ctx.query_all(FOCUSABLE);
        let active = ctx.document.active_element();
        let focused = active.and_then(|el| focusable.iter().position(|f| *f == el));
        let Some(next) = wrapped_focus(focused, focusable.len(), key.shift_key()) else {
            return;
        };
        if let Some(el) = focusable.get(next).and_then(as_html) {
            event.prevent_default();
            let _ = el.focus();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_hash_is_not_an_anchor() {
        assert_eq!(anchor_selector("#"), None);
        assert_eq!(anchor_selector("#features"), Some("#features"));
        assert_eq!(anchor_selector("index.html#features"), None);
    }

    #[test]
    fn scroll_progress_is_clamped() {
        assert_eq!(scroll_percent(0.0, 2000.0, 1000.0), 0.0);
        assert_eq!(scroll_percent(500.0, 2000.0, 1000.0), 50.0);
        assert_eq!(scroll_percent(1200.0, 2000.0, 1000.0), 100.0);
        assert_eq!(scroll_percent(10.0, 800.0, 1000.0), 0.0);
    }

    #[test]
    fn counter_ends_on_target_with_separators() {
        let frames: Vec<String> = CounterAnimation::new(25_000).collect();
        assert_eq!(frames.len(), COUNTER_STEPS as usize);
        assert_eq!(frames[0], "250");
        assert_eq!(frames.last().map(String::as_str), Some("25,000"));
    }

    #[test]
    fn counter_values_never_decrease() {
        let values: Vec<i64> = CounterAnimation::new(1_234)
            .map(|s| s.replace(',', "").parse().unwrap())
            .collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(values.last(), Some(&1_234));
    }

    #[test]
    fn tab_wraps_at_both_ends() {
        assert_eq!(wrapped_focus(Some(4), 5, false), Some(0));
        assert_eq!(wrapped_focus(Some(0), 5, true), Some(4));
    }

    #[test]
    fn tab_inside_the_page_is_left_to_the_browser() {
        assert_eq!(wrapped_focus(Some(2), 5, false), None);
        assert_eq!(wrapped_focus(Some(2), 5, true), None);
        assert_eq!(wrapped_focus(Some(0), 5, false), None);
        assert_eq!(wrapped_focus(None, 5, true), None);
        assert_eq!(wrapped_focus(None, 0, false), None);
    }

    #[test]
    fn single_focusable_element_wraps_onto_itself() {
        assert_eq!(wrapped_focus(Some(0), 1, false), Some(0));
        assert_eq!(wrapped_focus(Some(0), 1, true), Some(0));
    }

    #[test]
    fn skip_link_only_shows_while_focused() {
        assert_eq!(skip_link_top(true), "6px");
        assert_eq!(skip_link_top(false), "-40px");
    }

    #[test]
    fn zero_or_negative_target_shows_immediately() {
        assert_eq!(CounterAnimation::new(0).collect::<Vec<_>>(), vec!["0"]);
        assert_eq!(CounterAnimation::new(-5).collect::<Vec<_>>(), vec!["-5"]);
    }
}
