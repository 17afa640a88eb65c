//! Best-effort error reporting and event tracking. Nothing here may fail
//! loudly: transport problems end up in the console and nowhere else.

use gloo_net::http::Request;
use serde::Serialize;
use serde_json::{json, Value};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys::{ErrorEvent, Event, HtmlFormElement, PromiseRejectionEvent};

use crate::api::ApiClient;
use crate::config::{ANALYTICS_ENDPOINT, ERROR_LOG_ENDPOINT};
use crate::dom::{closest, event_element, listen, listen_capture, SharedContext};
use crate::notify::ToastKind;

const CLICK_TEXT_LIMIT: usize = 50;
const CLICK_HREF_LIMIT: usize = 100;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub message: String,
    pub stack: String,
    pub url: String,
    pub user_agent: String,
    pub timestamp: String,
    pub context: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalyticsEvent {
    pub event: String,
    pub properties: Value,
    pub timestamp: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Telemetry {
    errors_url: String,
    analytics_url: String,
}

impl Telemetry {
    pub fn new(api: &ApiClient) -> Self {
        Self {
            errors_url: api.url(ERROR_LOG_ENDPOINT),
            analytics_url: api.url(ANALYTICS_ENDPOINT),
        }
    }

    /// Reports any thrown JS value (Error object, string, or otherwise).
    pub fn log_error(&self, failure: &JsValue, context: Value) {
        let (message, stack) = describe(failure);
        let report = ErrorReport {
            message,
            stack,
            url: current_url(),
            user_agent: user_agent(),
            timestamp: now_iso(),
            context,
        };
        self.report(report);
    }

    pub fn report(&self, report: ErrorReport) {
        let url = self.errors_url.clone();
        spawn_local(async move {
            let sent = match Request::post(&url).json(&report) {
                Ok(request) => request.send().await.map(|_| ()),
                Err(err) => Err(err),
            };
            if let Err(err) = sent {
                log::error!("Error logging failed: {}", err);
                log::error!("Original error: {:?}", report);
            }
        });
    }

    pub fn track_event(&self, name: &str, properties: Value) {
        forward_to_plausible(name, &properties);

        let event = AnalyticsEvent {
            event: name.to_string(),
            properties,
            timestamp: now_iso(),
            url: current_url(),
        };
        let url = self.analytics_url.clone();
        spawn_local(async move {
            if let Ok(request) = Request::post(&url).json(&event) {
                if let Err(err) = request.send().await {
                    log::debug!("Analytics event dropped: {}", err);
                }
            }
        });
    }
}

/// Wires global error capture and interaction tracking.
pub fn install(ctx: &SharedContext) {
    let window = ctx.window.clone();

    {
        let ctx = ctx.clone();
        listen(&window, "error", move |event: Event| {
            let Some(event) = event.dyn_ref::<ErrorEvent>() else {
                return;
            };
            let error = event.error();
            let failure = if error.is_undefined() || error.is_null() {
                JsValue::from_str(&event.message())
            } else {
                error
            };
            log::error!("JavaScript error: {}", describe(&failure).0);
            ctx.telemetry.log_error(
                &failure,
                json!({
                    "filename": event.filename(),
                    "lineno": event.lineno(),
                    "colno": event.colno(),
                    "type": "javascript_error",
                }),
            );
            ctx.notifier
                .show("Something went wrong. Please refresh the page.", ToastKind::Error);
        });
    }

    {
        let ctx = ctx.clone();
        listen(&window, "unhandledrejection", move |event: Event| {
            let reason = event
                .dyn_ref::<PromiseRejectionEvent>()
                .map(|e| e.reason())
                .filter(|r| !r.is_undefined() && !r.is_null())
                .unwrap_or_else(|| JsValue::from_str("Unhandled Promise Rejection"));
            ctx.telemetry
                .log_error(&reason, json!({ "type": "unhandled_promise_rejection" }));
        });
    }

    {
        let ctx = ctx.clone();
        listen_capture(&ctx.document.clone(), "click", move |event: Event| {
            let Some(target) = event_element(&event)
                .and_then(|el| closest(&el, "a, button, [role=\"button\"]"))
            else {
                return;
            };
            let text = target.text_content().unwrap_or_default();
            let aria = target.get_attribute("aria-label");
            let href = target.get_attribute("href");
            if let Some(props) = click_properties(&target.tag_name(), &text, aria.as_deref(), href.as_deref()) {
                ctx.telemetry.track_event("click", props);
            }
        });
    }

    {
        let ctx = ctx.clone();
        listen_capture(&ctx.document.clone(), "submit", move |event: Event| {
            let Some(form) = event_element(&event).and_then(|el| el.dyn_into::<HtmlFormElement>().ok()) else {
                return;
            };
            let props = form_properties(&form.id(), form.get_attribute("name").as_deref(), &form.action());
            ctx.telemetry.track_event("form_submit", props);
        });
    }

    let referrer = ctx.document.referrer();
    let path = window.location().pathname().unwrap_or_default();
    ctx.telemetry
        .track_event("page_view", json!({ "path": path, "referrer": referrer }));
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// Summary of a clicked link/button, or `None` when it has neither a label
/// nor a target worth recording.
fn click_properties(tag: &str, text: &str, aria_label: Option<&str>, href: Option<&str>) -> Option<Value> {
    let text = text.trim();
    let label = if text.is_empty() {
        aria_label.unwrap_or("").trim()
    } else {
        text
    };
    let href = href.unwrap_or("");

    if label.is_empty() && href.is_empty() {
        return None;
    }

    Some(json!({
        "element": tag.to_lowercase(),
        "text": truncate_chars(label, CLICK_TEXT_LIMIT),
        "href": truncate_chars(href, CLICK_HREF_LIMIT),
    }))
}

fn form_properties(id: &str, name: Option<&str>, action: &str) -> Value {
    let form_id = [Some(id), name]
        .into_iter()
        .flatten()
        .find(|v| !v.is_empty())
        .unwrap_or("unnamed");
    json!({ "formId": form_id, "action": action })
}

fn describe(failure: &JsValue) -> (String, String) {
    if let Some(text) = failure.as_string() {
        return (text, String::new());
    }
    let field = |name: &str| {
        js_sys::Reflect::get(failure, &JsValue::from_str(name))
            .ok()
            .and_then(|v| v.as_string())
    };
    let message = field("message").unwrap_or_else(|| format!("{:?}", failure));
    (message, field("stack").unwrap_or_default())
}

fn forward_to_plausible(name: &str, properties: &Value) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(global) = js_sys::Reflect::get(&window, &JsValue::from_str("plausible")) else {
        return;
    };
    let Ok(plausible) = global.dyn_into::<js_sys::Function>() else {
        return;
    };
    let options = json!({ "props": properties }).to_string();
    if let Ok(options) = js_sys::JSON::parse(&options) {
        let _ = plausible.call2(&JsValue::NULL, &JsValue::from_str(name), &options);
    }
}

fn current_url() -> String {
    web_sys::window()
        .and_then(|w| w.location().href().ok())
        .unwrap_or_default()
}

fn user_agent() -> String {
    web_sys::window()
        .and_then(|w| w.navigator().user_agent().ok())
        .unwrap_or_default()
}

fn now_iso() -> String {
    js_sys::Date::new_0().to_iso_string().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_summary_truncates() {
        let long_text = "x".repeat(80);
        let long_href = format!("https://example.com/{}", "p".repeat(200));
        let props = click_properties("A", &long_text, None, Some(&long_href)).unwrap();

        assert_eq!(props["element"], "a");
        assert_eq!(props["text"].as_str().unwrap().chars().count(), CLICK_TEXT_LIMIT);
        assert_eq!(props["href"].as_str().unwrap().chars().count(), CLICK_HREF_LIMIT);
    }

    #[test]
    fn click_summary_falls_back_to_aria_label() {
        let props = click_properties("BUTTON", "   ", Some("Open menu"), None).unwrap();
        assert_eq!(props["text"], "Open menu");
        assert_eq!(props["href"], "");
    }

    #[test]
    fn unlabeled_click_is_ignored() {
        assert_eq!(click_properties("BUTTON", "", None, None), None);
        assert_eq!(click_properties("BUTTON", " ", Some(""), Some("")), None);
    }

    #[test]
    fn form_summary_prefers_id_then_name() {
        assert_eq!(form_properties("contact", Some("c"), "/send")["formId"], "contact");
        assert_eq!(form_properties("", Some("newsletter"), "")["formId"], "newsletter");
        assert_eq!(form_properties("", None, "")["formId"], "unnamed");
    }

    #[test]
    fn error_report_wire_names() {
        let report = ErrorReport {
            message: "boom".into(),
            stack: String::new(),
            url: "http://site/".into(),
            user_agent: "test".into(),
            timestamp: "2024-01-01T00:00:00.000Z".into(),
            context: json!({"type": "javascript_error"}),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["userAgent"], "test");
        assert_eq!(value["context"]["type"], "javascript_error");
    }
}
