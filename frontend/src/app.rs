use std::rc::Rc;

use wasm_bindgen::JsValue;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Event, Window};

use crate::api::ApiClient;
use crate::config::{SiteConfig, SERVICE_WORKER_URL, TOAST_SHORT_MS};
use crate::dom::{listen, PageContext, SharedContext};
use crate::notify::{Notifier, ToastKind};
use crate::storage::BrowserStorage;
use crate::telemetry::Telemetry;
use crate::{auth, chatbot, forms, nav, results, telemetry, theme};

/// Builds the shared context and wires every page controller.
pub fn start() {
    let Some(ctx) = build_context() else {
        log::error!("No window/document, nothing to start");
        return;
    };

    telemetry::install(&ctx);
    auth::attach(&ctx);
    theme::attach(&ctx);
    nav::attach(&ctx);
    forms::attach(&ctx);
    results::attach(&ctx);
    chatbot::attach(&ctx);
    // Last, so it only sees forms no other controller claimed.
    forms::attach_generic(&ctx);
    watch_connectivity(&ctx);
    register_service_worker(&ctx.window);

    log::info!("Ghar Ka Guide initialised on {}", ctx.current_page());
}

fn build_context() -> Option<SharedContext> {
    let window = web_sys::window()?;
    let document = window.document()?;
    let config = SiteConfig::from_document(&document);
    let api = ApiClient::new(config.api_base_url.clone());
    let telemetry = Telemetry::new(&api);

    Some(Rc::new(PageContext {
        notifier: Notifier::mount(&document),
        store: BrowserStorage::open(),
        window,
        document,
        config,
        api,
        telemetry,
        results: results::ResultSlots::default(),
    }))
}

fn watch_connectivity(ctx: &SharedContext) {
    let window = ctx.window.clone();
    {
        let ctx = ctx.clone();
        listen(&window, "online", move |_event: Event| {
            ctx.notifier
                .show_for("Connection restored!", ToastKind::Success, TOAST_SHORT_MS);
        });
    }
    {
        let ctx = ctx.clone();
        listen(&window, "offline", move |_event: Event| {
            ctx.notifier.show(
                "You are offline. Some features may not work.",
                ToastKind::Warning,
            );
        });
    }
}

fn register_service_worker(window: &Window) {
    let navigator = window.navigator();
    let supported = js_sys::Reflect::has(&navigator, &JsValue::from_str("serviceWorker")).unwrap_or(false);
    if !supported {
        log::debug!("Service workers unsupported, skipping offline cache");
        return;
    }

    let registration = navigator.service_worker().register(SERVICE_WORKER_URL);
    spawn_local(async move {
        match JsFuture::from(registration).await {
            Ok(_) => log::info!("Service worker registered"),
            Err(err) => log::warn!("Service worker registration failed: {:?}", err),
        }
    });
}
