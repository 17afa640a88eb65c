//! Offline shell for the site: precache on install, drop old caches on
//! activate, answer same-origin fetches cache-first.
//!
//! Browsers only dispatch worker events to listeners registered by the
//! worker script itself, so `service-worker.js` forwards them here.

mod policy;

pub use policy::{
    cache_first, origin_of, should_intercept, stale_caches, CACHE_NAME, PAGE_SCRIPT, PAGE_WASM, PRECACHE_ASSETS,
};

use js_sys::{Array, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{Cache, CacheStorage, FetchEvent, Request, ServiceWorkerGlobalScope};

#[derive(Debug, thiserror::Error)]
pub enum SwError {
    #[error("not running inside a service worker")]
    NotAWorker,
    #[error("{0}")]
    Js(String),
}

impl From<JsValue> for SwError {
    fn from(value: JsValue) -> Self {
        let message = value
            .as_string()
            .or_else(|| {
                value
                    .dyn_ref::<js_sys::Error>()
                    .map(|e| String::from(e.message()))
            })
            .unwrap_or_else(|| format!("{:?}", value));
        SwError::Js(message)
    }
}

impl From<SwError> for JsValue {
    fn from(err: SwError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

fn scope() -> Result<ServiceWorkerGlobalScope, SwError> {
    js_sys::global()
        .dyn_into::<ServiceWorkerGlobalScope>()
        .map_err(|_| SwError::NotAWorker)
}

fn caches(scope: &ServiceWorkerGlobalScope) -> Result<CacheStorage, SwError> {
    Ok(scope.caches()?)
}

async fn install() -> Result<(), SwError> {
    let scope = scope()?;
    // Activate without waiting for open tabs to close.
    let _ = scope.skip_waiting()?;

    let cache: Cache = JsFuture::from(caches(&scope)?.open(CACHE_NAME))
        .await?
        .dyn_into()?;
    let assets: Array = PRECACHE_ASSETS.iter().map(|a| JsValue::from_str(a)).collect();
    JsFuture::from(cache.add_all_with_str_sequence(&assets)).await?;
    log::info!("Precached {} assets into {}", PRECACHE_ASSETS.len(), CACHE_NAME);
    Ok(())
}

async fn activate() -> Result<(), SwError> {
    let caches = caches(&scope()?)?;
    let keys: Array = JsFuture::from(caches.keys()).await?.dyn_into()?;
    let names: Vec<String> = keys.iter().filter_map(|k| k.as_string()).collect();

    for name in stale_caches(&names, CACHE_NAME) {
        JsFuture::from(caches.delete(name)).await?;
        log::info!("Deleted stale cache {}", name);
    }
    Ok(())
}

async fn respond(request: Request) -> Result<JsValue, SwError> {
    let scope = scope()?;
    let caches = caches(&scope)?;
    let lookup = async {
        let cached = JsFuture::from(caches.match_with_request(&request)).await?;
        Ok::<_, SwError>((!cached.is_undefined()).then_some(cached))
    };
    cache_first(lookup, || async {
        Ok::<_, SwError>(JsFuture::from(scope.fetch_with_request(&request)).await?)
    })
    .await
}

fn into_promise(work: impl std::future::Future<Output = Result<(), SwError>> + 'static) -> Promise {
    future_to_promise(async move {
        work.await.map(|()| JsValue::UNDEFINED).map_err(|err| {
            log::error!("{}", err);
            JsValue::from(err)
        })
    })
}

/// For `event.waitUntil` in the install listener.
#[wasm_bindgen]
pub fn handle_install() -> Promise {
    into_promise(install())
}

/// For `event.waitUntil` in the activate listener.
#[wasm_bindgen]
pub fn handle_activate() -> Promise {
    into_promise(activate())
}

/// Answers `event` when it is same-origin. Returns whether `respondWith`
/// was called; when it was not, the browser performs the fetch as usual.
#[wasm_bindgen]
pub fn handle_fetch(event: FetchEvent) -> bool {
    let request = event.request();
    let Ok(scope) = scope() else {
        return false;
    };
    if !should_intercept(&request.url(), &scope.location().origin()) {
        return false;
    }

    let response = future_to_promise(async move { respond(request).await.map_err(JsValue::from) });
    match event.respond_with(&response) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("respondWith failed: {}", SwError::from(err));
            false
        }
    }
}
