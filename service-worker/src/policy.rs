//! What the worker caches and which requests it is allowed to answer.

use std::future::Future;

/// Bump to drop every previously cached copy on the next activation.
pub const CACHE_NAME: &str = "gkg-v1";

/// Page bundle emitted by `wasm-bindgen --out-dir pkg` for the frontend
/// binary; the name follows the crate.
pub const PAGE_SCRIPT: &str = "/pkg/ghar_ka_guide_frontend.js";
pub const PAGE_WASM: &str = "/pkg/ghar_ka_guide_frontend_bg.wasm";

pub const PRECACHE_ASSETS: [&str; 5] = ["/", "/index.html", "/styles.css", PAGE_SCRIPT, PAGE_WASM];

/// `scheme://host[:port]` of an absolute URL.
pub fn origin_of(url: &str) -> Option<&str> {
    let scheme_end = url.find("://")?;
    if scheme_end == 0 {
        return None;
    }
    let authority_start = scheme_end + 3;
    let rest = &url[authority_start..];
    let authority_len = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    if authority_len == 0 {
        return None;
    }
    Some(&url[..authority_start + authority_len])
}

/// Only same-origin requests are served from the cache; everything else
/// goes straight to the network untouched.
pub fn should_intercept(url: &str, origin: &str) -> bool {
    origin_of(url).is_some_and(|o| o.eq_ignore_ascii_case(origin))
}

pub fn stale_caches<'a>(keys: &'a [String], current: &str) -> Vec<&'a str> {
    keys.iter()
        .map(String::as_str)
        .filter(|key| *key != current)
        .collect()
}

/// Answers from `lookup` when it holds a copy; only a miss calls `fetch`.
pub async fn cache_first<T, E, F, Fut>(lookup: impl Future<Output = Result<Option<T>, E>>, fetch: F) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    match lookup.await? {
        Some(hit) => Ok(hit),
        None => fetch().await,
    }
}
